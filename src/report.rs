//! PDF export of a soil-health report via `printpdf`.
//!
//! Layout: A4 portrait, title and metadata, one section per nutrient group
//! (reading line plus wrapped recommendation), footer on the last page.
//! A new page starts whenever the cursor would cross the bottom margin.

use std::io::BufWriter;

use printpdf::*;

use crate::models::{NutrientGroup, SoilAnalysis};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const TOP_MM: f32 = 280.0;
const BOTTOM_MARGIN_MM: f32 = 20.0;
const LEFT_MM: f32 = 20.0;
const INDENT_MM: f32 = 25.0;
const WRAP_CHARS: usize = 85;

pub const REPORT_TITLE: &str = "Soil Analysis Report";
pub const REPORT_FOOTER: &str = "Generated by SoilSense - AI-Driven Soil Analysis";

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("PDF font error: {0}")]
    Font(String),
    #[error("PDF save error: {0}")]
    Save(String),
}

/// Download name for a report: `soil-analysis-<id>.pdf`.
pub fn report_file_name(analysis: &SoilAnalysis) -> String {
    format!("soil-analysis-{}.pdf", analysis.id)
}

/// Render the report. Returns PDF bytes.
pub fn generate_report_pdf(analysis: &SoilAnalysis) -> Result<Vec<u8>, ReportError> {
    let (doc, page1, layer1) = PdfDocument::new(
        REPORT_TITLE,
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ReportError::Font(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ReportError::Font(e.to_string()))?;

    let mut cursor = PageCursor {
        layer: doc.get_page(page1).get_layer(layer1),
        doc: &doc,
        y: TOP_MM,
        pages: 1,
    };

    cursor.text(REPORT_TITLE, 18.0, LEFT_MM, &bold, 10.0);
    cursor.text(
        &format!("Date: {}", analysis.date.format("%Y-%m-%d %H:%M UTC")),
        10.0,
        LEFT_MM,
        &font,
        5.0,
    );
    cursor.text(
        &format!("Report ID: {}", analysis.id),
        10.0,
        LEFT_MM,
        &font,
        5.0,
    );
    if let Some(location) = analysis.location {
        cursor.text(
            &format!(
                "Location: {:.5}, {:.5}",
                location.latitude, location.longitude
            ),
            10.0,
            LEFT_MM,
            &font,
            5.0,
        );
    }
    cursor.gap(6.0);

    for group in NutrientGroup::ALL {
        let readings = analysis.readings(group);
        if readings.is_empty() {
            continue;
        }
        cursor.text(group.title(), 13.0, LEFT_MM, &bold, 7.0);
        for reading in readings {
            let line = format!(
                "{}: {} {} ({})",
                reading.name,
                format_value(reading.value),
                reading.unit,
                reading.status.as_str()
            );
            cursor.text(&line, 10.0, INDENT_MM, &bold, 5.0);
            for wrapped in wrap_text(&reading.recommendation, WRAP_CHARS) {
                cursor.text(&wrapped, 9.0, INDENT_MM, &font, 4.5);
            }
            cursor.gap(2.5);
        }
        cursor.gap(4.0);
    }

    cursor.gap(6.0);
    cursor.text(REPORT_FOOTER, 8.0, LEFT_MM, &font, 4.0);

    let pages = cursor.pages;
    drop(cursor);
    tracing::debug!(analysis_id = %analysis.id, pages, "Report PDF rendered");

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| ReportError::Save(e.to_string()))?;
    buf.into_inner()
        .map_err(|e| ReportError::Save(format!("buffer: {e}")))
}

/// Current write position; opens a new page when the bottom margin is reached.
struct PageCursor<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
    pages: usize,
}

impl PageCursor<'_> {
    fn text(&mut self, text: &str, size: f32, x: f32, font: &IndirectFontRef, advance: f32) {
        if self.y - advance < BOTTOM_MARGIN_MM {
            self.new_page();
        }
        self.layer.use_text(text, size, Mm(x), Mm(self.y), font);
        self.y -= advance;
    }

    fn gap(&mut self, mm: f32) {
        self.y -= mm;
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(
            Mm(PAGE_WIDTH_MM),
            Mm(PAGE_HEIGHT_MM),
            format!("Layer {}", self.pages + 1),
        );
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = TOP_MM;
        self.pages += 1;
    }
}

/// Whole values print without a fraction.
fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

/// Simple word-wrap helper for PDF text rendering.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.len() + word.len() + 1 > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
