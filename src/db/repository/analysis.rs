use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{
    AnalysisSummary, GeoLocation, NutrientGroup, NutrientReading, NutrientStatus, SoilAnalysis,
};
use crate::pipeline::analysis::SoilCharacteristics;

/// Insert an analysis and all of its readings in one transaction.
pub fn insert_analysis(conn: &Connection, analysis: &SoilAnalysis) -> Result<(), DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    let id_str = analysis.id.to_string();
    let c = &analysis.characteristics;

    tx.execute(
        "INSERT INTO analyses (id, analyzed_at, redness, organic_matter, moisture, texture, latitude, longitude)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            id_str,
            format_timestamp(&analysis.date),
            c.redness,
            c.organic_matter,
            c.moisture,
            c.texture,
            analysis.location.map(|l| l.latitude),
            analysis.location.map(|l| l.longitude),
        ],
    )?;

    {
        let mut stmt = tx.prepare(
            "INSERT INTO nutrient_readings
             (analysis_id, nutrient_group, position, name, value, unit, status, recommendation)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        for group in NutrientGroup::ALL {
            for (position, reading) in analysis.readings(group).iter().enumerate() {
                stmt.execute(params![
                    id_str,
                    group.as_str(),
                    position as i64,
                    reading.name,
                    reading.value,
                    reading.unit,
                    reading.status.as_str(),
                    reading.recommendation,
                ])?;
            }
        }
    }

    tx.commit()?;
    Ok(())
}

/// Fetch one analysis with its readings.
pub fn get_analysis(conn: &Connection, id: &Uuid) -> Result<Option<SoilAnalysis>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, analyzed_at, redness, organic_matter, moisture, texture, latitude, longitude
             FROM analyses WHERE id = ?1",
            params![id.to_string()],
            row_to_analysis_row,
        )
        .optional()?;

    match row {
        Some(row) => Ok(Some(hydrate(conn, row)?)),
        None => Ok(None),
    }
}

/// Page of analyses, newest first.
pub fn list_analyses(
    conn: &Connection,
    limit: u32,
    offset: u32,
) -> Result<Vec<SoilAnalysis>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, analyzed_at, redness, organic_matter, moisture, texture, latitude, longitude
         FROM analyses
         ORDER BY analyzed_at DESC, rowid DESC
         LIMIT ?1 OFFSET ?2",
    )?;
    let rows = stmt
        .query_map(params![limit as i64, offset as i64], row_to_analysis_row)?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter().map(|row| hydrate(conn, row)).collect()
}

/// History view: same ordering and paging as [`list_analyses`].
pub fn list_analysis_summaries(
    conn: &Connection,
    limit: u32,
    offset: u32,
) -> Result<Vec<AnalysisSummary>, DatabaseError> {
    Ok(list_analyses(conn, limit, offset)?
        .iter()
        .map(AnalysisSummary::from)
        .collect())
}

/// Delete an analysis. Its readings go with it (ON DELETE CASCADE).
pub fn delete_analysis(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let affected = conn.execute(
        "DELETE FROM analyses WHERE id = ?1",
        params![id.to_string()],
    )?;
    if affected == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "analysis".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn count_analyses(conn: &Connection) -> Result<u64, DatabaseError> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM analyses", [], |row| row.get(0))?;
    Ok(count as u64)
}

fn format_timestamp(date: &DateTime<Utc>) -> String {
    // Fixed width so lexical order matches chronological order
    date.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

struct AnalysisRow {
    id: String,
    analyzed_at: String,
    characteristics: SoilCharacteristics,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

fn row_to_analysis_row(row: &rusqlite::Row) -> Result<AnalysisRow, rusqlite::Error> {
    Ok(AnalysisRow {
        id: row.get(0)?,
        analyzed_at: row.get(1)?,
        characteristics: SoilCharacteristics {
            redness: row.get(2)?,
            organic_matter: row.get(3)?,
            moisture: row.get(4)?,
            texture: row.get(5)?,
        },
        latitude: row.get(6)?,
        longitude: row.get(7)?,
    })
}

fn hydrate(conn: &Connection, row: AnalysisRow) -> Result<SoilAnalysis, DatabaseError> {
    let corrupt = |reason: String| DatabaseError::CorruptRecord {
        id: row.id.clone(),
        reason,
    };

    let id = Uuid::parse_str(&row.id).map_err(|e| corrupt(e.to_string()))?;
    let date = DateTime::parse_from_rfc3339(&row.analyzed_at)
        .map_err(|e| corrupt(format!("analyzed_at: {e}")))?
        .with_timezone(&Utc);
    let location = match (row.latitude, row.longitude) {
        (Some(latitude), Some(longitude)) => Some(GeoLocation {
            latitude,
            longitude,
        }),
        _ => None,
    };

    let mut analysis = SoilAnalysis {
        id,
        date,
        characteristics: row.characteristics,
        primary_nutrients: Vec::new(),
        secondary_nutrients: Vec::new(),
        trace_elements: Vec::new(),
        physical_properties: Vec::new(),
        location,
    };

    let mut stmt = conn.prepare(
        "SELECT nutrient_group, name, value, unit, status, recommendation
         FROM nutrient_readings
         WHERE analysis_id = ?1
         ORDER BY position ASC",
    )?;
    let readings = stmt
        .query_map(params![row.id], |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, f64>(2)?,
                r.get::<_, String>(3)?,
                r.get::<_, String>(4)?,
                r.get::<_, String>(5)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    for (group_str, name, value, unit, status_str, recommendation) in readings {
        let group = NutrientGroup::from_str(&group_str)?;
        let status = NutrientStatus::from_str(&status_str)?;
        analysis.readings_mut(group).push(NutrientReading {
            name,
            value,
            unit,
            status,
            recommendation,
        });
    }

    Ok(analysis)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::pipeline::analysis::orchestrator::test_support::{FixedClock, SequentialIds};
    use crate::pipeline::analysis::{NutrientCatalog, PixelBuffer, SoilAnalyzer};

    fn test_db() -> Connection {
        open_memory_database().unwrap()
    }

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 8, 0, 0).unwrap()
    }

    fn make_analysis(id: u128, minutes_after: i64) -> SoilAnalysis {
        let analyzer = SoilAnalyzer::new(Arc::new(NutrientCatalog::standard()))
            .with_clock(Box::new(FixedClock(base_time() + Duration::minutes(minutes_after))))
            .with_id_generator(Box::new(SequentialIds::default()));
        let mut analysis = analyzer
            .analyze(&PixelBuffer::from_pixels(&[
                [100, 60, 20, 255],
                [150, 100, 40, 255],
                [90, 50, 30, 255],
            ]))
            .unwrap();
        analysis.id = Uuid::from_u128(id);
        analysis
    }

    #[test]
    fn insert_and_get_round_trips_report() {
        let conn = test_db();
        let analysis = make_analysis(1, 0).with_location(Some(GeoLocation {
            latitude: -1.29,
            longitude: 36.82,
        }));
        insert_analysis(&conn, &analysis).unwrap();

        let loaded = get_analysis(&conn, &analysis.id).unwrap().unwrap();
        assert_eq!(loaded, analysis);
    }

    #[test]
    fn get_missing_returns_none() {
        let conn = test_db();
        assert!(get_analysis(&conn, &Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn list_is_newest_first_and_paged() {
        let conn = test_db();
        for (id, minutes) in [(1, 0), (2, 30), (3, 10)] {
            insert_analysis(&conn, &make_analysis(id, minutes)).unwrap();
        }

        let all = list_analyses(&conn, 10, 0).unwrap();
        let ids: Vec<Uuid> = all.iter().map(|a| a.id).collect();
        assert_eq!(
            ids,
            [Uuid::from_u128(2), Uuid::from_u128(3), Uuid::from_u128(1)]
        );

        let page = list_analyses(&conn, 1, 1).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, Uuid::from_u128(3));
    }

    #[test]
    fn summaries_carry_primary_findings() {
        let conn = test_db();
        insert_analysis(&conn, &make_analysis(7, 0)).unwrap();

        let summaries = list_analysis_summaries(&conn, 10, 0).unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].short_id, "00000000");
        assert_eq!(summaries[0].key_findings.len(), 3);
        assert_eq!(summaries[0].key_findings[0].name, "Nitrogen (N)");
    }

    #[test]
    fn delete_removes_analysis_and_readings() {
        let conn = test_db();
        let analysis = make_analysis(1, 0);
        insert_analysis(&conn, &analysis).unwrap();
        assert_eq!(count_analyses(&conn).unwrap(), 1);

        delete_analysis(&conn, &analysis.id).unwrap();
        assert_eq!(count_analyses(&conn).unwrap(), 0);
        let orphans: i64 = conn
            .query_row("SELECT COUNT(*) FROM nutrient_readings", [], |r| r.get(0))
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[test]
    fn delete_missing_is_not_found() {
        let conn = test_db();
        let err = delete_analysis(&conn, &Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[test]
    fn duplicate_insert_fails_without_partial_rows() {
        let conn = test_db();
        let analysis = make_analysis(1, 0);
        insert_analysis(&conn, &analysis).unwrap();
        assert!(insert_analysis(&conn, &analysis).is_err());
        assert_eq!(count_analyses(&conn).unwrap(), 1);
        let readings: i64 = conn
            .query_row("SELECT COUNT(*) FROM nutrient_readings", [], |r| r.get(0))
            .unwrap();
        assert_eq!(readings, 11);
    }
}
