//! API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`.
//!
//! Layers (outermost first): request tracing, CORS, body size limit.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the API router with all endpoints under `/api/`.
pub fn api_router(core: Arc<CoreState>, max_upload_bytes: usize) -> Router {
    build_router(ApiContext::new(core, max_upload_bytes))
}

fn build_router(ctx: ApiContext) -> Router {
    let body_limit = ctx.body_limit();

    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let routes = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/catalog", get(endpoints::catalog::get))
        .route("/analyze", post(endpoints::analyze::upload))
        .route("/analyze/data-url", post(endpoints::analyze::data_url))
        .route("/history", get(endpoints::history::list))
        .route(
            "/history/:id",
            get(endpoints::history::detail).delete(endpoints::history::delete),
        )
        .route(
            "/history/:id/report.pdf",
            get(endpoints::history::report_pdf),
        )
        .route("/history/:id/crops", get(endpoints::history::crops))
        .with_state(ctx);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any);

    Router::new()
        .nest("/api", routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use base64::Engine;
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::pipeline::analysis::decode::test_support::png_bytes;
    use crate::pipeline::analysis::{NutrientCatalog, SoilAnalyzer};

    const BOUNDARY: &str = "soilsense-test-boundary";
    const BROWN: [u8; 3] = [110, 70, 30];
    const BLUE: [u8; 3] = [30, 60, 220];

    fn test_router() -> Router {
        test_router_with_limit(5 * 1024 * 1024)
    }

    fn test_router_with_limit(max_upload_bytes: usize) -> Router {
        let analyzer = SoilAnalyzer::new(Arc::new(NutrientCatalog::standard()));
        let core = Arc::new(CoreState::in_memory(analyzer).unwrap());
        api_router(core, max_upload_bytes)
    }

    fn multipart_body(image: &[u8], fields: &[(&str, &str)]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"soil.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(image);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn multipart_request(image: &[u8], fields: &[(&str, &str)]) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/analyze")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(image, fields)))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn upload_brown(app: &Router) -> serde_json::Value {
        let response = app
            .clone()
            .oneshot(multipart_request(&png_bytes(16, 16, BROWN), &[]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        json(response).await
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let response = test_router().oneshot(get_request("/api/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["nutrients_tracked"], 11);
        assert_eq!(body["analyses_stored"], 0);
    }

    #[tokio::test]
    async fn catalog_lists_groups() {
        let response = test_router().oneshot(get_request("/api/catalog")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["primary"][0]["name"], "Nitrogen (N)");
        assert_eq!(body["physical"][0]["unit"], "pH");
    }

    #[tokio::test]
    async fn multipart_upload_returns_report() {
        let app = test_router();
        let response = app
            .clone()
            .oneshot(multipart_request(
                &png_bytes(16, 16, BROWN),
                &[("latitude", "-1.2921"), ("longitude", "36.8219")],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = json(response).await;
        assert_eq!(body["primaryNutrients"].as_array().unwrap().len(), 3);
        assert_eq!(body["traceElements"].as_array().unwrap().len(), 4);
        assert_eq!(body["physicalProperties"][0]["name"], "pH Level");
        assert_eq!(body["location"]["latitude"], -1.2921);
        assert!(body["characteristics"]["organicMatter"].is_number());
    }

    #[tokio::test]
    async fn non_soil_upload_returns_422() {
        let response = test_router()
            .oneshot(multipart_request(&png_bytes(16, 16, BLUE), &[]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json(response).await;
        assert_eq!(body["error"]["code"], "NOT_SOIL_IMAGE");
        assert_eq!(
            body["error"]["message"],
            "The uploaded image does not appear to be a soil sample. Please upload a clear image of soil."
        );
    }

    #[tokio::test]
    async fn undecodable_upload_returns_400() {
        let response = test_router()
            .oneshot(multipart_request(&[0x42; 300], &[]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(response).await["error"]["code"], "DECODE_FAILED");
    }

    #[tokio::test]
    async fn missing_image_field_returns_400() {
        let body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"latitude\"\r\n\r\n1.0\r\n--{BOUNDARY}--\r\n"
        );
        let request = Request::builder()
            .method("POST")
            .uri("/api/analyze")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        let response = test_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn oversized_upload_returns_413() {
        let image = png_bytes(64, 64, BROWN);
        let app = test_router_with_limit(image.len() - 1);
        let response = app.oneshot(multipart_request(&image, &[])).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn data_url_upload_returns_report() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(png_bytes(8, 8, BROWN));
        let payload = serde_json::json!({
            "data": format!("data:image/png;base64,{encoded}"),
        });
        let request = Request::builder()
            .method("POST")
            .uri("/api/analyze/data-url")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap();
        let response = test_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(json(response).await.get("location").is_none());
    }

    #[tokio::test]
    async fn data_url_with_half_location_returns_400() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(png_bytes(8, 8, BROWN));
        let payload = serde_json::json!({ "data": encoded, "latitude": 10.0 });
        let request = Request::builder()
            .method("POST")
            .uri("/api/analyze/data-url")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap();
        let response = test_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn history_round_trip() {
        let app = test_router();
        let first = upload_brown(&app).await;
        let second = upload_brown(&app).await;
        let id = first["id"].as_str().unwrap().to_string();

        let response = app.clone().oneshot(get_request("/api/history")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let page = json(response).await;
        assert_eq!(page["total"], 2);
        assert_eq!(page["items"].as_array().unwrap().len(), 2);
        assert_eq!(page["items"][0]["keyFindings"].as_array().unwrap().len(), 3);

        let response = app
            .clone()
            .oneshot(get_request("/api/history?limit=1&offset=0"))
            .await
            .unwrap();
        let page = json(response).await;
        assert_eq!(page["items"].as_array().unwrap().len(), 1);

        let response = app
            .clone()
            .oneshot(get_request(&format!("/api/history/{id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await, first);

        let delete = Request::builder()
            .method("DELETE")
            .uri(format!("/api/history/{id}"))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(delete).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .clone()
            .oneshot(get_request(&format!("/api/history/{id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let other = second["id"].as_str().unwrap();
        let response = app
            .oneshot(get_request(&format!("/api/history/{other}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn delete_unknown_returns_404() {
        let request = Request::builder()
            .method("DELETE")
            .uri(format!("/api/history/{}", Uuid::new_v4()))
            .body(Body::empty())
            .unwrap();
        let response = test_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_id_returns_400() {
        let response = test_router()
            .oneshot(get_request("/api/history/not-a-uuid"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn report_pdf_download() {
        let app = test_router();
        let analysis = upload_brown(&app).await;
        let id = analysis["id"].as_str().unwrap();

        let response = app
            .oneshot(get_request(&format!("/api/history/{id}/report.pdf")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/pdf"
        );
        let disposition = response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.contains(&format!("soil-analysis-{id}.pdf")));
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[tokio::test]
    async fn crop_suggestions_for_stored_analysis() {
        let app = test_router();
        let analysis = upload_brown(&app).await;
        let id = analysis["id"].as_str().unwrap();

        let response = app
            .oneshot(get_request(&format!("/api/history/{id}/crops")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let crops = json(response).await;
        assert!(crops.is_array());
        for crop in crops.as_array().unwrap() {
            assert_eq!(crop["confidence"], "High");
        }
    }
}
