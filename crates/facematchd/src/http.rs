//! HTTP front end.
//!
//! `POST /compare` — compare two base64 face images
//! `GET /health`   — liveness and model info
//! `GET /`         — API metadata
//! `GET /docs`     — Swagger UI over `/api-docs/openapi.json`

use crate::engine::EngineHandle;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use facematch_core::{CompareRequest, CompareResponse, MODEL_NAME};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub const SERVICE_NAME: &str = "Face Comparison API";
const SERVICE_DESCRIPTION: &str = "Face comparison using InsightFace for KYC verification";

/// Shared state for all handlers.
pub struct AppState {
    pub engine: EngineHandle,
    pub model: String,
}

impl AppState {
    pub fn new(engine: EngineHandle) -> Arc<Self> {
        Arc::new(Self {
            engine,
            model: MODEL_NAME.to_string(),
        })
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(compare_handler, health_handler, root_handler),
    components(schemas(CompareRequest, CompareResponse))
)]
pub struct ApiDoc;

/// Build the router.
pub fn create_app(state: Arc<AppState>, body_limit: usize) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/compare", post(compare_handler))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .with_state(state)
}

/// Compare two face images.
///
/// Business-logic failures (bad image, no face, embedder error) are 200 with
/// `success: false`; only a dead engine thread yields 503.
#[utoipa::path(
    post,
    path = "/compare",
    request_body = CompareRequest,
    responses(
        (status = 200, description = "Comparison result, `success: false` on a business failure", body = CompareResponse),
        (status = 413, description = "Request body over the configured limit"),
        (status = 422, description = "Missing or mistyped image field"),
        (status = 503, description = "Comparison engine unavailable", body = CompareResponse),
    )
)]
pub async fn compare_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CompareRequest>,
) -> (StatusCode, Json<CompareResponse>) {
    tracing::info!(
        aadhaar_len = req.aadhaar_face_image.len(),
        live_len = req.live_image.len(),
        "starting face comparison"
    );

    match state.engine.compare(req.aadhaar_face_image, req.live_image).await {
        Ok(result) => (StatusCode::OK, Json(CompareResponse::from(&result))),
        Err(e) => {
            tracing::error!(error = %e, "comparison engine unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(CompareResponse::error(format!("Face comparison failed: {e}"))),
            )
        }
    }
}

#[utoipa::path(get, path = "/health", responses((status = 200, description = "Service is up")))]
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "model": state.model,
        "service": SERVICE_NAME,
    }))
}

#[utoipa::path(get, path = "/", responses((status = 200, description = "Service metadata")))]
pub async fn root_handler() -> Json<Value> {
    Json(json!({
        "name": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "description": SERVICE_DESCRIPTION,
        "endpoints": {
            "POST /compare": "Compare two face images",
            "GET /health": "Health check",
            "GET /docs": "API documentation",
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::spawn_engine;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use facematch_core::{EmbedderError, Embedding, FaceEmbedder, MatchPolicy, PixelImage};
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use tower::ServiceExt;

    const BODY_LIMIT: usize = 1024;

    /// Blue pixels carry no face; other colours embed as their RGB triple.
    struct ColorEmbedder;

    impl FaceEmbedder for ColorEmbedder {
        fn embed(&mut self, image: &PixelImage) -> Result<Option<Embedding>, EmbedderError> {
            let [r, g, b] = image.pixel(0, 0);
            if b > 0 {
                return Ok(None);
            }
            Ok(Some(Embedding::new(vec![r as f32, g as f32, 0.0])))
        }
    }

    fn png(rgb: [u8; 3]) -> String {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(3, 3, Rgb(rgb)));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        STANDARD.encode(buf.into_inner())
    }

    fn state() -> Arc<AppState> {
        let engine = spawn_engine(ColorEmbedder, MatchPolicy::default(), 4).unwrap();
        AppState::new(engine)
    }

    async fn compare(aadhaar: String, live: String) -> (StatusCode, Value) {
        let req = CompareRequest {
            aadhaar_face_image: aadhaar,
            live_image: live,
        };
        let (status, Json(resp)) = compare_handler(State(state()), Json(req)).await;
        (status, serde_json::to_value(resp).unwrap())
    }

    #[tokio::test]
    async fn test_compare_match() {
        let (status, body) = compare(png([200, 10, 0]), format!("data:image/png;base64,{}", png([200, 10, 0]))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["match"], json!(true));
        assert_eq!(body["similarity"], json!(100.0));
        assert_eq!(body["raw_similarity"], json!(1.0));
        assert_eq!(body["threshold"], json!(75));
        assert!(body.get("error").is_none());
    }

    #[tokio::test]
    async fn test_compare_no_match() {
        let (status, body) = compare(png([255, 0, 0]), png([0, 255, 0])).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["match"], json!(false));
        assert_eq!(body["similarity"], json!(50.0));
        assert_eq!(body["raw_similarity"], json!(0.0));
    }

    #[tokio::test]
    async fn test_compare_no_face_is_ok_status() {
        let (status, body) = compare(png([255, 0, 0]), png([0, 0, 255])).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(false));
        let error = body["error"].as_str().unwrap();
        assert!(error.contains("live image"), "{error}");
        assert!(body.get("similarity").is_none());
    }

    #[tokio::test]
    async fn test_compare_invalid_image() {
        let (status, body) = compare("data:image/png;base64,!!!".into(), png([255, 0, 0])).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(false));
        assert!(body["error"].as_str().unwrap().starts_with("invalid image format"));
    }

    #[tokio::test]
    async fn test_health() {
        let Json(body) = health_handler(State(state())).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["model"], "InsightFace buffalo_l");
        assert_eq!(body["service"], SERVICE_NAME);
    }

    #[tokio::test]
    async fn test_root_lists_endpoints() {
        let Json(body) = root_handler().await;
        assert_eq!(body["name"], SERVICE_NAME);
        assert!(body["endpoints"].get("POST /compare").is_some());
        assert!(body["endpoints"].get("GET /health").is_some());
        assert!(body["endpoints"].get("GET /docs").is_some());
    }

    async fn send(request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = create_app(state(), BODY_LIMIT).oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    fn post_json(uri: &str, body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::CONTENT_LENGTH, body.len())
            .body(Body::from(body))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_router_compare() {
        let body = json!({ "aadhaarFaceImage": png([200, 10, 0]), "liveImage": png([200, 10, 0]) });
        let (status, bytes) = send(post_json("/compare", body.to_string())).await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["match"], json!(true));
        assert_eq!(body["threshold"], json!(75));
    }

    #[tokio::test]
    async fn test_router_missing_field_is_unprocessable() {
        let (status, _) = send(post_json("/compare", json!({ "liveImage": "x" }).to_string())).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_router_invalid_json_is_client_error() {
        let (status, _) = send(post_json("/compare", "{not json".to_string())).await;
        assert!(status.is_client_error(), "{status}");
    }

    #[tokio::test]
    async fn test_router_body_over_limit() {
        let body = json!({ "aadhaarFaceImage": "A".repeat(BODY_LIMIT * 2), "liveImage": "B" });
        let (status, _) = send(post_json("/compare", body.to_string())).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_router_health_and_root() {
        let (status, bytes) = send(get_request("/health")).await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "healthy");

        let (status, bytes) = send(get_request("/")).await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["name"], SERVICE_NAME);
    }

    #[tokio::test]
    async fn test_router_compare_rejects_get() {
        let (status, _) = send(get_request("/compare")).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_router_serves_docs() {
        let (status, bytes) = send(get_request("/api-docs/openapi.json")).await;
        assert_eq!(status, StatusCode::OK);
        let doc: Value = serde_json::from_slice(&bytes).unwrap();
        for path in ["/compare", "/health", "/"] {
            assert!(doc["paths"].get(path).is_some(), "missing {path}");
        }
        assert!(doc["components"]["schemas"].get("CompareRequest").is_some());

        let (status, _) = send(get_request("/docs")).await;
        assert!(status.is_success() || status.is_redirection(), "{status}");
    }
}
