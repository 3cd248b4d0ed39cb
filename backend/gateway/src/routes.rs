//! Route handlers.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequest, Multipart, Request, State},
    http::{header, HeaderMap},
    response::{Html, IntoResponse, Response},
    Json,
};
use plastiscan_analysis::response_schema;
use plastiscan_core::AnalysisOutcome;
use plastiscan_report::{render_dashboard, render_upload_page, Thumbnail};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::rate_limit::client_key;
use crate::server::GatewayState;
use crate::upload::{read_multipart, AnalyzeJson, Submission};

pub async fn upload_page() -> Html<String> {
    Html(render_upload_page(None))
}

pub async fn health(State(state): State<GatewayState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "plastiscan",
        "version": env!("CARGO_PKG_VERSION"),
        "provider": state.analyzer.provider_name(),
        "model": state.analyzer.model(),
    }))
}

pub async fn schema() -> Json<Value> {
    Json(response_schema())
}

async fn check_rate(
    state: &GatewayState,
    headers: &HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
) -> Result<(), ApiError> {
    let client = client_key(headers, peer.map(|ConnectInfo(addr)| addr));
    if state.limiter.check_limit(&client).await {
        Ok(())
    } else {
        Err(ApiError::rate_limited(state.limiter.retry_after(&client).await))
    }
}

async fn run(state: &GatewayState, submission: Submission) -> Result<AnalysisOutcome, ApiError> {
    Ok(state
        .analyzer
        .analyze(submission.images, submission.notes.as_deref())
        .await?)
}

/// `POST /analyze`: the browser form. Failures re-render the form.
pub async fn analyze_form(
    State(state): State<GatewayState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let result = async {
        check_rate(&state, &headers, peer).await?;
        let submission = read_multipart(multipart).await?;
        let thumbnails: Vec<Thumbnail> = submission.images.iter().map(Thumbnail::from_image).collect();
        let outcome = run(&state, submission).await?;
        Ok::<_, ApiError>(render_dashboard(&outcome, &thumbnails))
    }
    .await;

    match result {
        Ok(page) => Html(page).into_response(),
        Err(err) => {
            let mut response = (err.status, Html(render_upload_page(Some(&err.message)))).into_response();
            if let Some(secs) = err.retry_after {
                if let Ok(v) = secs.to_string().parse() {
                    response.headers_mut().insert(header::RETRY_AFTER, v);
                }
            }
            response
        }
    }
}

/// `POST /api/analyze`: multipart or JSON `{ images: [dataUrl], notes }`.
pub async fn analyze_api(
    State(state): State<GatewayState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    request: Request,
) -> Result<Json<AnalysisOutcome>, ApiError> {
    let headers = request.headers().clone();
    check_rate(&state, &headers, peer).await?;

    let is_multipart = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    let submission = if is_multipart {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| ApiError::from_rejection(e.status(), e.body_text()))?;
        read_multipart(multipart).await?
    } else {
        let Json(body) = Json::<AnalyzeJson>::from_request(request, &state)
            .await
            .map_err(|e| ApiError::from_rejection(e.status(), e.body_text()))?;
        Submission::try_from(body)?
    };

    Ok(Json(run(&state, submission).await?))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::{to_bytes, Body},
        http::{header::CONTENT_TYPE, Request, StatusCode},
        Router,
    };
    use base64::{engine::general_purpose::STANDARD, Engine};
    use plastiscan_analysis::{Analyzer, MockProvider};
    use plastiscan_imaging::ImageLimits;
    use tower::ServiceExt;

    use crate::rate_limit::RateLimiter;
    use crate::server::{build_router, GatewayState};

    const BODY_LIMIT: usize = 1_048_576;
    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];
    const BOUNDARY: &str = "plastiscan-test-boundary";

    fn app_with(provider: MockProvider, max_requests: u32, max_upload_bytes: usize) -> Router {
        let analyzer = Analyzer::new(
            Arc::new(provider),
            "mock",
            0.2,
            ImageLimits {
                max_images: 2,
                max_image_bytes: 1024,
            },
        );
        build_router(GatewayState::new(
            analyzer,
            RateLimiter::new(max_requests, Duration::from_secs(60)),
            max_upload_bytes,
        ))
    }

    fn app() -> Router {
        app_with(MockProvider::new("mock"), 0, BODY_LIMIT)
    }

    fn png_data_url() -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(PNG))
    }

    fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    fn multipart_request(uri: &str, files: &[(&str, &[u8])], notes: Option<&str>) -> Request<Body> {
        let mut body: Vec<u8> = Vec::new();
        for (name, data) in files {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"{name}\"\r\nContent-Type: image/png\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        if let Some(notes) = notes {
            body.extend_from_slice(
                format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"notes\"\r\n\r\n{notes}\r\n").as_bytes(),
            );
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .expect("request")
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), BODY_LIMIT).await.expect("read body");
        serde_json::from_slice(&bytes).expect("parse json")
    }

    async fn text_body(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), BODY_LIMIT).await.expect("read body");
        String::from_utf8(bytes.to_vec()).expect("utf8")
    }

    #[tokio::test]
    async fn index_serves_upload_form() {
        let request = Request::builder().uri("/").body(Body::empty()).expect("request");
        let response = app().oneshot(request).await.expect("router call");
        assert_eq!(response.status(), StatusCode::OK);
        assert!(text_body(response).await.contains("multipart/form-data"));
    }

    #[tokio::test]
    async fn health_reports_provider_and_model() {
        let request = Request::builder().uri("/api/health").body(Body::empty()).expect("request");
        let response = app().oneshot(request).await.expect("router call");
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["provider"], "mock");
        assert_eq!(json["model"], "mock");
    }

    #[tokio::test]
    async fn schema_endpoint_returns_response_schema() {
        let request = Request::builder().uri("/api/schema").body(Body::empty()).expect("request");
        let response = app().oneshot(request).await.expect("router call");
        let json = json_body(response).await;
        assert!(json["properties"]["severityScore"].is_object());
    }

    #[tokio::test]
    async fn json_analysis_returns_outcome() {
        let request = json_request(
            "/api/analyze",
            serde_json::json!({ "images": [png_data_url()], "notes": "river sample" }),
        );
        let response = app().oneshot(request).await.expect("router call");
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["provider"], "mock");
        assert_eq!(json["imageCount"], 1);
        assert_eq!(json["severityLevel"], "moderate");
        assert_eq!(json["report"]["severityScore"], 6);
    }

    #[tokio::test]
    async fn multipart_api_analysis_returns_outcome() {
        let request = multipart_request("/api/analyze", &[("a.png", PNG), ("b.png", PNG)], None);
        let response = app().oneshot(request).await.expect("router call");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["imageCount"], 2);
    }

    #[tokio::test]
    async fn empty_image_list_is_bad_request() {
        let request = json_request("/api/analyze", serde_json::json!({ "images": [] }));
        let response = app().oneshot(request).await.expect("router call");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["kind"], "no_images");
    }

    #[tokio::test]
    async fn non_image_payload_is_unsupported() {
        let url = format!("data:text/plain;base64,{}", STANDARD.encode(b"hello"));
        let request = json_request("/api/analyze", serde_json::json!({ "images": [url] }));
        let response = app().oneshot(request).await.expect("router call");
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(json_body(response).await["kind"], "unsupported_media_type");
    }

    #[tokio::test]
    async fn provider_failure_is_bad_gateway() {
        let app = app_with(MockProvider::new("mock").with_failure("upstream 503"), 0, BODY_LIMIT);
        let request = json_request("/api/analyze", serde_json::json!({ "images": [png_data_url()] }));
        let response = app.oneshot(request).await.expect("router call");
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(json_body(response).await["kind"], "provider_error");
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let app = app_with(MockProvider::new("mock"), 0, 64);
        let request = json_request(
            "/api/analyze",
            serde_json::json!({ "images": [png_data_url(), png_data_url(), png_data_url()] }),
        );
        let response = app.oneshot(request).await.expect("router call");
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn rate_limit_applies_per_client() {
        let app = app_with(MockProvider::new("mock"), 1, BODY_LIMIT);
        let make = || {
            let mut request = json_request("/api/analyze", serde_json::json!({ "images": [png_data_url()] }));
            request
                .headers_mut()
                .insert("x-forwarded-for", "198.51.100.4".parse().expect("header"));
            request
        };

        let first = app.clone().oneshot(make()).await.expect("router call");
        assert_eq!(first.status(), StatusCode::OK);
        let second = app.oneshot(make()).await.expect("router call");
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(json_body(second).await["kind"], "rate_limited");
    }

    #[tokio::test]
    async fn form_submission_renders_dashboard() {
        let request = multipart_request("/analyze", &[("slide.png", PNG)], Some("tap water, 1 L"));
        let response = app().oneshot(request).await.expect("router call");
        assert_eq!(response.status(), StatusCode::OK);
        let page = text_body(response).await;
        assert!(page.contains("Severity 6/10"));
        assert!(page.contains("data:image/png;base64,"));
        assert!(page.contains("Analyze more samples"));
    }

    #[tokio::test]
    async fn form_without_images_rerenders_upload_page() {
        let request = multipart_request("/analyze", &[], Some("forgot the files"));
        let response = app().oneshot(request).await.expect("router call");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let page = text_body(response).await;
        assert!(page.contains("class=\"banner\""));
        assert!(page.contains("no images were provided"));
    }
}
