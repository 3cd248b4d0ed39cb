//! Mapping of analysis failures onto HTTP responses.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use plastiscan_core::ScanError;
use serde_json::json;

/// An error ready to be sent to a client: status, stable kind, message.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub kind: &'static str,
    pub message: String,
    pub retry_after: Option<u64>,
}

impl ApiError {
    pub fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    pub fn rate_limited(retry_after: u64) -> Self {
        Self {
            retry_after: Some(retry_after),
            ..Self::new(
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                "too many analyses from this client, try again shortly",
            )
        }
    }

    /// Body-extraction failures keep axum's status (413 for oversized bodies).
    pub fn from_rejection(status: StatusCode, message: String) -> Self {
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            Self::new(status, "payload_too_large", message)
        } else {
            Self::bad_request(message)
        }
    }
}

pub fn status_for(err: &ScanError) -> StatusCode {
    match err {
        ScanError::NoImages | ScanError::TooManyImages { .. } | ScanError::InvalidDataUrl => {
            StatusCode::BAD_REQUEST
        }
        ScanError::ImageTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        ScanError::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        ScanError::Blocked(_) | ScanError::EmptyResponse | ScanError::MalformedReport(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ScanError::Provider { .. } => StatusCode::BAD_GATEWAY,
        ScanError::Config(_) | ScanError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<ScanError> for ApiError {
    fn from(err: ScanError) -> Self {
        let status = status_for(&err);
        let message = match &err {
            ScanError::Other(_) | ScanError::Config(_) => "internal server error".to_string(),
            other => other.to_string(),
        };
        if status.is_server_error() {
            tracing::error!(error = %err, kind = err.kind(), "Analysis failed");
        } else {
            tracing::warn!(error = %err, kind = err.kind(), "Analysis rejected");
        }
        Self::new(status, err.kind(), message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (
            self.status,
            Json(json!({ "error": self.message, "kind": self.kind })),
        )
            .into_response();
        if let Some(secs) = self.retry_after {
            if let Ok(v) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, v);
            }
        }
        response
    }
}
