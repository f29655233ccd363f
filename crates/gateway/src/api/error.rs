//! The OpenAI-compatible error envelope for every locally-generated
//! failure:
//!
//! ```json
//! { "error": { "type": "...", "message": "...", "code": "..." } }
//! ```
//!
//! Upstream-generated errors never pass through here — the proxy mirrors
//! their status and body verbatim, because OpenAI-compatible upstreams
//! already speak this shape.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

use mg_domain::error::Error;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Error types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The fixed set of envelope `type` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorType {
    InvalidRequest,
    Authentication,
    Permission,
    NotFound,
    RateLimit,
    Upstream,
    Timeout,
    Internal,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::InvalidRequest => "invalid_request_error",
            ErrorType::Authentication => "authentication_error",
            ErrorType::Permission => "permission_error",
            ErrorType::NotFound => "not_found_error",
            ErrorType::RateLimit => "rate_limit_error",
            ErrorType::Upstream => "upstream_error",
            ErrorType::Timeout => "timeout_error",
            ErrorType::Internal => "internal_error",
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ApiError
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A locally-generated error, ready to serialize as the wire envelope.
///
/// Messages are safe to show to end users: no credentials, no config
/// contents, no stack traces. Internal detail only appears when the
/// server debug flag is on.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub error_type: ErrorType,
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn invalid_request(code: &str, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error_type: ErrorType::InvalidRequest,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn content_length_mismatch(declared: u64, actual: usize) -> Self {
        Self::invalid_request(
            "content_length_mismatch",
            format!("Content-Length header declares {declared} bytes but the body is {actual} bytes"),
        )
    }

    pub fn model_not_found(model: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            error_type: ErrorType::NotFound,
            code: "model_not_found".into(),
            message: format!("model \"{model}\" is not configured"),
        }
    }

    pub fn request_too_large(limit: usize) -> Self {
        Self {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            error_type: ErrorType::InvalidRequest,
            code: "request_too_large".into(),
            message: format!("request body exceeds the {limit}-byte limit"),
        }
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            error_type: ErrorType::Upstream,
            code: "upstream_unreachable".into(),
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::GATEWAY_TIMEOUT,
            error_type: ErrorType::Timeout,
            code: "upstream_timeout".into(),
            message: message.into(),
        }
    }

    pub fn internal(debug: bool, detail: impl Into<String>) -> Self {
        let message = if debug {
            detail.into()
        } else {
            "internal server error".into()
        };
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error_type: ErrorType::Internal,
            code: "internal_error".into(),
            message,
        }
    }

    /// Map a transport failure from the upstream call site.
    pub fn from_upstream_error(e: &Error, debug: bool) -> Self {
        match e {
            Error::Timeout(detail) => Self::timeout(format!("upstream timed out: {detail}")),
            Error::Http(detail) => Self::upstream(format!("upstream request failed: {detail}")),
            other => Self::internal(debug, other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": {
                "type": self.error_type.as_str(),
                "message": self.message,
                "code": self.code,
            }
        });
        (self.status, Json(body)).into_response()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Router fallbacks
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Unknown path. Registered so no request falls through to the
/// framework's bare default.
pub async fn not_found() -> ApiError {
    ApiError {
        status: StatusCode::NOT_FOUND,
        error_type: ErrorType::NotFound,
        code: "unknown_endpoint".into(),
        message: "unknown endpoint".into(),
    }
}

/// Known path, wrong method.
pub async fn method_not_allowed() -> ApiError {
    ApiError {
        status: StatusCode::METHOD_NOT_ALLOWED,
        error_type: ErrorType::InvalidRequest,
        code: "method_not_allowed".into(),
        message: "method not allowed for this endpoint".into(),
    }
}
