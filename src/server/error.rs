//! HTTP error envelope.
//!
//! Every failure leaves the service as `{code, message}` JSON with
//! `cache-control: no-store`. Messages are fixed strings; upstream error text
//! never reaches the client.

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::AskError;

/// Client-facing failure classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// 400 with `BAD_REQUEST` or `INVALID_PARAMS`.
    BadRequest { code: &'static str, message: String },
    /// 503, the breaker is open.
    ServiceUnavailable,
    /// 502, anything else once retries are exhausted.
    RagError,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::RagError => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn code(&self) -> &str {
        match self {
            ApiError::BadRequest { code, .. } => code,
            ApiError::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            ApiError::RagError => "RAG_ERROR",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest { message, .. } => message,
            ApiError::ServiceUnavailable => "Service temporarily unavailable",
            ApiError::RagError => "Try again later",
        }
    }
}

impl From<AskError> for ApiError {
    fn from(err: AskError) -> Self {
        match err {
            AskError::Validation { code, message } => ApiError::BadRequest { code, message },
            AskError::CircuitOpen { .. } => ApiError::ServiceUnavailable,
            _ => ApiError::RagError,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.code(),
            message: self.message(),
        };
        let mut response = (self.status(), Json(body)).into_response();
        response
            .headers_mut()
            .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        response
    }
}
