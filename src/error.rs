use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::Provider;

pub type Result<T, E = GatewayError> = std::result::Result<T, E>;

/// Every failure a request can end in. Each variant maps to one HTTP status.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{0}")]
    Auth(String),

    #[error("{0} not connected")]
    ConnectionRequired(Provider),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Vendor(String),
}

impl GatewayError {
    pub fn missing_field(provider: Provider, field: &str) -> Self {
        Self::Vendor(format!("{} payload missing required field '{}'", provider, field))
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Auth(_) => "auth_error",
            Self::ConnectionRequired(_) => "connection_required",
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "validation_error",
            Self::Vendor(_) => "vendor_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
            Self::ConnectionRequired(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Vendor(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Vendor(format!("vendor request timed out: {}", e))
        } else {
            Self::Vendor(format!("vendor request failed: {}", e))
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.code(),
            "message": self.to_string(),
        }));
        (self.status(), body).into_response()
    }
}
