//! Exporter error type with an HTTP rendering.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use scopestat_core::StatsError;

pub type Result<T> = std::result::Result<T, ExportError>;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Stats(#[from] StatsError),

    #[error("encode failed: {0}")]
    Encode(String),
}

impl ExportError {
    pub fn code(&self) -> &'static str {
        match self {
            ExportError::Stats(e) => e.code(),
            ExportError::Encode(_) => "ENCODE",
        }
    }
}

impl From<std::io::Error> for ExportError {
    fn from(e: std::io::Error) -> Self {
        ExportError::Stats(e.into())
    }
}

impl IntoResponse for ExportError {
    fn into_response(self) -> Response {
        let status = match &self {
            ExportError::Stats(StatsError::BadConfig(_))
            | ExportError::Stats(StatsError::InvalidTagExtractor { .. }) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({
            "error": self.code(),
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}
