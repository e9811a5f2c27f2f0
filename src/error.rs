use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

pub const MISSING_API_KEY_MESSAGE: &str = "API Key não encontrada. Verifique as configurações.";

#[derive(Debug, Error)]
pub enum StudioError {
    #[error("session {0} not found")]
    SessionNotFound(Uuid),
    #[error("{0}")]
    BadRequest(String),
    #[error("envie uma foto antes de continuar")]
    NoImage,
    #[error("já existe uma geração em andamento")]
    Busy,
    #[error("{0}")]
    NoResult(String),
    #[error("API Key não encontrada. Verifique as configurações.")]
    MissingCredential,
    #[error("{0}")]
    Internal(String),
}

impl StudioError {
    fn status(&self) -> StatusCode {
        match self {
            Self::SessionNotFound(_) | Self::NoResult(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NoImage | Self::Busy => StatusCode::CONFLICT,
            Self::MissingCredential => StatusCode::PRECONDITION_FAILED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<axum::extract::multipart::MultipartError> for StudioError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        StudioError::BadRequest(err.body_text())
    }
}

impl IntoResponse for StudioError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("❌ {}", self);
        } else {
            tracing::info!("↩️ {} {}", status.as_u16(), self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
