//! Error type for tbm-api
//!
//! Every failure leaves the API as `{"error": "..."}`: 400 for missing
//! required fields, 500 for anything the registry surfaced.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use tbm_telegram::TelegramError;

/// tbm-api error type
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    MissingField(String),

    #[error(transparent)]
    Telegram(#[from] TelegramError),
}

/// Generic API error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ApiError {
    pub fn missing(message: impl Into<String>) -> Self {
        Self::MissingField(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingField(_) | Self::Telegram(TelegramError::MissingField(_)) => {
                StatusCode::BAD_REQUEST
            }
            Self::Telegram(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}
