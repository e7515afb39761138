use crate::services::dispatch_service::DispatchError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

pub const NOT_FOUND_MESSAGE: &str = "Not Found";
pub const PROVIDER_UNAVAILABLE_MESSAGE: &str = "unable to connect to expo server";
pub const REQUEST_TIMEOUT_MESSAGE: &str = "Request Timeout";
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Not found")]
    NotFound,
    #[error("Push provider unavailable: {0}")]
    ProviderUnavailable(#[from] DispatchError),
    #[error("Request exceeded {0:?}")]
    RequestTimeout(Duration),
    #[error("Internal server error")]
    Internal,
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Body shape shared by every response of the gateway.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub return_code: u16,
    pub data: T,
}

impl<T: Serialize> Envelope<T> {
    pub fn respond(status: StatusCode, data: T) -> Response {
        (status, Json(Self { return_code: status.as_u16(), data })).into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => {
                tracing::debug!(message = %msg, "Bad request");
                (StatusCode::BAD_REQUEST, msg)
            }
            Self::NotFound => {
                tracing::debug!("Route not found");
                (StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE.to_string())
            }
            Self::ProviderUnavailable(e) => {
                tracing::error!(error = %e, "Push provider unavailable");
                (StatusCode::BAD_GATEWAY, PROVIDER_UNAVAILABLE_MESSAGE.to_string())
            }
            Self::RequestTimeout(limit) => {
                tracing::warn!(limit_ms = %limit.as_millis(), "Request timed out");
                (StatusCode::REQUEST_TIMEOUT, REQUEST_TIMEOUT_MESSAGE.to_string())
            }
            Self::Internal => {
                tracing::error!("Internal server error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE.to_string())
            }
        };

        Envelope::respond(status, message)
    }
}
