use crate::api::AppState;
use crate::api::schemas::notifications::{CheckRequest, SendRequest, parse_body};
use crate::error::{AppError, Envelope, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::Response,
};

fn content_type(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::CONTENT_TYPE).and_then(|value| value.to_str().ok())
}

/// Sends a notification to every valid token in the request.
///
/// # Errors
/// Returns `AppError::BadRequest` echoing the body if a required field is missing.
/// Returns `AppError::ProviderUnavailable` if any chunk could not be delivered to the provider.
pub async fn send_notifications(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Result<Response> {
    let body = parse_body(content_type(&headers), &body);
    let request = SendRequest::from_body(&body).map_err(AppError::BadRequest)?;

    let tickets = state.dispatch_service.send(&request.push_tokens, &request.payload).await?;
    Ok(Envelope::respond(StatusCode::OK, tickets))
}

/// Looks up delivery receipts for the given ticket ids.
///
/// # Errors
/// Returns `AppError::BadRequest` if `ids` is missing or malformed.
pub async fn check_receipts(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Result<Response> {
    let body = parse_body(content_type(&headers), &body);
    let request = CheckRequest::from_body(&body).map_err(AppError::BadRequest)?;

    let outcomes = state.receipt_service.check(&request.ids).await;
    Ok(Envelope::respond(StatusCode::OK, outcomes))
}

/// Catch-all for unknown paths and unsupported methods.
pub async fn not_found() -> AppError {
    AppError::NotFound
}
