use crate::adapters::push::PushProvider;
use crate::config::{Config, ProviderConfig};
use crate::error::AppError;
use crate::services::dispatch_service::DispatchService;
use crate::services::receipt_service::ReceiptService;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderName, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

pub mod health;
pub mod notifications;
pub mod schemas;

const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone, Debug)]
pub struct AppState {
    pub dispatch_service: DispatchService,
    pub receipt_service: ReceiptService,
}

#[derive(Debug)]
pub struct ServiceContainer {
    pub dispatch_service: DispatchService,
    pub receipt_service: ReceiptService,
}

impl ServiceContainer {
    /// Wires both services around a single shared provider handle.
    #[must_use]
    pub fn new(provider: Arc<dyn PushProvider>, config: &ProviderConfig) -> Self {
        let call_timeout = Duration::from_secs(config.provider_timeout_secs.max(1));
        Self {
            dispatch_service: DispatchService::new(Arc::clone(&provider), call_timeout),
            receipt_service: ReceiptService::new(provider, call_timeout),
        }
    }
}

fn handle_panic(_err: Box<dyn Any + Send + 'static>) -> Response {
    tracing::error!("Request handler panicked");
    AppError::Internal.into_response()
}

/// Answers with an enveloped 408 when the rest of the stack takes longer than `limit`.
async fn enforce_request_timeout(State(limit): State<Duration>, request: Request<Body>, next: Next) -> Response {
    tokio::time::timeout(limit, next.run(request))
        .await
        .unwrap_or_else(|_elapsed| AppError::RequestTimeout(limit).into_response())
}

/// Configures and returns the primary application router.
pub fn app_router(config: &Config, services: ServiceContainer) -> Router {
    let base_path = config.server.normalized_base_path();
    let request_timeout = Duration::from_secs(config.server.request_timeout_secs.max(1));

    let state = AppState {
        dispatch_service: services.dispatch_service,
        receipt_service: services.receipt_service,
    };

    // Wrong methods on known paths answer like unknown paths
    let api_routes = Router::new()
        .route("/send", post(notifications::send_notifications).fallback(notifications::not_found))
        .route("/check", post(notifications::check_receipts).fallback(notifications::not_found));

    let routes = if base_path.is_empty() { api_routes } else { Router::new().nest(&base_path, api_routes) };

    routes
        .fallback(notifications::not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(from_fn_with_state(request_timeout, enforce_request_timeout))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(REQUEST_ID_HEADER)))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .extensions()
                        .get::<tower_http::request_id::RequestId>()
                        .map(|id| id.header_value().to_str().unwrap_or_default())
                        .unwrap_or_default()
                        .to_string();

                    tracing::info_span!(
                        "request",
                        "request_id" = %request_id,
                        "http.request.method" = %request.method(),
                        "url.path" = %request.uri().path(),
                        "http.response.status_code" = tracing::field::Empty,
                        "otel.kind" = "server",
                    )
                })
                .on_response(|response: &axum::http::Response<_>, latency: Duration, _span: &tracing::Span| {
                    let status = response.status();
                    tracing::Span::current().record("http.response.status_code", status.as_u16());

                    tracing::info!(
                        latency_ms = %latency.as_millis(),
                        status = %status.as_u16(),
                        "request completed"
                    );
                })
                .on_failure(|error, _latency, _span: &tracing::Span| {
                    tracing::error!(error = %error, "request failed");
                }),
        )
        .layer(SetRequestIdLayer::new(HeaderName::from_static(REQUEST_ID_HEADER), MakeRequestUuid))
        .with_state(state)
}

pub fn mgmt_router() -> Router {
    Router::new().route("/livez", get(health::livez))
}
