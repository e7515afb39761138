#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

use expo_push_gateway::adapters::push::PushProvider;
use expo_push_gateway::adapters::push::expo::ExpoPushProvider;
use expo_push_gateway::api::ServiceContainer;
use expo_push_gateway::config::Config;
use expo_push_gateway::telemetry;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::Instrument;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load();
    let telemetry_guard = telemetry::init_telemetry(&config.telemetry)?;

    expo_push_gateway::setup_panic_hook();

    let boot_span = tracing::info_span!("boot_server");
    let (api_listener, mgmt_listener, app_router, mgmt_app, shutdown_tx, shutdown_rx) = async {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        expo_push_gateway::spawn_signal_handler(shutdown_tx.clone());

        let provider: Arc<dyn PushProvider> = Arc::new(ExpoPushProvider::new(&config.provider)?);
        let services = ServiceContainer::new(provider, &config.provider);

        let app_router = expo_push_gateway::api::app_router(&config, services);
        let mgmt_app = expo_push_gateway::api::mgmt_router();

        let api_addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
        let mgmt_addr: SocketAddr = format!("{}:{}", config.server.host, config.server.mgmt_port).parse()?;

        tracing::info!(
            address = %api_addr,
            base_path = %config.server.normalized_base_path(),
            provider = %config.provider.base_url,
            "listening"
        );
        tracing::info!(address = %mgmt_addr, "management server listening");

        let api_listener = tokio::net::TcpListener::bind(api_addr).await?;
        let mgmt_listener = tokio::net::TcpListener::bind(mgmt_addr).await?;

        Ok::<
            (
                tokio::net::TcpListener,
                tokio::net::TcpListener,
                axum::Router,
                axum::Router,
                watch::Sender<bool>,
                watch::Receiver<bool>,
            ),
            anyhow::Error,
        >((api_listener, mgmt_listener, app_router, mgmt_app, shutdown_tx, shutdown_rx))
    }
    .instrument(boot_span)
    .await?;

    let mut api_rx = shutdown_rx.clone();
    let api_server = axum::serve(api_listener, app_router).with_graceful_shutdown(async move {
        let _ = api_rx.wait_for(|&s| s).await;
    });

    let mut mgmt_rx = shutdown_rx.clone();
    let mgmt_server = axum::serve(mgmt_listener, mgmt_app).with_graceful_shutdown(async move {
        let _ = mgmt_rx.wait_for(|&s| s).await;
    });

    let servers = async move { tokio::try_join!(api_server, mgmt_server) };
    let mut drain_rx = shutdown_rx.clone();
    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_secs);

    // Once shutdown is signalled, in-flight requests get a bounded grace period
    tokio::select! {
        res = servers => {
            if let Err(e) = res {
                tracing::error!(error = %e, "Server error");
            }
        }
        () = async {
            let _ = drain_rx.wait_for(|&s| s).await;
            tokio::time::sleep(shutdown_timeout).await;
        } => {
            tracing::warn!("Timeout waiting for in-flight requests to finish.");
        }
    }

    let _ = shutdown_tx.send(true);
    tracing::info!("Server stopped");
    telemetry_guard.shutdown();
    Ok(())
}
