//! smokex-monitor - Telemetry monitor for the Smoke X wireless thermometer receiver
//!
//! Polls the receiver's HTTP API, classifies probe alarms and keeps bounded
//! temperature series for a live dashboard.

pub mod config;
pub mod dashboard;
pub mod device;
pub mod engine;
pub mod error;
pub mod io;
pub mod mock;
pub mod poller;
pub mod reducer;
pub mod series;
pub mod settings;
pub mod state;
pub mod telemetry;
pub mod units;

pub use config::{load_config, Config};
pub use error::{MonitorError, Result};

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::DeviceConfig;
use crate::device::{DeviceApi, HttpDeviceApi};
use crate::engine::Engine;
use crate::io::{HttpClient, ReqwestHttpClient};
use crate::mock::{FixtureHttpClient, FIXTURE_BASE_URL};
use crate::poller::Poller;
use crate::reducer::Reducer;

/// Build the device client selected by configuration
pub fn build_device(config: &DeviceConfig) -> Result<Arc<dyn DeviceApi>> {
    let api = match config {
        DeviceConfig::Http {
            base_url,
            timeout_seconds,
        } => {
            let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new(
                Duration::from_secs(*timeout_seconds),
            )?);
            HttpDeviceApi::new(base_url, http)
        }
        DeviceConfig::Mock { delay_ms } => {
            tracing::info!("Using fixture receiver (delay {} ms)", delay_ms);
            let http: Arc<dyn HttpClient> =
                Arc::new(FixtureHttpClient::new(Duration::from_millis(*delay_ms)));
            HttpDeviceApi::new(FIXTURE_BASE_URL, http)
        }
    };
    Ok(Arc::new(api))
}

/// Run the monitor with the given configuration
pub async fn run(config: Config) -> Result<()> {
    config.validate()?;

    let device = build_device(&config.device)?;
    let cancel = CancellationToken::new();

    let state = state::new_state_handle(
        config.polling.offline_after_failures,
        config.dashboard.event_log_size,
    );

    let engine = Engine::new(
        Poller::new(Arc::clone(&device)),
        Reducer::new(config.polling.history_capacity),
        Arc::clone(&state),
        config.polling.interval(),
        cancel.clone(),
    );

    // Setup shutdown handler
    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        cancel_for_signal.cancel();
    });

    // Start dashboard if enabled
    if config.dashboard.enabled {
        let dashboard_port = config.dashboard.port;
        let router = dashboard::build_router(
            Arc::clone(&state),
            Arc::clone(&device),
            config.display.unit,
            config.polling.interval(),
        );
        let cancel_for_dashboard = cancel.clone();

        tokio::spawn(async move {
            let addr = SocketAddr::from(([0, 0, 0, 0], dashboard_port));
            tracing::info!("Dashboard listening on http://{}", addr);

            let listener = match tokio::net::TcpListener::bind(addr).await {
                Ok(l) => l,
                Err(e) => {
                    tracing::error!(
                        "Failed to bind dashboard to port {}: {}. Continuing without dashboard.",
                        dashboard_port,
                        e
                    );
                    return;
                }
            };

            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    cancel_for_dashboard.cancelled().await;
                })
                .await
                .ok();

            tracing::debug!("Dashboard stopped");
        });
    }

    tracing::info!(
        "Polling every {}s, keeping {} points per probe",
        config.polling.interval_seconds,
        config.polling.history_capacity
    );

    // Run the engine (blocks until cancelled)
    engine.run().await;
    tracing::info!("smokex-monitor stopped");

    Ok(())
}
