//! HTTP server bootstrap and process lifecycle.

use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;

use k6svc_core::ServiceConfig;

use crate::app::{self, services};

/// Serve until SIGINT/SIGTERM, then drain in-flight requests.
pub async fn run(config: ServiceConfig) -> anyhow::Result<()> {
    if config.env.is_local() {
        tracing::info!("env=local: running with local filesystem to fetch resources");
    }
    if let Some(url) = &config.configuration_service_url {
        tracing::info!(%url, "using configuration service");
    }

    tracing::info!(
        service = %config.service_name,
        port = config.port,
        path = %config.path,
        event_broker = %config.event_broker_url,
        "starting service"
    );

    let shutdown = CancellationToken::new();
    let services = Arc::new(
        services::build_services(&config, shutdown.clone()).context("failed to wire services")?,
    );
    let app = app::build_app(&config, services);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("failed to bind 0.0.0.0:{}", config.port))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .context("receiver stopped with error")?;

    tracing::info!("shutdown complete");
    Ok(())
}

/// Resolve on SIGINT/SIGTERM and cancel every in-flight task action.
pub async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
        _ = shutdown.cancelled() => {},
    }

    tracing::info!("shutdown requested");
    shutdown.cancel();
}
