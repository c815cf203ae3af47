// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process::ExitCode;

use openburner_bridge::{api::router, config::BridgeConfig, state::AppState, telemetry};
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    // Install the ring crypto provider for rustls (must be done before any TLS operations)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("rustls crypto provider was already installed");
    }

    let config = match BridgeConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    telemetry::init_tracing(config.log_format);

    let state = AppState::new(&config);
    let controller = state.controller.clone();
    let app = router(state);

    let listener = match TcpListener::bind(config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %config.bind_addr, error = %e, "Failed to bind");
            return ExitCode::FAILURE;
        }
    };

    info!(
        addr = %config.bind_addr,
        bridge = %config.transport.bridge_url,
        gateway = %config.transport.gateway_url,
        "OpenBurner bridge listening (docs at /docs)"
    );

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    controller.shutdown().await;

    match served {
        Ok(()) => {
            info!("Server stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received, closing session");
}
