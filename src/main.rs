// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{net::SocketAddr, sync::Arc};

use sso_bridge::{
    api::router,
    config::{Config, LogFormat},
    providers::{ForumApiClient, InMemoryDirectory, UserDirectory},
    session::{InMemorySessionStore, SessionStore, SessionSweeper},
    state::AppState,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    let directory: Arc<dyn UserDirectory> = match &config.forum_api {
        Some(api) => {
            tracing::info!(base_url = %api.base_url, "Using forum API user directory");
            Arc::new(ForumApiClient::new(api.base_url.clone())?)
        }
        None => {
            tracing::warn!(
                "FORUM_API_URL not set, provisioning into an in-memory directory (development mode)"
            );
            Arc::new(InMemoryDirectory::new())
        }
    };

    if config.provider_login_url.is_none() {
        tracing::warn!("SSO_PROVIDER_LOGIN_URL not set, /auth/sso/login is disabled");
    }

    let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new(config.session_ttl));
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let shutdown = CancellationToken::new();
    let sweeper = tokio::spawn(SessionSweeper::new(Arc::clone(&sessions)).run(shutdown.clone()));

    let state = AppState::new(config, sessions, directory);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "SSO bridge listening (docs at /docs)");

    let signal = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutting down");
            signal.cancel();
        })
        .await?;

    shutdown.cancel();
    if let Err(e) = sweeper.await {
        tracing::error!(error = %e, "Session sweeper task failed");
    }
    Ok(())
}
