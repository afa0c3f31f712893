// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Flowgate - request orchestration gateway
//!
//! Loads route definitions and serves them over HTTP. See
//! [`flowgate_server::Config::from_env`] for the environment variables.

use anyhow::Result;
use tracing::{error, info};

use flowgate_server::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (from crate directory or parent directories)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("flowgate=info")),
        )
        .init();

    info!("Starting Flowgate");

    let config = Config::from_env().map_err(|e| {
        error!("Configuration error: {}", e);
        e
    })?;

    info!(
        http_addr = %config.http_addr,
        routes_file = %config.routes_file.display(),
        request_timeout_ms = config.request_timeout.as_millis() as u64,
        cache_ttl_secs = config.cache_ttl.as_secs(),
        "Configuration loaded"
    );

    flowgate_server::start(&config).await?;

    info!("Flowgate stopped");
    Ok(())
}
