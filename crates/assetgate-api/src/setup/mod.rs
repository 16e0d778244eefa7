//! Application setup and initialization
//!
//! All application initialization logic lives here rather than in main.rs.

pub mod routes;
pub mod server;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use assetgate_core::{Config, RequestSigner};
use assetgate_storage::create_adapter;

use crate::auth::AuthState;
use crate::state::AppState;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    crate::telemetry::init_telemetry();

    let auth_state = AuthState::from_env().context("Auth configuration failed")?;

    let adapter = create_adapter(&config).context("Storage adapter setup failed")?;
    tracing::info!(backend = %adapter.backend_type(), "Storage adapter ready");

    let http = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(120))
        .build()
        .context("HTTP client setup failed")?;

    let state = Arc::new(AppState {
        adapter,
        signer: RequestSigner::new(config.signing_secret.as_bytes().to_vec()),
        http,
        config: config.clone(),
    });

    let router = routes::setup_routes(&config, state.clone(), auth_state)?;

    Ok((state, router))
}
