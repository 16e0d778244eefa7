//! Application state shared across handlers.

use std::sync::Arc;

use assetgate_core::{Config, RequestSigner};
use assetgate_storage::StorageAdapter;

/// Main application state. Everything in here is cheap to clone and
/// request-scoped handlers hold it behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The one adapter selected at process start from configuration.
    pub adapter: Arc<dyn StorageAdapter>,
    /// First-party capability-URL signer.
    pub signer: RequestSigner,
    /// Pooled client for the duplicate probe and the GET/upload proxies.
    pub http: reqwest::Client,
    pub config: Config,
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}
