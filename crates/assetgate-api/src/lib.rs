//! Assetgate API Library
//!
//! This crate provides the HTTP handlers, middleware, and application setup
//! for the asset-storage gateway.

mod api_doc;
mod handlers;
mod services;
mod telemetry;
#[cfg(test)]
mod testing;

// Public modules
pub mod auth;
pub mod error;
pub mod setup;
pub mod state;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
