//! Assetgate Core Library
//!
//! This crate provides the domain models, error types, configuration, and the
//! first-party capability-URL signer shared across all assetgate components.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod signing;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::access::AccessType;
pub use models::storage_types::StorageBackend;
pub use signing::{RequestSigner, SigningError};
