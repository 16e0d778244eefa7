//! Assetgate Storage Library
//!
//! This crate provides the storage backend adapter layer: one capability set
//! (presign PUT/GET/HEAD, access-type metadata, header translation, list,
//! delete) implemented independently for S3, Google Cloud Storage, and Azure
//! Blob Storage over `object_store`.
//!
//! # Object key format
//!
//! Object keys are tenant-scoped: `{tenant_namespace}/{asset_name}`, never
//! produced with a leading slash. Key derivation is centralized in the `keys`
//! module so all backends stay consistent.

pub mod azure;
pub mod factory;
pub mod gcs;
pub mod headers;
pub mod keys;
mod list;
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use assetgate_core::StorageBackend;
pub use azure::AzureAdapter;
pub use factory::create_adapter;
pub use gcs::GcsAdapter;
pub use headers::HeaderTranslator;
pub use keys::object_key;
pub use s3::S3Adapter;
pub use traits::{
    ObjectPage, PresignedRequest, ResolvedGet, StorageAdapter, StorageError, StorageResult,
};
