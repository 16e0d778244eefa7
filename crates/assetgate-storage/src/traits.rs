//! Storage adapter abstraction
//!
//! This module defines the capability set every storage backend implements.
//! Adapters compute provider-correct presigned requests; they never move the
//! object bytes themselves (the client performs its own PUT, the gatekeeper
//! its own proxied GET).

use std::collections::HashMap;
use std::time::Duration;

use assetgate_core::models::presign::HeaderField;
use assetgate_core::{AccessType, StorageBackend};
use async_trait::async_trait;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Presign failed: {0}")]
    PresignFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("List failed: {0}")]
    ListFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid header value: {0}")]
    InvalidHeader(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A fully computed upload request the client must replay verbatim:
/// method, presigned URL, and the exact ordered header list.
#[derive(Debug, Clone)]
pub struct PresignedRequest {
    pub method: http::Method,
    pub url: String,
    pub headers: Vec<HeaderField>,
}

/// Outcome of resolving a download target.
#[derive(Debug, Clone)]
pub struct ResolvedGet {
    pub url: String,
    /// True when the inbound request already carried the provider's own
    /// signature parameters, i.e. the URL was minted by this gateway's
    /// signing step earlier. Private assets are only served when this is set.
    pub originally_signed: bool,
}

/// One page of listed objects.
#[derive(Debug, Clone)]
pub struct ObjectPage {
    /// Full object keys (tenant namespace included) with sizes.
    pub objects: Vec<(String, u64)>,
    /// Opaque token for the next page, if any.
    pub pagination_token: Option<String>,
}

/// Capability set implemented independently per provider.
///
/// All signing here is pure local computation; the only state an adapter
/// holds is its pooled client handle and its read-only translation table.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Presign an object upload.
    ///
    /// Caller headers are translated into the provider's metadata namespace,
    /// the access type is injected as one additional proprietary metadata
    /// header, and content headers the provider treats specially stay in
    /// their standard form. A malformed header value (e.g. non-numeric
    /// content-length) aborts presigning.
    async fn presign_put_object(
        &self,
        key: &str,
        access: AccessType,
        headers: &HashMap<String, String>,
    ) -> StorageResult<PresignedRequest>;

    /// Presign an object download.
    async fn presign_get_object(&self, key: &str, expires_in: Duration) -> StorageResult<String>;

    /// Presign an object existence check. Used only by the duplicate probe.
    async fn presign_head_object(&self, key: &str) -> StorageResult<String>;

    /// Resolve the target URL for a proxied GET: either recognize the inbound
    /// query as already provider-signed and pass it through, or mint a fresh
    /// presigned GET URL.
    async fn resolve_get_object(&self, key: &str, query: &str) -> StorageResult<ResolvedGet>;

    /// Read the access type back from provider response metadata headers.
    /// Missing or unknown values default to private.
    fn access_type(&self, headers: &HashMap<String, String>) -> AccessType;

    /// Rewrite standard header names into the provider's metadata namespace.
    fn standard_to_proprietary(&self, headers: HashMap<String, String>) -> HashMap<String, String>;

    /// Rewrite provider metadata header names back to their standard form.
    fn proprietary_to_standard(&self, headers: HashMap<String, String>) -> HashMap<String, String>;

    /// List object keys under a prefix, with opaque-token pagination.
    async fn list_objects(
        &self,
        prefix: &str,
        pagination_token: Option<&str>,
    ) -> StorageResult<ObjectPage>;

    /// Delete an object.
    async fn delete_object(&self, key: &str) -> StorageResult<()>;

    /// The provider behind this adapter.
    fn backend_type(&self) -> StorageBackend;
}
