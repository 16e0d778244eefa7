//! Wire types for the presign-upload, bulk-sign, and list endpoints.
//!
//! None of these are persisted; only the access type and the object bytes
//! survive past the request.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::access::AccessType;

/// Header names a caller may supply on an upload. Anything else is rejected
/// by request validation before it reaches an adapter.
pub const ALLOWED_UPLOAD_HEADERS: &[&str] = &[
    "content-type",
    "content-length",
    "content-disposition",
    "content-encoding",
    "content-md5",
    "cache-control",
    "access-control-allow-origin",
    "access-control-expose-headers",
    "access-control-max-age",
    "access-control-allow-credentials",
    "access-control-allow-methods",
    "access-control-allow-headers",
];

/// Returns true if the (case-insensitive) header name is accepted on uploads.
pub fn is_allowed_upload_header(name: &str) -> bool {
    ALLOWED_UPLOAD_HEADERS
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(name))
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PresignUploadRequest {
    /// Prepended to the derived random name. Ignored when `name` is set.
    #[serde(default)]
    pub prefix: Option<String>,
    /// Pin an exact asset name instead of deriving one. Pinned names skip the
    /// duplicate probe; idempotent re-upload is the caller's responsibility.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub access: Option<AccessType>,
    /// Headers the client intends to send with its upload.
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

/// One header the client must send verbatim with its upload request.
/// Kept as an ordered list because header emit order is part of the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HeaderField {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PresignUploadResponse {
    pub asset_name: String,
    pub url: String,
    pub method: String,
    pub headers: Vec<HeaderField>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AssetItem {
    pub asset_name: String,
    /// Validity in seconds; capped at seven days.
    #[serde(default)]
    pub expire: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SignRequest {
    pub assets: Vec<AssetItem>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SignedAsset {
    pub asset_name: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SignResponse {
    pub assets: Vec<SignedAsset>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ListedAsset {
    pub asset_name: String,
    pub size: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ListResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination_token: Option<String>,
    pub assets: Vec<ListedAsset>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_upload_headers_are_case_insensitive() {
        assert!(is_allowed_upload_header("Content-Type"));
        assert!(is_allowed_upload_header("CACHE-CONTROL"));
        assert!(!is_allowed_upload_header("x-forwarded-for"));
    }

    #[test]
    fn test_presign_request_defaults() {
        let request: PresignUploadRequest =
            serde_json::from_str(r#"{"headers":{"content-length":"42"}}"#).unwrap();
        assert!(request.prefix.is_none());
        assert!(request.name.is_none());
        assert!(request.access.is_none());
        assert_eq!(request.headers.len(), 1);
    }

    #[test]
    fn test_access_deserializes_lowercase() {
        let request: PresignUploadRequest =
            serde_json::from_str(r#"{"access":"public","headers":{}}"#).unwrap();
        assert_eq!(request.access, Some(AccessType::Public));
    }
}
