//! Upload orchestration.
//!
//! Turns a validated presign request into a provider-correct presigned PUT:
//! name derivation, header defaulting, the duplicate probe, and the adapter
//! call. Shared by the JSON presign endpoint and the browser upload form.

use std::collections::HashMap;

use assetgate_core::constants::{extension_for_content_type, DEFAULT_CACHE_CONTROL};
use assetgate_core::models::presign::{
    is_allowed_upload_header, PresignUploadRequest, PresignUploadResponse,
};
use assetgate_core::{AccessType, AppError};
use assetgate_storage::{keys, PresignedRequest};
use uuid::Uuid;

use crate::state::AppState;

/// A request that passed validation and naming, ready for the adapter.
#[derive(Debug)]
pub struct PreparedUpload {
    /// Externally visible name, returned to the caller.
    pub asset_name: String,
    /// Internal object key (tenant namespace included).
    pub key: String,
    /// True when the name was randomly derived rather than pinned. Only
    /// derived names get the duplicate probe.
    pub derived: bool,
    pub access: AccessType,
    pub headers: HashMap<String, String>,
}

/// Validate and normalize a presign request: reject unknown header names,
/// strip empty values, require content-length, default cache-control, and
/// settle on an asset name.
pub fn prepare_upload(
    tenant_namespace: &str,
    request: PresignUploadRequest,
) -> Result<PreparedUpload, AppError> {
    let mut headers: HashMap<String, String> = HashMap::new();
    for (name, value) in request.headers {
        if !is_allowed_upload_header(&name) {
            return Err(AppError::ValidationFailed(format!(
                "Unknown upload header: {}",
                name
            )));
        }
        // Empty values are ambiguous across providers; drop them.
        if value.is_empty() {
            continue;
        }
        headers.insert(name.to_ascii_lowercase(), value);
    }

    if !headers.contains_key("content-length") {
        return Err(AppError::ValidationFailed(
            "Header content-length is required".to_string(),
        ));
    }

    headers
        .entry("cache-control".to_string())
        .or_insert_with(|| DEFAULT_CACHE_CONTROL.to_string());

    let (asset_name, derived) = match request.name {
        Some(name) if !name.is_empty() => (name, false),
        _ => (
            derive_asset_name(
                request.prefix.as_deref().unwrap_or(""),
                headers.get("content-type").map(String::as_str),
            ),
            true,
        ),
    };

    Ok(PreparedUpload {
        key: keys::object_key(tenant_namespace, &asset_name),
        asset_name,
        derived,
        access: request.access.unwrap_or_default(),
        headers,
    })
}

/// `prefix + randomUUIDv4 + extension` guessed from the content type.
fn derive_asset_name(prefix: &str, content_type: Option<&str>) -> String {
    let extension = content_type.map(extension_for_content_type).unwrap_or("");
    format!("{}{}{}", prefix, Uuid::new_v4(), extension)
}

/// Full orchestration: prepare, probe derived names, presign.
pub async fn presign_upload(
    state: &AppState,
    tenant_namespace: &str,
    request: PresignUploadRequest,
) -> Result<PresignUploadResponse, AppError> {
    let prepared = prepare_upload(tenant_namespace, request)?;

    if prepared.derived {
        probe_name_is_free(state, &prepared.key).await?;
    }

    let presigned: PresignedRequest = state
        .adapter
        .presign_put_object(&prepared.key, prepared.access, &prepared.headers)
        .await
        .map_err(crate::error::storage_error_to_app)?;

    tracing::info!(
        asset_name = %prepared.asset_name,
        derived = prepared.derived,
        access = %prepared.access.as_str(),
        "Presigned upload"
    );

    Ok(PresignUploadResponse {
        asset_name: prepared.asset_name,
        url: presigned.url,
        method: presigned.method.to_string(),
        headers: presigned.headers,
    })
}

/// Existence probe for a derived name: presign a HEAD and run it.
///
/// 404 means the name is free. Any other outcome, including a transport
/// failure, fails the request as Duplicated. This check-then-presign shape is
/// racy across concurrent requests; UUIDv4 entropy keeps the residual
/// collision probability negligible.
async fn probe_name_is_free(state: &AppState, key: &str) -> Result<(), AppError> {
    let head_url = state
        .adapter
        .presign_head_object(key)
        .await
        .map_err(crate::error::storage_error_to_app)?;

    match state.http.head(&head_url).send().await {
        Ok(response) if response.status() == reqwest::StatusCode::NOT_FOUND => Ok(()),
        Ok(response) => {
            tracing::debug!(key = %key, status = %response.status(), "Duplicate probe hit an existing object");
            Err(AppError::Duplicated(key.to_string()))
        }
        Err(err) => {
            tracing::warn!(key = %key, error = %err, "Duplicate probe failed to reach the backend");
            Err(AppError::Duplicated(key.to_string()))
        }
    }
}
