//! Browser upload form.
//!
//! `presign_upload_form` issues a short-lived capability URL pointing at
//! `/upload_form`; `upload_form` verifies that signature, validates the
//! multipart body against the same schema as `/presign_upload`, then performs
//! the presigned PUT on the browser's behalf.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, Query, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use chrono::Utc;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Serialize;
use utoipa::ToSchema;

use assetgate_core::constants::UPLOAD_FORM_EXPIRY_SECS;
use assetgate_core::models::presign::{is_allowed_upload_header, PresignUploadRequest};
use assetgate_core::signing::effective_host;
use assetgate_core::{AccessType, AppError};

use crate::auth::TenantContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::services::upload;
use crate::state::AppState;

/// Query parameter binding the capability URL to a tenant namespace.
const TENANT_PARAM: &str = "tenant";
const UPLOAD_FORM_PATH: &str = "/upload_form";

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadFormUrlResponse {
    pub url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadFormResponse {
    pub asset_name: String,
}

/// Issue a signed, same-origin URL to `/upload_form`.
#[utoipa::path(
    post,
    path = "/presign_upload_form",
    tag = "uploads",
    responses(
        (status = 200, description = "Capability URL for the upload form", body = UploadFormUrlResponse),
        (status = 401, description = "Authentication required", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, headers), fields(tenant = %tenant_ctx.namespace))]
pub async fn presign_upload_form(
    tenant_ctx: TenantContext,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HttpAppError> {
    let (scheme, host) = super::external_base_url(&headers, &state.config);

    let query = vec![(TENANT_PARAM.to_string(), tenant_ctx.namespace.clone())];
    let signed = state.signer.sign(
        "POST",
        UPLOAD_FORM_PATH,
        &query,
        &host,
        Utc::now(),
        UPLOAD_FORM_EXPIRY_SECS,
    );

    let url = format!(
        "{}://{}{}?{}",
        scheme,
        host,
        UPLOAD_FORM_PATH,
        encode_query(&signed)
    );
    Ok(Json(UploadFormUrlResponse { url }))
}

/// Accept a browser upload authorized by a capability URL.
#[utoipa::path(
    post,
    path = "/upload_form",
    tag = "uploads",
    responses(
        (status = 200, description = "Upload complete", body = UploadFormResponse),
        (status = 400, description = "Invalid form body", body = ErrorResponse),
        (status = 401, description = "Invalid or expired signature", body = ErrorResponse),
        (status = 502, description = "Upload to the backend failed", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all)]
pub async fn upload_form(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<Vec<(String, String)>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, HttpAppError> {
    let host = request_host(&headers, &state);
    state
        .signer
        .verify("POST", UPLOAD_FORM_PATH, &query, host, Utc::now())?;

    let tenant = query
        .iter()
        .find(|(name, _)| name == TENANT_PARAM)
        .map(|(_, value)| value.clone())
        .ok_or_else(|| AppError::ValidationFailed("Missing tenant parameter".to_string()))?;

    let multipart = multipart.map_err(|e| AppError::BadAssetUploadForm(e.body_text()))?;
    let form = collect_form(multipart).await?;

    let request = PresignUploadRequest {
        prefix: form.prefix,
        name: None,
        access: form.access,
        headers: form.headers,
    };
    let presigned = upload::presign_upload(&state, &tenant, request).await?;

    // Replay the presigned request with the file bytes on the client's behalf.
    let method = http::Method::from_bytes(presigned.method.as_bytes())
        .map_err(|_| AppError::Internal(format!("Bad presigned method: {}", presigned.method)))?;
    let mut upload_headers = HeaderMap::new();
    for field in &presigned.headers {
        let name = HeaderName::try_from(field.name.as_str())
            .map_err(|_| AppError::Internal(format!("Bad presigned header: {}", field.name)))?;
        let value = HeaderValue::try_from(field.value.as_str())
            .map_err(|_| AppError::Internal(format!("Bad presigned header: {}", field.name)))?;
        upload_headers.insert(name, value);
    }

    let response = state
        .http
        .request(method, &presigned.url)
        .headers(upload_headers)
        .body(form.file)
        .send()
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Proxied upload failed to reach the backend");
            AppError::Transport(e.to_string())
        })?;

    if !response.status().is_success() {
        let status = response.status();
        let detail = response.text().await.unwrap_or_default();
        tracing::error!(status = %status, detail = %detail, "Backend rejected proxied upload");
        return Err(AppError::Backend(format!("Upload rejected with {}", status)).into());
    }

    tracing::info!(asset_name = %presigned.asset_name, "Proxied upload complete");
    Ok(Json(UploadFormResponse {
        asset_name: presigned.asset_name,
    }))
}

/// The upload form's fields after structural validation.
struct CollectedForm {
    prefix: Option<String>,
    access: Option<AccessType>,
    headers: HashMap<String, String>,
    file: Bytes,
}

/// Walk the multipart body: fields `prefix?`, `access?`, any allowed header
/// name, and exactly one `file`. Repeated or unknown fields reject the form.
async fn collect_form(mut multipart: Multipart) -> Result<CollectedForm, AppError> {
    let mut prefix = None;
    let mut access = None;
    let mut headers: HashMap<String, String> = HashMap::new();
    let mut file: Option<(Bytes, Option<String>)> = None;
    let mut seen: Vec<String> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadAssetUploadForm(e.to_string()))?
    {
        let name = field
            .name()
            .map(str::to_string)
            .ok_or_else(|| AppError::BadAssetUploadForm("Unnamed form field".to_string()))?;
        let lower = name.to_ascii_lowercase();

        if seen.contains(&lower) {
            return Err(AppError::BadAssetUploadForm(format!(
                "Repeated form field: {}",
                name
            )));
        }
        seen.push(lower.clone());

        match lower.as_str() {
            "file" => {
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadAssetUploadForm(e.to_string()))?;
                file = Some((bytes, content_type));
            }
            "prefix" => {
                prefix = Some(read_text(&name, field).await?);
            }
            "access" => {
                access = Some(parse_access(&read_text(&name, field).await?)?);
            }
            _ if is_allowed_upload_header(&lower) => {
                headers.insert(lower, read_text(&name, field).await?);
            }
            _ => {
                return Err(AppError::BadAssetUploadForm(format!(
                    "Unknown form field: {}",
                    name
                )));
            }
        }
    }

    let (file, file_content_type) = file
        .ok_or_else(|| AppError::BadAssetUploadForm("Missing file field".to_string()))?;

    // The file part fills in what the caller did not state explicitly.
    headers
        .entry("content-length".to_string())
        .or_insert_with(|| file.len().to_string());
    if let Some(content_type) = file_content_type {
        headers
            .entry("content-type".to_string())
            .or_insert(content_type);
    }

    Ok(CollectedForm {
        prefix,
        access,
        headers,
        file,
    })
}

async fn read_text(
    name: &str,
    field: axum::extract::multipart::Field<'_>,
) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|_| AppError::BadAssetUploadForm(format!("Field {} is not text", name)))
}

fn parse_access(value: &str) -> Result<AccessType, AppError> {
    match value {
        "public" => Ok(AccessType::Public),
        "private" => Ok(AccessType::Private),
        other => Err(AppError::BadAssetUploadForm(format!(
            "Invalid access value: {}",
            other
        ))),
    }
}

/// Host to verify the capability URL against.
fn request_host<'a>(headers: &'a HeaderMap, state: &AppState) -> &'a str {
    let host = headers
        .get(axum::http::header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    let forwarded = headers
        .get("x-forwarded-host")
        .and_then(|v| v.to_str().ok());
    effective_host(host, forwarded, state.config.trust_forwarded_host)
}

/// Percent-encode signed query pairs for URL emission. The encoding matches
/// what verification decodes, so the signed values round-trip exactly.
fn encode_query(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(name, value)| {
            format!(
                "{}={}",
                utf8_percent_encode(name, NON_ALPHANUMERIC),
                utf8_percent_encode(value, NON_ALPHANUMERIC)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}
