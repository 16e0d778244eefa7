use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, http::HeaderMap, response::IntoResponse, Json};

use assetgate_core::constants::{MAX_SIGN_EXPIRE_SECS, PRESIGN_EXPIRY};
use assetgate_core::models::presign::{SignRequest, SignResponse, SignedAsset};
use assetgate_core::AppError;
use assetgate_storage::keys;

use crate::auth::TenantContext;
use crate::error::{storage_error_to_app, ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

/// Mint time-limited download links for private assets, in bulk.
///
/// Any single failure aborts the whole batch; there is no partial-success
/// contract. The returned URLs point at this gateway's `/get` path with the
/// provider's presigned query attached, so the gatekeeper recognizes them as
/// originally signed.
#[utoipa::path(
    post,
    path = "/get_signed_url",
    tag = "assets",
    request_body = SignRequest,
    responses(
        (status = 200, description = "Signed download links", body = SignResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Master key required", body = ErrorResponse),
        (status = 502, description = "Storage backend failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, headers, request), fields(tenant = %tenant_ctx.namespace))]
pub async fn get_signed_url(
    tenant_ctx: TenantContext,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ValidatedJson(request): ValidatedJson<SignRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    tenant_ctx.require_master()?;

    let (scheme, host) = super::external_base_url(&headers, &state.config);

    let mut assets = Vec::with_capacity(request.assets.len());
    for item in request.assets {
        if item.asset_name.is_empty() {
            return Err(AppError::ValidationFailed(
                "asset_name must not be empty".to_string(),
            )
            .into());
        }
        let expires_in = match item.expire {
            Some(secs) if secs > MAX_SIGN_EXPIRE_SECS => {
                return Err(AppError::ValidationFailed(format!(
                    "expire {} exceeds the maximum of {} seconds",
                    secs, MAX_SIGN_EXPIRE_SECS
                ))
                .into());
            }
            Some(secs) if secs > 0 => Duration::from_secs(secs),
            _ => PRESIGN_EXPIRY,
        };

        let key = keys::object_key(&tenant_ctx.namespace, &item.asset_name);
        let provider_url = state
            .adapter
            .presign_get_object(&key, expires_in)
            .await
            .map_err(storage_error_to_app)?;

        assets.push(SignedAsset {
            url: gateway_get_url(&scheme, &host, &key, &provider_url),
            asset_name: item.asset_name,
        });
    }

    Ok(Json(SignResponse { assets }))
}

/// Rebase a provider-presigned URL onto this gateway's `/get` path, keeping
/// the provider's signed query intact.
fn gateway_get_url(scheme: &str, host: &str, key: &str, provider_url: &str) -> String {
    match provider_url.split_once('?') {
        Some((_, query)) => format!("{}://{}/get/{}?{}", scheme, host, key, query),
        None => format!("{}://{}/get/{}", scheme, host, key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_get_url_keeps_provider_query() {
        let url = gateway_get_url(
            "https",
            "gateway.test",
            "tenant-a/logo.png",
            "https://bucket.s3.us-east-1.amazonaws.com/tenant-a/logo.png?X-Amz-Signature=abc",
        );
        assert_eq!(
            url,
            "https://gateway.test/get/tenant-a/logo.png?X-Amz-Signature=abc"
        );
    }

    #[test]
    fn test_gateway_get_url_without_query() {
        let url = gateway_get_url("http", "localhost:3000", "t/a.png", "https://x.test/t/a.png");
        assert_eq!(url, "http://localhost:3000/get/t/a.png");
    }
}
