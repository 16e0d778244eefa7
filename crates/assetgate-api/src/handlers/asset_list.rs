use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use assetgate_core::models::presign::{ListResponse, ListedAsset};
use assetgate_storage::keys;

use crate::auth::TenantContext;
use crate::error::{storage_error_to_app, ErrorResponse, HttpAppError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub pagination_token: Option<String>,
}

/// List assets in the tenant namespace, one page at a time.
#[utoipa::path(
    get,
    path = "/assets",
    tag = "assets",
    params(
        ("prefix" = Option<String>, Query, description = "Only list assets under this name prefix"),
        ("pagination_token" = Option<String>, Query, description = "Opaque token from the previous page")
    ),
    responses(
        (status = 200, description = "One page of assets", body = ListResponse),
        (status = 401, description = "Master key required", body = ErrorResponse),
        (status = 502, description = "Storage backend failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(tenant = %tenant_ctx.namespace))]
pub async fn list_assets(
    tenant_ctx: TenantContext,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    tenant_ctx.require_master()?;

    let prefix = keys::object_key(&tenant_ctx.namespace, query.prefix.as_deref().unwrap_or(""));
    let page = state
        .adapter
        .list_objects(&prefix, query.pagination_token.as_deref())
        .await
        .map_err(storage_error_to_app)?;

    // Keys outside the namespace never appear; the external name is the key
    // with the namespace stripped.
    let assets = page
        .objects
        .into_iter()
        .filter_map(|(key, size)| {
            keys::asset_name_from_key(&tenant_ctx.namespace, &key).map(|name| ListedAsset {
                asset_name: name.to_string(),
                size,
            })
        })
        .collect();

    Ok(Json(ListResponse {
        pagination_token: page.pagination_token,
        assets,
    }))
}
