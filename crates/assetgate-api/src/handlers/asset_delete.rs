use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};

use assetgate_storage::keys;

use crate::auth::TenantContext;
use crate::error::{storage_error_to_app, ErrorResponse, HttpAppError};
use crate::state::AppState;

/// Delete an asset.
#[utoipa::path(
    delete,
    path = "/delete/{asset_name}",
    tag = "assets",
    params(
        ("asset_name" = String, Path, description = "Asset name within the tenant namespace")
    ),
    responses(
        (status = 200, description = "Asset deleted"),
        (status = 401, description = "Master key required", body = ErrorResponse),
        (status = 404, description = "Asset not found", body = ErrorResponse),
        (status = 502, description = "Storage backend failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(tenant = %tenant_ctx.namespace, asset_name = %asset_name))]
pub async fn delete_asset(
    tenant_ctx: TenantContext,
    Path(asset_name): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    tenant_ctx.require_master()?;

    let key = keys::object_key(&tenant_ctx.namespace, &asset_name);
    state
        .adapter
        .delete_object(&key)
        .await
        .map_err(storage_error_to_app)?;

    tracing::info!("Asset deleted");
    Ok(Json(serde_json::json!({})))
}
