use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};

use assetgate_core::models::presign::{PresignUploadRequest, PresignUploadResponse};

use crate::auth::TenantContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::services::upload;
use crate::state::AppState;

/// Presign a direct-to-backend upload.
#[utoipa::path(
    post,
    path = "/presign_upload",
    tag = "uploads",
    request_body = PresignUploadRequest,
    responses(
        (status = 200, description = "Presigned upload request", body = PresignUploadResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 409, description = "Derived asset name already exists", body = ErrorResponse),
        (status = 502, description = "Storage backend failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, request),
    fields(tenant = %tenant_ctx.namespace, actor = ?tenant_ctx.actor)
)]
pub async fn presign_upload(
    tenant_ctx: TenantContext,
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<PresignUploadRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let response = upload::presign_upload(&state, &tenant_ctx.namespace, request).await?;
    Ok(Json(response))
}
