//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use assetgate_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Assetgate API",
        version = "0.1.0",
        description = "Multi-tenant asset-storage gateway: presigned uploads, capability URLs, access-enforced downloads, and on-the-fly image transformation."
    ),
    paths(
        handlers::presign_upload::presign_upload,
        handlers::sign::get_signed_url,
        handlers::asset_get::get_asset,
        handlers::asset_list::list_assets,
        handlers::asset_delete::delete_asset,
        handlers::upload_form::presign_upload_form,
        handlers::upload_form::upload_form,
        handlers::health::healthz,
    ),
    components(schemas(
        models::access::AccessType,
        models::presign::PresignUploadRequest,
        models::presign::PresignUploadResponse,
        models::presign::HeaderField,
        models::presign::AssetItem,
        models::presign::SignRequest,
        models::presign::SignResponse,
        models::presign::SignedAsset,
        models::presign::ListedAsset,
        models::presign::ListResponse,
        handlers::upload_form::UploadFormUrlResponse,
        handlers::upload_form::UploadFormResponse,
        error::ErrorResponse,
    )),
    tags(
        (name = "uploads", description = "Presigned uploads and the browser upload form"),
        (name = "assets", description = "Fetching, signing, listing, and deleting assets"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

pub fn openapi_json() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
