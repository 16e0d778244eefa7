//! Domain models shared across assetgate components.

pub mod access;
pub mod presign;
pub mod storage_types;

pub use access::AccessType;
pub use presign::{
    AssetItem, HeaderField, ListedAsset, ListResponse, PresignUploadRequest,
    PresignUploadResponse, SignRequest, SignResponse, SignedAsset,
};
pub use storage_types::StorageBackend;
