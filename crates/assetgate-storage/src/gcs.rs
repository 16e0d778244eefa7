//! Google Cloud Storage adapter.

use std::collections::HashMap;
use std::time::Duration;

use assetgate_core::constants::PRESIGN_EXPIRY;
use assetgate_core::{AccessType, StorageBackend};
use async_trait::async_trait;
use http::Method;
use object_store::gcp::{GoogleCloudStorage, GoogleCloudStorageBuilder};
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::{Error as ObjectStoreError, ObjectStoreExt};

use crate::headers::HeaderTranslator;
use crate::s3::query_has_param;
use crate::traits::{
    ObjectPage, PresignedRequest, ResolvedGet, StorageAdapter, StorageError, StorageResult,
};

/// Query parameter whose presence marks a GCS V4 signed URL.
const SIGNATURE_QUERY_PARAM: &str = "X-Goog-Signature";

pub struct GcsAdapter {
    store: GoogleCloudStorage,
    translator: HeaderTranslator,
    bucket: String,
}

impl GcsAdapter {
    /// Create a new GCS adapter. Service-account credentials come from the
    /// environment via the object-store builder.
    pub fn new(bucket: String) -> StorageResult<Self> {
        let store = GoogleCloudStorageBuilder::from_env()
            .with_bucket_name(bucket.clone())
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(GcsAdapter {
            store,
            translator: HeaderTranslator::gcs(),
            bucket,
        })
    }

    fn object_url(&self, key: &str) -> String {
        format!("https://storage.googleapis.com/{}/{}", self.bucket, key)
    }

    async fn signed_url(&self, method: Method, key: &str, expires_in: Duration) -> StorageResult<String> {
        let location = Path::from(key);
        let url = self
            .store
            .signed_url(method, &location, expires_in)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, bucket = %self.bucket, key = %key, "GCS presign failed");
                StorageError::PresignFailed(e.to_string())
            })?;
        Ok(url.to_string())
    }
}

#[async_trait]
impl StorageAdapter for GcsAdapter {
    async fn presign_put_object(
        &self,
        key: &str,
        access: AccessType,
        headers: &HashMap<String, String>,
    ) -> StorageResult<PresignedRequest> {
        let headers = self.translator.put_headers(access, headers)?;
        let url = self.signed_url(Method::PUT, key, PRESIGN_EXPIRY).await?;

        tracing::debug!(
            bucket = %self.bucket,
            key = %key,
            access = %access.as_str(),
            header_count = headers.len(),
            "GCS presigned PUT"
        );

        Ok(PresignedRequest {
            method: Method::PUT,
            url,
            headers,
        })
    }

    async fn presign_get_object(&self, key: &str, expires_in: Duration) -> StorageResult<String> {
        self.signed_url(Method::GET, key, expires_in).await
    }

    async fn presign_head_object(&self, key: &str) -> StorageResult<String> {
        self.signed_url(Method::HEAD, key, PRESIGN_EXPIRY).await
    }

    async fn resolve_get_object(&self, key: &str, query: &str) -> StorageResult<ResolvedGet> {
        if query_has_param(query, SIGNATURE_QUERY_PARAM) {
            let base = self.object_url(key);
            return Ok(ResolvedGet {
                url: format!("{}?{}", base, query),
                originally_signed: true,
            });
        }
        let url = self.signed_url(Method::GET, key, PRESIGN_EXPIRY).await?;
        Ok(ResolvedGet {
            url,
            originally_signed: false,
        })
    }

    fn access_type(&self, headers: &HashMap<String, String>) -> AccessType {
        self.translator.read_access_type(headers)
    }

    fn standard_to_proprietary(&self, headers: HashMap<String, String>) -> HashMap<String, String> {
        self.translator.standard_to_proprietary(headers)
    }

    fn proprietary_to_standard(&self, headers: HashMap<String, String>) -> HashMap<String, String> {
        self.translator.proprietary_to_standard(headers)
    }

    async fn list_objects(
        &self,
        prefix: &str,
        pagination_token: Option<&str>,
    ) -> StorageResult<ObjectPage> {
        crate::list::collect_page(&self.store, prefix, pagination_token).await
    }

    async fn delete_object(&self, key: &str) -> StorageResult<()> {
        let location = Path::from(key);
        self.store.delete(&location).await.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(key.to_string()),
            other => {
                tracing::error!(error = %other, bucket = %self.bucket, key = %key, "GCS delete failed");
                StorageError::DeleteFailed(other.to_string())
            }
        })?;

        tracing::info!(bucket = %self.bucket, key = %key, "GCS delete successful");
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Gcs
    }
}
