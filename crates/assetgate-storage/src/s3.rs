//! Amazon S3 (and S3-compatible) adapter.

use std::collections::HashMap;
use std::time::Duration;

use assetgate_core::constants::PRESIGN_EXPIRY;
use assetgate_core::{AccessType, StorageBackend};
use async_trait::async_trait;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::{Error as ObjectStoreError, ObjectStoreExt};

use crate::headers::HeaderTranslator;
use crate::traits::{
    ObjectPage, PresignedRequest, ResolvedGet, StorageAdapter, StorageError, StorageResult,
};

/// Query parameter whose presence marks an S3 presigned URL.
const SIGNATURE_QUERY_PARAM: &str = "X-Amz-Signature";

pub struct S3Adapter {
    store: AmazonS3,
    translator: HeaderTranslator,
    bucket: String,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
}

impl S3Adapter {
    /// Create a new S3 adapter.
    ///
    /// Credentials come from the environment via the object-store builder.
    /// `endpoint_url` selects an S3-compatible provider (e.g. MinIO).
    pub fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Adapter {
            store,
            translator: HeaderTranslator::s3(),
            bucket,
            region,
            endpoint_url,
        })
    }

    /// Unsigned URL for an object; used when the inbound request already
    /// carries the provider's own signature parameters.
    fn object_url(&self, key: &str) -> String {
        if let Some(ref endpoint) = self.endpoint_url {
            // Path-style for S3-compatible providers.
            let base_url = endpoint.trim_end_matches('/');
            format!("{}/{}/{}", base_url, self.bucket, key)
        } else {
            format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, key
            )
        }
    }

    async fn signed_url(&self, method: Method, key: &str, expires_in: Duration) -> StorageResult<String> {
        let location = Path::from(key);
        let url = self
            .store
            .signed_url(method, &location, expires_in)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, bucket = %self.bucket, key = %key, "S3 presign failed");
                StorageError::PresignFailed(e.to_string())
            })?;
        Ok(url.to_string())
    }
}

#[async_trait]
impl StorageAdapter for S3Adapter {
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
            "S3 presigned PUT"
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
                tracing::error!(error = %other, bucket = %self.bucket, key = %key, "S3 delete failed");
                StorageError::DeleteFailed(other.to_string())
            }
        })?;

        tracing::info!(bucket = %self.bucket, key = %key, "S3 delete successful");
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

/// True if the raw query string contains the named parameter.
pub(crate) fn query_has_param(query: &str, name: &str) -> bool {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| pair.split_once('=').map(|(k, _)| k).unwrap_or(pair))
        .any(|k| k == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_has_param() {
        assert!(query_has_param(
            "X-Amz-Algorithm=AWS4-HMAC-SHA256&X-Amz-Signature=abc",
            "X-Amz-Signature"
        ));
        assert!(!query_has_param("pipeline=image/format,png", "X-Amz-Signature"));
        assert!(!query_has_param("", "X-Amz-Signature"));
    }
}
