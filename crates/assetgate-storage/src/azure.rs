//! Azure Blob Storage adapter.

use std::collections::HashMap;
use std::time::Duration;

use assetgate_core::constants::PRESIGN_EXPIRY;
use assetgate_core::{AccessType, StorageBackend};
use async_trait::async_trait;
use http::Method;
use object_store::azure::{MicrosoftAzure, MicrosoftAzureBuilder};
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::{Error as ObjectStoreError, ObjectStoreExt};

use crate::headers::HeaderTranslator;
use crate::s3::query_has_param;
use crate::traits::{
    ObjectPage, PresignedRequest, ResolvedGet, StorageAdapter, StorageError, StorageResult,
};

/// Shared-access-signature parameter present on every Azure signed URL.
const SIGNATURE_QUERY_PARAM: &str = "sig";

pub struct AzureAdapter {
    store: MicrosoftAzure,
    translator: HeaderTranslator,
    account: String,
    container: String,
}

impl AzureAdapter {
    /// Create a new Azure Blob adapter. Account credentials come from the
    /// environment via the object-store builder.
    pub fn new(account: String, container: String) -> StorageResult<Self> {
        let store = MicrosoftAzureBuilder::from_env()
            .with_account(account.clone())
            .with_container_name(container.clone())
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(AzureAdapter {
            store,
            translator: HeaderTranslator::azure(),
            account,
            container,
        })
    }

    fn object_url(&self, key: &str) -> String {
        format!(
            "https://{}.blob.core.windows.net/{}/{}",
            self.account, self.container, key
        )
    }

    async fn signed_url(&self, method: Method, key: &str, expires_in: Duration) -> StorageResult<String> {
        let location = Path::from(key);
        let url = self
            .store
            .signed_url(method, &location, expires_in)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    container = %self.container,
                    key = %key,
                    "Azure presign failed"
                );
                StorageError::PresignFailed(e.to_string())
            })?;
        Ok(url.to_string())
    }
}

#[async_trait]
impl StorageAdapter for AzureAdapter {
    async fn presign_put_object(
        &self,
        key: &str,
        access: AccessType,
        headers: &HashMap<String, String>,
    ) -> StorageResult<PresignedRequest> {
        let headers = self.translator.put_headers(access, headers)?;
        let url = self.signed_url(Method::PUT, key, PRESIGN_EXPIRY).await?;

        tracing::debug!(
            container = %self.container,
            key = %key,
            access = %access.as_str(),
            header_count = headers.len(),
            "Azure presigned PUT"
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
                tracing::error!(
                    error = %other,
                    container = %self.container,
                    key = %key,
                    "Azure delete failed"
                );
                StorageError::DeleteFailed(other.to_string())
            }
        })?;

        tracing::info!(container = %self.container, key = %key, "Azure delete successful");
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Azure
    }
}
