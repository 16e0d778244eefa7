//! Config-driven adapter construction. One adapter is chosen at process
//! start; there is no runtime backend switching.

use std::sync::Arc;

use assetgate_core::{Config, StorageBackend};

use crate::{AzureAdapter, GcsAdapter, S3Adapter, StorageAdapter, StorageError, StorageResult};

/// Create the storage adapter selected by configuration.
pub fn create_adapter(config: &Config) -> StorageResult<Arc<dyn StorageAdapter>> {
    match config.storage_backend {
        StorageBackend::S3 => {
            let bucket = config
                .s3_bucket
                .clone()
                .ok_or_else(|| StorageError::ConfigError("S3_BUCKET not configured".to_string()))?;
            let region = config.s3_region.clone().ok_or_else(|| {
                StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
            })?;
            let endpoint = config.s3_endpoint.clone();

            let adapter = S3Adapter::new(bucket, region, endpoint)?;
            Ok(Arc::new(adapter))
        }

        StorageBackend::Gcs => {
            let bucket = config.gcs_bucket.clone().ok_or_else(|| {
                StorageError::ConfigError("GCS_BUCKET not configured".to_string())
            })?;

            let adapter = GcsAdapter::new(bucket)?;
            Ok(Arc::new(adapter))
        }

        StorageBackend::Azure => {
            let account = config.azure_account.clone().ok_or_else(|| {
                StorageError::ConfigError("AZURE_STORAGE_ACCOUNT not configured".to_string())
            })?;
            let container = config.azure_container.clone().ok_or_else(|| {
                StorageError::ConfigError("AZURE_CONTAINER not configured".to_string())
            })?;

            let adapter = AzureAdapter::new(account, container)?;
            Ok(Arc::new(adapter))
        }
    }
}
