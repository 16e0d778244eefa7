//! Configuration module
//!
//! Environment-driven configuration for the gateway: server settings, the
//! selected storage backend and its location, and the shared secret behind
//! the first-party capability-URL signer. Credential provisioning for each
//! backend (access keys, service accounts, SAS material) is picked up from
//! the environment by the object-store builders themselves.

use std::env;

use crate::models::storage_types::StorageBackend;

const DEFAULT_SERVER_PORT: u16 = 3000;
const DEFAULT_MAX_BODY_BYTES: usize = 100 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    /// Upper bound on inbound request bodies (the upload form carries files).
    pub max_body_bytes: usize,

    // Storage backend selection and location
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
    pub gcs_bucket: Option<String>,
    pub azure_container: Option<String>,
    pub azure_account: Option<String>,

    // Capability-URL signing
    pub signing_secret: String,
    /// Honor `X-Forwarded-Host` when computing the effective host for
    /// signing/verification. Only enable behind a trusted proxy.
    pub trust_forwarded_host: bool,
}

impl Config {
    /// Load configuration from the environment.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let storage_backend = env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "s3".to_string())
            .parse::<StorageBackend>()
            .map_err(|e| anyhow::anyhow!("STORAGE_BACKEND: {}", e))?;

        let signing_secret = env::var("SIGNING_SECRET")
            .map_err(|_| anyhow::anyhow!("SIGNING_SECRET must be set"))?;
        if signing_secret.len() < 32 {
            anyhow::bail!("SIGNING_SECRET must be at least 32 bytes");
        }

        let config = Config {
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SERVER_PORT),
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            cors_origins: env::var("CORS_ORIGINS")
                .unwrap_or_default()
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            max_body_bytes: env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_BODY_BYTES),
            storage_backend,
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION")
                .ok()
                .or_else(|| env::var("AWS_REGION").ok()),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            gcs_bucket: env::var("GCS_BUCKET").ok(),
            azure_container: env::var("AZURE_CONTAINER").ok(),
            azure_account: env::var("AZURE_STORAGE_ACCOUNT")
                .ok()
                .or_else(|| env::var("AZURE_STORAGE_ACCOUNT_NAME").ok()),
            signing_secret,
            trust_forwarded_host: env::var("TRUST_FORWARDED_HOST")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check that the selected backend has its required settings.
    fn validate(&self) -> Result<(), anyhow::Error> {
        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    anyhow::bail!("S3_BUCKET must be set when STORAGE_BACKEND=s3");
                }
                if self.s3_region.is_none() {
                    anyhow::bail!("S3_REGION or AWS_REGION must be set when STORAGE_BACKEND=s3");
                }
            }
            StorageBackend::Gcs => {
                if self.gcs_bucket.is_none() {
                    anyhow::bail!("GCS_BUCKET must be set when STORAGE_BACKEND=gcs");
                }
            }
            StorageBackend::Azure => {
                if self.azure_container.is_none() {
                    anyhow::bail!("AZURE_CONTAINER must be set when STORAGE_BACKEND=azure");
                }
                if self.azure_account.is_none() {
                    anyhow::bail!("AZURE_STORAGE_ACCOUNT must be set when STORAGE_BACKEND=azure");
                }
            }
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }
}
