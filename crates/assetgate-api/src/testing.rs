//! Shared handler-test fixtures: a scriptable storage adapter and a
//! throwaway local backend server.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use assetgate_core::{AccessType, Config, RequestSigner, StorageBackend};
use assetgate_storage::{
    HeaderTranslator, ObjectPage, PresignedRequest, ResolvedGet, StorageAdapter, StorageResult,
};
use async_trait::async_trait;
use http::Method;

use crate::state::AppState;

/// Adapter whose presigned URLs point wherever the test says, with the real
/// S3 translation tables behind the header methods.
pub(crate) struct MockAdapter {
    pub head_url: String,
    pub head_calls: Arc<AtomicUsize>,
    pub put_url: String,
    pub resolved: ResolvedGet,
    translator: HeaderTranslator,
}

impl MockAdapter {
    pub fn new() -> Self {
        MockAdapter {
            head_url: "http://127.0.0.1:9/unreachable".to_string(),
            head_calls: Arc::new(AtomicUsize::new(0)),
            put_url: "http://127.0.0.1:9/put".to_string(),
            resolved: ResolvedGet {
                url: "http://127.0.0.1:9/get".to_string(),
                originally_signed: false,
            },
            translator: HeaderTranslator::s3(),
        }
    }

    pub fn with_head_url(mut self, url: impl Into<String>) -> Self {
        self.head_url = url.into();
        self
    }

    pub fn with_resolved(mut self, url: impl Into<String>, originally_signed: bool) -> Self {
        self.resolved = ResolvedGet {
            url: url.into(),
            originally_signed,
        };
        self
    }
}

#[async_trait]
impl StorageAdapter for MockAdapter {
    async fn presign_put_object(
        &self,
        _key: &str,
        access: AccessType,
        headers: &HashMap<String, String>,
    ) -> StorageResult<PresignedRequest> {
        let headers = self.translator.put_headers(access, headers)?;
        Ok(PresignedRequest {
            method: Method::PUT,
            url: self.put_url.clone(),
            headers,
        })
    }

    async fn presign_get_object(&self, _key: &str, _expires_in: Duration) -> StorageResult<String> {
        Ok(self.resolved.url.clone())
    }

    async fn presign_head_object(&self, _key: &str) -> StorageResult<String> {
        self.head_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.head_url.clone())
    }

    async fn resolve_get_object(&self, _key: &str, _query: &str) -> StorageResult<ResolvedGet> {
        Ok(self.resolved.clone())
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
        _prefix: &str,
        _pagination_token: Option<&str>,
    ) -> StorageResult<ObjectPage> {
        Ok(ObjectPage {
            objects: Vec::new(),
            pagination_token: None,
        })
    }

    async fn delete_object(&self, _key: &str) -> StorageResult<()> {
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

pub(crate) fn test_state(adapter: MockAdapter) -> Arc<AppState> {
    let config = Config {
        server_port: 3000,
        environment: "test".into(),
        cors_origins: vec![],
        max_body_bytes: 100 * 1024 * 1024,
        storage_backend: StorageBackend::S3,
        s3_bucket: Some("assets".into()),
        s3_region: Some("us-east-1".into()),
        s3_endpoint: None,
        gcs_bucket: None,
        azure_container: None,
        azure_account: None,
        signing_secret: "0123456789abcdef0123456789abcdef".into(),
        trust_forwarded_host: false,
    };
    Arc::new(AppState {
        adapter: Arc::new(adapter),
        signer: RequestSigner::new(config.signing_secret.as_bytes().to_vec()),
        http: reqwest::Client::new(),
        config,
    })
}

/// Serve the router on an ephemeral local port, returning its base URL.
pub(crate) async fn spawn_backend(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve test backend");
    });
    format!("http://{}", addr)
}
