//! Download gatekeeper.
//!
//! Proxies asset fetches to the backend, enforcing the public/private access
//! model the providers do not share: a private asset is only served when the
//! inbound URL already carries the provider's own signature (i.e. it was
//! minted by this gateway's signing step). An optional `pipeline` query
//! argument requests an on-the-fly image transformation; the pipeline is
//! advisory, and any parse or apply failure serves the original bytes.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};
use percent_encoding::percent_decode_str;

use assetgate_core::constants::PIPELINE_QUERY_PARAM;
use assetgate_core::{AccessType, AppError};
use assetgate_processing::{apply_pipeline, is_supported_image, parse_pipeline};

use crate::error::{storage_error_to_app, HttpAppError};
use crate::state::AppState;

/// Inbound headers that never reach the backend: routing/identity headers
/// belonging to this gateway, plus hop-by-hop fields the proxy owns.
const INTERNAL_REQUEST_HEADERS: &[&str] = &[
    "host",
    "x-api-key",
    "x-gateway-tenant",
    "x-gateway-actor",
    "x-forwarded-host",
    "x-forwarded-proto",
    "x-forwarded-for",
    "connection",
    "keep-alive",
    "proxy-authorization",
    "te",
    "transfer-encoding",
    "upgrade",
    "content-length",
    "accept-encoding",
    "cookie",
    "authorization",
];

/// Backend response headers the proxy owns and never forwards verbatim.
const HOP_BY_HOP_RESPONSE_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "transfer-encoding",
    "upgrade",
    "te",
    "trailer",
];

/// Fetch an asset, optionally transformed.
#[utoipa::path(
    get,
    path = "/get/{key}",
    tag = "assets",
    params(
        ("key" = String, Path, description = "Full object key (tenant namespace included)"),
        ("pipeline" = Option<String>, Query, description = "Image transformation pipeline, e.g. image/resize,m_lfit,w_200")
    ),
    responses(
        (status = 200, description = "Asset bytes", content_type = "application/octet-stream"),
        (status = 401, description = "Private asset without a valid signature"),
        (status = 502, description = "Backend transport failure")
    )
)]
#[tracing::instrument(skip_all, fields(key = %key))]
pub async fn get_asset(
    method: Method,
    Path(key): Path<String>,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    axum::extract::RawQuery(raw_query): axum::extract::RawQuery,
) -> Result<Response, HttpAppError> {
    let raw_query = raw_query.unwrap_or_default();
    let (pipeline_arg, backend_query) = split_pipeline_query(&raw_query);

    let resolved = state
        .adapter
        .resolve_get_object(&key, &backend_query)
        .await
        .map_err(storage_error_to_app)?;

    let forward_headers = forward_request_headers(&headers, pipeline_arg.is_some());
    let upstream = state
        .http
        .request(method.clone(), &resolved.url)
        .headers(forward_headers)
        .send()
        .await
        .map_err(|e| {
            tracing::error!(error = %e, key = %key, "Backend fetch failed");
            AppError::Transport(e.to_string())
        })?;

    let status = upstream.status();
    let raw_headers = collect_headers(upstream.headers());

    if !status.is_success() {
        // Pass the backend's answer through untouched apart from translation.
        let translated = state.adapter.proprietary_to_standard(raw_headers);
        let body = Body::from_stream(upstream.bytes_stream());
        return Ok(build_response(status, &translated, body));
    }

    // Fail closed: missing or unknown access metadata means private.
    let access = state.adapter.access_type(&raw_headers);
    if access == AccessType::Private && !resolved.originally_signed {
        return Err(AppError::Unauthorized(
            "Private asset requires a signed URL".to_string(),
        )
        .into());
    }

    let mut translated = state.adapter.proprietary_to_standard(raw_headers);

    if let Some(pipeline_arg) = pipeline_arg {
        // A transformed representation has no stable byte offsets.
        translated.remove("accept-ranges");

        let content_type = translated
            .get("content-type")
            .cloned()
            .unwrap_or_default();
        if method != Method::HEAD && is_supported_image(&content_type) {
            let bytes = upstream.bytes().await.map_err(|e| {
                tracing::error!(error = %e, key = %key, "Backend body read failed");
                AppError::Transport(e.to_string())
            })?;

            return Ok(match run_pipeline(&pipeline_arg, &bytes) {
                Some(transformed) => {
                    apply_transformed_headers(
                        &mut translated,
                        transformed.content_type,
                        transformed.bytes.len(),
                    );
                    build_response(status, &translated, Body::from(transformed.bytes))
                }
                // Advisory: serve the original bytes unchanged.
                None => build_response(status, &translated, Body::from(bytes)),
            });
        }
    }

    let body = Body::from_stream(upstream.bytes_stream());
    Ok(build_response(status, &translated, body))
}

/// Parse and apply a pipeline; `None` means skip it and serve the original.
fn run_pipeline(
    pipeline_arg: &str,
    bytes: &[u8],
) -> Option<assetgate_processing::TransformedImage> {
    let pipeline = match parse_pipeline(pipeline_arg) {
        Ok(pipeline) => pipeline,
        Err(err) => {
            tracing::debug!(error = %err, "Pipeline parse failed, serving original");
            return None;
        }
    };
    match apply_pipeline(bytes, &pipeline) {
        Ok(transformed) => Some(transformed),
        Err(err) => {
            tracing::debug!(error = %err, "Pipeline apply failed, serving original");
            None
        }
    }
}

/// Describe the transformed representation: its own content type and length,
/// and no upstream validators, since those belong to the stored bytes.
fn apply_transformed_headers(
    headers: &mut HashMap<String, String>,
    content_type: &str,
    content_length: usize,
) {
    headers.insert("content-type".to_string(), content_type.to_string());
    headers.insert("content-length".to_string(), content_length.to_string());
    headers.remove("etag");
    headers.remove("last-modified");
}

/// Extract the pipeline argument from a raw query string, returning it
/// (percent-decoded) and the query with the parameter removed.
fn split_pipeline_query(raw_query: &str) -> (Option<String>, String) {
    let mut pipeline = None;
    let mut remaining = Vec::new();
    for pair in raw_query.split('&').filter(|p| !p.is_empty()) {
        let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
        if name == PIPELINE_QUERY_PARAM {
            pipeline = Some(
                percent_decode_str(value)
                    .decode_utf8_lossy()
                    .into_owned(),
            );
        } else {
            remaining.push(pair);
        }
    }
    (pipeline, remaining.join("&"))
}

/// Inbound headers forwarded to the backend, with internal-only names removed
/// and range negotiation dropped when a transformation is requested.
fn forward_request_headers(headers: &HeaderMap, has_pipeline: bool) -> HeaderMap {
    let mut forward = HeaderMap::new();
    for (name, value) in headers {
        let lower = name.as_str().to_ascii_lowercase();
        if INTERNAL_REQUEST_HEADERS.contains(&lower.as_str()) {
            continue;
        }
        if has_pipeline && (lower == "range" || lower == "if-range") {
            continue;
        }
        forward.insert(name.clone(), value.clone());
    }
    forward
}

fn collect_headers(headers: &reqwest::header::HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
        })
        .collect()
}

fn build_response(
    status: StatusCode,
    headers: &HashMap<String, String>,
    body: Body,
) -> Response {
    let mut response = Response::builder().status(status);
    if let Some(map) = response.headers_mut() {
        for (name, value) in headers {
            if HOP_BY_HOP_RESPONSE_HEADERS.contains(&name.as_str()) {
                continue;
            }
            if let (Ok(name), Ok(value)) = (
                HeaderName::try_from(name.as_str()),
                HeaderValue::try_from(value.as_str()),
            ) {
                map.insert(name, value);
            }
        }
    }
    response.body(body).unwrap_or_else(|_| {
        (StatusCode::INTERNAL_SERVER_ERROR, "response build failed").into_response()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{spawn_backend, test_state, MockAdapter};
    use axum::http::header;
    use axum::{routing::get, Router};

    async fn private_object() -> ([(&'static str, &'static str); 1], &'static str) {
        ([("x-amz-meta-access", "private")], "secret-bytes")
    }

    #[tokio::test]
    async fn test_private_asset_without_provider_signature_is_rejected() {
        let base = spawn_backend(Router::new().route("/{*key}", get(private_object))).await;
        let adapter =
            MockAdapter::new().with_resolved(format!("{}/tenant-a/secret.bin", base), false);
        let state = test_state(adapter);

        let result = get_asset(
            Method::GET,
            Path("tenant-a/secret.bin".to_string()),
            State(state),
            HeaderMap::new(),
            axum::extract::RawQuery(None),
        )
        .await;

        match result {
            Err(HttpAppError(AppError::Unauthorized(_))) => {}
            other => panic!("expected Unauthorized, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_private_asset_with_provider_signature_is_served() {
        let base = spawn_backend(Router::new().route("/{*key}", get(private_object))).await;
        let adapter = MockAdapter::new().with_resolved(
            format!("{}/tenant-a/secret.bin?X-Amz-Signature=abc", base),
            true,
        );
        let state = test_state(adapter);

        let response = get_asset(
            Method::GET,
            Path("tenant-a/secret.bin".to_string()),
            State(state),
            HeaderMap::new(),
            axum::extract::RawQuery(Some("X-Amz-Signature=abc".to_string())),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"secret-bytes");
    }

    #[test]
    fn test_split_pipeline_query_extracts_and_decodes() {
        let (pipeline, rest) = split_pipeline_query(
            "X-Amz-Signature=abc&pipeline=image%2Fresize%2Cm_lfit%2Cw_200&X-Amz-Date=x",
        );
        assert_eq!(pipeline.as_deref(), Some("image/resize,m_lfit,w_200"));
        assert_eq!(rest, "X-Amz-Signature=abc&X-Amz-Date=x");
    }

    #[test]
    fn test_split_pipeline_query_without_pipeline() {
        let (pipeline, rest) = split_pipeline_query("a=1&b=2");
        assert_eq!(pipeline, None);
        assert_eq!(rest, "a=1&b=2");
    }

    #[test]
    fn test_split_pipeline_query_empty() {
        let (pipeline, rest) = split_pipeline_query("");
        assert_eq!(pipeline, None);
        assert_eq!(rest, "");
    }

    #[test]
    fn test_forward_headers_strip_internal_names() {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_static("secret"));
        headers.insert("x-gateway-tenant", HeaderValue::from_static("tenant-a"));
        headers.insert(header::RANGE, HeaderValue::from_static("bytes=0-99"));
        headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));

        let forwarded = forward_request_headers(&headers, false);
        assert!(forwarded.get("x-api-key").is_none());
        assert!(forwarded.get("x-gateway-tenant").is_none());
        assert!(forwarded.get(header::RANGE).is_some());
        assert!(forwarded.get(header::ACCEPT).is_some());
    }

    #[test]
    fn test_forward_headers_strip_range_when_pipeline_requested() {
        let mut headers = HeaderMap::new();
        headers.insert(header::RANGE, HeaderValue::from_static("bytes=0-99"));
        headers.insert(header::IF_RANGE, HeaderValue::from_static("etag"));

        let forwarded = forward_request_headers(&headers, true);
        assert!(forwarded.get(header::RANGE).is_none());
        assert!(forwarded.get(header::IF_RANGE).is_none());
    }

    #[test]
    fn test_transformed_headers_drop_upstream_validators() {
        let mut headers: HashMap<String, String> = [
            ("content-type", "image/png"),
            ("content-length", "100"),
            ("etag", "\"abc123\""),
            ("last-modified", "Mon, 01 Jan 2024 00:00:00 GMT"),
            ("cache-control", "max-age=3600"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        apply_transformed_headers(&mut headers, "image/jpeg", 42);

        assert_eq!(headers.get("content-type").map(String::as_str), Some("image/jpeg"));
        assert_eq!(headers.get("content-length").map(String::as_str), Some("42"));
        assert!(!headers.contains_key("etag"));
        assert!(!headers.contains_key("last-modified"));
        assert_eq!(
            headers.get("cache-control").map(String::as_str),
            Some("max-age=3600")
        );
    }

    #[test]
    fn test_run_pipeline_is_advisory_on_parse_failure() {
        assert!(run_pipeline("image/unknown", b"bytes").is_none());
        assert!(run_pipeline("", b"bytes").is_none());
    }

    #[test]
    fn test_run_pipeline_is_advisory_on_decode_failure() {
        assert!(run_pipeline("image/format,png", b"not an image").is_none());
    }
}
