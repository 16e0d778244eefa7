pub mod asset_delete;
pub mod asset_get;
pub mod asset_list;
pub mod health;
pub mod presign_upload;
pub mod sign;
pub mod upload_form;

/// Scheme and host the gateway is reachable at from the caller's side, used
/// when minting URLs that point back at this gateway or at `/get` paths.
pub(crate) fn external_base_url(
    headers: &axum::http::HeaderMap,
    config: &assetgate_core::Config,
) -> (String, String) {
    let host = headers
        .get(axum::http::header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    let forwarded = headers
        .get("x-forwarded-host")
        .and_then(|v| v.to_str().ok());
    let host =
        assetgate_core::signing::effective_host(host, forwarded, config.trust_forwarded_host)
            .to_string();

    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .filter(|_| config.trust_forwarded_host)
        .unwrap_or(if config.is_production() { "https" } else { "http" })
        .to_string();

    (scheme, host)
}
