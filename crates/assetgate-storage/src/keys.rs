//! Shared object-key derivation for storage backends.
//!
//! Key format: `{tenant_namespace}/{asset_name}`, never with a leading slash.

/// Build the object key for an asset within a tenant namespace.
///
/// All backends use this format so assets stay addressable across providers.
pub fn object_key(tenant_namespace: &str, asset_name: &str) -> String {
    let namespace = tenant_namespace.trim_matches('/');
    let name = asset_name.trim_start_matches('/');
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", namespace, name)
    }
}

/// Strip the tenant namespace from a full object key, yielding the externally
/// visible asset name. Keys outside the namespace return `None`.
pub fn asset_name_from_key<'a>(tenant_namespace: &str, key: &'a str) -> Option<&'a str> {
    let namespace = tenant_namespace.trim_matches('/');
    if namespace.is_empty() {
        return Some(key);
    }
    key.strip_prefix(namespace)
        .and_then(|rest| rest.strip_prefix('/'))
}
