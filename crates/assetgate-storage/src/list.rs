//! Shared list paging over an object store.
//!
//! All backends page the same way, so the stream handling lives here and the
//! adapters only supply their store handle.

use assetgate_core::constants::LIST_PAGE_SIZE;
use futures::StreamExt;
use object_store::path::Path;
use object_store::{ObjectStore, ObjectStoreExt};

use crate::traits::{ObjectPage, StorageError, StorageResult};

/// Longest whole-segment prefix of a key prefix.
///
/// Provider prefix matching is path-segment based, so listing directly under
/// `tenant-a/av-` finds nothing even when `tenant-a/av-1234.png` exists. The
/// listing runs under the whole segments and the partial tail is filtered
/// string-wise on the full key.
fn segment_prefix(prefix: &str) -> Option<&str> {
    match prefix.rfind('/') {
        Some(idx) if idx > 0 => Some(&prefix[..idx]),
        _ => None,
    }
}

/// Stream one page of objects whose full key starts with `prefix`.
pub(crate) async fn collect_page<S: ObjectStore>(
    store: &S,
    prefix: &str,
    pagination_token: Option<&str>,
) -> StorageResult<ObjectPage> {
    let prefix_path = segment_prefix(prefix).map(Path::from);
    let mut stream = match pagination_token {
        Some(token) => store.list_with_offset(prefix_path.as_ref(), &Path::from(token)),
        None => store.list(prefix_path.as_ref()),
    };

    let mut objects: Vec<(String, u64)> = Vec::new();
    let mut next_token = None;
    while let Some(item) = stream.next().await {
        let meta = item.map_err(|e| StorageError::ListFailed(e.to_string()))?;
        let key = meta.location.to_string();
        if !key.starts_with(prefix) {
            continue;
        }
        if objects.len() == LIST_PAGE_SIZE {
            // More objects remain; resume from the last returned key.
            next_token = objects.last().map(|(key, _)| key.clone());
            break;
        }
        objects.push((key, meta.size));
    }

    Ok(ObjectPage {
        objects,
        pagination_token: next_token,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::memory::InMemory;
    use object_store::PutPayload;

    async fn seeded_store(keys: &[&str]) -> InMemory {
        let store = InMemory::new();
        for key in keys {
            store
                .put(&Path::from(*key), PutPayload::from_static(b"x"))
                .await
                .unwrap();
        }
        store
    }

    #[test]
    fn test_segment_prefix_drops_partial_tail() {
        assert_eq!(segment_prefix("tenant-a/av-"), Some("tenant-a"));
        assert_eq!(segment_prefix("tenant-a/"), Some("tenant-a"));
        assert_eq!(segment_prefix("tenant-a/avatars/u"), Some("tenant-a/avatars"));
        assert_eq!(segment_prefix("av-"), None);
        assert_eq!(segment_prefix(""), None);
    }

    #[tokio::test]
    async fn test_partial_segment_prefix_still_lists_matching_keys() {
        let store = seeded_store(&[
            "tenant-a/av-1234.png",
            "tenant-a/bv-5678.png",
            "tenant-b/av-9999.png",
        ])
        .await;

        let page = collect_page(&store, "tenant-a/av-", None).await.unwrap();
        let keys: Vec<_> = page.objects.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["tenant-a/av-1234.png"]);
        assert!(page.pagination_token.is_none());
    }

    #[tokio::test]
    async fn test_namespace_prefix_excludes_sibling_namespaces() {
        let store = seeded_store(&["tenant-a/logo.png", "tenant-ab/logo.png"]).await;

        let page = collect_page(&store, "tenant-a/", None).await.unwrap();
        let keys: Vec<_> = page.objects.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["tenant-a/logo.png"]);
    }
}
