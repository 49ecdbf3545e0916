use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

#[derive(Clone, Debug)]
struct Snapshot {
    result_id: String,
    data: Arc<[u32]>,
}

/// Last encoded token array sent per document, keyed by uri and checked
/// against the result id a delta request names.
#[derive(Debug, Default)]
pub struct TokenCache {
    snapshots: RwLock<HashMap<String, Snapshot>>,
    next_id: AtomicU64,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `data` as the latest snapshot of `uri` and return its fresh
    /// result id.
    pub fn store(&self, uri: &str, data: &[u32]) -> String {
        let result_id = (self.next_id.fetch_add(1, Ordering::Relaxed) + 1).to_string();
        self.snapshots.write().insert(
            uri.to_string(),
            Snapshot {
                result_id: result_id.clone(),
                data: data.into(),
            },
        );
        result_id
    }

    /// The snapshot of `uri`, if it is the one named `result_id`.
    pub fn get(&self, uri: &str, result_id: &str) -> Option<Arc<[u32]>> {
        self.snapshots
            .read()
            .get(uri)
            .filter(|s| s.result_id == result_id)
            .map(|s| s.data.clone())
    }

    pub fn invalidate(&self, uri: &str) {
        self.snapshots.write().remove(uri);
    }

    pub fn clear(&self) {
        self.snapshots.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_ids_increase() {
        let cache = TokenCache::new();
        let first = cache.store("file:///a.pas", &[0, 0, 1, 7, 0]);
        let second = cache.store("file:///b.pas", &[]);
        let third = cache.store("file:///a.pas", &[0, 2, 1, 7, 0]);
        let ids: Vec<u64> = [&first, &second, &third]
            .iter()
            .map(|id| id.parse().unwrap())
            .collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));

        assert_eq!(cache.get("file:///a.pas", &first), None);
        assert_eq!(
            cache.get("file:///a.pas", &third).as_deref(),
            Some(&[0, 2, 1, 7, 0][..])
        );
    }

    #[test]
    fn test_invalidate() {
        let cache = TokenCache::new();
        let id = cache.store("file:///a.pas", &[0, 0, 1, 7, 0]);
        cache.invalidate("file:///a.pas");
        assert_eq!(cache.get("file:///a.pas", &id), None);
    }
}
