//! Named cache partitions mapping URLs to stored responses.

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use url::Url;

/// A response as the cache stores it: status, media type, body.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl CachedResponse {
    /// Whether the response is a plain HTTP success.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// A set of named partitions, each mapping request URL to response.
///
/// Partitions spring into existence on first `put`; deleting one that does
/// not exist is a no-op. The trait is the seam between the worker and
/// whatever actually holds the bytes.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Store a response under `url` in the named partition.
    async fn put(&self, partition: &str, url: &Url, response: CachedResponse);

    /// Look up a response in one partition.
    async fn get(&self, partition: &str, url: &Url) -> Option<CachedResponse>;

    /// Names of all existing partitions.
    async fn partitions(&self) -> Vec<String>;

    /// Drop a partition and everything in it.
    async fn delete_partition(&self, partition: &str);
}

/// In-memory partition store.
#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    partitions: DashMap<String, DashMap<String, CachedResponse>>,
}

impl MemoryCacheStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn put(&self, partition: &str, url: &Url, response: CachedResponse) {
        self.partitions
            .entry(partition.to_string())
            .or_default()
            .insert(url.as_str().to_string(), response);
    }

    async fn get(&self, partition: &str, url: &Url) -> Option<CachedResponse> {
        self.partitions
            .get(partition)?
            .get(url.as_str())
            .map(|entry| entry.clone())
    }

    async fn partitions(&self) -> Vec<String> {
        self.partitions
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    async fn delete_partition(&self, partition: &str) {
        self.partitions.remove(partition);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(body: &str) -> CachedResponse {
        CachedResponse {
            status: 200,
            content_type: Some("text/html".to_string()),
            body: Bytes::copy_from_slice(body.as_bytes()),
        }
    }

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let storage = MemoryCacheStorage::new();
        let url = Url::parse("http://localhost:3000/index.html").expect("url");

        assert!(storage.get("static", &url).await.is_none());
        storage.put("static", &url, response("<html>")).await;

        let cached = storage.get("static", &url).await.expect("cached");
        assert_eq!(cached.body, Bytes::from_static(b"<html>"));
        // Same path in a different partition stays invisible.
        assert!(storage.get("dynamic", &url).await.is_none());
    }

    #[tokio::test]
    async fn test_delete_partition_drops_contents() {
        let storage = MemoryCacheStorage::new();
        let url = Url::parse("http://localhost:3000/").expect("url");
        storage.put("old-v0", &url, response("stale")).await;

        assert_eq!(storage.partitions().await, vec!["old-v0".to_string()]);
        storage.delete_partition("old-v0").await;
        assert!(storage.partitions().await.is_empty());
        assert!(storage.get("old-v0", &url).await.is_none());
    }
}
