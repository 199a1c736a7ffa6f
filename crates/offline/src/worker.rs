//! Worker lifecycle and fetch strategies.
//!
//! The worker mirrors a browser service worker's life: `install` pre-caches
//! the application shell, `activate` evicts partitions left behind by
//! older versions, and from then on every GET is answered by one of two
//! strategies:
//!
//! - **cache-first** for shell assets: anything pre-cached or under
//!   `/assets/` is served from the static partition forever, filling in
//!   from the network only on a miss.
//! - **network-first** for everything else: the network wins when it
//!   answers; successful responses are copied into the dynamic partition
//!   so the app keeps working when it goes offline later.
//!
//! Payment and identity-provider requests are never touched; intercepting
//! a checkout redirect would break it in ways the cache cannot fix.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::fetcher::NetworkFetcher;
use crate::storage::{CacheStorage, CachedResponse};

/// Versioned partition for the pre-cached application shell. Bump the
/// version to orphan the old partition; `activate` deletes it.
pub const STATIC_CACHE: &str = "tiffin-static-v1";

/// Versioned partition for responses picked up while browsing.
pub const DYNAMIC_CACHE: &str = "tiffin-dynamic-v1";

/// The application shell, pre-cached on install.
pub const STATIC_ASSETS: [&str; 10] = [
    "/",
    "/index.html",
    "/manifest.json",
    "/assets/generated/restaurant-icon-192x192.png",
    "/assets/generated/restaurant-icon-512x512.png",
    "/assets/generated/restaurant-logo-transparent.dim_200x200.png",
    "/assets/generated/appetizer-sample.dim_400x300.jpg",
    "/assets/generated/beverage-sample.dim_400x300.jpg",
    "/assets/generated/dessert-sample.dim_400x300.jpg",
    "/assets/generated/main-dish-sample.dim_400x300.jpg",
];

/// Hosts whose traffic the worker must never intercept: the identity
/// provider and the payment processor.
const BYPASS_HOST_MARKERS: [&str; 4] = [".ic0.app", ".icp0.io", "stripe.com", "identity.ic0.app"];

/// Where the worker is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerPhase {
    Installing,
    /// Installed, not yet controlling fetches.
    Waiting,
    Active,
}

/// A fetch as the worker sees it.
#[derive(Debug, Clone)]
pub struct AssetRequest {
    /// HTTP method, uppercase.
    pub method: String,
    pub url: Url,
}

impl AssetRequest {
    /// A GET for the given URL.
    #[must_use]
    pub fn get(url: Url) -> Self {
        Self {
            method: "GET".to_string(),
            url,
        }
    }

    fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }
}

/// What the worker decided about a fetch.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// Serve this response (from cache or network).
    Response(CachedResponse),
    /// Not the worker's business; let the request through untouched.
    PassThrough,
}

/// Errors surfaced to fetch callers.
#[derive(Debug, Clone, Error)]
pub enum OfflineCacheError {
    /// Network down and nothing cached that could stand in.
    #[error("offline and no cached response for {0}")]
    Unavailable(Url),

    /// The worker task is gone.
    #[error("offline worker has shut down")]
    ChannelClosed,
}

/// Client-to-worker control messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientMessage {
    /// Promote a waiting worker version immediately.
    SkipWaiting,
}

/// The service-worker analogue: owns the partitions, answers fetches.
pub struct OfflineWorker {
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn NetworkFetcher>,
    /// Origin the shell is served from; asset paths resolve against it.
    origin: Url,
    phase: WorkerPhase,
}

impl OfflineWorker {
    #[must_use]
    pub fn new(storage: Arc<dyn CacheStorage>, fetcher: Arc<dyn NetworkFetcher>, origin: Url) -> Self {
        Self {
            storage,
            fetcher,
            origin,
            phase: WorkerPhase::Installing,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> WorkerPhase {
        self.phase
    }

    /// Pre-cache the application shell.
    ///
    /// A single unreachable asset must not brick the install, so per-asset
    /// failures are logged and swallowed; whatever did land is served.
    pub async fn install(&mut self) {
        info!(partition = STATIC_CACHE, "installing offline worker");

        for path in STATIC_ASSETS {
            let Ok(url) = self.origin.join(path) else {
                warn!(path, "asset path does not resolve against origin");
                continue;
            };
            match self.fetcher.get(&url).await {
                Ok(response) => {
                    self.storage.put(STATIC_CACHE, &url, response).await;
                }
                Err(err) => {
                    warn!(%url, error = %err, "failed to pre-cache asset");
                }
            }
        }

        self.phase = WorkerPhase::Waiting;
    }

    /// Take control: evict partitions belonging to older versions.
    pub async fn activate(&mut self) {
        info!("activating offline worker");

        for partition in self.storage.partitions().await {
            if partition != STATIC_CACHE && partition != DYNAMIC_CACHE {
                info!(partition, "deleting stale cache partition");
                self.storage.delete_partition(&partition).await;
            }
        }

        self.phase = WorkerPhase::Active;
    }

    /// Handle a control message.
    pub fn handle_message(&mut self, message: ClientMessage) {
        match message {
            ClientMessage::SkipWaiting => {
                if self.phase == WorkerPhase::Waiting {
                    info!("skip-waiting: promoting worker");
                    self.phase = WorkerPhase::Active;
                }
            }
        }
    }

    /// Answer one fetch.
    ///
    /// # Errors
    ///
    /// Returns [`OfflineCacheError::Unavailable`] when the network fails
    /// and no cached response (nor the cached root document) can stand in.
    pub async fn handle_fetch(
        &self,
        request: &AssetRequest,
    ) -> Result<FetchOutcome, OfflineCacheError> {
        if !request.is_get() {
            return Ok(FetchOutcome::PassThrough);
        }
        if self.is_bypassed_host(&request.url) {
            debug!(url = %request.url, "bypassing external host");
            return Ok(FetchOutcome::PassThrough);
        }

        if Self::is_static_path(request.url.path()) {
            self.cache_first(&request.url).await
        } else {
            self.network_first(&request.url).await
        }
    }

    fn is_bypassed_host(&self, url: &Url) -> bool {
        url.host_str()
            .is_some_and(|host| BYPASS_HOST_MARKERS.iter().any(|marker| host.contains(marker)))
    }

    fn is_static_path(path: &str) -> bool {
        STATIC_ASSETS.contains(&path) || path.starts_with("/assets/")
    }

    /// Serve from the static partition; fill it from the network on a
    /// miss. Offline with nothing cached degrades to the cached root.
    async fn cache_first(&self, url: &Url) -> Result<FetchOutcome, OfflineCacheError> {
        if let Some(cached) = self.storage.get(STATIC_CACHE, url).await {
            debug!(%url, "static cache hit");
            return Ok(FetchOutcome::Response(cached));
        }

        match self.fetcher.get(url).await {
            Ok(response) => {
                self.storage.put(STATIC_CACHE, url, response.clone()).await;
                Ok(FetchOutcome::Response(response))
            }
            Err(err) => {
                debug!(%url, error = %err, "static fetch failed, serving root fallback");
                self.root_fallback(url).await
            }
        }
    }

    /// Prefer the network; remember successes, fall back to whatever was
    /// remembered when it is down.
    async fn network_first(&self, url: &Url) -> Result<FetchOutcome, OfflineCacheError> {
        match self.fetcher.get(url).await {
            Ok(response) => {
                // Errors and redirects are returned but never remembered.
                if response.is_ok() {
                    self.storage.put(DYNAMIC_CACHE, url, response.clone()).await;
                }
                Ok(FetchOutcome::Response(response))
            }
            Err(err) => {
                debug!(%url, error = %err, "network-first fetch failed, trying cache");
                if let Some(cached) = self.storage.get(DYNAMIC_CACHE, url).await {
                    return Ok(FetchOutcome::Response(cached));
                }
                if let Some(cached) = self.storage.get(STATIC_CACHE, url).await {
                    return Ok(FetchOutcome::Response(cached));
                }
                self.root_fallback(url).await
            }
        }
    }

    /// The offline fallback: the cached root document, if install got it.
    async fn root_fallback(&self, requested: &Url) -> Result<FetchOutcome, OfflineCacheError> {
        let root = self
            .origin
            .join("/")
            .map_err(|_| OfflineCacheError::Unavailable(requested.clone()))?;
        match self.storage.get(STATIC_CACHE, &root).await {
            Some(cached) => Ok(FetchOutcome::Response(cached)),
            None => Err(OfflineCacheError::Unavailable(requested.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use bytes::Bytes;
    use dashmap::DashMap;

    use crate::fetcher::FetchError;
    use crate::storage::MemoryCacheStorage;

    use super::*;
    use async_trait::async_trait;

    /// Serves a fixed URL→response table; everything else fails as if the
    /// network were down. Counts every attempt.
    #[derive(Default)]
    struct StubFetcher {
        responses: DashMap<String, CachedResponse>,
        calls: AtomicUsize,
    }

    impl StubFetcher {
        fn serve(&self, url: &str, status: u16, body: &str) {
            self.responses.insert(
                url.to_string(),
                CachedResponse {
                    status,
                    content_type: Some("text/html".to_string()),
                    body: Bytes::copy_from_slice(body.as_bytes()),
                },
            );
        }

        fn go_offline(&self) {
            self.responses.clear();
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl NetworkFetcher for StubFetcher {
        async fn get(&self, url: &Url) -> Result<CachedResponse, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .get(url.as_str())
                .map(|entry| entry.clone())
                .ok_or_else(|| FetchError("connection refused".to_string()))
        }
    }

    const ORIGIN: &str = "http://localhost:3000";

    fn origin() -> Url {
        Url::parse(ORIGIN).expect("origin")
    }

    fn url(path: &str) -> Url {
        origin().join(path).expect("url")
    }

    fn online_shell() -> Arc<StubFetcher> {
        let fetcher = Arc::new(StubFetcher::default());
        for path in STATIC_ASSETS {
            fetcher.serve(url(path).as_str(), 200, &format!("asset:{path}"));
        }
        fetcher
    }

    async fn installed_worker(fetcher: Arc<StubFetcher>) -> OfflineWorker {
        let storage = Arc::new(MemoryCacheStorage::new());
        let mut worker = OfflineWorker::new(storage, fetcher, origin());
        worker.install().await;
        worker.activate().await;
        worker
    }

    fn body_of(outcome: FetchOutcome) -> String {
        match outcome {
            FetchOutcome::Response(response) => {
                String::from_utf8(response.body.to_vec()).expect("utf8 body")
            }
            FetchOutcome::PassThrough => panic!("expected a response, got pass-through"),
        }
    }

    #[tokio::test]
    async fn test_precached_assets_survive_going_offline() {
        let fetcher = online_shell();
        let worker = installed_worker(Arc::clone(&fetcher)).await;

        fetcher.go_offline();
        let outcome = worker
            .handle_fetch(&AssetRequest::get(url("/manifest.json")))
            .await
            .expect("served from cache");
        assert_eq!(body_of(outcome), "asset:/manifest.json");
    }

    #[tokio::test]
    async fn test_cache_first_fetches_a_miss_exactly_once() {
        let fetcher = online_shell();
        let worker = installed_worker(Arc::clone(&fetcher)).await;

        // Not in the manifest, but under /assets/ so still cache-first.
        let icon = url("/assets/extra/diwali-banner.png");
        fetcher.serve(icon.as_str(), 200, "banner");
        let baseline = fetcher.calls();

        for _ in 0..3 {
            let outcome = worker
                .handle_fetch(&AssetRequest::get(icon.clone()))
                .await
                .expect("served");
            assert_eq!(body_of(outcome), "banner");
        }
        // One network trip filled the cache; the rest were hits.
        assert_eq!(fetcher.calls() - baseline, 1);
    }

    #[tokio::test]
    async fn test_network_first_remembers_only_success() {
        let fetcher = online_shell();
        let worker = installed_worker(Arc::clone(&fetcher)).await;

        let page = url("/orders");
        fetcher.serve(page.as_str(), 500, "backend exploded");
        let outcome = worker
            .handle_fetch(&AssetRequest::get(page.clone()))
            .await
            .expect("error page returned");
        assert_eq!(body_of(outcome), "backend exploded");

        // Offline now: the 500 was never cached, so we degrade to the root.
        fetcher.go_offline();
        let outcome = worker
            .handle_fetch(&AssetRequest::get(page.clone()))
            .await
            .expect("root fallback");
        assert_eq!(body_of(outcome), "asset:/");

        // A later success is remembered and replayed offline.
        fetcher.serve(page.as_str(), 200, "orders page");
        worker
            .handle_fetch(&AssetRequest::get(page.clone()))
            .await
            .expect("online fetch");
        fetcher.go_offline();
        let outcome = worker
            .handle_fetch(&AssetRequest::get(page))
            .await
            .expect("dynamic cache hit");
        assert_eq!(body_of(outcome), "orders page");
    }

    #[tokio::test]
    async fn test_payment_and_identity_hosts_pass_through() {
        let fetcher = online_shell();
        let worker = installed_worker(Arc::clone(&fetcher)).await;
        let baseline = fetcher.calls();

        for external in [
            "https://checkout.stripe.com/pay/cs_test_51",
            "https://identity.ic0.app/authorize",
            "https://ryjl3-tyaaa.ic0.app/api/v2/status",
            "https://canister.icp0.io/call",
        ] {
            let request = AssetRequest::get(Url::parse(external).expect("url"));
            let outcome = worker.handle_fetch(&request).await.expect("decided");
            assert!(matches!(outcome, FetchOutcome::PassThrough), "{external}");
        }
        // Pass-through means the worker never touched the network.
        assert_eq!(fetcher.calls(), baseline);
    }

    #[tokio::test]
    async fn test_non_get_passes_through() {
        let fetcher = online_shell();
        let worker = installed_worker(fetcher).await;

        let request = AssetRequest {
            method: "POST".to_string(),
            url: url("/api/orders"),
        };
        let outcome = worker.handle_fetch(&request).await.expect("decided");
        assert!(matches!(outcome, FetchOutcome::PassThrough));
    }

    #[tokio::test]
    async fn test_install_swallows_asset_failures() {
        let fetcher = Arc::new(StubFetcher::default());
        // Only the root is reachable; every other shell asset 404s away.
        fetcher.serve(url("/").as_str(), 200, "shell");

        let worker = installed_worker(Arc::clone(&fetcher)).await;
        assert_eq!(worker.phase(), WorkerPhase::Active);

        fetcher.go_offline();
        let outcome = worker
            .handle_fetch(&AssetRequest::get(url("/")))
            .await
            .expect("root cached");
        assert_eq!(body_of(outcome), "shell");

        // The missing asset degrades to the root fallback instead of erroring.
        let outcome = worker
            .handle_fetch(&AssetRequest::get(url("/manifest.json")))
            .await
            .expect("fallback");
        assert_eq!(body_of(outcome), "shell");
    }

    #[tokio::test]
    async fn test_offline_with_empty_cache_is_unavailable() {
        let fetcher = Arc::new(StubFetcher::default());
        let worker = installed_worker(fetcher).await;

        let err = worker
            .handle_fetch(&AssetRequest::get(url("/orders")))
            .await
            .expect_err("nothing cached");
        assert!(matches!(err, OfflineCacheError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_activate_evicts_old_partitions() {
        let storage = Arc::new(MemoryCacheStorage::new());
        let old = url("/");
        storage
            .put(
                "tiffin-static-v0",
                &old,
                CachedResponse {
                    status: 200,
                    content_type: None,
                    body: Bytes::from_static(b"old shell"),
                },
            )
            .await;

        let fetcher = online_shell();
        let mut worker = OfflineWorker::new(Arc::clone(&storage) as Arc<dyn CacheStorage>, fetcher, origin());
        worker.install().await;
        worker.activate().await;

        let mut partitions = storage.partitions().await;
        partitions.sort();
        assert_eq!(partitions, vec![STATIC_CACHE.to_string()]);
    }

    #[tokio::test]
    async fn test_skip_waiting_promotes_only_from_waiting() {
        let storage = Arc::new(MemoryCacheStorage::new());
        let mut worker = OfflineWorker::new(storage, online_shell(), origin());

        // Still installing: the message is ignored.
        worker.handle_message(ClientMessage::SkipWaiting);
        assert_eq!(worker.phase(), WorkerPhase::Installing);

        worker.install().await;
        assert_eq!(worker.phase(), WorkerPhase::Waiting);
        worker.handle_message(ClientMessage::SkipWaiting);
        assert_eq!(worker.phase(), WorkerPhase::Active);
    }
}
