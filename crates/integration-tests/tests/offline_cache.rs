//! Offline asset cache, end to end through the worker handle.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use url::Url;

use tiffin_offline::fetcher::{FetchError, NetworkFetcher};
use tiffin_offline::storage::{CachedResponse, MemoryCacheStorage};
use tiffin_offline::worker::{AssetRequest, ClientMessage, FetchOutcome, STATIC_ASSETS};
use tiffin_offline::OfflineCacheHandle;

/// Fixed URL→body table; unknown URLs fail like a dead network.
#[derive(Default)]
struct FakeNetwork {
    responses: DashMap<String, (u16, &'static str)>,
    calls: AtomicUsize,
}

impl FakeNetwork {
    fn serve(&self, url: &Url, status: u16, body: &'static str) {
        self.responses.insert(url.as_str().to_string(), (status, body));
    }

    fn drop_everything(&self) {
        self.responses.clear();
    }
}

#[async_trait]
impl NetworkFetcher for FakeNetwork {
    async fn get(&self, url: &Url) -> Result<CachedResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (status, body) = *self
            .responses
            .get(url.as_str())
            .ok_or_else(|| FetchError("connection refused".to_string()))?;
        Ok(CachedResponse {
            status,
            content_type: Some("text/html".to_string()),
            body: Bytes::from_static(body.as_bytes()),
        })
    }
}

fn origin() -> Url {
    Url::parse("http://localhost:3000").expect("origin")
}

fn shell_network() -> Arc<FakeNetwork> {
    let network = Arc::new(FakeNetwork::default());
    for path in STATIC_ASSETS {
        network.serve(&origin().join(path).expect("url"), 200, "shell asset");
    }
    network
}

async fn fetch_body(handle: &OfflineCacheHandle, url: Url) -> String {
    match handle.fetch(AssetRequest::get(url)).await.expect("fetch") {
        FetchOutcome::Response(response) => {
            String::from_utf8(response.body.to_vec()).expect("utf8")
        }
        FetchOutcome::PassThrough => panic!("expected a response"),
    }
}

#[tokio::test]
async fn test_shell_survives_the_network_going_away() {
    let network = shell_network();
    let handle = OfflineCacheHandle::spawn(
        Arc::new(MemoryCacheStorage::new()),
        Arc::clone(&network) as Arc<dyn NetworkFetcher>,
        origin(),
    );

    // Warm path: served from the install-time cache.
    let body = fetch_body(&handle, origin().join("/index.html").expect("url")).await;
    assert_eq!(body, "shell asset");

    network.drop_everything();
    let body = fetch_body(&handle, origin().join("/manifest.json").expect("url")).await;
    assert_eq!(body, "shell asset");
}

#[tokio::test]
async fn test_visited_pages_replay_offline_and_errors_do_not() {
    let network = shell_network();
    let handle = OfflineCacheHandle::spawn(
        Arc::new(MemoryCacheStorage::new()),
        Arc::clone(&network) as Arc<dyn NetworkFetcher>,
        origin(),
    );

    let menu_page = origin().join("/menu").expect("url");
    let broken_page = origin().join("/orders").expect("url");
    network.serve(&menu_page, 200, "menu page");
    network.serve(&broken_page, 503, "maintenance");

    assert_eq!(fetch_body(&handle, menu_page.clone()).await, "menu page");
    assert_eq!(fetch_body(&handle, broken_page.clone()).await, "maintenance");

    network.drop_everything();
    // The 200 replays; the 503 was never stored and degrades to the shell.
    assert_eq!(fetch_body(&handle, menu_page).await, "menu page");
    assert_eq!(fetch_body(&handle, broken_page).await, "shell asset");
}

#[tokio::test]
async fn test_payment_traffic_is_never_intercepted() {
    let network = shell_network();
    let handle = OfflineCacheHandle::spawn(
        Arc::new(MemoryCacheStorage::new()),
        Arc::clone(&network) as Arc<dyn NetworkFetcher>,
        origin(),
    );
    // A first fetch round-trips the worker's command channel, so install
    // (and its pre-cache requests) has finished before the baseline is read.
    fetch_body(&handle, origin().join("/index.html").expect("url")).await;
    let install_calls = network.calls.load(Ordering::SeqCst);

    let checkout = Url::parse("https://checkout.stripe.com/pay/cs_live_1").expect("url");
    let outcome = handle
        .fetch(AssetRequest::get(checkout))
        .await
        .expect("decision");
    assert!(matches!(outcome, FetchOutcome::PassThrough));
    // Pass-through means the worker made no request of its own.
    assert_eq!(network.calls.load(Ordering::SeqCst), install_calls);

    handle.message(ClientMessage::SkipWaiting).await;
}
