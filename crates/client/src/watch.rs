//! Polling subscriptions for server-driven resources.
//!
//! A [`Subscription`] is a background task that refetches its resource on a
//! fixed interval (from [`crate::keys::KeyClass::polling_interval`]) and
//! whenever the store broadcasts an invalidation of the resource's class.
//! Results are published on a `tokio::sync::watch` channel; dropping the
//! subscription aborts the task, so nothing polls without a consumer.

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::debug;

use crate::keys::CacheKey;
use crate::sync::{SyncError, SyncStore};

/// Best-known state of a watched resource.
///
/// A failed poll keeps the previous `data` and records the error; data is
/// only ever replaced by a successful fetch.
#[derive(Debug, Clone)]
pub struct QueryState<T> {
    /// Latest successfully fetched value, possibly stale.
    pub data: Option<T>,
    /// True until the first fetch settles.
    pub is_loading: bool,
    /// True while a refetch is in flight after the first settle.
    pub is_revalidating: bool,
    /// Message of the most recent failed fetch, cleared on success.
    pub error: Option<String>,
}

impl<T> QueryState<T> {
    const fn loading() -> Self {
        Self {
            data: None,
            is_loading: true,
            is_revalidating: false,
            error: None,
        }
    }
}

/// A live, polling view of one resource.
pub struct Subscription<T> {
    rx: watch::Receiver<QueryState<T>>,
    task: JoinHandle<()>,
}

impl<T: Clone> Subscription<T> {
    /// Current state snapshot.
    #[must_use]
    pub fn state(&self) -> QueryState<T> {
        self.rx.borrow().clone()
    }

    /// Wait until the state changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the publishing task has stopped.
    pub async fn changed(&mut self) -> Result<(), watch::error::RecvError> {
        self.rx.changed().await
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawn the polling task behind a subscription.
///
/// `fetch` must force a network load (the store's refresh path); cache hits
/// would make the poll a no-op.
pub(crate) fn spawn_watch<T, F, Fut>(store: &SyncStore, key: CacheKey, fetch: F) -> Subscription<T>
where
    T: Clone + Send + Sync + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, SyncError>> + Send,
{
    let (tx, rx) = watch::channel(QueryState::loading());
    let mut invalidations = store.subscribe_invalidations();
    let class = key.class();

    let task = tokio::spawn(async move {
        run_fetch(&tx, &fetch).await;

        let mut ticker = class.polling_interval().map(|period| {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker
        });

        loop {
            tokio::select! {
                () = tick(&mut ticker) => {
                    debug!(?class, "poll tick");
                    run_fetch(&tx, &fetch).await;
                }
                event = invalidations.recv() => match event {
                    Ok(invalidated) if invalidated == class => {
                        debug!(?class, "refetch on invalidation");
                        run_fetch(&tx, &fetch).await;
                    }
                    Ok(_) => {}
                    // Missed events may have included ours; refetch.
                    Err(broadcast::error::RecvError::Lagged(_)) => run_fetch(&tx, &fetch).await,
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }

            if tx.is_closed() {
                break;
            }
        }
    });

    Subscription { rx, task }
}

/// Tick the poll timer, or park forever for non-polled resources.
async fn tick(ticker: &mut Option<tokio::time::Interval>) {
    match ticker.as_mut() {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn run_fetch<T, F, Fut>(tx: &watch::Sender<QueryState<T>>, fetch: &F)
where
    T: Clone,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, SyncError>>,
{
    tx.send_modify(|state| state.is_revalidating = true);

    match fetch().await {
        Ok(value) => tx.send_modify(|state| {
            state.data = Some(value);
            state.is_loading = false;
            state.is_revalidating = false;
            state.error = None;
        }),
        Err(err) => tx.send_modify(|state| {
            state.is_loading = false;
            state.is_revalidating = false;
            state.error = Some(err.to_string());
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::keys::KeyClass;

    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    /// The fetch closure crosses into a spawned task and is shared with it
    /// by reference, so `spawn_watch` must accept any `Send + Sync` closure.
    #[tokio::test(start_paused = true)]
    async fn test_subscription_publishes_fetches_from_the_spawned_task() {
        let store = SyncStore::new();
        let fetches = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&fetches);
        let subscription = spawn_watch(&store, CacheKey::StripeConfigured, move || {
            let counter = Arc::clone(&counter);
            async move { Ok(counter.fetch_add(1, Ordering::SeqCst) + 1) }
        });

        settle().await;
        let state = subscription.state();
        assert_eq!(state.data, Some(1));
        assert!(!state.is_loading);
        assert!(state.error.is_none());

        // Non-polled class: only an invalidation can trigger a refetch.
        store.invalidate(KeyClass::StripeConfigured);
        settle().await;
        assert_eq!(subscription.state().data, Some(2));
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }
}
