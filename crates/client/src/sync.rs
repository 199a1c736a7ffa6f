//! The synchronization store: fresh cache, stale fallback, invalidation.
//!
//! The store is explicit state, created at the composition root and handed
//! to [`crate::queries::Queries`] and [`crate::mutations::Mutations`] — no
//! ambient globals, and `clear()` gives logout a defined teardown.
//!
//! Two tiers:
//!
//! - **fresh** — a `moka` cache. Concurrent fetches for the same key
//!   coalesce through `try_get_with`, so identical requests share one
//!   network call. Invalidation drops entries here, by key class.
//! - **last known** — every successful fetch is mirrored into a `DashMap`
//!   that invalidation never touches. This is what stale-while-revalidate
//!   serves, and what stays visible when a refetch fails.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use moka::future::Cache;
use thiserror::Error;
use tokio::sync::broadcast;

use tiffin_core::{MenuItem, Notification, Order, OrderStatus, UserRole};

use crate::keys::{CacheKey, KeyClass};
use crate::remote::RemoteError;

/// Fresh-tier capacity; far above the number of distinct resources one
/// client session touches.
const FRESH_CAPACITY: u64 = 1024;

/// Fresh-tier TTL. Resources with a polling interval are refreshed by their
/// subscriptions well before this; it only bounds staleness of static
/// resources across very long sessions.
const FRESH_TTL: Duration = Duration::from_secs(300);

/// Cached value shapes, one per resource family.
#[derive(Debug, Clone)]
pub enum CacheValue {
    MenuItems(Vec<MenuItem>),
    Orders(Vec<Order>),
    Order(Option<Box<Order>>),
    OrderStatus(Option<OrderStatus>),
    Notifications(Vec<Notification>),
    Count(u64),
    Flag(bool),
    Text(String),
    Role(UserRole),
}

impl CacheValue {
    /// Shape name for diagnostics.
    #[must_use]
    pub const fn shape(&self) -> &'static str {
        match self {
            Self::MenuItems(_) => "menu_items",
            Self::Orders(_) => "orders",
            Self::Order(_) => "order",
            Self::OrderStatus(_) => "order_status",
            Self::Notifications(_) => "notifications",
            Self::Count(_) => "count",
            Self::Flag(_) => "flag",
            Self::Text(_) => "text",
            Self::Role(_) => "role",
        }
    }
}

/// Errors surfaced by the read path.
#[derive(Debug, Clone, Error)]
pub enum SyncError {
    /// The backend call behind the fetch failed.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// A cached value did not have the shape its key implies.
    ///
    /// Keys and shapes are paired by construction in
    /// [`crate::queries::Queries`], so this indicates a bug there rather
    /// than anything a caller can recover from.
    #[error("cached value for {key:?} has unexpected shape {shape}")]
    Shape { key: CacheKey, shape: &'static str },
}

impl SyncError {
    /// Whether the underlying failure was a permission error.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Remote(e) if e.is_unauthorized())
    }
}

/// The process-wide (per composition root) synchronization store.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct SyncStore {
    inner: Arc<SyncStoreInner>,
}

struct SyncStoreInner {
    fresh: Cache<CacheKey, CacheValue>,
    last_known: DashMap<CacheKey, CacheValue>,
    invalidations: broadcast::Sender<KeyClass>,
}

impl Default for SyncStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        let fresh = Cache::builder()
            .max_capacity(FRESH_CAPACITY)
            .time_to_live(FRESH_TTL)
            .support_invalidation_closures()
            .build();
        let (invalidations, _) = broadcast::channel(64);

        Self {
            inner: Arc::new(SyncStoreInner {
                fresh,
                last_known: DashMap::new(),
                invalidations,
            }),
        }
    }

    /// Fetch a resource, serving the fresh tier when possible.
    ///
    /// Concurrent callers with the same key share one execution of
    /// `loader`. A successful load is mirrored into the last-known tier.
    ///
    /// # Errors
    ///
    /// Returns the loader's error; the last-known value for the key is left
    /// untouched and stays readable through [`Self::stale`].
    pub async fn fetch<Fut>(&self, key: CacheKey, loader: Fut) -> Result<CacheValue, SyncError>
    where
        Fut: Future<Output = Result<CacheValue, RemoteError>>,
    {
        let result = self.inner.fresh.try_get_with(key.clone(), loader).await;

        match result {
            Ok(value) => {
                self.inner.last_known.insert(key, value.clone());
                Ok(value)
            }
            Err(err) => Err(SyncError::Remote((*err).clone())),
        }
    }

    /// Fetch a resource, forcing a network load (poll-tick path).
    ///
    /// # Errors
    ///
    /// Same contract as [`Self::fetch`].
    pub async fn refresh<Fut>(&self, key: CacheKey, loader: Fut) -> Result<CacheValue, SyncError>
    where
        Fut: Future<Output = Result<CacheValue, RemoteError>>,
    {
        self.inner.fresh.invalidate(&key).await;
        self.fetch(key, loader).await
    }

    /// Last successfully fetched value for a key, however stale.
    #[must_use]
    pub fn stale(&self, key: &CacheKey) -> Option<CacheValue> {
        self.inner.last_known.get(key).map(|entry| entry.clone())
    }

    /// Invalidate every fresh entry of a class and notify subscribers.
    ///
    /// Returns once the entries are guaranteed not to be served again; the
    /// last-known tier is deliberately left intact so stale reads keep
    /// working until the refetch lands.
    pub fn invalidate(&self, class: KeyClass) {
        if let Err(e) = self
            .inner
            .fresh
            .invalidate_entries_if(move |key, _| key.class() == class)
        {
            tracing::warn!(?class, error = %e, "cache invalidation predicate rejected");
        }
        // No subscribers is fine; send only fails then.
        let _ = self.inner.invalidations.send(class);
        tracing::debug!(?class, "cache class invalidated");
    }

    /// Subscribe to invalidation events (used by polling subscriptions).
    #[must_use]
    pub fn subscribe_invalidations(&self) -> broadcast::Receiver<KeyClass> {
        self.inner.invalidations.subscribe()
    }

    /// Drop everything, fresh and stale. Called on logout.
    pub fn clear(&self) {
        self.inner.fresh.invalidate_all();
        self.inner.last_known.clear();
        tracing::debug!("sync store cleared");
    }
}
