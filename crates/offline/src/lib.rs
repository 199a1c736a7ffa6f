//! Offline asset cache for the Tiffin web frontend.
//!
//! Models the frontend's service worker as an isolated actor: a
//! [`worker::OfflineWorker`] owns two named cache partitions (static and
//! dynamic) and answers fetch requests with a cache-first strategy for
//! shell assets and a network-first strategy for everything else. Payment
//! and identity-provider traffic is never intercepted.
//!
//! - [`storage`] - The [`storage::CacheStorage`] partition store and its
//!   in-memory implementation.
//! - [`fetcher`] - The [`fetcher::NetworkFetcher`] seam over HTTP.
//! - [`worker`] - Lifecycle (install, activate) and the fetch strategies.
//! - [`handle`] - The message-channel handle consumers talk through.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod fetcher;
pub mod handle;
pub mod storage;
pub mod worker;

pub use handle::OfflineCacheHandle;
pub use worker::{AssetRequest, FetchOutcome, OfflineCacheError};
