//! Tiffin client library - typed backend access and data synchronization.
//!
//! # Architecture
//!
//! - [`remote`] - The [`remote::RemoteService`] trait (the full backend
//!   surface) and its HTTP implementation. Errors carry a typed kind, so
//!   callers dispatch on `Unauthorized`/`NotFound` instead of matching on
//!   message text.
//! - [`keys`] - Canonical cache keys; both reads and invalidation go
//!   through the same registry.
//! - [`sync`] - The [`sync::SyncStore`]: a fresh tier (`moka`, coalescing
//!   concurrent fetches per key) over a stale last-known tier that survives
//!   invalidation and failed fetches.
//! - [`queries`] - Typed reads bound to cache keys, plus polling
//!   subscriptions for resources that change server-side.
//! - [`mutations`] - Typed writes; each invalidates exactly the key
//!   classes its mutation could have changed, before returning success.
//! - [`bulk`] - The bulk menu text parser feeding category replacement.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tiffin_client::{TiffinClient, remote::HttpRemoteService};
//!
//! let remote = Arc::new(HttpRemoteService::new(&config));
//! let client = TiffinClient::new(remote);
//!
//! let menu = client.queries().menu_items().await?;
//! let order_id = client.mutations().create_order(new_order).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod bulk;
mod client;
pub mod config;
pub mod keys;
pub mod mutations;
pub mod queries;
pub mod remote;
pub mod sync;
pub mod watch;

pub use client::TiffinClient;
