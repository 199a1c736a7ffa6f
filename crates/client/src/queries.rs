//! Typed reads over the backend, routed through the sync store.
//!
//! Each method binds one backend read to its canonical cache key; callers
//! get typed values back and never see [`CacheValue`] directly. User-scoped
//! reads take the identity explicitly — when no identity exists yet, the
//! caller simply has nothing to pass and no call is made.
//!
//! `watch_*` methods return polling [`Subscription`]s for the resources
//! that change server-side (order tracking, unread badge, admin order
//! views).

use std::sync::Arc;

use tracing::instrument;

use tiffin_core::{
    MenuCategory, MenuItem, Notification, Order, OrderId, OrderStatus, UserId, UserRole,
};

use crate::keys::CacheKey;
use crate::remote::RemoteService;
use crate::sync::{CacheValue, SyncError, SyncStore};
use crate::watch::{Subscription, spawn_watch};

/// The read side of the synchronization layer.
#[derive(Clone)]
pub struct Queries {
    remote: Arc<dyn RemoteService>,
    store: SyncStore,
}

impl Queries {
    /// Bind a backend to a sync store.
    #[must_use]
    pub fn new(remote: Arc<dyn RemoteService>, store: SyncStore) -> Self {
        Self { remote, store }
    }

    /// The underlying store (for stale reads and teardown).
    #[must_use]
    pub const fn store(&self) -> &SyncStore {
        &self.store
    }

    // =========================================================================
    // Menu
    // =========================================================================

    /// All menu items.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails and no coalesced fetch
    /// succeeded; previously cached data stays readable via the store.
    #[instrument(skip(self))]
    pub async fn menu_items(&self) -> Result<Vec<MenuItem>, SyncError> {
        let remote = Arc::clone(&self.remote);
        let key = CacheKey::MenuItems;
        let value = self
            .store
            .fetch(key.clone(), async move {
                Ok(CacheValue::MenuItems(remote.menu_items().await?))
            })
            .await?;
        match value {
            CacheValue::MenuItems(items) => Ok(items),
            other => Err(shape_error(key, &other)),
        }
    }

    /// Menu items in one category.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self))]
    pub async fn menu_items_by_category(
        &self,
        category: MenuCategory,
    ) -> Result<Vec<MenuItem>, SyncError> {
        let remote = Arc::clone(&self.remote);
        let key = CacheKey::MenuItemsByCategory(category);
        let value = self
            .store
            .fetch(key.clone(), async move {
                Ok(CacheValue::MenuItems(
                    remote.menu_items_by_category(category).await?,
                ))
            })
            .await?;
        match value {
            CacheValue::MenuItems(items) => Ok(items),
            other => Err(shape_error(key, &other)),
        }
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// A single order, if it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self))]
    pub async fn order(&self, id: OrderId) -> Result<Option<Order>, SyncError> {
        self.order_impl(id, false).await
    }

    async fn order_impl(&self, id: OrderId, force: bool) -> Result<Option<Order>, SyncError> {
        let remote = Arc::clone(&self.remote);
        let key = CacheKey::Order(id);
        let loader = async move { Ok(CacheValue::Order(remote.order(id).await?.map(Box::new))) };
        let value = if force {
            self.store.refresh(key.clone(), loader).await?
        } else {
            self.store.fetch(key.clone(), loader).await?
        };
        match value {
            CacheValue::Order(order) => Ok(order.map(|boxed| *boxed)),
            other => Err(shape_error(key, &other)),
        }
    }

    /// Just the status of an order (cheaper than the whole order).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self))]
    pub async fn order_status(&self, id: OrderId) -> Result<Option<OrderStatus>, SyncError> {
        self.order_status_impl(id, false).await
    }

    async fn order_status_impl(
        &self,
        id: OrderId,
        force: bool,
    ) -> Result<Option<OrderStatus>, SyncError> {
        let remote = Arc::clone(&self.remote);
        let key = CacheKey::OrderStatus(id);
        let loader = async move { Ok(CacheValue::OrderStatus(remote.order_status(id).await?)) };
        let value = if force {
            self.store.refresh(key.clone(), loader).await?
        } else {
            self.store.fetch(key.clone(), loader).await?
        };
        match value {
            CacheValue::OrderStatus(status) => Ok(status),
            other => Err(shape_error(key, &other)),
        }
    }

    /// Every order in the system (admin view).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self))]
    pub async fn all_orders(&self) -> Result<Vec<Order>, SyncError> {
        self.all_orders_impl(false).await
    }

    async fn all_orders_impl(&self, force: bool) -> Result<Vec<Order>, SyncError> {
        let remote = Arc::clone(&self.remote);
        let key = CacheKey::AllOrders;
        let loader = async move { Ok(CacheValue::Orders(remote.all_orders().await?)) };
        let value = if force {
            self.store.refresh(key.clone(), loader).await?
        } else {
            self.store.fetch(key.clone(), loader).await?
        };
        match value {
            CacheValue::Orders(orders) => Ok(orders),
            other => Err(shape_error(key, &other)),
        }
    }

    /// Orders currently in one pipeline stage (admin filter).
    ///
    /// Served uncached: the filtered views share their data with
    /// [`Self::all_orders`] and caching each filter separately would let
    /// them disagree between polls.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self))]
    pub async fn orders_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, SyncError> {
        Ok(self.remote.orders_by_status(status).await?)
    }

    /// All orders placed by one user.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self, user))]
    pub async fn user_orders(&self, user: &UserId) -> Result<Vec<Order>, SyncError> {
        let remote = Arc::clone(&self.remote);
        let owner = user.clone();
        let key = CacheKey::UserOrders(user.clone());
        let value = self
            .store
            .fetch(key.clone(), async move {
                Ok(CacheValue::Orders(remote.user_orders(&owner).await?))
            })
            .await?;
        match value {
            CacheValue::Orders(orders) => Ok(orders),
            other => Err(shape_error(key, &other)),
        }
    }

    /// A user's not-yet-delivered orders.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self, user))]
    pub async fn user_active_orders(&self, user: &UserId) -> Result<Vec<Order>, SyncError> {
        self.user_active_orders_impl(user.clone(), false).await
    }

    async fn user_active_orders_impl(
        &self,
        user: UserId,
        force: bool,
    ) -> Result<Vec<Order>, SyncError> {
        let remote = Arc::clone(&self.remote);
        let owner = user.clone();
        let key = CacheKey::UserActiveOrders(user);
        let loader = async move { Ok(CacheValue::Orders(remote.user_active_orders(&owner).await?)) };
        let value = if force {
            self.store.refresh(key.clone(), loader).await?
        } else {
            self.store.fetch(key.clone(), loader).await?
        };
        match value {
            CacheValue::Orders(orders) => Ok(orders),
            other => Err(shape_error(key, &other)),
        }
    }

    /// A user's delivered orders.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self, user))]
    pub async fn user_order_history(&self, user: &UserId) -> Result<Vec<Order>, SyncError> {
        let remote = Arc::clone(&self.remote);
        let owner = user.clone();
        let key = CacheKey::UserOrderHistory(user.clone());
        let value = self
            .store
            .fetch(key.clone(), async move {
                Ok(CacheValue::Orders(remote.user_order_history(&owner).await?))
            })
            .await?;
        match value {
            CacheValue::Orders(orders) => Ok(orders),
            other => Err(shape_error(key, &other)),
        }
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    /// A user's notifications.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self, user))]
    pub async fn user_notifications(&self, user: &UserId) -> Result<Vec<Notification>, SyncError> {
        let remote = Arc::clone(&self.remote);
        let owner = user.clone();
        let key = CacheKey::UserNotifications(user.clone());
        let value = self
            .store
            .fetch(key.clone(), async move {
                Ok(CacheValue::Notifications(
                    remote.user_notifications(&owner).await?,
                ))
            })
            .await?;
        match value {
            CacheValue::Notifications(notifications) => Ok(notifications),
            other => Err(shape_error(key, &other)),
        }
    }

    /// Broadcast notifications, visible to everyone.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self))]
    pub async fn broadcast_notifications(&self) -> Result<Vec<Notification>, SyncError> {
        let remote = Arc::clone(&self.remote);
        let key = CacheKey::BroadcastNotifications;
        let value = self
            .store
            .fetch(key.clone(), async move {
                Ok(CacheValue::Notifications(
                    remote.broadcast_notifications().await?,
                ))
            })
            .await?;
        match value {
            CacheValue::Notifications(notifications) => Ok(notifications),
            other => Err(shape_error(key, &other)),
        }
    }

    /// Number of unread notifications for a user (badge count).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self, user))]
    pub async fn unread_count(&self, user: &UserId) -> Result<u64, SyncError> {
        self.unread_count_impl(user.clone(), false).await
    }

    async fn unread_count_impl(&self, user: UserId, force: bool) -> Result<u64, SyncError> {
        let remote = Arc::clone(&self.remote);
        let owner = user.clone();
        let key = CacheKey::UnreadCount(user);
        let loader = async move { Ok(CacheValue::Count(remote.unread_count(&owner).await?)) };
        let value = if force {
            self.store.refresh(key.clone(), loader).await?
        } else {
            self.store.fetch(key.clone(), loader).await?
        };
        match value {
            CacheValue::Count(count) => Ok(count),
            other => Err(shape_error(key, &other)),
        }
    }

    // =========================================================================
    // Restaurant info, payments, identity
    // =========================================================================

    /// Whether checkout is available (payment processor configured).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self))]
    pub async fn is_stripe_configured(&self) -> Result<bool, SyncError> {
        let remote = Arc::clone(&self.remote);
        let key = CacheKey::StripeConfigured;
        let value = self
            .store
            .fetch(key.clone(), async move {
                Ok(CacheValue::Flag(remote.is_stripe_configured().await?))
            })
            .await?;
        match value {
            CacheValue::Flag(flag) => Ok(flag),
            other => Err(shape_error(key, &other)),
        }
    }

    /// Restaurant street address.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self))]
    pub async fn restaurant_location(&self) -> Result<String, SyncError> {
        let remote = Arc::clone(&self.remote);
        let key = CacheKey::RestaurantLocation;
        let value = self
            .store
            .fetch(key.clone(), async move {
                Ok(CacheValue::Text(remote.restaurant_location().await?))
            })
            .await?;
        match value {
            CacheValue::Text(text) => Ok(text),
            other => Err(shape_error(key, &other)),
        }
    }

    /// Maps link for the restaurant.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self))]
    pub async fn restaurant_maps_url(&self) -> Result<String, SyncError> {
        let remote = Arc::clone(&self.remote);
        let key = CacheKey::RestaurantMapsUrl;
        let value = self
            .store
            .fetch(key.clone(), async move {
                Ok(CacheValue::Text(remote.restaurant_maps_url().await?))
            })
            .await?;
        match value {
            CacheValue::Text(text) => Ok(text),
            other => Err(shape_error(key, &other)),
        }
    }

    /// The caller's role as the backend sees it.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self))]
    pub async fn caller_role(&self) -> Result<UserRole, SyncError> {
        let remote = Arc::clone(&self.remote);
        let key = CacheKey::CallerRole;
        let value = self
            .store
            .fetch(key.clone(), async move {
                Ok(CacheValue::Role(remote.caller_role().await?))
            })
            .await?;
        match value {
            CacheValue::Role(role) => Ok(role),
            other => Err(shape_error(key, &other)),
        }
    }

    /// Convenience wrapper over [`Self::caller_role`].
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    pub async fn is_caller_admin(&self) -> Result<bool, SyncError> {
        Ok(self.caller_role().await?.is_admin())
    }

    // =========================================================================
    // Polling subscriptions
    // =========================================================================

    /// Watch one order (order-tracking page); polls every 5 seconds.
    #[must_use]
    pub fn watch_order(&self, id: OrderId) -> Subscription<Option<Order>> {
        let queries = self.clone();
        spawn_watch(&self.store, CacheKey::Order(id), move || {
            let queries = queries.clone();
            async move { queries.order_impl(id, true).await }
        })
    }

    /// Watch one order's status; polls every 5 seconds.
    #[must_use]
    pub fn watch_order_status(&self, id: OrderId) -> Subscription<Option<OrderStatus>> {
        let queries = self.clone();
        spawn_watch(&self.store, CacheKey::OrderStatus(id), move || {
            let queries = queries.clone();
            async move { queries.order_status_impl(id, true).await }
        })
    }

    /// Watch the unread badge count; polls every 10 seconds.
    #[must_use]
    pub fn watch_unread_count(&self, user: &UserId) -> Subscription<u64> {
        let queries = self.clone();
        let owner = user.clone();
        spawn_watch(&self.store, CacheKey::UnreadCount(user.clone()), move || {
            let queries = queries.clone();
            let owner = owner.clone();
            async move { queries.unread_count_impl(owner, true).await }
        })
    }

    /// Watch all orders (admin view); polls every 10 seconds.
    #[must_use]
    pub fn watch_all_orders(&self) -> Subscription<Vec<Order>> {
        let queries = self.clone();
        spawn_watch(&self.store, CacheKey::AllOrders, move || {
            let queries = queries.clone();
            async move { queries.all_orders_impl(true).await }
        })
    }

    /// Watch a user's active orders; polls every 10 seconds.
    #[must_use]
    pub fn watch_user_active_orders(&self, user: &UserId) -> Subscription<Vec<Order>> {
        let queries = self.clone();
        let owner = user.clone();
        spawn_watch(
            &self.store,
            CacheKey::UserActiveOrders(user.clone()),
            move || {
                let queries = queries.clone();
                let owner = owner.clone();
                async move { queries.user_active_orders_impl(owner, true).await }
            },
        )
    }
}

fn shape_error(key: CacheKey, value: &CacheValue) -> SyncError {
    SyncError::Shape {
        key,
        shape: value.shape(),
    }
}
