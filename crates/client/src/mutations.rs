//! Writes against the backend, paired with their cache invalidations.
//!
//! Every mutation lives here so its invalidation set lives next to it.
//! On success the affected [`KeyClass`]es are invalidated *before* the
//! method returns, so any read issued afterwards sees post-mutation data.
//! On failure nothing is invalidated and the typed [`RemoteError`] comes
//! back untouched; retrying is the caller's decision.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument};

use tiffin_core::{
    CheckoutSession, MenuCategory, MenuItemId, NewMenuItem, NewOrder, NotificationId, OrderId,
    OrderStatus, ShoppingItem, StripeConfiguration, StripeSessionStatus,
};

use crate::keys::KeyClass;
use crate::remote::{RemoteError, RemoteService};
use crate::sync::SyncStore;

/// Errors surfaced by the write path.
#[derive(Debug, Error)]
pub enum MutationError {
    /// The backend rejected or failed the write.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// The input failed client-side validation; nothing was sent.
    #[error("invalid input: {0}")]
    Validation(String),

    /// The backend accepted the call but replied with something unusable.
    #[error("malformed backend response: {0}")]
    MalformedResponse(String),
}

/// The write side of the synchronization layer.
#[derive(Clone)]
pub struct Mutations {
    remote: Arc<dyn RemoteService>,
    store: SyncStore,
}

impl Mutations {
    /// Bind a backend to a sync store.
    #[must_use]
    pub fn new(remote: Arc<dyn RemoteService>, store: SyncStore) -> Self {
        Self { remote, store }
    }

    fn invalidate(&self, classes: &[KeyClass]) {
        for &class in classes {
            self.store.invalidate(class);
        }
    }

    // =========================================================================
    // Menu (admin)
    // =========================================================================

    /// Create a menu item.
    ///
    /// # Errors
    ///
    /// Returns the backend's error; admin-only on the server side.
    #[instrument(skip(self, item), fields(name = %item.name))]
    pub async fn add_menu_item(&self, item: NewMenuItem) -> Result<MenuItemId, MutationError> {
        let id = self.remote.add_menu_item(item).await?;
        self.invalidate(&[KeyClass::MenuItems, KeyClass::MenuItemsByCategory]);
        info!(%id, "menu item created");
        Ok(id)
    }

    /// Update a menu item in place.
    ///
    /// # Errors
    ///
    /// Returns the backend's error.
    #[instrument(skip(self, item))]
    pub async fn update_menu_item(
        &self,
        id: MenuItemId,
        item: NewMenuItem,
    ) -> Result<(), MutationError> {
        self.remote.update_menu_item(id, item).await?;
        self.invalidate(&[KeyClass::MenuItems, KeyClass::MenuItemsByCategory]);
        Ok(())
    }

    /// Show or hide a menu item without editing it.
    ///
    /// # Errors
    ///
    /// Returns the backend's error.
    #[instrument(skip(self))]
    pub async fn set_menu_item_active(
        &self,
        id: MenuItemId,
        is_active: bool,
    ) -> Result<(), MutationError> {
        self.remote.set_menu_item_active(id, is_active).await?;
        self.invalidate(&[KeyClass::MenuItems, KeyClass::MenuItemsByCategory]);
        Ok(())
    }

    /// Replace a whole category's items (bulk-import path).
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an empty item list, otherwise the backend's
    /// error.
    #[instrument(skip(self, items), fields(count = items.len()))]
    pub async fn replace_category_menu_items(
        &self,
        category: MenuCategory,
        items: Vec<NewMenuItem>,
    ) -> Result<(), MutationError> {
        if items.is_empty() {
            return Err(MutationError::Validation(
                "bulk replace needs at least one item".to_string(),
            ));
        }
        self.remote
            .replace_category_menu_items(category, items)
            .await?;
        self.invalidate(&[KeyClass::MenuItems, KeyClass::MenuItemsByCategory]);
        info!(%category, "category menu replaced");
        Ok(())
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Place an order.
    ///
    /// The backend also creates the order-placed notification, which is why
    /// notification classes are invalidated here.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an empty order, otherwise the backend's
    /// error.
    #[instrument(skip(self, order), fields(items = order.items.len()))]
    pub async fn create_order(&self, order: NewOrder) -> Result<OrderId, MutationError> {
        if order.items.is_empty() {
            return Err(MutationError::Validation(
                "order has no items".to_string(),
            ));
        }
        let id = self.remote.create_order(order).await?;
        self.invalidate(&[
            KeyClass::UserOrders,
            KeyClass::UserActiveOrders,
            KeyClass::UserOrderHistory,
            KeyClass::AllOrders,
            KeyClass::UserNotifications,
            KeyClass::UnreadCount,
        ]);
        info!(%id, "order placed");
        Ok(id)
    }

    /// Move an order through the fulfilment pipeline (admin).
    ///
    /// The backend notifies the order's owner, so the owner's notification
    /// classes are invalidated alongside every order view.
    ///
    /// # Errors
    ///
    /// Returns the backend's error; `NotFound` if the order does not exist,
    /// `Unknown` if the transition is not a legal step forward.
    #[instrument(skip(self))]
    pub async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<(), MutationError> {
        self.remote.update_order_status(id, status).await?;
        self.invalidate(&[
            KeyClass::AllOrders,
            KeyClass::Order,
            KeyClass::OrderStatus,
            KeyClass::UserOrders,
            KeyClass::UserActiveOrders,
            KeyClass::UserOrderHistory,
            KeyClass::UserNotifications,
            KeyClass::UnreadCount,
        ]);
        info!(%id, ?status, "order status updated");
        Ok(())
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    /// Mark one notification as read.
    ///
    /// Marking an already-read notification succeeds and invalidates the
    /// same classes; the operation is idempotent end to end.
    ///
    /// # Errors
    ///
    /// Returns the backend's error.
    #[instrument(skip(self))]
    pub async fn mark_notification_read(&self, id: NotificationId) -> Result<(), MutationError> {
        self.remote.mark_notification_read(id).await?;
        self.invalidate(&[KeyClass::UserNotifications, KeyClass::UnreadCount]);
        Ok(())
    }

    /// Publish an announcement to every user (admin).
    ///
    /// # Errors
    ///
    /// Returns `Validation` for blank content, otherwise the backend's
    /// error.
    #[instrument(skip(self, content))]
    pub async fn add_broadcast_notification(&self, content: String) -> Result<(), MutationError> {
        if content.trim().is_empty() {
            return Err(MutationError::Validation(
                "broadcast content is empty".to_string(),
            ));
        }
        self.remote.add_broadcast_notification(content).await?;
        self.invalidate(&[
            KeyClass::UserNotifications,
            KeyClass::BroadcastNotifications,
            KeyClass::UnreadCount,
        ]);
        info!("broadcast notification published");
        Ok(())
    }

    // =========================================================================
    // Restaurant info (admin)
    // =========================================================================

    /// Update the restaurant's street address.
    ///
    /// # Errors
    ///
    /// Returns the backend's error.
    #[instrument(skip(self, location))]
    pub async fn set_restaurant_location(&self, location: String) -> Result<(), MutationError> {
        self.remote.set_restaurant_location(location).await?;
        self.invalidate(&[KeyClass::RestaurantLocation]);
        Ok(())
    }

    /// Update the restaurant's maps link.
    ///
    /// # Errors
    ///
    /// Returns the backend's error.
    #[instrument(skip(self, url))]
    pub async fn set_restaurant_maps_url(&self, url: String) -> Result<(), MutationError> {
        self.remote.set_restaurant_maps_url(url).await?;
        self.invalidate(&[KeyClass::RestaurantMapsUrl]);
        Ok(())
    }

    // =========================================================================
    // Payments
    // =========================================================================

    /// Install or rotate the payment processor credentials (admin).
    ///
    /// # Errors
    ///
    /// Returns the backend's error.
    #[instrument(skip_all)]
    pub async fn set_stripe_configuration(
        &self,
        config: StripeConfiguration,
    ) -> Result<(), MutationError> {
        self.remote.set_stripe_configuration(config).await?;
        self.invalidate(&[KeyClass::StripeConfigured]);
        info!("payment configuration updated");
        Ok(())
    }

    /// Open a checkout session for the given line items.
    ///
    /// The backend relays the processor's reply verbatim as JSON text; it is
    /// parsed and checked here so callers only ever see a usable session.
    /// Caches are untouched — nothing has happened until payment settles.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an empty item list, `MalformedResponse` if
    /// the reply does not decode to a session with a redirect URL, otherwise
    /// the backend's error.
    #[instrument(skip(self, items), fields(items = items.len()))]
    pub async fn create_checkout_session(
        &self,
        items: Vec<ShoppingItem>,
        success_url: String,
        cancel_url: String,
    ) -> Result<CheckoutSession, MutationError> {
        if items.is_empty() {
            return Err(MutationError::Validation(
                "checkout needs at least one item".to_string(),
            ));
        }
        let raw = self
            .remote
            .create_checkout_session(items, success_url, cancel_url)
            .await?;
        let session: CheckoutSession = serde_json::from_str(&raw)
            .map_err(|e| MutationError::MalformedResponse(e.to_string()))?;
        if session.url.is_empty() {
            return Err(MutationError::MalformedResponse(
                "checkout session has no redirect url".to_string(),
            ));
        }
        info!(session = %session.id, "checkout session created");
        Ok(session)
    }

    /// Ask the backend whether a checkout session settled.
    ///
    /// Invalidates nothing; order creation after a settled payment arrives
    /// through [`Self::create_order`].
    ///
    /// # Errors
    ///
    /// Returns the backend's error.
    #[instrument(skip(self))]
    pub async fn stripe_session_status(
        &self,
        session_id: String,
    ) -> Result<StripeSessionStatus, MutationError> {
        Ok(self.remote.stripe_session_status(session_id).await?)
    }
}
