//! Backend service interface.
//!
//! The backend is an actor-style service reached over a typed RPC surface.
//! [`RemoteService`] is that surface as a trait object, so the
//! synchronization layer, tests, and the HTTP transport all meet at the
//! same seam.
//!
//! Errors carry a typed [`ErrorKind`]; nothing in this crate inspects error
//! message text to decide behavior.

mod http;

pub use http::HttpRemoteService;

use async_trait::async_trait;
use thiserror::Error;

use tiffin_core::{
    MenuCategory, MenuItem, MenuItemId, NewMenuItem, NewOrder, Notification, NotificationId,
    Order, OrderId, OrderStatus, ShoppingItem, StripeConfiguration, StripeSessionStatus, UserId,
    UserRole,
};

/// Classification of a backend failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The caller lacks the privilege for the operation.
    Unauthorized,
    /// The addressed resource does not exist.
    NotFound,
    /// Network unreachable or the transport rejected the call; retryable.
    Transient,
    /// Anything the backend reported that fits no other kind.
    Unknown,
}

/// Errors returned by [`RemoteService`] implementations.
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    /// Caller lacks privilege for the operation.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Addressed resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Transport-level failure; the previous cached value stays visible.
    #[error("transient failure: {0}")]
    Transient(String),

    /// Unclassified backend failure.
    #[error("backend error: {0}")]
    Unknown(String),
}

impl RemoteError {
    /// The typed kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Transient(_) => ErrorKind::Transient,
            Self::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// Whether this is a permission failure.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transient(err.to_string())
    }
}

/// The full backend RPC surface.
///
/// Implementations must not cache; caching and invalidation belong to the
/// synchronization layer above this trait.
#[async_trait]
pub trait RemoteService: Send + Sync {
    // Menu

    async fn menu_items(&self) -> Result<Vec<MenuItem>, RemoteError>;

    async fn menu_items_by_category(
        &self,
        category: MenuCategory,
    ) -> Result<Vec<MenuItem>, RemoteError>;

    /// Create a menu item; the server assigns and returns the ID.
    async fn add_menu_item(&self, item: NewMenuItem) -> Result<MenuItemId, RemoteError>;

    async fn update_menu_item(&self, id: MenuItemId, item: NewMenuItem)
    -> Result<(), RemoteError>;

    async fn set_menu_item_active(
        &self,
        id: MenuItemId,
        is_active: bool,
    ) -> Result<(), RemoteError>;

    /// Delete and recreate every item in a category, atomically from the
    /// server's perspective.
    async fn replace_category_menu_items(
        &self,
        category: MenuCategory,
        items: Vec<NewMenuItem>,
    ) -> Result<(), RemoteError>;

    // Orders

    async fn create_order(&self, order: NewOrder) -> Result<OrderId, RemoteError>;

    async fn order(&self, id: OrderId) -> Result<Option<Order>, RemoteError>;

    async fn order_status(&self, id: OrderId) -> Result<Option<OrderStatus>, RemoteError>;

    async fn all_orders(&self) -> Result<Vec<Order>, RemoteError>;

    async fn orders_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, RemoteError>;

    async fn user_orders(&self, user: &UserId) -> Result<Vec<Order>, RemoteError>;

    async fn user_active_orders(&self, user: &UserId) -> Result<Vec<Order>, RemoteError>;

    async fn user_order_history(&self, user: &UserId) -> Result<Vec<Order>, RemoteError>;

    async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<(), RemoteError>;

    // Notifications

    async fn user_notifications(&self, user: &UserId) -> Result<Vec<Notification>, RemoteError>;

    async fn broadcast_notifications(&self) -> Result<Vec<Notification>, RemoteError>;

    async fn unread_count(&self, user: &UserId) -> Result<u64, RemoteError>;

    async fn mark_notification_read(&self, id: NotificationId) -> Result<(), RemoteError>;

    async fn add_broadcast_notification(&self, content: String) -> Result<(), RemoteError>;

    // Restaurant info

    async fn restaurant_location(&self) -> Result<String, RemoteError>;

    async fn set_restaurant_location(&self, location: String) -> Result<(), RemoteError>;

    async fn restaurant_maps_url(&self) -> Result<String, RemoteError>;

    async fn set_restaurant_maps_url(&self, url: String) -> Result<(), RemoteError>;

    // Payments

    async fn is_stripe_configured(&self) -> Result<bool, RemoteError>;

    async fn set_stripe_configuration(
        &self,
        config: StripeConfiguration,
    ) -> Result<(), RemoteError>;

    /// Create a checkout session; returns the raw processor reply as JSON
    /// text (the mutation layer parses and validates it).
    async fn create_checkout_session(
        &self,
        items: Vec<ShoppingItem>,
        success_url: String,
        cancel_url: String,
    ) -> Result<String, RemoteError>;

    async fn stripe_session_status(
        &self,
        session_id: String,
    ) -> Result<StripeSessionStatus, RemoteError>;

    // Identity

    async fn caller_role(&self) -> Result<UserRole, RemoteError>;
}
