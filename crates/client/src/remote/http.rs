//! HTTP transport for the backend RPC surface.
//!
//! Every operation is a JSON POST to one endpoint with a
//! `{ "method": ..., "params": ... }` envelope. HTTP status codes map onto
//! the typed error kinds: 401/403 are `Unauthorized`, 404 is `NotFound`,
//! transport failures are `Transient`, everything else is `Unknown`.

use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::instrument;

use tiffin_core::{
    MenuCategory, MenuItem, MenuItemId, NewMenuItem, NewOrder, Notification, NotificationId,
    Order, OrderId, OrderStatus, ShoppingItem, StripeConfiguration, StripeSessionStatus, UserId,
    UserRole,
};

use crate::config::RemoteConfig;

use super::{RemoteError, RemoteService};

use async_trait::async_trait;

/// Backend client speaking the JSON-RPC envelope over HTTP.
#[derive(Clone)]
pub struct HttpRemoteService {
    client: reqwest::Client,
    endpoint: url::Url,
    access_token: String,
}

impl HttpRemoteService {
    /// Create a new backend client.
    #[must_use]
    pub fn new(config: &RemoteConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            access_token: config.access_token.expose_secret().to_string(),
        }
    }

    /// Execute one RPC call and decode the reply.
    async fn call<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> Result<R, RemoteError> {
        let body = self.call_raw(method, params).await?;

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                method,
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to decode backend reply"
            );
            RemoteError::Unknown(format!("malformed reply for {method}: {e}"))
        })
    }

    /// Execute one RPC call whose reply body is ignored.
    async fn call_unit<P: Serialize>(&self, method: &str, params: P) -> Result<(), RemoteError> {
        self.call_raw(method, params).await.map(|_| ())
    }

    async fn call_raw<P: Serialize>(&self, method: &str, params: P) -> Result<String, RemoteError> {
        let envelope = json!({ "method": method, "params": params });

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.access_token)
            .header("Content-Type", "application/json")
            .json(&envelope)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(body);
        }

        let message = format!(
            "{method}: HTTP {status}: {}",
            body.chars().take(200).collect::<String>()
        );
        tracing::error!(method, status = %status, "Backend call failed");

        Err(match status.as_u16() {
            401 | 403 => RemoteError::Unauthorized(message),
            404 => RemoteError::NotFound(message),
            408 | 429 | 502..=504 => RemoteError::Transient(message),
            _ => RemoteError::Unknown(message),
        })
    }
}

#[async_trait]
impl RemoteService for HttpRemoteService {
    #[instrument(skip(self))]
    async fn menu_items(&self) -> Result<Vec<MenuItem>, RemoteError> {
        self.call("getMenuItems", json!({})).await
    }

    #[instrument(skip(self))]
    async fn menu_items_by_category(
        &self,
        category: MenuCategory,
    ) -> Result<Vec<MenuItem>, RemoteError> {
        self.call("getMenuItemsByCategory", json!({ "category": category }))
            .await
    }

    #[instrument(skip(self, item), fields(name = %item.name))]
    async fn add_menu_item(&self, item: NewMenuItem) -> Result<MenuItemId, RemoteError> {
        self.call("addMenuItem", json!({ "item": item })).await
    }

    #[instrument(skip(self, item), fields(id = %id))]
    async fn update_menu_item(
        &self,
        id: MenuItemId,
        item: NewMenuItem,
    ) -> Result<(), RemoteError> {
        self.call_unit("updateMenuItem", json!({ "id": id, "item": item }))
            .await
    }

    #[instrument(skip(self))]
    async fn set_menu_item_active(
        &self,
        id: MenuItemId,
        is_active: bool,
    ) -> Result<(), RemoteError> {
        self.call_unit(
            "setMenuItemActiveStatus",
            json!({ "id": id, "is_active": is_active }),
        )
        .await
    }

    #[instrument(skip(self, items), fields(count = items.len()))]
    async fn replace_category_menu_items(
        &self,
        category: MenuCategory,
        items: Vec<NewMenuItem>,
    ) -> Result<(), RemoteError> {
        self.call_unit(
            "replaceCategoryMenuItems",
            json!({ "category": category, "items": items }),
        )
        .await
    }

    #[instrument(skip(self, order), fields(total = %order.total))]
    async fn create_order(&self, order: NewOrder) -> Result<OrderId, RemoteError> {
        self.call("createOrder", json!({ "order": order })).await
    }

    #[instrument(skip(self))]
    async fn order(&self, id: OrderId) -> Result<Option<Order>, RemoteError> {
        self.call("getOrder", json!({ "order_id": id })).await
    }

    #[instrument(skip(self))]
    async fn order_status(&self, id: OrderId) -> Result<Option<OrderStatus>, RemoteError> {
        self.call("getOrderStatus", json!({ "order_id": id })).await
    }

    #[instrument(skip(self))]
    async fn all_orders(&self) -> Result<Vec<Order>, RemoteError> {
        self.call("getAllOrders", json!({})).await
    }

    #[instrument(skip(self))]
    async fn orders_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, RemoteError> {
        self.call("getOrdersByStatus", json!({ "status": status }))
            .await
    }

    #[instrument(skip(self, user))]
    async fn user_orders(&self, user: &UserId) -> Result<Vec<Order>, RemoteError> {
        self.call("getUserOrders", json!({ "user": user })).await
    }

    #[instrument(skip(self, user))]
    async fn user_active_orders(&self, user: &UserId) -> Result<Vec<Order>, RemoteError> {
        self.call("getUserActiveOrders", json!({ "user": user }))
            .await
    }

    #[instrument(skip(self, user))]
    async fn user_order_history(&self, user: &UserId) -> Result<Vec<Order>, RemoteError> {
        self.call("getUserOrderHistory", json!({ "user": user }))
            .await
    }

    #[instrument(skip(self))]
    async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<(), RemoteError> {
        self.call_unit(
            "updateOrderStatus",
            json!({ "order_id": id, "status": status }),
        )
        .await
    }

    #[instrument(skip(self, user))]
    async fn user_notifications(&self, user: &UserId) -> Result<Vec<Notification>, RemoteError> {
        self.call("getUserNotifications", json!({ "user": user }))
            .await
    }

    #[instrument(skip(self))]
    async fn broadcast_notifications(&self) -> Result<Vec<Notification>, RemoteError> {
        self.call("getBroadcastNotifications", json!({})).await
    }

    #[instrument(skip(self, user))]
    async fn unread_count(&self, user: &UserId) -> Result<u64, RemoteError> {
        self.call("getUnreadNotificationsCount", json!({ "user": user }))
            .await
    }

    #[instrument(skip(self))]
    async fn mark_notification_read(&self, id: NotificationId) -> Result<(), RemoteError> {
        self.call_unit("markNotificationAsRead", json!({ "notification_id": id }))
            .await
    }

    #[instrument(skip(self, content))]
    async fn add_broadcast_notification(&self, content: String) -> Result<(), RemoteError> {
        self.call_unit("addBroadcastNotification", json!({ "content": content }))
            .await
    }

    #[instrument(skip(self))]
    async fn restaurant_location(&self) -> Result<String, RemoteError> {
        self.call("getRestaurantLocation", json!({})).await
    }

    #[instrument(skip(self, location))]
    async fn set_restaurant_location(&self, location: String) -> Result<(), RemoteError> {
        self.call_unit("setRestaurantLocation", json!({ "location": location }))
            .await
    }

    #[instrument(skip(self))]
    async fn restaurant_maps_url(&self) -> Result<String, RemoteError> {
        self.call("getRestaurantMapsUrl", json!({})).await
    }

    #[instrument(skip(self, url))]
    async fn set_restaurant_maps_url(&self, url: String) -> Result<(), RemoteError> {
        self.call_unit("setRestaurantMapsUrl", json!({ "url": url }))
            .await
    }

    #[instrument(skip(self))]
    async fn is_stripe_configured(&self) -> Result<bool, RemoteError> {
        self.call("isStripeConfigured", json!({})).await
    }

    #[instrument(skip(self, config))]
    async fn set_stripe_configuration(
        &self,
        config: StripeConfiguration,
    ) -> Result<(), RemoteError> {
        self.call_unit("setStripeConfiguration", json!({ "config": config }))
            .await
    }

    #[instrument(skip(self, items, success_url, cancel_url), fields(count = items.len()))]
    async fn create_checkout_session(
        &self,
        items: Vec<ShoppingItem>,
        success_url: String,
        cancel_url: String,
    ) -> Result<String, RemoteError> {
        // Returned verbatim; the mutation layer parses the processor reply.
        self.call_raw(
            "createCheckoutSession",
            json!({
                "items": items,
                "success_url": success_url,
                "cancel_url": cancel_url,
            }),
        )
        .await
    }

    #[instrument(skip(self, session_id))]
    async fn stripe_session_status(
        &self,
        session_id: String,
    ) -> Result<StripeSessionStatus, RemoteError> {
        self.call("getStripeSessionStatus", json!({ "session_id": session_id }))
            .await
    }

    #[instrument(skip(self))]
    async fn caller_role(&self) -> Result<UserRole, RemoteError> {
        self.call("getCallerUserRole", json!({})).await
    }
}
