//! Integration tests for Tiffin.
//!
//! The client layer is exercised end to end against [`InMemoryBackend`], a
//! complete in-process implementation of `RemoteService`. It reproduces the
//! backend's observable behavior — server-assigned IDs, notification side
//! effects of order mutations, role-gated admin calls — and counts every
//! call per method so tests can assert on cache behavior, not just results.
//!
//! Run with: `cargo test -p tiffin-integration-tests`

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use tiffin_client::remote::{RemoteError, RemoteService};
use tiffin_core::{
    MenuCategory, MenuItem, MenuItemId, NewMenuItem, NewOrder, Notification, NotificationId,
    NotificationType, Order, OrderId, OrderStatus, ShoppingItem, StripeConfiguration,
    StripeSessionStatus, UserId, UserRole,
};

/// Install a log subscriber for a test run; safe to call repeatedly.
///
/// Enable with e.g. `RUST_LOG=tiffin_client=debug cargo test`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Default)]
struct State {
    menu: Vec<MenuItem>,
    orders: Vec<Order>,
    notifications: Vec<Notification>,
    next_menu_id: u64,
    next_order_id: u64,
    next_notification_id: u64,
    location: String,
    maps_url: String,
    stripe: Option<StripeConfiguration>,
    caller: Option<UserId>,
    role: Option<UserRole>,
    calls: HashMap<&'static str, usize>,
    offline: bool,
}

/// In-process stand-in for the production backend.
#[derive(Default)]
pub struct InMemoryBackend {
    state: Mutex<State>,
}

impl InMemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the identity the backend attributes calls to.
    pub fn sign_in(&self, user: &UserId, role: UserRole) {
        let mut state = self.lock();
        state.caller = Some(user.clone());
        state.role = Some(role);
    }

    /// Simulate losing the network: every call fails `Transient` until
    /// [`Self::go_online`].
    pub fn go_offline(&self) {
        self.lock().offline = true;
    }

    pub fn go_online(&self) {
        self.lock().offline = false;
    }

    /// How many times a backend method has been called.
    #[must_use]
    pub fn calls(&self, method: &str) -> usize {
        self.lock().calls.get(method).copied().unwrap_or(0)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        #[allow(clippy::unwrap_used)] // test fixture; poisoning is a test bug
        self.state.lock().unwrap()
    }

    /// Record the call, then fail if the simulated network is down.
    fn enter(&self, method: &'static str) -> Result<std::sync::MutexGuard<'_, State>, RemoteError> {
        let mut state = self.lock();
        *state.calls.entry(method).or_insert(0) += 1;
        if state.offline {
            return Err(RemoteError::Transient("connection refused".to_string()));
        }
        Ok(state)
    }
}

fn caller(state: &State) -> Result<UserId, RemoteError> {
    state
        .caller
        .clone()
        .ok_or_else(|| RemoteError::Unauthorized("anonymous caller".to_string()))
}

fn require_admin(state: &State) -> Result<(), RemoteError> {
    if state.role == Some(UserRole::Admin) {
        Ok(())
    } else {
        Err(RemoteError::Unauthorized("admin only".to_string()))
    }
}

fn push_notification(
    state: &mut State,
    content: String,
    notification_type: NotificationType,
    user: Option<UserId>,
    order_id: Option<OrderId>,
    order_status: Option<OrderStatus>,
) {
    state.next_notification_id += 1;
    let notification = Notification {
        id: NotificationId::new(state.next_notification_id),
        content,
        notification_type,
        user,
        order_id,
        order_status,
        is_read: false,
        timestamp: Utc::now(),
    };
    state.notifications.push(notification);
}

#[async_trait]
impl RemoteService for InMemoryBackend {
    async fn menu_items(&self) -> Result<Vec<MenuItem>, RemoteError> {
        let state = self.enter("menu_items")?;
        Ok(state.menu.clone())
    }

    async fn menu_items_by_category(
        &self,
        category: MenuCategory,
    ) -> Result<Vec<MenuItem>, RemoteError> {
        let state = self.enter("menu_items_by_category")?;
        Ok(state
            .menu
            .iter()
            .filter(|item| item.category == category)
            .cloned()
            .collect())
    }

    async fn add_menu_item(&self, item: NewMenuItem) -> Result<MenuItemId, RemoteError> {
        let mut state = self.enter("add_menu_item")?;
        require_admin(&state)?;
        state.next_menu_id += 1;
        let id = MenuItemId::new(state.next_menu_id);
        state.menu.push(MenuItem {
            id,
            name: item.name,
            description: item.description,
            price: item.price,
            category: item.category,
            is_active: true,
            image_url: item.image_url,
        });
        Ok(id)
    }

    async fn update_menu_item(
        &self,
        id: MenuItemId,
        item: NewMenuItem,
    ) -> Result<(), RemoteError> {
        let mut state = self.enter("update_menu_item")?;
        require_admin(&state)?;
        let existing = state
            .menu
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| RemoteError::NotFound(format!("menu item {id}")))?;
        existing.name = item.name;
        existing.description = item.description;
        existing.price = item.price;
        existing.category = item.category;
        existing.image_url = item.image_url;
        Ok(())
    }

    async fn set_menu_item_active(
        &self,
        id: MenuItemId,
        is_active: bool,
    ) -> Result<(), RemoteError> {
        let mut state = self.enter("set_menu_item_active")?;
        require_admin(&state)?;
        let existing = state
            .menu
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| RemoteError::NotFound(format!("menu item {id}")))?;
        existing.is_active = is_active;
        Ok(())
    }

    async fn replace_category_menu_items(
        &self,
        category: MenuCategory,
        items: Vec<NewMenuItem>,
    ) -> Result<(), RemoteError> {
        let mut state = self.enter("replace_category_menu_items")?;
        require_admin(&state)?;
        state.menu.retain(|item| item.category != category);
        for item in items {
            state.next_menu_id += 1;
            let id = MenuItemId::new(state.next_menu_id);
            state.menu.push(MenuItem {
                id,
                name: item.name,
                description: item.description,
                price: item.price,
                category,
                is_active: true,
                image_url: item.image_url,
            });
        }
        Ok(())
    }

    async fn create_order(&self, order: NewOrder) -> Result<OrderId, RemoteError> {
        let mut state = self.enter("create_order")?;
        let user = caller(&state)?;
        state.next_order_id += 1;
        let id = OrderId::new(state.next_order_id);
        state.orders.push(Order {
            id,
            user: user.clone(),
            items: order.items,
            total: order.total,
            status: OrderStatus::Pending,
            created: Utc::now(),
            payment_id: order.payment_id,
        });
        push_notification(
            &mut state,
            format!("Your order #{id} has been placed"),
            NotificationType::OrderPlaced,
            Some(user),
            Some(id),
            Some(OrderStatus::Pending),
        );
        Ok(id)
    }

    async fn order(&self, id: OrderId) -> Result<Option<Order>, RemoteError> {
        let state = self.enter("order")?;
        Ok(state.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn order_status(&self, id: OrderId) -> Result<Option<OrderStatus>, RemoteError> {
        let state = self.enter("order_status")?;
        Ok(state.orders.iter().find(|o| o.id == id).map(|o| o.status))
    }

    async fn all_orders(&self) -> Result<Vec<Order>, RemoteError> {
        let state = self.enter("all_orders")?;
        require_admin(&state)?;
        Ok(state.orders.clone())
    }

    async fn orders_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, RemoteError> {
        let state = self.enter("orders_by_status")?;
        require_admin(&state)?;
        Ok(state
            .orders
            .iter()
            .filter(|o| o.status == status)
            .cloned()
            .collect())
    }

    async fn user_orders(&self, user: &UserId) -> Result<Vec<Order>, RemoteError> {
        let state = self.enter("user_orders")?;
        Ok(state
            .orders
            .iter()
            .filter(|o| &o.user == user)
            .cloned()
            .collect())
    }

    async fn user_active_orders(&self, user: &UserId) -> Result<Vec<Order>, RemoteError> {
        let state = self.enter("user_active_orders")?;
        Ok(state
            .orders
            .iter()
            .filter(|o| &o.user == user && o.status.is_active())
            .cloned()
            .collect())
    }

    async fn user_order_history(&self, user: &UserId) -> Result<Vec<Order>, RemoteError> {
        let state = self.enter("user_order_history")?;
        Ok(state
            .orders
            .iter()
            .filter(|o| &o.user == user && o.status.is_terminal())
            .cloned()
            .collect())
    }

    async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<(), RemoteError> {
        let mut state = self.enter("update_order_status")?;
        require_admin(&state)?;
        let owner = {
            let order = state
                .orders
                .iter_mut()
                .find(|o| o.id == id)
                .ok_or_else(|| RemoteError::NotFound(format!("order {id}")))?;
            order.status = status;
            order.user.clone()
        };
        push_notification(
            &mut state,
            format!("Order #{id} is now {status}"),
            NotificationType::OrderStatusUpdated,
            Some(owner),
            Some(id),
            Some(status),
        );
        Ok(())
    }

    async fn user_notifications(&self, user: &UserId) -> Result<Vec<Notification>, RemoteError> {
        let state = self.enter("user_notifications")?;
        Ok(state
            .notifications
            .iter()
            .filter(|n| n.is_broadcast() || n.user.as_ref() == Some(user))
            .cloned()
            .collect())
    }

    async fn broadcast_notifications(&self) -> Result<Vec<Notification>, RemoteError> {
        let state = self.enter("broadcast_notifications")?;
        Ok(state
            .notifications
            .iter()
            .filter(|n| n.is_broadcast())
            .cloned()
            .collect())
    }

    async fn unread_count(&self, user: &UserId) -> Result<u64, RemoteError> {
        let state = self.enter("unread_count")?;
        Ok(state
            .notifications
            .iter()
            .filter(|n| !n.is_read && (n.is_broadcast() || n.user.as_ref() == Some(user)))
            .count() as u64)
    }

    async fn mark_notification_read(&self, id: NotificationId) -> Result<(), RemoteError> {
        let mut state = self.enter("mark_notification_read")?;
        let notification = state
            .notifications
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| RemoteError::NotFound(format!("notification {id}")))?;
        // Marking twice is fine; the second call changes nothing.
        notification.is_read = true;
        Ok(())
    }

    async fn add_broadcast_notification(&self, content: String) -> Result<(), RemoteError> {
        let mut state = self.enter("add_broadcast_notification")?;
        require_admin(&state)?;
        push_notification(
            &mut state,
            content,
            NotificationType::Broadcast,
            None,
            None,
            None,
        );
        Ok(())
    }

    async fn restaurant_location(&self) -> Result<String, RemoteError> {
        let state = self.enter("restaurant_location")?;
        Ok(state.location.clone())
    }

    async fn set_restaurant_location(&self, location: String) -> Result<(), RemoteError> {
        let mut state = self.enter("set_restaurant_location")?;
        require_admin(&state)?;
        state.location = location;
        Ok(())
    }

    async fn restaurant_maps_url(&self) -> Result<String, RemoteError> {
        let state = self.enter("restaurant_maps_url")?;
        Ok(state.maps_url.clone())
    }

    async fn set_restaurant_maps_url(&self, url: String) -> Result<(), RemoteError> {
        let mut state = self.enter("set_restaurant_maps_url")?;
        require_admin(&state)?;
        state.maps_url = url;
        Ok(())
    }

    async fn is_stripe_configured(&self) -> Result<bool, RemoteError> {
        let state = self.enter("is_stripe_configured")?;
        Ok(state.stripe.is_some())
    }

    async fn set_stripe_configuration(
        &self,
        config: StripeConfiguration,
    ) -> Result<(), RemoteError> {
        let mut state = self.enter("set_stripe_configuration")?;
        require_admin(&state)?;
        state.stripe = Some(config);
        Ok(())
    }

    async fn create_checkout_session(
        &self,
        items: Vec<ShoppingItem>,
        success_url: String,
        _cancel_url: String,
    ) -> Result<String, RemoteError> {
        let state = self.enter("create_checkout_session")?;
        if state.stripe.is_none() {
            return Err(RemoteError::Unknown(
                "payment processor not configured".to_string(),
            ));
        }
        drop(state);
        let reply = serde_json::json!({
            "id": format!("cs_test_{}", items.len()),
            "url": format!("https://checkout.stripe.com/pay?redirect={success_url}"),
        });
        Ok(reply.to_string())
    }

    async fn stripe_session_status(
        &self,
        session_id: String,
    ) -> Result<StripeSessionStatus, RemoteError> {
        let state = self.enter("stripe_session_status")?;
        let user = caller(&state)?;
        drop(state);
        Ok(StripeSessionStatus::Completed {
            response: format!("session {session_id} paid"),
            user: Some(user.to_string()),
        })
    }

    async fn caller_role(&self) -> Result<UserRole, RemoteError> {
        let state = self.enter("caller_role")?;
        Ok(state.role.unwrap_or(UserRole::Guest))
    }
}

/// A small order payload for tests.
#[must_use]
pub fn sample_order(total: u64) -> NewOrder {
    use tiffin_core::{OrderItem, Rupees};
    NewOrder {
        items: vec![OrderItem {
            menu_item_id: MenuItemId::new(1),
            quantity: 1,
            price: Rupees::new(total),
        }],
        total: Rupees::new(total),
        payment_id: None,
    }
}
