//! User and broadcast notifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{NotificationId, OrderId, UserId};
use super::order::OrderStatus;

/// What kind of event produced a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationType {
    OrderPlaced,
    OrderStatusUpdated,
    PaymentConfirmation,
    PaymentFailure,
    Broadcast,
}

/// A notification created server-side as a side effect of order, payment,
/// or admin actions.
///
/// Broadcast notifications carry no `user` and are visible to everyone.
/// The only client-driven mutation is marking a notification read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub content: String,
    pub notification_type: NotificationType,
    /// Owning user; `None` for broadcasts.
    pub user: Option<UserId>,
    /// Associated order, for order and payment notifications.
    pub order_id: Option<OrderId>,
    /// Snapshot of the order status at notification time.
    pub order_status: Option<OrderStatus>,
    pub is_read: bool,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    /// Whether this notification is visible to all users.
    #[must_use]
    pub const fn is_broadcast(&self) -> bool {
        self.user.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_has_no_owner() {
        let notification = Notification {
            id: NotificationId::new(1),
            content: "Holiday special: momos half price".to_string(),
            notification_type: NotificationType::Broadcast,
            user: None,
            order_id: None,
            order_status: None,
            is_read: false,
            timestamp: Utc::now(),
        };
        assert!(notification.is_broadcast());
        assert!(!notification.is_read);
    }

    #[test]
    fn test_type_serde_camel_case() {
        let json = serde_json::to_string(&NotificationType::OrderStatusUpdated)
            .expect("serialize");
        assert_eq!(json, "\"orderStatusUpdated\"");
    }
}
