//! Orders and the order status state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{MenuItemId, OrderId, UserId};
use super::money::Rupees;

/// Order lifecycle status.
///
/// The intended progression is linear: `Pending` → `Preparing` →
/// `OutForDelivery` → `Delivered`. The client does not enforce sequential
/// transitions; the admin UI offers all four as a direct selection and the
/// backend accepts any of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderStatus {
    Pending,
    Preparing,
    OutForDelivery,
    Delivered,
}

impl OrderStatus {
    /// All statuses, in progression order.
    pub const ALL: [Self; 4] = [
        Self::Pending,
        Self::Preparing,
        Self::OutForDelivery,
        Self::Delivered,
    ];

    /// Whether the order has reached its terminal state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered)
    }

    /// Whether the order is still being worked on.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Human-readable status label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Preparing => "Preparing",
            Self::OutForDelivery => "Out for Delivery",
            Self::Delivered => "Delivered",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("invalid order status: {s}"))
    }
}

/// A single line of an order.
///
/// The unit price is captured at order time so later menu edits do not
/// rewrite order history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub menu_item_id: MenuItemId,
    pub quantity: u64,
    /// Unit price at the time the order was placed.
    pub price: Rupees,
}

impl OrderItem {
    /// Line total (unit price × quantity).
    #[must_use]
    pub fn line_total(&self) -> Rupees {
        self.price * self.quantity
    }
}

/// An order as stored by the backend.
///
/// Items and total are immutable after creation; only the status changes,
/// and only through the admin status mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user: UserId,
    pub items: Vec<OrderItem>,
    /// Grand total in whole rupees, including delivery fee and tax.
    pub total: Rupees,
    pub status: OrderStatus,
    pub created: DateTime<Utc>,
    /// Payment processor session reference, when paid online.
    pub payment_id: Option<String>,
}

/// Payload for creating an order at checkout completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub items: Vec<OrderItem>,
    pub total: Rupees,
    pub payment_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_terminality() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(!OrderStatus::Delivered.is_active());
        for status in [
            OrderStatus::Pending,
            OrderStatus::Preparing,
            OrderStatus::OutForDelivery,
        ] {
            assert!(status.is_active());
        }
    }

    #[test]
    fn test_status_serde_camel_case() {
        let json = serde_json::to_string(&OrderStatus::OutForDelivery).expect("serialize");
        assert_eq!(json, "\"outForDelivery\"");
        let back: OrderStatus = serde_json::from_str("\"pending\"").expect("deserialize");
        assert_eq!(back, OrderStatus::Pending);
    }

    #[test]
    fn test_status_from_str_round_trips_labels() {
        for status in OrderStatus::ALL {
            assert_eq!(status.label().parse::<OrderStatus>(), Ok(status));
        }
        assert_eq!(
            "out for delivery".parse::<OrderStatus>(),
            Ok(OrderStatus::OutForDelivery)
        );
        assert!("Cancelled".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_line_total() {
        let line = OrderItem {
            menu_item_id: MenuItemId::new(1),
            quantity: 3,
            price: Rupees::new(250),
        };
        assert_eq!(line.line_total(), Rupees::new(750));
    }
}
