//! Canonical cache keys for backend resources.
//!
//! Every read and every invalidation names its resource through this
//! registry, so the two sides can never drift apart. A [`CacheKey`] is the
//! fully parameterized resource (e.g. "orders for user X"); a [`KeyClass`]
//! is the unparameterized family, which is the unit of invalidation — a
//! broadcast notification, for example, touches every user's notification
//! list, so invalidation is never user-scoped.

use std::time::Duration;

use tiffin_core::{MenuCategory, OrderId, UserId};

/// A fully parameterized cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    MenuItems,
    MenuItemsByCategory(MenuCategory),
    Order(OrderId),
    OrderStatus(OrderId),
    AllOrders,
    UserOrders(UserId),
    UserActiveOrders(UserId),
    UserOrderHistory(UserId),
    UserNotifications(UserId),
    BroadcastNotifications,
    UnreadCount(UserId),
    StripeConfigured,
    RestaurantLocation,
    RestaurantMapsUrl,
    CallerRole,
}

impl CacheKey {
    /// The unparameterized family this key belongs to.
    #[must_use]
    pub const fn class(&self) -> KeyClass {
        match self {
            Self::MenuItems => KeyClass::MenuItems,
            Self::MenuItemsByCategory(_) => KeyClass::MenuItemsByCategory,
            Self::Order(_) => KeyClass::Order,
            Self::OrderStatus(_) => KeyClass::OrderStatus,
            Self::AllOrders => KeyClass::AllOrders,
            Self::UserOrders(_) => KeyClass::UserOrders,
            Self::UserActiveOrders(_) => KeyClass::UserActiveOrders,
            Self::UserOrderHistory(_) => KeyClass::UserOrderHistory,
            Self::UserNotifications(_) => KeyClass::UserNotifications,
            Self::BroadcastNotifications => KeyClass::BroadcastNotifications,
            Self::UnreadCount(_) => KeyClass::UnreadCount,
            Self::StripeConfigured => KeyClass::StripeConfigured,
            Self::RestaurantLocation => KeyClass::RestaurantLocation,
            Self::RestaurantMapsUrl => KeyClass::RestaurantMapsUrl,
            Self::CallerRole => KeyClass::CallerRole,
        }
    }
}

/// A resource family; the unit of invalidation and polling policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyClass {
    MenuItems,
    MenuItemsByCategory,
    Order,
    OrderStatus,
    AllOrders,
    UserOrders,
    UserActiveOrders,
    UserOrderHistory,
    UserNotifications,
    BroadcastNotifications,
    UnreadCount,
    StripeConfigured,
    RestaurantLocation,
    RestaurantMapsUrl,
    CallerRole,
}

impl KeyClass {
    /// Fixed repoll interval for resources that change server-side outside
    /// the client's control; `None` for resources that only change through
    /// this client's own mutations.
    #[must_use]
    pub const fn polling_interval(&self) -> Option<Duration> {
        match self {
            // Order tracking wants near-live status.
            Self::Order | Self::OrderStatus => Some(Duration::from_secs(5)),
            // Admin dashboards and the unread badge tolerate more lag.
            Self::UnreadCount | Self::AllOrders | Self::UserActiveOrders => {
                Some(Duration::from_secs(10))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_strips_parameters() {
        let a = CacheKey::UserOrders(UserId::new("alice"));
        let b = CacheKey::UserOrders(UserId::new("bob"));
        assert_ne!(a, b);
        assert_eq!(a.class(), b.class());
        assert_eq!(a.class(), KeyClass::UserOrders);
    }

    #[test]
    fn test_polling_intervals() {
        assert_eq!(
            CacheKey::Order(OrderId::new(1)).class().polling_interval(),
            Some(Duration::from_secs(5))
        );
        assert_eq!(
            KeyClass::UnreadCount.polling_interval(),
            Some(Duration::from_secs(10))
        );
        assert_eq!(KeyClass::MenuItems.polling_interval(), None);
        assert_eq!(KeyClass::RestaurantLocation.polling_interval(), None);
    }
}
