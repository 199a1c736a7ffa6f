//! Menu items and the fixed category set.

use serde::{Deserialize, Serialize};

use super::id::MenuItemId;
use super::money::Rupees;

/// The fixed set of menu categories.
///
/// The admin panel and the bulk-replace operation both operate on this set;
/// "all items" is a filter, not a category, so it has no variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuCategory {
    Starters,
    Curry,
    Roti,
    Beverages,
    Momos,
    Biryani,
    Raita,
    Soup,
}

impl MenuCategory {
    /// All categories, in menu display order.
    pub const ALL: [Self; 8] = [
        Self::Starters,
        Self::Curry,
        Self::Roti,
        Self::Beverages,
        Self::Momos,
        Self::Biryani,
        Self::Raita,
        Self::Soup,
    ];

    /// Human-readable category label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Starters => "Starters",
            Self::Curry => "Curry",
            Self::Roti => "Roti",
            Self::Beverages => "Beverages",
            Self::Momos => "Momos",
            Self::Biryani => "Biryani",
            Self::Raita => "Raita",
            Self::Soup => "Soup",
        }
    }
}

impl std::fmt::Display for MenuCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for MenuCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("invalid menu category: {s}"))
    }
}

/// A menu item as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: MenuItemId,
    pub name: String,
    pub description: String,
    /// Price in whole rupees.
    pub price: Rupees,
    pub category: MenuCategory,
    pub is_active: bool,
    /// URL of the item image, if one was uploaded.
    pub image_url: Option<String>,
}

/// Payload for creating or updating a menu item.
///
/// The server assigns the ID on creation, so the payload carries none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMenuItem {
    pub name: String,
    pub description: String,
    pub price: Rupees,
    pub category: MenuCategory,
    pub image_url: Option<String>,
}

impl NewMenuItem {
    /// A bare item with just a name and price, as produced by bulk entry.
    #[must_use]
    pub fn bare(name: impl Into<String>, price: Rupees, category: MenuCategory) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            price,
            category,
            image_url: None,
        }
    }
}
