//! Payment processor configuration and checkout session types.

use secrecy::{ExposeSecret, SecretString};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize};

use super::money::Rupees;

/// Stripe configuration set once by the admin.
///
/// Implements `Debug` manually to redact the secret key; it is never
/// displayed back in plaintext after entry. `Serialize` exposes the key
/// because the struct exists only to be transmitted to the backend.
#[derive(Clone)]
pub struct StripeConfiguration {
    /// Stripe secret key (server-side only).
    pub secret_key: SecretString,
    /// ISO 3166-1 alpha-2 country codes allowed at checkout.
    pub allowed_countries: Vec<String>,
}

impl std::fmt::Debug for StripeConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfiguration")
            .field("secret_key", &"[REDACTED]")
            .field("allowed_countries", &self.allowed_countries)
            .finish()
    }
}

impl Serialize for StripeConfiguration {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("StripeConfiguration", 2)?;
        state.serialize_field("secret_key", self.secret_key.expose_secret())?;
        state.serialize_field("allowed_countries", &self.allowed_countries)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for StripeConfiguration {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            secret_key: String,
            allowed_countries: Vec<String>,
        }
        let raw = Raw::deserialize(deserializer)?;
        Ok(Self {
            secret_key: SecretString::from(raw.secret_key),
            allowed_countries: raw.allowed_countries,
        })
    }
}

/// A line item sent to the payment processor at checkout.
///
/// Prices are in paise (the processor's smallest-unit convention).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoppingItem {
    pub product_name: String,
    pub product_description: String,
    pub currency: String,
    pub quantity: u64,
    pub price_in_cents: u64,
}

impl ShoppingItem {
    /// Build a line item in INR from a whole-rupee unit price.
    #[must_use]
    pub fn inr(
        name: impl Into<String>,
        description: impl Into<String>,
        price: Rupees,
        quantity: u64,
    ) -> Self {
        Self {
            product_name: name.into(),
            product_description: description.into(),
            currency: "inr".to_string(),
            quantity,
            price_in_cents: price.as_paise(),
        }
    }
}

/// A checkout session created by the payment processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// Outcome of a completed or failed checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum StripeSessionStatus {
    Completed {
        /// Raw processor response payload.
        response: String,
        /// Principal of the paying user, when known.
        user: Option<String>,
    },
    Failed {
        error: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secret_key() {
        let config = StripeConfiguration {
            secret_key: SecretString::from("sk_test_4eC39HqLyjWDarjtT1zdp7dc"),
            allowed_countries: vec!["IN".to_string()],
        };
        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("sk_test"));
        assert!(debug_output.contains("IN"));
    }

    #[test]
    fn test_configuration_serde_round_trip() {
        let config = StripeConfiguration {
            secret_key: SecretString::from("sk_test_4eC39HqLyjWDarjtT1zdp7dc"),
            allowed_countries: vec!["IN".to_string(), "US".to_string()],
        };
        let json = serde_json::to_string(&config).expect("serialize");
        assert!(json.contains("sk_test_4eC39HqLyjWDarjtT1zdp7dc"));
        let back: StripeConfiguration = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.secret_key.expose_secret(), "sk_test_4eC39HqLyjWDarjtT1zdp7dc");
        assert_eq!(back.allowed_countries, config.allowed_countries);
    }

    #[test]
    fn test_shopping_item_inr_uses_paise() {
        let item = ShoppingItem::inr("Delivery Fee", "Standard delivery", Rupees::new(50), 1);
        assert_eq!(item.price_in_cents, 5_000);
        assert_eq!(item.currency, "inr");
    }
}
