//! Dashboard-side shop identity and onboarding content

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `shop` object returned by `GET api/shop`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShopProfile(pub Value);

impl ShopProfile {
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

/// Onboarding fragment shown before the shop is linked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Onboarding(pub Value);

/// What the settings page shows.
#[derive(Debug, Clone, PartialEq)]
pub enum AccountStatus {
    Linked { shop: Option<ShopProfile> },
    NotLinked { onboarding: Option<Onboarding>, authorization_url: String },
}
