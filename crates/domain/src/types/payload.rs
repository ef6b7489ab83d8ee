//! Request bodies sent to the dashboard

use serde::Serialize;

/// Body of `POST api/orders`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderPayload {
    pub order: OrderBlock,
    pub customer: CustomerBlock,
}

impl OrderPayload {
    pub fn has_products(&self) -> bool {
        !self.order.products.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderBlock {
    /// Order id rendered as a string
    pub reference: String,
    pub order_date: String,
    pub products: Vec<ProductLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductLine {
    pub id: u64,
    pub name: String,
    /// Product image, placeholder image, or empty
    pub image: String,
    pub price: String,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerBlock {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub lang: String,
    pub gender: Option<String>,
    pub birthdate: Option<String>,
}

/// Body of `POST api/orders/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusPayload {
    pub order: StatusOrder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusOrder {
    pub reference: String,
    #[serde(rename = "validStatus")]
    pub valid_status: bool,
}

impl StatusPayload {
    pub fn valid(reference: impl Into<String>) -> Self {
        Self { order: StatusOrder { reference: reference.into(), valid_status: true } }
    }
}

/// Body of `POST api/module/configuration`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigurationPayload {
    pub configuration: ShopConfiguration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopConfiguration {
    pub name: String,
    pub cms_name: String,
    pub cms_version: String,
    pub website_url: String,
    pub logo_url: String,
}
