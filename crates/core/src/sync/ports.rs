//! Port interfaces for host order storage

use async_trait::async_trait;
use recreviews_domain::{Order, OrderFilter, OrderId, OrderSyncRecord, Result};

/// Host order and customer storage.
///
/// The host owns orders; sync code only reads them and writes the sync meta
/// group and the customer language preference.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Load one order with its sync record, `None` when it does not exist
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Orders whose sync record matches `filter`, ascending by id
    async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<Order>>;

    /// Write every sync meta value of one order in a single atomic update
    async fn save_sync_record(&self, id: OrderId, record: &OrderSyncRecord) -> Result<()>;

    /// Locale configured for a customer account (falls back to the site locale)
    async fn customer_locale(&self, customer_id: u64) -> Result<Option<String>>;

    /// Two-letter language captured at checkout
    async fn customer_language(&self, customer_id: u64) -> Result<Option<String>>;

    /// Store the two-letter language captured at checkout
    async fn set_customer_language(&self, customer_id: u64, lang: &str) -> Result<()>;
}
