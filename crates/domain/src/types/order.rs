//! Host order model, read through the order store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::sync::{OrderSyncRecord, SyncState};

pub type OrderId = u64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub created_at: DateTime<Utc>,
    /// Host status slug, e.g. `processing` or `completed`
    pub status: String,
    pub currency: String,
    pub customer: Customer,
    pub lines: Vec<OrderLine>,
    /// `None` until the order is first seen while the shop is authenticated
    pub sync: Option<OrderSyncRecord>,
}

impl Order {
    pub fn is_completed(&self) -> bool {
        self.status == crate::constants::HOST_STATUS_COMPLETED
    }
}

/// Billing identity attached to an order. `id` is `0` for guest checkouts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: u64,
    pub name: String,
    /// Product image URL, `None` when the product has no image
    pub image_url: Option<String>,
    /// Line total as formatted by the host
    pub price: String,
}

/// Selection used by the sync passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderFilter {
    pub state: SyncState,
    /// Skip records flagged `ignore`
    pub exclude_ignored: bool,
}

impl OrderFilter {
    /// Non-ignored orders in `state`.
    pub const fn pending(state: SyncState) -> Self {
        Self { state, exclude_ignored: true }
    }

    pub fn matches(&self, record: &OrderSyncRecord) -> bool {
        record.state == self.state && !(self.exclude_ignored && record.ignore)
    }
}
