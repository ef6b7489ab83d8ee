//! Trigger interfaces invoked by the host adapter and the scheduler

use async_trait::async_trait;
use recreviews_domain::{OrderId, Result, SweepOutcome};

/// Host order lifecycle hooks.
#[async_trait]
pub trait OrderEventHandler: Send + Sync {
    async fn on_order_created(&self, order_id: OrderId) -> Result<()>;

    async fn on_order_completed(&self, order_id: OrderId) -> Result<()>;

    /// Checkout review page rendered for `customer_id` with the browser's
    /// `Accept-Language` value
    async fn on_checkout_review(&self, customer_id: u64, accept_language: &str) -> Result<()>;
}

/// Periodic reconciliation entry point.
#[async_trait]
pub trait ScheduledSweep: Send + Sync {
    async fn run_sweep(&self) -> Result<SweepOutcome>;
}
