//! Order sync state machine and reconciliation sweep
//!
//! Orders move `NotSent -> Sent -> Valid`. Hooks push state changes as they
//! happen; the hourly sweep retries whatever the hooks missed.
//!
//! API failures never escape this module: they are logged with the order id
//! and the order is left for the next sweep. Authentication failures do
//! escape. Every dashboard call reads its bearer through the token store,
//! which refreshes it once expired.

use std::sync::Arc;

use async_trait::async_trait;
use recreviews_common::time::{from_unix_seconds, Clock};
use recreviews_domain::constants::{LOG_CONTEXT, OPTION_LAST_SYNC};
use recreviews_domain::{
    AuthError, Config, Customer, Order, OrderFilter, OrderId, OrderSyncRecord, Result, SweepOutcome,
    SweepSkip, SweepSummary, SyncRunRecord, SyncState,
};
use tracing::{debug, error, info, instrument, warn};

use super::lock::{SweepGuard, SweepLease};
use super::payload::{build_order_payload, language_prefix};
use super::ports::OrderStore;
use crate::api::RemoteApi;
use crate::auth::TokenStore;
use crate::config_store_ports::ConfigStore;
use crate::triggers::{OrderEventHandler, ScheduledSweep};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSettings {
    pub placeholder_image_url: Option<String>,
    pub lock_ttl_secs: u64,
}

impl SyncSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            placeholder_image_url: config.shop.placeholder_image_url.clone(),
            lock_ttl_secs: config.sync.lock_ttl_secs,
        }
    }
}

pub struct OrderSyncEngine {
    orders: Arc<dyn OrderStore>,
    config: Arc<dyn ConfigStore>,
    tokens: Arc<TokenStore>,
    api: Arc<RemoteApi>,
    clock: Arc<dyn Clock>,
    guard: SweepGuard,
    settings: SyncSettings,
}

impl OrderSyncEngine {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        config: Arc<dyn ConfigStore>,
        tokens: Arc<TokenStore>,
        api: Arc<RemoteApi>,
        clock: Arc<dyn Clock>,
        settings: SyncSettings,
    ) -> Self {
        let guard = SweepGuard::new(Arc::clone(&config), Arc::clone(&clock), settings.lock_ttl_secs);
        Self { orders, config, tokens, api, clock, guard, settings }
    }

    /// Start tracking a newly placed order.
    ///
    /// No-op while unlinked or when the order already has a record.
    #[instrument(skip(self))]
    pub async fn on_order_created(&self, order_id: OrderId) -> Result<()> {
        if !self.tokens.is_authenticated().await? {
            return Ok(());
        }

        let Some(order) = self.orders.get_order(order_id).await? else {
            warn!(context = LOG_CONTEXT, order_id, "created order not found");
            return Ok(());
        };

        if order.sync.is_none() {
            self.orders.save_sync_record(order_id, &OrderSyncRecord::new()).await?;
            debug!(order_id, "sync record initialized");
        }
        Ok(())
    }

    /// Report a completed order as valid when it was already pushed.
    #[instrument(skip(self))]
    pub async fn on_order_completed(&self, order_id: OrderId) -> Result<()> {
        if !self.tokens.is_authenticated().await? {
            return Ok(());
        }

        let Some(order) = self.orders.get_order(order_id).await? else {
            warn!(context = LOG_CONTEXT, order_id, "completed order not found");
            return Ok(());
        };

        match order.sync {
            Some(record) if record.state == SyncState::Sent && !record.ignore => {
                self.complete_order(order.id, record).await?;
            }
            _ => debug!(order_id, "order not awaiting validation"),
        }
        Ok(())
    }

    /// Store the checkout language of a registered customer.
    pub async fn capture_language(&self, customer_id: u64, accept_language: &str) -> Result<()> {
        if customer_id == 0 {
            return Ok(());
        }
        let Some(lang) = language_prefix(accept_language) else {
            return Ok(());
        };

        let current = self.orders.customer_language(customer_id).await?;
        if current.as_deref() != Some(lang.as_str()) {
            self.orders.set_customer_language(customer_id, &lang).await?;
            debug!(customer_id, lang = %lang, "customer language captured");
        }
        Ok(())
    }

    /// Run both sync passes under the sweep lock.
    ///
    /// # Errors
    /// Authentication and storage failures. Per-order API failures are
    /// counted in the summary instead.
    #[instrument(skip(self))]
    pub async fn reconcile(&self) -> Result<SweepOutcome> {
        if !self.tokens.is_authenticated().await? {
            debug!("sweep skipped: shop not linked");
            return Ok(SweepOutcome::Skipped(SweepSkip::NotAuthenticated));
        }

        let Some(mut lease) = self.guard.acquire().await? else {
            info!("sweep skipped: another sweep is running");
            return Ok(SweepOutcome::Skipped(SweepSkip::AlreadyRunning));
        };

        let swept = self.sweep(&mut lease).await;
        let released = lease.release().await;
        let summary = swept?;
        released?;

        info!(
            completed = summary.completed,
            sent = summary.sent,
            ignored = summary.ignored,
            failed = summary.failed,
            interrupted = summary.interrupted,
            "sync.sweep_finished"
        );
        Ok(SweepOutcome::Ran(summary))
    }

    /// Sync record for the admin order panel, `None` when unlinked,
    /// untracked or ignored.
    pub async fn display_info(&self, order_id: OrderId) -> Result<Option<OrderSyncRecord>> {
        if !self.tokens.is_authenticated().await? {
            return Ok(None);
        }
        let record = self.orders.get_order(order_id).await?.and_then(|order| order.sync);
        Ok(record.filter(|record| !record.ignore))
    }

    /// Non-ignored orders currently in `state`.
    pub async fn count_pending(&self, state: SyncState) -> Result<usize> {
        Ok(self.orders.list_orders(OrderFilter::pending(state)).await?.len())
    }

    pub async fn last_run(&self) -> Result<Option<SyncRunRecord>> {
        let raw = self.config.get(OPTION_LAST_SYNC).await?;
        Ok(raw
            .and_then(|value| value.parse::<i64>().ok())
            .and_then(from_unix_seconds)
            .map(|last_run_at| SyncRunRecord { last_run_at }))
    }

    async fn sweep(&self, lease: &mut SweepLease) -> Result<SweepSummary> {
        let mut summary = SweepSummary::default();

        let sent = self.orders.list_orders(OrderFilter::pending(SyncState::Sent)).await?;
        for order in sent.into_iter().filter(Order::is_completed) {
            if !lease.renew().await? {
                summary.interrupted = true;
                return Ok(summary);
            }
            let record = order.sync.unwrap_or_default();
            match self.complete_order(order.id, record).await {
                Ok(true) => summary.completed += 1,
                Ok(false) => summary.failed += 1,
                Err(err) if err.is_auth() => return Err(err),
                Err(err) => {
                    error!(context = LOG_CONTEXT, order_id = order.id, error_kind = err.label(), error = %err, "failed to store validation");
                    summary.failed += 1;
                }
            }
        }

        let waiting = self.orders.list_orders(OrderFilter::pending(SyncState::NotSent)).await?;
        for order in waiting {
            if !lease.renew().await? {
                summary.interrupted = true;
                return Ok(summary);
            }
            match self.push_waiting(&order, &mut summary).await {
                Ok(()) => {}
                Err(err) if err.is_auth() => return Err(err),
                Err(err) => {
                    error!(context = LOG_CONTEXT, order_id = order.id, error_kind = err.label(), error = %err, "failed to sync order");
                    summary.failed += 1;
                }
            }
        }

        self.config.set(OPTION_LAST_SYNC, &self.clock.unix_seconds().to_string()).await?;
        Ok(summary)
    }

    /// Current bearer, refreshed when expired.
    async fn bearer(&self) -> Result<String> {
        self.tokens.access_token().await?.ok_or_else(|| AuthError::NotAuthenticated.into())
    }

    async fn push_waiting(&self, order: &Order, summary: &mut SweepSummary) -> Result<()> {
        let mut record = order.sync.unwrap_or_default();
        let lang = self.resolve_language(&order.customer).await?;
        let payload = build_order_payload(order, &lang, self.settings.placeholder_image_url.as_deref());

        if !payload.has_products() {
            record.mark_ignored()?;
            self.orders.save_sync_record(order.id, &record).await?;
            info!(order_id = order.id, "order has no products; ignored");
            summary.ignored += 1;
            return Ok(());
        }

        let token = self.bearer().await?;
        match self.api.send_order_data(&token, &payload).await {
            Ok(true) => {
                record.mark_sent(self.clock.now())?;
                self.orders.save_sync_record(order.id, &record).await?;
                debug!(order_id = order.id, "order sent");
                summary.sent += 1;
            }
            Ok(false) => {
                error!(context = LOG_CONTEXT, order_id = order.id, error_kind = "rejected", "dashboard rejected order data");
                summary.failed += 1;
            }
            Err(err) => {
                error!(context = LOG_CONTEXT, order_id = order.id, error_kind = err.label(), retryable = err.is_retryable(), error = %err, "failed to send order data");
                summary.failed += 1;
            }
        }
        Ok(())
    }

    /// Returns whether the order moved to `Valid`. API failures are logged
    /// and leave the record untouched.
    async fn complete_order(&self, order_id: OrderId, mut record: OrderSyncRecord) -> Result<bool> {
        let token = self.bearer().await?;
        match self.api.send_update_status(&token, order_id).await {
            Ok(true) => {
                record.mark_valid(self.clock.now())?;
                self.orders.save_sync_record(order_id, &record).await?;
                debug!(order_id, "order validated");
                Ok(true)
            }
            Ok(false) => {
                error!(context = LOG_CONTEXT, order_id, error_kind = "rejected", "dashboard rejected status update");
                Ok(false)
            }
            Err(err) => {
                error!(context = LOG_CONTEXT, order_id, error_kind = err.label(), retryable = err.is_retryable(), error = %err, "failed to send status update");
                Ok(false)
            }
        }
    }

    /// Stored checkout language, else the account locale prefix.
    async fn resolve_language(&self, customer: &Customer) -> Result<String> {
        if let Some(lang) = self.orders.customer_language(customer.id).await?.filter(|l| !l.is_empty()) {
            return Ok(lang);
        }
        let locale = self.orders.customer_locale(customer.id).await?;
        Ok(locale.as_deref().and_then(language_prefix).unwrap_or_default())
    }
}

#[async_trait]
impl OrderEventHandler for OrderSyncEngine {
    async fn on_order_created(&self, order_id: OrderId) -> Result<()> {
        OrderSyncEngine::on_order_created(self, order_id).await
    }

    async fn on_order_completed(&self, order_id: OrderId) -> Result<()> {
        OrderSyncEngine::on_order_completed(self, order_id).await
    }

    async fn on_checkout_review(&self, customer_id: u64, accept_language: &str) -> Result<()> {
        self.capture_language(customer_id, accept_language).await
    }
}

#[async_trait]
impl ScheduledSweep for OrderSyncEngine {
    async fn run_sweep(&self) -> Result<SweepOutcome> {
        self.reconcile().await
    }
}
