//! Persisted guard keeping reconciliation sweeps from overlapping
//!
//! The lock is an option whose value is its expiry in unix seconds. A lock
//! left behind by a crashed sweep is reclaimed once that expiry passes. A
//! running sweep renews its lease before each order so a long sweep is never
//! mistaken for a crashed one.

use std::sync::Arc;

use chrono::Duration;
use recreviews_common::time::Clock;
use recreviews_domain::constants::OPTION_SYNC_LOCK;
use recreviews_domain::Result;
use tracing::{debug, warn};

use crate::config_store_ports::ConfigStore;

pub struct SweepGuard {
    config: Arc<dyn ConfigStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl SweepGuard {
    pub fn new(config: Arc<dyn ConfigStore>, clock: Arc<dyn Clock>, ttl_secs: u64) -> Self {
        let ttl = Duration::seconds(i64::try_from(ttl_secs).unwrap_or(i64::MAX / 1_000));
        Self { config, clock, ttl }
    }

    /// Take the lock, `None` while another sweep holds it.
    pub async fn acquire(&self) -> Result<Option<SweepLease>> {
        let expiry = (self.clock.now() + self.ttl).timestamp().to_string();

        if self.config.insert_if_absent(OPTION_SYNC_LOCK, &expiry).await? {
            return Ok(Some(self.lease(expiry)));
        }

        let held = self.config.get(OPTION_SYNC_LOCK).await?;
        let stale = match held.as_deref().map(str::parse::<i64>) {
            Some(Ok(held_until)) => held_until <= self.clock.unix_seconds(),
            Some(Err(_)) => true,
            // Released between the insert and the read
            None => true,
        };

        if !stale {
            debug!("sweep lock held by another run");
            return Ok(None);
        }

        warn!(held_until = ?held, "reclaiming stale sweep lock");
        self.config.delete(OPTION_SYNC_LOCK).await?;
        if self.config.insert_if_absent(OPTION_SYNC_LOCK, &expiry).await? {
            Ok(Some(self.lease(expiry)))
        } else {
            Ok(None)
        }
    }

    fn lease(&self, value: String) -> SweepLease {
        SweepLease {
            config: Arc::clone(&self.config),
            clock: Arc::clone(&self.clock),
            ttl: self.ttl,
            value,
        }
    }
}

/// Held sweep lock. Call [`SweepLease::release`] when the sweep ends.
pub struct SweepLease {
    config: Arc<dyn ConfigStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    value: String,
}

impl SweepLease {
    /// Push the expiry a full TTL past now.
    ///
    /// Returns `false` when the stored lock no longer carries this lease's
    /// value, meaning another run reclaimed it. The caller must stop.
    pub async fn renew(&mut self) -> Result<bool> {
        let current = self.config.get(OPTION_SYNC_LOCK).await?;
        if current.as_deref() != Some(self.value.as_str()) {
            warn!(held_until = ?current, "sweep lock lost to another run");
            return Ok(false);
        }

        let expiry = (self.clock.now() + self.ttl).timestamp().to_string();
        if expiry != self.value {
            self.config.set(OPTION_SYNC_LOCK, &expiry).await?;
            self.value = expiry;
        }
        Ok(true)
    }

    /// Remove the lock unless another run already reclaimed it.
    pub async fn release(self) -> Result<()> {
        match self.config.get(OPTION_SYNC_LOCK).await? {
            Some(current) if current == self.value => self.config.delete(OPTION_SYNC_LOCK).await,
            _ => {
                warn!("sweep lock was reclaimed before release");
                Ok(())
            }
        }
    }
}
