//! Port interface for durable key/value options

use async_trait::async_trait;
use recreviews_domain::Result;

/// Process-wide option storage that survives restarts.
///
/// Each call is a single atomic write to the backing store.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Read an option, `None` when absent
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Create or overwrite an option
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove an option; removing a missing key is not an error
    async fn delete(&self, key: &str) -> Result<()>;

    /// Write `value` only when `key` is absent. Returns whether it was written
    async fn insert_if_absent(&self, key: &str, value: &str) -> Result<bool>;
}
