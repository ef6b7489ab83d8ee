//! In-memory implementations of the storage ports

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use recreviews_core::{ConfigStore, OrderStore};
use recreviews_domain::{Order, OrderFilter, OrderId, OrderSyncRecord, Result};

/// Options map shared by the token store, the OAuth flow and the sweep lock.
#[derive(Default)]
pub struct InMemoryConfigStore {
    options: Mutex<HashMap<String, String>>,
}

impl InMemoryConfigStore {
    pub fn seed(&self, key: &str, value: &str) {
        self.options.lock().unwrap().insert(key.to_string(), value.to_string());
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.options.lock().unwrap().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.options.lock().unwrap().contains_key(key)
    }
}

#[async_trait]
impl ConfigStore for InMemoryConfigStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.seed(key, value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.options.lock().unwrap().remove(key);
        Ok(())
    }

    async fn insert_if_absent(&self, key: &str, value: &str) -> Result<bool> {
        let mut options = self.options.lock().unwrap();
        if options.contains_key(key) {
            return Ok(false);
        }
        options.insert(key.to_string(), value.to_string());
        Ok(true)
    }
}

/// Orders keyed by id, plus per-customer locale and language.
#[derive(Default)]
pub struct InMemoryOrderStore {
    orders: Mutex<BTreeMap<OrderId, Order>>,
    locales: Mutex<HashMap<u64, String>>,
    languages: Mutex<HashMap<u64, String>>,
    saves: Mutex<Vec<OrderId>>,
}

impl InMemoryOrderStore {
    pub fn insert(&self, order: Order) {
        self.orders.lock().unwrap().insert(order.id, order);
    }

    pub fn set_status(&self, id: OrderId, status: &str) {
        if let Some(order) = self.orders.lock().unwrap().get_mut(&id) {
            order.status = status.to_string();
        }
    }

    pub fn record(&self, id: OrderId) -> Option<OrderSyncRecord> {
        self.orders.lock().unwrap().get(&id).and_then(|order| order.sync)
    }

    pub fn set_locale(&self, customer_id: u64, locale: &str) {
        self.locales.lock().unwrap().insert(customer_id, locale.to_string());
    }

    pub fn language(&self, customer_id: u64) -> Option<String> {
        self.languages.lock().unwrap().get(&customer_id).cloned()
    }

    /// Order ids in the order their sync record was written.
    pub fn saves(&self) -> Vec<OrderId> {
        self.saves.lock().unwrap().clone()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.lock().unwrap().get(&id).cloned())
    }

    async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<Order>> {
        Ok(self
            .orders
            .lock()
            .unwrap()
            .values()
            .filter(|order| order.sync.as_ref().is_some_and(|record| filter.matches(record)))
            .cloned()
            .collect())
    }

    async fn save_sync_record(&self, id: OrderId, record: &OrderSyncRecord) -> Result<()> {
        if let Some(order) = self.orders.lock().unwrap().get_mut(&id) {
            order.sync = Some(*record);
        }
        self.saves.lock().unwrap().push(id);
        Ok(())
    }

    async fn customer_locale(&self, customer_id: u64) -> Result<Option<String>> {
        Ok(self.locales.lock().unwrap().get(&customer_id).cloned())
    }

    async fn customer_language(&self, customer_id: u64) -> Result<Option<String>> {
        Ok(self.language(customer_id))
    }

    async fn set_customer_language(&self, customer_id: u64, lang: &str) -> Result<()> {
        self.languages.lock().unwrap().insert(customer_id, lang.to_string());
        Ok(())
    }
}
