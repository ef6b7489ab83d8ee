//! SQLite-backed host order storage.
//!
//! Orders, their lines and customers are written by the host shop; this
//! repository reads them and owns the sync meta group plus the checkout
//! language of customers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use recreviews_common::time::from_unix_seconds;
use recreviews_core::OrderStore;
use recreviews_domain::constants::{
    META_IGNORE, META_SENT_TIMESTAMP, META_STATE, META_USER_LANG, META_VALID_TIMESTAMP,
};
use recreviews_domain::{
    Customer, Order, OrderFilter, OrderId, OrderLine, OrderSyncRecord, RecReviewsError, Result,
    SyncState,
};
use rusqlite::{params, OptionalExtension, Row};
use tokio::task;
use tracing::warn;

use super::manager::{map_join_error, map_sql_error, DbManager, SqliteConnection};

const ORDER_COLUMNS: &str =
    "o.id, o.created_at, o.status, o.currency, o.customer_id, o.first_name, o.last_name, o.email, o.phone";

pub struct SqliteOrderStore {
    db: Arc<DbManager>,
    site_locale: String,
}

impl SqliteOrderStore {
    /// `site_locale` answers [`OrderStore::customer_locale`] for customers
    /// without an account locale.
    pub fn new(db: Arc<DbManager>, site_locale: impl Into<String>) -> Self {
        Self { db, site_locale: site_locale.into() }
    }

    /// Store an order the way the host shop does. The sync record is written
    /// too when present.
    pub async fn insert_order(&self, order: &Order) -> Result<()> {
        let order = order.clone();
        self.with_connection(move |conn| {
            let tx = conn.unchecked_transaction().map_err(map_sql_error)?;
            tx.execute(
                "INSERT INTO orders (id, created_at, status, currency, customer_id, first_name, last_name, email, phone)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(id) DO UPDATE SET
                    created_at = excluded.created_at, status = excluded.status,
                    currency = excluded.currency, customer_id = excluded.customer_id,
                    first_name = excluded.first_name, last_name = excluded.last_name,
                    email = excluded.email, phone = excluded.phone",
                params![
                    to_sql_id(order.id)?,
                    order.created_at.timestamp(),
                    order.status,
                    order.currency,
                    to_sql_id(order.customer.id)?,
                    order.customer.first_name,
                    order.customer.last_name,
                    order.customer.email,
                    order.customer.phone,
                ],
            )
            .map_err(map_sql_error)?;

            tx.execute("DELETE FROM order_lines WHERE order_id = ?1", params![to_sql_id(order.id)?])
                .map_err(map_sql_error)?;
            for line in &order.lines {
                tx.execute(
                    "INSERT INTO order_lines (order_id, product_id, name, image_url, price)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        to_sql_id(order.id)?,
                        to_sql_id(line.product_id)?,
                        line.name,
                        line.image_url,
                        line.price
                    ],
                )
                .map_err(map_sql_error)?;
            }

            if let Some(record) = &order.sync {
                write_sync_meta(&tx, order.id, record)?;
            }
            tx.commit().map_err(map_sql_error)
        })
        .await
    }

    /// Change the host status of an order.
    pub async fn set_status(&self, id: OrderId, status: &str) -> Result<()> {
        let status = status.to_string();
        self.with_connection(move |conn| {
            let updated = conn
                .execute("UPDATE orders SET status = ?1 WHERE id = ?2", params![status, to_sql_id(id)?])
                .map_err(map_sql_error)?;
            if updated == 0 {
                return Err(RecReviewsError::NotFound(format!("order {id}")));
            }
            Ok(())
        })
        .await
    }

    /// Create or update a customer account locale.
    pub async fn upsert_customer(&self, customer_id: u64, locale: Option<&str>) -> Result<()> {
        let locale = locale.map(str::to_string);
        self.with_connection(move |conn| {
            conn.execute(
                "INSERT INTO customers (id, locale) VALUES (?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET locale = excluded.locale",
                params![to_sql_id(customer_id)?, locale],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
    }

    async fn with_connection<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&SqliteConnection) -> Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            op(&conn)
        })
        .await
        .map_err(map_join_error)?
    }
}

#[async_trait]
impl OrderStore for SqliteOrderStore {
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        self.with_connection(move |conn| {
            let sql = format!("SELECT {ORDER_COLUMNS} FROM orders o WHERE o.id = ?1");
            let Some(mut order) = conn
                .query_row(&sql, params![to_sql_id(id)?], map_order_row)
                .optional()
                .map_err(map_sql_error)?
            else {
                return Ok(None);
            };
            order.lines = query_lines(conn, id)?;
            order.sync = query_sync_record(conn, id)?;
            Ok(Some(order))
        })
        .await
    }

    async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<Order>> {
        self.with_connection(move |conn| {
            let mut sql = format!(
                "SELECT {ORDER_COLUMNS} FROM orders o
                 JOIN order_meta s ON s.order_id = o.id AND s.meta_key = ?1 AND s.meta_value = ?2"
            );
            if filter.exclude_ignored {
                sql.push_str(
                    " LEFT JOIN order_meta i ON i.order_id = o.id AND i.meta_key = ?3
                      WHERE COALESCE(i.meta_value, '0') != '1'",
                );
            }
            sql.push_str(" ORDER BY o.id ASC");

            let state = filter.state.as_meta().to_string();
            let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;
            let rows = if filter.exclude_ignored {
                stmt.query_map(params![META_STATE, state, META_IGNORE], map_order_row)
            } else {
                stmt.query_map(params![META_STATE, state], map_order_row)
            }
            .map_err(map_sql_error)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(map_sql_error)?;

            let mut orders = Vec::with_capacity(rows.len());
            for mut order in rows {
                order.lines = query_lines(conn, order.id)?;
                order.sync = query_sync_record(conn, order.id)?;
                orders.push(order);
            }
            Ok(orders)
        })
        .await
    }

    async fn save_sync_record(&self, id: OrderId, record: &OrderSyncRecord) -> Result<()> {
        let record = *record;
        self.with_connection(move |conn| {
            let tx = conn.unchecked_transaction().map_err(map_sql_error)?;
            write_sync_meta(&tx, id, &record)?;
            tx.commit().map_err(map_sql_error)
        })
        .await
    }

    async fn customer_locale(&self, customer_id: u64) -> Result<Option<String>> {
        let site_locale = self.site_locale.clone();
        self.with_connection(move |conn| {
            let locale: Option<String> = conn
                .query_row(
                    "SELECT locale FROM customers WHERE id = ?1",
                    params![to_sql_id(customer_id)?],
                    |row| row.get(0),
                )
                .optional()
                .map_err(map_sql_error)?
                .flatten();

            Ok(locale
                .filter(|value| !value.is_empty())
                .or_else(|| (!site_locale.is_empty()).then_some(site_locale)))
        })
        .await
    }

    async fn customer_language(&self, customer_id: u64) -> Result<Option<String>> {
        self.with_connection(move |conn| {
            conn.query_row(
                "SELECT meta_value FROM customer_meta WHERE customer_id = ?1 AND meta_key = ?2",
                params![to_sql_id(customer_id)?, META_USER_LANG],
                |row| row.get(0),
            )
            .optional()
            .map_err(map_sql_error)
        })
        .await
    }

    async fn set_customer_language(&self, customer_id: u64, lang: &str) -> Result<()> {
        let lang = lang.to_string();
        self.with_connection(move |conn| {
            conn.execute(
                "INSERT INTO customer_meta (customer_id, meta_key, meta_value) VALUES (?1, ?2, ?3)
                 ON CONFLICT(customer_id, meta_key) DO UPDATE SET meta_value = excluded.meta_value",
                params![to_sql_id(customer_id)?, META_USER_LANG, lang],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
    }
}

// ============================================================================
// Synchronous SQL Operations (called inside spawn_blocking)
// ============================================================================

fn to_sql_id(id: u64) -> Result<i64> {
    i64::try_from(id).map_err(|_| RecReviewsError::Storage(format!("id {id} out of range")))
}

fn map_order_row(row: &Row<'_>) -> rusqlite::Result<Order> {
    let id: i64 = row.get(0)?;
    let created_at: i64 = row.get(1)?;
    let customer_id: i64 = row.get(4)?;

    let created_at = from_unix_seconds(created_at).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            rusqlite::types::Type::Integer,
            format!("invalid order timestamp {created_at}").into(),
        )
    })?;

    Ok(Order {
        id: id.max(0) as u64,
        created_at,
        status: row.get(2)?,
        currency: row.get(3)?,
        customer: Customer {
            id: customer_id.max(0) as u64,
            first_name: row.get(5)?,
            last_name: row.get(6)?,
            email: row.get(7)?,
            phone: row.get(8)?,
        },
        lines: Vec::new(),
        sync: None,
    })
}

fn query_lines(conn: &SqliteConnection, order_id: OrderId) -> Result<Vec<OrderLine>> {
    let mut stmt = conn
        .prepare(
            "SELECT product_id, name, image_url, price FROM order_lines
             WHERE order_id = ?1 ORDER BY id ASC",
        )
        .map_err(map_sql_error)?;
    let rows = stmt
        .query_map(params![to_sql_id(order_id)?], |row| {
            let product_id: i64 = row.get(0)?;
            Ok(OrderLine {
                product_id: product_id.max(0) as u64,
                name: row.get(1)?,
                image_url: row.get(2)?,
                price: row.get(3)?,
            })
        })
        .map_err(map_sql_error)?;

    rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_sql_error)
}

/// Orders without a state meta have no sync record.
fn query_sync_record(conn: &SqliteConnection, order_id: OrderId) -> Result<Option<OrderSyncRecord>> {
    let mut stmt = conn
        .prepare("SELECT meta_key, meta_value FROM order_meta WHERE order_id = ?1")
        .map_err(map_sql_error)?;
    let meta: HashMap<String, String> = stmt
        .query_map(params![to_sql_id(order_id)?], |row| Ok((row.get(0)?, row.get(1)?)))
        .map_err(map_sql_error)?
        .collect::<rusqlite::Result<_>>()
        .map_err(map_sql_error)?;

    let Some(raw_state) = meta.get(META_STATE) else {
        return Ok(None);
    };
    let state = raw_state
        .parse::<u8>()
        .map_err(|_| RecReviewsError::Serialization(format!("invalid sync state {raw_state}")))
        .and_then(SyncState::from_meta)?;

    Ok(Some(OrderSyncRecord {
        state,
        ignore: meta.get(META_IGNORE).is_some_and(|value| value == "1"),
        sent_at: parse_timestamp(order_id, meta.get(META_SENT_TIMESTAMP)),
        valid_at: parse_timestamp(order_id, meta.get(META_VALID_TIMESTAMP)),
    }))
}

fn parse_timestamp(order_id: OrderId, raw: Option<&String>) -> Option<chrono::DateTime<chrono::Utc>> {
    let raw = raw?;
    let parsed = raw.parse::<i64>().ok().and_then(from_unix_seconds);
    if parsed.is_none() {
        warn!(order_id, value = %raw, "ignoring unparsable sync timestamp");
    }
    parsed
}

fn write_sync_meta(conn: &rusqlite::Connection, order_id: OrderId, record: &OrderSyncRecord) -> Result<()> {
    let id = to_sql_id(order_id)?;
    let upsert = |key: &str, value: String| -> Result<()> {
        conn.execute(
            "INSERT INTO order_meta (order_id, meta_key, meta_value) VALUES (?1, ?2, ?3)
             ON CONFLICT(order_id, meta_key) DO UPDATE SET meta_value = excluded.meta_value",
            params![id, key, value],
        )
        .map_err(map_sql_error)?;
        Ok(())
    };
    let remove = |key: &str| -> Result<()> {
        conn.execute(
            "DELETE FROM order_meta WHERE order_id = ?1 AND meta_key = ?2",
            params![id, key],
        )
        .map_err(map_sql_error)?;
        Ok(())
    };

    upsert(META_STATE, record.state.as_meta().to_string())?;
    upsert(META_IGNORE, if record.ignore { "1" } else { "0" }.to_string())?;
    match record.sent_at {
        Some(at) => upsert(META_SENT_TIMESTAMP, at.timestamp().to_string())?,
        None => remove(META_SENT_TIMESTAMP)?,
    }
    match record.valid_at {
        Some(at) => upsert(META_VALID_TIMESTAMP, at.timestamp().to_string())?,
        None => remove(META_VALID_TIMESTAMP)?,
    }
    Ok(())
}
