//! SQLite-backed option storage.
//!
//! Implements [`ConfigStore`] over the `options` table. All database
//! operations run in `spawn_blocking` to avoid blocking the async runtime.

use std::sync::Arc;

use async_trait::async_trait;
use recreviews_core::ConfigStore;
use recreviews_domain::Result;
use rusqlite::{params, OptionalExtension};
use tokio::task;

use super::manager::{map_join_error, map_sql_error, DbManager, SqliteConnection};

pub struct SqliteConfigStore {
    db: Arc<DbManager>,
}

impl SqliteConfigStore {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
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
impl ConfigStore for SqliteConfigStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();
        self.with_connection(move |conn| query_option(conn, &key)).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let key = key.to_string();
        let value = value.to_string();
        self.with_connection(move |conn| upsert_option(conn, &key, &value)).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let key = key.to_string();
        self.with_connection(move |conn| {
            conn.execute("DELETE FROM options WHERE name = ?1", params![key])
                .map_err(map_sql_error)?;
            Ok(())
        })
        .await
    }

    async fn insert_if_absent(&self, key: &str, value: &str) -> Result<bool> {
        let key = key.to_string();
        let value = value.to_string();
        self.with_connection(move |conn| {
            let inserted = conn
                .execute(
                    "INSERT OR IGNORE INTO options (name, value) VALUES (?1, ?2)",
                    params![key, value],
                )
                .map_err(map_sql_error)?;
            Ok(inserted == 1)
        })
        .await
    }
}

// ============================================================================
// Synchronous SQL Operations (called inside spawn_blocking)
// ============================================================================

fn query_option(conn: &SqliteConnection, key: &str) -> Result<Option<String>> {
    conn.query_row("SELECT value FROM options WHERE name = ?1", params![key], |row| row.get(0))
        .optional()
        .map_err(map_sql_error)
}

fn upsert_option(conn: &SqliteConnection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO options (name, value) VALUES (?1, ?2)
         ON CONFLICT(name) DO UPDATE SET value = excluded.value",
        params![key, value],
    )
    .map_err(map_sql_error)?;
    Ok(())
}
