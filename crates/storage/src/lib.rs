use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use order_core::OrderStateStore;
use shared::domain::{CartLine, OrderReceipt};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use tracing::warn;

/// Storage key for the JSON-encoded current cart.
pub const CART_KEY: &str = "cart";
/// Storage key for the order completion flag (`"true"` or absent).
pub const ORDER_COMPLETE_KEY: &str = "orderComplete";
/// Storage key for the stringified paid amount.
pub const PAID_AMOUNT_KEY: &str = "paidAmount";

/// String-keyed blob store over SQLite. This is the only component that
/// knows the persisted key names; everything above it goes through the
/// `OrderStateStore` contract.
#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        let storage = Self { pool };
        storage.ensure_blob_table().await?;
        Ok(storage)
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    async fn ensure_blob_table(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv_blobs (
                key        TEXT PRIMARY KEY,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("failed to ensure kv_blobs table exists")?;
        Ok(())
    }

    pub async fn get_blob(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM kv_blobs WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get::<String, _>(0)))
    }

    pub async fn put_blob(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO kv_blobs (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn delete_blob(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM kv_blobs WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl OrderStateStore for Storage {
    async fn load_cart(&self) -> Result<Vec<CartLine>> {
        let Some(raw) = self.get_blob(CART_KEY).await? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(lines) => Ok(lines),
            Err(err) => {
                // A malformed blob is treated as an absent cart, not an error.
                warn!("ignoring malformed persisted cart: {err}");
                Ok(Vec::new())
            }
        }
    }

    async fn save_cart(&self, lines: &[CartLine]) -> Result<()> {
        let blob = serde_json::to_string(lines).context("failed to encode cart")?;
        self.put_blob(CART_KEY, &blob).await
    }

    async fn clear_cart(&self) -> Result<()> {
        self.delete_blob(CART_KEY).await
    }

    async fn save_receipt(&self, receipt: OrderReceipt) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for (key, value) in [
            (ORDER_COMPLETE_KEY, "true".to_string()),
            (PAID_AMOUNT_KEY, receipt.amount.to_string()),
        ] {
            sqlx::query(
                "INSERT INTO kv_blobs (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
            )
            .bind(key)
            .bind(value)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn load_receipt(&self) -> Result<Option<OrderReceipt>> {
        if self.get_blob(ORDER_COMPLETE_KEY).await?.as_deref() != Some("true") {
            return Ok(None);
        }
        let Some(raw) = self.get_blob(PAID_AMOUNT_KEY).await? else {
            return Ok(None);
        };
        match raw.parse::<u64>() {
            Ok(amount) => Ok(Some(OrderReceipt { amount })),
            Err(err) => {
                warn!("ignoring malformed persisted paid amount '{raw}': {err}");
                Ok(None)
            }
        }
    }

    async fn clear_receipt(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for key in [ORDER_COMPLETE_KEY, PAID_AMOUNT_KEY] {
            sqlx::query("DELETE FROM kv_blobs WHERE key = ?")
                .bind(key)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
