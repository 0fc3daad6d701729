//! Client-side persistence: the handful of keys the web client kept in
//! browser local storage, backed by SQLite or held in memory.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tokio::sync::RwLock;
use tracing::warn;

use shared::domain::{PendingSignature, Signer, UserSettings};

pub const SETTINGS_KEY: &str = "contractiq_settings";
pub const PENDING_CONTRACT_KEY: &str = "pending_contract";
pub const PENDING_SIGNERS_KEY: &str = "pending_signers";

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>>;
    async fn set_item(&self, key: &str, value: &str) -> Result<()>;
    async fn remove_item(&self, key: &str) -> Result<()>;
}

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn get(&self) -> Result<Option<UserSettings>>;
    async fn set(&self, settings: &UserSettings) -> Result<()>;
    async fn clear(&self) -> Result<()>;
}

#[async_trait]
pub trait PendingSignatureStore: Send + Sync {
    async fn stage(&self, pending: &PendingSignature) -> Result<()>;
    async fn pending(&self) -> Result<Option<PendingSignature>>;
    async fn clear_pending(&self) -> Result<()>;
}

/// Everything the client persists locally.
pub trait LocalStore: SettingsRepository + PendingSignatureStore {}

impl<T> LocalStore for T where T: SettingsRepository + PendingSignatureStore {}

async fn get_json<T, S>(store: &S, key: &str) -> Result<Option<T>>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    let Some(raw) = store.get_item(key).await? else {
        return Ok(None);
    };
    let value = serde_json::from_str(&raw)
        .with_context(|| format!("stored value for '{key}' is not valid JSON"))?;
    Ok(Some(value))
}

async fn set_json<T, S>(store: &S, key: &str, value: &T) -> Result<()>
where
    T: Serialize + Sync,
    S: KeyValueStore + ?Sized,
{
    let raw = serde_json::to_string(value)
        .with_context(|| format!("failed to encode value for '{key}'"))?;
    store.set_item(key, &raw).await
}

#[async_trait]
impl<T> SettingsRepository for T
where
    T: KeyValueStore,
{
    async fn get(&self) -> Result<Option<UserSettings>> {
        get_json(self, SETTINGS_KEY).await
    }

    async fn set(&self, settings: &UserSettings) -> Result<()> {
        set_json(self, SETTINGS_KEY, settings).await
    }

    async fn clear(&self) -> Result<()> {
        self.remove_item(SETTINGS_KEY).await
    }
}

#[async_trait]
impl<T> PendingSignatureStore for T
where
    T: KeyValueStore,
{
    async fn stage(&self, pending: &PendingSignature) -> Result<()> {
        self.set_item(PENDING_CONTRACT_KEY, &pending.contract).await?;
        set_json(self, PENDING_SIGNERS_KEY, &pending.signers).await
    }

    async fn pending(&self) -> Result<Option<PendingSignature>> {
        let Some(contract) = self.get_item(PENDING_CONTRACT_KEY).await? else {
            return Ok(None);
        };
        let signers: Vec<Signer> = get_json(self, PENDING_SIGNERS_KEY).await?.unwrap_or_default();
        if contract.trim().is_empty() || signers.is_empty() {
            warn!(
                "storage: incomplete pending signature contract_len={} signers={}",
                contract.len(),
                signers.len()
            );
            return Ok(None);
        }
        Ok(Some(PendingSignature { contract, signers }))
    }

    async fn clear_pending(&self) -> Result<()> {
        self.remove_item(PENDING_CONTRACT_KEY).await?;
        self.remove_item(PENDING_SIGNERS_KEY).await
    }
}

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid sqlite url '{database_url}'"))?
            .create_if_missing(true);
        // Every pooled connection to `sqlite::memory:` would open its own database.
        let max_connections = if is_memory_url(database_url) { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options)
            .await?;

        let storage = Self { pool };
        storage.ensure_local_storage_table().await?;
        Ok(storage)
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    async fn ensure_local_storage_table(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS local_storage (
                key        TEXT PRIMARY KEY NOT NULL,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("failed to ensure local_storage table exists")?;
        Ok(())
    }

    pub async fn keys(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT key FROM local_storage ORDER BY key")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|row| row.try_get::<String, _>(0).map_err(Into::into))
            .collect()
    }
}

#[async_trait]
impl KeyValueStore for Storage {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM local_storage WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to read local storage key '{key}'"))?;
        Ok(row.map(|r| r.get::<String, _>(0)))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO local_storage (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to write local storage key '{key}'"))?;
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM local_storage WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to remove local storage key '{key}'"))?;
        Ok(())
    }
}

/// Volatile store for tests and `--no-persist` sessions.
#[derive(Default)]
pub struct MemoryStore {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.read().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        self.items.write().await.remove(key);
        Ok(())
    }
}

fn is_memory_url(database_url: &str) -> bool {
    database_url.starts_with("sqlite::memory:") || database_url.contains("mode=memory")
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
    if is_memory_url(database_url) || !database_url.starts_with("sqlite:") {
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
