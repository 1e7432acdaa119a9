use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqlitePoolOptions, Pool, Row, Sqlite};
use std::path::Path;
use std::time::Duration;
use synapse_core::lexicon;

use crate::cache::DistributedCache;
use crate::signifiers::{Signifier, SignifierStore};

/// SQLite persistence: signifier history plus the key/value table backing
/// the distributed activation cache.
#[derive(Clone)]
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    pub async fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_url = format!("sqlite://{}?mode=rwc", db_path.as_ref().display());
        let pool = SqlitePoolOptions::new()
            .connect(&db_url)
            .await
            .context("Failed to connect to SQLite database")?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Private in-memory database. A single connection, since every new
    /// connection would otherwise open its own empty database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory SQLite database")?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS signifiers (
                user_id TEXT NOT NULL,
                word TEXT NOT NULL,
                frequency INTEGER NOT NULL DEFAULT 1,
                contexts TEXT NOT NULL DEFAULT '[]',
                first_seen INTEGER NOT NULL,
                last_seen INTEGER NOT NULL,
                last_interpellated INTEGER,
                PRIMARY KEY (user_id, word)
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create signifiers table")?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_signifiers_frequency ON signifiers(user_id, frequency)",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create signifiers frequency index")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS activation_cache (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                expires_at INTEGER NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create activation_cache table")?;

        Ok(())
    }

    /// Delete expired cache rows. Returns how many were removed.
    pub async fn purge_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM activation_cache WHERE expires_at <= ?")
            .bind(Utc::now().timestamp_millis())
            .execute(&self.pool)
            .await
            .context("Failed to purge expired cache entries")?;
        Ok(result.rows_affected())
    }

    fn row_to_signifier(row: &sqlx::sqlite::SqliteRow) -> Result<Signifier> {
        let word: String = row.get("word");
        let contexts: String = row.get("contexts");
        let contexts: Vec<String> =
            serde_json::from_str(&contexts).context("Corrupt signifier contexts")?;
        let frequency: i64 = row.get("frequency");
        Ok(Signifier {
            emotional_charge: lexicon::emotional_charge(&word),
            frequency: u32::try_from(frequency).unwrap_or(u32::MAX),
            contexts,
            first_seen: from_timestamp(row.get("first_seen")),
            last_seen: from_timestamp(row.get("last_seen")),
            last_interpellated: row
                .get::<Option<i64>, _>("last_interpellated")
                .map(from_timestamp),
            word,
        })
    }
}

fn from_timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

// =============================================================================
// Signifier persistence
// =============================================================================

#[async_trait]
impl SignifierStore for SqliteStore {
    async fn upsert(&self, user: &str, word: &str, context: &str, at: DateTime<Utc>) -> Result<()> {
        let now = at.timestamp();
        sqlx::query(
            r#"
            INSERT INTO signifiers (user_id, word, frequency, contexts, first_seen, last_seen)
            VALUES (?, ?, 1, json_array(?), ?, ?)
            ON CONFLICT(user_id, word) DO UPDATE SET
                frequency = signifiers.frequency + 1,
                contexts = json_insert(signifiers.contexts, '$[#]', ?),
                last_seen = MAX(signifiers.last_seen, excluded.last_seen)
            "#,
        )
        .bind(user)
        .bind(word)
        .bind(context)
        .bind(now)
        .bind(now)
        .bind(context)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to upsert signifier '{}'", word))?;
        Ok(())
    }

    async fn top(&self, user: &str, min_frequency: u32, limit: usize) -> Result<Vec<Signifier>> {
        let rows = sqlx::query(
            "SELECT word, frequency, contexts, first_seen, last_seen, last_interpellated \
             FROM signifiers WHERE user_id = ? AND frequency >= ? \
             ORDER BY frequency DESC, word ASC LIMIT ?",
        )
        .bind(user)
        .bind(i64::from(min_frequency))
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .context("Failed to load key signifiers")?;

        rows.iter().map(Self::row_to_signifier).collect()
    }

    async fn lookup(&self, user: &str, word: &str) -> Result<Option<Signifier>> {
        let row = sqlx::query(
            "SELECT word, frequency, contexts, first_seen, last_seen, last_interpellated \
             FROM signifiers WHERE user_id = ? AND word = ?",
        )
        .bind(user)
        .bind(word)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to look up signifier")?;

        row.as_ref().map(Self::row_to_signifier).transpose()
    }

    async fn mark_interpellated(&self, user: &str, word: &str, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE signifiers SET last_interpellated = ? WHERE user_id = ? AND word = ?")
            .bind(at.timestamp())
            .bind(user)
            .bind(word)
            .execute(&self.pool)
            .await
            .context("Failed to mark signifier as interpellated")?;
        Ok(())
    }
}

// =============================================================================
// Distributed activation cache
// =============================================================================

#[async_trait]
impl DistributedCache for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM activation_cache WHERE key = ? AND expires_at > ?")
            .bind(key)
            .bind(Utc::now().timestamp_millis())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to read activation cache")?;
        Ok(row.map(|r| r.get("value")))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let expires_at = Utc::now().timestamp_millis().saturating_add(ttl_ms);
        sqlx::query(
            "INSERT INTO activation_cache (key, value, expires_at) VALUES (?, ?, ?) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at",
        )
        .bind(key)
        .bind(value)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .context("Failed to write activation cache")?;
        Ok(())
    }
}
