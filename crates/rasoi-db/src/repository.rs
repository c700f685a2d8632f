use directories::ProjectDirs;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite, SqlitePool};
use std::path::PathBuf;

use rasoi_core::DraftFields;

use crate::error::{DbError, Result};
use crate::schema::SCHEMA;

const DRAFT_KEY: &str = "onboarding_draft";
const REMEMBERED_PHONE_KEY: &str = "remembered_phone";
const THEME_KEY: &str = "theme";

/// Durable per-device key-value store backing the onboarding draft and a
/// couple of scalar flags. Single-actor access; every write is one atomic
/// upsert, so an interrupted save leaves the previous value intact.
pub struct RasoiDb {
    pool: Pool<Sqlite>,
}

impl RasoiDb {
    pub async fn new() -> Result<Self> {
        let db_path = Self::get_db_path()?;

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());
        let pool = SqlitePool::connect(&db_url).await?;

        sqlx::raw_sql(SCHEMA).execute(&pool).await?;

        tracing::info!("Local store initialized at: {}", db_path.display());

        Ok(Self { pool })
    }

    pub async fn new_with_path(path: &str) -> Result<Self> {
        let db_url = format!("sqlite:{}?mode=rwc", path);
        let pool = SqlitePool::connect(&db_url).await?;
        sqlx::raw_sql(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    /// Single-connection in-memory store for tests.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        sqlx::raw_sql(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn get_db_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("pk", "rasoi", "partner").ok_or(DbError::NoDataDir)?;
        Ok(dirs.data_dir().join("partner.db"))
    }

    pub async fn get_string(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(value,)| value))
    }

    pub async fn set_string(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO kv (key, value, updated_at) VALUES (?, ?, strftime('%s', 'now'))
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn remove_key(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Missing or unreadable blob comes back as an empty draft; a corrupted
    /// store must not strand the signup flow.
    pub async fn load_draft(&self) -> Result<DraftFields> {
        let Some(raw) = self.get_string(DRAFT_KEY).await? else {
            return Ok(DraftFields::default());
        };

        match serde_json::from_str(&raw) {
            Ok(draft) => Ok(draft),
            Err(e) => {
                tracing::warn!(error = %e, "Stored draft is unreadable, starting from an empty one");
                Ok(DraftFields::default())
            }
        }
    }

    pub async fn save_draft(&self, draft: &DraftFields) -> Result<()> {
        let raw = serde_json::to_string(draft)?;
        self.set_string(DRAFT_KEY, &raw).await
    }

    /// Read-merge-write in isolation; returns the merged draft.
    pub async fn merge_draft(&self, partial: &DraftFields) -> Result<DraftFields> {
        let merged = self.load_draft().await?.merged_with(partial);
        self.save_draft(&merged).await?;
        Ok(merged)
    }

    pub async fn clear_draft(&self) -> Result<()> {
        self.remove_key(DRAFT_KEY).await
    }

    pub async fn remembered_phone(&self) -> Result<Option<String>> {
        self.get_string(REMEMBERED_PHONE_KEY).await
    }

    pub async fn set_remembered_phone(&self, phone: &str) -> Result<()> {
        self.set_string(REMEMBERED_PHONE_KEY, phone).await
    }

    pub async fn clear_remembered_phone(&self) -> Result<()> {
        self.remove_key(REMEMBERED_PHONE_KEY).await
    }

    pub async fn theme(&self) -> Result<Option<String>> {
        self.get_string(THEME_KEY).await
    }

    pub async fn set_theme(&self, theme: &str) -> Result<()> {
        self.set_string(THEME_KEY, theme).await
    }
}
