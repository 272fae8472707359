use anyhow::Result;
use sqlx::{Row, SqlitePool};

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply_schema(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Create the catalog tables on an open pool. Safe to run repeatedly.
pub async fn apply_schema(pool: &SqlitePool) -> Result<()> {
    // One row per movie or series. (media_type, tmdb_id) is the de-duplication key.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS media (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            search_name TEXT,
            year INTEGER,
            media_type TEXT NOT NULL,
            tmdb_id INTEGER NOT NULL,
            file_id TEXT,
            file_path TEXT,
            caption TEXT,
            poster_url TEXT,
            created_at INTEGER NOT NULL,
            UNIQUE(media_type, tmdb_id)
        )
        "#,
    )
    .execute(pool)
    .await?;
    ensure_search_name(pool).await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS episodes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            media_id INTEGER NOT NULL,
            season_number INTEGER NOT NULL,
            episode_number INTEGER NOT NULL,
            title TEXT,
            file_id TEXT,
            file_path TEXT,
            created_at INTEGER NOT NULL,
            FOREIGN KEY (media_id) REFERENCES media(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_episodes_media ON episodes(media_id, season_number, episode_number)",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_media_created_at ON media(created_at DESC)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Add and fill `media.search_name`, the lowercased title used for search.
///
/// SQLite's `LIKE` only folds ASCII, so titles are folded in Rust on write
/// and matched against this column. Databases created before the column
/// existed get it added and backfilled here.
async fn ensure_search_name(pool: &SqlitePool) -> Result<()> {
    let columns = sqlx::query("PRAGMA table_info(media)").fetch_all(pool).await?;
    let mut present = false;
    for row in &columns {
        let name: String = row.try_get("name")?;
        if name == "search_name" {
            present = true;
        }
    }
    if !present {
        sqlx::query("ALTER TABLE media ADD COLUMN search_name TEXT")
            .execute(pool)
            .await?;
    }

    let stale = sqlx::query("SELECT id, title FROM media WHERE search_name IS NULL")
        .fetch_all(pool)
        .await?;
    for row in &stale {
        let id: i64 = row.try_get("id")?;
        let title: String = row.try_get("title")?;
        sqlx::query("UPDATE media SET search_name = ? WHERE id = ?")
            .bind(title.to_lowercase())
            .bind(id)
            .execute(pool)
            .await?;
    }

    Ok(())
}
