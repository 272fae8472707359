//! SQLite-backed [`CatalogStore`] implementation.
//!
//! Maps each store operation onto the `media` and `episodes` tables created
//! by [`migrate::apply_schema`](crate::migrate::apply_schema).

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::error::{StoreError, StoreResult};
use crate::models::{CatalogStats, Episode, MediaKind, NewEpisode, NewTitle, Title};

use super::CatalogStore;

const TITLE_COLUMNS: &str =
    "id, title, year, media_type, tmdb_id, file_id, file_path, caption, poster_url, created_at";
const EPISODE_COLUMNS: &str =
    "id, media_id, season_number, episode_number, title, file_id, file_path, created_at";

/// SQLite implementation of the [`CatalogStore`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn title_from_row(row: &SqliteRow) -> StoreResult<Title> {
    let media_type: String = row.try_get("media_type")?;
    let kind: MediaKind = media_type
        .parse()
        .map_err(|e: anyhow::Error| sqlx::Error::Decode(e.into()))?;

    Ok(Title {
        id: row.try_get("id")?,
        name: row.try_get("title")?,
        year: row.try_get("year")?,
        kind,
        external_id: row.try_get("tmdb_id")?,
        file_id: row.try_get("file_id")?,
        file_path: row.try_get("file_path")?,
        caption: row
            .try_get::<Option<String>, _>("caption")?
            .unwrap_or_default(),
        poster_url: row
            .try_get::<Option<String>, _>("poster_url")?
            .unwrap_or_default(),
        created_at: row.try_get("created_at")?,
    })
}

fn episode_from_row(row: &SqliteRow) -> StoreResult<Episode> {
    Ok(Episode {
        id: row.try_get("id")?,
        title_id: row.try_get("media_id")?,
        season: row.try_get("season_number")?,
        episode: row.try_get("episode_number")?,
        name: row.try_get::<Option<String>, _>("title")?.unwrap_or_default(),
        file_id: row.try_get("file_id")?,
        file_path: row.try_get("file_path")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Escape `%`, `_` and the escape character itself for a `LIKE ... ESCAPE '\'` pattern.
fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl CatalogStore for SqliteStore {
    async fn add_title(&self, title: &NewTitle) -> StoreResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO media (title, search_name, year, media_type, tmdb_id, file_id,
                               file_path, caption, poster_url, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&title.name)
        .bind(title.name.to_lowercase())
        .bind(title.year)
        .bind(title.kind.as_str())
        .bind(title.external_id)
        .bind(&title.file_id)
        .bind(&title.file_path)
        .bind(&title.caption)
        .bind(&title.poster_url)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(done.last_insert_rowid()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(StoreError::Conflict {
                    kind: title.kind,
                    external_id: title.external_id,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn add_episode(&self, episode: &NewEpisode) -> StoreResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO episodes (media_id, season_number, episode_number, title,
                                  file_id, file_path, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(episode.title_id)
        .bind(episode.season)
        .bind(episode.episode)
        .bind(&episode.name)
        .bind(&episode.file_id)
        .bind(&episode.file_path)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(done.last_insert_rowid()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
                Err(StoreError::UnknownTitle {
                    title_id: episode.title_id,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn title_by_id(&self, id: i64) -> StoreResult<Option<Title>> {
        let row = sqlx::query(&format!("SELECT {} FROM media WHERE id = ?", TITLE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(title_from_row).transpose()
    }

    async fn title_by_external_id(
        &self,
        kind: MediaKind,
        external_id: i64,
    ) -> StoreResult<Option<Title>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM media WHERE media_type = ? AND tmdb_id = ?",
            TITLE_COLUMNS
        ))
        .bind(kind.as_str())
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(title_from_row).transpose()
    }

    async fn search_titles(&self, query: &str) -> StoreResult<Vec<Title>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM media
            WHERE search_name LIKE ? ESCAPE '\'
            ORDER BY created_at DESC, id DESC
            "#,
            TITLE_COLUMNS
        ))
        .bind(like_pattern(&query.to_lowercase()))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(title_from_row).collect()
    }

    async fn episodes_for_title(&self, title_id: i64) -> StoreResult<Vec<Episode>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM episodes
            WHERE media_id = ?
            ORDER BY season_number ASC, episode_number ASC, id ASC
            "#,
            EPISODE_COLUMNS
        ))
        .bind(title_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(episode_from_row).collect()
    }

    async fn episode_by_id(&self, id: i64) -> StoreResult<Option<Episode>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM episodes WHERE id = ?",
            EPISODE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(episode_from_row).transpose()
    }

    async fn delete_title(&self, id: i64) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;

        // Episodes first: they reference the title.
        sqlx::query("DELETE FROM episodes WHERE media_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let done = sqlx::query("DELETE FROM media WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(done.rows_affected() > 0)
    }

    async fn delete_all_titles(&self) -> StoreResult<u64> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM episodes")
            .execute(&mut *tx)
            .await?;
        let done = sqlx::query("DELETE FROM media").execute(&mut *tx).await?;

        tx.commit().await?;
        Ok(done.rows_affected())
    }

    async fn stats(&self) -> StoreResult<CatalogStats> {
        let titles: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM media")
            .fetch_one(&self.pool)
            .await?;
        let episodes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM episodes")
            .fetch_one(&self.pool)
            .await?;
        Ok(CatalogStats { titles, episodes })
    }
}
