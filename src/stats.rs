//! Catalog statistics for `catalog-bot stats`.
//!
//! Prints title and episode counts, the split between movies and series,
//! and the most recently added title, so an operator can check the bot is
//! indexing without opening Telegram.

use anyhow::Result;
use sqlx::Row;

use crate::config::Config;
use crate::db;
use crate::models::MediaKind;
use crate::store::{CatalogStore, SqliteStore};

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool.clone());
    let stats = store.stats().await?;

    let kind_rows = sqlx::query("SELECT media_type, COUNT(*) AS n FROM media GROUP BY media_type")
        .fetch_all(&pool)
        .await?;
    let mut movies = 0i64;
    let mut series = 0i64;
    for row in &kind_rows {
        let kind: String = row.get("media_type");
        let n: i64 = row.get("n");
        match kind.parse::<MediaKind>() {
            Ok(MediaKind::Movie) => movies += n,
            Ok(MediaKind::Series) => series += n,
            Err(_) => {}
        }
    }

    let latest = sqlx::query(
        "SELECT title, created_at FROM media ORDER BY created_at DESC, id DESC LIMIT 1",
    )
    .fetch_optional(&pool)
    .await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Media Catalog — Database Stats");
    println!("==============================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!(
        "  Titles:      {} ({} movies, {} series)",
        stats.titles, movies, series
    );
    println!("  Episodes:    {}", stats.episodes);
    if let Some(row) = latest {
        let name: String = row.get("title");
        let ts: i64 = row.get("created_at");
        println!("  Last added:  {} ({})", name, format_ts_relative(ts));
    }
    println!();

    pool.close().await;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Format a Unix timestamp as a relative time string (e.g. "3 hours ago").
pub(crate) fn format_ts_relative(ts: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let delta = now - ts;

    if delta < 0 {
        return format_ts_iso(ts);
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        format_ts_iso(ts)
    }
}

pub(crate) fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}
