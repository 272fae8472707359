//! Catalog inspection commands: `search`, `list-episodes`, `delete`.
//!
//! These read and write the same database as the running bot (WAL mode
//! allows it) and print plain-text tables.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::db;
use crate::models::MediaKind;
use crate::stats::format_ts_iso;
use crate::store::{CatalogStore, SqliteStore};

async fn open_store(config: &Config) -> Result<SqliteStore> {
    let pool = db::connect(config).await?;
    Ok(SqliteStore::new(pool))
}

/// Print titles whose name contains `query`, newest first.
pub async fn run_search(config: &Config, query: &str) -> Result<()> {
    let store = open_store(config).await?;
    let titles = store.search_titles(query).await?;

    if titles.is_empty() {
        println!("No results.");
        store.pool().close().await;
        return Ok(());
    }

    println!("{:>6}  {:<6}  {:>4}  {:<16}  NAME", "ID", "KIND", "YEAR", "ADDED");
    for title in &titles {
        let year = title
            .year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>6}  {:<6}  {:>4}  {:<16}  {}",
            title.id,
            title.kind.as_str(),
            year,
            format_ts_iso(title.created_at),
            title.name
        );
    }
    println!();
    println!("{} result{}", titles.len(), if titles.len() == 1 { "" } else { "s" });

    store.pool().close().await;
    Ok(())
}

/// Print the episodes of a series, ordered by season and episode.
pub async fn run_list_episodes(config: &Config, title_id: i64) -> Result<()> {
    let store = open_store(config).await?;
    let Some(title) = store.title_by_id(title_id).await? else {
        bail!("No title with id {}", title_id);
    };
    if title.kind != MediaKind::Series {
        bail!("Title {} ({}) is a movie and has no episodes", title_id, title.name);
    }

    let episodes = store.episodes_for_title(title_id).await?;
    println!("{} — {} episode(s)", title.name, episodes.len());
    for episode in &episodes {
        let file = if episode.file().is_some() { "" } else { "  (no file)" };
        println!(
            "  {:>6}  S{:02}E{:02}  {}{}",
            episode.id, episode.season, episode.episode, episode.name, file
        );
    }

    store.pool().close().await;
    Ok(())
}

/// Delete a title and its episodes.
pub async fn run_delete(config: &Config, title_id: i64) -> Result<()> {
    let store = open_store(config).await?;
    let Some(title) = store.title_by_id(title_id).await? else {
        bail!("No title with id {}", title_id);
    };

    let episodes = store.episodes_for_title(title_id).await?.len();
    if store.delete_title(title_id).await? {
        println!(
            "Deleted '{}' (id {}) and {} episode(s).",
            title.name, title_id, episodes
        );
    }

    store.pool().close().await;
    Ok(())
}
