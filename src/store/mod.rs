//! Storage abstraction for the catalog.
//!
//! The [`CatalogStore`] trait is pure data access over titles and
//! episodes; no business rules live here. Two backends implement it:
//!
//! | Backend | Use |
//! |---------|-----|
//! | [`SqliteStore`] | Production, backed by the `media` / `episodes` tables |
//! | [`InMemoryStore`] | Tests and tooling |
//!
//! Both backends enforce the same uniqueness rule on `(kind, external_id)`
//! and report a violation as [`StoreError::Conflict`](crate::error::StoreError::Conflict).
//! Both refuse episodes whose title does not exist.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::models::{CatalogStats, Episode, MediaKind, NewEpisode, NewTitle, Title};

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

/// Durable CRUD over titles and episodes.
///
/// # Ordering
///
/// - [`search_titles`](CatalogStore::search_titles) returns the most recently
///   added titles first.
/// - [`episodes_for_title`](CatalogStore::episodes_for_title) returns episodes
///   by `(season, episode)` ascending.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Insert a title and return its id.
    async fn add_title(&self, title: &NewTitle) -> StoreResult<i64>;

    /// Insert an episode under `episode.title_id`.
    ///
    /// Fails with [`StoreError::UnknownTitle`](crate::error::StoreError::UnknownTitle)
    /// when that title does not exist.
    async fn add_episode(&self, episode: &NewEpisode) -> StoreResult<i64>;

    async fn title_by_id(&self, id: i64) -> StoreResult<Option<Title>>;

    async fn title_by_external_id(
        &self,
        kind: MediaKind,
        external_id: i64,
    ) -> StoreResult<Option<Title>>;

    /// Case-insensitive substring match on the display name.
    ///
    /// Never fails because nothing matched; an empty vector is returned instead.
    async fn search_titles(&self, query: &str) -> StoreResult<Vec<Title>>;

    async fn episodes_for_title(&self, title_id: i64) -> StoreResult<Vec<Episode>>;

    async fn episode_by_id(&self, id: i64) -> StoreResult<Option<Episode>>;

    /// Remove a title and all of its episodes in one unit of work.
    ///
    /// Returns `false` if no title had that id.
    async fn delete_title(&self, id: i64) -> StoreResult<bool>;

    /// Remove every episode and every title; returns the number of titles removed.
    async fn delete_all_titles(&self) -> StoreResult<u64>;

    async fn stats(&self) -> StoreResult<CatalogStats>;
}
