//! In-memory [`CatalogStore`] implementation.
//!
//! Titles and episodes live in `BTreeMap`s behind one `RwLock`, so a
//! cascading delete is observed all-or-nothing by readers.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{StoreError, StoreResult};
use crate::models::{CatalogStats, Episode, MediaKind, NewEpisode, NewTitle, Title};

use super::CatalogStore;

#[derive(Default)]
struct Inner {
    titles: BTreeMap<i64, Title>,
    episodes: BTreeMap<i64, Episode>,
    next_title_id: i64,
    next_episode_id: i64,
}

/// In-memory store for tests and tooling.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn add_title(&self, title: &NewTitle) -> StoreResult<i64> {
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        if inner
            .titles
            .values()
            .any(|t| t.kind == title.kind && t.external_id == title.external_id)
        {
            return Err(StoreError::Conflict {
                kind: title.kind,
                external_id: title.external_id,
            });
        }
        inner.next_title_id += 1;
        let id = inner.next_title_id;
        inner.titles.insert(
            id,
            Title {
                id,
                name: title.name.clone(),
                year: title.year,
                kind: title.kind,
                external_id: title.external_id,
                file_id: title.file_id.clone(),
                file_path: title.file_path.clone(),
                caption: title.caption.clone(),
                poster_url: title.poster_url.clone(),
                created_at: now(),
            },
        );
        Ok(id)
    }

    async fn add_episode(&self, episode: &NewEpisode) -> StoreResult<i64> {
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        if !inner.titles.contains_key(&episode.title_id) {
            return Err(StoreError::UnknownTitle {
                title_id: episode.title_id,
            });
        }
        inner.next_episode_id += 1;
        let id = inner.next_episode_id;
        inner.episodes.insert(
            id,
            Episode {
                id,
                title_id: episode.title_id,
                season: episode.season,
                episode: episode.episode,
                name: episode.name.clone(),
                file_id: episode.file_id.clone(),
                file_path: episode.file_path.clone(),
                created_at: now(),
            },
        );
        Ok(id)
    }

    async fn title_by_id(&self, id: i64) -> StoreResult<Option<Title>> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(inner.titles.get(&id).cloned())
    }

    async fn title_by_external_id(
        &self,
        kind: MediaKind,
        external_id: i64,
    ) -> StoreResult<Option<Title>> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(inner
            .titles
            .values()
            .find(|t| t.kind == kind && t.external_id == external_id)
            .cloned())
    }

    async fn search_titles(&self, query: &str) -> StoreResult<Vec<Title>> {
        let needle = query.to_lowercase();
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        let mut hits: Vec<Title> = inner
            .titles
            .values()
            .filter(|t| t.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        hits.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(hits)
    }

    async fn episodes_for_title(&self, title_id: i64) -> StoreResult<Vec<Episode>> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        let mut episodes: Vec<Episode> = inner
            .episodes
            .values()
            .filter(|e| e.title_id == title_id)
            .cloned()
            .collect();
        episodes.sort_by_key(|e| (e.season, e.episode, e.id));
        Ok(episodes)
    }

    async fn episode_by_id(&self, id: i64) -> StoreResult<Option<Episode>> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(inner.episodes.get(&id).cloned())
    }

    async fn delete_title(&self, id: i64) -> StoreResult<bool> {
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        inner.episodes.retain(|_, e| e.title_id != id);
        Ok(inner.titles.remove(&id).is_some())
    }

    async fn delete_all_titles(&self) -> StoreResult<u64> {
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        inner.episodes.clear();
        let removed = inner.titles.len() as u64;
        inner.titles.clear();
        Ok(removed)
    }

    async fn stats(&self) -> StoreResult<CatalogStats> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(CatalogStats {
            titles: inner.titles.len() as i64,
            episodes: inner.episodes.len() as i64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support;

    #[tokio::test]
    async fn test_in_memory_store_contract() {
        let store = InMemoryStore::new();
        test_support::exercise_store(&store).await;
    }

    #[tokio::test]
    async fn test_ids_are_never_reused() {
        let store = InMemoryStore::new();
        let a = store
            .add_title(&test_support::movie("Heat", 949))
            .await
            .unwrap();
        assert!(store.delete_title(a).await.unwrap());
        let b = store
            .add_title(&test_support::movie("Heat", 949))
            .await
            .unwrap();
        assert!(b > a);
    }
}
