//! Indexing workflow: from an uploaded file to a published catalog title.
//!
//! Per submitter the workflow is a two-state machine:
//!
//! ```text
//!            file_received                    select(candidate) ok
//!   NONE ─────────────────────▶ AWAITING ─────────────────────────▶ NONE
//!                                │    ▲
//!                                └────┘ new upload replaces the session,
//!                                       details missing, already exists,
//!                                       manual entry
//! ```
//!
//! The pending state lives in a [`SessionStore`] owned by the manager.
//! Titles are de-duplicated by `(kind, external id)`: a lookup first, then
//! the storage constraint, whose conflict is reported the same way.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::captions::{movie_caption, poster_url, series_caption};
use crate::error::{ProviderError, StoreError, StoreResult};
use crate::filename::{clean_filename, episode_marker};
use crate::models::{MediaKind, NewEpisode, NewTitle};
use crate::provider::{year_of, Candidate, MetadataProvider};
use crate::session::{IndexingSession, SessionStore, SubmitterId};
use crate::store::CatalogStore;

/// A newly stored title, ready to be published.
#[derive(Debug, Clone, PartialEq)]
pub struct Announcement {
    pub title_id: i64,
    pub caption: String,
    /// Empty when the provider has no poster.
    pub poster_url: String,
}

/// Publication surface for new titles. Returns whether the post went out.
#[async_trait]
pub trait Announcer: Send + Sync {
    async fn announce(&self, announcement: &Announcement) -> bool;
}

/// A file posted to the ingest chat.
#[derive(Debug, Clone, PartialEq)]
pub struct Upload {
    pub file_id: String,
    pub file_name: String,
    pub message_id: i64,
}

#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub session: IndexingSession,
    /// Live session this upload displaced, if any.
    pub replaced: Option<IndexingSession>,
    pub movies: Vec<Candidate>,
    pub series: Vec<Candidate>,
    pub movie_lookup_failed: bool,
    pub series_lookup_failed: bool,
}

/// What the admin picked from the candidate list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Candidate(MediaKind, i64),
    Manual,
    Noop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome {
    SessionExpired,
    ManualEntry,
    Ignored,
    /// The provider had no record, or could not be reached.
    DetailsUnavailable { kind: MediaKind, unreachable: bool },
    AlreadyExists { kind: MediaKind, title_id: i64 },
    Added {
        kind: MediaKind,
        title_id: i64,
        announced: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachOutcome {
    NoSession,
    TitleNotFound,
    NotASeries,
    /// Neither the command nor the file name gave season and episode.
    MissingNumbers,
    Attached {
        episode_id: i64,
        series: String,
        season: i32,
        episode: i32,
    },
}

pub struct IndexingManager {
    store: Arc<dyn CatalogStore>,
    provider: Arc<dyn MetadataProvider>,
    announcer: Arc<dyn Announcer>,
    sessions: SessionStore,
    image_base_url: String,
    max_candidates: usize,
}

impl IndexingManager {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        provider: Arc<dyn MetadataProvider>,
        announcer: Arc<dyn Announcer>,
        sessions: SessionStore,
        image_base_url: impl Into<String>,
        max_candidates: usize,
    ) -> Self {
        Self {
            store,
            provider,
            announcer,
            sessions,
            image_base_url: image_base_url.into(),
            max_candidates,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Open (or replace) the submitter's session and look up candidates.
    pub async fn file_received(&self, submitter: SubmitterId, upload: Upload) -> UploadOutcome {
        let query = clean_filename(&upload.file_name);
        let session = IndexingSession {
            file_id: upload.file_id,
            file_name: upload.file_name,
            query: query.clone(),
            message_id: upload.message_id,
        };

        let replaced = self.sessions.insert(submitter, session.clone());
        if let Some(old) = &replaced {
            info!(
                user_id = submitter,
                discarded = %old.file_name,
                "Pending upload replaced by a new one"
            );
        }

        let (movies, movie_lookup_failed) =
            self.candidates(self.provider.search_movies(&query).await, "movie");
        let (series, series_lookup_failed) =
            self.candidates(self.provider.search_series(&query).await, "series");

        debug!(
            user_id = submitter,
            query = %query,
            movies = movies.len(),
            series = series.len(),
            "Candidates found"
        );

        UploadOutcome {
            session,
            replaced,
            movies,
            series,
            movie_lookup_failed,
            series_lookup_failed,
        }
    }

    fn candidates(
        &self,
        result: Result<Vec<Candidate>, ProviderError>,
        what: &str,
    ) -> (Vec<Candidate>, bool) {
        match result {
            Ok(mut hits) => {
                hits.truncate(self.max_candidates);
                (hits, false)
            }
            Err(e) => {
                warn!(kind = what, error = %e, "Candidate search failed");
                (Vec::new(), true)
            }
        }
    }

    /// Resolve the submitter's pending upload with `selection`.
    pub async fn select(
        &self,
        submitter: SubmitterId,
        selection: Selection,
    ) -> StoreResult<SelectionOutcome> {
        let Some(session) = self.sessions.get(submitter) else {
            return Ok(SelectionOutcome::SessionExpired);
        };

        let (kind, external_id) = match selection {
            Selection::Manual => return Ok(SelectionOutcome::ManualEntry),
            Selection::Noop => return Ok(SelectionOutcome::Ignored),
            Selection::Candidate(kind, id) => (kind, id),
        };

        let outcome = self
            .commit(kind, external_id, Some(session.file_id.clone()))
            .await?;
        if matches!(outcome, SelectionOutcome::Added { .. }) {
            self.sessions.take_matching(submitter, &session);
        }
        Ok(outcome)
    }

    /// Add a title by provider id without a file (`/add_movie`, `/add_series`).
    ///
    /// Pending sessions are left alone.
    pub async fn add_by_external_id(
        &self,
        kind: MediaKind,
        external_id: i64,
    ) -> StoreResult<SelectionOutcome> {
        self.commit(kind, external_id, None).await
    }

    /// Store the submitter's pending file as an episode of series `title_id`.
    ///
    /// Season and episode fall back to the `SxxEyy` marker in the file name.
    pub async fn attach_episode(
        &self,
        submitter: SubmitterId,
        title_id: i64,
        season: Option<i32>,
        episode: Option<i32>,
    ) -> StoreResult<AttachOutcome> {
        let Some(session) = self.sessions.get(submitter) else {
            return Ok(AttachOutcome::NoSession);
        };
        let Some(title) = self.store.title_by_id(title_id).await? else {
            return Ok(AttachOutcome::TitleNotFound);
        };
        if title.kind != MediaKind::Series {
            return Ok(AttachOutcome::NotASeries);
        }

        let marker = episode_marker(&session.file_name);
        let numbers = match (season, episode) {
            (Some(s), Some(e)) => Some((s, e)),
            (Some(s), None) => marker.map(|(_, e)| (s, e)),
            (None, _) => marker,
        };
        let Some((season, episode)) = numbers else {
            return Ok(AttachOutcome::MissingNumbers);
        };

        let name = match self.provider.season_details(title.external_id, season).await {
            Ok(details) => details.episode_name(episode).map(str::to_string),
            Err(e) => {
                debug!(series = title.external_id, season, error = %e, "Season lookup failed");
                None
            }
        }
        .unwrap_or_else(|| format!("Episodio {}", episode));

        let added = self
            .store
            .add_episode(&NewEpisode {
                title_id,
                season,
                episode,
                name,
                file_id: Some(session.file_id.clone()),
                file_path: None,
            })
            .await;
        let episode_id = match added {
            Ok(id) => id,
            // Deleted while the season lookup was in flight.
            Err(StoreError::UnknownTitle { .. }) => return Ok(AttachOutcome::TitleNotFound),
            Err(e) => return Err(e),
        };
        self.sessions.take_matching(submitter, &session);

        info!(title_id, episode_id, season, episode, "Episode attached");
        Ok(AttachOutcome::Attached {
            episode_id,
            series: title.name,
            season,
            episode,
        })
    }

    /// Fetch details, de-duplicate, persist, announce.
    async fn commit(
        &self,
        kind: MediaKind,
        external_id: i64,
        file_id: Option<String>,
    ) -> StoreResult<SelectionOutcome> {
        let record = match self.fetch_record(kind, external_id).await {
            Ok(record) => record,
            Err(e) => {
                warn!(kind = %kind, external_id, error = %e, "Details unavailable");
                return Ok(SelectionOutcome::DetailsUnavailable {
                    kind,
                    unreachable: !e.is_not_found(),
                });
            }
        };

        if let Some(existing) = self.store.title_by_external_id(kind, external_id).await? {
            return Ok(SelectionOutcome::AlreadyExists {
                kind,
                title_id: existing.id,
            });
        }

        let title = NewTitle {
            file_id,
            ..record
        };
        let title_id = match self.store.add_title(&title).await {
            Ok(id) => id,
            Err(StoreError::Conflict { .. }) => {
                // Lost a race with another admin adding the same title.
                let existing = self.store.title_by_external_id(kind, external_id).await?;
                return Ok(SelectionOutcome::AlreadyExists {
                    kind,
                    title_id: existing.map(|t| t.id).unwrap_or_default(),
                });
            }
            Err(e) => return Err(e),
        };
        info!(title_id, kind = %kind, external_id, name = %title.name, "Title added");

        let announced = self
            .announcer
            .announce(&Announcement {
                title_id,
                caption: title.caption.clone(),
                poster_url: title.poster_url.clone(),
            })
            .await;

        Ok(SelectionOutcome::Added {
            kind,
            title_id,
            announced,
        })
    }

    /// Provider details rendered into a title record without a file.
    async fn fetch_record(
        &self,
        kind: MediaKind,
        external_id: i64,
    ) -> Result<NewTitle, ProviderError> {
        let record = match kind {
            MediaKind::Movie => {
                let details = self.provider.movie_details(external_id).await?;
                NewTitle {
                    name: details.title.clone().unwrap_or_default(),
                    year: year_of(details.release_date.as_deref()),
                    kind,
                    external_id,
                    file_id: None,
                    file_path: None,
                    caption: movie_caption(&details),
                    poster_url: poster_url(&self.image_base_url, details.poster_path.as_deref()),
                }
            }
            MediaKind::Series => {
                let details = self.provider.series_details(external_id).await?;
                NewTitle {
                    name: details.name.clone().unwrap_or_default(),
                    year: year_of(details.first_air_date.as_deref()),
                    kind,
                    external_id,
                    file_id: None,
                    file_path: None,
                    caption: series_caption(&details),
                    poster_url: poster_url(&self.image_base_url, details.poster_path.as_deref()),
                }
            }
        };
        Ok(record)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::provider::{SeasonDetails, SeasonEpisode};
    use crate::store::test_support::series;
    use crate::store::InMemoryStore;
    use std::time::Duration;

    const ADMIN: SubmitterId = 42;

    struct Harness {
        store: Arc<InMemoryStore>,
        announcer: Arc<RecordingAnnouncer>,
        manager: IndexingManager,
    }

    fn harness(provider: FakeProvider, announce_ok: bool) -> Harness {
        let store = Arc::new(InMemoryStore::new());
        let announcer = Arc::new(RecordingAnnouncer::new(announce_ok));
        let manager = IndexingManager::new(
            store.clone(),
            Arc::new(provider),
            announcer.clone(),
            SessionStore::new(Duration::from_secs(3600)),
            "https://image.tmdb.org/t/p/w500",
            3,
        );
        Harness {
            store,
            announcer,
            manager,
        }
    }

    fn hit(kind: MediaKind, id: i64) -> Candidate {
        Candidate {
            kind,
            external_id: id,
            title: format!("Hit {}", id),
            date: None,
        }
    }

    #[tokio::test]
    async fn test_upload_opens_session_and_limits_candidates() {
        let provider = FakeProvider {
            movie_hits: (1..=5).map(|i| hit(MediaKind::Movie, i)).collect(),
            series_hits: vec![hit(MediaKind::Series, 9)],
            ..Default::default()
        };
        let h = harness(provider, true);

        let outcome = h
            .manager
            .file_received(ADMIN, upload("f1", "Avatar.2009.1080p.BluRay.mkv"))
            .await;
        assert_eq!(outcome.session.query, "Avatar");
        assert_eq!(outcome.movies.len(), 3);
        assert_eq!(outcome.series.len(), 1);
        assert!(!outcome.movie_lookup_failed);
        assert!(outcome.replaced.is_none());
        assert_eq!(h.manager.sessions().get(ADMIN).unwrap().file_id, "f1");
    }

    #[tokio::test]
    async fn test_second_upload_replaces_session() {
        let h = harness(FakeProvider::default(), true);
        h.manager.file_received(ADMIN, upload("f1", "a.mkv")).await;
        let outcome = h.manager.file_received(ADMIN, upload("f2", "b.mkv")).await;

        assert_eq!(outcome.replaced.unwrap().file_id, "f1");
        assert_eq!(h.manager.sessions().len(), 1);
        assert_eq!(h.manager.sessions().get(ADMIN).unwrap().file_id, "f2");
    }

    #[tokio::test]
    async fn test_offline_provider_is_reported() {
        let provider = FakeProvider {
            offline: true,
            ..Default::default()
        };
        let h = harness(provider, true);
        let outcome = h.manager.file_received(ADMIN, upload("f1", "x.mkv")).await;
        assert!(outcome.movies.is_empty() && outcome.series.is_empty());
        assert!(outcome.movie_lookup_failed && outcome.series_lookup_failed);
        // The session still opens so the admin can fall back to manual entry.
        assert!(h.manager.sessions().get(ADMIN).is_some());
    }

    #[tokio::test]
    async fn test_select_without_session_is_expired() {
        let h = harness(FakeProvider::default().with_movie(42, "Avatar"), true);
        let outcome = h
            .manager
            .select(ADMIN, Selection::Candidate(MediaKind::Movie, 42))
            .await
            .unwrap();
        assert_eq!(outcome, SelectionOutcome::SessionExpired);
        assert_eq!(h.store.stats().await.unwrap().titles, 0);
    }

    #[tokio::test]
    async fn test_confirmed_selection_persists_and_clears_session() {
        let h = harness(FakeProvider::default().with_movie(19995, "Avatar"), true);
        h.manager
            .file_received(ADMIN, upload("file-abc", "Avatar.mkv"))
            .await;

        let outcome = h
            .manager
            .select(ADMIN, Selection::Candidate(MediaKind::Movie, 19995))
            .await
            .unwrap();
        let SelectionOutcome::Added {
            title_id,
            announced,
            ..
        } = outcome
        else {
            panic!("unexpected {:?}", outcome);
        };
        assert!(announced);

        let title = h.store.title_by_id(title_id).await.unwrap().unwrap();
        assert_eq!(title.name, "Avatar");
        assert_eq!(title.year, Some(2009));
        assert_eq!(title.file(), Some("file-abc"));
        assert_eq!(title.poster_url, "https://image.tmdb.org/t/p/w500/19995.jpg");
        assert!(h.manager.sessions().get(ADMIN).is_none());

        let published = h.announcer.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].title_id, title_id);
        assert!(published[0].caption.starts_with("🎬 *Avatar*"));
    }

    #[tokio::test]
    async fn test_duplicate_is_rejected_before_insert() {
        let h = harness(FakeProvider::default().with_movie(42, "Avatar"), true);
        let first = h
            .manager
            .add_by_external_id(MediaKind::Movie, 42)
            .await
            .unwrap();
        let SelectionOutcome::Added { title_id, .. } = first else {
            panic!("unexpected {:?}", first);
        };

        h.manager.file_received(ADMIN, upload("f", "Avatar.mkv")).await;
        let again = h
            .manager
            .select(ADMIN, Selection::Candidate(MediaKind::Movie, 42))
            .await
            .unwrap();
        assert_eq!(
            again,
            SelectionOutcome::AlreadyExists {
                kind: MediaKind::Movie,
                title_id
            }
        );
        assert_eq!(h.store.stats().await.unwrap().titles, 1);
        // Still pending: the admin may pick another candidate.
        assert!(h.manager.sessions().get(ADMIN).is_some());
        assert_eq!(h.announcer.published().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_details_leave_session() {
        let h = harness(FakeProvider::default(), true);
        h.manager.file_received(ADMIN, upload("f", "x.mkv")).await;
        let outcome = h
            .manager
            .select(ADMIN, Selection::Candidate(MediaKind::Series, 7))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            SelectionOutcome::DetailsUnavailable {
                kind: MediaKind::Series,
                unreachable: false
            }
        );
        assert!(h.manager.sessions().get(ADMIN).is_some());
    }

    #[tokio::test]
    async fn test_manual_and_noop_keep_session() {
        let h = harness(FakeProvider::default(), true);
        h.manager.file_received(ADMIN, upload("f", "x.mkv")).await;
        assert_eq!(
            h.manager.select(ADMIN, Selection::Manual).await.unwrap(),
            SelectionOutcome::ManualEntry
        );
        assert_eq!(
            h.manager.select(ADMIN, Selection::Noop).await.unwrap(),
            SelectionOutcome::Ignored
        );
        assert!(h.manager.sessions().get(ADMIN).is_some());
    }

    #[tokio::test]
    async fn test_failed_announcement_is_partial_success() {
        let h = harness(FakeProvider::default().with_series(1399, "Juego de tronos"), false);
        h.manager.file_received(ADMIN, upload("f", "got.mkv")).await;
        let outcome = h
            .manager
            .select(ADMIN, Selection::Candidate(MediaKind::Series, 1399))
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            SelectionOutcome::Added {
                kind: MediaKind::Series,
                announced: false,
                ..
            }
        ));
        assert_eq!(h.store.stats().await.unwrap().titles, 1);
    }

    #[tokio::test]
    async fn test_add_by_external_id_has_no_file_and_keeps_session() {
        let h = harness(FakeProvider::default().with_movie(5, "Cinco"), true);
        h.manager.file_received(ADMIN, upload("f", "cinco.mkv")).await;
        let outcome = h
            .manager
            .add_by_external_id(MediaKind::Movie, 5)
            .await
            .unwrap();
        let SelectionOutcome::Added { title_id, .. } = outcome else {
            panic!("unexpected {:?}", outcome);
        };
        let title = h.store.title_by_id(title_id).await.unwrap().unwrap();
        assert_eq!(title.file(), None);
        assert!(h.manager.sessions().get(ADMIN).is_some());
    }

    #[tokio::test]
    async fn test_attach_episode_from_marker() {
        let mut provider = FakeProvider::default();
        provider.seasons.insert(
            (1399, 1),
            SeasonDetails {
                season_number: 1,
                episodes: vec![SeasonEpisode {
                    episode_number: 2,
                    name: Some("El camino real".into()),
                }],
            },
        );
        let h = harness(provider, true);
        let series_id = h.store.add_title(&series("Juego de tronos", 1399)).await.unwrap();

        h.manager
            .file_received(ADMIN, upload("ep-file", "GoT.S01E02.720p.mkv"))
            .await;
        let outcome = h
            .manager
            .attach_episode(ADMIN, series_id, None, None)
            .await
            .unwrap();
        let AttachOutcome::Attached {
            episode_id,
            season,
            episode,
            ..
        } = outcome
        else {
            panic!("unexpected {:?}", outcome);
        };
        assert_eq!((season, episode), (1, 2));

        let stored = h.store.episode_by_id(episode_id).await.unwrap().unwrap();
        assert_eq!(stored.name, "El camino real");
        assert_eq!(stored.file(), Some("ep-file"));
        assert!(h.manager.sessions().get(ADMIN).is_none());
    }

    #[tokio::test]
    async fn test_attach_episode_fallbacks_and_failures() {
        let h = harness(FakeProvider::default().with_movie(5, "Cinco"), true);
        let series_id = h.store.add_title(&series("Serie", 77)).await.unwrap();

        assert_eq!(
            h.manager
                .attach_episode(ADMIN, series_id, Some(1), Some(1))
                .await
                .unwrap(),
            AttachOutcome::NoSession
        );

        h.manager.file_received(ADMIN, upload("f", "serie.mkv")).await;
        assert_eq!(
            h.manager
                .attach_episode(ADMIN, 9999, Some(1), Some(1))
                .await
                .unwrap(),
            AttachOutcome::TitleNotFound
        );
        let movie = h.manager.add_by_external_id(MediaKind::Movie, 5).await.unwrap();
        let SelectionOutcome::Added { title_id, .. } = movie else {
            panic!("unexpected {:?}", movie);
        };
        assert_eq!(
            h.manager
                .attach_episode(ADMIN, title_id, Some(1), Some(1))
                .await
                .unwrap(),
            AttachOutcome::NotASeries
        );
        assert_eq!(
            h.manager
                .attach_episode(ADMIN, series_id, None, None)
                .await
                .unwrap(),
            AttachOutcome::MissingNumbers
        );

        let outcome = h
            .manager
            .attach_episode(ADMIN, series_id, Some(3), Some(4))
            .await
            .unwrap();
        let AttachOutcome::Attached { episode_id, .. } = outcome else {
            panic!("unexpected {:?}", outcome);
        };
        let stored = h.store.episode_by_id(episode_id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Episodio 4");
        assert_eq!((stored.season, stored.episode), (3, 4));
    }
}
