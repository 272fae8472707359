//! Download workflow for catalog users.
//!
//! Each operation returns a view describing what to show or send; the
//! router turns views into chat messages.

use std::sync::Arc;

use crate::error::StoreResult;
use crate::models::{Episode, MediaKind, Title};
use crate::store::CatalogStore;

/// Episodes of one season, ordered by episode number.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonGroup {
    pub season: i32,
    pub episodes: Vec<Episode>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DownloadView {
    NotFound,
    /// A movie with a file: send it with the title caption.
    SendFile { file_id: String, caption: String },
    /// A movie without a file.
    Unavailable,
    /// A series with no episodes yet.
    NoEpisodes { title: Title },
    EpisodeList {
        title: Title,
        seasons: Vec<SeasonGroup>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum EpisodeView {
    NotFound,
    /// The episode exists but its series does not.
    SeriesMissing,
    SendFile { file_id: String, caption: String },
    Unavailable,
}

pub struct Retrieval {
    store: Arc<dyn CatalogStore>,
}

impl Retrieval {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    pub async fn download(&self, title_id: i64) -> StoreResult<DownloadView> {
        let Some(title) = self.store.title_by_id(title_id).await? else {
            return Ok(DownloadView::NotFound);
        };

        match title.kind {
            MediaKind::Movie => Ok(match title.file() {
                Some(file_id) => DownloadView::SendFile {
                    file_id: file_id.to_string(),
                    caption: title.caption.clone(),
                },
                None => DownloadView::Unavailable,
            }),
            MediaKind::Series => {
                let episodes = self.store.episodes_for_title(title.id).await?;
                if episodes.is_empty() {
                    return Ok(DownloadView::NoEpisodes { title });
                }
                Ok(DownloadView::EpisodeList {
                    title,
                    seasons: group_by_season(episodes),
                })
            }
        }
    }

    pub async fn episode(&self, episode_id: i64) -> StoreResult<EpisodeView> {
        let Some(episode) = self.store.episode_by_id(episode_id).await? else {
            return Ok(EpisodeView::NotFound);
        };
        let Some(series) = self.store.title_by_id(episode.title_id).await? else {
            return Ok(EpisodeView::SeriesMissing);
        };

        Ok(match episode.file() {
            Some(file_id) => EpisodeView::SendFile {
                file_id: file_id.to_string(),
                caption: episode_caption(&series.name, &episode),
            },
            None => EpisodeView::Unavailable,
        })
    }

    /// The title summary to re-render after "back".
    pub async fn back(&self, title_id: i64) -> StoreResult<Option<Title>> {
        self.store.title_by_id(title_id).await
    }
}

/// `"Serie - S01E02: Nombre"`.
pub fn episode_caption(series: &str, episode: &Episode) -> String {
    format!(
        "{} - S{:02}E{:02}: {}",
        series, episode.season, episode.episode, episode.name
    )
}

/// Split an already ordered episode list into seasons.
fn group_by_season(episodes: Vec<Episode>) -> Vec<SeasonGroup> {
    let mut seasons: Vec<SeasonGroup> = Vec::new();
    for episode in episodes {
        match seasons.last_mut() {
            Some(group) if group.season == episode.season => group.episodes.push(episode),
            _ => seasons.push(SeasonGroup {
                season: episode.season,
                episodes: vec![episode],
            }),
        }
    }
    seasons
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewEpisode;
    use crate::store::test_support::{episode, movie, series};
    use crate::store::InMemoryStore;

    async fn setup() -> (Arc<InMemoryStore>, Retrieval) {
        let store = Arc::new(InMemoryStore::new());
        let retrieval = Retrieval::new(store.clone());
        (store, retrieval)
    }

    #[tokio::test]
    async fn test_movie_with_and_without_file() {
        let (store, retrieval) = setup().await;
        let with_file = store.add_title(&movie("Avatar", 1)).await.unwrap();
        let mut bare = movie("Sin archivo", 2);
        bare.file_id = Some(String::new());
        let without_file = store.add_title(&bare).await.unwrap();

        assert_eq!(
            retrieval.download(with_file).await.unwrap(),
            DownloadView::SendFile {
                file_id: "file-1".into(),
                caption: "🎬 *Avatar*".into()
            }
        );
        assert_eq!(
            retrieval.download(without_file).await.unwrap(),
            DownloadView::Unavailable
        );
        assert_eq!(retrieval.download(999).await.unwrap(), DownloadView::NotFound);
    }

    #[tokio::test]
    async fn test_series_episodes_grouped_by_season() {
        let (store, retrieval) = setup().await;
        let id = store.add_title(&series("Lost", 10)).await.unwrap();

        assert!(matches!(
            retrieval.download(id).await.unwrap(),
            DownloadView::NoEpisodes { .. }
        ));

        for (s, e) in [(2, 1), (1, 2), (1, 1), (3, 5)] {
            store.add_episode(&episode(id, s, e)).await.unwrap();
        }
        let DownloadView::EpisodeList { title, seasons } = retrieval.download(id).await.unwrap()
        else {
            panic!("expected an episode list");
        };
        assert_eq!(title.name, "Lost");
        let layout: Vec<(i32, Vec<i32>)> = seasons
            .iter()
            .map(|g| (g.season, g.episodes.iter().map(|e| e.episode).collect()))
            .collect();
        assert_eq!(layout, vec![(1, vec![1, 2]), (2, vec![1]), (3, vec![5])]);
    }

    #[tokio::test]
    async fn test_episode_caption_and_availability() {
        let (store, retrieval) = setup().await;
        let id = store.add_title(&series("Lost", 10)).await.unwrap();
        let ep = store
            .add_episode(&NewEpisode {
                name: "Pilot".into(),
                ..episode(id, 1, 2)
            })
            .await
            .unwrap();
        let missing_file = store
            .add_episode(&NewEpisode {
                file_id: None,
                ..episode(id, 1, 3)
            })
            .await
            .unwrap();

        assert_eq!(
            retrieval.episode(ep).await.unwrap(),
            EpisodeView::SendFile {
                file_id: format!("ep-{}-1-2", id),
                caption: "Lost - S01E02: Pilot".into()
            }
        );
        assert_eq!(
            retrieval.episode(missing_file).await.unwrap(),
            EpisodeView::Unavailable
        );
        assert_eq!(retrieval.episode(12345).await.unwrap(), EpisodeView::NotFound);
    }

    #[tokio::test]
    async fn test_episode_of_missing_series() {
        // The in-memory store does not enforce the foreign key.
        let (store, retrieval) = setup().await;
        let orphan = store.add_episode(&episode(77, 1, 1)).await.unwrap();
        assert_eq!(
            retrieval.episode(orphan).await.unwrap(),
            EpisodeView::SeriesMissing
        );
    }

    #[tokio::test]
    async fn test_back_returns_summary() {
        let (store, retrieval) = setup().await;
        let id = store.add_title(&movie("Avatar", 1)).await.unwrap();
        assert_eq!(retrieval.back(id).await.unwrap().unwrap().name, "Avatar");
        assert!(retrieval.back(id + 1).await.unwrap().is_none());
    }

    #[test]
    fn test_episode_caption_pads_numbers() {
        let ep = Episode {
            id: 1,
            title_id: 1,
            season: 10,
            episode: 3,
            name: "Tres".into(),
            file_id: None,
            file_path: None,
            created_at: 0,
        };
        assert_eq!(episode_caption("Serie", &ep), "Serie - S10E03: Tres");
    }
}
