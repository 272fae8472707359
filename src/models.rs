//! Catalog data types shared by the store, the indexing workflow and the
//! chat router.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether a title is a single movie or a series with episodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Series,
}

impl MediaKind {
    /// Value stored in the `media_type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Series => "tv",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(MediaKind::Movie),
            "tv" | "series" => Ok(MediaKind::Series),
            other => anyhow::bail!("unknown media type: '{}'", other),
        }
    }
}

/// A movie or series stored in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Title {
    pub id: i64,
    pub name: String,
    pub year: Option<i32>,
    pub kind: MediaKind,
    /// TMDB id; unique together with `kind`.
    pub external_id: i64,
    pub file_id: Option<String>,
    pub file_path: Option<String>,
    pub caption: String,
    pub poster_url: String,
    /// Unix timestamp (seconds).
    pub created_at: i64,
}

impl Title {
    /// The deliverable file handle, if there is one.
    pub fn file(&self) -> Option<&str> {
        self.file_id.as_deref().filter(|f| !f.is_empty())
    }
}

/// A title that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTitle {
    pub name: String,
    pub year: Option<i32>,
    pub kind: MediaKind,
    pub external_id: i64,
    pub file_id: Option<String>,
    pub file_path: Option<String>,
    pub caption: String,
    pub poster_url: String,
}

/// One episode of a series title.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Episode {
    pub id: i64,
    pub title_id: i64,
    pub season: i32,
    pub episode: i32,
    pub name: String,
    pub file_id: Option<String>,
    pub file_path: Option<String>,
    pub created_at: i64,
}

impl Episode {
    pub fn file(&self) -> Option<&str> {
        self.file_id.as_deref().filter(|f| !f.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewEpisode {
    pub title_id: i64,
    pub season: i32,
    pub episode: i32,
    pub name: String,
    pub file_id: Option<String>,
    pub file_path: Option<String>,
}

/// Row counts reported by `/stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CatalogStats {
    pub titles: i64,
    pub episodes: i64,
}
