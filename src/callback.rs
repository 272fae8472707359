//! Inline button payloads and the keyboards built from them.
//!
//! Every button the bot renders carries one of these payloads:
//!
//! | Payload | Action |
//! |---------|--------|
//! | `download_<title id>` | send a movie, or list a series' episodes |
//! | `episode_<episode id>` | send one episode |
//! | `back_<title id>` | re-render the title summary |
//! | `select_movie_<tmdb id>` | confirm a movie candidate for the pending upload |
//! | `select_tv_<tmdb id>` | confirm a series candidate for the pending upload |
//! | `manual_id` | ask the admin to use `/add_movie` or `/add_series` |
//! | `noop` | section header, does nothing |

use crate::models::MediaKind;
use crate::provider::Candidate;
use crate::retrieval::SeasonGroup;
use crate::transport::{InlineButton, InlineKeyboard};

/// Decoded button payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    Download(i64),
    Episode(i64),
    Back(i64),
    SelectMovie(i64),
    SelectSeries(i64),
    ManualId,
    Noop,
}

impl CallbackAction {
    /// Parse a payload. Unknown prefixes and non-numeric ids yield `None`.
    pub fn parse(payload: &str) -> Option<Self> {
        match payload {
            "manual_id" => return Some(CallbackAction::ManualId),
            "noop" => return Some(CallbackAction::Noop),
            _ => {}
        }

        // `select_*` first: `select_movie_` must not be read as some other prefix.
        let prefixes: [(&str, fn(i64) -> CallbackAction); 5] = [
            ("select_movie_", CallbackAction::SelectMovie),
            ("select_tv_", CallbackAction::SelectSeries),
            ("download_", CallbackAction::Download),
            ("episode_", CallbackAction::Episode),
            ("back_", CallbackAction::Back),
        ];
        prefixes.iter().find_map(|(prefix, make)| {
            let id = payload.strip_prefix(prefix)?.parse().ok()?;
            Some(make(id))
        })
    }

    /// Encode back into the wire payload.
    pub fn payload(&self) -> String {
        match self {
            CallbackAction::Download(id) => format!("download_{}", id),
            CallbackAction::Episode(id) => format!("episode_{}", id),
            CallbackAction::Back(id) => format!("back_{}", id),
            CallbackAction::SelectMovie(id) => format!("select_movie_{}", id),
            CallbackAction::SelectSeries(id) => format!("select_tv_{}", id),
            CallbackAction::ManualId => "manual_id".to_string(),
            CallbackAction::Noop => "noop".to_string(),
        }
    }

    fn button(self, text: impl Into<String>) -> InlineButton {
        InlineButton::new(text, self.payload())
    }

    fn select(candidate: &Candidate) -> Self {
        match candidate.kind {
            MediaKind::Movie => CallbackAction::SelectMovie(candidate.external_id),
            MediaKind::Series => CallbackAction::SelectSeries(candidate.external_id),
        }
    }
}

/// Single "📥 Descargar" button under an announcement or search result.
pub fn download_keyboard(title_id: i64) -> InlineKeyboard {
    InlineKeyboard::new().row(vec![
        CallbackAction::Download(title_id).button("📥 Descargar")
    ])
}

/// Candidate picker shown after an upload: movie header and hits, series
/// header and hits, then the manual-entry option.
pub fn candidates_keyboard(movies: &[Candidate], series: &[Candidate]) -> InlineKeyboard {
    let mut keyboard = InlineKeyboard::new();

    if !movies.is_empty() {
        keyboard = keyboard.row(vec![CallbackAction::Noop.button("🎬 Películas encontradas:")]);
        for candidate in movies {
            keyboard = keyboard.row(vec![
                CallbackAction::select(candidate).button(candidate.label())
            ]);
        }
    }

    if !series.is_empty() {
        keyboard = keyboard.row(vec![CallbackAction::Noop.button("📺 Series encontradas:")]);
        for candidate in series {
            keyboard = keyboard.row(vec![
                CallbackAction::select(candidate).button(candidate.label())
            ]);
        }
    }

    keyboard.row(vec![
        CallbackAction::ManualId.button("➕ Ingresar ID manualmente")
    ])
}

/// One row of `S<n>E<m>` buttons per season, then a back button.
///
/// `seasons` must already be in display order.
pub fn episodes_keyboard(title_id: i64, seasons: &[SeasonGroup]) -> InlineKeyboard {
    let mut keyboard = InlineKeyboard::new();
    for group in seasons {
        let row = group
            .episodes
            .iter()
            .map(|episode| {
                CallbackAction::Episode(episode.id)
                    .button(format!("S{}E{}", episode.season, episode.episode))
            })
            .collect();
        keyboard = keyboard.row(row);
    }
    keyboard.row(vec![CallbackAction::Back(title_id).button("🔙 Volver")])
}
