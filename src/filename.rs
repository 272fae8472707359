//! Filename heuristics for turning an uploaded file name into a search query.
//!
//! [`clean_filename`] is a best-effort sequence of regex passes, not a
//! grammar. Each pass runs on the output of the previous one, so the order
//! below is part of the behaviour: extension, quality tags, years,
//! season/episode markers, bracketed prefixes/suffixes, emoji, stray
//! punctuation, whitespace.

use once_cell::sync::Lazy;
use regex::Regex;

static EXTENSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.[^.]*$").expect("valid regex"));

static QUALITY_TAGS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(1080p|720p|480p|2160p|HDRip|BRRip|WEBRip|WEB-DL|HDTV|DVD|BluRay|x264|x265|h264|h265|AAC|DDP?5\.1|DD?5\.1|HEVC|AVC)\b",
    )
    .expect("valid regex")
});

static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(19|20)\d{2}\b").expect("valid regex"));

static SEASON_EPISODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[Ss]\d+[Ee]\d+\b").expect("valid regex"));

static SEASON_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bSeason\s*\d+\b").expect("valid regex"));

static EPISODE_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bEpisode\s*\d+\b").expect("valid regex"));

static EDGE_BRACKETS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[.*?\]|\[.*?\]$").expect("valid regex"));

static EDGE_PARENS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\(.*?\)|\(.*?\)$").expect("valid regex"));

static EMOJI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\x{1F600}-\x{1F64F}\x{1F300}-\x{1F5FF}\x{1F680}-\x{1F6FF}\x{1F1E0}-\x{1F1FF}]")
        .expect("valid regex")
});

// Letters (ASCII plus Latin-1 Supplement / Latin Extended-A), digits,
// whitespace, hyphen, underscore and apostrophe survive.
static DISALLOWED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^a-zA-Z0-9\s\x{00C0}-\x{017F}\-_']").expect("valid regex")
});

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

static EPISODE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[Ss](\d{1,3})[Ee](\d{1,4})\b").expect("valid regex"));

/// Reduce a raw upload file name to a title search query.
///
/// ```rust
/// use media_catalog_bot::filename::clean_filename;
///
/// assert_eq!(clean_filename("Show.Name.S01E02.1080p.WEB-DL.mkv"), "Show Name");
/// assert_eq!(clean_filename("[Group] Avatar (2009) 720p BluRay x264.mp4"), "Avatar");
/// ```
pub fn clean_filename(raw: &str) -> String {
    let s = EXTENSION.replace(raw, "");
    let s = QUALITY_TAGS.replace_all(&s, "");
    let s = YEAR.replace_all(&s, "");
    let s = SEASON_EPISODE.replace_all(&s, "");
    let s = SEASON_WORD.replace_all(&s, "");
    let s = EPISODE_WORD.replace_all(&s, "");
    let s = EDGE_BRACKETS.replace_all(&s, "");
    let s = EDGE_PARENS.replace_all(&s, "");
    let s = EMOJI.replace_all(&s, "");
    let s = DISALLOWED.replace_all(&s, " ");
    let s = WHITESPACE.replace_all(&s, " ");
    s.trim().to_string()
}

/// The first `SxxEyy` marker in a file name, as `(season, episode)`.
pub fn episode_marker(raw: &str) -> Option<(i32, i32)> {
    let caps = EPISODE_MARKER.captures(raw)?;
    let season = caps.get(1)?.as_str().parse().ok()?;
    let episode = caps.get(2)?.as_str().parse().ok()?;
    Some((season, episode))
}
