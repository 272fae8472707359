//! Caption templates for announcements and search results.
//!
//! Output is Markdown for the chat transport. The placeholder strings
//! (`N/A`, `Unknown Title`, `No description available`) are part of the
//! published format and must not change.

use crate::provider::{year_label, MovieDetails, SeriesDetails};

const OVERVIEW_LIMIT: usize = 200;

/// Caption for a movie announcement.
pub fn movie_caption(movie: &MovieDetails) -> String {
    let title = movie.title.as_deref().unwrap_or("Unknown Title");
    let year = year_label(movie.release_date.as_deref());
    let rating = number_or_na(movie.vote_average.as_ref());
    let duration = movie
        .runtime
        .map(|r| r.to_string())
        .unwrap_or_else(|| "N/A".to_string());
    let overview = truncate_overview(movie.overview.as_deref());

    let mut caption = format!("🎬 *{}*\n\n", title);
    caption.push_str(&format!("📅 Año: {}\n", year));
    caption.push_str(&format!("⭐ Calificación: {}/10\n", rating));
    caption.push_str(&format!("⏱ Duración: {} min\n\n", duration));
    caption.push_str(&format!("📖 Descripción: {}", overview));
    caption
}

/// Caption for a series announcement.
pub fn series_caption(series: &SeriesDetails) -> String {
    let title = series.name.as_deref().unwrap_or("Unknown Title");
    let year = year_label(series.first_air_date.as_deref());
    let rating = number_or_na(series.vote_average.as_ref());
    let seasons = series
        .number_of_seasons
        .map(|n| n.to_string())
        .unwrap_or_else(|| "N/A".to_string());
    let episodes = series
        .number_of_episodes
        .map(|n| n.to_string())
        .unwrap_or_else(|| "N/A".to_string());
    let overview = truncate_overview(series.overview.as_deref());

    let mut caption = format!("📺 *{}*\n\n", title);
    caption.push_str(&format!("📅 Año: {}\n", year));
    caption.push_str(&format!("⭐ Calificación: {}/10\n", rating));
    caption.push_str(&format!("📚 Temporadas: {}\n", seasons));
    caption.push_str(&format!("🎭 Episodios: {}\n\n", episodes));
    caption.push_str(&format!("📖 Descripción: {}", overview));
    caption
}

/// Full poster URL, or an empty string when there is no poster path.
pub fn poster_url(image_base_url: &str, poster_path: Option<&str>) -> String {
    match poster_path {
        Some(path) if !path.is_empty() => format!("{}{}", image_base_url, path),
        _ => String::new(),
    }
}

fn number_or_na(n: Option<&serde_json::Number>) -> String {
    n.map(|n| n.to_string()).unwrap_or_else(|| "N/A".to_string())
}

/// First 200 characters plus `...` when longer.
fn truncate_overview(overview: Option<&str>) -> String {
    let overview = overview.unwrap_or("No description available");
    if overview.chars().count() > OVERVIEW_LIMIT {
        let mut cut: String = overview.chars().take(OVERVIEW_LIMIT).collect();
        cut.push_str("...");
        cut
    } else {
        overview.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn avatar() -> MovieDetails {
        serde_json::from_str(
            r#"{"id": 19995, "title": "Avatar", "release_date": "2009-12-15",
                "vote_average": 7.6, "overview": "En el exuberante mundo de Pandora.",
                "runtime": 162, "poster_path": "/kyeqWdyUXW608qlYkRqosgbbJyK.jpg"}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_movie_caption_layout() {
        let caption = movie_caption(&avatar());
        assert_eq!(
            caption,
            "🎬 *Avatar*\n\n📅 Año: 2009\n⭐ Calificación: 7.6/10\n⏱ Duración: 162 min\n\n📖 Descripción: En el exuberante mundo de Pandora."
        );
    }

    #[test]
    fn test_movie_caption_placeholders() {
        let bare = MovieDetails {
            id: 1,
            ..Default::default()
        };
        let caption = movie_caption(&bare);
        assert!(caption.starts_with("🎬 *Unknown Title*"));
        assert!(caption.contains("📅 Año: N/A\n"));
        assert!(caption.contains("⭐ Calificación: N/A/10\n"));
        assert!(caption.contains("⏱ Duración: N/A min"));
        assert!(caption.ends_with("📖 Descripción: No description available"));
    }

    #[test]
    fn test_integer_rating_keeps_json_form() {
        let m: MovieDetails =
            serde_json::from_str(r#"{"id": 1, "vote_average": 7.0}"#).unwrap();
        assert!(movie_caption(&m).contains("⭐ Calificación: 7.0/10"));
        let m: MovieDetails = serde_json::from_str(r#"{"id": 1, "vote_average": 0}"#).unwrap();
        assert!(movie_caption(&m).contains("⭐ Calificación: 0/10"));
    }

    #[test]
    fn test_series_caption_layout() {
        let series: SeriesDetails = serde_json::from_str(
            r#"{"id": 1399, "name": "Juego de tronos", "first_air_date": "2011-04-17",
                "vote_average": 8.4, "number_of_seasons": 8, "number_of_episodes": 73,
                "overview": "Siete casas nobles luchan por el Trono de Hierro."}"#,
        )
        .unwrap();
        assert_eq!(
            series_caption(&series),
            "📺 *Juego de tronos*\n\n📅 Año: 2011\n⭐ Calificación: 8.4/10\n📚 Temporadas: 8\n🎭 Episodios: 73\n\n📖 Descripción: Siete casas nobles luchan por el Trono de Hierro."
        );
    }

    #[test]
    fn test_overview_truncated_at_200_chars() {
        let mut m = avatar();
        m.overview = Some("á".repeat(250));
        let caption = movie_caption(&m);
        let overview = caption.split("📖 Descripción: ").nth(1).unwrap();
        assert_eq!(overview.chars().count(), 203);
        assert!(overview.ends_with("..."));

        m.overview = Some("b".repeat(200));
        let caption = movie_caption(&m);
        assert!(!caption.ends_with("..."));
    }

    #[test]
    fn test_poster_url() {
        assert_eq!(
            poster_url("https://image.tmdb.org/t/p/w500", Some("/abc.jpg")),
            "https://image.tmdb.org/t/p/w500/abc.jpg"
        );
        assert_eq!(poster_url("https://image.tmdb.org/t/p/w500", Some("")), "");
        assert_eq!(poster_url("https://image.tmdb.org/t/p/w500", None), "");
    }
}
