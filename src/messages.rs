//! User-facing texts.

use crate::models::MediaKind;

pub const START: &str = "🎬 Welcome to the Media Bot!

🔍 Use /search <movie/series name> to find content
📚 Use /help to see available commands
";

pub const HELP: &str = "Available Commands:
/start - Start the bot
/search <query> - Search for movies or series
/help - Show this help message

Admin Commands:
/add_movie <movie_id> - Add a movie by TMDB ID
/add_series <series_id> - Add a series by TMDB ID
/add_episode <media_id> [season episode] - Attach the pending upload as an episode
/delete_media <media_id> - Delete media by ID
/delete_all - Delete all media from database
/stats - Show database statistics
";

pub const ADMIN_ONLY: &str = "Solo los administradores pueden usar este comando.";

pub const SEARCH_USAGE: &str =
    "Por favor proporciona un término de búsqueda. Ejemplo: /search Avatar";
pub const SEARCH_EMPTY: &str = "No se encontraron resultados para tu búsqueda.";
pub const SEARCH_FAILED: &str = "Ocurrió un error al buscar.";

pub const DELETE_USAGE: &str =
    "Por favor proporciona el ID del contenido a eliminar. Ejemplo: /delete_media 123";
pub const INVALID_ID: &str = "Por favor proporciona un ID válido.";
pub const DELETE_FAILED: &str = "Ocurrió un error al eliminar el contenido.";
pub const DELETE_ALL_CONFIRM: &str = "⚠️ Esta acción eliminará TODO el contenido de la base de datos.
Para confirmar, usa: /delete_all confirmar";
pub const DELETE_ALL_FAILED: &str = "Ocurrió un error al eliminar todo el contenido.";
pub const STATS_FAILED: &str = "Ocurrió un error al obtener las estadísticas.";

pub const INVALID_TMDB_ID: &str = "Por favor proporciona un ID de TMDB válido.";

pub const ATTACH_USAGE: &str =
    "Por favor proporciona el ID de la serie. Ejemplo: /add_episode 12 1 3";
pub const ATTACH_NO_SESSION: &str =
    "No hay ningún archivo pendiente. Sube el episodio al grupo de base de datos primero.";
pub const ATTACH_MISSING_NUMBERS: &str =
    "No se pudo determinar la temporada y el episodio. Ejemplo: /add_episode 12 1 3";
pub const ATTACH_FAILED: &str = "Ocurrió un error al añadir el episodio.";

pub const TMDB_UNREACHABLE: &str =
    "No se pudo contactar con TMDB. Inténtalo de nuevo más tarde.";

pub const NEW_FILE_LOOKUP_FAILED: &str =
    "⚠️ No se pudo consultar TMDB. Los resultados pueden estar incompletos.";

pub const SESSION_EXPIRED: &str = "Sesión expirada. Por favor, sube el archivo nuevamente.";
pub const MANUAL_ENTRY: &str = "Por favor, ingresa el ID de TMDB:

Para películas: /add_movie <id>
Para series: /add_series <id>";

pub const CONTENT_NOT_FOUND: &str = "Contenido no encontrado.";
pub const EPISODE_NOT_FOUND: &str = "Episodio no encontrado.";
pub const NO_EPISODES: &str = "Esta serie aún no tiene episodios disponibles.";
pub const FILE_SENT: &str = "Archivo enviado. ¡Disfruta!";
pub const FILE_UNAVAILABLE: &str = "El archivo no está disponible actualmente.";
pub const EPISODE_SENT: &str = "Episodio enviado. ¡Disfruta!";
pub const EPISODE_UNAVAILABLE: &str = "El episodio no está disponible actualmente.";
pub const REQUEST_FAILED: &str = "Ocurrió un error al procesar tu solicitud.";

pub fn stats(titles: i64, episodes: i64) -> String {
    format!(
        "📊 Estadísticas de la Base de Datos:\n\nPelículas/Series: {}\nEpisodios: {}",
        titles, episodes
    )
}

pub fn not_found_id(id: i64) -> String {
    format!("No se encontró contenido con ID {}.", id)
}

pub fn deleted(name: &str, id: i64) -> String {
    format!("Contenido '{}' con ID {} eliminado exitosamente.", name, id)
}

pub fn delete_missed(id: i64) -> String {
    format!("No se pudo eliminar el contenido con ID {}.", id)
}

pub fn deleted_all(removed: u64, titles: i64, episodes: i64) -> String {
    format!(
        "✅ Se han eliminado {} entradas de la base de datos.\nArchivos de películas/series: {}\nEpisodios: {}",
        removed, titles, episodes
    )
}

pub fn add_usage(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Movie => {
            "Por favor proporciona el ID de TMDB de la película. Ejemplo: /add_movie 19995"
        }
        MediaKind::Series => {
            "Por favor proporciona el ID de TMDB de la serie. Ejemplo: /add_series 1399"
        }
    }
}

pub fn details_unavailable(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Movie => {
            "No se pudo obtener información de la película. Verifica el ID de TMDB."
        }
        MediaKind::Series => "No se pudo obtener información de la serie. Verifica el ID de TMDB.",
    }
}

pub fn already_exists(kind: MediaKind, title_id: i64) -> String {
    match kind {
        MediaKind::Movie => format!("Esta película ya está en la base de datos con ID {}.", title_id),
        MediaKind::Series => format!("Esta serie ya está en la base de datos con ID {}.", title_id),
    }
}

/// Success report after a title was stored. `confirmed` adds the check mark
/// used when the title came from an upload.
pub fn added(kind: MediaKind, title_id: i64, announced: bool, confirmed: bool) -> String {
    let noun = match kind {
        MediaKind::Movie => "Película",
        MediaKind::Series => "Serie",
    };
    if announced {
        let mark = if confirmed { "✅ " } else { "" };
        format!(
            "{}{} añadida exitosamente con ID {} y publicada en el canal.",
            mark, noun, title_id
        )
    } else {
        format!(
            "{} añadida con ID {} pero hubo un error al publicar en el canal.",
            noun, title_id
        )
    }
}

pub fn add_failed(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Movie => "Ocurrió un error al añadir la película.",
        MediaKind::Series => "Ocurrió un error al añadir la serie.",
    }
}

pub fn not_a_series(id: i64) -> String {
    format!("El contenido con ID {} no es una serie.", id)
}

pub fn episode_attached(series: &str, season: i32, episode: i32, episode_id: i64) -> String {
    format!(
        "✅ Episodio S{:02}E{:02} añadido a {} con ID {}.",
        season, episode, series, episode_id
    )
}

pub fn new_file(file_name: &str) -> String {
    format!(
        "Nuevo archivo detectado: {}\n\nResultados de búsqueda automatizada:",
        file_name
    )
}

pub fn pick_episode(series: &str) -> String {
    format!("Selecciona un episodio de {}:", series)
}
