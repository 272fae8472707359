//! Inbound event dispatch.
//!
//! [`Router::handle`] is the error boundary of the bot: every failure below
//! it is logged and answered with a user-facing message, and nothing is
//! propagated to the polling loop.
//!
//! | Event | Handler |
//! |-------|---------|
//! | `/start`, `/help`, `/search` | public |
//! | `/stats`, `/delete_media`, `/delete_all`, `/add_movie`, `/add_series`, `/add_episode` | admin only |
//! | document or video in the ingest chat | [`IndexingManager::file_received`] |
//! | `download_*`, `episode_*`, `back_*` buttons | [`Retrieval`] |
//! | `select_*`, `manual_id`, `noop` buttons | [`IndexingManager::select`] |

use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::callback::{candidates_keyboard, download_keyboard, episodes_keyboard, CallbackAction};
use crate::config::Config;
use crate::error::StoreResult;
use crate::indexing::{AttachOutcome, IndexingManager, Selection, SelectionOutcome, Upload};
use crate::messages;
use crate::models::MediaKind;
use crate::retrieval::{DownloadView, EpisodeView, Retrieval};
use crate::store::CatalogStore;
use crate::transport::{
    ChatId, ChatTransport, InboundEvent, InlineKeyboard, MessageRef, TextFormat,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandName {
    Start,
    Help,
    Search,
    Stats,
    DeleteMedia,
    DeleteAll,
    AddMovie,
    AddSeries,
    AddEpisode,
}

impl CommandName {
    pub fn admin_only(&self) -> bool {
        !matches!(
            self,
            CommandName::Start | CommandName::Help | CommandName::Search
        )
    }
}

/// A slash command split into name and whitespace-separated arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: CommandName,
    pub args: Vec<String>,
}

impl Command {
    /// Parse `/name[@bot] args...`. Unknown commands yield `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.split_whitespace();
        let head = parts.next()?.strip_prefix('/')?;
        let head = head.split('@').next().unwrap_or(head).to_ascii_lowercase();

        let name = match head.as_str() {
            "start" => CommandName::Start,
            "help" => CommandName::Help,
            "search" => CommandName::Search,
            "stats" => CommandName::Stats,
            "delete_media" => CommandName::DeleteMedia,
            "delete_all" => CommandName::DeleteAll,
            "add_movie" => CommandName::AddMovie,
            "add_series" => CommandName::AddSeries,
            "add_episode" => CommandName::AddEpisode,
            _ => return None,
        };

        Some(Command {
            name,
            args: parts.map(str::to_string).collect(),
        })
    }

    fn arg<T: std::str::FromStr>(&self, index: usize) -> Option<Result<T, T::Err>> {
        self.args.get(index).map(|a| a.parse())
    }
}

/// Chat ids and limits the router needs from the configuration.
#[derive(Debug, Clone, Copy)]
pub struct RouterSettings {
    pub admin_id: i64,
    pub database_group_id: ChatId,
    pub search_result_limit: usize,
}

impl RouterSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            admin_id: config.telegram.admin_id,
            database_group_id: config.telegram.database_group_id,
            search_result_limit: config.indexing.search_result_limit,
        }
    }
}

pub struct Router {
    transport: Arc<dyn ChatTransport>,
    store: Arc<dyn CatalogStore>,
    indexing: IndexingManager,
    retrieval: Retrieval,
    settings: RouterSettings,
}

impl Router {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        store: Arc<dyn CatalogStore>,
        indexing: IndexingManager,
        settings: RouterSettings,
    ) -> Self {
        Self {
            retrieval: Retrieval::new(store.clone()),
            transport,
            store,
            indexing,
            settings,
        }
    }

    pub fn indexing(&self) -> &IndexingManager {
        &self.indexing
    }

    pub async fn handle(&self, event: InboundEvent) {
        match event {
            InboundEvent::Command {
                chat_id,
                user_id,
                text,
            } => self.on_command(chat_id, user_id, &text).await,
            InboundEvent::Upload {
                chat_id,
                user_id,
                message_id,
                file_id,
                file_name,
            } => {
                if chat_id != self.settings.database_group_id {
                    debug!(chat_id, "Ignoring upload outside the ingest chat");
                    return;
                }
                let upload = Upload {
                    file_id,
                    file_name,
                    message_id,
                };
                self.on_upload(chat_id, user_id, upload).await
            }
            InboundEvent::ButtonPress {
                callback_id,
                user_id,
                message,
                payload,
            } => {
                if let Err(e) = self.transport.answer_callback(&callback_id).await {
                    debug!(error = %e, "Could not answer callback");
                }
                match CallbackAction::parse(&payload) {
                    Some(action) => self.on_button(user_id, message, action).await,
                    None => debug!(payload = %payload, "Unknown button payload"),
                }
            }
        }
    }

    // ============ Outbound helpers ============

    async fn reply(&self, chat_id: ChatId, text: &str) {
        self.send(chat_id, text, TextFormat::Plain, None).await;
    }

    async fn send(
        &self,
        chat_id: ChatId,
        text: &str,
        format: TextFormat,
        keyboard: Option<&InlineKeyboard>,
    ) {
        if let Err(e) = self
            .transport
            .send_message(chat_id, text, format, keyboard)
            .await
        {
            warn!(chat_id, error = %e, "Failed to send message");
        }
    }

    /// Replace the text of the pressed message, or message the user
    /// directly when there is none or it cannot be edited (e.g. it carries
    /// a photo).
    async fn edit(
        &self,
        user_id: i64,
        message: Option<MessageRef>,
        text: &str,
        format: TextFormat,
        keyboard: Option<&InlineKeyboard>,
    ) {
        if let Some(message) = message {
            match self
                .transport
                .edit_message_text(message, text, format, keyboard)
                .await
            {
                Ok(()) => return,
                Err(e) => debug!(error = %e, "Edit failed, sending instead"),
            }
        }
        self.send(user_id, text, format, keyboard).await;
    }

    // ============ Commands ============

    async fn on_command(&self, chat_id: ChatId, user_id: i64, text: &str) {
        let Some(command) = Command::parse(text) else {
            debug!(text, "Ignoring unknown command");
            return;
        };
        if command.name.admin_only() && user_id != self.settings.admin_id {
            self.reply(chat_id, messages::ADMIN_ONLY).await;
            return;
        }

        match command.name {
            CommandName::Start => {
                self.send(chat_id, messages::START, TextFormat::Markdown, None)
                    .await
            }
            CommandName::Help => {
                self.send(chat_id, messages::HELP, TextFormat::Markdown, None)
                    .await
            }
            CommandName::Search => self.search(chat_id, &command.args.join(" ")).await,
            CommandName::Stats => self.stats(chat_id).await,
            CommandName::DeleteMedia => self.delete_media(chat_id, &command).await,
            CommandName::DeleteAll => self.delete_all(chat_id, &command).await,
            CommandName::AddMovie => self.add(chat_id, MediaKind::Movie, &command).await,
            CommandName::AddSeries => self.add(chat_id, MediaKind::Series, &command).await,
            CommandName::AddEpisode => self.add_episode(chat_id, user_id, &command).await,
        }
    }

    async fn search(&self, chat_id: ChatId, query: &str) {
        if query.is_empty() {
            self.reply(chat_id, messages::SEARCH_USAGE).await;
            return;
        }

        let results = match self.store.search_titles(query).await {
            Ok(results) => results,
            Err(e) => {
                error!(query, error = %e, "Search failed");
                self.reply(chat_id, messages::SEARCH_FAILED).await;
                return;
            }
        };
        if results.is_empty() {
            self.reply(chat_id, messages::SEARCH_EMPTY).await;
            return;
        }

        for title in results.iter().take(self.settings.search_result_limit) {
            let keyboard = download_keyboard(title.id);
            if !title.poster_url.is_empty() {
                match self
                    .transport
                    .send_photo(chat_id, &title.poster_url, &title.caption, Some(&keyboard))
                    .await
                {
                    Ok(_) => continue,
                    Err(e) => warn!(title_id = title.id, error = %e, "Error sending poster"),
                }
            }
            self.send(chat_id, &title.caption, TextFormat::Markdown, Some(&keyboard))
                .await;
        }
    }

    async fn stats(&self, chat_id: ChatId) {
        match self.store.stats().await {
            Ok(stats) => {
                self.reply(chat_id, &messages::stats(stats.titles, stats.episodes))
                    .await
            }
            Err(e) => {
                error!(error = %e, "Stats failed");
                self.reply(chat_id, messages::STATS_FAILED).await;
            }
        }
    }

    async fn delete_media(&self, chat_id: ChatId, command: &Command) {
        let id = match command.arg::<i64>(0) {
            None => return self.reply(chat_id, messages::DELETE_USAGE).await,
            Some(Err(_)) => return self.reply(chat_id, messages::INVALID_ID).await,
            Some(Ok(id)) => id,
        };

        match self.delete_title_report(id).await {
            Ok(text) => self.reply(chat_id, &text).await,
            Err(e) => {
                error!(title_id = id, error = %e, "Delete failed");
                self.reply(chat_id, messages::DELETE_FAILED).await;
            }
        }
    }

    async fn delete_title_report(&self, id: i64) -> StoreResult<String> {
        let Some(title) = self.store.title_by_id(id).await? else {
            return Ok(messages::not_found_id(id));
        };
        Ok(if self.store.delete_title(id).await? {
            messages::deleted(&title.name, id)
        } else {
            messages::delete_missed(id)
        })
    }

    async fn delete_all(&self, chat_id: ChatId, command: &Command) {
        let confirmed = command
            .args
            .first()
            .is_some_and(|a| a.to_lowercase() == "confirmar");
        if !confirmed {
            self.reply(chat_id, messages::DELETE_ALL_CONFIRM).await;
            return;
        }

        match self.delete_all_report().await {
            Ok(text) => self.reply(chat_id, &text).await,
            Err(e) => {
                error!(error = %e, "Delete all failed");
                self.reply(chat_id, messages::DELETE_ALL_FAILED).await;
            }
        }
    }

    async fn delete_all_report(&self) -> StoreResult<String> {
        let before = self.store.stats().await?;
        let removed = self.store.delete_all_titles().await?;
        Ok(messages::deleted_all(removed, before.titles, before.episodes))
    }

    async fn add(&self, chat_id: ChatId, kind: MediaKind, command: &Command) {
        let external_id = match command.arg::<i64>(0) {
            None => return self.reply(chat_id, messages::add_usage(kind)).await,
            Some(Err(_)) => return self.reply(chat_id, messages::INVALID_TMDB_ID).await,
            Some(Ok(id)) => id,
        };

        match self.indexing.add_by_external_id(kind, external_id).await {
            Ok(outcome) => {
                if let Some(text) = selection_message(outcome, false) {
                    self.reply(chat_id, &text).await;
                }
            }
            Err(e) => {
                error!(kind = %kind, external_id, error = %e, "Add failed");
                self.reply(chat_id, messages::add_failed(kind)).await;
            }
        }
    }

    async fn add_episode(&self, chat_id: ChatId, user_id: i64, command: &Command) {
        let parsed = (
            command.arg::<i64>(0),
            command.arg::<i32>(1),
            command.arg::<i32>(2),
        );
        let (title_id, season, episode) = match parsed {
            (None, _, _) | (Some(Ok(_)), Some(Ok(_)), None) => {
                return self.reply(chat_id, messages::ATTACH_USAGE).await
            }
            (Some(Ok(id)), None, None) => (id, None, None),
            (Some(Ok(id)), Some(Ok(s)), Some(Ok(e))) => (id, Some(s), Some(e)),
            _ => return self.reply(chat_id, messages::INVALID_ID).await,
        };

        let text = match self
            .indexing
            .attach_episode(user_id, title_id, season, episode)
            .await
        {
            Ok(AttachOutcome::NoSession) => messages::ATTACH_NO_SESSION.to_string(),
            Ok(AttachOutcome::TitleNotFound) => messages::not_found_id(title_id),
            Ok(AttachOutcome::NotASeries) => messages::not_a_series(title_id),
            Ok(AttachOutcome::MissingNumbers) => messages::ATTACH_MISSING_NUMBERS.to_string(),
            Ok(AttachOutcome::Attached {
                episode_id,
                series,
                season,
                episode,
            }) => messages::episode_attached(&series, season, episode, episode_id),
            Err(e) => {
                error!(title_id, error = %e, "Attach episode failed");
                messages::ATTACH_FAILED.to_string()
            }
        };
        self.reply(chat_id, &text).await;
    }

    // ============ Uploads ============

    async fn on_upload(&self, chat_id: ChatId, user_id: i64, upload: Upload) {
        let outcome = self.indexing.file_received(user_id, upload).await;

        let mut text = messages::new_file(&outcome.session.file_name);
        if outcome.movie_lookup_failed || outcome.series_lookup_failed {
            text.push_str("\n\n");
            text.push_str(messages::NEW_FILE_LOOKUP_FAILED);
        }
        let keyboard = candidates_keyboard(&outcome.movies, &outcome.series);
        self.send(chat_id, &text, TextFormat::Plain, Some(&keyboard))
            .await;
    }

    // ============ Buttons ============

    async fn on_button(&self, user_id: i64, message: Option<MessageRef>, action: CallbackAction) {
        // Download buttons also sit under channel posts, which must not be
        // rewritten for everyone; those answers go to the user's private chat.
        let private = message.filter(|m| m.chat_id == user_id);
        match action {
            CallbackAction::Download(title_id) => self.download(user_id, private, title_id).await,
            CallbackAction::Episode(episode_id) => {
                self.episode(user_id, private, episode_id).await
            }
            CallbackAction::Back(title_id) => self.back(user_id, private, title_id).await,
            CallbackAction::SelectMovie(id) => {
                self.select(user_id, message, Selection::Candidate(MediaKind::Movie, id))
                    .await
            }
            CallbackAction::SelectSeries(id) => {
                self.select(user_id, message, Selection::Candidate(MediaKind::Series, id))
                    .await
            }
            CallbackAction::ManualId => self.select(user_id, message, Selection::Manual).await,
            CallbackAction::Noop => self.select(user_id, message, Selection::Noop).await,
        }
    }

    async fn download(&self, user_id: i64, message: Option<MessageRef>, title_id: i64) {
        let view = match self.retrieval.download(title_id).await {
            Ok(view) => view,
            Err(e) => {
                error!(title_id, error = %e, "Download lookup failed");
                return self.edit_plain(user_id, message, messages::REQUEST_FAILED).await;
            }
        };

        match view {
            DownloadView::NotFound => {
                self.edit_plain(user_id, message, messages::CONTENT_NOT_FOUND)
                    .await
            }
            DownloadView::Unavailable => {
                self.edit_plain(user_id, message, messages::FILE_UNAVAILABLE)
                    .await
            }
            DownloadView::NoEpisodes { .. } => {
                self.edit_plain(user_id, message, messages::NO_EPISODES)
                    .await
            }
            DownloadView::EpisodeList { title, seasons } => {
                let keyboard = episodes_keyboard(title.id, &seasons);
                self.edit(
                    user_id,
                    message,
                    &messages::pick_episode(&title.name),
                    TextFormat::Plain,
                    Some(&keyboard),
                )
                .await
            }
            DownloadView::SendFile { file_id, caption } => {
                self.deliver(user_id, message, &file_id, &caption, messages::FILE_SENT)
                    .await
            }
        }
    }

    async fn episode(&self, user_id: i64, message: Option<MessageRef>, episode_id: i64) {
        let view = match self.retrieval.episode(episode_id).await {
            Ok(view) => view,
            Err(e) => {
                error!(episode_id, error = %e, "Episode lookup failed");
                return self.edit_plain(user_id, message, messages::REQUEST_FAILED).await;
            }
        };

        match view {
            EpisodeView::NotFound => {
                self.edit_plain(user_id, message, messages::EPISODE_NOT_FOUND)
                    .await
            }
            EpisodeView::SeriesMissing => {
                self.edit_plain(user_id, message, messages::CONTENT_NOT_FOUND)
                    .await
            }
            EpisodeView::Unavailable => {
                self.edit_plain(user_id, message, messages::EPISODE_UNAVAILABLE)
                    .await
            }
            EpisodeView::SendFile { file_id, caption } => {
                self.deliver(user_id, message, &file_id, &caption, messages::EPISODE_SENT)
                    .await
            }
        }
    }

    async fn back(&self, user_id: i64, message: Option<MessageRef>, title_id: i64) {
        match self.retrieval.back(title_id).await {
            Ok(Some(title)) => {
                let keyboard = download_keyboard(title.id);
                self.edit(
                    user_id,
                    message,
                    &title.caption,
                    TextFormat::Markdown,
                    Some(&keyboard),
                )
                .await
            }
            Ok(None) => {
                self.edit_plain(user_id, message, messages::CONTENT_NOT_FOUND)
                    .await
            }
            Err(e) => {
                error!(title_id, error = %e, "Back lookup failed");
                self.edit_plain(user_id, message, messages::REQUEST_FAILED)
                    .await
            }
        }
    }

    /// Send a stored file to the user's private chat.
    async fn deliver(
        &self,
        user_id: i64,
        message: Option<MessageRef>,
        file_id: &str,
        caption: &str,
        done: &str,
    ) {
        match self.transport.send_document(user_id, file_id, caption).await {
            Ok(_) => self.edit_plain(user_id, message, done).await,
            Err(e) => {
                error!(user_id, error = %e, "Error sending file");
                self.edit_plain(user_id, message, messages::REQUEST_FAILED)
                    .await
            }
        }
    }

    async fn select(&self, user_id: i64, message: Option<MessageRef>, selection: Selection) {
        match self.indexing.select(user_id, selection).await {
            Ok(outcome) => {
                if let Some(text) = selection_message(outcome, true) {
                    self.edit_plain(user_id, message, &text).await;
                }
            }
            Err(e) => {
                error!(user_id, error = %e, "Selection failed");
                let text = match selection {
                    Selection::Candidate(kind, _) => messages::add_failed(kind),
                    _ => messages::REQUEST_FAILED,
                };
                self.edit_plain(user_id, message, text).await;
            }
        }
    }

    async fn edit_plain(&self, user_id: i64, message: Option<MessageRef>, text: &str) {
        self.edit(user_id, message, text, TextFormat::Plain, None)
            .await
    }
}

/// Admin-facing text for an indexing outcome; `None` when nothing is shown.
fn selection_message(outcome: SelectionOutcome, from_upload: bool) -> Option<String> {
    let text = match outcome {
        SelectionOutcome::SessionExpired => messages::SESSION_EXPIRED.to_string(),
        SelectionOutcome::ManualEntry => messages::MANUAL_ENTRY.to_string(),
        SelectionOutcome::Ignored => return None,
        SelectionOutcome::DetailsUnavailable {
            unreachable: true, ..
        } => messages::TMDB_UNREACHABLE.to_string(),
        SelectionOutcome::DetailsUnavailable { kind, .. } => {
            messages::details_unavailable(kind).to_string()
        }
        SelectionOutcome::AlreadyExists { kind, title_id } => {
            messages::already_exists(kind, title_id)
        }
        SelectionOutcome::Added {
            kind,
            title_id,
            announced,
        } => messages::added(kind, title_id, announced, from_upload),
    };
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexing::test_support::FakeProvider;
    use crate::models::NewTitle;
    use crate::session::SessionStore;
    use crate::store::test_support::{episode, movie, series};
    use crate::store::InMemoryStore;
    use crate::transport::test_support::{RecordingTransport, Sent};
    use crate::transport::ChannelAnnouncer;
    use std::time::Duration;

    const ADMIN: i64 = 1;
    const GROUP: ChatId = -200;
    const CHANNEL: ChatId = -300;
    const USER: i64 = 99;

    struct Harness {
        transport: Arc<RecordingTransport>,
        store: Arc<InMemoryStore>,
        router: Router,
    }

    fn harness_with(transport: RecordingTransport, provider: FakeProvider) -> Harness {
        let transport = Arc::new(transport);
        let store = Arc::new(InMemoryStore::new());
        let announcer = Arc::new(ChannelAnnouncer::new(transport.clone(), CHANNEL));
        let indexing = IndexingManager::new(
            store.clone(),
            Arc::new(provider),
            announcer,
            SessionStore::new(Duration::from_secs(3600)),
            "https://image.tmdb.org/t/p/w500",
            3,
        );
        let router = Router::new(
            transport.clone(),
            store.clone(),
            indexing,
            RouterSettings {
                admin_id: ADMIN,
                database_group_id: GROUP,
                search_result_limit: 5,
            },
        );
        Harness {
            transport,
            store,
            router,
        }
    }

    fn harness() -> Harness {
        harness_with(RecordingTransport::default(), FakeProvider::default())
    }

    fn command(user_id: i64, text: &str) -> InboundEvent {
        InboundEvent::Command {
            chat_id: user_id,
            user_id,
            text: text.to_string(),
        }
    }

    fn press(user_id: i64, payload: &str) -> InboundEvent {
        InboundEvent::ButtonPress {
            callback_id: "cb".into(),
            user_id,
            message: Some(MessageRef {
                chat_id: user_id,
                message_id: 500,
            }),
            payload: payload.to_string(),
        }
    }

    fn upload(chat_id: ChatId, file_name: &str) -> InboundEvent {
        InboundEvent::Upload {
            chat_id,
            user_id: ADMIN,
            message_id: 7,
            file_id: "uploaded-file".into(),
            file_name: file_name.into(),
        }
    }

    #[test]
    fn test_command_parse() {
        let c = Command::parse("/search el señor de los anillos").unwrap();
        assert_eq!(c.name, CommandName::Search);
        assert_eq!(c.args, vec!["el", "señor", "de", "los", "anillos"]);

        let c = Command::parse("/Stats@CatalogBot").unwrap();
        assert_eq!(c.name, CommandName::Stats);
        assert!(c.args.is_empty());

        assert!(Command::parse("/unknown").is_none());
        assert!(Command::parse("search Avatar").is_none());
        assert!(Command::parse("").is_none());
    }

    #[test]
    fn test_admin_only_commands() {
        assert!(!CommandName::Search.admin_only());
        assert!(!CommandName::Start.admin_only());
        assert!(CommandName::DeleteAll.admin_only());
        assert!(CommandName::AddEpisode.admin_only());
    }

    #[tokio::test]
    async fn test_admin_gate() {
        let h = harness();
        h.router.handle(command(USER, "/stats")).await;
        h.router.handle(command(ADMIN, "/stats@CatalogBot")).await;
        assert_eq!(
            h.transport.texts(),
            vec![
                messages::ADMIN_ONLY.to_string(),
                messages::stats(0, 0)
            ]
        );
    }

    #[tokio::test]
    async fn test_search_limits_results_and_handles_empty() {
        let h = harness();
        h.router.handle(command(USER, "/search")).await;
        h.router.handle(command(USER, "/search nada")).await;
        for i in 0..7 {
            h.store
                .add_title(&movie(&format!("Saga {}", i), i))
                .await
                .unwrap();
        }
        h.router.handle(command(USER, "/search saga")).await;

        let texts = h.transport.texts();
        assert_eq!(texts[0], messages::SEARCH_USAGE);
        assert_eq!(texts[1], messages::SEARCH_EMPTY);
        // Posterless titles go out as text, newest first.
        assert_eq!(texts.len(), 2 + 5);
        assert_eq!(texts[2], "🎬 *Saga 6*");
    }

    #[tokio::test]
    async fn test_search_falls_back_when_photo_fails() {
        let h = harness_with(RecordingTransport::failing_photos(), FakeProvider::default());
        let with_poster = NewTitle {
            poster_url: "https://img/avatar.jpg".into(),
            ..movie("Avatar", 1)
        };
        let id = h.store.add_title(&with_poster).await.unwrap();
        h.router.handle(command(USER, "/search avatar")).await;

        match &h.transport.sent()[0] {
            Sent::Message { text, keyboard, .. } => {
                assert_eq!(text, "🎬 *Avatar*");
                let keyboard = keyboard.as_ref().unwrap();
                assert_eq!(
                    keyboard.inline_keyboard[0][0].callback_data,
                    format!("download_{}", id)
                );
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_delete_commands() {
        let h = harness();
        let id = h.store.add_title(&series("Lost", 4)).await.unwrap();
        h.store.add_episode(&episode(id, 1, 1)).await.unwrap();
        h.store.add_title(&movie("Avatar", 5)).await.unwrap();

        h.router.handle(command(ADMIN, "/delete_media")).await;
        h.router.handle(command(ADMIN, "/delete_media abc")).await;
        h.router.handle(command(ADMIN, "/delete_media 999")).await;
        h.router
            .handle(command(ADMIN, &format!("/delete_media {}", id)))
            .await;
        h.router.handle(command(ADMIN, "/delete_all")).await;
        h.router.handle(command(ADMIN, "/delete_all CONFIRMAR")).await;

        assert_eq!(
            h.transport.texts(),
            vec![
                messages::DELETE_USAGE.to_string(),
                messages::INVALID_ID.to_string(),
                messages::not_found_id(999),
                messages::deleted("Lost", id),
                messages::DELETE_ALL_CONFIRM.to_string(),
                messages::deleted_all(1, 1, 0),
            ]
        );
        assert_eq!(h.store.stats().await.unwrap().titles, 0);
    }

    #[tokio::test]
    async fn test_upload_outside_ingest_chat_is_ignored() {
        let h = harness();
        h.router.handle(upload(-999, "Avatar.mkv")).await;
        assert!(h.transport.sent().is_empty());
        assert!(h.router.indexing().sessions().is_empty());
    }

    #[tokio::test]
    async fn test_upload_then_select_publishes() {
        let provider = FakeProvider {
            movie_hits: vec![crate::provider::Candidate {
                kind: MediaKind::Movie,
                external_id: 19995,
                title: "Avatar".into(),
                date: Some("2009-12-15".into()),
            }],
            ..FakeProvider::default().with_movie(19995, "Avatar")
        };
        let h = harness_with(RecordingTransport::default(), provider);

        h.router.handle(upload(GROUP, "Avatar.2009.1080p.mkv")).await;
        match &h.transport.sent()[0] {
            Sent::Message {
                chat_id,
                text,
                keyboard,
            } => {
                assert_eq!(*chat_id, GROUP);
                assert_eq!(text, &messages::new_file("Avatar.2009.1080p.mkv"));
                let rows = &keyboard.as_ref().unwrap().inline_keyboard;
                assert_eq!(rows[1][0].callback_data, "select_movie_19995");
            }
            other => panic!("unexpected {:?}", other),
        }

        h.router.handle(press(ADMIN, "select_movie_19995")).await;
        let sent = h.transport.sent();
        assert!(sent.contains(&Sent::Photo {
            chat_id: CHANNEL,
            photo: "https://image.tmdb.org/t/p/w500/19995.jpg".into(),
            caption: crate::captions::movie_caption(&crate::provider::MovieDetails {
                id: 19995,
                title: Some("Avatar".into()),
                release_date: Some("2009-12-15".into()),
                poster_path: Some("/19995.jpg".into()),
                ..Default::default()
            }),
        }));
        let last = h.transport.texts().pop().unwrap();
        assert!(last.starts_with("✅ Película añadida exitosamente con ID"));
        assert!(h.router.indexing().sessions().is_empty());
    }

    #[tokio::test]
    async fn test_selection_without_session() {
        let h = harness();
        h.router.handle(press(ADMIN, "select_tv_1399")).await;
        assert_eq!(h.transport.sent()[0], Sent::Answer("cb".into()));
        assert_eq!(h.transport.texts(), vec![messages::SESSION_EXPIRED]);
        assert_eq!(h.store.stats().await.unwrap().titles, 0);
    }

    #[tokio::test]
    async fn test_download_movie_and_series() {
        let h = harness();
        let movie_id = h.store.add_title(&movie("Avatar", 1)).await.unwrap();
        let series_id = h.store.add_title(&series("Lost", 2)).await.unwrap();
        let ep = h.store.add_episode(&episode(series_id, 1, 1)).await.unwrap();

        h.router
            .handle(press(USER, &format!("download_{}", movie_id)))
            .await;
        h.router
            .handle(press(USER, &format!("download_{}", series_id)))
            .await;
        h.router.handle(press(USER, &format!("episode_{}", ep))).await;
        h.router.handle(press(USER, "download_12345")).await;

        let sent: Vec<Sent> = h
            .transport
            .sent()
            .into_iter()
            .filter(|s| !matches!(s, Sent::Answer(_)))
            .collect();
        assert_eq!(
            sent[0],
            Sent::Document {
                chat_id: USER,
                file_id: "file-1".into(),
                caption: "🎬 *Avatar*".into()
            }
        );
        assert!(matches!(&sent[1], Sent::Edit { text, .. } if text == messages::FILE_SENT));
        match &sent[2] {
            Sent::Edit { text, keyboard, .. } => {
                assert_eq!(text, &messages::pick_episode("Lost"));
                let rows = &keyboard.as_ref().unwrap().inline_keyboard;
                assert_eq!(rows[0][0].callback_data, format!("episode_{}", ep));
                assert_eq!(rows[1][0].callback_data, format!("back_{}", series_id));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            sent[3],
            Sent::Document {
                chat_id: USER,
                file_id: format!("ep-{}-1-1", series_id),
                caption: "Lost - S01E01: Episode 1x1".into()
            }
        );
        assert!(matches!(&sent[5], Sent::Edit { text, .. } if text == messages::CONTENT_NOT_FOUND));
    }

    #[tokio::test]
    async fn test_channel_post_is_not_edited() {
        let h = harness();
        let id = h.store.add_title(&movie("Avatar", 1)).await.unwrap();
        h.router
            .handle(InboundEvent::ButtonPress {
                callback_id: "cb".into(),
                user_id: USER,
                message: Some(MessageRef {
                    chat_id: CHANNEL,
                    message_id: 3,
                }),
                payload: format!("download_{}", id),
            })
            .await;

        let sent = h.transport.sent();
        assert!(!sent.iter().any(|s| matches!(s, Sent::Edit { .. })));
        assert_eq!(
            sent.last().unwrap(),
            &Sent::Message {
                chat_id: USER,
                text: messages::FILE_SENT.into(),
                keyboard: None
            }
        );
    }

    #[tokio::test]
    async fn test_add_commands() {
        let h = harness_with(
            RecordingTransport::default(),
            FakeProvider::default().with_series(1399, "Juego de tronos"),
        );
        h.router.handle(command(ADMIN, "/add_series")).await;
        h.router.handle(command(ADMIN, "/add_series xyz")).await;
        h.router.handle(command(ADMIN, "/add_movie 5")).await;
        h.router.handle(command(ADMIN, "/add_series 1399")).await;
        h.router.handle(command(ADMIN, "/add_series 1399")).await;

        let texts = h.transport.texts();
        assert_eq!(texts[0], messages::add_usage(MediaKind::Series));
        assert_eq!(texts[1], messages::INVALID_TMDB_ID);
        assert_eq!(texts[2], messages::details_unavailable(MediaKind::Movie));
        // Announcement without poster goes to the channel as text first.
        assert!(texts[3].starts_with("📺 *Juego de tronos*"));
        assert!(texts[4].starts_with("Serie añadida exitosamente con ID"));
        assert!(texts[5].starts_with("Esta serie ya está en la base de datos"));
    }

    #[tokio::test]
    async fn test_add_with_tmdb_down_says_so() {
        let provider = FakeProvider {
            offline: true,
            ..Default::default()
        };
        let h = harness_with(RecordingTransport::default(), provider);
        h.router.handle(command(ADMIN, "/add_movie 5")).await;

        assert_eq!(h.transport.texts(), vec![messages::TMDB_UNREACHABLE.to_string()]);
        assert_eq!(h.store.stats().await.unwrap().titles, 0);
    }

    #[tokio::test]
    async fn test_add_episode_rejects_out_of_range_numbers() {
        let h = harness();
        let id = h.store.add_title(&series("Lost", 2)).await.unwrap();
        h.router.handle(upload(GROUP, "Lost.S02E05.mkv")).await;
        h.router
            .handle(command(ADMIN, &format!("/add_episode {} 4294967298 3", id)))
            .await;
        h.router
            .handle(command(ADMIN, &format!("/add_episode {} 1 -2147483649", id)))
            .await;

        let texts = h.transport.texts();
        let tail = &texts[texts.len() - 2..];
        assert_eq!(tail, [messages::INVALID_ID, messages::INVALID_ID]);
        assert!(h.store.episodes_for_title(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_episode_command() {
        let h = harness();
        let id = h.store.add_title(&series("Lost", 2)).await.unwrap();

        h.router.handle(command(ADMIN, "/add_episode")).await;
        h.router
            .handle(command(ADMIN, &format!("/add_episode {}", id)))
            .await;
        h.router.handle(upload(GROUP, "Lost.S02E05.mkv")).await;
        h.router
            .handle(command(ADMIN, &format!("/add_episode {}", id)))
            .await;

        let texts = h.transport.texts();
        assert_eq!(texts[0], messages::ATTACH_USAGE);
        assert_eq!(texts[1], messages::ATTACH_NO_SESSION);
        let episodes = h.store.episodes_for_title(id).await.unwrap();
        assert_eq!(episodes.len(), 1);
        assert_eq!(
            texts.last().unwrap(),
            &messages::episode_attached("Lost", 2, 5, episodes[0].id)
        );
        assert_eq!(episodes[0].file(), Some("uploaded-file"));
    }
}
