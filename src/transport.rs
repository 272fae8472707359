//! Chat transport abstraction.
//!
//! The router talks to the chat platform only through [`ChatTransport`],
//! and receives platform events already decoded into [`InboundEvent`].
//! [`TelegramClient`](crate::telegram::TelegramClient) is the production
//! implementation; tests use a recording fake.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::callback::download_keyboard;
use crate::error::TransportResult;
use crate::indexing::{Announcement, Announcer};

pub type ChatId = i64;

/// How the text of a message is parsed by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    Plain,
    Markdown,
}

/// A message the bot can later edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineButton {
    pub fn new(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: callback_data.into(),
        }
    }
}

/// Rows of buttons attached under a message. Serializes as the Bot API
/// `InlineKeyboardMarkup` object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InlineKeyboard {
    pub inline_keyboard: Vec<Vec<InlineButton>>,
}

impl InlineKeyboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row(mut self, buttons: Vec<InlineButton>) -> Self {
        self.inline_keyboard.push(buttons);
        self
    }
}

/// Platform event after decoding, with everything the router needs.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// A text message starting with `/`.
    Command {
        chat_id: ChatId,
        user_id: i64,
        text: String,
    },
    /// A document or video posted to a chat.
    Upload {
        chat_id: ChatId,
        user_id: i64,
        message_id: i64,
        file_id: String,
        file_name: String,
    },
    /// An inline button press.
    ButtonPress {
        callback_id: String,
        user_id: i64,
        /// Message carrying the button; absent when the platform no longer
        /// exposes it.
        message: Option<MessageRef>,
        payload: String,
    },
}

/// Outbound operations the bot needs from the chat platform.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        format: TextFormat,
        keyboard: Option<&InlineKeyboard>,
    ) -> TransportResult<MessageRef>;

    /// Send a photo by URL with a Markdown caption.
    async fn send_photo(
        &self,
        chat_id: ChatId,
        photo: &str,
        caption: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> TransportResult<MessageRef>;

    /// Re-send a previously uploaded file by its handle, with a Markdown caption.
    async fn send_document(
        &self,
        chat_id: ChatId,
        file_id: &str,
        caption: &str,
    ) -> TransportResult<MessageRef>;

    async fn edit_message_text(
        &self,
        message: MessageRef,
        text: &str,
        format: TextFormat,
        keyboard: Option<&InlineKeyboard>,
    ) -> TransportResult<()>;

    /// Acknowledge a button press so the client stops its spinner.
    async fn answer_callback(&self, callback_id: &str) -> TransportResult<()>;
}

/// Publishes new titles to the official channel.
pub struct ChannelAnnouncer {
    transport: Arc<dyn ChatTransport>,
    channel_id: ChatId,
}

impl ChannelAnnouncer {
    pub fn new(transport: Arc<dyn ChatTransport>, channel_id: ChatId) -> Self {
        Self {
            transport,
            channel_id,
        }
    }
}

#[async_trait]
impl Announcer for ChannelAnnouncer {
    async fn announce(&self, announcement: &Announcement) -> bool {
        let keyboard = download_keyboard(announcement.title_id);
        let result = if announcement.poster_url.is_empty() {
            self.transport
                .send_message(
                    self.channel_id,
                    &announcement.caption,
                    TextFormat::Markdown,
                    Some(&keyboard),
                )
                .await
        } else {
            self.transport
                .send_photo(
                    self.channel_id,
                    &announcement.poster_url,
                    &announcement.caption,
                    Some(&keyboard),
                )
                .await
        };

        match result {
            Ok(_) => true,
            Err(e) => {
                warn!(
                    title_id = announcement.title_id,
                    channel_id = self.channel_id,
                    error = %e,
                    "Error publishing to channel"
                );
                false
            }
        }
    }
}
