//! Telegram Bot API client.
//!
//! Every call is a JSON `POST {api_base}/bot{token}/{method}`. The API
//! answers with an envelope `{ok, result, description, error_code}`, also
//! on HTTP 4xx, so the body is decoded before the status is considered.
//!
//! Only the fields the bot reads are modelled; everything else in an
//! update is ignored by serde.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use crate::config::TelegramConfig;
use crate::error::{TransportError, TransportResult};
use crate::transport::{
    ChatId, ChatTransport, InboundEvent, InlineKeyboard, MessageRef, TextFormat,
};

/// File name used for videos sent without one.
const DEFAULT_VIDEO_NAME: &str = "video.mp4";
const DEFAULT_DOCUMENT_NAME: &str = "document";

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<User>,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub document: Option<Document>,
    #[serde(default)]
    pub video: Option<Video>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    pub file_id: String,
    #[serde(default)]
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Video {
    pub file_id: String,
    #[serde(default)]
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub data: Option<String>,
}

impl Update {
    /// Decode into a router event. Updates the bot does not act on yield `None`.
    pub fn into_event(self) -> Option<InboundEvent> {
        if let Some(query) = self.callback_query {
            return Some(InboundEvent::ButtonPress {
                callback_id: query.id,
                user_id: query.from.id,
                message: query.message.map(|m| MessageRef {
                    chat_id: m.chat.id,
                    message_id: m.message_id,
                }),
                payload: query.data.unwrap_or_default(),
            });
        }

        let message = self.message?;
        let chat_id = message.chat.id;
        let user_id = message.from.as_ref().map_or(chat_id, |u| u.id);

        let upload = match (message.document, message.video) {
            (Some(doc), _) => Some((
                doc.file_id,
                doc.file_name
                    .unwrap_or_else(|| DEFAULT_DOCUMENT_NAME.to_string()),
            )),
            (None, Some(video)) => Some((
                video.file_id,
                video
                    .file_name
                    .unwrap_or_else(|| DEFAULT_VIDEO_NAME.to_string()),
            )),
            (None, None) => None,
        };
        if let Some((file_id, file_name)) = upload {
            return Some(InboundEvent::Upload {
                chat_id,
                user_id,
                message_id: message.message_id,
                file_id,
                file_name,
            });
        }

        let text = message.text.filter(|t| t.starts_with('/'))?;
        Some(InboundEvent::Command {
            chat_id,
            user_id,
            text,
        })
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<i64>,
}

#[derive(Serialize)]
struct GetUpdates {
    offset: i64,
    timeout: u64,
    allowed_updates: [&'static str; 2],
}

pub struct TelegramClient {
    http: Client,
    base: String,
    poll_timeout: u64,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig, token: &str) -> anyhow::Result<Self> {
        // The HTTP timeout must outlast the long-poll window.
        let http = Client::builder()
            .timeout(Duration::from_secs(config.poll_timeout_secs + 10))
            .build()?;

        Ok(Self {
            http,
            base: format!("{}/bot{}", config.api_base.trim_end_matches('/'), token),
            poll_timeout: config.poll_timeout_secs,
        })
    }

    async fn call<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: &str,
        body: &B,
    ) -> TransportResult<T> {
        debug!(method, "Bot API call");
        // The token is part of the URL; keep it out of error messages.
        let envelope: Envelope<T> = self
            .http
            .post(format!("{}/{}", self.base, method))
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::Http(e.without_url()))?
            .json()
            .await
            .map_err(|e| TransportError::Http(e.without_url()))?;

        match (envelope.ok, envelope.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(TransportError::Api {
                code: envelope.error_code.unwrap_or_default(),
                description: envelope
                    .description
                    .unwrap_or_else(|| format!("{} returned no result", method)),
            }),
        }
    }

    /// Long-poll for updates after `offset`.
    pub async fn get_updates(&self, offset: i64) -> TransportResult<Vec<Update>> {
        self.call(
            "getUpdates",
            &GetUpdates {
                offset,
                timeout: self.poll_timeout,
                allowed_updates: ["message", "callback_query"],
            },
        )
        .await
    }

    /// The bot's own account, used as a token check at startup.
    pub async fn get_me(&self) -> TransportResult<User> {
        self.call("getMe", &json!({})).await
    }
}

/// Adds `parse_mode` and `reply_markup` to a request body when set.
fn decorate(
    mut body: Value,
    format: TextFormat,
    keyboard: Option<&InlineKeyboard>,
) -> TransportResult<Value> {
    if format == TextFormat::Markdown {
        body["parse_mode"] = json!("Markdown");
    }
    if let Some(keyboard) = keyboard {
        body["reply_markup"] = serde_json::to_value(keyboard).map_err(|e| TransportError::Api {
            code: 0,
            description: e.to_string(),
        })?;
    }
    Ok(body)
}

fn message_ref(message: Message) -> MessageRef {
    MessageRef {
        chat_id: message.chat.id,
        message_id: message.message_id,
    }
}

#[async_trait]
impl ChatTransport for TelegramClient {
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        format: TextFormat,
        keyboard: Option<&InlineKeyboard>,
    ) -> TransportResult<MessageRef> {
        let body = decorate(json!({"chat_id": chat_id, "text": text}), format, keyboard)?;
        let message: Message = self.call("sendMessage", &body).await?;
        Ok(message_ref(message))
    }

    async fn send_photo(
        &self,
        chat_id: ChatId,
        photo: &str,
        caption: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> TransportResult<MessageRef> {
        let body = decorate(
            json!({"chat_id": chat_id, "photo": photo, "caption": caption}),
            TextFormat::Markdown,
            keyboard,
        )?;
        let message: Message = self.call("sendPhoto", &body).await?;
        Ok(message_ref(message))
    }

    async fn send_document(
        &self,
        chat_id: ChatId,
        file_id: &str,
        caption: &str,
    ) -> TransportResult<MessageRef> {
        let body = decorate(
            json!({"chat_id": chat_id, "document": file_id, "caption": caption}),
            TextFormat::Markdown,
            None,
        )?;
        let message: Message = self.call("sendDocument", &body).await?;
        Ok(message_ref(message))
    }

    async fn edit_message_text(
        &self,
        message: MessageRef,
        text: &str,
        format: TextFormat,
        keyboard: Option<&InlineKeyboard>,
    ) -> TransportResult<()> {
        let body = decorate(
            json!({
                "chat_id": message.chat_id,
                "message_id": message.message_id,
                "text": text,
            }),
            format,
            keyboard,
        )?;
        // Result is the edited message, or `true` for inline messages.
        let _: Value = self.call("editMessageText", &body).await?;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> TransportResult<()> {
        let _: bool = self
            .call(
                "answerCallbackQuery",
                &json!({"callback_query_id": callback_id}),
            )
            .await?;
        Ok(())
    }
}
