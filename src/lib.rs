//! # Media Catalog Bot
//!
//! A Telegram bot that turns a private upload group into a searchable
//! catalog of films and series.
//!
//! Admins drop a video or document into the ingest group. The bot cleans
//! the file name, looks up matching titles on TMDB and offers them as
//! buttons; picking one stores the title with the uploaded file and
//! announces it in the official channel. Anyone can then `/search` the
//! catalog and press "Descargar" to get the file back in a private chat.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌─────────────┐   ┌──────────────────┐
//! │  Telegram    │──▶│   Router    │──▶│ IndexingManager  │──▶ TMDB
//! │ (long poll)  │   │ commands /  │   │ sessions + dedup │
//! └──────────────┘   │  buttons    │   └────────┬─────────┘
//!        ▲           └──────┬──────┘            │
//!        │                  ▼                   ▼
//!        │           ┌─────────────┐     ┌────────────┐
//!        └───────────│  Retrieval  │────▶│   SQLite   │
//!                    └─────────────┘     │ media/eps  │
//!                                        └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! catalog-bot init                  # create database
//! export BOT_TOKEN=... TMDB_API_KEY=...
//! catalog-bot run                   # start polling
//! catalog-bot stats                 # check what's indexed
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Titles, episodes, media kinds |
//! | [`error`] | Store, provider and transport error types |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`store`] | Catalog store trait with SQLite and in-memory backends |
//! | [`filename`] | File name to search query heuristics |
//! | [`provider`] | Metadata provider abstraction |
//! | [`tmdb`] | TMDB client |
//! | [`captions`] | Announcement caption templates |
//! | [`session`] | Pending upload sessions with expiry |
//! | [`indexing`] | Upload → match → publish workflow |
//! | [`retrieval`] | Download and episode views |
//! | [`transport`] | Chat transport abstraction and channel announcer |
//! | [`telegram`] | Telegram Bot API client |
//! | [`callback`] | Button payloads and keyboards |
//! | [`messages`] | User-facing texts |
//! | [`router`] | Command and button dispatch |
//! | [`bot`] | Polling loop and wiring |
//! | [`stats`] | `catalog-bot stats` |
//! | [`catalog_cmd`] | `catalog-bot search`, `list-episodes`, `delete` |

pub mod bot;
pub mod callback;
pub mod captions;
pub mod catalog_cmd;
pub mod config;
pub mod db;
pub mod error;
pub mod filename;
pub mod indexing;
pub mod messages;
pub mod migrate;
pub mod models;
pub mod provider;
pub mod retrieval;
pub mod router;
pub mod session;
pub mod stats;
pub mod store;
pub mod telegram;
pub mod tmdb;
pub mod transport;
