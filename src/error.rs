//! Error types for the catalog store, the metadata provider and the chat
//! transport.
//!
//! These are the seams where callers need to branch on the kind of
//! failure. Application plumbing (config, CLI, bootstrap) uses
//! `anyhow::Result` instead.

use thiserror::Error;

use crate::models::MediaKind;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing database failed; fatal to the current operation.
    #[error("storage unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),

    /// A title with the same (kind, external id) pair is already stored.
    #[error("{kind} with external id {external_id} already exists")]
    Conflict { kind: MediaKind, external_id: i64 },

    /// An episode was added under a title id that does not exist.
    #[error("no title with id {title_id}")]
    UnknownTitle { title_id: i64 },

    /// An in-memory lock was poisoned by a panicking writer.
    #[error("storage lock poisoned")]
    Poisoned,
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider answered, and the record does not exist.
    #[error("not found")]
    NotFound,

    /// Transport failure, auth failure, or any non-success status.
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// The provider answered with a body we could not read.
    #[error("invalid provider response: {0}")]
    Decode(String),
}

impl ProviderError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound)
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The Bot API returned `ok: false`.
    #[error("chat api error {code}: {description}")]
    Api { code: i64, description: String },
}

pub type TransportResult<T> = Result<T, TransportError>;
