//! Pending indexing sessions, one per submitter.
//!
//! A session bridges "file uploaded" and "match confirmed". It is never
//! persisted. A new upload from the same submitter replaces the previous
//! session; sessions older than the configured TTL are treated as absent
//! and dropped by [`SessionStore::purge_expired`].

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Submitter identity (the chat user id).
pub type SubmitterId = i64;

/// What the bot remembers about an upload while the admin picks a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexingSession {
    pub file_id: String,
    pub file_name: String,
    /// Search query derived from `file_name`.
    pub query: String,
    /// Message that carried the upload.
    pub message_id: i64,
}

struct Entry {
    session: IndexingSession,
    inserted: Instant,
}

/// Session map keyed by submitter, with expiry.
pub struct SessionStore {
    ttl: Duration,
    entries: Mutex<HashMap<SubmitterId, Entry>>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SubmitterId, Entry>> {
        // The map holds plain data; a panic mid-update cannot leave it half-written.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_live(&self, entry: &Entry) -> bool {
        entry.inserted.elapsed() < self.ttl
    }

    /// Store `session` for `submitter`, returning the live session it replaced.
    pub fn insert(
        &self,
        submitter: SubmitterId,
        session: IndexingSession,
    ) -> Option<IndexingSession> {
        let entry = Entry {
            session,
            inserted: Instant::now(),
        };
        let previous = self.lock().insert(submitter, entry)?;
        self.is_live(&previous).then_some(previous.session)
    }

    /// The live session for `submitter`, if any. Expired sessions are dropped.
    pub fn get(&self, submitter: SubmitterId) -> Option<IndexingSession> {
        let mut entries = self.lock();
        let live = self.is_live(entries.get(&submitter)?);
        if live {
            entries.get(&submitter).map(|entry| entry.session.clone())
        } else {
            entries.remove(&submitter);
            None
        }
    }

    /// Remove and return the live session for `submitter`.
    #[cfg(test)]
    pub fn take(&self, submitter: SubmitterId) -> Option<IndexingSession> {
        let entry = self.lock().remove(&submitter)?;
        self.is_live(&entry).then_some(entry.session)
    }

    /// Remove the session for `submitter` only if it is still `expected`.
    ///
    /// Used after a commit so that an upload which arrived in the meantime
    /// is not thrown away.
    pub fn take_matching(&self, submitter: SubmitterId, expected: &IndexingSession) -> bool {
        let mut entries = self.lock();
        let matches = entries
            .get(&submitter)
            .is_some_and(|entry| &entry.session == expected);
        if matches {
            entries.remove(&submitter);
        }
        matches
    }

    /// Drop every expired session; returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.inserted.elapsed() < self.ttl);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
