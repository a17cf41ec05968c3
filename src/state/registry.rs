//! Session registry: the process-wide directory of live sessions.
//!
//! # Thread Safety
//!
//! Every operation, reads included, takes the same lock. Listing and fan-out
//! copy what they need while holding it and iterate the copy afterwards, so a
//! snapshot is never invalidated by a concurrent connect or disconnect.
//! The lock is never held across an `.await`.

use crate::error::{ChatError, ChatResult};
use crate::state::session::{Identity, Mailbox, Session, SessionInfo};
use parking_lot::Mutex;
use std::collections::BTreeMap;

/// Identity-keyed map of live sessions.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<BTreeMap<Identity, Session>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a session. Fails if its identity is already live.
    pub fn register(&self, session: Session) -> ChatResult {
        let mut sessions = self.sessions.lock();
        if sessions.contains_key(&session.identity) {
            return Err(ChatError::DuplicateIdentity(session.identity));
        }
        sessions.insert(session.identity.clone(), session);
        crate::metrics::set_connected_sessions(sessions.len());
        Ok(())
    }

    /// Remove a session, returning it.
    ///
    /// `NotFound` when someone else already removed it; callers treat that
    /// as a benign race.
    pub fn unregister(&self, identity: &Identity) -> ChatResult<Session> {
        let mut sessions = self.sessions.lock();
        let removed = sessions
            .remove(identity)
            .ok_or_else(|| ChatError::NotFound(identity.clone()))?;
        crate::metrics::set_connected_sessions(sessions.len());
        Ok(removed)
    }

    /// Change the display name in place, returning the previous one.
    pub fn rename(&self, identity: &Identity, new_name: impl Into<String>) -> ChatResult<String> {
        let mut sessions = self.sessions.lock();
        let session = sessions
            .get_mut(identity)
            .ok_or_else(|| ChatError::NotFound(identity.clone()))?;
        Ok(std::mem::replace(&mut session.display_name, new_name.into()))
    }

    pub fn display_name(&self, identity: &Identity) -> Option<String> {
        self.sessions
            .lock()
            .get(identity)
            .map(|s| s.display_name.clone())
    }

    pub fn contains(&self, identity: &Identity) -> bool {
        self.sessions.lock().contains_key(identity)
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    /// Copy of every (identity, display name) pair, ordered by identity.
    pub fn snapshot(&self) -> Vec<SessionInfo> {
        self.sessions.lock().values().map(Session::info).collect()
    }

    /// Copy of every mailbox, for fan-out.
    pub fn mailboxes(&self) -> Vec<(Identity, Mailbox)> {
        self.sessions
            .lock()
            .values()
            .map(|s| (s.identity.clone(), s.mailbox.clone()))
            .collect()
    }
}
