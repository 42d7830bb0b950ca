//! In-memory map from user to in-progress wizard run.
//!
//! Sessions live for the lifetime of the process only. A restart silently
//! drops every unfinished run.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info};

use super::session::{UserId, WizardSession};

/// Synchronous session storage. Implementations must never suspend.
pub trait SessionStore: Send + Sync {
    fn get(&self, user: UserId) -> Option<WizardSession>;

    fn set(&self, user: UserId, session: WizardSession);

    /// Reset the user's idle clock and return the refreshed session.
    /// Rejected input counts as activity too.
    fn touch(&self, user: UserId) -> Option<WizardSession>;

    /// Remove the user's session. Returns whether one existed.
    fn delete(&self, user: UserId) -> bool;

    /// Number of unfinished runs.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop sessions untouched for longer than `max_idle`. Returns how many
    /// were dropped.
    fn purge_idle(&self, max_idle: Duration) -> usize;
}

/// Process-wide in-memory session map.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<UserId, WizardSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, user: UserId) -> Option<WizardSession> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        sessions.get(&user).cloned()
    }

    fn set(&self, user: UserId, session: WizardSession) {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.insert(user, session);
    }

    fn touch(&self, user: UserId) -> Option<WizardSession> {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let session = sessions.get_mut(&user)?;
        session.touch();
        Some(session.clone())
    }

    fn delete(&self, user: UserId) -> bool {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.remove(&user).is_some()
    }

    fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn purge_idle(&self, max_idle: Duration) -> usize {
        let Ok(max_idle) = chrono::Duration::from_std(max_idle) else {
            return 0;
        };
        let cutoff = Utc::now() - max_idle;
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|user, s| {
            let keep = s.touched_at >= cutoff;
            if !keep {
                debug!(user_id = %user, step = %s.step(), "Dropping idle wizard session");
            }
            keep
        });
        before - sessions.len()
    }
}

/// Spawn a background task that drops idle sessions every `interval`.
pub fn spawn_idle_sweeper(
    store: Arc<dyn SessionStore>,
    max_idle: Duration,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let purged = store.purge_idle(max_idle);
            if purged > 0 {
                info!(purged, remaining = store.len(), "Purged idle wizard sessions");
            }
        }
    })
}
