//! In-memory editing sessions.
//!
//! A session keeps the uploaded source, its extracted layout and the
//! extraction warnings while a caller edits values. Each session has its
//! own lock, so operations on one session are serialized while other
//! sessions proceed in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::{Mutex, RwLock};
use uuid::Uuid;

use crate::config::SessionOptions;
use crate::error::{Error, Result};
use crate::model::{LayoutModel, SourceDocument, Warning};

/// One uploaded document and its extracted layout.
#[derive(Debug)]
pub struct Session {
    pub id: Uuid,
    pub source: SourceDocument,
    pub layout: LayoutModel,
    /// Warnings reported by extraction
    pub warnings: Vec<Warning>,
    pub created_at: DateTime<Utc>,
    last_access: DateTime<Utc>,
    closed: bool,
}

impl Session {
    fn new(source: SourceDocument, layout: LayoutModel, warnings: Vec<Warning>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            source,
            layout,
            warnings,
            created_at: now,
            last_access: now,
            closed: false,
        }
    }

    pub fn last_access(&self) -> DateTime<Utc> {
        self.last_access
    }

    fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.last_access > ttl
    }
}

type SessionHandle = Arc<Mutex<Session>>;

/// Sessions keyed by id, with idle expiry.
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, SessionHandle>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(options: &SessionOptions) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl: options.ttl,
        }
    }

    /// Idle time after which a session is gone.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Store a new session and return its id.
    pub fn create(
        &self,
        source: SourceDocument,
        layout: LayoutModel,
        warnings: Vec<Warning>,
    ) -> Uuid {
        let session = Session::new(source, layout, warnings);
        let id = session.id;
        self.sessions.write().insert(id, Arc::new(Mutex::new(session)));
        log::debug!("created session {}", id);
        id
    }

    /// Run `f` on a session while holding its lock.
    ///
    /// Fails with [`Error::SessionNotFound`] for unknown, expired or
    /// cleared sessions.
    pub fn with_session<T>(&self, id: Uuid, f: impl FnOnce(&Session) -> Result<T>) -> Result<T> {
        let handle = self.handle(id)?;
        let mut session = handle.lock();

        if session.closed {
            return Err(not_found(id));
        }
        let now = Utc::now();
        if session.is_expired(now, self.ttl) {
            session.closed = true;
            self.sessions.write().remove(&id);
            log::debug!("session {} expired", id);
            return Err(not_found(id));
        }

        session.last_access = now;
        f(&session)
    }

    /// Close and drop a session, waiting for any operation in progress.
    pub fn remove(&self, id: Uuid) -> Result<()> {
        let handle = self.handle(id)?;
        let mut session = handle.lock();
        if session.closed {
            return Err(not_found(id));
        }
        session.closed = true;
        self.sessions.write().remove(&id);
        log::debug!("cleared session {}", id);
        Ok(())
    }

    /// Drop expired sessions that are not in use. Returns how many went.
    pub fn cleanup_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, handle| match handle.try_lock() {
            Some(mut session) if session.is_expired(now, self.ttl) => {
                session.closed = true;
                false
            }
            _ => true,
        });
        let removed = before - sessions.len();
        if removed > 0 {
            log::info!("removed {} expired sessions", removed);
        }
        removed
    }

    /// Number of stored sessions, expired ones included until cleaned up.
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    fn handle(&self, id: Uuid) -> Result<SessionHandle> {
        self.sessions
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(&SessionOptions::default())
    }
}

fn not_found(id: Uuid) -> Error {
    Error::SessionNotFound(id.to_string())
}
