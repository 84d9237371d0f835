//! Nullable session store — thread-safe in-memory storage for testing.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use phillet_session::{SessionError, SessionStore};
use phillet_types::{Session, User};

#[derive(Default)]
struct Stored {
    session: Option<Session>,
    user: Option<User>,
}

/// An in-memory [`SessionStore`] that counts writes and can be told to fail.
#[derive(Default)]
pub struct NullSessionStore {
    stored: Mutex<Stored>,
    saves: AtomicUsize,
    clears: AtomicUsize,
    failing: AtomicBool,
}

impl NullSessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `session`, as if persisted by an earlier run.
    pub fn with_session(session: Session) -> Self {
        let store = Self::new();
        store.lock().session = Some(session);
        store
    }

    fn lock(&self) -> MutexGuard<'_, Stored> {
        self.stored
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Make every subsequent write fail with an I/O error.
    pub fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn stored(&self) -> Option<Session> {
        self.lock().session.clone()
    }

    pub fn stored_user(&self) -> Option<User> {
        self.lock().user.clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn clear_count(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }

    fn check_writable(&self) -> Result<(), SessionError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SessionError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "session store is read-only",
            )));
        }
        Ok(())
    }
}

impl SessionStore for NullSessionStore {
    fn load(&self) -> Result<Option<Session>, SessionError> {
        Ok(self.stored())
    }

    fn save(&self, session: &Session) -> Result<(), SessionError> {
        self.check_writable()?;
        self.lock().session = Some(session.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        self.check_writable()?;
        let mut stored = self.lock();
        stored.session = None;
        stored.user = None;
        self.clears.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn load_user(&self) -> Result<Option<User>, SessionError> {
        Ok(self.stored_user())
    }

    fn save_user(&self, user: &User) -> Result<(), SessionError> {
        self.check_writable()?;
        self.lock().user = Some(user.clone());
        Ok(())
    }
}
