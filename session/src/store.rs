//! The storage interface shared by every session backend.

use phillet_types::{Session, Timestamp, User};

use crate::error::SessionError;

/// Persisted key for the access token.
pub const KEY_ACCESS_TOKEN: &str = "accessToken";
/// Persisted key for the refresh token.
pub const KEY_REFRESH_TOKEN: &str = "refreshToken";
/// Persisted key for the access token expiry (epoch milliseconds).
pub const KEY_EXPIRES_AT: &str = "expiresAt";
/// Persisted key for the cached user projection.
pub const KEY_USER: &str = "user";

/// Durable storage for the single active session.
///
/// Implementations must make `save` atomic from a reader's point of view:
/// a concurrent `load` sees either the previous session or the new one,
/// never a mix of fields from both.
pub trait SessionStore: Send + Sync {
    /// Read the persisted session. Any missing field yields `Ok(None)`.
    fn load(&self) -> Result<Option<Session>, SessionError>;

    /// Persist all session fields in one step.
    fn save(&self, session: &Session) -> Result<(), SessionError>;

    /// Remove the session and the cached user.
    fn clear(&self) -> Result<(), SessionError>;

    fn load_user(&self) -> Result<Option<User>, SessionError>;

    fn save_user(&self, user: &User) -> Result<(), SessionError>;

    /// True iff a session is stored, carries an access token, and has not expired at `now`.
    fn is_authenticated_at(&self, now: Timestamp) -> bool {
        matches!(self.load(), Ok(Some(session)) if session.is_valid_at(now))
    }

    fn is_authenticated(&self) -> bool {
        self.is_authenticated_at(Timestamp::now())
    }
}
