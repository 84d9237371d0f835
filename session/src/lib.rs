//! Session token store for the Phillet client.
//!
//! The session (access token, refresh token, expiry) survives restarts of
//! the client. All reads and writes go through the [`SessionStore`] trait so
//! the gateway client and the stores never touch storage directly.

pub mod error;
pub mod file;
pub mod store;

pub use error::SessionError;
pub use file::FileSessionStore;
pub use store::{SessionStore, KEY_ACCESS_TOKEN, KEY_EXPIRES_AT, KEY_REFRESH_TOKEN, KEY_USER};
