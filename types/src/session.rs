//! Session credentials and the cached user projection.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::time::Timestamp;

/// The client's current authentication credential triple.
///
/// Exactly one session is active per client; its absence means the client
/// is unauthenticated. A session is always replaced as a whole, never
/// patched field by field.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token expiry, epoch milliseconds.
    pub expires_at: Timestamp,
}

impl Session {
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_at: Timestamp,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            expires_at,
        }
    }

    /// True iff an access token is present and `now` is before expiry.
    pub fn is_valid_at(&self, now: Timestamp) -> bool {
        !self.access_token.is_empty() && !self.expires_at.has_passed(now)
    }

    /// Whether a refresh token is available for a silent refresh.
    pub fn can_refresh(&self) -> bool {
        !self.refresh_token.is_empty()
    }
}

// Tokens never end up in logs.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Client-side projection of the server identity behind the active session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub permissions: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    /// "First Last", falling back to the email when both names are empty.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.email.clone()
        } else {
            full.to_string()
        }
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(expires_at: u64) -> Session {
        Session::new("access", "refresh", Timestamp::new(expires_at))
    }

    #[test]
    fn valid_before_expiry_only() {
        let s = session(10_000);
        assert!(s.is_valid_at(Timestamp::new(9_999)));
        assert!(!s.is_valid_at(Timestamp::new(10_000)));
    }

    #[test]
    fn empty_access_token_is_never_valid() {
        let s = Session::new("", "refresh", Timestamp::new(u64::MAX));
        assert!(!s.is_valid_at(Timestamp::EPOCH));
    }

    #[test]
    fn debug_redacts_tokens() {
        let rendered = format!("{:?}", Session::new("secret-a", "secret-r", Timestamp::new(1)));
        assert!(!rendered.contains("secret-a"));
        assert!(!rendered.contains("secret-r"));
    }

    #[test]
    fn session_uses_camel_case_keys() {
        let json = serde_json::to_value(session(42)).unwrap();
        assert_eq!(json["accessToken"], "access");
        assert_eq!(json["refreshToken"], "refresh");
        assert_eq!(json["expiresAt"], 42);
    }

    #[test]
    fn display_name_falls_back_to_email() {
        let mut user = User {
            id: "u1".into(),
            email: "ada@example.com".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            permissions: vec!["wallet:send".into()],
            created_at: Timestamp::EPOCH,
            updated_at: Timestamp::EPOCH,
        };
        assert_eq!(user.display_name(), "Ada Lovelace");
        assert!(user.has_permission("wallet:send"));

        user.first_name.clear();
        user.last_name.clear();
        assert_eq!(user.display_name(), "ada@example.com");
    }
}
