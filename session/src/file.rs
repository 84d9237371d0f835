//! JSON-file session store.
//!
//! The file holds a flat key/value object under the fixed keys from
//! [`crate::store`]:
//!
//! ```json
//! { "accessToken": "...", "refreshToken": "...", "expiresAt": 1700000000000, "user": { ... } }
//! ```
//!
//! Writes go to a uniquely named sibling temp file which is then renamed
//! over the target, so a reader never observes a half-written session, even
//! with several processes sharing the file. A corrupt file is replaced by the
//! next write.

use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use phillet_types::{Session, Timestamp, User};

use crate::error::SessionError;
use crate::store::{SessionStore, KEY_ACCESS_TOKEN, KEY_EXPIRES_AT, KEY_REFRESH_TOKEN, KEY_USER};

const SESSION_KEYS: [&str; 3] = [KEY_ACCESS_TOKEN, KEY_REFRESH_TOKEN, KEY_EXPIRES_AT];

pub struct FileSessionStore {
    path: PathBuf,
    /// Serialises read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<Map<String, Value>, SessionError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        if contents.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(SessionError::Corrupt("expected a JSON object".into())),
            Err(e) => Err(SessionError::Corrupt(e.to_string())),
        }
    }

    fn write_entries(&self, entries: &Map<String, Value>) -> Result<(), SessionError> {
        if entries.is_empty() {
            return match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            };
        }

        let parent = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent)?;
                parent
            }
            None => Path::new("."),
        };

        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| SessionError::Serialization(e.to_string()))?;

        // Each write gets its own temp file so writers in other processes
        // never share one.
        let mut tmp = NamedTempFile::new_in(parent)?;
        tmp.write_all(json.as_bytes())?;
        tmp.as_file().sync_all()?;
        restrict_permissions(tmp.path())?;
        tmp.persist(&self.path).map_err(|e| SessionError::Io(e.error))?;
        Ok(())
    }

    fn update<F>(&self, apply: F) -> Result<(), SessionError>
    where
        F: FnOnce(&mut Map<String, Value>) -> Result<(), SessionError>,
    {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut entries = match self.read_entries() {
            Ok(entries) => entries,
            Err(SessionError::Corrupt(reason)) => {
                warn!(path = %self.path.display(), %reason, "discarding corrupt session file");
                Map::new()
            }
            Err(e) => return Err(e),
        };
        apply(&mut entries)?;
        self.write_entries(&entries)
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<Session>, SessionError> {
        let entries = self.read_entries()?;

        let access = entries.get(KEY_ACCESS_TOKEN).and_then(Value::as_str);
        let refresh = entries.get(KEY_REFRESH_TOKEN).and_then(Value::as_str);
        let expires = entries.get(KEY_EXPIRES_AT).and_then(parse_millis);

        match (access, refresh, expires) {
            (Some(access), Some(refresh), Some(expires)) if !access.is_empty() => {
                Ok(Some(Session::new(access, refresh, Timestamp::new(expires))))
            }
            _ => {
                debug!(path = %self.path.display(), "no complete session on disk");
                Ok(None)
            }
        }
    }

    fn save(&self, session: &Session) -> Result<(), SessionError> {
        self.update(|entries| {
            entries.insert(KEY_ACCESS_TOKEN.into(), Value::from(session.access_token.clone()));
            entries.insert(KEY_REFRESH_TOKEN.into(), Value::from(session.refresh_token.clone()));
            entries.insert(KEY_EXPIRES_AT.into(), Value::from(session.expires_at.as_millis()));
            Ok(())
        })
    }

    fn clear(&self) -> Result<(), SessionError> {
        self.update(|entries| {
            for key in SESSION_KEYS {
                entries.remove(key);
            }
            entries.remove(KEY_USER);
            Ok(())
        })
    }

    fn load_user(&self) -> Result<Option<User>, SessionError> {
        let entries = self.read_entries()?;
        match entries.get(KEY_USER) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| SessionError::Corrupt(format!("cached user: {e}"))),
        }
    }

    fn save_user(&self, user: &User) -> Result<(), SessionError> {
        let value =
            serde_json::to_value(user).map_err(|e| SessionError::Serialization(e.to_string()))?;
        self.update(|entries| {
            entries.insert(KEY_USER.into(), value);
            Ok(())
        })
    }
}

/// Expiry may be stored as a number or as a numeric string.
fn parse_millis(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<(), SessionError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<(), SessionError> {
    Ok(())
}
