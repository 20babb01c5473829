//! Persistence for the session record so that a restart does not log the user
//! out or reset the inactivity countdown.

use std::{
    fmt::Debug,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};
#[cfg(test)]
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::Error;

/// The key under which the bearer token is stored.
pub const AUTH_TOKEN_KEY: &str = "authToken";
/// The key under which the JSON encoded user profile is stored.
pub const USER_KEY: &str = "user";
/// The key under which the RFC 3339 logout deadline is stored.
pub const LOGOUT_DEADLINE_KEY: &str = "logoutDeadline";

/// The three keyed values that make up a persisted session.
///
/// The record is always written and cleared as a whole.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(
        rename = "authToken",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub auth_token: Option<String>,
    #[serde(rename = "user", default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(
        rename = "logoutDeadline",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub logout_deadline: Option<String>,
}

impl SessionRecord {
    pub fn is_empty(&self) -> bool {
        self.auth_token.is_none() && self.user.is_none() && self.logout_deadline.is_none()
    }
}

/// Somewhere to keep the session record between restarts.
pub trait SessionStore: Send + Sync + Debug {
    /// Read the stored record, or an empty record if nothing is stored.
    fn load(&self) -> Result<SessionRecord, Error>;

    /// Replace the stored record.
    fn save(&self, record: &SessionRecord) -> Result<(), Error>;

    /// Remove every stored value.
    fn clear(&self) -> Result<(), Error>;
}

/// Stores the session record as a JSON file.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_owned(),
        }
    }

    fn temporary_path(&self) -> PathBuf {
        let mut path = self.path.clone().into_os_string();
        path.push(".tmp");
        path.into()
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<SessionRecord, Error> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                return Ok(SessionRecord::default());
            }
            Err(error) => return Err(Error::SessionStore(error.to_string())),
        };

        serde_json::from_str(&text).map_err(|error| Error::SessionStore(error.to_string()))
    }

    fn save(&self, record: &SessionRecord) -> Result<(), Error> {
        let text = serde_json::to_string_pretty(record)
            .map_err(|error| Error::SessionStore(error.to_string()))?;

        // Written to a sibling first so a crash never leaves half a record behind.
        let temporary_path = self.temporary_path();
        fs::write(&temporary_path, text).map_err(|error| Error::SessionStore(error.to_string()))?;
        fs::rename(&temporary_path, &self.path)
            .map_err(|error| Error::SessionStore(error.to_string()))
    }

    fn clear(&self) -> Result<(), Error> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(Error::SessionStore(error.to_string())),
        }
    }
}

/// Keeps the session record in memory.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    record: Mutex<SessionRecord>,
}

#[cfg(test)]
impl MemorySessionStore {
    pub fn with_record(record: SessionRecord) -> Self {
        Self {
            record: Mutex::new(record),
        }
    }
}

#[cfg(test)]
impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<SessionRecord, Error> {
        Ok(self
            .record
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, record: &SessionRecord) -> Result<(), Error> {
        *self.record.lock().unwrap_or_else(PoisonError::into_inner) = record.clone();
        Ok(())
    }

    fn clear(&self) -> Result<(), Error> {
        *self.record.lock().unwrap_or_else(PoisonError::into_inner) = SessionRecord::default();
        Ok(())
    }
}
