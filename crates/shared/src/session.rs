use std::cell::RefCell;
use std::collections::HashMap;

use crate::error::StorageError;
use crate::models::Pin;

/// Key/value persistence for the session (browser `localStorage` in the web app).
pub trait SessionStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-process storage, used by tests and non-browser hosts.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: RefCell<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn with_value(key: &str, value: &str) -> Self {
        let storage = MemoryStorage::default();
        storage
            .values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        storage
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }
}

impl SessionStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.get(key))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values.borrow_mut().remove(key);
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub username: Option<String>,
}

impl Session {
    pub fn is_logged_in(&self) -> bool {
        self.username.is_some()
    }

    /// Whether `pin` belongs to the current user. Gates the owner-only
    /// edit/delete controls on a pin popup.
    pub fn is_owner(&self, pin: &Pin) -> bool {
        self.username.as_deref() == Some(pin.username.as_str())
    }
}

/// Current user, mirrored into persisted storage.
///
/// Storage failures never surface to the caller: a failed read is treated as
/// "nobody logged in" and a failed write only loses persistence across reloads.
pub struct SessionStore<S> {
    storage: S,
    key: String,
    session: Session,
}

impl<S: SessionStorage> SessionStore<S> {
    pub fn new(storage: S, key: impl Into<String>) -> Self {
        SessionStore {
            storage,
            key: key.into(),
            session: Session::default(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn restore(&mut self) -> &Session {
        let username = match self.storage.read(&self.key) {
            Ok(value) => value.filter(|name| !name.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "could not read stored session, starting logged out");
                None
            }
        };
        self.session = Session { username };
        &self.session
    }

    pub fn login(&mut self, username: impl Into<String>) -> &Session {
        let username = username.into();
        if let Err(e) = self.storage.write(&self.key, &username) {
            tracing::warn!(error = %e, "could not persist session");
        }
        tracing::info!(%username, "logged in");
        self.session = Session {
            username: Some(username),
        };
        &self.session
    }

    pub fn logout(&mut self) -> &Session {
        if let Err(e) = self.storage.remove(&self.key) {
            tracing::warn!(error = %e, "could not clear stored session");
        }
        self.session = Session::default();
        &self.session
    }
}
