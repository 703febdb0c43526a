use std::rc::Rc;

use log::{error, info};

pub const DEFAULT_TOKEN_SCHEME: &str = "Bearer";

/// A browser-origin scoped key/value slot store.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    /// `false` when the slot could not be removed.
    fn remove(&self, key: &str) -> bool;
}

/// `window.localStorage`. Every access goes back to the browser so a session cleared in one
/// place is seen by the next request everywhere.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalStorage;

impl LocalStorage {
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window().and_then(|window| window.local_storage().ok().flatten())
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        Self::storage().and_then(|storage| storage.get_item(key).ok().flatten())
    }

    fn set(&self, key: &str, value: &str) {
        match Self::storage() {
            Some(storage) => {
                if storage.set_item(key, value).is_err() {
                    error!("could not write {key} to local storage");
                }
            }
            None => error!("local storage is unavailable"),
        }
    }

    fn remove(&self, key: &str) -> bool {
        match Self::storage() {
            Some(storage) => {
                if storage.remove_item(key).is_err() {
                    error!("could not remove {key} from local storage");
                    return false;
                }
                true
            }
            None => {
                error!("local storage is unavailable");
                false
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub token_scheme: String,
}

impl Session {
    pub fn new(token: impl Into<String>, token_scheme: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            token_scheme: token_scheme.into(),
        }
    }

    pub fn header_value(&self) -> String {
        format!("{} {}", self.token_scheme, self.token)
    }

    /// Reads back the combined `"{scheme} {token}"` credential. A value without a scheme is a
    /// bare bearer token.
    fn parse(stored: &str) -> Option<Self> {
        let stored = stored.trim();
        if stored.is_empty() {
            return None;
        }
        match stored.split_once(' ') {
            Some((scheme, token)) if !token.trim().is_empty() => {
                Some(Self::new(token.trim(), scheme))
            }
            _ => Some(Self::new(stored, DEFAULT_TOKEN_SCHEME)),
        }
    }
}

/// Owns the session credential. Nothing else writes the slot.
#[derive(Clone)]
pub struct AuthStore {
    store: Rc<dyn KeyValueStore>,
    key: String,
}

impl AuthStore {
    pub fn new(store: Rc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn set_session(&self, token: &str, scheme: &str) {
        let session = Session::new(token, scheme);
        self.store.set(&self.key, &session.header_value());
        info!("session established");
    }

    pub fn session(&self) -> Option<Session> {
        self.store.get(&self.key).as_deref().and_then(Session::parse)
    }

    pub fn has_session(&self) -> bool {
        self.session().is_some()
    }

    pub fn authorization_header_value(&self) -> Option<String> {
        self.session().map(|session| session.header_value())
    }

    /// Idempotent: clearing an empty slot does nothing. Returns whether the slot is empty
    /// afterwards.
    pub fn clear_session(&self) -> bool {
        if self.store.get(&self.key).is_none() {
            return true;
        }
        if !self.store.remove(&self.key) {
            error!("stored session credential could not be cleared");
            return false;
        }
        info!("session cleared");
        true
    }
}

impl PartialEq for AuthStore {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.store, &other.store) && self.key == other.key
    }
}
