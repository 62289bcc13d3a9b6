//! Persistent Preference Store
//!
//! Best-effort durable storage for user preferences (favorite lists).
//!
//! ## Contract
//!
//! - [`Preferences::save`] never fails: write errors are logged and dropped,
//!   the in-memory state stays authoritative for the session.
//! - [`Preferences::load`] never fails: a missing key or unreadable value
//!   yields the caller's default.
//! - Without a backend ([`Preferences::unavailable`]) both are no-ops, so the
//!   rest of the engine runs unchanged where no durable storage exists.

mod backend;
mod error;

pub use backend::{FileBackend, MemoryBackend, PreferenceBackend};
pub use error::{PrefsError, PrefsResult};

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Storage key for the crypto favorites list
pub const CRYPTO_FAVORITES_KEY: &str = "cryptoFavorites";

/// Storage key for the weather favorites list
pub const WEATHER_FAVORITES_KEY: &str = "weatherFavorites";

/// Handle to the preference backend, cheap to clone
#[derive(Clone, Default)]
pub struct Preferences {
    backend: Option<Arc<dyn PreferenceBackend>>,
}

impl Preferences {
    /// Use the given backend for durable storage
    pub fn new(backend: Arc<dyn PreferenceBackend>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    /// Store preferences in a JSON document at `path`
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FileBackend::new(path)))
    }

    /// No durable storage: loads return defaults, saves are skipped
    pub fn unavailable() -> Self {
        Self { backend: None }
    }

    /// Whether a durable backend is attached
    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    /// Serialize `value` and write it under `key`
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let Some(backend) = &self.backend else {
            return;
        };

        let encoded = match serde_json::to_string(value) {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to serialize preference");
                return;
            }
        };

        match backend.write(key, &encoded) {
            Ok(()) => tracing::debug!(key, value = %encoded, "Saved preference"),
            Err(e) => tracing::warn!(key, error = %e, "Failed to save preference"),
        }
    }

    /// Read and decode the value under `key`, or return `default`
    pub fn load<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let Some(backend) = &self.backend else {
            return default;
        };

        match backend.read(key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!(key, error = %e, "Stored preference is malformed, using default");
                    default
                }
            },
            Ok(None) => default,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to load preference, using default");
                default
            }
        }
    }
}

impl fmt::Debug for Preferences {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Preferences")
            .field("available", &self.is_available())
            .finish()
    }
}
