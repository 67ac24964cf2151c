//! Local cart storage.
//!
//! The anonymous cart survives restarts by living in a single namespaced
//! JSON document. The persisted envelope is versioned so future schema
//! changes can migrate old carts instead of silently corrupting them;
//! legacy payloads written before versioning (a bare `{"items": […]}`) read
//! as version 0 and are upgraded on the next write.

use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use std::{fs, io};

use mockall::automock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use bodegon_core::cart::LocalCart;

/// The schema version this client writes.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Errors from the cart store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("cart storage i/o failed")]
    Io(#[from] io::Error),

    /// The stored document is not a cart in any known schema.
    #[error("stored cart is corrupt")]
    Corrupt(#[from] serde_json::Error),

    /// Written by a newer client; refusing to guess at its meaning.
    #[error("stored cart has schema version {0}, newer than this client")]
    UnsupportedVersion(u32),
}

/// Durable storage for the anonymous cart.
///
/// All operations are synchronous: the local cart persists on every
/// mutation, before control returns to the caller.
#[automock]
pub trait CartStorage: Send + Sync {
    /// The stored cart; empty if nothing was ever written.
    fn load(&self) -> Result<LocalCart, StorageError>;

    /// Persist the cart, replacing what was there.
    fn store(&self, cart: &LocalCart) -> Result<(), StorageError>;

    /// Destroy the stored cart (used after a successful sync-to-server).
    fn clear(&self) -> Result<(), StorageError>;
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedCart {
    #[serde(default)]
    version: u32,
    #[serde(flatten)]
    cart: LocalCart,
}

/// File-backed [`CartStorage`].
#[derive(Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CartStorage for JsonFileStorage {
    fn load(&self) -> Result<LocalCart, StorageError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                return Ok(LocalCart::new());
            }
            Err(error) => return Err(error.into()),
        };

        let persisted: PersistedCart = serde_json::from_str(&text)?;

        if persisted.version > CURRENT_SCHEMA_VERSION {
            return Err(StorageError::UnsupportedVersion(persisted.version));
        }

        Ok(persisted.cart)
    }

    fn store(&self, cart: &LocalCart) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let persisted = PersistedCart {
            version: CURRENT_SCHEMA_VERSION,
            cart: cart.clone(),
        };

        fs::write(&self.path, serde_json::to_string(&persisted)?)?;

        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}

/// In-memory [`CartStorage`] for tests and embedded use.
#[derive(Debug, Default)]
pub struct MemoryCartStorage {
    cart: Mutex<Option<LocalCart>>,
}

impl MemoryCartStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CartStorage for MemoryCartStorage {
    fn load(&self) -> Result<LocalCart, StorageError> {
        let guard = self.cart.lock().unwrap_or_else(PoisonError::into_inner);

        Ok(guard.clone().unwrap_or_default())
    }

    fn store(&self, cart: &LocalCart) -> Result<(), StorageError> {
        let mut guard = self.cart.lock().unwrap_or_else(PoisonError::into_inner);

        *guard = Some(cart.clone());

        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut guard = self.cart.lock().unwrap_or_else(PoisonError::into_inner);

        *guard = None;

        Ok(())
    }
}
