//! The cart pointer: the last cart id this device used.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use biblio_core::CartId;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{StoreError, read_json, remove_file, write_json};

/// Persistent slot holding at most one cart id.
///
/// Alongside the id, the store counts how many times in a row the id was
/// used without the backend confirming it exists. Any [`set`](Self::set)
/// resets the count.
pub trait CartPointerStore: Send + Sync {
    /// The stored cart id, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn get(&self) -> Result<Option<CartId>, StoreError>;

    /// Store `cart_id`, replacing any previous value and resetting the
    /// unvalidated-use count.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn set(&self, cart_id: CartId) -> Result<(), StoreError>;

    /// Erase the stored id.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn clear(&self) -> Result<(), StoreError>;

    /// Record one more unvalidated use of the stored id and return the new
    /// count.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn record_unvalidated_use(&self) -> Result<u32, StoreError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
struct PointerState {
    cart_id: Option<CartId>,
    #[serde(default)]
    unvalidated_uses: u32,
}

// =============================================================================
// File-backed store
// =============================================================================

/// Pointer store backed by a small JSON file.
#[derive(Debug)]
pub struct FileCartPointerStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileCartPointerStore {
    /// Create a store at `path`. The file is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<PointerState, StoreError> {
        Ok(read_json(&self.path)?.unwrap_or_default())
    }
}

impl CartPointerStore for FileCartPointerStore {
    fn get(&self) -> Result<Option<CartId>, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.load()?.cart_id)
    }

    fn set(&self, cart_id: CartId) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        write_json(
            &self.path,
            &PointerState {
                cart_id: Some(cart_id),
                unvalidated_uses: 0,
            },
        )?;
        debug!(cart_id = %cart_id, "Stored cart pointer");
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        remove_file(&self.path)?;
        debug!("Cleared cart pointer");
        Ok(())
    }

    fn record_unvalidated_use(&self) -> Result<u32, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut state = self.load()?;
        state.unvalidated_uses = state.unvalidated_uses.saturating_add(1);
        write_json(&self.path, &state)?;
        Ok(state.unvalidated_uses)
    }
}

// =============================================================================
// In-memory store
// =============================================================================

/// Pointer store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryCartPointerStore {
    state: Mutex<PointerState>,
}

impl MemoryCartPointerStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already pointing at `cart_id`.
    #[must_use]
    pub fn with_cart(cart_id: CartId) -> Self {
        Self {
            state: Mutex::new(PointerState {
                cart_id: Some(cart_id),
                unvalidated_uses: 0,
            }),
        }
    }

    /// Current unvalidated-use count.
    #[must_use]
    pub fn unvalidated_uses(&self) -> u32 {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .unvalidated_uses
    }
}

impl CartPointerStore for MemoryCartPointerStore {
    fn get(&self) -> Result<Option<CartId>, StoreError> {
        Ok(self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cart_id)
    }

    fn set(&self, cart_id: CartId) -> Result<(), StoreError> {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = PointerState {
            cart_id: Some(cart_id),
            unvalidated_uses: 0,
        };
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = PointerState::default();
        Ok(())
    }

    fn record_unvalidated_use(&self) -> Result<u32, StoreError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.unvalidated_uses = state.unvalidated_uses.saturating_add(1);
        Ok(state.unvalidated_uses)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_round_trip_and_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("cart_prefs.json");

        let store = FileCartPointerStore::new(&path);
        assert_eq!(store.get().unwrap(), None);

        store.set(CartId::new(7)).unwrap();
        assert_eq!(store.get().unwrap(), Some(CartId::new(7)));

        // A fresh handle on the same file sees the same value.
        let reopened = FileCartPointerStore::new(&path);
        assert_eq!(reopened.get().unwrap(), Some(CartId::new(7)));
    }

    #[test]
    fn test_file_store_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCartPointerStore::new(dir.path().join("cart_prefs.json"));

        store.clear().unwrap();
        store.set(CartId::new(3)).unwrap();
        store.clear().unwrap();
        store.clear().unwrap();
        assert_eq!(store.get().unwrap(), None);
    }

    #[test]
    fn test_file_store_counts_and_resets_unvalidated_uses() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCartPointerStore::new(dir.path().join("cart_prefs.json"));

        store.set(CartId::new(7)).unwrap();
        assert_eq!(store.record_unvalidated_use().unwrap(), 1);
        assert_eq!(store.record_unvalidated_use().unwrap(), 2);
        assert_eq!(store.get().unwrap(), Some(CartId::new(7)));

        store.set(CartId::new(7)).unwrap();
        assert_eq!(store.record_unvalidated_use().unwrap(), 1);
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cart_prefs.json");
        std::fs::write(&path, b"not json").unwrap();

        let store = FileCartPointerStore::new(&path);
        assert!(matches!(store.get(), Err(StoreError::Serde(_))));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryCartPointerStore::with_cart(CartId::new(9));
        assert_eq!(store.get().unwrap(), Some(CartId::new(9)));
        assert_eq!(store.record_unvalidated_use().unwrap(), 1);
        assert_eq!(store.unvalidated_uses(), 1);

        store.clear().unwrap();
        assert_eq!(store.get().unwrap(), None);
        assert_eq!(store.unvalidated_uses(), 0);
    }
}
