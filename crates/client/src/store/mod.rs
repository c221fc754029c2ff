//! Local state that survives restarts: the cart pointer and the auth session.
//!
//! Both stores write small JSON files under the configured state directory.
//! Writes go to a temporary sibling file which is then renamed over the
//! target, so a crash never leaves a half-written file behind.

mod pointer;
mod session;

pub use pointer::{CartPointerStore, FileCartPointerStore, MemoryCartPointerStore};
pub use session::{Session, SessionStore};

use std::io;
use std::path::Path;

use thiserror::Error;

/// Errors from the local stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The backing file holds invalid JSON.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Read and decode a JSON file, treating a missing file as `None`.
fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Encode `value` and atomically replace `path` with it.
fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let bytes = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Delete `path`, treating a missing file as success.
fn remove_file(path: &Path) -> Result<(), StoreError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
