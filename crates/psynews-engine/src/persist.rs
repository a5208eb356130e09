//! Content-store persistence: load-or-create and atomic replace.
//!
//! Each run reads the full prior store, computes the new store value, and
//! writes it back as a whole-file replace (temp file + rename) so a
//! concurrently triggered run can never observe a half-written document.

use std::path::Path;

use psynews_core::ContentStore;

use crate::error::EngineError;

/// Load the persisted store, or a fresh empty one on first run.
///
/// # Errors
///
/// A store that exists but fails to parse or validate is
/// [`EngineError::StoreCorrupt`] — fatal for the run, no merge is attempted.
pub fn load_store(path: &Path) -> Result<ContentStore, EngineError> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "no existing store, starting fresh");
        return Ok(ContentStore::default());
    }

    let raw = std::fs::read_to_string(path).map_err(|source| EngineError::StoreRead {
        path: path.to_path_buf(),
        source,
    })?;

    let store: ContentStore =
        serde_json::from_str(&raw).map_err(|e| EngineError::StoreCorrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    store.validate().map_err(|e| EngineError::StoreCorrupt {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    tracing::debug!(
        path = %path.display(),
        articles = store.total_articles,
        "loaded content store"
    );
    Ok(store)
}

/// Persist the store atomically: serialize, write a sibling temp file, then
/// rename over the target.
///
/// # Errors
///
/// Returns [`EngineError::StoreWrite`] on any I/O failure and
/// [`EngineError::Serialize`] if the store cannot be serialized.
pub fn save_store(path: &Path, store: &ContentStore) -> Result<(), EngineError> {
    let json = serde_json::to_string_pretty(store)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|source| EngineError::StoreWrite {
                path: path.to_path_buf(),
                source,
            })?;
        }
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = std::path::PathBuf::from(tmp);

    std::fs::write(&tmp, json).map_err(|source| EngineError::StoreWrite {
        path: tmp.clone(),
        source,
    })?;
    std::fs::rename(&tmp, path).map_err(|source| EngineError::StoreWrite {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(path = %path.display(), articles = store.total_articles, "store saved");
    Ok(())
}
