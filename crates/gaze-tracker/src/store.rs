//! Calibration persistence over a generic key-value byte store.
//!
//! Loading never fails from the caller's point of view: a missing key,
//! unreadable bytes, or a malformed document all mean "no calibration",
//! which is the identity transform.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use gazetile_common::error::{GazeError, GazeResult};
use gazetile_model::affine::AffineTransform;

/// Key under which the current correction is stored.
pub const CALIBRATION_KEY: &str = "eye-gaze-affine-v1";

/// A byte store keyed by string.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> GazeResult<Option<Vec<u8>>>;

    fn set(&mut self, key: &str, value: &[u8]) -> GazeResult<()>;

    fn remove(&mut self, key: &str) -> GazeResult<()>;
}

/// In-process store, lost when dropped.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> GazeResult<Option<Vec<u8>>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &[u8]) -> GazeResult<()> {
        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> GazeResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> GazeResult<PathBuf> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(GazeError::store(format!("invalid store key: {key:?}")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> GazeResult<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &[u8]) -> GazeResult<()> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(path, value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> GazeResult<()> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Reads and writes the current correction.
#[derive(Debug, Clone)]
pub struct CalibrationStore<K> {
    store: K,
    key: String,
}

impl<K: KeyValueStore> CalibrationStore<K> {
    pub fn new(store: K) -> Self {
        Self::with_key(store, CALIBRATION_KEY)
    }

    pub fn with_key(store: K, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// The stored correction, or `None` if absent or unusable.
    pub fn load_stored(&self) -> Option<AffineTransform> {
        let bytes = match self.store.get(&self.key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Failed to read stored calibration");
                return None;
            }
        };

        match serde_json::from_slice::<AffineTransform>(&bytes) {
            Ok(transform) if transform.is_finite() => Some(transform),
            Ok(_) => {
                tracing::warn!(key = %self.key, "Stored calibration has non-finite coefficients");
                None
            }
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Stored calibration is malformed");
                None
            }
        }
    }

    /// The stored correction, falling back to identity.
    pub fn load(&self) -> AffineTransform {
        self.load_stored().unwrap_or(AffineTransform::IDENTITY)
    }

    pub fn save(&mut self, transform: &AffineTransform) -> GazeResult<()> {
        let bytes = serde_json::to_vec(transform)?;
        self.store.set(&self.key, &bytes)?;
        tracing::info!(key = %self.key, "Calibration saved");
        Ok(())
    }

    /// Forget the stored correction.
    pub fn clear(&mut self) -> GazeResult<()> {
        self.store.remove(&self.key)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn inner(&self) -> &K {
        &self.store
    }
}
