use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::RecorderError;

/// Key under which the interaction log is persisted.
pub const STORAGE_KEY: &str = "user-interactions";

/// Durable key/value slot on the client. Writes replace the whole value.
pub trait InteractionStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>, RecorderError>;
    fn save(&self, key: &str, value: &str) -> Result<(), RecorderError>;
}

/// One JSON file per key inside `dir`.
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

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl InteractionStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>, RecorderError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<(), RecorderError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// Process-local store, for tests and sessions that should not touch disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(key: &str, value: &str) -> Self {
        let store = Self::new();
        store.records.lock().insert(key.to_string(), value.to_string());
        store
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.records.lock().get(key).cloned()
    }
}

impl InteractionStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, RecorderError> {
        Ok(self.get(key))
    }

    fn save(&self, key: &str, value: &str) -> Result<(), RecorderError> {
        self.records.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}
