use crate::domain::StoreResult;
use serde::{Serialize, de::DeserializeOwned};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Reads and writes whole JSON documents on disk.
pub struct FileRepository;

impl FileRepository {
    pub fn save<T: Serialize>(value: &T, path: &Path) -> StoreResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(value)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Loads a document, returning `None` when the file does not exist yet.
    pub fn load<T: DeserializeOwned>(path: &Path) -> StoreResult<Option<T>> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
