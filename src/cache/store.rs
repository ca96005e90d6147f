//! Key-value storage backends for the cache
//!
//! The weather cache only needs string keys and string values, the same
//! shape as browser local storage. `FileStore` persists each key as a file
//! in an XDG-compliant cache directory; `MemoryStore` keeps everything in a
//! map and is used for `--no-cache-persist` and in tests.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors that can occur when writing to a store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem error
    #[error("Cache I/O error: {0}")]
    Io(#[from] io::Error),

    /// Value could not be encoded
    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// String key-value storage
pub trait KeyValueStore: Send {
    /// Returns the stored value, or `None` if the key is absent or unreadable
    fn get(&self, key: &str) -> Option<String>;

    /// Stores a value, replacing any previous one
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removes a key; removing an absent key is not an error
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;

    /// All keys currently stored
    fn keys(&self) -> Vec<String>;
}

/// In-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

/// Longest percent-encoded key used directly as a file name
///
/// Leaves room for the `.json` suffix under the usual 255-byte limit.
const MAX_ENCODED_KEY_LEN: usize = 200;

/// Marks file names derived from a key digest; never produced by `urlencoding`
const HASHED_NAME_PREFIX: char = '#';

/// On-disk form of an entry whose key is too long to be its own file name
#[derive(Debug, Serialize, Deserialize)]
struct HashedEntry {
    key: String,
    value: String,
}

/// Store that keeps one JSON file per key on disk
///
/// Keys are percent-encoded into file names so that locations containing
/// `/`, `,` or spaces map to a single safe file and can be recovered by
/// `keys`. Keys whose encoding is too long are stored under a SHA-256 name
/// and carry the key inside the file.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Creates a FileStore in the XDG cache directory (`~/.cache/skycast/` on Linux)
    ///
    /// Returns `None` if the cache directory cannot be determined.
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "skycast")?;
        Some(Self::with_dir(project_dirs.cache_dir().to_path_buf()))
    }

    /// Creates a FileStore rooted at a custom directory
    pub fn with_dir(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> (PathBuf, bool) {
        let (stem, hashed) = file_stem(key);
        (self.dir.join(format!("{}.json", stem)), hashed)
    }

    fn key_of(&self, path: &Path, stem: &str) -> Option<String> {
        if stem.starts_with(HASHED_NAME_PREFIX) {
            let raw = fs::read_to_string(path).ok()?;
            let entry: HashedEntry = serde_json::from_str(&raw).ok()?;
            return Some(entry.key);
        }
        urlencoding::decode(stem).ok().map(Cow::into_owned)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let (path, hashed) = self.path_for(key);
        let raw = fs::read_to_string(path).ok()?;
        if !hashed {
            return Some(raw);
        }
        let entry: HashedEntry = serde_json::from_str(&raw).ok()?;
        (entry.key == key).then_some(entry.value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let (path, hashed) = self.path_for(key);
        if hashed {
            let entry = HashedEntry {
                key: key.to_string(),
                value: value.to_string(),
            };
            fs::write(path, serde_json::to_string(&entry)?)?;
        } else {
            fs::write(path, value)?;
        }
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let (path, _) = self.path_for(key);
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let path = entry.path();
                let name = entry.file_name();
                let stem = name.to_str()?.strip_suffix(".json")?;
                self.key_of(&path, stem)
            })
            .collect()
    }
}

/// File stem for a key, and whether it is a digest rather than the encoded key
fn file_stem(key: &str) -> (String, bool) {
    let encoded = urlencoding::encode(key);
    if encoded.len() <= MAX_ENCODED_KEY_LEN {
        return (encoded.into_owned(), false);
    }
    let digest = Sha256::digest(key.as_bytes());
    (format!("{}{}", HASHED_NAME_PREFIX, hex::encode(digest)), true)
}
