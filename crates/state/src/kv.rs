use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use log::debug;

use crate::error::StateError;
use crate::util::write_atomic;

/// Opaque string store the persisted state is written to.
/// 儲存持久化狀態的不透明字串鍵值儲存區。
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StateError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StateError>;
}

/// Process-local store, used by tests and embedders that persist elsewhere.
/// 僅存在於行程內的儲存區，供測試或自行持久化的宿主使用。
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    entries: BTreeMap<String, String>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StateError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StateError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// File-backed store holding one `key=base64(value)` line per entry.
/// 以檔案保存的儲存區，每筆資料一行 `key=base64(value)`。
///
/// The whole file is rewritten atomically on every `set`.
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileKeyValueStore {
    /// Opens the store at `path`; a missing file yields an empty store.
    /// 開啟位於 `path` 的儲存區；檔案不存在時視為空白。
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StateError> {
        let path = path.as_ref().to_path_buf();
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("no key-value file at {}, starting empty", path.display());
                return Ok(Self {
                    path,
                    entries: BTreeMap::new(),
                });
            }
            Err(err) => return Err(StateError::Io(err)),
        };

        let mut entries = BTreeMap::new();
        for line in contents.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            // Keys are stored verbatim; only the encoded value may be padded.
            let (key, encoded) = line
                .split_once('=')
                .ok_or_else(|| StateError::MalformedEntry(trimmed.to_string()))?;
            let bytes = BASE64
                .decode(encoded.trim().as_bytes())
                .map_err(|err| StateError::MalformedEntry(format!("{key}: {err}")))?;
            let value = String::from_utf8(bytes)
                .map_err(|err| StateError::MalformedEntry(format!("{key}: {err}")))?;
            entries.insert(key.to_string(), value);
        }

        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes `key`, persisting only when something was removed.
    pub fn remove(&mut self, key: &str) -> Result<bool, StateError> {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.persist()?;
        }
        Ok(removed)
    }

    fn persist(&self) -> Result<(), StateError> {
        let mut payload = String::new();
        for (key, value) in &self.entries {
            payload.push_str(key);
            payload.push('=');
            payload.push_str(&BASE64.encode(value.as_bytes()));
            payload.push('\n');
        }
        write_atomic(&self.path, payload.as_bytes())?;
        Ok(())
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StateError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StateError> {
        if key.is_empty() || key.contains(['=', '\n', '\r', '#']) {
            return Err(StateError::InvalidKey(key.to_string()));
        }
        self.entries.insert(key.to_string(), value.to_string());
        self.persist()
    }
}
