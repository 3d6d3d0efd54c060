use log::{debug, info};

use crate::error::StateError;
use crate::kv::KeyValueStore;
use crate::model::RootStore;

/// Suffix appended to the product name to form the storage key.
pub const STORAGE_KEY_SUFFIX: &str = "_cachedHierarchyData_storage_key";

/// Builds the product-scoped key the store is saved under.
/// 以產品名稱組出儲存狀態所用的鍵值。
pub fn storage_key(product: &str) -> String {
    format!("{product}{STORAGE_KEY_SUFFIX}")
}

/// Reads and writes the whole [`RootStore`] as one JSON blob.
/// 以單一 JSON 內容讀寫整個 [`RootStore`]。
///
/// There is no partial save: every call to [`save`](Self::save) replaces the
/// stored blob. Serialization is deterministic, so saving unchanged state twice
/// writes byte-identical text.
#[derive(Debug)]
pub struct StateGateway<S> {
    backend: S,
    key: String,
}

impl<S: KeyValueStore> StateGateway<S> {
    pub fn new(backend: S, product: &str) -> Self {
        Self {
            backend,
            key: storage_key(product),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut S {
        &mut self.backend
    }

    /// Loads the stored state, or a fresh store when nothing was saved yet.
    /// 載入已儲存的狀態；若尚未儲存過則回傳全新的空白狀態。
    ///
    /// A blob that fails to parse is reported as [`StateError::Corrupt`];
    /// there is no attempt to salvage part of it.
    pub fn load_or_create(&self) -> Result<RootStore, StateError> {
        match self.backend.get(&self.key)? {
            Some(text) if !text.trim().is_empty() => {
                let mut store: RootStore =
                    serde_json::from_str(&text).map_err(StateError::Corrupt)?;
                store.upgrade();
                debug!(
                    "loaded {} hierarchy and {} selection records from {}",
                    store.hierarchies.len(),
                    store.selections.len(),
                    self.key
                );
                Ok(store)
            }
            _ => {
                debug!("nothing stored under {}, starting fresh", self.key);
                Ok(RootStore::default())
            }
        }
    }

    /// Serializes `store` and writes it under the product key.
    /// 序列化 `store` 並寫入產品鍵值之下。
    pub fn save(&mut self, store: &RootStore) -> Result<(), StateError> {
        let payload = serde_json::to_string(store).map_err(StateError::Encode)?;
        self.backend.set(&self.key, &payload)?;
        info!("saved scene state ({} bytes) under {}", payload.len(), self.key);
        Ok(())
    }
}
