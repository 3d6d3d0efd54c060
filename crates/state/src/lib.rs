//! Persisted tree-view state for the scene keeper.
//! 場景保存器的持久化狀態：每個場景的展開與選取紀錄，以及永遠展開的路徑集合。

mod error;
mod util;

pub mod gateway;
pub mod kv;
pub mod model;

pub use error::StateError;
pub use gateway::{storage_key, StateGateway, STORAGE_KEY_SUFFIX};
pub use kv::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use model::{
    AlwaysExpandedSet, HierarchyRecord, RootStore, SceneIdentity, SelectionRecord,
    STORE_FORMAT_VERSION,
};
