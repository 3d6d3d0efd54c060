//! Host-facing scene graph primitives for the scene keeper.
//! 場景保存器的宿主場景圖基礎模組：路徑編碼、解析快取與節點解析。

pub mod cache;
pub mod host;
pub mod memory;
pub mod path;
pub mod resolver;

pub use cache::ResolutionCache;
pub use host::{EditorHost, NodeId, SceneGraph, SceneHandle, SelectionHost, TreeView, ViewHandle};
pub use memory::{MemoryEditor, MemoryEditorError};
pub use path::{encode, NodePath, PathKey, PATH_SEPARATOR};
pub use resolver::NodeResolver;
