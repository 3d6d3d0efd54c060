use std::fmt;

use serde::{Deserialize, Serialize};

/// Runtime identifier of a node as handed out by the host editor.
/// 由宿主編輯器配發的節點執行期識別碼。
///
/// Identifiers are volatile: they do not survive a reload of the scene and a
/// stored identifier may refer to a node that has since been destroyed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Runtime handle of a loaded scene.
/// 已載入場景的執行期控制代碼。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneHandle(u64);

impl SceneHandle {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SceneHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scene#{}", self.0)
    }
}

/// Opaque row handle used by the host tree view.
/// 宿主樹狀檢視所使用的不透明列控制代碼。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewHandle(u64);

impl ViewHandle {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// Enumeration and metadata access for the host scene graph.
/// 宿主場景圖的列舉與節點資訊介面。
pub trait SceneGraph {
    /// Scenes currently loaded, in load order.
    /// 目前已載入的場景（依載入順序）。
    fn loaded_scenes(&self) -> Vec<SceneHandle>;

    /// Stable storage location of a scene; `None` once the handle is gone.
    /// 場景的穩定儲存位置；控制代碼失效時回傳 `None`。
    fn scene_identity(&self, scene: SceneHandle) -> Option<String>;

    /// Root nodes of a scene, in host order.
    /// 場景的根節點（宿主順序）。
    fn root_nodes(&self, scene: SceneHandle) -> Vec<NodeId>;

    /// The node followed by all of its descendants, depth-first pre-order.
    /// 節點本身及其全部子孫（深度優先前序）。
    fn descendants(&self, node: NodeId, include_inactive: bool) -> Vec<NodeId>;

    /// Global lookup-by-name shortcut across every loaded scene.
    /// 跨所有已載入場景的名稱快速查找。
    fn find_by_path(&self, path: &str) -> Option<NodeId>;

    fn node_name(&self, node: NodeId) -> Option<String>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    fn scene_of(&self, node: NodeId) -> Option<SceneHandle>;

    /// Returns `false` once the node has been destroyed.
    /// 節點被銷毀後回傳 `false`。
    fn is_alive(&self, node: NodeId) -> bool;
}

/// The host hierarchy tree view (the tracking surface).
/// 宿主階層樹狀檢視（追蹤介面）。
pub trait TreeView {
    fn is_open(&self) -> bool;

    fn has_focus(&self) -> bool;

    fn expanded_handles(&self) -> Vec<ViewHandle>;

    fn set_expanded(&mut self, handle: ViewHandle, expanded: bool);

    fn handle_to_node(&self, handle: ViewHandle) -> Option<NodeId>;

    fn node_to_handle(&self, node: NodeId) -> ViewHandle;
}

/// Read/write access to the host selection.
/// 宿主選取狀態的讀寫介面。
pub trait SelectionHost {
    fn current_selection(&self) -> Vec<NodeId>;

    fn set_selection(&mut self, nodes: &[NodeId]);
}

/// Everything the keeper needs from the host editor.
/// 保存器所需的完整宿主編輯器介面。
pub trait EditorHost: SceneGraph + TreeView + SelectionHost {
    /// `true` while the editor runs the scene live (play/simulate mode).
    /// 編輯器處於即時執行（播放/模擬）模式時為 `true`。
    fn is_live_mode(&self) -> bool;
}
