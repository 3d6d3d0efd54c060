use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

use crate::host::{
    EditorHost, NodeId, SceneGraph, SceneHandle, SelectionHost, TreeView, ViewHandle,
};
use crate::path;

static NEXT_RAW_ID: AtomicU64 = AtomicU64::new(1);

fn next_raw_id() -> u64 {
    NEXT_RAW_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone)]
struct MemoryNode {
    name: String,
    scene: SceneHandle,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    active: bool,
}

#[derive(Debug, Clone)]
struct MemoryScene {
    handle: SceneHandle,
    identity: String,
    roots: Vec<NodeId>,
}

/// In-memory editor implementing every host interface.
/// 實作所有宿主介面的記憶體內編輯器。
///
/// Identifiers are drawn from a process-wide counter and never reused, so a
/// destroyed node can never be confused with one created later. Like real
/// hosts, the tree view keeps the handles of destroyed rows in its expanded
/// list; [`TreeView::handle_to_node`] reports them as gone.
#[derive(Debug, Clone)]
pub struct MemoryEditor {
    nodes: HashMap<NodeId, MemoryNode>,
    scenes: Vec<MemoryScene>,
    expanded: Vec<ViewHandle>,
    selection: Vec<NodeId>,
    view_open: bool,
    view_focused: bool,
    live_mode: bool,
    name_lookup: bool,
}

impl Default for MemoryEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryEditor {
    /// Creates an editor with no scenes and an open, unfocused tree view.
    /// 建立沒有場景、樹狀檢視已開啟但未聚焦的編輯器。
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            scenes: Vec::new(),
            expanded: Vec::new(),
            selection: Vec::new(),
            view_open: true,
            view_focused: false,
            live_mode: false,
            name_lookup: true,
        }
    }

    /// Loads an empty scene stored at `identity` and returns its handle.
    /// 載入位於 `identity` 的空場景並回傳控制代碼。
    pub fn add_scene(&mut self, identity: impl Into<String>) -> SceneHandle {
        let handle = SceneHandle::from_raw(next_raw_id());
        self.scenes.push(MemoryScene {
            handle,
            identity: identity.into(),
            roots: Vec::new(),
        });
        handle
    }

    /// Unloads a scene, destroying every node it owns.
    /// 卸載場景並銷毀其所有節點。
    pub fn unload_scene(&mut self, scene: SceneHandle) -> Result<(), MemoryEditorError> {
        let index = self
            .scenes
            .iter()
            .position(|entry| entry.handle == scene)
            .ok_or(MemoryEditorError::SceneNotFound(scene))?;
        let removed = self.scenes.remove(index);
        for root in removed.roots {
            self.destroy_subtree(root);
        }
        Ok(())
    }

    pub fn add_root(
        &mut self,
        scene: SceneHandle,
        name: impl Into<String>,
    ) -> Result<NodeId, MemoryEditorError> {
        let id = NodeId::from_raw(next_raw_id());
        let entry = self
            .scenes
            .iter_mut()
            .find(|entry| entry.handle == scene)
            .ok_or(MemoryEditorError::SceneNotFound(scene))?;
        entry.roots.push(id);
        self.nodes.insert(
            id,
            MemoryNode {
                name: name.into(),
                scene,
                parent: None,
                children: Vec::new(),
                active: true,
            },
        );
        Ok(id)
    }

    pub fn add_child(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
    ) -> Result<NodeId, MemoryEditorError> {
        let id = NodeId::from_raw(next_raw_id());
        let parent_node = self
            .nodes
            .get_mut(&parent)
            .ok_or(MemoryEditorError::NodeNotFound(parent))?;
        parent_node.children.push(id);
        let scene = parent_node.scene;
        self.nodes.insert(
            id,
            MemoryNode {
                name: name.into(),
                scene,
                parent: Some(parent),
                children: Vec::new(),
                active: true,
            },
        );
        Ok(id)
    }

    /// Destroys `node` together with its descendants.
    /// 銷毀 `node` 及其所有子孫節點。
    pub fn destroy(&mut self, node: NodeId) -> Result<(), MemoryEditorError> {
        let entry = self
            .nodes
            .get(&node)
            .ok_or(MemoryEditorError::NodeNotFound(node))?;
        let (scene, parent) = (entry.scene, entry.parent);
        match parent {
            Some(parent) => {
                if let Some(parent_node) = self.nodes.get_mut(&parent) {
                    parent_node.children.retain(|child| *child != node);
                }
            }
            None => {
                if let Some(entry) = self.scenes.iter_mut().find(|entry| entry.handle == scene) {
                    entry.roots.retain(|root| *root != node);
                }
            }
        }
        self.destroy_subtree(node);
        Ok(())
    }

    pub fn rename(
        &mut self,
        node: NodeId,
        name: impl Into<String>,
    ) -> Result<(), MemoryEditorError> {
        let entry = self
            .nodes
            .get_mut(&node)
            .ok_or(MemoryEditorError::NodeNotFound(node))?;
        entry.name = name.into();
        Ok(())
    }

    /// Moves `node` under `new_parent`, which must live in the same scene.
    /// 將 `node` 移至同場景的 `new_parent` 之下。
    pub fn reparent(&mut self, node: NodeId, new_parent: NodeId) -> Result<(), MemoryEditorError> {
        if node == new_parent || self.is_ancestor(node, new_parent) {
            return Err(MemoryEditorError::InvalidParent(new_parent));
        }
        let scene = self
            .nodes
            .get(&node)
            .map(|entry| entry.scene)
            .ok_or(MemoryEditorError::NodeNotFound(node))?;
        let parent_scene = self
            .nodes
            .get(&new_parent)
            .map(|entry| entry.scene)
            .ok_or(MemoryEditorError::NodeNotFound(new_parent))?;
        if scene != parent_scene {
            return Err(MemoryEditorError::InvalidParent(new_parent));
        }

        let old_parent = self.nodes.get(&node).and_then(|entry| entry.parent);
        match old_parent {
            Some(old) => {
                if let Some(old_node) = self.nodes.get_mut(&old) {
                    old_node.children.retain(|child| *child != node);
                }
            }
            None => {
                if let Some(entry) = self.scenes.iter_mut().find(|entry| entry.handle == scene) {
                    entry.roots.retain(|root| *root != node);
                }
            }
        }
        if let Some(parent_node) = self.nodes.get_mut(&new_parent) {
            parent_node.children.push(node);
        }
        if let Some(entry) = self.nodes.get_mut(&node) {
            entry.parent = Some(new_parent);
        }
        Ok(())
    }

    pub fn set_active(&mut self, node: NodeId, active: bool) -> Result<(), MemoryEditorError> {
        let entry = self
            .nodes
            .get_mut(&node)
            .ok_or(MemoryEditorError::NodeNotFound(node))?;
        entry.active = active;
        Ok(())
    }

    /// Finds a node by its exact path inside one scene, ignoring activity.
    /// 在指定場景中依完整路徑尋找節點（不考慮啟用狀態）。
    pub fn node_at(&self, scene: SceneHandle, target: &str) -> Option<NodeId> {
        self.root_nodes(scene)
            .into_iter()
            .flat_map(|root| self.descendants(root, true))
            .find(|node| path::encode(self, *node).is_some_and(|p| p.as_str() == target))
    }

    /// Expands the tree-view row of `node`, as a user click would.
    pub fn expand(&mut self, node: NodeId) {
        let handle = self.node_to_handle(node);
        self.set_expanded(handle, true);
    }

    pub fn is_expanded(&self, node: NodeId) -> bool {
        self.expanded.contains(&self.node_to_handle(node))
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    pub fn selection(&self) -> &[NodeId] {
        &self.selection
    }

    pub fn set_view_open(&mut self, open: bool) {
        self.view_open = open;
        if !open {
            self.view_focused = false;
        }
    }

    pub fn set_view_focused(&mut self, focused: bool) {
        self.view_focused = focused && self.view_open;
    }

    pub fn set_live_mode(&mut self, live: bool) {
        self.live_mode = live;
    }

    /// Disables the global lookup-by-name shortcut so that resolution must scan.
    /// 停用全域名稱查找捷徑，強制以掃描方式解析。
    pub fn set_name_lookup_enabled(&mut self, enabled: bool) {
        self.name_lookup = enabled;
    }

    fn is_ancestor(&self, candidate: NodeId, node: NodeId) -> bool {
        let mut current = self.nodes.get(&node).and_then(|entry| entry.parent);
        while let Some(parent) = current {
            if parent == candidate {
                return true;
            }
            current = self.nodes.get(&parent).and_then(|entry| entry.parent);
        }
        false
    }

    fn destroy_subtree(&mut self, node: NodeId) {
        if let Some(removed) = self.nodes.remove(&node) {
            self.selection.retain(|selected| *selected != node);
            for child in removed.children {
                self.destroy_subtree(child);
            }
        }
    }

    fn collect(&self, node: NodeId, include_inactive: bool, out: &mut Vec<NodeId>) {
        let Some(entry) = self.nodes.get(&node) else {
            return;
        };
        if !include_inactive && !entry.active {
            return;
        }
        out.push(node);
        for child in &entry.children {
            self.collect(*child, include_inactive, out);
        }
    }
}

impl SceneGraph for MemoryEditor {
    fn loaded_scenes(&self) -> Vec<SceneHandle> {
        self.scenes.iter().map(|entry| entry.handle).collect()
    }

    fn scene_identity(&self, scene: SceneHandle) -> Option<String> {
        self.scenes
            .iter()
            .find(|entry| entry.handle == scene)
            .map(|entry| entry.identity.clone())
    }

    fn root_nodes(&self, scene: SceneHandle) -> Vec<NodeId> {
        self.scenes
            .iter()
            .find(|entry| entry.handle == scene)
            .map(|entry| entry.roots.clone())
            .unwrap_or_default()
    }

    fn descendants(&self, node: NodeId, include_inactive: bool) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect(node, include_inactive, &mut out);
        out
    }

    fn find_by_path(&self, target: &str) -> Option<NodeId> {
        if !self.name_lookup {
            return None;
        }
        self.scenes
            .iter()
            .flat_map(|entry| entry.roots.iter())
            .flat_map(|root| self.descendants(*root, false))
            .find(|node| path::encode(self, *node).is_some_and(|p| p.as_str() == target))
    }

    fn node_name(&self, node: NodeId) -> Option<String> {
        self.nodes.get(&node).map(|entry| entry.name.clone())
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node).and_then(|entry| entry.parent)
    }

    fn scene_of(&self, node: NodeId) -> Option<SceneHandle> {
        self.nodes.get(&node).map(|entry| entry.scene)
    }

    fn is_alive(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }
}

impl TreeView for MemoryEditor {
    fn is_open(&self) -> bool {
        self.view_open
    }

    fn has_focus(&self) -> bool {
        self.view_focused
    }

    fn expanded_handles(&self) -> Vec<ViewHandle> {
        self.expanded.clone()
    }

    fn set_expanded(&mut self, handle: ViewHandle, expanded: bool) {
        if expanded {
            if !self.expanded.contains(&handle) {
                self.expanded.push(handle);
            }
        } else {
            self.expanded.retain(|existing| *existing != handle);
        }
    }

    fn handle_to_node(&self, handle: ViewHandle) -> Option<NodeId> {
        let node = NodeId::from_raw(handle.as_u64());
        self.is_alive(node).then_some(node)
    }

    fn node_to_handle(&self, node: NodeId) -> ViewHandle {
        ViewHandle::from_raw(node.as_u64())
    }
}

impl SelectionHost for MemoryEditor {
    fn current_selection(&self) -> Vec<NodeId> {
        self.selection.clone()
    }

    fn set_selection(&mut self, nodes: &[NodeId]) {
        self.selection = nodes
            .iter()
            .copied()
            .filter(|node| self.nodes.contains_key(node))
            .collect();
    }
}

impl EditorHost for MemoryEditor {
    fn is_live_mode(&self) -> bool {
        self.live_mode
    }
}

/// Errors raised when mutating a [`MemoryEditor`].
/// 操作 [`MemoryEditor`] 時可能出現的錯誤。
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MemoryEditorError {
    #[error("{0} not found")]
    NodeNotFound(NodeId),
    #[error("{0} is not loaded")]
    SceneNotFound(SceneHandle),
    #[error("{0} cannot become the parent")]
    InvalidParent(NodeId),
}
