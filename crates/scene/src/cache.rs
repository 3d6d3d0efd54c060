use std::collections::HashMap;

use log::debug;

use crate::host::{NodeId, SceneGraph, SceneHandle};
use crate::path::{NodePath, PathKey};

/// Two-tier cache mapping nodes to paths and (scene, path) pairs to nodes.
/// 雙層快取：節點→路徑，以及（場景、路徑）→節點。
///
/// Entries are never expired on a schedule. A mapping whose node has been
/// destroyed is dropped the next time a lookup lands on it.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    node_paths: HashMap<NodeId, NodePath>,
    path_nodes: HashMap<(SceneHandle, PathKey), NodeId>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached node for `path`, evicting the entry if the node is gone.
    /// 回傳 `path` 對應的快取節點；若節點已失效則移除該項目。
    pub fn lookup<G>(&mut self, graph: &G, scene: SceneHandle, path: &str) -> Option<NodeId>
    where
        G: SceneGraph + ?Sized,
    {
        let key = (scene, PathKey::new(path));
        let node = *self.path_nodes.get(&key)?;
        if graph.is_alive(node) {
            return Some(node);
        }
        debug!("evicting stale cache entry {path} -> {node}");
        self.path_nodes.remove(&key);
        self.node_paths.remove(&node);
        None
    }

    /// Records `node <-> path` in both tiers, replacing earlier mappings.
    /// 在兩層快取中記錄 `node <-> path`，覆寫既有對應。
    pub fn remember(&mut self, scene: SceneHandle, node: NodeId, path: &NodePath) {
        self.node_paths.insert(node, path.clone());
        self.path_nodes.insert((scene, path.key()), node);
    }

    /// Like [`remember`](Self::remember), but an existing live path mapping wins.
    /// 與 [`remember`](Self::remember) 相同，但保留既有且仍有效的路徑對應。
    ///
    /// Used while scanning so that two siblings sharing a name keep resolving
    /// to the first one in host order.
    pub fn remember_first<G>(
        &mut self,
        graph: &G,
        scene: SceneHandle,
        node: NodeId,
        path: &NodePath,
    ) where
        G: SceneGraph + ?Sized,
    {
        self.node_paths.insert(node, path.clone());
        let key = (scene, path.key());
        match self.path_nodes.get(&key) {
            Some(existing) if graph.is_alive(*existing) => {}
            _ => {
                self.path_nodes.insert(key, node);
            }
        }
    }

    /// Cached path of `node`, if it was computed earlier in this session.
    pub fn path_of(&self, node: NodeId) -> Option<&NodePath> {
        self.node_paths.get(&node)
    }

    pub fn len(&self) -> usize {
        self.path_nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path_nodes.is_empty() && self.node_paths.is_empty()
    }

    pub fn clear(&mut self) {
        self.node_paths.clear();
        self.path_nodes.clear();
    }
}
