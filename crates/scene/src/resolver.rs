use log::debug;

use crate::cache::ResolutionCache;
use crate::host::{NodeId, SceneGraph, SceneHandle};
use crate::path::{self, NodePath};

/// Resolves stored paths back to live nodes.
/// 將儲存的路徑解析回仍存在的節點。
///
/// Resolution order: the cache, then the host's global lookup-by-name, then a
/// full walk of the scene. Every node visited by a walk is cached, so later
/// lookups in the same session are answered without another walk.
#[derive(Debug, Default)]
pub struct NodeResolver {
    cache: ResolutionCache,
}

impl NodeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    /// Drops every cached mapping.
    pub fn reset(&mut self) {
        self.cache.clear();
    }

    /// Resolves `path` inside `scene`. A miss is not an error; callers skip the item.
    /// 在 `scene` 中解析 `path`；找不到時由呼叫端略過該項目。
    pub fn resolve<G>(&mut self, graph: &G, scene: SceneHandle, path: &str) -> Option<NodeId>
    where
        G: SceneGraph + ?Sized,
    {
        if let Some(node) = self.cache.lookup(graph, scene, path) {
            debug!("resolved {path} from cache in {scene}");
            return Some(node);
        }

        if let Some(node) = graph.find_by_path(path) {
            if graph.is_alive(node) && graph.scene_of(node) == Some(scene) {
                let resolved = path::encode(graph, node).unwrap_or_else(|| NodePath::from(path));
                self.cache.remember(scene, node, &resolved);
                debug!("resolved {path} by name lookup in {scene}");
                return Some(node);
            }
        }

        self.scan(graph, scene, path)
    }

    /// Tries every loaded scene in load order; the first hit wins.
    /// 依載入順序嘗試每個已載入場景，回傳第一個命中結果。
    pub fn resolve_any_open_scene<G>(
        &mut self,
        graph: &G,
        path: &str,
    ) -> Option<(SceneHandle, NodeId)>
    where
        G: SceneGraph + ?Sized,
    {
        graph
            .loaded_scenes()
            .into_iter()
            .find_map(|scene| self.resolve(graph, scene, path).map(|node| (scene, node)))
    }

    fn scan<G>(&mut self, graph: &G, scene: SceneHandle, target: &str) -> Option<NodeId>
    where
        G: SceneGraph + ?Sized,
    {
        for root in graph.root_nodes(scene) {
            for node in graph.descendants(root, true) {
                let node_path = match self.cache.path_of(node) {
                    Some(known) => known.clone(),
                    None => match path::encode(graph, node) {
                        Some(encoded) => encoded,
                        None => continue,
                    },
                };
                self.cache.remember_first(graph, scene, node, &node_path);
                if node_path.matches(target) {
                    debug!("resolved {target} by scanning {scene}");
                    return Some(node);
                }
            }
        }
        debug!("no node at {target} in {scene}");
        None
    }
}
