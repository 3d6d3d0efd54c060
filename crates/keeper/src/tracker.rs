use std::collections::{HashMap, HashSet};

use log::debug;
use scenekeeper_scene::{NodeId, SceneGraph, SceneHandle};

/// Rolling "last good selection" per loaded scene.
/// 每個已載入場景的「最後有效選取」紀錄。
///
/// By the time a scene unloads the live selection is often already empty or
/// points into another scene, so the selection to persist is taken from here.
#[derive(Debug, Default)]
pub struct SelectionTracker {
    history: HashMap<SceneHandle, Vec<NodeId>>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one selection-change notification into the history.
    /// 將一次選取變更通知併入紀錄。
    ///
    /// * empty selection with focus on the tree view: explicit deselection,
    ///   every tracked loaded scene is cleared;
    /// * empty selection without focus: ignored;
    /// * otherwise each touched scene is cleared once, then receives its
    ///   selected nodes in selection order.
    pub fn observe<G>(&mut self, graph: &G, selection: &[NodeId], has_focus: bool)
    where
        G: SceneGraph + ?Sized,
    {
        if selection.is_empty() {
            if has_focus {
                for scene in graph.loaded_scenes() {
                    if let Some(nodes) = self.history.get_mut(&scene) {
                        nodes.clear();
                    }
                }
                debug!("selection cleared from the tree view");
            }
            return;
        }

        let mut touched: HashSet<SceneHandle> = HashSet::new();
        for node in selection {
            let Some(scene) = graph.scene_of(*node) else {
                continue;
            };
            let nodes = self.history.entry(scene).or_default();
            if touched.insert(scene) {
                nodes.clear();
            }
            nodes.push(*node);
        }
    }

    /// Last recorded selection of `scene`; `None` if it was never observed.
    pub fn history(&self, scene: SceneHandle) -> Option<&[NodeId]> {
        self.history.get(&scene).map(Vec::as_slice)
    }

    pub fn forget(&mut self, scene: SceneHandle) {
        self.history.remove(&scene);
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}
