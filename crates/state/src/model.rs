use std::collections::BTreeSet;
use std::fmt;

use scenekeeper_scene::NodePath;
use serde::{Deserialize, Serialize};

/// Current layout version of the persisted store.
pub const STORE_FORMAT_VERSION: u32 = 1;

/// Stable storage location of a scene, used as the key of every per-scene record.
/// 場景的穩定儲存位置，作為每筆場景紀錄的鍵值。
///
/// Unlike node paths, scene identities compare case-sensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneIdentity(String);

impl SceneIdentity {
    pub fn new(location: impl Into<String>) -> Self {
        Self(location.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SceneIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SceneIdentity {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Expanded tree-view rows recorded for one scene.
/// 單一場景記錄的樹狀檢視展開項目。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyRecord {
    pub scene: SceneIdentity,
    #[serde(default)]
    pub expanded: Vec<NodePath>,
}

impl HierarchyRecord {
    pub fn new(scene: SceneIdentity) -> Self {
        Self {
            scene,
            expanded: Vec::new(),
        }
    }
}

/// Selected nodes recorded for one scene, in selection order.
/// 單一場景記錄的選取節點（依選取順序）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRecord {
    pub scene: SceneIdentity,
    #[serde(default)]
    pub selected: Vec<NodePath>,
}

impl SelectionRecord {
    pub fn new(scene: SceneIdentity) -> Self {
        Self {
            scene,
            selected: Vec::new(),
        }
    }
}

/// Paths the user pinned open in every scene.
/// 使用者指定在所有場景中永遠展開的路徑。
///
/// Membership ignores case like every other path comparison; the spelling
/// first pinned is the one kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlwaysExpandedSet(BTreeSet<NodePath>);

impl AlwaysExpandedSet {
    /// Adds `path`; returns `false` when it was already present.
    pub fn insert(&mut self, path: NodePath) -> bool {
        if self.contains(&path) {
            return false;
        }
        self.0.insert(path)
    }

    pub fn remove(&mut self, path: &NodePath) -> bool {
        let before = self.0.len();
        self.0.retain(|pinned| !pinned.matches(path.as_str()));
        self.0.len() != before
    }

    pub fn contains(&self, path: &NodePath) -> bool {
        self.0.iter().any(|pinned| pinned.matches(path.as_str()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodePath> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

/// Everything that is persisted, serialized as one unit.
/// 所有需要持久化的資料，作為單一單位序列化。
///
/// At most one hierarchy record and one selection record exist per scene;
/// records are only ever added through the `get_or_create_*` accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootStore {
    #[serde(default = "default_format_version")]
    pub format_version: u32,
    #[serde(default)]
    pub hierarchies: Vec<HierarchyRecord>,
    #[serde(default)]
    pub selections: Vec<SelectionRecord>,
    #[serde(default)]
    pub always_expanded: AlwaysExpandedSet,
}

fn default_format_version() -> u32 {
    STORE_FORMAT_VERSION
}

impl Default for RootStore {
    fn default() -> Self {
        Self {
            format_version: STORE_FORMAT_VERSION,
            hierarchies: Vec::new(),
            selections: Vec::new(),
            always_expanded: AlwaysExpandedSet::default(),
        }
    }
}

impl RootStore {
    /// Returns the hierarchy record of `scene`, creating an empty one on first use.
    /// 取得 `scene` 的展開紀錄；首次使用時建立空白紀錄。
    pub fn get_or_create_hierarchy(&mut self, scene: &SceneIdentity) -> &mut HierarchyRecord {
        let index = match self.hierarchies.iter().position(|record| record.scene == *scene) {
            Some(index) => index,
            None => {
                self.hierarchies.push(HierarchyRecord::new(scene.clone()));
                self.hierarchies.len() - 1
            }
        };
        &mut self.hierarchies[index]
    }

    pub fn try_get_hierarchy(&self, scene: &SceneIdentity) -> Option<&HierarchyRecord> {
        self.hierarchies.iter().find(|record| record.scene == *scene)
    }

    /// Returns the selection record of `scene`, creating an empty one on first use.
    /// 取得 `scene` 的選取紀錄；首次使用時建立空白紀錄。
    pub fn get_or_create_selection(&mut self, scene: &SceneIdentity) -> &mut SelectionRecord {
        let index = match self.selections.iter().position(|record| record.scene == *scene) {
            Some(index) => index,
            None => {
                self.selections.push(SelectionRecord::new(scene.clone()));
                self.selections.len() - 1
            }
        };
        &mut self.selections[index]
    }

    pub fn try_get_selection(&self, scene: &SceneIdentity) -> Option<&SelectionRecord> {
        self.selections.iter().find(|record| record.scene == *scene)
    }

    /// `true` when anything at all has been recorded.
    /// 只要有任何紀錄即回傳 `true`。
    pub fn has_data(&self) -> bool {
        !self.hierarchies.is_empty()
            || !self.selections.is_empty()
            || !self.always_expanded.is_empty()
    }

    /// Forgets every record and pinned path.
    pub fn clear(&mut self) {
        self.hierarchies.clear();
        self.selections.clear();
        self.always_expanded.clear();
    }

    /// Brings payloads written by older releases up to the current layout.
    pub fn upgrade(&mut self) {
        if self.format_version == 0 {
            self.format_version = STORE_FORMAT_VERSION;
        }
    }
}
