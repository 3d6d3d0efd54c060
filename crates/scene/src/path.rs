use std::fmt;

use serde::{Deserialize, Serialize};

use crate::host::{NodeId, SceneGraph};

/// Separator placed between node names.
pub const PATH_SEPARATOR: char = '/';

/// Stable textual identity of a node: its name preceded by its ancestors' names.
/// 節點的穩定文字識別：由祖先名稱與自身名稱以 `/` 串接而成。
///
/// Paths are opaque tokens. They are never split back into segments and are
/// only compared for (case-insensitive) equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodePath(String);

impl NodePath {
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Case-insensitive equality used by node resolution.
    /// 節點解析所使用的不分大小寫比較。
    pub fn matches(&self, other: &str) -> bool {
        self.0 == other || self.0.to_lowercase() == other.to_lowercase()
    }

    /// Returns the folded key under which this path is cached.
    /// 取得此路徑在快取中使用的正規化鍵值。
    pub fn key(&self) -> PathKey {
        PathKey::new(&self.0)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodePath {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodePath {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Case-folded form of a path, so cache lookups agree with [`NodePath::matches`].
/// 路徑的大小寫摺疊形式，使快取查找與 [`NodePath::matches`] 一致。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathKey(String);

impl PathKey {
    pub fn new(path: &str) -> Self {
        Self(path.to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Derives the path of `node` by walking its parent links up to the root.
/// 沿父節點鏈結向上走訪至根節點以推導 `node` 的路徑。
///
/// Returns `None` when the node or one of its ancestors is no longer alive.
pub fn encode<G>(graph: &G, node: NodeId) -> Option<NodePath>
where
    G: SceneGraph + ?Sized,
{
    let name = graph.node_name(node)?;
    match graph.parent(node) {
        None => Some(NodePath(name)),
        Some(parent) => {
            let mut path = encode(graph, parent)?;
            path.0.push(PATH_SEPARATOR);
            path.0.push_str(&name);
            Some(path)
        }
    }
}
