//! Keeps hierarchy tree-view expansion and selection across scene reloads.
//! 在場景重新載入之間保留階層樹狀檢視的展開與選取狀態。
//!
//! [`SceneKeeper`] reacts to host [`LifecycleEvent`]s: it captures the state of
//! a scene when the scene is closed and re-applies it when the scene is opened
//! again. Nodes are identified by their [`NodePath`](scenekeeper_scene::NodePath)
//! inside the scene, so restored state survives the host handing out new node
//! identifiers on every load.

mod error;

pub mod keeper;
pub mod tracker;

pub use error::KeeperError;
pub use keeper::{CaptureReport, LifecycleEvent, RestoreReport, SceneKeeper, SceneState};
pub use tracker::SelectionTracker;
