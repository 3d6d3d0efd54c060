use scenekeeper_state::StateError;
use thiserror::Error;

/// Errors surfaced by [`SceneKeeper`](crate::SceneKeeper).
/// [`SceneKeeper`](crate::SceneKeeper) 回報的錯誤。
///
/// Missing nodes and closed surfaces are never errors; the only failures are
/// those of the persisted store, such as a corrupted blob found at first use.
#[derive(Debug, Error)]
pub enum KeeperError {
    #[error("scene state unavailable: {0}")]
    State(#[from] StateError),
}
