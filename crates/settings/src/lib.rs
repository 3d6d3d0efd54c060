pub mod preferences;

pub use preferences::{KeeperPreferences, PreferencesError, PreferencesStore};
