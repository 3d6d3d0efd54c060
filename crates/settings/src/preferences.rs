use std::fs::{self, File};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const PREFERENCES_VERSION: u32 = 1;

/// Errors raised while reading or writing the keeper's preferences file.
/// 讀寫保存器偏好設定檔時的錯誤。
#[derive(Debug, Error)]
pub enum PreferencesError {
    #[error("cannot access preferences at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("preferences at {path} are not valid JSON: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unknown preference `{0}`")]
    UnknownKey(String),
}

impl PreferencesError {
    fn io(path: &Path) -> impl FnOnce(io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// User-facing switches of the scene keeper.
/// 場景保存器的使用者開關。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeeperPreferences {
    #[serde(default = "default_version")]
    pub version: u32,
    /// Record and restore expanded tree-view rows.
    #[serde(default = "default_true")]
    pub keep_hierarchy: bool,
    /// Record and restore the selection.
    #[serde(default = "default_true")]
    pub keep_selection: bool,
    /// Do not record expansion changes made while the editor runs the scene live.
    /// Live expansion is never recorded, so the switch has no further effect.
    #[serde(default)]
    pub ignore_hierarchy_in_live_mode: bool,
    /// Do not record selections made while the editor runs the scene live.
    #[serde(default = "default_true")]
    pub ignore_selection_in_live_mode: bool,
}

fn default_version() -> u32 {
    PREFERENCES_VERSION
}

fn default_true() -> bool {
    true
}

impl Default for KeeperPreferences {
    fn default() -> Self {
        Self {
            version: PREFERENCES_VERSION,
            keep_hierarchy: true,
            keep_selection: true,
            ignore_hierarchy_in_live_mode: false,
            ignore_selection_in_live_mode: true,
        }
    }
}

impl KeeperPreferences {
    /// Names accepted by [`set_flag`](Self::set_flag), in display order.
    pub const KEYS: [&'static str; 4] = [
        "keep_hierarchy",
        "keep_selection",
        "ignore_hierarchy_in_live_mode",
        "ignore_selection_in_live_mode",
    ];

    pub fn sanitize(&mut self) {
        if self.version == 0 {
            self.version = PREFERENCES_VERSION;
        }
    }

    pub fn flag(&self, key: &str) -> Result<bool, PreferencesError> {
        match key {
            "keep_hierarchy" => Ok(self.keep_hierarchy),
            "keep_selection" => Ok(self.keep_selection),
            "ignore_hierarchy_in_live_mode" => Ok(self.ignore_hierarchy_in_live_mode),
            "ignore_selection_in_live_mode" => Ok(self.ignore_selection_in_live_mode),
            other => Err(PreferencesError::UnknownKey(other.to_string())),
        }
    }

    pub fn set_flag(&mut self, key: &str, value: bool) -> Result<(), PreferencesError> {
        let slot = match key {
            "keep_hierarchy" => &mut self.keep_hierarchy,
            "keep_selection" => &mut self.keep_selection,
            "ignore_hierarchy_in_live_mode" => &mut self.ignore_hierarchy_in_live_mode,
            "ignore_selection_in_live_mode" => &mut self.ignore_selection_in_live_mode,
            other => return Err(PreferencesError::UnknownKey(other.to_string())),
        };
        *slot = value;
        Ok(())
    }
}

/// The keeper's switches bound to the JSON file they live in.
/// 與所在 JSON 檔案綁定的保存器開關。
#[derive(Debug)]
pub struct PreferencesStore {
    path: PathBuf,
    data: KeeperPreferences,
}

impl PreferencesStore {
    pub fn new(path: impl Into<PathBuf>, preferences: KeeperPreferences) -> Self {
        Self {
            path: path.into(),
            data: preferences,
        }
    }

    /// Reads the switches at `path`; a missing file yields the defaults.
    /// 讀取 `path` 的開關設定；檔案不存在時使用預設值。
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PreferencesError> {
        let path = path.as_ref().to_path_buf();
        let data = match fs::read_to_string(&path) {
            Ok(contents) => {
                let mut data: KeeperPreferences = serde_json::from_str(&contents)
                    .map_err(|source| PreferencesError::Format {
                        path: path.clone(),
                        source,
                    })?;
                data.sanitize();
                data
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("no preferences at {}, using defaults", path.display());
                KeeperPreferences::default()
            }
            Err(err) => return Err(PreferencesError::io(&path)(err)),
        };
        Ok(Self { path, data })
    }

    pub fn preferences(&self) -> &KeeperPreferences {
        &self.data
    }

    /// Applies `op` to a copy and commits it only if `op` succeeds.
    pub fn update<F>(&mut self, op: F) -> Result<(), PreferencesError>
    where
        F: FnOnce(&mut KeeperPreferences) -> Result<(), PreferencesError>,
    {
        let mut next = self.data;
        op(&mut next)?;
        next.sanitize();
        self.data = next;
        self.save()
    }

    pub fn overwrite(&mut self, preferences: KeeperPreferences) -> Result<(), PreferencesError> {
        self.data = preferences;
        self.data.sanitize();
        self.save()
    }

    /// Writes the switches through a synced sibling file renamed over the target.
    /// 先寫入並同步同目錄暫存檔，再以 rename 取代目標檔案。
    pub fn save(&self) -> Result<(), PreferencesError> {
        let payload = serde_json::to_string_pretty(&self.data).map_err(|source| {
            PreferencesError::Format {
                path: self.path.clone(),
                source,
            }
        })?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(PreferencesError::io(parent))?;
            }
        }

        let tmp_path = self.path.with_extension("tmp");
        let mut file = File::create(&tmp_path).map_err(PreferencesError::io(&tmp_path))?;
        file.write_all(payload.as_bytes())
            .and_then(|()| file.sync_all())
            .map_err(PreferencesError::io(&tmp_path))?;
        drop(file);
        fs::rename(&tmp_path, &self.path).map_err(PreferencesError::io(&self.path))?;
        debug!("saved preferences to {}", self.path.display());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
