use scenekeeper_settings::{KeeperPreferences, PreferencesError, PreferencesStore};
use std::fs;
use tempfile::tempdir;

#[test]
fn load_missing_file_returns_defaults() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("preferences.json");

    let store = PreferencesStore::load(&path).expect("load defaults");
    let prefs = store.preferences();
    assert!(prefs.keep_hierarchy);
    assert!(prefs.keep_selection);
    assert!(!prefs.ignore_hierarchy_in_live_mode);
    assert!(prefs.ignore_selection_in_live_mode);
    assert!(!path.exists(), "loading defaults must not create the file");
}

#[test]
fn update_persists_and_reloads() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("nested").join("preferences.json");

    let mut store = PreferencesStore::new(path.clone(), KeeperPreferences::default());
    store
        .update(|prefs| {
            prefs.keep_selection = false;
            prefs.set_flag("ignore_hierarchy_in_live_mode", true)
        })
        .expect("save");

    assert!(!path.with_extension("tmp").exists());
    let reloaded = PreferencesStore::load(&path).expect("reload");
    assert!(!reloaded.preferences().keep_selection);
    assert!(reloaded.preferences().ignore_hierarchy_in_live_mode);
    assert!(reloaded.preferences().keep_hierarchy);
}

#[test]
fn failed_update_leaves_preferences_untouched() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("preferences.json");

    let mut store = PreferencesStore::load(&path).expect("defaults");
    let err = store
        .update(|prefs| {
            prefs.keep_hierarchy = false;
            prefs.set_flag("keep_everything", true)
        })
        .unwrap_err();

    assert!(matches!(err, PreferencesError::UnknownKey(key) if key == "keep_everything"));
    assert!(store.preferences().keep_hierarchy);
    assert!(!path.exists());
}

#[test]
fn partial_and_legacy_files_fill_in_defaults() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("preferences.json");
    fs::write(&path, r#"{ "version": 0, "keep_hierarchy": false }"#).expect("write legacy prefs");

    let store = PreferencesStore::load(&path).expect("load legacy file");
    let prefs = store.preferences();
    assert_eq!(prefs.version, 1, "legacy preferences should be upgraded");
    assert!(!prefs.keep_hierarchy);
    assert!(prefs.keep_selection);
    assert!(prefs.ignore_selection_in_live_mode);
}

#[test]
fn malformed_file_reports_its_path() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("preferences.json");
    fs::write(&path, "keep_hierarchy = yes").expect("write");

    let err = PreferencesStore::load(&path).unwrap_err();
    assert!(err.to_string().contains("preferences.json"));
}
