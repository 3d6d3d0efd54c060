use std::error::Error;
use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn cli(workspace: &Path) -> Result<Command, Box<dyn Error>> {
    let mut cmd = Command::cargo_bin("scenekeeper-cli")?;
    cmd.current_dir(workspace)
        .arg("--workspace")
        .arg(workspace);
    Ok(cmd)
}

#[test]
fn show_reports_an_empty_store() -> Result<(), Box<dyn Error>> {
    let workspace = tempdir()?;

    cli(workspace.path())?
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Key: SceneKeeper_cachedHierarchyData_storage_key",
        ))
        .stdout(predicate::str::contains("No recorded state"));
    Ok(())
}

#[test]
fn pin_show_and_unpin_round_trip() -> Result<(), Box<dyn Error>> {
    let workspace = tempdir()?;

    cli(workspace.path())?
        .args(["pin", "Systems/Audio"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pinned 'Systems/Audio'"));
    assert!(workspace
        .path()
        .join(".scenekeeper")
        .join("state.kv")
        .exists());

    cli(workspace.path())?
        .args(["pin", "Systems/Audio"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already pinned"));

    cli(workspace.path())?
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("Always expanded: 1"))
        .stdout(predicate::str::contains("  Systems/Audio"));

    cli(workspace.path())?
        .args(["unpin", "Systems/Audio"])
        .assert()
        .success();

    cli(workspace.path())?
        .args(["unpin", "Systems/Audio"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::starts_with("Error: 'Systems/Audio' is not pinned"));
    Ok(())
}

#[test]
fn products_do_not_share_state() -> Result<(), Box<dyn Error>> {
    let workspace = tempdir()?;

    cli(workspace.path())?
        .args(["--product", "Game", "pin", "Player"])
        .assert()
        .success();

    cli(workspace.path())?
        .args(["--product", "Tools", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No recorded state"));

    cli(workspace.path())?
        .args(["--product", "Game", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("  Player"));
    Ok(())
}

#[test]
fn clear_empties_the_store() -> Result<(), Box<dyn Error>> {
    let workspace = tempdir()?;
    let store = workspace.path().join("custom").join("state.kv");

    cli(workspace.path())?
        .arg("--store")
        .arg(&store)
        .args(["pin", "Player"])
        .assert()
        .success();

    cli(workspace.path())?
        .arg("--store")
        .arg(&store)
        .arg("clear")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared recorded scene state"));

    cli(workspace.path())?
        .arg("--store")
        .arg(&store)
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("No recorded state"));
    Ok(())
}

#[test]
fn corrupt_store_is_reported_and_can_be_cleared() -> Result<(), Box<dyn Error>> {
    let workspace = tempdir()?;
    let store = workspace.path().join(".scenekeeper").join("state.kv");
    fs::create_dir_all(store.parent().unwrap())?;
    // base64 of `{not json`
    fs::write(
        &store,
        "SceneKeeper_cachedHierarchyData_storage_key=e25vdCBqc29u\n",
    )?;

    cli(workspace.path())?
        .arg("show")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("scene state unavailable"));

    cli(workspace.path())?.arg("clear").assert().success();
    cli(workspace.path())?
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("No recorded state"));
    Ok(())
}

#[test]
fn prefs_show_lists_defaults() -> Result<(), Box<dyn Error>> {
    let workspace = tempdir()?;

    cli(workspace.path())?
        .args(["prefs", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("keep_hierarchy = true"))
        .stdout(predicate::str::contains("ignore_hierarchy_in_live_mode = false"))
        .stdout(predicate::str::contains("ignore_selection_in_live_mode = true"));
    Ok(())
}

#[test]
fn prefs_set_persists_the_switch() -> Result<(), Box<dyn Error>> {
    let workspace = tempdir()?;

    cli(workspace.path())?
        .args(["prefs", "set", "keep_selection", "false"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Set keep_selection = false"));

    let saved = fs::read_to_string(
        workspace
            .path()
            .join(".scenekeeper")
            .join("preferences.json"),
    )?;
    assert!(saved.contains("\"keep_selection\": false"));

    cli(workspace.path())?
        .args(["prefs", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("keep_selection = false"));
    Ok(())
}

#[test]
fn prefs_set_rejects_unknown_keys() -> Result<(), Box<dyn Error>> {
    let workspace = tempdir()?;

    cli(workspace.path())?
        .args(["prefs", "set", "keep_everything", "true"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("unknown preference `keep_everything`"));
    assert!(!workspace
        .path()
        .join(".scenekeeper")
        .join("preferences.json")
        .exists());
    Ok(())
}

#[test]
fn unpin_ignores_case_and_padding_is_kept() -> Result<(), Box<dyn Error>> {
    let workspace = tempdir()?;

    cli(workspace.path())?
        .args(["pin", "Systems/Audio"])
        .assert()
        .success();
    cli(workspace.path())?
        .args(["pin", "systems/audio"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already pinned"));
    cli(workspace.path())?
        .args(["unpin", "SYSTEMS/AUDIO"])
        .assert()
        .success();

    cli(workspace.path())?
        .args(["pin", " Lights "])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pinned ' Lights '"));
    cli(workspace.path())?
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("Always expanded: 1\n   Lights \n"));
    Ok(())
}
