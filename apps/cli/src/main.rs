use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use log::debug;
use scenekeeper::SceneKeeper;
use scenekeeper_scene::NodePath;
use scenekeeper_settings::{KeeperPreferences, PreferencesStore};
use scenekeeper_state::{FileKeyValueStore, RootStore, StateGateway};

const DEFAULT_PRODUCT: &str = "SceneKeeper";

#[derive(Parser)]
#[command(
    name = "scenekeeper-cli",
    about = "Maintenance commands for recorded scene tree-view state",
    author,
    version
)]
struct Cli {
    /// 指定工作區根目錄；預設為目前目錄。 / Workspace root (defaults to current directory).
    #[arg(long, global = true, value_name = "PATH")]
    workspace: Option<PathBuf>,

    /// 狀態檔案路徑。 / Key-value file holding the recorded state.
    #[arg(long, global = true, value_name = "FILE")]
    store: Option<PathBuf>,

    /// 產品名稱，用於組出儲存鍵值。 / Product name scoping the storage key.
    #[arg(long, global = true, value_name = "NAME", default_value = DEFAULT_PRODUCT)]
    product: String,

    /// 偏好設定檔路徑。 / Preferences file.
    #[arg(long, global = true, value_name = "FILE")]
    prefs: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 顯示已記錄的狀態摘要。 / Summarize the recorded state.
    Show,
    /// 清除所有已記錄的狀態。 / Forget every recorded expansion, selection and pinned path.
    Clear,
    /// 將路徑設為永遠展開。 / Keep a node path expanded in every scene.
    Pin(PathArgs),
    /// 取消永遠展開。 / Stop keeping a node path expanded.
    Unpin(PathArgs),
    /// 檢視或修改偏好設定。 / Inspect or change preferences.
    #[command(subcommand)]
    Prefs(PrefsCommand),
}

#[derive(Args)]
struct PathArgs {
    /// 節點路徑，例如 `Systems/Audio`。 / Node path such as `Systems/Audio`.
    #[arg(value_name = "PATH")]
    path: String,
}

#[derive(Subcommand)]
enum PrefsCommand {
    /// 顯示目前的偏好設定。 / Print the current preferences.
    Show,
    /// 設定單一開關。 / Set one switch.
    Set(PrefsSetArgs),
}

#[derive(Args)]
struct PrefsSetArgs {
    #[arg(value_name = "KEY")]
    key: String,
    #[arg(value_name = "true|false", action = ArgAction::Set)]
    value: bool,
}

struct Paths {
    store: PathBuf,
    prefs: PathBuf,
}

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let workspace_root = resolve_workspace(cli.workspace)?;
    let paths = Paths {
        store: match cli.store {
            Some(path) => resolve_relative(&workspace_root, path),
            None => default_store_path(&workspace_root),
        },
        prefs: match cli.prefs {
            Some(path) => resolve_relative(&workspace_root, path),
            None => default_preferences_path(&workspace_root),
        },
    };
    debug!(
        "using store {} and preferences {}",
        paths.store.display(),
        paths.prefs.display()
    );

    match cli.command {
        Commands::Show => show_state(&paths, &cli.product),
        Commands::Clear => clear_state(&paths, &cli.product),
        Commands::Pin(args) => pin_path(&paths, &cli.product, args),
        Commands::Unpin(args) => unpin_path(&paths, &cli.product, args),
        Commands::Prefs(command) => execute_prefs_command(command, &paths),
    }
}

fn open_keeper(paths: &Paths, product: &str) -> Result<SceneKeeper<FileKeyValueStore>> {
    let preferences = load_preferences(&paths.prefs)?;
    let backend = FileKeyValueStore::open(&paths.store)
        .with_context(|| format!("failed to open {}", paths.store.display()))?;
    Ok(SceneKeeper::new(
        StateGateway::new(backend, product),
        *preferences.preferences(),
    ))
}

fn load_preferences(path: &Path) -> Result<PreferencesStore> {
    PreferencesStore::load(path)
        .with_context(|| format!("failed to load preferences from {}", path.display()))
}

fn show_state(paths: &Paths, product: &str) -> Result<()> {
    let mut keeper = open_keeper(paths, product)?;
    let key = keeper.gateway().key().to_string();
    let store = keeper
        .store()
        .with_context(|| format!("failed to read {key} from {}", paths.store.display()))?;
    print!("{}", render_summary(&key, store));
    Ok(())
}

fn render_summary(key: &str, store: &RootStore) -> String {
    let mut out = format!("Key: {key}\nFormat version: {}\n", store.format_version);
    if !store.has_data() {
        out.push_str("No recorded state\n");
        return out;
    }

    out.push_str(&format!("Hierarchy records: {}\n", store.hierarchies.len()));
    for record in &store.hierarchies {
        out.push_str(&format!(
            "  {} ({} expanded)\n",
            record.scene,
            record.expanded.len()
        ));
    }
    out.push_str(&format!("Selection records: {}\n", store.selections.len()));
    for record in &store.selections {
        let selected: Vec<&str> = record.selected.iter().map(NodePath::as_str).collect();
        out.push_str(&format!("  {}: [{}]\n", record.scene, selected.join(", ")));
    }
    out.push_str(&format!(
        "Always expanded: {}\n",
        store.always_expanded.len()
    ));
    for path in store.always_expanded.iter() {
        out.push_str(&format!("  {path}\n"));
    }
    out
}

fn clear_state(paths: &Paths, product: &str) -> Result<()> {
    let mut keeper = open_keeper(paths, product)?;
    keeper
        .clear_all()
        .with_context(|| format!("failed to clear {}", paths.store.display()))?;
    println!("Cleared recorded scene state in {}", paths.store.display());
    Ok(())
}

fn pin_path(paths: &Paths, product: &str, args: PathArgs) -> Result<()> {
    let path = parse_node_path(&args.path)?;
    let mut keeper = open_keeper(paths, product)?;
    if keeper.pin_always_expanded(path.clone())? {
        println!("Pinned '{path}'");
    } else {
        println!("'{path}' is already pinned");
    }
    Ok(())
}

fn unpin_path(paths: &Paths, product: &str, args: PathArgs) -> Result<()> {
    let path = parse_node_path(&args.path)?;
    let mut keeper = open_keeper(paths, product)?;
    if !keeper.unpin_always_expanded(&path)? {
        bail!("'{path}' is not pinned");
    }
    println!("Unpinned '{path}'");
    Ok(())
}

fn parse_node_path(input: &str) -> Result<NodePath> {
    if input.trim().is_empty() {
        bail!("node path must not be empty");
    }
    Ok(NodePath::from(input))
}

fn execute_prefs_command(command: PrefsCommand, paths: &Paths) -> Result<()> {
    match command {
        PrefsCommand::Show => {
            let store = load_preferences(&paths.prefs)?;
            print!("{}", render_preferences(store.preferences()));
            Ok(())
        }
        PrefsCommand::Set(args) => {
            let mut store = load_preferences(&paths.prefs)?;
            store
                .update(|prefs| prefs.set_flag(&args.key, args.value))
                .with_context(|| format!("failed to update {}", paths.prefs.display()))?;
            println!("Set {} = {}", args.key, args.value);
            Ok(())
        }
    }
}

fn render_preferences(preferences: &KeeperPreferences) -> String {
    KeeperPreferences::KEYS
        .iter()
        .filter_map(|key| {
            preferences
                .flag(key)
                .ok()
                .map(|value| format!("{key} = {value}\n"))
        })
        .collect()
}

fn default_store_path(workspace_root: &Path) -> PathBuf {
    workspace_root.join(".scenekeeper").join("state.kv")
}

fn default_preferences_path(workspace_root: &Path) -> PathBuf {
    workspace_root.join(".scenekeeper").join("preferences.json")
}

fn resolve_workspace(workspace: Option<PathBuf>) -> Result<PathBuf> {
    match workspace {
        Some(path) if path.is_absolute() => Ok(path),
        Some(path) => Ok(std::env::current_dir()
            .context("determine current directory")?
            .join(path)),
        None => std::env::current_dir().context("determine current directory"),
    }
}

fn resolve_relative(workspace_root: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        workspace_root.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenekeeper_state::SceneIdentity;

    #[test]
    fn summary_lists_records_and_pins() {
        let mut store = RootStore::default();
        let scene = SceneIdentity::from("Assets/Main.scene");
        store
            .get_or_create_hierarchy(&scene)
            .expanded
            .push(NodePath::from("A"));
        store
            .get_or_create_selection(&scene)
            .selected
            .extend([NodePath::from("A/B"), NodePath::from("A")]);
        store.always_expanded.insert(NodePath::from("Systems"));

        let summary = render_summary("Game_key", &store);
        assert!(summary.contains("  Assets/Main.scene (1 expanded)\n"));
        assert!(summary.contains("  Assets/Main.scene: [A/B, A]\n"));
        assert!(summary.contains("Always expanded: 1\n  Systems\n"));
    }

    #[test]
    fn empty_summary_says_so() {
        let summary = render_summary("Game_key", &RootStore::default());
        assert!(summary.ends_with("No recorded state\n"));
    }

    #[test]
    fn blank_paths_are_rejected_and_others_kept_verbatim() {
        assert!(parse_node_path("  ").is_err());
        assert!(parse_node_path("").is_err());
        assert_eq!(parse_node_path(" Padded /B").unwrap(), NodePath::from(" Padded /B"));
    }
}
