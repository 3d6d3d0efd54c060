use std::collections::{HashMap, HashSet};

use log::{debug, info, warn};
use scenekeeper_scene::{encode, EditorHost, NodeId, NodePath, NodeResolver, PathKey, SceneHandle};
use scenekeeper_settings::KeeperPreferences;
use scenekeeper_state::{KeyValueStore, RootStore, SceneIdentity, StateError, StateGateway};

use crate::error::KeeperError;
use crate::tracker::SelectionTracker;

/// Host notifications the keeper reacts to, delivered in order on one thread.
/// 保存器處理的宿主通知，依序在單一執行緒上傳遞。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    SceneOpened(SceneHandle),
    SceneLoaded(SceneHandle),
    SceneClosing(SceneHandle),
    SceneUnloaded(SceneHandle),
    SelectionChanged,
    /// Deferred callback once the editor finished starting up.
    Startup,
    /// The editor process is about to quit.
    Exit,
}

/// Lifecycle state of one scene as seen by the keeper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneState {
    Loaded,
    Unloaded,
}

/// Outcome of restoring one scene.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub expanded: usize,
    pub selected: usize,
    /// Stored paths that no longer resolve to a node.
    pub missing: usize,
}

/// Outcome of capturing one scene.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureReport {
    /// `None` when the hierarchy was not captured.
    pub expanded: Option<usize>,
    /// `None` when the selection was not captured.
    pub selected: Option<usize>,
}

/// Records and restores tree-view expansion and selection across scene reloads.
/// 在場景重新載入之間記錄並還原樹狀檢視的展開與選取狀態。
///
/// One keeper is built per editor process and owns all mutable state: the
/// persisted [`RootStore`], the resolution cache and the selection history.
/// The store is read from the backend on first use, not at construction, and
/// every mutation is written back immediately. Every capture and restore is a
/// no-op while the host tree view is closed.
#[derive(Debug)]
pub struct SceneKeeper<S> {
    gateway: StateGateway<S>,
    store: Option<RootStore>,
    resolver: NodeResolver,
    tracker: SelectionTracker,
    preferences: KeeperPreferences,
    scenes: HashMap<SceneHandle, SceneState>,
    attached: bool,
    surface_seen: bool,
}

impl<S: KeyValueStore> SceneKeeper<S> {
    pub fn new(gateway: StateGateway<S>, preferences: KeeperPreferences) -> Self {
        Self {
            gateway,
            store: None,
            resolver: NodeResolver::new(),
            tracker: SelectionTracker::new(),
            preferences,
            scenes: HashMap::new(),
            attached: false,
            surface_seen: false,
        }
    }

    /// Starts listening to [`LifecycleEvent`]s passed to [`handle`](Self::handle).
    pub fn attach(&mut self) {
        self.attached = true;
    }

    /// Stops listening; subsequent events are ignored until re-attached.
    pub fn detach(&mut self) {
        self.attached = false;
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn preferences(&self) -> &KeeperPreferences {
        &self.preferences
    }

    pub fn set_preferences(&mut self, preferences: KeeperPreferences) {
        self.preferences = preferences;
    }

    pub fn gateway(&self) -> &StateGateway<S> {
        &self.gateway
    }

    pub fn tracker(&self) -> &SelectionTracker {
        &self.tracker
    }

    pub fn scene_state(&self, scene: SceneHandle) -> Option<SceneState> {
        self.scenes.get(&scene).copied()
    }

    /// The persisted store, loading it from the backend on first access.
    /// 取得持久化狀態；首次存取時自後端載入。
    pub fn store(&mut self) -> Result<&RootStore, KeeperError> {
        Ok(load_store(&mut self.store, &self.gateway)?)
    }

    /// Dispatches one host notification.
    /// 分派一則宿主通知。
    ///
    /// Opening and loading a scene both arrive for the same scene, as do
    /// closing and unloading; only the first of each pair does any work.
    pub fn handle<H>(&mut self, host: &mut H, event: LifecycleEvent) -> Result<(), KeeperError>
    where
        H: EditorHost + ?Sized,
    {
        if !self.attached {
            return Ok(());
        }
        match event {
            LifecycleEvent::SceneOpened(scene) | LifecycleEvent::SceneLoaded(scene) => {
                if self.scene_state(scene) == Some(SceneState::Loaded) {
                    return Ok(());
                }
                self.scenes.insert(scene, SceneState::Loaded);
                self.restore_scene(host, scene).map(|_| ())
            }
            LifecycleEvent::SceneClosing(scene) | LifecycleEvent::SceneUnloaded(scene) => {
                if self.scene_state(scene) == Some(SceneState::Unloaded) {
                    return Ok(());
                }
                self.scenes.insert(scene, SceneState::Unloaded);
                let result = self.capture_scene(host, scene).map(|_| ());
                self.tracker.forget(scene);
                result
            }
            LifecycleEvent::SelectionChanged => {
                self.observe_selection(host);
                Ok(())
            }
            LifecycleEvent::Startup => self.restore_all_loaded(host),
            LifecycleEvent::Exit => self.capture_all_loaded(host),
        }
    }

    /// Feeds the host's current selection into the selection history.
    pub fn observe_selection<H>(&mut self, host: &H)
    where
        H: EditorHost + ?Sized,
    {
        if !self.preferences.keep_selection || !self.surface_open(host) {
            return;
        }
        let selection = host.current_selection();
        self.tracker.observe(host, &selection, host.has_focus());
    }

    /// Re-applies the recorded expansion and selection of `scene`.
    /// 重新套用 `scene` 已記錄的展開與選取狀態。
    ///
    /// Pinned paths are expanded first, then the scene's own record. A path is
    /// resolved at most once per call, even when it is both expanded and
    /// selected.
    pub fn restore_scene<H>(
        &mut self,
        host: &mut H,
        scene: SceneHandle,
    ) -> Result<RestoreReport, KeeperError>
    where
        H: EditorHost + ?Sized,
    {
        let mut report = RestoreReport::default();
        if !self.surface_open(host) {
            return Ok(report);
        }
        let Some(identity) = host.scene_identity(scene).map(SceneIdentity::new) else {
            warn!("cannot restore {scene}: the host no longer knows it");
            return Ok(report);
        };
        let restore_hierarchy = self.preferences.keep_hierarchy;
        let restore_selection = self.preferences.keep_selection;
        if !restore_hierarchy && !restore_selection {
            return Ok(report);
        }

        let store = load_store(&mut self.store, &self.gateway)?;
        let mut resolved: HashMap<PathKey, Option<NodeId>> = HashMap::new();

        if restore_hierarchy {
            let pinned = store.always_expanded.iter();
            let recorded = store
                .try_get_hierarchy(&identity)
                .into_iter()
                .flat_map(|record| record.expanded.iter());
            let mut expanded: HashSet<PathKey> = HashSet::new();
            for path in pinned.chain(recorded) {
                if !expanded.insert(path.key()) {
                    continue;
                }
                match resolve_once(&mut self.resolver, &mut resolved, &*host, scene, path) {
                    Some(node) => {
                        let handle = host.node_to_handle(node);
                        host.set_expanded(handle, true);
                        report.expanded += 1;
                    }
                    None => report.missing += 1,
                }
            }
        }

        if restore_selection {
            if let Some(record) = store.try_get_selection(&identity) {
                let mut nodes: Vec<NodeId> = Vec::with_capacity(record.selected.len());
                for path in &record.selected {
                    match resolve_once(&mut self.resolver, &mut resolved, &*host, scene, path) {
                        Some(node) if !nodes.contains(&node) => nodes.push(node),
                        Some(_) => {}
                        None => report.missing += 1,
                    }
                }
                if !nodes.is_empty() {
                    host.set_selection(&nodes);
                    report.selected = nodes.len();
                }
            }
        }

        info!(
            "restored {identity}: {} expanded, {} selected, {} missing",
            report.expanded, report.selected, report.missing
        );
        Ok(report)
    }

    /// Records the selection and expansion of `scene`, then saves once.
    /// 記錄 `scene` 的選取與展開狀態，並儲存一次。
    pub fn capture_scene<H>(
        &mut self,
        host: &mut H,
        scene: SceneHandle,
    ) -> Result<CaptureReport, KeeperError>
    where
        H: EditorHost + ?Sized,
    {
        let Some(report) = self.capture_records(host, scene)? else {
            return Ok(CaptureReport::default());
        };
        self.save()?;
        Ok(report)
    }

    /// Restores every loaded scene, covering scenes opened before the keeper existed.
    /// 還原所有已載入場景，涵蓋保存器建立前即已開啟的場景。
    pub fn restore_all_loaded<H>(&mut self, host: &mut H) -> Result<(), KeeperError>
    where
        H: EditorHost + ?Sized,
    {
        for scene in host.loaded_scenes() {
            self.scenes.insert(scene, SceneState::Loaded);
            self.restore_scene(host, scene)?;
        }
        Ok(())
    }

    /// Captures every loaded scene and saves once.
    /// 擷取所有已載入場景並儲存一次。
    ///
    /// Skipped entirely when the tree view was never seen open in this process.
    pub fn capture_all_loaded<H>(&mut self, host: &mut H) -> Result<(), KeeperError>
    where
        H: EditorHost + ?Sized,
    {
        if !self.surface_seen {
            debug!("tree view never opened, nothing to capture");
            return Ok(());
        }
        let mut captured = false;
        for scene in host.loaded_scenes() {
            captured |= self.capture_records(host, scene)?.is_some();
        }
        if captured {
            self.save()?;
        }
        Ok(())
    }

    /// Pins `path` open in every scene. Returns `false` if it was already pinned.
    /// 將 `path` 設為所有場景永遠展開；若已設定則回傳 `false`。
    pub fn pin_always_expanded(&mut self, path: impl Into<NodePath>) -> Result<bool, KeeperError> {
        let store = load_store(&mut self.store, &self.gateway)?;
        let added = store.always_expanded.insert(path.into());
        if added {
            self.save()?;
        }
        Ok(added)
    }

    /// Removes a pinned path. Returns `false` if it was not pinned.
    pub fn unpin_always_expanded(&mut self, path: &NodePath) -> Result<bool, KeeperError> {
        let store = load_store(&mut self.store, &self.gateway)?;
        let removed = store.always_expanded.remove(path);
        if removed {
            self.save()?;
        }
        Ok(removed)
    }

    pub fn is_always_expanded(&mut self, path: &NodePath) -> Result<bool, KeeperError> {
        Ok(self.store()?.always_expanded.contains(path))
    }

    /// Pins the paths of every currently selected node; returns how many were added.
    pub fn pin_selection<H>(&mut self, host: &H) -> Result<usize, KeeperError>
    where
        H: EditorHost + ?Sized,
    {
        let paths: Vec<NodePath> = host
            .current_selection()
            .into_iter()
            .filter_map(|node| encode(host, node))
            .collect();
        let store = load_store(&mut self.store, &self.gateway)?;
        let added = paths
            .into_iter()
            .filter(|path| store.always_expanded.insert(path.clone()))
            .count();
        if added > 0 {
            self.save()?;
        }
        Ok(added)
    }

    /// `true` when anything has been recorded.
    pub fn has_data(&mut self) -> Result<bool, KeeperError> {
        Ok(self.store()?.has_data())
    }

    /// Forgets every record, pinned path, cached node and selection history,
    /// then persists the empty store.
    /// 清除所有紀錄、釘選路徑、節點快取與選取紀錄，並儲存空白狀態。
    pub fn clear_all(&mut self) -> Result<(), KeeperError> {
        self.store = Some(RootStore::default());
        self.resolver.reset();
        self.tracker.clear();
        self.save()?;
        info!("cleared all recorded scene state");
        Ok(())
    }

    fn surface_open<H>(&mut self, host: &H) -> bool
    where
        H: EditorHost + ?Sized,
    {
        if host.is_open() {
            self.surface_seen = true;
            true
        } else {
            debug!("tree view closed, skipping");
            false
        }
    }

    /// Writes the selection and hierarchy records of `scene` into the store
    /// without saving. `None` when nothing was eligible for capture.
    fn capture_records<H>(
        &mut self,
        host: &mut H,
        scene: SceneHandle,
    ) -> Result<Option<CaptureReport>, KeeperError>
    where
        H: EditorHost + ?Sized,
    {
        if !self.surface_open(host) {
            return Ok(None);
        }
        if !self.preferences.keep_selection && !self.preferences.keep_hierarchy {
            return Ok(None);
        }
        let Some(identity) = host.scene_identity(scene).map(SceneIdentity::new) else {
            warn!("cannot capture {scene}: the host no longer knows it");
            return Ok(None);
        };
        let live = host.is_live_mode();
        let store = load_store(&mut self.store, &self.gateway)?;
        let mut report = CaptureReport::default();

        let capture_selection = self.preferences.keep_selection
            && !(live && self.preferences.ignore_selection_in_live_mode);
        if capture_selection {
            if let Some(history) = self.tracker.history(scene) {
                let record = store.get_or_create_selection(&identity);
                record.selected.clear();
                record
                    .selected
                    .extend(history.iter().filter_map(|node| encode(&*host, *node)));
                report.selected = Some(record.selected.len());
            }
        }

        // Expansion is never recorded while live, whatever
        // `ignore_hierarchy_in_live_mode` says.
        if self.preferences.keep_hierarchy && !live {
            let record = store.get_or_create_hierarchy(&identity);
            record.expanded.clear();
            for handle in host.expanded_handles() {
                let Some(node) = host.handle_to_node(handle) else {
                    continue;
                };
                if host.scene_of(node) != Some(scene) {
                    continue;
                }
                if let Some(path) = encode(&*host, node) {
                    record.expanded.push(path);
                }
            }
            report.expanded = Some(record.expanded.len());
        }

        info!(
            "captured {identity}: expanded {:?}, selected {:?}",
            report.expanded, report.selected
        );
        Ok(Some(report))
    }

    fn save(&mut self) -> Result<(), KeeperError> {
        let store = load_store(&mut self.store, &self.gateway)?;
        self.gateway.save(store)?;
        Ok(())
    }
}

fn load_store<'a, S: KeyValueStore>(
    slot: &'a mut Option<RootStore>,
    gateway: &StateGateway<S>,
) -> Result<&'a mut RootStore, StateError> {
    if slot.is_none() {
        *slot = Some(gateway.load_or_create()?);
    }
    Ok(slot.get_or_insert_with(RootStore::default))
}

fn resolve_once<H>(
    resolver: &mut NodeResolver,
    resolved: &mut HashMap<PathKey, Option<NodeId>>,
    host: &H,
    scene: SceneHandle,
    path: &NodePath,
) -> Option<NodeId>
where
    H: EditorHost + ?Sized,
{
    *resolved
        .entry(path.key())
        .or_insert_with(|| resolver.resolve(host, scene, path.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenekeeper_scene::{MemoryEditor, SelectionHost};
    use scenekeeper_state::MemoryKeyValueStore;

    fn keeper() -> SceneKeeper<MemoryKeyValueStore> {
        let gateway = StateGateway::new(MemoryKeyValueStore::new(), "Test");
        let mut keeper = SceneKeeper::new(gateway, KeeperPreferences::default());
        keeper.attach();
        keeper
    }

    #[test]
    fn store_is_loaded_lazily() {
        let mut backend = MemoryKeyValueStore::new();
        backend
            .set(&scenekeeper_state::storage_key("Test"), "{broken")
            .unwrap();
        let mut keeper = SceneKeeper::new(
            StateGateway::new(backend, "Test"),
            KeeperPreferences::default(),
        );
        assert!(keeper.preferences().keep_hierarchy);
        assert!(matches!(keeper.has_data(), Err(KeeperError::State(_))));
    }

    #[test]
    fn open_and_load_restore_only_once() {
        let mut editor = MemoryEditor::new();
        let scene = editor.add_scene("Assets/Main.scene");
        let a = editor.add_root(scene, "A").unwrap();
        let mut keeper = keeper();
        keeper.pin_always_expanded("A").unwrap();

        keeper
            .handle(&mut editor, LifecycleEvent::SceneOpened(scene))
            .unwrap();
        assert!(editor.is_expanded(a));
        assert_eq!(keeper.scene_state(scene), Some(SceneState::Loaded));

        editor.collapse_all();
        keeper
            .handle(&mut editor, LifecycleEvent::SceneLoaded(scene))
            .unwrap();
        assert!(!editor.is_expanded(a));
    }

    #[test]
    fn closing_and_unloading_capture_only_once() {
        let mut editor = MemoryEditor::new();
        let scene = editor.add_scene("Assets/Main.scene");
        let a = editor.add_root(scene, "A").unwrap();
        editor.expand(a);
        let mut keeper = keeper();

        keeper
            .handle(&mut editor, LifecycleEvent::SceneClosing(scene))
            .unwrap();
        assert_eq!(keeper.scene_state(scene), Some(SceneState::Unloaded));

        editor.collapse_all();
        keeper
            .handle(&mut editor, LifecycleEvent::SceneUnloaded(scene))
            .unwrap();
        let identity = SceneIdentity::from("Assets/Main.scene");
        let record = keeper.store().unwrap().try_get_hierarchy(&identity).unwrap();
        assert_eq!(record.expanded, vec![NodePath::from("A")]);
    }

    #[test]
    fn shared_paths_resolve_once_per_restore() {
        let mut editor = MemoryEditor::new();
        let scene = editor.add_scene("Assets/Main.scene");
        let a = editor.add_root(scene, "A").unwrap();
        let b = editor.add_child(a, "B").unwrap();
        editor.expand(a);
        editor.expand(b);
        editor.set_selection(&[b]);
        let mut keeper = keeper();
        keeper.observe_selection(&editor);
        keeper.capture_scene(&mut editor, scene).unwrap();
        keeper.pin_always_expanded("a").unwrap();

        editor.collapse_all();
        editor.set_selection(&[]);
        let report = keeper.restore_scene(&mut editor, scene).unwrap();

        assert_eq!(
            report,
            RestoreReport {
                expanded: 2,
                selected: 1,
                missing: 0
            }
        );
        assert_eq!(editor.selection(), &[b]);
    }

    #[test]
    fn missing_paths_are_counted() {
        let mut editor = MemoryEditor::new();
        let scene = editor.add_scene("Assets/Main.scene");
        editor.add_root(scene, "A").unwrap();
        let mut keeper = keeper();
        keeper.pin_always_expanded("Gone/Child").unwrap();

        let report = keeper.restore_scene(&mut editor, scene).unwrap();
        assert_eq!(report.missing, 1);
        assert_eq!(report.expanded, 0);
    }

    #[test]
    fn pin_and_unpin_report_changes() {
        let mut keeper = keeper();
        let path = NodePath::from("Systems/Audio");
        assert!(keeper.pin_always_expanded(path.clone()).unwrap());
        assert!(!keeper.pin_always_expanded(path.clone()).unwrap());
        assert!(keeper.is_always_expanded(&path).unwrap());
        assert!(keeper.unpin_always_expanded(&path).unwrap());
        assert!(!keeper.unpin_always_expanded(&path).unwrap());
        assert!(!keeper.has_data().unwrap());
    }

    #[test]
    fn pin_selection_adds_selected_paths() {
        let mut editor = MemoryEditor::new();
        let scene = editor.add_scene("Assets/Main.scene");
        let a = editor.add_root(scene, "A").unwrap();
        let b = editor.add_child(a, "B").unwrap();
        editor.set_selection(&[a, b]);
        let mut keeper = keeper();

        assert_eq!(keeper.pin_selection(&editor).unwrap(), 2);
        assert_eq!(keeper.pin_selection(&editor).unwrap(), 0);
        assert!(keeper.is_always_expanded(&NodePath::from("A/B")).unwrap());
    }

    #[test]
    fn detached_keeper_ignores_events() {
        let mut editor = MemoryEditor::new();
        let scene = editor.add_scene("Assets/Main.scene");
        let a = editor.add_root(scene, "A").unwrap();
        editor.expand(a);
        let mut keeper = keeper();
        keeper.detach();

        keeper
            .handle(&mut editor, LifecycleEvent::SceneClosing(scene))
            .unwrap();
        assert_eq!(keeper.scene_state(scene), None);
        assert!(!keeper.has_data().unwrap());
        assert!(keeper.gateway().backend().is_empty());
    }

    #[test]
    fn clear_all_persists_an_empty_store() {
        let mut editor = MemoryEditor::new();
        let scene = editor.add_scene("Assets/Main.scene");
        let a = editor.add_root(scene, "A").unwrap();
        editor.expand(a);
        let mut keeper = keeper();
        keeper.capture_scene(&mut editor, scene).unwrap();
        assert!(keeper.has_data().unwrap());

        keeper.clear_all().unwrap();
        assert!(!keeper.has_data().unwrap());
        let reloaded = keeper.gateway().load_or_create().unwrap();
        assert!(!reloaded.has_data());
    }
}
