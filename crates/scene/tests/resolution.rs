use scenekeeper_scene::{encode, MemoryEditor, NodeResolver, SceneGraph, SceneHandle};

fn build_level(editor: &mut MemoryEditor, identity: &str, width: usize) -> SceneHandle {
    let scene = editor.add_scene(identity);
    for group in 0..width {
        let root = editor.add_root(scene, format!("Group{group}")).unwrap();
        for item in 0..width {
            let child = editor.add_child(root, format!("Item{item}")).unwrap();
            editor.add_child(child, "Mesh").unwrap();
        }
    }
    scene
}

#[test]
fn repeated_resolution_is_stable() {
    let mut editor = MemoryEditor::new();
    editor.set_name_lookup_enabled(false);
    let scene = build_level(&mut editor, "Assets/Level.scene", 6);
    let mut resolver = NodeResolver::new();

    let first = resolver.resolve(&editor, scene, "Group3/Item4/Mesh");
    let second = resolver.resolve(&editor, scene, "group3/item4/mesh");
    assert!(first.is_some());
    assert_eq!(first, second);
    assert_eq!(
        encode(&editor, first.unwrap()).unwrap().as_str(),
        "Group3/Item4/Mesh"
    );
}

#[test]
fn one_scan_warms_the_cache_for_earlier_nodes() {
    let mut editor = MemoryEditor::new();
    editor.set_name_lookup_enabled(false);
    let scene = build_level(&mut editor, "Assets/Level.scene", 4);
    let mut resolver = NodeResolver::new();

    resolver.resolve(&editor, scene, "Group3/Item3/Mesh").unwrap();
    let visited = resolver.cache().len();
    // Every node of the level is visited before the last one matches.
    assert_eq!(visited, 4 + 4 * 4 * 2);

    resolver.resolve(&editor, scene, "Group1/Item2").unwrap();
    assert_eq!(resolver.cache().len(), visited);
}

#[test]
fn identical_paths_in_two_scenes_stay_apart() {
    let mut editor = MemoryEditor::new();
    editor.set_name_lookup_enabled(false);
    let first = build_level(&mut editor, "Assets/First.scene", 2);
    let second = build_level(&mut editor, "Assets/Second.scene", 2);
    let mut resolver = NodeResolver::new();

    let in_first = resolver.resolve(&editor, first, "Group1/Item0").unwrap();
    let in_second = resolver.resolve(&editor, second, "Group1/Item0").unwrap();
    assert_ne!(in_first, in_second);
    assert_eq!(editor.scene_of(in_first), Some(first));
    assert_eq!(editor.scene_of(in_second), Some(second));
}

#[test]
fn renamed_nodes_resolve_under_their_new_name() {
    let mut editor = MemoryEditor::new();
    editor.set_name_lookup_enabled(false);
    let scene = build_level(&mut editor, "Assets/Level.scene", 2);
    let node = editor.node_at(scene, "Group1/Item1").unwrap();
    editor.rename(node, "Renamed").unwrap();

    let mut resolver = NodeResolver::new();
    assert_eq!(resolver.resolve(&editor, scene, "Group1/Renamed"), Some(node));
    assert!(resolver.resolve(&editor, scene, "Group1/Item1").is_none());
}
