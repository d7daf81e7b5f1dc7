//! End-to-end tests for the tree engine through its controller.

use std::time::{Duration, Instant};

use horizon_arbor::{
    CommitOutcome, DragMove, Error, EventRecorder, InsertDirection, InteractionEvent, NodeId,
    NodeMove, NodeSpec, TitleError, Tooltip, TreeController, TreeEvent, TreeStore, validate_title,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("horizon_arbor=debug,horizon_arbor_core=debug")
        .with_test_writer()
        .try_init();
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// -1
/// ├── 1 folder
/// │   ├── 2
/// │   └── 3
/// ├── 4
/// └── 5
fn scenario_tree() -> TreeController {
    init_tracing();
    let mut tree = TreeController::new();
    tree.add_node(NodeSpec::folder(1, NodeId::ROOT, "docs", "folder")).unwrap();
    tree.add_node(NodeSpec::leaf(2, NodeId(1), "a.txt", "file")).unwrap();
    tree.add_node(NodeSpec::leaf(3, NodeId(1), "b.txt", "file")).unwrap();
    tree.add_node(NodeSpec::leaf(4, NodeId::ROOT, "todo", "file")).unwrap();
    tree.add_node(NodeSpec::leaf(5, NodeId::ROOT, "notes", "file")).unwrap();
    tree.build_done();
    tree
}

fn visible_ids(tree: &mut TreeController) -> Vec<i64> {
    let count = tree.visible_count();
    (0..count).map(|i| tree.visible_at(i).unwrap().id.0).collect()
}

fn assert_counts_consistent(store: &TreeStore) {
    for node in store.iter_preorder(NodeId::ROOT) {
        let info = node.child_info();
        assert_eq!(info.child_count, node.children().len());
        assert_eq!(info.has_children, info.child_count > 0);
        assert_eq!(
            info.total_descendant_count,
            store.iter_preorder(node.id()).count() - 1,
            "descendant count of {}",
            node.id()
        );
    }
}

/// Ids whose whole ancestor chain is expanded, in pre-order.
fn expected_visible(tree: &TreeController) -> Vec<i64> {
    let store = tree.store();
    store
        .iter_preorder(NodeId::ROOT)
        .skip(1)
        .filter(|node| {
            let mut parent = node.parent_id();
            while let Some(id) = parent.filter(|id| !id.is_root()) {
                let ancestor = store.get(id).unwrap();
                if ancestor.is_folder() && !tree.projection().collapse_state(id).is_expanded() {
                    return false;
                }
                parent = ancestor.parent_id();
            }
            true
        })
        .map(|node| node.id().0)
        .collect()
}

#[test]
fn test_scenario_a_add_then_remove() {
    init_tracing();
    let mut tree = TreeController::new();
    tree.add_node(NodeSpec::folder(1, NodeId::ROOT, "F1", "folder")).unwrap();
    tree.build_done();

    tree.add_node(NodeSpec::leaf(2, NodeId(1), "x", "file")).unwrap();
    assert_eq!(tree.store().get(NodeId(1)).unwrap().child_info().child_count, 1);

    tree.handle_event(NodeId(2), InteractionEvent::TouchDown).unwrap();
    assert_eq!(tree.remove_node().unwrap(), vec![NodeId(2)]);
    let info = tree.store().get(NodeId(1)).unwrap().child_info();
    assert_eq!(info.child_count, 0);
    assert!(!info.has_children);
    assert_counts_consistent(tree.store());
}

#[test]
fn test_scenario_b_commit_sanitizes_with_warning() {
    let mut tree = scenario_tree();
    assert!(validate_title("a/b").is_err());

    tree.handle_event(NodeId(4), InteractionEvent::TouchDown).unwrap();
    tree.modify_node().unwrap();
    let outcome = tree.commit_edit(NodeId(4), "a/b").unwrap();
    match outcome {
        CommitOutcome::Rejected { sanitized, error, .. } => {
            assert_eq!(sanitized, "ab");
            assert_eq!(error, TitleError::ForbiddenCharacters(vec!['/']));
        }
        CommitOutcome::Committed(_) => panic!("invalid title was committed"),
    }
    let view = tree.projection().view(NodeId(4)).unwrap();
    assert!(matches!(view.tooltip, Tooltip::Warning(_)));
    assert!(view.is_editing);
    assert_eq!(view.edit_text.as_deref(), Some("ab"));
}

#[test]
fn test_scenario_c_length_caps() {
    assert!(matches!(
        validate_title(&"中".repeat(300)),
        Err(TitleError::TooLong { limit: 254, .. })
    ));
    assert!(matches!(
        validate_title(&"x".repeat(300)),
        Err(TitleError::TooLong { limit: 255, .. })
    ));
    assert!(validate_title(&"中".repeat(254)).is_ok());
}

#[test]
fn test_scenario_d_drop_below_row_emits_one_move() {
    let mut tree = scenario_tree();
    tree.toggle_expand(0).unwrap();
    assert_eq!(visible_ids(&mut tree), vec![1, 2, 3, 4, 5]);
    let row_parent = tree.visible_at(2).unwrap().parent_id;

    let recorder = EventRecorder::attach(tree.events());
    let now = Instant::now();
    assert!(tree.on_drag_start(NodeId(5)).unwrap());
    tree.on_drag_enter();
    tree.on_drag_move(DragMove::new(40.0, 2), now).unwrap();
    let moved = tree.on_drop(None, now + ms(50)).unwrap().unwrap();

    assert_eq!(
        moved,
        NodeMove {
            current_node_id: NodeId(5),
            parent_node_id: row_parent,
            child_index: 2,
        }
    );
    let moves: Vec<_> = recorder
        .take()
        .into_iter()
        .filter(|e| matches!(e, TreeEvent::Move(_)))
        .collect();
    assert_eq!(moves, vec![TreeEvent::Move(moved)]);
    assert_eq!(visible_ids(&mut tree), vec![1, 2, 3, 5, 4]);
    assert_counts_consistent(tree.store());
}

#[test]
fn test_scenario_e_depth_limit() {
    init_tracing();
    let mut tree = TreeController::new();
    let mut parent = NodeId::ROOT;
    for id in 0..=50 {
        tree.add_node(NodeSpec::folder(id, parent, "level", "folder")).unwrap();
        parent = NodeId::from(id);
    }
    assert_eq!(tree.store().get(NodeId(50)).unwrap().level(), 50);

    let before = tree.store().len();
    assert!(matches!(
        tree.add_node(NodeSpec::leaf(100, NodeId(50), "too deep", "file")),
        Err(Error::DepthExceeded { level: 50, .. })
    ));
    assert_eq!(tree.store().len(), before);
}

#[test]
fn test_cycle_safe_drop() {
    let mut tree = scenario_tree();
    tree.add_node(NodeSpec::folder(6, NodeId(1), "nested", "folder")).unwrap();
    tree.add_node(NodeSpec::leaf(7, NodeId(6), "deep", "file")).unwrap();
    let before: Vec<_> = tree.store().subtree_ids(NodeId::ROOT);
    let recorder = EventRecorder::attach(tree.events());

    for target in [NodeId(1), NodeId(6), NodeId(7)] {
        let parent = tree.store().parent_of(target).unwrap();
        for direction in [InsertDirection::Up, InsertDirection::Down, InsertDirection::Into] {
            let result = tree.drop_node(NodeId(1), target, parent, direction);
            assert!(matches!(result, Err(Error::SelfDescendantDrop { .. })));
        }
    }
    assert_eq!(tree.store().subtree_ids(NodeId::ROOT), before);
    assert!(recorder.is_empty());
    assert!(!tree.projection().is_dragging());
}

#[test]
fn test_toggle_twice_restores_visible_set() {
    let mut tree = scenario_tree();
    tree.add_node(NodeSpec::folder(6, NodeId(1), "nested", "folder")).unwrap();
    tree.add_node(NodeSpec::leaf(7, NodeId(6), "deep", "file")).unwrap();
    tree.toggle_expand(0).unwrap();

    let before = visible_ids(&mut tree);
    for index in 0..before.len() {
        tree.toggle_expand(index).unwrap();
        tree.toggle_expand(index).unwrap();
        assert_eq!(visible_ids(&mut tree), before, "toggling row {index}");
    }
}

#[test]
fn test_visible_index_matches_expanded_ancestors() {
    let mut tree = scenario_tree();
    tree.add_node(NodeSpec::folder(6, NodeId(1), "nested", "folder")).unwrap();
    tree.add_node(NodeSpec::leaf(7, NodeId(6), "deep", "file")).unwrap();
    tree.add_node(NodeSpec::folder(8, NodeId::ROOT, "empty", "folder")).unwrap();

    for visible_index in [0, 3, 0, 0, 3] {
        tree.toggle_expand(visible_index).unwrap();
        assert_eq!(visible_ids(&mut tree), expected_visible(&tree));
    }
}

#[test]
fn test_hover_debounce_highlights_last_target_only() {
    init_tracing();
    let mut tree = TreeController::new();
    for id in 1..=3 {
        tree.add_node(NodeSpec::folder(id, NodeId::ROOT, "folder", "folder")).unwrap();
    }
    tree.add_node(NodeSpec::leaf(4, NodeId::ROOT, "leaf", "file")).unwrap();
    tree.build_done();

    let start = Instant::now();
    tree.on_drag_start(NodeId(4)).unwrap();
    tree.on_drag_move(DragMove::new(10.0, 0), start).unwrap();
    tree.on_drag_move(DragMove::new(10.0, 1), start + ms(300)).unwrap();
    tree.on_drag_move(DragMove::new(10.0, 2), start + ms(600)).unwrap();

    for t in [999, 1000, 1300, 1599] {
        assert!(!tree.tick(start + ms(t)), "nothing may fire at {t} ms");
        assert_eq!(tree.projection().highlighted(), None);
    }
    assert!(tree.tick(start + ms(1600)));
    assert_eq!(tree.projection().highlighted(), Some(NodeId(3)));
    for id in [1, 2] {
        assert!(!tree.projection().view(NodeId(id)).unwrap().is_highlighted);
    }
}

#[test]
fn test_auto_expand_then_drop_into() {
    let mut tree = scenario_tree();
    let recorder = EventRecorder::attach(tree.events());
    let start = Instant::now();

    tree.on_drag_start(NodeId(5)).unwrap();
    tree.on_drag_move(DragMove::new(10.0, 0), start).unwrap();
    tree.tick(start + ms(1000));
    assert_eq!(tree.projection().highlighted(), Some(NodeId(1)));
    tree.tick(start + ms(3000));
    assert_eq!(visible_ids(&mut tree), vec![1, 2, 3, 4, 5]);

    // The pointer lands on the revealed first child, upper half.
    let moved = tree.on_drop(Some(DragMove::new(5.0, 1)), start + ms(3100)).unwrap().unwrap();
    assert_eq!((moved.parent_node_id, moved.child_index), (NodeId(1), 0));
    assert_eq!(recorder.len(), 1);
    assert_eq!(visible_ids(&mut tree), vec![1, 5, 2, 3, 4]);
}

#[test]
fn test_drag_leave_cancels_everything() {
    let mut tree = scenario_tree();
    let start = Instant::now();
    tree.on_drag_start(NodeId(5)).unwrap();
    assert!(!tree.on_drag_start(NodeId(4)).unwrap());
    tree.on_drag_move(DragMove::new(10.0, 0), start).unwrap();
    assert!(tree.on_drag_leave());

    assert!(!tree.tick(start + ms(10_000)));
    assert_eq!(tree.on_drop(None, start + ms(10_000)).unwrap(), None);
    assert_eq!(visible_ids(&mut tree), vec![1, 4, 5]);
}

#[test]
fn test_drop_over_own_subtree_is_a_quiet_no_op() {
    let mut tree = scenario_tree();
    tree.toggle_expand(0).unwrap();
    let before = tree.store().subtree_ids(NodeId::ROOT);
    let recorder = EventRecorder::attach(tree.events());
    let now = Instant::now();

    // Row 4 is the dragged node itself.
    assert!(tree.on_drag_start(NodeId(5)).unwrap());
    tree.on_drag_move(DragMove::new(10.0, 4), now).unwrap();
    assert_eq!(tree.on_drop(None, now).unwrap(), None);

    // Row 1 is a child of the dragged folder.
    assert!(tree.on_drag_start(NodeId(1)).unwrap());
    tree.on_drag_move(DragMove::new(10.0, 0), now).unwrap();
    tree.on_drag_move(DragMove::new(40.0, 1), now).unwrap();
    assert_eq!(tree.on_drop(None, now + ms(100)).unwrap(), None);

    assert!(!tree.projection().is_dragging());
    assert_eq!(tree.store().subtree_ids(NodeId::ROOT), before);
    assert!(recorder.is_empty());
    assert_eq!(visible_ids(&mut tree), vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_blur_with_invalid_pending_title_warns_instead_of_committing() {
    let mut tree = scenario_tree();
    tree.handle_event(NodeId(5), InteractionEvent::TouchDown).unwrap();
    tree.modify_node().unwrap();
    let recorder = EventRecorder::attach(tree.events());

    assert!(tree.text_change(NodeId(5), "a/b").unwrap().is_some());
    let effects = tree.handle_event(NodeId(5), InteractionEvent::Blur).unwrap();
    assert!(matches!(effects.commit, Some(CommitOutcome::Rejected { .. })));

    assert_eq!(tree.store().get(NodeId(5)).unwrap().payload().title, "notes");
    let view = tree.projection().view(NodeId(5)).unwrap();
    assert!(view.is_editing);
    assert_eq!(view.edit_text.as_deref(), Some("ab"));
    assert!(matches!(view.tooltip, Tooltip::Warning(_)));
    assert!(recorder.is_empty());

    // A later implicit commit stores the sanitized text the editor shows.
    tree.handle_event(NodeId(4), InteractionEvent::TouchDown).unwrap();
    tree.modify_node().unwrap();
    assert_eq!(tree.projection().editing(), Some(NodeId(4)));
    assert_eq!(tree.store().get(NodeId(5)).unwrap().payload().title, "ab");
    assert!(recorder
        .take()
        .iter()
        .any(|e| matches!(e, TreeEvent::Modify(m) if m.current_node_id == NodeId(5))));
}

#[test]
fn test_counts_survive_mixed_operations() {
    let mut tree = scenario_tree();
    tree.add_node(NodeSpec::folder(6, NodeId(1), "nested", "folder")).unwrap();
    tree.add_at(NodeSpec::leaf(7, NodeId(6), "first", "file"), NodeId(0), false)
        .unwrap();
    tree.add_at(NodeSpec::leaf(8, NodeId(6), "before", "file"), NodeId(7), false)
        .unwrap();
    assert_eq!(tree.store().children(NodeId(6)), &[NodeId(8), NodeId(7)]);

    tree.drop_node(NodeId(6), NodeId(5), NodeId::ROOT, InsertDirection::Down).unwrap();
    tree.drop_node(NodeId(2), NodeId(6), NodeId::ROOT, InsertDirection::Into).unwrap();
    tree.remove_by_id(NodeId(7)).unwrap();
    tree.drop_node(NodeId(1), NodeId(4), NodeId::ROOT, InsertDirection::Up).unwrap();
    assert_counts_consistent(tree.store());

    assert_eq!(
        tree.store().children(NodeId::ROOT),
        &[NodeId(1), NodeId(4), NodeId(5), NodeId(6)]
    );
    assert_eq!(tree.store().children(NodeId(6)), &[NodeId(2), NodeId(8)]);
    assert_eq!(visible_ids(&mut tree), expected_visible(&tree));
}
