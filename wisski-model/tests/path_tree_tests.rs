mod common;

use common::{scenario_paths, scenario_tree};
use pretty_assertions::assert_eq;
use wisski_model::{FieldType, ModelError, PathRecord, PathTree, PathbuilderRecord, ROOT_ID};

fn child_ids(tree: &PathTree, node_id: &str) -> Vec<String> {
    tree.node(node_id).unwrap().children().to_vec()
}

// ── add_path ────────────────────────────────────────────────────

#[test]
fn add_path_attaches_top_level_group_under_root() {
    let mut tree = PathTree::new("t");
    assert!(tree.add_path(PathRecord::group("g", ROOT_ID, "B")));
    assert_eq!(tree.len(), 1);
    assert_eq!(child_ids(&tree, ROOT_ID), vec!["g"]);
    assert!(tree.parent_of("g").unwrap().is_root());
}

#[test]
fn add_path_treats_empty_parent_as_root() {
    let mut tree = PathTree::new("t");
    assert!(tree.add_path(PathRecord::group("g", "", "B")));
    assert_eq!(child_ids(&tree, ROOT_ID), vec!["g"]);
}

#[test]
fn add_path_rejects_disabled_record() {
    let mut tree = PathTree::new("t");
    let record = PathRecord::group("g", ROOT_ID, "B").with_enabled(false);
    assert!(!tree.add_path(record));
    assert!(tree.is_empty());
    assert!(!tree.contains("g"));
}

#[test]
fn add_path_rejects_duplicate_id_without_relocating() {
    let mut tree = PathTree::new("t");
    assert!(tree.add_path(PathRecord::group("g", ROOT_ID, "B")));
    assert!(tree.add_path(PathRecord::group("h", ROOT_ID, "C")));
    assert!(tree.add_path(PathRecord::field("f", "g", "B", "f", FieldType::String)));

    let moved = PathRecord::field("f", "h", "C", "other", FieldType::String);
    assert!(!tree.add_path(moved));

    assert_eq!(tree.len(), 3);
    assert_eq!(tree.parent_of("f").unwrap().id(), "g");
    assert_eq!(tree.record("f").unwrap().field_id, "f");
    assert!(child_ids(&tree, "h").is_empty());
}

#[test]
fn add_path_rejects_record_with_absent_parent() {
    let mut tree = PathTree::new("t");
    let orphan = PathRecord::field("f", "missing", "B", "f", FieldType::String);
    assert!(!tree.add_path(orphan));
    assert!(tree.is_empty());
}

#[test]
fn add_path_rejects_the_root_id() {
    let mut tree = PathTree::new("t");
    assert!(!tree.add_path(PathRecord::group(ROOT_ID, ROOT_ID, "B")));
    assert!(tree.is_empty());
}

// ── add_paths ───────────────────────────────────────────────────

#[test]
fn add_paths_attaches_children_offered_before_parents() {
    let mut paths = scenario_paths();
    paths.reverse();

    let mut tree = PathTree::new("t");
    let report = tree.add_paths(paths);

    assert!(report.is_complete());
    assert_eq!(report.offered, 4);
    assert_eq!(report.inserted, 4);
    assert_eq!(tree.parent_of("p_f2").unwrap().id(), "p_g1");
    assert_eq!(tree.parent_of("p_g1").unwrap().id(), "p_b");
}

#[test]
fn add_paths_resolves_deep_chains_of_fields() {
    // Non-group chain whose descending-id order is the reverse of the
    // dependency order: every pass attaches exactly one record.
    let mut tree = PathTree::new("t");
    let paths = vec![
        PathRecord::field("a", ROOT_ID, "B", "a", FieldType::String),
        PathRecord::field("b", "a", "B", "b", FieldType::String),
        PathRecord::field("c", "b", "B", "c", FieldType::String),
        PathRecord::field("d", "c", "B", "d", FieldType::String),
    ];
    let report = tree.add_paths(paths);

    assert_eq!(report.inserted, 4);
    assert!(report.is_complete());
    assert!(report.passes >= 4);
}

#[test]
fn add_paths_orders_sibling_fields_by_descending_id() {
    let mut tree = PathTree::new("t");
    tree.add_paths(vec![
        PathRecord::field("p_a", "g", "B", "a", FieldType::String),
        PathRecord::field("p_c", "g", "B", "c", FieldType::String),
        PathRecord::group("g", ROOT_ID, "B"),
        PathRecord::field("p_b", "g", "B", "b", FieldType::String),
    ]);
    assert_eq!(child_ids(&tree, "g"), vec!["p_c", "p_b", "p_a"]);
}

#[test]
fn add_paths_reports_dangling_parent_and_terminates() {
    let mut tree = PathTree::new("t");
    let mut paths = scenario_paths();
    paths.push(PathRecord::field("p_lost", "nowhere", "B", "lost", FieldType::String));

    let report = tree.add_paths(paths);

    assert_eq!(report.offered, 5);
    assert_eq!(report.inserted, 4);
    assert_eq!(report.unattached, vec!["p_lost"]);
    assert!(!report.is_complete());
    assert!(!tree.contains("p_lost"));
}

#[test]
fn add_paths_stall_converts_to_error() {
    let mut tree = PathTree::new("t");
    let report = tree.add_paths(vec![
        PathRecord::group("g", ROOT_ID, "B"),
        PathRecord::field("x", "y", "B", "x", FieldType::String),
        PathRecord::field("y", "x", "B", "y", FieldType::String),
    ]);

    match report.into_result() {
        Err(ModelError::TreeInsertionStall {
            inserted,
            offered,
            mut unattached,
        }) => {
            assert_eq!(inserted, 1);
            assert_eq!(offered, 3);
            unattached.sort();
            assert_eq!(unattached, vec!["x", "y"]);
        }
        other => panic!("expected stall, got {other:?}"),
    }
}

#[test]
fn add_paths_children_of_disabled_group_stay_unattached() {
    let mut tree = PathTree::new("t");
    let report = tree.add_paths(vec![
        PathRecord::group("g", ROOT_ID, "B").with_enabled(false),
        PathRecord::field("f", "g", "B", "f", FieldType::String),
    ]);

    assert_eq!(report.disabled, 1);
    assert_eq!(report.inserted, 0);
    assert_eq!(report.unattached, vec!["f"]);
    assert!(tree.is_empty());
}

#[test]
fn add_paths_counts_duplicates_in_batch() {
    let mut tree = PathTree::new("t");
    let report = tree.add_paths(vec![
        PathRecord::group("g", ROOT_ID, "B"),
        PathRecord::group("g", ROOT_ID, "C"),
    ]);
    assert_eq!(report.inserted, 1);
    assert_eq!(report.duplicates, 1);
    assert_eq!(tree.record("g").unwrap().bundle_id, "B");
    assert_eq!(report.into_result().unwrap(), 1);
}

#[test]
fn add_paths_on_empty_input() {
    let mut tree = PathTree::new("t");
    let report = tree.add_paths(Vec::new());
    assert_eq!(report.offered, 0);
    assert_eq!(report.passes, 0);
    assert!(report.is_complete());
}

// ── lookups ─────────────────────────────────────────────────────

#[test]
fn subtree_lookup_by_bundle_id() {
    let tree = scenario_tree();
    let node = tree.get_subtree_for_field_id("B").unwrap();
    assert_eq!(node.id(), "p_b");

    let fields: Vec<&str> = tree.children(node).map(|r| r.field_id.as_str()).collect();
    assert_eq!(fields, vec!["g1", "f1"]);
}

#[test]
fn subtree_lookup_finds_sub_bundle_group() {
    let tree = scenario_tree();
    let node = tree.get_subtree_for_field_id("B2").unwrap();
    assert_eq!(node.id(), "p_g1");
    assert_eq!(node.children(), &["p_f2".to_string()]);
}

#[test]
fn subtree_lookup_by_field_id() {
    let tree = scenario_tree();
    assert_eq!(tree.get_subtree_for_field_id("g1").unwrap().id(), "p_g1");
    assert_eq!(tree.get_subtree_for_field_id("f2").unwrap().id(), "p_f2");
}

#[test]
fn subtree_lookup_unknown_is_schema_lookup_error() {
    let tree = scenario_tree();
    let err = tree.get_subtree_for_field_id("nope").unwrap_err();
    assert!(err.is_schema_lookup());
    assert!(format!("{err}").contains("nope"));
}

#[test]
fn subtree_lookup_returns_first_match_in_pre_order() {
    let mut tree = PathTree::new("t");
    tree.add_paths(vec![
        PathRecord::group("g_a", ROOT_ID, "A"),
        PathRecord::sub_group("g_a_shared", "g_a", "ref", "Shared"),
        PathRecord::group("g_shared", ROOT_ID, "Shared"),
    ]);
    assert_eq!(tree.get_subtree_for_field_id("Shared").unwrap().id(), "g_a_shared");
}

#[test]
fn path_for_id_finds_fields_and_bundle_roots() {
    let tree = scenario_tree();
    assert_eq!(tree.get_path_for_id("f1").unwrap().id, "p_f1");
    assert_eq!(tree.get_path_for_id("g1").unwrap().id, "p_g1");
    assert_eq!(tree.get_path_for_id("B").unwrap().id, "p_b");
}

#[test]
fn path_for_id_absent_is_none() {
    let tree = scenario_tree();
    assert!(tree.get_path_for_id("unknown").is_none());
    // B2 is only the bundle of a sub-group, not a field id.
    assert!(tree.get_path_for_id("B2").is_none());
}

#[test]
fn bundle_fields_lists_direct_children() {
    let tree = scenario_tree();
    let ids: Vec<&str> = tree
        .bundle_fields("B2")
        .unwrap()
        .into_iter()
        .map(|r| r.field_id.as_str())
        .collect();
    assert_eq!(ids, vec!["f2"]);
    assert!(tree.bundle_fields("missing").is_err());
}

#[test]
fn records_iterate_in_insertion_order() {
    let tree = scenario_tree();
    let ids: Vec<&str> = tree.records().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["p_b", "p_g1", "p_f2", "p_f1"]);
}

// ── combine ─────────────────────────────────────────────────────

#[test]
fn combine_adds_records_of_other_tree() {
    let mut base = PathTree::new("base");
    base.add_path(PathRecord::group("p_b", ROOT_ID, "B"));

    let mut extra = PathTree::new("extra");
    extra.add_paths(vec![
        PathRecord::group("p_b", ROOT_ID, "B"),
        PathRecord::field("p_f1", "p_b", "B", "f1", FieldType::String),
        PathRecord::group("p_c", ROOT_ID, "C"),
    ]);

    base.combine(&extra);

    assert_eq!(base.len(), 3);
    assert_eq!(base.id(), "base");
    assert_eq!(base.parent_of("p_f1").unwrap().id(), "p_b");
    assert_eq!(extra.len(), 3);
}

#[test]
fn combine_keeps_earliest_record_on_id_collision() {
    let mut first = PathTree::new("first");
    first.add_path(PathRecord::field("p", ROOT_ID, "B", "from_first", FieldType::String));

    let mut second = PathTree::new("second");
    second.add_path(PathRecord::field("p", ROOT_ID, "B", "from_second", FieldType::Link));

    first.combine(&second);

    assert_eq!(first.len(), 1);
    let kept = first.record("p").unwrap();
    assert_eq!(kept.field_id, "from_first");
    assert_eq!(kept.field_type, Some(FieldType::String));
}

#[test]
fn combine_with_copy_of_self_is_idempotent() {
    let mut tree = scenario_tree();
    let before: Vec<String> = tree.records().map(|r| r.id.clone()).collect();
    let copy = tree.clone();

    tree.combine(&copy);

    let after: Vec<String> = tree.records().map(|r| r.id.clone()).collect();
    assert_eq!(before, after);
}

#[test]
fn combine_is_chainable() {
    let mut a = PathTree::new("a");
    let mut b = PathTree::new("b");
    b.add_path(PathRecord::group("g_b", ROOT_ID, "B"));
    let mut c = PathTree::new("c");
    c.add_path(PathRecord::group("g_c", ROOT_ID, "C"));

    let len = a.combine(&b).combine(&c).len();
    assert_eq!(len, 2);
}

#[test]
fn combined_resolves_parents_from_earlier_sources() {
    let mut groups = PathTree::new("groups");
    groups.add_path(PathRecord::group("p_b", ROOT_ID, "B"));

    let (fields, report) = PathTree::from_record(&PathbuilderRecord::new(
        "fields",
        vec![
            PathRecord::group("p_b", ROOT_ID, "B"),
            PathRecord::field("p_f1", "p_b", "B", "f1", FieldType::String),
        ],
    ));
    assert!(report.is_complete());

    let combined = PathTree::combined("combined", [&groups, &fields]);
    assert_eq!(combined.id(), "combined");
    assert_eq!(combined.len(), 2);
    assert_eq!(combined.get_path_for_id("f1").unwrap().id, "p_f1");
}
