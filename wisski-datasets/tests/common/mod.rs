#![allow(dead_code)]

use std::path::Path;

use wisski_model::{Entity, FieldType, PathRecord, PathTree, ROOT_ID};

/// Bundle `B` with string field `f1` and sub-bundle field `g1` pointing at
/// bundle `B2`, which holds string field `f2`.
pub fn scenario_tree() -> PathTree {
    let mut tree = PathTree::new("scenario");
    let report = tree.add_paths(vec![
        PathRecord::group("p_b", ROOT_ID, "B"),
        PathRecord::field("p_f1", "p_b", "B", "f1", FieldType::String),
        PathRecord::sub_group("p_g1", "p_b", "g1", "B2"),
        PathRecord::field("p_f2", "p_g1", "B2", "f2", FieldType::String),
    ]);
    assert!(report.is_complete());
    tree
}

/// The persisted scenario entity: `B(u1) { f1: x, g1: [B2(u2) { f2: y }] }`.
pub fn scenario_entity() -> Entity {
    Entity::new("B")
        .with_uri("u1")
        .with_field("f1", ["x"])
        .with_field("g1", [Entity::new("B2").with_uri("u2").with_field("f2", ["y"])])
}

pub fn write(dir: &Path, name: &str, content: &str) {
    std::fs::write(dir.join(name), content).unwrap();
}

pub fn lines(dir: &Path, name: &str) -> Vec<String> {
    std::fs::read_to_string(dir.join(name))
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}
