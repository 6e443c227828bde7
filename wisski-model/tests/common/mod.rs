//! Shared schema fixtures for model tests.

#![allow(dead_code)]

use wisski_model::{Entity, FieldType, PathRecord, PathTree, ROOT_ID};

/// Bundle `B` with a string field `f1` and a sub-group `g1` of bundle `B2`,
/// which holds the string field `f2`.
pub fn scenario_paths() -> Vec<PathRecord> {
    vec![
        PathRecord::group("p_b", ROOT_ID, "B"),
        PathRecord::field("p_f1", "p_b", "B", "f1", FieldType::String),
        PathRecord::sub_group("p_g1", "p_b", "g1", "B2"),
        PathRecord::field("p_f2", "p_g1", "B2", "f2", FieldType::String),
    ]
}

pub fn scenario_tree() -> PathTree {
    let mut tree = PathTree::new("scenario");
    let report = tree.add_paths(scenario_paths());
    assert!(report.is_complete());
    tree
}

/// `B { f1: ["x"], g1: [B2 { f2: ["y"] }] }`
pub fn scenario_entity() -> Entity {
    Entity::new("B")
        .with_field("f1", ["x"])
        .with_field("g1", [Entity::new("B2").with_field("f2", ["y"])])
}

/// A person bundle covering every field type of the codec.
pub fn person_tree() -> PathTree {
    let mut tree = PathTree::new("people");
    tree.add_paths(vec![
        PathRecord::group("g_person", ROOT_ID, "person"),
        PathRecord::field("p_name", "g_person", "person", "name", FieldType::String),
        PathRecord::field("p_bio", "g_person", "person", "bio", FieldType::TextLong),
        PathRecord::field("p_photo", "g_person", "person", "photo", FieldType::Image),
        PathRecord::field("p_home", "g_person", "person", "homepage", FieldType::Link),
        PathRecord::field("p_knows", "g_person", "person", "knows", FieldType::EntityReference),
        PathRecord::field(
            "p_born",
            "g_person",
            "person",
            "born",
            FieldType::Other("datetime".to_string()),
        ),
        PathRecord::sub_group("g_address", "g_person", "address", "address"),
        PathRecord::field("p_city", "g_address", "address", "city", FieldType::String),
        PathRecord::field("p_street", "g_address", "address", "street", FieldType::String),
    ]);
    tree
}

/// Bundle `B` with a string field `f1` and a sub-group `g1` of bundle `B2`,
/// which itself only holds the sub-group `g2` of bundle `B3` with `f3`.
pub fn two_level_tree() -> PathTree {
    let mut tree = PathTree::new("two-level");
    let report = tree.add_paths(vec![
        PathRecord::group("p_b", ROOT_ID, "B"),
        PathRecord::field("p_f1", "p_b", "B", "f1", FieldType::String),
        PathRecord::sub_group("p_g1", "p_b", "g1", "B2"),
        PathRecord::sub_group("p_g2", "p_g1", "g2", "B3"),
        PathRecord::field("p_f3", "p_g2", "B3", "f3", FieldType::String),
    ]);
    assert!(report.is_complete());
    tree
}
