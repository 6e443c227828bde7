#![allow(dead_code)]

use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wisski_api::WisskiConfig;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn config(server: &MockServer) -> WisskiConfig {
    WisskiConfig::new(server.uri())
}

/// Pathbuilder `pb1`: bundle `B` with string field `f1` and sub-bundle
/// field `g1` of bundle `B2`, which holds string field `f2`.
pub fn scenario_pathbuilder() -> Value {
    json!({
        "id": "pb1",
        "name": "Scenario",
        "adapter": "default",
        "paths": {
            "p_b": {
                "id": "p_b", "parent": "0", "bundle": "B", "field": "B",
                "is_group": "1", "enabled": "1", "fieldtype": "",
                "children": {
                    "p_f1": {
                        "id": "p_f1", "parent": "p_b", "bundle": "B", "field": "f1",
                        "is_group": "0", "enabled": "1", "fieldtype": "string", "children": []
                    },
                    "p_g1": {
                        "id": "p_g1", "parent": "p_b", "bundle": "B2", "field": "g1",
                        "is_group": "1", "enabled": "1", "fieldtype": "entity_reference",
                        "children": {
                            "p_f2": {
                                "id": "p_f2", "parent": "p_g1", "bundle": "B2", "field": "f2",
                                "is_group": "0", "enabled": "1", "fieldtype": "string",
                                "children": []
                            }
                        }
                    }
                }
            }
        }
    })
}

/// Pathbuilder `pb2`: bundle `P` with string field `name`.
pub fn person_pathbuilder() -> Value {
    json!({
        "id": "pb2",
        "name": "People",
        "adapter": "default",
        "paths": [
            { "id": "p_p", "parent": "0", "bundle": "P", "field": "P", "is_group": "1" },
            { "id": "p_name", "parent": "p_p", "bundle": "P", "field": "name", "fieldtype": "string" }
        ]
    })
}

/// Wire form of the scenario entity as the remote returns it.
pub fn scenario_wire(uri: &str, sub_uri: &str) -> Value {
    json!({
        "bundle": [{ "target_id": "B", "target_type": "wisski_bundle" }],
        "wisski_uri": [{ "value": uri }],
        "eid": [{ "value": 12 }],
        "f1": [{ "value": "x" }],
        "g1": [{
            "entity": {
                "bundle": [{ "target_id": "B2", "target_type": "wisski_bundle" }],
                "wisski_uri": [{ "value": sub_uri }],
                "f2": [{ "value": "y" }]
            }
        }]
    })
}

/// Serves the pathbuilder listing and both pathbuilders.
pub async fn mount_pathbuilders(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/pathbuilder/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["pb1", "pb2"])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pathbuilder/pb1/get"))
        .respond_with(ResponseTemplate::new(200).set_body_json(scenario_pathbuilder()))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pathbuilder/pb2/get"))
        .respond_with(ResponseTemplate::new(200).set_body_json(person_pathbuilder()))
        .mount(server)
        .await;
}
