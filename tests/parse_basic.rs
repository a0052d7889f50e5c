//! Parse phase: export JSON decoding and preprocessing into RawWorkflow.

use flowc::ast;
use flowc::parse;

#[test]
fn parse_example_workflow() {
    let json = include_str!("fixtures/example_workflow.json");
    let export = parse::parse(json).expect("should parse");
    assert_eq!(export.name.as_deref(), Some("Fetch And Finish"));
    assert_eq!(export.nodes.len(), 2);
    assert_eq!(export.connections.len(), 1);
}

#[test]
fn parse_invalid_json_names_parse_stage() {
    let err = parse::parse("not valid json").unwrap_err();
    assert_eq!(err.stage, flowc::error::Stage::Parse);
    assert!(err.message.contains("invalid workflow JSON"));
}

#[test]
fn preprocess_resolves_names_to_ids() {
    let json = include_str!("fixtures/example_workflow.json");
    let export = parse::parse(json).unwrap();
    let (raw, audit) = parse::preprocess(&export);

    assert_eq!(raw.name, "Fetch And Finish");
    assert_eq!(raw.nodes.len(), 2);
    assert_eq!(raw.nodes["node-a"].next, vec!["node-b"]);
    assert!(raw.nodes["node-b"].next.is_empty());
    // Audit map keeps the export node verbatim, including unknown fields.
    assert_eq!(audit["node-b"]["notes"], "terminal step");
    assert_eq!(audit["node-b"]["createdBy"], "alice");
}

#[test]
fn preprocess_coerces_type_version_to_string() {
    let json = include_str!("fixtures/example_workflow.json");
    let export = parse::parse(json).unwrap();
    let (raw, _) = parse::preprocess(&export);

    // typeVersion 1 (integer) and 1.0 (float) round-trip to their string forms.
    assert_eq!(raw.nodes["node-a"].type_version, "1");
    assert_eq!(raw.nodes["node-b"].type_version, "1.0");

    // ...and survive AST construction unchanged.
    let ast = ast::normalize(&raw);
    assert_eq!(ast.nodes["node-a"].type_version, "1");
    assert_eq!(ast.nodes["node-b"].type_version, "1.0");
}

#[test]
fn preprocess_skips_unknown_connection_targets() {
    let json = r#"{
        "name": "wf",
        "nodes": [
            {"id": "a", "name": "A", "type": "noOp", "typeVersion": 1, "parameters": {}}
        ],
        "connections": {
            "A": {"main": [[{"node": "Ghost"}]]},
            "Phantom": {"main": [[{"node": "A"}]]}
        }
    }"#;
    let export = parse::parse(json).unwrap();
    let (raw, _) = parse::preprocess(&export);
    assert!(raw.nodes["a"].next.is_empty());
}

#[test]
fn preprocess_deduplicates_next() {
    let json = r#"{
        "name": "wf",
        "nodes": [
            {"id": "a", "name": "A", "type": "noOp", "typeVersion": 1, "parameters": {}},
            {"id": "b", "name": "B", "type": "noOp", "typeVersion": 1, "parameters": {}}
        ],
        "connections": {
            "A": {
                "main": [[{"node": "B"}, {"node": "B"}]],
                "error": [[{"node": "B"}]]
            }
        }
    }"#;
    let export = parse::parse(json).unwrap();
    let (raw, _) = parse::preprocess(&export);
    assert_eq!(raw.nodes["a"].next, vec!["b"]);
}

#[test]
fn preprocess_defaults_workflow_name() {
    let export = parse::parse(r#"{"nodes": [], "connections": {}}"#).unwrap();
    let (raw, _) = parse::preprocess(&export);
    assert_eq!(raw.name, "Unnamed Workflow");
}
