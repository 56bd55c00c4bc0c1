//! End-to-end specs for the migration engine.

use driftconf_migrate::{
    load_dir, run, run_latest, BoxError, LoadError, MigrateError, MigrationStep, NumericVersion,
    Registry, TransformTable, VERSION_FIELD,
};
use serde_json::{json, Value};
use std::fs;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

fn recording(calls: &Arc<Mutex<Vec<u64>>>, version: u64, field: &str) -> MigrationStep {
    let calls = Arc::clone(calls);
    let field = field.to_string();
    MigrationStep::transform(move |mut doc: Value| {
        calls.lock().unwrap().push(version);
        doc[&field] = json!(true);
        Ok::<_, BoxError>(doc)
    })
}

// Scenario: a scrambled registry runs on an empty document in ascending
// order, and the result carries every side effect plus the stamped version.
#[test]
fn scrambled_registry_runs_ascending_on_empty_document() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut registry: Registry = Registry::new();
    registry.insert("3_z", recording(&calls, 3, "z")).unwrap();
    registry.insert("1_x", recording(&calls, 1, "x")).unwrap();
    registry.insert("2_y", recording(&calls, 2, "y")).unwrap();

    let result = run_latest(&json!({}), &registry).unwrap();

    assert_eq!(*calls.lock().unwrap(), vec![1, 2, 3]);
    assert_eq!(result, json!({"x": true, "y": true, "z": true, "version": 3}));
}

// Scenario: stored version 1, explicit target 3 — only steps 2 and 3 run.
#[test]
fn explicit_target_runs_only_pending_interval() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut registry: Registry = Registry::new();
    registry.insert("3_z", recording(&calls, 3, "z")).unwrap();
    registry.insert("1_x", recording(&calls, 1, "x")).unwrap();
    registry.insert("2_y", recording(&calls, 2, "y")).unwrap();

    let result = run(
        &json!({"version": 1}),
        &registry,
        Some(NumericVersion(3)),
        VERSION_FIELD,
    )
    .unwrap();

    assert_eq!(*calls.lock().unwrap(), vec![2, 3]);
    assert_eq!(result["version"], json!(3));
}

// Scenario: stored version 5 against a registry whose max key is 3.
#[test]
fn document_ahead_of_registry_is_rejected_before_any_step() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut registry: Registry = Registry::new();
    registry.insert("3_z", recording(&calls, 3, "z")).unwrap();

    let err = run_latest(&json!({"version": 5}), &registry).unwrap_err();

    assert!(matches!(err, MigrateError::VersionAhead { .. }));
    assert!(err.to_string().contains("ahead"));
    assert!(calls.lock().unwrap().is_empty());
}

// Scenario: a single patch step at key 1 applied to an empty document.
#[test]
fn sole_patch_step_produces_value_and_stamp() {
    let mut registry: Registry = Registry::new();
    let ops: Vec<driftconf_migrate::PatchOp> =
        serde_json::from_value(json!([{"op": "add", "path": "/x", "value": 1}])).unwrap();
    registry.insert("1_add_x", ops).unwrap();

    let result = run_latest(&json!({}), &registry).unwrap();
    assert_eq!(result, json!({"x": 1, "version": 1}));
}

// Scenario: step 1 succeeds, step 2 throws — the error carries the rollback
// marker and the original cause.
#[test]
fn failure_carries_rollback_marker_and_cause() {
    let mut registry: Registry = Registry::new();
    registry
        .insert(
            "1_ok",
            MigrationStep::transform(|doc: Value| Ok::<_, BoxError>(doc)),
        )
        .unwrap();
    registry
        .insert(
            "2_fails",
            MigrationStep::transform(|_doc| Err::<Value, _>("wires crossed".to_string())),
        )
        .unwrap();

    let err = run_latest(&json!({}), &registry).unwrap_err();
    match err {
        MigrateError::Step {
            key,
            last_successful,
            source,
        } => {
            assert_eq!(key, "2_fails");
            assert_eq!(last_successful, NumericVersion(1));
            assert!(source.to_string().contains("wires crossed"));
        }
        other => panic!("expected step error, got {other}"),
    }
}

// Scenario: two step files resolving to the same version key fail at
// discovery time, before any run is attempted.
#[test]
fn duplicate_version_across_file_kinds_fails_at_load_time() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("1_real.json"), "[]").unwrap();
    fs::write(dir.path().join("1_real.step"), r#"{"patch": []}"#).unwrap();

    let err = load_dir(dir.path(), &TransformTable::new()).unwrap_err();
    assert!(err.to_string().contains("duplicate migration key"));
    assert!(matches!(err, LoadError::Registry(_)));
}
