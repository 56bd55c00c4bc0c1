//! End-to-end specs for the config store: load, migrate, write back, parse.

use driftconf_config::ConfigStore;
use driftconf_migrate::{BoxError, MigrationStep, Registry, TransformTable};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fs;
use tempfile::tempdir;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct AppConfig {
    #[serde(default)]
    version: u64,
    #[serde(default)]
    roles: Vec<String>,
    #[serde(default)]
    receiver_enabled: bool,
}

#[test]
fn stale_config_file_is_migrated_parsed_and_persisted() {
    let dir = tempdir().unwrap();
    let steps = dir.path().join("migrations");
    fs::create_dir(&steps).unwrap();

    // v1 ships compiled in, v2 and v3 are discovered from disk
    let mut inline = Registry::new();
    inline
        .insert(
            "1_rename_receiver_key",
            MigrationStep::transform(|mut doc: Value| {
                if let Some(map) = doc.as_object_mut() {
                    if let Some(value) = map.remove("use_receiver") {
                        map.insert("receiver_enabled".to_string(), value);
                    }
                }
                Ok::<_, BoxError>(doc)
            }),
        )
        .unwrap();

    fs::write(
        steps.join("2_add_roles.json"),
        r#"[{"op": "add", "path": "/roles", "value": []}]"#,
    )
    .unwrap();
    fs::write(steps.join("3_default_role.step"), r#"{"transform": "default_role"}"#).unwrap();

    let mut table = TransformTable::new();
    table.register("default_role", |mut doc: Value| {
        if let Some(roles) = doc["roles"].as_array_mut() {
            if roles.is_empty() {
                roles.push(json!("viewer"));
            }
        }
        Ok::<_, BoxError>(doc)
    });

    fs::write(dir.path().join("app.yml"), "use_receiver: true\n").unwrap();

    let store: ConfigStore<AppConfig> = ConfigStore::new(dir.path(), "app.yml")
        .with_migrations(inline)
        .with_migrations_dir(steps)
        .with_transforms(table);

    let config = store.read().unwrap();
    assert_eq!(
        config,
        AppConfig {
            version: 3,
            roles: vec!["viewer".to_string()],
            receiver_enabled: true,
        }
    );

    // Disk caught up, so a second read sees no pending migrations
    let on_disk = fs::read_to_string(dir.path().join("app.yml")).unwrap();
    assert!(on_disk.contains("version: 3"));
    let again = store.read().unwrap();
    assert_eq!(again.version, 3);
}

#[test]
fn write_then_read_round_trips_with_schema_header() {
    let dir = tempdir().unwrap();
    let store: ConfigStore<AppConfig> = ConfigStore::new(dir.path(), "app.yml")
        .with_schema_url("https://example.com/app.schema.json");

    let config = AppConfig {
        version: 0,
        roles: vec!["admin".to_string()],
        receiver_enabled: true,
    };
    store.write(&config).unwrap();

    let on_disk = fs::read_to_string(dir.path().join("app.yml")).unwrap();
    assert!(on_disk.starts_with("# yaml-language-server: $schema="));

    let read_back = store.read().unwrap();
    assert_eq!(read_back, config);
}

#[test]
fn config_written_by_newer_software_is_refused() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("app.yml"), "version: 9\n").unwrap();

    let mut registry = Registry::new();
    registry
        .insert(
            "1_only",
            MigrationStep::transform(|doc: Value| Ok::<_, BoxError>(doc)),
        )
        .unwrap();

    let store: ConfigStore<AppConfig> =
        ConfigStore::new(dir.path(), "app.yml").with_migrations(registry);
    let err = store.read().unwrap_err();
    assert!(err.to_string().contains("ahead"));

    // Refusal never rewrites the file
    let on_disk = fs::read_to_string(dir.path().join("app.yml")).unwrap();
    assert_eq!(on_disk, "version: 9\n");
}
