use std::fs;
use std::path::Path;

use artscan::core::{JsonAnchorStore, Pose, WorldAnchorStore};
use artscan::AppConfig;
use assert_cmd::Command;
use nalgebra::{Point3, UnitQuaternion};
use predicates::prelude::*;

fn artscan() -> Command {
    Command::cargo_bin("artscan").unwrap()
}

fn store_with(path: &Path, names: &[&str]) {
    let mut store = JsonAnchorStore::open(path).unwrap();
    for (i, name) in names.iter().enumerate() {
        let pose = Pose::new(Point3::new(i as f32, 0.5, -2.0), UnitQuaternion::identity());
        store.save(name, pose).unwrap();
    }
}

#[test]
fn config_init_writes_loadable_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("artscan.json");

    artscan().arg("config-init").arg(&out).assert().success();
    assert_eq!(AppConfig::load_json(&out).unwrap(), AppConfig::default());

    artscan()
        .arg("config-init")
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
    artscan()
        .args(["config-init", "--force"])
        .arg(&out)
        .assert()
        .success();
}

#[test]
fn list_prints_every_anchor() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("anchors.json");
    store_with(&store, &["room", "artwork3"]);

    artscan()
        .args(["anchors", "list", "--store"])
        .arg(&store)
        .assert()
        .success()
        .stdout(predicate::str::contains("artwork3\t1.000\t0.500\t-2.000"))
        .stdout(predicate::str::contains("room\t0.000\t0.500\t-2.000"));
}

#[test]
fn reconcile_reports_consistent_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("anchors.json");
    store_with(&store, &["room", "artwork3", "asset3", "artwork-x"]);

    let output = artscan()
        .args(["anchors", "reconcile", "--apply", "--store"])
        .arg(&store)
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["room_cached"], true);
    assert_eq!(json["scan_areas"], serde_json::json!([3]));
    assert_eq!(json["assets"], serde_json::json!([3]));
    assert_eq!(json["skipped"][0]["reason"], "malformed");
    assert_eq!(json["needs_reset"], false);
    assert_eq!(json["cleared"], false);

    assert_eq!(JsonAnchorStore::open(&store).unwrap().ids().len(), 4);
}

#[test]
fn reconcile_apply_clears_scan_areas_without_room() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("anchors.json");
    store_with(&store, &["artwork1", "artwork2"]);

    artscan()
        .args(["anchors", "reconcile", "--store"])
        .arg(&store)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"needs_reset\": true"))
        .stdout(predicate::str::contains("\"cleared\": false"));
    assert_eq!(JsonAnchorStore::open(&store).unwrap().ids().len(), 2);

    artscan()
        .args(["anchors", "reconcile", "--apply", "--store"])
        .arg(&store)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"cleared\": true"));
    assert!(JsonAnchorStore::open(&store).unwrap().ids().is_empty());
}

#[test]
fn reconcile_honours_artwork_limit_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("anchors.json");
    let config = dir.path().join("artscan.json");
    store_with(&store, &["room", "artwork1", "artwork7"]);
    fs::write(&config, r#"{ "coordinator": { "artwork_limit": 5 } }"#).unwrap();

    let output = artscan()
        .arg("--config")
        .arg(&config)
        .args(["anchors", "reconcile", "--store"])
        .arg(&store)
        .output()
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["scan_areas"], serde_json::json!([1]));
    assert_eq!(json["skipped"][0]["reason"], "ineligible");
    assert_eq!(json["skipped"][0]["id"], 7);
}

#[test]
fn missing_lists_unanchored_eligible_artworks() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("anchors.json");
    let catalog = dir.path().join("artworks.json");
    let config = dir.path().join("artscan.json");
    store_with(&store, &["room", "artwork0"]);
    fs::write(
        &catalog,
        r#"[
            { "id": 0, "image_path": "art/0.jpg", "title": "Harbour" },
            { "id": 1, "image_path": "art/1.jpg", "title": "Orchard" },
            { "id": 2, "image_path": "art/2.jpg" },
            { "id": 9, "image_path": "art/9.jpg" }
        ]"#,
    )
    .unwrap();
    fs::write(&config, r#"{ "coordinator": { "artwork_limit": 3 } }"#).unwrap();

    artscan()
        .arg("--config")
        .arg(&config)
        .args(["anchors", "missing", "--store"])
        .arg(&store)
        .arg("--catalog")
        .arg(&catalog)
        .assert()
        .success()
        .stdout("1\tOrchard\n2\n");
}

#[test]
fn bad_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("artscan.json");
    fs::write(&config, r#"{ "log_level": "loud" }"#).unwrap();

    artscan()
        .arg("--config")
        .arg(&config)
        .args(["anchors", "list", "--store"])
        .arg(dir.path().join("anchors.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("loud"));
}
