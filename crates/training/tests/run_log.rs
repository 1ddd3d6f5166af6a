use serde::Serialize;
use std::fs;
use training::{RunLog, ScalarSink};

#[derive(Serialize)]
struct FakeConfig {
    lr: f64,
    epochs: usize,
}

#[test]
fn run_directory_holds_config_and_jsonl_events() {
    let root = tempfile::tempdir().unwrap();
    let mut log = RunLog::create(root.path(), "model", 0).unwrap();

    let dir = log.dir().to_path_buf();
    assert!(dir.starts_with(root.path().join("model")));
    assert!(dir
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("log-"));

    log.snapshot_config(&FakeConfig {
        lr: 1e-3,
        epochs: 4,
    })
    .unwrap();
    let config: serde_json::Value =
        serde_json::from_slice(&fs::read(dir.join("config.json")).unwrap()).unwrap();
    assert_eq!(config["epochs"], 4);

    log.scalar("train/loss", 1, 0.9);
    log.scalar("valid/accuracy", 1, 0.5);
    drop(log);

    let raw = fs::read_to_string(dir.join("metrics.jsonl")).unwrap();
    let events: Vec<serde_json::Value> = raw
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["tag"], "train/loss");
    assert_eq!(events[0]["step"], 1);
    assert_eq!(events[1]["tag"], "valid/accuracy");
    assert_eq!(events[1]["value"], 0.5);
}

#[test]
fn folds_created_in_the_same_second_get_distinct_directories() {
    let root = tempfile::tempdir().unwrap();
    let first = RunLog::create(root.path(), "model", 0).unwrap();
    let second = RunLog::create(root.path(), "model", 1).unwrap();

    assert_ne!(first.dir(), second.dir());
    assert!(first
        .dir()
        .file_name()
        .unwrap()
        .to_string_lossy()
        .ends_with("_fold0"));
    assert!(second
        .dir()
        .file_name()
        .unwrap()
        .to_string_lossy()
        .ends_with("_fold1"));
}
