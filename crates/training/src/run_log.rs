//! Run directories, config snapshots, and the scalar metrics sink.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Capability the trainer emits scalars through: one named value per step.
pub trait ScalarSink {
    fn scalar(&mut self, tag: &str, step: usize, value: f64);
}

/// Sink that drops every event (tests, dry runs).
#[derive(Debug, Default)]
pub struct NullSink;

impl ScalarSink for NullSink {
    fn scalar(&mut self, _tag: &str, _step: usize, _value: f64) {}
}

/// One fold's log directory, named by a timestamp plus the fold index so
/// folds of the same run never collide, holding the config snapshot and an
/// append-only `metrics.jsonl` event stream.
pub struct RunLog {
    dir: PathBuf,
    events: File,
}

impl RunLog {
    pub fn create(save_path: &Path, model_name: &str, fold: usize) -> Result<Self> {
        let stamp = chrono::Local::now()
            .format("log-%Y-%m-%dT%H-%M-%S")
            .to_string();
        let dir = save_path
            .join(model_name)
            .join(format!("{stamp}_fold{fold}"));
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create run directory {}", dir.display()))?;
        let events_path = dir.join("metrics.jsonl");
        let events = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&events_path)
            .with_context(|| format!("failed to open {}", events_path.display()))?;
        Ok(Self { dir, events })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes the full run configuration once, for reproducibility.
    pub fn snapshot_config<T: Serialize>(&self, config: &T) -> Result<()> {
        let path = self.dir.join("config.json");
        let raw = serde_json::to_vec_pretty(config)?;
        fs::write(&path, raw).with_context(|| format!("failed to write {}", path.display()))
    }
}

impl ScalarSink for RunLog {
    fn scalar(&mut self, tag: &str, step: usize, value: f64) {
        let record = serde_json::json!({ "tag": tag, "step": step, "value": value });
        if let Err(e) = writeln!(self.events, "{record}") {
            eprintln!("failed to append metrics event: {e}");
        }
    }
}
