//! Checkpoint persistence and best-score tracking.

use anyhow::{Context, Result};
use burn::module::Module;
use burn::record::{BinFileRecorder, FullPrecisionSettings};
use burn::tensor::backend::Backend;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Progress metadata written next to each parameter record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CheckpointMeta {
    pub epoch: usize,
    pub max_score: f64,
}

/// Per-fold checkpoint writer. Every epoch overwrites the rolling record;
/// the `_best` copy is written only on strict improvement and left alone by
/// later non-best epochs.
pub struct Checkpointer {
    dir: PathBuf,
    stem: String,
    best: f64,
}

impl Checkpointer {
    pub fn new(dir: &Path, model_name: &str, fold: usize) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create checkpoint directory {}", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            stem: format!("{model_name}_fold{fold}"),
            best: 0.0,
        })
    }

    pub fn best_score(&self) -> f64 {
        self.best
    }

    /// Strict improvement test against the running maximum (initialized to
    /// 0); ties never count as improvement.
    pub fn observe(&mut self, accuracy: f64) -> bool {
        if accuracy > self.best {
            self.best = accuracy;
            true
        } else {
            false
        }
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        self.dir.join(format!("{}.bin", self.stem))
    }

    pub fn best_path(&self) -> PathBuf {
        self.dir.join(format!("{}_best.bin", self.stem))
    }

    pub fn save<B: Backend, M: Module<B> + Clone>(
        &self,
        model: &M,
        epoch: usize,
        is_best: bool,
    ) -> Result<()> {
        let recorder = BinFileRecorder::<FullPrecisionSettings>::new();
        let meta = CheckpointMeta {
            epoch,
            max_score: self.best,
        };
        self.write_one(model, &recorder, &meta, &self.stem)?;
        if is_best {
            self.write_one(model, &recorder, &meta, &format!("{}_best", self.stem))?;
        }
        Ok(())
    }

    fn write_one<B: Backend, M: Module<B> + Clone>(
        &self,
        model: &M,
        recorder: &BinFileRecorder<FullPrecisionSettings>,
        meta: &CheckpointMeta,
        stem: &str,
    ) -> Result<()> {
        let record_path = self.dir.join(format!("{stem}.bin"));
        model
            .clone()
            .save_file(record_path.clone(), recorder)
            .map_err(|e| anyhow::anyhow!("failed to save checkpoint {}: {e}", record_path.display()))?;
        let meta_path = self.dir.join(format!("{stem}.meta.json"));
        fs::write(&meta_path, serde_json::to_vec_pretty(meta)?)
            .with_context(|| format!("failed to write {}", meta_path.display()))?;
        Ok(())
    }
}

pub fn read_meta(path: &Path) -> Result<CheckpointMeta> {
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("invalid checkpoint meta {}", path.display()))
}
