//! Core types and error definitions for classify_dataset.

use std::path::PathBuf;
use thiserror::Error;

pub type DatasetResult<T> = Result<T, DatasetError>;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("annotation parse error at {path}:{line}: {msg}")]
    Parse {
        path: PathBuf,
        line: usize,
        msg: String,
    },
    #[error("json parse error at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("image error at {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("class {label} has {count} samples, fewer than the requested {folds} folds")]
    InsufficientSamples {
        label: usize,
        count: usize,
        folds: usize,
    },
}

/// Parallel sample-name / label lists built from one annotation root.
///
/// Labels are expected to be dense in `[0, num_classes)`; `samples[i]` is a
/// path relative to the data root and `labels[i]` its class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleSet {
    pub samples: Vec<String>,
    pub labels: Vec<usize>,
}

impl SampleSet {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Highest label plus one.
    pub fn num_classes(&self) -> usize {
        self.labels.iter().copied().max().map_or(0, |m| m + 1)
    }

    pub(crate) fn project(&self, indices: &[usize]) -> Subset {
        Subset {
            samples: indices.iter().map(|&i| self.samples[i].clone()).collect(),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
        }
    }
}

/// One side of a split, as owned (sample, label) lists rather than indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subset {
    pub samples: Vec<String>,
    pub labels: Vec<usize>,
}

impl Subset {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// A single (train, validation) partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldSplit {
    pub train: Subset,
    pub val: Subset,
}

/// Decoded, normalized image in CHW layout plus its class label.
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub chw: Vec<f32>,
    pub width: u32,
    pub height: u32,
    pub label: usize,
}
