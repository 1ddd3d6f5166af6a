//! Dataset plumbing for the image-classification training pipeline.
//!
//! This crate provides:
//! - Annotation-file indexing into parallel sample/label lists
//! - Stratified holdout and K-fold splitting
//! - Train/eval image transform pipelines
//! - Batched, worker-pool-backed loading into burn tensors
//! - Label distribution charts

pub mod annotations;
pub mod charts;
pub mod loader;
pub mod splits;
pub mod transform;
pub mod types;

pub use annotations::{index_annotations, load_label_names};
pub use charts::{draw_label_distribution, label_counts};
pub use loader::{DataLoader, EpochIter, ImageBatch, LoaderConfig, DEFAULT_WORKERS};
pub use splits::{plan_folds, split_holdout, split_kfold, SPLIT_SEED};
pub use transform::{Augment, EvalDataset, ImageDataset, Normalize, TrainDataset, EVAL_RESIZE};
pub use types::{DatasetError, DatasetResult, FoldSplit, ProcessedImage, SampleSet, Subset};
