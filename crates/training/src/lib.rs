pub mod checkpoint;
pub mod metrics;
pub mod model;
pub mod run_log;
pub mod trainer;
pub mod util;

pub use checkpoint::{read_meta, CheckpointMeta, Checkpointer};
pub use metrics::{evaluate, ConfusionMatrix, EvalReport};
pub use model::{correct_count, predict_labels, Classifier, ConvClassifier, ConvClassifierConfig};
pub use run_log::{NullSink, RunLog, ScalarSink};
pub use trainer::{FitSummary, StepDecay, TrainVal};
pub use util::{run_train, BackendKind, TrainArgs};

/// Backend alias for training/eval (NdArray by default; WGPU if enabled).
#[cfg(feature = "backend-wgpu")]
pub type TrainBackend = burn_wgpu::Wgpu<f32>;
#[cfg(not(feature = "backend-wgpu"))]
pub type TrainBackend = burn_ndarray::NdArray<f32>;
