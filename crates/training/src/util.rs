//! CLI surface and the end-to-end training entry point.

use crate::checkpoint::Checkpointer;
use crate::model::{ConvClassifier, ConvClassifierConfig};
use crate::run_log::RunLog;
use crate::trainer::{StepDecay, TrainVal};
use crate::TrainBackend;
use anyhow::{bail, Context, Result};
use burn::backend::Autodiff;
use burn::optim::AdamConfig;
use burn::tensor::backend::Backend;
use clap::{Parser, ValueEnum};
use classify_dataset::{
    draw_label_distribution, index_annotations, label_counts, load_label_names, plan_folds,
    Augment, DataLoader, EvalDataset, FoldSplit, LoaderConfig, Normalize, TrainDataset,
    DEFAULT_WORKERS, SPLIT_SEED,
};
use serde::Serialize;
use std::path::PathBuf;

type ADBackend = Autodiff<TrainBackend>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    NdArray,
    Wgpu,
}

#[derive(Debug, Parser, Serialize)]
#[command(name = "train", about = "Train an image classifier from annotation files")]
pub struct TrainArgs {
    /// Dataset root: annotation txt files plus the image paths they name.
    #[arg(long)]
    pub data_root: PathBuf,

    /// 1 runs a single holdout split; 2 or more runs K-fold cross validation.
    #[arg(long, default_value_t = 1)]
    pub folds: usize,

    /// Validation fraction for the holdout split (required when folds is 1).
    #[arg(long)]
    pub test_size: Option<f64>,

    /// Optional JSON map of class index to display name.
    #[arg(long)]
    pub label_names: Option<PathBuf>,

    #[arg(long, default_value_t = 40)]
    pub epochs: usize,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Epochs between learning-rate decays.
    #[arg(long, default_value_t = 10)]
    pub lr_step_size: usize,

    #[arg(long, default_value_t = 0.1)]
    pub lr_gamma: f64,

    /// Side length the train pipeline resizes to and the eval pipeline crops to.
    #[arg(long, default_value_t = 224)]
    pub image_size: u32,

    /// Parallel image-decoding workers per loader.
    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// Parent directory for run logs and checkpoints.
    #[arg(long, default_value = "checkpoints")]
    pub save_path: PathBuf,

    /// Backend to use (ndarray or wgpu if enabled).
    #[arg(long, value_enum, default_value_t = BackendKind::NdArray)]
    pub backend: BackendKind,

    /// Seed for splitting, shuffling, and augmentation.
    #[arg(long, default_value_t = SPLIT_SEED)]
    pub seed: u64,

    #[arg(long, default_value = "conv_classifier")]
    pub model_name: String,

    /// Enable random crop and random erasing on the train pipeline.
    #[arg(long, default_value_t = false)]
    pub augment: bool,
}

pub fn run_train(args: TrainArgs) -> Result<()> {
    validate_backend_choice(args.backend)?;

    let set = index_annotations(&args.data_root).context("failed to index annotations")?;
    if set.is_empty() {
        bail!("no samples found under {}", args.data_root.display());
    }
    let num_classes = set.num_classes();
    if let Some(path) = &args.label_names {
        let names = load_label_names(path).context("failed to load label names")?;
        println!("{} classes: {names:?}", names.len());
    }
    println!(
        "{} samples across {num_classes} classes, {} fold(s)",
        set.len(),
        args.folds
    );

    let splits =
        plan_folds(&set, args.folds, args.test_size, args.seed).context("failed to plan splits")?;
    for (fold, split) in splits.into_iter().enumerate() {
        train_fold(&args, split, fold, num_classes)?;
    }
    Ok(())
}

fn train_fold(
    args: &TrainArgs,
    split: FoldSplit,
    fold: usize,
    num_classes: usize,
) -> Result<()> {
    let run_log = RunLog::create(&args.save_path, &args.model_name, fold)?;
    run_log.snapshot_config(args)?;
    let run_dir = run_log.dir().to_path_buf();
    println!("fold {fold}: logging to {}", run_dir.display());

    draw_label_distribution(
        &label_counts(&split.train),
        num_classes,
        &format!("Train_{fold}"),
        &run_dir,
    )?;
    draw_label_distribution(
        &label_counts(&split.val),
        num_classes,
        &format!("Val_{fold}"),
        &run_dir,
    )?;
    println!(
        "fold {fold}: {} train / {} val samples",
        split.train.len(),
        split.val.len()
    );

    let target = (args.image_size, args.image_size);
    let augment = args.augment.then(|| Augment {
        seed: Some(args.seed),
        ..Augment::default()
    });
    let train_set = TrainDataset::new(
        &args.data_root,
        split.train,
        target,
        Normalize::IMAGENET,
        augment,
    );
    let val_set = EvalDataset::new(&args.data_root, split.val, target, Normalize::IMAGENET);

    let train_loader = DataLoader::new(
        train_set,
        LoaderConfig {
            batch_size: args.batch_size,
            shuffle: true,
            workers: args.workers,
            seed: Some(args.seed),
        },
    )?;
    let val_loader = DataLoader::new(
        val_set,
        LoaderConfig {
            batch_size: args.batch_size,
            shuffle: false,
            workers: args.workers,
            seed: None,
        },
    )?;

    let device = <ADBackend as Backend>::Device::default();
    let model = ConvClassifier::<ADBackend>::new(
        ConvClassifierConfig {
            num_classes,
            ..ConvClassifierConfig::default()
        },
        &device,
    );
    let optim = AdamConfig::new().init();
    let checkpointer = Checkpointer::new(&run_dir, &args.model_name, fold)?;

    let trainer = TrainVal::<ADBackend, _> {
        sink: run_log,
        checkpointer,
        schedule: StepDecay::new(args.lr, args.lr_step_size, args.lr_gamma),
        epochs: args.epochs,
        num_classes,
        device,
        confusion_dir: run_dir,
    };
    let summary = trainer.fit(model, optim, &train_loader, &val_loader)?;
    println!(
        "fold {fold}: best accuracy {:.4}, final accuracy {:.4}",
        summary.best_score, summary.final_oa
    );
    Ok(())
}

fn validate_backend_choice(backend: BackendKind) -> Result<()> {
    match backend {
        BackendKind::NdArray if cfg!(feature = "backend-wgpu") => {
            bail!("this build uses the wgpu backend; rebuild without --features backend-wgpu")
        }
        BackendKind::Wgpu if !cfg!(feature = "backend-wgpu") => {
            bail!("wgpu backend not compiled in; rebuild with --features backend-wgpu")
        }
        _ => Ok(()),
    }
}
