//! Epoch-driven train/validate loop with checkpointing and scalar logging.

use crate::checkpoint::Checkpointer;
use crate::metrics::evaluate;
use crate::model::{correct_count, predict_labels, Classifier};
use crate::run_log::ScalarSink;
use anyhow::{Context, Result};
use burn::module::AutodiffModule;
use burn::nn::loss::CrossEntropyLoss;
use burn::optim::{GradientsParams, Optimizer};
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::ElementConversion;
use classify_dataset::{DataLoader, EvalDataset, TrainDataset};
use std::path::PathBuf;

/// Step decay: the learning rate is multiplied by `gamma` every `step_size`
/// epochs.
#[derive(Debug, Clone)]
pub struct StepDecay {
    pub initial: f64,
    pub step_size: usize,
    pub gamma: f64,
    steps: usize,
}

impl StepDecay {
    pub fn new(initial: f64, step_size: usize, gamma: f64) -> Self {
        Self {
            initial,
            step_size,
            gamma,
            steps: 0,
        }
    }

    pub fn lr(&self) -> f64 {
        self.initial * self.gamma.powi((self.steps / self.step_size.max(1)) as i32)
    }

    pub fn step(&mut self) {
        self.steps += 1;
    }
}

/// What a completed fit reports back to the caller.
#[derive(Debug, Clone, Copy)]
pub struct FitSummary {
    pub best_score: f64,
    pub final_oa: f64,
    pub final_val_loss: f64,
}

/// Drives one fold: trains for `epochs` passes, validates after each, tracks
/// the best validation accuracy, and persists checkpoints every epoch.
pub struct TrainVal<B: AutodiffBackend, S: ScalarSink> {
    pub sink: S,
    pub checkpointer: Checkpointer,
    pub schedule: StepDecay,
    pub epochs: usize,
    pub num_classes: usize,
    pub device: B::Device,
    /// Directory receiving the final-epoch confusion matrix image.
    pub confusion_dir: PathBuf,
}

impl<B: AutodiffBackend, S: ScalarSink> TrainVal<B, S> {
    pub fn fit<M, O>(
        mut self,
        mut model: M,
        mut optim: O,
        train_loader: &DataLoader<TrainDataset>,
        val_loader: &DataLoader<EvalDataset>,
    ) -> Result<FitSummary>
    where
        M: Classifier<B> + AutodiffModule<B>,
        M::InnerModule: Classifier<B::InnerBackend>,
        O: Optimizer<M, B>,
    {
        let mut global_step = 0usize;
        let mut final_oa = 0.0;
        let mut final_val_loss = 0.0;
        let criterion = CrossEntropyLoss::new(None, &self.device);

        for epoch in 1..=self.epochs {
            let lr = self.schedule.lr();
            let mut epoch_correct = 0usize;
            let mut epoch_seen = 0usize;

            let mut iter = train_loader.epoch_iter(epoch);
            while let Some(batch) = iter
                .next_batch::<B>(&self.device)
                .context("failed to assemble a training batch")?
            {
                let batch_len = batch.targets.dims()[0];
                let logits = model.forward(batch.images);
                let correct = correct_count(logits.clone(), batch.targets.clone());
                let loss = criterion.forward(logits, batch.targets);
                let loss_scalar = loss.clone().into_scalar().elem::<f64>();

                let grads = GradientsParams::from_grads(loss.backward(), &model);
                model = optim.step(lr, model, grads);

                epoch_correct += correct;
                epoch_seen += batch_len;
                global_step += 1;
                self.sink.scalar("train/loss", global_step, loss_scalar);
                self.sink.scalar(
                    "train/acc_iter",
                    global_step,
                    correct as f64 / batch_len.max(1) as f64,
                );
                self.sink.scalar("train/lr", global_step, lr);
            }

            self.schedule.step();
            let train_acc = epoch_correct as f64 / epoch_seen.max(1) as f64;
            self.sink.scalar("train/acc_epoch", epoch, train_acc);
            self.sink.scalar("lr", epoch, lr);
            println!(
                "epoch {epoch}/{}: lr {lr:.6} train accuracy {train_acc:.4}",
                self.epochs
            );

            let eval_model = model.valid();
            let (oa, val_loss) = self.validation(&eval_model, val_loader, epoch)?;
            final_oa = oa;
            final_val_loss = val_loss;

            let is_best = self.checkpointer.observe(oa);
            self.checkpointer.save::<B, M>(&model, epoch, is_best)?;
            self.sink.scalar("valid/loss", epoch, val_loss);
            self.sink.scalar("valid/accuracy", epoch, oa);
            println!(
                "epoch {epoch}/{}: valid loss {val_loss:.4} accuracy {oa:.4} (best {:.4})",
                self.epochs,
                self.checkpointer.best_score()
            );
        }

        Ok(FitSummary {
            best_score: self.checkpointer.best_score(),
            final_oa,
            final_val_loss,
        })
    }

    /// One full pass over the validation loader. Returns overall accuracy and
    /// the mean of per-batch mean losses. Renders the confusion matrix image
    /// on the final epoch only.
    fn validation<M>(
        &mut self,
        model: &M,
        loader: &DataLoader<EvalDataset>,
        epoch: usize,
    ) -> Result<(f64, f64)>
    where
        M: Classifier<B::InnerBackend>,
    {
        let mut truths: Vec<usize> = Vec::with_capacity(loader.len());
        let mut preds: Vec<usize> = Vec::with_capacity(loader.len());
        let mut loss_sum = 0.0;
        let mut batches = 0usize;
        let criterion = CrossEntropyLoss::new(None, &self.device);

        let mut iter = loader.epoch_iter(epoch);
        while let Some(batch) = iter
            .next_batch::<B::InnerBackend>(&self.device)
            .context("failed to assemble a validation batch")?
        {
            let logits = model.forward(batch.images);
            let loss = criterion.forward(logits.clone(), batch.targets.clone());
            loss_sum += loss.into_scalar().elem::<f64>();
            batches += 1;

            preds.extend(predict_labels(logits).into_iter().map(|p| p as usize));
            truths.extend(
                batch
                    .targets
                    .into_data()
                    .iter::<i64>()
                    .map(|t| t as usize),
            );
        }

        let render = (epoch == self.epochs)
            .then(|| self.confusion_dir.join("confusion_matrix.png"));
        let report = evaluate(&truths, &preds, self.num_classes, render.as_deref())?;
        self.sink.scalar("valid/aa", epoch, report.aa);
        self.sink.scalar("valid/kappa", epoch, report.kappa);
        Ok((report.oa, loss_sum / batches.max(1) as f64))
    }
}
