//! Batch iteration over image datasets with parallel decoding.

use crate::transform::ImageDataset;
use crate::types::{DatasetError, DatasetResult, ProcessedImage};
use burn::tensor::{backend::Backend, Int, Shape, Tensor, TensorData};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use std::sync::Arc;

pub const DEFAULT_WORKERS: usize = 8;

#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub batch_size: usize,
    /// Re-drawn order each pass; only the train loader sets this.
    pub shuffle: bool,
    /// Parallel image-decoding workers.
    pub workers: usize,
    /// Seed mixed with the epoch number for reproducible shuffling.
    pub seed: Option<u64>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: 32,
            shuffle: false,
            workers: DEFAULT_WORKERS,
            seed: None,
        }
    }
}

/// One assembled batch on the target device.
#[derive(Debug, Clone)]
pub struct ImageBatch<B: Backend> {
    pub images: Tensor<B, 4>,
    pub targets: Tensor<B, 1, Int>,
}

/// Wraps a dataset with batching, optional shuffling, and a worker pool that
/// decodes a batch's images in parallel while the control thread blocks on
/// assembly.
pub struct DataLoader<D: ImageDataset> {
    dataset: Arc<D>,
    cfg: LoaderConfig,
    pool: rayon::ThreadPool,
}

impl<D: ImageDataset> DataLoader<D> {
    pub fn new(dataset: D, cfg: LoaderConfig) -> DatasetResult<Self> {
        if cfg.batch_size == 0 {
            return Err(DatasetError::Config(
                "batch_size must be at least 1".to_string(),
            ));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(cfg.workers.max(1))
            .build()
            .map_err(|e| DatasetError::Config(format!("failed to build worker pool: {e}")))?;
        Ok(Self {
            dataset: Arc::new(dataset),
            cfg,
            pool,
        })
    }

    pub fn len(&self) -> usize {
        self.dataset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    pub fn num_batches(&self) -> usize {
        self.len().div_ceil(self.cfg.batch_size)
    }

    /// Starts a fresh pass. A shuffling loader re-draws its order from
    /// `seed ^ epoch` each call; otherwise the order is identical every pass.
    pub fn epoch_iter(&self, epoch: usize) -> EpochIter<'_, D> {
        let mut order: Vec<usize> = (0..self.dataset.len()).collect();
        if self.cfg.shuffle {
            let mut rng = match self.cfg.seed {
                Some(seed) => StdRng::seed_from_u64(seed ^ epoch as u64),
                None => StdRng::from_rng(&mut rand::rng()),
            };
            order.shuffle(&mut rng);
        }
        EpochIter {
            loader: self,
            order,
            cursor: 0,
        }
    }
}

/// One pass over the loader's dataset. The final batch may be short.
pub struct EpochIter<'a, D: ImageDataset> {
    loader: &'a DataLoader<D>,
    order: Vec<usize>,
    cursor: usize,
}

impl<D: ImageDataset> EpochIter<'_, D> {
    pub fn next_batch<B: Backend>(
        &mut self,
        device: &B::Device,
    ) -> DatasetResult<Option<ImageBatch<B>>> {
        if self.cursor >= self.order.len() {
            return Ok(None);
        }
        let end = (self.cursor + self.loader.cfg.batch_size).min(self.order.len());
        let slice = &self.order[self.cursor..end];
        self.cursor = end;

        let dataset = &self.loader.dataset;
        let mut decoded: Vec<(usize, DatasetResult<ProcessedImage>)> = self.loader.pool.install(|| {
            slice
                .par_iter()
                .enumerate()
                .map(|(position, &index)| (position, dataset.get(index)))
                .collect()
        });
        decoded.sort_by_key(|(position, _)| *position);

        let mut samples: Vec<ProcessedImage> = Vec::with_capacity(decoded.len());
        for (_, result) in decoded {
            samples.push(result?);
        }
        let Some(first) = samples.first() else {
            return Ok(None);
        };
        let (width, height) = (first.width, first.height);

        let mut image_buf: Vec<f32> = Vec::with_capacity(samples.len() * first.chw.len());
        let mut target_buf: Vec<i64> = Vec::with_capacity(samples.len());
        for sample in &samples {
            if (sample.width, sample.height) != (width, height) {
                return Err(DatasetError::Config(format!(
                    "batch contains varying image sizes: {}x{} vs {width}x{height}",
                    sample.width, sample.height
                )));
            }
            image_buf.extend_from_slice(&sample.chw);
            target_buf.push(sample.label as i64);
        }

        let batch_len = target_buf.len();
        let images = Tensor::<B, 4>::from_data(
            TensorData::new(
                image_buf,
                Shape::new([batch_len, 3, height as usize, width as usize]),
            ),
            device,
        );
        let targets = Tensor::<B, 1, Int>::from_data(
            TensorData::new(target_buf, Shape::new([batch_len])),
            device,
        );
        Ok(Some(ImageBatch { images, targets }))
    }
}
