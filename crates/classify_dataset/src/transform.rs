//! Image loading and transform pipelines for the train and eval datasets.

use crate::types::{DatasetError, DatasetResult, ProcessedImage, Subset};
use image::imageops::{self, FilterType};
use image::RgbImage;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::{Path, PathBuf};

/// Fixed intermediate resize applied before the evaluation center crop.
pub const EVAL_RESIZE: (u32, u32) = (300, 300);

/// Per-channel normalization applied after scaling pixels to [0, 1].
#[derive(Debug, Clone, Copy)]
pub struct Normalize {
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

impl Normalize {
    pub const IMAGENET: Normalize = Normalize {
        mean: [0.485, 0.456, 0.406],
        std: [0.229, 0.224, 0.225],
    };
}

/// Pre-resize augmentation for the train pipeline: random crop then random
/// erasing, each applied with its own probability.
#[derive(Debug, Clone)]
pub struct Augment {
    pub crop_prob: f32,
    /// Minimum retained side fraction when cropping.
    pub crop_min_frac: f32,
    pub erase_prob: f32,
    /// Maximum erased side fraction (per axis).
    pub erase_frac: f32,
    /// Seed mixed with the sample index for per-sample determinism; None uses
    /// a fresh thread-local draw each access.
    pub seed: Option<u64>,
}

impl Default for Augment {
    fn default() -> Self {
        Self {
            crop_prob: 0.5,
            crop_min_frac: 0.8,
            erase_prob: 0.5,
            erase_frac: 0.3,
            seed: None,
        }
    }
}

impl Augment {
    fn apply(&self, mut img: RgbImage, index: u64) -> RgbImage {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed ^ index),
            None => StdRng::from_rng(&mut rand::rng()),
        };

        if self.crop_prob > 0.0 && rng.random::<f32>() < self.crop_prob {
            let (w, h) = img.dimensions();
            let frac = rng.random_range(self.crop_min_frac.min(1.0)..=1.0);
            let cw = ((w as f32 * frac) as u32).clamp(1, w);
            let ch = ((h as f32 * frac) as u32).clamp(1, h);
            let x = rng.random_range(0..=w - cw);
            let y = rng.random_range(0..=h - ch);
            img = imageops::crop_imm(&img, x, y, cw, ch).to_image();
        }

        if self.erase_prob > 0.0 && rng.random::<f32>() < self.erase_prob {
            let (w, h) = img.dimensions();
            let ew = ((w as f32 * self.erase_frac * rng.random::<f32>()) as u32).clamp(1, w);
            let eh = ((h as f32 * self.erase_frac * rng.random::<f32>()) as u32).clamp(1, h);
            let x0 = rng.random_range(0..=w - ew);
            let y0 = rng.random_range(0..=h - eh);
            for y in y0..y0 + eh {
                for x in x0..x0 + ew {
                    img.put_pixel(x, y, image::Rgb([0, 0, 0]));
                }
            }
        }

        img
    }
}

/// Indexable, lazily evaluated collection of (processed image, label) pairs.
pub trait ImageDataset: Send + Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, index: usize) -> DatasetResult<ProcessedImage>;
}

/// Training dataset: optional augmentation, then a single resize to the
/// target size and per-channel normalization.
pub struct TrainDataset {
    root: PathBuf,
    subset: Subset,
    target: (u32, u32),
    norm: Normalize,
    augment: Option<Augment>,
}

impl TrainDataset {
    pub fn new(
        root: &Path,
        subset: Subset,
        target: (u32, u32),
        norm: Normalize,
        augment: Option<Augment>,
    ) -> Self {
        Self {
            root: root.to_path_buf(),
            subset,
            target,
            norm,
            augment,
        }
    }
}

impl ImageDataset for TrainDataset {
    fn len(&self) -> usize {
        self.subset.len()
    }

    fn get(&self, index: usize) -> DatasetResult<ProcessedImage> {
        let path = self.root.join(&self.subset.samples[index]);
        let img = open_rgb(&path)?;
        let img = match &self.augment {
            Some(augment) => augment.apply(img, index as u64),
            None => img,
        };
        let resized = imageops::resize(&img, self.target.0, self.target.1, FilterType::CatmullRom);
        Ok(normalize_chw(&resized, self.subset.labels[index], self.norm))
    }
}

/// Validation dataset: fixed 300x300 resize followed by a center crop to the
/// target size. The two-stage resize is the evaluation-crop policy and is
/// not equivalent to a single resize.
pub struct EvalDataset {
    root: PathBuf,
    subset: Subset,
    target: (u32, u32),
    norm: Normalize,
}

impl EvalDataset {
    pub fn new(root: &Path, subset: Subset, target: (u32, u32), norm: Normalize) -> Self {
        Self {
            root: root.to_path_buf(),
            subset,
            target,
            norm,
        }
    }
}

impl ImageDataset for EvalDataset {
    fn len(&self) -> usize {
        self.subset.len()
    }

    fn get(&self, index: usize) -> DatasetResult<ProcessedImage> {
        let path = self.root.join(&self.subset.samples[index]);
        let img = open_rgb(&path)?;
        let resized = imageops::resize(&img, EVAL_RESIZE.0, EVAL_RESIZE.1, FilterType::CatmullRom);
        let cropped = center_crop(&resized, self.target.0, self.target.1);
        Ok(normalize_chw(&cropped, self.subset.labels[index], self.norm))
    }
}

fn open_rgb(path: &Path) -> DatasetResult<RgbImage> {
    let img = image::open(path).map_err(|e| DatasetError::Image {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(img.to_rgb8())
}

fn center_crop(img: &RgbImage, target_w: u32, target_h: u32) -> RgbImage {
    let (w, h) = img.dimensions();
    let cw = target_w.min(w);
    let ch = target_h.min(h);
    let x = (w - cw) / 2;
    let y = (h - ch) / 2;
    imageops::crop_imm(img, x, y, cw, ch).to_image()
}

fn normalize_chw(img: &RgbImage, label: usize, norm: Normalize) -> ProcessedImage {
    let (width, height) = img.dimensions();
    let plane = (width * height) as usize;
    let mut chw = vec![0.0f32; plane * 3];
    for (x, y, pixel) in img.enumerate_pixels() {
        let base = (y * width + x) as usize;
        for c in 0..3 {
            chw[c * plane + base] = (pixel[c] as f32 / 255.0 - norm.mean[c]) / norm.std[c];
        }
    }
    ProcessedImage {
        chw,
        width,
        height,
        label,
    }
}
