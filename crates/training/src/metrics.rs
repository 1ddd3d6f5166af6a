//! Confusion-matrix metrics: per-class accuracy, OA, AA, and kappa.

use anyhow::{bail, Result};
use image::{Rgb, RgbImage};
use serde::Serialize;
use std::path::Path;

const CELL_PX: u32 = 24;

#[derive(Debug, Clone)]
pub struct ConfusionMatrix {
    counts: Vec<u64>,
    num_classes: usize,
}

impl ConfusionMatrix {
    pub fn from_pairs(truths: &[usize], preds: &[usize], num_classes: usize) -> Result<Self> {
        if truths.len() != preds.len() {
            bail!(
                "prediction/label length mismatch: {} vs {}",
                preds.len(),
                truths.len()
            );
        }
        if num_classes == 0 {
            bail!("num_classes must be at least 1");
        }
        let mut counts = vec![0u64; num_classes * num_classes];
        for (&truth, &pred) in truths.iter().zip(preds) {
            if truth >= num_classes || pred >= num_classes {
                bail!("label pair ({truth}, {pred}) outside [0, {num_classes})");
            }
            counts[truth * num_classes + pred] += 1;
        }
        Ok(Self {
            counts,
            num_classes,
        })
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn count(&self, truth: usize, pred: usize) -> u64 {
        self.counts[truth * self.num_classes + pred]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    fn row_total(&self, truth: usize) -> u64 {
        (0..self.num_classes).map(|p| self.count(truth, p)).sum()
    }

    fn col_total(&self, pred: usize) -> u64 {
        (0..self.num_classes).map(|t| self.count(t, pred)).sum()
    }

    /// Fraction of predictions matching ground truth.
    pub fn overall_accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let diag: u64 = (0..self.num_classes).map(|c| self.count(c, c)).sum();
        diag as f64 / total as f64
    }

    /// Per-class recall; classes absent from the ground truth report 0.
    pub fn per_class_accuracy(&self) -> Vec<f64> {
        (0..self.num_classes)
            .map(|c| {
                let row = self.row_total(c);
                if row == 0 {
                    0.0
                } else {
                    self.count(c, c) as f64 / row as f64
                }
            })
            .collect()
    }

    /// Unweighted mean of per-class accuracies over classes that appear in
    /// the ground truth.
    pub fn average_accuracy(&self) -> f64 {
        let mut sum = 0.0;
        let mut present = 0usize;
        for c in 0..self.num_classes {
            let row = self.row_total(c);
            if row > 0 {
                sum += self.count(c, c) as f64 / row as f64;
                present += 1;
            }
        }
        if present == 0 {
            0.0
        } else {
            sum / present as f64
        }
    }

    /// Cohen's kappa: chance-corrected agreement. Degenerate distributions
    /// (expected agreement of 1) report 0.
    pub fn kappa(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let total = total as f64;
        let po = self.overall_accuracy();
        let pe: f64 = (0..self.num_classes)
            .map(|c| self.row_total(c) as f64 * self.col_total(c) as f64)
            .sum::<f64>()
            / (total * total);
        let denom = 1.0 - pe;
        if denom.abs() < f64::EPSILON {
            0.0
        } else {
            (po - pe) / denom
        }
    }

    /// Writes the matrix as a row-normalized heatmap image.
    pub fn render(&self, path: &Path) -> Result<()> {
        let side = self.num_classes as u32 * CELL_PX;
        let mut canvas = RgbImage::from_pixel(side, side, Rgb([255, 255, 255]));
        for truth in 0..self.num_classes {
            let row = self.row_total(truth);
            for pred in 0..self.num_classes {
                let frac = if row == 0 {
                    0.0
                } else {
                    self.count(truth, pred) as f64 / row as f64
                };
                let shade = (255.0 * (1.0 - frac)) as u8;
                let color = Rgb([shade, shade, 255]);
                let x0 = pred as u32 * CELL_PX;
                let y0 = truth as u32 * CELL_PX;
                for y in y0..y0 + CELL_PX {
                    for x in x0..x0 + CELL_PX {
                        canvas.put_pixel(x, y, color);
                    }
                }
            }
        }
        canvas
            .save(path)
            .map_err(|e| anyhow::anyhow!("failed to write confusion matrix {}: {e}", path.display()))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EvalReport {
    pub oa: f64,
    pub aa: f64,
    pub kappa: f64,
    pub per_class: Vec<f64>,
}

/// Computes the full epoch report and optionally renders the confusion
/// matrix image (only the final epoch requests rendering).
pub fn evaluate(
    truths: &[usize],
    preds: &[usize],
    num_classes: usize,
    render: Option<&Path>,
) -> Result<EvalReport> {
    let cm = ConfusionMatrix::from_pairs(truths, preds, num_classes)?;
    if let Some(path) = render {
        cm.render(path)?;
    }
    Ok(EvalReport {
        oa: cm.overall_accuracy(),
        aa: cm.average_accuracy(),
        kappa: cm.kappa(),
        per_class: cm.per_class_accuracy(),
    })
}
