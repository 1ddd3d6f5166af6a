//! Per-class sample-count charts, one image per (phase, fold).

use crate::types::{DatasetError, DatasetResult, Subset};
use image::{Rgb, RgbImage};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const BAR_WIDTH: u32 = 12;
const BAR_GAP: u32 = 4;
const CHART_HEIGHT: u32 = 240;
const MARGIN: u32 = 16;

pub fn label_counts(subset: &Subset) -> BTreeMap<usize, usize> {
    let mut counts = BTreeMap::new();
    for &label in &subset.labels {
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}

/// Renders a bar chart of per-class sample counts to `<out_dir>/<phase>.png`
/// and returns the written path.
pub fn draw_label_distribution(
    counts: &BTreeMap<usize, usize>,
    num_classes: usize,
    phase: &str,
    out_dir: &Path,
) -> DatasetResult<PathBuf> {
    let classes = num_classes.max(1) as u32;
    let width = MARGIN * 2 + classes * BAR_WIDTH + (classes - 1) * BAR_GAP;
    let height = CHART_HEIGHT + 2 * MARGIN;
    let max_count = counts.values().copied().max().unwrap_or(0).max(1);

    let mut canvas = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
    for label in 0..num_classes {
        let count = counts.get(&label).copied().unwrap_or(0);
        let bar_h = (CHART_HEIGHT as u64 * count as u64 / max_count as u64) as u32;
        let x0 = MARGIN + label as u32 * (BAR_WIDTH + BAR_GAP);
        for x in x0..x0 + BAR_WIDTH {
            for dy in 0..bar_h {
                canvas.put_pixel(x, MARGIN + CHART_HEIGHT - 1 - dy, Rgb([70, 130, 180]));
            }
        }
    }
    // Baseline axis.
    for x in MARGIN..width - MARGIN {
        canvas.put_pixel(x, MARGIN + CHART_HEIGHT, Rgb([40, 40, 40]));
    }

    let path = out_dir.join(format!("{phase}.png"));
    canvas.save(&path).map_err(|e| DatasetError::Image {
        path: path.clone(),
        source: e,
    })?;
    Ok(path)
}
