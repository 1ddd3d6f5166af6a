//! Stratified dataset splitting: single holdout or K folds.

use crate::types::{DatasetError, DatasetResult, FoldSplit, SampleSet};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;

/// Fixed seed used by the competition pipeline so splits are reproducible
/// across runs on the same annotation set.
pub const SPLIT_SEED: u64 = 69;

fn indices_by_class(labels: &[usize]) -> BTreeMap<usize, Vec<usize>> {
    let mut by_class: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (index, &label) in labels.iter().enumerate() {
        by_class.entry(label).or_default().push(index);
    }
    by_class
}

fn class_rng(seed: u64, label: usize) -> StdRng {
    StdRng::seed_from_u64(seed ^ label as u64)
}

/// Single stratified random partition. Per class, a seeded shuffle followed
/// by `round(class_count * test_size)` samples to validation, the rest to
/// training. Deterministic for a given seed and input order.
pub fn split_holdout(set: &SampleSet, test_size: f64, seed: u64) -> DatasetResult<FoldSplit> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(DatasetError::Config(format!(
            "test_size must lie in (0, 1), got {test_size}"
        )));
    }
    if set.is_empty() {
        return Err(DatasetError::Config(
            "cannot split an empty sample set".to_string(),
        ));
    }

    let mut train_idx = Vec::new();
    let mut val_idx = Vec::new();
    for (label, mut indices) in indices_by_class(&set.labels) {
        indices.shuffle(&mut class_rng(seed, label));
        let take = ((indices.len() as f64) * test_size).round() as usize;
        val_idx.extend_from_slice(&indices[..take]);
        train_idx.extend_from_slice(&indices[take..]);
    }
    train_idx.sort_unstable();
    val_idx.sort_unstable();
    Ok(FoldSplit {
        train: set.project(&train_idx),
        val: set.project(&val_idx),
    })
}

/// Stratified K-fold partitioning with seeded shuffling.
///
/// Each sample index lands in exactly one validation partition across the K
/// folds and in training for the other K-1. Classes smaller than `folds` are
/// rejected up front rather than producing empty strata.
pub fn split_kfold(set: &SampleSet, folds: usize, seed: u64) -> DatasetResult<Vec<FoldSplit>> {
    if folds < 2 {
        return Err(DatasetError::Config(format!(
            "k-fold splitting needs at least 2 folds, got {folds}"
        )));
    }
    if set.is_empty() {
        return Err(DatasetError::Config(
            "cannot split an empty sample set".to_string(),
        ));
    }

    let by_class = indices_by_class(&set.labels);
    for (&label, indices) in &by_class {
        if indices.len() < folds {
            return Err(DatasetError::InsufficientSamples {
                label,
                count: indices.len(),
                folds,
            });
        }
    }

    // Deal each class's shuffled indices round-robin over the folds so every
    // fold keeps roughly the global class proportions.
    let mut val_parts: Vec<Vec<usize>> = vec![Vec::new(); folds];
    for (label, mut indices) in by_class {
        indices.shuffle(&mut class_rng(seed, label));
        for (position, index) in indices.into_iter().enumerate() {
            val_parts[position % folds].push(index);
        }
    }

    let mut splits = Vec::with_capacity(folds);
    for fold in 0..folds {
        let mut val_idx = val_parts[fold].clone();
        let mut train_idx: Vec<usize> = val_parts
            .iter()
            .enumerate()
            .filter(|(other, _)| *other != fold)
            .flat_map(|(_, part)| part.iter().copied())
            .collect();
        val_idx.sort_unstable();
        train_idx.sort_unstable();
        splits.push(FoldSplit {
            train: set.project(&train_idx),
            val: set.project(&val_idx),
        });
    }
    Ok(splits)
}

/// Fold planning entry point: `folds == 1` is holdout mode and requires
/// `test_size`; `folds > 1` is stratified cross-validation.
pub fn plan_folds(
    set: &SampleSet,
    folds: usize,
    test_size: Option<f64>,
    seed: u64,
) -> DatasetResult<Vec<FoldSplit>> {
    match folds {
        0 => Err(DatasetError::Config(
            "folds must be at least 1".to_string(),
        )),
        1 => {
            let test_size = test_size.ok_or_else(|| {
                DatasetError::Config(
                    "test_size must be specified when folds equals 1".to_string(),
                )
            })?;
            Ok(vec![split_holdout(set, test_size, seed)?])
        }
        k => split_kfold(set, k, seed),
    }
}
