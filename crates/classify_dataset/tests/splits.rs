use classify_dataset::{
    plan_folds, split_holdout, split_kfold, DatasetError, SampleSet, Subset, SPLIT_SEED,
};
use std::collections::BTreeMap;

fn sample_set(per_class: &[usize]) -> SampleSet {
    let mut set = SampleSet::default();
    for (label, &count) in per_class.iter().enumerate() {
        for i in 0..count {
            set.samples.push(format!("class{label}/{i}.jpg"));
            set.labels.push(label);
        }
    }
    set
}

fn class_counts(subset: &Subset) -> BTreeMap<usize, usize> {
    let mut counts = BTreeMap::new();
    for &label in &subset.labels {
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}

#[test]
fn holdout_takes_a_rounded_fraction_per_class() {
    let set = sample_set(&[10, 5]);
    let split = split_holdout(&set, 0.2, SPLIT_SEED).unwrap();

    let val = class_counts(&split.val);
    // round(10 * 0.2) = 2, round(5 * 0.2) = 1
    assert_eq!(val[&0], 2);
    assert_eq!(val[&1], 1);
    assert_eq!(split.train.len() + split.val.len(), set.len());
}

#[test]
fn holdout_partitions_without_overlap() {
    let set = sample_set(&[8, 8, 8]);
    let split = split_holdout(&set, 0.25, SPLIT_SEED).unwrap();

    let mut all: Vec<&String> = split.train.samples.iter().chain(&split.val.samples).collect();
    all.sort();
    all.dedup();
    assert_eq!(all.len(), set.len());
}

#[test]
fn holdout_is_deterministic_for_a_seed() {
    let set = sample_set(&[20, 12]);
    let a = split_holdout(&set, 0.3, SPLIT_SEED).unwrap();
    let b = split_holdout(&set, 0.3, SPLIT_SEED).unwrap();
    assert_eq!(a, b);

    let c = split_holdout(&set, 0.3, SPLIT_SEED + 1).unwrap();
    assert_ne!(a.val.samples, c.val.samples);
}

#[test]
fn holdout_rejects_out_of_range_fractions() {
    let set = sample_set(&[4]);
    assert!(matches!(
        split_holdout(&set, 0.0, SPLIT_SEED),
        Err(DatasetError::Config(_))
    ));
    assert!(matches!(
        split_holdout(&set, 1.0, SPLIT_SEED),
        Err(DatasetError::Config(_))
    ));
}

#[test]
fn kfold_places_each_sample_in_exactly_one_val_fold() {
    let set = sample_set(&[9, 6]);
    let splits = split_kfold(&set, 3, SPLIT_SEED).unwrap();
    assert_eq!(splits.len(), 3);

    let mut val_samples: Vec<&String> = splits
        .iter()
        .flat_map(|s| s.val.samples.iter())
        .collect();
    val_samples.sort();
    val_samples.dedup();
    assert_eq!(val_samples.len(), set.len());

    for split in &splits {
        assert_eq!(split.train.len() + split.val.len(), set.len());
    }
}

#[test]
fn kfold_keeps_class_proportions_per_fold() {
    let set = sample_set(&[9, 3]);
    let splits = split_kfold(&set, 3, SPLIT_SEED).unwrap();

    for split in &splits {
        let val = class_counts(&split.val);
        assert_eq!(val[&0], 3);
        assert_eq!(val[&1], 1);
    }
}

#[test]
fn kfold_is_deterministic_for_a_seed() {
    let set = sample_set(&[12, 9]);
    let a = split_kfold(&set, 3, SPLIT_SEED).unwrap();
    let b = split_kfold(&set, 3, SPLIT_SEED).unwrap();
    assert_eq!(a, b);

    let c = split_kfold(&set, 3, SPLIT_SEED + 1).unwrap();
    assert_ne!(
        a.iter().map(|s| &s.val.samples).collect::<Vec<_>>(),
        c.iter().map(|s| &s.val.samples).collect::<Vec<_>>()
    );
}

#[test]
fn kfold_rejects_classes_smaller_than_the_fold_count() {
    let set = sample_set(&[10, 2]);
    match split_kfold(&set, 3, SPLIT_SEED) {
        Err(DatasetError::InsufficientSamples {
            label,
            count,
            folds,
        }) => {
            assert_eq!(label, 1);
            assert_eq!(count, 2);
            assert_eq!(folds, 3);
        }
        other => panic!("expected InsufficientSamples, got {other:?}"),
    }
}

#[test]
fn four_sample_holdout_keeps_one_of_each_class_per_side() {
    let set = SampleSet {
        samples: vec!["a.jpg".into(), "b.jpg".into(), "c.jpg".into(), "d.jpg".into()],
        labels: vec![0, 1, 0, 1],
    };
    let split = split_holdout(&set, 0.5, SPLIT_SEED).unwrap();

    assert_eq!(split.train.len(), 2);
    assert_eq!(split.val.len(), 2);
    for subset in [&split.train, &split.val] {
        let counts = class_counts(subset);
        assert_eq!(counts[&0], 1);
        assert_eq!(counts[&1], 1);
    }
}

#[test]
fn two_folds_over_four_samples_partition_validation_evenly() {
    let set = SampleSet {
        samples: vec!["a.jpg".into(), "b.jpg".into(), "c.jpg".into(), "d.jpg".into()],
        labels: vec![0, 1, 0, 1],
    };
    let splits = split_kfold(&set, 2, SPLIT_SEED).unwrap();
    assert_eq!(splits.len(), 2);

    let mut val_union: Vec<&String> = splits
        .iter()
        .flat_map(|s| s.val.samples.iter())
        .collect();
    assert_eq!(splits[0].val.len(), 2);
    assert_eq!(splits[1].val.len(), 2);
    val_union.sort();
    val_union.dedup();
    assert_eq!(val_union.len(), 4);
}

#[test]
fn plan_folds_dispatches_on_fold_count() {
    let set = sample_set(&[10, 10]);

    assert!(matches!(
        plan_folds(&set, 0, Some(0.2), SPLIT_SEED),
        Err(DatasetError::Config(_))
    ));
    assert!(matches!(
        plan_folds(&set, 1, None, SPLIT_SEED),
        Err(DatasetError::Config(_))
    ));
    assert_eq!(plan_folds(&set, 1, Some(0.2), SPLIT_SEED).unwrap().len(), 1);
    assert_eq!(plan_folds(&set, 5, None, SPLIT_SEED).unwrap().len(), 5);
}
