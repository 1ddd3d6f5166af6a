use classify_dataset::{
    DataLoader, DatasetError, DatasetResult, ImageDataset, LoaderConfig, ProcessedImage,
};

type B = burn_ndarray::NdArray<f32>;

/// In-memory dataset whose label equals its index, so target tensors reveal
/// the iteration order.
struct Synthetic {
    len: usize,
}

impl ImageDataset for Synthetic {
    fn len(&self) -> usize {
        self.len
    }

    fn get(&self, index: usize) -> DatasetResult<ProcessedImage> {
        Ok(ProcessedImage {
            chw: vec![index as f32; 3 * 2 * 2],
            width: 2,
            height: 2,
            label: index,
        })
    }
}

fn collect_targets(loader: &DataLoader<Synthetic>, epoch: usize) -> Vec<i64> {
    let device = Default::default();
    let mut order = Vec::new();
    let mut iter = loader.epoch_iter(epoch);
    while let Some(batch) = iter.next_batch::<B>(&device).unwrap() {
        order.extend(batch.targets.into_data().iter::<i64>());
    }
    order
}

#[test]
fn batches_cover_the_dataset_with_a_short_tail() {
    let loader = DataLoader::new(
        Synthetic { len: 7 },
        LoaderConfig {
            batch_size: 3,
            ..LoaderConfig::default()
        },
    )
    .unwrap();
    assert_eq!(loader.num_batches(), 3);

    let device = Default::default();
    let mut iter = loader.epoch_iter(0);
    let sizes: Vec<usize> = std::iter::from_fn(|| {
        iter.next_batch::<B>(&device)
            .unwrap()
            .map(|b| b.targets.dims()[0])
    })
    .collect();
    assert_eq!(sizes, vec![3, 3, 1]);
}

#[test]
fn batch_tensors_have_nchw_shape() {
    let loader = DataLoader::new(
        Synthetic { len: 4 },
        LoaderConfig {
            batch_size: 4,
            ..LoaderConfig::default()
        },
    )
    .unwrap();

    let device = Default::default();
    let batch = loader.epoch_iter(0).next_batch::<B>(&device).unwrap().unwrap();
    assert_eq!(batch.images.dims(), [4, 3, 2, 2]);
    assert_eq!(batch.targets.dims(), [4]);
}

#[test]
fn unshuffled_iteration_preserves_dataset_order() {
    let loader = DataLoader::new(
        Synthetic { len: 6 },
        LoaderConfig {
            batch_size: 4,
            ..LoaderConfig::default()
        },
    )
    .unwrap();
    assert_eq!(collect_targets(&loader, 0), vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(collect_targets(&loader, 1), vec![0, 1, 2, 3, 4, 5]);
}

#[test]
fn shuffled_iteration_is_seeded_per_epoch() {
    let loader = DataLoader::new(
        Synthetic { len: 32 },
        LoaderConfig {
            batch_size: 8,
            shuffle: true,
            seed: Some(69),
            ..LoaderConfig::default()
        },
    )
    .unwrap();

    let epoch0 = collect_targets(&loader, 0);
    assert_eq!(epoch0, collect_targets(&loader, 0));
    assert_ne!(epoch0, collect_targets(&loader, 1));

    let mut sorted = epoch0.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, (0..32).collect::<Vec<i64>>());
}

/// Every odd index reports a different image size.
struct MixedSizes {
    len: usize,
}

impl ImageDataset for MixedSizes {
    fn len(&self) -> usize {
        self.len
    }

    fn get(&self, index: usize) -> DatasetResult<ProcessedImage> {
        let side = if index % 2 == 0 { 2 } else { 4 };
        Ok(ProcessedImage {
            chw: vec![0.0; 3 * side * side],
            width: side as u32,
            height: side as u32,
            label: index,
        })
    }
}

#[test]
fn varying_image_sizes_within_a_batch_fail() {
    let loader = DataLoader::new(
        MixedSizes { len: 4 },
        LoaderConfig {
            batch_size: 4,
            ..LoaderConfig::default()
        },
    )
    .unwrap();

    let device = Default::default();
    let result = loader.epoch_iter(0).next_batch::<B>(&device);
    assert!(matches!(result, Err(DatasetError::Config(_))));
}

#[test]
fn zero_batch_size_is_rejected() {
    let result = DataLoader::new(
        Synthetic { len: 4 },
        LoaderConfig {
            batch_size: 0,
            ..LoaderConfig::default()
        },
    );
    assert!(matches!(result, Err(DatasetError::Config(_))));
}
