//! Classifier model and the narrow capability interface the trainer sees.

use burn::module::Module;
use burn::nn;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig};
use burn::nn::PaddingConfig2d;
use burn::tensor::activation::{relu, softmax};
use burn::tensor::backend::Backend;
use burn::tensor::{ElementConversion, Int, Tensor};

/// A batch of images in, class logits out. The trainer depends on nothing
/// else about the model.
pub trait Classifier<B: Backend> {
    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2>;
}

#[derive(Debug, Clone)]
pub struct ConvClassifierConfig {
    pub num_classes: usize,
    pub channels: usize,
    pub hidden: usize,
}

impl Default for ConvClassifierConfig {
    fn default() -> Self {
        Self {
            num_classes: 2,
            channels: 16,
            hidden: 64,
        }
    }
}

/// Compact convolutional classifier: three conv/relu stages with pooling,
/// global average pooling, and a two-layer head.
#[derive(Debug, Module)]
pub struct ConvClassifier<B: Backend> {
    conv1: Conv2d<B>,
    conv2: Conv2d<B>,
    conv3: Conv2d<B>,
    pool: MaxPool2d,
    global_pool: AdaptiveAvgPool2d,
    head1: nn::Linear<B>,
    head2: nn::Linear<B>,
}

impl<B: Backend> ConvClassifier<B> {
    pub fn new(cfg: ConvClassifierConfig, device: &B::Device) -> Self {
        let c = cfg.channels.max(1);
        let conv1 = Conv2dConfig::new([3, c], [3, 3])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);
        let conv2 = Conv2dConfig::new([c, 2 * c], [3, 3])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);
        let conv3 = Conv2dConfig::new([2 * c, 2 * c], [3, 3])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);
        let pool = MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init();
        let global_pool = AdaptiveAvgPool2dConfig::new([1, 1]).init();
        let head1 = nn::LinearConfig::new(2 * c, cfg.hidden).init(device);
        let head2 = nn::LinearConfig::new(cfg.hidden, cfg.num_classes).init(device);
        Self {
            conv1,
            conv2,
            conv3,
            pool,
            global_pool,
            head1,
            head2,
        }
    }
}

impl<B: Backend> Classifier<B> for ConvClassifier<B> {
    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.pool.forward(relu(self.conv1.forward(images)));
        let x = self.pool.forward(relu(self.conv2.forward(x)));
        let x = relu(self.conv3.forward(x));
        let x = self.global_pool.forward(x);
        let [n, c, _, _] = x.dims();
        let x = x.reshape([n, c]);
        let x = relu(self.head1.forward(x));
        self.head2.forward(x)
    }
}

/// Number of argmax predictions matching the targets.
pub fn correct_count<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> usize {
    let n = logits.dims()[0];
    logits
        .argmax(1)
        .reshape([n])
        .equal(targets)
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>() as usize
}

/// Predicted class labels: softmax over the class axis, then argmax.
pub fn predict_labels<B: Backend>(logits: Tensor<B, 2>) -> Vec<i64> {
    let n = logits.dims()[0];
    softmax(logits, 1)
        .argmax(1)
        .reshape([n])
        .into_data()
        .iter::<i64>()
        .collect()
}
