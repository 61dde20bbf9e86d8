// Transform: per-sample preprocessing applied after an image is tensorised

use crate::dataset::Sample;

/// A transform applied to each decoded sample.
pub trait Transform: Send + Sync {
    /// Apply the transform to a sample, returning the modified sample.
    fn apply(&self, sample: Sample) -> Sample;
}

// Built-in transforms

/// Rescale features to [0, 1] using the sample's own minimum and maximum.
///
/// A constant sample (max == min) maps to all zeros.
#[derive(Debug, Clone, Default)]
pub struct MinMaxScale;

impl Transform for MinMaxScale {
    fn apply(&self, mut sample: Sample) -> Sample {
        let (min, max) = sample
            .features
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        let range = max - min;
        for v in &mut sample.features {
            *v = if range > 0.0 { (*v - min) / range } else { 0.0 };
        }
        sample
    }
}

/// Standardize each channel of a `[C, H, W]` sample with its own mean and std.
#[derive(Debug, Clone)]
pub struct ChannelNormalize {
    mean: Vec<f64>,
    std: Vec<f64>,
}

impl ChannelNormalize {
    pub fn new(mean: &[f64], std: &[f64]) -> Self {
        assert!(
            !mean.is_empty(),
            "ChannelNormalize: need statistics for at least one channel"
        );
        assert_eq!(
            mean.len(),
            std.len(),
            "ChannelNormalize: mean and std must have one entry per channel"
        );
        Self {
            mean: mean.to_vec(),
            std: std.to_vec(),
        }
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn std(&self) -> &[f64] {
        &self.std
    }

    /// Statistics of the ImageNet training set.
    pub fn imagenet() -> Self {
        Self::new(&[0.485, 0.456, 0.406], &[0.229, 0.224, 0.225])
    }
}

impl Transform for ChannelNormalize {
    fn apply(&self, mut sample: Sample) -> Sample {
        let channels = sample.feature_shape.first().copied().unwrap_or(1).max(1);
        let plane = sample.features.len() / channels;
        for (c, chunk) in sample.features.chunks_mut(plane.max(1)).enumerate() {
            let k = c % self.mean.len();
            for v in chunk {
                *v = (*v - self.mean[k]) / self.std[k];
            }
        }
        sample
    }
}

/// Chain multiple transforms.
pub struct Compose {
    transforms: Vec<Box<dyn Transform>>,
}

impl Compose {
    pub fn new(transforms: Vec<Box<dyn Transform>>) -> Self {
        Self { transforms }
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

impl Transform for Compose {
    fn apply(&self, mut sample: Sample) -> Sample {
        for t in &self.transforms {
            sample = t.apply(sample);
        }
        sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(features: Vec<f64>, shape: Vec<usize>) -> Sample {
        Sample {
            features,
            feature_shape: shape,
            label: 4,
        }
    }

    #[test]
    fn min_max_scales_to_unit_range() {
        let out = MinMaxScale.apply(sample(vec![10.0, 20.0, 30.0], vec![1, 1, 3]));
        assert_eq!(out.features, vec![0.0, 0.5, 1.0]);
        assert_eq!(out.label, 4);
    }

    #[test]
    fn min_max_constant_sample_is_zero() {
        let out = MinMaxScale.apply(sample(vec![7.0; 4], vec![1, 2, 2]));
        assert_eq!(out.features, vec![0.0; 4]);
    }

    #[test]
    fn channel_normalize_uses_per_channel_stats() {
        let t = ChannelNormalize::new(&[0.5, 1.0], &[0.5, 2.0]);
        let out = t.apply(sample(vec![0.5, 1.0, 1.0, 3.0], vec![2, 1, 2]));
        assert_eq!(out.features, vec![0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn channel_normalize_exposes_stats_read_only() {
        let t = ChannelNormalize::imagenet();
        assert_eq!(t.mean(), &[0.485, 0.456, 0.406]);
        assert_eq!(t.std(), &[0.229, 0.224, 0.225]);
    }

    #[test]
    #[should_panic(expected = "one entry per channel")]
    fn channel_normalize_rejects_mismatched_stats() {
        ChannelNormalize::new(&[0.5, 0.5], &[0.5]);
    }

    #[test]
    #[should_panic(expected = "at least one channel")]
    fn channel_normalize_rejects_empty_stats() {
        ChannelNormalize::new(&[], &[]);
    }

    #[test]
    fn compose_runs_in_order() {
        let t = Compose::new(vec![
            Box::new(MinMaxScale),
            Box::new(ChannelNormalize::new(&[0.5], &[0.5])),
        ]);
        let out = t.apply(sample(vec![0.0, 2.0], vec![1, 1, 2]));
        assert_eq!(out.features, vec![-1.0, 1.0]);
    }
}
