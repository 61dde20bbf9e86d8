// DummyDataset: synthetic dataset for debugging and tests

use crate::dataset::{check_index, Dataset, Sample};
use crate::error::Result;

/// A dataset whose samples encode their own position.
///
/// Sample `i` belongs to class `i % n_classes` and has `1 + n_features`
/// features: the index itself followed by `n_features` copies of the class id.
#[derive(Debug, Clone)]
pub struct DummyDataset {
    samples_per_class: usize,
    n_classes: usize,
    n_features: usize,
}

impl DummyDataset {
    pub fn new(samples_per_class: usize, n_classes: usize, n_features: usize) -> Self {
        Self {
            samples_per_class,
            n_classes,
            n_features,
        }
    }
}

impl Default for DummyDataset {
    fn default() -> Self {
        Self::new(10, 10, 1)
    }
}

impl Dataset for DummyDataset {
    fn len(&self) -> usize {
        self.samples_per_class * self.n_classes
    }

    fn get(&self, index: usize) -> Result<Sample> {
        let class_id = self.label(index)?;
        let mut features = Vec::with_capacity(1 + self.n_features);
        features.push(index as f64);
        features.extend(std::iter::repeat(class_id as f64).take(self.n_features));
        Ok(Sample {
            features,
            feature_shape: vec![1 + self.n_features],
            label: class_id,
        })
    }

    fn num_classes(&self) -> usize {
        self.n_classes
    }

    fn label(&self, index: usize) -> Result<usize> {
        check_index(index, self.len())?;
        Ok(index % self.n_classes)
    }

    fn name(&self) -> &str {
        "dummy"
    }
}
