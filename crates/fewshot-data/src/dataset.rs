// Dataset trait: unified "index -> (instance, label)" interface

use rayon::prelude::*;

use crate::error::{Error, Result};

/// A single sample: an instance tensor plus its class id.
///
/// Features are stored flattened as `Vec<f64>` together with their shape so
/// they can be batched into tensors later.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Instance values (flattened).
    pub features: Vec<f64>,
    /// Shape of the instance tensor (e.g. `[1, 28, 28]` for Omniglot, `[3, 84, 84]`
    /// for miniImageNet).
    pub feature_shape: Vec<usize>,
    /// Class id in the label space of the dataset that produced the sample.
    pub label: usize,
}

/// A dataset is an indexed collection of labelled samples.
///
/// Valid indices are the contiguous range `[0, len())`, and the labels a
/// dataset reports must cover exactly `[0, num_classes())`. Composites such as
/// [`MultiDataset`](crate::MultiDataset) rely on that contract to lay
/// sub-datasets side by side in a shared label space.
///
/// Implementations must be `Send + Sync` so samples can be fetched from
/// several threads at once.
pub trait Dataset: Send + Sync {
    /// Total number of samples in the dataset.
    fn len(&self) -> usize;

    /// Whether the dataset is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Retrieve the sample at position `index`.
    ///
    /// Fails with [`Error::OutOfRange`] if `index >= self.len()`.
    fn get(&self, index: usize) -> Result<Sample>;

    /// Number of distinct classes.
    fn num_classes(&self) -> usize;

    /// Class id of the sample at `index`.
    ///
    /// The default decodes the full sample; datasets that keep an index of
    /// their labels should override this with a lookup.
    fn label(&self, index: usize) -> Result<usize> {
        self.get(index).map(|s| s.label)
    }

    /// Optional human-readable name.
    fn name(&self) -> &str {
        "dataset"
    }
}

/// Return `Ok(())` if `index` addresses a sample of a dataset of length `len`.
pub(crate) fn check_index(index: usize, len: usize) -> Result<()> {
    if index < len {
        Ok(())
    } else {
        Err(Error::out_of_range(index, len))
    }
}

/// Fetch many samples at once on the rayon thread pool.
///
/// Samples are returned in the order of `indices`. The first error
/// encountered is returned and the remaining results are dropped.
pub fn fetch_parallel(dataset: &dyn Dataset, indices: &[usize]) -> Result<Vec<Sample>> {
    if indices.len() > 1 {
        indices.par_iter().map(|&i| dataset.get(i)).collect()
    } else {
        indices.iter().map(|&i| dataset.get(i)).collect()
    }
}
