// MultiDataset: concatenate datasets into one index space and one label space
//
// Sub-datasets are laid end to end in construction order:
//
//   global index   [0 ........ L0)[L0 ....... L0+L1)[ ... )
//   global class   [0 ... C0)[C0 ... C0+C1)[ ... )
//
// Sub-dataset i's local class ids [0, Ci) become [offset_i, offset_i + Ci),
// so classes never collide even though every sub-dataset counts from 0.
// Both layouts are computed once in `MultiDataset::new` and never change.

use std::ops::Range;
use std::sync::Arc;

use log::{debug, info, warn};

use crate::dataset::{check_index, Dataset, Sample};
use crate::error::{Error, Result};

// IndexMapper: global index -> (sub-dataset, local index)

/// Maps a global index onto the sub-dataset that owns it.
#[derive(Debug, Clone)]
pub struct IndexMapper {
    lengths: Vec<usize>,
    /// Global index of each sub-dataset's first sample.
    starts: Vec<usize>,
    total: usize,
}

impl IndexMapper {
    pub fn new(lengths: Vec<usize>) -> Self {
        let mut starts = Vec::with_capacity(lengths.len());
        let mut total = 0;
        for &len in &lengths {
            starts.push(total);
            total += len;
        }
        Self {
            lengths,
            starts,
            total,
        }
    }

    /// Total number of samples across all sub-datasets.
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Locate which sub-dataset and local index a global index maps to.
    ///
    /// Walks the sub-datasets in order, subtracting each length until the
    /// residual falls inside one.
    pub fn resolve(&self, index: usize) -> Result<(usize, usize)> {
        let mut residual = index;
        for (ds_idx, &len) in self.lengths.iter().enumerate() {
            if residual < len {
                return Ok((ds_idx, residual));
            }
            residual -= len;
        }
        Err(Error::out_of_range(index, self.total))
    }

    /// Global index range covered by sub-dataset `dataset`.
    pub fn range(&self, dataset: usize) -> Option<Range<usize>> {
        let start = *self.starts.get(dataset)?;
        Some(start..start + self.lengths[dataset])
    }
}

// LabelMap: global index -> global class id

/// Precomputed global class id of every global index.
#[derive(Debug, Clone)]
pub struct LabelMap {
    labels: Vec<usize>,
    class_offsets: Vec<usize>,
    class_counts: Vec<usize>,
    num_classes: usize,
}

impl LabelMap {
    /// Read every sub-dataset's labels once and shift them into the shared
    /// label space.
    ///
    /// Fails with [`Error::Consistency`] if a sub-dataset reports a label
    /// outside `[0, num_classes)` or leaves a class in that range unused.
    /// An empty sub-dataset emits no labels; its class range is still
    /// reserved.
    pub fn build(datasets: &[Arc<dyn Dataset>]) -> Result<Self> {
        let total: usize = datasets.iter().map(|ds| ds.len()).sum();
        let mut labels = Vec::with_capacity(total);
        let mut class_offsets = Vec::with_capacity(datasets.len());
        let mut class_counts = Vec::with_capacity(datasets.len());
        let mut class_id_offset = 0;

        for (position, ds) in datasets.iter().enumerate() {
            let n = ds.num_classes();
            let inconsistent = |reason: String| Error::Consistency {
                position,
                dataset: ds.name().to_string(),
                reason,
            };

            let mut seen = vec![false; n];
            for local in 0..ds.len() {
                let class_id = ds.label(local)?;
                if class_id >= n {
                    return Err(inconsistent(format!(
                        "local class id {class_id} at index {local} is outside [0, {n})"
                    )));
                }
                seen[class_id] = true;
                labels.push(class_id + class_id_offset);
            }
            let missing = if ds.is_empty() {
                None
            } else {
                seen.iter().position(|&s| !s)
            };
            if let Some(missing) = missing {
                return Err(inconsistent(format!(
                    "class id {missing} in [0, {n}) is never used"
                )));
            }

            debug!(
                "sub-dataset {position} ({}): {} samples, classes {}..{}",
                ds.name(),
                ds.len(),
                class_id_offset,
                class_id_offset + n
            );
            class_offsets.push(class_id_offset);
            class_counts.push(n);
            class_id_offset += n;
        }

        Ok(Self {
            labels,
            class_offsets,
            class_counts,
            num_classes: class_id_offset,
        })
    }

    /// Global class id of `index`.
    pub fn get(&self, index: usize) -> Result<usize> {
        self.labels
            .get(index)
            .copied()
            .ok_or_else(|| Error::out_of_range(index, self.labels.len()))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Total number of global classes.
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// First global class id of each sub-dataset.
    pub fn class_offsets(&self) -> &[usize] {
        &self.class_offsets
    }

    /// Global class ids owned by sub-dataset `dataset`.
    pub fn class_range(&self, dataset: usize) -> Option<Range<usize>> {
        let start = *self.class_offsets.get(dataset)?;
        Some(start..start + self.class_counts[dataset])
    }

    /// Global class id of local class `local_class` of sub-dataset `dataset`.
    pub fn to_global(&self, dataset: usize, local_class: usize) -> Option<usize> {
        let range = self.class_range(dataset)?;
        let global = range.start + local_class;
        range.contains(&global).then_some(global)
    }
}

// MultiDataset

/// Several datasets presented as one, with disjoint global class ids.
///
/// `MultiDataset` is itself a [`Dataset`], so composites nest.
///
/// ```ignore
/// let evaluation = MultiDataset::new(vec![
///     Arc::new(meta::load(&config, Subset::Evaluation, MetaTarget::CubBird)?),
///     Arc::new(meta::load(&config, Subset::Evaluation, MetaTarget::DtdTexture)?),
/// ])?;
/// let sample = evaluation.get(1000)?;
/// ```
pub struct MultiDataset {
    datasets: Vec<Arc<dyn Dataset>>,
    mapper: IndexMapper,
    labels: LabelMap,
}

impl MultiDataset {
    /// Compose `datasets` in the given order.
    ///
    /// Every sub-dataset's labels are read once here; later lookups never
    /// consult them again.
    pub fn new(datasets: Vec<Arc<dyn Dataset>>) -> Result<Self> {
        let mapper = IndexMapper::new(datasets.iter().map(|ds| ds.len()).collect());
        let labels = LabelMap::build(&datasets)?;

        if mapper.is_empty() {
            warn!(
                "MultiDataset built from {} sub-dataset(s) with no samples",
                datasets.len()
            );
        }
        info!(
            "MultiDataset: {} sub-datasets, {} samples, {} classes",
            datasets.len(),
            mapper.len(),
            labels.num_classes()
        );

        Ok(Self {
            datasets,
            mapper,
            labels,
        })
    }

    /// Sub-dataset position and local index of a global index.
    pub fn resolve(&self, index: usize) -> Result<(usize, usize)> {
        self.mapper.resolve(index)
    }

    pub fn datasets(&self) -> &[Arc<dyn Dataset>] {
        &self.datasets
    }

    pub fn index_mapper(&self) -> &IndexMapper {
        &self.mapper
    }

    pub fn label_map(&self) -> &LabelMap {
        &self.labels
    }
}

impl Dataset for MultiDataset {
    fn len(&self) -> usize {
        self.mapper.len()
    }

    fn get(&self, index: usize) -> Result<Sample> {
        check_index(index, self.len())?;
        let (ds_idx, local_idx) = self.mapper.resolve(index)?;
        let mut sample = self.datasets[ds_idx].get(local_idx)?;
        // The sub-dataset's own label is local; replace it with the global one
        sample.label = self.labels.get(index)?;
        Ok(sample)
    }

    fn num_classes(&self) -> usize {
        self.labels.num_classes()
    }

    fn label(&self, index: usize) -> Result<usize> {
        self.labels.get(index)
    }

    fn name(&self) -> &str {
        "multi"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tiny helper dataset: sample `i` has feature `i` and label `i % classes`.
    struct TinyDataset {
        n: usize,
        classes: usize,
    }

    impl Dataset for TinyDataset {
        fn len(&self) -> usize {
            self.n
        }
        fn get(&self, idx: usize) -> Result<Sample> {
            check_index(idx, self.n)?;
            Ok(Sample {
                features: vec![idx as f64],
                feature_shape: vec![1],
                label: idx % self.classes,
            })
        }
        fn num_classes(&self) -> usize {
            self.classes
        }
    }

    /// Reports `classes` but emits the given labels verbatim.
    struct Mislabelled {
        labels: Vec<usize>,
        classes: usize,
    }

    impl Dataset for Mislabelled {
        fn len(&self) -> usize {
            self.labels.len()
        }
        fn get(&self, idx: usize) -> Result<Sample> {
            check_index(idx, self.labels.len())?;
            Ok(Sample {
                features: vec![],
                feature_shape: vec![0],
                label: self.labels[idx],
            })
        }
        fn num_classes(&self) -> usize {
            self.classes
        }
        fn name(&self) -> &str {
            "mislabelled"
        }
    }

    fn tiny(n: usize, classes: usize) -> Arc<dyn Dataset> {
        Arc::new(TinyDataset { n, classes })
    }

    fn three_way() -> MultiDataset {
        MultiDataset::new(vec![tiny(3, 2), tiny(5, 3), tiny(2, 1)]).unwrap()
    }

    #[test]
    fn resolve_boundaries() {
        let multi = three_way();
        assert_eq!(multi.len(), 10);
        assert_eq!(multi.resolve(0).unwrap(), (0, 0));
        assert_eq!(multi.resolve(2).unwrap(), (0, 2));
        assert_eq!(multi.resolve(3).unwrap(), (1, 0));
        assert_eq!(multi.resolve(7).unwrap(), (1, 4));
        assert_eq!(multi.resolve(8).unwrap(), (2, 0));
        assert_eq!(multi.resolve(9).unwrap(), (2, 1));
        assert!(matches!(
            multi.resolve(10),
            Err(Error::OutOfRange { index: 10, len: 10 })
        ));
        assert!(matches!(
            multi.get(10),
            Err(Error::OutOfRange { index: 10, len: 10 })
        ));
    }

    #[test]
    fn label_offsets() {
        let multi = three_way();
        let map = multi.label_map();
        assert_eq!(map.class_offsets(), &[0, 2, 5]);
        assert_eq!(map.to_global(1, 0), Some(2));
        assert_eq!(map.to_global(1, 2), Some(4));
        assert_eq!(map.to_global(2, 0), Some(5));
        assert_eq!(map.to_global(2, 1), None);

        // Global index 3 is sub-dataset 1, local 0, local class 0
        assert_eq!(multi.get(3).unwrap().label, 2);
        // Global index 5 is sub-dataset 1, local 2, local class 2
        assert_eq!(multi.get(5).unwrap().label, 4);
        // Global index 8 is sub-dataset 2, local 0, local class 0
        assert_eq!(multi.get(8).unwrap().label, 5);
    }

    #[test]
    fn num_classes_is_the_sum() {
        let multi = three_way();
        assert_eq!(multi.num_classes(), 2 + 3 + 1);
    }

    #[test]
    fn get_keeps_instance_and_replaces_label() {
        let multi = three_way();
        let s = multi.get(7).unwrap();
        assert_eq!(s.features, vec![4.0]);
        assert_eq!(s.label, 2 + 4 % 3);
        assert_eq!(multi.label(7).unwrap(), s.label);
    }

    #[test]
    fn ranges_partition_index_space() {
        let mapper = IndexMapper::new(vec![3, 0, 5, 2]);
        assert_eq!(mapper.range(0), Some(0..3));
        assert_eq!(mapper.range(1), Some(3..3));
        assert_eq!(mapper.range(2), Some(3..8));
        assert_eq!(mapper.range(3), Some(8..10));
        assert_eq!(mapper.range(4), None);
        // Empty sub-datasets are skipped over
        assert_eq!(mapper.resolve(3).unwrap(), (2, 0));
    }

    #[test]
    fn empty_composition() {
        let multi = MultiDataset::new(Vec::new()).unwrap();
        assert_eq!(multi.len(), 0);
        assert!(multi.is_empty());
        assert_eq!(multi.num_classes(), 0);
        assert!(matches!(
            multi.get(0),
            Err(Error::OutOfRange { index: 0, len: 0 })
        ));
    }

    #[test]
    fn label_out_of_declared_range_is_rejected() {
        let bad: Arc<dyn Dataset> = Arc::new(Mislabelled {
            labels: vec![0, 1, 2],
            classes: 2,
        });
        let err = MultiDataset::new(vec![tiny(4, 2), bad]).err().unwrap();
        assert!(matches!(
            err,
            Error::Consistency { position: 1, ref dataset, .. } if dataset == "mislabelled"
        ));
    }

    #[test]
    fn empty_sub_dataset_reserves_its_classes() {
        let multi = MultiDataset::new(vec![tiny(2, 1), tiny(0, 3), tiny(3, 3)]).unwrap();
        assert_eq!(multi.len(), 5);
        assert_eq!(multi.num_classes(), 1 + 3 + 3);
        assert_eq!(multi.label_map().class_range(1), Some(1..4));
        // First sample of the third sub-dataset lands after the reserved range
        assert_eq!(multi.get(2).unwrap().label, 4);
    }

    #[test]
    fn gap_in_labels_is_rejected() {
        let bad: Arc<dyn Dataset> = Arc::new(Mislabelled {
            labels: vec![1, 1, 2],
            classes: 3,
        });
        assert!(matches!(
            MultiDataset::new(vec![bad]),
            Err(Error::Consistency { position: 0, .. })
        ));
    }
}
