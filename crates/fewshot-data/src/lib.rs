//! # fewshot-data
//!
//! Indexed image-classification datasets for few-shot learning.
//!
//! This crate provides:
//! - [`Dataset`] trait: uniform "index -> (instance, class id)" contract
//! - [`MultiDataset`]: concatenation of datasets into one index space with
//!   disjoint global class ids
//! - [`ImageFolder`]: file-backed datasets built from an [`ImageIndex`]
//!   and an [`ImagePipeline`]
//   - Omniglot, miniImageNet and Meta-Dataset directory layouts
//   - DummyDataset for debugging
//   - fetch_parallel: rayon fan-out of many `get` calls

pub mod config;
pub mod dataset;
pub mod dummy;
pub mod error;
pub mod image_folder;
pub mod index;
pub mod meta;
pub mod mini_imagenet;
pub mod multi;
pub mod omniglot;
pub mod transform;

pub use config::DataConfig;
pub use dataset::{fetch_parallel, Dataset, Sample};
pub use dummy::DummyDataset;
pub use error::{Error, Result};
pub use image_folder::{ColorMode, ImageFolder, ImagePipeline};
pub use index::{ClassNaming, ImageIndex, ImageRecord, Subset};
pub use meta::MetaTarget;
pub use multi::{IndexMapper, LabelMap, MultiDataset};
pub use transform::{ChannelNormalize, Compose, MinMaxScale, Transform};
