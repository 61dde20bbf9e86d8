// DataConfig: where the dataset trees live and how indexing reports progress

use std::path::{Path, PathBuf};

/// Environment variable overriding [`DataConfig::data_path`].
pub const DATA_PATH_ENV: &str = "FEWSHOT_DATA_PATH";

/// Shared settings for the on-disk datasets.
///
/// `data_path` is the directory holding `Omniglot_enriched/`, `miniImageNet/`
/// and `meta-dataset/`.
#[derive(Debug, Clone)]
pub struct DataConfig {
    /// Root directory of all datasets.
    pub data_path: PathBuf,
    /// Draw a progress bar while indexing.
    pub show_progress: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data"),
            show_progress: true,
        }
    }
}

impl DataConfig {
    /// Defaults, with `data_path` taken from `FEWSHOT_DATA_PATH` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(path) = std::env::var_os(DATA_PATH_ENV) {
            config.data_path = PathBuf::from(path);
        }
        config
    }

    pub fn data_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.data_path = path.as_ref().to_path_buf();
        self
    }

    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }
}
