use std::path::PathBuf;

/// All errors that can occur within fewshot-data.
///
/// A single error type covers indexing, decoding, and composition so that
/// datasets can be nested behind `dyn Dataset` without juggling error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Index outside `[0, len)` of the dataset it was addressed to.
    #[error("index out of range: index {index}, dataset length {len}")]
    OutOfRange { index: usize, len: usize },

    /// A sub-dataset's labels do not cover exactly `[0, num_classes)`.
    #[error("inconsistent labels in sub-dataset {position} ({dataset}): {reason}")]
    Consistency {
        position: usize,
        dataset: String,
        reason: String,
    },

    /// Subset name other than `background` / `evaluation`.
    #[error("subset must be one of (background, evaluation), got {0:?}")]
    InvalidSubset(String),

    /// Unknown meta-dataset target.
    #[error(
        "target must be one of (CUB_Bird, DTD_Texture, FGVC_Aircraft, FGVCx_Fungi), got {0:?}"
    )]
    InvalidTarget(String),

    /// The dataset root is not a directory.
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// The dataset root contains no image files.
    #[error("no image files found in {}", .0.display())]
    NoImages(PathBuf),

    /// Image decoding failed.
    #[error("failed to decode {}: {reason}", .path.display())]
    ImageDecode { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Walk(#[from] walkdir::Error),
}

impl Error {
    pub(crate) fn out_of_range(index: usize, len: usize) -> Self {
        Error::OutOfRange { index, len }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
