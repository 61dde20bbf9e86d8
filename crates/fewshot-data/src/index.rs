// ImageIndex: record table of every image file under a dataset root
//
// Walks a class-per-directory tree once and records, per image file:
//
//   subset | alphabet (Omniglot only) | class_name | filepath | id | class_id
//
// `id` is the position of the record (the sample index) and `class_id` the
// position of `class_name` among the sorted unique class names, so class ids
// always cover exactly [0, num_classes).
//
// Two directory conventions are supported:
//
//   root/<class>/<file>                    ClassNaming::Leaf
//   root/<alphabet>/<character>/<file>     ClassNaming::AlphabetCharacter
//                                          (class = "<alphabet>.<character>")

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Which half of a few-shot split a dataset represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subset {
    /// Classes used for meta-training.
    Background,
    /// Held-out classes used for evaluation.
    Evaluation,
}

impl Subset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Subset::Background => "background",
            Subset::Evaluation => "evaluation",
        }
    }
}

impl fmt::Display for Subset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Subset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "background" => Ok(Subset::Background),
            "evaluation" => Ok(Subset::Evaluation),
            other => Err(Error::InvalidSubset(other.to_string())),
        }
    }
}

/// How a class name is derived from an image's location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassNaming {
    /// The parent directory name is the class.
    Leaf,
    /// `<alphabet>.<character>` from the grandparent and parent directories.
    AlphabetCharacter,
}

impl ClassNaming {
    /// Depth below the root at which image files are expected.
    fn depth(&self) -> usize {
        match self {
            ClassNaming::Leaf => 2,
            ClassNaming::AlphabetCharacter => 3,
        }
    }

    /// `(alphabet, class_name)` for an image file.
    fn classify(&self, path: &Path) -> Option<(Option<String>, String)> {
        let parent = path.parent()?;
        let leaf = parent.file_name()?.to_str()?;
        match self {
            ClassNaming::Leaf => Some((None, leaf.to_string())),
            ClassNaming::AlphabetCharacter => {
                let alphabet = parent.parent()?.file_name()?.to_str()?;
                Some((Some(alphabet.to_string()), format!("{alphabet}.{leaf}")))
            }
        }
    }
}

/// Metadata for one indexed image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    pub subset: Subset,
    /// Alphabet directory, for datasets grouped by alphabet.
    pub alphabet: Option<String>,
    pub class_name: String,
    pub filepath: PathBuf,
    /// Sample index of this record.
    pub id: usize,
    /// Local class id in `[0, num_classes)`.
    pub class_id: usize,
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            extensions.iter().any(|x| *x == e)
        })
        .unwrap_or(false)
}

fn progress_bar(len: u64, show: bool, message: String) -> ProgressBar {
    if !show {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::with_template("{msg} [{elapsed_precise}] {wide_bar} {pos}/{len}")
    {
        pb.set_style(style.progress_chars("=> "));
    }
    pb.set_message(message);
    pb
}

/// Immutable record table for one dataset subset.
#[derive(Debug, Clone)]
pub struct ImageIndex {
    root: PathBuf,
    class_names: Vec<String>,
    records: Vec<ImageRecord>,
}

impl ImageIndex {
    /// Index every file under `root` whose extension is in `extensions`
    /// (lower-case, without the dot).
    ///
    /// Directories are visited in file-name order so sample ids are stable
    /// across runs and platforms.
    pub fn scan(
        root: &Path,
        subset: Subset,
        naming: ClassNaming,
        extensions: &[&str],
        show_progress: bool,
    ) -> Result<Self> {
        if !root.is_dir() {
            return Err(Error::NotADirectory(root.to_path_buf()));
        }

        // Quick first pass for the progress bar total
        let mut total = 0u64;
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
                total += 1;
            }
        }

        let pb = progress_bar(total, show_progress, format!("Indexing {subset}"));
        let mut records: Vec<ImageRecord> = Vec::with_capacity(total as usize);
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() || !has_extension(entry.path(), extensions) {
                continue;
            }
            let path = entry.path();
            let classified = if entry.depth() == naming.depth() {
                naming.classify(path)
            } else {
                None
            };
            let Some((alphabet, class_name)) = classified else {
                warn!(
                    "Skipping {} (expected {} directory level(s) below {})",
                    path.display(),
                    naming.depth() - 1,
                    root.display()
                );
                pb.inc(1);
                continue;
            };
            records.push(ImageRecord {
                subset,
                alphabet,
                class_name,
                filepath: path.to_path_buf(),
                id: records.len(),
                class_id: 0,
            });
            pb.inc(1);
        }
        pb.finish_and_clear();

        if records.is_empty() {
            return Err(Error::NoImages(root.to_path_buf()));
        }

        let class_names: Vec<String> = records
            .iter()
            .map(|r| r.class_name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        for record in &mut records {
            // Every name was collected above
            record.class_id = class_names
                .binary_search(&record.class_name)
                .unwrap_or_default();
        }

        info!(
            "Indexed {} images in {} classes from {} ({subset})",
            records.len(),
            class_names.len(),
            root.display()
        );

        Ok(Self {
            root: root.to_path_buf(),
            class_names,
            records,
        })
    }

    /// Directory the index was built from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn num_classes(&self) -> usize {
        self.class_names.len()
    }

    /// Sorted class names; position is the class id.
    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }

    pub fn records(&self) -> &[ImageRecord] {
        &self.records
    }

    pub fn record(&self, index: usize) -> Result<&ImageRecord> {
        self.records
            .get(index)
            .ok_or_else(|| Error::out_of_range(index, self.records.len()))
    }

    pub fn class_id(&self, index: usize) -> Result<usize> {
        self.record(index).map(|r| r.class_id)
    }

    pub fn path(&self, index: usize) -> Result<&Path> {
        self.record(index).map(|r| r.filepath.as_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn subset_parses_known_names_only() {
        assert_eq!("background".parse::<Subset>().unwrap(), Subset::Background);
        assert_eq!("evaluation".parse::<Subset>().unwrap(), Subset::Evaluation);
        assert!(matches!(
            "train".parse::<Subset>(),
            Err(Error::InvalidSubset(s)) if s == "train"
        ));
    }

    #[test]
    fn leaf_naming_sorts_classes() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("zebra/b.jpg"));
        touch(&dir.path().join("zebra/a.jpg"));
        touch(&dir.path().join("ant/c.jpg"));
        touch(&dir.path().join("ant/notes.txt"));

        let index = ImageIndex::scan(
            dir.path(),
            Subset::Evaluation,
            ClassNaming::Leaf,
            &["jpg"],
            false,
        )
        .unwrap();

        assert_eq!(index.len(), 3);
        assert_eq!(index.class_names(), &["ant".to_string(), "zebra".to_string()]);
        // Walk order is by file name: ant/c, zebra/a, zebra/b
        let ids: Vec<usize> = index.records().iter().map(|r| r.class_id).collect();
        assert_eq!(ids, vec![0, 1, 1]);
        assert!(index.path(1).unwrap().ends_with("zebra/a.jpg"));
        assert_eq!(index.record(2).unwrap().id, 2);
        assert!(matches!(
            index.class_id(3),
            Err(Error::OutOfRange { index: 3, len: 3 })
        ));
    }

    #[test]
    fn alphabet_naming_records_alphabet() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("Angelic/character02/x.png"));
        touch(&dir.path().join("Angelic/character01/y.png"));
        touch(&dir.path().join("stray.png"));

        let index = ImageIndex::scan(
            dir.path(),
            Subset::Background,
            ClassNaming::AlphabetCharacter,
            &["png"],
            false,
        )
        .unwrap();

        assert_eq!(index.len(), 2);
        assert_eq!(
            index.class_names(),
            &[
                "Angelic.character01".to_string(),
                "Angelic.character02".to_string()
            ]
        );
        let first = index.record(0).unwrap();
        assert_eq!(first.alphabet.as_deref(), Some("Angelic"));
        assert_eq!(first.subset, Subset::Background);
    }

    #[test]
    fn missing_root_and_empty_root_fail() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            ImageIndex::scan(&missing, Subset::Background, ClassNaming::Leaf, &["jpg"], false),
            Err(Error::NotADirectory(_))
        ));
        assert!(matches!(
            ImageIndex::scan(dir.path(), Subset::Background, ClassNaming::Leaf, &["jpg"], false),
            Err(Error::NoImages(_))
        ));
    }
}
