// Meta-Dataset domains: CUB birds, DTD textures, FGVC aircraft, FGVCx fungi
//
//   {data_path}/meta-dataset/{target}/{train|val}/
//     014.Indigo_Bunting/
//       Indigo_Bunting_0001_12469.jpg
//
// The background subset reads `train/`, the evaluation subset `val/`.
// Samples are resized to 84 on the shorter edge and scaled to [0, 1].

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::config::DataConfig;
use crate::error::{Error, Result};
use crate::image_folder::{ColorMode, ImageFolder, ImagePipeline};
use crate::index::{ClassNaming, ImageIndex, Subset};

/// Which Meta-Dataset domain to index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaTarget {
    CubBird,
    DtdTexture,
    FgvcAircraft,
    FgvcxFungi,
}

impl MetaTarget {
    pub const ALL: [MetaTarget; 4] = [
        MetaTarget::CubBird,
        MetaTarget::DtdTexture,
        MetaTarget::FgvcAircraft,
        MetaTarget::FgvcxFungi,
    ];

    /// Directory name under `meta-dataset/`.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetaTarget::CubBird => "CUB_Bird",
            MetaTarget::DtdTexture => "DTD_Texture",
            MetaTarget::FgvcAircraft => "FGVC_Aircraft",
            MetaTarget::FgvcxFungi => "FGVCx_Fungi",
        }
    }
}

impl fmt::Display for MetaTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetaTarget {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        MetaTarget::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::InvalidTarget(s.to_string()))
    }
}

fn split_dir(subset: Subset) -> &'static str {
    match subset {
        Subset::Background => "train",
        Subset::Evaluation => "val",
    }
}

/// Root directory of one domain's subset.
pub fn root(config: &DataConfig, subset: Subset, target: MetaTarget) -> PathBuf {
    config
        .data_path
        .join("meta-dataset")
        .join(target.as_str())
        .join(split_dir(subset))
}

pub fn pipeline() -> ImagePipeline {
    ImagePipeline::new(ColorMode::Rgb).resize(84)
}

/// Index one Meta-Dataset domain.
pub fn load(config: &DataConfig, subset: Subset, target: MetaTarget) -> Result<ImageFolder> {
    let index = ImageIndex::scan(
        &root(config, subset, target),
        subset,
        ClassNaming::Leaf,
        &["jpg"],
        config.show_progress,
    )?;
    Ok(ImageFolder::new(format!("{target}-{subset}"), index, pipeline()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_round_trips_directory_names() {
        for t in MetaTarget::ALL {
            assert_eq!(t.as_str().parse::<MetaTarget>().unwrap(), t);
        }
        assert!(matches!(
            "ImageNet".parse::<MetaTarget>(),
            Err(Error::InvalidTarget(s)) if s == "ImageNet"
        ));
    }

    #[test]
    fn evaluation_reads_val_split() {
        let config = DataConfig::default().data_path("/d");
        assert_eq!(
            root(&config, Subset::Evaluation, MetaTarget::FgvcAircraft),
            PathBuf::from("/d/meta-dataset/FGVC_Aircraft/val")
        );
        assert_eq!(
            root(&config, Subset::Background, MetaTarget::CubBird),
            PathBuf::from("/d/meta-dataset/CUB_Bird/train")
        );
    }
}
