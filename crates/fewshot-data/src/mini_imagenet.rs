// miniImageNet: 100 ImageNet classes split for few-shot learning
//
//   {data_path}/miniImageNet/images_{background|evaluation}/
//     n01770081/
//       00001098.jpg
//
// Samples are center-cropped to 224, resized to 84 on the shorter edge and
// normalised with ImageNet channel statistics: [3, 84, 84].

use std::path::PathBuf;

use crate::config::DataConfig;
use crate::error::Result;
use crate::image_folder::{ColorMode, ImageFolder, ImagePipeline};
use crate::index::{ClassNaming, ImageIndex, Subset};
use crate::transform::ChannelNormalize;

/// Root directory of one miniImageNet subset.
pub fn root(config: &DataConfig, subset: Subset) -> PathBuf {
    config
        .data_path
        .join("miniImageNet")
        .join(format!("images_{subset}"))
}

pub fn pipeline() -> ImagePipeline {
    ImagePipeline::new(ColorMode::Rgb)
        .center_crop(224)
        .resize(84)
        .with_transform(Box::new(ChannelNormalize::imagenet()))
}

/// Index a miniImageNet subset.
pub fn load(config: &DataConfig, subset: Subset) -> Result<ImageFolder> {
    let index = ImageIndex::scan(
        &root(config, subset),
        subset,
        ClassNaming::Leaf,
        &["jpg"],
        config.show_progress,
    )?;
    Ok(ImageFolder::new(
        format!("miniImageNet-{subset}"),
        index,
        pipeline(),
    ))
}
