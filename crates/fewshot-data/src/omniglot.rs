// Omniglot: handwritten characters grouped by alphabet
//
//   {data_path}/Omniglot_enriched/images_{background|evaluation}/
//     Angelic.0/
//       character01/
//         0965_01.png
//
// Classes are "<alphabet>.<character>". By default samples are grayscale
// [1, H, W] min-max scaled per image. When Omniglot serves as an
// out-of-distribution test set for RGB models (`ood_test`), samples are
// converted to RGB and resized to 84 on the shorter edge, giving [3, 84, 84]
// for the usual 28x28 sources.

use std::path::PathBuf;

use crate::config::DataConfig;
use crate::error::Result;
use crate::image_folder::{ColorMode, ImageFolder, ImagePipeline};
use crate::index::{ClassNaming, ImageIndex, Subset};
use crate::transform::MinMaxScale;

/// Root directory of one Omniglot subset.
pub fn root(config: &DataConfig, subset: Subset) -> PathBuf {
    config
        .data_path
        .join("Omniglot_enriched")
        .join(format!("images_{subset}"))
}

pub fn pipeline(ood_test: bool) -> ImagePipeline {
    if ood_test {
        ImagePipeline::new(ColorMode::Rgb).resize(84)
    } else {
        ImagePipeline::new(ColorMode::Luma).with_transform(Box::new(MinMaxScale))
    }
}

/// Index an Omniglot subset.
pub fn load(config: &DataConfig, subset: Subset, ood_test: bool) -> Result<ImageFolder> {
    let index = ImageIndex::scan(
        &root(config, subset),
        subset,
        ClassNaming::AlphabetCharacter,
        &["png"],
        config.show_progress,
    )?;
    Ok(ImageFolder::new(
        format!("Omniglot-{subset}"),
        index,
        pipeline(ood_test),
    ))
}
