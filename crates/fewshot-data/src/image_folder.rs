// ImageFolder: indexed image-classification dataset backed by files on disk
//
// An ImageFolder pairs an `ImageIndex` (who is where, which class) with an
// `ImagePipeline` (how a file becomes a tensor). The pipeline runs, in order:
//
//   decode -> center crop -> resize shorter edge -> [C, H, W] in [0, 1]
//          -> sample transforms (min-max, per-channel normalisation, ...)
//
// Labels come straight from the index, so `label()` never touches the disk.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView};

use crate::dataset::{Dataset, Sample};
use crate::error::{Error, Result};
use crate::index::{ImageIndex, ImageRecord};
use crate::transform::Transform;

/// Channel layout of decoded images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    /// One channel.
    Luma,
    /// Three channels, R, G, B planes.
    Rgb,
}

impl ColorMode {
    pub fn channels(&self) -> usize {
        match self {
            ColorMode::Luma => 1,
            ColorMode::Rgb => 3,
        }
    }
}

/// Output size when the shorter edge of a `width x height` image is resized
/// to `size`, keeping the aspect ratio.
pub fn resize_dims(width: u32, height: u32, size: u32) -> (u32, u32) {
    if width <= height {
        let h = (size as u64 * height as u64 / width.max(1) as u64) as u32;
        (size, h.max(1))
    } else {
        let w = (size as u64 * width as u64 / height.max(1) as u64) as u32;
        (w.max(1), size)
    }
}

fn center_crop(img: DynamicImage, size: u32) -> DynamicImage {
    let (w, h) = img.dimensions();
    // Images smaller than the crop are zero-padded around the center first
    let img = if w < size || h < size {
        let (pw, ph) = (w.max(size), h.max(size));
        let mut canvas = DynamicImage::new(pw, ph, img.color());
        imageops::overlay(&mut canvas, &img, ((pw - w) / 2) as i64, ((ph - h) / 2) as i64);
        canvas
    } else {
        img
    };
    let (w, h) = img.dimensions();
    img.crop_imm((w - size) / 2, (h - size) / 2, size, size)
}

/// Describes how an image file is turned into a sample tensor.
pub struct ImagePipeline {
    mode: ColorMode,
    center_crop: Option<u32>,
    resize: Option<u32>,
    transforms: Vec<Box<dyn Transform>>,
}

impl ImagePipeline {
    pub fn new(mode: ColorMode) -> Self {
        Self {
            mode,
            center_crop: None,
            resize: None,
            transforms: Vec::new(),
        }
    }

    /// Crop a `size x size` square from the image center, zero-padding
    /// images smaller than `size` on either axis.
    pub fn center_crop(mut self, size: u32) -> Self {
        self.center_crop = Some(size);
        self
    }

    /// Resize so the shorter edge is `size`, keeping the aspect ratio.
    pub fn resize(mut self, size: u32) -> Self {
        self.resize = Some(size);
        self
    }

    /// Append a transform applied after tensorisation.
    pub fn with_transform(mut self, t: Box<dyn Transform>) -> Self {
        self.transforms.push(t);
        self
    }

    pub fn mode(&self) -> ColorMode {
        self.mode
    }

    /// Decode `path` and return pixel data in `[C, H, W]` layout, values in
    /// [0, 1], before sample transforms.
    pub fn load(&self, path: &Path) -> Result<(Vec<f64>, [usize; 3])> {
        let img = image::open(path).map_err(|e| Error::ImageDecode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(self.tensorise(img))
    }

    fn tensorise(&self, img: DynamicImage) -> (Vec<f64>, [usize; 3]) {
        let img = match self.center_crop {
            Some(size) => center_crop(img, size),
            None => img,
        };
        let img = match self.resize {
            Some(size) => {
                let (w, h) = img.dimensions();
                let (nw, nh) = resize_dims(w, h, size);
                if (nw, nh) == (w, h) {
                    img
                } else {
                    img.resize_exact(nw, nh, FilterType::Triangle)
                }
            }
            None => img,
        };

        let (w, h) = img.dimensions();
        let pixels = match self.mode {
            ColorMode::Luma => {
                let gray = img.to_luma8();
                gray.as_raw().iter().map(|&v| v as f64 / 255.0).collect()
            }
            ColorMode::Rgb => {
                let rgb = img.to_rgb8();
                let raw = rgb.as_raw();
                // [H, W, C] interleaved -> [C, H, W] planar
                let npix = (w * h) as usize;
                let mut data = vec![0.0f64; 3 * npix];
                for i in 0..npix {
                    data[i] = raw[i * 3] as f64 / 255.0;
                    data[npix + i] = raw[i * 3 + 1] as f64 / 255.0;
                    data[2 * npix + i] = raw[i * 3 + 2] as f64 / 255.0;
                }
                data
            }
        };

        (pixels, [self.mode.channels(), h as usize, w as usize])
    }

    fn finish(&self, mut sample: Sample) -> Sample {
        for t in &self.transforms {
            sample = t.apply(sample);
        }
        sample
    }
}

/// A directory-based image classification dataset.
pub struct ImageFolder {
    name: String,
    index: ImageIndex,
    pipeline: ImagePipeline,
}

impl ImageFolder {
    pub fn new(name: impl Into<String>, index: ImageIndex, pipeline: ImagePipeline) -> Self {
        Self {
            name: name.into(),
            index,
            pipeline,
        }
    }

    pub fn index(&self) -> &ImageIndex {
        &self.index
    }

    /// Sorted class names; position is the local class id.
    pub fn class_names(&self) -> &[String] {
        self.index.class_names()
    }

    pub fn records(&self) -> &[ImageRecord] {
        self.index.records()
    }

    /// File path of the i-th sample.
    pub fn path_of(&self, index: usize) -> Result<&Path> {
        self.index.path(index)
    }

    pub fn pipeline(&self) -> &ImagePipeline {
        &self.pipeline
    }
}

impl Dataset for ImageFolder {
    fn len(&self) -> usize {
        self.index.len()
    }

    fn get(&self, index: usize) -> Result<Sample> {
        let record = self.index.record(index)?;
        let (features, shape) = self.pipeline.load(&record.filepath)?;
        Ok(self.pipeline.finish(Sample {
            features,
            feature_shape: shape.to_vec(),
            label: record.class_id,
        }))
    }

    fn num_classes(&self) -> usize {
        self.index.num_classes()
    }

    fn label(&self, index: usize) -> Result<usize> {
        self.index.class_id(index)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
