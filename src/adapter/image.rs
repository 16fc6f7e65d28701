//! Native raster adapter over the `image` crate
//!
//! Decodes the item once on initialization and keeps the decoded image
//! bound to the item for the rest of its life. Geometry operations work on
//! that buffer; `convert` only picks the output encoding, which `store`
//! and `to_bytes` apply.

use super::requirements::Requirements;
use super::traits::{args, Adapter, Outcome};
use crate::error::AdapterError;
use crate::item::{Content, ItemData};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use serde_json::Value;
use std::io::Cursor;
use std::path::Path;

const FILTER: FilterType = FilterType::Lanczos3;

/// Encoding for a MIME type, accepting the simplified icon type.
fn format_for(mime_type: &str) -> Option<ImageFormat> {
    match mime_type {
        "image/icon" => Some(ImageFormat::Ico),
        other => ImageFormat::from_mime_type(other),
    }
}

#[derive(Default)]
pub struct ImageAdapter {
    image: Option<DynamicImage>,
    format: Option<ImageFormat>,
}

impl ImageAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    fn image(&self) -> Result<&DynamicImage, AdapterError> {
        self.image
            .as_ref()
            .ok_or_else(|| AdapterError::Failed("image not loaded".to_string()))
    }

    fn take(&mut self) -> Result<DynamicImage, AdapterError> {
        self.image
            .take()
            .ok_or_else(|| AdapterError::Failed("image not loaded".to_string()))
    }

    /// Scale to fill `width`×`height` and crop the overflow, never enlarging.
    fn fit_crop(image: DynamicImage, width: u32, height: u32) -> DynamicImage {
        let width = width.min(image.width());
        let height = height.min(image.height());
        image.resize_to_fill(width, height, FILTER)
    }

    /// Encode the current buffer; JPEG has no alpha channel.
    fn encode(&self, format: ImageFormat) -> Result<Vec<u8>, AdapterError> {
        let image = self.image()?;
        let mut bytes = Cursor::new(Vec::new());
        if format == ImageFormat::Jpeg {
            DynamicImage::ImageRgb8(image.to_rgb8()).write_to(&mut bytes, format)?;
        } else {
            image.write_to(&mut bytes, format)?;
        }
        Ok(bytes.into_inner())
    }

    fn store(&self, path: &Path) -> Result<(), AdapterError> {
        let format = match self.format {
            Some(format) => format,
            None => ImageFormat::from_path(path)?,
        };
        std::fs::write(path, self.encode(format)?)?;
        Ok(())
    }
}

impl Adapter for ImageAdapter {
    fn name(&self) -> &str {
        "Image"
    }

    fn capabilities(&self) -> Vec<&str> {
        vec![
            "width", "height", "fit", "resize", "crop", "fit_crop", "zoom_crop", "convert",
            "to_bytes", "store",
        ]
    }

    fn requirements(&self) -> Requirements {
        Requirements::new().with_extension("image")
    }

    fn compatible(&self, item: &ItemData) -> bool {
        format_for(item.mime_type()).is_some() && self.requirements().satisfied_by(item)
    }

    fn initialize(&mut self, item: &mut ItemData) -> Result<(), AdapterError> {
        let image = match item.content_mut() {
            Content::Object(object) => object
                .downcast_ref::<DynamicImage>()
                .cloned()
                .ok_or_else(|| AdapterError::Failed("object is not an image".to_string()))?,
            content => image::load_from_memory(&content.read_bytes()?)?,
        };
        self.image = Some(image);
        self.format = format_for(item.mime_type());
        Ok(())
    }

    fn call(
        &mut self,
        operation: &str,
        item: &mut ItemData,
        args: &[Value],
    ) -> Result<Outcome, AdapterError> {
        match operation {
            "width" => Ok(Outcome::value(self.image()?.width())),
            "height" => Ok(Outcome::value(self.image()?.height())),
            "fit" => {
                let (width, height) = args::dimensions(args)?;
                let image = self.take()?;
                self.image = Some(image.resize(width, height, FILTER));
                Ok(Outcome::Done)
            }
            "resize" => {
                let (width, height) = args::dimensions(args)?;
                let image = self.take()?;
                self.image = Some(image.resize_exact(width, height, FILTER));
                Ok(Outcome::Done)
            }
            "crop" => {
                let x = args::u32_at(args, 0)?;
                let y = args::u32_at(args, 1)?;
                let width = args::extent_at(args, 2)?;
                let height = args::extent_at(args, 3)?;
                let image = self.take()?;
                self.image = Some(image.crop_imm(x, y, width, height));
                Ok(Outcome::Done)
            }
            "fit_crop" => {
                let (width, height) = args::dimensions(args)?;
                let image = self.take()?;
                self.image = Some(Self::fit_crop(image, width, height));
                Ok(Outcome::Done)
            }
            "zoom_crop" => {
                let (width, height) = args::dimensions(args)?;
                let image = self.take()?;
                self.image = Some(image.resize_to_fill(width, height, FILTER));
                Ok(Outcome::Done)
            }
            "convert" => {
                let mime_type = args::str_at(args, 0)?;
                let format = format_for(mime_type)
                    .filter(|format| format.writing_enabled())
                    .ok_or_else(|| AdapterError::Unsupported(format!("convert to {}", mime_type)))?;
                self.format = Some(format);
                Ok(Outcome::Done)
            }
            "to_bytes" => {
                let format = self
                    .format
                    .ok_or_else(|| AdapterError::Unsupported("no output encoding".to_string()))?;
                let bytes = self.encode(format)?;
                let length = bytes.len();
                item.contents.insert("raw".to_string(), bytes);
                Ok(Outcome::value(length))
            }
            "store" => {
                let path = args::str_at(args, 0)?;
                self.store(Path::new(path))?;
                Ok(Outcome::Done)
            }
            other => Err(AdapterError::Unsupported(other.to_string())),
        }
    }
}
