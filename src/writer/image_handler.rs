//! Raster image import.
//!
//! Decodes PNG, JPEG or TIFF data with the `image` crate and stores it as an
//! image XObject in the document storage.

use super::options::PdfVersion;
use super::pdf_writer::PdfWriter;
use crate::error::{Error, Result};
use crate::object::{Dictionary, Object, ObjectRef};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage};
use std::io::Write;
use std::path::Path;

/// Lowest quality the JPEG encoder accepts.
const MIN_JPEG_QUALITY: u8 = 1;

/// Color space of the embedded pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    /// One gray component
    DeviceGray,
    /// Red, green and blue
    DeviceRGB,
}

impl ColorSpace {
    /// Components per pixel.
    pub fn components(&self) -> u8 {
        match self {
            ColorSpace::DeviceGray => 1,
            ColorSpace::DeviceRGB => 3,
        }
    }

    /// Name used in the image dictionary.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            ColorSpace::DeviceGray => "DeviceGray",
            ColorSpace::DeviceRGB => "DeviceRGB",
        }
    }

    fn of(image: &DynamicImage) -> Self {
        match image.color() {
            ColorType::L8 | ColorType::La8 | ColorType::L16 | ColorType::La16 => {
                ColorSpace::DeviceGray
            },
            _ => ColorSpace::DeviceRGB,
        }
    }
}

/// An image stored in a document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterImage {
    /// Image XObject record
    pub reference: ObjectRef,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl RasterImage {
    /// Decode `data` and add it to the document storage.
    ///
    /// `lossy` selects `DCTDecode` at the given quality (0 to 100) instead of
    /// `FlateDecode`. The JPEG encoder's floor is 1, so quality 0 encodes as 1.
    /// An alpha channel becomes a soft mask, which needs PDF 1.4.
    pub fn embed<W: Write>(
        pdf: &mut PdfWriter<W>,
        data: &[u8],
        lossy: bool,
        quality: u8,
    ) -> Result<Self> {
        if quality > 100 {
            return Err(Error::InvalidArgument(format!(
                "quality must be between 0 and 100, got {}",
                quality
            )));
        }

        let decoded = image::load_from_memory(data)?;
        let (width, height) = (decoded.width(), decoded.height());
        let color_space = ColorSpace::of(&decoded);
        let has_alpha = decoded.color().has_alpha();

        if has_alpha && pdf.version() < PdfVersion::V1_4 {
            return Err(Error::UnsupportedVersion(format!(
                "soft masks need PDF 1.4, writing {}",
                pdf.version()
            )));
        }

        let pixels = match color_space {
            ColorSpace::DeviceGray => decoded.to_luma8().into_raw(),
            ColorSpace::DeviceRGB => decoded.to_rgb8().into_raw(),
        };
        let (filter, encoded) = if lossy {
            let color_type = match color_space {
                ColorSpace::DeviceGray => ColorType::L8,
                ColorSpace::DeviceRGB => ColorType::Rgb8,
            };
            let mut buffer = Vec::new();
            JpegEncoder::new_with_quality(&mut buffer, quality.max(MIN_JPEG_QUALITY))
                .encode(&pixels, width, height, color_type)?;
            ("DCTDecode", buffer)
        } else {
            ("FlateDecode", deflate(&pixels)?)
        };

        let soft_mask = if has_alpha {
            let alpha: Vec<u8> = decoded.to_luma_alpha8().pixels().map(|pixel| pixel[1]).collect();
            let dict = image_dictionary(width, height, ColorSpace::DeviceGray, "FlateDecode");
            Some(pdf.objects_mut().add_object(Object::stream(dict, deflate(&alpha)?)))
        } else {
            None
        };

        let mut dict = image_dictionary(width, height, color_space, filter);
        if let Some(mask) = soft_mask {
            dict.insert("SMask".to_string(), Object::Reference(mask));
        }
        let reference = pdf.objects_mut().add_object(Object::stream(dict, encoded));

        log::debug!(
            "Embedded {}x{} {} image as {} ({})",
            width,
            height,
            color_space.pdf_name(),
            reference,
            filter
        );

        Ok(Self {
            reference,
            width,
            height,
        })
    }

    /// Read an image file and embed it.
    pub fn embed_file<W: Write>(
        pdf: &mut PdfWriter<W>,
        path: impl AsRef<Path>,
        lossy: bool,
        quality: u8,
    ) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::embed(pdf, &data, lossy, quality)
    }

    /// The image as a resource value.
    pub fn to_object(&self) -> Object {
        Object::Reference(self.reference)
    }
}

fn image_dictionary(width: u32, height: u32, color_space: ColorSpace, filter: &str) -> Dictionary {
    Dictionary::from([
        ("Type".to_string(), Object::name("XObject")),
        ("Subtype".to_string(), Object::name("Image")),
        ("Width".to_string(), Object::Integer(width as i64)),
        ("Height".to_string(), Object::Integer(height as i64)),
        ("ColorSpace".to_string(), Object::name(color_space.pdf_name())),
        ("BitsPerComponent".to_string(), Object::Integer(8)),
        ("Filter".to_string(), Object::name(filter)),
    ])
}

fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}
