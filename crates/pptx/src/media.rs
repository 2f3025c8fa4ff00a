//! Picture data for embedding into a deck.

use image::{ImageFormat, ImageReader};
use slidecraft_core::{Error, Result};
use std::io::Cursor;
use std::path::Path;

/// Encoded image bytes with their format and pixel size.
#[derive(Debug, Clone, PartialEq)]
pub struct PictureData {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
    pub width_px: u32,
    pub height_px: u32,
}

impl PictureData {
    /// Read and probe an image file.
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| Error::ImageReadError(format!("{}: {}", path.display(), e)))?;
        Self::from_bytes(bytes)
    }

    /// Probe encoded image bytes. Only formats a slide can display are accepted.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let reader = ImageReader::new(Cursor::new(&bytes))
            .with_guessed_format()
            .map_err(|e| Error::ImageReadError(e.to_string()))?;
        let format = reader
            .format()
            .ok_or_else(|| Error::ImageReadError("Unrecognised image format".to_string()))?;
        if extension_for(format).is_none() {
            return Err(Error::UnsupportedFormat(format!("Image format {:?}", format)));
        }
        let (width_px, height_px) = reader
            .into_dimensions()
            .map_err(|e| Error::ImageReadError(e.to_string()))?;

        Ok(Self {
            bytes,
            format,
            width_px,
            height_px,
        })
    }

    /// File extension used for the media part.
    pub fn extension(&self) -> &'static str {
        extension_for(self.format).map(|(ext, _)| ext).unwrap_or("bin")
    }

    pub fn content_type(&self) -> &'static str {
        extension_for(self.format)
            .map(|(_, ct)| ct)
            .unwrap_or("application/octet-stream")
    }
}

fn extension_for(format: ImageFormat) -> Option<(&'static str, &'static str)> {
    match format {
        ImageFormat::Png => Some(("png", "image/png")),
        ImageFormat::Jpeg => Some(("jpeg", "image/jpeg")),
        ImageFormat::Gif => Some(("gif", "image/gif")),
        ImageFormat::Bmp => Some(("bmp", "image/bmp")),
        _ => None,
    }
}
