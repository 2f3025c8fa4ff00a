//! Image size classification against the slide canvas.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Screen resolution used to convert pixels to inches.
pub const DPI: f64 = 96.0;

/// Slide canvas geometry, in inches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Canvas {
    pub width_in: f64,
    pub height_in: f64,
    pub margin_in: f64,
    pub title_height_in: f64,
    pub dpi: f64,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width_in: 10.0,
            height_in: 7.5,
            margin_in: 0.5,
            title_height_in: 0.8,
            dpi: DPI,
        }
    }
}

impl Canvas {
    /// Width left between the side margins.
    pub fn usable_width(&self) -> f64 {
        self.width_in - 2.0 * self.margin_in
    }

    /// Height left for content once margins and the title band are removed.
    pub fn usable_height(&self) -> f64 {
        self.height_in - 2.0 * self.margin_in - self.title_height_in
    }

    /// Top edge of the content area, directly under the title band.
    pub fn content_top(&self) -> f64 {
        self.margin_in + self.title_height_in
    }

    /// Pixel widths above this are "large".
    pub fn width_threshold_px(&self) -> f64 {
        self.width_in * self.dpi / 2.0
    }

    /// Pixel heights above this are "large".
    pub fn height_threshold_px(&self) -> f64 {
        self.height_in * self.dpi / 2.0
    }

    /// Classify pixel dimensions against half the canvas.
    pub fn classify(&self, width_px: u32, height_px: u32) -> ImageClassification {
        let wide = width_px as f64 > self.width_threshold_px();
        let tall = height_px as f64 > self.height_threshold_px();
        match (wide, tall) {
            (false, false) => ImageClassification::SmallSmall,
            (false, true) => ImageClassification::SmallLarge,
            (true, false) => ImageClassification::LargeSmall,
            (true, true) => ImageClassification::LargeLarge,
        }
    }
}

/// Size bucket of an image: horizontal size first, vertical second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageClassification {
    SmallSmall,
    SmallLarge,
    LargeSmall,
    LargeLarge,
}

impl ImageClassification {
    /// Label in `horizontal-vertical` form, e.g. `large-small`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SmallSmall => "small-small",
            Self::SmallLarge => "small-large",
            Self::LargeSmall => "large-small",
            Self::LargeLarge => "large-large",
        }
    }
}

impl fmt::Display for ImageClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read an image's pixel dimensions without decoding the whole image.
pub fn image_dimensions(path: &Path) -> Result<(u32, u32)> {
    image::image_dimensions(path)
        .map_err(|e| Error::ImageReadError(format!("{}: {}", path.display(), e)))
}

/// Classify an image file on the default canvas.
///
/// Returns `None` when no path is given or when the image cannot be read,
/// which callers treat as "no image".
pub fn classify_image(path: Option<&Path>) -> Option<ImageClassification> {
    classify_image_on(&Canvas::default(), path)
}

/// Classify an image file on a specific canvas.
pub fn classify_image_on(canvas: &Canvas, path: Option<&Path>) -> Option<ImageClassification> {
    let path = path?;
    match image_dimensions(path) {
        Ok((w, h)) => Some(canvas.classify(w, h)),
        Err(e) => {
            log::warn!("Treating image as absent: {}", e);
            None
        }
    }
}
