//! The model seam.

use slidecraft_core::{Error, Result};
use std::path::Path;

/// Encoded image sent alongside a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl InlineImage {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Read an image file, taking the MIME type from its extension.
    pub fn open(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        let mime_type = match ext.as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "bmp" => "image/bmp",
            "webp" => "image/webp",
            _ => {
                return Err(Error::ImageReadError(format!(
                    "{}: not a supported image type",
                    path.display()
                )))
            }
        };
        let data = std::fs::read(path)
            .map_err(|e| Error::ImageReadError(format!("{}: {}", path.display(), e)))?;
        Ok(Self::new(mime_type, data))
    }
}

/// Text plus optional images for one model call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Prompt {
    pub text: String,
    pub images: Vec<InlineImage>,
}

impl Prompt {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            images: Vec::new(),
        }
    }

    pub fn with_image(mut self, image: InlineImage) -> Self {
        self.images.push(image);
        self
    }
}

/// A model that turns a prompt into text. Calls block until the model answers.
pub trait GenerativeModel {
    fn generate(&self, prompt: &Prompt) -> Result<String>;
}

impl<M: GenerativeModel + ?Sized> GenerativeModel for &M {
    fn generate(&self, prompt: &Prompt) -> Result<String> {
        (**self).generate(prompt)
    }
}

impl<M: GenerativeModel + ?Sized> GenerativeModel for Box<M> {
    fn generate(&self, prompt: &Prompt) -> Result<String> {
        (**self).generate(prompt)
    }
}
