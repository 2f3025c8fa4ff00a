//! Enhancement pipeline: watermark removal, dedup, logo, credits and notes.

use slidecraft_ai::{generate_speaker_notes, notes_failure_text, GenerativeModel};
use slidecraft_core::Result;
use slidecraft_pptx::{
    add_credits_to_slide, add_logo, dedup, load_logo, remove_watermark_text,
    remove_watermarks_from_masters, DedupOptions, Deck, WatermarkFilter,
};
use std::path::{Path, PathBuf};

pub const DEFAULT_LOGO_PATH: &str = "temp/logo.png";
pub const DEFAULT_CREDITS_TEXT: &str = "Processed by PPT Studio";
pub const DEFAULT_CREDITS_URL: &str = "https://www.example.com";
/// Link used when the caller supplies their own credit text.
pub const CUSTOM_CREDITS_URL: &str = "https://mybrand.com";

/// Settings for [`Enhancer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnhanceOptions {
    pub watermarks: WatermarkFilter,
    pub dedup: DedupOptions,
    /// Logo used when the caller gives none, or gives one that does not exist.
    pub default_logo: Option<PathBuf>,
    pub default_credits_text: String,
    pub default_credits_url: String,
    pub custom_credits_url: String,
}

impl Default for EnhanceOptions {
    fn default() -> Self {
        Self {
            watermarks: WatermarkFilter::default(),
            dedup: DedupOptions::default(),
            default_logo: Some(PathBuf::from(DEFAULT_LOGO_PATH)),
            default_credits_text: DEFAULT_CREDITS_TEXT.to_string(),
            default_credits_url: DEFAULT_CREDITS_URL.to_string(),
            custom_credits_url: CUSTOM_CREDITS_URL.to_string(),
        }
    }
}

impl EnhanceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_watermark_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.watermarks = WatermarkFilter::new(keywords);
        self
    }

    pub fn with_dedup(mut self, dedup: DedupOptions) -> Self {
        self.dedup = dedup;
        self
    }

    pub fn with_default_logo(mut self, logo: Option<PathBuf>) -> Self {
        self.default_logo = logo;
        self
    }

    pub fn with_default_credits(mut self, text: impl Into<String>, url: impl Into<String>) -> Self {
        self.default_credits_text = text.into();
        self.default_credits_url = url.into();
        self
    }

    pub fn with_custom_credits_url(mut self, url: impl Into<String>) -> Self {
        self.custom_credits_url = url.into();
        self
    }

    /// Credit text and link for an optional caller-supplied text.
    pub fn credits<'a>(&'a self, text: Option<&'a str>) -> (&'a str, &'a str) {
        match text.filter(|t| !t.trim().is_empty()) {
            Some(text) => (text, self.custom_credits_url.as_str()),
            None => (
                self.default_credits_text.as_str(),
                self.default_credits_url.as_str(),
            ),
        }
    }

    /// The caller's logo when it exists, otherwise the default logo.
    pub fn resolve_logo<'a>(&'a self, logo: Option<&'a Path>) -> Option<&'a Path> {
        logo.filter(|p| p.exists())
            .or(self.default_logo.as_deref())
    }
}

/// Runs the enhancement stages over a deck file.
///
/// Without a model the notes stage is skipped.
pub struct Enhancer {
    options: EnhanceOptions,
    model: Option<Box<dyn GenerativeModel>>,
}

impl Default for Enhancer {
    fn default() -> Self {
        Self::new(EnhanceOptions::default())
    }
}

impl Enhancer {
    pub fn new(options: EnhanceOptions) -> Self {
        Self {
            options,
            model: None,
        }
    }

    pub fn with_model(mut self, model: Box<dyn GenerativeModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn options(&self) -> &EnhanceOptions {
        &self.options
    }

    /// Enhance `input` and write the result to `output`.
    pub fn enhance(
        &self,
        input: &Path,
        output: &Path,
        logo: Option<&Path>,
        credits: Option<&str>,
    ) -> Result<PathBuf> {
        log::info!("Loading presentation from {}", input.display());
        let mut deck = Deck::open(input)?;
        self.enhance_deck(&mut deck, logo, credits)?;

        log::info!("Saving enhanced presentation to {}", output.display());
        deck.save(output)?;
        Ok(output.to_path_buf())
    }

    /// Run every stage on an open deck.
    pub fn enhance_deck(&self, deck: &mut Deck, logo: Option<&Path>, credits: Option<&str>) -> Result<()> {
        let (credits_text, credits_url) = self.options.credits(credits);
        let logo = load_logo(self.options.resolve_logo(logo));

        log::info!("Removing watermarks from slide masters");
        remove_watermarks_from_masters(deck, &self.options.watermarks)?;

        log::info!("Removing repeated images");
        let report = dedup(deck, &self.options.dedup)?;
        log::info!(
            "Hashed {} pictures into {} groups, removed {} shapes",
            report.pictures_hashed,
            report.clusters,
            report.shapes_removed
        );

        let (width, height) = (deck.slide_width(), deck.slide_height());
        let count = deck.slide_count();
        for slide in 0..count {
            log::info!("Processing slide {}/{}", slide + 1, count);
            remove_watermark_text(deck, slide, &self.options.watermarks)?;
            if let Some(logo) = &logo {
                add_logo(deck, slide, logo)?;
            }
            add_credits_to_slide(deck, slide, width, height, credits_text, credits_url)?;
            self.add_notes(deck, slide)?;
        }
        Ok(())
    }

    fn add_notes(&self, deck: &mut Deck, slide: usize) -> Result<()> {
        let Some(model) = self.model.as_deref() else {
            return Ok(());
        };

        let generated = deck
            .slide_text(slide)
            .and_then(|text| generate_speaker_notes(model, &text));
        match generated {
            Ok(Some(notes)) => deck.set_notes_text(slide, &notes),
            Ok(None) => Ok(()),
            Err(e) => {
                log::warn!("Note generation failed for slide {}: {}", slide + 1, e);
                deck.set_notes_text(slide, &notes_failure_text(&e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_credits() {
        let options = EnhanceOptions::default();
        assert_eq!(
            options.credits(None),
            ("Processed by PPT Studio", "https://www.example.com")
        );
        assert_eq!(options.credits(Some("  ")), options.credits(None));
    }

    #[test]
    fn test_custom_credits_use_brand_url() {
        let options = EnhanceOptions::default();
        assert_eq!(options.credits(Some("Acme")), ("Acme", "https://mybrand.com"));
    }

    #[test]
    fn test_missing_logo_falls_back_to_default() {
        let options = EnhanceOptions::default();
        let missing = Path::new("definitely/not/here.png");
        assert_eq!(
            options.resolve_logo(Some(missing)),
            Some(Path::new(DEFAULT_LOGO_PATH))
        );

        let none = EnhanceOptions::default().with_default_logo(None);
        assert_eq!(none.resolve_logo(None), None);
    }

    #[test]
    fn test_existing_logo_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brand.png");
        std::fs::write(&path, b"x").unwrap();

        let options = EnhanceOptions::default();
        assert_eq!(options.resolve_logo(Some(&path)), Some(path.as_path()));
    }

    #[test]
    fn test_custom_keywords() {
        let options = EnhanceOptions::new().with_watermark_keywords(["sample"]);
        assert!(options.watermarks.matches("SAMPLE deck"));
        assert!(!options.watermarks.matches("DRAFT"));
    }
}
