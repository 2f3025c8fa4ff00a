//! Watermark removal and new branding: logo and credits.

use crate::deck::{ContainerRef, Deck};
use crate::media::PictureData;
use crate::shapes::{inches, EmuRect};
use crate::text::{Alignment, Paragraph, TextFrame, TextRun};
use slidecraft_core::Result;
use std::path::Path;

/// Text that marks a shape as a watermark, matched case-insensitively.
pub const WATERMARK_KEYWORDS: &[&str] = &["CONFIDENTIAL", "DRAFT", "INTERNAL USE"];

pub const LOGO_OFFSET_IN: f64 = 0.2;
pub const LOGO_WIDTH_IN: f64 = 1.0;

pub const CREDITS_FONT_PT: f64 = 10.0;
pub const CREDITS_COLOR: [u8; 3] = [150, 150, 150];

/// Matches shape text against watermark keywords.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatermarkFilter {
    keywords: Vec<String>,
}

impl Default for WatermarkFilter {
    fn default() -> Self {
        Self::new(WATERMARK_KEYWORDS.iter().copied())
    }
}

impl WatermarkFilter {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().to_uppercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        let upper = text.to_uppercase();
        self.keywords.iter().any(|k| upper.contains(k.as_str()))
    }
}

/// Remove the top-level text shapes of a container that carry a keyword.
pub fn remove_watermark_shapes(
    deck: &mut Deck,
    container: ContainerRef,
    filter: &WatermarkFilter,
) -> Result<usize> {
    let doomed: Vec<Vec<usize>> = deck
        .shapes(container)?
        .into_iter()
        .filter(|s| s.text().map(|t| filter.matches(t)).unwrap_or(false))
        .map(|s| s.path)
        .collect();
    deck.remove_shapes(container, &doomed)
}

/// Strip watermark shapes from every slide master.
pub fn remove_watermarks_from_masters(deck: &mut Deck, filter: &WatermarkFilter) -> Result<usize> {
    let mut removed = 0;
    for master in deck.masters().collect::<Vec<_>>() {
        removed += remove_watermark_shapes(deck, master, filter)?;
    }
    if removed > 0 {
        log::info!("Removed {} watermark shapes from masters", removed);
    }
    Ok(removed)
}

/// Strip watermark shapes placed directly on a slide.
pub fn remove_watermark_text(deck: &mut Deck, slide: usize, filter: &WatermarkFilter) -> Result<usize> {
    let removed = remove_watermark_shapes(deck, ContainerRef::Slide(slide), filter)?;
    if removed > 0 {
        log::debug!("Removed {} watermark shapes from slide {}", removed, slide + 1);
    }
    Ok(removed)
}

/// Load a logo if the path is given and points at a readable image.
pub fn load_logo(path: Option<&Path>) -> Option<PictureData> {
    let path = path?;
    if !path.exists() {
        log::debug!("No logo at {}", path.display());
        return None;
    }
    match PictureData::open(path) {
        Ok(logo) => Some(logo),
        Err(e) => {
            log::warn!("Skipping logo {}: {}", path.display(), e);
            None
        }
    }
}

/// Place a logo in the top-left corner, one inch wide.
pub fn add_logo(deck: &mut Deck, slide: usize, logo: &PictureData) -> Result<Vec<usize>> {
    let width = inches(LOGO_WIDTH_IN);
    let height = width * i64::from(logo.height_px.max(1)) / i64::from(logo.width_px.max(1));
    let offset = inches(LOGO_OFFSET_IN);
    deck.add_picture(
        ContainerRef::Slide(slide),
        logo,
        EmuRect::new(offset, offset, width, height),
    )
}

/// Add a grey, right-aligned, hyperlinked credit line in the bottom-right corner.
pub fn add_credits_to_slide(
    deck: &mut Deck,
    slide: usize,
    slide_width: i64,
    slide_height: i64,
    text: &str,
    url: &str,
) -> Result<Vec<usize>> {
    let rect = EmuRect::new(
        slide_width - inches(2.6),
        slide_height - inches(0.5),
        inches(2.5),
        inches(0.4),
    );
    let frame = TextFrame::new().with_paragraph(
        Paragraph::new().with_alignment(Alignment::Right).with_run(
            TextRun::new(text)
                .with_size(CREDITS_FONT_PT)
                .with_color(CREDITS_COLOR)
                .with_hyperlink(url),
        ),
    );
    deck.add_textbox(ContainerRef::Slide(slide), rect, &frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_frame(text: &str) -> TextFrame {
        TextFrame::new().with_paragraph(Paragraph::new().with_run(TextRun::new(text)))
    }

    fn texts(deck: &Deck, container: ContainerRef) -> Vec<String> {
        deck.shapes(container)
            .unwrap()
            .iter()
            .filter_map(|s| s.text().map(str::to_string))
            .collect()
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        let filter = WatermarkFilter::default();
        assert!(filter.matches("Confidential"));
        assert!(filter.matches("this is a draft copy"));
        assert!(filter.matches("For Internal Use only"));
        assert!(!filter.matches("Internal"));
        assert!(!filter.matches("Quarterly results"));
    }

    #[test]
    fn test_master_watermarks_removed() {
        let mut deck = Deck::new().unwrap();
        let rect = EmuRect::new(0, 0, 10, 10);
        deck.add_textbox(ContainerRef::Master(0), rect, &text_frame("confidential"))
            .unwrap();
        deck.add_textbox(ContainerRef::Master(0), rect, &text_frame("Company name"))
            .unwrap();

        let removed = remove_watermarks_from_masters(&mut deck, &WatermarkFilter::default()).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(texts(&deck, ContainerRef::Master(0)), vec!["Company name"]);
    }

    #[test]
    fn test_slide_watermarks_removed() {
        let mut deck = Deck::new().unwrap();
        let slide = deck.add_slide(0).unwrap();
        let rect = EmuRect::new(0, 0, 10, 10);
        for text in ["DRAFT", "Agenda", "Internal use"] {
            deck.add_textbox(ContainerRef::Slide(slide), rect, &text_frame(text))
                .unwrap();
        }

        let removed = remove_watermark_text(&mut deck, slide, &WatermarkFilter::default()).unwrap();
        assert_eq!(removed, 2);
        assert_eq!(texts(&deck, ContainerRef::Slide(slide)), vec!["Agenda"]);
    }

    #[test]
    fn test_credits_shape() {
        let mut deck = Deck::new().unwrap();
        let slide = deck.add_slide(0).unwrap();
        let (w, h) = (deck.slide_width(), deck.slide_height());
        let before = deck.shapes(ContainerRef::Slide(slide)).unwrap().len();

        add_credits_to_slide(&mut deck, slide, w, h, "Acme", "https://acme.com").unwrap();

        let shapes = deck.shapes(ContainerRef::Slide(slide)).unwrap();
        assert_eq!(shapes.len(), before + 1);
        let credit = shapes.last().unwrap();
        assert_eq!(credit.text(), Some("Acme"));
        assert_eq!(
            deck.first_run_hyperlink(ContainerRef::Slide(slide), credit).as_deref(),
            Some("https://acme.com")
        );
    }

    #[test]
    fn test_logo_keeps_aspect_ratio() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");
        image::RgbImage::new(200, 100).save(&path).unwrap();

        let logo = load_logo(Some(&path)).unwrap();
        let mut deck = Deck::new().unwrap();
        let slide = deck.add_slide(0).unwrap();
        add_logo(&mut deck, slide, &logo).unwrap();

        let shapes = deck.shapes(ContainerRef::Slide(slide)).unwrap();
        assert!(shapes[0].is_picture());
        assert!(load_logo(Some(&dir.path().join("missing.png"))).is_none());
        assert!(load_logo(None).is_none());
    }
}
