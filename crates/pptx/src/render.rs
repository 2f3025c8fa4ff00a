//! Rendering slide specs onto new slides.

use crate::deck::{ContainerRef, Deck};
use crate::media::PictureData;
use crate::shapes::EmuRect;
use crate::text::{Alignment, Paragraph, TextFrame, TextRun};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use slidecraft_core::{
    fit_image, parse_bullets, Canvas, PanelSide, Rect, Result, SlideLayout, SlideSpec,
};
use std::path::Path;

pub const TITLE_FONT_PT: f64 = 32.0;
pub const BULLET_FONT_PT: f64 = 24.0;
pub const BULLET_SPACE_AFTER_PT: f64 = 4.0;

/// Lays out a title, bullets and an optional image on a blank slide.
///
/// The side a side-by-side image lands on comes from `rng`; seed it to make
/// output reproducible.
#[derive(Debug)]
pub struct SlideRenderer<R: Rng = StdRng> {
    canvas: Canvas,
    rng: R,
}

impl SlideRenderer<StdRng> {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Renderer whose panel sides repeat for the same seed.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for SlideRenderer<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> SlideRenderer<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            canvas: Canvas::default(),
            rng,
        }
    }

    pub fn with_canvas(mut self, canvas: Canvas) -> Self {
        self.canvas = canvas;
        self
    }

    /// Append a slide for `spec` and return its index.
    ///
    /// An image that cannot be read is logged and the slide is laid out as
    /// text only.
    pub fn render_slide(&mut self, deck: &mut Deck, spec: &SlideSpec, image: Option<&Path>) -> Result<usize> {
        let picture = image.and_then(|path| match PictureData::open(path) {
            Ok(picture) => Some(picture),
            Err(e) => {
                log::warn!("Rendering without image {}: {}", path.display(), e);
                None
            }
        });
        let classification = picture
            .as_ref()
            .map(|p| self.canvas.classify(p.width_px, p.height_px));

        let layout = SlideLayout::choose(classification, spec.bullets.len());
        let side = if layout.is_side_by_side() {
            PanelSide::random(&mut self.rng)
        } else {
            PanelSide::Left
        };
        self.render_with(deck, spec, picture.as_ref(), layout, side)
    }

    /// Render with an explicit layout and panel side.
    pub fn render_with(
        &self,
        deck: &mut Deck,
        spec: &SlideSpec,
        picture: Option<&PictureData>,
        layout: SlideLayout,
        side: PanelSide,
    ) -> Result<usize> {
        let blank = deck.blank_layout_index()?;
        let slide = deck.add_slide(blank)?;
        let container = ContainerRef::Slide(slide);
        let canvas = &self.canvas;

        let title_rect = Rect::new(
            canvas.margin_in,
            canvas.margin_in,
            canvas.usable_width(),
            canvas.title_height_in,
        );
        let title = TextFrame::new().with_paragraph(
            Paragraph::new()
                .with_alignment(Alignment::Center)
                .with_run(TextRun::new(spec.title.as_str()).with_size(TITLE_FONT_PT)),
        );
        deck.add_textbox(container, EmuRect::from_inches(&title_rect), &title)?;

        let placement = layout.place(canvas, side);
        if let (Some(panel), Some(picture)) = (placement.image_panel, picture) {
            let fitted = fit_image(panel, picture.width_px, picture.height_px, canvas.dpi);
            deck.add_picture(container, picture, EmuRect::from_inches(&fitted))?;
        }

        let bullets = parse_bullets(&spec.bullets)
            .into_iter()
            .fold(TextFrame::new(), |frame, line| {
                frame.with_paragraph(
                    Paragraph::new()
                        .with_level(line.level)
                        .with_space_after(BULLET_SPACE_AFTER_PT)
                        .with_run(TextRun::new(line.display_text()).with_size(BULLET_FONT_PT)),
                )
            });
        deck.add_textbox(container, EmuRect::from_inches(&placement.bullets), &bullets)?;

        if let Some(notes) = spec.notes() {
            deck.set_notes_text(slide, notes)?;
        }

        log::debug!("Rendered slide {} '{}' as {:?}", slide + 1, spec.title, layout);
        Ok(slide)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{inches, ShapeKind};

    fn spec() -> SlideSpec {
        SlideSpec::new("T", vec!["- A".to_string(), "  - B".to_string()]).with_notes("N")
    }

    fn image(dir: &Path, name: &str, w: u32, h: u32) -> std::path::PathBuf {
        let path = dir.join(name);
        image::RgbImage::new(w, h).save(&path).unwrap();
        path
    }

    fn picture_offset_x(deck: &Deck, slide: usize) -> i64 {
        let container = ContainerRef::Slide(slide);
        let shapes = deck.shapes(container).unwrap();
        let pic = shapes.iter().find(|s| s.is_picture()).unwrap();
        deck.shape_rect(container, pic).unwrap().x
    }

    #[test]
    fn test_text_only_slide() {
        let mut deck = Deck::new().unwrap();
        let slide = SlideRenderer::seeded(1).render_slide(&mut deck, &spec(), None).unwrap();

        let shapes = deck.shapes(ContainerRef::Slide(slide)).unwrap();
        let texts: Vec<_> = shapes.iter().filter_map(|s| s.text()).collect();
        assert_eq!(texts, vec!["T", "• A\n◦ B"]);
        assert!(!shapes.iter().any(|s| s.is_picture()));
        assert_eq!(deck.notes_text(slide).as_deref(), Some("N"));
    }

    #[test]
    fn test_unreadable_image_falls_back_to_text() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.png");
        std::fs::write(&bad, b"garbage").unwrap();

        let mut deck = Deck::new().unwrap();
        let slide = SlideRenderer::seeded(1)
            .render_slide(&mut deck, &spec(), Some(&bad))
            .unwrap();
        let shapes = deck.shapes(ContainerRef::Slide(slide)).unwrap();
        assert!(!shapes.iter().any(|s| matches!(s.kind, ShapeKind::Picture { .. })));
    }

    #[test]
    fn test_picture_is_added_for_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = image(dir.path(), "a.png", 100, 100);

        let mut deck = Deck::new().unwrap();
        let slide = SlideRenderer::seeded(7)
            .render_slide(&mut deck, &spec(), Some(&path))
            .unwrap();
        let shapes = deck.shapes(ContainerRef::Slide(slide)).unwrap();
        assert_eq!(shapes.iter().filter(|s| s.is_picture()).count(), 1);
        assert_eq!(shapes.len(), 3);
    }

    #[test]
    fn test_explicit_side_controls_panel_position() {
        let dir = tempfile::tempdir().unwrap();
        let path = image(dir.path(), "a.png", 100, 100);
        let picture = PictureData::open(&path).unwrap();
        let layout = SlideLayout::choose(Some(Canvas::default().classify(100, 100)), 2);

        let renderer = SlideRenderer::seeded(0);
        let mut deck = Deck::new().unwrap();
        let left = renderer
            .render_with(&mut deck, &spec(), Some(&picture), layout, PanelSide::Left)
            .unwrap();
        let right = renderer
            .render_with(&mut deck, &spec(), Some(&picture), layout, PanelSide::Right)
            .unwrap();

        let left_x = picture_offset_x(&deck, left);
        let right_x = picture_offset_x(&deck, right);
        assert!(left_x < inches(5.0));
        assert!(right_x > inches(5.0));
    }

    #[test]
    fn test_seeded_renderers_agree() {
        let dir = tempfile::tempdir().unwrap();
        let path = image(dir.path(), "a.png", 100, 100);

        let mut a = Deck::new().unwrap();
        let mut b = Deck::new().unwrap();
        let mut ra = SlideRenderer::seeded(42);
        let mut rb = SlideRenderer::seeded(42);
        for _ in 0..4 {
            ra.render_slide(&mut a, &spec(), Some(&path)).unwrap();
            rb.render_slide(&mut b, &spec(), Some(&path)).unwrap();
        }
        for slide in 0..4 {
            assert_eq!(picture_offset_x(&a, slide), picture_offset_x(&b, slide));
        }
    }
}
