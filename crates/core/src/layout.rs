//! Panel layout selection and image fitting.
//!
//! Geometry is in inches on a [`Canvas`]. Picking the layout is a pure
//! function of the image classification and bullet count; the only random
//! input is which side a side-by-side image goes on, and that is passed in.

use crate::classify::{Canvas, ImageClassification};
use rand::Rng;

/// Gap between an image panel and the bullet panel.
pub const PANEL_GAP_IN: f64 = 0.2;

/// Bullet counts above this push large-large images into a side panel.
pub const STACKED_BULLET_LIMIT: usize = 4;

/// Axis-aligned rectangle in inches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }
}

/// Which side of the content area the image panel takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelSide {
    Left,
    Right,
}

impl PanelSide {
    /// Pick a side uniformly at random.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.random_bool(0.5) {
            PanelSide::Left
        } else {
            PanelSide::Right
        }
    }
}

/// Arrangement of image and bullets within the content area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SlideLayout {
    /// No image; bullets fill the content area.
    TextOnly,
    /// Image and bullets side by side; the image panel takes
    /// `image_fraction` of the usable width.
    SidePanel { image_fraction: f64 },
    /// Image on top taking `image_fraction` of the usable height, bullets
    /// below after `gap` inches.
    Stacked { image_fraction: f64, gap: f64 },
}

impl SlideLayout {
    /// Choose a layout from the image classification and bullet count.
    pub fn choose(classification: Option<ImageClassification>, bullet_count: usize) -> Self {
        match classification {
            None => SlideLayout::TextOnly,
            Some(ImageClassification::SmallSmall | ImageClassification::SmallLarge) => {
                SlideLayout::SidePanel { image_fraction: 1.0 / 2.1 }
            }
            Some(ImageClassification::LargeSmall) => SlideLayout::Stacked {
                image_fraction: 1.0 / 2.1,
                gap: PANEL_GAP_IN,
            },
            Some(ImageClassification::LargeLarge) if bullet_count > STACKED_BULLET_LIMIT => {
                SlideLayout::SidePanel { image_fraction: 0.55 }
            }
            Some(ImageClassification::LargeLarge) => SlideLayout::Stacked {
                image_fraction: 0.7,
                gap: 0.0,
            },
        }
    }

    /// Whether this layout needs a [`PanelSide`].
    pub fn is_side_by_side(&self) -> bool {
        matches!(self, SlideLayout::SidePanel { .. })
    }

    /// Compute the image panel and bullet area on a canvas.
    ///
    /// `side` is only consulted for side-by-side layouts.
    pub fn place(&self, canvas: &Canvas, side: PanelSide) -> Placement {
        let left = canvas.margin_in;
        let top = canvas.content_top();
        let width = canvas.usable_width();
        let height = canvas.usable_height();

        match *self {
            SlideLayout::TextOnly => Placement {
                image_panel: None,
                bullets: Rect::new(left, top, width, height),
            },
            SlideLayout::SidePanel { image_fraction } => {
                let panel_w = width * image_fraction;
                let text_w = width - panel_w - PANEL_GAP_IN;
                let (image_x, text_x) = match side {
                    PanelSide::Left => (left, left + panel_w + PANEL_GAP_IN),
                    PanelSide::Right => (left + text_w + PANEL_GAP_IN, left),
                };
                Placement {
                    image_panel: Some(Rect::new(image_x, top, panel_w, height)),
                    bullets: Rect::new(text_x, top, text_w, height),
                }
            }
            SlideLayout::Stacked { image_fraction, gap } => {
                let panel_h = height * image_fraction;
                let text_h = height - panel_h - gap;
                Placement {
                    image_panel: Some(Rect::new(left, top, width, panel_h)),
                    bullets: Rect::new(left, top + panel_h + gap, width, text_h),
                }
            }
        }
    }
}

/// Where the image panel and bullet text box go on a slide.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub image_panel: Option<Rect>,
    pub bullets: Rect,
}

/// Scale an image to fit inside a panel, preserving aspect ratio, and centre it.
///
/// Scaling happens in pixel space at `dpi`.
pub fn fit_image(panel: Rect, width_px: u32, height_px: u32, dpi: f64) -> Rect {
    let w_px = width_px.max(1) as f64;
    let h_px = height_px.max(1) as f64;
    let scale = (panel.width * dpi / w_px).min(panel.height * dpi / h_px);

    let width = w_px * scale / dpi;
    let height = h_px * scale / dpi;

    Rect::new(
        panel.x + (panel.width - width) / 2.0,
        panel.y + (panel.height - height) / 2.0,
        width,
        height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_layout_choice() {
        use ImageClassification::*;

        assert_eq!(SlideLayout::choose(None, 3), SlideLayout::TextOnly);
        assert!(SlideLayout::choose(Some(SmallSmall), 0).is_side_by_side());
        assert!(SlideLayout::choose(Some(SmallLarge), 9).is_side_by_side());
        assert!(matches!(
            SlideLayout::choose(Some(LargeSmall), 2),
            SlideLayout::Stacked { .. }
        ));
        assert_eq!(
            SlideLayout::choose(Some(LargeLarge), 5),
            SlideLayout::SidePanel { image_fraction: 0.55 }
        );
        assert_eq!(
            SlideLayout::choose(Some(LargeLarge), 4),
            SlideLayout::Stacked { image_fraction: 0.7, gap: 0.0 }
        );
    }

    #[test]
    fn test_text_only_fills_content_area() {
        let canvas = Canvas::default();
        let placement = SlideLayout::TextOnly.place(&canvas, PanelSide::Left);

        assert_eq!(placement.image_panel, None);
        assert!(approx(placement.bullets.x, 0.5));
        assert!(approx(placement.bullets.y, 1.3));
        assert!(approx(placement.bullets.width, 9.0));
        assert!(approx(placement.bullets.height, 5.7));
    }

    #[test]
    fn test_side_panel_sides_mirror() {
        let canvas = Canvas::default();
        let layout = SlideLayout::SidePanel { image_fraction: 0.55 };

        let left = layout.place(&canvas, PanelSide::Left);
        let right = layout.place(&canvas, PanelSide::Right);
        let left_img = left.image_panel.unwrap();
        let right_img = right.image_panel.unwrap();

        assert!(approx(left_img.width, 9.0 * 0.55));
        assert!(approx(left_img.x, 0.5));
        assert!(approx(left.bullets.x, 0.5 + 4.95 + 0.2));
        assert!(approx(right.bullets.x, 0.5));
        assert!(approx(right_img.x + right_img.width, 9.5));
    }

    #[test]
    fn test_large_large_stacked_uses_seventy_percent() {
        let canvas = Canvas::default();
        let placement = SlideLayout::choose(Some(ImageClassification::LargeLarge), 2)
            .place(&canvas, PanelSide::Right);
        let panel = placement.image_panel.unwrap();

        assert!(approx(panel.height, 5.7 * 0.7));
        assert!(approx(placement.bullets.y, 1.3 + 5.7 * 0.7));
        assert!(approx(panel.height + placement.bullets.height, 5.7));
    }

    #[test]
    fn test_fit_image_preserves_aspect_and_centres() {
        let panel = Rect::new(1.0, 1.0, 4.0, 4.0);
        let fitted = fit_image(panel, 800, 200, 96.0);

        assert!(approx(fitted.width, 4.0));
        assert!(approx(fitted.height, 1.0));
        assert!(approx(fitted.x, 1.0));
        assert!(approx(fitted.y, 2.5));
    }

    #[test]
    fn test_fit_image_upscales_small_images() {
        let panel = Rect::new(0.0, 0.0, 2.0, 4.0);
        let fitted = fit_image(panel, 10, 10, 96.0);

        assert!(approx(fitted.width, 2.0));
        assert!(approx(fitted.height, 2.0));
        assert!(approx(fitted.y, 1.0));
    }

    #[test]
    fn test_seeded_side_is_reproducible() {
        let a: Vec<_> = {
            let mut rng = StdRng::seed_from_u64(7);
            (0..16).map(|_| PanelSide::random(&mut rng)).collect()
        };
        let b: Vec<_> = {
            let mut rng = StdRng::seed_from_u64(7);
            (0..16).map(|_| PanelSide::random(&mut rng)).collect()
        };
        assert_eq!(a, b);
    }
}
