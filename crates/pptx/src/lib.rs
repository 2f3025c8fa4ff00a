//! PPTX (Office Open XML) deck model and the operations the slide pipelines
//! run on it.
//!
//! A [`Deck`] is read from and written back to a ZIP package. On top of it
//! sit the slide renderer, perceptual image deduplication and the branding
//! passes (watermark removal, logo, credits).

pub mod branding;
pub mod deck;
pub mod dedup;
pub mod media;
pub mod package;
pub mod phash;
pub mod render;
pub mod shapes;
pub mod template;
pub mod text;
pub mod xml;

pub use branding::{
    add_credits_to_slide, add_logo, load_logo, remove_watermark_text,
    remove_watermarks_from_masters, WatermarkFilter, WATERMARK_KEYWORDS,
};
pub use deck::{ContainerRef, Deck};
pub use dedup::{dedup, DedupOptions, DedupReport, HashCluster, ImageHashRecord, ShapeRef};
pub use media::PictureData;
pub use phash::PerceptualHash;
pub use render::SlideRenderer;
pub use shapes::{EmuRect, Shape, ShapeKind};
pub use text::{Alignment, Paragraph, TextFrame, TextRun};
