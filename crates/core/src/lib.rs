//! Core domain types, bullet parsing, image classification and layout
//! geometry for slide generation.

pub mod bullets;
pub mod classify;
pub mod error;
pub mod layout;
pub mod types;

pub use bullets::{parse_bullets, BulletLine};
pub use classify::{classify_image, Canvas, ImageClassification, DPI};
pub use error::{Error, Result};
pub use layout::{fit_image, PanelSide, Placement, Rect, SlideLayout};
pub use types::{parse_plan, read_plan, write_plan, SlideSpec, PLAN_FILE_NAME};
