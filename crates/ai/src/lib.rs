//! Generative model access for slide planning and speaker notes.
//!
//! Pipelines talk to a [`GenerativeModel`]; [`GeminiClient`] is the
//! production implementation over the Gemini REST API.

pub mod gemini;
pub mod model;
pub mod notes;
pub mod plan;

pub use gemini::{GeminiClient, GeminiConfig};
pub use model::{GenerativeModel, InlineImage, Prompt};
pub use notes::{generate_speaker_notes, notes_failure_text, notes_prompt};
pub use plan::{generate_content_for_batch, PlanGenerator, PlanOptions};
