//! The three slide pipelines and the job layer that feeds them.
//!
//! - [`enhance`]: clean up an existing deck and add branding and notes.
//! - [`plan`]: turn a source document and images into a slide plan.
//! - [`build`]: render a slide plan and its images into a new deck.
//!
//! [`job`] wraps each pipeline with object-store transfers and a temporary
//! working directory.

pub mod build;
pub mod enhance;
pub mod job;
pub mod plan;

pub use build::{build, build_from_job_dir, build_with, list_images, DEFAULT_OUTPUT_NAME};
pub use enhance::{EnhanceOptions, Enhancer};
pub use job::{build_job, enhance_job, plan_job, JobDir, LocalStore, ObjectStore};
pub use plan::generate_plan_file;
