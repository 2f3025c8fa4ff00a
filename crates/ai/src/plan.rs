//! Slide plan generation from source text and images.
//!
//! Images are sent in batches. Each batch asks the model for one slide per
//! image; a batch that fails in any way is replaced by placeholder slides so
//! the plan always has one entry per image.

use crate::model::{GenerativeModel, InlineImage, Prompt};
use slidecraft_core::{parse_plan, Error, Result, SlideSpec};
use std::path::Path;
use std::thread;
use std::time::Duration;

pub const ERROR_SLIDE_TITLE: &str = "AI Generation Error";
pub const ERROR_SLIDE_CONTENT: &str = "The AI failed to generate content for this batch.";
pub const ERROR_SLIDE_NOTES: &str = "This might be due to an API issue or a problem with the prompt.";

/// Batching settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanOptions {
    /// Images per model call.
    pub batch_size: usize,
    /// Pause between consecutive calls.
    pub batch_delay: Duration,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            batch_size: 5,
            batch_delay: Duration::from_secs(2),
        }
    }
}

impl PlanOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_batch_delay(mut self, batch_delay: Duration) -> Self {
        self.batch_delay = batch_delay;
        self
    }
}

/// Prompt asking for one slide per attached image.
pub fn build_plan_prompt(source_text: &str, image_count: usize) -> String {
    format!(
        r#"You are a professional-grade assistant skilled at converting raw material (text, PDFs, transcripts, or links) into presentation JSON.

<instructions>
Return a valid JSON array that turns the source text into slides matching the {count} images provided. The number of slides must equal the number of images attached, in the same order.

Follow these rules:
 - JSON: double quotes only (standard ASCII, no smart quotes); no markdown, comments or unescaped backslashes.
 - Slides: 2-5 bullets (under 80 characters each) explaining the image's content using the source text. Use sub-bullets if necessary.
 - Speaker notes: a detailed paragraph for each slide.
 - Narrative flow: the content should flow logically from one slide to the next.
</instructions>

<output_example>
[
  {{
    "slide_title": "Required: Title (2-3 Words Max)",
    "slide_content": [
      "Bullet 1 - 40 chars max",
      "Bullet 2 - 40 chars max",
      "  - Sub-bullet - 80 chars max"
    ],
    "speaker_notes": "Required: Detailed paragraph covering everything in the source related to the image for this slide."
  }}
]
</output_example>

**SOURCE MATERIAL:**
---
{source}
---

**IMAGE CATALOG:**
[Image 1, Image 2, ...]

Now generate ONLY the raw JSON output based on these instructions."#,
        count = image_count,
        source = source_text
    )
}

/// Strip code-fence markers the model wraps around JSON.
pub fn clean_json_response(text: &str) -> String {
    text.trim()
        .replace("```json", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// One placeholder slide per image of a failed batch.
pub fn placeholder_specs(count: usize) -> Vec<SlideSpec> {
    let placeholder = SlideSpec::new(ERROR_SLIDE_TITLE, vec![ERROR_SLIDE_CONTENT.to_string()])
        .with_notes(ERROR_SLIDE_NOTES);
    vec![placeholder; count]
}

fn try_generate_batch<M, P>(model: &M, source_text: &str, images: &[P]) -> Result<Vec<SlideSpec>>
where
    M: GenerativeModel + ?Sized,
    P: AsRef<Path>,
{
    let mut prompt = Prompt::new(build_plan_prompt(source_text, images.len()));
    for path in images {
        match InlineImage::open(path.as_ref()) {
            Ok(image) => prompt = prompt.with_image(image),
            Err(e) => log::warn!("Could not attach image, skipping: {}", e),
        }
    }

    let response = model.generate(&prompt)?;
    parse_plan(&clean_json_response(&response))
        .map_err(|e| Error::AiGenerationError(format!("Model returned invalid slide JSON: {}", e)))
}

/// Slides for one batch of images. Never fails: errors become placeholders.
///
/// The model's slides are taken as returned, even when their count differs
/// from the number of images.
pub fn generate_content_for_batch<M, P>(model: &M, source_text: &str, images: &[P]) -> Vec<SlideSpec>
where
    M: GenerativeModel + ?Sized,
    P: AsRef<Path>,
{
    match try_generate_batch(model, source_text, images) {
        Ok(specs) => {
            if specs.len() != images.len() {
                log::warn!(
                    "Model returned {} slides for {} images",
                    specs.len(),
                    images.len()
                );
            }
            specs
        }
        Err(e) => {
            log::error!("An error occurred while generating content for a batch: {}", e);
            placeholder_specs(images.len())
        }
    }
}

/// Runs batched plan generation against a model.
pub struct PlanGenerator<M> {
    model: M,
    options: PlanOptions,
}

impl<M: GenerativeModel> PlanGenerator<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            options: PlanOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PlanOptions) -> Self {
        self.options = options;
        self
    }

    /// Slide specs for every image, batch results concatenated in order.
    pub fn generate_plan<P: AsRef<Path>>(&self, source_text: &str, images: &[P]) -> Vec<SlideSpec> {
        let batch_size = self.options.batch_size.max(1);
        let batches = images.len().div_ceil(batch_size);
        let mut plan = Vec::with_capacity(images.len());

        for (index, batch) in images.chunks(batch_size).enumerate() {
            if index > 0 && !self.options.batch_delay.is_zero() {
                thread::sleep(self.options.batch_delay);
            }
            log::info!(
                "Generating batch {}/{} ({} images)",
                index + 1,
                batches,
                batch.len()
            );
            plan.extend(generate_content_for_batch(&self.model, source_text, batch));
        }
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::PathBuf;

    /// Answers with one slide per attached image, recording each prompt.
    struct EchoModel {
        calls: RefCell<Vec<usize>>,
    }

    impl GenerativeModel for EchoModel {
        fn generate(&self, prompt: &Prompt) -> Result<String> {
            self.calls.borrow_mut().push(prompt.images.len());
            let slides: Vec<_> = (0..prompt.images.len())
                .map(|i| SlideSpec::new(format!("Slide {}", i), vec!["- point".to_string()]))
                .collect();
            Ok(format!("```json\n{}\n```", serde_json::to_string(&slides).unwrap()))
        }
    }

    struct FailingModel;

    impl GenerativeModel for FailingModel {
        fn generate(&self, _prompt: &Prompt) -> Result<String> {
            Err(Error::AiGenerationError("quota exceeded".to_string()))
        }
    }

    struct GarbageModel;

    impl GenerativeModel for GarbageModel {
        fn generate(&self, _prompt: &Prompt) -> Result<String> {
            Ok("Sure! Here are your slides: [oops".to_string())
        }
    }

    fn images(dir: &Path, count: usize) -> Vec<PathBuf> {
        (0..count)
            .map(|i| {
                let path = dir.join(format!("img{:02}.png", i));
                image::RgbImage::new(4, 4).save(&path).unwrap();
                path
            })
            .collect()
    }

    #[test]
    fn test_clean_json_response() {
        assert_eq!(clean_json_response("```json\n[1]\n```"), "[1]");
        assert_eq!(clean_json_response("  [2] "), "[2]");
    }

    #[test]
    fn test_prompt_mentions_count_and_source() {
        let prompt = build_plan_prompt("The mitochondria", 3);
        assert!(prompt.contains("the 3 images"));
        assert!(prompt.contains("---\nThe mitochondria\n---"));
        assert!(prompt.contains("\"slide_title\""));
    }

    #[test]
    fn test_failed_batch_yields_placeholders() {
        let dir = tempfile::tempdir().unwrap();
        let imgs = images(dir.path(), 3);

        let specs = generate_content_for_batch(&FailingModel, "text", &imgs);
        assert_eq!(specs.len(), 3);
        for spec in &specs {
            assert_eq!(spec.title, "AI Generation Error");
            assert_eq!(spec.bullets, vec![ERROR_SLIDE_CONTENT]);
            assert_eq!(spec.notes(), Some(ERROR_SLIDE_NOTES));
        }
    }

    #[test]
    fn test_malformed_json_yields_placeholders() {
        let dir = tempfile::tempdir().unwrap();
        let imgs = images(dir.path(), 2);

        let specs = generate_content_for_batch(&GarbageModel, "text", &imgs);
        assert_eq!(specs.len(), 2);
        assert!(specs.iter().all(|s| s.title == ERROR_SLIDE_TITLE));
    }

    #[test]
    fn test_plan_batches_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let imgs = images(dir.path(), 7);
        let model = EchoModel {
            calls: RefCell::new(Vec::new()),
        };

        let options = PlanOptions::new()
            .with_batch_size(3)
            .with_batch_delay(Duration::ZERO);
        let plan = PlanGenerator::new(&model)
            .with_options(options)
            .generate_plan("source", &imgs);

        assert_eq!(plan.len(), 7);
        assert_eq!(*model.calls.borrow(), vec![3, 3, 1]);
        assert_eq!(plan[3].title, "Slide 0");
    }

    #[test]
    fn test_unreadable_image_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut imgs = images(dir.path(), 1);
        imgs.push(dir.path().join("missing.png"));
        let model = EchoModel {
            calls: RefCell::new(Vec::new()),
        };

        let specs = generate_content_for_batch(&model, "text", &imgs);
        assert_eq!(*model.calls.borrow(), vec![1]);
        assert_eq!(specs.len(), 1);
    }

    #[test]
    fn test_batch_size_floor() {
        assert_eq!(PlanOptions::new().with_batch_size(0).batch_size, 1);
    }
}
