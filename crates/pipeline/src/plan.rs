//! Plan generation pipeline: source document plus images to `slides.json`.

use slidecraft_ai::{GenerativeModel, PlanGenerator};
use slidecraft_core::{write_plan, Error, Result, SlideSpec};
use slidecraft_document::extract_text_or_empty;
use std::path::Path;

/// Extract the source text, generate a plan for `images` and write it to `output`.
///
/// An unreadable source degrades to empty text. An empty plan is an error and
/// nothing is written.
pub fn generate_plan_file<M, P>(
    generator: &PlanGenerator<M>,
    source: &Path,
    images: &[P],
    output: &Path,
) -> Result<Vec<SlideSpec>>
where
    M: GenerativeModel,
    P: AsRef<Path>,
{
    let text = extract_text_or_empty(source);
    log::info!(
        "Generating plan from {} ({} chars) for {} images",
        source.display(),
        text.chars().count(),
        images.len()
    );

    let plan = generator.generate_plan(&text, images);
    if plan.is_empty() {
        return Err(Error::AiGenerationError(
            "Failed to generate a slide plan.".to_string(),
        ));
    }

    write_plan(output, &plan)?;
    log::info!("Wrote {} slides to {}", plan.len(), output.display());
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use slidecraft_ai::{PlanOptions, Prompt};
    use slidecraft_core::read_plan;
    use std::cell::RefCell;
    use std::fs;
    use std::time::Duration;

    struct SourceEcho {
        seen: RefCell<Option<String>>,
    }

    impl GenerativeModel for SourceEcho {
        fn generate(&self, prompt: &Prompt) -> Result<String> {
            *self.seen.borrow_mut() = Some(prompt.text.clone());
            Ok(r#"[{"slide_title": "Cells", "slide_content": ["- Nucleus"], "speaker_notes": "About cells"}]"#.to_string())
        }
    }

    #[test]
    fn test_plan_written_from_source_text() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.txt");
        fs::write(&source, "The nucleus holds DNA.").unwrap();
        let image = dir.path().join("1.png");
        image::RgbImage::new(2, 2).save(&image).unwrap();
        let output = dir.path().join("slides.json");

        let model = SourceEcho {
            seen: RefCell::new(None),
        };
        let generator = PlanGenerator::new(&model)
            .with_options(PlanOptions::new().with_batch_delay(Duration::ZERO));
        let plan = generate_plan_file(&generator, &source, &[&image], &output).unwrap();

        assert_eq!(plan.len(), 1);
        assert_eq!(read_plan(&output).unwrap(), plan);
        let prompt = model.seen.borrow().clone().unwrap();
        assert!(prompt.contains("The nucleus holds DNA."));
    }

    #[test]
    fn test_no_images_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.txt");
        fs::write(&source, "text").unwrap();
        let output = dir.path().join("slides.json");

        let model = SourceEcho {
            seen: RefCell::new(None),
        };
        let no_images: &[&Path] = &[];
        let result = generate_plan_file(&PlanGenerator::new(&model), &source, no_images, &output);

        assert!(matches!(result, Err(Error::AiGenerationError(_))));
        assert!(!output.exists());
    }
}
