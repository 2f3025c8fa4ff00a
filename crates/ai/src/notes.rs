//! Speaker note generation for existing slides.

use crate::model::{GenerativeModel, Prompt};
use slidecraft_core::{Error, Result};

pub fn notes_prompt(slide_text: &str) -> String {
    format!(
        "Generate a concise, professional speaker note for a presentation slide with the following content:\n\n---\n{}\n---",
        slide_text
    )
}

/// Notes for a slide's text. Slides without text, and empty answers, give `None`.
pub fn generate_speaker_notes<M>(model: &M, slide_text: &str) -> Result<Option<String>>
where
    M: GenerativeModel + ?Sized,
{
    if slide_text.trim().is_empty() {
        return Ok(None);
    }
    let text = model.generate(&Prompt::new(notes_prompt(slide_text)))?;
    Ok(Some(text).filter(|t| !t.trim().is_empty()))
}

/// Text written into the notes area when generation fails.
pub fn notes_failure_text(error: &Error) -> String {
    format!("Could not generate speaker notes: {}", error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct Recorder {
        prompts: RefCell<Vec<String>>,
        answer: &'static str,
    }

    impl GenerativeModel for Recorder {
        fn generate(&self, prompt: &Prompt) -> Result<String> {
            self.prompts.borrow_mut().push(prompt.text.clone());
            Ok(self.answer.to_string())
        }
    }

    fn recorder(answer: &'static str) -> Recorder {
        Recorder {
            prompts: RefCell::new(Vec::new()),
            answer,
        }
    }

    #[test]
    fn test_prompt_fences_slide_text() {
        let model = recorder("Talk about Q3.");
        let notes = generate_speaker_notes(&model, "Q3 Results\nRevenue up").unwrap();

        assert_eq!(notes.as_deref(), Some("Talk about Q3."));
        let prompts = model.prompts.borrow();
        assert!(prompts[0].ends_with("---\nQ3 Results\nRevenue up\n---"));
    }

    #[test]
    fn test_empty_slide_skips_model() {
        let model = recorder("unused");
        assert_eq!(generate_speaker_notes(&model, "  ").unwrap(), None);
        assert!(model.prompts.borrow().is_empty());
    }

    #[test]
    fn test_blank_answer_is_none() {
        let model = recorder("\n");
        assert_eq!(generate_speaker_notes(&model, "text").unwrap(), None);
    }

    #[test]
    fn test_failure_text() {
        let err = Error::AiGenerationError("timeout".to_string());
        assert_eq!(
            notes_failure_text(&err),
            "Could not generate speaker notes: AI generation error: timeout"
        );
    }
}
