//! Domain types shared by the extractor, renderer and pipelines.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Conventional file name of a persisted slide plan inside a job directory.
pub const PLAN_FILE_NAME: &str = "slides.json";

/// Content for a single slide, as produced by the model or supplied by a caller.
///
/// Serializes to the slide-plan wire format (`slide_title`, `slide_content`,
/// `speaker_notes`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideSpec {
    /// Slide title.
    #[serde(rename = "slide_title", default = "default_title")]
    pub title: String,

    /// Raw bullet lines, possibly carrying indentation and list markers.
    #[serde(rename = "slide_content", default)]
    pub bullets: Vec<String>,

    /// Speaker notes written verbatim to the notes area.
    #[serde(rename = "speaker_notes", default, skip_serializing_if = "Option::is_none")]
    pub speaker_notes: Option<String>,
}

fn default_title() -> String {
    " ".to_string()
}

impl SlideSpec {
    /// Create a spec with a title and bullets but no notes.
    pub fn new(title: impl Into<String>, bullets: Vec<String>) -> Self {
        Self {
            title: title.into(),
            bullets,
            speaker_notes: None,
        }
    }

    /// Attach speaker notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.speaker_notes = Some(notes.into());
        self
    }

    /// Notes text, treating an empty string as absent.
    pub fn notes(&self) -> Option<&str> {
        self.speaker_notes.as_deref().filter(|n| !n.is_empty())
    }
}

/// Parse a slide plan from its JSON wire format.
pub fn parse_plan(json: &str) -> Result<Vec<SlideSpec>> {
    Ok(serde_json::from_str(json)?)
}

/// Read a slide plan from disk.
pub fn read_plan(path: &Path) -> Result<Vec<SlideSpec>> {
    let content = fs::read_to_string(path)?;
    parse_plan(&content)
}

/// Write a slide plan to disk as pretty-printed JSON.
pub fn write_plan(path: &Path, specs: &[SlideSpec]) -> Result<()> {
    let json = serde_json::to_string_pretty(specs)?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format_keys() {
        let spec = SlideSpec::new("T", vec!["- A".into(), "- B".into()]).with_notes("N");
        let json = serde_json::to_value(&spec).unwrap();

        assert_eq!(json["slide_title"], "T");
        assert_eq!(json["slide_content"][1], "- B");
        assert_eq!(json["speaker_notes"], "N");
    }

    #[test]
    fn test_parse_plan_with_missing_fields() {
        let plan = parse_plan(r#"[{"slide_title": "Only title"}, {"slide_content": ["x"]}]"#).unwrap();

        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].title, "Only title");
        assert!(plan[0].bullets.is_empty());
        assert_eq!(plan[0].speaker_notes, None);
        assert_eq!(plan[1].title, " ");
    }

    #[test]
    fn test_plan_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PLAN_FILE_NAME);
        let plan = vec![
            SlideSpec::new("Intro", vec!["Hello".into()]).with_notes("Say hi"),
            SlideSpec::new("Outro", vec![]),
        ];

        write_plan(&path, &plan).unwrap();
        assert_eq!(read_plan(&path).unwrap(), plan);
    }

    #[test]
    fn test_empty_notes_are_absent() {
        let spec = SlideSpec::new("T", vec![]).with_notes("");
        assert_eq!(spec.notes(), None);
    }
}
