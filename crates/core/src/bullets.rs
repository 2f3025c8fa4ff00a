//! Bullet line parsing.
//!
//! Turns a raw bullet string such as `"  - Sub item"` into an indentation
//! level, a display glyph and the clean text. Two spaces or one tab make one
//! level; levels stop at 4. One leading list marker is stripped.

use regex::Regex;
use std::sync::LazyLock;

/// Deepest supported indentation level.
pub const MAX_LEVEL: u8 = 4;

/// Literal list markers, checked in order.
const LITERAL_MARKERS: &[&str] = &["- ", "* ", "• ", "– "];

/// Glyph drawn in front of each level's text.
const LEVEL_GLYPHS: [char; 5] = ['•', '◦', '▪', '–', '•'];

/// Regex for numeric markers like `1. ` or `2) `.
static NUMERIC_MARKER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+[.)]\s+").unwrap());

/// A parsed bullet ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulletLine {
    /// Indentation level, 0 through [`MAX_LEVEL`].
    pub level: u8,

    /// Glyph prepended to the text when rendered.
    pub glyph: char,

    /// Display text with indentation and marker removed.
    pub text: String,
}

impl BulletLine {
    /// Parse one raw bullet line.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim_end();
        let body = raw.trim_start_matches([' ', '\t']);
        let indent = &raw[..raw.len() - body.len()];

        let width: usize = indent.chars().map(|c| if c == '\t' { 2 } else { 1 }).sum();
        let level = (width / 2).min(MAX_LEVEL as usize) as u8;

        Self {
            level,
            glyph: glyph_for_level(level),
            text: strip_marker(body).to_string(),
        }
    }

    /// Text as rendered on the slide, glyph first.
    pub fn display_text(&self) -> String {
        format!("{} {}", self.glyph, self.text)
    }
}

/// Parse every raw line of a bullet list.
pub fn parse_bullets<S: AsRef<str>>(lines: &[S]) -> Vec<BulletLine> {
    lines.iter().map(|l| BulletLine::parse(l.as_ref())).collect()
}

/// Glyph for a level; levels beyond the table fall back to the top-level dot.
pub fn glyph_for_level(level: u8) -> char {
    LEVEL_GLYPHS
        .get(level as usize)
        .copied()
        .unwrap_or(LEVEL_GLYPHS[0])
}

/// Strip at most one leading list marker.
fn strip_marker(text: &str) -> &str {
    for marker in LITERAL_MARKERS {
        if let Some(rest) = text.strip_prefix(marker) {
            return rest.trim_start();
        }
    }

    match NUMERIC_MARKER_REGEX.find(text) {
        Some(m) => text[m.end()..].trim_start(),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dash_with_two_spaces() {
        let line = BulletLine::parse("  - Sub item");
        assert_eq!(line.level, 1);
        assert_eq!(line.text, "Sub item");
        assert_eq!(line.glyph, '◦');
    }

    #[test]
    fn test_numeric_marker() {
        let line = BulletLine::parse("1. First");
        assert_eq!(line.level, 0);
        assert_eq!(line.text, "First");

        let line = BulletLine::parse("12) Twelfth");
        assert_eq!(line.text, "Twelfth");
    }

    #[test]
    fn test_tabs_count_as_two_spaces() {
        let line = BulletLine::parse("\t\t* Deep");
        assert_eq!(line.level, 2);
        assert_eq!(line.text, "Deep");
        assert_eq!(line.glyph, '▪');
    }

    #[test]
    fn test_level_is_capped() {
        let line = BulletLine::parse("                  • Way down");
        assert_eq!(line.level, MAX_LEVEL);
        assert_eq!(line.text, "Way down");
    }

    #[test]
    fn test_odd_indent_rounds_down() {
        assert_eq!(BulletLine::parse("   x").level, 1);
        assert_eq!(BulletLine::parse(" x").level, 0);
    }

    #[test]
    fn test_only_one_marker_stripped() {
        assert_eq!(BulletLine::parse("- - nested dash").text, "- nested dash");
        assert_eq!(BulletLine::parse("– 1. both").text, "1. both");
    }

    #[test]
    fn test_marker_requires_following_space() {
        assert_eq!(BulletLine::parse("-dash").text, "-dash");
        assert_eq!(BulletLine::parse("3.14 is pi").text, "3.14 is pi");
    }

    #[test]
    fn test_trailing_whitespace_removed() {
        let line = BulletLine::parse("* Item   \t");
        assert_eq!(line.text, "Item");
        assert_eq!(line.display_text(), "• Item");
    }

    #[test]
    fn test_parse_bullets_preserves_order() {
        let lines = parse_bullets(&["- A", "  - B", "C"]);
        let texts: Vec<_> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["A", "B", "C"]);
    }
}
