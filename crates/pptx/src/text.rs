//! Text frame builders.

use crate::xml::XmlElement;

/// Horizontal paragraph alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
}

impl Alignment {
    fn as_attr(&self) -> &'static str {
        match self {
            Alignment::Left => "l",
            Alignment::Center => "ctr",
            Alignment::Right => "r",
        }
    }
}

/// A run of uniformly formatted text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub size_pt: Option<f64>,
    pub color: Option<[u8; 3]>,
    pub hyperlink: Option<String>,
}

impl TextRun {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_size(mut self, size_pt: f64) -> Self {
        self.size_pt = Some(size_pt);
        self
    }

    pub fn with_color(mut self, rgb: [u8; 3]) -> Self {
        self.color = Some(rgb);
        self
    }

    /// Make the run a link to an external address.
    pub fn with_hyperlink(mut self, url: impl Into<String>) -> Self {
        self.hyperlink = Some(url.into());
        self
    }
}

/// A paragraph of runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paragraph {
    pub runs: Vec<TextRun>,
    pub level: u8,
    pub alignment: Option<Alignment>,
    pub space_after_pt: Option<f64>,
}

impl Paragraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a run to the paragraph.
    pub fn with_run(mut self, run: TextRun) -> Self {
        self.runs.push(run);
        self
    }

    /// Indentation level; also indents the left margin by half an inch per level.
    pub fn with_level(mut self, level: u8) -> Self {
        self.level = level;
        self
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = Some(alignment);
        self
    }

    pub fn with_space_after(mut self, points: f64) -> Self {
        self.space_after_pt = Some(points);
        self
    }
}

/// Body of a text box.
#[derive(Debug, Clone, PartialEq)]
pub struct TextFrame {
    pub paragraphs: Vec<Paragraph>,
    pub word_wrap: bool,
}

impl Default for TextFrame {
    fn default() -> Self {
        Self {
            paragraphs: Vec::new(),
            word_wrap: true,
        }
    }
}

impl TextFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_paragraph(mut self, paragraph: Paragraph) -> Self {
        self.paragraphs.push(paragraph);
        self
    }

    pub fn with_word_wrap(mut self, wrap: bool) -> Self {
        self.word_wrap = wrap;
        self
    }

    /// Build the `p:txBody` element.
    ///
    /// `link` registers a hyperlink target with the owning part and returns
    /// its relationship id.
    pub(crate) fn to_element(&self, link: &mut dyn FnMut(&str) -> String) -> XmlElement {
        let mut body = XmlElement::new("p:txBody")
            .with_child(
                XmlElement::new("a:bodyPr")
                    .with_attr("wrap", if self.word_wrap { "square" } else { "none" })
                    .with_attr("rtlCol", "0"),
            )
            .with_child(XmlElement::new("a:lstStyle"));

        if self.paragraphs.is_empty() {
            body.push(XmlElement::new("a:p"));
        }
        for paragraph in &self.paragraphs {
            body.push(paragraph_element(paragraph, link));
        }
        body
    }
}

/// Body text of a notes placeholder: one paragraph per line.
pub(crate) fn plain_paragraphs(text: &str) -> Vec<XmlElement> {
    text.split('\n')
        .map(|line| {
            let line = line.trim_end_matches('\r');
            let mut p = XmlElement::new("a:p");
            if !line.is_empty() {
                p.push(
                    XmlElement::new("a:r")
                        .with_child(XmlElement::new("a:rPr").with_attr("lang", "en-US").with_attr("dirty", "0"))
                        .with_child(XmlElement::new("a:t").with_text(line)),
                );
            }
            p
        })
        .collect()
}

fn paragraph_element(paragraph: &Paragraph, link: &mut dyn FnMut(&str) -> String) -> XmlElement {
    let mut p = XmlElement::new("a:p");

    let mut props = XmlElement::new("a:pPr");
    if paragraph.level > 0 {
        props.set_attr("marL", (paragraph.level as i64 * 457_200).to_string());
        props.set_attr("lvl", paragraph.level.to_string());
    }
    if let Some(alignment) = paragraph.alignment {
        props.set_attr("algn", alignment.as_attr());
    }
    if let Some(points) = paragraph.space_after_pt {
        props.push(
            XmlElement::new("a:spcAft").with_child(
                XmlElement::new("a:spcPts").with_attr("val", ((points * 100.0).round() as i64).to_string()),
            ),
        );
    }
    if !props.attributes.is_empty() || !props.children.is_empty() {
        p.push(props);
    }

    for run in &paragraph.runs {
        p.push(run_element(run, link));
    }
    p
}

fn run_element(run: &TextRun, link: &mut dyn FnMut(&str) -> String) -> XmlElement {
    let mut props = XmlElement::new("a:rPr").with_attr("lang", "en-US");
    if let Some(size) = run.size_pt {
        props.set_attr("sz", ((size * 100.0).round() as i64).to_string());
    }
    props.set_attr("dirty", "0");

    if let Some([r, g, b]) = run.color {
        props.push(
            XmlElement::new("a:solidFill").with_child(
                XmlElement::new("a:srgbClr").with_attr("val", format!("{:02X}{:02X}{:02X}", r, g, b)),
            ),
        );
    }
    if let Some(url) = &run.hyperlink {
        let id = link(url);
        props.push(XmlElement::new("a:hlinkClick").with_attr("r:id", id));
    }

    XmlElement::new("a:r")
        .with_child(props)
        .with_child(XmlElement::new("a:t").with_text(run.text.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::text_frame_text;

    #[test]
    fn test_frame_text_and_attributes() {
        let frame = TextFrame::new()
            .with_paragraph(
                Paragraph::new()
                    .with_run(TextRun::new("• Top").with_size(24.0))
                    .with_space_after(4.0),
            )
            .with_paragraph(
                Paragraph::new()
                    .with_level(2)
                    .with_alignment(Alignment::Left)
                    .with_run(TextRun::new("▪ Deep")),
            );

        let body = frame.to_element(&mut |_: &str| unreachable!());
        assert_eq!(text_frame_text(&body), "• Top\n▪ Deep");

        let paras = body.descendants("pPr");
        assert_eq!(paras[0].find(&["spcAft", "spcPts"]).unwrap().attr("val"), Some("400"));
        assert_eq!(paras[1].attr("lvl"), Some("2"));
        assert_eq!(paras[1].attr("marL"), Some("914400"));
        assert_eq!(paras[1].attr("algn"), Some("l"));
        assert_eq!(body.descendants("rPr")[0].attr("sz"), Some("2400"));
    }

    #[test]
    fn test_hyperlink_registers_relationship() {
        let frame = TextFrame::new().with_paragraph(
            Paragraph::new().with_run(
                TextRun::new("Acme")
                    .with_color([150, 150, 150])
                    .with_hyperlink("https://acme.com"),
            ),
        );

        let mut seen = Vec::new();
        let body = frame.to_element(&mut |url: &str| {
            seen.push(url.to_string());
            "rId7".to_string()
        });

        assert_eq!(seen, vec!["https://acme.com"]);
        let link = &body.descendants("hlinkClick")[0];
        assert_eq!(link.attr("r:id"), Some("rId7"));
        assert_eq!(body.descendants("srgbClr")[0].attr("val"), Some("969696"));
    }

    #[test]
    fn test_runs_are_appended_in_order() {
        let para = Paragraph::new()
            .with_run(TextRun::new("Bold "))
            .with_run(TextRun::new("claim"));
        assert_eq!(para.runs.len(), 2);

        let body = TextFrame::new()
            .with_paragraph(para)
            .to_element(&mut |_: &str| unreachable!());
        assert_eq!(body.descendants("r").len(), 2);
        assert_eq!(text_frame_text(&body), "Bold claim");
    }

    #[test]
    fn test_plain_paragraphs() {
        let paras = plain_paragraphs("one\n\nthree");
        assert_eq!(paras.len(), 3);
        assert_eq!(paras[0].text(), "one");
        assert!(paras[1].children.is_empty());
    }
}
