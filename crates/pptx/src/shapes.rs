//! Shape tree model.
//!
//! A container's `p:spTree` is read into a tree of [`Shape`]s. Each shape
//! keeps its child-index path so it can be found again and removed from
//! its parent after the tree has been inspected.

use crate::xml::XmlElement;
use slidecraft_core::Rect;

/// English Metric Units per inch.
pub const EMU_PER_INCH: f64 = 914_400.0;

/// Shape elements that can appear in a shape tree.
const SHAPE_ELEMENTS: &[&str] = &["sp", "pic", "grpSp", "graphicFrame", "cxnSp", "contentPart"];

/// Position and size in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmuRect {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

impl EmuRect {
    pub fn new(x: i64, y: i64, cx: i64, cy: i64) -> Self {
        Self { x, y, cx, cy }
    }

    /// Convert a rectangle in inches.
    pub fn from_inches(rect: &Rect) -> Self {
        Self {
            x: inches(rect.x),
            y: inches(rect.y),
            cx: inches(rect.width),
            cy: inches(rect.height),
        }
    }
}

/// Inches to EMU.
pub fn inches(value: f64) -> i64 {
    (value * EMU_PER_INCH).round() as i64
}

/// What a shape is, as far as the pipelines care.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeKind {
    /// A picture; `embed` is the relationship id of its image.
    Picture { embed: Option<String> },
    /// A group of shapes.
    Group { children: Vec<Shape> },
    /// A shape with a text frame.
    Text { text: String },
    /// Anything else: tables, charts, connectors, empty autoshapes.
    Other,
}

/// A shape in a container's shape tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    /// Child indexes from the shape tree down to this shape.
    pub path: Vec<usize>,
    pub id: u32,
    pub name: String,
    pub kind: ShapeKind,
}

impl Shape {
    /// Text of a text shape.
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            ShapeKind::Text { text } => Some(text),
            _ => None,
        }
    }

    pub fn is_picture(&self) -> bool {
        matches!(self.kind, ShapeKind::Picture { .. })
    }

    pub fn embed(&self) -> Option<&str> {
        match &self.kind {
            ShapeKind::Picture { embed } => embed.as_deref(),
            _ => None,
        }
    }
}

/// Read the shapes directly under a shape tree (or group) element.
pub fn read_shapes(tree: &XmlElement) -> Vec<Shape> {
    read_shapes_at(tree, &[])
}

fn read_shapes_at(tree: &XmlElement, prefix: &[usize]) -> Vec<Shape> {
    let mut shapes = Vec::new();
    for (index, child) in tree.children.iter().enumerate() {
        let crate::xml::XmlNode::Element(el) = child else {
            continue;
        };
        if !SHAPE_ELEMENTS.contains(&el.local_name()) {
            continue;
        }

        let mut path = prefix.to_vec();
        path.push(index);

        let (id, name) = non_visual_props(el);
        let kind = match el.local_name() {
            "pic" => ShapeKind::Picture {
                embed: el
                    .find(&["blipFill", "blip"])
                    .and_then(|b| b.prefixed_attr("embed"))
                    .map(str::to_string),
            },
            "grpSp" => ShapeKind::Group {
                children: read_shapes_at(el, &path),
            },
            "sp" => match el.child("txBody") {
                Some(body) => ShapeKind::Text {
                    text: text_frame_text(body),
                },
                None => ShapeKind::Other,
            },
            _ => ShapeKind::Other,
        };

        shapes.push(Shape { path, id, name, kind });
    }
    shapes
}

/// Every picture in a shape list, descending into groups, in document order.
pub fn pictures(shapes: &[Shape]) -> Vec<&Shape> {
    let mut found = Vec::new();
    for shape in shapes {
        match &shape.kind {
            ShapeKind::Picture { .. } => found.push(shape),
            ShapeKind::Group { children } => found.extend(pictures(children)),
            _ => {}
        }
    }
    found
}

/// Text of a `txBody`, one line per paragraph.
pub fn text_frame_text(body: &XmlElement) -> String {
    body.elements()
        .filter(|e| e.local_name() == "p")
        .map(paragraph_text)
        .collect::<Vec<_>>()
        .join("\n")
}

fn paragraph_text(paragraph: &XmlElement) -> String {
    let mut text = String::new();
    for el in paragraph.elements() {
        match el.local_name() {
            "r" | "fld" => {
                if let Some(t) = el.child("t") {
                    text.push_str(&t.text());
                }
            }
            "br" => text.push('\u{b}'),
            _ => {}
        }
    }
    text
}

/// `id` and `name` from the shape's `cNvPr`.
fn non_visual_props(shape: &XmlElement) -> (u32, String) {
    shape
        .elements()
        .next()
        .and_then(|nv| nv.child("cNvPr"))
        .map(|props| {
            let id = props.attr("id").and_then(|v| v.parse().ok()).unwrap_or(0);
            let name = props.attr("name").unwrap_or_default().to_string();
            (id, name)
        })
        .unwrap_or((0, String::new()))
}

/// Largest shape id used anywhere under an element.
pub fn max_shape_id(root: &XmlElement) -> u32 {
    root.descendants("cNvPr")
        .iter()
        .filter_map(|p| p.attr("id").and_then(|v| v.parse().ok()))
        .max()
        .unwrap_or(0)
}

/// `a:xfrm` element for a position and size.
pub(crate) fn xfrm(rect: EmuRect) -> XmlElement {
    XmlElement::new("a:xfrm")
        .with_child(
            XmlElement::new("a:off")
                .with_attr("x", rect.x.to_string())
                .with_attr("y", rect.y.to_string()),
        )
        .with_child(
            XmlElement::new("a:ext")
                .with_attr("cx", rect.cx.to_string())
                .with_attr("cy", rect.cy.to_string()),
        )
}

fn rect_geometry() -> XmlElement {
    XmlElement::new("a:prstGeom")
        .with_attr("prst", "rect")
        .with_child(XmlElement::new("a:avLst"))
}

/// A `p:sp` text box around an already-built `p:txBody`.
pub(crate) fn textbox_element(id: u32, rect: EmuRect, body: XmlElement) -> XmlElement {
    XmlElement::new("p:sp")
        .with_child(
            XmlElement::new("p:nvSpPr")
                .with_child(
                    XmlElement::new("p:cNvPr")
                        .with_attr("id", id.to_string())
                        .with_attr("name", format!("TextBox {}", id - 1)),
                )
                .with_child(XmlElement::new("p:cNvSpPr").with_attr("txBox", "1"))
                .with_child(XmlElement::new("p:nvPr")),
        )
        .with_child(
            XmlElement::new("p:spPr")
                .with_child(xfrm(rect))
                .with_child(rect_geometry())
                .with_child(XmlElement::new("a:noFill")),
        )
        .with_child(body)
}

/// A `p:pic` referencing an image relationship.
pub(crate) fn picture_element(id: u32, rect: EmuRect, embed: &str, descr: &str) -> XmlElement {
    XmlElement::new("p:pic")
        .with_child(
            XmlElement::new("p:nvPicPr")
                .with_child(
                    XmlElement::new("p:cNvPr")
                        .with_attr("id", id.to_string())
                        .with_attr("name", format!("Picture {}", id - 1))
                        .with_attr("descr", descr),
                )
                .with_child(
                    XmlElement::new("p:cNvPicPr")
                        .with_child(XmlElement::new("a:picLocks").with_attr("noChangeAspect", "1")),
                )
                .with_child(XmlElement::new("p:nvPr")),
        )
        .with_child(
            XmlElement::new("p:blipFill")
                .with_child(XmlElement::new("a:blip").with_attr("r:embed", embed))
                .with_child(XmlElement::new("a:stretch").with_child(XmlElement::new("a:fillRect"))),
        )
        .with_child(
            XmlElement::new("p:spPr")
                .with_child(xfrm(rect))
                .with_child(rect_geometry()),
        )
}
