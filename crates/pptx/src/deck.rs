//! The in-memory presentation.
//!
//! A [`Deck`] parses the presentation part, every slide master, slide layout,
//! slide and notes slide into XML trees on load. Pipelines mutate those trees
//! in place; [`Deck::save`] writes them back into the package. Parts the deck
//! does not understand (charts, media, custom XML) pass through untouched.

use crate::media::PictureData;
use crate::package::{
    self, ct, rel, rels_path, relative_target, resolve_target, Package, Relationships,
    CONTENT_TYPES_PART, ROOT_RELS_PART,
};
use crate::shapes::{self, EmuRect, Shape};
use crate::template;
use crate::text::{self, TextFrame};
use crate::xml::{XmlElement, XmlNode};
use slidecraft_core::{Error, Result};
use std::io::{Cursor, Seek, Write};
use std::path::Path;

/// Lowest id PowerPoint accepts in `p:sldIdLst`.
const FIRST_SLIDE_ID: u32 = 256;
const DEFAULT_SLIDE_WIDTH: i64 = 9_144_000;
const DEFAULT_SLIDE_HEIGHT: i64 = 6_858_000;

/// A part that owns a shape tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContainerRef {
    Master(usize),
    Layout(usize),
    Slide(usize),
}

/// A parsed XML part with its relationships.
#[derive(Debug, Clone)]
struct Part {
    name: String,
    xml: XmlElement,
    rels: Relationships,
}

impl Part {
    fn load(package: &Package, name: String) -> Result<Self> {
        let xml = package.part_xml(&name)?;
        let rels = Relationships::load(package, &name)?;
        Ok(Self { name, xml, rels })
    }

    fn from_template(name: String, xml: &str) -> Result<Self> {
        Ok(Self {
            name,
            xml: XmlElement::parse(xml)?,
            rels: Relationships::default(),
        })
    }

    fn sp_tree(&self) -> Option<&XmlElement> {
        self.xml.find(&["cSld", "spTree"])
    }

    /// Resolved part name of an internal relationship.
    fn target_of(&self, id: &str) -> Option<String> {
        self.rels
            .get(id)
            .filter(|r| !r.external)
            .map(|r| resolve_target(&self.name, &r.target))
    }

    fn targets_of_type(&self, rel_type: &str) -> Vec<String> {
        self.rels
            .of_type(rel_type)
            .filter(|r| !r.external)
            .map(|r| resolve_target(&self.name, &r.target))
            .collect()
    }

    /// Part names referenced by the `r:id`s of a list element's children.
    fn list_targets(&self, list: &str) -> Result<Vec<String>> {
        let Some(list) = self.xml.child(list) else {
            return Ok(Vec::new());
        };
        list.elements()
            .filter_map(|entry| entry.prefixed_attr("id"))
            .map(|id| {
                self.target_of(id).ok_or_else(|| {
                    Error::PptxParseError(format!(
                        "Relationship '{}' of '{}' does not resolve",
                        id, self.name
                    ))
                })
            })
            .collect()
    }
}

/// A presentation: masters, layouts, slides and their notes.
#[derive(Debug, Clone)]
pub struct Deck {
    package: Package,
    content_types: XmlElement,
    presentation: Part,
    masters: Vec<Part>,
    layouts: Vec<Part>,
    slides: Vec<Part>,
    notes: Vec<Option<Part>>,
}

impl Deck {
    /// An empty 10" x 7.5" deck with one master and one blank layout.
    pub fn new() -> Result<Self> {
        let presentation_rels = rels_path(template::PRESENTATION_PART);
        let master_rels = rels_path(template::MASTER_PART);
        let layout_rels = rels_path(template::LAYOUT_PART);
        let parts = [
            (CONTENT_TYPES_PART, template::content_types_xml()),
            (ROOT_RELS_PART, template::root_rels_xml()),
            (template::PRESENTATION_PART, template::presentation_xml()),
            (presentation_rels.as_str(), template::presentation_rels_xml()),
            (template::MASTER_PART, template::slide_master_xml()),
            (master_rels.as_str(), template::slide_master_rels_xml()),
            (template::LAYOUT_PART, template::blank_layout_xml()),
            (layout_rels.as_str(), template::blank_layout_rels_xml()),
            (template::THEME_PART, template::theme_xml()),
        ];

        let mut package = Package::new();
        for (name, xml) in parts {
            package.set_part(name, xml.as_bytes().to_vec());
        }

        Self::from_package(package)
    }

    /// Load a `.pptx` file.
    pub fn open(path: &Path) -> Result<Self> {
        let package = Package::open(path).map_err(|e| match e {
            Error::ZipError(msg) => Error::CorruptedFile(format!("{}: {}", path.display(), msg)),
            other => other,
        })?;
        Self::from_package(package)
    }

    /// Load a `.pptx` held in memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_package(Package::from_reader(Cursor::new(bytes))?)
    }

    fn from_package(package: Package) -> Result<Self> {
        let content_types = package.part_xml(CONTENT_TYPES_PART)?;

        let root_rels = Relationships::parse(&package.part_str(ROOT_RELS_PART)?)?;
        let presentation_name = root_rels
            .of_type(rel::OFFICE_DOCUMENT)
            .next()
            .map(|r| resolve_target("", &r.target))
            .ok_or_else(|| Error::PptxParseError("Package has no presentation part".to_string()))?;
        let presentation = Part::load(&package, presentation_name)?;

        let mut masters = Vec::new();
        let mut layouts: Vec<Part> = Vec::new();
        for name in presentation.list_targets("sldMasterIdLst")? {
            let master = Part::load(&package, name)?;
            for layout_name in master.list_targets("sldLayoutIdLst")? {
                if !layouts.iter().any(|l| l.name == layout_name) {
                    layouts.push(Part::load(&package, layout_name)?);
                }
            }
            masters.push(master);
        }

        let mut slides = Vec::new();
        let mut notes = Vec::new();
        for name in presentation.list_targets("sldIdLst")? {
            let slide = Part::load(&package, name)?;
            let notes_part = match slide.targets_of_type(rel::NOTES_SLIDE).into_iter().next() {
                Some(notes_name) => Some(Part::load(&package, notes_name)?),
                None => None,
            };
            slides.push(slide);
            notes.push(notes_part);
        }

        log::debug!(
            "Loaded deck: {} masters, {} layouts, {} slides",
            masters.len(),
            layouts.len(),
            slides.len()
        );

        Ok(Self {
            package,
            content_types,
            presentation,
            masters,
            layouts,
            slides,
            notes,
        })
    }

    /// Write the deck to a `.pptx` file.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        self.sync()?;
        self.package.save(path)
    }

    /// Write the deck as a ZIP archive.
    pub fn write_to<W: Write + Seek>(&mut self, writer: W) -> Result<()> {
        self.sync()?;
        self.package.write_to(writer)
    }

    /// Serialize every parsed part back into the package.
    fn sync(&mut self) -> Result<()> {
        let parts = std::iter::once(&self.presentation)
            .chain(self.masters.iter())
            .chain(self.layouts.iter())
            .chain(self.slides.iter())
            .chain(self.notes.iter().flatten());

        for part in parts {
            self.package
                .set_part(part.name.clone(), part.xml.to_xml()?.into_bytes());
            if !part.rels.is_empty() {
                self.package
                    .set_part(rels_path(&part.name), part.rels.to_xml()?.into_bytes());
            }
        }
        self.package
            .set_part(CONTENT_TYPES_PART, self.content_types.to_xml()?.into_bytes());
        Ok(())
    }

    /// Slide width in EMU.
    pub fn slide_width(&self) -> i64 {
        self.slide_size_attr("cx").unwrap_or(DEFAULT_SLIDE_WIDTH)
    }

    /// Slide height in EMU.
    pub fn slide_height(&self) -> i64 {
        self.slide_size_attr("cy").unwrap_or(DEFAULT_SLIDE_HEIGHT)
    }

    fn slide_size_attr(&self, key: &str) -> Option<i64> {
        self.presentation
            .xml
            .child("sldSz")
            .and_then(|s| s.attr(key))
            .and_then(|v| v.parse().ok())
    }

    pub fn masters(&self) -> impl Iterator<Item = ContainerRef> {
        (0..self.masters.len()).map(ContainerRef::Master)
    }

    pub fn layouts(&self) -> impl Iterator<Item = ContainerRef> {
        (0..self.layouts.len()).map(ContainerRef::Layout)
    }

    pub fn slides(&self) -> impl Iterator<Item = ContainerRef> {
        (0..self.slides.len()).map(ContainerRef::Slide)
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Every container: masters first, then layouts, then slides.
    pub fn containers(&self) -> Vec<ContainerRef> {
        self.masters().chain(self.layouts()).chain(self.slides()).collect()
    }

    fn part(&self, container: ContainerRef) -> Result<&Part> {
        let found = match container {
            ContainerRef::Master(i) => self.masters.get(i),
            ContainerRef::Layout(i) => self.layouts.get(i),
            ContainerRef::Slide(i) => self.slides.get(i),
        };
        found.ok_or_else(|| Error::PptxParseError(format!("No such container: {:?}", container)))
    }

    fn part_mut(&mut self, container: ContainerRef) -> Result<&mut Part> {
        let found = match container {
            ContainerRef::Master(i) => self.masters.get_mut(i),
            ContainerRef::Layout(i) => self.layouts.get_mut(i),
            ContainerRef::Slide(i) => self.slides.get_mut(i),
        };
        found.ok_or_else(|| Error::PptxParseError(format!("No such container: {:?}", container)))
    }

    /// Shape tree of a container.
    pub fn shapes(&self, container: ContainerRef) -> Result<Vec<Shape>> {
        Ok(self
            .part(container)?
            .sp_tree()
            .map(shapes::read_shapes)
            .unwrap_or_default())
    }

    /// Remove one shape. Returns false if nothing was at `path`.
    pub fn remove_shape(&mut self, container: ContainerRef, path: &[usize]) -> Result<bool> {
        let part = self.part_mut(container)?;
        let Some(tree) = part.xml.find_mut(&["cSld", "spTree"]) else {
            return Ok(false);
        };
        let Some((last, parents)) = path.split_last() else {
            return Ok(false);
        };

        let mut parent = tree;
        for &index in parents {
            match parent.element_at_mut(index) {
                Some(el) => parent = el,
                None => return Ok(false),
            }
        }
        if !matches!(parent.children.get(*last), Some(XmlNode::Element(_))) {
            return Ok(false);
        }
        parent.children.remove(*last);
        Ok(true)
    }

    /// Remove several shapes of one container. Paths are removed deepest and
    /// last first so the remaining paths stay valid.
    pub fn remove_shapes(&mut self, container: ContainerRef, paths: &[Vec<usize>]) -> Result<usize> {
        let mut ordered: Vec<&Vec<usize>> = paths.iter().collect();
        ordered.sort_by(|a, b| b.cmp(a));
        ordered.dedup();

        let mut removed = 0;
        for path in ordered {
            if self.remove_shape(container, path)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Index of the blank layout, or the closest stand-in.
    pub fn blank_layout_index(&self) -> Result<usize> {
        if let Some(i) = self
            .layouts
            .iter()
            .position(|l| l.xml.attr("type") == Some("blank"))
        {
            return Ok(i);
        }
        match self.layouts.len() {
            0 => Err(Error::PptxParseError("Deck has no slide layouts".to_string())),
            n if n > 6 => Ok(6),
            n => Ok(n - 1),
        }
    }

    /// Append an empty slide using a layout and return its index.
    pub fn add_slide(&mut self, layout: usize) -> Result<usize> {
        let layout_name = self
            .layouts
            .get(layout)
            .map(|l| l.name.clone())
            .ok_or_else(|| Error::PptxParseError(format!("No such layout: {}", layout)))?;

        let name = self.reserve_part("ppt/slides/slide", "xml");
        let mut slide = Part::from_template(name.clone(), template::slide_xml())?;
        slide
            .rels
            .add(rel::SLIDE_LAYOUT, relative_target(&name, &layout_name), false);

        let rid = self.presentation.rels.add(
            rel::SLIDE,
            relative_target(&self.presentation.name, &name),
            false,
        );
        let list = ensure_list(
            &mut self.presentation.xml,
            "sldIdLst",
            &["sldMasterIdLst", "notesMasterIdLst", "handoutMasterIdLst"],
        )?;
        let next_id = list
            .elements()
            .filter_map(|e| e.attr("id").and_then(|v| v.parse::<u32>().ok()))
            .max()
            .map(|max| max + 1)
            .unwrap_or(FIRST_SLIDE_ID)
            .max(FIRST_SLIDE_ID);
        list.push(
            XmlElement::new("p:sldId")
                .with_attr("id", next_id.to_string())
                .with_attr("r:id", rid),
        );

        package::set_override_content_type(&mut self.content_types, &name, ct::SLIDE);
        self.slides.push(slide);
        self.notes.push(None);
        Ok(self.slides.len() - 1)
    }

    /// Add a text box and return its shape path.
    pub fn add_textbox(
        &mut self,
        container: ContainerRef,
        rect: EmuRect,
        frame: &TextFrame,
    ) -> Result<Vec<usize>> {
        let Part { name, xml, rels } = self.part_mut(container)?;
        let body = frame.to_element(&mut |url: &str| rels.add(rel::HYPERLINK, url, true));
        let id = shapes::max_shape_id(xml) + 1;
        let tree = xml
            .find_mut(&["cSld", "spTree"])
            .ok_or_else(|| Error::PptxParseError(format!("'{}' has no shape tree", name)))?;
        let index = tree.push(shapes::textbox_element(id, rect, body));
        Ok(vec![index])
    }

    /// Embed a picture and return its shape path.
    pub fn add_picture(
        &mut self,
        container: ContainerRef,
        picture: &PictureData,
        rect: EmuRect,
    ) -> Result<Vec<usize>> {
        self.part(container)?;

        let media = self.reserve_part("ppt/media/image", picture.extension());
        self.package.set_part(media.clone(), picture.bytes.clone());
        package::ensure_default_content_type(
            &mut self.content_types,
            picture.extension(),
            picture.content_type(),
        );

        let Part { name, xml, rels } = self.part_mut(container)?;
        let embed = rels.add(rel::IMAGE, relative_target(name, &media), false);
        let id = shapes::max_shape_id(xml) + 1;
        let tree = xml
            .find_mut(&["cSld", "spTree"])
            .ok_or_else(|| Error::PptxParseError(format!("'{}' has no shape tree", name)))?;
        let index = tree.push(shapes::picture_element(id, rect, &embed, ""));
        Ok(vec![index])
    }

    /// Encoded image bytes behind a picture shape.
    pub fn picture_bytes(&self, container: ContainerRef, shape: &Shape) -> Option<&[u8]> {
        let part = self.part(container).ok()?;
        let target = part.target_of(shape.embed()?)?;
        self.package.part(&target)
    }

    /// Address of the hyperlink on a shape's first text run.
    pub fn first_run_hyperlink(&self, container: ContainerRef, shape: &Shape) -> Option<String> {
        let part = self.part(container).ok()?;
        let element = element_at_path(part.sp_tree()?, &shape.path)?;
        let run = element.descendants("r").into_iter().next()?;
        let id = run.find(&["rPr", "hlinkClick"])?.prefixed_attr("id")?;
        part.rels.get(id).map(|r| r.target.clone())
    }

    /// Position and size of a shape, from its `a:xfrm`.
    pub fn shape_rect(&self, container: ContainerRef, shape: &Shape) -> Option<EmuRect> {
        let part = self.part(container).ok()?;
        let element = element_at_path(part.sp_tree()?, &shape.path)?;
        let xfrm = element
            .elements()
            .find(|e| matches!(e.local_name(), "spPr" | "grpSpPr"))?
            .child("xfrm")?;
        let coord = |el: &XmlElement, key: &str| el.attr(key).and_then(|v| v.parse::<i64>().ok());
        let off = xfrm.child("off")?;
        let ext = xfrm.child("ext")?;
        Some(EmuRect::new(
            coord(off, "x")?,
            coord(off, "y")?,
            coord(ext, "cx")?,
            coord(ext, "cy")?,
        ))
    }

    /// Trimmed text of every top-level text shape on a slide, one per line.
    pub fn slide_text(&self, slide: usize) -> Result<String> {
        let texts: Vec<String> = self
            .shapes(ContainerRef::Slide(slide))?
            .iter()
            .filter_map(|s| s.text())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        Ok(texts.join("\n"))
    }

    /// Speaker notes of a slide, if it has a notes slide.
    pub fn notes_text(&self, slide: usize) -> Option<String> {
        let notes = self.notes.get(slide)?.as_ref()?;
        let tree = notes.sp_tree()?;
        let body = tree
            .elements()
            .find(|e| is_body_placeholder(e))?
            .child("txBody")?;
        Some(shapes::text_frame_text(body))
    }

    /// Replace a slide's speaker notes, creating the notes slide if needed.
    pub fn set_notes_text(&mut self, slide: usize, text: &str) -> Result<()> {
        if slide >= self.slides.len() {
            return Err(Error::PptxParseError(format!("No such slide: {}", slide)));
        }
        if self.notes[slide].is_none() {
            let part = self.create_notes_slide(slide)?;
            self.notes[slide] = Some(part);
        }

        let notes = self.notes[slide]
            .as_mut()
            .ok_or_else(|| Error::PptxParseError(format!("Slide {} has no notes slide", slide)))?;
        let name = notes.name.clone();
        let body = notes_body_mut(&mut notes.xml).ok_or_else(|| {
            Error::PptxParseError(format!("'{}' has no notes placeholder", name))
        })?;
        body.remove_children("p");
        for paragraph in text::plain_paragraphs(text) {
            body.push(paragraph);
        }
        Ok(())
    }

    fn create_notes_slide(&mut self, slide: usize) -> Result<Part> {
        let master = self.ensure_notes_master()?;
        let name = self.reserve_part("ppt/notesSlides/notesSlide", "xml");
        let mut part = Part::from_template(name.clone(), template::notes_slide_xml())?;
        part.rels
            .add(rel::NOTES_MASTER, relative_target(&name, &master), false);

        let slide_part = &mut self.slides[slide];
        part.rels
            .add(rel::SLIDE, relative_target(&name, &slide_part.name), false);
        slide_part
            .rels
            .add(rel::NOTES_SLIDE, relative_target(&slide_part.name, &name), false);

        package::set_override_content_type(&mut self.content_types, &name, ct::NOTES_SLIDE);
        Ok(part)
    }

    /// Part name of the notes master, adding one (with its own theme) if missing.
    fn ensure_notes_master(&mut self) -> Result<String> {
        if let Some(existing) = self
            .presentation
            .targets_of_type(rel::NOTES_MASTER)
            .into_iter()
            .next()
        {
            return Ok(existing);
        }

        let theme = self.reserve_part("ppt/theme/theme", "xml");
        self.package
            .set_part(theme.clone(), template::theme_xml().as_bytes().to_vec());
        package::set_override_content_type(&mut self.content_types, &theme, ct::THEME);

        let name = self.reserve_part("ppt/notesMasters/notesMaster", "xml");
        self.package
            .set_part(name.clone(), template::notes_master_xml().as_bytes().to_vec());
        let mut rels = Relationships::default();
        rels.add(rel::THEME, relative_target(&name, &theme), false);
        self.package
            .set_part(rels_path(&name), rels.to_xml()?.into_bytes());
        package::set_override_content_type(&mut self.content_types, &name, ct::NOTES_MASTER);

        let rid = self.presentation.rels.add(
            rel::NOTES_MASTER,
            relative_target(&self.presentation.name, &name),
            false,
        );
        let list = ensure_list(&mut self.presentation.xml, "notesMasterIdLst", &["sldMasterIdLst"])?;
        list.remove_children("notesMasterId");
        list.push(XmlElement::new("p:notesMasterId").with_attr("r:id", rid));

        log::debug!("Added notes master '{}'", name);
        Ok(name)
    }

    /// Claim a fresh part name so later additions don't reuse it before save.
    fn reserve_part(&mut self, prefix: &str, ext: &str) -> String {
        let name = self.package.next_part_name(prefix, ext);
        self.package.set_part(name.clone(), Vec::new());
        name
    }
}

/// Child list of the presentation element, inserted after `after` if missing.
fn ensure_list<'a>(
    presentation: &'a mut XmlElement,
    list: &str,
    after: &[&str],
) -> Result<&'a mut XmlElement> {
    if presentation.child(list).is_none() {
        let at = after
            .iter()
            .filter_map(|name| presentation.child_index(name))
            .max()
            .map(|i| i + 1)
            .unwrap_or(0);
        presentation.insert(at, XmlElement::new(format!("p:{}", list)));
    }
    presentation
        .child_mut(list)
        .ok_or_else(|| Error::XmlError(format!("Could not add '{}'", list)))
}

fn element_at_path<'a>(tree: &'a XmlElement, path: &[usize]) -> Option<&'a XmlElement> {
    path.iter().try_fold(tree, |el, &i| el.element_at(i))
}

fn is_body_placeholder(shape: &XmlElement) -> bool {
    shape.local_name() == "sp"
        && shape
            .find(&["nvSpPr", "nvPr", "ph"])
            .map(|ph| ph.attr("type") == Some("body"))
            .unwrap_or(false)
}

fn notes_body_mut(notes: &mut XmlElement) -> Option<&mut XmlElement> {
    let tree = notes.find_mut(&["cSld", "spTree"])?;
    let shape = tree.children.iter_mut().find_map(|c| match c {
        XmlNode::Element(e) if is_body_placeholder(e) => Some(e),
        _ => None,
    })?;
    if shape.child("txBody").is_none() {
        shape.push(
            XmlElement::new("p:txBody")
                .with_child(XmlElement::new("a:bodyPr"))
                .with_child(XmlElement::new("a:lstStyle")),
        );
    }
    shape.child_mut("txBody")
}
