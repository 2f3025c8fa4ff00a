//! OPC package plumbing: ZIP parts, relationships and content types.

use crate::xml::XmlElement;
use slidecraft_core::{Error, Result};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
pub const ROOT_RELS_PART: &str = "_rels/.rels";

/// Relationship type URIs.
pub mod rel {
    pub const OFFICE_DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    pub const SLIDE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
    pub const SLIDE_LAYOUT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
    pub const SLIDE_MASTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
    pub const NOTES_SLIDE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide";
    pub const NOTES_MASTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesMaster";
    pub const THEME: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
    pub const IMAGE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
    pub const HYPERLINK: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";

    /// Namespace of the relationships part itself.
    pub const PACKAGE_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
}

/// Content type strings.
pub mod ct {
    pub const RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
    pub const XML: &str = "application/xml";
    pub const PRESENTATION: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
    pub const SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
    pub const SLIDE_LAYOUT: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml";
    pub const SLIDE_MASTER: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml";
    pub const NOTES_SLIDE: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.notesSlide+xml";
    pub const NOTES_MASTER: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.notesMaster+xml";
    pub const THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";
    pub const CONTENT_TYPES_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
}

/// Raw ZIP parts of a package, keyed by part name without a leading slash.
#[derive(Debug, Clone, Default)]
pub struct Package {
    parts: BTreeMap<String, Vec<u8>>,
}

impl Package {
    /// Create an empty package.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a package from a file on disk.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Read every part of a ZIP archive into memory.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let mut parts = BTreeMap::new();
        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .map_err(|e| Error::ZipError(format!("Failed to read entry {}: {}", i, e)))?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().trim_start_matches('/').to_string();
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)
                .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", name, e)))?;
            parts.insert(name, data);
        }

        Ok(Self { parts })
    }

    /// Write the package to a file on disk.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        self.write_to(BufWriter::new(file))
    }

    /// Write the package as a ZIP archive, content types first.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let mut zip = ZipWriter::new(writer);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        let ordered = self
            .parts
            .get_key_value(CONTENT_TYPES_PART)
            .into_iter()
            .chain(self.parts.iter().filter(|(k, _)| *k != CONTENT_TYPES_PART));

        for (name, data) in ordered {
            zip.start_file(name.as_str(), options)
                .map_err(|e| Error::ZipError(format!("Failed to add '{}': {}", name, e)))?;
            zip.write_all(data)?;
        }

        let mut inner = zip
            .finish()
            .map_err(|e| Error::ZipError(format!("Failed to finish ZIP: {}", e)))?;
        inner.flush()?;
        Ok(())
    }

    /// Raw bytes of a part.
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts.get(name).map(|d| d.as_slice())
    }

    /// Part decoded as UTF-8 text.
    pub fn part_str(&self, name: &str) -> Result<String> {
        let data = self
            .part(name)
            .ok_or_else(|| Error::PptxParseError(format!("Missing part '{}'", name)))?;
        String::from_utf8(data.to_vec())
            .map_err(|e| Error::PptxParseError(format!("Part '{}' is not UTF-8: {}", name, e)))
    }

    /// Part parsed as XML.
    pub fn part_xml(&self, name: &str) -> Result<XmlElement> {
        XmlElement::parse(&self.part_str(name)?)
    }

    /// Insert or replace a part.
    pub fn set_part(&mut self, name: impl Into<String>, data: Vec<u8>) {
        self.parts.insert(name.into(), data);
    }

    /// Whether a part exists.
    pub fn contains(&self, name: &str) -> bool {
        self.parts.contains_key(name)
    }

    /// All part names, sorted.
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.keys().map(|k| k.as_str())
    }

    /// First free name of the form `{prefix}{n}.{ext}`, counting from 1.
    pub fn next_part_name(&self, prefix: &str, ext: &str) -> String {
        (1..)
            .map(|n| format!("{}{}.{}", prefix, n, ext))
            .find(|name| !self.contains(name))
            .unwrap_or_default()
    }
}

/// A single relationship from a part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub external: bool,
}

/// The relationships of one part, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relationships {
    items: Vec<Relationship>,
}

impl Relationships {
    /// Parse a `.rels` part.
    pub fn parse(xml: &str) -> Result<Self> {
        let root = XmlElement::parse(xml)?;
        let items = root
            .elements()
            .filter(|e| e.local_name() == "Relationship")
            .map(|e| Relationship {
                id: e.attr("Id").unwrap_or_default().to_string(),
                rel_type: e.attr("Type").unwrap_or_default().to_string(),
                target: e.attr("Target").unwrap_or_default().to_string(),
                external: e.attr("TargetMode") == Some("External"),
            })
            .collect();
        Ok(Self { items })
    }

    /// Load the relationships of a part, or an empty set if it has none.
    pub fn load(package: &Package, part: &str) -> Result<Self> {
        let path = rels_path(part);
        if package.contains(&path) {
            Self::parse(&package.part_str(&path)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Serialize to a `.rels` document.
    pub fn to_xml(&self) -> Result<String> {
        let mut root = XmlElement::new("Relationships").with_attr("xmlns", rel::PACKAGE_NS);
        for item in &self.items {
            let mut el = XmlElement::new("Relationship")
                .with_attr("Id", item.id.as_str())
                .with_attr("Type", item.rel_type.as_str())
                .with_attr("Target", item.target.as_str());
            if item.external {
                el.set_attr("TargetMode", "External");
            }
            root.push(el);
        }
        root.to_xml()
    }

    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.items.iter().find(|r| r.id == id)
    }

    /// Relationships of one type, in document order.
    pub fn of_type<'a>(&'a self, rel_type: &'a str) -> impl Iterator<Item = &'a Relationship> {
        self.items.iter().filter(move |r| r.rel_type == rel_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.items.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add a relationship and return its new `rIdN` identifier.
    pub fn add(&mut self, rel_type: &str, target: impl Into<String>, external: bool) -> String {
        let next = self
            .items
            .iter()
            .filter_map(|r| r.id.strip_prefix("rId").and_then(|n| n.parse::<u32>().ok()))
            .max()
            .unwrap_or(0)
            + 1;
        let id = format!("rId{}", next);
        self.items.push(Relationship {
            id: id.clone(),
            rel_type: rel_type.to_string(),
            target: target.into(),
            external,
        });
        id
    }

    /// Existing internal relationship of a type to a target, or a new one.
    pub fn get_or_add(&mut self, rel_type: &str, target: &str) -> String {
        match self
            .items
            .iter()
            .find(|r| !r.external && r.rel_type == rel_type && r.target == target)
        {
            Some(r) => r.id.clone(),
            None => self.add(rel_type, target, false),
        }
    }
}

/// Path of the `.rels` part belonging to `part`.
pub fn rels_path(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target relative to the part that owns it.
pub fn resolve_target(part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return normalize(absolute.split('/'));
    }
    let base = part.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
    let joined = if base.is_empty() {
        target.to_string()
    } else {
        format!("{}/{}", base, target)
    };
    normalize(joined.split('/'))
}

/// Relative target from `from_part` to `to_part`, e.g. `../media/image1.png`.
pub fn relative_target(from_part: &str, to_part: &str) -> String {
    let from_dir: Vec<&str> = match from_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    let to: Vec<&str> = to_part.split('/').collect();

    let common = from_dir
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut segments: Vec<&str> = vec![".."; from_dir.len() - common];
    segments.extend(&to[common..]);
    segments.join("/")
}

fn normalize<'a>(segments: impl Iterator<Item = &'a str>) -> String {
    let mut out: Vec<&str> = Vec::new();
    for seg in segments {
        match seg {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            s => out.push(s),
        }
    }
    out.join("/")
}

/// Register a default content type for a file extension if missing.
pub fn ensure_default_content_type(types: &mut XmlElement, ext: &str, content_type: &str) {
    let ext = ext.to_lowercase();
    let exists = types.elements().any(|e| {
        e.local_name() == "Default"
            && e.attr("Extension").map(|x| x.to_lowercase()) == Some(ext.clone())
    });
    if !exists {
        let default = XmlElement::new("Default")
            .with_attr("Extension", ext)
            .with_attr("ContentType", content_type);
        let at = types
            .children
            .iter()
            .rposition(|c| matches!(c, crate::xml::XmlNode::Element(e) if e.local_name() == "Default"))
            .map(|i| i + 1)
            .unwrap_or(0);
        types.insert(at, default);
    }
}

/// Register an override content type for a part.
pub fn set_override_content_type(types: &mut XmlElement, part: &str, content_type: &str) {
    let part_name = format!("/{}", part);
    types.children.retain(|c| {
        !matches!(c, crate::xml::XmlNode::Element(e)
            if e.local_name() == "Override" && e.attr("PartName") == Some(part_name.as_str()))
    });
    types.push(
        XmlElement::new("Override")
            .with_attr("PartName", part_name)
            .with_attr("ContentType", content_type),
    );
}
