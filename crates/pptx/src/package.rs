//! Open Packaging Conventions plumbing: parts, relationships, content types
//! and the zip container.

use std::io::{Cursor, Write};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{PptxError, Result};

pub(crate) const REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
pub(crate) const CT_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

/// Namespace of relationship ids inside DrawingML/PresentationML parts.
pub(crate) const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Relationship types used by generated decks.
pub(crate) mod rel_type {
    pub const OFFICE_DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    pub const CORE_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
    pub const EXTENDED_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties";
    pub const SLIDE_MASTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
    pub const SLIDE_LAYOUT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
    pub const NOTES_MASTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesMaster";
    pub const THEME: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
    pub const PRES_PROPS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/presProps";
    pub const VIEW_PROPS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/viewProps";
    pub const TABLE_STYLES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/tableStyles";
    pub const SLIDE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
    pub const NOTES_SLIDE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide";
    pub const IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
    pub const HYPERLINK: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";
}

/// Content types of the parts in a generated deck.
pub(crate) mod content_type {
    pub const RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
    pub const XML: &str = "application/xml";
    pub const PRESENTATION: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
    pub const SLIDE_MASTER: &str = "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml";
    pub const SLIDE_LAYOUT: &str = "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml";
    pub const NOTES_MASTER: &str = "application/vnd.openxmlformats-officedocument.presentationml.notesMaster+xml";
    pub const SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
    pub const NOTES_SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.notesSlide+xml";
    pub const THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";
    pub const PRES_PROPS: &str = "application/vnd.openxmlformats-officedocument.presentationml.presProps+xml";
    pub const VIEW_PROPS: &str = "application/vnd.openxmlformats-officedocument.presentationml.viewProps+xml";
    pub const TABLE_STYLES: &str = "application/vnd.openxmlformats-officedocument.presentationml.tableStyles+xml";
    pub const CORE_PROPERTIES: &str = "application/vnd.openxmlformats-package.core-properties+xml";
    pub const EXTENDED_PROPERTIES: &str = "application/vnd.openxmlformats-officedocument.extended-properties+xml";
}

/// Thin wrapper over the quick-xml writer with error mapping.
pub(crate) struct XmlBuilder {
    writer: Writer<Vec<u8>>,
}

impl XmlBuilder {
    /// Start a document with a standalone UTF-8 declaration.
    pub fn new() -> Result<Self> {
        let mut builder = Self {
            writer: Writer::new(Vec::with_capacity(4096)),
        };
        builder.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
        Ok(builder)
    }

    fn event(&mut self, event: Event<'_>) -> Result<()> {
        self.writer
            .write_event(event)
            .map_err(|e| PptxError::Xml(format!("Failed to write XML: {}", e)))
    }

    pub fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let elem = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.event(Event::Start(elem))
    }

    pub fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let elem = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.event(Event::Empty(elem))
    }

    pub fn end(&mut self, name: &str) -> Result<()> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    /// Escaped character data.
    pub fn text(&mut self, text: &str) -> Result<()> {
        self.event(Event::Text(BytesText::new(text)))
    }

    /// `<name attrs>text</name>`
    pub fn text_element(&mut self, name: &str, attrs: &[(&str, &str)], text: &str) -> Result<()> {
        self.start(name, attrs)?;
        self.text(text)?;
        self.end(name)
    }

    pub fn finish(self) -> Vec<u8> {
        self.writer.into_inner()
    }
}

#[derive(Debug, Clone)]
struct Relationship {
    id: String,
    rel_type: &'static str,
    target: String,
    external: bool,
}

/// Relationships of one source part.
#[derive(Debug, Clone, Default)]
pub(crate) struct Relationships {
    rels: Vec<Relationship>,
}

impl Relationships {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an internal relationship and return its `rIdN`.
    pub fn add(&mut self, rel_type: &'static str, target: impl Into<String>) -> String {
        self.push(rel_type, target.into(), false)
    }

    /// Add an external relationship, reusing an existing id for the same target.
    pub fn add_external(&mut self, rel_type: &'static str, target: &str) -> String {
        if let Some(existing) = self
            .rels
            .iter()
            .find(|r| r.external && r.rel_type == rel_type && r.target == target)
        {
            return existing.id.clone();
        }
        self.push(rel_type, target.to_string(), true)
    }

    fn push(&mut self, rel_type: &'static str, target: String, external: bool) -> String {
        let id = format!("rId{}", self.rels.len() + 1);
        self.rels.push(Relationship {
            id: id.clone(),
            rel_type,
            target,
            external,
        });
        id
    }

    pub fn is_empty(&self) -> bool {
        self.rels.is_empty()
    }

    pub fn to_xml(&self) -> Result<Vec<u8>> {
        let mut xml = XmlBuilder::new()?;
        xml.start("Relationships", &[("xmlns", REL_NS)])?;
        for rel in &self.rels {
            let mut attrs = vec![
                ("Id", rel.id.as_str()),
                ("Type", rel.rel_type),
                ("Target", rel.target.as_str()),
            ];
            if rel.external {
                attrs.push(("TargetMode", "External"));
            }
            xml.empty("Relationship", &attrs)?;
        }
        xml.end("Relationships")?;
        Ok(xml.finish())
    }
}

/// The `_rels` part name that belongs to `part`.
///
/// `ppt/slides/slide1.xml` maps to `ppt/slides/_rels/slide1.xml.rels`, the
/// package itself (empty name) to `_rels/.rels`.
pub(crate) fn rels_part_name(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None if part.is_empty() => "_rels/.rels".to_string(),
        None => format!("_rels/{}.rels", part),
    }
}

#[derive(Debug)]
struct Part {
    name: String,
    data: Vec<u8>,
}

/// In-memory package assembled part by part, then zipped.
#[derive(Debug, Default)]
pub(crate) struct Package {
    parts: Vec<Part>,
    overrides: Vec<(String, &'static str)>,
}

impl Package {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a part with an explicit content type override.
    pub fn add_part(&mut self, name: impl Into<String>, content_type: &'static str, data: impl Into<Vec<u8>>) {
        let name = name.into();
        self.overrides.push((format!("/{}", name), content_type));
        self.parts.push(Part {
            name,
            data: data.into(),
        });
    }

    /// Add the relationships of `source` (empty for the package root).
    pub fn add_rels(&mut self, source: &str, rels: &Relationships) -> Result<()> {
        if rels.is_empty() {
            return Ok(());
        }
        self.parts.push(Part {
            name: rels_part_name(source),
            data: rels.to_xml()?,
        });
        Ok(())
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|p| p.name.as_str())
    }

    fn content_types_xml(&self) -> Result<Vec<u8>> {
        let mut xml = XmlBuilder::new()?;
        xml.start("Types", &[("xmlns", CT_NS)])?;
        xml.empty(
            "Default",
            &[("Extension", "rels"), ("ContentType", content_type::RELATIONSHIPS)],
        )?;
        xml.empty("Default", &[("Extension", "xml"), ("ContentType", content_type::XML)])?;
        for (name, ct) in &self.overrides {
            xml.empty("Override", &[("PartName", name.as_str()), ("ContentType", *ct)])?;
        }
        xml.end("Types")?;
        Ok(xml.finish())
    }

    /// Zip all parts, content types first.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        let content_types = self.content_types_xml()?;
        let entries = std::iter::once(("[Content_Types].xml", content_types.as_slice()))
            .chain(self.parts.iter().map(|p| (p.name.as_str(), p.data.as_slice())));

        for (name, data) in entries {
            zip.start_file(name, options)
                .map_err(|e| PptxError::Zip(format!("Failed to add '{}': {}", name, e)))?;
            zip.write_all(data)?;
        }

        let cursor = zip
            .finish()
            .map_err(|e| PptxError::Zip(format!("Failed to finish archive: {}", e)))?;
        Ok(cursor.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rels_part_name() {
        assert_eq!(rels_part_name(""), "_rels/.rels");
        assert_eq!(rels_part_name("ppt/presentation.xml"), "ppt/_rels/presentation.xml.rels");
        assert_eq!(rels_part_name("ppt/slides/slide3.xml"), "ppt/slides/_rels/slide3.xml.rels");
    }

    #[test]
    fn test_relationship_ids() {
        let mut rels = Relationships::new();
        assert_eq!(rels.add(rel_type::SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml"), "rId1");
        assert_eq!(rels.add_external(rel_type::HYPERLINK, "https://example.com"), "rId2");
        assert_eq!(rels.add_external(rel_type::HYPERLINK, "https://example.com"), "rId2");
        assert_eq!(rels.add_external(rel_type::IMAGE, "https://example.com"), "rId3");

        let xml = String::from_utf8(rels.to_xml().unwrap()).unwrap();
        assert!(xml.contains(r#"Target="https://example.com" TargetMode="External""#));
        assert_eq!(xml.matches("<Relationship ").count(), 3);
    }

    #[test]
    fn test_text_is_escaped() {
        let mut xml = XmlBuilder::new().unwrap();
        xml.text_element("a:t", &[], "A & B <c>").unwrap();
        let out = String::from_utf8(xml.finish()).unwrap();
        assert!(out.ends_with("<a:t>A &amp; B &lt;c&gt;</a:t>"));
    }

    #[test]
    fn test_package_zips_content_types_first() {
        let mut package = Package::new();
        package.add_part("ppt/presentation.xml", content_type::PRESENTATION, b"<p/>".to_vec());
        let bytes = package.to_bytes().unwrap();

        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        assert!(names.contains(&"[Content_Types].xml"));
        assert!(names.contains(&"ppt/presentation.xml"));
    }
}
