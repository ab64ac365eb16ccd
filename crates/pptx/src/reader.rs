//! PPTX reader used to inspect generated (or any) decks.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;
use zip::ZipArchive;

use crate::error::{PptxError, Result};

/// A line of text from a slide with its position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlideText {
    pub text: String,
    /// Horizontal offset in EMU.
    pub x: f64,
    /// Vertical offset in EMU.
    pub y: f64,
}

/// Text content of one slide.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedSlide {
    /// 1-based position in the deck.
    pub number: usize,
    /// Text shapes, top-to-bottom then left-to-right.
    pub lines: Vec<SlideText>,
    /// Text of the notes body placeholder, if the slide has notes.
    pub notes: Option<String>,
}

impl ExtractedSlide {
    fn new(number: usize) -> Self {
        Self {
            number,
            lines: Vec::new(),
            notes: None,
        }
    }

    /// The topmost text on the slide.
    pub fn title(&self) -> Option<&str> {
        self.lines.first().map(|l| l.text.as_str())
    }

    pub fn text(&self) -> String {
        self.lines.iter().map(|l| l.text.as_str()).collect::<Vec<_>>().join("\n")
    }

    fn sort_by_position(&mut self) {
        self.lines.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));
    }
}

/// Slides read back from a package.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InspectedDeck {
    pub slides: Vec<ExtractedSlide>,
}

impl InspectedDeck {
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }
}

/// Reader for PPTX (Office Open XML) files.
#[derive(Debug, Default)]
pub struct DeckReader;

impl DeckReader {
    pub fn new() -> Self {
        Self
    }

    /// Read a deck from disk.
    pub fn read_path(&self, path: &Path) -> Result<InspectedDeck> {
        let file = File::open(path)?;
        self.read(BufReader::new(file))
    }

    /// Read a deck from any seekable source.
    pub fn read<R: Read + Seek>(&self, reader: R) -> Result<InspectedDeck> {
        let mut archive =
            ZipArchive::new(reader).map_err(|e| PptxError::Zip(format!("Failed to open ZIP: {}", e)))?;

        let mut deck = InspectedDeck::default();
        for (idx, slide_path) in self.slide_order(&mut archive)?.iter().enumerate() {
            deck.slides.push(self.read_slide(&mut archive, slide_path, idx + 1)?);
        }

        log::debug!("Read {} slides", deck.slides.len());
        Ok(deck)
    }

    /// Slide part paths in presentation order.
    ///
    /// Follows `p:sldIdLst`; decks without one fall back to the slide
    /// relationships ordered by number.
    fn slide_order<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
        let rels = read_relationships(archive, "ppt/presentation.xml")?;
        let presentation = read_part(archive, "ppt/presentation.xml")?;

        let mut ordered = Vec::new();
        let mut reader = Reader::from_str(&presentation);
        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) if local_name(e.name().as_ref()) == b"sldId" => {
                    if let Some(rel) = attribute(e, b"r:id").and_then(|id| rels.get(&id)) {
                        ordered.push(rel.target.clone());
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(PptxError::Xml(format!("Error parsing presentation: {}", e)));
                }
                _ => {}
            }
        }

        if !ordered.is_empty() {
            return Ok(ordered);
        }

        let mut slides: Vec<(String, Option<usize>)> = rels
            .iter()
            .filter(|(_, rel)| rel.rel_type.ends_with("/slide"))
            .map(|(id, rel)| {
                let order = extract_slide_number(&rel.target).or_else(|| extract_slide_number(id));
                (rel.target.clone(), order)
            })
            .collect();

        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }

    fn read_slide<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
        number: usize,
    ) -> Result<ExtractedSlide> {
        let content = read_part(archive, slide_path)?;
        let mut slide = ExtractedSlide::new(number);

        for shape in extract_shapes(&content)? {
            if !shape.text.is_empty() {
                slide.lines.push(SlideText {
                    text: shape.text,
                    x: shape.x,
                    y: shape.y,
                });
            }
        }
        slide.sort_by_position();

        let rels = read_relationships(archive, slide_path)?;
        let notes_path = rels
            .values()
            .find(|r| r.rel_type.ends_with("/notesSlide"))
            .map(|r| r.target.clone());

        if let Some(notes_path) = notes_path {
            let notes = read_part(archive, &notes_path)?;
            let text: Vec<String> = extract_shapes(&notes)?
                .into_iter()
                .filter(|s| s.placeholder.as_deref() == Some("body"))
                .map(|s| s.text)
                .collect();
            slide.notes = Some(text.join("\n"));
        }

        Ok(slide)
    }
}

#[derive(Debug)]
struct Relationship {
    rel_type: String,
    /// Package-absolute part name, or the raw target for external links.
    target: String,
}

/// Relationships of `part`, keyed by id. A missing rels part means none.
fn read_relationships<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    part: &str,
) -> Result<HashMap<String, Relationship>> {
    let (dir, file) = part.rsplit_once('/').unwrap_or(("", part));
    let rels_path = if dir.is_empty() {
        format!("_rels/{}.rels", file)
    } else {
        format!("{}/_rels/{}.rels", dir, file)
    };

    let content = match read_part(archive, &rels_path) {
        Ok(content) => content,
        Err(PptxError::MissingPart(_)) => return Ok(HashMap::new()),
        Err(e) => return Err(e),
    };

    let mut rels = HashMap::new();
    let mut reader = Reader::from_str(&content);
    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) if e.name().as_ref() == b"Relationship" => {
                let id = attribute(e, b"Id").unwrap_or_default();
                let rel_type = attribute(e, b"Type").unwrap_or_default();
                let target = attribute(e, b"Target").unwrap_or_default();
                let external = attribute(e, b"TargetMode").is_some_and(|m| m == "External");
                let target = if external { target } else { resolve_target(dir, &target) };
                rels.insert(id, Relationship { rel_type, target });
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(PptxError::Xml(format!("Error parsing relationships: {}", e)));
            }
            _ => {}
        }
    }
    Ok(rels)
}

/// Resolve a relative relationship target against the source part's directory.
fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            ".." => {
                segments.pop();
            }
            "." | "" => {}
            other => segments.push(other),
        }
    }
    segments.join("/")
}

fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Result<String> {
    let mut file = match archive.by_name(path) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Err(PptxError::MissingPart(path.to_string())),
        Err(e) => return Err(PptxError::Zip(format!("Failed to open '{}': {}", path, e))),
    };

    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| PptxError::Zip(format!("Failed to read '{}': {}", path, e)))?;
    Ok(content)
}

fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

/// A text-bearing shape extracted from slide XML.
#[derive(Debug, Default)]
struct ShapeInfo {
    text: String,
    x: f64,
    y: f64,
    /// `type` of the shape's placeholder, if it is one.
    placeholder: Option<String>,
}

impl ShapeInfo {
    fn set_offset(&mut self, e: &BytesStart<'_>) {
        if let Some(x) = attribute(e, b"x").and_then(|v| v.parse().ok()) {
            self.x = x;
        }
        if let Some(y) = attribute(e, b"y").and_then(|v| v.parse().ok()) {
            self.y = y;
        }
    }
}

/// Shapes with their text, position and placeholder type.
///
/// Paragraphs are separated by newlines and `a:br` becomes a newline.
fn extract_shapes(xml_content: &str) -> Result<Vec<ShapeInfo>> {
    let mut shapes = Vec::new();
    let mut reader = Reader::from_str(xml_content);

    let mut current: Option<ShapeInfo> = None;
    let mut in_text_body = false;
    let mut in_run_text = false;
    let mut paragraphs = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" | b"pic" => {
                    current = Some(ShapeInfo::default());
                    paragraphs = 0;
                }
                b"off" => {
                    if let Some(shape) = current.as_mut() {
                        shape.set_offset(e);
                    }
                }
                b"txBody" => in_text_body = true,
                b"p" if in_text_body => {
                    if let Some(shape) = current.as_mut() {
                        if paragraphs > 0 {
                            shape.text.push('\n');
                        }
                    }
                    paragraphs += 1;
                }
                b"t" if in_text_body => in_run_text = true,
                b"br" if in_text_body => {
                    if let Some(shape) = current.as_mut() {
                        shape.text.push('\n');
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match local_name(e.name().as_ref()) {
                b"off" => {
                    if let Some(shape) = current.as_mut() {
                        shape.set_offset(e);
                    }
                }
                b"ph" => {
                    if let Some(shape) = current.as_mut() {
                        shape.placeholder = Some(attribute(e, b"type").unwrap_or_else(|| "body".to_string()));
                    }
                }
                b"br" if in_text_body => {
                    if let Some(shape) = current.as_mut() {
                        shape.text.push('\n');
                    }
                }
                b"p" if in_text_body => {
                    if let Some(shape) = current.as_mut() {
                        if paragraphs > 0 {
                            shape.text.push('\n');
                        }
                    }
                    paragraphs += 1;
                }
                _ => {}
            },
            Ok(Event::Text(ref e)) if in_run_text => {
                if let Some(shape) = current.as_mut() {
                    let text = e
                        .unescape()
                        .map_err(|err| PptxError::Xml(format!("Bad text content: {}", err)))?;
                    shape.text.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" | b"pic" => {
                    if let Some(mut shape) = current.take() {
                        shape.text = shape.text.trim().to_string();
                        if !shape.text.is_empty() || shape.placeholder.is_some() {
                            shapes.push(shape);
                        }
                    }
                    in_text_body = false;
                    in_run_text = false;
                }
                b"txBody" => in_text_body = false,
                b"t" => in_run_text = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(PptxError::Xml(format!(
                    "Error at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(shapes)
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    match name.iter().position(|&b| b == b':') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}

/// Extract a slide number from a string like "rId2" or "slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");
    let start = s.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    s[start..].parse().ok()
}
