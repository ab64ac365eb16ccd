//! PPTX writer implementation.
//!
//! Every slide uses the single blank layout; titles, bullets and footers are
//! absolutely positioned text boxes so the output looks the same in any
//! viewer regardless of master styling.

use std::path::Path;

use updeck_core::{write_output, Deck, Paragraph, ParagraphStyle, RenderError, Slide, SlideKind, TextRun};

use crate::error::Result;
use crate::package::{content_type, rel_type, Package, Relationships, XmlBuilder, R_NS};
use crate::style::{inches, DeckStyle, Rgb};
use crate::templates::{self, A_NS, P_NS};

const FIRST_SLIDE_ID: usize = 256;
const NOTES_WIDTH: i64 = 6_858_000;
const NOTES_HEIGHT: i64 = 9_144_000;
const BULLET_CHAR: &str = "•";
const BULLET_MARGIN: &str = "342900";
const BULLET_INDENT: &str = "-342900";

/// Writer for PPTX (Office Open XML) presentations.
#[derive(Debug, Clone, Default)]
pub struct PptxWriter {
    style: DeckStyle,
}

impl PptxWriter {
    /// Create a writer with the default style.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_style(mut self, style: DeckStyle) -> Self {
        self.style = style;
        self
    }

    pub fn style(&self) -> &DeckStyle {
        &self.style
    }

    /// Serialize a deck into PPTX bytes.
    pub fn to_bytes(&self, deck: &Deck) -> Result<Vec<u8>> {
        let mut package = Package::new();

        let mut root_rels = Relationships::new();
        root_rels.add(rel_type::OFFICE_DOCUMENT, "ppt/presentation.xml");
        root_rels.add(rel_type::CORE_PROPERTIES, "docProps/core.xml");
        root_rels.add(rel_type::EXTENDED_PROPERTIES, "docProps/app.xml");
        package.add_rels("", &root_rels)?;
        package.add_part("docProps/core.xml", content_type::CORE_PROPERTIES, core_properties(deck)?);
        package.add_part("docProps/app.xml", content_type::EXTENDED_PROPERTIES, app_properties(deck)?);

        let mut pres_rels = Relationships::new();
        let master_rid = pres_rels.add(rel_type::SLIDE_MASTER, "slideMasters/slideMaster1.xml");
        let notes_master_rid = pres_rels.add(rel_type::NOTES_MASTER, "notesMasters/notesMaster1.xml");
        pres_rels.add(rel_type::THEME, "theme/theme1.xml");
        pres_rels.add(rel_type::PRES_PROPS, "presProps.xml");
        pres_rels.add(rel_type::VIEW_PROPS, "viewProps.xml");
        pres_rels.add(rel_type::TABLE_STYLES, "tableStyles.xml");

        let mut slide_rids = Vec::with_capacity(deck.slides.len());
        for (idx, slide) in deck.slides.iter().enumerate() {
            let number = idx + 1;
            slide_rids.push(pres_rels.add(rel_type::SLIDE, format!("slides/slide{}.xml", number)));
            self.add_slide(&mut package, slide, number)?;
        }

        package.add_part(
            "ppt/presentation.xml",
            content_type::PRESENTATION,
            self.presentation_xml(&master_rid, &notes_master_rid, &slide_rids)?,
        );
        package.add_rels("ppt/presentation.xml", &pres_rels)?;

        self.add_masters(&mut package)?;

        log::debug!("Packaged {} slides", deck.slides.len());
        package.to_bytes()
    }

    /// Write a deck to `path`, creating parent directories.
    ///
    /// The deck is serialized in memory before the file is created.
    pub fn write_to_path(&self, deck: &Deck, path: &Path) -> std::result::Result<(), RenderError> {
        let bytes = self.to_bytes(deck)?;
        write_output(path, &bytes)
    }

    fn add_slide(&self, package: &mut Package, slide: &Slide, number: usize) -> Result<()> {
        let slide_name = format!("ppt/slides/slide{}.xml", number);
        let has_notes = !slide.notes.is_empty();

        let mut rels = Relationships::new();
        rels.add(rel_type::SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml");
        if has_notes {
            rels.add(rel_type::NOTES_SLIDE, format!("../notesSlides/notesSlide{}.xml", number));
        }
        let xml = SlideXml::new(&self.style, &mut rels)?.slide(slide)?;
        package.add_part(slide_name.clone(), content_type::SLIDE, xml);
        package.add_rels(&slide_name, &rels)?;

        if has_notes {
            let notes_name = format!("ppt/notesSlides/notesSlide{}.xml", number);
            let mut notes_rels = Relationships::new();
            notes_rels.add(rel_type::NOTES_MASTER, "../notesMasters/notesMaster1.xml");
            notes_rels.add(rel_type::SLIDE, format!("../slides/slide{}.xml", number));
            let xml = SlideXml::new(&self.style, &mut notes_rels)?.notes(&slide.notes)?;
            package.add_part(notes_name.clone(), content_type::NOTES_SLIDE, xml);
            package.add_rels(&notes_name, &notes_rels)?;
        }

        Ok(())
    }

    fn add_masters(&self, package: &mut Package) -> Result<()> {
        let master = "ppt/slideMasters/slideMaster1.xml";
        let mut master_rels = Relationships::new();
        master_rels.add(rel_type::SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml");
        master_rels.add(rel_type::THEME, "../theme/theme1.xml");
        package.add_part(master, content_type::SLIDE_MASTER, templates::slide_master());
        package.add_rels(master, &master_rels)?;

        let layout = "ppt/slideLayouts/slideLayout1.xml";
        let mut layout_rels = Relationships::new();
        layout_rels.add(rel_type::SLIDE_MASTER, "../slideMasters/slideMaster1.xml");
        package.add_part(layout, content_type::SLIDE_LAYOUT, templates::slide_layout());
        package.add_rels(layout, &layout_rels)?;

        let notes_master = "ppt/notesMasters/notesMaster1.xml";
        let mut notes_master_rels = Relationships::new();
        notes_master_rels.add(rel_type::THEME, "../theme/theme2.xml");
        package.add_part(notes_master, content_type::NOTES_MASTER, templates::notes_master());
        package.add_rels(notes_master, &notes_master_rels)?;

        package.add_part("ppt/theme/theme1.xml", content_type::THEME, templates::theme(&self.style.font));
        package.add_part("ppt/theme/theme2.xml", content_type::THEME, templates::theme(&self.style.font));
        package.add_part("ppt/presProps.xml", content_type::PRES_PROPS, templates::presentation_properties());
        package.add_part("ppt/viewProps.xml", content_type::VIEW_PROPS, templates::view_properties());
        package.add_part("ppt/tableStyles.xml", content_type::TABLE_STYLES, templates::table_styles());
        Ok(())
    }

    fn presentation_xml(&self, master_rid: &str, notes_master_rid: &str, slide_rids: &[String]) -> Result<Vec<u8>> {
        let mut xml = XmlBuilder::new()?;
        xml.start(
            "p:presentation",
            &[("xmlns:a", A_NS), ("xmlns:r", R_NS), ("xmlns:p", P_NS), ("saveSubsetFonts", "1")],
        )?;

        xml.start("p:sldMasterIdLst", &[])?;
        xml.empty("p:sldMasterId", &[("id", "2147483648"), ("r:id", master_rid)])?;
        xml.end("p:sldMasterIdLst")?;

        xml.start("p:notesMasterIdLst", &[])?;
        xml.empty("p:notesMasterId", &[("r:id", notes_master_rid)])?;
        xml.end("p:notesMasterIdLst")?;

        xml.start("p:sldIdLst", &[])?;
        for (idx, rid) in slide_rids.iter().enumerate() {
            let id = (FIRST_SLIDE_ID + idx).to_string();
            xml.empty("p:sldId", &[("id", id.as_str()), ("r:id", rid.as_str())])?;
        }
        xml.end("p:sldIdLst")?;

        let cx = self.style.slide_width.to_string();
        let cy = self.style.slide_height.to_string();
        xml.empty("p:sldSz", &[("cx", cx.as_str()), ("cy", cy.as_str())])?;
        let notes_cx = NOTES_WIDTH.to_string();
        let notes_cy = NOTES_HEIGHT.to_string();
        xml.empty("p:notesSz", &[("cx", notes_cx.as_str()), ("cy", notes_cy.as_str())])?;

        xml.end("p:presentation")?;
        Ok(xml.finish())
    }
}

fn core_properties(deck: &Deck) -> Result<Vec<u8>> {
    let created = deck.to.format("%Y-%m-%dT00:00:00Z").to_string();
    let subject = format!("{} to {}", deck.from, deck.to);

    let mut xml = XmlBuilder::new()?;
    xml.start(
        "cp:coreProperties",
        &[
            ("xmlns:cp", "http://schemas.openxmlformats.org/package/2006/metadata/core-properties"),
            ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
            ("xmlns:dcterms", "http://purl.org/dc/terms/"),
            ("xmlns:dcmitype", "http://purl.org/dc/dcmitype/"),
            ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
        ],
    )?;
    xml.text_element("dc:title", &[], &deck.title)?;
    xml.text_element("dc:subject", &[], &subject)?;
    xml.text_element("dc:creator", &[], env!("CARGO_PKG_NAME"))?;
    xml.text_element("cp:revision", &[], "1")?;
    xml.text_element("dcterms:created", &[("xsi:type", "dcterms:W3CDTF")], &created)?;
    xml.text_element("dcterms:modified", &[("xsi:type", "dcterms:W3CDTF")], &created)?;
    xml.end("cp:coreProperties")?;
    Ok(xml.finish())
}

fn app_properties(deck: &Deck) -> Result<Vec<u8>> {
    let slides = deck.slides.len().to_string();
    let notes = deck.slides.iter().filter(|s| !s.notes.is_empty()).count().to_string();

    let mut xml = XmlBuilder::new()?;
    xml.start(
        "Properties",
        &[
            ("xmlns", "http://schemas.openxmlformats.org/officeDocument/2006/extended-properties"),
            ("xmlns:vt", "http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes"),
        ],
    )?;
    xml.text_element("Application", &[], env!("CARGO_PKG_NAME"))?;
    xml.text_element("PresentationFormat", &[], "Widescreen")?;
    xml.text_element("Slides", &[], &slides)?;
    xml.text_element("Notes", &[], &notes)?;
    xml.end("Properties")?;
    Ok(xml.finish())
}

/// Position and size of a shape, in EMU.
#[derive(Debug, Clone, Copy)]
struct Frame {
    x: i64,
    y: i64,
    cx: i64,
    cy: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Center,
    Right,
}

impl Align {
    fn as_attr(self) -> &'static str {
        match self {
            Align::Left => "l",
            Align::Center => "ctr",
            Align::Right => "r",
        }
    }
}

/// Character formatting shared by all runs of a text box.
#[derive(Debug, Clone, Copy)]
struct TextStyle<'a> {
    size: u32,
    color: &'a Rgb,
    align: Align,
    bold: bool,
}

/// Builds one slide or notes part, registering hyperlink and image
/// relationships as it goes.
struct SlideXml<'a> {
    xml: XmlBuilder,
    style: &'a DeckStyle,
    rels: &'a mut Relationships,
    next_id: u32,
}

impl<'a> SlideXml<'a> {
    fn new(style: &'a DeckStyle, rels: &'a mut Relationships) -> Result<Self> {
        Ok(Self {
            xml: XmlBuilder::new()?,
            style,
            rels,
            next_id: 2,
        })
    }

    fn slide(mut self, slide: &Slide) -> Result<Vec<u8>> {
        let style = self.style;
        let width = style.slide_width;
        let height = style.slide_height;
        let margin = inches(0.5);
        let full_width = width - 2 * margin;

        let background = match slide.kind {
            SlideKind::Cover => Some(&style.cover_background),
            _ => None,
        };
        self.begin("p:sld", background)?;

        match slide.kind {
            SlideKind::Title => {
                let title = TextStyle {
                    size: style.deck_title_size,
                    color: &style.text_color,
                    align: Align::Center,
                    bold: true,
                };
                self.text_box(
                    "Title",
                    Frame { x: margin, y: inches(2.4), cx: full_width, cy: inches(1.2) },
                    &[plain_paragraph(&slide.title)],
                    title,
                )?;
                if let Some(subtitle) = &slide.subtitle {
                    let sub = TextStyle {
                        size: style.subtitle_size,
                        color: &style.muted_color,
                        align: Align::Center,
                        bold: false,
                    };
                    self.text_box(
                        "Subtitle",
                        Frame { x: margin, y: inches(3.7), cx: full_width, cy: inches(0.8) },
                        &[plain_paragraph(subtitle)],
                        sub,
                    )?;
                }
            }
            SlideKind::Cover => {
                if let Some(url) = &slide.image_url {
                    self.picture(url, Frame { x: 0, y: 0, cx: width, cy: height })?;
                }
                self.overlay(Frame { x: 0, y: 0, cx: width, cy: inches(1.3) })?;
                let title = TextStyle {
                    size: style.title_size,
                    color: &style.cover_text_color,
                    align: Align::Left,
                    bold: true,
                };
                self.text_box(
                    "Title",
                    Frame { x: margin, y: inches(0.3), cx: full_width, cy: inches(0.9) },
                    &[plain_paragraph(&slide.title)],
                    title,
                )?;
            }
            SlideKind::Content => {
                let title = TextStyle {
                    size: style.title_size,
                    color: &style.text_color,
                    align: Align::Left,
                    bold: true,
                };
                self.text_box(
                    "Title",
                    Frame { x: margin, y: inches(0.3), cx: full_width, cy: inches(0.9) },
                    &[plain_paragraph(&slide.title)],
                    title,
                )?;
                if !slide.body.is_empty() {
                    let body = TextStyle {
                        size: style.body_size,
                        color: &style.text_color,
                        align: Align::Left,
                        bold: false,
                    };
                    self.text_box(
                        "Content",
                        Frame {
                            x: margin,
                            y: inches(1.4),
                            cx: full_width,
                            cy: height - inches(1.4) - inches(1.0),
                        },
                        &slide.body,
                        body,
                    )?;
                }
            }
        }

        if let Some(footer) = &slide.footer {
            let footer_style = TextStyle {
                size: style.footer_size,
                color: &style.muted_color,
                align: Align::Right,
                bold: false,
            };
            self.text_box(
                "Date",
                Frame {
                    x: width - inches(2.7),
                    y: height - inches(0.7),
                    cx: inches(2.2),
                    cy: inches(0.5),
                },
                &[plain_paragraph(footer)],
                footer_style,
            )?;
        }

        self.finish("p:sld")
    }

    fn notes(mut self, paragraphs: &[Paragraph]) -> Result<Vec<u8>> {
        self.begin("p:notes", None)?;

        let id = self.shape_id();
        self.xml.start("p:sp", &[])?;
        self.xml.start("p:nvSpPr", &[])?;
        self.xml.empty("p:cNvPr", &[("id", id.as_str()), ("name", "Slide Image Placeholder 1")])?;
        self.xml.start("p:cNvSpPr", &[])?;
        self.xml.empty("a:spLocks", &[("noGrp", "1"), ("noRot", "1"), ("noChangeAspect", "1")])?;
        self.xml.end("p:cNvSpPr")?;
        self.xml.start("p:nvPr", &[])?;
        self.xml.empty("p:ph", &[("type", "sldImg")])?;
        self.xml.end("p:nvPr")?;
        self.xml.end("p:nvSpPr")?;
        self.xml.empty("p:spPr", &[])?;
        self.xml.end("p:sp")?;

        let id = self.shape_id();
        self.xml.start("p:sp", &[])?;
        self.xml.start("p:nvSpPr", &[])?;
        self.xml.empty("p:cNvPr", &[("id", id.as_str()), ("name", "Notes Placeholder 2")])?;
        self.xml.start("p:cNvSpPr", &[])?;
        self.xml.empty("a:spLocks", &[("noGrp", "1")])?;
        self.xml.end("p:cNvSpPr")?;
        self.xml.start("p:nvPr", &[])?;
        self.xml.empty("p:ph", &[("type", "body"), ("idx", "1")])?;
        self.xml.end("p:nvPr")?;
        self.xml.end("p:nvSpPr")?;
        self.xml.empty("p:spPr", &[])?;

        let style = self.style;
        let text = TextStyle {
            size: style.notes_size,
            color: &style.text_color,
            align: Align::Left,
            bold: false,
        };
        self.xml.start("p:txBody", &[])?;
        self.xml.empty("a:bodyPr", &[])?;
        self.xml.empty("a:lstStyle", &[])?;
        self.paragraphs(paragraphs, text)?;
        self.xml.end("p:txBody")?;
        self.xml.end("p:sp")?;

        self.finish("p:notes")
    }

    fn shape_id(&mut self) -> String {
        let id = self.next_id;
        self.next_id += 1;
        id.to_string()
    }

    fn begin(&mut self, root: &str, background: Option<&Rgb>) -> Result<()> {
        self.xml
            .start(root, &[("xmlns:a", A_NS), ("xmlns:r", R_NS), ("xmlns:p", P_NS)])?;
        self.xml.start("p:cSld", &[])?;

        if let Some(color) = background {
            self.xml.start("p:bg", &[])?;
            self.xml.start("p:bgPr", &[])?;
            self.solid_fill(color, None)?;
            self.xml.empty("a:effectLst", &[])?;
            self.xml.end("p:bgPr")?;
            self.xml.end("p:bg")?;
        }

        self.xml.start("p:spTree", &[])?;
        self.xml.start("p:nvGrpSpPr", &[])?;
        self.xml.empty("p:cNvPr", &[("id", "1"), ("name", "")])?;
        self.xml.empty("p:cNvGrpSpPr", &[])?;
        self.xml.empty("p:nvPr", &[])?;
        self.xml.end("p:nvGrpSpPr")?;
        self.xml.start("p:grpSpPr", &[])?;
        self.xml.start("a:xfrm", &[])?;
        self.xml.empty("a:off", &[("x", "0"), ("y", "0")])?;
        self.xml.empty("a:ext", &[("cx", "0"), ("cy", "0")])?;
        self.xml.empty("a:chOff", &[("x", "0"), ("y", "0")])?;
        self.xml.empty("a:chExt", &[("cx", "0"), ("cy", "0")])?;
        self.xml.end("a:xfrm")?;
        self.xml.end("p:grpSpPr")?;
        Ok(())
    }

    fn finish(mut self, root: &str) -> Result<Vec<u8>> {
        self.xml.end("p:spTree")?;
        self.xml.end("p:cSld")?;
        self.xml.start("p:clrMapOvr", &[])?;
        self.xml.empty("a:masterClrMapping", &[])?;
        self.xml.end("p:clrMapOvr")?;
        self.xml.end(root)?;
        Ok(self.xml.finish())
    }

    fn transform(&mut self, frame: Frame) -> Result<()> {
        let (x, y, cx, cy) = (
            frame.x.to_string(),
            frame.y.to_string(),
            frame.cx.to_string(),
            frame.cy.to_string(),
        );
        self.xml.start("a:xfrm", &[])?;
        self.xml.empty("a:off", &[("x", x.as_str()), ("y", y.as_str())])?;
        self.xml.empty("a:ext", &[("cx", cx.as_str()), ("cy", cy.as_str())])?;
        self.xml.end("a:xfrm")?;
        self.xml.start("a:prstGeom", &[("prst", "rect")])?;
        self.xml.empty("a:avLst", &[])?;
        self.xml.end("a:prstGeom")
    }

    /// `alpha` is in thousandths of a percent of opacity.
    fn solid_fill(&mut self, color: &Rgb, alpha: Option<&str>) -> Result<()> {
        self.xml.start("a:solidFill", &[])?;
        match alpha {
            Some(alpha) => {
                self.xml.start("a:srgbClr", &[("val", color.hex())])?;
                self.xml.empty("a:alpha", &[("val", alpha)])?;
                self.xml.end("a:srgbClr")?;
            }
            None => self.xml.empty("a:srgbClr", &[("val", color.hex())])?,
        }
        self.xml.end("a:solidFill")
    }

    fn text_box(&mut self, name: &str, frame: Frame, paragraphs: &[Paragraph], text: TextStyle<'_>) -> Result<()> {
        let id = self.shape_id();
        let name = format!("{} {}", name, id);

        self.xml.start("p:sp", &[])?;
        self.xml.start("p:nvSpPr", &[])?;
        self.xml.empty("p:cNvPr", &[("id", id.as_str()), ("name", name.as_str())])?;
        self.xml.empty("p:cNvSpPr", &[("txBox", "1")])?;
        self.xml.empty("p:nvPr", &[])?;
        self.xml.end("p:nvSpPr")?;

        self.xml.start("p:spPr", &[])?;
        self.transform(frame)?;
        self.xml.empty("a:noFill", &[])?;
        self.xml.end("p:spPr")?;

        self.xml.start("p:txBody", &[])?;
        self.xml.start("a:bodyPr", &[("wrap", "square"), ("rtlCol", "0"), ("anchor", "t")])?;
        self.xml.empty("a:normAutofit", &[])?;
        self.xml.end("a:bodyPr")?;
        self.xml.empty("a:lstStyle", &[])?;
        self.paragraphs(paragraphs, text)?;
        self.xml.end("p:txBody")?;
        self.xml.end("p:sp")
    }

    fn picture(&mut self, url: &str, frame: Frame) -> Result<()> {
        let id = self.shape_id();
        let rid = self.rels.add_external(rel_type::IMAGE, url);

        self.xml.start("p:pic", &[])?;
        self.xml.start("p:nvPicPr", &[])?;
        self.xml.empty("p:cNvPr", &[("id", id.as_str()), ("name", "Cover Image"), ("descr", url)])?;
        self.xml.start("p:cNvPicPr", &[])?;
        self.xml.empty("a:picLocks", &[("noChangeAspect", "1")])?;
        self.xml.end("p:cNvPicPr")?;
        self.xml.empty("p:nvPr", &[])?;
        self.xml.end("p:nvPicPr")?;

        self.xml.start("p:blipFill", &[])?;
        self.xml.empty("a:blip", &[("r:link", rid.as_str())])?;
        self.xml.start("a:stretch", &[])?;
        self.xml.empty("a:fillRect", &[])?;
        self.xml.end("a:stretch")?;
        self.xml.end("p:blipFill")?;

        self.xml.start("p:spPr", &[])?;
        self.transform(frame)?;
        self.xml.end("p:spPr")?;
        self.xml.end("p:pic")
    }

    /// Translucent band behind the cover title.
    fn overlay(&mut self, frame: Frame) -> Result<()> {
        let id = self.shape_id();
        let background = self.style.cover_background.clone();

        self.xml.start("p:sp", &[])?;
        self.xml.start("p:nvSpPr", &[])?;
        self.xml.empty("p:cNvPr", &[("id", id.as_str()), ("name", "Overlay")])?;
        self.xml.empty("p:cNvSpPr", &[])?;
        self.xml.empty("p:nvPr", &[])?;
        self.xml.end("p:nvSpPr")?;
        self.xml.start("p:spPr", &[])?;
        self.transform(frame)?;
        self.solid_fill(&background, Some("60000"))?;
        self.xml.start("a:ln", &[])?;
        self.xml.empty("a:noFill", &[])?;
        self.xml.end("a:ln")?;
        self.xml.end("p:spPr")?;
        self.xml.end("p:sp")
    }

    fn paragraphs(&mut self, paragraphs: &[Paragraph], text: TextStyle<'_>) -> Result<()> {
        if paragraphs.is_empty() {
            return self.paragraph(&Paragraph::blank(), text);
        }
        for paragraph in paragraphs {
            self.paragraph(paragraph, text)?;
        }
        Ok(())
    }

    fn paragraph(&mut self, paragraph: &Paragraph, text: TextStyle<'_>) -> Result<()> {
        let size = (text.size * 100).to_string();
        let bullet_font = self.style.bullet_font.clone();

        self.xml.start("a:p", &[])?;
        match paragraph.style {
            ParagraphStyle::Bullet => {
                self.xml.start(
                    "a:pPr",
                    &[("marL", BULLET_MARGIN), ("indent", BULLET_INDENT), ("algn", text.align.as_attr())],
                )?;
                self.xml.start("a:spcBef", &[])?;
                self.xml.empty("a:spcPts", &[("val", "600")])?;
                self.xml.end("a:spcBef")?;
                self.xml.empty("a:buFont", &[("typeface", bullet_font.as_str())])?;
                self.xml.empty("a:buChar", &[("char", BULLET_CHAR)])?;
                self.xml.end("a:pPr")?;
            }
            ParagraphStyle::Normal | ParagraphStyle::Heading => {
                self.xml.start(
                    "a:pPr",
                    &[("marL", "0"), ("indent", "0"), ("algn", text.align.as_attr())],
                )?;
                self.xml.empty("a:buNone", &[])?;
                self.xml.end("a:pPr")?;
            }
        }

        for run in &paragraph.runs {
            self.run(run, text)?;
        }

        self.xml.empty("a:endParaRPr", &[("lang", "en-US"), ("sz", size.as_str()), ("dirty", "0")])?;
        self.xml.end("a:p")
    }

    fn run(&mut self, run: &TextRun, text: TextStyle<'_>) -> Result<()> {
        let size = (text.size * 100).to_string();
        let link_rid = run
            .link
            .as_deref()
            .map(|url| self.rels.add_external(rel_type::HYPERLINK, url));

        let mut attrs: Vec<(&str, &str)> = vec![("lang", "en-US"), ("sz", size.as_str())];
        if text.bold || run.style.bold {
            attrs.push(("b", "1"));
        }
        if run.style.italic {
            attrs.push(("i", "1"));
        }
        if run.style.strike {
            attrs.push(("strike", "sngStrike"));
        }
        if link_rid.is_some() {
            attrs.push(("u", "sng"));
        }
        attrs.push(("dirty", "0"));

        let color = if link_rid.is_some() {
            self.style.link_color.clone()
        } else {
            text.color.clone()
        };
        let font = if run.style.code {
            self.style.code_font.clone()
        } else {
            self.style.font.clone()
        };

        // Line breaks inside a run become <a:br/> between runs.
        for (idx, line) in run.text.split('\n').enumerate() {
            if idx > 0 {
                self.xml.start("a:br", &[])?;
                self.xml.empty("a:rPr", &attrs)?;
                self.xml.end("a:br")?;
            }
            if line.is_empty() {
                continue;
            }
            self.xml.start("a:r", &[])?;
            self.xml.start("a:rPr", &attrs)?;
            self.solid_fill(&color, None)?;
            self.xml.empty("a:latin", &[("typeface", font.as_str())])?;
            if let Some(rid) = &link_rid {
                self.xml.empty("a:hlinkClick", &[("r:id", rid.as_str())])?;
            }
            self.xml.end("a:rPr")?;
            self.xml.text_element("a:t", &[], line)?;
            self.xml.end("a:r")?;
        }
        Ok(())
    }
}

fn plain_paragraph(text: &str) -> Paragraph {
    Paragraph::new(ParagraphStyle::Normal, vec![TextRun::plain(text)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::{Cursor, Read};

    use chrono::NaiveDate;
    use updeck_core::{ArticleRecord, DeckBuilder, LabeledText, NotesBlock, RenderConfig};
    use zip::ZipArchive;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_deck(cover_slides: bool) -> Deck {
        let mut record = ArticleRecord::new("Copilot <code review> & more", date(2026, 1, 5), "https://example.com/a");
        record.image_url = "https://example.com/a.png".into();
        record.content_bullets = vec![
            LabeledText::new("Review", "now with [docs](https://docs.example.com)"),
            LabeledText::unlabeled("Use `gh copilot` from the CLI"),
        ];
        record.speaker_notes.insert(
            "en",
            "English",
            NotesBlock {
                opening: "Welcome back.".into(),
                ..Default::default()
            },
        );
        let config = RenderConfig::new(date(2026, 1, 1))
            .with_to(Some(date(2026, 1, 31)))
            .with_cover_slides(cover_slides);
        DeckBuilder::new(config).build(&[record]).unwrap()
    }

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut content = String::new();
        file.read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn test_package_has_required_parts() {
        let bytes = PptxWriter::new().to_bytes(&sample_deck(false)).unwrap();
        let archive = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "ppt/presentation.xml",
            "ppt/_rels/presentation.xml.rels",
            "ppt/slides/slide1.xml",
            "ppt/slides/slide2.xml",
            "ppt/slides/_rels/slide2.xml.rels",
            "ppt/notesSlides/notesSlide2.xml",
            "ppt/slideMasters/slideMaster1.xml",
            "ppt/slideLayouts/slideLayout1.xml",
            "ppt/notesMasters/notesMaster1.xml",
            "ppt/theme/theme1.xml",
            "docProps/core.xml",
        ] {
            assert!(names.contains(&part), "missing {}", part);
        }
        // The title slide has no notes.
        assert!(!names.contains(&"ppt/notesSlides/notesSlide1.xml"));
    }

    #[test]
    fn test_slide_text_is_escaped_and_styled() {
        let bytes = PptxWriter::new().to_bytes(&sample_deck(false)).unwrap();
        let slide = read_part(&bytes, "ppt/slides/slide2.xml");

        assert!(slide.contains("Copilot &lt;code review&gt; &amp; more"));
        assert!(slide.contains(r#"<a:buChar char="•"/>"#));
        assert!(slide.contains(r#"typeface="Courier New""#));
        assert!(slide.contains(r#"typeface="Segoe UI""#));
        assert!(slide.contains("<a:t>2026-01-05</a:t>"));
        assert!(slide.contains(r#"<a:srgbClr val="808080"/>"#));
        assert!(slide.contains(r#"<a:hlinkClick r:id="rId3"/>"#));

        let rels = read_part(&bytes, "ppt/slides/_rels/slide2.xml.rels");
        assert!(rels.contains(r#"Target="https://docs.example.com" TargetMode="External""#));
        assert!(rels.contains("../notesSlides/notesSlide2.xml"));
    }

    #[test]
    fn test_cover_slide_links_image() {
        let bytes = PptxWriter::new().to_bytes(&sample_deck(true)).unwrap();
        let cover = read_part(&bytes, "ppt/slides/slide2.xml");
        assert!(cover.contains("<p:pic>"));
        assert!(cover.contains(r#"<a:blip r:link="rId3"/>"#));
        assert!(cover.contains(r#"<a:alpha val="60000"/>"#));

        let rels = read_part(&bytes, "ppt/slides/_rels/slide2.xml.rels");
        assert!(rels.contains(r#"Target="https://example.com/a.png" TargetMode="External""#));
    }

    #[test]
    fn test_presentation_lists_slides_in_order() {
        let bytes = PptxWriter::new().to_bytes(&sample_deck(true)).unwrap();
        let presentation = read_part(&bytes, "ppt/presentation.xml");
        let first = presentation.find(r#"<p:sldId id="256""#).unwrap();
        let last = presentation.find(r#"<p:sldId id="258""#).unwrap();
        assert!(first < last);
        assert!(presentation.contains(r#"<p:sldSz cx="12192000" cy="6858000"/>"#));

        let content_types = read_part(&bytes, "[Content_Types].xml");
        assert!(content_types.contains(r#"PartName="/ppt/slides/slide3.xml""#));
        assert!(content_types.contains(r#"PartName="/ppt/notesSlides/notesSlide3.xml""#));
    }

    #[test]
    fn test_write_to_path_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pptx").join("updates_from_2026-01-01_to_2026-01-31.pptx");
        PptxWriter::new().write_to_path(&sample_deck(false), &path).unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn test_write_failure_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("pptx");
        fs::write(&blocker, b"not a directory").unwrap();

        let path = blocker.join("deck.pptx");
        let err = PptxWriter::new().write_to_path(&sample_deck(false), &path).unwrap_err();
        assert!(matches!(err, RenderError::WriteFailed { .. }));
        assert!(!path.exists());
    }
}
