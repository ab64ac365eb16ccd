//! Pandoc slide-markdown output.
//!
//! Produces a markdown document with YAML front matter, one `##` heading per
//! slide and `::: notes` blocks for speaker notes. Converting it to PDF,
//! HTML or PPTX is left to an external `pandoc` run.

use std::fmt::Write as FmtWrite;
use std::path::Path;
use std::str::FromStr;

use crate::config::DATE_FORMAT;
use crate::deck::{Deck, Paragraph, ParagraphStyle, Slide, SlideKind};
use crate::error::{ConfigError, RenderError};
use crate::inline::to_markdown;
use crate::output::write_output;

/// Pandoc writer the output is meant for. Only affects front matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PandocTarget {
    #[default]
    Beamer,
    Revealjs,
    Slidy,
}

impl FromStr for PandocTarget {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beamer" => Ok(Self::Beamer),
            "revealjs" => Ok(Self::Revealjs),
            "slidy" => Ok(Self::Slidy),
            _ => Err(ConfigError::InvalidValue {
                flag: "--pandoc-target",
                value: s.to_string(),
            }),
        }
    }
}

/// Formatter for Pandoc slide markdown.
#[derive(Debug, Clone, Default)]
pub struct PandocFormatter {
    target: PandocTarget,
}

impl PandocFormatter {
    /// Create a formatter for the default Beamer target.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_target(mut self, target: PandocTarget) -> Self {
        self.target = target;
        self
    }

    /// Format a deck. The title slide becomes front matter.
    pub fn format(&self, deck: &Deck) -> String {
        let mut out = String::with_capacity(4096);
        self.write_front_matter(&mut out, deck);

        for slide in deck.slides.iter().filter(|s| s.kind != SlideKind::Title) {
            write_slide(&mut out, slide);
        }

        out
    }

    /// Format a deck and write it to `path`.
    pub fn write_to_path(&self, deck: &Deck, path: &Path) -> Result<(), RenderError> {
        write_output(path, self.format(deck).as_bytes())
    }

    fn write_front_matter(&self, out: &mut String, deck: &Deck) {
        let subtitle = deck
            .slides
            .iter()
            .find(|s| s.kind == SlideKind::Title)
            .and_then(|s| s.subtitle.clone());

        out.push_str("---\n");
        let _ = writeln!(out, "title: {}", yaml_string(&deck.title));
        if let Some(subtitle) = subtitle {
            let _ = writeln!(out, "subtitle: {}", yaml_string(&subtitle));
        }
        let _ = writeln!(out, "date: {}", deck.to.format(DATE_FORMAT));
        out.push_str("theme: default\n");
        if self.target == PandocTarget::Beamer {
            out.push_str("colortheme: default\n");
            out.push_str("aspectratio: 169\n");
        }
        out.push_str("---\n\n");
    }
}

fn write_slide(out: &mut String, slide: &Slide) {
    let _ = writeln!(out, "## {}\n", slide.title);

    if let Some(url) = &slide.image_url {
        let _ = writeln!(out, "![]({}){{.background}}\n", url);
    }

    if !slide.body.is_empty() {
        write_paragraphs(out, &slide.body);
        out.push('\n');
    }

    if let Some(footer) = &slide.footer {
        let _ = writeln!(out, "<!-- Date: {} -->\n", footer);
    }

    if !slide.notes.is_empty() {
        out.push_str("::: notes\n\n");
        write_paragraphs(out, &slide.notes);
        out.push_str("\n:::\n\n");
    }
}

/// Bullets as a tight list, other paragraphs separated by blank lines.
fn write_paragraphs(out: &mut String, paragraphs: &[Paragraph]) {
    let mut previous: Option<ParagraphStyle> = None;
    for paragraph in paragraphs {
        if paragraph.is_blank() {
            continue;
        }
        let text = to_markdown(&paragraph.runs);
        match paragraph.style {
            ParagraphStyle::Bullet => {
                if previous.is_some_and(|p| p != ParagraphStyle::Bullet) {
                    out.push('\n');
                }
                let _ = writeln!(out, "- {}", text);
            }
            ParagraphStyle::Normal | ParagraphStyle::Heading => {
                if previous.is_some() {
                    out.push('\n');
                }
                let _ = writeln!(out, "{}", text);
            }
        }
        previous = Some(paragraph.style);
    }
}

/// Quote a YAML scalar.
fn yaml_string(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}
