//! Speaker-notes scanning for one language subsection.
//!
//! The scanner is a small state machine: it starts `Idle`, moves to
//! `InField(field)` on every recognized bold marker (`**Opening:**`,
//! `**Punti Principali:**`, ...), and assigns each following line to the
//! current field until the next marker or the end of the subsection.

use regex::Regex;
use std::sync::LazyLock;

use crate::parser::ParseWarning;
use crate::types::{LabeledText, NotesBlock};

/// Bold marker at line start, optionally after a list marker:
/// `**Opening:** text`, `**Opening**: text`, `- **Opening:**`.
static MARKER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[-*+•]\s+)?\*\*\s*([^*]+?)\s*\*\*\s*:?\s*(.*)$").unwrap()
});

/// List item marker: `- `, `* `, `+ `, `• ` or `1. `.
static LIST_ITEM_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[-*+•]|\d+[.)])\s+(.*)$").unwrap());

/// `**Label**: text` or `**Label:** text`.
static LABELED_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\*\*([^*]+?)\*\*\s*:\s*(.*)$|^\*\*([^*]+?):\*\*\s*(.*)$").unwrap()
});

/// One of the five fields of a notes block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotesField {
    Opening,
    MainPoints,
    FocalPoints,
    Implications,
    Conclusion,
}

impl NotesField {
    /// All fields in presentation order.
    pub const ALL: [NotesField; 5] = [
        NotesField::Opening,
        NotesField::MainPoints,
        NotesField::FocalPoints,
        NotesField::Implications,
        NotesField::Conclusion,
    ];

    /// Recognize a marker name (English or Italian), case-insensitively.
    pub fn from_marker(name: &str) -> Option<Self> {
        let name = name.trim().trim_end_matches(':').trim().to_lowercase();
        match name.as_str() {
            "opening" | "apertura" | "introduction" | "introduzione" => Some(Self::Opening),
            "main points" | "punti principali" => Some(Self::MainPoints),
            "key focal points" | "punti focali chiave" | "focal points" | "punti focali" => {
                Some(Self::FocalPoints)
            }
            "implications" | "implicazioni" => Some(Self::Implications),
            "conclusion" | "conclusions" | "conclusione" | "conclusioni" => Some(Self::Conclusion),
            _ => None,
        }
    }

    /// Marker text written for this field in the given language.
    pub fn marker(&self, language_code: &str) -> &'static str {
        let italian = language_code.eq_ignore_ascii_case("it");
        match (self, italian) {
            (Self::Opening, false) => "Opening",
            (Self::Opening, true) => "Apertura",
            (Self::MainPoints, false) => "Main Points",
            (Self::MainPoints, true) => "Punti Principali",
            (Self::FocalPoints, false) => "Key Focal Points",
            (Self::FocalPoints, true) => "Punti Focali Chiave",
            (Self::Implications, false) => "Implications",
            (Self::Implications, true) => "Implicazioni",
            (Self::Conclusion, false) => "Conclusion",
            (Self::Conclusion, true) => "Conclusione",
        }
    }
}

/// Scanner state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Idle,
    InField(NotesField),
}

/// Line-fed scanner producing a [`NotesBlock`] for one language.
#[derive(Debug)]
pub struct NotesScanner {
    language: String,
    state: ScanState,
    block: NotesBlock,
    warnings: Vec<ParseWarning>,
}

impl NotesScanner {
    /// Create a scanner for the named language subsection.
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            state: ScanState::Idle,
            block: NotesBlock::default(),
            warnings: Vec::new(),
        }
    }

    /// Scan all lines of a subsection body.
    pub fn scan<'a>(language: &str, lines: impl IntoIterator<Item = &'a str>) -> (NotesBlock, Vec<ParseWarning>) {
        let mut scanner = Self::new(language);
        for line in lines {
            scanner.feed(line);
        }
        scanner.finish()
    }

    /// Feed one line of the subsection.
    pub fn feed(&mut self, raw: &str) {
        let continuation = raw.starts_with(' ') || raw.starts_with('\t');
        let line = raw.trim();
        if line.is_empty() || is_rule(line) {
            return;
        }

        // Nested headings (`#### Opening`) act as markers too.
        if is_heading(line) {
            let name = crate::sections::clean_heading(line.trim_start_matches('#'));
            match NotesField::from_marker(&name) {
                Some(field) => self.state = ScanState::InField(field),
                None => self.warn_unrecognized(&name),
            }
            return;
        }

        let marker = MARKER_REGEX.captures(line);
        if let Some(caps) = &marker {
            if let Some(field) = NotesField::from_marker(&caps[1]) {
                self.state = ScanState::InField(field);
                let rest = caps[2].trim();
                if !rest.is_empty() {
                    self.push_content(field, rest, false);
                }
                return;
            }
        }

        match self.state {
            ScanState::InField(field) => {
                // Bold labels are normal on list items.
                let list_field = matches!(field, NotesField::MainPoints | NotesField::FocalPoints);
                if let (Some(caps), false) = (&marker, list_field) {
                    self.warn_unrecognized(caps[1].trim());
                }
                self.push_content(field, line, continuation);
            }
            ScanState::Idle => match &marker {
                Some(caps) => self.warn_unrecognized(caps[1].trim()),
                None => {
                    log::debug!("[{}] text outside any notes field: {}", self.language, line);
                    self.warnings.push(ParseWarning::StrayText {
                        language: self.language.clone(),
                        line: line.to_string(),
                    });
                }
            },
        }
    }

    /// Finish scanning and return the block plus any warnings.
    pub fn finish(self) -> (NotesBlock, Vec<ParseWarning>) {
        (self.block, self.warnings)
    }

    fn warn_unrecognized(&mut self, marker: &str) {
        log::debug!("[{}] unrecognized notes marker: {}", self.language, marker);
        self.warnings.push(ParseWarning::UnrecognizedMarker {
            language: self.language.clone(),
            marker: marker.to_string(),
        });
    }

    /// Append a line to `field`. List fields start a new entry per list item
    /// or unindented line; indented plain lines continue the previous entry.
    fn push_content(&mut self, field: NotesField, line: &str, continuation: bool) {
        match field {
            NotesField::Opening => append_paragraph(&mut self.block.opening, line),
            NotesField::Implications => append_paragraph(&mut self.block.implications, line),
            NotesField::Conclusion => append_paragraph(&mut self.block.conclusion, line),
            NotesField::MainPoints => {
                let item = list_item(line);
                match self.block.main_points.last_mut() {
                    Some(last) if item.is_none() && continuation => append_continuation(last, line),
                    _ => self.block.main_points.push(item.unwrap_or(line).to_string()),
                }
            }
            NotesField::FocalPoints => {
                let item = list_item(line);
                match self.block.focal_points.last_mut() {
                    Some(last) if item.is_none() && continuation => append_continuation(&mut last.text, line),
                    _ => self.block.focal_points.push(parse_labeled(item.unwrap_or(line))),
                }
            }
        }
    }
}

/// Strip a leading list marker, if any.
pub(crate) fn list_item(line: &str) -> Option<&str> {
    LIST_ITEM_REGEX
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

/// Split `**Label**: text` into its parts; other lines become unlabeled.
pub(crate) fn parse_labeled(line: &str) -> LabeledText {
    let line = line.trim();
    match LABELED_REGEX.captures(line) {
        Some(caps) => {
            let label = caps.get(1).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
            let text = caps.get(2).or_else(|| caps.get(4)).map_or("", |m| m.as_str());
            LabeledText::new(label.trim(), text.trim())
        }
        None => LabeledText::unlabeled(line),
    }
}

fn append_paragraph(target: &mut String, line: &str) {
    if !target.is_empty() {
        target.push('\n');
    }
    target.push_str(line);
}

pub(crate) fn append_continuation(target: &mut String, line: &str) {
    if !target.is_empty() {
        target.push(' ');
    }
    target.push_str(line);
}

/// ATX heading line: one to six `#` followed by whitespace or nothing.
fn is_heading(line: &str) -> bool {
    let text = line.trim_start_matches('#');
    let hashes = line.len() - text.len();
    (1..=6).contains(&hashes) && (text.is_empty() || text.starts_with(char::is_whitespace))
}

/// Horizontal rule (`---`, `***`, `___`).
pub(crate) fn is_rule(line: &str) -> bool {
    line.len() >= 3
        && (line.chars().all(|c| c == '-') || line.chars().all(|c| c == '*') || line.chars().all(|c| c == '_'))
}
