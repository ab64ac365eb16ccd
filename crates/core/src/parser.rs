//! Article markdown parser.
//!
//! An article document looks like:
//!
//! ```text
//! # Title
//! ## Article Date
//! 2026-01-05
//! ## Article Url
//! https://github.blog/changelog/...
//! ## Article Image
//! https://.../image.png
//! ## Article Content
//! - **Label**: description
//! ## Speaker Notes
//! ### Italian
//! **Apertura:** ...
//! ### English
//! **Opening:** ...
//! ```
//!
//! Only the title, date and URL are required. Everything else defaults to
//! empty values, and formatting drift produces warnings instead of errors.

use std::fmt;

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use crate::error::ParseError;
use crate::notes::{append_continuation, is_rule, list_item, parse_labeled, NotesScanner};
use crate::sections::{first_line, Sections};
use crate::types::{resolve_language, ArticleRecord, LabeledText, SpeakerNotes};

/// Markdown link or image target: `[text](url)` / `![alt](url)`.
static LINK_TARGET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\]\(\s*([^)\s]+)\s*\)").unwrap());

/// Bare absolute URL.
static BARE_URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(https?://[^\s\])>"']+)"#).unwrap());

/// Top-level `**Image:** ...` field used by older articles.
static IMAGE_FIELD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\*\*Image:?\*\*:?\s*(.+)$").unwrap());

/// Language name in parentheses: `Speaker Notes (Italian)`.
static PAREN_LANGUAGE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^)]+)\)").unwrap());

/// The words "Speaker Notes" inside a subsection heading.
static SPEAKER_NOTES_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)speaker\s+notes").unwrap());

/// Language code used when a notes block has no language in its heading.
const UNNAMED_LANGUAGE: &str = "notes";

/// Label of the unnamed notes block; a `### Notes` subsection maps back to it.
const UNNAMED_LABEL: &str = "Notes";

/// A non-blocking issue found while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseWarning {
    /// A bold marker that is not a known notes field.
    UnrecognizedMarker { language: String, marker: String },

    /// Notes text before the first field marker.
    StrayText { language: String, line: String },

    /// A URL field that is not an absolute URL.
    InvalidUrl { field: &'static str, value: String },

    /// A section that appears more than once; the first one wins.
    DuplicateSection(String),
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnrecognizedMarker { language, marker } => {
                write!(f, "unrecognized notes marker {:?} in {} notes", marker, language)
            }
            Self::StrayText { language, line } => {
                write!(f, "text outside any field in {} notes: {:?}", language, line)
            }
            Self::InvalidUrl { field, value } => write!(f, "{} is not an absolute URL: {:?}", field, value),
            Self::DuplicateSection(name) => write!(f, "duplicate section {:?} ignored", name),
        }
    }
}

/// A parsed record together with the warnings raised while parsing it.
#[derive(Debug, Clone)]
pub struct ParsedArticle {
    pub record: ArticleRecord,
    pub warnings: Vec<ParseWarning>,
}

/// Parser for article markdown documents.
#[derive(Debug, Clone, Default)]
pub struct ArticleParser {
    /// Whether to check `url`/`image_url` with a URL parser.
    validate_urls: bool,
}

impl ArticleParser {
    /// Create a parser with URL validation enabled.
    pub fn new() -> Self {
        Self { validate_urls: true }
    }

    /// Enable or disable URL validation warnings.
    pub fn with_url_validation(mut self, validate: bool) -> Self {
        self.validate_urls = validate;
        self
    }

    /// Parse one article document.
    pub fn parse(&self, text: &str) -> Result<ParsedArticle, ParseError> {
        let sections = Sections::split(text);
        let mut warnings = Vec::new();

        let title = sections
            .headings()
            .iter()
            .find(|h| h.level == 1)
            .map(|h| h.text.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(ParseError::MissingTitle)?;

        for name in ["Article Date", "Article Url", "Article Image", "Article Content", "Speaker Notes"] {
            let count = sections
                .headings()
                .iter()
                .filter(|h| h.level == 2 && h.is_named(name))
                .count();
            if count > 1 {
                warnings.push(ParseWarning::DuplicateSection(name.to_string()));
            }
        }

        let date_idx = sections
            .find(2, &["Article Date"])
            .ok_or(ParseError::MissingDateSection)?;
        let date = parse_date(first_line(sections.direct_body(date_idx)).unwrap_or(""))?;

        let url_idx = sections
            .find(2, &["Article Url", "Article Link"])
            .ok_or(ParseError::MissingUrlSection)?;
        let url = first_line(sections.direct_body(url_idx))
            .unwrap_or("")
            .to_string();
        self.check_url("Article Url", &url, &mut warnings);

        let image_url = self.image_url(&sections, &mut warnings);

        let content_bullets = sections
            .find(2, &["Article Content"])
            .map(|idx| parse_content(sections.direct_body(idx)))
            .unwrap_or_default();

        let speaker_notes = parse_speaker_notes(&sections, &mut warnings);

        Ok(ParsedArticle {
            record: ArticleRecord {
                title,
                date,
                url,
                image_url,
                content_bullets,
                speaker_notes,
            },
            warnings,
        })
    }

    /// Image URL from `## Article Image`, or from a `**Image:**` field.
    fn image_url(&self, sections: &Sections<'_>, warnings: &mut Vec<ParseWarning>) -> String {
        let raw = match sections.find(2, &["Article Image"]) {
            Some(idx) => first_line(sections.direct_body(idx)).map(str::to_string),
            None => sections
                .lines()
                .iter()
                .find_map(|line| IMAGE_FIELD_REGEX.captures(line.trim()).map(|c| c[1].trim().to_string())),
        };

        let Some(raw) = raw else {
            return String::new();
        };

        match extract_url(&raw) {
            Some(url) => {
                self.check_url("Article Image", &url, warnings);
                url
            }
            None => {
                warnings.push(ParseWarning::InvalidUrl {
                    field: "Article Image",
                    value: raw,
                });
                String::new()
            }
        }
    }

    fn check_url(&self, field: &'static str, value: &str, warnings: &mut Vec<ParseWarning>) {
        if self.validate_urls && Url::parse(value).is_err() {
            log::debug!("{} is not an absolute URL: {:?}", field, value);
            warnings.push(ParseWarning::InvalidUrl {
                field,
                value: value.to_string(),
            });
        }
    }
}

/// Parse the date line, tolerating surrounding emphasis or backticks.
fn parse_date(line: &str) -> Result<NaiveDate, ParseError> {
    let cleaned = line.trim_matches(|c: char| c == '*' || c == '_' || c == '`' || c.is_whitespace());
    NaiveDate::parse_from_str(cleaned, "%Y-%m-%d").map_err(|_| ParseError::InvalidDate(line.to_string()))
}

/// Pull a URL out of a plain URL, `[text](url)` or `![alt](url)`.
fn extract_url(raw: &str) -> Option<String> {
    if let Some(caps) = LINK_TARGET_REGEX.captures(raw) {
        return Some(caps[1].to_string());
    }
    if let Some(caps) = BARE_URL_REGEX.captures(raw) {
        return Some(caps[1].to_string());
    }
    None
}

/// One bullet per list item or unindented line, in source order.
///
/// Indented lines without a list marker continue the previous bullet.
/// Horizontal rules are skipped.
fn parse_content(body: &[&str]) -> Vec<LabeledText> {
    let mut bullets: Vec<LabeledText> = Vec::new();
    for raw in body {
        let line = raw.trim();
        if line.is_empty() || is_rule(line) {
            continue;
        }
        let item = list_item(line);
        let continuation = raw.starts_with(' ') || raw.starts_with('\t');
        match bullets.last_mut() {
            Some(last) if item.is_none() && continuation => append_continuation(&mut last.text, line),
            _ => bullets.push(parse_labeled(item.unwrap_or(line))),
        }
    }
    bullets
}

/// Collect every language subsection of the speaker notes.
fn parse_speaker_notes(sections: &Sections<'_>, warnings: &mut Vec<ParseWarning>) -> SpeakerNotes {
    let mut notes = SpeakerNotes::new();
    let mut in_notes_section = false;
    let mut notes_section: Option<usize> = None;
    let mut found_subsection = false;

    for (idx, heading) in sections.headings().iter().enumerate() {
        match heading.level {
            1 | 2 => {
                in_notes_section = heading.level == 2 && heading.is_named("Speaker Notes");
                if in_notes_section && notes_section.is_none() {
                    notes_section = Some(idx);
                }
            }
            3 => {
                let mentions_notes = SPEAKER_NOTES_REGEX.is_match(&heading.clean_text());
                if !(in_notes_section || mentions_notes) {
                    continue;
                }
                found_subsection = true;
                let name = language_name(&heading.clean_text());
                let (code, label) = if name.is_empty() || name.eq_ignore_ascii_case(UNNAMED_LABEL) {
                    (UNNAMED_LANGUAGE.to_string(), UNNAMED_LABEL.to_string())
                } else {
                    resolve_language(&name)
                };
                let (block, scan_warnings) = NotesScanner::scan(&label, sections.nested_body(idx).iter().copied());
                warnings.extend(scan_warnings);
                notes.insert(code, label, block);
            }
            _ => {}
        }
    }

    // Notes written directly under `## Speaker Notes` without language subsections.
    if !found_subsection {
        if let Some(idx) = notes_section {
            let body = sections.nested_body(idx);
            if body.iter().any(|l| !l.trim().is_empty()) {
                let (block, scan_warnings) = NotesScanner::scan(UNNAMED_LABEL, body.iter().copied());
                warnings.extend(scan_warnings);
                notes.insert(UNNAMED_LANGUAGE, UNNAMED_LABEL, block);
            }
        }
    }

    notes
}

/// Language name from a subsection heading such as `Speaker Notes (Italian)`
/// or plain `English`.
fn language_name(heading: &str) -> String {
    if let Some(caps) = PAREN_LANGUAGE_REGEX.captures(heading) {
        return caps[1].trim().to_string();
    }
    SPEAKER_NOTES_REGEX
        .replace(heading, "")
        .trim_matches(|c: char| c.is_whitespace() || c == '-' || c == ':' || c == '–')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE: &str = "\
# Copilot code review is generally available

## Article Date
2026-01-05

## Article Url
https://github.blog/changelog/2026-01-05-copilot-code-review

## Article Image
![cover](https://github.blog/wp-content/uploads/cover.png)

## Article Content
- **Availability**: all paid plans
- **Languages**: every language supported by Copilot
- Works in pull requests

## Speaker Notes

### Italian
**Apertura:** Oggi parliamo di code review.

**Punti Principali:**
- Disponibile per tutti
- Supporta ogni linguaggio

**Punti Focali Chiave:**
- **Velocità**: revisioni in minuti

**Implicazioni:** Meno attese.

**Conclusione:** Provatelo.

### English
**Opening:** Today we talk about code review.

**Main Points:**
- Available to everyone

**Key Focal Points:**
- **Speed**: reviews in minutes

**Implications:** Less waiting.

**Conclusion:** Try it.
";

    fn parse(text: &str) -> Result<ParsedArticle, ParseError> {
        ArticleParser::new().parse(text)
    }

    #[test]
    fn test_parse_full_article() {
        let parsed = parse(ARTICLE).unwrap();
        let record = parsed.record;

        assert!(parsed.warnings.is_empty(), "{:?}", parsed.warnings);
        assert_eq!(record.title, "Copilot code review is generally available");
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2026, 1, 5).unwrap());
        assert_eq!(record.url, "https://github.blog/changelog/2026-01-05-copilot-code-review");
        assert_eq!(record.image_url, "https://github.blog/wp-content/uploads/cover.png");
        assert_eq!(
            record.content_bullets,
            vec![
                LabeledText::new("Availability", "all paid plans"),
                LabeledText::new("Languages", "every language supported by Copilot"),
                LabeledText::unlabeled("Works in pull requests"),
            ]
        );

        assert_eq!(record.speaker_notes.codes(), vec!["it", "en"]);
        let it = &record.speaker_notes.get("it").unwrap().notes;
        assert_eq!(it.opening, "Oggi parliamo di code review.");
        assert_eq!(it.main_points.len(), 2);
        assert_eq!(it.focal_points[0], LabeledText::new("Velocità", "revisioni in minuti"));
        assert_eq!(it.conclusion, "Provatelo.");

        let en = &record.speaker_notes.get("en").unwrap().notes;
        assert_eq!(en.implications, "Less waiting.");
    }

    #[test]
    fn test_missing_title() {
        let err = parse("## Article Date\n2026-01-05\n## Article Url\nhttps://x.io\n").unwrap_err();
        assert_eq!(err, ParseError::MissingTitle);
    }

    #[test]
    fn test_missing_date_section() {
        let err = parse("# T\n## Article Url\nhttps://x.io\n").unwrap_err();
        assert_eq!(err, ParseError::MissingDateSection);
    }

    #[test]
    fn test_invalid_date() {
        let err = parse("# T\n## Article Date\n2026-02-30\n## Article Url\nhttps://x.io\n").unwrap_err();
        assert_eq!(err, ParseError::InvalidDate("2026-02-30".into()));

        let err = parse("# T\n## Article Date\n\n## Article Url\nhttps://x.io\n").unwrap_err();
        assert_eq!(err, ParseError::InvalidDate(String::new()));
    }

    #[test]
    fn test_missing_url_section() {
        let err = parse("# T\n## Article Date\n2026-01-05\n").unwrap_err();
        assert_eq!(err, ParseError::MissingUrlSection);
    }

    #[test]
    fn test_sparse_article_is_valid() {
        let parsed = parse("# T\n## Article Date\n**2026-01-05**\n## Article Url\nhttps://x.io\n").unwrap();
        let record = parsed.record;
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2026, 1, 5).unwrap());
        assert!(record.image_url.is_empty());
        assert!(record.content_bullets.is_empty());
        assert!(record.speaker_notes.is_empty());
    }

    #[test]
    fn test_legacy_notes_headings_and_image_field() {
        let text = "\
# Legacy
**Image:** [cover](https://example.com/a.png)
## Article Date
2026-01-20
## Article Url
https://example.com/post
## Article Content
**Feature**: something new
### **Speaker Notes (Italian)**:
**Apertura:** Ciao
### **Speaker Notes (English)**:
**Opening:** Hello
";
        let record = parse(text).unwrap().record;
        assert_eq!(record.image_url, "https://example.com/a.png");
        assert_eq!(record.content_bullets, vec![LabeledText::new("Feature", "something new")]);
        assert_eq!(record.speaker_notes.codes(), vec!["it", "en"]);
        assert_eq!(record.speaker_notes.get("en").unwrap().notes.opening, "Hello");
    }

    #[test]
    fn test_unknown_language_kept_literally() {
        let text = "# T\n## Article Date\n2026-01-05\n## Article Url\nhttps://x.io\n## Speaker Notes\n### Klingon\n**Opening:** nuqneH\n";
        let record = parse(text).unwrap().record;
        let klingon = record.speaker_notes.get("Klingon").unwrap();
        assert_eq!(klingon.label, "Klingon");
        assert_eq!(klingon.notes.opening, "nuqneH");
    }

    #[test]
    fn test_notes_without_language_subsections() {
        let text = "# T\n## Article Date\n2026-01-05\n## Article Url\nhttps://x.io\n## Speaker Notes\n**Opening:** hi\n";
        let record = parse(text).unwrap().record;
        assert_eq!(record.speaker_notes.get("notes").unwrap().notes.opening, "hi");
    }

    #[test]
    fn test_invalid_url_is_a_warning() {
        let parsed = parse("# T\n## Article Date\n2026-01-05\n## Article Url\nnot a url\n").unwrap();
        assert_eq!(parsed.record.url, "not a url");
        assert_eq!(
            parsed.warnings,
            vec![ParseWarning::InvalidUrl {
                field: "Article Url",
                value: "not a url".into()
            }]
        );

        let quiet = ArticleParser::new()
            .with_url_validation(false)
            .parse("# T\n## Article Date\n2026-01-05\n## Article Url\nnot a url\n")
            .unwrap();
        assert!(quiet.warnings.is_empty());
    }

    #[test]
    fn test_content_bullets_beyond_cap_are_kept() {
        let mut text = String::from("# T\n## Article Date\n2026-01-05\n## Article Url\nhttps://x.io\n## Article Content\n");
        for i in 0..8 {
            text.push_str(&format!("- **L{}**: d{}\n", i, i));
        }
        let record = parse(&text).unwrap().record;
        assert_eq!(record.content_bullets.len(), 8);
        assert_eq!(record.content_bullets[7].label, "L7");
    }

    #[test]
    fn test_title_ending_in_hash() {
        let text = "# Copilot code review now supports C#\n## Article Date\n2026-01-05\n## Article Url\nhttps://x.io\n";
        let record = parse(text).unwrap().record;
        assert_eq!(record.title, "Copilot code review now supports C#");
    }

    #[test]
    fn test_rules_in_content_are_skipped() {
        let text = "# T\n## Article Date\n2026-01-05\n## Article Url\nhttps://x.io\n## Article Content\n- a\n- b\n\n---\n## Speaker Notes\n";
        let record = parse(text).unwrap().record;
        assert_eq!(
            record.content_bullets,
            vec![LabeledText::unlabeled("a"), LabeledText::unlabeled("b")]
        );
    }

    #[test]
    fn test_wrapped_content_bullet_is_joined() {
        let text = "# T\n## Article Date\n2026-01-05\n## Article Url\nhttps://x.io\n## Article Content\n- **Search**: better search\n  across repositories\n- b\n";
        let record = parse(text).unwrap().record;
        assert_eq!(
            record.content_bullets,
            vec![
                LabeledText::new("Search", "better search across repositories"),
                LabeledText::unlabeled("b"),
            ]
        );
    }

    #[test]
    fn test_unnamed_notes_survive_round_trip() {
        let text = "# T\n## Article Date\n2026-01-05\n## Article Url\nhttps://x.io\n## Speaker Notes\n**Opening:** hi\n";
        let first = parse(text).unwrap().record;
        let second = parse(&first.to_markdown()).unwrap().record;
        assert_eq!(second.speaker_notes.codes(), vec!["notes"]);
        assert_eq!(second, first);
    }

    #[test]
    fn test_language_name() {
        assert_eq!(language_name("Speaker Notes (Italian)"), "Italian");
        assert_eq!(language_name("English"), "English");
        assert_eq!(language_name("Speaker Notes - English"), "English");
        assert_eq!(language_name("Speaker Notes"), "");
    }
}
