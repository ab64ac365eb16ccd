//! Heading-based splitting of an article document.

use regex::Regex;
use std::sync::LazyLock;

/// ATX heading: `#`..`######`, then text, with optional closing hashes.
/// A closing sequence must be preceded by whitespace, so `C#` keeps its `#`.
static HEADING_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.*?)(?:\s+#+)?\s*$").unwrap());

/// A heading line and where it sits in the document.
#[derive(Debug, Clone)]
pub(crate) struct Heading {
    pub level: usize,
    /// Raw heading text, without the `#` marker.
    pub text: String,
    /// Line index of the heading itself.
    pub line: usize,
}

impl Heading {
    /// Heading text with emphasis markers and trailing colons stripped.
    pub fn clean_text(&self) -> String {
        clean_heading(&self.text)
    }

    /// Case-insensitive comparison against a section name.
    pub fn is_named(&self, name: &str) -> bool {
        self.clean_text().eq_ignore_ascii_case(name)
    }
}

/// A document split into lines with its headings indexed.
#[derive(Debug)]
pub(crate) struct Sections<'a> {
    lines: Vec<&'a str>,
    headings: Vec<Heading>,
}

impl<'a> Sections<'a> {
    /// Index every heading outside fenced code blocks.
    pub fn split(text: &'a str) -> Self {
        let lines: Vec<&str> = text.lines().collect();
        let mut headings = Vec::new();
        let mut in_fence = false;

        for (idx, line) in lines.iter().enumerate() {
            let trimmed = line.trim_start();
            if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
                in_fence = !in_fence;
                continue;
            }
            if in_fence {
                continue;
            }
            if let Some(caps) = HEADING_REGEX.captures(line) {
                headings.push(Heading {
                    level: caps[1].len(),
                    text: caps[2].trim().to_string(),
                    line: idx,
                });
            }
        }

        Self { lines, headings }
    }

    pub fn lines(&self) -> &[&'a str] {
        &self.lines
    }

    pub fn headings(&self) -> &[Heading] {
        &self.headings
    }

    /// First heading at `level` whose cleaned text equals one of `names`.
    pub fn find(&self, level: usize, names: &[&str]) -> Option<usize> {
        self.headings
            .iter()
            .position(|h| h.level == level && names.iter().any(|n| h.is_named(n)))
    }

    /// Body of heading `idx` up to the next heading of any level.
    pub fn direct_body(&self, idx: usize) -> &[&'a str] {
        let start = self.headings[idx].line + 1;
        let end = self
            .headings
            .get(idx + 1)
            .map_or(self.lines.len(), |h| h.line);
        &self.lines[start..end]
    }

    /// Body of heading `idx` including nested deeper headings, up to the next
    /// heading of the same or a higher level.
    pub fn nested_body(&self, idx: usize) -> &[&'a str] {
        let level = self.headings[idx].level;
        let start = self.headings[idx].line + 1;
        let end = self.headings[idx + 1..]
            .iter()
            .find(|h| h.level <= level)
            .map_or(self.lines.len(), |h| h.line);
        &self.lines[start..end]
    }
}

/// Strip `**`/`__` emphasis, surrounding whitespace, and trailing colons.
pub(crate) fn clean_heading(text: &str) -> String {
    text.replace("**", "")
        .replace("__", "")
        .trim()
        .trim_end_matches(':')
        .trim()
        .to_string()
}

/// First non-blank line of a body, trimmed.
pub(crate) fn first_line<'a>(body: &[&'a str]) -> Option<&'a str> {
    body.iter().map(|l| l.trim()).find(|l| !l.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "intro line\n# Title\n## A\nbody a\n### A1\nnested\n## B\nbody b\n```\n# not a heading\n```\n";

    #[test]
    fn test_split_headings_skips_fences() {
        let sections = Sections::split(DOC);
        let levels: Vec<usize> = sections.headings().iter().map(|h| h.level).collect();
        assert_eq!(levels, vec![1, 2, 3, 2]);
        assert_eq!(sections.lines()[0], "intro line");
    }

    #[test]
    fn test_direct_and_nested_body() {
        let sections = Sections::split(DOC);
        let a = sections.find(2, &["a"]).unwrap();
        assert_eq!(sections.direct_body(a), &["body a"]);
        assert_eq!(sections.nested_body(a), &["body a", "### A1", "nested"]);

        let b = sections.find(2, &["B"]).unwrap();
        assert_eq!(first_line(sections.direct_body(b)), Some("body b"));
    }

    #[test]
    fn test_clean_heading() {
        assert_eq!(clean_heading("**Speaker Notes (Italian)**:"), "Speaker Notes (Italian)");
        assert_eq!(clean_heading("Article Date"), "Article Date");
    }

    #[test]
    fn test_closing_hashes_are_dropped() {
        let sections = Sections::split("## Article Url ##\nhttps://example.com\n");
        assert!(sections.headings()[0].is_named("article url"));
    }

    #[test]
    fn test_trailing_hash_in_text_is_kept() {
        let sections = Sections::split("# Support for C#
## F# ##
### Notes #
");
        let texts: Vec<&str> = sections.headings().iter().map(|h| h.text.as_str()).collect();
        assert_eq!(texts, vec!["Support for C#", "F#", "Notes"]);
    }
}
