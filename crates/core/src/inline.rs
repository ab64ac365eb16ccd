//! Inline markdown tokenizing into styled text runs.
//!
//! Supports `**bold**`, `*italic*`/`_italic_`, `` `code` ``, `~~strike~~`
//! and `[text](url)` links. Nesting is not supported; unmatched markers are
//! kept as literal text.

use serde::{Deserialize, Serialize};

/// Character-level formatting of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStyle {
    pub bold: bool,
    pub italic: bool,
    pub code: bool,
    pub strike: bool,
}

/// A span of text with uniform formatting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    pub style: RunStyle,
    /// Hyperlink target, if the run is a link.
    pub link: Option<String>,
}

impl TextRun {
    /// Unformatted text.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: RunStyle::default(),
            link: None,
        }
    }

    /// Bold text.
    pub fn bold(text: impl Into<String>) -> Self {
        Self::styled(
            text,
            RunStyle {
                bold: true,
                ..Default::default()
            },
        )
    }

    pub fn styled(text: impl Into<String>, style: RunStyle) -> Self {
        Self {
            text: text.into(),
            style,
            link: None,
        }
    }

    /// Hyperlinked text.
    pub fn link(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: RunStyle::default(),
            link: Some(url.into()),
        }
    }

    fn is_plain(&self) -> bool {
        self.style == RunStyle::default() && self.link.is_none()
    }
}

/// Tokenize a line of inline markdown into runs.
pub fn parse_inline(text: &str) -> Vec<TextRun> {
    let mut runs: Vec<TextRun> = Vec::new();
    let mut plain = String::new();
    let mut rest = text;
    let mut prev: Option<char> = None;

    while let Some(c) = rest.chars().next() {
        if let Some((run, consumed)) = match_token(rest, prev) {
            if !plain.is_empty() {
                runs.push(TextRun::plain(std::mem::take(&mut plain)));
            }
            runs.push(run);
            prev = rest[..consumed].chars().last();
            rest = &rest[consumed..];
            continue;
        }
        plain.push(c);
        prev = Some(c);
        rest = &rest[c.len_utf8()..];
    }

    if !plain.is_empty() {
        runs.push(TextRun::plain(plain));
    }
    merge_plain(runs)
}

/// Try to match a formatting token at the start of `s`.
///
/// Returns the run and the number of bytes consumed.
fn match_token(s: &str, prev: Option<char>) -> Option<(TextRun, usize)> {
    if let Some(inner) = s.strip_prefix("**") {
        let end = inner.find("**")?;
        if end == 0 {
            return None;
        }
        return Some((TextRun::bold(&inner[..end]), end + 4));
    }

    if let Some(inner) = s.strip_prefix("~~") {
        let end = inner.find("~~")?;
        if end == 0 {
            return None;
        }
        let style = RunStyle {
            strike: true,
            ..Default::default()
        };
        return Some((TextRun::styled(&inner[..end], style), end + 4));
    }

    if let Some(inner) = s.strip_prefix('`') {
        let end = inner.find('`')?;
        if end == 0 {
            return None;
        }
        let style = RunStyle {
            code: true,
            ..Default::default()
        };
        return Some((TextRun::styled(&inner[..end], style), end + 2));
    }

    if let Some(inner) = s.strip_prefix('[') {
        let label_end = inner.find("](")?;
        let after = &inner[label_end + 2..];
        let url_end = after.find(')')?;
        let label = &inner[..label_end];
        let url = &after[..url_end];
        if label.is_empty() || url.is_empty() || label.contains('[') {
            return None;
        }
        return Some((TextRun::link(label, url), 1 + label_end + 2 + url_end + 1));
    }

    let marker = s.chars().next()?;
    if marker == '*' || marker == '_' {
        // Intra-word markers (snake_case, 2*3*4) stay literal.
        if prev.is_some_and(|p| p.is_alphanumeric()) {
            return None;
        }
        let inner = &s[1..];
        if inner.starts_with(char::is_whitespace) || inner.starts_with(marker) {
            return None;
        }
        let end = find_closing(inner, marker)?;
        let style = RunStyle {
            italic: true,
            ..Default::default()
        };
        return Some((TextRun::styled(&inner[..end], style), end + 2));
    }

    None
}

/// Find a closing single-character marker not followed by a word character.
fn find_closing(inner: &str, marker: char) -> Option<usize> {
    let mut search_from = 0;
    while let Some(offset) = inner[search_from..].find(marker) {
        let pos = search_from + offset;
        let before = inner[..pos].chars().last();
        let after = inner[pos + 1..].chars().next();
        let closes = pos > 0
            && !before.is_some_and(char::is_whitespace)
            && !after.is_some_and(|a| a.is_alphanumeric() || a == marker);
        if closes {
            return Some(pos);
        }
        search_from = pos + 1;
    }
    None
}

fn merge_plain(runs: Vec<TextRun>) -> Vec<TextRun> {
    let mut merged: Vec<TextRun> = Vec::with_capacity(runs.len());
    for run in runs {
        match merged.last_mut() {
            Some(last) if last.is_plain() && run.is_plain() => last.text.push_str(&run.text),
            _ => merged.push(run),
        }
    }
    merged
}

/// Visible text of a sequence of runs.
pub fn plain_text(runs: &[TextRun]) -> String {
    runs.iter().map(|r| r.text.as_str()).collect()
}

/// Render runs back into inline markdown.
pub fn to_markdown(runs: &[TextRun]) -> String {
    let mut out = String::new();
    for run in runs {
        if let Some(url) = &run.link {
            out.push_str(&format!("[{}]({})", run.text, url));
            continue;
        }
        let s = &run.style;
        let text = if s.code {
            format!("`{}`", run.text)
        } else {
            run.text.clone()
        };
        let text = if s.bold { format!("**{}**", text) } else { text };
        let text = if s.italic { format!("*{}*", text) } else { text };
        let text = if s.strike { format!("~~{}~~", text) } else { text };
        out.push_str(&text);
    }
    out
}
