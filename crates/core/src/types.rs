//! Domain types for parsed changelog articles.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One parsed article document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// Text of the level-1 heading.
    pub title: String,

    /// Publication date, used for filtering and ordering.
    pub date: NaiveDate,

    /// Absolute link to the published article. Never dereferenced.
    pub url: String,

    /// Absolute image link, or empty when the article has none.
    pub image_url: String,

    /// Content bullets in source order.
    pub content_bullets: Vec<LabeledText>,

    /// Speaker notes keyed by language, in source order.
    pub speaker_notes: SpeakerNotes,
}

impl ArticleRecord {
    /// Create a record with only the required fields set.
    pub fn new(title: impl Into<String>, date: NaiveDate, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            date,
            url: url.into(),
            image_url: String::new(),
            content_bullets: Vec::new(),
            speaker_notes: SpeakerNotes::default(),
        }
    }
}

/// A `**Label**: text` pair. The label is empty for unlabeled lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledText {
    pub label: String,
    pub text: String,
}

impl LabeledText {
    /// Create a labeled entry.
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }

    /// Create an entry without a label.
    pub fn unlabeled(text: impl Into<String>) -> Self {
        Self::new(String::new(), text)
    }

    /// Whether a label is present.
    pub fn has_label(&self) -> bool {
        !self.label.is_empty()
    }
}

/// The five-part speaker-note structure for one language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotesBlock {
    pub opening: String,
    pub main_points: Vec<String>,
    pub focal_points: Vec<LabeledText>,
    pub implications: String,
    pub conclusion: String,
}

impl NotesBlock {
    /// True when no field carries any text.
    pub fn is_empty(&self) -> bool {
        self.opening.is_empty()
            && self.main_points.is_empty()
            && self.focal_points.is_empty()
            && self.implications.is_empty()
            && self.conclusion.is_empty()
    }
}

/// Notes for a single language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageNotes {
    /// Short language code (`it`, `en`), or the literal heading label for
    /// languages without a known code.
    pub code: String,

    /// Human-readable language name as shown in note headers.
    pub label: String,

    pub notes: NotesBlock,
}

/// Speaker notes of an article, one block per language.
///
/// Backed by a vector so the order of the source subsections is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeakerNotes(Vec<LanguageNotes>);

impl SpeakerNotes {
    /// Create an empty set of notes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert notes for a language, replacing an existing block with the same code.
    pub fn insert(&mut self, code: impl Into<String>, label: impl Into<String>, notes: NotesBlock) {
        let code = code.into();
        let label = label.into();
        match self.0.iter_mut().find(|l| l.code == code) {
            Some(existing) => {
                existing.label = label;
                existing.notes = notes;
            }
            None => self.0.push(LanguageNotes { code, label, notes }),
        }
    }

    /// Look up the notes for a language code (case-insensitive).
    pub fn get(&self, code: &str) -> Option<&LanguageNotes> {
        self.0.iter().find(|l| l.code.eq_ignore_ascii_case(code))
    }

    /// Iterate languages in source order.
    pub fn iter(&self) -> impl Iterator<Item = &LanguageNotes> {
        self.0.iter()
    }

    /// Language codes in source order.
    pub fn codes(&self) -> Vec<&str> {
        self.0.iter().map(|l| l.code.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when there are no languages, or every block is empty.
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|l| l.notes.is_empty())
    }
}

/// Known language names, matched case-insensitively against note headings.
const KNOWN_LANGUAGES: &[(&str, &str, &[&str])] = &[
    ("it", "Italian", &["italian", "italiano"]),
    ("en", "English", &["english", "inglese"]),
    ("es", "Spanish", &["spanish", "español", "espanol", "spagnolo"]),
    ("fr", "French", &["french", "français", "francais", "francese"]),
    ("de", "German", &["german", "deutsch", "tedesco"]),
    ("pt", "Portuguese", &["portuguese", "português", "portugues", "portoghese"]),
];

/// Resolve a language name into `(code, display label)`.
///
/// Unknown names are kept verbatim as both code and label.
pub fn resolve_language(name: &str) -> (String, String) {
    let lowered = name.trim().to_lowercase();
    for (code, label, aliases) in KNOWN_LANGUAGES {
        if aliases.iter().any(|alias| lowered.contains(alias)) || lowered == *code {
            return (code.to_string(), label.to_string());
        }
    }
    let literal = name.trim().to_string();
    (literal.clone(), literal)
}

/// Display label for a language code, falling back to the code itself.
pub fn language_label(code: &str) -> String {
    KNOWN_LANGUAGES
        .iter()
        .find(|(c, _, _)| c.eq_ignore_ascii_case(code))
        .map(|(_, label, _)| label.to_string())
        .unwrap_or_else(|| code.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_languages() {
        assert_eq!(resolve_language("Italian"), ("it".into(), "Italian".into()));
        assert_eq!(resolve_language("ENGLISH"), ("en".into(), "English".into()));
        assert_eq!(resolve_language("Italiano"), ("it".into(), "Italian".into()));
        assert_eq!(resolve_language("en"), ("en".into(), "English".into()));
    }

    #[test]
    fn test_resolve_unknown_language_is_literal() {
        assert_eq!(resolve_language(" Klingon "), ("Klingon".into(), "Klingon".into()));
    }

    #[test]
    fn test_speaker_notes_preserve_order_and_replace() {
        let mut notes = SpeakerNotes::new();
        notes.insert("it", "Italian", NotesBlock::default());
        notes.insert("en", "English", NotesBlock::default());
        notes.insert(
            "it",
            "Italian",
            NotesBlock {
                opening: "Ciao".into(),
                ..Default::default()
            },
        );

        assert_eq!(notes.codes(), vec!["it", "en"]);
        assert_eq!(notes.get("IT").unwrap().notes.opening, "Ciao");
        assert!(!notes.is_empty());
    }

    #[test]
    fn test_empty_notes() {
        let mut notes = SpeakerNotes::new();
        assert!(notes.is_empty());
        notes.insert("en", "English", NotesBlock::default());
        assert!(notes.is_empty());
        assert_eq!(notes.len(), 1);
    }
}
