//! Format-independent deck model and the builder that fills it from records.
//!
//! The builder filters records by date range, orders them, and lays out a
//! title slide plus one content slide per article (optionally preceded by a
//! cover slide). Backends such as the PPTX writer and the Pandoc formatter
//! only have to serialize the resulting [`Deck`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::{NotesLanguages, RenderConfig, DATE_FORMAT};
use crate::error::RenderError;
use crate::inline::{parse_inline, plain_text, TextRun};
use crate::notes::NotesField;
use crate::types::{ArticleRecord, LabeledText, LanguageNotes, NotesBlock};

/// A complete presentation, ready to be serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deck {
    pub title: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
    /// Number of articles in the deck.
    pub article_count: usize,
    pub slides: Vec<Slide>,
}

impl Deck {
    /// Slides that carry article content.
    pub fn content_slides(&self) -> impl Iterator<Item = &Slide> {
        self.slides.iter().filter(|s| s.kind == SlideKind::Content)
    }
}

/// Role of a slide within the deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlideKind {
    /// Opening slide summarizing the range.
    Title,
    /// Full-bleed article title over its image.
    Cover,
    /// Article title, bullets and date footer.
    Content,
}

/// One slide of the deck.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slide {
    pub kind: SlideKind,
    pub title: String,
    pub subtitle: Option<String>,
    pub body: Vec<Paragraph>,
    /// Small text in the bottom-right corner.
    pub footer: Option<String>,
    /// External image shown on cover slides.
    pub image_url: Option<String>,
    pub notes: Vec<Paragraph>,
}

impl Slide {
    fn new(kind: SlideKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            subtitle: None,
            body: Vec::new(),
            footer: None,
            image_url: None,
            notes: Vec::new(),
        }
    }

    /// Plain text of the speaker notes, one paragraph per line.
    pub fn notes_text(&self) -> String {
        paragraphs_text(&self.notes)
    }

    /// Plain text of the body, one paragraph per line.
    pub fn body_text(&self) -> String {
        paragraphs_text(&self.body)
    }
}

/// How a paragraph is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParagraphStyle {
    Normal,
    Bullet,
    /// A language or section header inside notes.
    Heading,
}

/// A paragraph made of styled runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    pub style: ParagraphStyle,
    pub runs: Vec<TextRun>,
}

impl Paragraph {
    pub fn new(style: ParagraphStyle, runs: Vec<TextRun>) -> Self {
        Self { style, runs }
    }

    /// A normal paragraph from inline markdown.
    pub fn text(markdown: &str) -> Self {
        Self::new(ParagraphStyle::Normal, parse_inline(markdown))
    }

    /// A bullet from inline markdown.
    pub fn bullet(markdown: &str) -> Self {
        Self::new(ParagraphStyle::Bullet, parse_inline(markdown))
    }

    /// A bullet with an emphasized label: `**label**: text`.
    pub fn labeled_bullet(item: &LabeledText) -> Self {
        if !item.has_label() {
            return Self::bullet(&item.text);
        }
        let mut runs = vec![TextRun::bold(&item.label)];
        if !item.text.is_empty() {
            runs.push(TextRun::plain(": "));
            runs.extend(parse_inline(&item.text));
        }
        Self::new(ParagraphStyle::Bullet, runs)
    }

    pub fn heading(text: impl Into<String>) -> Self {
        Self::new(ParagraphStyle::Heading, vec![TextRun::bold(text)])
    }

    /// An empty spacer paragraph.
    pub fn blank() -> Self {
        Self::new(ParagraphStyle::Normal, Vec::new())
    }

    /// Prefix the paragraph with a bold tag such as `[IT] `.
    fn tagged(mut self, tag: &str) -> Self {
        self.runs.insert(0, TextRun::bold(format!("[{}] ", tag.to_uppercase())));
        self
    }

    pub fn plain_text(&self) -> String {
        plain_text(&self.runs)
    }

    pub fn is_blank(&self) -> bool {
        self.runs.iter().all(|r| r.text.is_empty())
    }
}

fn paragraphs_text(paragraphs: &[Paragraph]) -> String {
    paragraphs
        .iter()
        .map(|p| match p.style {
            ParagraphStyle::Bullet => format!("• {}", p.plain_text()),
            _ => p.plain_text(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Lays out records into a [`Deck`] according to a [`RenderConfig`].
#[derive(Debug, Clone)]
pub struct DeckBuilder {
    config: RenderConfig,
}

impl DeckBuilder {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Records inside the inclusive range, sorted by date.
    ///
    /// The sort is stable, so articles sharing a date keep their input order.
    pub fn select<'a>(&self, records: &'a [ArticleRecord]) -> Result<Vec<&'a ArticleRecord>, RenderError> {
        let from = self.config.from;
        let to = self.config.upper_bound();

        let mut selected: Vec<&ArticleRecord> = records
            .iter()
            .filter(|r| from <= r.date && r.date <= to)
            .collect();

        if selected.is_empty() {
            return Err(RenderError::EmptySelection { from, to });
        }

        selected.sort_by_key(|r| r.date);
        log::debug!("Selected {} of {} articles", selected.len(), records.len());
        Ok(selected)
    }

    /// Build the deck for all records in range.
    pub fn build(&self, records: &[ArticleRecord]) -> Result<Deck, RenderError> {
        let selected = self.select(records)?;
        let from = self.config.from;
        let to = self.config.upper_bound();

        let mut slides = Vec::with_capacity(selected.len() * 2 + 1);
        slides.push(self.title_slide(selected.len(), from, to));

        for record in &selected {
            let notes = self.render_notes(record);
            if self.config.cover_slides {
                let mut cover = Slide::new(SlideKind::Cover, &record.title);
                if !record.image_url.is_empty() {
                    cover.image_url = Some(record.image_url.clone());
                }
                cover.notes = notes.clone();
                slides.push(cover);
            }
            slides.push(self.content_slide(record, notes));
        }

        Ok(Deck {
            title: self.config.deck_title.clone(),
            from,
            to,
            article_count: selected.len(),
            slides,
        })
    }

    fn title_slide(&self, count: usize, from: NaiveDate, to: NaiveDate) -> Slide {
        let mut slide = Slide::new(SlideKind::Title, &self.config.deck_title);
        let noun = if count == 1 { "update" } else { "updates" };
        slide.subtitle = Some(format!(
            "{} {} from {} to {}",
            count,
            noun,
            from.format(DATE_FORMAT),
            to.format(DATE_FORMAT)
        ));
        slide
    }

    fn content_slide(&self, record: &ArticleRecord, notes: Vec<Paragraph>) -> Slide {
        let limits = &self.config.limits;
        let bullets = limits.apply(
            &record.content_bullets,
            limits.content_bullets,
            "content bullets",
            &record.title,
        );

        let mut slide = Slide::new(SlideKind::Content, &record.title);
        slide.body = bullets.iter().map(Paragraph::labeled_bullet).collect();
        slide.footer = Some(record.date.format(DATE_FORMAT).to_string());
        slide.notes = notes;
        slide
    }

    /// Speaker notes: a date/link header followed by the selected languages.
    fn render_notes(&self, record: &ArticleRecord) -> Vec<Paragraph> {
        let mut paragraphs = vec![Paragraph::new(
            ParagraphStyle::Normal,
            vec![TextRun::plain(format!(
                "Date: {} - Link: {}",
                record.date.format(DATE_FORMAT),
                record.url
            ))],
        )];

        let languages: Vec<&LanguageNotes> = match &self.config.languages {
            NotesLanguages::Single(code) => match record.speaker_notes.get(code) {
                Some(notes) => vec![notes],
                None => {
                    log::debug!("{:?} has no {} speaker notes", record.title, code);
                    Vec::new()
                }
            },
            NotesLanguages::SideBySide | NotesLanguages::Merged => {
                record.speaker_notes.iter().filter(|l| !l.notes.is_empty()).collect()
            }
        };

        if languages.is_empty() {
            return paragraphs;
        }

        match self.config.languages {
            NotesLanguages::Merged if languages.len() > 1 => {
                paragraphs.push(Paragraph::blank());
                for field in NotesField::ALL {
                    for language in &languages {
                        let tag = &language.code;
                        paragraphs.extend(
                            self.render_field(field, &language.notes, &record.title)
                                .into_iter()
                                .map(|p| p.tagged(tag)),
                        );
                    }
                }
            }
            _ => {
                let with_headers = languages.len() > 1;
                for language in &languages {
                    paragraphs.push(Paragraph::blank());
                    if with_headers {
                        paragraphs.push(Paragraph::heading(format!("{} Notes:", language.label)));
                    }
                    paragraphs.extend(self.render_block(&language.notes, &record.title));
                }
            }
        }

        paragraphs
    }

    /// A whole notes block in fixed field order.
    fn render_block(&self, block: &NotesBlock, title: &str) -> Vec<Paragraph> {
        NotesField::ALL
            .iter()
            .flat_map(|field| self.render_field(*field, block, title))
            .collect()
    }

    fn render_field(&self, field: NotesField, block: &NotesBlock, title: &str) -> Vec<Paragraph> {
        let limits = &self.config.limits;
        match field {
            NotesField::Opening => text_paragraphs(&block.opening),
            NotesField::MainPoints => limits
                .apply(&block.main_points, limits.main_points, "main points", title)
                .iter()
                .map(|p| Paragraph::bullet(p))
                .collect(),
            NotesField::FocalPoints => limits
                .apply(&block.focal_points, limits.focal_points, "focal points", title)
                .iter()
                .map(Paragraph::labeled_bullet)
                .collect(),
            NotesField::Implications => text_paragraphs(&block.implications),
            NotesField::Conclusion => text_paragraphs(&block.conclusion),
        }
    }
}

/// One paragraph per line of a text field.
fn text_paragraphs(text: &str) -> Vec<Paragraph> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(Paragraph::text)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FormatLimits, LimitPolicy};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(title: &str, day: u32) -> ArticleRecord {
        let mut record = ArticleRecord::new(title, date(2026, 1, day), format!("https://example.com/{}", day));
        record.content_bullets = vec![
            LabeledText::new("What", "a new **feature**"),
            LabeledText::unlabeled("Plain bullet"),
        ];
        record.speaker_notes.insert(
            "it",
            "Italian",
            NotesBlock {
                opening: "Apertura".into(),
                main_points: vec!["Punto".into()],
                focal_points: vec![LabeledText::new("Focus", "dettaglio")],
                implications: "Implicazioni".into(),
                conclusion: "Fine".into(),
            },
        );
        record.speaker_notes.insert(
            "en",
            "English",
            NotesBlock {
                opening: "Opening".into(),
                conclusion: "End".into(),
                ..Default::default()
            },
        );
        record
    }

    fn january() -> RenderConfig {
        RenderConfig::new(date(2026, 1, 1)).with_to(Some(date(2026, 1, 31)))
    }

    #[test]
    fn test_two_articles_in_january() {
        let records = vec![record("Later", 20), record("Earlier", 5)];
        let deck = DeckBuilder::new(january()).build(&records).unwrap();

        assert_eq!(deck.slides.len(), 3);
        assert_eq!(deck.slides[0].kind, SlideKind::Title);
        assert_eq!(
            deck.slides[0].subtitle.as_deref(),
            Some("2 updates from 2026-01-01 to 2026-01-31")
        );
        let titles: Vec<&str> = deck.content_slides().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Earlier", "Later"]);
        assert_eq!(deck.slides[1].footer.as_deref(), Some("2026-01-05"));
    }

    #[test]
    fn test_empty_selection() {
        let records = vec![record("A", 5), record("B", 20)];
        let config = RenderConfig::new(date(2026, 1, 10)).with_to(Some(date(2026, 1, 15)));
        let err = DeckBuilder::new(config).build(&records).unwrap_err();
        assert!(matches!(err, RenderError::EmptySelection { .. }));
    }

    #[test]
    fn test_filter_is_exact_and_inclusive() {
        let records: Vec<ArticleRecord> = (1..=31).map(|d| record(&format!("Day {}", d), d)).collect();
        let config = RenderConfig::new(date(2026, 1, 10)).with_to(Some(date(2026, 1, 15)));
        let selected = DeckBuilder::new(config).select(&records).unwrap();
        let days: Vec<u32> = selected.iter().map(|r| chrono::Datelike::day(&r.date)).collect();
        assert_eq!(days, vec![10, 11, 12, 13, 14, 15]);
    }

    #[test]
    fn test_order_is_independent_of_input_permutation() {
        let a = record("A", 3);
        let b = record("B", 9);
        let c = record("C", 27);
        let builder = DeckBuilder::new(january());

        let forward = builder.build(&[a.clone(), b.clone(), c.clone()]).unwrap();
        let backward = builder.build(&[c, a, b]).unwrap();
        let titles = |d: &Deck| d.slides.iter().map(|s| s.title.clone()).collect::<Vec<_>>();
        assert_eq!(titles(&forward), titles(&backward));
    }

    #[test]
    fn test_ties_keep_input_order() {
        let records = vec![record("First", 7), record("Second", 7)];
        let deck = DeckBuilder::new(january()).build(&records).unwrap();
        let titles: Vec<&str> = deck.content_slides().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Second"]);
    }

    #[test]
    fn test_body_bullets_emphasize_label() {
        let deck = DeckBuilder::new(january()).build(&[record("A", 5)]).unwrap();
        let slide = &deck.slides[1];
        assert_eq!(slide.body.len(), 2);
        assert!(slide.body[0].runs[0].style.bold);
        assert_eq!(slide.body[0].plain_text(), "What: a new feature");
        assert_eq!(slide.body[1].plain_text(), "Plain bullet");
        assert_eq!(slide.body[1].style, ParagraphStyle::Bullet);
    }

    #[test]
    fn test_side_by_side_notes_have_language_headers() {
        let deck = DeckBuilder::new(january()).build(&[record("A", 5)]).unwrap();
        let notes = deck.slides[1].notes_text();
        let expected = "\
Date: 2026-01-05 - Link: https://example.com/5

Italian Notes:
Apertura
• Punto
• Focus: dettaglio
Implicazioni
Fine

English Notes:
Opening
End";
        assert_eq!(notes, expected);
    }

    #[test]
    fn test_single_language_has_no_header() {
        let config = january().with_languages(NotesLanguages::Single("en".into()));
        let deck = DeckBuilder::new(config).build(&[record("A", 5)]).unwrap();
        assert_eq!(
            deck.slides[1].notes_text(),
            "Date: 2026-01-05 - Link: https://example.com/5\n\nOpening\nEnd"
        );
    }

    #[test]
    fn test_single_language_missing() {
        let config = january().with_languages(NotesLanguages::Single("fr".into()));
        let deck = DeckBuilder::new(config).build(&[record("A", 5)]).unwrap();
        assert_eq!(deck.slides[1].notes.len(), 1);
    }

    #[test]
    fn test_merged_notes_interleave_fields() {
        let config = january().with_languages(NotesLanguages::Merged);
        let deck = DeckBuilder::new(config).build(&[record("A", 5)]).unwrap();
        let notes = deck.slides[1].notes_text();
        let lines: Vec<&str> = notes.lines().collect();
        assert_eq!(lines[2], "[IT] Apertura");
        assert_eq!(lines[3], "[EN] Opening");
        assert_eq!(lines.last(), Some(&"[EN] End"));
    }

    #[test]
    fn test_cover_slides() {
        let mut with_image = record("A", 5);
        with_image.image_url = "https://example.com/a.png".into();
        let config = january().with_cover_slides(true);
        let deck = DeckBuilder::new(config).build(&[with_image, record("B", 6)]).unwrap();

        let kinds: Vec<SlideKind> = deck.slides.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SlideKind::Title,
                SlideKind::Cover,
                SlideKind::Content,
                SlideKind::Cover,
                SlideKind::Content
            ]
        );
        assert_eq!(deck.slides[1].image_url.as_deref(), Some("https://example.com/a.png"));
        assert_eq!(deck.slides[3].image_url, None);
        assert_eq!(deck.slides[1].notes, deck.slides[2].notes);
    }

    #[test]
    fn test_truncate_policy() {
        let mut many = record("Many", 5);
        many.content_bullets = (0..9).map(|i| LabeledText::unlabeled(format!("b{}", i))).collect();
        let limits = FormatLimits {
            policy: LimitPolicy::Truncate,
            ..Default::default()
        };

        let deck = DeckBuilder::new(january().with_limits(limits)).build(&[many.clone()]).unwrap();
        assert_eq!(deck.slides[1].body.len(), 6);

        let deck = DeckBuilder::new(january()).build(&[many]).unwrap();
        assert_eq!(deck.slides[1].body.len(), 9);
    }

    #[test]
    fn test_minimal_record_renders() {
        let sparse = ArticleRecord::new("Sparse", date(2026, 1, 5), "https://example.com");
        let deck = DeckBuilder::new(january()).build(&[sparse]).unwrap();
        let slide = &deck.slides[1];
        assert!(slide.body.is_empty());
        assert_eq!(slide.notes.len(), 1);
    }
}
