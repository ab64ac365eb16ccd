//! Writing records back into the canonical article markdown skeleton.

use std::fmt::Write as FmtWrite;

use crate::config::DATE_FORMAT;
use crate::notes::NotesField;
use crate::types::{ArticleRecord, LabeledText, NotesBlock};

impl ArticleRecord {
    /// Serialize into the article format the parser reads.
    ///
    /// Empty optional fields are left out; parsing the output yields an
    /// equal record.
    pub fn to_markdown(&self) -> String {
        let mut out = String::with_capacity(1024);

        // Writing to a String cannot fail.
        let _ = writeln!(out, "# {}\n", self.title);
        let _ = writeln!(out, "## Article Date\n{}\n", self.date.format(DATE_FORMAT));
        let _ = writeln!(out, "## Article Url\n{}\n", self.url);
        let _ = writeln!(out, "## Article Image\n{}\n", self.image_url);

        out.push_str("## Article Content\n");
        for bullet in &self.content_bullets {
            let _ = writeln!(out, "- {}", labeled_line(bullet));
        }

        if self.speaker_notes.len() > 0 {
            out.push_str("\n## Speaker Notes\n");
            for language in self.speaker_notes.iter() {
                let _ = writeln!(out, "\n### {}", language.label);
                write_block(&mut out, &language.code, &language.notes);
            }
        }

        out
    }
}

fn write_block(out: &mut String, code: &str, block: &NotesBlock) {
    for field in NotesField::ALL {
        let lines: Vec<String> = match field {
            NotesField::Opening => text_lines(&block.opening),
            NotesField::MainPoints => block.main_points.iter().map(|p| format!("- {}", p)).collect(),
            NotesField::FocalPoints => block
                .focal_points
                .iter()
                .map(|f| format!("- {}", labeled_line(f)))
                .collect(),
            NotesField::Implications => text_lines(&block.implications),
            NotesField::Conclusion => text_lines(&block.conclusion),
        };
        if lines.is_empty() {
            continue;
        }
        let _ = writeln!(out, "\n**{}:**", field.marker(code));
        for line in lines {
            out.push_str(&line);
            out.push('\n');
        }
    }
}

fn labeled_line(item: &LabeledText) -> String {
    if item.has_label() {
        format!("**{}**: {}", item.label, item.text)
    } else {
        item.text.clone()
    }
}

fn text_lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::parser::ArticleParser;
    use crate::types::{ArticleRecord, LabeledText, NotesBlock};

    fn rich_record() -> ArticleRecord {
        let mut record = ArticleRecord::new(
            "Actions runners get more memory",
            NaiveDate::from_ymd_opt(2026, 1, 20).unwrap(),
            "https://github.blog/changelog/2026-01-20-runners",
        );
        record.image_url = "https://github.blog/images/runners.png".into();
        record.content_bullets = vec![
            LabeledText::new("Memory", "doubled for **all** Linux runners"),
            LabeledText::unlabeled("No configuration needed"),
        ];
        record.speaker_notes.insert(
            "it",
            "Italian",
            NotesBlock {
                opening: "Buone notizie.\nSeconda riga.".into(),
                main_points: vec!["Più memoria".into(), "Nessun costo".into()],
                focal_points: vec![LabeledText::new("Linux", "tutti i runner")],
                implications: "Build più veloci.".into(),
                conclusion: "Provate subito.".into(),
            },
        );
        record.speaker_notes.insert(
            "en",
            "English",
            NotesBlock {
                opening: "Good news.".into(),
                focal_points: vec![LabeledText::unlabeled("unlabeled focus")],
                ..Default::default()
            },
        );
        record
    }

    #[test]
    fn test_round_trip_rich_record() {
        let record = rich_record();
        let markdown = record.to_markdown();
        let parsed = ArticleParser::new().parse(&markdown).unwrap();
        assert!(parsed.warnings.is_empty(), "{:?}", parsed.warnings);
        assert_eq!(parsed.record, record);
    }

    #[test]
    fn test_round_trip_minimal_record() {
        let record = ArticleRecord::new(
            "Minimal",
            NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            "https://example.com",
        );
        let parsed = ArticleParser::new().parse(&record.to_markdown()).unwrap();
        assert_eq!(parsed.record, record);
    }

    #[test]
    fn test_round_trip_title_ending_in_hash() {
        let mut record = ArticleRecord::new(
            "Support for F#",
            NaiveDate::from_ymd_opt(2026, 2, 3).unwrap(),
            "https://example.com/fsharp",
        );
        record.content_bullets = vec![LabeledText::new("Languages", "C# and F#")];
        let parsed = ArticleParser::new().parse(&record.to_markdown()).unwrap();
        assert_eq!(parsed.record.title, "Support for F#");
        assert_eq!(parsed.record, record);
    }

    #[test]
    fn test_italian_markers_are_written_for_italian() {
        let markdown = rich_record().to_markdown();
        assert!(markdown.contains("**Apertura:**"));
        assert!(markdown.contains("**Opening:**"));
        assert!(markdown.contains("### Italian"));
    }
}
