//! Core domain types, article markdown parsing, and deck assembly
//! for changelog slide decks.

pub mod config;
pub mod deck;
pub mod discovery;
pub mod error;
pub mod inline;
pub mod notes;
pub mod output;
pub mod pandoc;
pub mod parser;
mod sections;
pub mod serialize;
pub mod types;

pub use config::{output_file_name, FormatLimits, LimitPolicy, NotesLanguages, OutputFormat, RenderConfig};
pub use deck::{Deck, DeckBuilder, Paragraph, ParagraphStyle, Slide, SlideKind};
pub use discovery::{discover_articles, parse_files, Batch};
pub use error::{ConfigError, Error, ParseError, RenderError, Result};
pub use inline::{RunStyle, TextRun};
pub use notes::{NotesField, NotesScanner};
pub use output::write_output;
pub use pandoc::{PandocFormatter, PandocTarget};
pub use parser::{ArticleParser, ParseWarning, ParsedArticle};
pub use types::{ArticleRecord, LabeledText, LanguageNotes, NotesBlock, SpeakerNotes};
