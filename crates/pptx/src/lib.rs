//! PPTX (Office Open XML) backend for changelog slide decks.
//!
//! Writes a [`Deck`](updeck_core::Deck) as a .pptx package (a ZIP archive of
//! XML parts) and reads packages back for inspection.

pub mod error;
mod package;
pub mod reader;
pub mod style;
mod templates;
pub mod writer;

pub use error::{PptxError, Result};
pub use reader::{DeckReader, ExtractedSlide, InspectedDeck, SlideText};
pub use style::{DeckStyle, Rgb};
pub use writer::PptxWriter;
