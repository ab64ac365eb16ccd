//! Errors raised while writing or reading PPTX packages.

use thiserror::Error;
use updeck_core::RenderError;

pub type Result<T> = std::result::Result<T, PptxError>;

#[derive(Error, Debug)]
pub enum PptxError {
    /// Zip container failure.
    #[error("ZIP error: {0}")]
    Zip(String),

    /// Malformed or unwritable XML part.
    #[error("XML error: {0}")]
    Xml(String),

    /// A part referenced by a relationship is absent.
    #[error("missing package part: {0}")]
    MissingPart(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<PptxError> for RenderError {
    fn from(err: PptxError) -> Self {
        RenderError::Package(err.to_string())
    }
}
