//! Error types for article parsing and deck rendering.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// A required part of an article document was absent or malformed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// No level-1 heading was found.
    #[error("missing title (no `# ` heading)")]
    MissingTitle,

    /// No `## Article Date` section was found.
    #[error("missing `## Article Date` section")]
    MissingDateSection,

    /// The `## Article Date` section body is not a `YYYY-MM-DD` date.
    #[error("invalid article date: {0:?}")]
    InvalidDate(String),

    /// No `## Article Url` section was found.
    #[error("missing `## Article Url` section")]
    MissingUrlSection,
}

/// Failures while turning records into an output deck.
#[derive(Error, Debug)]
pub enum RenderError {
    /// No records fall inside the requested date range.
    #[error("no articles dated between {from} and {to}")]
    EmptySelection { from: NaiveDate, to: NaiveDate },

    /// The output file could not be created or written.
    #[error("failed to write {}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The deck could not be serialized into its package format.
    #[error("failed to serialize deck: {0}")]
    Package(String),
}

/// Malformed or missing command-line configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `--from` is required unless only inspecting a deck.
    #[error("missing required argument --from <YYYY-MM-DD>")]
    MissingFrom,

    /// A date flag did not parse as `YYYY-MM-DD`.
    #[error("invalid date for {flag}: {value:?} (expected YYYY-MM-DD)")]
    InvalidDate { flag: &'static str, value: String },

    /// The lower bound lies after the upper bound.
    #[error("--from {from} is after --to {to}")]
    InvertedRange { from: NaiveDate, to: NaiveDate },

    /// An enumerated flag received an unknown value.
    #[error("invalid value for {flag}: {value:?}")]
    InvalidValue { flag: &'static str, value: String },
}

/// Errors that can occur while compiling articles into a deck.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read an input file or directory.
    #[error("Failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input root does not exist, is not a directory, or cannot be listed.
    #[error("Input directory not found or unreadable: {}", .0.display())]
    InputDirectory(PathBuf),

    /// An article document failed to parse.
    #[error("{}: {kind}", file.display())]
    Parse { file: PathBuf, kind: ParseError },

    /// Rendering or writing the deck failed.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// Attach a file name to a parse failure.
    pub fn parse(file: impl Into<PathBuf>, kind: ParseError) -> Self {
        Self::Parse {
            file: file.into(),
            kind,
        }
    }

    /// Wrap an I/O failure on the given path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_names_file() {
        let err = Error::parse("updates/2026/01/2026-01-05-foo.md", ParseError::MissingDateSection);
        let msg = err.to_string();
        assert!(msg.contains("2026-01-05-foo.md"));
        assert!(msg.contains("Article Date"));
    }

    #[test]
    fn test_io_cause_is_chained_not_repeated() {
        let source = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = RenderError::WriteFailed {
            path: PathBuf::from("pptx/deck.pptx"),
            source,
        };
        assert_eq!(err.to_string(), "failed to write pptx/deck.pptx");
        let cause = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(cause.as_deref(), Some("access denied"));

        let err = Error::io("updates/2026/01/a.md", std::io::Error::other("boom"));
        assert!(!err.to_string().contains("boom"));
    }

    #[test]
    fn test_empty_selection_message() {
        let err = RenderError::EmptySelection {
            from: NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
            to: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
        };
        assert_eq!(err.to_string(), "no articles dated between 2026-01-10 and 2026-01-15");
    }
}
