//! Render configuration passed explicitly into the deck builder.

use std::fmt;
use std::str::FromStr;

use chrono::{Local, NaiveDate};

use crate::error::ConfigError;
use crate::types::resolve_language;

/// Date format used on the command line, in articles, and in file names.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Default title shown on the first slide.
pub const DEFAULT_DECK_TITLE: &str = "Changelog Updates";

/// Which speaker-note languages end up on each slide.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NotesLanguages {
    /// Only the given language code.
    Single(String),
    /// Every language, one full block after another, each under a header.
    #[default]
    SideBySide,
    /// Every language interleaved field by field in a single block.
    Merged,
}

impl FromStr for NotesLanguages {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" => Err(ConfigError::InvalidValue {
                flag: "--notes",
                value: s.to_string(),
            }),
            "all" | "both" | "side-by-side" => Ok(Self::SideBySide),
            "merged" => Ok(Self::Merged),
            _ => Ok(Self::Single(resolve_language(s).0)),
        }
    }
}

/// What to do when a record exceeds the advisory format caps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LimitPolicy {
    /// Keep everything silently.
    Ignore,
    /// Keep everything, but log a warning.
    #[default]
    Warn,
    /// Drop entries beyond the cap when building slides.
    Truncate,
}

impl FromStr for LimitPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ignore" => Ok(Self::Ignore),
            "warn" => Ok(Self::Warn),
            "truncate" => Ok(Self::Truncate),
            _ => Err(ConfigError::InvalidValue {
                flag: "--limits",
                value: s.to_string(),
            }),
        }
    }
}

/// Advisory caps from the article format guidelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatLimits {
    pub content_bullets: usize,
    pub main_points: usize,
    pub focal_points: usize,
    pub policy: LimitPolicy,
}

impl Default for FormatLimits {
    fn default() -> Self {
        Self {
            content_bullets: 6,
            main_points: 6,
            focal_points: 4,
            policy: LimitPolicy::default(),
        }
    }
}

impl FormatLimits {
    /// Apply the policy to a sequence, returning the slice to render.
    ///
    /// `what` and `title` only feed the warning message.
    pub fn apply<'a, T>(&self, items: &'a [T], cap: usize, what: &str, title: &str) -> &'a [T] {
        if items.len() <= cap {
            return items;
        }
        match self.policy {
            LimitPolicy::Ignore => items,
            LimitPolicy::Warn => {
                log::warn!("{:?}: {} {} (guideline is at most {})", title, items.len(), what, cap);
                items
            }
            LimitPolicy::Truncate => {
                log::info!("{:?}: truncating {} {} to {}", title, items.len(), what, cap);
                &items[..cap]
            }
        }
    }
}

/// Everything the deck builder needs besides the records.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Inclusive lower date bound.
    pub from: NaiveDate,
    /// Inclusive upper date bound; today when unset.
    pub to: Option<NaiveDate>,
    pub languages: NotesLanguages,
    pub limits: FormatLimits,
    /// Emit a cover slide before each article's content slide.
    pub cover_slides: bool,
    pub deck_title: String,
}

impl RenderConfig {
    /// Create a configuration with defaults for everything but the lower bound.
    pub fn new(from: NaiveDate) -> Self {
        Self {
            from,
            to: None,
            languages: NotesLanguages::default(),
            limits: FormatLimits::default(),
            cover_slides: false,
            deck_title: DEFAULT_DECK_TITLE.to_string(),
        }
    }

    pub fn with_to(mut self, to: Option<NaiveDate>) -> Self {
        self.to = to;
        self
    }

    pub fn with_languages(mut self, languages: NotesLanguages) -> Self {
        self.languages = languages;
        self
    }

    pub fn with_limits(mut self, limits: FormatLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_cover_slides(mut self, cover_slides: bool) -> Self {
        self.cover_slides = cover_slides;
        self
    }

    pub fn with_deck_title(mut self, title: impl Into<String>) -> Self {
        self.deck_title = title.into();
        self
    }

    /// The effective upper bound: `to`, or the current local date.
    pub fn upper_bound(&self) -> NaiveDate {
        self.to.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Whether `date` lies inside the inclusive range.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.upper_bound()
    }
}

/// Parse a `YYYY-MM-DD` command-line date.
pub fn parse_date(flag: &'static str, value: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| ConfigError::InvalidDate {
        flag,
        value: value.to_string(),
    })
}

/// Output format of the generated deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Pptx,
    /// Pandoc slide markdown.
    Pandoc,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pptx => "pptx",
            Self::Pandoc => "md",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pptx" => Ok(Self::Pptx),
            "pandoc" | "md" | "markdown" => Ok(Self::Pandoc),
            _ => Err(ConfigError::InvalidValue {
                flag: "--format",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pptx => "pptx",
            Self::Pandoc => "pandoc",
        })
    }
}

/// Conventional output file name: `updates_from_{from}[_to_{to}].{ext}`.
///
/// The `_to_` suffix only appears when the upper bound was given explicitly.
pub fn output_file_name(from: NaiveDate, to: Option<NaiveDate>, format: OutputFormat) -> String {
    match to {
        Some(to) => format!(
            "updates_from_{}_to_{}.{}",
            from.format(DATE_FORMAT),
            to.format(DATE_FORMAT),
            format.extension()
        ),
        None => format!("updates_from_{}.{}", from.format(DATE_FORMAT), format.extension()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_notes_languages_from_str() {
        assert_eq!("all".parse::<NotesLanguages>().unwrap(), NotesLanguages::SideBySide);
        assert_eq!("Merged".parse::<NotesLanguages>().unwrap(), NotesLanguages::Merged);
        assert_eq!("it".parse::<NotesLanguages>().unwrap(), NotesLanguages::Single("it".into()));
        assert_eq!(
            "English".parse::<NotesLanguages>().unwrap(),
            NotesLanguages::Single("en".into())
        );
        assert!("  ".parse::<NotesLanguages>().is_err());
    }

    #[test]
    fn test_limit_policy_from_str() {
        assert_eq!("TRUNCATE".parse::<LimitPolicy>().unwrap(), LimitPolicy::Truncate);
        assert!("drop".parse::<LimitPolicy>().is_err());
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("PPTX".parse::<OutputFormat>().unwrap(), OutputFormat::Pptx);
        assert_eq!("pandoc".parse::<OutputFormat>().unwrap(), OutputFormat::Pandoc);
        assert!("pdf".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_limits_apply() {
        let items = [1, 2, 3, 4, 5];
        let warn = FormatLimits::default();
        assert_eq!(warn.apply(&items, 4, "focal points", "t").len(), 5);

        let truncate = FormatLimits {
            policy: LimitPolicy::Truncate,
            ..Default::default()
        };
        assert_eq!(truncate.apply(&items, 4, "focal points", "t"), &[1, 2, 3, 4]);
        assert_eq!(truncate.apply(&items, 6, "bullets", "t").len(), 5);
    }

    #[test]
    fn test_range_is_inclusive() {
        let config = RenderConfig::new(date(2026, 1, 1)).with_to(Some(date(2026, 1, 31)));
        assert!(config.contains(date(2026, 1, 1)));
        assert!(config.contains(date(2026, 1, 31)));
        assert!(!config.contains(date(2025, 12, 31)));
        assert!(!config.contains(date(2026, 2, 1)));
    }

    #[test]
    fn test_upper_bound_defaults_to_today() {
        let config = RenderConfig::new(date(2026, 1, 1));
        assert_eq!(config.upper_bound(), Local::now().date_naive());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("--from", "2026-01-05").unwrap(), date(2026, 1, 5));
        assert_eq!(
            parse_date("--to", "05/01/2026").unwrap_err(),
            ConfigError::InvalidDate {
                flag: "--to",
                value: "05/01/2026".into()
            }
        );
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(
            output_file_name(date(2026, 1, 1), None, OutputFormat::Pptx),
            "updates_from_2026-01-01.pptx"
        );
        assert_eq!(
            output_file_name(date(2026, 1, 1), Some(date(2026, 1, 31)), OutputFormat::Pandoc),
            "updates_from_2026-01-01_to_2026-01-31.md"
        );
    }
}
