//! Visual style of generated decks.
//!
//! Geometry is in EMU (914400 per inch), font sizes in points.

/// EMU per inch.
pub const EMU_PER_INCH: i64 = 914_400;

/// Convert inches to EMU.
pub const fn inches(value: f64) -> i64 {
    (value * EMU_PER_INCH as f64) as i64
}

/// An sRGB color as six hex digits, e.g. `24292E`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rgb(pub String);

impl Rgb {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self(format!("{:02X}{:02X}{:02X}", r, g, b))
    }

    pub fn hex(&self) -> &str {
        &self.0
    }
}

/// Fonts, colors, sizes and slide dimensions used by the writer.
#[derive(Debug, Clone)]
pub struct DeckStyle {
    pub font: String,
    pub code_font: String,
    pub bullet_font: String,

    pub text_color: Rgb,
    pub muted_color: Rgb,
    pub link_color: Rgb,
    pub cover_text_color: Rgb,
    pub cover_background: Rgb,

    pub title_size: u32,
    pub deck_title_size: u32,
    pub subtitle_size: u32,
    pub body_size: u32,
    pub footer_size: u32,
    pub notes_size: u32,

    pub slide_width: i64,
    pub slide_height: i64,
}

impl Default for DeckStyle {
    /// Widescreen 16:9, Segoe UI, GitHub-like dark text.
    fn default() -> Self {
        Self {
            font: "Segoe UI".to_string(),
            code_font: "Courier New".to_string(),
            bullet_font: "Arial".to_string(),

            text_color: Rgb::new(36, 41, 46),
            muted_color: Rgb::new(128, 128, 128),
            link_color: Rgb::new(0, 0, 255),
            cover_text_color: Rgb::new(255, 255, 255),
            cover_background: Rgb::new(0, 0, 0),

            title_size: 32,
            deck_title_size: 40,
            subtitle_size: 24,
            body_size: 18,
            footer_size: 18,
            notes_size: 12,

            slide_width: 12_192_000,
            slide_height: 6_858_000,
        }
    }
}

impl DeckStyle {
    /// Create the default style.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different text font everywhere except code runs.
    pub fn with_font(mut self, font: impl Into<String>) -> Self {
        self.font = font.into();
        self
    }
}
