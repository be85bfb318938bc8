//! Map styles: named colour sets for every layer plus the building palette.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

const BUNDLED_STYLES: &str = include_str!("../../styles.toml");

#[derive(Debug, Error)]
pub enum StyleError {
    #[error("failed to read styles file {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse styles: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid colour {0:?}, expected #rrggbb or #rrggbbaa")]
    InvalidColour(String),
    #[error("style {0:?} has an empty building palette")]
    EmptyPalette(String),
    #[error("style {0:?} is defined more than once")]
    DuplicateName(String),
    #[error("no styles defined")]
    NoStyles,
    #[error("unknown style {name:?}, available: {available}")]
    UnknownStyle { name: String, available: String },
}

/// 8-bit RGBA colour, written as `#rrggbb` or `#rrggbbaa`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Colour {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Colour {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Every colour channel divided by `amount`, alpha kept
    pub fn shade(self, amount: u8) -> Self {
        let amount = amount.max(1);
        Self {
            r: self.r / amount,
            g: self.g / amount,
            b: self.b / amount,
            a: self.a,
        }
    }
}

impl FromStr for Colour {
    type Err = StyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || StyleError::InvalidColour(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
            return Err(invalid());
        }

        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        let a = if hex.len() == 8 { channel(6)? } else { 255 };
        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
            a,
        })
    }
}

impl TryFrom<String> for Colour {
    type Error = StyleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02X}", self.a)?;
        }
        Ok(())
    }
}

/// One named map style. The older `*_color` key names are accepted too.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Style {
    pub name: String,
    #[serde(alias = "background_color")]
    pub background_colour: Colour,
    #[serde(alias = "text_color")]
    pub text_colour: Colour,
    #[serde(alias = "roads_color")]
    pub street_colour: Colour,
    #[serde(alias = "parks_color")]
    pub park_colour: Colour,
    #[serde(alias = "water_color")]
    pub water_colour: Colour,
    #[serde(alias = "buildings_fill")]
    pub building_palette: Vec<Colour>,
    /// Font file name, looked up in the fonts directory
    #[serde(default, alias = "font_family")]
    pub font: Option<String>,
}

impl Style {
    /// Outline colour for palette entry `index`: the fill halved
    pub fn building_outline(&self, index: usize) -> Option<Colour> {
        self.building_palette.get(index).map(|c| c.shade(2))
    }
}

#[derive(Debug, Deserialize)]
struct StylesFile {
    #[serde(alias = "Styles")]
    styles: Vec<Style>,
}

/// Validated collection of styles, sorted by name
#[derive(Debug, Clone)]
pub struct StyleBook {
    styles: Vec<Style>,
}

impl StyleBook {
    /// Styles shipped with the binary
    pub fn bundled() -> Result<Self, StyleError> {
        Self::from_toml(BUNDLED_STYLES)
    }

    pub fn load(path: &Path) -> Result<Self, StyleError> {
        let contents = std::fs::read_to_string(path).map_err(|source| StyleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, StyleError> {
        let file: StylesFile = toml::from_str(contents)?;
        Self::new(file.styles)
    }

    pub fn new(mut styles: Vec<Style>) -> Result<Self, StyleError> {
        if styles.is_empty() {
            return Err(StyleError::NoStyles);
        }

        let mut seen = HashSet::new();
        for style in &styles {
            if style.building_palette.is_empty() {
                return Err(StyleError::EmptyPalette(style.name.clone()));
            }
            if !seen.insert(style.name.to_lowercase()) {
                return Err(StyleError::DuplicateName(style.name.clone()));
            }
        }

        styles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(Self { styles })
    }

    /// Look a style up by name, ignoring case
    pub fn get(&self, name: &str) -> Result<&Style, StyleError> {
        self.styles
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| StyleError::UnknownStyle {
                name: name.to_string(),
                available: self.names().collect::<Vec<_>>().join(", "),
            })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.styles.iter().map(|s| s.name.as_str())
    }

    pub fn styles(&self) -> &[Style] {
        &self.styles
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NIGHT: &str = r##"
[[styles]]
name = "Night"
background_colour = "#101018"
text_colour = "#f0f0f0"
street_colour = "#303040"
park_colour = "#203020"
water_colour = "#102040"
building_palette = ["#ff0000", "#00ff00", "#0000ff80"]
"##;

    const LEGACY: &str = r##"
[[Styles]]
name = "Legacy"
background_color = "#FFFFFF"
text_color = "#000000"
roads_color = "#888888"
parks_color = "#00AA00"
water_color = "#0000AA"
buildings_fill = ["#111111"]
font_family = "Serif.ttf"
"##;

    #[test]
    fn test_parse_colour() {
        assert_eq!("#ff8000".parse::<Colour>().unwrap(), Colour::rgb(255, 128, 0));
        let translucent: Colour = "#0000ff80".parse().unwrap();
        assert_eq!(translucent.a, 0x80);
        assert!("ff8000".parse::<Colour>().is_err());
        assert!("#ff80".parse::<Colour>().is_err());
        assert!("#gg8000".parse::<Colour>().is_err());
        assert_eq!(Colour::rgb(255, 128, 0).to_string(), "#FF8000");
    }

    #[test]
    fn test_shade_halves_channels() {
        let c = Colour::rgb(255, 128, 7).shade(2);
        assert_eq!(c, Colour::rgb(127, 64, 3));
    }

    #[test]
    fn test_style_book_from_toml() {
        let book = StyleBook::from_toml(NIGHT).unwrap();
        let style = book.get("night").unwrap();
        assert_eq!(style.building_palette.len(), 3);
        assert_eq!(style.building_outline(0), Some(Colour::rgb(127, 0, 0)));
        assert_eq!(style.font, None);

        let book = StyleBook::from_toml(LEGACY).unwrap();
        let style = book.get("Legacy").unwrap();
        assert_eq!(style.street_colour, Colour::rgb(0x88, 0x88, 0x88));
        assert_eq!(style.font.as_deref(), Some("Serif.ttf"));
    }

    #[test]
    fn test_style_book_validation() {
        let empty_palette = r##"
[[styles]]
name = "Bare"
background_colour = "#000000"
text_colour = "#000000"
street_colour = "#000000"
park_colour = "#000000"
water_colour = "#000000"
building_palette = []
"##;
        assert!(matches!(
            StyleBook::from_toml(empty_palette),
            Err(StyleError::EmptyPalette(_))
        ));

        let twice = format!("{0}{0}", empty_palette.replace("[]", r##"["#ffffff"]"##));
        assert!(matches!(
            StyleBook::from_toml(&twice),
            Err(StyleError::DuplicateName(_))
        ));

        assert!(matches!(
            StyleBook::from_toml("styles = []"),
            Err(StyleError::NoStyles)
        ));

        let bad_colour = empty_palette.replace("[]", r##"["blue"]"##);
        assert!(matches!(
            StyleBook::from_toml(&bad_colour),
            Err(StyleError::Parse(_))
        ));
    }

    #[test]
    fn test_bundled_styles() {
        let book = StyleBook::bundled().unwrap();
        assert!(book.len() >= 4);
        let names: Vec<&str> = book.names().collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert!(book.get("no-such-style").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("styles.toml");
        std::fs::write(&path, NIGHT).unwrap();

        let book = StyleBook::load(&path).unwrap();
        assert_eq!(book.names().collect::<Vec<_>>(), vec!["Night"]);

        assert!(matches!(
            StyleBook::load(&dir.path().join("missing.toml")),
            Err(StyleError::Io { .. })
        ));
    }
}
