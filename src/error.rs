//! Error types shared across the typesetting crates.

use std::fmt;

/// Per-area layout failure.
///
/// The page engine skips the affected text area and leaves the background
/// untouched for it; other areas on the page still render.
#[derive(Clone, Debug, PartialEq)]
pub enum LayoutError {
    /// Polygon has fewer than three points or no enclosed area.
    DegeneratePolygon { points: usize, area: f32 },
    /// Rotating the polygon into its working frame produced an empty box.
    EmptyRotatedFrame { degrees: i32 },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DegeneratePolygon { points, area } => write!(
                f,
                "degenerate text-area polygon (points={} area={})",
                points, area
            ),
            Self::EmptyRotatedFrame { degrees } => {
                write!(f, "rotation by {} degrees produced an empty frame", degrees)
            }
        }
    }
}

impl std::error::Error for LayoutError {}

/// A color string that is not one of the accepted hex forms.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorParseError {
    pub value: String,
}

impl fmt::Display for ColorParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid color '{}'", self.value)
    }
}

impl std::error::Error for ColorParseError {}

/// Style configuration could not be loaded.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "style config io error: {}", err),
            Self::Json(err) => write!(f, "style config parse error: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}
