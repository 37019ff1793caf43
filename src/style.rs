//! Style resolution: semantic type + open tags + inversion -> font role and color.
//!
//! The open inline tags form a stack; the resolved style of any text chunk is a
//! pure fold over that stack, so closing a tag restores exactly the style that
//! was active before its matching open.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{ColorParseError, ConfigError};
use crate::markup::{InlineTag, TagEvent, TagKind};
use crate::text_area::SemanticType;

/// 8-bit sRGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(0xff, 0xff, 0xff);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rgb`, `#rrggbb`, `#rrggbbaa` or the 16-bit-per-channel
    /// `#rrrrggggbbbb` form. Alpha and low bytes are dropped.
    pub fn parse_hex(value: &str) -> Result<Self, ColorParseError> {
        let err = || ColorParseError {
            value: value.to_string(),
        };
        let hex = value.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.is_ascii() {
            return Err(err());
        }
        let byte_at =
            |idx: usize| u8::from_str_radix(&hex[idx..idx + 2], 16).map_err(|_| err());
        match hex.len() {
            3 => {
                let nibble = |idx: usize| {
                    u8::from_str_radix(&hex[idx..idx + 1], 16)
                        .map(|v| v * 17)
                        .map_err(|_| err())
                };
                Ok(Self::new(nibble(0)?, nibble(1)?, nibble(2)?))
            }
            6 | 8 => Ok(Self::new(byte_at(0)?, byte_at(2)?, byte_at(4)?)),
            12 => Ok(Self::new(byte_at(0)?, byte_at(4)?, byte_at(8)?)),
            _ => Err(err()),
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Rgb {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_hex(&value)
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

/// Font slot selected by semantic type or an overriding inline tag.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum FontRole {
    #[default]
    Normal,
    Emphasis,
    Strong,
    Code,
    Commentary,
    Sign,
    Formal,
    Heading,
    Letter,
    Audio,
    Thought,
}

impl FontRole {
    pub const ALL: [Self; 11] = [
        Self::Normal,
        Self::Emphasis,
        Self::Strong,
        Self::Code,
        Self::Commentary,
        Self::Sign,
        Self::Formal,
        Self::Heading,
        Self::Letter,
        Self::Audio,
        Self::Thought,
    ];

    pub fn baseline_for(semantic_type: SemanticType) -> Self {
        match semantic_type {
            SemanticType::Speech => Self::Normal,
            SemanticType::Commentary => Self::Commentary,
            SemanticType::Sign => Self::Sign,
            SemanticType::Formal => Self::Formal,
            SemanticType::Heading => Self::Heading,
            SemanticType::Letter => Self::Letter,
            SemanticType::Audio => Self::Audio,
            SemanticType::Thought => Self::Thought,
            SemanticType::Code => Self::Code,
        }
    }
}

/// Text colors per semantic type plus the inverted color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorScheme {
    pub speech: Rgb,
    pub commentary: Rgb,
    pub sign: Rgb,
    pub formal: Rgb,
    pub heading: Rgb,
    pub letter: Rgb,
    pub audio: Rgb,
    pub thought: Rgb,
    pub code: Rgb,
    pub inverted: Rgb,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            speech: Rgb::BLACK,
            commentary: Rgb::BLACK,
            sign: Rgb::BLACK,
            formal: Rgb::BLACK,
            heading: Rgb::BLACK,
            letter: Rgb::BLACK,
            audio: Rgb::BLACK,
            thought: Rgb::BLACK,
            code: Rgb::BLACK,
            inverted: Rgb::WHITE,
        }
    }
}

impl ColorScheme {
    pub fn color_for(&self, semantic_type: SemanticType) -> Rgb {
        match semantic_type {
            SemanticType::Speech => self.speech,
            SemanticType::Commentary => self.commentary,
            SemanticType::Sign => self.sign,
            SemanticType::Formal => self.formal,
            SemanticType::Heading => self.heading,
            SemanticType::Letter => self.letter,
            SemanticType::Audio => self.audio,
            SemanticType::Thought => self.thought,
            SemanticType::Code => self.code,
        }
    }
}

/// Page style configuration: font files per role and the color scheme.
///
/// Loaded once per page and read-only during layout. Roles without a font
/// file use the backend's built-in face.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub fonts: BTreeMap<FontRole, PathBuf>,
    pub colors: ColorScheme,
}

impl StyleConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path.as_ref())?;
        let config = serde_json::from_reader(std::io::BufReader::new(file))?;
        log::debug!("loaded style config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn font_path(&self, role: FontRole) -> Option<&Path> {
        self.fonts.get(&role).map(PathBuf::as_path)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Script {
    #[default]
    Normal,
    Superscript,
    Subscript,
}

/// Stack of open inline tags.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StyleStack {
    open: SmallVec<[InlineTag; 4]>,
}

impl StyleStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens push; closes pop the innermost tag of the same kind. Unmatched
    /// closes are ignored.
    pub fn apply(&mut self, event: &TagEvent) {
        match event {
            TagEvent::Open(tag) => self.open.push(tag.clone()),
            TagEvent::Close(kind) => {
                if let Some(idx) = self.open.iter().rposition(|tag| tag.kind() == *kind) {
                    self.open.remove(idx);
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        self.open.len()
    }

    pub fn is_open(&self, kind: TagKind) -> bool {
        self.open.iter().any(|tag| tag.kind() == kind)
    }

    fn innermost<F>(&self, mut pred: F) -> Option<&InlineTag>
    where
        F: FnMut(&InlineTag) -> bool,
    {
        self.open.iter().rev().find(|tag| pred(*tag))
    }

    /// Semantic type after an open `<commentary>` is taken into account.
    pub fn semantic_type(&self, area_type: SemanticType) -> SemanticType {
        if self.is_open(TagKind::Commentary) {
            SemanticType::Commentary
        } else {
            area_type
        }
    }

    /// Active font role; the innermost emphasis/strong/code tag wins.
    pub fn font_role(&self, area_type: SemanticType) -> FontRole {
        match self.innermost(|tag| {
            matches!(tag, InlineTag::Emphasis | InlineTag::Strong | InlineTag::Code)
        }) {
            Some(InlineTag::Emphasis) => FontRole::Emphasis,
            Some(InlineTag::Strong) => FontRole::Strong,
            Some(InlineTag::Code) => FontRole::Code,
            _ => FontRole::baseline_for(self.semantic_type(area_type)),
        }
    }

    /// Superscript, subscript and anchors render at the small size.
    pub fn is_small(&self) -> bool {
        self.is_open(TagKind::Superscript)
            || self.is_open(TagKind::Subscript)
            || self.is_open(TagKind::Anchor)
    }

    pub fn script(&self) -> Script {
        match self.innermost(|tag| matches!(tag, InlineTag::Superscript | InlineTag::Subscript)) {
            Some(InlineTag::Subscript) => Script::Subscript,
            Some(InlineTag::Superscript) => Script::Superscript,
            _ => Script::Normal,
        }
    }

    pub fn anchor_reference_id(&self) -> Option<&str> {
        self.innermost(|tag| matches!(tag, InlineTag::Anchor { .. }))
            .and_then(InlineTag::reference_id)
    }
}

/// Font role, size variant and color for one text chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedStyle {
    pub role: FontRole,
    pub small: bool,
    pub script: Script,
    pub color: Rgb,
    pub strikethrough: bool,
    /// Reference id of the innermost open anchor.
    pub anchor: Option<String>,
}

/// Resolve the style for text under `stack` in an area of `area_type`.
///
/// Baseline role and color come from the semantic type (an open
/// `<commentary>` switches it to commentary). Emphasis, strong and code
/// override the role only. Sup, sub and anchors select the small variant.
/// An open `<inverted>` or the area's inverted flag selects the inverted
/// color.
pub fn resolve_style(
    area_type: SemanticType,
    stack: &StyleStack,
    area_inverted: bool,
    colors: &ColorScheme,
) -> ResolvedStyle {
    let color = if area_inverted || stack.is_open(TagKind::Inverted) {
        colors.inverted
    } else {
        colors.color_for(stack.semantic_type(area_type))
    };
    ResolvedStyle {
        role: stack.font_role(area_type),
        small: stack.is_small(),
        script: stack.script(),
        color,
        strikethrough: stack.is_open(TagKind::Strikethrough),
        anchor: stack.anchor_reference_id().map(str::to_string),
    }
}
