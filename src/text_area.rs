//! Text areas: one polygon of marked-up text on a comic page.

use serde::{Deserialize, Serialize};

use crate::geometry::Polygon;
use crate::markup::{tokenize, InlineTag, Segment, TagEvent};
use crate::style::Rgb;

/// Narrative role of a text area; selects the baseline font and color.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum SemanticType {
    #[default]
    Speech,
    Commentary,
    Sign,
    Formal,
    Heading,
    Letter,
    Audio,
    Thought,
    Code,
}

impl SemanticType {
    pub const ALL: [Self; 9] = [
        Self::Speech,
        Self::Commentary,
        Self::Sign,
        Self::Formal,
        Self::Heading,
        Self::Letter,
        Self::Audio,
        Self::Thought,
        Self::Code,
    ];

    /// Parse a document `type` attribute; unknown values read as speech.
    pub fn from_attr(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "commentary" => Self::Commentary,
            "sign" => Self::Sign,
            "formal" => Self::Formal,
            "heading" => Self::Heading,
            "letter" => Self::Letter,
            "audio" => Self::Audio,
            "thought" => Self::Thought,
            "code" => Self::Code,
            _ => Self::Speech,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Speech => "speech",
            Self::Commentary => "commentary",
            Self::Sign => "sign",
            Self::Formal => "formal",
            Self::Heading => "heading",
            Self::Letter => "letter",
            Self::Audio => "audio",
            Self::Thought => "thought",
            Self::Code => "code",
        }
    }
}

impl From<String> for SemanticType {
    fn from(value: String) -> Self {
        Self::from_attr(&value)
    }
}

fn default_background() -> Rgb {
    Rgb::WHITE
}

/// A polygon of marked-up text handed over by the document reader.
///
/// Immutable once built; the engine only borrows it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextArea {
    pub polygon: Polygon,
    #[serde(default, alias = "text")]
    pub markup: String,
    #[serde(default = "default_background", alias = "bgcolor")]
    pub background: Rgb,
    #[serde(default, alias = "text-rotation")]
    pub rotation_degrees: i32,
    #[serde(default, rename = "type")]
    pub semantic_type: SemanticType,
    #[serde(default)]
    pub inverted: bool,
    #[serde(default)]
    pub transparent: bool,
}

impl TextArea {
    /// Speech area with a white background and no rotation.
    pub fn new(polygon: Polygon, markup: impl Into<String>) -> Self {
        Self {
            polygon,
            markup: markup.into(),
            background: Rgb::WHITE,
            rotation_degrees: 0,
            semantic_type: SemanticType::Speech,
            inverted: false,
            transparent: false,
        }
    }

    /// Join document paragraphs; every paragraph ends with a forced break.
    pub fn from_paragraphs<S: AsRef<str>>(polygon: Polygon, paragraphs: &[S]) -> Self {
        let mut markup = String::new();
        for paragraph in paragraphs {
            markup.push_str(paragraph.as_ref().trim());
            markup.push_str(" <br>");
        }
        Self::new(polygon, markup)
    }

    pub fn with_semantic_type(mut self, semantic_type: SemanticType) -> Self {
        self.semantic_type = semantic_type;
        self
    }

    pub fn with_rotation(mut self, degrees: i32) -> Self {
        self.rotation_degrees = degrees;
        self
    }

    pub fn with_background(mut self, background: Rgb) -> Self {
        self.background = background;
        self
    }

    pub fn with_inverted(mut self, inverted: bool) -> Self {
        self.inverted = inverted;
        self
    }

    pub fn with_transparent(mut self, transparent: bool) -> Self {
        self.transparent = transparent;
        self
    }

    /// Semantic type after markup promotion.
    ///
    /// A `<commentary>` tag anywhere in the markup turns the whole area into
    /// commentary: left alignment, no orphan early-break, and commentary
    /// grouping for size normalization.
    pub fn effective_type(&self) -> SemanticType {
        if self.semantic_type == SemanticType::Commentary {
            return SemanticType::Commentary;
        }
        let promoted = tokenize(&self.markup).iter().any(|word| {
            word.segments.iter().any(|segment| {
                matches!(
                    segment,
                    Segment::Tag(TagEvent::Open(InlineTag::Commentary))
                )
            })
        });
        if promoted {
            SemanticType::Commentary
        } else {
            self.semantic_type
        }
    }
}
