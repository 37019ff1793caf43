//! Input model for comic speech-bubble typesetting.
//!
//! This crate owns everything that describes *what* to typeset: text-area
//! polygons, the restricted inline markup vocabulary, and the style
//! configuration that maps semantic roles to fonts and colors. Layout and
//! rasterization live in `bubble-typeset-render` and `bubble-typeset-image`.

#![cfg_attr(
    not(test),
    deny(
        clippy::disallowed_methods,
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::panic_in_result_fn,
        clippy::todo,
        clippy::unimplemented
    )
)]

pub mod error;
pub mod geometry;
pub mod markup;
pub mod style;
pub mod text_area;

pub use error::{ColorParseError, ConfigError, LayoutError};
pub use geometry::{
    bounding_box, point_in_polygon, rotate_points, signed_area, BoundingBox, Point, Polygon,
};
pub use markup::{
    strip_markup, tokenize, visible_char_count, InlineTag, Segment, TagEvent, TagKind, Word,
};
pub use style::{
    resolve_style, ColorScheme, FontRole, ResolvedStyle, Rgb, Script, StyleConfig, StyleStack,
};
pub use text_area::{SemanticType, TextArea};
