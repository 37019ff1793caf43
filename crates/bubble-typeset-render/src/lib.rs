//! Render IR, line fitting, alignment and page orchestration for `bubble-typeset`.

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

mod render_align;
mod render_engine;
mod render_ir;
mod render_layout;

pub use bubble_typeset::SemanticType;
pub use render_align::{
    align_vertically, emit_area, line_right_extent, median_height, normalized_heights, AreaStyle,
    EmittedArea,
};
pub use render_engine::{RenderEngine, RenderEngineOptions};
pub use render_ir::{
    AreaLayer, DrawCommand, FontSpec, HyperlinkRect, PlacedLine, PolygonCommand, RectCommand,
    RenderPage, RotationFrame, SkippedArea, TextCommand,
};
pub use render_layout::{
    initial_character_height, EdgeKerning, FittedArea, LayoutConfig, LayoutPass, Line, LineFitter,
    TextMeasurer,
};
