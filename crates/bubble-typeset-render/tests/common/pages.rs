use bubble_typeset::{FontRole, Polygon, SemanticType, TextArea};
use bubble_typeset_render::{FontSpec, TextMeasurer};

/// Deterministic measurer: every character advances `0.4 * size_px`.
pub struct RatioMeasurer;

impl TextMeasurer for RatioMeasurer {
    fn measure_text_px(&self, text: &str, font: FontSpec) -> f32 {
        text.chars().count() as f32 * 0.4 * font.size_px as f32
    }
}

/// Like `RatioMeasurer`, but strong text is a quarter wider.
pub struct BoldWideMeasurer;

impl TextMeasurer for BoldWideMeasurer {
    fn measure_text_px(&self, text: &str, font: FontSpec) -> f32 {
        let ratio = if font.role == FontRole::Strong { 0.5 } else { 0.4 };
        text.chars().count() as f32 * ratio * font.size_px as f32
    }
}

pub fn rect(x: i32, y: i32, w: i32, h: i32) -> Polygon {
    Polygon::from_pixels(&[(x, y), (x + w, y), (x + w, y + h), (x, y + h)])
}

/// Rounded speech-bubble outline: an octagon inscribed in the given box.
pub fn bubble(x: i32, y: i32, w: i32, h: i32) -> Polygon {
    let cx = w / 4;
    let cy = h / 4;
    Polygon::from_pixels(&[
        (x + cx, y),
        (x + w - cx, y),
        (x + w, y + cy),
        (x + w, y + h - cy),
        (x + w - cx, y + h),
        (x + cx, y + h),
        (x, y + h - cy),
        (x, y + cy),
    ])
}

/// A busy page with mixed semantic types, markup and one rotated area.
pub fn busy_page() -> Vec<TextArea> {
    vec![
        TextArea::new(
            bubble(20, 20, 220, 120),
            "Did you see <emphasis>that</emphasis>? It was <strong>huge</strong>!",
        ),
        TextArea::new(
            bubble(300, 40, 180, 100),
            "No<a href=\"#note1\">1</a> but I heard H<sub>2</sub>O boiling.",
        ),
        TextArea::new(rect(20, 200, 460, 40), "<commentary>Meanwhile, across town...</commentary>"),
        TextArea::new(
            rect(40, 280, 300, 160),
            "Whereas the party of the first part agrees to the terms set out below, \
             the party of the second part shall <strikethrough>never</strikethrough> comply.",
        )
        .with_semantic_type(SemanticType::Formal),
        TextArea::new(rect(380, 300, 90, 40), "DANGER")
            .with_semantic_type(SemanticType::Sign)
            .with_rotation(-30),
        TextArea::new(
            bubble(60, 480, 200, 110),
            "<inverted>Hmm...</inverted> maybe <code>rm -rf</code> was not wise.",
        )
        .with_semantic_type(SemanticType::Thought),
    ]
}
