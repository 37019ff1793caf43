//! Text measuring seam and the shrink-to-fit line breaker.

use std::ops::Range;

use bubble_typeset::{visible_char_count, Point, Polygon, Segment, SemanticType, StyleStack, Word};

use crate::render_ir::FontSpec;

/// Text measurement hook shared by fitting, normalization and alignment.
pub trait TextMeasurer: Send + Sync {
    /// Measure rendered text width for the provided font.
    fn measure_text_px(&self, text: &str, font: FontSpec) -> f32;

    /// Advance of one inter-word space.
    ///
    /// Default delegates to `measure_text_px`.
    fn space_width_px(&self, font: FontSpec) -> f32 {
        self.measure_text_px(" ", font)
    }
}

/// Horizontal nudge applied to words that start or end with `letter`.
///
/// Some comic faces draw a leading or trailing capital J outside its
/// advance box; nudging keeps it from touching the neighbouring word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EdgeKerning {
    pub letter: char,
    pub nudge_px: i32,
}

/// Layout tunables.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutConfig {
    /// Baseline-to-baseline distance as a multiple of character height.
    pub line_pitch_ratio: f32,
    /// Probe step for word placement and edge scans.
    pub probe_step_px: f32,
    /// Inset of the first probe from the polygon's top-left bound.
    pub inset_px: f32,
    /// Vertical slack, in line boxes, below which the final word may stay
    /// on the current line.
    pub orphan_slack_ratio: f32,
    /// Height over group median that triggers normalization.
    pub normalize_ratio: f32,
    /// Size of sup/sub/anchor text relative to the character height.
    pub small_font_ratio: f32,
    /// Subscript drop relative to the character height.
    pub subscript_drop_ratio: f32,
    /// Optional edge-letter nudge, off by default.
    pub edge_kerning: Option<EdgeKerning>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            line_pitch_ratio: 1.3,
            probe_step_px: 2.0,
            inset_px: 2.0,
            orphan_slack_ratio: 1.4,
            normalize_ratio: 1.1,
            small_font_ratio: 0.5,
            subscript_drop_ratio: 0.7,
            edge_kerning: None,
        }
    }
}

impl LayoutConfig {
    /// Height of a line box: character height plus one pixel.
    pub fn box_height(&self, character_height: u32) -> f32 {
        character_height as f32 + 1.0
    }

    pub fn line_pitch(&self, character_height: u32) -> f32 {
        character_height as f32 * self.line_pitch_ratio
    }

    pub fn small_size(&self, character_height: u32) -> u32 {
        ((character_height as f32 * self.small_font_ratio) as u32).max(1)
    }

    pub fn subscript_drop(&self, character_height: u32) -> f32 {
        (character_height as f32 * self.subscript_drop_ratio).trunc()
    }

    fn probe_step(&self) -> f32 {
        if self.probe_step_px > 0.0 {
            self.probe_step_px
        } else {
            1.0
        }
    }
}

/// One fitted line in layer coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct Line {
    /// Top-left corner of the first word.
    pub start: Point,
    /// Right edge of the last word at the bottom of the line box.
    pub end: Point,
    /// Indices into the area's word list.
    pub words: Range<usize>,
    /// Last line of a paragraph: followed by a forced break or by nothing.
    pub ends_paragraph: bool,
}

impl Line {
    pub fn width(&self) -> f32 {
        self.end.x - self.start.x
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    pub fn corners(&self) -> [Point; 4] {
        [
            self.start,
            Point::new(self.end.x, self.start.y),
            Point::new(self.start.x, self.end.y),
            self.end,
        ]
    }
}

/// Accepted layout of one text area.
#[derive(Clone, Debug, PartialEq)]
pub struct FittedArea {
    pub character_height: u32,
    pub lines: Vec<Line>,
    pub semantic_type: SemanticType,
    /// Accepted at height 1 without fitting.
    pub forced: bool,
}

/// Result of one layout pass.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutPass {
    pub lines: Vec<Line>,
    /// Some word could not be placed above the polygon's bottom bound.
    pub overflowed: bool,
}

/// `max(1, round(sqrt(area / (2 * visible_chars)) * 2) - 3)`.
///
/// An empty text counts as one character.
pub fn initial_character_height(area: f32, visible_chars: usize) -> u32 {
    let chars = visible_chars.max(1) as f32;
    let estimate = ((area.max(0.0) / (2.0 * chars)).sqrt() * 2.0).round() - 3.0;
    if estimate.is_finite() && estimate >= 1.0 {
        estimate as u32
    } else {
        1
    }
}

/// Shrink-to-fit line breaker for one polygon.
pub struct LineFitter<'a> {
    measurer: &'a dyn TextMeasurer,
    config: LayoutConfig,
}

impl<'a> LineFitter<'a> {
    pub fn new(measurer: &'a dyn TextMeasurer, config: LayoutConfig) -> Self {
        Self { measurer, config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Width of each word at `character_height`, trailing space included.
    ///
    /// Tag events are folded over a style stack that runs across the whole
    /// word list, so a tag opened in one word styles the following ones.
    pub fn word_widths(
        &self,
        words: &[Word],
        semantic_type: SemanticType,
        character_height: u32,
    ) -> Vec<f32> {
        let mut stack = StyleStack::new();
        let mut widths = Vec::with_capacity(words.len());
        for word in words {
            let mut width = 0.0;
            let mut last_font = None;
            for segment in &word.segments {
                match segment {
                    Segment::Tag(event) => stack.apply(event),
                    Segment::Text(text) => {
                        let size = if stack.is_small() {
                            self.config.small_size(character_height)
                        } else {
                            character_height
                        };
                        let font = FontSpec::new(stack.font_role(semantic_type), size);
                        width += self.measurer.measure_text_px(text, font);
                        last_font = Some(font);
                    }
                }
            }
            if word.trailing_space {
                if let Some(font) = last_font {
                    width += self.measurer.space_width_px(font);
                }
            }
            widths.push(width);
        }
        widths
    }

    /// Place `words` at one character height.
    ///
    /// Without `forced`, the pass stops at the first word that cannot be
    /// placed above the polygon's bottom bound. With `forced`, that word is
    /// put at the inset origin and placement continues.
    pub fn layout_pass(
        &self,
        polygon: &Polygon,
        words: &[Word],
        semantic_type: SemanticType,
        character_height: u32,
        forced: bool,
    ) -> LayoutPass {
        let widths = self.word_widths(words, semantic_type, character_height);
        let bounds = polygon.bounding_box();
        let origin = Point::new(
            bounds.x_min + self.config.inset_px,
            bounds.y_min + self.config.inset_px,
        );
        let box_h = self.config.box_height(character_height);
        let pitch = self.config.line_pitch(character_height);
        let step = self.config.probe_step();
        let early_break_allowed =
            !matches!(semantic_type, SemanticType::Formal | SemanticType::Commentary);

        let mut lines = Vec::new();
        let mut overflowed = false;
        let mut line_start = origin;
        let mut idx = 0;

        while idx < words.len() {
            let width = widths[idx];
            let mut probe = line_start;
            loop {
                let fits = polygon.contains(probe.x, probe.y)
                    && polygon.contains(probe.x + width, probe.y)
                    && polygon.contains(probe.x, probe.y + box_h)
                    && polygon.contains(probe.x + width, probe.y + box_h);
                if fits {
                    break;
                }
                if probe.y + box_h > bounds.y_max {
                    overflowed = true;
                    if !forced {
                        return LayoutPass { lines, overflowed };
                    }
                    probe = origin;
                    break;
                }
                if probe.x + width > bounds.x_max {
                    probe = Point::new(origin.x, probe.y + step);
                } else {
                    probe.x += step;
                }
            }

            let first = idx;
            let top = probe.y;
            let bottom = top + box_h;
            let mut pointer_x = probe.x + width;
            let mut ends_paragraph = false;
            idx += 1;

            while idx < words.len() {
                if words[idx].breaks_line {
                    ends_paragraph = true;
                    break;
                }
                let right = pointer_x + widths[idx];
                if !(polygon.contains(right, top) && polygon.contains(right, bottom)) {
                    break;
                }
                let slack = (bounds.y_max - bottom) / box_h;
                if early_break_allowed
                    && idx + 1 == words.len()
                    && slack > self.config.orphan_slack_ratio
                {
                    break;
                }
                pointer_x = right;
                idx += 1;
            }

            lines.push(Line {
                start: probe,
                end: Point::new(pointer_x, bottom),
                words: first..idx,
                ends_paragraph: ends_paragraph || idx == words.len(),
            });
            line_start = Point::new(origin.x, probe.y + pitch);
        }

        LayoutPass { lines, overflowed }
    }

    /// Fit starting one below the area-based estimate.
    pub fn fit(&self, polygon: &Polygon, words: &[Word], semantic_type: SemanticType) -> FittedArea {
        let estimate = initial_character_height(polygon.area(), visible_char_count(words));
        self.fit_from(polygon, words, semantic_type, estimate.saturating_sub(1).max(1))
    }

    /// Shrink from `start_height` until a pass fits; height 1 is always
    /// accepted.
    pub fn fit_from(
        &self,
        polygon: &Polygon,
        words: &[Word],
        semantic_type: SemanticType,
        start_height: u32,
    ) -> FittedArea {
        let mut height = start_height.max(1);
        loop {
            let pass = self.layout_pass(polygon, words, semantic_type, height, false);
            if !pass.overflowed {
                log::debug!(
                    "fitted {} words at height {} in {} lines",
                    words.len(),
                    height,
                    pass.lines.len()
                );
                return FittedArea {
                    character_height: height,
                    lines: pass.lines,
                    semantic_type,
                    forced: false,
                };
            }
            if height == 1 {
                let pass = self.layout_pass(polygon, words, semantic_type, 1, true);
                log::debug!("forced {} words into {} lines at height 1", words.len(), pass.lines.len());
                return FittedArea {
                    character_height: 1,
                    lines: pass.lines,
                    semantic_type,
                    forced: true,
                };
            }
            log::trace!("height {} overflowed, shrinking", height);
            height -= 1;
        }
    }

    /// Re-derive line extents at `character_height` without re-breaking.
    ///
    /// Each line keeps its start x and its vertical center; its width is
    /// re-measured at the new height.
    pub fn remeasure(
        &self,
        fitted: &FittedArea,
        words: &[Word],
        character_height: u32,
    ) -> FittedArea {
        let widths = self.word_widths(words, fitted.semantic_type, character_height);
        let box_h = self.config.box_height(character_height);
        let lines = fitted
            .lines
            .iter()
            .map(|line| {
                let width: f32 = widths
                    .get(line.words.clone())
                    .map_or(0.0, |slice| slice.iter().sum());
                let old_box = line.end.y - line.start.y;
                let shift = ((old_box - box_h) / 2.0).round();
                let top = line.start.y + shift;
                Line {
                    start: Point::new(line.start.x, top),
                    end: Point::new(line.start.x + width, top + box_h),
                    words: line.words.clone(),
                    ends_paragraph: line.ends_paragraph,
                }
            })
            .collect();
        FittedArea {
            character_height,
            lines,
            semantic_type: fitted.semantic_type,
            forced: fitted.forced,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bubble_typeset::{tokenize, FontRole};

    /// Every character advances `0.4 * size`; strong text is wider.
    struct RatioMeasurer;

    impl TextMeasurer for RatioMeasurer {
        fn measure_text_px(&self, text: &str, font: FontSpec) -> f32 {
            let ratio = if font.role == FontRole::Strong { 0.5 } else { 0.4 };
            text.chars().count() as f32 * ratio * font.size_px as f32
        }
    }

    fn rect(w: i32, h: i32) -> Polygon {
        Polygon::from_pixels(&[(0, 0), (w, 0), (w, h), (0, h)])
    }

    #[test]
    fn initial_estimate_follows_area_per_character() {
        assert_eq!(initial_character_height(5000.0, 11), 27);
        assert_eq!(initial_character_height(5000.0, 0), 97);
        assert_eq!(initial_character_height(10.0, 500), 1);
        assert_eq!(initial_character_height(0.0, 3), 1);
    }

    #[test]
    fn word_widths_include_trailing_space_and_style() {
        let fitter = LineFitter::new(&RatioMeasurer, LayoutConfig::default());
        let words = tokenize("<strong>Hi</strong> you <sup>2</sup>");
        let widths = fitter.word_widths(&words, SemanticType::Speech, 10);
        // "Hi" strong (2 * 5) + strong space (5); "you " (4 * 4); small "2" at size 5.
        assert_eq!(widths, vec![15.0, 16.0, 2.0]);
    }

    #[test]
    fn hello_world_fits_on_one_line() {
        let fitter = LineFitter::new(&RatioMeasurer, LayoutConfig::default());
        let words = tokenize("Hello world");
        let fitted = fitter.fit(&rect(100, 50), &words, SemanticType::Speech);
        assert_eq!(fitted.character_height, 22);
        assert!(!fitted.forced);
        assert_eq!(fitted.lines.len(), 1);
        let line = &fitted.lines[0];
        assert_eq!(line.start, Point::new(2.0, 2.0));
        assert!((line.end.x - 98.8).abs() < 1e-3);
        assert_eq!(line.end.y, 25.0);
        assert_eq!(line.words, 0..2);
        assert!(line.ends_paragraph);
    }

    #[test]
    fn forced_break_starts_a_new_line() {
        let fitter = LineFitter::new(&RatioMeasurer, LayoutConfig::default());
        let words = tokenize("one <br>two");
        let pass = fitter.layout_pass(&rect(200, 200), &words, SemanticType::Speech, 10, false);
        assert!(!pass.overflowed);
        assert_eq!(pass.lines.len(), 2);
        assert!(pass.lines[0].ends_paragraph);
        assert_eq!(pass.lines[1].start.x, 2.0);
        assert!((pass.lines[1].start.y - 15.0).abs() < 1e-3);
    }

    #[test]
    fn lone_final_word_drops_when_slack_is_large() {
        let fitter = LineFitter::new(&RatioMeasurer, LayoutConfig::default());
        let words = tokenize("ab cd");
        let polygon = rect(200, 200);
        let speech = fitter.layout_pass(&polygon, &words, SemanticType::Speech, 10, false);
        assert_eq!(speech.lines.len(), 2);
        let formal = fitter.layout_pass(&polygon, &words, SemanticType::Formal, 10, false);
        assert_eq!(formal.lines.len(), 1);
    }

    #[test]
    fn shrink_loop_terminates_with_forced_layout() {
        let fitter = LineFitter::new(&RatioMeasurer, LayoutConfig::default());
        let words = tokenize("Supercalifragilisticexpialidocious");
        let fitted = fitter.fit(&rect(8, 8), &words, SemanticType::Speech);
        assert_eq!(fitted.character_height, 1);
        assert!(fitted.forced);
        assert_eq!(fitted.lines.len(), 1);
        assert_eq!(fitted.lines[0].start, Point::new(2.0, 2.0));
    }

    #[test]
    fn accepted_height_never_exceeds_start() {
        let fitter = LineFitter::new(&RatioMeasurer, LayoutConfig::default());
        let words = tokenize("the quick brown fox jumps over the lazy dog");
        let polygon = rect(120, 90);
        for start in [4, 9, 15, 30] {
            let fitted = fitter.fit_from(&polygon, &words, SemanticType::Speech, start);
            assert!(fitted.character_height <= start);
            assert!(fitted.character_height >= 1);
        }
    }

    #[test]
    fn remeasure_keeps_vertical_center() {
        let fitter = LineFitter::new(&RatioMeasurer, LayoutConfig::default());
        let words = tokenize("Hello world");
        let fitted = fitter.fit(&rect(100, 50), &words, SemanticType::Speech);
        let smaller = fitter.remeasure(&fitted, &words, 20);
        let line = &smaller.lines[0];
        assert_eq!(smaller.character_height, 20);
        assert_eq!(line.start, Point::new(2.0, 3.0));
        assert_eq!(line.end.y, 24.0);
        assert!((line.width() - 88.0).abs() < 1e-3);
    }
}
