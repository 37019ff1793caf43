//! Size normalization, vertical alignment and draw-command emission.

use bubble_typeset::{
    resolve_style, ColorScheme, Point, Polygon, Script, Segment, SemanticType, StyleStack, Word,
};

use crate::render_ir::{
    DrawCommand, FontSpec, HyperlinkRect, PlacedLine, RectCommand, TextCommand,
};
use crate::render_layout::{FittedArea, LayoutConfig, Line, TextMeasurer};

/// Lower middle element of the sorted heights.
///
/// Even-sized groups take the smaller of the two middle values, so one
/// oversized area cannot drag the reference up with it.
pub fn median_height(heights: &[u32]) -> Option<u32> {
    if heights.is_empty() {
        return None;
    }
    let mut sorted = heights.to_vec();
    sorted.sort_unstable();
    sorted.get((sorted.len() - 1) / 2).copied()
}

/// Clamp outlier heights per semantic type.
///
/// An area whose height exceeds `ratio` times its group's median is
/// brought down to `round(height / ratio)`. Output order matches input.
pub fn normalized_heights(entries: &[(SemanticType, u32)], ratio: f32) -> Vec<u32> {
    entries
        .iter()
        .map(|&(semantic_type, height)| {
            let group: Vec<u32> = entries
                .iter()
                .filter(|(ty, _)| *ty == semantic_type)
                .map(|(_, h)| *h)
                .collect();
            let Some(median) = median_height(&group) else {
                return height;
            };
            if median == 0 || ratio <= 0.0 {
                return height;
            }
            if height as f32 / median as f32 > ratio {
                ((height as f32 / ratio).round() as u32).max(1)
            } else {
                height
            }
        })
        .collect()
}

fn half_height(character_height: u32) -> f32 {
    (character_height / 2) as f32
}

/// All four corners of the box `left..right` x `top..bottom` are inside.
fn box_inside(polygon: &Polygon, left: f32, right: f32, top: f32, bottom: f32) -> bool {
    polygon.contains(left, top)
        && polygon.contains(right, top)
        && polygon.contains(left, bottom)
        && polygon.contains(right, bottom)
}

fn line_inside(polygon: &Polygon, line: &Line) -> bool {
    box_inside(polygon, line.start.x, line.end.x, line.start.y, line.end.y)
}

/// Leftmost x reachable from `line.start.x` in `step` increments with the
/// mid-height and bottom probes inside and the whole line box still inside.
fn line_left_extent(polygon: &Polygon, line: &Line, character_height: u32, step: f32) -> f32 {
    let bounds = polygon.bounding_box();
    let mid_y = line.start.y + half_height(character_height);
    let width = line.width();
    let mut x = line.start.x;
    let mut leftmost = line.start.x;
    while x >= bounds.x_min
        && polygon.contains(x, mid_y)
        && polygon.contains(x, line.end.y)
        && box_inside(polygon, x, x + width, line.start.y, line.end.y)
    {
        leftmost = x;
        x -= step;
    }
    leftmost
}

/// Rightmost x reachable from `line.end.x` in `step` increments with both
/// the mid-height and bottom probes inside.
pub fn line_right_extent(polygon: &Polygon, line: &Line, character_height: u32, step: f32) -> f32 {
    let bounds = polygon.bounding_box();
    let mid_y = line.start.y + half_height(character_height);
    let mut x = line.end.x;
    let mut rightmost = line.end.x;
    while x <= bounds.x_max && polygon.contains(x, mid_y) && polygon.contains(x, line.end.y) {
        rightmost = x;
        x += step;
    }
    rightmost
}

/// Center the text block vertically and re-snap each line to the left.
///
/// The shift is the largest value between half the free vertical space and
/// 2 for which every line's start and end stay inside the polygon with a
/// `h / 5` margin below, and every shifted line box keeps its four corners
/// inside. Returns the applied shift, or 0 when none fits.
pub fn align_vertically(
    polygon: &Polygon,
    lines: &mut [Line],
    character_height: u32,
    config: &LayoutConfig,
) -> i32 {
    let Some(first) = lines.first() else {
        return 0;
    };
    let bounds = polygon.bounding_box();
    let (text_top, text_bottom) = lines.iter().fold((first.start.y, first.end.y), |acc, line| {
        (
            acc.0.min(line.start.y).min(line.end.y),
            acc.1.max(line.start.y).max(line.end.y),
        )
    });
    let ceiling =
        (((bounds.y_max - text_bottom) - (text_top - bounds.y_min)) / 2.0).trunc() as i32;
    let margin = (character_height / 5) as f32;

    let Some(shift) = (2..=ceiling).rev().find(|&shift| {
        let dy = shift as f32 + margin;
        let moved = shift as f32;
        lines.iter().all(|line| {
            polygon.contains(line.start.x, line.start.y + dy)
                && polygon.contains(line.end.x, line.end.y + dy)
                && box_inside(
                    polygon,
                    line.start.x,
                    line.end.x,
                    line.start.y + moved,
                    line.end.y + moved,
                )
        })
    }) else {
        return 0;
    };

    let step = config.probe_step_px.max(1.0);
    for line in lines.iter_mut() {
        line.start.y += shift as f32;
        line.end.y += shift as f32;
        let left = line_left_extent(polygon, line, character_height, step);
        let dx = line.start.x - left;
        let snapped = Line {
            start: Point::new(left, line.start.y),
            end: Point::new(line.end.x - dx, line.end.y),
            ..line.clone()
        };
        if line_inside(polygon, &snapped) {
            *line = snapped;
        }
    }
    shift
}

/// Style inputs for emitting one area.
#[derive(Clone, Copy, Debug)]
pub struct AreaStyle<'a> {
    pub semantic_type: SemanticType,
    pub inverted: bool,
    pub colors: &'a ColorScheme,
    /// Area is laid out in a rotation frame.
    pub rotated: bool,
}

/// Draw commands and hyperlink rects of one area, in layer coordinates.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EmittedArea {
    pub lines: Vec<PlacedLine>,
    pub commands: Vec<DrawCommand>,
    pub hyperlinks: Vec<HyperlinkRect>,
}

/// Horizontal placement of one line: origin x and extra gap per word.
fn line_placement(
    polygon: &Polygon,
    line: &Line,
    is_last_line: bool,
    character_height: u32,
    config: &LayoutConfig,
    style: &AreaStyle<'_>,
) -> (f32, f32) {
    let step = config.probe_step_px.max(1.0);
    let max_x = line_right_extent(polygon, line, character_height, step);
    match style.semantic_type {
        SemanticType::Commentary => (line.start.x, 0.0),
        SemanticType::Formal if is_last_line => (line.start.x, 0.0),
        SemanticType::Formal => {
            let words = line.word_count();
            let gap = if line.ends_paragraph || words < 2 {
                0.0
            } else {
                (max_x - line.end.x) / (words - 1) as f32
            };
            (line.start.x, gap)
        }
        _ if style.rotated => (line.start.x + ((max_x - line.end.x) / 2.0).trunc(), 0.0),
        _ => {
            let width = line.width();
            let mid = polygon.bounding_box().center().x - width / 2.0;
            let x = if mid > max_x - width {
                max_x - width
            } else if mid < line.start.x {
                line.start.x
            } else {
                mid
            };
            (x, 0.0)
        }
    }
}

fn kerned(word_text: &str, config: &LayoutConfig, style: &AreaStyle<'_>) -> (f32, f32) {
    let Some(kerning) = config.edge_kerning else {
        return (0.0, 0.0);
    };
    if style.semantic_type == SemanticType::Formal {
        return (0.0, 0.0);
    }
    let matches = |c: Option<char>| {
        c.is_some_and(|c| c.to_lowercase().eq(kerning.letter.to_lowercase()))
    };
    let nudge = kerning.nudge_px as f32;
    (
        if matches(word_text.chars().next()) { nudge } else { 0.0 },
        if matches(word_text.chars().next_back()) { nudge } else { 0.0 },
    )
}

/// Emit text, strikethrough and hyperlink geometry for a fitted area.
///
/// Lines are placed horizontally per the area's semantic type. Tag events
/// run through one style stack across all lines.
pub fn emit_area(
    measurer: &dyn TextMeasurer,
    config: &LayoutConfig,
    polygon: &Polygon,
    words: &[Word],
    fitted: &FittedArea,
    style: &AreaStyle<'_>,
) -> EmittedArea {
    let h = fitted.character_height;
    let small = config.small_size(h);
    let drop = config.subscript_drop(h);
    let bar_offset = (h / 2) as f32 + 1.0;
    let bar_height = (h / 10).max(1);

    let mut out = EmittedArea::default();
    let mut stack = StyleStack::new();

    for (line_idx, line) in fitted.lines.iter().enumerate() {
        let is_last_line = line_idx + 1 == fitted.lines.len();
        let (mut origin_x, mut gap) =
            line_placement(polygon, line, is_last_line, h, config, style);
        let stretch = gap * line.word_count().saturating_sub(1) as f32;
        let right = origin_x + line.width() + stretch;
        if !box_inside(polygon, origin_x, right, line.start.y, line.end.y)
            && line_inside(polygon, line)
        {
            origin_x = line.start.x;
            gap = 0.0;
        }
        let top = line.start.y;
        let mut x = origin_x;
        let word_count = line.word_count();

        for (pos, word) in words
            .get(line.words.clone())
            .unwrap_or_default()
            .iter()
            .enumerate()
        {
            let (lead, trail) = kerned(&word.text(), config, style);
            x += lead;
            let mut last_font = None;
            for segment in &word.segments {
                let text = match segment {
                    Segment::Tag(event) => {
                        stack.apply(event);
                        continue;
                    }
                    Segment::Text(text) if text.is_empty() => continue,
                    Segment::Text(text) => text,
                };
                let resolved = resolve_style(style.semantic_type, &stack, style.inverted, style.colors);
                let font = FontSpec::new(resolved.role, if resolved.small { small } else { h });
                let width = measurer.measure_text_px(text, font);
                let y = match resolved.script {
                    Script::Subscript => top + drop,
                    _ => top,
                };
                let draw_x = x.round();
                let draw_y = y.round();
                out.commands.push(DrawCommand::Text(TextCommand {
                    x: draw_x as i32,
                    y: draw_y as i32,
                    text: text.clone(),
                    font,
                    color: resolved.color,
                }));

                if let Some(reference_id) = resolved.anchor {
                    let right = draw_x + width + 1.0;
                    let bottom = draw_y + drop + 1.0;
                    out.hyperlinks.push(HyperlinkRect {
                        reference_id,
                        polygon: [
                            Point::new(draw_x - 1.0, draw_y - 1.0),
                            Point::new(right, draw_y - 1.0),
                            Point::new(right, bottom),
                            Point::new(draw_x - 1.0, bottom),
                        ],
                    });
                }

                if resolved.strikethrough {
                    let pad = (measurer.space_width_px(font) / 2.0).trunc();
                    let bar_top = top + bar_offset - bar_height as f32;
                    out.commands.push(DrawCommand::Rect(RectCommand {
                        x: (draw_x - pad) as i32,
                        y: bar_top.round() as i32,
                        width: (width + 2.0 * pad).round().max(1.0) as u32,
                        height: bar_height,
                        color: resolved.color,
                    }));
                }

                x += width;
                last_font = Some(font);
            }
            if word.trailing_space {
                if let Some(font) = last_font {
                    x += measurer.space_width_px(font);
                }
            }
            if pos + 1 < word_count {
                x += gap;
            }
            x += trail;
        }

        let justified = gap * word_count.saturating_sub(1) as f32;
        out.lines.push(PlacedLine {
            start: Point::new(origin_x, top),
            end: Point::new(origin_x + line.width() + justified, line.end.y),
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render_layout::LineFitter;
    use bubble_typeset::{tokenize, FontRole, Rgb};

    struct RatioMeasurer;

    impl TextMeasurer for RatioMeasurer {
        fn measure_text_px(&self, text: &str, font: FontSpec) -> f32 {
            text.chars().count() as f32 * 0.4 * font.size_px as f32
        }
    }

    fn rect(w: i32, h: i32) -> Polygon {
        Polygon::from_pixels(&[(0, 0), (w, 0), (w, h), (0, h)])
    }

    fn texts(out: &EmittedArea) -> Vec<&TextCommand> {
        out.commands
            .iter()
            .filter_map(|cmd| match cmd {
                DrawCommand::Text(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    fn style(semantic_type: SemanticType, colors: &ColorScheme) -> AreaStyle<'_> {
        AreaStyle {
            semantic_type,
            inverted: false,
            colors,
            rotated: false,
        }
    }

    /// Even groups use the lower middle value, not the rounded mean of the
    /// two middle values. For {10, 12} the 12 normalizes to 11; with a mean
    /// median of 11 it would stay at 12.
    #[test]
    fn median_takes_lower_middle() {
        assert_eq!(median_height(&[]), None);
        assert_eq!(median_height(&[14, 10]), Some(10));
        assert_eq!(median_height(&[9, 30, 12]), Some(12));
        assert_eq!(median_height(&[4, 8, 6, 20]), Some(6));
        assert_eq!(
            normalized_heights(&[(SemanticType::Speech, 10), (SemanticType::Speech, 12)], 1.1),
            vec![10, 11]
        );
    }

    #[test]
    fn outliers_shrink_within_their_semantic_group() {
        let entries = [
            (SemanticType::Speech, 10),
            (SemanticType::Speech, 14),
            (SemanticType::Sign, 30),
        ];
        assert_eq!(normalized_heights(&entries, 1.1), vec![10, 13, 30]);
        assert_eq!(
            normalized_heights(&[(SemanticType::Speech, 11), (SemanticType::Speech, 10)], 1.1),
            vec![11, 10]
        );
    }

    #[test]
    fn single_line_is_centered_in_rectangle() {
        let config = LayoutConfig::default();
        let fitter = LineFitter::new(&RatioMeasurer, config);
        let polygon = rect(100, 50);
        let words = tokenize("Hello world");
        let mut fitted = fitter.fit(&polygon, &words, SemanticType::Speech);
        let shift = align_vertically(&polygon, &mut fitted.lines, fitted.character_height, &config);
        assert_eq!(shift, 11);
        assert_eq!(fitted.lines[0].start, Point::new(2.0, 13.0));
        assert_eq!(fitted.lines[0].end.y, 36.0);

        let colors = ColorScheme::default();
        let out = emit_area(
            &RatioMeasurer,
            &config,
            &polygon,
            &words,
            &fitted,
            &style(SemanticType::Speech, &colors),
        );
        let placed = out.lines[0];
        let center_x = (placed.start.x + placed.end.x) / 2.0;
        let center_y = (placed.start.y + placed.end.y) / 2.0;
        assert!((center_x - 50.0).abs() <= 2.0, "center x {center_x}");
        assert!((center_y - 25.0).abs() <= 2.0, "center y {center_y}");
        let texts = texts(&out);
        assert_eq!(texts.len(), 2);
        assert_eq!((texts[0].x, texts[0].y), (2, 13));
        assert_eq!(texts[1].text, "world");
        assert_eq!(texts[0].font, FontSpec::new(FontRole::Normal, 22));
    }

    #[test]
    fn centered_line_moves_to_polygon_middle() {
        let config = LayoutConfig::default();
        let polygon = rect(200, 40);
        let words = tokenize("ab cd");
        let fitted = FittedArea {
            character_height: 10,
            lines: vec![Line {
                start: Point::new(2.0, 10.0),
                end: Point::new(22.0, 21.0),
                words: 0..2,
                ends_paragraph: true,
            }],
            semantic_type: SemanticType::Speech,
            forced: false,
        };
        let colors = ColorScheme::default();
        let out = emit_area(
            &RatioMeasurer,
            &config,
            &polygon,
            &words,
            &fitted,
            &style(SemanticType::Speech, &colors),
        );
        assert_eq!(out.lines[0].start.x, 90.0);
        assert_eq!(out.lines[0].end.x, 110.0);
    }

    #[test]
    fn formal_lines_justify_to_right_extent() {
        let config = LayoutConfig::default();
        let polygon = rect(100, 100);
        let words = tokenize("aa bb cc dd ee ff gg hh ii jj kk");
        let fitter = LineFitter::new(&RatioMeasurer, config);
        let pass = fitter.layout_pass(&polygon, &words, SemanticType::Formal, 10, false);
        assert!(pass.lines.len() >= 2);
        let fitted = FittedArea {
            character_height: 10,
            lines: pass.lines,
            semantic_type: SemanticType::Formal,
            forced: false,
        };
        let colors = ColorScheme::default();
        let out = emit_area(
            &RatioMeasurer,
            &config,
            &polygon,
            &words,
            &fitted,
            &style(SemanticType::Formal, &colors),
        );

        let first = &fitted.lines[0];
        let max_x = line_right_extent(&polygon, first, 10, 2.0);
        assert!(max_x > first.end.x);
        assert!((out.lines[0].end.x - max_x).abs() < 1e-3);
        assert_eq!(out.lines[0].start.x, first.start.x);

        // Last word of the first line ends flush with the right extent.
        let texts = texts(&out);
        let last_word = &words[first.words.end - 1];
        let last_cmd = texts[first.words.end - 1];
        let advance = RatioMeasurer.measure_text_px(&last_word.text(), last_cmd.font)
            + RatioMeasurer.space_width_px(last_cmd.font);
        assert!((last_cmd.x as f32 + advance - max_x).abs() <= 1.0);

        // The final line stays left aligned.
        let last = fitted.lines.len() - 1;
        assert_eq!(out.lines[last].start.x, fitted.lines[last].start.x);
        assert_eq!(out.lines[last].end.x, fitted.lines[last].end.x);
    }

    #[test]
    fn commentary_stays_left_aligned() {
        let config = LayoutConfig::default();
        let polygon = rect(200, 40);
        let words = tokenize("ab cd");
        let fitted = FittedArea {
            character_height: 10,
            lines: vec![Line {
                start: Point::new(2.0, 10.0),
                end: Point::new(22.0, 21.0),
                words: 0..2,
                ends_paragraph: true,
            }],
            semantic_type: SemanticType::Commentary,
            forced: false,
        };
        let colors = ColorScheme::default();
        let out = emit_area(
            &RatioMeasurer,
            &config,
            &polygon,
            &words,
            &fitted,
            &style(SemanticType::Commentary, &colors),
        );
        assert_eq!(out.lines[0].start.x, 2.0);
    }

    #[test]
    fn inline_styles_emit_bars_links_and_subscripts() {
        let config = LayoutConfig::default();
        let polygon = rect(400, 60);
        let words = tokenize(
            r##"<strikethrough>no</strikethrough> H<sub>2</sub>O<a href="#n1">1</a> <inverted>x</inverted>"##,
        );
        let fitted = FittedArea {
            character_height: 20,
            lines: vec![Line {
                start: Point::new(2.0, 10.0),
                end: Point::new(100.0, 31.0),
                words: 0..words.len(),
                ends_paragraph: true,
            }],
            semantic_type: SemanticType::Commentary,
            forced: false,
        };
        let colors = ColorScheme::default();
        let out = emit_area(
            &RatioMeasurer,
            &config,
            &polygon,
            &words,
            &fitted,
            &style(SemanticType::Commentary, &colors),
        );

        let bars: Vec<&RectCommand> = out
            .commands
            .iter()
            .filter_map(|cmd| match cmd {
                DrawCommand::Rect(rect) => Some(rect),
                _ => None,
            })
            .collect();
        assert_eq!(bars.len(), 1);
        // "no" at x=2: 16px wide, half-space pad 4.
        assert_eq!(bars[0].x, -2);
        assert_eq!(bars[0].width, 24);
        assert_eq!(bars[0].y, 10 + 10 + 1 - 2);
        assert_eq!(bars[0].height, 2);

        let texts = texts(&out);
        let sub = texts.iter().find(|t| t.text == "2").unwrap();
        assert_eq!(sub.y, 10 + 14);
        assert_eq!(sub.font.size_px, 10);

        let anchor = texts.iter().find(|t| t.text == "1").unwrap();
        assert_eq!(anchor.y, 10);
        assert_eq!(out.hyperlinks.len(), 1);
        let link = &out.hyperlinks[0];
        assert_eq!(link.reference_id, "n1");
        assert_eq!(link.polygon[0], Point::new(anchor.x as f32 - 1.0, 9.0));
        assert_eq!(link.polygon[2].y, 10.0 + 14.0 + 1.0);

        let inverted = texts.iter().find(|t| t.text == "x").unwrap();
        assert_eq!(inverted.color, Rgb::WHITE);
        assert_eq!(texts[0].color, Rgb::BLACK);
    }

    #[test]
    fn edge_kerning_nudges_matching_words() {
        let config = LayoutConfig {
            edge_kerning: Some(crate::render_layout::EdgeKerning {
                letter: 'j',
                nudge_px: 1,
            }),
            ..LayoutConfig::default()
        };
        let polygon = rect(400, 60);
        let words = tokenize("Jab cd");
        let fitted = FittedArea {
            character_height: 10,
            lines: vec![Line {
                start: Point::new(2.0, 10.0),
                end: Point::new(30.0, 21.0),
                words: 0..2,
                ends_paragraph: true,
            }],
            semantic_type: SemanticType::Commentary,
            forced: false,
        };
        let colors = ColorScheme::default();
        let out = emit_area(
            &RatioMeasurer,
            &config,
            &polygon,
            &words,
            &fitted,
            &style(SemanticType::Commentary, &colors),
        );
        let texts = texts(&out);
        assert_eq!(texts[0].x, 3);
        // 3 + "Jab" (12) + space (4).
        assert_eq!(texts[1].x, 19);
    }
}
