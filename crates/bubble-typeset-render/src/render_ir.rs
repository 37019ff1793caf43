//! Backend-agnostic draw commands, rotation frames and page output.

use bubble_typeset::{
    point_in_polygon, rotate_points, BoundingBox, FontRole, LayoutError, Point, Polygon, Rgb,
};
use serde::{Deserialize, Serialize};

/// Font request passed to measurers and backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FontSpec {
    pub role: FontRole,
    /// Character height in pixels.
    pub size_px: u32,
}

impl FontSpec {
    pub const fn new(role: FontRole, size_px: u32) -> Self {
        Self { role, size_px }
    }
}

/// Filled polygon, used for text-area backgrounds.
#[derive(Clone, Debug, PartialEq)]
pub struct PolygonCommand {
    pub polygon: Polygon,
    pub color: Rgb,
}

/// Text run drawn with its top-left corner at `(x, y)`.
#[derive(Clone, Debug, PartialEq)]
pub struct TextCommand {
    pub x: i32,
    pub y: i32,
    pub text: String,
    pub font: FontSpec,
    pub color: Rgb,
}

/// Solid rectangle, used for strikethrough bars.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RectCommand {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub color: Rgb,
}

/// Backend-agnostic draw command.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    FillPolygon(PolygonCommand),
    Text(TextCommand),
    Rect(RectCommand),
}

/// Tap target of an anchor chunk in final page coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HyperlinkRect {
    pub reference_id: String,
    pub polygon: [Point; 4],
}

impl HyperlinkRect {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        point_in_polygon(x, y, &self.polygon)
    }
}

/// Axis-aligned working frame of a rotated text area.
///
/// Frame coordinates are obtained by rotating page coordinates clockwise by
/// `degrees` about `pivot`, then translating so the rotated polygon's bounds
/// start at the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RotationFrame {
    pub degrees: i32,
    /// Center of the original polygon's bounding box.
    pub pivot: Point,
    /// Minimum corner of the rotated polygon's bounds, before translation.
    pub rotated_min: Point,
    pub width: u32,
    pub height: u32,
    /// Bounds of the original polygon on the page.
    pub page_bounds: BoundingBox,
}

impl RotationFrame {
    /// Rotate `polygon` into an axis-aligned frame.
    ///
    /// Returns the frame and the polygon in frame coordinates.
    pub fn for_polygon(polygon: &Polygon, degrees: i32) -> Result<(Self, Polygon), LayoutError> {
        let page_bounds = polygon.bounding_box();
        let pivot = page_bounds.center();
        let rotated = polygon.rotated(pivot, degrees as f32).snapped(FRAME_SNAP_STEPS);
        let rotated_bounds = rotated.bounding_box();
        let width = rotated_bounds.width().ceil();
        let height = rotated_bounds.height().ceil();
        if !(width >= 1.0 && height >= 1.0) {
            return Err(LayoutError::EmptyRotatedFrame { degrees });
        }
        let frame = Self {
            degrees,
            pivot,
            rotated_min: rotated_bounds.min(),
            width: width as u32,
            height: height as u32,
            page_bounds,
        };
        let local = rotated
            .translated(-rotated_bounds.x_min, -rotated_bounds.y_min)
            .snapped(FRAME_SNAP_STEPS);
        Ok((frame, local))
    }

    pub fn to_frame(&self, page: Point) -> Point {
        let rotated = rotate_points(&[page], self.pivot, self.degrees as f32);
        let p = rotated.first().copied().unwrap_or(page);
        Point::new(p.x - self.rotated_min.x, p.y - self.rotated_min.y)
    }

    pub fn to_page(&self, frame: Point) -> Point {
        let shifted = Point::new(frame.x + self.rotated_min.x, frame.y + self.rotated_min.y);
        let rotated = rotate_points(&[shifted], self.pivot, -(self.degrees as f32));
        rotated.first().copied().unwrap_or(shifted)
    }
}

/// Sub-pixel grid for rotated polygons, in steps per pixel.
const FRAME_SNAP_STEPS: f32 = 1000.0;

/// Line geometry after alignment, in layer coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacedLine {
    pub start: Point,
    pub end: Point,
}

/// Commands for one text area.
///
/// Coordinates are page coordinates, or frame coordinates when `rotation`
/// is set; the backend composites rotated layers back onto the page.
#[derive(Clone, Debug, PartialEq)]
pub struct AreaLayer {
    pub area_index: usize,
    pub rotation: Option<RotationFrame>,
    /// Accepted character height after normalization.
    pub character_height: u32,
    /// Shrink loop bottomed out at height 1 without a fitting layout.
    pub forced: bool,
    pub lines: Vec<PlacedLine>,
    pub commands: Vec<DrawCommand>,
}

/// Text area that could not be laid out.
#[derive(Clone, Debug, PartialEq)]
pub struct SkippedArea {
    pub area_index: usize,
    pub error: LayoutError,
}

/// One page's text layer as backend-agnostic draw commands.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderPage {
    pub layers: Vec<AreaLayer>,
    pub hyperlinks: Vec<HyperlinkRect>,
    pub skipped: Vec<SkippedArea>,
}

impl RenderPage {
    pub fn layer_for_area(&self, area_index: usize) -> Option<&AreaLayer> {
        self.layers
            .iter()
            .find(|layer| layer.area_index == area_index)
    }

    /// Text commands across all layers, in draw order.
    pub fn text_commands(&self) -> impl Iterator<Item = (&AreaLayer, &TextCommand)> + '_ {
        self.layers.iter().flat_map(|layer| {
            layer.commands.iter().filter_map(move |cmd| match cmd {
                DrawCommand::Text(text) => Some((layer, text)),
                _ => None,
            })
        })
    }

    /// Hyperlink whose rectangle contains `(x, y)`.
    pub fn hit_test(&self, x: f32, y: f32) -> Option<&HyperlinkRect> {
        self.hyperlinks.iter().find(|link| link.contains(x, y))
    }

    /// Hyperlink rectangles as a JSON array for the viewer hand-off.
    pub fn hyperlinks_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.hyperlinks)
    }
}
