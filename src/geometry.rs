//! Planar geometry for text-area polygons.
//!
//! Coordinates are raster pixels with `y` growing downward. Containment uses
//! the even-odd ray-casting rule exactly as written in [`point_in_polygon`];
//! layout probes depend on its tie-breaking, so it is not swapped for a
//! winding-number or edge-inclusive variant.

use serde::{Deserialize, Serialize};

use crate::error::LayoutError;

/// A point in raster space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x as f32, y as f32)
    }
}

/// Axis-aligned bounds of a point set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

impl BoundingBox {
    pub fn width(&self) -> f32 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f32 {
        self.y_max - self.y_min
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }

    pub fn min(&self) -> Point {
        Point::new(self.x_min, self.y_min)
    }
}

/// Even-odd ray-casting containment test.
///
/// Horizontal edges never toggle parity on their own. On an axis-aligned
/// rectangle the left and top edges test outside while the right and bottom
/// edges test inside.
pub fn point_in_polygon(x: f32, y: f32, points: &[Point]) -> bool {
    let Some(&first) = points.first() else {
        return false;
    };
    let n = points.len();
    let mut inside = false;
    let mut p1 = first;
    for i in 1..=n {
        let p2 = points[i % n];
        if y > p1.y.min(p2.y) && y <= p1.y.max(p2.y) && x <= p1.x.max(p2.x) && p1.y != p2.y {
            let x_inters = (y - p1.y) * (p2.x - p1.x) / (p2.y - p1.y) + p1.x;
            if p1.x == p2.x || x <= x_inters {
                inside = !inside;
            }
        }
        p1 = p2;
    }
    inside
}

/// Bounds of `points`; an empty slice yields a zero box at the origin.
pub fn bounding_box(points: &[Point]) -> BoundingBox {
    let Some(&first) = points.first() else {
        return BoundingBox::default();
    };
    points.iter().skip(1).fold(
        BoundingBox {
            x_min: first.x,
            y_min: first.y,
            x_max: first.x,
            y_max: first.y,
        },
        |acc, p| BoundingBox {
            x_min: acc.x_min.min(p.x),
            y_min: acc.y_min.min(p.y),
            x_max: acc.x_max.max(p.x),
            y_max: acc.y_max.max(p.y),
        },
    )
}

/// Shoelace area, wrapping the last point back to the first.
///
/// Positive for clockwise winding on a y-down raster.
pub fn signed_area(points: &[Point]) -> f32 {
    if points.len() < 3 {
        return 0.0;
    }
    let doubled: f32 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x * b.y - b.x * a.y)
        .sum();
    doubled / 2.0
}

/// Rotate `points` about `pivot` by `degrees_clockwise` (clockwise as seen on
/// a y-down raster).
pub fn rotate_points(points: &[Point], pivot: Point, degrees_clockwise: f32) -> Vec<Point> {
    let (sin, cos) = degrees_clockwise.to_radians().sin_cos();
    points
        .iter()
        .map(|p| {
            let dx = p.x - pivot.x;
            let dy = p.y - pivot.y;
            Point::new(
                dx * cos - dy * sin + pivot.x,
                dx * sin + dy * cos + pivot.y,
            )
        })
        .collect()
}

/// Closed polygon; the last point implicitly connects back to the first.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PolygonRepr", into = "Vec<Point>")]
pub struct Polygon {
    points: Vec<Point>,
}

impl Polygon {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Build from integer pixel coordinates.
    pub fn from_pixels(points: &[(i32, i32)]) -> Self {
        Self::new(points.iter().copied().map(Point::from).collect())
    }

    /// Parse the `"x,y x,y ..."` form used by comic-book document formats.
    pub fn from_attribute(value: &str) -> Option<Self> {
        let mut points = Vec::new();
        for pair in value.split_whitespace() {
            let (x, y) = pair.split_once(',')?;
            let x = x.trim().parse::<f32>().ok()?;
            let y = y.trim().parse::<f32>().ok()?;
            points.push(Point::new(x, y));
        }
        Some(Self::new(points))
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        point_in_polygon(x, y, &self.points)
    }

    pub fn contains_point(&self, p: Point) -> bool {
        self.contains(p.x, p.y)
    }

    pub fn bounding_box(&self) -> BoundingBox {
        bounding_box(&self.points)
    }

    pub fn signed_area(&self) -> f32 {
        signed_area(&self.points)
    }

    pub fn area(&self) -> f32 {
        self.signed_area().abs()
    }

    pub fn rotated(&self, pivot: Point, degrees_clockwise: f32) -> Self {
        Self::new(rotate_points(&self.points, pivot, degrees_clockwise))
    }

    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.points.iter().map(|p| p.offset(dx, dy)).collect())
    }

    /// Round every coordinate to `1 / steps_per_px` pixel.
    ///
    /// Trigonometric round trips leave residue like `99.99999`; snapping keeps
    /// right-angle geometry exact for boundary probes.
    pub fn snapped(&self, steps_per_px: f32) -> Self {
        if steps_per_px <= 0.0 {
            return self.clone();
        }
        let snap = |v: f32| (v * steps_per_px).round() / steps_per_px;
        Self::new(
            self.points
                .iter()
                .map(|p| Point::new(snap(p.x), snap(p.y)))
                .collect(),
        )
    }

    /// Reject polygons that cannot host a layout.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let area = self.area();
        if self.points.len() < 3 || area <= 0.0 || !area.is_finite() {
            return Err(LayoutError::DegeneratePolygon {
                points: self.points.len(),
                area,
            });
        }
        Ok(())
    }
}

impl From<Polygon> for Vec<Point> {
    fn from(value: Polygon) -> Self {
        value.points
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PointRepr {
    Pair([f32; 2]),
    Named { x: f32, y: f32 },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PolygonRepr {
    Points(Vec<PointRepr>),
    Attribute(String),
}

impl TryFrom<PolygonRepr> for Polygon {
    type Error = String;

    fn try_from(value: PolygonRepr) -> Result<Self, Self::Error> {
        match value {
            PolygonRepr::Points(points) => Ok(Self::new(
                points
                    .into_iter()
                    .map(|p| match p {
                        PointRepr::Pair([x, y]) => Point::new(x, y),
                        PointRepr::Named { x, y } => Point::new(x, y),
                    })
                    .collect(),
            )),
            PolygonRepr::Attribute(raw) => Self::from_attribute(&raw)
                .ok_or_else(|| format!("invalid polygon points '{}'", raw)),
        }
    }
}
