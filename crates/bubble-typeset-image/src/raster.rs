//! Pixel-level helpers shared by the font backends and the page renderer.

use ab_glyph::OutlinedGlyph;
use bubble_typeset::{Polygon, Rgb};
use bubble_typeset_render::RotationFrame;
use image::RgbaImage;
use tiny_skia::{
    ColorU8, FillRule, FilterQuality, Mask, Paint, Path, PathBuilder, Pixmap, PixmapPaint, Rect,
    Transform,
};

/// Premultiplied copy of `image`, or `None` for an empty image.
pub(crate) fn pixmap_from_image(image: &RgbaImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height())?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Some(pixmap)
}

/// Write `pixmap` back into a same-sized straight-alpha image.
pub(crate) fn copy_to_image(pixmap: &Pixmap, image: &mut RgbaImage) {
    for (dst, src) in image.pixels_mut().zip(pixmap.pixels()) {
        let color = src.demultiply();
        dst.0 = [color.red(), color.green(), color.blue(), color.alpha()];
    }
}

/// Aliased solid paint; a pixel is covered when its center is inside.
fn solid_paint(color: Rgb) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, 0xff);
    paint.anti_alias = false;
    paint
}

fn polygon_path(polygon: &Polygon) -> Option<Path> {
    let mut points = polygon.points().iter();
    let first = points.next()?;
    let mut builder = PathBuilder::new();
    builder.move_to(first.x, first.y);
    for point in points {
        builder.line_to(point.x, point.y);
    }
    builder.close();
    builder.finish()
}

/// Fill `polygon` with the even-odd rule.
pub(crate) fn fill_polygon(canvas: &mut Pixmap, polygon: &Polygon, color: Rgb) {
    let Some(path) = polygon_path(polygon) else {
        return;
    };
    canvas.fill_path(
        &path,
        &solid_paint(color),
        FillRule::EvenOdd,
        Transform::identity(),
        None,
    );
}

pub(crate) fn fill_rect(canvas: &mut Pixmap, x: i32, y: i32, width: u32, height: u32, color: Rgb) {
    let Some(rect) = Rect::from_xywh(x as f32, y as f32, width as f32, height as f32) else {
        return;
    };
    let path = PathBuilder::from_rect(rect);
    canvas.fill_path(
        &path,
        &solid_paint(color),
        FillRule::Winding,
        Transform::identity(),
        None,
    );
}

/// Draw outlined glyphs of one run in `color`, blended source-over.
///
/// Coverage is gathered on a run-sized layer first so overlapping glyph
/// boxes never double-blend.
pub(crate) fn draw_glyphs(canvas: &mut Pixmap, glyphs: &[OutlinedGlyph], color: Rgb) {
    let Some((x_min, y_min, x_max, y_max)) = glyphs
        .iter()
        .map(|glyph| {
            let b = glyph.px_bounds();
            (b.min.x, b.min.y, b.max.x, b.max.y)
        })
        .reduce(|a, b| (a.0.min(b.0), a.1.min(b.1), a.2.max(b.2), a.3.max(b.3)))
    else {
        return;
    };
    let left = x_min.floor() as i32;
    let top = y_min.floor() as i32;
    let width = (x_max.ceil() as i32 - left).max(0) as u32;
    let height = (y_max.ceil() as i32 - top).max(0) as u32;
    let Some(mut run) = Pixmap::new(width, height) else {
        return;
    };

    let stride = width as usize;
    let pixels = run.pixels_mut();
    for glyph in glyphs {
        let bounds = glyph.px_bounds();
        let gx = bounds.min.x.floor() as i32 - left;
        let gy = bounds.min.y.floor() as i32 - top;
        glyph.draw(|x, y, coverage| {
            let px = gx + x as i32;
            let py = gy + y as i32;
            if px < 0 || py < 0 || px as usize >= stride {
                return;
            }
            let alpha = (coverage.clamp(0.0, 1.0) * 255.0).round() as u8;
            if let Some(slot) = pixels.get_mut(py as usize * stride + px as usize) {
                if alpha > slot.alpha() {
                    *slot = ColorU8::from_rgba(color.r, color.g, color.b, alpha).premultiply();
                }
            }
        });
    }

    canvas.draw_pixmap(
        left,
        top,
        run.as_ref(),
        &PixmapPaint::default(),
        Transform::identity(),
        None,
    );
}

/// Frame-to-page transform: undo the frame translation, then rotate back
/// about the pivot.
pub(crate) fn frame_to_page(frame: &RotationFrame) -> Transform {
    Transform::from_rotate_at(-(frame.degrees as f32), frame.pivot.x, frame.pivot.y)
        .pre_translate(frame.rotated_min.x, frame.rotated_min.y)
}

/// Clip mask covering the pixels of the frame's original page bounds.
fn page_bounds_mask(canvas: &Pixmap, frame: &RotationFrame) -> Option<Mask> {
    let bounds = frame.page_bounds;
    let x0 = bounds.x_min.floor();
    let y0 = bounds.y_min.floor();
    let rect = Rect::from_ltrb(x0, y0, bounds.x_max.ceil(), bounds.y_max.ceil())?;
    let mut mask = Mask::new(canvas.width(), canvas.height())?;
    mask.fill_path(
        &PathBuilder::from_rect(rect),
        FillRule::Winding,
        false,
        Transform::identity(),
    );
    Some(mask)
}

/// Composite a layer drawn in frame coordinates back onto the page.
///
/// The layer is resampled bilinearly through the inverse rotation and
/// clipped to the area's page bounds.
pub(crate) fn composite_rotated(canvas: &mut Pixmap, layer: &Pixmap, frame: &RotationFrame) {
    let Some(mask) = page_bounds_mask(canvas, frame) else {
        return;
    };
    let mut paint = PixmapPaint::default();
    paint.quality = FilterQuality::Bilinear;
    canvas.draw_pixmap(
        0,
        0,
        layer.as_ref(),
        &paint,
        frame_to_page(frame),
        Some(&mask),
    );
}
