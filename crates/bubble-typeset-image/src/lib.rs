//! Raster backend compositing `bubble-typeset-render` pages onto RGBA images.

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

mod font_backend;
mod raster;

use bubble_typeset::{StyleConfig, TextArea};
use bubble_typeset_render::{
    AreaLayer, DrawCommand, HyperlinkRect, RenderEngine, RenderEngineOptions, RenderPage,
};
use image::RgbaImage;

pub use font_backend::{
    FontBackend, FontLoadError, ImageTextMeasurer, MonoFontBackend, TtfFontBackend,
};
pub use tiny_skia::Pixmap;

/// Executes render-page draw commands on a `tiny_skia::Pixmap`.
#[derive(Clone, Debug)]
pub struct ImageRenderer<B = MonoFontBackend> {
    backend: B,
}

impl Default for ImageRenderer<MonoFontBackend> {
    fn default() -> Self {
        Self::with_backend(MonoFontBackend)
    }
}

impl<B> ImageRenderer<B>
where
    B: FontBackend,
{
    pub fn with_backend(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Draw every layer of `page` onto `canvas`, in layer order.
    pub fn render_page(&self, page: &RenderPage, canvas: &mut Pixmap) {
        for layer in &page.layers {
            self.render_layer(layer, canvas);
        }
    }

    /// Draw `page` onto a straight-alpha page image.
    pub fn render_page_onto_image(&self, page: &RenderPage, image: &mut RgbaImage) {
        let Some(mut canvas) = raster::pixmap_from_image(image) else {
            log::debug!("empty page image; nothing drawn");
            return;
        };
        self.render_page(page, &mut canvas);
        raster::copy_to_image(&canvas, image);
    }

    /// Draw one text-area layer.
    ///
    /// Rotated layers are drawn upright on a transparent canvas the size of
    /// their frame, then composited back at the area's angle.
    pub fn render_layer(&self, layer: &AreaLayer, canvas: &mut Pixmap) {
        match &layer.rotation {
            None => self.render_commands(&layer.commands, canvas),
            Some(frame) => {
                let Some(mut upright) = Pixmap::new(frame.width, frame.height) else {
                    log::warn!(
                        "area {} has an empty {}x{} frame",
                        layer.area_index,
                        frame.width,
                        frame.height
                    );
                    return;
                };
                self.render_commands(&layer.commands, &mut upright);
                raster::composite_rotated(canvas, &upright, frame);
            }
        }
    }

    pub fn render_commands(&self, commands: &[DrawCommand], canvas: &mut Pixmap) {
        for cmd in commands {
            match cmd {
                DrawCommand::FillPolygon(fill) => {
                    raster::fill_polygon(canvas, &fill.polygon, fill.color);
                }
                DrawCommand::Text(text) => {
                    self.backend
                        .draw_text(canvas, text.font, &text.text, (text.x, text.y), text.color);
                }
                DrawCommand::Rect(rect) => {
                    raster::fill_rect(canvas, rect.x, rect.y, rect.width, rect.height, rect.color);
                }
            }
        }
    }
}

/// Lay out and draw a page's text areas with an explicit font backend.
///
/// The same backend measures and draws, so wrapped widths match the raster.
pub fn compose_page_with_backend<B>(
    canvas: &mut RgbaImage,
    areas: &[TextArea],
    style: &StyleConfig,
    backend: B,
) -> RenderPage
where
    B: FontBackend + Clone + Send + Sync,
{
    let engine = RenderEngine::new(RenderEngineOptions::from_style(style));
    let measurer = ImageTextMeasurer::with_backend(backend.clone());
    let page = engine.layout_page(areas, &measurer);
    ImageRenderer::with_backend(backend).render_page_onto_image(&page, canvas);
    page
}

/// Lay out and draw a page's text areas using the fonts named in `style`.
///
/// Returns the hyperlink rectangles of anchor chunks in page coordinates.
pub fn compose_page(
    canvas: &mut RgbaImage,
    areas: &[TextArea],
    style: &StyleConfig,
) -> Vec<HyperlinkRect> {
    let backend = TtfFontBackend::from_style(style);
    let page = compose_page_with_backend(canvas, areas, style, backend);
    for skipped in &page.skipped {
        log::warn!("text area {} left undrawn: {}", skipped.area_index, skipped.error);
    }
    page.hyperlinks
}
