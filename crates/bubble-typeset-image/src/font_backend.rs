//! Font backends: built-in mono faces and TrueType faces per font role.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;
use std::path::Path;

use ab_glyph::{point, Font, FontArc, PxScale, ScaleFont};
use bubble_typeset::{FontRole, Rgb, StyleConfig};
use bubble_typeset_render::{FontSpec, TextMeasurer};
use embedded_graphics::{
    draw_target::{DrawTarget, DrawTargetExt},
    geometry::{OriginDimensions, Point as EgPoint, Size},
    mono_font::{
        ascii::{
            FONT_10X20, FONT_4X6, FONT_5X8, FONT_6X10, FONT_6X12, FONT_6X13, FONT_6X13_BOLD,
            FONT_6X13_ITALIC, FONT_6X9, FONT_7X13_ITALIC, FONT_7X14, FONT_7X14_BOLD,
            FONT_8X13_ITALIC, FONT_9X15, FONT_9X15_BOLD, FONT_9X18, FONT_9X18_BOLD,
        },
        MonoFont, MonoTextStyle,
    },
    pixelcolor::BinaryColor,
    primitives::Rectangle,
    text::{Baseline, Text},
    Drawable, Pixel,
};
use tiny_skia::{ColorU8, Pixmap};

use crate::raster::draw_glyphs;

/// Font abstraction used for both measuring and drawing text runs.
///
/// Layout and raster share one backend so line breaks match drawn widths.
pub trait FontBackend {
    /// Advance width of `text` in pixels.
    fn measure(&self, font: FontSpec, text: &str) -> f32;

    /// Draw `text` with its top-left corner at `origin`.
    ///
    /// Returns the advance in pixels.
    fn draw_text(
        &self,
        canvas: &mut Pixmap,
        font: FontSpec,
        text: &str,
        origin: (i32, i32),
        color: Rgb,
    ) -> i32;
}

/// Error returned when a TrueType face cannot be loaded.
#[derive(Debug)]
pub enum FontLoadError {
    Io(std::io::Error),
    InvalidFont(ab_glyph::InvalidFont),
}

impl fmt::Display for FontLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "font io error: {}", err),
            Self::InvalidFont(err) => write!(f, "invalid font data: {}", err),
        }
    }
}

impl std::error::Error for FontLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::InvalidFont(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for FontLoadError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ab_glyph::InvalidFont> for FontLoadError {
    fn from(value: ab_glyph::InvalidFont) -> Self {
        Self::InvalidFont(value)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MonoVariant {
    Regular,
    Bold,
    Italic,
}

impl MonoVariant {
    fn for_role(role: FontRole) -> Self {
        match role {
            FontRole::Strong | FontRole::Heading | FontRole::Audio => Self::Bold,
            FontRole::Emphasis | FontRole::Thought => Self::Italic,
            _ => Self::Regular,
        }
    }

    /// Faces ordered by glyph height, smallest first.
    fn faces(self) -> &'static [&'static MonoFont<'static>] {
        match self {
            Self::Regular => &[
                &FONT_4X6, &FONT_5X8, &FONT_6X9, &FONT_6X10, &FONT_6X12, &FONT_6X13, &FONT_7X14,
                &FONT_9X15, &FONT_9X18, &FONT_10X20,
            ],
            Self::Bold => &[&FONT_6X13_BOLD, &FONT_7X14_BOLD, &FONT_9X15_BOLD, &FONT_9X18_BOLD],
            Self::Italic => &[&FONT_6X13_ITALIC, &FONT_7X13_ITALIC, &FONT_8X13_ITALIC],
        }
    }
}

/// Built-in backend over the `embedded-graphics` ASCII mono fonts.
///
/// Picks the largest face whose glyph height fits the requested size. Bold
/// and italic roles drop to regular faces when none of theirs fit.
#[derive(Clone, Copy, Debug, Default)]
pub struct MonoFontBackend;

impl MonoFontBackend {
    pub(crate) fn face_for(font: FontSpec) -> &'static MonoFont<'static> {
        let fits = |face: &&&MonoFont<'static>| face.character_size.height <= font.size_px;
        let regular = MonoVariant::Regular.faces();
        MonoVariant::for_role(font.role)
            .faces()
            .iter()
            .rev()
            .find(fits)
            .or_else(|| regular.iter().rev().find(fits))
            .or_else(|| regular.first())
            .copied()
            .unwrap_or(&FONT_6X10)
    }

    fn advance(face: &MonoFont<'_>, chars: usize) -> i32 {
        if chars == 0 {
            return 0;
        }
        let width = face.character_size.width as i32;
        let spacing = face.character_spacing as i32;
        chars as i32 * width + (chars as i32 - 1) * spacing
    }
}

impl FontBackend for MonoFontBackend {
    fn measure(&self, font: FontSpec, text: &str) -> f32 {
        let normalized = normalize_text_for_mono(text);
        Self::advance(Self::face_for(font), normalized.chars().count()) as f32
    }

    fn draw_text(
        &self,
        canvas: &mut Pixmap,
        font: FontSpec,
        text: &str,
        origin: (i32, i32),
        color: Rgb,
    ) -> i32 {
        let face = Self::face_for(font);
        let normalized = normalize_text_for_mono(text);
        let advance = Self::advance(face, normalized.chars().count());
        let style = MonoTextStyle::new(face, BinaryColor::On);
        let position = EgPoint::new(origin.0, origin.1);
        // The smallest face can be taller than tiny line boxes.
        let line_box = Rectangle::new(
            position,
            Size::new(advance.max(0) as u32, font.size_px.saturating_add(1)),
        );
        let mut target = CanvasTarget::new(canvas, color);
        let _ = Text::with_baseline(normalized.as_ref(), position, style, Baseline::Top)
            .draw(&mut target.clipped(&line_box));
        advance
    }
}

/// Map typographic punctuation onto the ASCII repertoire of the mono faces.
fn normalize_text_for_mono(text: &str) -> Cow<'_, str> {
    if !text.chars().any(|ch| {
        matches!(
            ch,
            '\u{00A0}' // nbsp
                | '\u{2013}' // en dash
                | '\u{2014}' // em dash
                | '\u{2018}' // left single quote
                | '\u{2019}' // right single quote
                | '\u{201C}' // left double quote
                | '\u{201D}' // right double quote
                | '\u{2026}' // ellipsis
        )
    }) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\u{00A0}' => out.push(' '),
            '\u{2013}' | '\u{2014}' => out.push('-'),
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{201C}' | '\u{201D}' => out.push('"'),
            '\u{2026}' => out.push_str("..."),
            other => out.push(other),
        }
    }
    Cow::Owned(out)
}

/// `DrawTarget` adapter painting lit mono pixels opaquely onto a pixmap.
struct CanvasTarget<'a> {
    canvas: &'a mut Pixmap,
    color: ColorU8,
}

impl<'a> CanvasTarget<'a> {
    fn new(canvas: &'a mut Pixmap, color: Rgb) -> Self {
        Self {
            canvas,
            color: ColorU8::from_rgba(color.r, color.g, color.b, 0xff),
        }
    }
}

impl OriginDimensions for CanvasTarget<'_> {
    fn size(&self) -> Size {
        Size::new(self.canvas.width(), self.canvas.height())
    }
}

impl DrawTarget for CanvasTarget<'_> {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let width = self.canvas.width() as i32;
        let height = self.canvas.height() as i32;
        let lit = self.color.premultiply();
        let data = self.canvas.pixels_mut();
        for Pixel(point, color) in pixels {
            if !color.is_on() || point.x < 0 || point.y < 0 || point.x >= width || point.y >= height
            {
                continue;
            }
            if let Some(slot) = data.get_mut((point.y * width + point.x) as usize) {
                *slot = lit;
            }
        }
        Ok(())
    }
}

/// TrueType backend holding one `ab_glyph` face per font role.
///
/// Roles without a face use the `Normal` face when one is loaded, then the
/// built-in mono faces.
#[derive(Clone, Default)]
pub struct TtfFontBackend {
    faces: BTreeMap<FontRole, FontArc>,
    fallback: MonoFontBackend,
}

impl fmt::Debug for TtfFontBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtfFontBackend")
            .field("roles", &self.faces.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl TtfFontBackend {
    /// Backend with no faces; everything falls back to mono.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every font file named in a style configuration.
    ///
    /// Unreadable or invalid files are logged and skipped; the role falls
    /// back instead of failing the page.
    pub fn from_style(style: &StyleConfig) -> Self {
        let mut backend = Self::new();
        for (role, path) in &style.fonts {
            if let Err(err) = backend.load_face(*role, path) {
                log::warn!(
                    "font for role {:?} unavailable ({}): {}; using fallback face",
                    role,
                    path.display(),
                    err
                );
            }
        }
        backend
    }

    pub fn insert_face(&mut self, role: FontRole, font: FontArc) {
        self.faces.insert(role, font);
    }

    pub fn load_face(
        &mut self,
        role: FontRole,
        path: impl AsRef<Path>,
    ) -> Result<(), FontLoadError> {
        let data = std::fs::read(path.as_ref())?;
        let font = FontArc::try_from_vec(data)?;
        log::debug!("loaded {:?} face from {}", role, path.as_ref().display());
        self.insert_face(role, font);
        Ok(())
    }

    pub fn has_face(&self, role: FontRole) -> bool {
        self.faces.contains_key(&role)
    }

    fn face_for(&self, role: FontRole) -> Option<&FontArc> {
        self.faces
            .get(&role)
            .or_else(|| self.faces.get(&FontRole::Normal))
    }
}

impl FontBackend for TtfFontBackend {
    fn measure(&self, font: FontSpec, text: &str) -> f32 {
        let Some(face) = self.face_for(font.role) else {
            return self.fallback.measure(font, text);
        };
        let scaled = face.as_scaled(PxScale::from(font.size_px as f32));
        let mut width = 0.0f32;
        let mut previous = None;
        for ch in text.chars() {
            if ch.is_control() {
                continue;
            }
            let glyph_id = scaled.glyph_id(ch);
            if let Some(prev) = previous {
                width += scaled.kern(prev, glyph_id);
            }
            width += scaled.h_advance(glyph_id);
            previous = Some(glyph_id);
        }
        width.max(0.0)
    }

    fn draw_text(
        &self,
        canvas: &mut Pixmap,
        font: FontSpec,
        text: &str,
        origin: (i32, i32),
        color: Rgb,
    ) -> i32 {
        let Some(face) = self.face_for(font.role) else {
            return self.fallback.draw_text(canvas, font, text, origin, color);
        };
        let scaled = face.as_scaled(PxScale::from(font.size_px as f32));
        let left = origin.0 as f32;
        let baseline = origin.1 as f32 + scaled.ascent();
        let mut cursor_x = left;
        let mut previous = None;
        let mut outlines = Vec::with_capacity(text.len());
        for ch in text.chars() {
            if ch.is_control() {
                continue;
            }
            let glyph_id = scaled.glyph_id(ch);
            if let Some(prev) = previous {
                cursor_x += scaled.kern(prev, glyph_id);
            }
            let mut glyph = scaled.scaled_glyph(ch);
            glyph.position = point(cursor_x, baseline);
            outlines.extend(face.outline_glyph(glyph));
            cursor_x += scaled.h_advance(glyph_id);
            previous = Some(glyph_id);
        }
        draw_glyphs(canvas, &outlines, color);
        (cursor_x - left).round() as i32
    }
}

/// `TextMeasurer` adapter backed by a `FontBackend`.
#[derive(Clone, Debug)]
pub struct ImageTextMeasurer<B = MonoFontBackend> {
    backend: B,
}

impl ImageTextMeasurer<MonoFontBackend> {
    /// Measurer using the built-in mono faces.
    pub fn new() -> Self {
        Self {
            backend: MonoFontBackend,
        }
    }
}

impl Default for ImageTextMeasurer<MonoFontBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> ImageTextMeasurer<B>
where
    B: FontBackend,
{
    pub fn with_backend(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B> TextMeasurer for ImageTextMeasurer<B>
where
    B: FontBackend + Send + Sync,
{
    fn measure_text_px(&self, text: &str, font: FontSpec) -> f32 {
        self.backend.measure(font, text)
    }
}
