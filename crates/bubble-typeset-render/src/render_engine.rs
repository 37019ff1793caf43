//! Page orchestration: per-area fitting, group normalization and layer assembly.

use std::fmt;

use bubble_typeset::{
    tokenize, ColorScheme, LayoutError, Polygon, SemanticType, StyleConfig, TextArea, Word,
};

use crate::render_align::{align_vertically, emit_area, normalized_heights, AreaStyle};
use crate::render_ir::{
    AreaLayer, DrawCommand, HyperlinkRect, PolygonCommand, RenderPage, RotationFrame, SkippedArea,
};
use crate::render_layout::{FittedArea, LayoutConfig, LineFitter, TextMeasurer};

/// Render-engine options.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RenderEngineOptions {
    /// Layout tunables used for every area.
    pub layout: LayoutConfig,
    /// Text colors per semantic type.
    pub colors: ColorScheme,
}

impl RenderEngineOptions {
    /// Options taking colors from a page style configuration.
    pub fn from_style(style: &StyleConfig) -> Self {
        Self {
            layout: LayoutConfig::default(),
            colors: style.colors,
        }
    }
}

/// Text area in its working coordinate space, fitted and ready to align.
struct PreparedArea<'a> {
    index: usize,
    area: &'a TextArea,
    polygon: Polygon,
    rotation: Option<RotationFrame>,
    words: Vec<Word>,
    fitted: FittedArea,
}

/// Page layout engine: text areas in, draw commands out.
#[derive(Clone)]
pub struct RenderEngine {
    opts: RenderEngineOptions,
}

impl fmt::Debug for RenderEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderEngine")
            .field("opts", &self.opts)
            .finish()
    }
}

impl RenderEngine {
    /// Create a render engine.
    pub fn new(opts: RenderEngineOptions) -> Self {
        Self { opts }
    }

    pub fn options(&self) -> &RenderEngineOptions {
        &self.opts
    }

    /// Working polygon of `area`: the page polygon, or the polygon rotated
    /// into its axis-aligned frame.
    pub fn working_polygon(
        area: &TextArea,
    ) -> Result<(Polygon, Option<RotationFrame>), LayoutError> {
        area.polygon.validate()?;
        if area.rotation_degrees == 0 {
            return Ok((area.polygon.clone(), None));
        }
        let (frame, local) = RotationFrame::for_polygon(&area.polygon, area.rotation_degrees)?;
        local.validate()?;
        Ok((local, Some(frame)))
    }

    /// Shrink-to-fit one area in its working coordinate space.
    pub fn fit_area(
        &self,
        area: &TextArea,
        measurer: &dyn TextMeasurer,
    ) -> Result<FittedArea, LayoutError> {
        let (polygon, _) = Self::working_polygon(area)?;
        let words = tokenize(&area.markup);
        let fitter = LineFitter::new(measurer, self.opts.layout);
        Ok(fitter.fit(&polygon, &words, area.effective_type()))
    }

    fn prepare<'a>(
        &self,
        index: usize,
        area: &'a TextArea,
        fitter: &LineFitter<'_>,
    ) -> Result<PreparedArea<'a>, LayoutError> {
        let (polygon, rotation) = Self::working_polygon(area)?;
        let words = tokenize(&area.markup);
        let fitted = fitter.fit(&polygon, &words, area.effective_type());
        Ok(PreparedArea {
            index,
            area,
            polygon,
            rotation,
            words,
            fitted,
        })
    }

    /// Lay out every text area of one page.
    ///
    /// Areas are fitted independently, then normalized per semantic type,
    /// aligned and emitted in input order. An area that cannot be laid out
    /// is recorded in `RenderPage::skipped` and draws nothing.
    pub fn layout_page(&self, areas: &[TextArea], measurer: &dyn TextMeasurer) -> RenderPage {
        let layout = self.opts.layout;
        let fitter = LineFitter::new(measurer, layout);
        let mut page = RenderPage::default();

        let mut prepared = Vec::with_capacity(areas.len());
        for (index, area) in areas.iter().enumerate() {
            match self.prepare(index, area, &fitter) {
                Ok(ready) => prepared.push(ready),
                Err(error) => {
                    log::warn!("skipping text area {}: {}", index, error);
                    page.skipped.push(SkippedArea {
                        area_index: index,
                        error,
                    });
                }
            }
        }

        let entries: Vec<(SemanticType, u32)> = prepared
            .iter()
            .map(|p| (p.fitted.semantic_type, p.fitted.character_height))
            .collect();
        let heights = normalized_heights(&entries, layout.normalize_ratio);

        for (mut ready, height) in prepared.into_iter().zip(heights) {
            if height != ready.fitted.character_height {
                log::debug!(
                    "normalizing text area {} from height {} to {}",
                    ready.index,
                    ready.fitted.character_height,
                    height
                );
                ready.fitted = fitter.remeasure(&ready.fitted, &ready.words, height);
            }
            let (layer, hyperlinks) = self.build_layer(ready, measurer);
            page.hyperlinks.extend(hyperlinks);
            page.layers.push(layer);
        }

        page
    }

    fn build_layer(
        &self,
        mut ready: PreparedArea<'_>,
        measurer: &dyn TextMeasurer,
    ) -> (AreaLayer, Vec<HyperlinkRect>) {
        let layout = &self.opts.layout;
        let h = ready.fitted.character_height;
        if ready.fitted.semantic_type != SemanticType::Formal {
            align_vertically(&ready.polygon, &mut ready.fitted.lines, h, layout);
        }

        let style = AreaStyle {
            semantic_type: ready.fitted.semantic_type,
            inverted: ready.area.inverted,
            colors: &self.opts.colors,
            rotated: ready.rotation.is_some(),
        };
        let emitted = emit_area(
            measurer,
            layout,
            &ready.polygon,
            &ready.words,
            &ready.fitted,
            &style,
        );

        let mut commands = Vec::with_capacity(emitted.commands.len() + 1);
        if !ready.area.transparent {
            commands.push(DrawCommand::FillPolygon(PolygonCommand {
                polygon: ready.polygon.clone(),
                color: ready.area.background,
            }));
        }
        commands.extend(emitted.commands);

        let hyperlinks = match &ready.rotation {
            Some(frame) => emitted
                .hyperlinks
                .into_iter()
                .map(|link| HyperlinkRect {
                    reference_id: link.reference_id,
                    polygon: link.polygon.map(|p| frame.to_page(p)),
                })
                .collect(),
            None => emitted.hyperlinks,
        };

        log::debug!(
            "text area {}: height {}, {} lines, {} commands{}",
            ready.index,
            h,
            emitted.lines.len(),
            commands.len(),
            if ready.fitted.forced { ", forced" } else { "" }
        );

        let layer = AreaLayer {
            area_index: ready.index,
            rotation: ready.rotation,
            character_height: h,
            forced: ready.fitted.forced,
            lines: emitted.lines,
            commands,
        };
        (layer, hyperlinks)
    }
}
