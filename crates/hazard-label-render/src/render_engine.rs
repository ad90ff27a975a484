use std::sync::Arc;

use hazard_label::{LabelSpec, LayoutEngine, LayoutGeometry, PixelRect, RatingBox};

use crate::render_ir::{
    DiamondCommand, DrawCommand, LabelPage, RectCommand, ResolvedTextStyle, Rgb, RuleCommand,
    TextCommand, TextRole,
};

/// Text width oracle supplied by the raster backend.
pub trait TextMeasurer: Send + Sync {
    /// Measure rendered text width for the provided style.
    fn measure_text_px(&self, text: &str, style: &ResolvedTextStyle) -> f32;
}

/// Backend-independent estimate: six tenths of the font size per character.
#[derive(Clone, Copy, Debug, Default)]
pub struct ApproxTextMeasurer;

impl TextMeasurer for ApproxTextMeasurer {
    fn measure_text_px(&self, text: &str, style: &ResolvedTextStyle) -> f32 {
        let per_char = if style.bold { 0.65 } else { 0.6 };
        text.chars().count() as f32 * style.size_px * per_char
    }
}

/// Composer options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComposeConfig {
    /// Emit the selection outline and handles shown while editing.
    pub editing_chrome: bool,
    /// Prefix for the footer PPE line.
    pub ppe_prefix: &'static str,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            editing_chrome: true,
            ppe_prefix: "PPE: ",
        }
    }
}

/// Turns a label and its layout into draw commands.
#[derive(Clone)]
pub struct LabelComposer {
    layout: LayoutEngine,
    cfg: ComposeConfig,
    measurer: Arc<dyn TextMeasurer>,
}

impl core::fmt::Debug for LabelComposer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LabelComposer")
            .field("layout", &self.layout)
            .field("cfg", &self.cfg)
            .finish_non_exhaustive()
    }
}

impl Default for LabelComposer {
    fn default() -> Self {
        Self::new(LayoutEngine::default())
    }
}

impl LabelComposer {
    pub fn new(layout: LayoutEngine) -> Self {
        Self {
            layout,
            cfg: ComposeConfig::default(),
            measurer: Arc::new(ApproxTextMeasurer),
        }
    }

    pub fn with_config(mut self, cfg: ComposeConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Use a backend-specific text measurer for fitting.
    pub fn with_text_measurer(mut self, measurer: Arc<dyn TextMeasurer>) -> Self {
        self.measurer = measurer;
        self
    }

    pub fn layout_engine(&self) -> &LayoutEngine {
        &self.layout
    }

    /// Lay out `spec` and compose it.
    pub fn compose(&self, spec: &LabelSpec) -> LabelPage {
        let geometry = self.layout.layout(spec);
        self.compose_geometry(spec, &geometry)
    }

    /// Compose `spec` using an already computed geometry.
    pub fn compose_geometry(&self, spec: &LabelSpec, geometry: &LayoutGeometry) -> LabelPage {
        let mut cx = ComposeContext {
            measurer: self.measurer.as_ref(),
            page: LabelPage::new(geometry.canvas.width, geometry.canvas.height),
        };

        cx.background(geometry);
        cx.header(spec, geometry);
        for rating_box in &geometry.rating_boxes {
            cx.rating_box(rating_box, geometry);
        }
        cx.statements(geometry);
        cx.pictograms(geometry);
        cx.footer(spec, geometry, self.cfg.ppe_prefix);
        if self.cfg.editing_chrome {
            cx.editing_chrome(geometry);
        }

        let metrics = &mut cx.page.metrics;
        metrics.statements_shown = geometry.statements.len();
        metrics.statements_dropped = spec
            .hazard_statements
            .len()
            .saturating_sub(geometry.statements.len());
        metrics.pictograms_shown = geometry.pictograms.len();
        metrics.pictograms_dropped = hazard_label::resolve(&spec.pictograms)
            .len()
            .saturating_sub(geometry.pictograms.len());
        if metrics.statements_dropped > 0 || metrics.pictograms_dropped > 0 {
            log::debug!(
                "label '{}' omits {} statement(s) and {} pictogram(s)",
                spec.product_name,
                metrics.statements_dropped,
                metrics.pictograms_dropped
            );
        }
        cx.page
    }
}

struct ComposeContext<'a> {
    measurer: &'a dyn TextMeasurer,
    page: LabelPage,
}

impl ComposeContext<'_> {
    fn push(&mut self, cmd: DrawCommand) {
        self.page.push_content_command(cmd);
    }

    fn measure(&self, text: &str, style: &ResolvedTextStyle) -> u32 {
        self.measurer.measure_text_px(text, style).ceil().max(0.0) as u32
    }

    /// Shortens `text` with a trailing ellipsis until it fits `max_width`.
    fn fit(&mut self, text: &str, style: &ResolvedTextStyle, max_width: u32) -> Option<String> {
        let text = text.trim();
        if text.is_empty() || max_width == 0 {
            return None;
        }
        if self.measure(text, style) <= max_width {
            return Some(text.to_string());
        }
        let chars: Vec<char> = text.chars().collect();
        for keep in (1..chars.len()).rev() {
            let mut candidate: String = chars[..keep].iter().collect();
            candidate.truncate(candidate.trim_end().len());
            candidate.push_str("...");
            if self.measure(&candidate, style) <= max_width {
                self.page.metrics.truncated_runs += 1;
                return Some(candidate);
            }
        }
        None
    }

    fn text(&mut self, x: i32, y: i32, text: String, style: ResolvedTextStyle) {
        self.push(DrawCommand::Text(TextCommand { x, y, text, style }));
    }

    fn centered_text(&mut self, rect: PixelRect, y: i32, text: &str, style: ResolvedTextStyle) {
        let Some(text) = self.fit(text, &style, rect.width) else {
            return;
        };
        let width = self.measure(&text, &style);
        let x = rect.x + (rect.width.saturating_sub(width) / 2) as i32;
        self.text(x, y, text, style);
    }

    fn background(&mut self, g: &LayoutGeometry) {
        let border = ((2.0 * g.scale).floor() as u32).max(1);
        self.push(DrawCommand::Rect(RectCommand {
            x: 0,
            y: 0,
            width: g.canvas.width,
            height: g.canvas.height,
            fill: Some(Rgb::WHITE),
            stroke: Some(Rgb::BLACK),
            stroke_width: border,
            background: false,
        }));
    }

    fn header(&mut self, spec: &LabelSpec, g: &LayoutGeometry) {
        let pad = g.padding;
        let inner_width = g.canvas.width.saturating_sub(pad * 2);
        let title_style = ResolvedTextStyle::new(TextRole::Title, g.fonts.title).bold();
        let title_y = (g.header.top + pad / 2) as i32;

        let mut title_width = inner_width;
        if let Some(signal) = spec.signal_word {
            let style = ResolvedTextStyle::new(TextRole::SignalWord, g.fonts.title).bold();
            let width = self.measure(signal.as_str(), &style);
            if width + pad < inner_width {
                let x = (g.canvas.width - pad - width) as i32;
                self.text(x, title_y, signal.as_str().to_string(), style);
                title_width = inner_width - width - pad;
            }
        }
        if let Some(title) = self.fit(&spec.product_name, &title_style, title_width) {
            self.text(pad as i32, title_y, title, title_style);
        }

        let subtitle_y = title_y as u32 + g.fonts.title + 1;
        if subtitle_y + g.fonts.subtitle <= g.header.bottom() {
            let mut parts: Vec<&str> = Vec::with_capacity(spec.identifiers.len() + 1);
            if !spec.manufacturer.trim().is_empty() {
                parts.push(spec.manufacturer.trim());
            }
            parts.extend(spec.identifiers.iter().map(|id| id.trim()));
            let style = ResolvedTextStyle::new(TextRole::Subtitle, g.fonts.subtitle);
            if let Some(line) = self.fit(&parts.join(" | "), &style, inner_width) {
                self.text(pad as i32, subtitle_y as i32, line, style);
            }
        }

        self.push(DrawCommand::Rule(RuleCommand {
            x: 0,
            y: g.header.bottom().saturating_sub(1) as i32,
            length: g.canvas.width,
            thickness: 1,
            horizontal: true,
            color: Rgb::BLACK,
        }));
    }

    fn rating_box(&mut self, rating_box: &RatingBox, g: &LayoutGeometry) {
        let rect = rating_box.rect;
        if rect.width == 0 || rect.height == 0 {
            return;
        }
        let fill = Rgb::from_array(rating_box.category.color());
        self.push(DrawCommand::Rect(RectCommand {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            fill: Some(fill),
            stroke: Some(Rgb::BLACK),
            stroke_width: 1,
            background: true,
        }));

        let ink = fill.contrasting_ink();
        let value_style = ResolvedTextStyle::new(TextRole::RatingValue, g.fonts.rating_value)
            .bold()
            .with_color(ink);
        let caption_style = ResolvedTextStyle::new(TextRole::RatingCaption, g.fonts.rating_caption)
            .with_color(ink);
        let stacked = g.fonts.rating_value + g.fonts.rating_caption + 2;

        if stacked <= rect.height {
            let top = rect.y + ((rect.height - stacked) / 2) as i32;
            self.centered_text(rect, top, &rating_box.value, value_style);
            let caption_y = top + g.fonts.rating_value as i32 + 2;
            self.centered_text(
                rect,
                caption_y,
                rating_box.category.caption(),
                caption_style,
            );
        } else {
            let top = rect.y + (rect.height.saturating_sub(g.fonts.rating_value) / 2) as i32;
            self.centered_text(rect, top, &rating_box.value, value_style);
        }
    }

    fn statements(&mut self, g: &LayoutGeometry) {
        let column = g.statement_column;
        let style = ResolvedTextStyle::new(TextRole::Statement, g.fonts.statement);
        let step = g.fonts.statement + (g.fonts.statement / 4).max(1);
        let mut y = column.y as u32 + g.padding / 2;
        for statement in &g.statements {
            if y + g.fonts.statement > g.info.bottom() {
                break;
            }
            if let Some(line) = self.fit(statement, &style, column.width) {
                self.text(column.x, y as i32, line, style);
            }
            y += step;
        }
    }

    fn pictograms(&mut self, g: &LayoutGeometry) {
        for (pictogram, slot) in g.pictograms.iter().zip(&g.pictogram_slots) {
            if slot.width < 4 {
                continue;
            }
            self.push(DrawCommand::Diamond(DiamondCommand {
                x: slot.x,
                y: slot.y,
                size: slot.width,
                border: Rgb::GHS_RED,
                border_width: (slot.width / 12).max(1),
                fill: Rgb::WHITE,
            }));
            let glyph_style = ResolvedTextStyle::new(
                TextRole::PictogramGlyph,
                (slot.width / 4).max(g.fonts.rating_caption),
            )
            .bold();
            let inner = PixelRect::new(
                slot.x + (slot.width / 4) as i32,
                slot.y,
                slot.width / 2,
                slot.height,
            );
            let y = slot.y + (slot.height.saturating_sub(glyph_style.size_px as u32) / 2) as i32;
            self.centered_text(inner, y, pictogram.glyph(), glyph_style);
        }
    }

    fn footer(&mut self, spec: &LabelSpec, g: &LayoutGeometry, prefix: &str) {
        if g.footer.height == 0 {
            return;
        }
        self.push(DrawCommand::Rule(RuleCommand {
            x: 0,
            y: g.footer.top as i32,
            length: g.canvas.width,
            thickness: 1,
            horizontal: true,
            color: Rgb::BLACK,
        }));
        let items: Vec<&str> = spec
            .ppe
            .iter()
            .map(|item| item.trim())
            .filter(|item| !item.is_empty())
            .collect();
        if items.is_empty() {
            return;
        }
        let style = ResolvedTextStyle::new(TextRole::Footer, g.fonts.footer);
        let y = g.footer.top + g.footer.height.saturating_sub(g.fonts.footer) / 2;
        let width = g.canvas.width.saturating_sub(g.padding * 2);
        let line = format!("{}{}", prefix, items.join(", "));
        if let Some(line) = self.fit(&line, &style, width) {
            self.text(g.padding as i32, y as i32, line, style);
        }
    }

    fn editing_chrome(&mut self, g: &LayoutGeometry) {
        let (w, h) = (g.canvas.width, g.canvas.height);
        self.page.push_chrome_command(DrawCommand::Rect(RectCommand {
            x: 0,
            y: 0,
            width: w,
            height: h,
            fill: None,
            stroke: Some(Rgb::SELECTION),
            stroke_width: 1,
            background: false,
        }));
        let handle = (g.padding).clamp(2, 8).min(w).min(h);
        for (x, y) in [(0, 0), (w - handle, 0), (0, h - handle), (w - handle, h - handle)] {
            self.page.push_chrome_command(DrawCommand::Rect(RectCommand {
                x: x as i32,
                y: y as i32,
                width: handle,
                height: handle,
                fill: Some(Rgb::SELECTION),
                stroke: None,
                stroke_width: 0,
                background: false,
            }));
        }
    }
}
