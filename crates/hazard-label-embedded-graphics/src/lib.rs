//! embedded-graphics renderer for `hazard-label-render` pages.

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

mod canvas;
mod capture;

pub use canvas::{RgbaCanvas, ScaledTarget};
pub use capture::{
    encode_png, resample, LabelBoard, LabelSurface, RasterCapturer, StyleOverrideGuard,
    SurfaceStyle,
};

use embedded_graphics::{
    mono_font::{
        ascii::{
            FONT_10X20, FONT_4X6, FONT_5X7, FONT_5X8, FONT_6X10, FONT_6X12, FONT_6X13,
            FONT_6X13_BOLD, FONT_6X9, FONT_7X14, FONT_7X14_BOLD, FONT_9X15, FONT_9X15_BOLD,
            FONT_9X18, FONT_9X18_BOLD,
        },
        MonoFont, MonoTextStyle,
    },
    pixelcolor::Rgb888,
    prelude::*,
    primitives::{Line, PrimitiveStyle, PrimitiveStyleBuilder, Rectangle, StrokeAlignment, Triangle},
    text::{Baseline, Text},
};
use hazard_label_render::{
    DiamondCommand, DrawCommand, LabelPage, RectCommand, ResolvedTextStyle, Rgb, TextCommand,
    TextMeasurer,
};
use std::borrow::Cow;
use std::sync::Arc;

/// Backend-provided metrics for a resolved font.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FontMetrics {
    pub char_width: i32,
    pub line_height: i32,
}

/// Font abstraction used by the renderer's text paths.
pub trait FontBackend {
    fn metrics(&self, style: &ResolvedTextStyle) -> FontMetrics;
    fn draw_text_run<D>(
        &self,
        display: &mut D,
        style: &ResolvedTextStyle,
        color: Rgb888,
        text: &str,
        origin: Point,
    ) -> Result<i32, D::Error>
    where
        D: DrawTarget<Color = Rgb888>;
}

/// Mono-font backend. Picks the closest bundled bitmap font for each size.
#[derive(Clone, Copy, Debug, Default)]
pub struct MonoFontBackend;

impl MonoFontBackend {
    fn font_for(style: &ResolvedTextStyle) -> &'static MonoFont<'static> {
        let size = style.size_px;
        match (size, style.bold) {
            (s, _) if s < 6.5 => &FONT_4X6,
            (s, false) if s < 7.5 => &FONT_5X7,
            (s, _) if s < 8.5 => &FONT_5X8,
            (s, _) if s < 9.5 => &FONT_6X9,
            (s, _) if s < 10.5 => &FONT_6X10,
            (s, false) if s < 12.5 => &FONT_6X12,
            (s, false) if s < 13.5 => &FONT_6X13,
            (s, true) if s < 13.5 => &FONT_6X13_BOLD,
            (s, false) if s < 14.5 => &FONT_7X14,
            (s, true) if s < 14.5 => &FONT_7X14_BOLD,
            (s, false) if s < 16.5 => &FONT_9X15,
            (s, true) if s < 16.5 => &FONT_9X15_BOLD,
            (s, false) if s < 19.0 => &FONT_9X18,
            (_, true) => &FONT_9X18_BOLD,
            _ => &FONT_10X20,
        }
    }
}

impl FontBackend for MonoFontBackend {
    fn metrics(&self, style: &ResolvedTextStyle) -> FontMetrics {
        let font = Self::font_for(style);
        FontMetrics {
            char_width: (font.character_size.width + font.character_spacing) as i32,
            line_height: font.character_size.height as i32,
        }
    }

    fn draw_text_run<D>(
        &self,
        display: &mut D,
        style: &ResolvedTextStyle,
        color: Rgb888,
        text: &str,
        origin: Point,
    ) -> Result<i32, D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        let font = Self::font_for(style);
        let normalized = normalize_text_for_mono(text);
        let text_style = MonoTextStyle::new(font, color);
        Text::with_baseline(normalized.as_ref(), origin, text_style, Baseline::Top)
            .draw(display)?;
        Ok(normalized.chars().count() as i32 * self.metrics(style).char_width)
    }
}

/// Text measurer backed by a concrete font backend.
#[derive(Clone, Copy, Debug, Default)]
pub struct EgTextMeasurer<B = MonoFontBackend> {
    backend: B,
}

impl EgTextMeasurer<MonoFontBackend> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared measurer handle for [`hazard_label_render::LabelComposer`].
    pub fn shared() -> Arc<dyn TextMeasurer> {
        Arc::new(Self::new())
    }
}

impl<B> TextMeasurer for EgTextMeasurer<B>
where
    B: FontBackend + Send + Sync,
{
    fn measure_text_px(&self, text: &str, style: &ResolvedTextStyle) -> f32 {
        let chars = normalize_text_for_mono(text).chars().count() as i32;
        (chars * self.backend.metrics(style).char_width) as f32
    }
}

fn normalize_text_for_mono(text: &str) -> Cow<'_, str> {
    if text.is_ascii() {
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
            '\u{00B0}' => out.push_str("deg"),
            '\u{2022}' => out.push('*'),
            other => out.push(other),
        }
    }
    Cow::Owned(out)
}

fn to_rgb888(color: Rgb) -> Rgb888 {
    Rgb888::new(color.r, color.g, color.b)
}

/// embedded-graphics backend configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EgRenderConfig {
    /// Clear display before drawing page.
    pub clear_first: bool,
    /// Reproduce background fills and light ink exactly. When off, fills
    /// marked as background are dropped and text prints black.
    pub exact_colors: bool,
    /// Draw the editing chrome layer.
    pub show_chrome: bool,
}

impl Default for EgRenderConfig {
    fn default() -> Self {
        Self {
            clear_first: true,
            exact_colors: true,
            show_chrome: false,
        }
    }
}

/// Draw-command executor for embedded-graphics targets.
#[derive(Clone, Debug, Default)]
pub struct EgRenderer<B = MonoFontBackend> {
    cfg: EgRenderConfig,
    backend: B,
}

impl EgRenderer<MonoFontBackend> {
    pub fn new(cfg: EgRenderConfig) -> Self {
        Self::with_backend(cfg, MonoFontBackend)
    }
}

impl<B> EgRenderer<B>
where
    B: FontBackend,
{
    /// Create renderer with config and backend.
    pub fn with_backend(cfg: EgRenderConfig, backend: B) -> Self {
        Self { cfg, backend }
    }

    pub fn config(&self) -> EgRenderConfig {
        self.cfg
    }

    /// Replace the config, keeping the backend.
    pub fn set_config(&mut self, cfg: EgRenderConfig) {
        self.cfg = cfg;
    }

    /// Render a page to a draw target.
    pub fn render_page<D>(&self, page: &LabelPage, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        if self.cfg.clear_first {
            display.clear(Rgb888::WHITE)?;
        }
        for cmd in &page.content_commands {
            self.draw_command(display, cmd)?;
        }
        if self.cfg.show_chrome {
            for cmd in &page.chrome_commands {
                self.draw_command(display, cmd)?;
            }
        }
        Ok(())
    }

    fn draw_command<D>(&self, display: &mut D, cmd: &DrawCommand) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        match cmd {
            DrawCommand::Text(text) => self.draw_text(display, text),
            DrawCommand::Rule(rule) => {
                let style = PrimitiveStyle::with_stroke(to_rgb888(rule.color), rule.thickness);
                let end = if rule.horizontal {
                    Point::new(rule.x + rule.length as i32 - 1, rule.y)
                } else {
                    Point::new(rule.x, rule.y + rule.length as i32 - 1)
                };
                Line::new(Point::new(rule.x, rule.y), end)
                    .into_styled(style)
                    .draw(display)
            }
            DrawCommand::Rect(rect) => self.draw_rect(display, rect),
            DrawCommand::Diamond(diamond) => self.draw_diamond(display, diamond),
        }
    }

    fn draw_rect<D>(&self, display: &mut D, rect: &RectCommand) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        let fill = rect
            .fill
            .filter(|_| self.cfg.exact_colors || !rect.background);
        let mut style =
            PrimitiveStyleBuilder::<Rgb888>::new().stroke_alignment(StrokeAlignment::Inside);
        if let Some(fill) = fill {
            style = style.fill_color(to_rgb888(fill));
        }
        if let Some(stroke) = rect.stroke.filter(|_| rect.stroke_width > 0) {
            style = style
                .stroke_color(to_rgb888(stroke))
                .stroke_width(rect.stroke_width);
        }
        Rectangle::new(Point::new(rect.x, rect.y), Size::new(rect.width, rect.height))
            .into_styled(style.build())
            .draw(display)
    }

    fn draw_diamond<D>(&self, display: &mut D, diamond: &DiamondCommand) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        fill_diamond(display, diamond.corners(), to_rgb888(diamond.border))?;
        // A rotated square's edge sits border * sqrt(2) further in along each axis.
        let inset = ((diamond.border_width as f32) * core::f32::consts::SQRT_2).ceil() as i32;
        let [top, right, bottom, left] = diamond.corners();
        if (right.0 - left.0) <= inset * 2 {
            return Ok(());
        }
        let inner = [
            (top.0, top.1 + inset),
            (right.0 - inset, right.1),
            (bottom.0, bottom.1 - inset),
            (left.0 + inset, left.1),
        ];
        fill_diamond(display, inner, to_rgb888(diamond.fill))
    }

    fn draw_text<D>(&self, display: &mut D, cmd: &TextCommand) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        let color = if self.cfg.exact_colors {
            to_rgb888(cmd.style.color)
        } else {
            Rgb888::BLACK
        };
        self.backend.draw_text_run(
            display,
            &cmd.style,
            color,
            &cmd.text,
            Point::new(cmd.x, cmd.y),
        )?;
        Ok(())
    }
}

fn fill_diamond<D>(display: &mut D, corners: [(i32, i32); 4], color: Rgb888) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb888>,
{
    let [top, right, bottom, left] = corners.map(|(x, y)| Point::new(x, y));
    let style = PrimitiveStyle::with_fill(color);
    Triangle::new(top, right, left)
        .into_styled(style)
        .draw(display)?;
    Triangle::new(bottom, right, left)
        .into_styled(style)
        .draw(display)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_graphics::mock_display::MockDisplay;
    use hazard_label_render::{RuleCommand, TextRole};

    #[derive(Default)]
    struct PixelCaptureDisplay {
        size: Size,
        pixels: Vec<(Point, Rgb888)>,
    }

    impl PixelCaptureDisplay {
        fn with_size(width: u32, height: u32) -> Self {
            Self {
                size: Size::new(width, height),
                pixels: Vec::new(),
            }
        }

        fn count(&self, color: Rgb888) -> usize {
            self.pixels.iter().filter(|(_, c)| *c == color).count()
        }
    }

    impl OriginDimensions for PixelCaptureDisplay {
        fn size(&self) -> Size {
            self.size
        }
    }

    impl DrawTarget for PixelCaptureDisplay {
        type Color = Rgb888;
        type Error = Infallible;

        fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
        where
            I: IntoIterator<Item = Pixel<Self::Color>>,
        {
            for Pixel(point, color) in pixels {
                self.pixels.push((point, color));
            }
            Ok(())
        }
    }

    fn page_with(commands: Vec<DrawCommand>) -> LabelPage {
        let mut page = LabelPage::new(16, 16);
        for cmd in commands {
            page.push_content_command(cmd);
        }
        page
    }

    fn no_clear(exact_colors: bool) -> EgRenderer {
        EgRenderer::new(EgRenderConfig {
            clear_first: false,
            exact_colors,
            show_chrome: false,
        })
    }

    #[test]
    fn horizontal_rule_covers_its_length() {
        let page = page_with(vec![DrawCommand::Rule(RuleCommand {
            x: 0,
            y: 1,
            length: 4,
            thickness: 1,
            horizontal: true,
            color: Rgb::BLACK,
        })]);
        let mut display: MockDisplay<Rgb888> = MockDisplay::new();
        no_clear(true)
            .render_page(&page, &mut display)
            .expect("mock display draw should pass");
        display.assert_pattern(&["    ", "KKKK"]);
    }

    #[test]
    fn background_fill_is_dropped_without_exact_colors() {
        let fill = Rgb::new(0x1f, 0x5f, 0xbf);
        let page = page_with(vec![DrawCommand::Rect(RectCommand {
            x: 0,
            y: 0,
            width: 6,
            height: 6,
            fill: Some(fill),
            stroke: Some(Rgb::BLACK),
            stroke_width: 1,
            background: true,
        })]);

        let mut exact = PixelCaptureDisplay::with_size(16, 16);
        no_clear(true)
            .render_page(&page, &mut exact)
            .expect("capture display draw should pass");
        assert_eq!(exact.count(to_rgb888(fill)), 16);
        assert_eq!(exact.count(Rgb888::BLACK), 20);

        let mut economy = PixelCaptureDisplay::with_size(16, 16);
        no_clear(false)
            .render_page(&page, &mut economy)
            .expect("capture display draw should pass");
        assert_eq!(economy.count(to_rgb888(fill)), 0);
        assert_eq!(economy.count(Rgb888::BLACK), 20);
    }

    #[test]
    fn light_text_prints_black_without_exact_colors() {
        let page = page_with(vec![DrawCommand::Text(TextCommand {
            x: 0,
            y: 0,
            text: "4".to_string(),
            style: ResolvedTextStyle::new(TextRole::RatingValue, 9).with_color(Rgb::WHITE),
        })]);
        let mut display = PixelCaptureDisplay::with_size(16, 16);
        no_clear(false)
            .render_page(&page, &mut display)
            .expect("capture display draw should pass");
        assert!(display.count(Rgb888::BLACK) > 0);
        assert_eq!(display.count(Rgb888::WHITE), 0);
    }

    #[test]
    fn diamond_has_border_and_fill() {
        let page = page_with(vec![DrawCommand::Diamond(DiamondCommand {
            x: 0,
            y: 0,
            size: 14,
            border: Rgb::GHS_RED,
            border_width: 1,
            fill: Rgb::WHITE,
        })]);
        let mut display = PixelCaptureDisplay::with_size(16, 16);
        no_clear(true)
            .render_page(&page, &mut display)
            .expect("capture display draw should pass");
        assert!(display.count(to_rgb888(Rgb::GHS_RED)) > 0);
        assert!(display.count(Rgb888::WHITE) > 0);
    }

    #[test]
    fn measurer_matches_drawn_advance() {
        let style = ResolvedTextStyle::new(TextRole::Statement, 8);
        let measured = EgTextMeasurer::new().measure_text_px("H225", &style);
        let mut display = PixelCaptureDisplay::with_size(64, 16);
        let advance = MonoFontBackend
            .draw_text_run(&mut display, &style, Rgb888::BLACK, "H225", Point::zero())
            .expect("capture display draw should pass");
        assert_eq!(measured, advance as f32);
    }

    #[test]
    fn font_buckets_grow_with_size() {
        let widths: Vec<i32> = [6, 8, 10, 13, 14, 16, 18, 24]
            .iter()
            .map(|size| {
                MonoFontBackend
                    .metrics(&ResolvedTextStyle::new(TextRole::Title, *size))
                    .line_height
            })
            .collect();
        assert!(widths.windows(2).all(|pair| pair[0] <= pair[1]), "{widths:?}");
    }

    #[test]
    fn chrome_layer_is_hidden_unless_enabled() {
        let mut page = LabelPage::new(8, 8);
        page.push_chrome_command(DrawCommand::Rect(RectCommand {
            x: 0,
            y: 0,
            width: 8,
            height: 8,
            fill: Some(Rgb::SELECTION),
            stroke: None,
            stroke_width: 0,
            background: false,
        }));
        let mut hidden = PixelCaptureDisplay::with_size(8, 8);
        no_clear(true)
            .render_page(&page, &mut hidden)
            .expect("capture display draw should pass");
        assert!(hidden.pixels.is_empty());

        let mut shown = PixelCaptureDisplay::with_size(8, 8);
        EgRenderer::new(EgRenderConfig {
            clear_first: false,
            exact_colors: true,
            show_chrome: true,
        })
        .render_page(&page, &mut shown)
        .expect("capture display draw should pass");
        assert_eq!(shown.count(to_rgb888(Rgb::SELECTION)), 64);
    }
}
