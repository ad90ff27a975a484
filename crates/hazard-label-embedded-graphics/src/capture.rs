//! Supersampled capture of on-screen label surfaces.

use core::ops::Deref;

use embedded_graphics::{pixelcolor::Rgb888, prelude::*};
use hazard_label::{LabelError, RasterBuffer};
use hazard_label_render::LabelPage;
use image::{
    codecs::png::PngEncoder, imageops::FilterType, ExtendedColorType, ImageEncoder, RgbaImage,
};

use crate::{EgRenderConfig, EgRenderer, MonoFontBackend, RgbaCanvas, ScaledTarget};

/// Presentation style of a label surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceStyle {
    pub exact_colors: bool,
    pub show_chrome: bool,
}

impl SurfaceStyle {
    /// Style forced for the duration of a capture: exact fills, no chrome.
    pub const fn capture() -> Self {
        Self {
            exact_colors: true,
            show_chrome: false,
        }
    }
}

impl Default for SurfaceStyle {
    /// On-screen editing style.
    fn default() -> Self {
        Self {
            exact_colors: false,
            show_chrome: true,
        }
    }
}

/// A composed label as shown in the editor.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelSurface {
    id: String,
    page: LabelPage,
    style: SurfaceStyle,
}

impl LabelSurface {
    pub fn new(id: impl Into<String>, page: LabelPage) -> Self {
        Self {
            id: id.into(),
            page,
            style: SurfaceStyle::default(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn page(&self) -> &LabelPage {
        &self.page
    }

    pub fn set_page(&mut self, page: LabelPage) {
        self.page = page;
    }

    pub fn style(&self) -> SurfaceStyle {
        self.style
    }

    pub fn set_style(&mut self, style: SurfaceStyle) {
        self.style = style;
    }

    /// Draws the surface with its current style.
    pub fn render_to<D>(
        &self,
        renderer: &EgRenderer<MonoFontBackend>,
        display: &mut D,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        let mut renderer = renderer.clone();
        renderer.set_config(EgRenderConfig {
            clear_first: true,
            exact_colors: self.style.exact_colors,
            show_chrome: self.style.show_chrome,
        });
        renderer.render_page(&self.page, display)
    }
}

/// Applies the capture style to a surface and restores the previous style on
/// drop, including when the capture unwinds.
#[derive(Debug)]
pub struct StyleOverrideGuard<'a> {
    surface: &'a mut LabelSurface,
    saved: SurfaceStyle,
}

impl<'a> StyleOverrideGuard<'a> {
    pub fn apply(surface: &'a mut LabelSurface) -> Self {
        let saved = surface.style;
        surface.style = SurfaceStyle::capture();
        Self { surface, saved }
    }

    pub fn saved_style(&self) -> SurfaceStyle {
        self.saved
    }
}

impl Deref for StyleOverrideGuard<'_> {
    type Target = LabelSurface;

    fn deref(&self) -> &Self::Target {
        self.surface
    }
}

impl Drop for StyleOverrideGuard<'_> {
    fn drop(&mut self) {
        self.surface.style = self.saved;
    }
}

/// Surfaces addressable by id.
#[derive(Clone, Debug, Default)]
pub struct LabelBoard {
    surfaces: Vec<LabelSurface>,
}

impl LabelBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a surface, replacing one with the same id.
    pub fn insert(&mut self, surface: LabelSurface) {
        match self.surfaces.iter_mut().find(|s| s.id == surface.id) {
            Some(slot) => *slot = surface,
            None => self.surfaces.push(surface),
        }
    }

    pub fn surface(&self, id: &str) -> Option<&LabelSurface> {
        self.surfaces.iter().find(|s| s.id == id)
    }

    pub fn surface_mut(&mut self, id: &str) -> Option<&mut LabelSurface> {
        self.surfaces.iter_mut().find(|s| s.id == id)
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}

/// Rasterizes label surfaces at an integer supersampling factor.
#[derive(Clone, Debug, Default)]
pub struct RasterCapturer {
    renderer: EgRenderer<MonoFontBackend>,
}

impl RasterCapturer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures `surface` at `scale` device pixels per logical pixel.
    ///
    /// The surface shows the capture style while drawing and gets its prior
    /// style back whether or not the capture succeeds.
    pub fn capture(
        &self,
        surface: &mut LabelSurface,
        scale: u32,
    ) -> Result<RasterBuffer, LabelError> {
        let guard = StyleOverrideGuard::apply(surface);
        let (width, height) = (guard.page.width, guard.page.height);
        if scale == 0 || width == 0 || height == 0 {
            return Err(LabelError::InvalidDimensions {
                stage: "capture",
                width,
                height,
            });
        }
        let (Some(out_w), Some(out_h)) = (width.checked_mul(scale), height.checked_mul(scale))
        else {
            return Err(LabelError::InvalidDimensions {
                stage: "capture",
                width,
                height,
            });
        };

        let mut canvas = RgbaCanvas::new(out_w, out_h);
        match guard.render_to(&self.renderer, &mut ScaledTarget::new(&mut canvas, scale)) {
            Ok(()) => {}
            Err(never) => match never {},
        }
        log::debug!(
            "captured surface '{}' at {}x ({}x{} px)",
            guard.id(),
            scale,
            out_w,
            out_h
        );
        RasterBuffer::from_rgba(out_w, out_h, scale, canvas.into_rgba())
    }

    /// Captures the surface registered under `id`.
    pub fn capture_element(
        &self,
        board: &mut LabelBoard,
        id: &str,
        scale: u32,
    ) -> Result<RasterBuffer, LabelError> {
        let surface = board
            .surface_mut(id)
            .ok_or_else(|| LabelError::ElementNotFound { id: id.to_string() })?;
        self.capture(surface, scale)
    }
}

/// Resizes `raster` to exactly `width x height` with bilinear filtering.
pub fn resample(
    raster: &RasterBuffer,
    width: u32,
    height: u32,
) -> Result<RasterBuffer, LabelError> {
    if raster.is_empty() || width == 0 || height == 0 {
        return Err(LabelError::InvalidDimensions {
            stage: "resample",
            width,
            height,
        });
    }
    if raster.width() == width && raster.height() == height {
        return Ok(raster.clone());
    }
    let source = RgbaImage::from_raw(raster.width(), raster.height(), raster.as_rgba().to_vec())
        .ok_or(LabelError::InvalidDimensions {
            stage: "resample",
            width: raster.width(),
            height: raster.height(),
        })?;
    let resized = image::imageops::resize(&source, width, height, FilterType::Triangle);
    RasterBuffer::from_rgba(width, height, 1, resized.into_raw())
}

/// Encodes `raster` as an RGBA PNG.
pub fn encode_png(raster: &RasterBuffer) -> Result<Vec<u8>, LabelError> {
    if raster.is_empty() {
        return Err(LabelError::InvalidDimensions {
            stage: "png-encode",
            width: raster.width(),
            height: raster.height(),
        });
    }
    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(
            raster.as_rgba(),
            raster.width(),
            raster.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|err| LabelError::Io {
            context: "png-encode",
            message: err.to_string(),
        })?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hazard_label_render::{DrawCommand, RectCommand, Rgb};
    use std::panic::{catch_unwind, AssertUnwindSafe};

    const BLUE: Rgb = Rgb {
        r: 0x1f,
        g: 0x5f,
        b: 0xbf,
    };

    fn surface(width: u32, height: u32) -> LabelSurface {
        let mut page = LabelPage::new(width, height);
        page.push_content_command(DrawCommand::Rect(RectCommand {
            x: 0,
            y: 0,
            width,
            height,
            fill: Some(BLUE),
            stroke: None,
            stroke_width: 0,
            background: true,
        }));
        page.push_chrome_command(DrawCommand::Rect(RectCommand {
            x: 0,
            y: 0,
            width: 1,
            height: 1,
            fill: Some(Rgb::SELECTION),
            stroke: None,
            stroke_width: 0,
            background: false,
        }));
        LabelSurface::new("label-1", page)
    }

    #[test]
    fn capture_scales_dimensions_and_restores_style() {
        let mut surface = surface(6, 4);
        let before = surface.style();
        let raster = RasterCapturer::new()
            .capture(&mut surface, 3)
            .expect("capture should pass");
        assert_eq!((raster.width(), raster.height(), raster.scale()), (18, 12, 3));
        assert_eq!(surface.style(), before);
    }

    #[test]
    fn capture_uses_exact_colours_without_chrome() {
        let mut surface = surface(4, 4);
        let raster = RasterCapturer::new()
            .capture(&mut surface, 2)
            .expect("capture should pass");
        let blue = [BLUE.r, BLUE.g, BLUE.b, 255];
        assert_eq!(raster.pixel(0, 0), Some(blue));
        assert_eq!(raster.pixel(7, 7), Some(blue));
    }

    #[test]
    fn failed_capture_restores_style() {
        let mut surface = surface(4, 4);
        surface.set_style(SurfaceStyle {
            exact_colors: false,
            show_chrome: true,
        });
        let err = RasterCapturer::new()
            .capture(&mut surface, 0)
            .expect_err("zero scale should fail");
        assert_eq!(err.kind(), "invalid-dimensions");
        assert_eq!(surface.style(), SurfaceStyle::default());
    }

    #[test]
    fn guard_restores_style_on_unwind() {
        let mut surface = surface(4, 4);
        let result = catch_unwind(AssertUnwindSafe(|| {
            let guard = StyleOverrideGuard::apply(&mut surface);
            assert_eq!(guard.style(), SurfaceStyle::capture());
            panic!("capture interrupted");
        }));
        assert!(result.is_err());
        assert_eq!(surface.style(), SurfaceStyle::default());
    }

    #[test]
    fn missing_element_is_reported() {
        let mut board = LabelBoard::new();
        board.insert(surface(4, 4));
        let err = RasterCapturer::new()
            .capture_element(&mut board, "label-2", 2)
            .expect_err("unknown id should fail");
        assert_eq!(
            err,
            LabelError::ElementNotFound {
                id: "label-2".to_string()
            }
        );
        assert!(RasterCapturer::new()
            .capture_element(&mut board, "label-1", 2)
            .is_ok());
    }

    #[test]
    fn resample_hits_exact_target_size() {
        let raster = RasterBuffer::filled(9, 6, [0, 0, 0, 255]);
        let resized = resample(&raster, 4, 3).expect("resample should pass");
        assert_eq!((resized.width(), resized.height()), (4, 3));
        assert_eq!(resized.pixel(1, 1), Some([0, 0, 0, 255]));
        assert!(resample(&raster, 0, 3).is_err());
    }

    #[test]
    fn png_has_signature() {
        let raster = RasterBuffer::filled(3, 2, [255, 0, 0, 255]);
        let png = encode_png(&raster).expect("png encode should pass");
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        assert!(encode_png(&RasterBuffer::filled(0, 2, [0; 4])).is_err());
    }
}
