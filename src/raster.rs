//! Captured label pixels.

use crate::error::LabelError;

/// RGBA8 pixels of a captured label, row-major, 4 bytes per pixel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterBuffer {
    width: u32,
    height: u32,
    scale: u32,
    pixels: Vec<u8>,
}

impl RasterBuffer {
    /// Wraps raw RGBA bytes. `pixels.len()` must equal `width * height * 4`.
    pub fn from_rgba(
        width: u32,
        height: u32,
        scale: u32,
        pixels: Vec<u8>,
    ) -> Result<Self, LabelError> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4));
        if expected != Some(pixels.len()) {
            return Err(LabelError::dimensions("raster-buffer", width, height));
        }
        Ok(Self {
            width,
            height,
            scale: scale.max(1),
            pixels,
        })
    }

    /// Buffer of one solid colour.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let count = width as usize * height as usize;
        let mut pixels = Vec::with_capacity(count * 4);
        for _ in 0..count {
            pixels.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            scale: 1,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Supersampling factor the buffer was captured at.
    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn as_rgba(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_rgba(self) -> Vec<u8> {
        self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.pixels.get(offset..offset + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Overwrites one pixel. Out-of-range coordinates are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        if let Some(px) = self.pixels.get_mut(offset..offset + 4) {
            px.copy_from_slice(&rgba);
        }
    }

    /// Copy rotated a quarter turn clockwise.
    pub fn rotated_cw(&self) -> Self {
        let (w, h) = (self.width, self.height);
        let mut out = Self {
            width: h,
            height: w,
            scale: self.scale,
            pixels: vec![0; self.pixels.len()],
        };
        for y in 0..h {
            for x in 0..w {
                if let Some(px) = self.pixel(x, y) {
                    out.set_pixel(h - 1 - y, x, px);
                }
            }
        }
        out
    }

    /// RGB bytes with alpha composited over white, as PDF image streams expect.
    pub fn to_rgb_over_white(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() / 4 * 3);
        for px in self.pixels.chunks_exact(4) {
            let alpha = u32::from(px[3]);
            for channel in &px[..3] {
                let c = u32::from(*channel);
                out.push(((c * alpha + 255 * (255 - alpha) + 127) / 255) as u8);
            }
        }
        out
    }
}
