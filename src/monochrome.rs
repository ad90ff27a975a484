//! Threshold conversion of RGBA captures into packed 1-bit bitmaps.

use crate::error::LabelError;
use crate::raster::RasterBuffer;

/// Luminance cut-off used when no other threshold is configured.
pub const DEFAULT_THRESHOLD: u8 = 140;

/// Packed 1-bit bitmap. Bit value 1 means print (black).
///
/// Bits are stored most significant first, rows are row-major and each row
/// is padded on the right to a whole byte.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedBitmap {
    width: u32,
    height: u32,
    bytes: Vec<u8>,
}

impl EncodedBitmap {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bytes_per_row(&self) -> usize {
        bytes_per_row(self.width)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Whether pixel `(x, y)` prints black.
    pub fn is_black(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let index = y as usize * self.bytes_per_row() + (x / 8) as usize;
        self.bytes
            .get(index)
            .is_some_and(|byte| byte & (0x80 >> (x % 8)) != 0)
    }

    /// Count of black pixels.
    pub fn black_pixels(&self) -> usize {
        self.bytes.iter().map(|b| b.count_ones() as usize).sum()
    }
}

fn bytes_per_row(width: u32) -> usize {
    width.div_ceil(8) as usize
}

/// Luminance in hundredths: `30R + 59G + 11B`.
///
/// Integer weights keep the threshold comparison exact.
pub fn luminance_centi(r: u8, g: u8, b: u8) -> u32 {
    30 * u32::from(r) + 59 * u32::from(g) + 11 * u32::from(b)
}

/// Threshold encoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonochromeEncoder {
    threshold: u8,
}

impl Default for MonochromeEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl MonochromeEncoder {
    pub fn new(threshold: u8) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Packs `raster`. A pixel is black when its luminance is strictly below
    /// the threshold. Alpha is ignored.
    pub fn encode(&self, raster: &RasterBuffer) -> Result<EncodedBitmap, LabelError> {
        let (width, height) = (raster.width(), raster.height());
        if raster.is_empty() {
            return Err(LabelError::dimensions("monochrome-encode", width, height));
        }
        let row_bytes = bytes_per_row(width);
        let cutoff = u32::from(self.threshold) * 100;
        let mut bytes = vec![0u8; row_bytes * height as usize];
        let rgba = raster.as_rgba();

        for (y, row) in rgba.chunks_exact(width as usize * 4).enumerate() {
            let out = &mut bytes[y * row_bytes..(y + 1) * row_bytes];
            for (x, px) in row.chunks_exact(4).enumerate() {
                if luminance_centi(px[0], px[1], px[2]) < cutoff {
                    out[x / 8] |= 0x80 >> (x % 8);
                }
            }
        }

        Ok(EncodedBitmap {
            width,
            height,
            bytes,
        })
    }
}

/// Encodes `raster` with `threshold`.
pub fn encode(raster: &RasterBuffer, threshold: u8) -> Result<EncodedBitmap, LabelError> {
    MonochromeEncoder::new(threshold).encode(raster)
}
