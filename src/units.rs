//! Pixel, inch and printer-dot conversions.

use crate::error::LabelError;

/// Resolution of on-screen canvas pixels.
pub const SCREEN_DPI: u32 = 96;
/// Millimetres per inch.
pub const MM_PER_INCH: f64 = 25.4;

/// Physical extent in inches.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhysicalSize {
    pub width_in: f64,
    pub height_in: f64,
}

impl PhysicalSize {
    pub const fn new(width_in: f64, height_in: f64) -> Self {
        Self {
            width_in,
            height_in,
        }
    }

    pub fn from_mm(width_mm: f64, height_mm: f64) -> Self {
        Self::new(width_mm / MM_PER_INCH, height_mm / MM_PER_INCH)
    }

    /// Physical size of a `width x height` pixel canvas at `dpi`.
    pub fn from_pixels(width: u32, height: u32, dpi: u32) -> Result<Self, LabelError> {
        Ok(Self::new(to_physical(width, dpi)?, to_physical(height, dpi)?))
    }

    pub fn is_positive(&self) -> bool {
        self.width_in > 0.0 && self.height_in > 0.0
    }

    /// Same extent rotated a quarter turn.
    pub fn rotated(self) -> Self {
        Self::new(self.height_in, self.width_in)
    }
}

/// Sheet paper presets.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum PaperSize {
    Letter,
    Legal,
    A4,
    Custom(PhysicalSize),
}

impl PaperSize {
    pub fn size(self) -> PhysicalSize {
        match self {
            Self::Letter => PhysicalSize::new(8.5, 11.0),
            Self::Legal => PhysicalSize::new(8.5, 14.0),
            Self::A4 => PhysicalSize::from_mm(210.0, 297.0),
            Self::Custom(size) => size,
        }
    }

    /// Parses `letter`, `legal`, `a4` or `<w>x<h>` in inches.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "letter" => Some(Self::Letter),
            "legal" => Some(Self::Legal),
            "a4" => Some(Self::A4),
            other => {
                let (w, h) = other.split_once('x')?;
                let size = PhysicalSize::new(w.trim().parse().ok()?, h.trim().parse().ok()?);
                size.is_positive().then_some(Self::Custom(size))
            }
        }
    }
}

impl Default for PaperSize {
    fn default() -> Self {
        Self::Letter
    }
}

fn check_dpi(dpi: u32) -> Result<(), LabelError> {
    if dpi == 0 {
        return Err(LabelError::dimensions("resolution", 0, 0));
    }
    Ok(())
}

/// Converts a pixel count into inches at `dpi`.
pub fn to_physical(pixels: u32, dpi: u32) -> Result<f64, LabelError> {
    check_dpi(dpi)?;
    Ok(f64::from(pixels) / f64::from(dpi))
}

/// Converts inches into device dots at `dpi`, rounding half up.
pub fn to_dots(inches: f64, dpi: u32) -> Result<u32, LabelError> {
    check_dpi(dpi)?;
    if !inches.is_finite() || inches < 0.0 {
        return Err(LabelError::dimensions("resolution", 0, dpi));
    }
    let dots = (inches * f64::from(dpi) + 0.5).floor();
    Ok(dots.min(f64::from(u32::MAX)) as u32)
}

/// Smallest integer capture scale whose pixels cover `target_dots`.
///
/// Capturing at this scale and downsampling keeps device output sharp without
/// rendering far more pixels than the printer can place.
pub fn scale_for_dpi(canvas_pixels: u32, target_dots: u32) -> u32 {
    if canvas_pixels == 0 {
        return 1;
    }
    target_dots.div_ceil(canvas_pixels).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_round_trip_is_exact_across_common_resolutions() {
        for dpi in [72, 96, 150, 203, 300, 600] {
            for pixels in [0u32, 1, 7, 96, 191, 192, 288, 1000, 4095] {
                let inches = to_physical(pixels, dpi).expect("dpi is positive");
                let back = to_dots(inches, dpi).expect("inches are finite");
                assert_eq!(back, pixels, "dpi={dpi} pixels={pixels}");
            }
        }
    }

    #[test]
    fn dots_round_half_up() {
        assert_eq!(to_dots(0.5, 3).expect("valid"), 2);
        assert_eq!(to_dots(0.25, 2).expect("valid"), 1);
        assert_eq!(to_dots(2.0, 203).expect("valid"), 406);
        assert_eq!(to_dots(1.33, 203).expect("valid"), 270);
        assert_eq!(to_dots(0.12, 203).expect("valid"), 24);
    }

    #[test]
    fn zero_dpi_is_rejected() {
        assert!(matches!(
            to_physical(10, 0),
            Err(LabelError::InvalidDimensions {
                stage: "resolution",
                ..
            })
        ));
        assert!(to_dots(1.0, 0).is_err());
    }

    #[test]
    fn paper_presets_parse() {
        assert_eq!(PaperSize::parse("Letter"), Some(PaperSize::Letter));
        assert_eq!(PaperSize::parse("a4"), Some(PaperSize::A4));
        assert_eq!(
            PaperSize::parse("4x6"),
            Some(PaperSize::Custom(PhysicalSize::new(4.0, 6.0)))
        );
        assert_eq!(PaperSize::parse("0x6"), None);
        assert_eq!(PaperSize::parse("tabloid"), None);
    }

    #[test]
    fn capture_scale_covers_printer_dots() {
        // 3in at 96 dpi printed at 203 dpi needs 609 dots.
        assert_eq!(scale_for_dpi(288, 609), 3);
        assert_eq!(scale_for_dpi(288, 288), 1);
        assert_eq!(scale_for_dpi(288, 10), 1);
        assert_eq!(scale_for_dpi(0, 10), 1);
    }
}
