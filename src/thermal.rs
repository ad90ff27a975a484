//! ZPL command stream assembly for direct thermal label printers.

use core::fmt::Write as _;

use crate::error::LabelError;
use crate::monochrome::EncodedBitmap;
use crate::units::{to_dots, PhysicalSize};

/// Highest darkness the printer accepts.
pub const MAX_DARKNESS: u8 = 30;

/// Label feed orientation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Media handling mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum MediaMode {
    #[default]
    DirectThermal,
    ThermalTransfer,
}

/// Thermal job settings. Built per print action and consumed once.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ThermalPrint {
    pub printer_model: String,
    pub dpi: u32,
    /// Burn darkness, `0..=30`.
    pub darkness: u8,
    /// Print speed in inches per second.
    pub speed_ips: u8,
    /// Gap between labels on the roll.
    pub gap_inches: f64,
    pub orientation: Orientation,
    pub copies: u32,
    pub media: MediaMode,
    /// Luminance threshold for monochrome conversion.
    pub threshold: u8,
    /// Printed label size. `None` derives it from the canvas at screen resolution.
    pub label_size: Option<PhysicalSize>,
}

impl Default for ThermalPrint {
    fn default() -> Self {
        Self {
            printer_model: "ZD421".to_string(),
            dpi: 203,
            darkness: 15,
            speed_ips: 4,
            gap_inches: 0.12,
            orientation: Orientation::Portrait,
            copies: 1,
            media: MediaMode::DirectThermal,
            threshold: crate::monochrome::DEFAULT_THRESHOLD,
            label_size: None,
        }
    }
}

impl ThermalPrint {
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    pub fn with_darkness(mut self, darkness: u8) -> Self {
        self.darkness = darkness;
        self
    }

    pub fn with_speed_ips(mut self, speed_ips: u8) -> Self {
        self.speed_ips = speed_ips;
        self
    }

    pub fn with_gap_inches(mut self, gap_inches: f64) -> Self {
        self.gap_inches = gap_inches;
        self
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_copies(mut self, copies: u32) -> Self {
        self.copies = copies;
        self
    }

    pub fn with_media(mut self, media: MediaMode) -> Self {
        self.media = media;
        self
    }

    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_label_size(mut self, label_size: PhysicalSize) -> Self {
        self.label_size = Some(label_size);
        self
    }

    pub fn validate(&self) -> Result<(), LabelError> {
        let reject = |field: &'static str, reason: String| {
            Err(LabelError::InvalidConfig { field, reason })
        };
        if self.dpi == 0 {
            return reject("dpi", "must be positive".to_string());
        }
        if self.darkness > MAX_DARKNESS {
            return reject(
                "darkness",
                format!("{} is outside 0..={}", self.darkness, MAX_DARKNESS),
            );
        }
        if self.speed_ips == 0 {
            return reject("speed_ips", "must be positive".to_string());
        }
        if self.copies == 0 {
            return reject("copies", "must be at least 1".to_string());
        }
        if !self.gap_inches.is_finite() || self.gap_inches < 0.0 {
            return reject(
                "gap_inches",
                format!("{} must be zero or more", self.gap_inches),
            );
        }
        if self.label_size.is_some_and(|size| !size.is_positive()) {
            return reject("label_size", "width and height must be positive".to_string());
        }
        Ok(())
    }
}

/// Role of one command segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SegmentKind {
    StartMarker,
    LabelOriginReset,
    LabelWidth,
    LabelLength,
    PrintOrientation,
    Darkness,
    PrintSpeed,
    Quantity,
    MediaMode,
    GapSensing,
    BitmapField,
    BitmapData,
    EndMarker,
}

impl SegmentKind {
    /// Emission order of a complete script.
    pub const ORDER: [SegmentKind; 13] = [
        SegmentKind::StartMarker,
        SegmentKind::LabelOriginReset,
        SegmentKind::LabelWidth,
        SegmentKind::LabelLength,
        SegmentKind::PrintOrientation,
        SegmentKind::Darkness,
        SegmentKind::PrintSpeed,
        SegmentKind::Quantity,
        SegmentKind::MediaMode,
        SegmentKind::GapSensing,
        SegmentKind::BitmapField,
        SegmentKind::BitmapData,
        SegmentKind::EndMarker,
    ];
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandSegment {
    pub kind: SegmentKind,
    pub text: String,
}

/// Ordered command stream ready for the printer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandScript {
    segments: Vec<CommandSegment>,
}

impl CommandScript {
    fn push(&mut self, kind: SegmentKind, text: impl Into<String>) {
        self.segments.push(CommandSegment {
            kind,
            text: text.into(),
        });
    }

    pub fn segments(&self) -> &[CommandSegment] {
        &self.segments
    }

    pub fn kinds(&self) -> Vec<SegmentKind> {
        self.segments.iter().map(|s| s.kind).collect()
    }

    pub fn segment(&self, kind: SegmentKind) -> Option<&CommandSegment> {
        self.segments.iter().find(|s| s.kind == kind)
    }

    /// Script text, one segment per line.
    pub fn to_text(&self) -> String {
        let len = self.segments.iter().map(|s| s.text.len() + 1).sum();
        let mut out = String::with_capacity(len);
        for (index, segment) in self.segments.iter().enumerate() {
            if index > 0 {
                out.push('\n');
            }
            out.push_str(&segment.text);
        }
        out
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.to_text().into_bytes()
    }
}

fn hex_lower(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{:02x}", byte);
    }
    out
}

/// Builds the printer script for `bitmap`, which must already be sized to
/// `width_dots x height_dots`.
pub fn assemble(
    bitmap: &EncodedBitmap,
    config: &ThermalPrint,
    width_dots: u32,
    height_dots: u32,
) -> Result<CommandScript, LabelError> {
    if width_dots == 0 || height_dots == 0 {
        return Err(LabelError::dimensions(
            "thermal-assemble",
            width_dots,
            height_dots,
        ));
    }
    if bitmap.width() != width_dots || bitmap.height() != height_dots {
        return Err(LabelError::dimensions(
            "thermal-assemble",
            bitmap.width(),
            bitmap.height(),
        ));
    }
    config.validate()?;

    let gap_dots = to_dots(config.gap_inches, config.dpi)?;
    let total_bytes = bitmap.bytes().len();
    let mut script = CommandScript::default();
    script.push(SegmentKind::StartMarker, "^XA");
    script.push(SegmentKind::LabelOriginReset, "^LH0,0");
    script.push(SegmentKind::LabelWidth, format!("^PW{}", width_dots));
    script.push(SegmentKind::LabelLength, format!("^LL{}", height_dots));
    script.push(
        SegmentKind::PrintOrientation,
        match config.orientation {
            Orientation::Portrait => "^FWN",
            Orientation::Landscape => "^FWR",
        },
    );
    script.push(SegmentKind::Darkness, format!("~SD{:02}", config.darkness));
    script.push(SegmentKind::PrintSpeed, format!("^PR{}", config.speed_ips));
    script.push(SegmentKind::Quantity, format!("^PQ{}", config.copies));
    script.push(
        SegmentKind::MediaMode,
        match config.media {
            MediaMode::DirectThermal => "^MTD",
            MediaMode::ThermalTransfer => "^MTT",
        },
    );
    script.push(SegmentKind::GapSensing, format!("^MNY,{}", gap_dots));
    script.push(
        SegmentKind::BitmapField,
        format!(
            "^FO0,0^GFA,{},{},{},",
            total_bytes,
            total_bytes,
            bitmap.bytes_per_row()
        ),
    );
    script.push(SegmentKind::BitmapData, hex_lower(bitmap.bytes()));
    script.push(SegmentKind::EndMarker, "^FS^XZ");

    log::debug!(
        "assembled {} segment script for {}x{} dots ({} bitmap bytes)",
        script.segments.len(),
        width_dots,
        height_dots,
        total_bytes
    );
    Ok(script)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monochrome::encode;
    use crate::raster::RasterBuffer;

    fn bitmap(width: u32, height: u32) -> EncodedBitmap {
        let mut raster = RasterBuffer::filled(width, height, [255, 255, 255, 255]);
        raster.set_pixel(0, 0, [0, 0, 0, 255]);
        encode(&raster, 140).expect("non-empty raster")
    }

    #[test]
    fn segments_follow_the_fixed_order() {
        let script = assemble(&bitmap(16, 2), &ThermalPrint::default(), 16, 2)
            .expect("bitmap matches dots");
        assert_eq!(script.kinds(), SegmentKind::ORDER);
    }

    #[test]
    fn geometry_and_settings_are_encoded() {
        let config = ThermalPrint::default()
            .with_darkness(7)
            .with_speed_ips(3)
            .with_copies(5)
            .with_gap_inches(0.12)
            .with_orientation(Orientation::Landscape)
            .with_media(MediaMode::ThermalTransfer);
        let script = assemble(&bitmap(16, 2), &config, 16, 2).expect("bitmap matches dots");
        let text_of = |kind| {
            script
                .segment(kind)
                .map(|s| s.text.clone())
                .unwrap_or_default()
        };
        assert_eq!(text_of(SegmentKind::LabelWidth), "^PW16");
        assert_eq!(text_of(SegmentKind::LabelLength), "^LL2");
        assert_eq!(text_of(SegmentKind::PrintOrientation), "^FWR");
        assert_eq!(text_of(SegmentKind::Darkness), "~SD07");
        assert_eq!(text_of(SegmentKind::PrintSpeed), "^PR3");
        assert_eq!(text_of(SegmentKind::Quantity), "^PQ5");
        assert_eq!(text_of(SegmentKind::MediaMode), "^MTT");
        assert_eq!(text_of(SegmentKind::GapSensing), "^MNY,24");
        assert_eq!(text_of(SegmentKind::BitmapField), "^FO0,0^GFA,4,4,2,");
        assert_eq!(text_of(SegmentKind::BitmapData), "80000000");
    }

    #[test]
    fn script_text_starts_and_ends_with_markers() {
        let script = assemble(&bitmap(8, 1), &ThermalPrint::default(), 8, 1)
            .expect("bitmap matches dots");
        let text = script.to_text();
        assert!(text.starts_with("^XA\n^LH0,0\n"));
        assert!(text.ends_with("\n80\n^FS^XZ"));
    }

    #[test]
    fn mismatched_bitmap_is_rejected() {
        let err = assemble(&bitmap(8, 1), &ThermalPrint::default(), 16, 1)
            .expect_err("bitmap narrower than label");
        assert!(matches!(
            err,
            LabelError::InvalidDimensions {
                stage: "thermal-assemble",
                ..
            }
        ));
        assert!(assemble(&bitmap(8, 1), &ThermalPrint::default(), 0, 1).is_err());
    }

    #[test]
    fn out_of_range_settings_are_rejected() {
        let cases = [
            ThermalPrint::default().with_darkness(31),
            ThermalPrint::default().with_copies(0),
            ThermalPrint::default().with_dpi(0),
            ThermalPrint::default().with_speed_ips(0),
            ThermalPrint::default().with_gap_inches(-1.0),
            ThermalPrint::default().with_label_size(PhysicalSize::new(0.0, 2.0)),
        ];
        for config in cases {
            assert!(
                matches!(config.validate(), Err(LabelError::InvalidConfig { .. })),
                "{config:?}"
            );
        }
        assert!(ThermalPrint::default().with_darkness(30).validate().is_ok());
    }
}
