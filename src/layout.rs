//! Proportional label layout.
//!
//! Every length is derived from the canvas size through a single uniform
//! scale factor measured against a reference canvas, so the same label looks
//! identical at preview, PDF and printer resolutions.

use crate::label::{CanvasSize, LabelSpec, RatingCategory};
use crate::pictogram::{resolve, Pictogram};

/// Font sizes in pixels for each text role.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FontSizes {
    pub title: u32,
    pub subtitle: u32,
    pub rating_value: u32,
    pub rating_caption: u32,
    pub statement: u32,
    pub footer: u32,
}

impl FontSizes {
    fn map(self, mut f: impl FnMut(u32) -> u32) -> Self {
        Self {
            title: f(self.title),
            subtitle: f(self.subtitle),
            rating_value: f(self.rating_value),
            rating_caption: f(self.rating_caption),
            statement: f(self.statement),
            footer: f(self.footer),
        }
    }
}

/// Layout tuning. Defaults describe the 3in x 2in reference label at 96 dpi.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutConfig {
    /// Canvas that `reference_fonts` and other reference lengths were designed for.
    pub reference_canvas: CanvasSize,
    /// Font sizes at the reference canvas.
    pub reference_fonts: FontSizes,
    /// Fonts never shrink below this size.
    pub min_font_px: u32,
    /// Header share of the canvas height, in percent.
    pub header_percent: u32,
    /// Rating strip share of the canvas height, in percent.
    pub rating_percent: u32,
    /// Info section share of the canvas height, in percent.
    pub info_percent: u32,
    /// Footer height at the reference canvas.
    pub reference_footer_px: u32,
    /// Footer never shrinks below this height unless the canvas runs out.
    pub min_footer_px: u32,
    /// Inner padding at the reference canvas.
    pub reference_padding_px: u32,
    /// Hazard statements shown; extras are dropped.
    pub max_statements: usize,
    /// Pictograms shown; extras are dropped.
    pub max_pictograms: usize,
    /// Share of the info width given to hazard statements, in percent.
    pub statement_column_percent: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            reference_canvas: CanvasSize::new(288, 192),
            reference_fonts: FontSizes {
                title: 16,
                subtitle: 9,
                rating_value: 18,
                rating_caption: 7,
                statement: 8,
                footer: 7,
            },
            min_font_px: 6,
            header_percent: 15,
            rating_percent: 12,
            info_percent: 48,
            reference_footer_px: 24,
            min_footer_px: 8,
            reference_padding_px: 6,
            max_statements: 3,
            max_pictograms: 4,
            statement_column_percent: 60,
        }
    }
}

impl LayoutConfig {
    pub fn with_min_font_px(mut self, min_font_px: u32) -> Self {
        self.min_font_px = min_font_px;
        self
    }

    pub fn with_reference_canvas(mut self, canvas: CanvasSize) -> Self {
        self.reference_canvas = canvas;
        self
    }
}

/// Horizontal band of the label.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Zone {
    pub top: u32,
    pub height: u32,
}

impl Zone {
    pub fn bottom(&self) -> u32 {
        self.top.saturating_add(self.height)
    }
}

/// Axis-aligned rectangle in canvas pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.x.saturating_add(clamp_i32(self.width))
    }

    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(clamp_i32(self.height))
    }
}

/// One box of the HMIS rating strip.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RatingBox {
    pub category: RatingCategory,
    pub rect: PixelRect,
    /// Literal value shown in the box.
    pub value: String,
}

/// Derived geometry for one label. Recomputed whenever size or content changes.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutGeometry {
    pub canvas: CanvasSize,
    pub scale: f32,
    pub padding: u32,
    pub header: Zone,
    pub rating: Zone,
    pub info: Zone,
    pub footer: Zone,
    pub fonts: FontSizes,
    /// Always four boxes, Health, Flammability, Physical, Special.
    pub rating_boxes: Vec<RatingBox>,
    /// Hazard statements after truncation.
    pub statements: Vec<String>,
    pub statement_column: PixelRect,
    /// Resolved pictograms after truncation.
    pub pictograms: Vec<Pictogram>,
    /// One slot per entry of `pictograms`.
    pub pictogram_slots: Vec<PixelRect>,
}

impl LayoutGeometry {
    /// Sum of all zone heights.
    pub fn zone_total(&self) -> u32 {
        self.header.height + self.rating.height + self.info.height + self.footer.height
    }
}

/// Deterministic label layout.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LayoutEngine {
    cfg: LayoutConfig,
}

impl LayoutEngine {
    pub fn new(cfg: LayoutConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.cfg
    }

    /// Uniform scale of `canvas` relative to the reference canvas.
    pub fn scale_for(&self, canvas: CanvasSize) -> f32 {
        let reference = self.cfg.reference_canvas;
        let sx = canvas.width as f32 / reference.width.max(1) as f32;
        let sy = canvas.height as f32 / reference.height.max(1) as f32;
        sx.min(sy)
    }

    /// Computes the geometry for `spec`. Never fails; degenerate canvases
    /// produce empty zones.
    pub fn layout(&self, spec: &LabelSpec) -> LayoutGeometry {
        let cfg = &self.cfg;
        let canvas = spec.canvas;
        let scale = self.scale_for(canvas);
        let scaled = |reference: u32| (reference as f32 * scale).floor() as u32;

        let fonts = cfg
            .reference_fonts
            .map(|reference| scaled(reference).max(cfg.min_font_px));
        let padding = scaled(cfg.reference_padding_px).max(1);

        let h = canvas.height;
        // Each zone takes its share but never more than what is left below it.
        let stacked = |top: u32, percent: u32| Zone {
            top,
            height: percent_of(h, percent).min(h.saturating_sub(top)),
        };
        let header = stacked(0, cfg.header_percent);
        let rating = stacked(header.bottom(), cfg.rating_percent);
        let info = stacked(rating.bottom(), cfg.info_percent);
        let remaining = h.saturating_sub(info.bottom());
        let footer_height = scaled(cfg.reference_footer_px)
            .max(cfg.min_footer_px)
            .min(remaining);
        let footer = Zone {
            top: h - footer_height,
            height: footer_height,
        };

        let rating_boxes = rating_strip(spec, canvas.width, rating, padding);

        let statements: Vec<String> = spec
            .hazard_statements
            .iter()
            .take(cfg.max_statements)
            .cloned()
            .collect();

        let column_width = percent_of(canvas.width, cfg.statement_column_percent);
        let statement_column = PixelRect::new(
            clamp_i32(padding),
            clamp_i32(info.top),
            column_width.saturating_sub(padding.saturating_mul(2)),
            info.height,
        );

        let pictograms: Vec<Pictogram> = resolve(&spec.pictograms)
            .iter()
            .take(cfg.max_pictograms)
            .collect();
        let pictogram_slots = pictogram_grid(
            column_width,
            canvas.width.saturating_sub(column_width + padding),
            info,
            pictograms.len(),
        );

        LayoutGeometry {
            canvas,
            scale,
            padding,
            header,
            rating,
            info,
            footer,
            fonts,
            rating_boxes,
            statements,
            statement_column,
            pictograms,
            pictogram_slots,
        }
    }
}

fn percent_of(value: u32, percent: u32) -> u32 {
    ((u64::from(value) * u64::from(percent.min(100))) / 100) as u32
}

fn clamp_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn rating_strip(spec: &LabelSpec, width: u32, zone: Zone, gap: u32) -> Vec<RatingBox> {
    let box_width = width.saturating_sub(gap.saturating_mul(5)) / 4;
    let inset = gap / 2;
    let box_height = zone.height.saturating_sub(inset * 2);
    RatingCategory::ALL
        .iter()
        .enumerate()
        .map(|(index, category)| {
            let x = gap + index as u32 * (box_width + gap);
            RatingBox {
                category: *category,
                rect: PixelRect::new(
                    clamp_i32(x),
                    clamp_i32(zone.top + inset),
                    box_width,
                    box_height,
                ),
                value: spec.rating.value_text(*category),
            }
        })
        .collect()
}

// Two-by-two grid anchored at the top-left of the pictogram area.
fn pictogram_grid(left: u32, area_width: u32, zone: Zone, count: usize) -> Vec<PixelRect> {
    let cell = (area_width / 2).min(zone.height / 2);
    let inset = (cell / 16).max(1).min(cell / 2);
    let side = cell.saturating_sub(inset * 2);
    (0..count)
        .map(|index| {
            let column = (index % 2) as u32;
            let row = (index / 2) as u32;
            PixelRect::new(
                clamp_i32(left + column * cell + inset),
                clamp_i32(zone.top + row * cell + inset),
                side,
                side,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::HmisRating;

    fn spec(width: u32, height: u32) -> LabelSpec {
        LabelSpec::new("Acetone", CanvasSize::new(width, height))
            .with_rating(HmisRating::new(2, 3, 0, "A"))
    }

    #[test]
    fn reference_canvas_uses_reference_fonts() {
        let geometry = LayoutEngine::default().layout(&spec(288, 192));
        assert_eq!(geometry.scale, 1.0);
        assert_eq!(geometry.fonts, LayoutConfig::default().reference_fonts);
        assert_eq!(geometry.header, Zone { top: 0, height: 28 });
        assert_eq!(
            geometry.rating,
            Zone {
                top: 28,
                height: 23
            }
        );
        assert_eq!(
            geometry.info,
            Zone {
                top: 51,
                height: 92
            }
        );
        assert_eq!(
            geometry.footer,
            Zone {
                top: 168,
                height: 24
            }
        );
    }

    #[test]
    fn scale_uses_the_tighter_axis() {
        let engine = LayoutEngine::default();
        assert_eq!(engine.scale_for(CanvasSize::new(576, 192)), 1.0);
        assert_eq!(engine.scale_for(CanvasSize::new(576, 384)), 2.0);
        assert_eq!(engine.scale_for(CanvasSize::new(144, 384)), 0.5);
    }

    #[test]
    fn fonts_never_fall_below_the_floor() {
        let geometry = LayoutEngine::default().layout(&spec(30, 20));
        let floor = LayoutConfig::default().min_font_px;
        for size in [
            geometry.fonts.title,
            geometry.fonts.subtitle,
            geometry.fonts.rating_value,
            geometry.fonts.rating_caption,
            geometry.fonts.statement,
            geometry.fonts.footer,
        ] {
            assert!(size >= floor, "size {size} below floor {floor}");
        }
    }

    #[test]
    fn zones_fit_and_footer_is_bottom_anchored() {
        let engine = LayoutEngine::default();
        for (w, h) in [(288, 192), (1, 1), (10, 3), (600, 100), (100, 600), (2048, 1365)] {
            let geometry = engine.layout(&spec(w, h));
            assert!(geometry.zone_total() <= h, "{w}x{h} overflows");
            assert_eq!(geometry.footer.top, h - geometry.footer.height, "{w}x{h}");
            assert!(geometry.info.bottom() <= geometry.footer.top, "{w}x{h}");
        }
    }

    #[test]
    fn footer_offset_ignores_content_length() {
        let engine = LayoutEngine::default();
        let short = engine.layout(&spec(288, 192));
        let mut long_spec = spec(288, 192);
        for index in 0..20 {
            long_spec = long_spec
                .with_hazard_statement(format!("H{index} causes very serious trouble"))
                .with_ppe("gloves");
        }
        let long = engine.layout(&long_spec);
        assert_eq!(short.footer, long.footer);
    }

    #[test]
    fn statements_and_pictograms_are_truncated_in_order() {
        let spec = spec(288, 192)
            .with_hazard_statement("H225")
            .with_hazard_statement("H319")
            .with_hazard_statement("H336")
            .with_hazard_statement("H373")
            .with_pictogram("toxic")
            .with_pictogram("flame")
            .with_pictogram("corrosive")
            .with_pictogram("GHS06")
            .with_pictogram("exclamation")
            .with_pictogram("environment");
        let geometry = LayoutEngine::default().layout(&spec);
        assert_eq!(geometry.statements, ["H225", "H319", "H336"]);
        assert_eq!(
            geometry.pictograms,
            [
                Pictogram::Toxic,
                Pictogram::Flame,
                Pictogram::Corrosive,
                Pictogram::Irritant
            ]
        );
        assert_eq!(geometry.pictogram_slots.len(), 4);
    }

    #[test]
    fn rating_boxes_follow_strip_order() {
        let geometry = LayoutEngine::default().layout(&spec(288, 192));
        let categories: Vec<RatingCategory> =
            geometry.rating_boxes.iter().map(|b| b.category).collect();
        assert_eq!(categories, RatingCategory::ALL);
        let values: Vec<&str> = geometry
            .rating_boxes
            .iter()
            .map(|b| b.value.as_str())
            .collect();
        assert_eq!(values, ["2", "3", "0", "A"]);
        for pair in geometry.rating_boxes.windows(2) {
            assert!(pair[0].rect.right() <= pair[1].rect.x);
        }
        let last = &geometry.rating_boxes[3];
        assert!(last.rect.right() <= 288);
    }

    #[test]
    fn oversubscribed_zone_shares_still_fit_the_canvas() {
        let engine = LayoutEngine::new(LayoutConfig {
            header_percent: 50,
            rating_percent: 40,
            info_percent: 30,
            ..LayoutConfig::default()
        });
        for (w, h) in [(288, 192), (300, 7), (640, 1000)] {
            let geometry = engine.layout(&spec(w, h));
            assert!(geometry.zone_total() <= h, "{w}x{h} overflows");
            assert_eq!(geometry.info.bottom(), h, "{w}x{h}");
            assert_eq!(geometry.footer.height, 0, "{w}x{h}");
            assert_eq!(geometry.footer.top, h, "{w}x{h}");
        }
    }

    #[test]
    fn pictogram_slots_stay_inside_the_info_zone() {
        let spec = spec(288, 192)
            .with_pictogram("flame")
            .with_pictogram("toxic")
            .with_pictogram("corrosive")
            .with_pictogram("environment");
        let geometry = LayoutEngine::default().layout(&spec);
        for slot in &geometry.pictogram_slots {
            assert!(slot.y >= geometry.info.top as i32);
            assert!(slot.bottom() <= geometry.info.bottom() as i32);
            assert!(slot.right() <= 288);
            assert!(slot.x >= geometry.statement_column.right());
        }
    }
}
