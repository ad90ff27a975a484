//! Label data model and structural validation.

use crate::error::LabelError;

/// Highest value an HMIS numeric rating may take.
pub const MAX_RATING: u8 = 4;
/// Maximum character count of the special/PPE notice code.
pub const MAX_SPECIAL_CHARS: usize = 3;

/// On-screen label size in CSS-like pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self::new(288, 192)
    }
}

/// One of the four HMIS rating categories, in strip order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RatingCategory {
    Health,
    Flammability,
    Physical,
    Special,
}

impl RatingCategory {
    /// Strip order, left to right.
    pub const ALL: [RatingCategory; 4] = [
        RatingCategory::Health,
        RatingCategory::Flammability,
        RatingCategory::Physical,
        RatingCategory::Special,
    ];

    /// Caption printed under the rating value.
    pub fn caption(self) -> &'static str {
        match self {
            Self::Health => "HEALTH",
            Self::Flammability => "FLAMMABILITY",
            Self::Physical => "PHYSICAL",
            Self::Special => "PPE",
        }
    }

    /// Conventional HMIS bar colour as RGB.
    pub fn color(self) -> [u8; 3] {
        match self {
            Self::Health => [0x1f, 0x5f, 0xbf],
            Self::Flammability => [0xd6, 0x1f, 0x1f],
            Self::Physical => [0xf2, 0x8c, 0x1c],
            Self::Special => [0xff, 0xff, 0xff],
        }
    }
}

/// HMIS rating block: three numeric hazards plus the special/PPE code.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HmisRating {
    pub health: u8,
    pub flammability: u8,
    pub physical: u8,
    pub special: String,
}

impl HmisRating {
    pub fn new(health: u8, flammability: u8, physical: u8, special: impl Into<String>) -> Self {
        Self {
            health,
            flammability,
            physical,
            special: special.into(),
        }
    }

    /// Literal text shown in the box for `category`.
    pub fn value_text(&self, category: RatingCategory) -> String {
        match category {
            RatingCategory::Health => self.health.to_string(),
            RatingCategory::Flammability => self.flammability.to_string(),
            RatingCategory::Physical => self.physical.to_string(),
            RatingCategory::Special => self.special.trim().to_string(),
        }
    }
}

/// GHS signal word printed in the header when present.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SignalWord {
    Danger,
    Warning,
}

impl SignalWord {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Danger => "DANGER",
            Self::Warning => "WARNING",
        }
    }
}

/// Structured safety data for one label. Immutable once handed to a job.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LabelSpec {
    pub product_name: String,
    pub manufacturer: String,
    /// CAS numbers, UN numbers and similar identifiers.
    pub identifiers: Vec<String>,
    pub signal_word: Option<SignalWord>,
    pub rating: HmisRating,
    /// Ordered hazard statements; only the first few are shown.
    pub hazard_statements: Vec<String>,
    /// Raw pictogram identifiers as supplied upstream.
    pub pictograms: Vec<String>,
    /// Personal protective equipment requirements.
    pub ppe: Vec<String>,
    pub canvas: CanvasSize,
}

impl LabelSpec {
    pub fn new(product_name: impl Into<String>, canvas: CanvasSize) -> Self {
        Self {
            product_name: product_name.into(),
            canvas,
            ..Self::default()
        }
    }

    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = manufacturer.into();
        self
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifiers.push(identifier.into());
        self
    }

    pub fn with_signal_word(mut self, signal_word: SignalWord) -> Self {
        self.signal_word = Some(signal_word);
        self
    }

    pub fn with_rating(mut self, rating: HmisRating) -> Self {
        self.rating = rating;
        self
    }

    pub fn with_hazard_statement(mut self, statement: impl Into<String>) -> Self {
        self.hazard_statements.push(statement.into());
        self
    }

    pub fn with_pictogram(mut self, raw_id: impl Into<String>) -> Self {
        self.pictograms.push(raw_id.into());
        self
    }

    pub fn with_ppe(mut self, item: impl Into<String>) -> Self {
        self.ppe.push(item.into());
        self
    }

    /// Structural checks only; hazard content is trusted as supplied.
    pub fn validate(&self) -> Result<(), LabelError> {
        if self.product_name.trim().is_empty() {
            return Err(LabelError::InvalidLabel {
                field: "product_name",
                reason: "must not be empty".to_string(),
            });
        }
        for (field, value) in [
            ("rating.health", self.rating.health),
            ("rating.flammability", self.rating.flammability),
            ("rating.physical", self.rating.physical),
        ] {
            if value > MAX_RATING {
                return Err(LabelError::InvalidLabel {
                    field,
                    reason: format!("{} is outside 0..={}", value, MAX_RATING),
                });
            }
        }
        let special_len = self.rating.special.trim().chars().count();
        if special_len == 0 || special_len > MAX_SPECIAL_CHARS {
            return Err(LabelError::InvalidLabel {
                field: "rating.special",
                reason: format!(
                    "'{}' must be 1 to {} characters",
                    self.rating.special, MAX_SPECIAL_CHARS
                ),
            });
        }
        if self.canvas.is_empty() {
            return Err(LabelError::dimensions(
                "label-spec",
                self.canvas.width,
                self.canvas.height,
            ));
        }
        Ok(())
    }

    /// Product name reduced to `[a-z0-9_]` for artifact filenames.
    pub fn slug(&self) -> String {
        self.product_name
            .chars()
            .map(|ch| {
                if ch.is_ascii_alphanumeric() {
                    ch.to_ascii_lowercase()
                } else {
                    '_'
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acetone() -> LabelSpec {
        LabelSpec::new("Acetone", CanvasSize::new(288, 192))
            .with_rating(HmisRating::new(2, 3, 0, "A"))
    }

    #[test]
    fn valid_spec_passes_structural_checks() {
        acetone().validate().expect("acetone label should validate");
    }

    #[test]
    fn empty_product_name_is_rejected() {
        let spec = LabelSpec {
            product_name: "   ".to_string(),
            ..acetone()
        };
        let err = spec.validate().expect_err("blank name should fail");
        assert!(matches!(
            err,
            LabelError::InvalidLabel {
                field: "product_name",
                ..
            }
        ));
    }

    #[test]
    fn rating_above_four_is_rejected() {
        let spec = acetone().with_rating(HmisRating::new(2, 5, 0, "A"));
        let err = spec.validate().expect_err("rating 5 should fail");
        assert!(matches!(
            err,
            LabelError::InvalidLabel {
                field: "rating.flammability",
                ..
            }
        ));
    }

    #[test]
    fn special_code_length_is_bounded() {
        for code in ["", "ACID"] {
            let spec = acetone().with_rating(HmisRating::new(1, 1, 1, code));
            assert!(spec.validate().is_err(), "code {code:?} should fail");
        }
        for code in ["X", "OX", "H2O"] {
            let spec = acetone().with_rating(HmisRating::new(1, 1, 1, code));
            assert!(spec.validate().is_ok(), "code {code:?} should pass");
        }
    }

    #[test]
    fn zero_canvas_is_rejected() {
        let spec = LabelSpec {
            canvas: CanvasSize::new(0, 192),
            ..acetone()
        };
        assert!(matches!(
            spec.validate(),
            Err(LabelError::InvalidDimensions {
                stage: "label-spec",
                ..
            })
        ));
    }

    #[test]
    fn slug_lowercases_and_replaces_non_alphanumerics() {
        let spec = LabelSpec::new("Sodium Hypochlorite 12.5%", CanvasSize::default());
        assert_eq!(spec.slug(), "sodium_hypochlorite_12_5_");
    }

    #[test]
    fn rating_values_render_literally() {
        let rating = HmisRating::new(2, 3, 0, " A ");
        let values: Vec<String> = RatingCategory::ALL
            .iter()
            .map(|category| rating.value_text(*category))
            .collect();
        assert_eq!(values, ["2", "3", "0", "A"]);
    }
}
