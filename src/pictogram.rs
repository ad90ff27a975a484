//! Mapping of free-form pictogram identifiers onto the nine GHS symbols.

use smallvec::SmallVec;

/// Canonical GHS pictogram.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Pictogram {
    Explosive,
    Flame,
    Oxidizer,
    CompressedGas,
    Corrosive,
    Toxic,
    Irritant,
    HealthHazard,
    EnvironmentalHazard,
}

impl Pictogram {
    pub const ALL: [Pictogram; 9] = [
        Pictogram::Explosive,
        Pictogram::Flame,
        Pictogram::Oxidizer,
        Pictogram::CompressedGas,
        Pictogram::Corrosive,
        Pictogram::Toxic,
        Pictogram::Irritant,
        Pictogram::HealthHazard,
        Pictogram::EnvironmentalHazard,
    ];

    /// Official GHS code.
    pub fn ghs_code(self) -> &'static str {
        match self {
            Self::Explosive => "GHS01",
            Self::Flame => "GHS02",
            Self::Oxidizer => "GHS03",
            Self::CompressedGas => "GHS04",
            Self::Corrosive => "GHS05",
            Self::Toxic => "GHS06",
            Self::Irritant => "GHS07",
            Self::HealthHazard => "GHS08",
            Self::EnvironmentalHazard => "GHS09",
        }
    }

    /// Short glyph text drawn inside the diamond by raster backends.
    pub fn glyph(self) -> &'static str {
        match self {
            Self::Explosive => "EXP",
            Self::Flame => "FLM",
            Self::Oxidizer => "OXD",
            Self::CompressedGas => "GAS",
            Self::Corrosive => "COR",
            Self::Toxic => "TOX",
            Self::Irritant => "!",
            Self::HealthHazard => "HLT",
            Self::EnvironmentalHazard => "ENV",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Explosive => "Exploding bomb",
            Self::Flame => "Flame",
            Self::Oxidizer => "Flame over circle",
            Self::CompressedGas => "Gas cylinder",
            Self::Corrosive => "Corrosion",
            Self::Toxic => "Skull and crossbones",
            Self::Irritant => "Exclamation mark",
            Self::HealthHazard => "Health hazard",
            Self::EnvironmentalHazard => "Environment",
        }
    }
}

/// How a normalized identifier must look for a rule to fire.
enum Matcher {
    /// Any listed fragment occurs in the identifier.
    Any(&'static [&'static str]),
    /// Every listed fragment occurs in the identifier.
    All(&'static [&'static str]),
}

impl Matcher {
    fn matches(&self, normalized: &str) -> bool {
        match self {
            Self::Any(fragments) => fragments.iter().any(|f| normalized.contains(f)),
            Self::All(fragments) => fragments.iter().all(|f| normalized.contains(f)),
        }
    }
}

// First match wins. Compound names come before their components so
// "flame over circle" resolves to the oxidizer and "ecotoxic" to the
// environment rather than to flame or toxic.
const RULES: &[(Matcher, Pictogram)] = &[
    (Matcher::All(&["flame", "circle"]), Pictogram::Oxidizer),
    (Matcher::Any(&["ghs03", "oxidi"]), Pictogram::Oxidizer),
    (Matcher::Any(&["ghs01", "explos", "bomb"]), Pictogram::Explosive),
    (
        Matcher::Any(&["ghs02", "flame", "flammab", "fire"]),
        Pictogram::Flame,
    ),
    (
        Matcher::Any(&["ghs04", "cylinder", "compressed", "gas"]),
        Pictogram::CompressedGas,
    ),
    (
        Matcher::Any(&["ghs05", "corros", "acid"]),
        Pictogram::Corrosive,
    ),
    (
        Matcher::Any(&["ghs09", "environment", "aquatic", "ecotox", "fish", "tree"]),
        Pictogram::EnvironmentalHazard,
    ),
    (
        Matcher::Any(&["ghs06", "skull", "crossbones", "toxic", "poison"]),
        Pictogram::Toxic,
    ),
    (
        Matcher::Any(&["ghs08", "healthhazard", "health", "silhouette", "carcinogen"]),
        Pictogram::HealthHazard,
    ),
    (
        Matcher::Any(&["ghs07", "exclam", "irritant", "harmful"]),
        Pictogram::Irritant,
    ),
];

/// Lower-cases and strips everything that is not an ASCII letter or digit.
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|ch| ch.is_ascii_alphanumeric())
        .map(|ch| ch.to_ascii_lowercase())
        .collect()
}

/// Classifies a single raw identifier.
pub fn classify(raw: &str) -> Option<Pictogram> {
    let normalized = normalize(raw);
    if normalized.is_empty() {
        return None;
    }
    RULES
        .iter()
        .find(|(matcher, _)| matcher.matches(&normalized))
        .map(|(_, pictogram)| *pictogram)
}

/// Deduplicated pictograms in first-seen order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PictogramSet {
    items: SmallVec<[Pictogram; 9]>,
}

impl PictogramSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `pictogram` unless already present. Returns whether it was added.
    pub fn insert(&mut self, pictogram: Pictogram) -> bool {
        if self.items.contains(&pictogram) {
            return false;
        }
        self.items.push(pictogram);
        true
    }

    pub fn contains(&self, pictogram: Pictogram) -> bool {
        self.items.contains(&pictogram)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Pictogram> + '_ {
        self.items.iter().copied()
    }

    pub fn as_slice(&self) -> &[Pictogram] {
        &self.items
    }
}

impl FromIterator<Pictogram> for PictogramSet {
    fn from_iter<I: IntoIterator<Item = Pictogram>>(iter: I) -> Self {
        let mut set = Self::new();
        for pictogram in iter {
            set.insert(pictogram);
        }
        set
    }
}

/// Resolves raw identifiers into canonical pictograms.
///
/// Unrecognized identifiers are dropped without error. The result is a set in
/// first-occurrence order.
pub fn resolve<I, S>(raw_ids: I) -> PictogramSet
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut set = PictogramSet::new();
    for raw in raw_ids {
        let raw = raw.as_ref();
        match classify(raw) {
            Some(pictogram) => {
                set.insert(pictogram);
            }
            None => log::debug!("dropping unrecognized pictogram id '{}'", raw),
        }
    }
    set
}
