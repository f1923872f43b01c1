//! Five-vector consultation profile
//!
//! The profile holds one optional slot per vector (skin analysis,
//! environment, lifestyle, TPO and theme). Slots are written wholesale by the
//! step that produces them and never merged; there is no cross-vector
//! validation at this layer.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Declare a closed enumeration with its wire spelling
///
/// Generates serde renames, `ALL`, `as_str`, `Display` and `FromStr`.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            ::serde::Serialize, ::serde::Deserialize,
        )]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $wire)] $variant),+
        }

        impl $name {
            /// Every value, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire spelling
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::error::SilError;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.trim() {
                    $($wire => Ok($name::$variant),)+
                    other => Err($crate::error::SilError::Validation(format!(
                        "Unknown {} value: {}",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }
    };
}

pub(crate) use wire_enum;

wire_enum! {
    /// Skin issue tags reported by the analyzers
    SkinIssue {
        Acne => "acne",
        DarkCircle => "dark_circle",
        Stain => "stain",
        Wrinkle => "wrinkle",
        Pore => "pore",
        Dryness => "dryness",
        Oiliness => "oiliness",
        Sensitivity => "sensitivity",
        Dullness => "dullness",
        UnevenTone => "uneven_tone",
    }
}

wire_enum! {
    /// Backend vision model selector
    Analyzer {
        ClaudeVision => "claude_vision",
        Facepp => "facepp",
        Both => "both",
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Analyzer::ClaudeVision
    }
}

wire_enum! {
    /// Self-reported stress level
    StressLevel {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

wire_enum! {
    /// How often the user exercises
    ExerciseFreq {
        None => "none",
        Light => "light",
        Moderate => "moderate",
        Active => "active",
    }
}

wire_enum! {
    /// Self-reported diet quality
    DietQuality {
        Poor => "poor",
        Average => "average",
        Good => "good",
        Excellent => "excellent",
    }
}

wire_enum! {
    /// Time of day for the TPO vector
    TpoTime {
        Morning => "morning",
        Afternoon => "afternoon",
        Evening => "evening",
        Night => "night",
    }
}

wire_enum! {
    /// Place for the TPO vector
    TpoPlace {
        Office => "office",
        Outdoor => "outdoor",
        Home => "home",
        Gym => "gym",
        Travel => "travel",
    }
}

wire_enum! {
    /// Occasion for the TPO vector
    TpoOccasion {
        Daily => "daily",
        Date => "date",
        Meeting => "meeting",
        Workout => "workout",
        Special => "special",
    }
}

wire_enum! {
    /// Aesthetic style of the theme vector
    ThemeStyle {
        GlassSkin => "glass_skin",
        CleanGirl => "clean_girl",
        KIdol => "k_idol",
        Natural => "natural",
        Dewy => "dewy",
        Matte => "matte",
        Minimalist => "minimalist",
    }
}

wire_enum! {
    /// Look intensity of the theme vector
    Intensity {
        Subtle => "subtle",
        Moderate => "moderate",
        Bold => "bold",
    }
}

/// Skin analysis result (the `user` vector)
///
/// Issue tags outside the closed [`SkinIssue`] set are dropped on receipt,
/// both from `issues` and from `severity`; severities are clamped to `[0, 1]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkinAnalysis {
    /// Detected issues
    #[serde(default, deserialize_with = "known_issues")]
    pub issues: Vec<SkinIssue>,
    /// Coarse categories (hydration, pigmentation, ...)
    #[serde(default)]
    pub issue_categories: Vec<String>,
    /// Severity per detected issue
    #[serde(default, deserialize_with = "known_severity")]
    pub severity: BTreeMap<SkinIssue, f64>,
    /// Hydration score, 0-100
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hydration: Option<f64>,
    /// Oil score, 0-100
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oil_level: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skin_tone: Option<String>,
    /// Skin type label (oily, dry, combination, sensitive, normal)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skin_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_concerns: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Model that produced this result
    #[serde(default)]
    pub analyzer: Analyzer,
}

impl SkinAnalysis {
    /// Returns true when `issue` was detected
    pub fn has_issue(&self, issue: SkinIssue) -> bool {
        self.issues.contains(&issue)
    }
}

fn known_issues<'de, D>(deserializer: D) -> Result<Vec<SkinIssue>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<String> = Vec::deserialize(deserializer)?;
    Ok(raw.iter().filter_map(|s| s.parse().ok()).collect())
}

fn known_severity<'de, D>(deserializer: D) -> Result<BTreeMap<SkinIssue, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: BTreeMap<String, f64> = BTreeMap::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(k, v)| {
            k.parse::<SkinIssue>()
                .ok()
                .map(|issue| (issue, v.clamp(0.0, 1.0)))
        })
        .collect())
}

/// Weather and air quality (the `environment` vector)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherData {
    /// Temperature in °C
    pub temp: f64,
    /// Relative humidity in %
    pub humidity: f64,
    /// UV index
    pub uvi: f64,
    pub description: String,
    /// City identifier
    pub city: String,
    /// Air quality index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aqi: Option<f64>,
}

/// Daily habits (the `lifestyle` vector)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifestyleVector {
    /// Hours of sleep, practical range 3-12
    pub sleep_hours: f64,
    pub stress_level: StressLevel,
    /// Glasses of water per day
    pub water_intake: f64,
    pub exercise_freq: ExerciseFreq,
    pub diet_quality: DietQuality,
}

/// Time, place and occasion (the `tpo` vector)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TpoVector {
    pub time: TpoTime,
    pub place: TpoPlace,
    pub occasion: TpoOccasion,
}

/// Desired look (the `theme` vector)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeVector {
    pub style: ThemeStyle,
    /// Free-text finish, e.g. "dewy"
    pub finish: String,
    pub intensity: Intensity,
}

wire_enum! {
    /// Name of a profile slot
    VectorKey {
        User => "user",
        Environment => "environment",
        Lifestyle => "lifestyle",
        Tpo => "tpo",
        Theme => "theme",
    }
}

/// A fully populated value for one profile slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "key", content = "value", rename_all = "lowercase")]
pub enum VectorValue {
    User(SkinAnalysis),
    Environment(WeatherData),
    Lifestyle(LifestyleVector),
    Tpo(TpoVector),
    Theme(ThemeVector),
}

impl VectorValue {
    /// Slot this value belongs in
    pub fn key(&self) -> VectorKey {
        match self {
            VectorValue::User(_) => VectorKey::User,
            VectorValue::Environment(_) => VectorKey::Environment,
            VectorValue::Lifestyle(_) => VectorKey::Lifestyle,
            VectorValue::Tpo(_) => VectorKey::Tpo,
            VectorValue::Theme(_) => VectorKey::Theme,
        }
    }
}

/// The five-vector profile
///
/// # Examples
///
/// ```
/// use sil_consult::profile::{FiveVectors, TpoVector, TpoTime, TpoPlace, TpoOccasion, VectorKey, VectorValue};
///
/// let mut profile = FiveVectors::default();
/// profile.set_vector(VectorValue::Tpo(TpoVector {
///     time: TpoTime::Morning,
///     place: TpoPlace::Office,
///     occasion: TpoOccasion::Daily,
/// }));
/// assert!(profile.is_set(VectorKey::Tpo));
/// assert_eq!(profile.completed(), vec![VectorKey::Tpo]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FiveVectors {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<SkinAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<WeatherData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifestyle: Option<LifestyleVector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tpo: Option<TpoVector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<ThemeVector>,
}

impl FiveVectors {
    /// Replace one slot wholesale (last write wins, no merge)
    pub fn set_vector(&mut self, value: VectorValue) {
        tracing::debug!(key = %value.key(), "Setting profile vector");
        match value {
            VectorValue::User(v) => self.user = Some(v),
            VectorValue::Environment(v) => self.environment = Some(v),
            VectorValue::Lifestyle(v) => self.lifestyle = Some(v),
            VectorValue::Tpo(v) => self.tpo = Some(v),
            VectorValue::Theme(v) => self.theme = Some(v),
        }
    }

    /// Current value of one slot
    pub fn get(&self, key: VectorKey) -> Option<VectorValue> {
        match key {
            VectorKey::User => self.user.clone().map(VectorValue::User),
            VectorKey::Environment => self.environment.clone().map(VectorValue::Environment),
            VectorKey::Lifestyle => self.lifestyle.clone().map(VectorValue::Lifestyle),
            VectorKey::Tpo => self.tpo.clone().map(VectorValue::Tpo),
            VectorKey::Theme => self.theme.clone().map(VectorValue::Theme),
        }
    }

    pub fn is_set(&self, key: VectorKey) -> bool {
        match key {
            VectorKey::User => self.user.is_some(),
            VectorKey::Environment => self.environment.is_some(),
            VectorKey::Lifestyle => self.lifestyle.is_some(),
            VectorKey::Tpo => self.tpo.is_some(),
            VectorKey::Theme => self.theme.is_some(),
        }
    }

    /// Populated slots in canonical order
    pub fn completed(&self) -> Vec<VectorKey> {
        VectorKey::ALL
            .iter()
            .copied()
            .filter(|k| self.is_set(*k))
            .collect()
    }
}
