//! Wire types for the SIL backend contract
//!
//! Request bodies are serialized exactly as the backend expects them;
//! responses are parsed into the typed profile structures on receipt.

use crate::chat::{ChatMessage, ExpertInfo, MessageRole};
use crate::language::Language;
use crate::profile::{wire_enum, Analyzer, FiveVectors, SkinAnalysis, WeatherData};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/analyze-skin`
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeRequest {
    /// Base64-encoded image, without a data-URL prefix
    pub image: String,
    pub analyzer: Analyzer,
}

/// One prior turn sent with a consult request (no ids or timestamps)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: MessageRole,
    pub content: String,
}

impl From<&ChatMessage> for HistoryEntry {
    fn from(message: &ChatMessage) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

/// Body of `POST /api/consult`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsultRequest {
    pub message: String,
    /// Snapshot of the profile at submission time
    pub vectors: FiveVectors,
    pub language: Language,
    pub history: Vec<HistoryEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona_id: Option<String>,
}

/// Consult request plus the optional streaming flag
#[derive(Debug, Serialize)]
pub(crate) struct ConsultPayload<'a> {
    #[serde(flatten)]
    pub request: &'a ConsultRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

/// Non-streaming consult reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsultResponse {
    pub reply: String,
    /// Expert the backend routed the question to, if it says so
    #[serde(default)]
    pub expert: Option<ExpertInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub products: Option<Vec<serde_json::Value>>,
}

/// Persona offered by `GET /api/personas`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaInfo {
    pub id: String,
    pub name: String,
    pub subtitle: String,
    pub emoji: String,
    #[serde(default)]
    pub avatar_gradient: String,
    #[serde(default)]
    pub specialty_tags: Vec<String>,
}

impl PersonaInfo {
    /// Expert identity shown once this persona is chosen
    pub fn to_expert(&self) -> ExpertInfo {
        ExpertInfo {
            name: self.name.clone(),
            role: self.subtitle.clone(),
            emoji: self.emoji.clone(),
            category: "general".to_string(),
            persona_id: Some(self.id.clone()),
        }
    }
}

/// City offered by `GET /api/cities`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityInfo {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

wire_enum! {
    /// Season hint for city weather lookups
    Season {
        Spring => "spring",
        Summer => "summer",
        Fall => "fall",
        Winter => "winter",
    }
}

/// Query for `GET /api/weather`
///
/// Only populated parameters are sent. Zero coordinates count as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub city: Option<String>,
    pub season: Option<Season>,
}

impl WeatherQuery {
    /// Query by coordinates
    pub fn coordinates(lat: f64, lon: f64) -> Self {
        Self {
            lat: Some(lat),
            lon: Some(lon),
            ..Self::default()
        }
    }

    /// Query by city id and season
    pub fn city(city: impl Into<String>, season: Season) -> Self {
        Self {
            city: Some(city.into()),
            season: Some(season),
            ..Self::default()
        }
    }

    /// Query-string pairs in the order the backend documents them
    ///
    /// # Examples
    ///
    /// ```
    /// use sil_consult::api::{Season, WeatherQuery};
    ///
    /// let pairs = WeatherQuery::city("tokyo", Season::Fall).to_query_pairs();
    /// assert_eq!(
    ///     pairs,
    ///     vec![("city", "tokyo".to_string()), ("season", "fall".to_string())]
    /// );
    /// assert!(WeatherQuery::coordinates(0.0, 0.0).to_query_pairs().is_empty());
    /// ```
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(lat) = self.lat.filter(|v| *v != 0.0) {
            pairs.push(("lat", lat.to_string()));
        }
        if let Some(lon) = self.lon.filter(|v| *v != 0.0) {
            pairs.push(("lon", lon.to_string()));
        }
        if let Some(city) = self.city.as_deref().filter(|c| !c.is_empty()) {
            pairs.push(("city", city.to_string()));
        }
        if let Some(season) = self.season {
            pairs.push(("season", season.as_str().to_string()));
        }
        pairs
    }
}

/// Entry stored through `/api/diary`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkinDiaryEntry {
    /// ISO date, e.g. `2026-10-19`
    pub date: String,
    pub skin_data: SkinAnalysis,
    pub weather: WeatherData,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routine_am: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routine_pm: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

/// Body of `GET /api/health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}
