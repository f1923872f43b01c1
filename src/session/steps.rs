//! Per-step form state and environment lookup
//!
//! Each wizard step edits its own owned form value and hands the finished
//! vector to the session machine. The environment step resolves weather
//! through a chain of fallbacks and always produces a value.

use chrono::Datelike;

use crate::api::{Season, WeatherApi, WeatherQuery};
use crate::language::Language;
use crate::profile::{
    DietQuality, ExerciseFreq, Intensity, LifestyleVector, StressLevel, ThemeStyle, ThemeVector,
    TpoOccasion, TpoPlace, TpoTime, TpoVector, WeatherData,
};

/// Practical bounds for reported sleep
pub const SLEEP_HOURS_RANGE: std::ops::RangeInclusive<f64> = 3.0..=12.0;

/// Lifestyle questionnaire
#[derive(Debug, Clone, PartialEq)]
pub struct LifestyleForm {
    sleep_hours: f64,
    pub stress_level: StressLevel,
    pub water_intake: f64,
    pub exercise_freq: ExerciseFreq,
    pub diet_quality: DietQuality,
}

impl Default for LifestyleForm {
    fn default() -> Self {
        Self {
            sleep_hours: 7.0,
            stress_level: StressLevel::Medium,
            water_intake: 6.0,
            exercise_freq: ExerciseFreq::Light,
            diet_quality: DietQuality::Average,
        }
    }
}

impl LifestyleForm {
    /// Set sleep hours, clamped to [`SLEEP_HOURS_RANGE`]
    pub fn set_sleep_hours(&mut self, hours: f64) {
        self.sleep_hours = hours.clamp(*SLEEP_HOURS_RANGE.start(), *SLEEP_HOURS_RANGE.end());
    }

    pub fn sleep_hours(&self) -> f64 {
        self.sleep_hours
    }

    pub fn finish(&self) -> LifestyleVector {
        LifestyleVector {
            sleep_hours: self.sleep_hours,
            stress_level: self.stress_level,
            water_intake: self.water_intake.max(0.0),
            exercise_freq: self.exercise_freq,
            diet_quality: self.diet_quality,
        }
    }
}

/// Time, place and occasion picker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TpoForm {
    pub time: TpoTime,
    pub place: TpoPlace,
    pub occasion: TpoOccasion,
}

impl Default for TpoForm {
    fn default() -> Self {
        Self {
            time: TpoTime::Morning,
            place: TpoPlace::Office,
            occasion: TpoOccasion::Daily,
        }
    }
}

impl TpoForm {
    pub fn finish(&self) -> TpoVector {
        TpoVector {
            time: self.time,
            place: self.place,
            occasion: self.occasion,
        }
    }
}

/// Look picker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeForm {
    pub style: ThemeStyle,
    pub finish: String,
    pub intensity: Intensity,
}

impl Default for ThemeForm {
    fn default() -> Self {
        Self {
            style: ThemeStyle::GlassSkin,
            finish: "dewy".to_string(),
            intensity: Intensity::Moderate,
        }
    }
}

impl ThemeForm {
    pub fn finish(&self) -> ThemeVector {
        let finish = self.finish.trim();
        ThemeVector {
            style: self.style,
            finish: if finish.is_empty() {
                "dewy".to_string()
            } else {
                finish.to_string()
            },
            intensity: self.intensity,
        }
    }
}

/// Region a built-in city belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CityGroup {
    Us,
    Ca,
    Jp,
}

impl CityGroup {
    pub const ALL: [CityGroup; 3] = [CityGroup::Us, CityGroup::Ca, CityGroup::Jp];

    pub fn code(&self) -> &'static str {
        match self {
            CityGroup::Us => "US",
            CityGroup::Ca => "CA",
            CityGroup::Jp => "JP",
        }
    }
}

/// A city offered by the environment step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct City {
    pub id: &'static str,
    /// Names in ko, en, ja order
    names: [&'static str; 3],
    pub group: CityGroup,
}

impl City {
    pub fn name(&self, language: Language) -> &'static str {
        match language {
            Language::Ko => self.names[0],
            Language::En => self.names[1],
            Language::Ja => self.names[2],
        }
    }
}

macro_rules! city {
    ($id:literal, $ko:literal, $en:literal, $ja:literal, $group:ident) => {
        City {
            id: $id,
            names: [$ko, $en, $ja],
            group: CityGroup::$group,
        }
    };
}

/// Built-in cities, grouped US, CA, JP
pub const CITIES: &[City] = &[
    city!("la", "LA", "LA", "LA", Us),
    city!("nyc", "뉴욕", "NYC", "NY", Us),
    city!("sf", "SF", "SF", "SF", Us),
    city!("seattle", "시애틀", "Seattle", "シアトル", Us),
    city!("chicago", "시카고", "Chicago", "シカゴ", Us),
    city!("miami", "마이애미", "Miami", "マイアミ", Us),
    city!("houston", "휴스턴", "Houston", "ヒューストン", Us),
    city!("dallas", "달라스", "Dallas", "ダラス", Us),
    city!("toronto", "토론토", "Toronto", "トロント", Ca),
    city!("vancouver", "밴쿠버", "Vancouver", "バンクーバー", Ca),
    city!("montreal", "몬트리올", "Montreal", "モントリオール", Ca),
    city!("calgary", "캘거리", "Calgary", "カルガリー", Ca),
    city!("tokyo", "도쿄", "Tokyo", "東京", Jp),
    city!("osaka", "오사카", "Osaka", "大阪", Jp),
    city!("kyoto", "교토", "Kyoto", "京都", Jp),
    city!("fukuoka", "후쿠오카", "Fukuoka", "福岡", Jp),
];

pub fn find_city(id: &str) -> Option<&'static City> {
    CITIES.iter().find(|c| c.id == id)
}

pub fn cities_in(group: CityGroup) -> impl Iterator<Item = &'static City> {
    CITIES.iter().filter(move |c| c.group == group)
}

/// Season for a calendar month (1-12)
pub fn season_for_month(month: u32) -> Season {
    match month {
        3..=5 => Season::Spring,
        6..=8 => Season::Summer,
        9..=11 => Season::Fall,
        _ => Season::Winter,
    }
}

/// Season at the local date
pub fn current_season() -> Season {
    season_for_month(chrono::Local::now().month())
}

/// Weather used when no lookup succeeds
pub fn fallback_weather(city: &str) -> WeatherData {
    WeatherData {
        temp: 22.0,
        humidity: 45.0,
        uvi: 6.0,
        description: "Partly cloudy".to_string(),
        city: city.to_string(),
        aqi: Some(75.0),
    }
}

/// Weather for the user's position
///
/// Tries the coordinates, then the backend's default location, then the
/// fixed fallback.
pub async fn resolve_by_location(api: &dyn WeatherApi, lat: f64, lon: f64) -> WeatherData {
    match api.get_weather(&WeatherQuery::coordinates(lat, lon)).await {
        Ok(weather) => weather,
        Err(e) => {
            tracing::warn!("Weather lookup by position failed: {:#}", e);
            resolve_default(api).await
        }
    }
}

/// Weather when no position is known: the backend's default, then the
/// fixed fallback
pub async fn resolve_default(api: &dyn WeatherApi) -> WeatherData {
    match api.get_weather(&WeatherQuery::default()).await {
        Ok(weather) => weather,
        Err(e) => {
            tracing::warn!("Default weather lookup failed, using fallback: {:#}", e);
            fallback_weather("LA")
        }
    }
}

/// Weather for a chosen city, defaulting the season to the current one
pub async fn resolve_by_city(
    api: &dyn WeatherApi,
    city_id: &str,
    season: Option<Season>,
) -> WeatherData {
    let season = season.unwrap_or_else(current_season);
    match api.get_weather(&WeatherQuery::city(city_id, season)).await {
        Ok(weather) => weather,
        Err(e) => {
            tracing::warn!(city = city_id, "City weather lookup failed, using fallback: {:#}", e);
            fallback_weather(city_id)
        }
    }
}
