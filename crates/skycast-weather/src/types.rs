use serde::{Deserialize, Serialize};

/// Weather condition categories mapped from OpenWeather condition codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    #[default]
    Clear,
    PartlyCloudy,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    HeavyRain,
    Snow,
    Sleet,
    Thunderstorm,
}

impl WeatherCondition {
    /// Convert an OpenWeather condition code to a WeatherCondition
    /// See: https://openweathermap.org/weather-conditions
    pub fn from_owm_code(code: u32) -> Self {
        match code {
            200..=299 => Self::Thunderstorm,
            300..=399 => Self::Drizzle,
            511 => Self::Sleet, // Freezing rain
            502..=504 | 522 | 531 => Self::HeavyRain,
            500..=599 => Self::Rain,
            611..=616 => Self::Sleet,
            600..=699 => Self::Snow,
            700..=799 => Self::Fog, // Mist, smoke, haze, fog, dust
            800 => Self::Clear,
            801 | 802 => Self::PartlyCloudy,
            803 | 804 => Self::Cloudy,
            _ => Self::Clear, // Unknown codes default to clear
        }
    }

    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::PartlyCloudy => "Partly Cloudy",
            Self::Cloudy => "Cloudy",
            Self::Fog => "Fog",
            Self::Drizzle => "Drizzle",
            Self::Rain => "Rain",
            Self::HeavyRain => "Heavy Rain",
            Self::Snow => "Snow",
            Self::Sleet => "Sleet",
            Self::Thunderstorm => "Thunderstorm",
        }
    }

    /// Get icon name for display layers
    pub fn icon_name(&self) -> &'static str {
        match self {
            Self::Clear => "sun",
            Self::PartlyCloudy => "cloud_sun",
            Self::Cloudy => "cloud",
            Self::Fog => "cloud_fog",
            Self::Drizzle => "cloud_rain",
            Self::Rain => "cloud_rain",
            Self::HeavyRain => "cloud_rain",
            Self::Snow => "cloud_snow",
            Self::Sleet => "cloud_snow",
            Self::Thunderstorm => "cloud_lightning",
        }
    }
}

/// Condition tag as reported by the provider (id plus display strings)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionTag {
    pub id: u32,
    pub main: String,
    pub description: String,
    pub icon: String,
}

/// Temperature, pressure and humidity block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thermals {
    pub temp: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub pressure: u32,
    pub humidity: u8,
    pub sea_level: Option<u32>,
    pub grnd_level: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wind {
    pub speed: f64,
    pub deg: u16,
    pub gust: Option<f64>,
}

/// Country and sun times block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SunInfo {
    pub country: Option<String>,
    pub sunrise: i64,
    pub sunset: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clouds {
    pub all: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coord {
    pub lon: f64,
    pub lat: f64,
}

/// Current weather conditions for one city, as returned by the provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentConditions {
    /// Resolved city name (provider spelling, may differ from the query)
    pub name: String,
    pub main: Thermals,
    pub weather: Vec<ConditionTag>,
    pub wind: Wind,
    #[serde(rename = "sys")]
    pub sun: SunInfo,
    pub clouds: Clouds,
    pub visibility: Option<u32>,
    /// Observation timestamp (Unix seconds, UTC)
    pub dt: i64,
    /// Offset from UTC in seconds
    pub timezone: i64,
    pub coord: Option<Coord>,
}

impl CurrentConditions {
    /// Condition category derived from the primary condition tag.
    pub fn condition(&self) -> WeatherCondition {
        self.weather
            .first()
            .map(|tag| WeatherCondition::from_owm_code(tag.id))
            .unwrap_or_default()
    }
}
