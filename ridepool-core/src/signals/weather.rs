use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Weather condition reported by a weather feed.
///
/// Parsing is case-insensitive and accepts `-` or spaces in place of `_`.
/// Unrecognized strings become [`WeatherCondition::Unknown`], which is
/// neutral.
///
/// # Examples
/// ```
/// use ridepool_core::WeatherCondition;
///
/// let condition: WeatherCondition = "Heavy Rain".parse().unwrap_or_default();
/// assert_eq!(condition, WeatherCondition::HeavyRain);
/// assert_eq!(condition.delay_minutes(), 8.0);
/// assert_eq!(condition.multiplier(), 1.8);
/// assert_eq!(WeatherCondition::from("hail"), WeatherCondition::Unknown);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case", from = "String"))]
pub enum WeatherCondition {
    /// Clear skies.
    Clear,
    /// Sunny.
    Sunny,
    /// Partly cloudy.
    PartlyCloudy,
    /// Cloudy.
    Cloudy,
    /// Overcast.
    Overcast,
    /// Mist or light fog.
    Mist,
    /// Light rain.
    LightRain,
    /// Rain.
    Rain,
    /// Heavy rain.
    HeavyRain,
    /// Snow.
    Snow,
    /// Thunderstorm.
    Storm,
    /// Anything the engine does not recognize.
    #[default]
    Unknown,
}

impl WeatherCondition {
    /// Snake-case tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::Sunny => "sunny",
            Self::PartlyCloudy => "partly_cloudy",
            Self::Cloudy => "cloudy",
            Self::Overcast => "overcast",
            Self::Mist => "mist",
            Self::LightRain => "light_rain",
            Self::Rain => "rain",
            Self::HeavyRain => "heavy_rain",
            Self::Snow => "snow",
            Self::Storm => "storm",
            Self::Unknown => "unknown",
        }
    }

    /// Extra minutes a trip is expected to take in this weather.
    #[must_use]
    pub const fn delay_minutes(self) -> f64 {
        match self {
            Self::Clear | Self::Sunny | Self::PartlyCloudy | Self::Unknown => 0.0,
            Self::Cloudy => 0.5,
            Self::Overcast => 1.0,
            Self::Mist => 2.0,
            Self::LightRain => 3.0,
            Self::Rain => 5.0,
            Self::HeavyRain => 8.0,
            Self::Snow => 10.0,
            Self::Storm => 15.0,
        }
    }

    /// Route-time multiplier for this weather.
    #[must_use]
    pub const fn multiplier(self) -> f64 {
        match self {
            Self::Clear | Self::Sunny | Self::Unknown => 1.0,
            Self::PartlyCloudy => 1.05,
            Self::Cloudy => 1.1,
            Self::Overcast => 1.15,
            Self::Mist => 1.2,
            Self::LightRain => 1.3,
            Self::Rain => 1.5,
            Self::HeavyRain => 1.8,
            Self::Snow => 2.0,
            Self::Storm => 2.5,
        }
    }
}

impl fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WeatherCondition {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| match c {
                '-' | ' ' => '_',
                other => other.to_ascii_lowercase(),
            })
            .collect();
        Ok(match normalized.as_str() {
            "clear" => Self::Clear,
            "sunny" => Self::Sunny,
            "partly_cloudy" => Self::PartlyCloudy,
            "cloudy" => Self::Cloudy,
            "overcast" => Self::Overcast,
            "mist" => Self::Mist,
            "light_rain" => Self::LightRain,
            "rain" => Self::Rain,
            "heavy_rain" => Self::HeavyRain,
            "snow" => Self::Snow,
            "storm" => Self::Storm,
            _ => Self::Unknown,
        })
    }
}

impl From<&str> for WeatherCondition {
    fn from(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl From<String> for WeatherCondition {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

/// Weather observed at a coordinate.
///
/// Only `condition` drives estimates; the optional measurements are carried
/// for callers that log or display them.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WeatherReport {
    /// Reported condition.
    pub condition: WeatherCondition,
    /// Air temperature in degrees Fahrenheit.
    pub temperature_f: Option<f64>,
    /// Relative humidity, 0-100.
    pub humidity_percent: Option<f64>,
    /// Precipitation over the last hour, in inches.
    pub precipitation_inches: Option<f64>,
    /// Visibility in miles.
    pub visibility_miles: Option<f64>,
    /// Wind speed in miles per hour.
    pub wind_speed_mph: Option<f64>,
}

impl WeatherReport {
    /// Report carrying only a condition.
    #[must_use]
    pub fn new(condition: WeatherCondition) -> Self {
        Self {
            condition,
            ..Self::default()
        }
    }
}
