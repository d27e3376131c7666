use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    pub start_date: String,
    pub end_date: String,
}

// Subset of the OpenWeatherMap payloads we read.
#[derive(Debug, Deserialize)]
pub struct CurrentWeather {
    pub coord: Coordinates,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub list: Vec<ForecastEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastEntry {
    pub dt: i64,
    pub main: ForecastMain,
    #[serde(default)]
    pub weather: Vec<ForecastCondition>,
    #[serde(default)]
    pub wind: Option<ForecastWind>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastMain {
    pub temp: f64,
    pub humidity: f64,
}

#[derive(Debug, Deserialize)]
pub struct ForecastCondition {
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Deserialize)]
pub struct ForecastWind {
    #[serde(default)]
    pub speed: f64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct DailyForecast {
    pub date: String,
    pub temperature: f64,
    pub description: String,
    pub icon: String,
    pub humidity: f64,
    pub wind_speed: f64,
}

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ForecastSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast_days: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct WeatherForecast {
    pub summary: ForecastSummary,
    pub daily_forecasts: Vec<DailyForecast>,
}
