use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::config::Settings;
use crate::error::{AppError, AppResult};
use crate::models::weather::{
    Coordinates, CurrentWeather, DailyForecast, ForecastResponse, ForecastSummary, WeatherForecast,
};

/// Proxy for the OpenWeatherMap 5-day forecast.
#[derive(Clone)]
pub struct WeatherService {
    api_key: Option<String>,
    base_url: String,
    client: reqwest::Client,
}

impl WeatherService {
    pub fn new(settings: &Settings) -> Self {
        Self {
            api_key: settings.openweather_api_key.clone(),
            base_url: settings.openweather_base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub async fn forecast(
        &self,
        city: &str,
        start_date: &str,
        end_date: &str,
    ) -> AppResult<WeatherForecast> {
        let start = parse_date_bound(start_date, false)?;
        let end = parse_date_bound(end_date, true)?;
        if end < start {
            return Err(AppError::InvalidInput(
                "end_date must not be before start_date".to_string(),
            ));
        }

        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::ServiceUnavailable("Weather service not configured".to_string()))?;

        let coords = self.city_coordinates(city, api_key).await?;

        let response = self
            .client
            .get(format!("{}/forecast", self.base_url))
            .query(&[
                ("lat", coords.lat.to_string()),
                ("lon", coords.lon.to_string()),
                ("appid", api_key.to_string()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Weather request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "Weather API returned error status: {}",
                response.status()
            )));
        }

        let data = response
            .json::<ForecastResponse>()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to parse weather data: {}", e)))?;

        Ok(process_forecast(&data, start, end))
    }

    async fn city_coordinates(&self, city: &str, api_key: &str) -> AppResult<Coordinates> {
        let response = self
            .client
            .get(format!("{}/weather", self.base_url))
            .query(&[("q", city), ("appid", api_key)])
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("City lookup failed: {}", e)))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(
                "Weather data not available for this location".to_string(),
            ));
        }
        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "Weather API returned error status: {}",
                response.status()
            )));
        }

        response
            .json::<CurrentWeather>()
            .await
            .map(|current| current.coord)
            .map_err(|e| AppError::Upstream(format!("Failed to parse city lookup: {}", e)))
    }
}

/// Accepts RFC 3339 timestamps, naive `YYYY-MM-DDTHH:MM:SS` (read as UTC) or a
/// bare date. A bare end date covers the whole day.
fn parse_date_bound(raw: &str, end_of_day: bool) -> AppResult<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let time = if end_of_day {
            date.and_hms_opt(23, 59, 59)
        } else {
            date.and_hms_opt(0, 0, 0)
        };
        if let Some(naive) = time {
            return Ok(naive.and_utc());
        }
    }
    Err(AppError::InvalidInput(format!("Invalid date: {}", raw)))
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Keeps the forecast entries inside `[start, end]` and summarises their
/// temperatures. An empty range yields an empty summary.
pub fn process_forecast(
    data: &ForecastResponse,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> WeatherForecast {
    let daily_forecasts: Vec<DailyForecast> = data
        .list
        .iter()
        .filter_map(|entry| {
            let at = DateTime::from_timestamp(entry.dt, 0)?;
            if at < start || at > end {
                return None;
            }
            let condition = entry.weather.first();
            Some(DailyForecast {
                date: at.to_rfc3339(),
                temperature: entry.main.temp,
                description: condition.map(|c| c.description.clone()).unwrap_or_default(),
                icon: condition.map(|c| c.icon.clone()).unwrap_or_default(),
                humidity: entry.main.humidity,
                wind_speed: entry.wind.as_ref().map(|w| w.speed).unwrap_or(0.0),
            })
        })
        .collect();

    if daily_forecasts.is_empty() {
        return WeatherForecast {
            summary: ForecastSummary::default(),
            daily_forecasts,
        };
    }

    let temps = daily_forecasts.iter().map(|f| f.temperature);
    let count = daily_forecasts.len();
    let average = temps.clone().sum::<f64>() / count as f64;
    let min = temps.clone().fold(f64::INFINITY, f64::min);
    let max = temps.fold(f64::NEG_INFINITY, f64::max);

    WeatherForecast {
        summary: ForecastSummary {
            average_temperature: Some(round1(average)),
            min_temperature: Some(round1(min)),
            max_temperature: Some(round1(max)),
            forecast_days: Some(count),
        },
        daily_forecasts,
    }
}
