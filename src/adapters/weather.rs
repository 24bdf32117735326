//! OpenWeatherMap current-weather adapter.
//!
//! Two upstream client errors carry a known meaning and get their own error
//! variants: 404 means the city was not found (user-input error) and 401
//! means the API key is bad (operator error). Everything else collapses into
//! the generic transport/status failures.

use crate::adapters::{expect_json_content_type, REQUEST_TIMEOUT};
use crate::embeds::{colors, LogEmbed};
use crate::errors::{Error, Result};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{error, info};

const BASE_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    name: Option<String>,
    sys: Option<SysSection>,
    main: Option<MainSection>,
}

#[derive(Debug, Deserialize)]
struct SysSection {
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MainSection {
    temp: Option<f64>,
    temp_max: Option<f64>,
    temp_min: Option<f64>,
}

/// Current/high/low temperatures for one city, in whole degrees Celsius.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherReport {
    pub city: String,
    /// ISO country code, when the upstream provides one.
    pub country: Option<String>,
    pub current_c: i32,
    pub high_c: i32,
    pub low_c: i32,
}

/// Exact Fahrenheit conversion used everywhere the report is displayed:
/// `F = round(C * 1.8 + 32)`.
pub fn celsius_to_fahrenheit(celsius: i32) -> i32 {
    (f64::from(celsius) * 1.8 + 32.0).round() as i32
}

impl WeatherReport {
    /// Renders the report as a purple embed with High/Low fields and a flag
    /// thumbnail when the country is known.
    pub fn embed(&self) -> LogEmbed {
        let mut embed = LogEmbed::new(format!("Weather in {}", self.city), colors::PURPLE)
            .description(format!(
                "The current temperature is {}°C ({}°F).",
                self.current_c,
                celsius_to_fahrenheit(self.current_c)
            ))
            .field(
                "High",
                format!(
                    "↑ {}°C ({}°F)",
                    self.high_c,
                    celsius_to_fahrenheit(self.high_c)
                ),
                true,
            )
            .field(
                "Low",
                format!(
                    "↓ {}°C ({}°F)",
                    self.low_c,
                    celsius_to_fahrenheit(self.low_c)
                ),
                true,
            )
            .footer("Data provided by OpenWeatherMap");
        if let Some(country) = &self.country {
            embed = embed.thumbnail(format!("https://flagsapi.com/{country}/flat/64.png"));
        }
        embed
    }
}

/// Fetches current weather for `city` (metric units).
///
/// # Errors
/// [`Error::CityNotFound`] on upstream 404, [`Error::BadApiKey`] on 401,
/// plus the shared transport/shape failures.
pub async fn fetch_weather(
    client: &reqwest::Client,
    api_key: &str,
    city: &str,
) -> Result<WeatherReport> {
    info!(city, "requesting weather from OpenWeatherMap");
    let response = client
        .get(BASE_URL)
        .query(&[("q", city), ("appid", api_key), ("units", "metric")])
        .timeout(REQUEST_TIMEOUT)
        .send()
        .await?;

    classify_status(response.status())?;
    expect_json_content_type(&response, BASE_URL)?;

    let data: WeatherResponse = response.json().await?;
    let report = report_from_response(city, data)?;
    info!(city = %report.city, "successfully built weather report");
    Ok(report)
}

/// Maps the upstream status to the adapter's error taxonomy.
fn classify_status(status: StatusCode) -> Result<()> {
    match status {
        StatusCode::NOT_FOUND => Err(Error::CityNotFound),
        StatusCode::UNAUTHORIZED => Err(Error::BadApiKey),
        s if !s.is_success() => {
            error!(status = %s, "weather upstream returned an error status");
            Err(Error::UpstreamStatus { status: s })
        }
        _ => Ok(()),
    }
}

/// Validates the decoded payload and reduces it to a [`WeatherReport`].
fn report_from_response(requested_city: &str, data: WeatherResponse) -> Result<WeatherReport> {
    let city = data
        .name
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| requested_city.to_string());
    let country = data.sys.and_then(|sys| sys.country);
    let main = data
        .main
        .ok_or_else(|| Error::Shape("weather payload missing `main` section".into()))?;

    match (main.temp, main.temp_max, main.temp_min) {
        (Some(temp), Some(high), Some(low)) => Ok(WeatherReport {
            city,
            country,
            current_c: temp as i32,
            high_c: high as i32,
            low_c: low as i32,
        }),
        _ => {
            error!(city, "weather payload missing temperature data");
            Err(Error::Shape(
                "weather payload missing temperature data".into(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_fahrenheit_conversion_exact() {
        assert_eq!(celsius_to_fahrenheit(-40), -40);
        assert_eq!(celsius_to_fahrenheit(0), 32);
        assert_eq!(celsius_to_fahrenheit(37), 99);
    }

    #[test]
    fn test_status_classification_is_distinct() {
        assert!(matches!(
            classify_status(StatusCode::NOT_FOUND),
            Err(Error::CityNotFound)
        ));
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED),
            Err(Error::BadApiKey)
        ));
        assert!(matches!(
            classify_status(StatusCode::INTERNAL_SERVER_ERROR),
            Err(Error::UpstreamStatus { .. })
        ));
        assert!(classify_status(StatusCode::OK).is_ok());
    }

    #[test]
    fn test_toronto_report_end_to_end() {
        let data: WeatherResponse = serde_json::from_value(serde_json::json!({
            "name": "Toronto",
            "sys": { "country": "CA" },
            "main": { "temp": 20.0, "temp_max": 23.0, "temp_min": 15.0 }
        }))
        .unwrap();
        let report = report_from_response("Toronto,CA", data).unwrap();
        assert_eq!(report.current_c, 20);
        assert_eq!(celsius_to_fahrenheit(report.current_c), 68);
        assert_eq!(report.high_c, 23);
        assert_eq!(celsius_to_fahrenheit(report.high_c), 73);
        assert_eq!(report.low_c, 15);
        assert_eq!(celsius_to_fahrenheit(report.low_c), 59);

        let embed = report.embed();
        assert_eq!(embed.title, "Weather in Toronto");
        assert!(embed.description.unwrap().contains("20°C (68°F)"));
        assert!(embed.fields[0].1.contains("23°C (73°F)"));
        assert!(embed.fields[1].1.contains("15°C (59°F)"));
        assert_eq!(
            embed.thumbnail.as_deref(),
            Some("https://flagsapi.com/CA/flat/64.png")
        );
    }

    #[test]
    fn test_missing_temperatures_are_a_shape_error() {
        let data: WeatherResponse = serde_json::from_value(serde_json::json!({
            "name": "Toronto",
            "main": { "temp": 20.0 }
        }))
        .unwrap();
        assert!(matches!(
            report_from_response("Toronto", data),
            Err(Error::Shape(_))
        ));
    }

    #[test]
    fn test_missing_country_means_no_flag_thumbnail() {
        let data: WeatherResponse = serde_json::from_value(serde_json::json!({
            "name": "Atlantis",
            "main": { "temp": 1.0, "temp_max": 2.0, "temp_min": 0.0 }
        }))
        .unwrap();
        let report = report_from_response("Atlantis", data).unwrap();
        assert!(report.embed().thumbnail.is_none());
    }

    #[test]
    fn test_empty_name_falls_back_to_requested_city() {
        let data: WeatherResponse = serde_json::from_value(serde_json::json!({
            "name": "",
            "main": { "temp": 1.0, "temp_max": 2.0, "temp_min": 0.0 }
        }))
        .unwrap();
        let report = report_from_response("Springfield", data).unwrap();
        assert_eq!(report.city, "Springfield");
    }
}
