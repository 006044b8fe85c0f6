//! Raw payloads returned by the weather API
//!
//! Every field is optional and every struct defaults, so an absent key, an
//! explicit `null` and a missing parent mapping all deserialize to `None`.
//! The one exception is `ForecastEnvelope::forecastday`, which the flattener
//! treats as required. Numeric leaves are read leniently: `69.0` for an
//! integer field or `"12.5"` for a float still map, and a value that is not a
//! number at all becomes `None` instead of failing the whole response.

use serde::Deserialize;

/// Response of `current.json`
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct CurrentWeatherResponse {
    pub location: Option<LocationPayload>,
    pub current: Option<CurrentPayload>,
}

/// The `location` block shared by every endpoint
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct LocationPayload {
    pub name: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    #[serde(deserialize_with = "lenient::float")]
    pub lat: Option<f64>,
    #[serde(deserialize_with = "lenient::float")]
    pub lon: Option<f64>,
    pub tz_id: Option<String>,
    #[serde(deserialize_with = "lenient::int")]
    pub localtime_epoch: Option<i64>,
    pub localtime: Option<String>,
}

/// The `current` block of `current.json`
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct CurrentPayload {
    #[serde(deserialize_with = "lenient::float")]
    pub temp_c: Option<f64>,
    pub condition: Option<ConditionPayload>,
    #[serde(deserialize_with = "lenient::float")]
    pub wind_kph: Option<f64>,
    #[serde(deserialize_with = "lenient::int")]
    pub wind_degree: Option<i64>,
    pub wind_dir: Option<String>,
    #[serde(deserialize_with = "lenient::int")]
    pub humidity: Option<i64>,
    #[serde(deserialize_with = "lenient::float")]
    pub feelslike_c: Option<f64>,
    #[serde(deserialize_with = "lenient::float")]
    pub uv: Option<f64>,
    #[serde(deserialize_with = "lenient::float")]
    pub gust_kph: Option<f64>,
    pub air_quality: Option<AirQualityPayload>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ConditionPayload {
    pub text: Option<String>,
    pub icon: Option<String>,
    #[serde(deserialize_with = "lenient::int")]
    pub code: Option<i64>,
}

/// Pollutant concentrations (μg/m3) and the two air quality indices
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AirQualityPayload {
    #[serde(deserialize_with = "lenient::float")]
    pub co: Option<f64>,
    #[serde(deserialize_with = "lenient::float")]
    pub no2: Option<f64>,
    #[serde(deserialize_with = "lenient::float")]
    pub o3: Option<f64>,
    #[serde(deserialize_with = "lenient::float")]
    pub so2: Option<f64>,
    #[serde(deserialize_with = "lenient::float")]
    pub pm2_5: Option<f64>,
    #[serde(deserialize_with = "lenient::float")]
    pub pm10: Option<f64>,
    #[serde(rename = "us-epa-index")]
    #[serde(deserialize_with = "lenient::int")]
    pub us_epa_index: Option<i64>,
    #[serde(rename = "gb-defra-index")]
    #[serde(deserialize_with = "lenient::int")]
    pub gb_defra_index: Option<i64>,
}

/// Response of `forecast.json` and `history.json`
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ForecastWeatherResponse {
    pub location: Option<LocationPayload>,
    pub forecast: Option<ForecastEnvelope>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ForecastEnvelope {
    pub forecastday: Option<Vec<ForecastDayPayload>>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ForecastDayPayload {
    pub date: Option<String>,
    #[serde(deserialize_with = "lenient::int")]
    pub date_epoch: Option<i64>,
    pub day: Option<DayPayload>,
}

/// Daily aggregate inside a forecast day
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct DayPayload {
    #[serde(deserialize_with = "lenient::int")]
    pub date_epoch: Option<i64>,
    #[serde(deserialize_with = "lenient::float")]
    pub maxtemp_c: Option<f64>,
    #[serde(deserialize_with = "lenient::float")]
    pub maxtemp_f: Option<f64>,
    #[serde(deserialize_with = "lenient::float")]
    pub mintemp_c: Option<f64>,
    #[serde(deserialize_with = "lenient::float")]
    pub mintemp_f: Option<f64>,
    #[serde(deserialize_with = "lenient::float")]
    pub avgtemp_c: Option<f64>,
    pub condition: Option<ConditionPayload>,
}

/// Response of `alerts.json`
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AlertWeatherResponse {
    pub alerts: Option<AlertsEnvelope>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AlertsEnvelope {
    pub alerts: Option<Vec<AlertPayload>>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AlertPayload {
    pub headline: Option<String>,
    pub severity: Option<String>,
    pub desc: Option<String>,
    #[serde(deserialize_with = "lenient::int")]
    pub date_epoch: Option<i64>,
    pub date: Option<String>,
    pub status: Option<String>,
    pub url: Option<String>,
    pub event: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().and_then(whole)),
            Some(Value::String(s)) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(whole))
            }
            _ => None,
        })
    }

    pub fn float<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        })
    }

    #[allow(clippy::cast_possible_truncation)]
    fn whole(value: f64) -> Option<i64> {
        (value.is_finite() && value.fract() == 0.0).then_some(value as i64)
    }
}
