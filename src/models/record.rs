//! Flattened record handed to the event sink
//!
//! Field names here are a wire contract with downstream consumers. Absent
//! values serialize as `null`, the keys themselves are always present.

use serde::{Deserialize, Serialize};

/// One denormalized snapshot of current conditions, alerts and forecast
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlattenedWeatherRecord {
    pub name: Option<String>,
    pub country: Option<String>,
    pub region: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub localtime_epoch: Option<i64>,
    pub localtime: Option<String>,
    pub condition_text: Option<String>,
    pub condition_icon: Option<String>,
    pub condition_code: Option<i64>,
    pub wind_kph: Option<f64>,
    pub wind_degree: Option<i64>,
    pub wind_dir: Option<String>,
    pub humidity: Option<i64>,
    pub feelslike_c: Option<f64>,
    pub uv: Option<f64>,
    pub gust_kph: Option<f64>,
    pub air_quality: AirQualityRecord,
    pub alerts: Vec<AlertRecord>,
    pub forecast: Vec<ForecastDayRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AirQualityRecord {
    pub co: Option<f64>,
    pub no2: Option<f64>,
    pub o3: Option<f64>,
    pub so2: Option<f64>,
    pub pm2_5: Option<f64>,
    pub pm10: Option<f64>,
    #[serde(rename = "us-epa-index")]
    pub us_epa_index: Option<i64>,
    #[serde(rename = "gb-defra-index")]
    pub gb_defra_index: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub headline: Option<String>,
    pub severity: Option<String>,
    pub desc: Option<String>,
    pub date_epoch: Option<i64>,
    pub date: Option<String>,
    pub status: Option<String>,
    pub url: Option<String>,
    pub event: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastDayRecord {
    pub date: Option<String>,
    pub date_epoch: Option<i64>,
    pub maxtemp_c: Option<f64>,
    pub maxtemp_f: Option<f64>,
    pub mintemp_c: Option<f64>,
    pub mintemp_f: Option<f64>,
    /// Condition text of the day
    pub condition: Option<String>,
    pub condition_icon: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn keys(value: &Value) -> Vec<String> {
        let mut keys: Vec<String> = value
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    #[test]
    fn test_default_record_serializes_every_key_as_null() {
        let value = serde_json::to_value(FlattenedWeatherRecord::default()).unwrap();
        assert_eq!(value.as_object().unwrap().len(), 20);
        assert_eq!(value["name"], Value::Null);
        assert_eq!(value["gust_kph"], Value::Null);
        assert_eq!(value["alerts"], json!([]));
        assert_eq!(value["forecast"], json!([]));
        assert_eq!(
            keys(&value["air_quality"]),
            vec!["co", "gb-defra-index", "no2", "o3", "pm10", "pm2_5", "so2", "us-epa-index"]
        );
    }

    #[test]
    fn test_alert_and_forecast_key_names() {
        let alert = serde_json::to_value(AlertRecord::default()).unwrap();
        assert_eq!(
            keys(&alert),
            vec![
                "date", "date_epoch", "desc", "event", "headline", "severity", "status", "type",
                "url"
            ]
        );

        let day = serde_json::to_value(ForecastDayRecord::default()).unwrap();
        assert_eq!(
            keys(&day),
            vec![
                "condition",
                "condition_icon",
                "date",
                "date_epoch",
                "maxtemp_c",
                "maxtemp_f",
                "mintemp_c",
                "mintemp_f"
            ]
        );
    }
}
