//! Reshaping of raw API payloads into flat records
//!
//! `flatten` merges the current, forecast and alert payloads into one
//! [`FlattenedWeatherRecord`]. Every leaf falls back to `None`; the forecast
//! day list is the only path whose absence is an error.

use crate::models::payload::{
    AirQualityPayload, AlertPayload, ConditionPayload, CurrentPayload, DayPayload,
    ForecastDayPayload, LocationPayload,
};
use crate::models::{
    AirQualityRecord, AlertRecord, AlertWeatherResponse, CurrentWeatherResponse, DailySummary,
    FlattenedWeatherRecord, ForecastDayRecord, ForecastWeatherResponse,
};
use crate::{Result, WeatherStreamError};

/// Merge the three payloads of one snapshot into a single flat record.
///
/// # Errors
/// Returns [`WeatherStreamError::MissingField`] when the forecast payload has
/// no `forecast.forecastday` list. An empty list is accepted.
pub fn flatten(
    current: &CurrentWeatherResponse,
    forecast: &ForecastWeatherResponse,
    alerts: &AlertWeatherResponse,
) -> Result<FlattenedWeatherRecord> {
    let days = forecast
        .forecast
        .as_ref()
        .and_then(|f| f.forecastday.as_deref())
        .ok_or_else(|| WeatherStreamError::missing_field("forecast.forecastday"))?;

    let location = current.location.clone().unwrap_or_default();
    let now = current.current.clone().unwrap_or_default();
    let CurrentPayload {
        condition,
        air_quality,
        wind_kph,
        wind_degree,
        wind_dir,
        humidity,
        feelslike_c,
        uv,
        gust_kph,
        ..
    } = now;
    let condition = condition.unwrap_or_default();

    let alert_list = alerts
        .alerts
        .as_ref()
        .and_then(|a| a.alerts.as_deref())
        .unwrap_or_default();

    Ok(FlattenedWeatherRecord {
        name: location.name,
        country: location.country,
        region: location.region,
        lat: location.lat,
        lon: location.lon,
        localtime_epoch: location.localtime_epoch,
        localtime: location.localtime,
        condition_text: condition.text,
        condition_icon: condition.icon,
        condition_code: condition.code,
        wind_kph,
        wind_degree,
        wind_dir,
        humidity,
        feelslike_c,
        uv,
        gust_kph,
        air_quality: air_quality_record(air_quality.unwrap_or_default()),
        alerts: alert_list.iter().map(alert_record).collect(),
        forecast: days.iter().map(forecast_day_record).collect(),
    })
}

fn air_quality_record(aq: AirQualityPayload) -> AirQualityRecord {
    AirQualityRecord {
        co: aq.co,
        no2: aq.no2,
        o3: aq.o3,
        so2: aq.so2,
        pm2_5: aq.pm2_5,
        pm10: aq.pm10,
        us_epa_index: aq.us_epa_index,
        gb_defra_index: aq.gb_defra_index,
    }
}

fn alert_record(alert: &AlertPayload) -> AlertRecord {
    let alert = alert.clone();
    AlertRecord {
        headline: alert.headline,
        severity: alert.severity,
        desc: alert.desc,
        date_epoch: alert.date_epoch,
        date: alert.date,
        status: alert.status,
        url: alert.url,
        event: alert.event,
        kind: alert.kind,
    }
}

fn forecast_day_record(entry: &ForecastDayPayload) -> ForecastDayRecord {
    let day = entry.day.clone().unwrap_or_default();
    let condition = day.condition.clone().unwrap_or_default();
    ForecastDayRecord {
        date: entry.date.clone(),
        date_epoch: day.date_epoch,
        maxtemp_c: day.maxtemp_c,
        maxtemp_f: day.maxtemp_f,
        mintemp_c: day.mintemp_c,
        mintemp_f: day.mintemp_f,
        condition: condition.text,
        condition_icon: condition.icon,
    }
}

/// Summarize one `history.json` response as a table row for `date`.
///
/// # Errors
/// Returns [`WeatherStreamError::MissingField`] when the response holds no
/// forecast day or the first day has no `day` block.
pub fn summarize_history(date: &str, response: &ForecastWeatherResponse) -> Result<DailySummary> {
    let first = response
        .forecast
        .as_ref()
        .and_then(|f| f.forecastday.as_ref())
        .and_then(|days| days.first())
        .ok_or_else(|| WeatherStreamError::missing_field("forecast.forecastday[0]"))?;
    let DayPayload {
        avgtemp_c,
        maxtemp_c,
        mintemp_c,
        condition,
        ..
    } = first
        .day
        .clone()
        .ok_or_else(|| WeatherStreamError::missing_field("forecast.forecastday[0].day"))?;
    let LocationPayload { name, country, .. } = response.location.clone().unwrap_or_default();

    Ok(DailySummary {
        date: date.to_string(),
        location: name,
        country,
        avg_temp_c: avgtemp_c,
        max_temp_c: maxtemp_c,
        min_temp_c: mintemp_c,
        condition: condition.and_then(|c| c.text),
    })
}

/// Summarize a `current.json` response as a single table row.
///
/// The instantaneous temperature fills the average, max and min columns.
///
/// # Errors
/// Returns [`WeatherStreamError::MissingField`] when the response has no
/// `current` block.
pub fn summarize_current(response: &CurrentWeatherResponse) -> Result<DailySummary> {
    let current = response
        .current
        .as_ref()
        .ok_or_else(|| WeatherStreamError::missing_field("current"))?;
    let location = response.location.clone().unwrap_or_default();
    let ConditionPayload { text, .. } = current.condition.clone().unwrap_or_default();

    Ok(DailySummary {
        date: location.localtime.unwrap_or_default(),
        location: location.name,
        country: location.country,
        avg_temp_c: current.temp_c,
        max_temp_c: current.temp_c,
        min_temp_c: current.temp_c,
        condition: text,
    })
}
