//! Shaping of raw provider payloads into display-ready view models.
//!
//! Every builder accepts an optional raw JSON payload and degrades to an
//! empty or sentinel result when the payload (or part of it) is missing or
//! has an unexpected shape. Nothing here returns an error.

use serde_json::Value;

use crate::condition::WeatherCondition;
use crate::time::{LocalClock, NOT_AVAILABLE};
use crate::types::{Coordinates, CurrentConditions, DailyEntry, HourlyEntry, SunTimes};

/// Hours shown in the hourly outlook.
pub const HOURLY_LIMIT: usize = 24;

/// Index of the first day in the daily outlook. Day 0 is today, which the
/// hourly outlook already covers.
pub const DAILY_OFFSET: usize = 1;

/// Days shown in the daily outlook.
pub const DAILY_DAYS: usize = 5;

/// `Math.round` semantics: halves round toward positive infinity.
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

fn number(values: Option<&Value>, key: &str) -> Option<f64> {
    values?.get(key)?.as_f64()
}

fn rounded(values: Option<&Value>, key: &str) -> Option<i64> {
    number(values, key).map(round_half_up)
}

fn code(values: Option<&Value>, key: &str) -> Option<i64> {
    let raw = values?.get(key)?;
    raw.as_i64().or_else(|| raw.as_f64().map(|c| c as i64))
}

fn timeline<'a>(forecast: Option<&'a Value>, name: &str) -> Option<&'a [Value]> {
    forecast?
        .get("timelines")?
        .get(name)?
        .as_array()
        .map(Vec::as_slice)
}

fn coordinates(forecast: Option<&Value>) -> Option<Coordinates> {
    let location = forecast?.get("location")?;
    Some(Coordinates {
        lat: location.get("lat")?.as_f64()?,
        lon: location.get("lon")?.as_f64()?,
    })
}

fn local_time(clock: &LocalClock, raw: Option<&Value>, coords: Option<Coordinates>) -> String {
    match raw.and_then(Value::as_str) {
        Some(utc) => clock.to_local_time(utc, coords),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// The first [`HOURLY_LIMIT`] entries of `timelines.hourly`, in order.
pub fn build_hourly(forecast: Option<&Value>, clock: &LocalClock) -> Vec<HourlyEntry> {
    let Some(hourly) = timeline(forecast, "hourly") else {
        return Vec::new();
    };
    let coords = coordinates(forecast);

    hourly
        .iter()
        .take(HOURLY_LIMIT)
        .map(|hour| {
            let values = hour.get("values");
            let weather_code = code(values, "weatherCode");
            HourlyEntry {
                time: local_time(clock, hour.get("time"), coords),
                temperature: rounded(values, "temperature"),
                weather_code,
                condition: WeatherCondition::from_optional_code(weather_code),
                humidity: rounded(values, "humidity"),
                wind_speed: rounded(values, "windSpeed"),
                precipitation_chance: rounded(values, "precipitationProbability"),
            }
        })
        .collect()
}

/// Days `[DAILY_OFFSET, DAILY_OFFSET + DAILY_DAYS)` of `timelines.daily`.
///
/// Day names and dates are rendered in the clock's zone whatever the
/// queried location.
pub fn build_daily(forecast: Option<&Value>, clock: &LocalClock) -> Vec<DailyEntry> {
    let Some(daily) = timeline(forecast, "daily") else {
        return Vec::new();
    };

    daily
        .iter()
        .skip(DAILY_OFFSET)
        .take(DAILY_DAYS)
        .map(|day| {
            let values = day.get("values");
            let weather_code = code(values, "weatherCodeMax");
            let (day_name, date) = match day.get("time").and_then(Value::as_str) {
                Some(utc) => (clock.day_name(utc), clock.calendar_date(utc)),
                None => (NOT_AVAILABLE.to_string(), NOT_AVAILABLE.to_string()),
            };
            DailyEntry {
                day: day_name,
                date,
                temperature_avg: rounded(values, "temperatureAvg"),
                weather_code,
                condition: WeatherCondition::from_optional_code(weather_code),
                humidity: rounded(values, "humidityAvg"),
                wind_speed: rounded(values, "windGustMax").unwrap_or(0),
                precipitation_chance: rounded(values, "precipitationProbabilityAvg").unwrap_or(0),
            }
        })
        .collect()
}

/// Sunrise and sunset of `daily[0]`, or `N/A` for each.
pub fn build_sun_times(forecast: Option<&Value>, clock: &LocalClock) -> SunTimes {
    let Some(values) = timeline(forecast, "daily")
        .and_then(<[Value]>::first)
        .and_then(|today| today.get("values"))
        .filter(|values| values.is_object())
    else {
        return SunTimes::unavailable();
    };
    let coords = coordinates(forecast);

    SunTimes {
        sunrise: local_time(clock, values.get("sunriseTime"), coords),
        sunset: local_time(clock, values.get("sunsetTime"), coords),
    }
}

/// Current conditions from a realtime payload's `data.values`.
pub fn build_current(realtime: Option<&Value>) -> Option<CurrentConditions> {
    let values = realtime?
        .get("data")?
        .get("values")
        .filter(|values| values.is_object())?;
    let values = Some(values);
    let weather_code = code(values, "weatherCode");

    Some(CurrentConditions {
        temperature: rounded(values, "temperature"),
        apparent_temperature: rounded(values, "temperatureApparent"),
        humidity: rounded(values, "humidity"),
        wind_speed: rounded(values, "windSpeed"),
        pressure: rounded(values, "pressureSeaLevel"),
        uv_index: number(values, "uvIndex"),
        visibility: number(values, "visibility"),
        weather_code,
        condition: WeatherCondition::from_optional_code(weather_code),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use serde_json::json;

    fn hour(i: usize) -> Value {
        json!({
            "time": format!("2025-11-16T{:02}:30:00Z", i % 24),
            "values": {
                "temperature": 20.5 + i as f64,
                "humidity": 55.4,
                "windSpeed": 3.5,
                "precipitationProbability": 10,
                "weatherCode": if i % 2 == 0 { 1000 } else { 4001 }
            }
        })
    }

    fn day(i: usize) -> Value {
        json!({
            "time": format!("2025-11-{:02}T00:30:00Z", 16 + i),
            "values": {
                "temperatureAvg": 24.49,
                "humidityAvg": 60.5,
                "windGustMax": 12.2,
                "precipitationProbabilityAvg": 5,
                "weatherCodeMax": 1101,
                "sunriseTime": format!("2025-11-{:02}T01:05:00Z", 16 + i),
                "sunsetTime": format!("2025-11-{:02}T12:00:00Z", 16 + i)
            }
        })
    }

    fn forecast(hours: usize, days: usize) -> Value {
        json!({
            "timelines": {
                "hourly": (0..hours).map(hour).collect::<Vec<_>>(),
                "daily": (0..days).map(day).collect::<Vec<_>>()
            },
            "location": {"lat": 28.6, "lon": 77.2}
        })
    }

    #[test]
    fn test_round_half_up_matches_math_round() {
        assert_eq!(round_half_up(2.5), 3);
        assert_eq!(round_half_up(2.49), 2);
        assert_eq!(round_half_up(-2.5), -2);
        assert_eq!(round_half_up(-2.51), -3);
    }

    #[test]
    fn test_end_to_end_scenario() {
        let clock = LocalClock::default();
        let payload = forecast(30, 7);

        let hourly = build_hourly(Some(&payload), &clock);
        assert_eq!(hourly.len(), 24);
        assert_eq!(hourly[0].time, "06:00 AM");
        assert_eq!(hourly[0].temperature, Some(21));
        assert_eq!(hourly[23].temperature, Some(44));
        assert_eq!(hourly[1].condition, WeatherCondition::Rain);

        let daily = build_daily(Some(&payload), &clock);
        assert_eq!(daily.len(), 5);
        // Window starts at daily[1] (17 November, a Monday)
        assert_eq!(daily[0].day, "Monday");
        assert_eq!(daily[0].date, "17 November");
        assert_eq!(daily[4].date, "21 November");

        let sun = build_sun_times(Some(&payload), &clock);
        assert_eq!(sun.sunrise, "06:35 AM");
        assert_eq!(sun.sunset, "05:30 PM");
    }

    #[test]
    fn test_hourly_entry_fields() {
        let clock = LocalClock::default();
        let hourly = build_hourly(Some(&forecast(1, 0)), &clock);

        assert_eq!(
            hourly,
            vec![HourlyEntry {
                time: "06:00 AM".to_string(),
                temperature: Some(21),
                weather_code: Some(1000),
                condition: WeatherCondition::Clear,
                humidity: Some(55),
                wind_speed: Some(4),
                precipitation_chance: Some(10),
            }]
        );
    }

    #[test]
    fn test_daily_entry_fields() {
        let clock = LocalClock::default();
        let daily = build_daily(Some(&forecast(0, 2)), &clock);

        assert_eq!(daily.len(), 1);
        let entry = &daily[0];
        assert_eq!(entry.temperature_avg, Some(24));
        assert_eq!(entry.humidity, Some(61));
        assert_eq!(entry.wind_speed, 12);
        assert_eq!(entry.precipitation_chance, 5);
        assert_eq!(entry.condition, WeatherCondition::PartlyCloudy);
    }

    #[test]
    fn test_daily_defaults_missing_wind_and_precipitation() {
        let clock = LocalClock::default();
        let payload = json!({
            "timelines": {
                "daily": [
                    {"time": "2025-11-16T00:30:00Z", "values": {}},
                    {"time": "2025-11-17T00:30:00Z", "values": {"temperatureAvg": 18.0}}
                ]
            }
        });
        let daily = build_daily(Some(&payload), &clock);

        assert_eq!(daily[0].wind_speed, 0);
        assert_eq!(daily[0].precipitation_chance, 0);
        assert_eq!(daily[0].humidity, None);
        assert_eq!(daily[0].condition, WeatherCondition::Unknown);
    }

    #[test]
    fn test_short_series() {
        let clock = LocalClock::default();
        let payload = forecast(5, 1);
        assert_eq!(build_hourly(Some(&payload), &clock).len(), 5);
        assert!(build_daily(Some(&payload), &clock).is_empty());
    }

    #[test]
    fn test_empty_inputs() {
        let clock = LocalClock::default();
        assert!(build_hourly(None, &clock).is_empty());
        assert!(build_daily(Some(&json!({})), &clock).is_empty());
        assert!(build_daily(Some(&json!({"timelines": {"daily": "soon"}})), &clock).is_empty());
        assert_eq!(build_sun_times(None, &clock), SunTimes::unavailable());
        assert_eq!(build_sun_times(Some(&Value::Null), &clock), SunTimes::unavailable());
        assert!(build_current(None).is_none());
        assert!(build_current(Some(&json!({"data": {}}))).is_none());
    }

    #[test]
    fn test_sun_times_without_values() {
        let clock = LocalClock::default();
        let payload = json!({"timelines": {"daily": [{"time": "2025-11-16T00:30:00Z"}]}});
        assert_eq!(build_sun_times(Some(&payload), &clock), SunTimes::unavailable());

        let payload = json!({"timelines": {"daily": []}});
        assert_eq!(build_sun_times(Some(&payload), &clock), SunTimes::unavailable());
    }

    #[test]
    fn test_sun_times_use_first_day_only() {
        let clock = LocalClock::default();
        let mut payload = forecast(0, 3);
        payload["timelines"]["daily"][1]["values"]["sunriseTime"] = json!("2025-11-17T03:00:00Z");

        let sun = build_sun_times(Some(&payload), &clock);
        assert_eq!(sun.sunrise, "06:35 AM");

        payload["timelines"]["daily"][0]["values"]
            .as_object_mut()
            .unwrap()
            .remove("sunsetTime");
        let sun = build_sun_times(Some(&payload), &clock);
        assert_eq!(sun.sunset, NOT_AVAILABLE);
    }

    #[test]
    fn test_hourly_without_location_still_converts() {
        let clock = LocalClock::default();
        let payload = json!({"timelines": {"hourly": [hour(3)]}});
        let hourly = build_hourly(Some(&payload), &clock);
        assert_eq!(hourly[0].time, "09:00 AM");
    }

    #[test]
    fn test_current_conditions() {
        let realtime = json!({
            "data": {
                "values": {
                    "temperature": 31.6,
                    "temperatureApparent": 35.2,
                    "humidity": 48,
                    "windSpeed": 2.4,
                    "pressureSeaLevel": 1008.7,
                    "uvIndex": 3,
                    "visibility": 9.87,
                    "weatherCode": 1100
                }
            },
            "location": {"name": "Delhi, India", "lat": 28.6, "lon": 77.2}
        });
        let current = build_current(Some(&realtime)).unwrap();

        assert_eq!(current.temperature, Some(32));
        assert_eq!(current.apparent_temperature, Some(35));
        assert_eq!(current.humidity, Some(48));
        assert_eq!(current.wind_speed, Some(2));
        assert_eq!(current.pressure, Some(1009));
        assert_eq!(current.uv_index, Some(3.0));
        assert_eq!(current.visibility, Some(9.87));
        assert_eq!(current.condition, WeatherCondition::PartlyCloudy);
    }
}
