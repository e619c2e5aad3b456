use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Body returned by the Open-Meteo forecast endpoint for the fields we request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
    pub current: CurrentConditions,
    pub daily: DailySeries,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentConditions {
    /// Local ISO time without offset, e.g. `2024-05-01T14:15`.
    pub time: String,
    pub temperature_2m: f64,
    pub weather_code: Option<i32>,
    pub apparent_temperature: f64,
    pub relative_humidity_2m: f64,
    pub wind_speed_10m: f64,
}

/// Column-oriented daily aggregates; index `i` of every column belongs to `time[i]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DailySeries {
    pub time: Vec<String>,
    #[serde(default)]
    pub weather_code: Vec<Option<i32>>,
    #[serde(default)]
    pub temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    pub temperature_2m_min: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherSnapshot {
    pub temperature: f64,
    pub apparent_temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub weather_code: Option<i32>,
    pub observation_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyForecast {
    pub date: String,
    pub weather_code: Option<i32>,
    pub temperature_max: Option<f64>,
    pub temperature_min: Option<f64>,
}

impl DailyForecast {
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()
    }
}

impl WeatherSnapshot {
    pub fn parsed_time(&self) -> Option<NaiveDateTime> {
        parse_local_time(&self.observation_time)
    }
}

/// Open-Meteo omits seconds; accept both forms.
pub fn parse_local_time(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

impl ForecastResponse {
    pub fn snapshot(&self) -> WeatherSnapshot {
        let c = &self.current;
        WeatherSnapshot {
            temperature: c.temperature_2m,
            apparent_temperature: c.apparent_temperature,
            humidity: c.relative_humidity_2m,
            wind_speed: c.wind_speed_10m,
            weather_code: c.weather_code,
            observation_time: c.time.clone(),
        }
    }

    /// One entry per `daily.time` element, in API order. Short columns leave
    /// the missing values empty.
    pub fn daily_entries(&self) -> Vec<DailyForecast> {
        let d = &self.daily;
        d.time
            .iter()
            .enumerate()
            .map(|(i, date)| DailyForecast {
                date: date.clone(),
                weather_code: d.weather_code.get(i).copied().flatten(),
                temperature_max: d.temperature_2m_max.get(i).copied().flatten(),
                temperature_min: d.temperature_2m_min.get(i).copied().flatten(),
            })
            .collect()
    }
}
