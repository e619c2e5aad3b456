//! View rendering: fills the fixed page regions from a forecast payload and
//! turns the page into an HTML document.

use crate::forecast::types::{parse_local_time, DailyForecast, ForecastResponse};
use crate::utils::{escape_html, round_half_up};
use crate::wmo;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt::Write;

pub const MISSING: &str = "—";

/// Round to the nearest integer and append a degree sign.
pub fn fmt_temp(value: f64) -> String {
    format!("{}°", round_half_up(value))
}

fn fmt_opt_temp(value: Option<f64>) -> String {
    value.map(fmt_temp).unwrap_or_else(|| MISSING.to_string())
}

/// Short weekday name for an ISO date, or the raw string if it does not parse.
pub fn day_name(date: &str) -> String {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|d| d.format("%a").to_string())
        .unwrap_or_else(|_| date.to_string())
}

pub fn fmt_observation_time(raw: &str) -> String {
    parse_local_time(raw)
        .map(|t| t.format("%a %-d %b %Y, %H:%M").to_string())
        .unwrap_or_else(|| raw.to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NowCard {
    pub temp: String,
    pub desc: String,
    pub meta: String,
    pub location: String,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayCard {
    pub name: String,
    pub emoji: String,
    pub text: String,
    pub range: String,
}

impl From<&DailyForecast> for DayCard {
    fn from(day: &DailyForecast) -> Self {
        let label = wmo::describe(day.weather_code);
        DayCard {
            name: day_name(&day.date),
            emoji: label.icon.to_string(),
            text: label.label.to_string(),
            range: format!(
                "{} / {}",
                fmt_opt_temp(day.temperature_min),
                fmt_opt_temp(day.temperature_max)
            ),
        }
    }
}

/// Page state. `None` cards are hidden; the status line disappears once the
/// view has rendered.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Page {
    pub status: Option<String>,
    pub now: Option<NowCard>,
    pub days: Option<Vec<DayCard>>,
    pub install_button_visible: bool,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_status(&mut self, message: &str) {
        self.status = Some(message.to_string());
    }

    /// Show only `message`, hiding any rendered cards.
    pub fn fail(&mut self, message: &str) {
        self.now = None;
        self.days = None;
        self.set_status(message);
    }

    pub fn to_html(&self, base_path: &str) -> String {
        let base = escape_html(base_path);
        let mut html = String::new();
        html.push_str("<!doctype html>\n<html lang=\"en\">\n<head>\n");
        html.push_str("<meta charset=\"utf-8\">\n");
        html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
        html.push_str("<title>Weather</title>\n");
        let _ = writeln!(html, "<link rel=\"stylesheet\" href=\"{base}/styles.css\">");
        let _ = writeln!(html, "<link rel=\"manifest\" href=\"{base}/manifest.webmanifest\">");
        html.push_str("</head>\n<body>\n<main>\n");

        let _ = writeln!(
            html,
            "<button id=\"installBtn\"{}>Install</button>",
            hidden(!self.install_button_visible)
        );

        if let Some(status) = &self.status {
            let _ = writeln!(html, "<p id=\"status\">{}</p>", escape_html(status));
        }

        let now = self.now.as_ref();
        let _ = writeln!(html, "<section class=\"now\"{}>", hidden(now.is_none()));
        for (id, value) in [
            ("temp", now.map(|n| n.temp.as_str())),
            ("desc", now.map(|n| n.desc.as_str())),
            ("meta", now.map(|n| n.meta.as_str())),
            ("location", now.map(|n| n.location.as_str())),
            ("time", now.map(|n| n.time.as_str())),
        ] {
            let _ = writeln!(
                html,
                "<div id=\"{id}\">{}</div>",
                escape_html(value.unwrap_or_default())
            );
        }
        html.push_str("</section>\n");

        let _ = writeln!(
            html,
            "<section class=\"forecast\"{}>\n<div id=\"days\">",
            hidden(self.days.is_none())
        );
        for day in self.days.iter().flatten() {
            let _ = writeln!(
                html,
                "<div class=\"day\"><div class=\"name\">{}</div><div class=\"emoji\">{}</div><div class=\"text\">{}</div><div class=\"range\">{}</div></div>",
                escape_html(&day.name),
                escape_html(&day.emoji),
                escape_html(&day.text),
                escape_html(&day.range),
            );
        }
        html.push_str("</div>\n</section>\n</main>\n</body>\n</html>\n");
        html
    }
}

fn hidden(is_hidden: bool) -> &'static str {
    if is_hidden {
        " hidden"
    } else {
        ""
    }
}

/// Overwrite the page regions with `forecast` and reveal both cards.
pub fn render(page: &mut Page, forecast: &ForecastResponse) {
    let current = forecast.snapshot();
    let label = wmo::describe(current.weather_code);

    page.now = Some(NowCard {
        temp: fmt_temp(current.temperature),
        desc: format!("{} {}", label.icon, label.label),
        meta: format!(
            "Feels like {} · Humidity {}% · Wind {} km/h",
            fmt_temp(current.apparent_temperature),
            current.humidity,
            round_half_up(current.wind_speed)
        ),
        location: format!(
            "{:.3}, {:.3} ({})",
            forecast.latitude, forecast.longitude, forecast.timezone
        ),
        time: fmt_observation_time(&current.observation_time),
    });

    page.days = Some(forecast.daily_entries().iter().map(DayCard::from).collect());
    page.status = None;
}
