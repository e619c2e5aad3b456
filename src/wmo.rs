use serde::Serialize;

/// Label and icon for a WMO weather interpretation code.
/// See: https://open-meteo.com/en/docs#weathervariables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeatherLabel {
    pub label: &'static str,
    pub icon: &'static str,
}

pub const PLACEHOLDER: WeatherLabel = WeatherLabel {
    label: "—",
    icon: "ℹ️",
};

pub const KNOWN_CODES: [i32; 26] = [
    0, 1, 2, 3, 45, 48, 51, 53, 55, 61, 63, 65, 66, 67, 71, 73, 75, 77, 80, 81, 82, 85,
    86, 95, 96, 99,
];

const fn label(label: &'static str, icon: &'static str) -> Option<WeatherLabel> {
    Some(WeatherLabel { label, icon })
}

fn known(code: i32) -> Option<WeatherLabel> {
    match code {
        0 => label("Clear", "☀️"),
        1 => label("Mainly clear", "🌤️"),
        2 => label("Partly cloudy", "⛅"),
        3 => label("Overcast", "☁️"),
        45 => label("Fog", "🌫️"),
        48 => label("Rime fog", "🌫️"),
        51 => label("Light Drizzle", "🌦️"),
        53 => label("Drizzle", "🌦️"),
        55 => label("Heavy Drizzle", "🌧️"),
        61 => label("Light Rain", "🌧️"),
        63 => label("Rain", "🌧️"),
        65 => label("Heavy Rain", "🌧️"),
        66 | 67 => label("Freezing Rain", "🌧️"),
        71 => label("Light Snow", "🌨️"),
        73 => label("Snow", "🌨️"),
        75 => label("Heavy Snow", "❄️"),
        77 => label("Snow grains", "🌨️"),
        80 => label("Rain showers", "🌦️"),
        81 => label("Rain showers", "🌧️"),
        82 => label("Violent showers", "⛈️"),
        85 => label("Snow showers", "🌨️"),
        86 => label("Snow showers", "❄️"),
        95 => label("Thunderstorm", "⛈️"),
        96 | 99 => label("Thunder w/ hail", "⛈️"),
        _ => None,
    }
}

/// Resolve a code, falling back to [`PLACEHOLDER`] for anything unrecognized.
pub fn lookup(code: i32) -> WeatherLabel {
    known(code).unwrap_or(PLACEHOLDER)
}

/// Same as [`lookup`] for codes the API may report as `null`.
pub fn describe(code: Option<i32>) -> WeatherLabel {
    code.map(lookup).unwrap_or(PLACEHOLDER)
}

pub fn is_known(code: i32) -> bool {
    known(code).is_some()
}
