//! Display temperature units. The receiver always reports °F.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureUnit {
    #[default]
    Fahrenheit,
    Celsius,
}

impl TemperatureUnit {
    /// Convert a device reading. Non-finite sentinels pass through.
    pub fn convert(self, fahrenheit: f64) -> f64 {
        match self {
            TemperatureUnit::Fahrenheit => fahrenheit,
            TemperatureUnit::Celsius => (fahrenheit - 32.0) * 5.0 / 9.0,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            TemperatureUnit::Fahrenheit => "°F",
            TemperatureUnit::Celsius => "°C",
        }
    }
}
