use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    Temperature,
    Co2,
    Humidity,
    Moisture,
}

/// Evaluation order for a cycle. Matches configuration declaration order;
/// email content depends on it being stable.
pub const METRIC_ORDER: [Metric; 4] = [
    Metric::Temperature,
    Metric::Co2,
    Metric::Humidity,
    Metric::Moisture,
];

impl Metric {
    pub fn key_name(self) -> &'static str {
        match self {
            Metric::Temperature => "temp",
            Metric::Co2 => "co2",
            Metric::Humidity => "humidity",
            Metric::Moisture => "moisture",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Metric::Temperature => "TEMPERATURE",
            Metric::Co2 => "CO2",
            Metric::Humidity => "HUMIDITY",
            Metric::Moisture => "SOIL MOISTURE",
        }
    }

    pub fn from_key(key: &str) -> Option<Metric> {
        match key {
            "temp" | "temperature" => Some(Metric::Temperature),
            "co2" => Some(Metric::Co2),
            "humidity" => Some(Metric::Humidity),
            "moisture" => Some(Metric::Moisture),
            _ => None,
        }
    }

    /// Reading rendered with the metric's unit and precision, e.g. "87.0°F",
    /// "1600 ppm".
    pub fn format_value(self, value: f64) -> String {
        match self {
            Metric::Temperature => format!("{value:.1}°F"),
            Metric::Co2 => format!("{value:.0} ppm"),
            Metric::Humidity | Metric::Moisture => format!("{value:.1}%"),
        }
    }

    /// Threshold rendered without a trailing ".0" when integral, so messages
    /// read "threshold: 85°F" rather than "threshold: 85.0°F".
    pub fn format_threshold(self, threshold: f64) -> String {
        let number = if threshold.fract() == 0.0 {
            format!("{threshold:.0}")
        } else {
            format!("{threshold}")
        };
        match self {
            Metric::Temperature => format!("{number}°F"),
            Metric::Co2 => format!("{number} ppm"),
            Metric::Humidity | Metric::Moisture => format!("{number}%"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    High,
    Low,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::High => "high",
            Direction::Low => "low",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Direction::High => "HIGH",
            Direction::Low => "LOW",
        }
    }
}

/// Stable dedup key for one metric+direction, e.g. "temp_high".
pub fn alert_key(metric: Metric, direction: Direction) -> String {
    format!("{}_{}", metric.key_name(), direction.as_str())
}

/// One sampling cycle of averaged readings. A `None` field means the sensor
/// produced no data this cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Readings {
    pub co2_ppm: Option<f64>,
    pub temp_f: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub moisture_pct: Option<f64>,
}

impl Readings {
    pub fn value(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Temperature => self.temp_f,
            Metric::Co2 => self.co2_ppm,
            Metric::Humidity => self.humidity_pct,
            Metric::Moisture => self.moisture_pct,
        }
    }
}
