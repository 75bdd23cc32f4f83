use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default)]
    pub low: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlertsConfig {
    #[serde(default)]
    pub temperature: ThresholdConfig,
    #[serde(default)]
    pub co2: ThresholdConfig,
    #[serde(default)]
    pub humidity: ThresholdConfig,
    #[serde(default)]
    pub moisture: ThresholdConfig,
    #[serde(default = "default_dedup")]
    pub dedup: bool,
}

fn default_dedup() -> bool {
    true
}

impl Default for AlertsConfig {
    fn default() -> Self {
        AlertsConfig {
            temperature: ThresholdConfig {
                enabled: false,
                high: Some(85.0),
                low: Some(70.0),
            },
            co2: ThresholdConfig {
                enabled: false,
                high: Some(1500.0),
                low: None,
            },
            humidity: ThresholdConfig {
                enabled: false,
                high: Some(85.0),
                low: Some(65.0),
            },
            moisture: ThresholdConfig {
                enabled: false,
                high: None,
                low: Some(20.0),
            },
            dedup: true,
        }
    }
}

impl AlertsConfig {
    /// Per-metric thresholds in declaration order. The evaluator relies on
    /// this order for reproducible message aggregation.
    pub fn metrics(&self) -> [(&'static str, &ThresholdConfig); 4] {
        [
            ("temperature", &self.temperature),
            ("co2", &self.co2),
            ("humidity", &self.humidity),
            ("moisture", &self.moisture),
        ]
    }

    pub fn from_json_str(raw: &str) -> Result<Self, String> {
        let config: AlertsConfig = serde_json::from_str(raw).map_err(|e| e.to_string())?;
        validate_config(&config)?;
        Ok(config)
    }

    pub fn from_json_file(path: &str) -> Result<Self, String> {
        let raw = std::fs::read_to_string(path).map_err(|e| format!("read {path}: {e}"))?;
        Self::from_json_str(&raw)
    }
}

pub fn validate_config(config: &AlertsConfig) -> Result<(), String> {
    for (name, threshold) in config.metrics() {
        if let (Some(low), Some(high)) = (threshold.low, threshold.high) {
            if low >= high {
                return Err(format!(
                    "{name}: low bound {low} must be below high bound {high}"
                ));
            }
        }
        if threshold.enabled && threshold.high.is_none() && threshold.low.is_none() {
            return Err(format!("{name}: enabled but no high or low bound set"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(validate_config(&AlertsConfig::default()).is_ok());
    }

    #[test]
    fn rejects_inverted_bounds() {
        let mut config = AlertsConfig::default();
        config.temperature.low = Some(90.0);
        let err = validate_config(&config).expect_err("inverted bounds");
        assert!(err.contains("temperature"));
    }

    #[test]
    fn rejects_enabled_metric_without_bounds() {
        let mut config = AlertsConfig::default();
        config.co2 = ThresholdConfig {
            enabled: true,
            high: None,
            low: None,
        };
        let err = validate_config(&config).expect_err("no bounds");
        assert!(err.contains("co2"));
    }

    #[test]
    fn parses_partial_json() {
        let config = AlertsConfig::from_json_str(
            r#"{"temperature": {"enabled": true, "high": 80.0}}"#,
        )
        .expect("parse");
        assert!(config.temperature.enabled);
        assert_eq!(config.temperature.high, Some(80.0));
        assert_eq!(config.temperature.low, None);
        assert!(!config.co2.enabled);
        assert!(config.dedup);
    }

    #[test]
    fn from_json_rejects_invalid_config() {
        let err = AlertsConfig::from_json_str(
            r#"{"humidity": {"enabled": true, "high": 60.0, "low": 65.0}}"#,
        )
        .expect_err("inverted");
        assert!(err.contains("humidity"));
    }
}
