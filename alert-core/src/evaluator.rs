use crate::metrics::{alert_key, Direction, Metric, Readings, METRIC_ORDER};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use threshold_registry::{AlertsConfig, ThresholdConfig};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckOutcome {
    Triggered,
    Suppressed,
    Cleared,
    Safe,
    NoData,
    Disabled,
}

#[derive(Clone, Debug)]
pub struct Evaluation {
    pub metric: Metric,
    pub outcome: CheckOutcome,
    pub value: Option<f64>,
    pub message: Option<String>,
}

/// Threshold evaluation with per-violation deduplication. The active-alert
/// map is owned here and threaded through `check`/`check_all`; callers that
/// need restart survival seed it from the state store and persist it back.
pub struct AlertEvaluator {
    dedup: bool,
    active: BTreeMap<String, bool>,
}

impl AlertEvaluator {
    pub fn new(dedup: bool) -> Self {
        AlertEvaluator {
            dedup,
            active: BTreeMap::new(),
        }
    }

    pub fn with_state(dedup: bool, state: BTreeMap<String, bool>) -> Self {
        AlertEvaluator {
            dedup,
            active: state,
        }
    }

    pub fn state(&self) -> &BTreeMap<String, bool> {
        &self.active
    }

    pub fn active_keys(&self) -> Vec<String> {
        self.active
            .iter()
            .filter(|(_, active)| **active)
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Forget all active alerts. The next violation for any key notifies
    /// again, as if it were new.
    pub fn reset(&mut self) {
        self.active.clear();
    }

    pub fn check(
        &mut self,
        metric: Metric,
        value: Option<f64>,
        threshold: &ThresholdConfig,
    ) -> (bool, Option<String>) {
        let evaluation = self.evaluate(metric, value, threshold);
        (
            evaluation.outcome == CheckOutcome::Triggered,
            evaluation.message,
        )
    }

    pub fn evaluate(
        &mut self,
        metric: Metric,
        value: Option<f64>,
        threshold: &ThresholdConfig,
    ) -> Evaluation {
        if !threshold.enabled {
            return Evaluation {
                metric,
                outcome: CheckOutcome::Disabled,
                value,
                message: None,
            };
        }
        let Some(value) = value else {
            // Sensor read failure is not an error and must not clear an
            // active alert.
            return Evaluation {
                metric,
                outcome: CheckOutcome::NoData,
                value: None,
                message: None,
            };
        };

        let mut messages = Vec::new();
        let mut suppressed = false;
        let mut cleared = false;

        for direction in [Direction::High, Direction::Low] {
            let bound = match direction {
                Direction::High => threshold.high,
                Direction::Low => threshold.low,
            };
            let Some(bound) = bound else { continue };
            let violated = match direction {
                Direction::High => value > bound,
                Direction::Low => value < bound,
            };

            let key = alert_key(metric, direction);
            if violated {
                if self.dedup && self.active.get(&key).copied().unwrap_or(false) {
                    suppressed = true;
                } else {
                    self.active.insert(key, true);
                    messages.push(format!(
                        "{} {}: {} (threshold: {})",
                        direction.label(),
                        metric.label(),
                        metric.format_value(value),
                        metric.format_threshold(bound),
                    ));
                }
            } else if self.active.remove(&key).unwrap_or(false) {
                cleared = true;
            }
        }

        let outcome = if !messages.is_empty() {
            CheckOutcome::Triggered
        } else if suppressed {
            CheckOutcome::Suppressed
        } else if cleared {
            CheckOutcome::Cleared
        } else {
            CheckOutcome::Safe
        };

        let message = if messages.is_empty() {
            None
        } else {
            Some(messages.join(" | "))
        };

        Evaluation {
            metric,
            outcome,
            value: Some(value),
            message,
        }
    }

    /// One full cycle in fixed metric order (temperature, co2, humidity,
    /// moisture).
    pub fn evaluate_all(&mut self, readings: &Readings, config: &AlertsConfig) -> Vec<Evaluation> {
        METRIC_ORDER
            .iter()
            .map(|&metric| self.evaluate(metric, readings.value(metric), threshold_for(config, metric)))
            .collect()
    }

    pub fn check_all(&mut self, readings: &Readings, config: &AlertsConfig) -> (bool, Vec<String>) {
        let messages: Vec<String> = self
            .evaluate_all(readings, config)
            .into_iter()
            .filter_map(|evaluation| evaluation.message)
            .collect();
        (!messages.is_empty(), messages)
    }
}

pub fn threshold_for(config: &AlertsConfig, metric: Metric) -> &ThresholdConfig {
    match metric {
        Metric::Temperature => &config.temperature,
        Metric::Co2 => &config.co2,
        Metric::Humidity => &config.humidity,
        Metric::Moisture => &config.moisture,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled(high: Option<f64>, low: Option<f64>) -> ThresholdConfig {
        ThresholdConfig {
            enabled: true,
            high,
            low,
        }
    }

    #[test]
    fn in_range_reading_stays_inactive() {
        let mut evaluator = AlertEvaluator::new(true);
        let threshold = enabled(Some(85.0), Some(70.0));
        let (triggered, message) = evaluator.check(Metric::Temperature, Some(75.0), &threshold);
        assert!(!triggered);
        assert_eq!(message, None);
        assert!(evaluator.active_keys().is_empty());
    }

    #[test]
    fn missing_reading_is_a_no_op() {
        let mut evaluator = AlertEvaluator::new(true);
        let threshold = enabled(Some(85.0), None);
        evaluator.check(Metric::Temperature, Some(87.0), &threshold);
        let (triggered, message) = evaluator.check(Metric::Temperature, None, &threshold);
        assert!(!triggered);
        assert_eq!(message, None);
        // the active alert must survive a read failure
        assert_eq!(evaluator.active_keys(), vec!["temp_high".to_string()]);
    }

    #[test]
    fn disabled_metric_never_triggers() {
        let mut evaluator = AlertEvaluator::new(true);
        let threshold = ThresholdConfig {
            enabled: false,
            high: Some(85.0),
            low: None,
        };
        let (triggered, message) = evaluator.check(Metric::Temperature, Some(90.0), &threshold);
        assert!(!triggered);
        assert_eq!(message, None);
        assert!(evaluator.active_keys().is_empty());
    }

    #[test]
    fn high_violation_triggers_and_activates() {
        let mut evaluator = AlertEvaluator::new(true);
        let threshold = enabled(Some(85.0), None);
        let (triggered, message) = evaluator.check(Metric::Temperature, Some(87.0), &threshold);
        assert!(triggered);
        assert_eq!(
            message.as_deref(),
            Some("HIGH TEMPERATURE: 87.0°F (threshold: 85°F)")
        );
        assert_eq!(evaluator.active_keys(), vec!["temp_high".to_string()]);
    }

    #[test]
    fn low_violation_formats_with_direction_and_unit() {
        let mut evaluator = AlertEvaluator::new(true);
        let threshold = enabled(None, Some(20.0));
        let (triggered, message) = evaluator.check(Metric::Moisture, Some(15.0), &threshold);
        assert!(triggered);
        assert_eq!(
            message.as_deref(),
            Some("LOW SOIL MOISTURE: 15.0% (threshold: 20%)")
        );
    }

    #[test]
    fn repeat_violation_is_suppressed_when_dedup_on() {
        let mut evaluator = AlertEvaluator::new(true);
        let threshold = enabled(Some(85.0), None);
        let first = evaluator.check(Metric::Temperature, Some(87.0), &threshold);
        assert!(first.0);
        let second = evaluator.check(Metric::Temperature, Some(87.0), &threshold);
        assert_eq!(second, (false, None));
        assert_eq!(evaluator.active_keys(), vec!["temp_high".to_string()]);
    }

    #[test]
    fn repeat_violation_refires_when_dedup_off() {
        let mut evaluator = AlertEvaluator::new(false);
        let threshold = enabled(Some(85.0), None);
        assert!(evaluator.check(Metric::Temperature, Some(87.0), &threshold).0);
        assert!(evaluator.check(Metric::Temperature, Some(87.0), &threshold).0);
    }

    #[test]
    fn clearing_is_silent_and_rearms_the_alert() {
        let mut evaluator = AlertEvaluator::new(true);
        let threshold = enabled(Some(85.0), None);
        assert!(evaluator.check(Metric::Temperature, Some(87.0), &threshold).0);

        let cleared = evaluator.check(Metric::Temperature, Some(80.0), &threshold);
        assert_eq!(cleared, (false, None));
        assert!(evaluator.active_keys().is_empty());

        let refired = evaluator.check(Metric::Temperature, Some(88.0), &threshold);
        assert!(refired.0);
        assert_eq!(
            refired.1.as_deref(),
            Some("HIGH TEMPERATURE: 88.0°F (threshold: 85°F)")
        );
    }

    #[test]
    fn outcomes_distinguish_suppressed_from_safe() {
        let mut evaluator = AlertEvaluator::new(true);
        let threshold = enabled(Some(85.0), None);

        let first = evaluator.evaluate(Metric::Temperature, Some(87.0), &threshold);
        assert_eq!(first.outcome, CheckOutcome::Triggered);
        let second = evaluator.evaluate(Metric::Temperature, Some(87.0), &threshold);
        assert_eq!(second.outcome, CheckOutcome::Suppressed);
        let third = evaluator.evaluate(Metric::Temperature, Some(80.0), &threshold);
        assert_eq!(third.outcome, CheckOutcome::Cleared);
        let fourth = evaluator.evaluate(Metric::Temperature, Some(80.0), &threshold);
        assert_eq!(fourth.outcome, CheckOutcome::Safe);
    }

    #[test]
    fn check_all_aggregates_in_metric_order() {
        let mut config = AlertsConfig::default();
        config.temperature = enabled(Some(85.0), None);
        config.co2 = enabled(Some(1500.0), None);
        config.humidity = enabled(Some(85.0), None);
        config.moisture = enabled(None, Some(20.0));

        let readings = Readings {
            co2_ppm: None,
            temp_f: Some(87.0),
            humidity_pct: Some(88.0),
            moisture_pct: Some(15.0),
        };

        let mut evaluator = AlertEvaluator::new(config.dedup);
        let (any, messages) = evaluator.check_all(&readings, &config);
        assert!(any);
        assert_eq!(
            messages,
            vec![
                "HIGH TEMPERATURE: 87.0°F (threshold: 85°F)".to_string(),
                "HIGH HUMIDITY: 88.0% (threshold: 85%)".to_string(),
                "LOW SOIL MOISTURE: 15.0% (threshold: 20%)".to_string(),
            ]
        );
    }

    #[test]
    fn state_round_trips_through_with_state() {
        let mut evaluator = AlertEvaluator::new(true);
        let threshold = enabled(Some(85.0), None);
        evaluator.check(Metric::Temperature, Some(87.0), &threshold);

        let mut restarted = AlertEvaluator::with_state(true, evaluator.state().clone());
        // still-active violation stays suppressed across the restart
        let (triggered, _) = restarted.check(Metric::Temperature, Some(87.0), &threshold);
        assert!(!triggered);
    }

    #[test]
    fn reset_forces_renotification() {
        let mut evaluator = AlertEvaluator::new(true);
        let threshold = enabled(Some(85.0), None);
        evaluator.check(Metric::Temperature, Some(87.0), &threshold);
        evaluator.reset();
        let (triggered, _) = evaluator.check(Metric::Temperature, Some(87.0), &threshold);
        assert!(triggered);
    }
}
