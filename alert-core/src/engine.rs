use crate::audit::{AuditLog, CheckRecord};
use crate::evaluator::{AlertEvaluator, CheckOutcome};
use crate::metrics::Readings;
use crate::state_store::StateStore;
use std::sync::mpsc::{Receiver, Sender};
use threshold_registry::AlertsConfig;

#[derive(Clone, Debug)]
pub struct Notification {
    pub messages: Vec<String>,
    pub readings: Readings,
}

/// Drains the sampler channel one cycle at a time: evaluate, audit, persist
/// dedup state, then hand triggered messages to the notifier. State is
/// persisted before the notification is sent, so a delivery failure cannot
/// drift the dedup state (it can only drop that one notification).
pub fn run_engine(
    readings_rx: Receiver<Readings>,
    config: AlertsConfig,
    store: StateStore,
    audit: Option<AuditLog>,
    notify_tx: Sender<Notification>,
) {
    let mut evaluator = AlertEvaluator::with_state(config.dedup, store.load());

    while let Ok(readings) = readings_rx.recv() {
        let evaluations = evaluator.evaluate_all(&readings, &config);

        for evaluation in &evaluations {
            match evaluation.outcome {
                CheckOutcome::Triggered => {
                    if let Some(message) = evaluation.message.as_deref() {
                        tracing::warn!("ALERT: {message}");
                    }
                }
                CheckOutcome::Suppressed => {
                    tracing::debug!(
                        "{} violation still active, notification suppressed",
                        evaluation.metric.key_name()
                    );
                }
                CheckOutcome::Cleared => {
                    tracing::info!("{} back within range", evaluation.metric.key_name());
                }
                CheckOutcome::Safe | CheckOutcome::NoData | CheckOutcome::Disabled => {}
            }

            if let Some(audit) = audit.as_ref() {
                let _ = audit.append(&CheckRecord {
                    id: None,
                    metric: evaluation.metric,
                    outcome: evaluation.outcome,
                    value: evaluation.value,
                    message: evaluation.message.clone(),
                    timestamp: now_string(),
                });
            }
        }

        if let Err(err) = store.save(evaluator.state()) {
            tracing::warn!("could not persist alert state: {err}");
        }

        let messages: Vec<String> = evaluations
            .into_iter()
            .filter_map(|evaluation| evaluation.message)
            .collect();
        if !messages.is_empty() {
            let _ = notify_tx.send(Notification { messages, readings });
        }
    }
}

/// Plain-text alert body: triggered messages first, then the readings that
/// produced them.
pub fn format_alert_body(messages: &[String], readings: &Readings) -> String {
    let mut body = String::from("Sensor Alert\n\n");
    for message in messages {
        body.push_str(message);
        body.push('\n');
    }
    body.push_str("\nCurrent Readings:\n");
    if let Some(co2) = readings.co2_ppm {
        body.push_str(&format!("  CO2: {co2:.0} ppm\n"));
    }
    if let Some(temp) = readings.temp_f {
        body.push_str(&format!("  Temperature: {temp:.1}°F\n"));
    }
    if let Some(humidity) = readings.humidity_pct {
        body.push_str(&format!("  Humidity: {humidity:.1}%\n"));
    }
    if let Some(moisture) = readings.moisture_pct {
        body.push_str(&format!("  Soil Moisture: {moisture:.1}%\n"));
    }
    body
}

fn now_string() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let Ok(duration) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return "0".into();
    };
    duration.as_secs().to_string()
}
