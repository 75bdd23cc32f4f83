//! Manual threshold tester. Feeds one synthetic reading through the
//! evaluator against the same state file the server uses, so dedup behaves
//! exactly as it would in production (last writer wins if both run at once).
//!
//! Usage:
//!   alert-tester <temp|co2|humidity|moisture> <value>
//!   alert-tester reset

use alert_core::evaluator::{threshold_for, AlertEvaluator};
use alert_core::metrics::Metric;
use alert_core::state_store::StateStore;
use threshold_registry::AlertsConfig;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let config = match std::env::var("ALERTS_CONFIG") {
        Ok(path) => AlertsConfig::from_json_file(&path).expect("load alerts config"),
        Err(_) => AlertsConfig::default(),
    };
    let state_path =
        std::env::var("ALERT_STATE_PATH").unwrap_or_else(|_| "alert_state.json".into());
    let store = StateStore::open(&state_path).expect("open state store");

    match args.as_slice() {
        [command] if command == "reset" => {
            store.reset().expect("reset state");
            println!("alert state cleared; next violation will notify again");
        }
        [metric_name, raw_value] => {
            let Some(metric) = Metric::from_key(metric_name) else {
                eprintln!("unknown metric '{metric_name}'");
                usage();
            };
            let Ok(value) = raw_value.parse::<f64>() else {
                eprintln!("'{raw_value}' is not a number");
                usage();
            };

            let threshold = threshold_for(&config, metric);
            if !threshold.enabled {
                println!("note: {metric_name} alerts are disabled in config");
            }

            let mut evaluator = AlertEvaluator::with_state(config.dedup, store.load());
            let (_, message) = evaluator.check(metric, Some(value), threshold);
            store.save(evaluator.state()).expect("save state");

            match message {
                Some(message) => println!("TRIGGERED: {message}"),
                None => println!(
                    "no alert for {} (safe, suppressed, or disabled); active keys: {:?}",
                    metric_name,
                    evaluator.active_keys()
                ),
            }
        }
        _ => usage(),
    }
}

fn usage() -> ! {
    eprintln!("usage: alert-tester <temp|co2|humidity|moisture> <value>");
    eprintln!("       alert-tester reset");
    std::process::exit(2);
}
