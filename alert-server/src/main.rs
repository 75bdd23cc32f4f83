use alert_core::{audit::AuditLog, engine, state_store::StateStore};
use alert_server::ingest::{ingest_router, IngestState};
use threshold_registry::AlertsConfig;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = load_config_from_env().expect("load alerts config");
    let store =
        StateStore::open(&env_or("ALERT_STATE_PATH", "alert_state.json")).expect("open state store");
    let audit = match AuditLog::open(&env_or("ALERT_AUDIT_PATH", "alert_audit.db")) {
        Ok(audit) => Some(audit),
        Err(err) => {
            tracing::warn!("audit log unavailable, continuing without it: {err}");
            None
        }
    };

    let (readings_tx, readings_rx) = std::sync::mpsc::channel();
    let (notify_tx, notify_rx) = std::sync::mpsc::channel();

    let engine_store = store.clone();
    let engine_config = config.clone();
    std::thread::spawn(move || {
        engine::run_engine(readings_rx, engine_config, engine_store, audit, notify_tx);
    });

    // Notifier stand-in: the email transport lives outside this service, so
    // triggered bodies are logged for whatever tails the journal.
    std::thread::spawn(move || {
        while let Ok(notification) = notify_rx.recv() {
            let body = engine::format_alert_body(&notification.messages, &notification.readings);
            tracing::warn!("alert notification:\n{body}");
        }
    });

    let app = ingest_router(IngestState { readings_tx, store });
    let addr = env_or("BIND_ADDR", "0.0.0.0:8080");
    let listener = tokio::net::TcpListener::bind(&addr).await.expect("bind");

    tracing::info!("alert-server listening on {addr}");
    axum::serve(listener, app).await.expect("serve");
}

fn load_config_from_env() -> Result<AlertsConfig, String> {
    match std::env::var("ALERTS_CONFIG") {
        Ok(path) => AlertsConfig::from_json_file(&path),
        Err(_) => Ok(AlertsConfig::default()),
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}
