use alert_core::metrics::Readings;
use alert_core::state_store::StateStore;
use axum::{Json, Router, extract::State, http::StatusCode, routing::get, routing::post};

pub trait ReadingsAdapter: Send + Sync + 'static {
    fn parse(&self, payload: &serde_json::Value) -> Result<Readings, String>;
}

pub struct GenericAdapter;
pub struct ThingSpeakAdapter;

impl ReadingsAdapter for GenericAdapter {
    fn parse(&self, payload: &serde_json::Value) -> Result<Readings, String> {
        if !payload.is_object() {
            return Err("expected a JSON object".into());
        }
        Ok(Readings {
            co2_ppm: number_field(payload, "co2_ppm"),
            temp_f: number_field(payload, "temp_f"),
            humidity_pct: number_field(payload, "humidity_pct"),
            moisture_pct: number_field(payload, "moisture_pct"),
        })
    }
}

impl ReadingsAdapter for ThingSpeakAdapter {
    // Channel layout: field1=CO2, field2=temp, field3=humidity,
    // field4=moisture. Values arrive as strings.
    fn parse(&self, payload: &serde_json::Value) -> Result<Readings, String> {
        if !payload.is_object() {
            return Err("expected a JSON object".into());
        }
        Ok(Readings {
            co2_ppm: number_field(payload, "field1"),
            temp_f: number_field(payload, "field2"),
            humidity_pct: number_field(payload, "field3"),
            moisture_pct: number_field(payload, "field4"),
        })
    }
}

fn number_field(payload: &serde_json::Value, key: &str) -> Option<f64> {
    let value = payload.get(key)?;
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

#[derive(Clone)]
pub struct IngestState {
    pub readings_tx: std::sync::mpsc::Sender<Readings>,
    pub store: StateStore,
}

pub fn ingest_router(state: IngestState) -> Router {
    Router::new()
        .route("/readings/generic", post(handle_generic))
        .route("/readings/thingspeak", post(handle_thingspeak))
        .route("/alerts/active", get(active_alerts))
        .with_state(state)
}

async fn handle_generic(
    State(state): State<IngestState>,
    Json(payload): Json<serde_json::Value>,
) -> StatusCode {
    send_readings(&state.readings_tx, GenericAdapter.parse(&payload))
}

async fn handle_thingspeak(
    State(state): State<IngestState>,
    Json(payload): Json<serde_json::Value>,
) -> StatusCode {
    send_readings(&state.readings_tx, ThingSpeakAdapter.parse(&payload))
}

async fn active_alerts(State(state): State<IngestState>) -> Json<Vec<String>> {
    let active: Vec<String> = state
        .store
        .load()
        .into_iter()
        .filter(|(_, flag)| *flag)
        .map(|(key, _)| key)
        .collect();
    Json(active)
}

fn send_readings(
    tx: &std::sync::mpsc::Sender<Readings>,
    readings: Result<Readings, String>,
) -> StatusCode {
    let Ok(readings) = readings else {
        return StatusCode::BAD_REQUEST;
    };
    match tx.send(readings) {
        Ok(_) => StatusCode::ACCEPTED,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
