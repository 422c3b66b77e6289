//! HTTP + WebSocket server for the simulated ECG.
//!
//! Routes:
//! - `GET /` health check
//! - `POST /api/ecg` save a recording
//! - `GET /api/ecg?patientId=..` list a patient's recordings
//! - `GET /api/ecg/{id}` fetch one recording by `idECG`
//! - `POST /api/samples` relay a client-generated sample to every viewer
//! - `GET /ws` live sample stream
//! - `GET /ws/pulse` per-connection pulse stream

pub mod broadcast;
pub mod simulation;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    extract::rejection::JsonRejection,
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::{Path, Query, State},
    http::{HeaderValue, Method, StatusCode, header},
    response::{Json, Response},
    routing::{get, post},
};
use futures::stream::SplitStream;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast::error::RecvError;
use tower_http::cors::{Any, CorsLayer};

use ecgwave_core::generator::PULSE_TICK;
use ecgwave_core::{
    EcgRecord, GeneratorKind, JsonlStore, MemoryStore, PulseGenerator, RecordStore, Sample, StoreError,
    now_ms,
};

pub use broadcast::Broadcaster;
pub use simulation::{run_simulation, spawn_simulation};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Everything `run_server` needs to start.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origin. `None` or `"*"` allows any origin.
    pub allowed_origin: Option<String>,
    pub generator: GeneratorKind,
    /// JSON-lines file for saved recordings. In-memory when `None`.
    pub store_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            allowed_origin: None,
            generator: GeneratorKind::default(),
            store_path: None,
        }
    }
}

// ---------------------------------------------------------------------------
// State and wire types
// ---------------------------------------------------------------------------

struct AppState {
    store: Arc<dyn RecordStore>,
    broadcaster: Broadcaster,
}

#[derive(Deserialize)]
struct SaveRequest {
    signal: Option<Value>,
    #[serde(rename = "patientId")]
    patient_id: Option<String>,
}

#[derive(Deserialize)]
struct ListParams {
    #[serde(rename = "patientId")]
    patient_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct ApiResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ApiResponse {
    fn ok(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message: Some(message.into()),
            error: None,
        })
    }

    fn err(error: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: false,
            message: None,
            error: Some(error.into()),
        })
    }
}

type ApiError = (StatusCode, Json<ApiResponse>);

const MISSING_FIELDS: &str = "Missing signal or patientId";

/// Null, `false`, `0` and `""` count as absent.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

// ---------------------------------------------------------------------------
// HTTP handlers
// ---------------------------------------------------------------------------

async fn handle_index() -> Json<Value> {
    Json(serde_json::json!({ "message": "Server running" }))
}

async fn handle_save_ecg(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SaveRequest>, JsonRejection>,
) -> (StatusCode, Json<ApiResponse>) {
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            log::warn!("rejected ECG save: {rejection}");
            return (StatusCode::BAD_REQUEST, ApiResponse::err(MISSING_FIELDS));
        }
    };

    let (signal, patient) = match (request.signal, request.patient_id) {
        (Some(signal), Some(patient)) if !is_blank(&signal) && !patient.is_empty() => {
            (signal, patient)
        }
        _ => return (StatusCode::BAD_REQUEST, ApiResponse::err(MISSING_FIELDS)),
    };

    log::info!("saving ECG for patient {patient}");
    let record = EcgRecord::new(signal, patient);
    let id_ecg = record.id_ecg;
    let store = Arc::clone(&state.store);

    match tokio::task::spawn_blocking(move || store.insert(record)).await {
        Ok(Ok(())) => {
            log::info!("ECG {id_ecg} saved");
            (StatusCode::CREATED, ApiResponse::ok("ECG saved!"))
        }
        Ok(Err(e)) => {
            log::error!("failed to save ECG {id_ecg}: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, ApiResponse::err(e.to_string()))
        }
        Err(e) => {
            log::error!("store task failed: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, ApiResponse::err(e.to_string()))
        }
    }
}

async fn handle_list_ecg(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<EcgRecord>>, ApiError> {
    let Some(patient) = params.patient_id.filter(|p| !p.is_empty()) else {
        return Err((StatusCode::BAD_REQUEST, ApiResponse::err("Missing patientId")));
    };
    with_store(&state, move |store| store.list_for_patient(&patient))
        .await
        .map(Json)
}

async fn handle_get_ecg(
    State(state): State<Arc<AppState>>,
    Path(id_ecg): Path<u64>,
) -> Result<Json<EcgRecord>, ApiError> {
    match with_store(&state, move |store| store.get(id_ecg)).await? {
        Some(record) => Ok(Json(record)),
        None => Err((
            StatusCode::NOT_FOUND,
            ApiResponse::err(format!("ECG {id_ecg} not found")),
        )),
    }
}

/// Run a store call on the blocking pool. Store and join failures become 500s.
async fn with_store<T, F>(state: &AppState, call: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&dyn RecordStore) -> Result<T, StoreError> + Send + 'static,
{
    let store = Arc::clone(&state.store);
    match tokio::task::spawn_blocking(move || call(store.as_ref())).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            log::error!("store read failed: {e}");
            Err((StatusCode::INTERNAL_SERVER_ERROR, ApiResponse::err(e.to_string())))
        }
        Err(e) => {
            log::error!("store task failed: {e}");
            Err((StatusCode::INTERNAL_SERVER_ERROR, ApiResponse::err(e.to_string())))
        }
    }
}

/// Relay a sample produced elsewhere (e.g. a browser-side generator) to every `/ws` client.
async fn handle_relay_sample(
    State(state): State<Arc<AppState>>,
    Json(sample): Json<Sample>,
) -> (StatusCode, Json<Value>) {
    let receivers = state.broadcaster.emit(&sample);
    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "success": true, "receivers": receivers })),
    )
}

// ---------------------------------------------------------------------------
// WebSocket handlers
// ---------------------------------------------------------------------------

async fn handle_ws(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    let rx = state.broadcaster.subscribe();
    ws.on_upgrade(move |socket| stream_samples(socket, rx))
}

async fn stream_samples(
    socket: WebSocket,
    mut rx: tokio::sync::broadcast::Receiver<axum::extract::ws::Utf8Bytes>,
) {
    log::info!("client connected to /ws");
    let (mut sender, receiver) = socket.split();

    let mut send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(frame) => {
                    if sender.send(Message::Text(frame)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    log::debug!("/ws client lagging, skipped {skipped} frame(s)");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
    let mut recv_task = tokio::spawn(wait_for_close(receiver));

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
    log::info!("client disconnected from /ws");
}

async fn handle_pulse_ws(ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(stream_pulses)
}

async fn stream_pulses(socket: WebSocket) {
    log::info!("client connected to /ws/pulse");
    let (mut sender, receiver) = socket.split();

    let mut send_task = tokio::spawn(async move {
        let mut generator = PulseGenerator::from_os_rng();
        let mut tick =
            tokio::time::interval_at(tokio::time::Instant::now() + PULSE_TICK, PULSE_TICK);
        loop {
            tick.tick().await;
            let pulse = generator.next_pulse(now_ms());
            let json = match serde_json::to_string(&pulse) {
                Ok(json) => json,
                Err(e) => {
                    log::error!("failed to serialize pulse: {e}");
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });
    let mut recv_task = tokio::spawn(wait_for_close(receiver));

    // Aborting the sender also drops its interval.
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
    log::info!("client disconnected from /ws/pulse");
}

/// Drain inbound frames until the client closes or the stream errors.
async fn wait_for_close(mut receiver: SplitStream<WebSocket>) {
    while let Some(Ok(msg)) = receiver.next().await {
        if let Message::Close(_) = msg {
            break;
        }
    }
}

// ---------------------------------------------------------------------------
// Router and startup
// ---------------------------------------------------------------------------

/// Build the axum router. CORS is layered on separately by [`run_server`].
pub fn build_router(store: Arc<dyn RecordStore>, broadcaster: Broadcaster) -> Router {
    let state = Arc::new(AppState { store, broadcaster });

    Router::new()
        .route("/", get(handle_index))
        .route("/api/ecg", post(handle_save_ecg).get(handle_list_ecg))
        .route("/api/ecg/{id}", get(handle_get_ecg))
        .route("/api/samples", post(handle_relay_sample))
        .route("/ws", get(handle_ws))
        .route("/ws/pulse", get(handle_pulse_ws))
        .with_state(state)
}

/// CORS policy for `origin`. `None` or `"*"` allows any origin.
pub fn cors_layer(origin: Option<&str>) -> io::Result<CorsLayer> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    match origin {
        None | Some("*") => Ok(layer.allow_origin(Any)),
        Some(origin) => {
            let value = HeaderValue::from_str(origin).map_err(|e| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("invalid CORS origin {origin:?}: {e}"),
                )
            })?;
            Ok(layer.allow_origin(value).allow_credentials(true))
        }
    }
}

/// Open the record store named by `path`, or an in-memory one.
pub fn open_store(path: Option<&std::path::Path>) -> io::Result<Arc<dyn RecordStore>> {
    match path {
        Some(path) => {
            let store = JsonlStore::open(path).map_err(io::Error::other)?;
            log::info!("saving recordings to {}", path.display());
            Ok(Arc::new(store))
        }
        None => {
            log::info!("no store path set, recordings are kept in memory");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Run the HTTP + WebSocket server until Ctrl-C.
pub async fn run_server(config: ServerConfig) -> io::Result<()> {
    let store = open_store(config.store_path.as_deref())?;
    let cors = cors_layer(config.allowed_origin.as_deref())?;

    let broadcaster = Broadcaster::default();
    let simulation = spawn_simulation(config.generator.build(), broadcaster.clone());

    let app = build_router(store, broadcaster).layer(cors);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("ECG server listening on http://{}", listener.local_addr()?);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    simulation.abort();
    log::info!("server stopped");
    served
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    log::info!("shutdown requested");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_match_missing_fields() {
        for v in [
            Value::Null,
            serde_json::json!(false),
            serde_json::json!(0),
            serde_json::json!(""),
        ] {
            assert!(is_blank(&v), "{v} should be blank");
        }
        for v in [
            serde_json::json!([]),
            serde_json::json!({}),
            serde_json::json!("x"),
            serde_json::json!(1.5),
        ] {
            assert!(!is_blank(&v), "{v} should count as present");
        }
    }

    #[test]
    fn cors_rejects_unparseable_origin() {
        assert!(cors_layer(Some("http://ok.example")).is_ok());
        assert!(cors_layer(None).is_ok());
        let err = cors_layer(Some("bad\norigin")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn default_config_listens_locally() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 5000);
        assert_eq!(config.generator, GeneratorKind::Noise);
        assert!(config.store_path.is_none());
    }
}
