//! HTTP server for the supply-chain analytics API.
//!
//! # API Endpoints
//!
//! | Method | Path                       | Description                        |
//! |--------|----------------------------|------------------------------------|
//! | GET    | `/`                        | Service index                      |
//! | GET    | `/health`                  | Health check                       |
//! | GET    | `/claims/summary`          | Claim rate per carrier             |
//! | GET    | `/inventory/health`        | Stock status per inventory record  |
//! | GET    | `/carriers/performance`    | Delivery metrics per carrier       |
//! | GET    | `/vendors/performance`     | Contract standing per vendor       |
//! | POST   | `/shipments`               | Insert a shipment                  |
//! | POST   | `/uploads/delivery-logs`   | Parse and clean delivery logs      |
//! | GET    | `/api/logs`                | SSE stream for real-time logs      |

use axum::{
    extract::{rejection::JsonRejection, Multipart, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, Json, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{
    convert::Infallible,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_info, log_success, LOG_BROADCASTER};
use super::types::{error_reply, ApiError, FileUploadResponse, ShipmentCreate};
use crate::config::Config;
use crate::error::{PersistenceError, PersistenceResult, ServerError, ServerResult};
use crate::models::{CleanedDatasets, Shipment};
use crate::parser::{parse_bytes_auto, xlsx::parse_xlsx_bytes};
use crate::query::{self, CarrierPerformance, ClaimsSummary, InventoryHealth, VendorPerformance};
use crate::storage::SqliteStore;
use crate::transform::cleaner::clean_delivery_logs;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Mutex<SqliteStore>>,
}

impl AppState {
    pub fn new(store: SqliteStore) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    /// Run `f` against the store on the blocking pool.
    async fn with_store<T, F>(&self, f: F) -> ServerResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteStore) -> PersistenceResult<T> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let result = tokio::task::spawn_blocking(move || {
            let mut guard = store.lock().map_err(|_| PersistenceError::LockPoisoned)?;
            f(&mut *guard)
        })
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))?;
        Ok(result?)
    }

    async fn snapshot(&self) -> ServerResult<CleanedDatasets> {
        self.with_store(|store| store.snapshot()).await
    }
}

/// Build the router with permissive CORS.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/claims/summary", get(claims_summary))
        .route("/inventory/health", get(inventory_health))
        .route("/carriers/performance", get(carrier_performance))
        .route("/vendors/performance", get(vendor_performance))
        .route("/shipments", post(create_shipment))
        .route("/uploads/delivery-logs", post(upload_delivery_logs))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let store = SqliteStore::open(&config.database)?;
    let app = router(AppState::new(store));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    println!("🚀 Supply-chain API running on http://localhost:{}", config.port);
    println!("   Database: {}", config.database.display());
    println!("   GET  /claims/summary          - Claim rate per carrier");
    println!("   GET  /inventory/health        - Stock status");
    println!("   GET  /carriers/performance    - Carrier metrics");
    println!("   GET  /vendors/performance     - Vendor contracts");
    println!("   POST /shipments               - Insert a shipment");
    println!("   POST /uploads/delivery-logs   - Upload delivery-log CSV/XLSX");
    println!("   GET  /api/logs                - SSE log stream");
    println!();

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

async fn index() -> Json<Value> {
    Json(json!({
        "message": "Supply Chain API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "claims_summary": "/claims/summary",
            "inventory_health": "/inventory/health",
            "carrier_performance": "/carriers/performance",
            "vendor_performance": "/vendors/performance",
            "log_shipment": "/shipments",
            "upload_delivery_logs": "/uploads/delivery-logs",
            "logs": "/api/logs (SSE)"
        }
    }))
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "supply-chain-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn claims_summary(State(state): State<AppState>) -> Result<Json<Vec<ClaimsSummary>>, ApiError> {
    let snapshot = state.snapshot().await.map_err(error_reply)?;
    Ok(Json(query::claims_summary(&snapshot)))
}

async fn inventory_health(State(state): State<AppState>) -> Result<Json<Vec<InventoryHealth>>, ApiError> {
    let snapshot = state.snapshot().await.map_err(error_reply)?;
    Ok(Json(query::inventory_health(&snapshot, today())))
}

async fn carrier_performance(
    State(state): State<AppState>,
) -> Result<Json<Vec<CarrierPerformance>>, ApiError> {
    let snapshot = state.snapshot().await.map_err(error_reply)?;
    Ok(Json(query::carrier_performance(&snapshot)))
}

async fn vendor_performance(
    State(state): State<AppState>,
) -> Result<Json<Vec<VendorPerformance>>, ApiError> {
    let snapshot = state.snapshot().await.map_err(error_reply)?;
    Ok(Json(query::vendor_performance(&snapshot, today())))
}

async fn create_shipment(
    State(state): State<AppState>,
    body: Result<Json<ShipmentCreate>, JsonRejection>,
) -> Result<(StatusCode, Json<Shipment>), ApiError> {
    let Json(body) = body.map_err(|e| error_reply(ServerError::BadRequest(e.body_text())))?;
    let shipment = body.into_shipment();

    let stored = shipment.clone();
    state
        .with_store(move |store| store.insert_shipment(&stored))
        .await
        .map_err(error_reply)?;

    log_success(format!("Shipment {} recorded", shipment.shipment_id));
    Ok((StatusCode::CREATED, Json(shipment)))
}

/// Parse and clean an uploaded delivery-log extract (`.csv` or `.xlsx`).
pub fn process_delivery_upload(filename: &str, bytes: &[u8]) -> ServerResult<FileUploadResponse> {
    let lower = filename.to_ascii_lowercase();

    let logs = if lower.ends_with(".csv") {
        let parsed = parse_bytes_auto(bytes)?;
        let logs = clean_delivery_logs(&parsed.records);
        log_success(format!(
            "{}: {} delivery records ({}, delimiter '{}')",
            filename,
            logs.len(),
            parsed.encoding,
            parsed.delimiter
        ));
        logs
    } else if lower.ends_with(".xlsx") {
        let parsed = parse_xlsx_bytes(bytes)?;
        let logs = clean_delivery_logs(&parsed.records);
        log_success(format!(
            "{}: {} delivery records (sheet '{}')",
            filename,
            logs.len(),
            parsed.sheet
        ));
        logs
    } else {
        return Err(ServerError::BadRequest(
            "Only CSV and Excel (.xlsx) files are supported".to_string(),
        ));
    };

    Ok(FileUploadResponse::new(filename, logs.len()))
}

async fn upload_delivery_logs(mut multipart: Multipart) -> Result<Json<FileUploadResponse>, ApiError> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| error_reply(ServerError::BadRequest(format!("Multipart error: {}", e))))?
    {
        if field.name() == Some("file") {
            file_name = field.file_name().map(|s| s.to_string());
            let bytes = field
                .bytes()
                .await
                .map_err(|e| error_reply(ServerError::BadRequest(format!("Read error: {}", e))))?;
            file_data = Some(bytes.to_vec());
        }
    }

    let bytes = file_data
        .ok_or_else(|| error_reply(ServerError::BadRequest("No file provided".to_string())))?;
    let name = file_name.unwrap_or_else(|| "upload.csv".to_string());

    log_info(format!("📄 Upload: {} ({} bytes)", name, bytes.len()));

    tokio::task::spawn_blocking(move || process_delivery_upload(&name, &bytes))
        .await
        .map_err(|e| error_reply(ServerError::Internal(e.to_string())))?
        .map(Json)
        .map_err(error_reply)
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let entry = result.ok()?;
        let json = serde_json::to_string(&entry).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
