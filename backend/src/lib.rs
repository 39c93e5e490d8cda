//! # Supplychain - shipment ETL, delivery metrics and analytics
//!
//! Supplychain reads five CSV extracts (shipments, delivery logs, claims,
//! vendors, inventory), cleans them, joins them into one row per shipment
//! delivery claim, and derives delay, claim aging and restock metrics. The
//! cleaned datasets are loaded into SQLite and served back as carrier,
//! inventory and vendor analytics over HTTP.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  5 CSV      │────▶│   Parser    │────▶│  Cleaners   │────▶│   Joiner    │
//! │  extracts   │     │  (auto-enc) │     │ (per field) │     │ (hash join) │
//! └─────────────┘     └─────────────┘     └──────┬──────┘     └──────┬──────┘
//!                                                │                   ▼
//!                     ┌─────────────┐     ┌──────▼──────┐     ┌─────────────┐
//!                     │  Queries /  │◀────│   SQLite    │     │   Metrics   │──▶ report CSV
//!                     │  HTTP API   │     │   store     │     │   engine    │
//!                     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use supplychain::{run_to_report, DatasetPaths, PipelineOptions};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     run_to_report(
//!         &DatasetPaths::in_dir("data"),
//!         &PipelineOptions::default(),
//!         "processed_shipment_data.csv".as_ref(),
//!     )?;
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Datasets, records and metric buckets
//! - [`parser`] - CSV reading with auto-detection and typed field parsing
//! - [`transform`] - Cleaners, joiner, metrics and the pipeline
//! - [`report`] - Enriched CSV report
//! - [`storage`] - SQLite persistence
//! - [`query`] - Read-side analytics
//! - [`config`] - Environment configuration
//! - [`api`] - HTTP API server and log stream

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Output
pub mod report;
pub mod storage;

// Analytics
pub mod query;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError, CsvError, PersistenceError, PipelineError, ServerError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    CleanedDatasets,
    Claim,
    ClaimAgingBucket,
    Dataset,
    DeliveryLog,
    EnrichedShipmentRecord,
    InventoryRecord,
    RestockStatus,
    Shipment,
    StockStatus,
    Vendor,
};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    parse_bytes_auto,
    parse_csv_file_auto,
    ParseResult,
    RawRecord,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    load_sources,
    run_from_paths,
    run_pipeline,
    run_to_report,
    DatasetPaths,
    PipelineOptions,
    PipelineOutput,
    RawDatasets,
};
pub use transform::{ClaimJoin, JoinStats, MetricsContext};

// =============================================================================
// Re-exports - Output and analytics
// =============================================================================

pub use config::Config;
pub use report::write_enriched_csv;
pub use storage::{persist_all, LoadReport, PersistenceGateway, SqliteStore};

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
