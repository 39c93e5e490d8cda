//! High-level pipeline API: extracts in, cleaned datasets and enriched rows out.
//!
//! # Example
//!
//! ```rust,ignore
//! use supplychain::transform::pipeline::{run_from_paths, DatasetPaths, PipelineOptions};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let paths = DatasetPaths::in_dir("data");
//!     let output = run_from_paths(&paths, &PipelineOptions::default())?;
//!     println!("Enriched {} rows", output.enriched.len());
//!     Ok(())
//! }
//! ```

use chrono::NaiveDate;
use std::path::{Path, PathBuf};

use super::cleaner::{clean_all, missing_counts};
use super::joiner::{join_datasets, ClaimJoin, JoinStats};
use super::metrics::{compute_metrics, MetricsContext};
use crate::api::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::error::{PipelineError, PipelineResult};
use crate::models::{CleanedDatasets, Dataset, EnrichedShipmentRecord};
use crate::parser::{parse_csv_file_auto, RawRecord};
use crate::report::write_enriched_csv;

/// The five raw extracts.
#[derive(Debug, Clone, Default)]
pub struct RawDatasets {
    pub shipments: Vec<RawRecord>,
    pub delivery_logs: Vec<RawRecord>,
    pub claims: Vec<RawRecord>,
    pub vendors: Vec<RawRecord>,
    pub inventory: Vec<RawRecord>,
}

impl RawDatasets {
    pub fn get(&self, dataset: Dataset) -> &[RawRecord] {
        match dataset {
            Dataset::Shipments => &self.shipments,
            Dataset::DeliveryLogs => &self.delivery_logs,
            Dataset::Claims => &self.claims,
            Dataset::Vendors => &self.vendors,
            Dataset::Inventory => &self.inventory,
        }
    }

    fn slot(&mut self, dataset: Dataset) -> &mut Vec<RawRecord> {
        match dataset {
            Dataset::Shipments => &mut self.shipments,
            Dataset::DeliveryLogs => &mut self.delivery_logs,
            Dataset::Claims => &mut self.claims,
            Dataset::Vendors => &mut self.vendors,
            Dataset::Inventory => &mut self.inventory,
        }
    }
}

/// Where each extract lives on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetPaths {
    pub shipments: PathBuf,
    pub delivery_logs: PathBuf,
    pub claims: PathBuf,
    pub vendors: PathBuf,
    pub inventory: PathBuf,
}

impl DatasetPaths {
    /// Default file names inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            shipments: dir.join(Dataset::Shipments.file_name()),
            delivery_logs: dir.join(Dataset::DeliveryLogs.file_name()),
            claims: dir.join(Dataset::Claims.file_name()),
            vendors: dir.join(Dataset::Vendors.file_name()),
            inventory: dir.join(Dataset::Inventory.file_name()),
        }
    }

    pub fn get(&self, dataset: Dataset) -> &Path {
        match dataset {
            Dataset::Shipments => &self.shipments,
            Dataset::DeliveryLogs => &self.delivery_logs,
            Dataset::Claims => &self.claims,
            Dataset::Vendors => &self.vendors,
            Dataset::Inventory => &self.inventory,
        }
    }
}

/// Options for a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Reference date for claim aging and restock countdowns.
    pub today: NaiveDate,
    /// Whether deliveries without claims survive the claims stage.
    pub claim_join: ClaimJoin,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            today: MetricsContext::today().today,
            claim_join: ClaimJoin::Inner,
        }
    }
}

/// Result of a complete pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// The five cleaned datasets, same cardinality as the extracts.
    pub cleaned: CleanedDatasets,
    /// One row per surviving join combination.
    pub enriched: Vec<EnrichedShipmentRecord>,
    /// Row accounting for the join.
    pub stats: JoinStats,
}

/// Read all five extracts.
///
/// Fails on the first extract that is missing or unreadable; nothing is
/// returned for the others.
pub fn load_sources(paths: &DatasetPaths) -> PipelineResult<RawDatasets> {
    let mut raw = RawDatasets::default();

    for dataset in Dataset::LOAD_ORDER {
        let path = paths.get(dataset);
        if !path.exists() {
            return Err(PipelineError::SourceUnavailable {
                dataset,
                reason: format!("{} not found", path.display()),
            });
        }

        let parsed = parse_csv_file_auto(path).map_err(|e| PipelineError::SourceUnavailable {
            dataset,
            reason: format!("{}: {}", path.display(), e),
        })?;

        log_success(format!("Loaded {}: {} records", dataset, parsed.records.len()));
        *raw.slot(dataset) = parsed.records;
    }

    Ok(raw)
}

/// Clean, join and enrich in-memory extracts.
pub fn run_pipeline(raw: &RawDatasets, options: &PipelineOptions) -> PipelineOutput {
    log_info("🧹 Cleaning datasets...");
    report_missing(raw);
    let cleaned = clean_all(raw);

    log_info("🔗 Joining shipments → delivery logs → claims → inventory...");
    let joined = join_datasets(
        &cleaned.shipments,
        &cleaned.delivery_logs,
        &cleaned.claims,
        &cleaned.inventory,
        options.claim_join,
    );
    report_join(&joined.stats);

    log_info(format!("📐 Computing metrics (as of {})...", options.today));
    let enriched = compute_metrics(joined.records, &MetricsContext::new(options.today));
    log_success(format!("{} enriched records", enriched.len()));

    PipelineOutput {
        cleaned,
        enriched,
        stats: joined.stats,
    }
}

/// Read the extracts from disk and run the pipeline.
pub fn run_from_paths(paths: &DatasetPaths, options: &PipelineOptions) -> PipelineResult<PipelineOutput> {
    log_info("📖 Reading extracts...");
    let raw = load_sources(paths)?;
    Ok(run_pipeline(&raw, options))
}

/// Run the pipeline from disk and write the enriched report.
///
/// The report file is only created once every extract has been read and
/// processed, so a failed run leaves no partial output behind.
pub fn run_to_report(
    paths: &DatasetPaths,
    options: &PipelineOptions,
    report: &Path,
) -> PipelineResult<PipelineOutput> {
    let output = run_from_paths(paths, options)?;
    write_enriched_csv(report, &output.enriched)?;
    log_success(format!(
        "{} enriched records written to {}",
        output.enriched.len(),
        report.display()
    ));
    Ok(output)
}

fn report_missing(raw: &RawDatasets) {
    log_info("Missing values per dataset:");
    for dataset in Dataset::LOAD_ORDER {
        let missing: Vec<String> = missing_counts(dataset, raw.get(dataset))
            .into_iter()
            .filter(|(_, n)| *n > 0)
            .map(|(col, n)| format!("{}={}", col, n))
            .collect();
        if !missing.is_empty() {
            log_info_indent(format!("{}: {}", dataset, missing.join(", ")), 1);
        }
    }
}

fn report_join(stats: &JoinStats) {
    log_success(format!(
        "Shipments ⨝ delivery logs: {} rows, ⨝ claims: {} rows",
        stats.stage1_rows, stats.stage2_rows
    ));

    let dropped = [
        ("shipments without delivery log", stats.shipments_without_delivery),
        ("delivery logs without shipment", stats.deliveries_without_shipment),
        ("deliveries without claim", stats.deliveries_without_claim),
        ("claims without delivery", stats.claims_without_delivery),
        ("rows with blank join key", stats.unkeyed_rows),
        ("duplicate inventory keys ignored", stats.duplicate_inventory_keys),
    ];
    for (what, count) in dropped {
        if count > 0 {
            log_warning(format!("{} {}", count, what));
        }
    }

    if stats.rows_without_inventory > 0 {
        log_info(format!(
            "{} rows have no inventory match (reorder fields left empty)",
            stats.rows_without_inventory
        ));
    }
}
