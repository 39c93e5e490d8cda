//! Transformation module.
//!
//! This module turns raw extracts into enriched shipment records:
//! - Cleaner: Per-dataset typing, defaults and normalization
//! - Joiner: Shipment → delivery → claim → inventory hash joins
//! - Metrics: Delay, claim aging and restock derivations
//! - Pipeline: Load, clean, join and enrich in one pass

pub mod cleaner;
pub mod joiner;
pub mod metrics;
pub mod pipeline;

pub use joiner::{join_datasets, ClaimJoin, JoinOutput, JoinStats};
pub use metrics::{compute_metrics, MetricsContext};
pub use pipeline::*;
