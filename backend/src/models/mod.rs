//! Domain models for the supply-chain pipeline.
//!
//! This module contains the core data structures used throughout the pipeline:
//!
//! - [`Dataset`] - The five source extracts and their load order
//! - [`Shipment`], [`DeliveryLog`], [`Claim`], [`Vendor`], [`InventoryRecord`] - Cleaned rows
//! - [`EnrichedShipmentRecord`] - Joined row with derived metrics
//! - [`ClaimAgingBucket`], [`RestockStatus`], [`StockStatus`] - Categorical labels

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Datasets
// =============================================================================

/// One of the five source extracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    Shipments,
    DeliveryLogs,
    Claims,
    Vendors,
    Inventory,
}

impl Dataset {
    /// Storage order: referenced entities load before the rows pointing at them.
    pub const LOAD_ORDER: [Dataset; 5] = [
        Dataset::Shipments,
        Dataset::Vendors,
        Dataset::Inventory,
        Dataset::DeliveryLogs,
        Dataset::Claims,
    ];

    /// Table name in the relational store.
    pub fn table_name(&self) -> &'static str {
        match self {
            Self::Shipments => "shipments",
            Self::DeliveryLogs => "delivery_logs",
            Self::Claims => "claims",
            Self::Vendors => "vendors",
            Self::Inventory => "inventory",
        }
    }

    /// Default extract file name inside a data directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Shipments => "shipments.csv",
            Self::DeliveryLogs => "delivery_logs.csv",
            Self::Claims => "claims.csv",
            Self::Vendors => "vendors.csv",
            Self::Inventory => "inventory.csv",
        }
    }

    /// Column headers of the extract, also the table columns.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Self::Shipments => &[
                "shipment_id",
                "origin_warehouse",
                "destination_city",
                "ship_date",
                "delivery_date",
                "product_id",
                "quantity",
                "freight_cost",
            ],
            Self::DeliveryLogs => &[
                "delivery_id",
                "shipment_id",
                "carrier",
                "status",
                "delivery_duration_days",
                "damage_flag",
                "proof_of_delivery_status",
            ],
            Self::Claims => &[
                "claim_id",
                "delivery_id",
                "reason",
                "amount_claimed",
                "claim_status",
                "claim_date",
                "resolved_date",
            ],
            Self::Vendors => &[
                "vendor_id",
                "vendor_name",
                "product_id",
                "contract_start",
                "contract_end",
                "vendor_rating",
                "country",
            ],
            Self::Inventory => &[
                "warehouse_id",
                "product_id",
                "stock_level",
                "reorder_threshold",
                "last_restock_date",
                "next_restock_due",
            ],
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

// =============================================================================
// Source records
// =============================================================================

/// A single outbound consignment from a warehouse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    pub shipment_id: String,
    pub origin_warehouse: String,
    pub destination_city: String,
    pub ship_date: Option<NaiveDate>,
    pub delivery_date: Option<NaiveDate>,
    pub product_id: String,
    pub quantity: i64,
    pub freight_cost: f64,
}

/// How a shipment's transit actually went.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryLog {
    pub delivery_id: String,
    pub shipment_id: String,
    pub carrier: String,
    /// Uppercased and trimmed; `None` when the extract had no status.
    pub status: Option<String>,
    pub delivery_duration_days: i64,
    pub damage_flag: bool,
    pub proof_of_delivery_status: String,
}

/// A compensation request filed against a delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub claim_id: String,
    pub delivery_id: String,
    pub reason: String,
    pub amount_claimed: f64,
    pub claim_status: String,
    pub claim_date: Option<NaiveDate>,
    pub resolved_date: Option<NaiveDate>,
}

/// Default status for claims filed without one.
pub const DEFAULT_CLAIM_STATUS: &str = "PENDING";

/// A supplier contract for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vendor {
    pub vendor_id: String,
    pub vendor_name: String,
    pub product_id: String,
    pub contract_start: Option<NaiveDate>,
    pub contract_end: Option<NaiveDate>,
    pub vendor_rating: Option<f64>,
    pub country: String,
}

/// Stock position of one product in one warehouse.
///
/// Keyed by `(warehouse_id, product_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub warehouse_id: String,
    pub product_id: String,
    pub stock_level: i64,
    pub reorder_threshold: i64,
    pub last_restock_date: Option<NaiveDate>,
    pub next_restock_due: Option<NaiveDate>,
}

impl InventoryRecord {
    /// Stock at or below the threshold needs restocking now.
    pub fn needs_reorder(&self) -> bool {
        self.stock_level <= self.reorder_threshold
    }
}

/// The five datasets after cleaning.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanedDatasets {
    pub shipments: Vec<Shipment>,
    pub delivery_logs: Vec<DeliveryLog>,
    pub claims: Vec<Claim>,
    pub vendors: Vec<Vendor>,
    pub inventory: Vec<InventoryRecord>,
}

impl CleanedDatasets {
    /// Number of rows in one dataset.
    pub fn len_of(&self, dataset: Dataset) -> usize {
        match dataset {
            Dataset::Shipments => self.shipments.len(),
            Dataset::DeliveryLogs => self.delivery_logs.len(),
            Dataset::Claims => self.claims.len(),
            Dataset::Vendors => self.vendors.len(),
            Dataset::Inventory => self.inventory.len(),
        }
    }
}

// =============================================================================
// Derived records
// =============================================================================

/// One row of the shipment → delivery → claim → inventory join.
///
/// `claim` is only `None` when claims are joined in left mode;
/// `inventory` is `None` when no inventory row matches.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRecord {
    pub shipment: Shipment,
    pub delivery: DeliveryLog,
    pub claim: Option<Claim>,
    pub inventory: Option<InventoryRecord>,
}

/// A joined row carrying the derived delivery, claim and restock metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedShipmentRecord {
    pub shipment: Shipment,
    pub delivery: DeliveryLog,
    pub claim: Option<Claim>,
    pub inventory: Option<InventoryRecord>,
    pub expected_delivery_days: Option<i64>,
    pub delay_duration: i64,
    pub claim_aging_days: i64,
    pub claim_aging_bucket: ClaimAgingBucket,
    pub needs_reorder: Option<bool>,
    pub days_until_restock: Option<i64>,
    pub restock_status: Option<RestockStatus>,
}

// =============================================================================
// Buckets
// =============================================================================

/// How long a claim has been open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimAgingBucket {
    #[serde(rename = "0-30 days old")]
    UpTo30Days,
    #[serde(rename = "31-60 days old")]
    UpTo60Days,
    #[serde(rename = "61-90 days old")]
    UpTo90Days,
    #[serde(rename = "90+ days old")]
    Over90Days,
}

impl ClaimAgingBucket {
    /// Bins are `(-1, 30]`, `(30, 60]`, `(60, 90]`, `(90, inf)`.
    ///
    /// Negative ages (claims dated in the future) land in the first bin.
    pub fn from_days(days: i64) -> Self {
        match days {
            d if d <= 30 => Self::UpTo30Days,
            d if d <= 60 => Self::UpTo60Days,
            d if d <= 90 => Self::UpTo90Days,
            _ => Self::Over90Days,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::UpTo30Days => "0-30 days old",
            Self::UpTo60Days => "31-60 days old",
            Self::UpTo90Days => "61-90 days old",
            Self::Over90Days => "90+ days old",
        }
    }
}

impl fmt::Display for ClaimAgingBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Bounds of the modeled restock horizon, in days.
pub const RESTOCK_HORIZON_DAYS: i64 = 9999;

/// Urgency of the next scheduled restock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RestockStatus {
    #[serde(rename = "Overdue Restock")]
    Overdue,
    #[serde(rename = "Restock Due Today")]
    DueToday,
    #[serde(rename = "Restock Within 7 Days")]
    Within7Days,
    #[serde(rename = "Restock Within 30 Days")]
    Within30Days,
    #[serde(rename = "Restock Beyond 30 Days")]
    Beyond30Days,
    /// Outside `(-9999, 9999]`.
    #[serde(rename = "Unclassified")]
    Unclassified,
}

impl RestockStatus {
    /// Bins are `(-9999, -1]`, `(-1, 0]`, `(0, 7]`, `(7, 30]`, `(30, 9999]`.
    pub fn from_days(days: i64) -> Self {
        match days {
            d if d <= -RESTOCK_HORIZON_DAYS || d > RESTOCK_HORIZON_DAYS => Self::Unclassified,
            d if d <= -1 => Self::Overdue,
            0 => Self::DueToday,
            d if d <= 7 => Self::Within7Days,
            d if d <= 30 => Self::Within30Days,
            _ => Self::Beyond30Days,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Overdue => "Overdue Restock",
            Self::DueToday => "Restock Due Today",
            Self::Within7Days => "Restock Within 7 Days",
            Self::Within30Days => "Restock Within 30 Days",
            Self::Beyond30Days => "Restock Beyond 30 Days",
            Self::Unclassified => "Unclassified",
        }
    }
}

impl fmt::Display for RestockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Stock health reported by the inventory health query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StockStatus {
    Critical,
    Low,
    Healthy,
}

impl StockStatus {
    /// `CRITICAL` at or below the threshold, `LOW` up to 1.5x the threshold.
    pub fn classify(stock_level: i64, reorder_threshold: i64) -> Self {
        if stock_level <= reorder_threshold {
            Self::Critical
        } else if (stock_level as f64) <= reorder_threshold as f64 * 1.5 {
            Self::Low
        } else {
            Self::Healthy
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_aging_boundaries() {
        assert_eq!(ClaimAgingBucket::from_days(0), ClaimAgingBucket::UpTo30Days);
        assert_eq!(ClaimAgingBucket::from_days(30), ClaimAgingBucket::UpTo30Days);
        assert_eq!(ClaimAgingBucket::from_days(31), ClaimAgingBucket::UpTo60Days);
        assert_eq!(ClaimAgingBucket::from_days(60), ClaimAgingBucket::UpTo60Days);
        assert_eq!(ClaimAgingBucket::from_days(61), ClaimAgingBucket::UpTo90Days);
        assert_eq!(ClaimAgingBucket::from_days(90), ClaimAgingBucket::UpTo90Days);
        assert_eq!(ClaimAgingBucket::from_days(91), ClaimAgingBucket::Over90Days);
        assert_eq!(ClaimAgingBucket::from_days(-5), ClaimAgingBucket::UpTo30Days);
    }

    #[test]
    fn test_claim_aging_labels_cover_range() {
        let labels: std::collections::HashSet<&str> = (-200..400)
            .map(|d| ClaimAgingBucket::from_days(d).label())
            .collect();
        assert_eq!(labels.len(), 4);
    }

    #[test]
    fn test_restock_boundaries() {
        assert_eq!(RestockStatus::from_days(-9999), RestockStatus::Unclassified);
        assert_eq!(RestockStatus::from_days(-9998), RestockStatus::Overdue);
        assert_eq!(RestockStatus::from_days(-1), RestockStatus::Overdue);
        assert_eq!(RestockStatus::from_days(0), RestockStatus::DueToday);
        assert_eq!(RestockStatus::from_days(1), RestockStatus::Within7Days);
        assert_eq!(RestockStatus::from_days(7), RestockStatus::Within7Days);
        assert_eq!(RestockStatus::from_days(8), RestockStatus::Within30Days);
        assert_eq!(RestockStatus::from_days(30), RestockStatus::Within30Days);
        assert_eq!(RestockStatus::from_days(31), RestockStatus::Beyond30Days);
        assert_eq!(RestockStatus::from_days(9999), RestockStatus::Beyond30Days);
        assert_eq!(RestockStatus::from_days(10_000), RestockStatus::Unclassified);
    }

    #[test]
    fn test_bucket_serializes_as_label() {
        let json = serde_json::to_string(&ClaimAgingBucket::UpTo60Days).unwrap();
        assert_eq!(json, "\"31-60 days old\"");
        let json = serde_json::to_string(&RestockStatus::DueToday).unwrap();
        assert_eq!(json, "\"Restock Due Today\"");
        let json = serde_json::to_string(&StockStatus::Critical).unwrap();
        assert_eq!(json, "\"CRITICAL\"");
    }

    #[test]
    fn test_stock_status() {
        assert_eq!(StockStatus::classify(5, 10), StockStatus::Critical);
        assert_eq!(StockStatus::classify(10, 10), StockStatus::Critical);
        assert_eq!(StockStatus::classify(15, 10), StockStatus::Low);
        assert_eq!(StockStatus::classify(16, 10), StockStatus::Healthy);
    }

    #[test]
    fn test_load_order_puts_referenced_tables_first() {
        let pos = |d| Dataset::LOAD_ORDER.iter().position(|x| *x == d).unwrap();
        assert!(pos(Dataset::Shipments) < pos(Dataset::DeliveryLogs));
        assert!(pos(Dataset::DeliveryLogs) < pos(Dataset::Claims));
        assert_eq!(Dataset::LOAD_ORDER[1], Dataset::Vendors);
    }
}
