//! Per-dataset cleaning: typed parsing, default filling, categorical normalization.
//!
//! Cleaning never drops or reorders rows. Each `clean_*` function maps raw
//! records one-to-one into typed records and then runs the matching
//! `normalize_*` pass, which is a fixed point: normalizing an already
//! cleaned record returns it unchanged.
//!
//! Missing-value policy:
//!
//! | Field | Default |
//! |-------|---------|
//! | `delivery_duration_days` | `0` |
//! | `damage_flag` | `false` |
//! | `claim_status` | `"PENDING"` |
//! | `amount_claimed`, `freight_cost` | `0.0` |
//! | `quantity`, `stock_level`, `reorder_threshold` | `0` |
//! | `vendor_rating`, dates | missing |

use crate::models::{
    Claim, CleanedDatasets, Dataset, DeliveryLog, InventoryRecord, Shipment, Vendor,
    DEFAULT_CLAIM_STATUS,
};
use crate::parser::RawRecord;

use super::pipeline::RawDatasets;

/// Uppercase and trim a status-like value.
pub fn normalize_status(value: &str) -> String {
    value.trim().to_uppercase()
}

// =============================================================================
// Shipments
// =============================================================================

pub fn shipment_from_raw(raw: &RawRecord) -> Shipment {
    Shipment {
        shipment_id: raw.text("shipment_id"),
        origin_warehouse: raw.text("origin_warehouse"),
        destination_city: raw.text("destination_city"),
        ship_date: raw.date("ship_date"),
        delivery_date: raw.date("delivery_date"),
        product_id: raw.text("product_id"),
        quantity: raw.int("quantity").unwrap_or(0),
        freight_cost: raw.float("freight_cost").unwrap_or(0.0),
    }
}

pub fn normalize_shipment(mut shipment: Shipment) -> Shipment {
    trim_in_place(&mut shipment.shipment_id);
    trim_in_place(&mut shipment.origin_warehouse);
    trim_in_place(&mut shipment.destination_city);
    trim_in_place(&mut shipment.product_id);
    if !shipment.freight_cost.is_finite() {
        shipment.freight_cost = 0.0;
    }
    shipment
}

pub fn clean_shipments(raw: &[RawRecord]) -> Vec<Shipment> {
    raw.iter()
        .map(shipment_from_raw)
        .map(normalize_shipment)
        .collect()
}

// =============================================================================
// Delivery logs
// =============================================================================

pub fn delivery_log_from_raw(raw: &RawRecord) -> DeliveryLog {
    DeliveryLog {
        delivery_id: raw.text("delivery_id"),
        shipment_id: raw.text("shipment_id"),
        carrier: raw.text("carrier"),
        status: raw.get("status").map(str::to_string),
        delivery_duration_days: raw.int("delivery_duration_days").unwrap_or(0),
        damage_flag: raw.flag("damage_flag"),
        proof_of_delivery_status: raw.text("proof_of_delivery_status"),
    }
}

pub fn normalize_delivery_log(mut log: DeliveryLog) -> DeliveryLog {
    trim_in_place(&mut log.delivery_id);
    trim_in_place(&mut log.shipment_id);
    trim_in_place(&mut log.carrier);
    trim_in_place(&mut log.proof_of_delivery_status);
    log.status = log
        .status
        .as_deref()
        .map(normalize_status)
        .filter(|s| !s.is_empty());
    log.delivery_duration_days = log.delivery_duration_days.max(0);
    log
}

pub fn clean_delivery_logs(raw: &[RawRecord]) -> Vec<DeliveryLog> {
    raw.iter()
        .map(delivery_log_from_raw)
        .map(normalize_delivery_log)
        .collect()
}

// =============================================================================
// Claims
// =============================================================================

pub fn claim_from_raw(raw: &RawRecord) -> Claim {
    Claim {
        claim_id: raw.text("claim_id"),
        delivery_id: raw.text("delivery_id"),
        reason: raw.text("reason"),
        amount_claimed: raw.float("amount_claimed").unwrap_or(0.0),
        claim_status: raw.text("claim_status"),
        claim_date: raw.date("claim_date"),
        resolved_date: raw.date("resolved_date"),
    }
}

pub fn normalize_claim(mut claim: Claim) -> Claim {
    trim_in_place(&mut claim.claim_id);
    trim_in_place(&mut claim.delivery_id);
    trim_in_place(&mut claim.reason);
    claim.claim_status = normalize_status(&claim.claim_status);
    if claim.claim_status.is_empty() {
        claim.claim_status = DEFAULT_CLAIM_STATUS.to_string();
    }
    if !claim.amount_claimed.is_finite() || claim.amount_claimed < 0.0 {
        claim.amount_claimed = 0.0;
    }
    claim
}

pub fn clean_claims(raw: &[RawRecord]) -> Vec<Claim> {
    raw.iter().map(claim_from_raw).map(normalize_claim).collect()
}

// =============================================================================
// Vendors
// =============================================================================

pub fn vendor_from_raw(raw: &RawRecord) -> Vendor {
    Vendor {
        vendor_id: raw.text("vendor_id"),
        vendor_name: raw.text("vendor_name"),
        product_id: raw.text("product_id"),
        contract_start: raw.date("contract_start"),
        contract_end: raw.date("contract_end"),
        vendor_rating: raw.float("vendor_rating"),
        country: raw.text("country"),
    }
}

pub fn normalize_vendor(mut vendor: Vendor) -> Vendor {
    trim_in_place(&mut vendor.vendor_id);
    trim_in_place(&mut vendor.vendor_name);
    trim_in_place(&mut vendor.product_id);
    trim_in_place(&mut vendor.country);
    vendor.vendor_rating = vendor.vendor_rating.filter(|r| r.is_finite());
    vendor
}

pub fn clean_vendors(raw: &[RawRecord]) -> Vec<Vendor> {
    raw.iter().map(vendor_from_raw).map(normalize_vendor).collect()
}

// =============================================================================
// Inventory
// =============================================================================

pub fn inventory_from_raw(raw: &RawRecord) -> InventoryRecord {
    InventoryRecord {
        warehouse_id: raw.text("warehouse_id"),
        product_id: raw.text("product_id"),
        stock_level: raw.int("stock_level").unwrap_or(0),
        reorder_threshold: raw.int("reorder_threshold").unwrap_or(0),
        last_restock_date: raw.date("last_restock_date"),
        next_restock_due: raw.date("next_restock_due"),
    }
}

pub fn normalize_inventory(mut record: InventoryRecord) -> InventoryRecord {
    trim_in_place(&mut record.warehouse_id);
    trim_in_place(&mut record.product_id);
    record.stock_level = record.stock_level.max(0);
    record.reorder_threshold = record.reorder_threshold.max(0);
    record
}

pub fn clean_inventory(raw: &[RawRecord]) -> Vec<InventoryRecord> {
    raw.iter()
        .map(inventory_from_raw)
        .map(normalize_inventory)
        .collect()
}

// =============================================================================
// All datasets
// =============================================================================

/// Clean all five datasets.
pub fn clean_all(raw: &RawDatasets) -> CleanedDatasets {
    CleanedDatasets {
        shipments: clean_shipments(&raw.shipments),
        delivery_logs: clean_delivery_logs(&raw.delivery_logs),
        claims: clean_claims(&raw.claims),
        vendors: clean_vendors(&raw.vendors),
        inventory: clean_inventory(&raw.inventory),
    }
}

/// Re-run normalization over already typed datasets.
pub fn normalize_all(cleaned: CleanedDatasets) -> CleanedDatasets {
    CleanedDatasets {
        shipments: cleaned.shipments.into_iter().map(normalize_shipment).collect(),
        delivery_logs: cleaned
            .delivery_logs
            .into_iter()
            .map(normalize_delivery_log)
            .collect(),
        claims: cleaned.claims.into_iter().map(normalize_claim).collect(),
        vendors: cleaned.vendors.into_iter().map(normalize_vendor).collect(),
        inventory: cleaned.inventory.into_iter().map(normalize_inventory).collect(),
    }
}

/// Missing cells per expected column, in column order.
pub fn missing_counts(dataset: Dataset, raw: &[RawRecord]) -> Vec<(&'static str, usize)> {
    dataset
        .columns()
        .iter()
        .map(|col| (*col, raw.iter().filter(|r| r.get(col).is_none()).count()))
        .collect()
}

fn trim_in_place(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn raw(pairs: &[(&str, &str)]) -> RawRecord {
        RawRecord::from_pairs(pairs.iter().copied())
    }

    #[test]
    fn test_delivery_log_defaults() {
        let logs = clean_delivery_logs(&[raw(&[
            ("delivery_id", "D1"),
            ("shipment_id", "S1"),
            ("carrier", "DHL"),
            ("status", "  in transit "),
            ("delivery_duration_days", ""),
            ("damage_flag", ""),
        ])]);

        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status.as_deref(), Some("IN TRANSIT"));
        assert_eq!(logs[0].delivery_duration_days, 0);
        assert!(!logs[0].damage_flag);
    }

    #[test]
    fn test_delivery_log_damage_and_bad_duration() {
        let logs = clean_delivery_logs(&[
            raw(&[("delivery_id", "D1"), ("damage_flag", "Yes"), ("delivery_duration_days", "abc")]),
            raw(&[("delivery_id", "D2"), ("damage_flag", "n"), ("delivery_duration_days", "-4")]),
        ]);

        assert!(logs[0].damage_flag);
        assert_eq!(logs[0].delivery_duration_days, 0);
        assert!(!logs[1].damage_flag);
        assert_eq!(logs[1].delivery_duration_days, 0);
    }

    #[test]
    fn test_claim_defaults() {
        let claims = clean_claims(&[
            raw(&[("claim_id", "C1"), ("delivery_id", "D1"), ("claim_status", "")]),
            raw(&[("claim_id", "C2"), ("claim_status", " approved "), ("amount_claimed", "12.5")]),
        ]);

        assert_eq!(claims[0].claim_status, "PENDING");
        assert_eq!(claims[0].amount_claimed, 0.0);
        assert_eq!(claims[0].claim_date, None);
        assert_eq!(claims[1].claim_status, "APPROVED");
        assert_eq!(claims[1].amount_claimed, 12.5);
    }

    #[test]
    fn test_shipment_dates_and_numbers() {
        let shipments = clean_shipments(&[raw(&[
            ("shipment_id", " S1 "),
            ("ship_date", "01/01/2024"),
            ("delivery_date", "garbage"),
            ("quantity", "7.0"),
            ("freight_cost", "n/a"),
        ])]);

        let s = &shipments[0];
        assert_eq!(s.shipment_id, "S1");
        assert_eq!(s.ship_date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(s.delivery_date, None);
        assert_eq!(s.quantity, 7);
        assert_eq!(s.freight_cost, 0.0);
    }

    #[test]
    fn test_inventory_and_vendor() {
        let inventory = clean_inventory(&[raw(&[
            ("warehouse_id", "W1"),
            ("product_id", "P1"),
            ("stock_level", "x"),
            ("reorder_threshold", "10"),
        ])]);
        assert_eq!(inventory[0].stock_level, 0);
        assert_eq!(inventory[0].reorder_threshold, 10);
        assert_eq!(inventory[0].next_restock_due, None);

        let vendors = clean_vendors(&[raw(&[("vendor_id", "V1"), ("vendor_rating", "four")])]);
        assert_eq!(vendors[0].vendor_rating, None);
    }

    #[test]
    fn test_cleaning_keeps_cardinality() {
        let rows: Vec<RawRecord> = (0..5).map(|_| raw(&[])).collect();
        assert_eq!(clean_shipments(&rows).len(), 5);
        assert_eq!(clean_delivery_logs(&rows).len(), 5);
        assert_eq!(clean_claims(&rows).len(), 5);
        assert_eq!(clean_vendors(&rows).len(), 5);
        assert_eq!(clean_inventory(&rows).len(), 5);
    }

    #[test]
    fn test_normalization_is_fixed_point() {
        let raw_sets = RawDatasets {
            shipments: vec![raw(&[("shipment_id", "S1"), ("quantity", "3")])],
            delivery_logs: vec![raw(&[("delivery_id", "D1"), ("status", " delivered ")])],
            claims: vec![raw(&[("claim_id", "C1"), ("claim_status", "open")])],
            vendors: vec![raw(&[("vendor_id", "V1"), ("vendor_rating", "4.5")])],
            inventory: vec![raw(&[("warehouse_id", "W1"), ("stock_level", "-3")])],
        };

        let once = clean_all(&raw_sets);
        let twice = normalize_all(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_missing_counts() {
        let rows = vec![
            raw(&[("shipment_id", "S1"), ("ship_date", "")]),
            raw(&[("shipment_id", ""), ("ship_date", "2024-01-01")]),
        ];
        let counts = missing_counts(Dataset::Shipments, &rows);

        assert_eq!(counts[0], ("shipment_id", 1));
        assert_eq!(counts.iter().find(|(c, _)| *c == "ship_date").unwrap().1, 1);
        assert_eq!(counts.iter().find(|(c, _)| *c == "quantity").unwrap().1, 2);
    }
}
