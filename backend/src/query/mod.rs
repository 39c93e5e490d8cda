//! Read-side analytics over a store snapshot.
//!
//! Every query is a pure function of a [`CleanedDatasets`] snapshot (and a
//! fixed date where one matters). Carrier and vendor groups come back in
//! ascending key order.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::models::{CleanedDatasets, Claim, DeliveryLog, StockStatus};
use crate::transform::metrics::days_between;

/// Claim rate and average claim amount for one carrier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimsSummary {
    pub carrier: String,
    pub total_claims: usize,
    pub total_shipments: usize,
    pub claim_percentage: f64,
    pub avg_claim_amount: f64,
}

/// Stock position of one inventory record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryHealth {
    pub warehouse_id: String,
    pub product_id: String,
    pub stock_level: i64,
    pub reorder_threshold: i64,
    pub stock_status: StockStatus,
    pub days_until_restock: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrierPerformance {
    pub carrier: String,
    pub total_deliveries: usize,
    pub avg_delivery_duration: f64,
    pub damaged_shipments: usize,
    pub total_claims: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorPerformance {
    pub vendor_id: String,
    pub vendor_name: String,
    pub product_id: String,
    pub country: String,
    pub vendor_rating: Option<f64>,
    pub contract_active: bool,
    /// Days until the contract ends; negative once expired.
    pub days_remaining: Option<i64>,
}

/// Round half away from zero to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Left-outer join of delivery logs to claims: one row per matching claim,
/// or a single claimless row.
fn deliveries_with_claims<'a>(
    deliveries: &'a [DeliveryLog],
    claims: &'a [Claim],
) -> Vec<(&'a DeliveryLog, Option<&'a Claim>)> {
    let mut by_delivery: HashMap<&str, Vec<&Claim>> = HashMap::new();
    for claim in claims {
        let key = claim.delivery_id.trim();
        if !key.is_empty() {
            by_delivery.entry(key).or_default().push(claim);
        }
    }

    let mut rows = Vec::with_capacity(deliveries.len());
    for delivery in deliveries {
        match by_delivery.get(delivery.delivery_id.trim()) {
            Some(matches) => rows.extend(matches.iter().map(|c| (delivery, Some(*c)))),
            None => rows.push((delivery, None)),
        }
    }
    rows
}

/// Claim percentage and average claim amount per carrier.
///
/// `total_shipments` counts joined rows, so a delivery with two claims counts
/// twice.
pub fn claims_summary(data: &CleanedDatasets) -> Vec<ClaimsSummary> {
    #[derive(Default)]
    struct Acc {
        rows: usize,
        claims: usize,
        amount: f64,
    }

    let mut groups: BTreeMap<&str, Acc> = BTreeMap::new();
    for (delivery, claim) in deliveries_with_claims(&data.delivery_logs, &data.claims) {
        let acc = groups.entry(delivery.carrier.as_str()).or_default();
        acc.rows += 1;
        if let Some(claim) = claim {
            acc.claims += 1;
            acc.amount += claim.amount_claimed;
        }
    }

    groups
        .into_iter()
        .map(|(carrier, acc)| ClaimsSummary {
            carrier: carrier.to_string(),
            total_claims: acc.claims,
            total_shipments: acc.rows,
            claim_percentage: if acc.rows > 0 {
                round2(acc.claims as f64 / acc.rows as f64 * 100.0)
            } else {
                0.0
            },
            avg_claim_amount: if acc.claims > 0 {
                round2(acc.amount / acc.claims as f64)
            } else {
                0.0
            },
        })
        .collect()
}

/// Stock status and restock countdown per inventory record, in store order.
pub fn inventory_health(data: &CleanedDatasets, today: NaiveDate) -> Vec<InventoryHealth> {
    data.inventory
        .iter()
        .map(|item| InventoryHealth {
            warehouse_id: item.warehouse_id.clone(),
            product_id: item.product_id.clone(),
            stock_level: item.stock_level,
            reorder_threshold: item.reorder_threshold,
            stock_status: StockStatus::classify(item.stock_level, item.reorder_threshold),
            days_until_restock: item.next_restock_due.map(|due| days_between(today, due)),
        })
        .collect()
}

/// Delivery volume, speed, damage and claims per carrier.
pub fn carrier_performance(data: &CleanedDatasets) -> Vec<CarrierPerformance> {
    #[derive(Default)]
    struct Acc {
        rows: usize,
        duration: i64,
        damaged: usize,
        claims: usize,
    }

    let mut groups: BTreeMap<&str, Acc> = BTreeMap::new();
    for (delivery, claim) in deliveries_with_claims(&data.delivery_logs, &data.claims) {
        let acc = groups.entry(delivery.carrier.as_str()).or_default();
        acc.rows += 1;
        acc.duration += delivery.delivery_duration_days;
        if delivery.damage_flag {
            acc.damaged += 1;
        }
        if claim.is_some() {
            acc.claims += 1;
        }
    }

    groups
        .into_iter()
        .map(|(carrier, acc)| CarrierPerformance {
            carrier: carrier.to_string(),
            total_deliveries: acc.rows,
            avg_delivery_duration: if acc.rows > 0 {
                round2(acc.duration as f64 / acc.rows as f64)
            } else {
                0.0
            },
            damaged_shipments: acc.damaged,
            total_claims: acc.claims,
        })
        .collect()
}

/// Rating and contract standing per vendor, ordered by name then id.
///
/// A missing contract bound is open on that side.
pub fn vendor_performance(data: &CleanedDatasets, today: NaiveDate) -> Vec<VendorPerformance> {
    let mut out: Vec<VendorPerformance> = data
        .vendors
        .iter()
        .map(|v| {
            let started = v.contract_start.map_or(true, |start| start <= today);
            let not_ended = v.contract_end.map_or(true, |end| today <= end);
            VendorPerformance {
                vendor_id: v.vendor_id.clone(),
                vendor_name: v.vendor_name.clone(),
                product_id: v.product_id.clone(),
                country: v.country.clone(),
                vendor_rating: v.vendor_rating,
                contract_active: started && not_ended,
                days_remaining: v.contract_end.map(|end| days_between(today, end)),
            }
        })
        .collect();

    out.sort_by(|a, b| {
        a.vendor_name
            .cmp(&b.vendor_name)
            .then_with(|| a.vendor_id.cmp(&b.vendor_id))
    });
    out
}
