//! Deterministic multi-way join: shipments → delivery logs → claims → inventory.
//!
//! # Stages
//!
//! ```text
//! shipments ──inner(shipment_id)──▶ delivery logs ──inner|left(delivery_id)──▶ claims
//!                                                                              │
//!                      inventory ◀──left((origin_warehouse, product_id))───────┘
//! ```
//!
//! Every stage is a hash join: the right side is indexed by key, the left
//! side is scanned in input order and emits one row per match, in right-side
//! input order. Blank keys never match. Rows dropped by an inner stage are
//! counted in [`JoinStats`], never reported as errors.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;

use crate::models::{Claim, DeliveryLog, InventoryRecord, JoinedRecord, Shipment};

/// How stage-1 rows without a claim are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimJoin {
    /// Drop deliveries that have no claim.
    #[default]
    Inner,
    /// Keep them with an empty claim.
    Left,
}

/// Row accounting for one join run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JoinStats {
    pub shipments_without_delivery: usize,
    pub deliveries_without_shipment: usize,
    pub deliveries_without_claim: usize,
    pub claims_without_delivery: usize,
    pub rows_without_inventory: usize,
    /// Rows whose join key was blank, across all stages.
    pub unkeyed_rows: usize,
    /// Inventory rows ignored because an earlier row had the same key.
    pub duplicate_inventory_keys: usize,
    pub stage1_rows: usize,
    pub stage2_rows: usize,
    pub output_rows: usize,
}

/// Result of [`join_datasets`].
#[derive(Debug, Clone, Default)]
pub struct JoinOutput {
    pub records: Vec<JoinedRecord>,
    pub stats: JoinStats,
}

/// Index row positions by key, skipping blank keys.
fn index_by<'a, T, K, F>(rows: &'a [T], key: F, unkeyed: &mut usize) -> HashMap<K, Vec<usize>>
where
    K: Eq + Hash,
    F: Fn(&'a T) -> Option<K>,
{
    let mut index: HashMap<K, Vec<usize>> = HashMap::new();
    for (i, row) in rows.iter().enumerate() {
        match key(row) {
            Some(k) => index.entry(k).or_default().push(i),
            None => *unkeyed += 1,
        }
    }
    index
}

fn non_blank(s: &str) -> Option<&str> {
    let s = s.trim();
    (!s.is_empty()).then_some(s)
}

/// Stage 1: inner join on `shipment_id`.
pub fn join_shipments_deliveries(
    shipments: &[Shipment],
    deliveries: &[DeliveryLog],
    stats: &mut JoinStats,
) -> Vec<(Shipment, DeliveryLog)> {
    let index = index_by(
        deliveries,
        |d| non_blank(&d.shipment_id),
        &mut stats.unkeyed_rows,
    );

    let mut matched_deliveries = vec![false; deliveries.len()];
    let mut out = Vec::new();

    for shipment in shipments {
        let matches = non_blank(&shipment.shipment_id).and_then(|k| index.get(k));
        match matches {
            Some(positions) => {
                for &i in positions {
                    matched_deliveries[i] = true;
                    out.push((shipment.clone(), deliveries[i].clone()));
                }
            }
            None => {
                if non_blank(&shipment.shipment_id).is_none() {
                    stats.unkeyed_rows += 1;
                } else {
                    stats.shipments_without_delivery += 1;
                }
            }
        }
    }

    stats.deliveries_without_shipment = deliveries
        .iter()
        .zip(&matched_deliveries)
        .filter(|(d, matched)| !**matched && non_blank(&d.shipment_id).is_some())
        .count();
    stats.stage1_rows = out.len();
    out
}

/// Stage 2: join stage-1 rows with claims on `delivery_id`.
pub fn join_claims(
    stage1: Vec<(Shipment, DeliveryLog)>,
    claims: &[Claim],
    mode: ClaimJoin,
    stats: &mut JoinStats,
) -> Vec<(Shipment, DeliveryLog, Option<Claim>)> {
    let index = index_by(
        claims,
        |c| non_blank(&c.delivery_id),
        &mut stats.unkeyed_rows,
    );

    let mut matched_claims = vec![false; claims.len()];
    let mut out = Vec::new();

    for (shipment, delivery) in stage1 {
        let matches = non_blank(&delivery.delivery_id).and_then(|k| index.get(k));
        match matches {
            Some(positions) => {
                for &i in positions {
                    matched_claims[i] = true;
                    out.push((shipment.clone(), delivery.clone(), Some(claims[i].clone())));
                }
            }
            None => {
                if non_blank(&delivery.delivery_id).is_none() {
                    stats.unkeyed_rows += 1;
                } else {
                    stats.deliveries_without_claim += 1;
                }
                if mode == ClaimJoin::Left {
                    out.push((shipment, delivery, None));
                }
            }
        }
    }

    stats.claims_without_delivery = claims
        .iter()
        .zip(&matched_claims)
        .filter(|(c, matched)| !**matched && non_blank(&c.delivery_id).is_some())
        .count();
    stats.stage2_rows = out.len();
    out
}

/// Stage 3: left join with inventory on `(origin_warehouse, product_id)`.
///
/// Keeps exactly one output row per input row; the first inventory row for a
/// key wins.
pub fn join_inventory(
    stage2: Vec<(Shipment, DeliveryLog, Option<Claim>)>,
    inventory: &[InventoryRecord],
    stats: &mut JoinStats,
) -> Vec<JoinedRecord> {
    let mut index: HashMap<(&str, &str), &InventoryRecord> = HashMap::new();
    for record in inventory {
        let key = match (non_blank(&record.warehouse_id), non_blank(&record.product_id)) {
            (Some(w), Some(p)) => (w, p),
            _ => {
                stats.unkeyed_rows += 1;
                continue;
            }
        };
        if index.contains_key(&key) {
            stats.duplicate_inventory_keys += 1;
        } else {
            index.insert(key, record);
        }
    }

    let out: Vec<JoinedRecord> = stage2
        .into_iter()
        .map(|(shipment, delivery, claim)| {
            let inventory = non_blank(&shipment.origin_warehouse)
                .zip(non_blank(&shipment.product_id))
                .and_then(|key| index.get(&key))
                .map(|r| (*r).clone());
            if inventory.is_none() {
                stats.rows_without_inventory += 1;
            }
            JoinedRecord {
                shipment,
                delivery,
                claim,
                inventory,
            }
        })
        .collect();

    stats.output_rows = out.len();
    out
}

/// Run the three join stages in their fixed order.
pub fn join_datasets(
    shipments: &[Shipment],
    deliveries: &[DeliveryLog],
    claims: &[Claim],
    inventory: &[InventoryRecord],
    mode: ClaimJoin,
) -> JoinOutput {
    let mut stats = JoinStats::default();
    let stage1 = join_shipments_deliveries(shipments, deliveries, &mut stats);
    let stage2 = join_claims(stage1, claims, mode, &mut stats);
    let records = join_inventory(stage2, inventory, &mut stats);
    JoinOutput { records, stats }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shipment(id: &str, warehouse: &str, product: &str) -> Shipment {
        Shipment {
            shipment_id: id.into(),
            origin_warehouse: warehouse.into(),
            destination_city: "Lyon".into(),
            ship_date: None,
            delivery_date: None,
            product_id: product.into(),
            quantity: 1,
            freight_cost: 10.0,
        }
    }

    fn delivery(id: &str, shipment_id: &str) -> DeliveryLog {
        DeliveryLog {
            delivery_id: id.into(),
            shipment_id: shipment_id.into(),
            carrier: "DHL".into(),
            status: Some("DELIVERED".into()),
            delivery_duration_days: 3,
            damage_flag: false,
            proof_of_delivery_status: "SIGNED".into(),
        }
    }

    fn claim(id: &str, delivery_id: &str) -> Claim {
        Claim {
            claim_id: id.into(),
            delivery_id: delivery_id.into(),
            reason: "Damaged".into(),
            amount_claimed: 50.0,
            claim_status: "PENDING".into(),
            claim_date: None,
            resolved_date: None,
        }
    }

    fn stock(warehouse: &str, product: &str, level: i64) -> InventoryRecord {
        InventoryRecord {
            warehouse_id: warehouse.into(),
            product_id: product.into(),
            stock_level: level,
            reorder_threshold: 10,
            last_restock_date: None,
            next_restock_due: None,
        }
    }

    #[test]
    fn test_inner_chain_drops_unmatched() {
        let shipments = vec![shipment("S1", "W1", "P1"), shipment("S2", "W1", "P2"), shipment("S3", "W2", "P1")];
        let deliveries = vec![delivery("D1", "S1"), delivery("D2", "S2"), delivery("D9", "S9")];
        let claims = vec![claim("C1", "D1"), claim("C7", "D7")];

        let out = join_datasets(&shipments, &deliveries, &claims, &[], ClaimJoin::Inner);

        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].shipment.shipment_id, "S1");
        assert_eq!(out.records[0].claim.as_ref().unwrap().claim_id, "C1");
        assert_eq!(out.stats.shipments_without_delivery, 1);
        assert_eq!(out.stats.deliveries_without_shipment, 1);
        assert_eq!(out.stats.deliveries_without_claim, 1);
        assert_eq!(out.stats.claims_without_delivery, 1);
        assert_eq!(out.stats.rows_without_inventory, 1);
    }

    #[test]
    fn test_inner_cardinality_bound() {
        let shipments: Vec<_> = (0..6).map(|i| shipment(&format!("S{i}"), "W", "P")).collect();
        let deliveries: Vec<_> = (0..4).map(|i| delivery(&format!("D{i}"), &format!("S{i}"))).collect();
        let claims: Vec<_> = (1..9).map(|i| claim(&format!("C{i}"), &format!("D{i}"))).collect();

        let out = join_datasets(&shipments, &deliveries, &claims, &[], ClaimJoin::Inner);
        let bound = shipments.len().min(deliveries.len()).min(claims.len());

        assert!(out.records.len() <= bound);
        assert_eq!(out.records.len(), 3);
    }

    #[test]
    fn test_multiple_claims_multiply_rows_in_order() {
        let shipments = vec![shipment("S1", "W1", "P1")];
        let deliveries = vec![delivery("D1", "S1")];
        let claims = vec![claim("C2", "D1"), claim("C1", "D1")];

        let out = join_datasets(&shipments, &deliveries, &claims, &[], ClaimJoin::Inner);
        let ids: Vec<_> = out.records.iter().map(|r| r.claim.as_ref().unwrap().claim_id.as_str()).collect();

        assert_eq!(ids, vec!["C2", "C1"]);
    }

    #[test]
    fn test_left_claim_mode_keeps_unclaimed() {
        let shipments = vec![shipment("S1", "W1", "P1"), shipment("S2", "W1", "P1")];
        let deliveries = vec![delivery("D1", "S1"), delivery("D2", "S2")];
        let claims = vec![claim("C1", "D1")];

        let out = join_datasets(&shipments, &deliveries, &claims, &[], ClaimJoin::Left);

        assert_eq!(out.records.len(), 2);
        assert!(out.records[1].claim.is_none());
        assert_eq!(out.stats.deliveries_without_claim, 1);
    }

    #[test]
    fn test_inventory_left_join_preserves_rows() {
        let shipments = vec![shipment("S1", "W1", "P1"), shipment("S2", "W2", "P1")];
        let deliveries = vec![delivery("D1", "S1"), delivery("D2", "S2")];
        let claims = vec![claim("C1", "D1"), claim("C2", "D2")];
        let inventory = vec![stock("W1", "P1", 5), stock("W1", "P1", 99), stock("W3", "P1", 1)];

        let out = join_datasets(&shipments, &deliveries, &claims, &inventory, ClaimJoin::Inner);

        assert_eq!(out.records.len(), out.stats.stage2_rows);
        assert_eq!(out.records[0].inventory.as_ref().unwrap().stock_level, 5);
        assert!(out.records[1].inventory.is_none());
        assert_eq!(out.stats.duplicate_inventory_keys, 1);
    }

    #[test]
    fn test_blank_keys_never_match() {
        let shipments = vec![shipment("", "W1", "P1")];
        let deliveries = vec![delivery("D1", "")];
        let claims = vec![claim("C1", "D1")];

        let out = join_datasets(&shipments, &deliveries, &claims, &[], ClaimJoin::Inner);

        assert!(out.records.is_empty());
        assert_eq!(out.stats.unkeyed_rows, 2);
        assert_eq!(out.stats.shipments_without_delivery, 0);
    }
}
