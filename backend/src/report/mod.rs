//! Flat CSV report of enriched shipment records.
//!
//! One header row, then one row per [`EnrichedShipmentRecord`]: every source
//! column of the joined datasets followed by the derived metric columns.
//! Missing values are empty cells, dates are `YYYY-MM-DD`.

use chrono::NaiveDate;
use std::io::Write;
use std::path::Path;

use crate::error::PipelineResult;
use crate::models::EnrichedShipmentRecord;

/// Derived columns appended after the source columns.
pub const DERIVED_COLUMNS: &[&str] = &[
    "expected_delivery_days",
    "delay_duration",
    "claim_aging_days",
    "claim_open_duration",
    "needs_reorder",
    "days_until_restock",
    "restock_status",
];

/// Report header. `product_id` appears once; the join keys are shared.
pub fn headers() -> Vec<&'static str> {
    let mut cols = vec![
        "shipment_id",
        "origin_warehouse",
        "destination_city",
        "ship_date",
        "delivery_date",
        "product_id",
        "quantity",
        "freight_cost",
        "delivery_id",
        "carrier",
        "status",
        "delivery_duration_days",
        "damage_flag",
        "proof_of_delivery_status",
        "claim_id",
        "reason",
        "amount_claimed",
        "claim_status",
        "claim_date",
        "resolved_date",
        "warehouse_id",
        "stock_level",
        "reorder_threshold",
        "last_restock_date",
        "next_restock_due",
    ];
    cols.extend_from_slice(DERIVED_COLUMNS);
    cols
}

fn date_cell(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn opt_cell<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Flatten one record into report cells, in [`headers`] order.
pub fn to_row(record: &EnrichedShipmentRecord) -> Vec<String> {
    let s = &record.shipment;
    let d = &record.delivery;
    let c = record.claim.as_ref();
    let inv = record.inventory.as_ref();

    vec![
        s.shipment_id.clone(),
        s.origin_warehouse.clone(),
        s.destination_city.clone(),
        date_cell(s.ship_date),
        date_cell(s.delivery_date),
        s.product_id.clone(),
        s.quantity.to_string(),
        s.freight_cost.to_string(),
        d.delivery_id.clone(),
        d.carrier.clone(),
        d.status.clone().unwrap_or_default(),
        d.delivery_duration_days.to_string(),
        d.damage_flag.to_string(),
        d.proof_of_delivery_status.clone(),
        opt_cell(c.map(|c| &c.claim_id)),
        opt_cell(c.map(|c| &c.reason)),
        opt_cell(c.map(|c| c.amount_claimed)),
        opt_cell(c.map(|c| &c.claim_status)),
        date_cell(c.and_then(|c| c.claim_date)),
        date_cell(c.and_then(|c| c.resolved_date)),
        opt_cell(inv.map(|i| &i.warehouse_id)),
        opt_cell(inv.map(|i| i.stock_level)),
        opt_cell(inv.map(|i| i.reorder_threshold)),
        date_cell(inv.and_then(|i| i.last_restock_date)),
        date_cell(inv.and_then(|i| i.next_restock_due)),
        opt_cell(record.expected_delivery_days),
        record.delay_duration.to_string(),
        record.claim_aging_days.to_string(),
        record.claim_aging_bucket.label().to_string(),
        opt_cell(record.needs_reorder),
        opt_cell(record.days_until_restock),
        opt_cell(record.restock_status.map(|r| r.label())),
    ]
}

/// Write the report to any writer.
pub fn write_enriched<W: Write>(writer: W, records: &[EnrichedShipmentRecord]) -> PipelineResult<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(headers())?;
    for record in records {
        csv.write_record(to_row(record))?;
    }
    csv.flush()?;
    Ok(())
}

/// Write the report to a file, replacing it.
pub fn write_enriched_csv(path: &Path, records: &[EnrichedShipmentRecord]) -> PipelineResult<()> {
    let file = std::fs::File::create(path)?;
    write_enriched(file, records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClaimAgingBucket, DeliveryLog, Shipment};

    fn record() -> EnrichedShipmentRecord {
        EnrichedShipmentRecord {
            shipment: Shipment {
                shipment_id: "S1".into(),
                origin_warehouse: "W1".into(),
                destination_city: "Reno, NV".into(),
                ship_date: NaiveDate::from_ymd_opt(2024, 1, 1),
                delivery_date: None,
                product_id: "P1".into(),
                quantity: 2,
                freight_cost: 10.5,
            },
            delivery: DeliveryLog {
                delivery_id: "D1".into(),
                shipment_id: "S1".into(),
                carrier: "UPS".into(),
                status: None,
                delivery_duration_days: 4,
                damage_flag: false,
                proof_of_delivery_status: "SIGNED".into(),
            },
            claim: None,
            inventory: None,
            expected_delivery_days: None,
            delay_duration: 0,
            claim_aging_days: 0,
            claim_aging_bucket: ClaimAgingBucket::UpTo30Days,
            needs_reorder: None,
            days_until_restock: None,
            restock_status: None,
        }
    }

    #[test]
    fn test_row_matches_header_width() {
        assert_eq!(to_row(&record()).len(), headers().len());
    }

    #[test]
    fn test_missing_values_are_empty_cells() {
        let row = to_row(&record());
        let col = |name: &str| {
            let i = headers().iter().position(|h| *h == name).unwrap();
            row[i].clone()
        };

        assert_eq!(col("ship_date"), "2024-01-01");
        assert_eq!(col("delivery_date"), "");
        assert_eq!(col("claim_id"), "");
        assert_eq!(col("needs_reorder"), "");
        assert_eq!(col("claim_open_duration"), "0-30 days old");
    }

    #[test]
    fn test_write_quotes_embedded_delimiters() {
        let mut buf = Vec::new();
        write_enriched(&mut buf, &[record()]).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.starts_with("shipment_id,origin_warehouse"));
        assert!(text.contains("\"Reno, NV\""));
        assert_eq!(text.lines().count(), 2);
    }
}
