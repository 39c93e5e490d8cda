//! Derived delivery, claim and restock metrics.
//!
//! Pure functions of the joined rows and a fixed "today"; nothing reads the
//! clock here. Missing dates degrade per field:
//!
//! | Metric | When an input date is missing |
//! |--------|-------------------------------|
//! | `expected_delivery_days` | missing |
//! | `delay_duration` | `0` |
//! | `claim_aging_days` | `0` |
//! | `days_until_restock`, `restock_status` | missing |

use chrono::NaiveDate;

use crate::models::{ClaimAgingBucket, EnrichedShipmentRecord, JoinedRecord, RestockStatus};

/// Inputs the metrics depend on besides the rows themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsContext {
    pub today: NaiveDate,
}

impl MetricsContext {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    /// Context anchored on the local calendar date.
    pub fn today() -> Self {
        Self::new(chrono::Local::now().date_naive())
    }
}

/// Signed calendar days from `from` to `to`.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// Calendar days between ship and delivery dates.
pub fn expected_delivery_days(ship: Option<NaiveDate>, delivered: Option<NaiveDate>) -> Option<i64> {
    Some(days_between(ship?, delivered?))
}

/// Recorded duration minus expected days, never negative.
pub fn delay_duration(recorded_days: i64, expected_days: Option<i64>) -> i64 {
    match expected_days {
        Some(expected) => recorded_days.saturating_sub(expected).max(0),
        None => 0,
    }
}

/// Days a claim has been open; `0` without a claim date.
pub fn claim_aging_days(claim_date: Option<NaiveDate>, ctx: &MetricsContext) -> i64 {
    claim_date.map_or(0, |d| days_between(d, ctx.today))
}

/// Days until the next scheduled restock; negative when overdue.
pub fn days_until_restock(next_due: Option<NaiveDate>, ctx: &MetricsContext) -> Option<i64> {
    next_due.map(|d| days_between(ctx.today, d))
}

/// Compute every derived field for one joined row.
pub fn enrich(record: JoinedRecord, ctx: &MetricsContext) -> EnrichedShipmentRecord {
    let expected = expected_delivery_days(record.shipment.ship_date, record.shipment.delivery_date);
    let delay = delay_duration(record.delivery.delivery_duration_days, expected);

    let aging = claim_aging_days(record.claim.as_ref().and_then(|c| c.claim_date), ctx);

    let needs_reorder = record.inventory.as_ref().map(|inv| inv.needs_reorder());
    let until_restock = days_until_restock(
        record.inventory.as_ref().and_then(|inv| inv.next_restock_due),
        ctx,
    );

    EnrichedShipmentRecord {
        shipment: record.shipment,
        delivery: record.delivery,
        claim: record.claim,
        inventory: record.inventory,
        expected_delivery_days: expected,
        delay_duration: delay,
        claim_aging_days: aging,
        claim_aging_bucket: ClaimAgingBucket::from_days(aging),
        needs_reorder,
        days_until_restock: until_restock,
        restock_status: until_restock.map(RestockStatus::from_days),
    }
}

/// Enrich a whole joined record set, preserving order.
pub fn compute_metrics(records: Vec<JoinedRecord>, ctx: &MetricsContext) -> Vec<EnrichedShipmentRecord> {
    records.into_iter().map(|r| enrich(r, ctx)).collect()
}
