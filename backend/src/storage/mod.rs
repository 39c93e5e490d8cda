//! Relational store for the cleaned datasets.
//!
//! [`persist_all`] appends the five datasets through a [`PersistenceGateway`]
//! in [`Dataset::LOAD_ORDER`]. Each dataset is its own transaction: a
//! rejected dataset leaves no rows behind, and datasets committed before it
//! stay committed.

use rusqlite::{params, Connection, ErrorCode, Transaction};
use std::path::Path;

use crate::api::logs::{log_error, log_success};
use crate::error::{PersistenceError, PersistenceResult};
use crate::models::{
    CleanedDatasets, Claim, Dataset, DeliveryLog, InventoryRecord, Shipment, Vendor,
};

const SCHEMA: &str = r#"
    PRAGMA foreign_keys = ON;
    CREATE TABLE IF NOT EXISTS shipments (
        shipment_id      TEXT PRIMARY KEY,
        origin_warehouse TEXT NOT NULL,
        destination_city TEXT NOT NULL,
        ship_date        TEXT,
        delivery_date    TEXT,
        product_id       TEXT NOT NULL,
        quantity         INTEGER NOT NULL,
        freight_cost     REAL NOT NULL
    );
    CREATE TABLE IF NOT EXISTS vendors (
        vendor_id      TEXT PRIMARY KEY,
        vendor_name    TEXT NOT NULL,
        product_id     TEXT NOT NULL,
        contract_start TEXT,
        contract_end   TEXT,
        vendor_rating  REAL,
        country        TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS inventory (
        warehouse_id      TEXT NOT NULL,
        product_id        TEXT NOT NULL,
        stock_level       INTEGER NOT NULL,
        reorder_threshold INTEGER NOT NULL,
        last_restock_date TEXT,
        next_restock_due  TEXT,
        PRIMARY KEY (warehouse_id, product_id)
    );
    CREATE TABLE IF NOT EXISTS delivery_logs (
        delivery_id              TEXT PRIMARY KEY,
        shipment_id              TEXT NOT NULL REFERENCES shipments(shipment_id),
        carrier                  TEXT NOT NULL,
        status                   TEXT,
        delivery_duration_days   INTEGER NOT NULL,
        damage_flag              INTEGER NOT NULL DEFAULT 0,
        proof_of_delivery_status TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS claims (
        claim_id       TEXT PRIMARY KEY,
        delivery_id    TEXT NOT NULL REFERENCES delivery_logs(delivery_id),
        reason         TEXT NOT NULL,
        amount_claimed REAL NOT NULL,
        claim_status   TEXT NOT NULL DEFAULT 'PENDING',
        claim_date     TEXT,
        resolved_date  TEXT
    );
"#;

/// Destination for cleaned datasets.
pub trait PersistenceGateway {
    /// Append every row of one dataset, all or nothing. Returns rows written.
    fn append(&mut self, dataset: Dataset, data: &CleanedDatasets) -> PersistenceResult<usize>;
}

/// Per-dataset outcome of a bulk load.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub outcomes: Vec<(Dataset, PersistenceResult<usize>)>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(|(_, r)| r.is_ok())
    }

    pub fn rows_loaded(&self) -> usize {
        self.outcomes
            .iter()
            .filter_map(|(_, r)| r.as_ref().ok())
            .sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = (Dataset, &PersistenceError)> {
        self.outcomes
            .iter()
            .filter_map(|(d, r)| r.as_ref().err().map(|e| (*d, e)))
    }
}

/// Load all five datasets in dependency order.
///
/// A failure is recorded and the remaining datasets are still attempted;
/// rows depending on a rejected dataset will usually be rejected in turn.
pub fn persist_all<G: PersistenceGateway + ?Sized>(
    gateway: &mut G,
    data: &CleanedDatasets,
) -> LoadReport {
    let mut report = LoadReport::default();

    for dataset in Dataset::LOAD_ORDER {
        let result = gateway.append(dataset, data);
        match &result {
            Ok(rows) => log_success(format!("Loaded {} rows into {}", rows, dataset)),
            Err(e) => log_error(format!("Failed to load {}: {}", dataset, e)),
        }
        report.outcomes.push((dataset, result));
    }

    report
}

/// SQLite-backed store.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) a database file and ensure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> PersistenceResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> PersistenceResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> PersistenceResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Insert one shipment. A duplicate id is a rejection, not a storage fault.
    pub fn insert_shipment(&mut self, shipment: &Shipment) -> PersistenceResult<()> {
        let tx = self.conn.transaction()?;
        insert_shipments(&tx, std::slice::from_ref(shipment))
            .map_err(|e| rejection(Dataset::Shipments, e))?;
        tx.commit()?;
        Ok(())
    }

    /// Read every table, in insertion order.
    pub fn snapshot(&self) -> PersistenceResult<CleanedDatasets> {
        Ok(CleanedDatasets {
            shipments: self.read_shipments()?,
            delivery_logs: self.read_delivery_logs()?,
            claims: self.read_claims()?,
            vendors: self.read_vendors()?,
            inventory: self.read_inventory()?,
        })
    }

    fn read_shipments(&self) -> PersistenceResult<Vec<Shipment>> {
        let mut stmt = self.conn.prepare(
            "SELECT shipment_id, origin_warehouse, destination_city, ship_date, delivery_date,
                    product_id, quantity, freight_cost
             FROM shipments ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Shipment {
                shipment_id: row.get(0)?,
                origin_warehouse: row.get(1)?,
                destination_city: row.get(2)?,
                ship_date: row.get(3)?,
                delivery_date: row.get(4)?,
                product_id: row.get(5)?,
                quantity: row.get(6)?,
                freight_cost: row.get(7)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn read_delivery_logs(&self) -> PersistenceResult<Vec<DeliveryLog>> {
        let mut stmt = self.conn.prepare(
            "SELECT delivery_id, shipment_id, carrier, status, delivery_duration_days,
                    damage_flag, proof_of_delivery_status
             FROM delivery_logs ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(DeliveryLog {
                delivery_id: row.get(0)?,
                shipment_id: row.get(1)?,
                carrier: row.get(2)?,
                status: row.get(3)?,
                delivery_duration_days: row.get(4)?,
                damage_flag: row.get(5)?,
                proof_of_delivery_status: row.get(6)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn read_claims(&self) -> PersistenceResult<Vec<Claim>> {
        let mut stmt = self.conn.prepare(
            "SELECT claim_id, delivery_id, reason, amount_claimed, claim_status,
                    claim_date, resolved_date
             FROM claims ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Claim {
                claim_id: row.get(0)?,
                delivery_id: row.get(1)?,
                reason: row.get(2)?,
                amount_claimed: row.get(3)?,
                claim_status: row.get(4)?,
                claim_date: row.get(5)?,
                resolved_date: row.get(6)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn read_vendors(&self) -> PersistenceResult<Vec<Vendor>> {
        let mut stmt = self.conn.prepare(
            "SELECT vendor_id, vendor_name, product_id, contract_start, contract_end,
                    vendor_rating, country
             FROM vendors ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Vendor {
                vendor_id: row.get(0)?,
                vendor_name: row.get(1)?,
                product_id: row.get(2)?,
                contract_start: row.get(3)?,
                contract_end: row.get(4)?,
                vendor_rating: row.get(5)?,
                country: row.get(6)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn read_inventory(&self) -> PersistenceResult<Vec<InventoryRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT warehouse_id, product_id, stock_level, reorder_threshold,
                    last_restock_date, next_restock_due
             FROM inventory ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(InventoryRecord {
                warehouse_id: row.get(0)?,
                product_id: row.get(1)?,
                stock_level: row.get(2)?,
                reorder_threshold: row.get(3)?,
                last_restock_date: row.get(4)?,
                next_restock_due: row.get(5)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

impl PersistenceGateway for SqliteStore {
    fn append(&mut self, dataset: Dataset, data: &CleanedDatasets) -> PersistenceResult<usize> {
        let tx = self.conn.transaction()?;
        let written = match dataset {
            Dataset::Shipments => insert_shipments(&tx, &data.shipments),
            Dataset::DeliveryLogs => insert_delivery_logs(&tx, &data.delivery_logs),
            Dataset::Claims => insert_claims(&tx, &data.claims),
            Dataset::Vendors => insert_vendors(&tx, &data.vendors),
            Dataset::Inventory => insert_inventory(&tx, &data.inventory),
        }
        .map_err(|e| rejection(dataset, e))?;
        // Dropping an uncommitted transaction rolls it back.
        tx.commit()?;
        Ok(written)
    }
}

/// Constraint violations reject the dataset; anything else is a storage fault.
fn rejection(dataset: Dataset, err: rusqlite::Error) -> PersistenceError {
    match err {
        rusqlite::Error::SqliteFailure(ref e, ref msg) if e.code == ErrorCode::ConstraintViolation => {
            PersistenceError::Rejected {
                dataset,
                reason: msg.clone().unwrap_or_else(|| e.to_string()),
            }
        }
        other => PersistenceError::Sqlite(other),
    }
}

fn insert_shipments(tx: &Transaction<'_>, rows: &[Shipment]) -> rusqlite::Result<usize> {
    let mut stmt = tx.prepare(
        "INSERT INTO shipments (shipment_id, origin_warehouse, destination_city, ship_date,
                                delivery_date, product_id, quantity, freight_cost)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;
    for s in rows {
        stmt.execute(params![
            s.shipment_id,
            s.origin_warehouse,
            s.destination_city,
            s.ship_date,
            s.delivery_date,
            s.product_id,
            s.quantity,
            s.freight_cost,
        ])?;
    }
    Ok(rows.len())
}

fn insert_delivery_logs(tx: &Transaction<'_>, rows: &[DeliveryLog]) -> rusqlite::Result<usize> {
    let mut stmt = tx.prepare(
        "INSERT INTO delivery_logs (delivery_id, shipment_id, carrier, status,
                                    delivery_duration_days, damage_flag, proof_of_delivery_status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    for d in rows {
        stmt.execute(params![
            d.delivery_id,
            d.shipment_id,
            d.carrier,
            d.status,
            d.delivery_duration_days,
            d.damage_flag,
            d.proof_of_delivery_status,
        ])?;
    }
    Ok(rows.len())
}

fn insert_claims(tx: &Transaction<'_>, rows: &[Claim]) -> rusqlite::Result<usize> {
    let mut stmt = tx.prepare(
        "INSERT INTO claims (claim_id, delivery_id, reason, amount_claimed, claim_status,
                             claim_date, resolved_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    for c in rows {
        stmt.execute(params![
            c.claim_id,
            c.delivery_id,
            c.reason,
            c.amount_claimed,
            c.claim_status,
            c.claim_date,
            c.resolved_date,
        ])?;
    }
    Ok(rows.len())
}

fn insert_vendors(tx: &Transaction<'_>, rows: &[Vendor]) -> rusqlite::Result<usize> {
    let mut stmt = tx.prepare(
        "INSERT INTO vendors (vendor_id, vendor_name, product_id, contract_start, contract_end,
                              vendor_rating, country)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    for v in rows {
        stmt.execute(params![
            v.vendor_id,
            v.vendor_name,
            v.product_id,
            v.contract_start,
            v.contract_end,
            v.vendor_rating,
            v.country,
        ])?;
    }
    Ok(rows.len())
}

fn insert_inventory(tx: &Transaction<'_>, rows: &[InventoryRecord]) -> rusqlite::Result<usize> {
    let mut stmt = tx.prepare(
        "INSERT INTO inventory (warehouse_id, product_id, stock_level, reorder_threshold,
                                last_restock_date, next_restock_due)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    for i in rows {
        stmt.execute(params![
            i.warehouse_id,
            i.product_id,
            i.stock_level,
            i.reorder_threshold,
            i.last_restock_date,
            i.next_restock_due,
        ])?;
    }
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn shipment(id: &str) -> Shipment {
        Shipment {
            shipment_id: id.into(),
            origin_warehouse: "W1".into(),
            destination_city: "Austin".into(),
            ship_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            delivery_date: None,
            product_id: "P1".into(),
            quantity: 3,
            freight_cost: 42.5,
        }
    }

    fn delivery(id: &str, shipment_id: &str) -> DeliveryLog {
        DeliveryLog {
            delivery_id: id.into(),
            shipment_id: shipment_id.into(),
            carrier: "UPS".into(),
            status: Some("DELIVERED".into()),
            delivery_duration_days: 5,
            damage_flag: true,
            proof_of_delivery_status: "SIGNED".into(),
        }
    }

    fn claim(id: &str, delivery_id: &str) -> Claim {
        Claim {
            claim_id: id.into(),
            delivery_id: delivery_id.into(),
            reason: "Damaged".into(),
            amount_claimed: 10.0,
            claim_status: "PENDING".into(),
            claim_date: NaiveDate::from_ymd_opt(2024, 2, 1),
            resolved_date: None,
        }
    }

    fn datasets() -> CleanedDatasets {
        CleanedDatasets {
            shipments: vec![shipment("S1"), shipment("S2")],
            delivery_logs: vec![delivery("D1", "S1")],
            claims: vec![claim("C1", "D1")],
            vendors: vec![Vendor {
                vendor_id: "V1".into(),
                vendor_name: "Acme".into(),
                product_id: "P1".into(),
                contract_start: None,
                contract_end: NaiveDate::from_ymd_opt(2030, 1, 1),
                vendor_rating: None,
                country: "US".into(),
            }],
            inventory: vec![InventoryRecord {
                warehouse_id: "W1".into(),
                product_id: "P1".into(),
                stock_level: 5,
                reorder_threshold: 10,
                last_restock_date: None,
                next_restock_due: NaiveDate::from_ymd_opt(2024, 6, 1),
            }],
        }
    }

    #[test]
    fn test_persist_all_and_snapshot() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let data = datasets();

        let report = persist_all(&mut store, &data);
        assert!(report.is_complete());
        assert_eq!(report.rows_loaded(), 6);
        let order: Vec<Dataset> = report.outcomes.iter().map(|(d, _)| *d).collect();
        assert_eq!(order, Dataset::LOAD_ORDER.to_vec());

        assert_eq!(store.snapshot().unwrap(), data);
    }

    #[test]
    fn test_foreign_key_rejection_keeps_earlier_datasets() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut data = datasets();
        data.delivery_logs.push(delivery("D2", "S404"));

        let report = persist_all(&mut store, &data);
        assert!(!report.is_complete());

        let failed: Vec<Dataset> = report.failures().map(|(d, _)| d).collect();
        assert_eq!(failed, vec![Dataset::DeliveryLogs, Dataset::Claims]);
        assert!(matches!(
            report.failures().next().unwrap().1,
            PersistenceError::Rejected { dataset: Dataset::DeliveryLogs, .. }
        ));

        let snapshot = store.snapshot().unwrap();
        assert_eq!(snapshot.shipments.len(), 2);
        assert_eq!(snapshot.inventory.len(), 1);
        assert!(snapshot.delivery_logs.is_empty());
        assert!(snapshot.claims.is_empty());
    }

    #[test]
    fn test_insert_shipment_duplicate_is_rejected() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.insert_shipment(&shipment("S1")).unwrap();

        let err = store.insert_shipment(&shipment("S1")).unwrap_err();
        assert!(matches!(err, PersistenceError::Rejected { dataset: Dataset::Shipments, .. }));
        assert_eq!(store.snapshot().unwrap().shipments.len(), 1);
    }

    #[test]
    fn test_open_file_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("supply_chain.db");

        let mut store = SqliteStore::open(&path).unwrap();
        store.insert_shipment(&shipment("S1")).unwrap();
        drop(store);

        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(reopened.snapshot().unwrap().shipments[0].shipment_id, "S1");
    }
}
