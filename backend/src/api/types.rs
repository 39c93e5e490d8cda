//! REST API request and response types.

use axum::{http::StatusCode, Json};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{PersistenceError, ServerError};
use crate::models::Shipment;

/// Error reply shared by all handlers.
pub type ApiError = (StatusCode, Json<Value>);

/// Body of `POST /shipments`. The id is generated when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentCreate {
    #[serde(default)]
    pub shipment_id: Option<String>,
    pub origin_warehouse: String,
    pub destination_city: String,
    pub ship_date: NaiveDate,
    pub delivery_date: NaiveDate,
    pub product_id: String,
    pub quantity: i64,
    pub freight_cost: f64,
}

impl ShipmentCreate {
    pub fn into_shipment(self) -> Shipment {
        let shipment_id = self
            .shipment_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Shipment {
            shipment_id,
            origin_warehouse: self.origin_warehouse.trim().to_string(),
            destination_city: self.destination_city.trim().to_string(),
            ship_date: Some(self.ship_date),
            delivery_date: Some(self.delivery_date),
            product_id: self.product_id.trim().to_string(),
            quantity: self.quantity,
            freight_cost: self.freight_cost,
        }
    }
}

/// Reply to a delivery-log upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileUploadResponse {
    pub filename: String,
    pub records_processed: usize,
    pub message: String,
}

impl FileUploadResponse {
    pub fn new(filename: impl Into<String>, records_processed: usize) -> Self {
        Self {
            filename: filename.into(),
            records_processed,
            message: format!(
                "Successfully processed {} delivery records",
                records_processed
            ),
        }
    }
}

/// Create an error response body.
pub fn error_response(error: &str) -> Value {
    json!({
        "status": "error",
        "error": error,
    })
}

/// Map a server error to a status code and JSON body.
///
/// Bad input and rejected rows are the caller's fault (400); everything
/// else is a storage or server fault (500).
pub fn error_reply(err: ServerError) -> ApiError {
    let status = match &err {
        ServerError::BadRequest(_)
        | ServerError::Csv(_)
        | ServerError::Persistence(PersistenceError::Rejected { .. }) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(error_response(&err.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CsvError;
    use crate::models::Dataset;

    fn create(id: Option<&str>) -> ShipmentCreate {
        serde_json::from_value(json!({
            "shipment_id": id,
            "origin_warehouse": " W1 ",
            "destination_city": "Austin",
            "ship_date": "2024-01-01",
            "delivery_date": "2024-01-10",
            "product_id": "P1",
            "quantity": 4,
            "freight_cost": 120.5
        }))
        .unwrap()
    }

    #[test]
    fn test_shipment_id_generated_when_absent() {
        let shipment = create(None).into_shipment();
        assert!(Uuid::parse_str(&shipment.shipment_id).is_ok());
        assert_eq!(shipment.origin_warehouse, "W1");

        let shipment = create(Some("  ")).into_shipment();
        assert!(Uuid::parse_str(&shipment.shipment_id).is_ok());

        let shipment = create(Some("S42")).into_shipment();
        assert_eq!(shipment.shipment_id, "S42");
        assert_eq!(shipment.delivery_date, NaiveDate::from_ymd_opt(2024, 1, 10));
    }

    #[test]
    fn test_error_reply_status() {
        let (status, body) = error_reply(ServerError::Csv(CsvError::EmptyFile));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.0["status"], "error");

        let rejected = PersistenceError::Rejected {
            dataset: Dataset::Shipments,
            reason: "UNIQUE constraint failed".into(),
        };
        let (status, _) = error_reply(rejected.into());
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = error_reply(PersistenceError::LockPoisoned.into());
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.0["error"].as_str().unwrap().contains("poisoned"));
    }

    #[test]
    fn test_upload_response_message() {
        let response = FileUploadResponse::new("logs.csv", 12);
        assert_eq!(response.message, "Successfully processed 12 delivery records");
    }
}
