//! Typed DataHub API responses.
//!
//! Field names follow the wire format (camelCase) via serde renames.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One order from `GET /orders`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderInfo {
    pub order_id: String,
    pub name: String,
    pub model_id: String,
    #[serde(default)]
    pub required_latest_runs: Option<Vec<u32>>,
    pub format: String,
}

/// Response body of `GET /orders`.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderList {
    pub orders: Vec<OrderInfo>,
}

/// One file entry in a latest-order manifest.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    pub file_id: String,
    pub run_date_time: DateTime<Utc>,
    pub run: u32,
}

/// Manifest of `GET /orders/{orderId}/latest`.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderDetails {
    pub order: OrderInfo,
    pub files: Vec<File>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OrderDetailsResponse {
    pub order_details: OrderDetails,
}

/// Time and level extent of one parameter in a file.
#[derive(Debug, Clone, Deserialize)]
pub struct Extent {
    pub t: Vec<DateTime<Utc>>,
    #[serde(default)]
    pub z: Vec<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDetails {
    pub parameter_id: String,
    pub extent: Extent,
}

/// Response body of `GET /orders/{orderId}/latest/{fileId}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDetails {
    pub parameter_details: Vec<ParameterDetails>,
    pub file: File,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FileDetailsResponse {
    pub file_details: FileDetails,
}

/// One completed model run.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunDetails {
    pub run: u32,
    pub run_date_time: DateTime<Utc>,
    pub run_filter: String,
}

/// Response body of `GET /runs/{modelId}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunListForModel {
    pub model_id: String,
    pub complete_runs: Vec<RunDetails>,
}

/// Response body of `GET /runs`.
#[derive(Debug, Clone, Deserialize)]
pub struct RunList {
    pub runs: Vec<RunListForModel>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::fixtures;

    #[test]
    fn latest_order_manifest_deserializes() {
        let body = fixtures::latest_order_response(
            "order-a",
            &[("agl_temperature_00", "2024-01-01T06:00:00Z")],
        );
        let parsed: OrderDetailsResponse = serde_json::from_value(body).unwrap();
        let details = parsed.order_details;
        assert_eq!(details.order.order_id, "order-a");
        assert_eq!(details.files.len(), 1);
        assert_eq!(details.files[0].file_id, "agl_temperature_00");
        assert_eq!(details.files[0].run, 6);
    }

    #[test]
    fn runs_for_model_deserializes() {
        let body = fixtures::runs_for_model_response(
            "mo-uk-latlon",
            &[(0, "2024-01-01T00:00:00Z"), (6, "2024-01-01T06:00:00Z")],
        );
        let parsed: RunListForModel = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.model_id, "mo-uk-latlon");
        assert_eq!(parsed.complete_runs.len(), 2);
        assert_eq!(parsed.complete_runs[1].run_filter, "06");
    }

    #[test]
    fn file_details_deserialize() {
        let body = fixtures::file_details_response("agl_temperature_00", "2024-01-01T06:00:00Z");
        let parsed: FileDetailsResponse = serde_json::from_value(body).unwrap();
        let details = parsed.file_details;
        assert_eq!(details.parameter_details[0].parameter_id, "temperature");
        assert_eq!(details.parameter_details[0].extent.t.len(), 1);
        assert_eq!(details.file.file_id, "agl_temperature_00");
    }
}
