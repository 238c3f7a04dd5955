//! Canned DataHub API responses.
//!
//! These mirror the JSON shapes the Weather DataHub returns for the orders,
//! latest-files and runs endpoints, so client and pipeline tests can serve
//! them from a local mock server.

use serde_json::{json, Value};

/// Response body for `GET /orders`.
pub fn orders_response(orders: &[(&str, &str)]) -> Value {
    let orders: Vec<Value> = orders
        .iter()
        .map(|(order_id, model_id)| {
            json!({
                "orderId": order_id,
                "name": format!("{} order", order_id),
                "modelId": model_id,
                "requiredLatestRuns": null,
                "format": "GRIB2",
            })
        })
        .collect();
    json!({ "orders": orders })
}

/// Response body for `GET /orders/{orderId}/latest`.
///
/// `files` is a list of `(file_id, run_date_time)` pairs; the run number is
/// derived from the timestamp's hour the way real manifests do.
pub fn latest_order_response(order_id: &str, files: &[(&str, &str)]) -> Value {
    let files: Vec<Value> = files
        .iter()
        .map(|(file_id, run_date_time)| {
            json!({
                "fileId": file_id,
                "runDateTime": run_date_time,
                "run": run_from_timestamp(run_date_time),
            })
        })
        .collect();
    json!({
        "orderDetails": {
            "order": {
                "orderId": order_id,
                "name": format!("{} order", order_id),
                "modelId": "mo-uk-latlon",
                "requiredLatestRuns": null,
                "format": "GRIB2",
            },
            "files": files,
        }
    })
}

/// Response body for `GET /orders/{orderId}/latest/{fileId}`.
pub fn file_details_response(file_id: &str, run_date_time: &str) -> Value {
    json!({
        "fileDetails": {
            "parameterDetails": [
                {
                    "parameterId": "temperature",
                    "extent": {
                        "t": [run_date_time],
                        "z": [2],
                    },
                }
            ],
            "file": {
                "fileId": file_id,
                "runDateTime": run_date_time,
                "run": run_from_timestamp(run_date_time),
            },
        }
    })
}

/// Response body for `GET /runs`.
pub fn runs_response(model_id: &str, runs: &[(u32, &str)]) -> Value {
    json!({ "runs": [runs_for_model_response(model_id, runs)] })
}

/// Response body for `GET /runs/{modelId}`.
pub fn runs_for_model_response(model_id: &str, runs: &[(u32, &str)]) -> Value {
    let complete_runs: Vec<Value> = runs
        .iter()
        .map(|(run, run_date_time)| {
            json!({
                "run": run,
                "runDateTime": run_date_time,
                "runFilter": format!("{:02}", run),
            })
        })
        .collect();
    json!({
        "modelId": model_id,
        "completeRuns": complete_runs,
    })
}

fn run_from_timestamp(run_date_time: &str) -> u32 {
    // "2024-01-01T06:00:00Z" -> 6
    run_date_time
        .get(11..13)
        .and_then(|h| h.parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_order_carries_run_number() {
        let body = latest_order_response(
            "order-a",
            &[("agl_temperature_00", "2024-01-01T06:00:00Z")],
        );
        let files = &body["orderDetails"]["files"];
        assert_eq!(files[0]["fileId"], "agl_temperature_00");
        assert_eq!(files[0]["run"], 6);
    }

    #[test]
    fn orders_list_shape() {
        let body = orders_response(&[("order-a", "mo-uk-latlon")]);
        assert_eq!(body["orders"][0]["orderId"], "order-a");
        assert_eq!(body["orders"][0]["format"], "GRIB2");
    }
}
