//! Full pipeline runs against a mock DataHub API.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Duration, Timelike, Utc};

use datahub_client::DataHubClient;
use pipeline::{run_pipeline, RunOptions};
use test_utils::grib::GribBuilder;
use zarr_out::{read_zarr, ArtifactStore, Format, LocalArtifactStore};

const ORDER_ID: &str = "test_order_id";

#[derive(Clone)]
struct MockState {
    manifest: Arc<serde_json::Value>,
    payloads: Arc<HashMap<String, Vec<u8>>>,
}

async fn latest_order(State(state): State<MockState>) -> impl IntoResponse {
    Json(state.manifest.as_ref().clone())
}

async fn file_data(
    State(state): State<MockState>,
    Path((_, file_id)): Path<(String, String)>,
) -> impl IntoResponse {
    match state.payloads.get(&file_id) {
        Some(bytes) => bytes.clone().into_response(),
        None => (StatusCode::NOT_FOUND, format!("no payload for {}", file_id)).into_response(),
    }
}

async fn spawn_mock(
    files: &[(&str, &str)],
    payloads: HashMap<String, Vec<u8>>,
) -> String {
    let state = MockState {
        manifest: Arc::new(test_utils::fixtures::latest_order_response(ORDER_ID, files)),
        payloads: Arc::new(payloads),
    };
    let app = Router::new()
        .route("/orders/:order_id/latest", get(latest_order))
        .route("/orders/:order_id/latest/:file_id/data", get(file_data))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn options(cache_dir: &std::path::Path, save_latest: bool) -> RunOptions {
    RunOptions {
        order_ids: Some(vec![ORDER_ID.to_string()]),
        cache_dir: cache_dir.to_path_buf(),
        formats: vec![Format::Zarr, Format::NetCdf],
        save_latest,
    }
}

fn timestamp(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Surface temperature payload for a recent run.
fn temperature_payload(run_time: DateTime<Utc>) -> Vec<u8> {
    GribBuilder::new()
        .with_reference_time(run_time)
        .with_parameter(0, 0)
        .with_level(103, 2)
        .with_constant_value(288.15)
        .build()
}

#[tokio::test(flavor = "multi_thread")]
async fn fresh_run_publishes_latest_and_timestamped_artifacts() {
    let run_time = (Utc::now() - Duration::hours(1))
        .with_nanosecond(0)
        .unwrap();
    let run = timestamp(run_time);

    let mut payloads = HashMap::new();
    payloads.insert(
        "agl_temperature_00".to_string(),
        temperature_payload(run_time),
    );
    // The duplicate entry has no payload; fetching it would fail the run.
    let base = spawn_mock(
        &[
            ("agl_temperature_00", run.as_str()),
            (
                "atmosphere_high-cloud-cover+low-cloud-cover+medium-cloud-cover_+06_0",
                run.as_str(),
            ),
        ],
        payloads,
    )
    .await;

    let cache = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let client = DataHubClient::with_base_url("key", "secret", &base).unwrap();
    let store = LocalArtifactStore::new(out.path());

    let written = run_pipeline(&client, &store, &options(cache.path(), true))
        .await
        .unwrap();
    assert_eq!(written.len(), 4);

    assert!(out.path().join("latest.zarr").is_dir());
    assert!(out.path().join("latest.nc").is_file());
    assert!(out
        .path()
        .join(format!("{}.zarr", run_time.to_rfc3339()))
        .is_dir());
    assert!(out
        .path()
        .join(format!("{}.nc", run_time.to_rfc3339()))
        .is_file());

    // The cached raw file is keyed by order and file id.
    assert!(cache
        .path()
        .join(format!("{}_agl_temperature_00.grib", ORDER_ID))
        .is_file());

    let restored = read_zarr(store.zarr_storage().unwrap(), "/latest.zarr").unwrap();
    assert_eq!(restored.variables, vec!["t"]);
    assert_eq!(restored.init_times, vec![run_time]);
    assert_eq!(restored.values.dim(), (1, 1, 1, 639, 455));
    assert!(restored
        .values
        .iter()
        .all(|v| (*v - 288.15).abs() < 1e-2));
}

#[tokio::test(flavor = "multi_thread")]
async fn latest_copies_can_be_disabled() {
    let run_time = (Utc::now() - Duration::hours(1))
        .with_nanosecond(0)
        .unwrap();
    let run = timestamp(run_time);

    let mut payloads = HashMap::new();
    payloads.insert(
        "agl_temperature_00".to_string(),
        temperature_payload(run_time),
    );
    let base = spawn_mock(&[("agl_temperature_00", run.as_str())], payloads).await;

    let cache = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let client = DataHubClient::with_base_url("key", "secret", &base).unwrap();
    let store = LocalArtifactStore::new(out.path());

    run_pipeline(&client, &store, &options(cache.path(), false))
        .await
        .unwrap();

    assert!(!out.path().join("latest.zarr").exists());
    assert!(!out.path().join("latest.nc").exists());
    assert!(out
        .path()
        .join(format!("{}.zarr", run_time.to_rfc3339()))
        .is_dir());
    assert!(out
        .path()
        .join(format!("{}.nc", run_time.to_rfc3339()))
        .is_file());
}

#[tokio::test(flavor = "multi_thread")]
async fn stale_runs_publish_nothing() {
    let run_time = (Utc::now() - Duration::hours(12))
        .with_nanosecond(0)
        .unwrap();
    let run = timestamp(run_time);

    let mut payloads = HashMap::new();
    payloads.insert(
        "agl_temperature_00".to_string(),
        temperature_payload(run_time),
    );
    let base = spawn_mock(&[("agl_temperature_00", run.as_str())], payloads).await;

    let cache = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let client = DataHubClient::with_base_url("key", "secret", &base).unwrap();
    let store = LocalArtifactStore::new(out.path());

    let written = run_pipeline(&client, &store, &options(cache.path(), true))
        .await
        .unwrap();

    assert!(written.is_empty());
    assert!(std::fs::read_dir(out.path()).unwrap().next().is_none());
}
