//! Decode synthetic GRIB2 payloads end to end.

use chrono::{TimeZone, Utc};
use grib_decode::decode_all;
use test_utils::{concat_messages, GribBuilder};

#[test]
fn decodes_temperature_message() {
    let reference_time = Utc.with_ymd_and_hms(2024, 3, 15, 6, 0, 0).unwrap();
    let payload = GribBuilder::new()
        .with_reference_time(reference_time)
        .with_grid(10, 10)
        .with_constant_value(288.15)
        .with_forecast_hour(3)
        .build();

    let messages = decode_all(&payload).expect("payload should decode");
    assert_eq!(messages.len(), 1);

    let msg = &messages[0];
    assert_eq!(msg.identification.centre, 74);
    assert_eq!(msg.identification.reference_time, reference_time);
    assert_eq!(msg.grid.ni, 10);
    assert_eq!(msg.grid.nj, 10);
    assert_eq!(msg.product.short_name, "t");
    assert_eq!(msg.product.level_coordinate, "heightAboveGround");
    assert_eq!(msg.product.level_value, 2);
    assert_eq!(msg.product.forecast_hour, 3);

    let values = msg.values().expect("values should unpack");
    assert_eq!(values.len(), 100);
    for v in values {
        assert!((v - 288.15).abs() < 1e-3, "constant field, got {}", v);
    }
}

#[test]
fn gradient_unpacks_within_quantisation_error() {
    let payload = GribBuilder::new()
        .with_grid(10, 1)
        .with_gradient(0.0, 100.0)
        .build();

    let messages = decode_all(&payload).unwrap();
    let values = messages[0].values().unwrap();

    assert_eq!(values.len(), 10);
    assert!(values[0].abs() < 2.0, "first value {} should be near 0", values[0]);
    assert!(
        (values[9] - 90.0).abs() < 2.0,
        "last value {} should be near 90",
        values[9]
    );
    for pair in values.windows(2) {
        assert!(pair[1] >= pair[0], "gradient should be monotonic");
    }
}

#[test]
fn decodes_multi_message_payload() {
    let temperature = GribBuilder::new()
        .with_grid(4, 3)
        .with_parameter(0, 0)
        .build();
    let visibility = GribBuilder::new()
        .with_grid(4, 3)
        .with_parameter(19, 0)
        .with_level(1, 0)
        .build();

    let payload = concat_messages(&[temperature, visibility]);
    let messages = decode_all(&payload).unwrap();

    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].product.short_name, "t");
    assert_eq!(messages[1].product.short_name, "vis");
    assert_eq!(messages[1].product.level_coordinate, "surface");
}

#[test]
fn grid_coordinates_descend_north_to_south() {
    let payload = GribBuilder::new()
        .with_grid(3, 3)
        .with_extent(61.0, -11.0, 59.0, -9.0)
        .with_increments(1.0, 1.0)
        .build();

    let messages = decode_all(&payload).unwrap();
    let grid = &messages[0].grid;

    assert_eq!(grid.latitudes(), vec![61.0, 60.0, 59.0]);
    assert_eq!(grid.longitudes(), vec![-11.0, -10.0, -9.0]);
}
