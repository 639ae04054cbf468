/*
 * Copyright © 2024, United States Government, as represented by the Administrator of
 * the National Aeronautics and Space Administration. All rights reserved.
 *
 * The “ODIN” software is licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License. You may obtain a copy
 * of the License at http://www.apache.org/licenses/LICENSE-2.0.
 *
 * Unless required by applicable law or agreed to in writing, software distributed under
 * the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND,
 * either express or implied. See the License for the specific language governing permissions
 * and limitations under the License.
 */
#![allow(unused)]

use mavcon_link::{ImuData, NavSatFix, Quaternion, VehicleStateStore, IMU_TOPIC, NAVSAT_TOPIC};
use serde_json::json;

fn fix (latitude: f64, longitude: f64, altitude: f64)->NavSatFix {
    NavSatFix { latitude, longitude, altitude }
}

#[test]
fn test_position_update () {
    let store = VehicleStateStore::new();

    assert!( store.update_position( &fix( 37.0, -115.0, 1200.0)));
    let state = store.snapshot();
    assert_eq!( state.latitude, 37.0);
    assert_eq!( state.longitude, -115.0);
    assert_eq!( state.altitude, 1200.0);
    assert_eq!( state.heading_deg, 0.0); // untouched by the position stream
}

#[test]
fn test_non_finite_fix_skipped () {
    let store = VehicleStateStore::new();
    store.update_position( &fix( 37.0, -115.0, 1200.0));
    let before = store.snapshot();

    // telemetry noise is expected - it must neither update nor fault
    assert!( !store.update_position( &fix( f64::NAN, -115.0, 1200.0)));
    assert!( !store.update_position( &fix( 37.0, f64::INFINITY, 1200.0)));
    assert_eq!( store.snapshot(), before);
}

#[test]
fn test_streams_update_disjoint_fields () {
    let store = VehicleStateStore::new();

    store.update_position( &fix( 37.0, -115.0, 1200.0));
    store.update_heading( &ImuData { orientation: Quaternion { x: 0.0, y: 0.0, z: 45f64.to_radians().sin(), w: 45f64.to_radians().cos() } });

    let state = store.snapshot();
    assert_eq!( state.latitude, 37.0); // position survives a heading update
    assert!( (state.heading_deg - 90.0).abs() < 0.1);

    store.update_position( &fix( 37.1, -115.1, 1210.0));
    let state = store.snapshot();
    assert!( (state.heading_deg - 90.0).abs() < 0.1); // heading survives a position update
    assert_eq!( state.latitude, 37.1);
}

#[test]
fn test_update_stamps_snapshot () {
    let store = VehicleStateStore::new();
    let before = store.snapshot();

    store.update_position( &fix( 1.0, 2.0, 3.0));
    assert!( store.snapshot().last_update > before.last_update);
}

#[test]
fn test_closed_store_is_frozen () {
    let store = VehicleStateStore::new();
    store.update_position( &fix( 37.0, -115.0, 1200.0));
    let before = store.snapshot();

    store.close();
    assert!( store.is_closed());

    // a message the transport had already buffered at teardown is dropped, not a fault
    assert!( !store.update_position( &fix( 38.0, -116.0, 1300.0)));
    assert!( !store.update_heading( &ImuData { orientation: Quaternion::identity() }));
    assert_eq!( store.snapshot(), before);
}

#[test]
fn test_apply_telemetry_dispatch () {
    let store = VehicleStateStore::new();

    assert!( store.apply_telemetry( NAVSAT_TOPIC, &json!({"latitude": 10.0, "longitude": 20.0, "altitude": 30.0})));
    assert_eq!( store.snapshot().longitude, 20.0);

    assert!( store.apply_telemetry( IMU_TOPIC, &json!({"orientation": {"x": 0.0, "y": 0.0, "z": 0.0, "w": 1.0}})));
    assert_eq!( store.snapshot().heading_deg, 0.0);

    // unknown topics and malformed payloads are skipped
    assert!( !store.apply_telemetry( "/mavros/battery", &json!({"voltage": 11.1})));
    assert!( !store.apply_telemetry( NAVSAT_TOPIC, &json!({"latitude": "not-a-number"})));
    assert_eq!( store.snapshot().latitude, 10.0);
}

#[test]
fn test_watch_notification () {
    let store = VehicleStateStore::new();
    let mut rx = store.subscribe();

    assert!( !rx.has_changed().unwrap());
    store.update_position( &fix( 5.0, 6.0, 7.0));
    assert!( rx.has_changed().unwrap());
    assert_eq!( rx.borrow_and_update().latitude, 5.0);
}
