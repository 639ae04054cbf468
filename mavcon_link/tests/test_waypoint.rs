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

use mavcon_link::{Waypoint, WaypointPublisher};
use serde_json::{json,Value};
use tokio::sync::mpsc;

fn publisher ()->(WaypointPublisher, mpsc::Receiver<String>) {
    let (tx,rx) = mpsc::channel(16);
    (WaypointPublisher::new(tx), rx)
}

#[tokio::test]
async fn test_out_of_range_latitude_rejected () {
    let (wp_pub, mut rx) = publisher();

    let res = wp_pub.publish_waypoint( &Waypoint::new( 91.0, 0.0, 0.0)).await;
    assert!( !res.is_success());
    assert!( res.detail().contains("latitude"), "unexpected detail: {}", res.detail());
    assert!( rx.try_recv().is_err(), "rejected waypoint must not be emitted");
}

#[tokio::test]
async fn test_out_of_range_longitude_rejected () {
    let (wp_pub, mut rx) = publisher();

    let res = wp_pub.publish_waypoint( &Waypoint::new( 45.0, -180.5, 0.0)).await;
    assert!( !res.is_success());
    assert!( res.detail().contains("longitude"), "unexpected detail: {}", res.detail());
    assert!( rx.try_recv().is_err());
}

#[tokio::test]
async fn test_non_finite_coordinates_rejected () {
    let (wp_pub, mut rx) = publisher();

    for wp in [
        Waypoint::new( f64::NAN, 0.0, 0.0),
        Waypoint::new( 0.0, f64::NEG_INFINITY, 0.0),
        Waypoint::new( 0.0, 0.0, f64::NAN),
    ] {
        let res = wp_pub.publish_waypoint( &wp).await;
        assert!( !res.is_success());
        assert!( res.detail().contains("non-finite"), "unexpected detail: {}", res.detail());
    }
    assert!( rx.try_recv().is_err());
}

#[tokio::test]
async fn test_valid_waypoint_emission () {
    let (wp_pub, mut rx) = publisher();

    let res = wp_pub.publish_waypoint( &Waypoint::new( 45.0, -122.0, 10.0)).await;
    assert!( res.is_success());

    // exactly one message, schema-exact, orientation fixed at identity
    let json = rx.recv().await.expect("no waypoint emitted");
    let got: Value = serde_json::from_str(&json).expect("invalid json");
    let expected = json!({
        "op": "publish",
        "topic": "/mavros/setpoint_position/global",
        "msg": {
            "header": { "frame_id": "map" },
            "pose": {
                "position": { "latitude": 45.0, "longitude": -122.0, "altitude": 10.0 },
                "orientation": { "x": 0.0, "y": 0.0, "z": 0.0, "w": 1.0 }
            }
        }
    });
    assert_eq!( got, expected);
    assert!( rx.try_recv().is_err(), "waypoint emission is one-shot");
}

#[tokio::test]
async fn test_boundary_coordinates_accepted () {
    let (wp_pub, mut rx) = publisher();

    // the poles and the date line are valid targets, as is a negative altitude
    assert!( wp_pub.publish_waypoint( &Waypoint::new( 90.0, 180.0, 0.0)).await.is_success());
    assert!( wp_pub.publish_waypoint( &Waypoint::new( -90.0, -180.0, -12.5)).await.is_success());
    assert!( rx.recv().await.is_some());
    assert!( rx.recv().await.is_some());
}
