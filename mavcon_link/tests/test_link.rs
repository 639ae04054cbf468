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

use std::sync::{Arc, Mutex};
use std::time::Duration;
use mavcon_link::{
    BridgeSender, ConnectionState, NavSatFix, PendingCalls, VehicleConnector, VehicleLink,
    VehicleStateStore, Waypoint,
};
use tokio::sync::{mpsc, watch};

/// channel backed connector stand-in. It hands the link the sender of a test queue and
/// captures the store/pending handles so the test can play the role of the rx task
struct TestConnector {
    state_tx: Arc<watch::Sender<ConnectionState>>,
    captured: Arc<Mutex<Option<(Arc<VehicleStateStore>, Arc<PendingCalls>)>>>,
    out_tx: mpsc::Sender<String>,
    fail_connect: bool,
}

impl TestConnector {
    fn new (out_tx: mpsc::Sender<String>)->(Self, Arc<Mutex<Option<(Arc<VehicleStateStore>, Arc<PendingCalls>)>>>) {
        let captured = Arc::new( Mutex::new( None));
        let connector = TestConnector {
            state_tx: Arc::new( watch::Sender::new( ConnectionState::Disconnected)),
            captured: captured.clone(),
            out_tx,
            fail_connect: false,
        };
        (connector, captured)
    }
}

impl VehicleConnector for TestConnector {
    async fn connect (&mut self, store: Arc<VehicleStateStore>, pending: Arc<PendingCalls>)->mavcon_link::Result<BridgeSender> {
        if self.fail_connect {
            self.state_tx.send_replace( ConnectionState::Disconnected);
            return Err( mavcon_link::connector_error("endpoint unreachable"))
        }
        *self.captured.lock().unwrap() = Some( (store, pending));
        self.state_tx.send_replace( ConnectionState::Connected);
        Ok( self.out_tx.clone())
    }

    async fn close (&mut self) {
        let captured = self.captured.lock().unwrap().clone();
        if let Some((store, pending)) = captured {
            store.close();
            pending.fail_all().await;
        }
        self.state_tx.send_replace( ConnectionState::Closed);
    }

    fn connection_state (&self)->ConnectionState {
        *self.state_tx.borrow()
    }

    fn watch_connection (&self)->watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }
}

fn test_link ()->(VehicleLink<TestConnector>, mpsc::Receiver<String>, Arc<Mutex<Option<(Arc<VehicleStateStore>, Arc<PendingCalls>)>>>) {
    let (tx,rx) = mpsc::channel(16);
    let (connector, captured) = TestConnector::new( tx);
    (VehicleLink::new( connector, Duration::from_millis(100)), rx, captured)
}

fn captured_store (captured: &Arc<Mutex<Option<(Arc<VehicleStateStore>, Arc<PendingCalls>)>>>)->Arc<VehicleStateStore> {
    captured.lock().unwrap().as_ref().expect("connector never connected").0.clone()
}

#[tokio::test]
async fn test_commands_require_active_link () {
    let (link, mut rx, _) = test_link();

    let res = link.arm(true).await;
    assert!( !res.is_success());
    assert!( res.detail().contains("not active"));
    assert!( rx.try_recv().is_err(), "inactive link must not emit");
}

#[tokio::test]
async fn test_activation_and_emission () {
    let (mut link, mut rx, _) = test_link();

    link.activate().await.expect("activation failed");
    assert_eq!( link.connection_state(), ConnectionState::Connected);

    let res = link.publish_waypoint( &Waypoint::new( 45.0, -122.0, 10.0)).await;
    assert!( res.is_success());
    assert!( rx.recv().await.is_some(), "waypoint was not emitted");
}

#[tokio::test]
async fn test_double_activation_rejected () {
    let (mut link, _rx, _) = test_link();

    link.activate().await.expect("activation failed");
    assert!( link.activate().await.is_err()); // exactly one live connection per link
}

#[tokio::test]
async fn test_failed_connect_leaves_link_inactive () {
    let (tx,_rx) = mpsc::channel(16);
    let (mut connector, _) = TestConnector::new( tx);
    connector.fail_connect = true;

    let mut link = VehicleLink::new( connector, Duration::from_millis(100));
    assert!( link.activate().await.is_err());
    assert!( !link.is_active());
    assert_eq!( link.connection_state(), ConnectionState::Disconnected);

    // nothing was acquired, so commands still report inactive instead of faulting
    assert!( !link.arm(true).await.is_success());
}

#[tokio::test]
async fn test_telemetry_flow_and_teardown () {
    let (mut link, mut rx, captured) = test_link();
    link.activate().await.expect("activation failed");

    let store = captured_store( &captured);
    store.update_position( &NavSatFix { latitude: 37.0, longitude: -115.0, altitude: 1200.0 });
    assert_eq!( link.state().latitude, 37.0);

    let frozen = link.state();
    link.close().await;
    assert_eq!( link.connection_state(), ConnectionState::Closed);
    assert!( !link.is_active());

    // a late, already buffered telemetry message must be ignored after teardown
    store.update_position( &NavSatFix { latitude: 38.0, longitude: -116.0, altitude: 1300.0 });
    assert_eq!( link.state(), frozen);

    // and commands report the teardown instead of faulting
    assert!( !link.set_throttle(0.5).await.is_success());
}

#[tokio::test]
async fn test_close_is_idempotent () {
    let (mut link, _rx, _) = test_link();
    link.activate().await.expect("activation failed");

    link.close().await;
    link.close().await; // second close is a no-op
    assert_eq!( link.connection_state(), ConnectionState::Closed);
}

#[tokio::test]
async fn test_in_flight_call_fails_on_teardown () {
    let (mut link, mut rx, captured) = test_link();
    link.activate().await.expect("activation failed");

    // drop the link's pending calls while the arm call waits for its response, as a
    // connection teardown would
    let pending = captured.lock().unwrap().as_ref().expect("connector never connected").1.clone();
    tokio::spawn( async move {
        let _ = rx.recv().await; // the call went out
        pending.fail_all().await;
    });

    let res = link.arm(true).await;
    assert!( !res.is_success());
    assert!( res.detail().contains("closed"), "unexpected detail: {}", res.detail());
}
