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

use std::{sync::Arc, time::Duration};
use tokio::sync::watch;
use tracing::info;

use crate::*;

/// the composition root of the vehicle link: one connection, the telemetry state store and
/// the command components, all with the same lifetime. A `VehicleLink` is constructed with
/// its connector (never looked up from ambient state), activated once, and torn down once -
/// re-connecting after a drop means constructing a new instance, which keeps the
/// one-live-connection invariant trivially true.
///
/// The presentation layer only ever sees the read side of the state and the five command
/// operations, all of which report outcomes as values instead of raising faults
pub struct VehicleLink<C> where C: VehicleConnector {
    connector: C,
    store: Arc<VehicleStateStore>,
    pending: Arc<PendingCalls>,
    call_timeout: Duration,

    ops: Option<LinkOps>, // present while the link is active
}

/// the command components bound to the current connection. Dropped as a unit on teardown,
/// which releases their outbound queue senders
struct LinkOps {
    dispatcher: CommandDispatcher,
    waypoints: WaypointPublisher,
    actuators: ActuatorController,
}

impl VehicleLink<LiveVehicleConnector> {
    /// a link over a live rosbridge websocket endpoint
    pub fn live (config: VehicleLinkConfig)->Self {
        let call_timeout = config.call_timeout;
        VehicleLink::new( LiveVehicleConnector::new(config), call_timeout)
    }
}

impl<C> VehicleLink<C> where C: VehicleConnector {

    pub fn new (connector: C, call_timeout: Duration)->Self {
        VehicleLink {
            connector,
            store: Arc::new( VehicleStateStore::new()),
            pending: Arc::new( PendingCalls::new()),
            call_timeout,
            ops: None,
        }
    }

    /// open the bridge connection and bind subscriptions and command channels to it.
    /// Failure leaves the link inactive with nothing acquired - connect errors are
    /// surfaced, not retried
    pub async fn activate (&mut self)->Result<()> {
        if self.ops.is_some() {
            return Err( connector_error("vehicle link already active"))
        }

        let cmd_tx = self.connector.connect( self.store.clone(), self.pending.clone()).await?;
        self.ops = Some( LinkOps {
            dispatcher: CommandDispatcher::new( cmd_tx.clone(), self.pending.clone(), self.call_timeout),
            waypoints: WaypointPublisher::new( cmd_tx.clone()),
            actuators: ActuatorController::new( cmd_tx),
        });
        Ok(())
    }

    /// deterministic teardown, idempotent and safe on every exit path (including a link
    /// that never activated). Afterwards the last decoded state stays readable but frozen
    pub async fn close (&mut self) {
        self.ops = None;
        self.connector.close().await;

        self.store.close();
        self.pending.fail_all().await;
    }

    pub fn is_active (&self)->bool {
        self.ops.is_some()
    }

    //--- telemetry surface

    /// the latest decoded vehicle state snapshot
    pub fn state (&self)->VehicleState {
        self.store.snapshot()
    }

    pub fn watch_state (&self)->watch::Receiver<VehicleState> {
        self.store.subscribe()
    }

    pub fn connection_state (&self)->ConnectionState {
        self.connector.connection_state()
    }

    pub fn watch_connection (&self)->watch::Receiver<ConnectionState> {
        self.connector.watch_connection()
    }

    //--- command surface

    pub async fn arm (&self, value: bool)->CommandResult {
        match &self.ops {
            Some(ops) => ops.dispatcher.arm( value).await,
            None => Self::not_active()
        }
    }

    pub async fn set_mode (&self, mode: &str)->CommandResult {
        match &self.ops {
            Some(ops) => ops.dispatcher.set_mode( mode).await,
            None => Self::not_active()
        }
    }

    pub async fn publish_waypoint (&self, wp: &Waypoint)->CommandResult {
        match &self.ops {
            Some(ops) => ops.waypoints.publish_waypoint( wp).await,
            None => Self::not_active()
        }
    }

    pub async fn set_throttle (&self, value: f64)->CommandResult {
        match &self.ops {
            Some(ops) => ops.actuators.set_throttle( value).await,
            None => Self::not_active()
        }
    }

    pub async fn set_servo (&self, value: f64)->CommandResult {
        match &self.ops {
            Some(ops) => ops.actuators.set_servo( value).await,
            None => Self::not_active()
        }
    }

    /// re-emit the last value sent on the given actuator channel
    pub async fn resend_actuator (&self, channel: ActuatorChannel)->CommandResult {
        match &self.ops {
            Some(ops) => ops.actuators.resend( channel).await,
            None => Self::not_active()
        }
    }

    fn not_active ()->CommandResult {
        CommandResult::failure("vehicle link not active")
    }
}
