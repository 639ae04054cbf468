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

use std::sync::atomic::{AtomicBool,Ordering};
use chrono::Utc;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug,warn};
use crate::*;

/* #region heading conversion ************************************************************************/

#[inline]
pub fn normalize_360 (d: f64)->f64 {
    let x = d % 360.0;
    if x < 0.0 { 360.0 + x } else { x }
}

/// heading in [0,360) from an attitude quaternion, at display precision (one decimal).
/// This extracts the yaw component about the vertical axis - pitch and roll are discarded
/// since only heading drives the console
pub fn yaw_degrees (q: &Quaternion)->f64 {
    let yaw_rad = (2.0 * (q.w * q.z + q.x * q.y)).atan2( 1.0 - 2.0 * (q.y * q.y + q.z * q.z));
    let deg = (normalize_360( yaw_rad.to_degrees()) * 10.0).round() / 10.0;
    if deg >= 360.0 { 0.0 } else { deg } // rounding can push 359.96.. over the wrap
}

/* #endregion heading conversion */

/* #region vehicle state store ***********************************************************************/

/// last-write-wins holder of the current [`VehicleState`], shared between the connection
/// rx task (writer) and the presentation layer (readers). Position and heading messages
/// arrive on independent streams and each replaces the whole snapshot with only its own
/// field group changed. Once closed the store stays frozen - telemetry that the transport
/// already buffered at teardown is dropped, not an error
pub struct VehicleStateStore {
    state_tx: watch::Sender<VehicleState>,
    closed: AtomicBool,
}

impl VehicleStateStore {
    pub fn new ()->Self {
        VehicleStateStore {
            state_tx: watch::Sender::new( VehicleState::default()),
            closed: AtomicBool::new(false),
        }
    }

    pub fn snapshot (&self)->VehicleState {
        *self.state_tx.borrow()
    }

    pub fn subscribe (&self)->watch::Receiver<VehicleState> {
        self.state_tx.subscribe()
    }

    pub fn close (&self) {
        self.closed.store( true, Ordering::Release);
    }

    pub fn is_closed (&self)->bool {
        self.closed.load( Ordering::Acquire)
    }

    /// decode a message published on one of the subscribed telemetry topics. Returns
    /// whether the state was updated - a skipped message is not an error
    pub fn apply_telemetry (&self, topic: &str, msg: &Value)->bool {
        match topic {
            NAVSAT_TOPIC => {
                match serde_json::from_value::<NavSatFix>( msg.clone()) {
                    Ok(fix) => self.update_position( &fix),
                    Err(e) => { debug!("malformed position fix: {e}"); false }
                }
            }
            IMU_TOPIC => {
                match serde_json::from_value::<ImuData>( msg.clone()) {
                    Ok(imu) => self.update_heading( &imu),
                    Err(e) => { debug!("malformed imu message: {e}"); false }
                }
            }
            other => { debug!("ignoring message for unhandled topic {other}"); false }
        }
    }

    pub fn update_position (&self, fix: &NavSatFix)->bool {
        if self.is_closed() { return false }
        if !fix.is_finite() {
            debug!("discarding non-finite position fix {:?}", fix);
            return false
        }

        let prev = self.snapshot();
        self.state_tx.send_replace( VehicleState {
            latitude: fix.latitude,
            longitude: fix.longitude,
            altitude: fix.altitude,
            heading_deg: prev.heading_deg,
            last_update: Utc::now(),
        });
        true
    }

    pub fn update_heading (&self, imu: &ImuData)->bool {
        if self.is_closed() { return false }
        if !imu.orientation.is_finite() {
            debug!("discarding non-finite orientation {:?}", imu.orientation);
            return false
        }

        let prev = self.snapshot();
        self.state_tx.send_replace( VehicleState {
            heading_deg: yaw_degrees( &imu.orientation),
            last_update: Utc::now(),
            ..prev
        });
        true
    }
}

/* #endregion vehicle state store */
