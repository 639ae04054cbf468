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

//! mavcon_link - the vehicle link of a browser served mavros operator console.
//!
//! This crate owns the client end of a rosbridge connection to a remote autopilot stack:
//! connection lifecycle, decoding of raw position/attitude telemetry into a [`VehicleState`]
//! snapshot, and dispatch of arm/mode/waypoint/actuator commands with explicit outcome
//! handling. Map rendering and operator forms are external consumers of this crate - they
//! only read the published state and invoke the command operations.

use std::{
    fmt::{self,Debug}, fs, path::Path,
    sync::{atomic::{self,AtomicU64}},
    time::Duration
};
use serde::{Deserialize,Serialize};
use chrono::{DateTime,Utc};
use strum::{Display,EnumString};
use lazy_static::lazy_static;

mod errors;
pub use errors::*;

pub mod ws;

mod telemetry;
pub use telemetry::*;

mod commands;
pub use commands::*;

mod live_connector;
pub use live_connector::*;

mod link;
pub use link::*;

lazy_static! {
    static ref MSG_COUNTER: AtomicU64 = AtomicU64::new(1);
}

/// process-wide id source for correlating service calls with their responses
pub fn get_next_msg_id ()->String {
    MSG_COUNTER.fetch_add( 1, atomic::Ordering::Relaxed).to_string()
}

/* #region mavros channels ***************************************************************************/

// the topics/services of the remote mavros stack this console talks to. Names and payload
// shapes have to match the deployed stack exactly

pub const NAVSAT_TOPIC: &str = "/mavros/global_position/raw/fix";
pub const NAVSAT_TYPE: &str  = "sensor_msgs/NavSatFix";

pub const IMU_TOPIC: &str = "/mavros/imu/data";
pub const IMU_TYPE: &str  = "sensor_msgs/Imu";

pub const ARMING_SERVICE: &str = "/mavros/cmd/arming";
pub const ARMING_TYPE: &str    = "mavros_msgs/srv/CommandBool";

pub const SET_MODE_SERVICE: &str = "/mavros/set_mode";
pub const SET_MODE_TYPE: &str    = "mavros_msgs/srv/SetMode";

pub const SETPOINT_TOPIC: &str = "/mavros/setpoint_position/global";
pub const SETPOINT_TYPE: &str  = "geometry_msgs/PoseStamped";

pub const ACTUATOR_TOPIC: &str = "/mavros/actuator_control";
pub const ACTUATOR_TYPE: &str  = "mavros_msgs/ActuatorControl";

/* #endregion mavros channels */

/* #region wire payloads *****************************************************************************/

/// the fields of a sensor_msgs/NavSatFix we read. The full message carries header, fix status
/// and covariance - serde skips what we don't use
#[derive(Serialize,Deserialize,Debug,Clone,Copy,PartialEq)]
pub struct NavSatFix {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

impl NavSatFix {
    pub fn is_finite (&self)->bool {
        self.latitude.is_finite() && self.longitude.is_finite() && self.altitude.is_finite()
    }
}

#[derive(Serialize,Deserialize,Debug,Clone,Copy,PartialEq)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Quaternion {
    pub fn identity ()->Self {
        Quaternion { x: 0.0, y: 0.0, z: 0.0, w: 1.0 }
    }

    pub fn is_finite (&self)->bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite() && self.w.is_finite()
    }
}

/// the fields of a sensor_msgs/Imu we read (angular velocity and linear acceleration are
/// not consumed by the console)
#[derive(Serialize,Deserialize,Debug,Clone,Copy,PartialEq)]
pub struct ImuData {
    pub orientation: Quaternion,
}

#[derive(Serialize,Deserialize,Debug,Clone,PartialEq)]
pub struct MsgHeader {
    pub frame_id: String,
}

#[derive(Serialize,Deserialize,Debug,Clone,Copy,PartialEq)]
pub struct GlobalPosition {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

#[derive(Serialize,Deserialize,Debug,Clone,PartialEq)]
pub struct Pose {
    pub position: GlobalPosition,
    pub orientation: Quaternion,
}

/// geometry_msgs/PoseStamped as published on the global setpoint topic. The orientation is
/// fixed to identity - the channel only conveys a target position
#[derive(Serialize,Deserialize,Debug,Clone,PartialEq)]
pub struct PoseStamped {
    pub header: MsgHeader,
    pub pose: Pose,
}

impl PoseStamped {
    pub fn from_waypoint (wp: &Waypoint)->Self {
        PoseStamped {
            header: MsgHeader { frame_id: "map".to_string() },
            pose: Pose {
                position: GlobalPosition { latitude: wp.latitude, longitude: wp.longitude, altitude: wp.altitude },
                orientation: Quaternion::identity(),
            }
        }
    }
}

pub const ACTUATOR_CONTROLS: usize = 8;

/// mavros_msgs/ActuatorControl frame - always a full 8 channel group, unused channels are
/// explicitly zero
#[derive(Serialize,Deserialize,Debug,Clone,PartialEq)]
pub struct ActuatorControl {
    pub controls: [f64; ACTUATOR_CONTROLS],
    pub group_mix: u32,
}

//--- service payloads

#[derive(Serialize,Deserialize,Debug,Clone,Copy,PartialEq)]
pub struct CommandBoolRequest {
    pub value: bool,
}

#[derive(Serialize,Deserialize,Debug,Clone,Copy,PartialEq)]
pub struct CommandBoolResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub result: u8,
}

#[derive(Serialize,Deserialize,Debug,Clone,PartialEq)]
pub struct SetModeRequest {
    pub base_mode: u8,
    pub custom_mode: String,
}

#[derive(Serialize,Deserialize,Debug,Clone,Copy,PartialEq)]
pub struct SetModeResponse {
    #[serde(default)]
    pub mode_sent: bool,
}

/* #endregion wire payloads */

/* #region vehicle state *****************************************************************************/

/// the last decoded vehicle telemetry, as consumed by the presentation layer. This is an
/// immutable snapshot that is replaced wholesale on each decoded message - position and
/// heading come from independent streams and each replaces only its own fields
#[derive(Serialize,Debug,Clone,Copy,PartialEq)]
pub struct VehicleState {
    pub latitude: f64,    // [deg]
    pub longitude: f64,   // [deg]
    pub altitude: f64,    // [m] above ellipsoid, as reported by the fix

    pub heading_deg: f64, // [0,360) derived from the attitude quaternion, never set directly

    pub last_update: DateTime<Utc>,
}

impl Default for VehicleState {
    fn default()->Self {
        VehicleState {
            latitude: 0.0, longitude: 0.0, altitude: 0.0,
            heading_deg: 0.0,
            last_update: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

impl fmt::Display for VehicleState {
    fn fmt (&self, f: &mut fmt::Formatter<'_>)->fmt::Result {
        write!( f, "lat: {:.6} lon: {:.6} alt: {:.1}m hdg: {:.1}°",
                self.latitude, self.longitude, self.altitude, self.heading_deg)
    }
}

/* #endregion vehicle state */

/* #region operator input ****************************************************************************/

/// a one-shot navigation target entered by the operator. Validated before dispatch and
/// discarded afterwards - there is no waypoint store in the console
#[derive(Serialize,Deserialize,Debug,Clone,Copy,PartialEq)]
pub struct Waypoint {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

impl Waypoint {
    pub fn new (latitude: f64, longitude: f64, altitude: f64)->Self {
        Waypoint { latitude, longitude, altitude }
    }

    /// range/finite screening of operator input. Out-of-range values are rejected,
    /// never silently clamped
    pub fn validate (&self)->Result<()> {
        if !(self.latitude.is_finite() && self.longitude.is_finite() && self.altitude.is_finite()) {
            return Err( validation_error( format!("non-finite waypoint coordinates ({},{},{})",
                                                  self.latitude, self.longitude, self.altitude)));
        }
        if self.latitude < -90.0 || self.latitude > 90.0 {
            return Err( validation_error( format!("waypoint latitude out of range: {}", self.latitude)));
        }
        if self.longitude < -180.0 || self.longitude > 180.0 {
            return Err( validation_error( format!("waypoint longitude out of range: {}", self.longitude)));
        }
        Ok(())
    }
}

/// the low-level control channels the console can drive
#[derive(Serialize,Deserialize,Debug,Clone,Copy,PartialEq,Eq,Hash)]
pub enum ActuatorChannel {
    Throttle,
    Servo,
}

/// well known custom_mode strings of the autopilot. Anything else can still be passed
/// through set_mode as a plain string
#[derive(Debug,Clone,Copy,PartialEq,Eq,Display,EnumString)]
#[strum(serialize_all="UPPERCASE", ascii_case_insensitive)]
pub enum FlightMode {
    Auto,
    Hold,
    Stabilize,
    Guided,
    Manual,
}

/* #endregion operator input */

/* #region command results ***************************************************************************/

/// per-call outcome of a command operation. Commands never raise faults towards the
/// presentation layer - transport errors, timeouts and remote rejections all end up here
#[derive(Serialize,Debug,Clone,PartialEq)]
pub enum CommandResult {
    Success,
    Failure(String),
}

impl CommandResult {
    pub fn failure (detail: impl ToString)->Self {
        CommandResult::Failure(detail.to_string())
    }

    pub fn is_success (&self)->bool {
        matches!( self, CommandResult::Success)
    }

    pub fn detail (&self)->&str {
        match self {
            CommandResult::Success => "",
            CommandResult::Failure(detail) => detail.as_str(),
        }
    }
}

impl From<Result<()>> for CommandResult {
    fn from (res: Result<()>)->Self {
        match res {
            Ok(()) => CommandResult::Success,
            Err(e) => CommandResult::Failure( e.to_string()),
        }
    }
}

/* #endregion command results */

/* #region config ************************************************************************************/

#[derive(Deserialize,Serialize,Debug,Clone)]
#[serde(default)]
pub struct VehicleLinkConfig {
    pub ws_uri: String, // rosbridge websocket endpoint, set at startup and not renegotiated

    pub connect_timeout: Duration,
    pub call_timeout: Duration, // per service call deadline until we report Failure
    pub ping_interval: Option<Duration>, // optional websocket keepalive (off by default)
}

impl Default for VehicleLinkConfig {
    fn default()->Self {
        VehicleLinkConfig {
            //--- the one that needs to be set
            ws_uri: "?".to_string(),

            //--- the fields for which we have defaults
            connect_timeout: Duration::from_secs(10),
            call_timeout: Duration::from_secs(5),
            ping_interval: None,
        }
    }
}

impl VehicleLinkConfig {
    pub fn new (ws_uri: impl ToString)->Self {
        VehicleLinkConfig { ws_uri: ws_uri.to_string(), ..Default::default() }
    }
}

/// load a VehicleLinkConfig from a RON file
pub fn load_config (path: impl AsRef<Path>)->Result<VehicleLinkConfig> {
    let contents = fs::read_to_string( path.as_ref())?;
    let config: VehicleLinkConfig = ron::from_str( contents.as_str())?;
    Ok(config)
}

/* #endregion config */
