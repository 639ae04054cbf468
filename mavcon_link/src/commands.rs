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

use std::{collections::HashMap, sync::Arc, time::Duration};
use serde::Serialize;
use serde_json::Value;
use tokio::{sync::{mpsc,oneshot,Mutex},time::timeout};
use tracing::{debug,warn};
use crate::*;
use crate::ws::BridgeMsg;

/// sender half of the outbound bridge queue. All command components emit through this -
/// none of them owns the websocket
pub type BridgeSender = mpsc::Sender<String>;

/* #region service call correlation ******************************************************************/

/// what came back for a call_service request: the envelope result flag plus the raw
/// response values (shape depends on the service)
#[derive(Debug,Clone)]
pub struct ServiceOutcome {
    pub result: bool,
    pub values: Value,
}

/// in-flight service calls, keyed by the generated message id. The connection rx task
/// resolves entries as service_response messages arrive; a response for an id that is no
/// longer (or never was) registered is ignored, not a fault
pub struct PendingCalls {
    map: Mutex<HashMap<String, oneshot::Sender<ServiceOutcome>>>,
}

impl PendingCalls {
    pub fn new ()->Self {
        PendingCalls { map: Mutex::new( HashMap::new()) }
    }

    pub async fn register (&self, id: &str)->oneshot::Receiver<ServiceOutcome> {
        let (tx,rx) = oneshot::channel();
        self.map.lock().await.insert( id.to_string(), tx);
        rx
    }

    /// hand a response to whoever is waiting for it. Returns false if nobody is - late
    /// responses after a timeout or teardown are dropped silently
    pub async fn resolve (&self, id: &str, outcome: ServiceOutcome)->bool {
        match self.map.lock().await.remove(id) {
            Some(tx) => tx.send( outcome).is_ok(),
            None => {
                debug!("ignoring service response for unknown call id {id}");
                false
            }
        }
    }

    pub async fn remove (&self, id: &str) {
        self.map.lock().await.remove(id);
    }

    /// drop all waiters. Their calls resolve to Failure since the response channel is gone
    pub async fn fail_all (&self) {
        self.map.lock().await.clear();
    }
}

/* #endregion service call correlation */

/* #region command dispatcher ************************************************************************/

/// request/response command operations (arming, flight mode). Each op issues a single
/// correlated call_service and reports the per-call outcome - it never throws, never
/// retries, and gives no ordering guarantee between concurrent calls
pub struct CommandDispatcher {
    cmd_tx: BridgeSender,
    pending: Arc<PendingCalls>,
    call_timeout: Duration,
}

impl CommandDispatcher {
    pub fn new (cmd_tx: BridgeSender, pending: Arc<PendingCalls>, call_timeout: Duration)->Self {
        CommandDispatcher { cmd_tx, pending, call_timeout }
    }

    pub async fn arm (&self, value: bool)->CommandResult {
        match self.call( ARMING_SERVICE, &CommandBoolRequest { value }).await {
            Ok(outcome) => {
                if !outcome.result {
                    return CommandResult::failure( format!("arming call rejected: {}", outcome.values))
                }
                match serde_json::from_value::<CommandBoolResponse>( outcome.values.clone()) {
                    Ok(resp) if resp.success => CommandResult::Success,
                    Ok(resp) => CommandResult::failure( format!("arming denied by autopilot (result {})", resp.result)),
                    Err(e) => CommandResult::failure( format!("malformed arming response: {e}")),
                }
            }
            Err(e) => CommandResult::Failure( e.to_string()),
        }
    }

    pub async fn set_mode (&self, mode: &str)->CommandResult {
        let req = SetModeRequest { base_mode: 0, custom_mode: mode.to_string() };
        match self.call( SET_MODE_SERVICE, &req).await {
            Ok(outcome) => {
                if !outcome.result {
                    return CommandResult::failure( format!("set_mode call rejected: {}", outcome.values))
                }
                match serde_json::from_value::<SetModeResponse>( outcome.values.clone()) {
                    Ok(resp) if resp.mode_sent => CommandResult::Success,
                    Ok(_) => CommandResult::failure( format!("mode change to {mode} not accepted by autopilot")),
                    Err(e) => CommandResult::failure( format!("malformed set_mode response: {e}")),
                }
            }
            Err(e) => CommandResult::Failure( e.to_string()),
        }
    }

    async fn call<T> (&self, service: &str, args: &T)->Result<ServiceOutcome> where T: Serialize {
        let id = get_next_msg_id();
        let response = self.pending.register( &id).await;

        let json = BridgeMsg::call_service( service, args, &id)?.to_json()?;
        if let Err(e) = self.cmd_tx.send( json).await {
            self.pending.remove( &id).await;
            return Err( e.into())
        }

        match timeout( self.call_timeout, response).await {
            Ok(Ok(outcome)) => Ok(outcome),
            Ok(Err(_)) => Err( connector_error( format!("link closed while waiting for {service} response"))),
            Err(_) => {
                self.pending.remove( &id).await;
                Err( MavconLinkError::TimeoutError( format!("no response from {service} within {:?}", self.call_timeout)))
            }
        }
    }
}

/* #endregion command dispatcher */

/* #region waypoint publisher ************************************************************************/

/// fire-and-forget emission of one-shot navigation targets. Input is validated before
/// anything goes out - there is no acknowledgement on this channel
pub struct WaypointPublisher {
    cmd_tx: BridgeSender,
}

impl WaypointPublisher {
    pub fn new (cmd_tx: BridgeSender)->Self {
        WaypointPublisher { cmd_tx }
    }

    pub async fn publish_waypoint (&self, wp: &Waypoint)->CommandResult {
        if let Err(e) = wp.validate() {
            return CommandResult::Failure( e.to_string())
        }
        self.emit( wp).await.into()
    }

    async fn emit (&self, wp: &Waypoint)->Result<()> {
        let json = BridgeMsg::publish( SETPOINT_TOPIC, &PoseStamped::from_waypoint(wp))?.to_json()?;
        Ok( self.cmd_tx.send( json).await?)
    }
}

/* #endregion waypoint publisher */

/* #region actuator controller ***********************************************************************/

// channel layout of the emitted control group: quad-style throttle block plus one servo
const THROTTLE_CHANNELS: std::ops::Range<usize> = 0..4;
const SERVO_CHANNEL: usize = 4;

/// continuous low-level control values (throttle, servo). Values are clamped to [0,1],
/// cached for re-send, and every call emits a full 8-channel frame where only the channels
/// of the set value are non-zero. Rapid repeated calls each emit - if backpressure control
/// is wanted it belongs to the caller
pub struct ActuatorController {
    cmd_tx: BridgeSender,
    cache: Mutex<ActuatorCache>,
}

#[derive(Debug,Clone,Copy,Default)]
struct ActuatorCache {
    throttle: f64,
    servo: f64,
}

impl ActuatorController {
    pub fn new (cmd_tx: BridgeSender)->Self {
        ActuatorController { cmd_tx, cache: Mutex::new( ActuatorCache::default()) }
    }

    pub async fn set_throttle (&self, value: f64)->CommandResult {
        self.set_channel( ActuatorChannel::Throttle, value).await
    }

    pub async fn set_servo (&self, value: f64)->CommandResult {
        self.set_channel( ActuatorChannel::Servo, value).await
    }

    /// last clamped value sent for the given channel
    pub async fn cached_value (&self, channel: ActuatorChannel)->f64 {
        let cache = self.cache.lock().await;
        match channel {
            ActuatorChannel::Throttle => cache.throttle,
            ActuatorChannel::Servo => cache.servo,
        }
    }

    /// re-emit the cached value of the given channel
    pub async fn resend (&self, channel: ActuatorChannel)->CommandResult {
        let value = self.cached_value( channel).await;
        self.set_channel( channel, value).await
    }

    async fn set_channel (&self, channel: ActuatorChannel, value: f64)->CommandResult {
        if !value.is_finite() {
            return CommandResult::failure( format!("non-finite {channel:?} value"))
        }
        let value = value.clamp( 0.0, 1.0);

        {
            let mut cache = self.cache.lock().await;
            match channel {
                ActuatorChannel::Throttle => cache.throttle = value,
                ActuatorChannel::Servo => cache.servo = value,
            }
        }

        self.emit( control_frame( channel, value)).await.into()
    }

    async fn emit (&self, frame: ActuatorControl)->Result<()> {
        let json = BridgeMsg::publish( ACTUATOR_TOPIC, &frame)?.to_json()?;
        Ok( self.cmd_tx.send( json).await?)
    }
}

/// full 8-channel frame with only the channels of the given value non-zero
pub fn control_frame (channel: ActuatorChannel, value: f64)->ActuatorControl {
    let mut controls = [0.0; ACTUATOR_CONTROLS];
    match channel {
        ActuatorChannel::Throttle => {
            for c in &mut controls[THROTTLE_CHANNELS] { *c = value }
        }
        ActuatorChannel::Servo => {
            controls[SERVO_CHANNEL] = value
        }
    }
    ActuatorControl { controls, group_mix: 0 }
}

/* #endregion actuator controller */
