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

use std::{fmt, future::Future, sync::Arc, time::Duration};
use bytes::Bytes;
use futures::{SinkExt,StreamExt,stream::{SplitSink,SplitStream}};
use serde::Serialize;
use tokio::{sync::{mpsc,watch}, task::JoinHandle, time::{interval,timeout}};
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::{debug,info,warn,error};

use crate::*;
use crate::ws::{WsStream,BridgeMsg,send_ws_text_msg};

/* #region connection state **************************************************************************/

/// lifecycle of the single bridge connection, owned exclusively by the connector. Closed is
/// terminal - recovery means a new link, not a transition out of Closed
#[derive(Serialize,Debug,Clone,Copy,PartialEq,Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt (&self, f: &mut fmt::Formatter<'_>)->fmt::Result {
        let s = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Closed => "closed",
        };
        write!( f, "{s}")
    }
}

/* #endregion connection state */

/* #region connector trait ***************************************************************************/

/// the abstraction over the actual bridge transport, used for dependency injection into
/// [`VehicleLink`]. The live implementation speaks rosbridge over a websocket; tests use
/// channel-backed stand-ins.
///
/// Contract: `connect` yields the sender of the outbound message queue; there is at most
/// one live connection per connector and `close` is terminal. On any teardown path the
/// implementation freezes the state store and fails pending calls so a late response or
/// buffered telemetry message is dropped instead of faulting
pub trait VehicleConnector {

    fn connect (&mut self, store: Arc<VehicleStateStore>, pending: Arc<PendingCalls>) -> impl Future<Output=Result<BridgeSender>> + Send;

    fn close (&mut self) -> impl Future<Output=()> + Send;

    fn connection_state (&self)->ConnectionState;

    fn watch_connection (&self)->watch::Receiver<ConnectionState>;
}

/* #endregion connector trait */

/* #region LiveVehicleConnector **********************************************************************/

/// websocket based [`VehicleConnector`] implementation for a live rosbridge endpoint.
///
/// The connector itself only owns the lifecycle; the internal [`LiveConnection`] does the
/// real work once `connect` succeeds. There is no automatic retry and no reconnect-on-drop:
/// a failed or dropped connection is surfaced and recovery is an explicit operator action
pub struct LiveVehicleConnector {
    config: Arc<VehicleLinkConfig>,
    state_tx: Arc<watch::Sender<ConnectionState>>, // shared with the rx task so transport errors transition too
    connection: Option<LiveConnection>,
}

impl LiveVehicleConnector {
    pub fn new (config: VehicleLinkConfig)->Self {
        LiveVehicleConnector {
            config: Arc::new(config),
            state_tx: Arc::new( watch::Sender::new( ConnectionState::Disconnected)),
            connection: None,
        }
    }
}

impl VehicleConnector for LiveVehicleConnector {

    async fn connect (&mut self, store: Arc<VehicleStateStore>, pending: Arc<PendingCalls>)->Result<BridgeSender> {
        match self.connection_state() {
            ConnectionState::Connecting | ConnectionState::Connected => {
                return Err( connector_error("bridge connection already open"))
            }
            ConnectionState::Closed => {
                return Err( connector_error("bridge connection already closed"))
            }
            ConnectionState::Disconnected => {}
        }

        self.state_tx.send_replace( ConnectionState::Connecting);
        match LiveConnection::open( self.config.clone(), store, pending, self.state_tx.clone()).await {
            Ok(conn) => {
                let cmd_tx = conn.cmd_tx.clone();
                self.connection = Some(conn);
                self.state_tx.send_replace( ConnectionState::Connected);
                info!("bridge connection open: {}", self.config.ws_uri);
                Ok(cmd_tx)
            }
            Err(e) => { // no partial setup survives - the stream is dropped with the failed open
                self.state_tx.send_replace( ConnectionState::Disconnected);
                Err(e)
            }
        }
    }

    async fn close (&mut self) {
        if let Some(conn) = self.connection.take() {
            conn.shutdown().await;
        }
        if self.connection_state() != ConnectionState::Closed {
            self.state_tx.send_replace( ConnectionState::Closed);
        }
    }

    fn connection_state (&self)->ConnectionState {
        *self.state_tx.borrow()
    }

    fn watch_connection (&self)->watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }
}

/* #endregion LiveVehicleConnector */

/* #region LiveConnection ****************************************************************************/

/// the internal workhorse of an open connection, holding
///   - the rx task (telemetry decode and service response correlation)
///   - the tx task (outbound queue drain, optional keepalive ping)
/// Both tasks are aborted deterministically on teardown
struct LiveConnection {
    store: Arc<VehicleStateStore>,
    pending: Arc<PendingCalls>,

    cmd_tx: BridgeSender, // channel to send outbound bridge messages

    ws_rx_task: JoinHandle<Result<()>>, // async task for websocket input
    ws_tx_task: JoinHandle<Result<()>>, // async task for websocket output
}

impl LiveConnection {
    async fn open (config: Arc<VehicleLinkConfig>, store: Arc<VehicleStateStore>, pending: Arc<PendingCalls>,
                   state_tx: Arc<watch::Sender<ConnectionState>>)->Result<Self>
    {
        let (mut ws_stream,_response) = timeout( config.connect_timeout, ws::connect( config.ws_uri.as_str())).await??;

        // register our telemetry subscriptions and published topics before the io tasks take over
        Self::setup_channels( &mut ws_stream).await?;

        let (ws_write, ws_read) = ws_stream.split();

        let (cmd_tx, cmd_rx) = mpsc::channel::<String>(16);
        let ws_rx_task = tokio::spawn( Self::ws_rx_loop( store.clone(), pending.clone(), state_tx, ws_read));
        let ws_tx_task = tokio::spawn( Self::ws_tx_loop( cmd_rx, ws_write, config.ping_interval));

        Ok( LiveConnection { store, pending, cmd_tx, ws_rx_task, ws_tx_task })
    }

    async fn setup_channels (ws: &mut WsStream)->Result<()> {
        let msgs = [
            BridgeMsg::subscribe( NAVSAT_TOPIC, NAVSAT_TYPE),
            BridgeMsg::subscribe( IMU_TOPIC, IMU_TYPE),
            BridgeMsg::advertise( SETPOINT_TOPIC, SETPOINT_TYPE),
            BridgeMsg::advertise( ACTUATOR_TOPIC, ACTUATOR_TYPE),
        ];
        for msg in msgs {
            ws.send( Message::text( msg.to_json()?)).await?;
        }
        Ok(())
    }

    /// the websocket receiver loop. Returns when the transport errors or the server closes,
    /// after dropping the link so no stale updates or hung calls remain
    async fn ws_rx_loop (store: Arc<VehicleStateStore>, pending: Arc<PendingCalls>,
                         state_tx: Arc<watch::Sender<ConnectionState>>,
                         mut ws_read: SplitStream<WsStream>)->Result<()>
    {
        loop {
            match ws_read.next().await {
                Some(Ok(Message::Text(json))) => {
                    match serde_json::from_str::<BridgeMsg>( json.as_str()) {
                        Ok(msg) => Self::process_incoming( &store, &pending, msg).await,
                        Err(e) => warn!("malformed bridge message: {}", json.as_str()),
                    }
                }
                Some(Ok(_)) => {} // ignore binary and control frames
                Some(Err(e)) => {
                    warn!("websocket error, dropping link: {e}");
                    Self::drop_link( &store, &pending, &state_tx).await;
                    return Err( e.into())
                }
                None => {
                    info!("websocket closed by server");
                    Self::drop_link( &store, &pending, &state_tx).await;
                    return Err( MavconLinkError::WsClosedError)
                }
            }
        }
    }

    async fn process_incoming (store: &VehicleStateStore, pending: &PendingCalls, msg: BridgeMsg) {
        match msg {
            BridgeMsg::Publish { topic, msg } => {
                store.apply_telemetry( &topic, &msg);
            }
            BridgeMsg::ServiceResponse { id, result, values, .. } => {
                match id {
                    Some(id) => { pending.resolve( &id, ServiceOutcome { result, values }).await; }
                    None => debug!("service response without call id")
                }
            }
            BridgeMsg::Status { level, msg, .. } => {
                warn!("bridge status [{level}]: {msg}")
            }
            other => debug!("ignoring unexpected bridge message {other:?}")
        }
    }

    async fn drop_link (store: &VehicleStateStore, pending: &PendingCalls, state_tx: &watch::Sender<ConnectionState>) {
        store.close();
        pending.fail_all().await;
        state_tx.send_replace( ConnectionState::Closed);
    }

    /// the websocket sender loop - drains the outbound queue and, if configured, keeps the
    /// connection alive with transport level pings. Terminates when all queue senders are gone
    async fn ws_tx_loop (mut cmd_rx: mpsc::Receiver<String>, mut ws_write: SplitSink<WsStream,Message>,
                         ping_interval: Option<Duration>)->Result<()>
    {
        match ping_interval {
            Some(dur) => {
                let mut ticker = interval(dur);
                ticker.tick().await; // the first tick completes immediately
                loop {
                    tokio::select! {
                        maybe_msg = cmd_rx.recv() => {
                            match maybe_msg {
                                Some(msg) => {
                                    if let Err(e) = send_ws_text_msg( &mut ws_write, msg).await {
                                        error!("failed to send bridge message: {e:?}")
                                    }
                                }
                                None => return Ok(())
                            }
                        }
                        _ = ticker.tick() => {
                            if let Err(e) = ws_write.send( Message::Ping( Bytes::new())).await {
                                error!("failed to send keepalive ping: {e:?}")
                            }
                        }
                    }
                }
            }
            None => {
                while let Some(msg) = cmd_rx.recv().await {
                    if let Err(e) = send_ws_text_msg( &mut ws_write, msg).await {
                        error!("failed to send bridge message: {e:?}")
                    }
                }
                Ok(())
            }
        }
    }

    /// orderly teardown: freeze the store, queue best-effort unsubscribes, stop the io
    /// tasks and fail whatever calls are still in flight
    async fn shutdown (self) {
        self.store.close(); // before the abort, so a decode racing it cannot update

        for msg in [ BridgeMsg::unsubscribe( NAVSAT_TOPIC), BridgeMsg::unsubscribe( IMU_TOPIC) ] {
            if let Ok(json) = msg.to_json() {
                let _ = self.cmd_tx.try_send( json);
            }
        }

        self.ws_tx_task.abort();
        self.ws_rx_task.abort();

        self.pending.fail_all().await;
    }
}

/* #endregion LiveConnection */
