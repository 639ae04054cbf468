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

use futures::{SinkExt,StreamExt,stream::{SplitSink,SplitStream}};
use tokio_tungstenite::{
    connect_async, WebSocketStream, MaybeTlsStream,
    tungstenite::{self,
        protocol::Message,
        handshake::client::Response,
        client::IntoClientRequest
    }
};
use tokio::net::TcpStream;
use serde::{Deserialize,Serialize};
use serde_json::{self,Value};
use crate::*;


pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/* #region bridge messages ***************************************************************************/

// the client end of the rosbridge JSON protocol, dispatched on the "op" tag:
//
// out:  {"op":"subscribe","topic":"/mavros/imu/data","type":"sensor_msgs/Imu"}
// out:  {"op":"advertise","topic":"/mavros/setpoint_position/global","type":"geometry_msgs/PoseStamped"}
// out:  {"op":"publish","topic":"/mavros/setpoint_position/global","msg":{...}}
// out:  {"op":"call_service","service":"/mavros/cmd/arming","args":{"value":true},"id":"1"}
// in:   {"op":"publish","topic":"/mavros/global_position/raw/fix","msg":{"latitude":37.1,...}}
// in:   {"op":"service_response","service":"/mavros/cmd/arming","values":{"success":true},"result":true,"id":"1"}
// in:   {"op":"status","level":"error","msg":"..."}

#[derive(Serialize,Deserialize,Debug,Clone,PartialEq)]
#[serde(tag="op", rename_all="snake_case")]
pub enum BridgeMsg {
    Subscribe {
        topic: String,
        #[serde(rename="type", skip_serializing_if="Option::is_none")]
        msg_type: Option<String>
    },

    Unsubscribe {
        topic: String
    },

    Advertise {
        topic: String,
        #[serde(rename="type")]
        msg_type: String
    },

    Publish {
        topic: String,
        msg: Value
    },

    CallService {
        service: String,
        #[serde(skip_serializing_if="Option::is_none")]
        args: Option<Value>,
        #[serde(skip_serializing_if="Option::is_none")]
        id: Option<String>
    },

    ServiceResponse {
        service: String,
        #[serde(default)]
        values: Value,
        result: bool,
        #[serde(skip_serializing_if="Option::is_none")]
        id: Option<String>
    },

    Status {
        #[serde(default)]
        level: String,
        msg: String,
        #[serde(skip_serializing_if="Option::is_none")]
        id: Option<String>
    },
}

impl BridgeMsg {
    pub fn subscribe (topic: impl ToString, msg_type: impl ToString)->Self {
        BridgeMsg::Subscribe { topic: topic.to_string(), msg_type: Some(msg_type.to_string()) }
    }

    pub fn unsubscribe (topic: impl ToString)->Self {
        BridgeMsg::Unsubscribe { topic: topic.to_string() }
    }

    pub fn advertise (topic: impl ToString, msg_type: impl ToString)->Self {
        BridgeMsg::Advertise { topic: topic.to_string(), msg_type: msg_type.to_string() }
    }

    pub fn publish<T> (topic: impl ToString, payload: &T)->Result<Self> where T: Serialize {
        Ok( BridgeMsg::Publish { topic: topic.to_string(), msg: serde_json::to_value(payload)? })
    }

    pub fn call_service<T> (service: impl ToString, args: &T, id: impl ToString)->Result<Self> where T: Serialize {
        Ok( BridgeMsg::CallService {
            service: service.to_string(),
            args: Some( serde_json::to_value(args)?),
            id: Some( id.to_string())
        })
    }

    pub fn to_json (&self)->Result<String> {
        Ok( serde_json::to_string(self)?)
    }
}

/* #endregion bridge messages */

/* #region websocket helpers *************************************************************************/

pub async fn connect (ws_uri: &str)->Result<(WsStream, Response)> {
    let url = url::Url::parse( ws_uri)?; // reject malformed endpoints before we try to open a socket
    let request = url.as_str().into_client_request()?;

    Ok( connect_async( request).await?)
}

pub async fn send_ws_text_msg (tx: &mut SplitSink<WsStream,Message>, msg: String)->Result<()> {
    Ok( tx.send( Message::text(msg)).await?)
}

pub async fn read_next_ws_msg (ws: &mut WsStream)->Result<BridgeMsg> {
    let json = ws.next().await.ok_or( tungstenite::error::Error::AlreadyClosed)??;
    let msg: BridgeMsg = serde_json::from_str( json.to_text()?)?;
    Ok(msg)
}

/* #endregion websocket helpers */
