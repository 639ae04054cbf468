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

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MavconLinkError>;

/// mavcon_link specific error type. Note that we need those to be Clone, hence we map
/// source errors into opaque variants that only store the error message
#[derive(Error,Debug,Clone)]
pub enum MavconLinkError {
    #[error("IO error {0}")]
    IOError(String),

    #[error("config error {0}")]
    ConfigError(String),

    #[error("connection error {0}")]
    ConnectionError(String),

    #[error("websock error {0}")]
    WsError(String),

    #[error("websock protocol error {0}")]
    WsProtocolError(String), // unexpected/wrong responses

    #[error("websocket closed by server")]
    WsClosedError,

    #[error("validation error {0}")]
    ValidationError(String), // malformed operator input, rejected before emission

    #[error("command rejected {0}")]
    CommandError(String), // the remote service explicitly denied a request

    #[error("JSON error {0}")]
    JsonError(String),

    #[error("timeout error {0}")]
    TimeoutError(String),

    // ...add specific errors here

    /// a generic error
    #[error("operation failed {0}")]
    OpFailed(String)
}

impl From<std::io::Error> for MavconLinkError {
    fn from (e: std::io::Error)->Self { MavconLinkError::IOError( e.to_string()) }
}

impl From<serde_json::Error> for MavconLinkError {
    fn from (e: serde_json::Error)->Self { MavconLinkError::JsonError( e.to_string()) }
}

impl From<tokio_tungstenite::tungstenite::Error> for MavconLinkError {
    fn from (e: tokio_tungstenite::tungstenite::Error)->Self { MavconLinkError::WsError( e.to_string()) }
}

impl From<url::ParseError> for MavconLinkError {
    fn from (e: url::ParseError)->Self { MavconLinkError::ConnectionError( e.to_string()) }
}

impl From<ron::error::SpannedError> for MavconLinkError {
    fn from (e: ron::error::SpannedError)->Self { MavconLinkError::ConfigError( e.to_string()) }
}

impl From<tokio::time::error::Elapsed> for MavconLinkError {
    fn from (e: tokio::time::error::Elapsed)->Self { MavconLinkError::TimeoutError( e.to_string()) }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for MavconLinkError {
    fn from (_e: tokio::sync::mpsc::error::SendError<T>)->Self { MavconLinkError::ConnectionError( "outbound queue closed".to_string()) }
}

pub fn op_failed (msg: impl ToString)->MavconLinkError {
    MavconLinkError::OpFailed(msg.to_string())
}

pub fn connector_error (msg: impl ToString)->MavconLinkError {
    MavconLinkError::ConnectionError(msg.to_string())
}

pub fn validation_error (msg: impl ToString)->MavconLinkError {
    MavconLinkError::ValidationError(msg.to_string())
}

pub fn command_error (msg: impl ToString)->MavconLinkError {
    MavconLinkError::CommandError(msg.to_string())
}
