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

/// test utility that connects to a rosbridge endpoint and prints decoded vehicle state
/// lines as telemetry arrives. This uses the same vlink.ron config as the other crate
/// executables

use anyhow::Result;
use lazy_static::lazy_static;
use structopt::StructOpt;
use tracing_subscriber::EnvFilter;

use mavcon_link::{load_config, ConnectionState, VehicleLink, VehicleLinkConfig};

#[derive(StructOpt)]
#[structopt(about="vehicle telemetry monitoring tool")]
struct CliOpts {
    #[structopt(short,long,help="pathname of the vlink config file")]
    config: Option<String>,

    #[structopt(help="rosbridge websocket URL (overrides the config)")]
    url: Option<String>,
}

lazy_static! {
    static ref ARGS: CliOpts = CliOpts::from_args();
}

#[tokio::main]
async fn main ()->Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter( EnvFilter::from_default_env())  // use RUST_LOG to set max level
        .init();

    let config = get_link_config()?;
    println!("monitoring vehicle telemetry from {} (ctrl-C to quit)", config.ws_uri);

    let mut link = VehicleLink::live( config);
    link.activate().await?;

    let mut state_rx = link.watch_state();
    let mut conn_rx = link.watch_connection();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,

            res = state_rx.changed() => {
                if res.is_err() { break }
                let state = *state_rx.borrow_and_update();
                println!("{state}");
            }

            res = conn_rx.changed() => {
                if res.is_err() { break }
                let conn_state = *conn_rx.borrow_and_update();
                println!("connection {conn_state}");
                if conn_state == ConnectionState::Closed { break }
            }
        }
    }

    link.close().await;
    Ok(())
}

fn get_link_config ()->Result<VehicleLinkConfig> {
    let mut config = match &ARGS.config {
        Some(path) => load_config( path)?,
        None => VehicleLinkConfig::default(),
    };
    if let Some(url) = &ARGS.url {
        config.ws_uri = url.clone();
    }
    if config.ws_uri == "?" {
        anyhow::bail!("no rosbridge URL (set ws_uri in the config or pass it as argument)")
    }
    Ok(config)
}
