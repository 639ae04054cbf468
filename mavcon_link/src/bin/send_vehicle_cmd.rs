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

/// test utility to send commands to a rosbridge connected autopilot, supporting command
/// line arg or interactive modes. This uses the same vlink.ron config as the other crate
/// executables
///
/// examples:
/// ```
/// send_vehicle_cmd -e "mode auto" -e arm ws://localhost:9090
/// send_vehicle_cmd ws://localhost:9090
/// > wp 45.0 -122.0 10.0
/// ```

use std::{io::Write, str::FromStr};
use anyhow::Result;
use futures::StreamExt;
use lazy_static::lazy_static;
use structopt::StructOpt;
use tokio::io;
use tokio_util::codec::{FramedRead, LinesCodec};
use tracing_subscriber::EnvFilter;

use mavcon_link::{
    load_config, ActuatorChannel, CommandResult, FlightMode,
    LiveVehicleConnector, VehicleLink, VehicleLinkConfig, Waypoint,
};

#[derive(StructOpt)]
#[structopt(about="vehicle command tool for a rosbridge connected autopilot")]
struct CliOpts {
    #[structopt(short,long,help="send command in non-interactive mode (can be repeated)")]
    execute: Vec<String>,

    #[structopt(short,long,help="pathname of the vlink config file")]
    config: Option<String>,

    #[structopt(help="rosbridge websocket URL (overrides the config)")]
    url: Option<String>,
}

lazy_static! {
    static ref ARGS: CliOpts = CliOpts::from_args();
}

/* #region command grammar ***************************************************************************/

/// the operator commands of the console, plus the combined presets of its start/pause/stop
/// buttons (arm + AUTO, HOLD, STABILIZE + disarm)
#[derive(Debug,Clone,PartialEq)]
enum ConsoleCmd {
    Arm,
    Disarm,
    Mode(String),
    Wp(Waypoint),
    Throttle(f64),
    Servo(f64),
    Resend(ActuatorChannel),
    Start,
    Pause,
    Stop,
    State,
    Exit,
}

impl FromStr for ConsoleCmd {
    type Err = String;

    fn from_str (s: &str)->std::result::Result<Self,String> {
        let tokens: Vec<&str> = s.split_whitespace().collect();
        match tokens.as_slice() {
            ["arm"] => Ok(ConsoleCmd::Arm),
            ["disarm"] => Ok(ConsoleCmd::Disarm),
            ["mode", mode] => {
                // normalize well known modes, pass everything else through verbatim
                let mode = match FlightMode::from_str(mode) {
                    Ok(m) => m.to_string(),
                    Err(_) => mode.to_string(),
                };
                Ok(ConsoleCmd::Mode(mode))
            }
            ["wp", lat, lon] => Ok(ConsoleCmd::Wp( Waypoint::new( parse_num(lat)?, parse_num(lon)?, 0.0))),
            ["wp", lat, lon, alt] => Ok(ConsoleCmd::Wp( Waypoint::new( parse_num(lat)?, parse_num(lon)?, parse_num(alt)?))),
            ["throttle", v] => Ok(ConsoleCmd::Throttle( parse_num(v)?)),
            ["servo", v] => Ok(ConsoleCmd::Servo( parse_num(v)?)),
            ["resend", "throttle"] => Ok(ConsoleCmd::Resend( ActuatorChannel::Throttle)),
            ["resend", "servo"] => Ok(ConsoleCmd::Resend( ActuatorChannel::Servo)),
            ["start"] => Ok(ConsoleCmd::Start),
            ["pause"] => Ok(ConsoleCmd::Pause),
            ["stop"] => Ok(ConsoleCmd::Stop),
            ["state"] => Ok(ConsoleCmd::State),
            ["exit"] | ["quit"] => Ok(ConsoleCmd::Exit),
            ["help"] | ["?"] => Err( usage().to_string()),
            other => Err( format!("unknown command {other:?} (try 'help')"))
        }
    }
}

fn parse_num (s: &str)->std::result::Result<f64,String> {
    s.parse().map_err(|_| format!("not a number: {s}"))
}

fn usage ()->&'static str {
    "commands:\n  \
     arm | disarm\n  \
     mode <AUTO|HOLD|STABILIZE|GUIDED|MANUAL|custom>\n  \
     wp <lat> <lon> [alt]\n  \
     throttle <0..1> | servo <0..1> | resend <throttle|servo>\n  \
     start | pause | stop\n  \
     state | exit"
}

/* #endregion command grammar */

#[tokio::main]
async fn main ()->Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter( EnvFilter::from_default_env())
        .init();

    let config = get_link_config()?;
    let mut link = VehicleLink::live( config);
    link.activate().await?;

    if ARGS.execute.is_empty() {
        println!("enter commands (try 'help', terminate with ctrl-C or 'exit')");
        run_interactive( &link).await;
    } else {
        exec_cmds( &link).await;
    }

    link.close().await;
    Ok(())
}

async fn exec_cmds (link: &VehicleLink<LiveVehicleConnector>) {
    for input in &ARGS.execute {
        match input.parse::<ConsoleCmd>() {
            Ok(cmd) => process_cmd( link, &cmd).await,
            Err(e) => eprintln!("ERROR invalid command input: {e}"),
        }
    }
}

async fn run_interactive (link: &VehicleLink<LiveVehicleConnector>) {
    let stdin = io::stdin();
    let mut reader = FramedRead::new( stdin, LinesCodec::new());

    show_prompt();
    while let Some(input) = reader.next().await {
        match input {
            Ok(line) => {
                let line = line.trim();
                if !line.is_empty() {
                    match line.parse::<ConsoleCmd>() {
                        Ok(ConsoleCmd::Exit) => break,
                        Ok(cmd) => process_cmd( link, &cmd).await,
                        Err(e) => eprintln!("{e}"),
                    }
                }
                show_prompt();
            }
            Err(e) => {
                eprintln!("error reading input: {e:?}")
            }
        }
    }
}

async fn process_cmd (link: &VehicleLink<LiveVehicleConnector>, cmd: &ConsoleCmd) {
    match cmd {
        ConsoleCmd::Arm => report( "arm", link.arm(true).await),
        ConsoleCmd::Disarm => report( "disarm", link.arm(false).await),
        ConsoleCmd::Mode(mode) => report( "mode", link.set_mode(mode).await),
        ConsoleCmd::Wp(wp) => report( "wp", link.publish_waypoint(wp).await),
        ConsoleCmd::Throttle(v) => report( "throttle", link.set_throttle(*v).await),
        ConsoleCmd::Servo(v) => report( "servo", link.set_servo(*v).await),
        ConsoleCmd::Resend(channel) => report( "resend", link.resend_actuator(*channel).await),

        ConsoleCmd::Start => { // the console's START button: arm, then fly the mission
            report( "arm", link.arm(true).await);
            report( "mode", link.set_mode("AUTO").await);
        }
        ConsoleCmd::Pause => report( "mode", link.set_mode("HOLD").await),
        ConsoleCmd::Stop => { // the console's STOP button: back to STABILIZE, then disarm
            report( "mode", link.set_mode("STABILIZE").await);
            report( "disarm", link.arm(false).await);
        }

        ConsoleCmd::State => println!("{}", link.state()),
        ConsoleCmd::Exit => {}
    }
}

fn report (op: &str, res: CommandResult) {
    match res {
        CommandResult::Success => println!("{op}: ok"),
        CommandResult::Failure(detail) => eprintln!("{op}: FAILED - {detail}"),
    }
}

fn show_prompt () {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(b"> ");
    stdout.flush();
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
