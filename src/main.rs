// SnSim: LEO Satellite Network Simulator written in Rust
// Copyright (C) 2023-2024 The SnSim developers
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Run the snapshot simulation from the command line and print the counter
//! series as JSON.

use std::process::ExitCode;

use chrono::{DateTime, Duration, Utc};
use clap::Parser;
use log::error;

use snsim::prelude::*;

/// Simulate a LEO constellation between two instants, one topology snapshot
/// at a time.
#[derive(Debug, Parser)]
struct Cli {
    /// Base URL of the topology-builder service.
    topology_url: String,
    /// Base URL of the traffic-matrix service.
    traffic_url: String,
    /// Start of the simulated window (RFC3339, UTC).
    start: DateTime<Utc>,
    /// End of the simulated window (RFC3339, UTC, inclusive).
    end: DateTime<Utc>,
    /// Snapshot duration in seconds.
    snapshot_secs: i64,
    /// Cities whose ground stations take part, comma separated.
    #[clap(long, short, value_delimiter = ',')]
    cities: Vec<String>,
    /// Forwarding strategy of the satellites.
    #[clap(long, short = 'f', value_enum, default_value = "port-forwarding")]
    strategy: ForwardingStrategy,
    /// Header-builder variant computing the source routes.
    #[clap(long, short, value_enum, default_value = "baseline")]
    builder: BuilderKind,
}

fn main() -> ExitCode {
    pretty_env_logger::init_timed();

    let args = Cli::parse();
    let cfg = RunConfig {
        start: args.start,
        end: args.end,
        snapshot: Duration::seconds(args.snapshot_secs),
        cities: args.cities,
        strategy: args.strategy,
        builder: args.builder,
        params: Parameters::default(),
    };
    let mut source = HttpSource::new(args.topology_url, args.traffic_url);

    match run_simulation(&mut source, &cfg) {
        Ok(report) => match serde_json::to_string_pretty(&report) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("cannot serialize the report: {e}");
                ExitCode::from(1)
            }
        },
        Err(e) => {
            error!("{e}");
            ExitCode::from(exit_code(&e))
        }
    }
}

/// Map the error taxonomy onto exit codes: 2 for HTTP failures, 3 for
/// malformed topology documents, 1 for everything else.
fn exit_code(err: &Error) -> u8 {
    match err {
        Error::Fetch(FetchError::Http(_)) => 2,
        Error::Fetch(FetchError::MalformedDocument(_)) => 3,
        _ => 1,
    }
}
