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

//! The outer snapshot loop driving the discrete-event core.
//!
//! Every snapshot fetches the topology for the current wall-clock instant,
//! rebuilds the network in place (carrying all live state forward), advances
//! the scheduler by the snapshot duration, and harvests the counters into
//! per-snapshot series.

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use log::{debug, info, log_enabled, Level};
use serde::{Deserialize, Serialize};

use crate::{
    network::Network,
    params::Parameters,
    routing::BuilderKind,
    satellite::ForwardingStrategy,
    topology::SnapshotSource,
    types::{ConfigError, Error},
};

/// Run configuration of the snapshot simulator.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// First wall-clock instant to simulate.
    pub start: DateTime<Utc>,
    /// Last wall-clock instant (inclusive).
    pub end: DateTime<Utc>,
    /// Snapshot duration.
    pub snapshot: Duration,
    /// Cities whose ground stations take part.
    pub cities: Vec<String>,
    /// Forwarding strategy under test.
    pub strategy: ForwardingStrategy,
    /// Header-builder variant under test.
    pub builder: BuilderKind,
    /// Tunables.
    pub params: Parameters,
}

impl RunConfig {
    /// Check the configuration invariants: a forward time window, a positive
    /// snapshot duration and a non-empty cities list.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.end < self.start {
            return Err(ConfigError::InvalidTimeWindow {
                start: self.start,
                end: self.end,
            });
        }
        if self.snapshot <= Duration::zero() {
            return Err(ConfigError::InvalidSnapshotDuration(
                self.snapshot.num_seconds(),
            ));
        }
        if self.cities.is_empty() {
            return Err(ConfigError::EmptyCities);
        }
        Ok(())
    }
}

/// Per-snapshot counter series, keyed by seconds since simulation start.
/// All counters are cumulative.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    /// Average per-port buffer occupation in packets, averaged over the
    /// satellites.
    pub avg_buffer_occupation: BTreeMap<i64, f64>,
    /// Packets dropped in total (routing plus buffer).
    pub packets_dropped: BTreeMap<i64, u64>,
    /// Packets dropped for routing issues.
    pub routing_drops: BTreeMap<i64, u64>,
    /// Packets dropped on full output queues.
    pub buffer_drops: BTreeMap<i64, u64>,
    /// Packets emitted by the generators.
    pub packets_sent: BTreeMap<i64, u64>,
    /// Packets delivered to the sinks.
    pub packets_delivered: BTreeMap<i64, u64>,
}

/// Run the full snapshot simulation described by `cfg` against the given
/// source of topology and traffic documents.
pub fn run_simulation<S: SnapshotSource>(
    source: &mut S,
    cfg: &RunConfig,
) -> Result<SimulationReport, Error> {
    cfg.validate()?;
    let traffic = source.traffic_matrix(cfg.params.total_volume_of_traffic, &cfg.cities)?;

    let mut report = SimulationReport::default();
    let mut old: Option<Network> = None;
    let mut now = cfg.start;
    while now <= cfg.end {
        info!("running snapshot at {now}");
        let topo = source.topology_at(now, &cfg.cities)?;

        let started = Instant::now();
        let mut net = Network::build(
            &topo,
            &traffic,
            old.take(),
            cfg.strategy,
            cfg.builder,
            &cfg.params,
        )?;
        debug!("building took {:.3} s", started.elapsed().as_secs_f64());

        let offset = now - cfg.start;
        let horizon = (offset + cfg.snapshot).num_milliseconds() as f64 / 1000.0;
        let started = Instant::now();
        net.run_until(horizon)?;
        debug!("simulating took {:.3} s", started.elapsed().as_secs_f64());
        if log_enabled!(Level::Debug) {
            debug!("network status:\n{}", net.fmt_status());
        }

        let key = offset.num_seconds();
        let routing = net.total_routing_drops();
        let buffer = net.total_buffer_drops();
        report
            .avg_buffer_occupation
            .insert(key, net.average_buffer_occupation());
        report.routing_drops.insert(key, routing);
        report.buffer_drops.insert(key, buffer);
        report.packets_dropped.insert(key, routing + buffer);
        report.packets_sent.insert(key, net.total_packets_sent());
        report
            .packets_delivered
            .insert(key, net.total_packets_delivered());

        old = Some(net);
        now = now + cfg.snapshot;
    }
    Ok(report)
}
