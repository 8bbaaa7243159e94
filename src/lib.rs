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

#![deny(missing_docs, missing_debug_implementations)]

//! # SnSim
//!
//! A discrete-event simulator of a LEO satellite network with ground
//! stations.
//!
//! Given a time-varying constellation topology and a traffic matrix between
//! cities, the simulator generates packets at ground stations, source-routes
//! them through inter-satellite and ground-satellite links, models per-port
//! transmission queues with finite capacity and link-switch delays, and
//! reports per-strategy counters and per-snapshot buffer occupancy.
//!
//! ## Main concepts
//!
//! The [`network::Network`] is the main data structure to operate on. It
//! owns the topology (a [Petgraph](https://docs.rs/petgraph) graph), all
//! ground stations and satellites, the shared routing context and the event
//! queue. The simulation is single-threaded and cooperative: the
//! [`event::EventQueue`] holds a min-heap of timed events, each handled by
//! the owning entity, producing follow-up events.
//!
//! The outer loop lives in [`sim::run_simulation`]: every snapshot refetches
//! the topology for the current wall-clock instant, rebuilds the network in
//! place while preserving in-flight state, advances the scheduler by the
//! snapshot duration, and harvests the counters.
//!
//! Source routes are computed by the [`routing::RoutingContext`] in one of
//! four variants ([`routing::BuilderKind`]), and satellites forward under
//! one of two strategies ([`satellite::ForwardingStrategy`]).
//!
//! ## Example
//!
//! ```no_run
//! use chrono::{Duration, TimeZone, Utc};
//! use snsim::prelude::*;
//!
//! fn main() -> Result<(), Error> {
//!     let mut source = HttpSource::new(
//!         "http://localhost:8000/topology_builder/min_dist_topo_builder/iridium",
//!         "http://localhost:8001/traffic_matrix",
//!     );
//!     let cfg = RunConfig {
//!         start: Utc.with_ymd_and_hms(2023, 9, 12, 10, 0, 0).unwrap(),
//!         end: Utc.with_ymd_and_hms(2023, 9, 12, 10, 10, 0).unwrap(),
//!         snapshot: Duration::seconds(1),
//!         cities: vec!["Berlin".to_string(), "Tokyo".to_string()],
//!         strategy: ForwardingStrategy::EarlyDiscarding,
//!         builder: BuilderKind::ExponentialSmoothing,
//!         params: Parameters::default(),
//!     };
//!     let report = run_simulation(&mut source, &cfg)?;
//!     println!("{}", serde_json::to_string_pretty(&report).unwrap());
//!     Ok(())
//! }
//! ```

pub mod event;
pub mod formatter;
pub mod generator;
pub mod network;
pub mod packet;
pub mod params;
pub mod port;
pub mod prelude;
pub mod routing;
pub mod satellite;
pub mod sim;
pub mod station;
pub mod store;
pub mod topology;
pub mod types;
pub mod wire;

#[cfg(test)]
mod test;
