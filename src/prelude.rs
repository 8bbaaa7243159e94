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

//! Convenience re-exports of the most commonly used types.

pub use crate::event::{Event, EventQueue};
pub use crate::network::Network;
pub use crate::packet::{Hop, Packet};
pub use crate::params::Parameters;
pub use crate::routing::BuilderKind;
pub use crate::satellite::ForwardingStrategy;
pub use crate::sim::{run_simulation, RunConfig, SimulationReport};
pub use crate::topology::{HttpSource, SnapshotSource, TopologyDoc, TrafficMatrix};
pub use crate::types::{
    ConfigError, Endpoint, Error, FetchError, FlowId, NetworkError, NodeId, NodeKind, SimError,
};
