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

//! Ground stations: terminal packet sinks and their per-destination
//! generators.

use std::collections::HashMap;

use crate::{
    generator::PacketGenerator,
    packet::Packet,
    types::{FlowId, NodeId},
    wire::Wire,
};

/// Terminal counter of delivered packets, keyed by flow.
#[derive(Debug, Clone, Default)]
pub struct PacketSink {
    /// Number of packets received per flow.
    pub packets_received: HashMap<FlowId, u64>,
    /// Arrival time of the most recent packet per flow.
    pub last_arrival: HashMap<FlowId, f64>,
}

impl PacketSink {
    /// New sink with empty counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the arrival of `packet` at simulated time `now`.
    pub(crate) fn put(&mut self, packet: &Packet, now: f64) {
        *self.packets_received.entry(packet.flow).or_default() += 1;
        self.last_arrival.insert(packet.flow, now);
    }

    /// Total packets delivered to this sink over all flows.
    pub fn total_received(&self) -> u64 {
        self.packets_received.values().sum()
    }
}

/// A fixed terrestrial endpoint.
///
/// A station owns one sink plus one generator per remote ground station.
/// Sinks and generators are created once and survive every snapshot; only
/// the uplink wire is re-wired when the serving satellite moves.
#[derive(Debug, Clone)]
pub struct GroundStation {
    /// Sink counting everything delivered to this station.
    pub sink: PacketSink,
    /// One generator per remote ground station, keyed by destination.
    pub generators: HashMap<NodeId, PacketGenerator>,
    /// Shared wire from this station up to its serving satellite.
    pub(crate) uplink: Option<Wire>,
}

impl GroundStation {
    pub(crate) fn new() -> Self {
        Self {
            sink: PacketSink::new(),
            generators: HashMap::new(),
            uplink: None,
        }
    }

    /// Total packets emitted by this station over all flows.
    pub fn total_sent(&self) -> u64 {
        self.generators.values().map(|g| g.packets_sent).sum()
    }
}
