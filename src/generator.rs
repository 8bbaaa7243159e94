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

//! Periodic packet producers, one per traffic flow.

use crate::types::{FlowId, NodeId};

/// Per-flow packet producer.
///
/// The run loop of the source model (suspend for the inter-arrival time,
/// emit, repeat until `finish`) is driven by one `NextPacket` event per
/// iteration. The inter-arrival time is deterministic:
/// `packet_size / traffic_matrix[src][dst]` seconds, so the emission rate is
/// proportional to the offered load.
///
/// The generator caches the routing information of the shared context and
/// triggers a refresh only once `routing_update_period` simulated seconds
/// have elapsed since its last trigger; the refresh itself is delayed by the
/// control-plane round trip to the coordinator.
#[derive(Debug, Clone)]
pub struct PacketGenerator {
    /// Destination ground station.
    pub dst: NodeId,
    /// Flow carried by this generator.
    pub flow: FlowId,
    /// Deterministic inter-arrival time in seconds.
    pub interarrival: f64,
    /// Size of every emitted packet in bytes.
    pub size: u64,
    /// Delay before the first inter-arrival timeout.
    pub initial_delay: f64,
    /// Simulated time after which the generator stops emitting.
    pub finish: f64,
    /// Packets emitted so far.
    pub packets_sent: u64,
    /// Last simulated time this generator triggered a routing refresh.
    pub(crate) last_routing_update: f64,
}

impl PacketGenerator {
    pub(crate) fn new(dst: NodeId, flow: FlowId, interarrival: f64, size: u64, now: f64) -> Self {
        Self {
            dst,
            flow,
            interarrival,
            size,
            initial_delay: 0.0,
            finish: f64::INFINITY,
            packets_sent: 0,
            last_routing_update: now,
        }
    }
}
