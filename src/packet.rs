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

//! Packets and their source-routing header.

use serde::{Deserialize, Serialize};

use crate::types::{FlowId, NodeId};

/// One source-routing directive: leave the current satellite through `port`,
/// expecting to reach `next`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hop {
    /// Output port index on the current satellite.
    pub port: usize,
    /// Node expected behind that port.
    pub next: NodeId,
}

/// A packet traveling through the constellation.
///
/// The payload is the source-routing header alone: an ordered list of hops,
/// installed by the header builder at emission and consumed in LIFO order
/// (the hop at the tail is popped first). Every forwarding satellite shortens
/// the header by exactly one entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    /// Simulated time at which the generator emitted the packet.
    pub emit_time: f64,
    /// Size in bytes.
    pub size: u64,
    /// Sequence number within the emitting flow.
    pub packet_id: u64,
    /// Source ground station.
    pub src: NodeId,
    /// Destination ground station.
    pub dst: NodeId,
    /// Flow this packet belongs to.
    pub flow: FlowId,
    /// Remaining source-routing directives.
    pub header: Vec<Hop>,
}

impl Packet {
    /// Consume the next directive (the tail of the header). `None` means the
    /// header is exhausted and the packet should already have reached its
    /// sink.
    pub fn pop_hop(&mut self) -> Option<Hop> {
        self.header.pop()
    }
}
