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

//! The LEO satellite forwarding engine.

use std::collections::HashMap;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::{packet::Hop, port::Port, store::Store, types::NodeId};

/// Strategy deciding whether a satellite honors a header directive.
///
/// `PortForwarding` is index-stable across minor topology changes but
/// misroutes when the neighbor behind a port has been replaced;
/// `EarlyDiscarding` detects the replacement at the satellite and drops,
/// avoiding downstream waste.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
pub enum ForwardingStrategy {
    /// Forward whenever the requested port index still exists.
    PortForwarding,
    /// Forward only when the expected next hop is still a neighbor.
    EarlyDiscarding,
}

/// An orbiting packet switch.
///
/// The satellite owns a single store fed by every upstream wire. Its service
/// loop pops one packet at a time, consumes the tail of the source-routing
/// header and, if the active strategy accepts the directive, hands the
/// packet to the requested output port after any pending one-shot link
/// setup.
#[derive(Debug, Clone)]
pub struct LeoSatellite {
    /// Mailbox fed by every upstream wire.
    pub(crate) store: Store,
    /// Output ports by index.
    pub out_ports: HashMap<usize, Port>,
    /// Downstream node behind each port.
    pub out_neighbor: HashMap<usize, NodeId>,
    /// Remaining one-shot link reconfiguration latency per port, in seconds.
    /// Zero means no setup is pending.
    pub link_switch_delay: HashMap<usize, f64>,
    /// Packets popped from the store so far.
    pub packets_received: u64,
    /// Packets dropped because their header was empty or could not be
    /// honored.
    pub routing_issues_drops: u64,
}

impl LeoSatellite {
    pub(crate) fn new() -> Self {
        Self {
            store: Store::new(),
            out_ports: HashMap::new(),
            out_neighbor: HashMap::new(),
            link_switch_delay: HashMap::new(),
            packets_received: 0,
            routing_issues_drops: 0,
        }
    }

    /// Sum of packets dropped on full output queues.
    pub fn port_drop(&self) -> u64 {
        self.out_ports.values().map(|p| p.packets_dropped).sum()
    }

    /// Diagnostic only: packets that left this satellite so far, assuming
    /// homogeneous packet sizes of `packet_size` bytes.
    pub fn packets_sent(&self, packet_size: u64) -> u64 {
        self.out_ports
            .values()
            .map(|p| p.packets_sent(packet_size))
            .sum()
    }

    /// Average buffer occupation over the output ports, in packets of
    /// `packet_size` bytes.
    pub fn buffer_occupation(&self, packet_size: u64) -> f64 {
        if self.out_ports.is_empty() {
            return 0.0;
        }
        let queued: u64 = self
            .out_ports
            .values()
            .map(|p| p.queued_bytes / packet_size.max(1))
            .sum();
        queued as f64 / self.out_ports.len() as f64
    }

    /// Consume the pending link setup of `port`. The setup time is returned
    /// exactly once; subsequent calls yield zero until the port is re-wired
    /// to a different neighbor.
    pub(crate) fn take_link_setup(&mut self, port: usize) -> f64 {
        match self.link_switch_delay.get_mut(&port) {
            Some(delay) if *delay > 0.0 => std::mem::replace(delay, 0.0),
            _ => 0.0,
        }
    }

    /// Whether `strategy` allows forwarding along `hop`.
    pub(crate) fn accepts(&self, strategy: ForwardingStrategy, hop: &Hop) -> bool {
        match strategy {
            ForwardingStrategy::PortForwarding => self.out_ports.contains_key(&hop.port),
            ForwardingStrategy::EarlyDiscarding => {
                self.out_neighbor.values().any(|n| *n == hop.next)
            }
        }
    }
}
