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

//! Human-readable dumps of the network state.

use std::fmt::Write;

use itertools::Itertools;

use crate::network::Network;

impl Network {
    /// Render the per-station and per-satellite counter trees, the way the
    /// snapshot loop logs them at debug level.
    pub fn fmt_status(&self) -> String {
        let mut result = String::new();
        let f = &mut result;
        for (id, station) in self.stations().sorted_by_key(|(id, _)| *id) {
            writeln!(f, "{}", self.name(id)).unwrap();
            for (dst, generator) in station.generators.iter().sorted_by_key(|(dst, _)| **dst) {
                writeln!(
                    f,
                    "    | flow {} -> {}: sent {}",
                    generator.flow,
                    self.name(*dst),
                    generator.packets_sent
                )
                .unwrap();
            }
            for (flow, count) in station
                .sink
                .packets_received
                .iter()
                .sorted_by_key(|(flow, _)| **flow)
            {
                writeln!(f, "    | flow {flow}: received {count}").unwrap();
            }
        }
        for (id, sat) in self.satellites().sorted_by_key(|(id, _)| *id) {
            if sat.packets_received == 0 {
                continue;
            }
            writeln!(
                f,
                "{}: received {}, routing drops {}",
                self.name(id),
                sat.packets_received,
                sat.routing_issues_drops
            )
            .unwrap();
            for (idx, port) in sat.out_ports.iter().sorted_by_key(|(idx, _)| **idx) {
                if port.packets_received == 0 {
                    continue;
                }
                let neighbor = sat
                    .out_neighbor
                    .get(idx)
                    .map(|n| self.name(*n))
                    .unwrap_or("?");
                writeln!(
                    f,
                    "    | port {idx} -> {neighbor}: received {}, sent {}, dropped {}, queued {} B",
                    port.packets_received,
                    port.packets_sent(self.params.packet_size),
                    port.packets_dropped,
                    port.queued_bytes()
                )
                .unwrap();
            }
        }
        result
    }
}
