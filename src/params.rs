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

//! Tunable parameters of the simulation.
//!
//! All tunables live in one immutable [`Parameters`] record, constructed at
//! program start and passed by handle to everything that needs it.

use serde::{Deserialize, Serialize};

/// Speed of light in vacuum, in km/s. Propagation delays are computed from
/// link lengths against this constant.
pub const LIGHT_SPEED_KM_S: f64 = 299_792.458;

/// Tunable network parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    /// Size of every generated packet in bytes.
    pub packet_size: u64,
    /// Capacity of every satellite output queue in bytes.
    pub satellite_queue_size: u64,
    /// Serialization rate of every satellite port in bits per second.
    pub satellite_port_rate: f64,
    /// One-shot reconfiguration latency applied to the first packet after a
    /// port's downstream neighbor changed, in seconds.
    pub link_switch_delay: f64,
    /// Whether ports limit their queue by bytes (`true`) or by packet count.
    pub limit_bytes: bool,
    /// EWMA smoothing factor for buffer occupation.
    pub alpha: f64,
    /// Control-plane round trip between a generator and the routing
    /// coordinator, in seconds.
    pub leo_geo_gs_td: f64,
    /// Total offered volume of traffic over all flows in bytes per second.
    pub total_volume_of_traffic: f64,
    /// Simulated seconds between two routing-information refreshes.
    pub routing_update_period: f64,
    /// Maximum number of node-disjoint paths kept per station pair.
    pub k_disjoint_paths: usize,
    /// Seed of the path-sampling RNG. Fixing the seed makes runs
    /// reproducible bit by bit.
    pub rng_seed: u64,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            packet_size: 1_500,
            satellite_queue_size: 15_000_000,
            satellite_port_rate: 1_000_000_000.0,
            link_switch_delay: 0.1,
            limit_bytes: true,
            alpha: 0.125,
            leo_geo_gs_td: 0.35,
            total_volume_of_traffic: 500_000_000.0,
            routing_update_period: 1.0,
            k_disjoint_paths: 3,
            rng_seed: 0,
        }
    }
}
