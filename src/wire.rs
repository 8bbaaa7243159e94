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

//! One-shot delay element modeling signal propagation along a link.

use crate::{params::LIGHT_SPEED_KM_S, types::Endpoint};

/// Propagation-delay element between a transmitter and a downstream node.
///
/// Putting a packet onto a wire schedules its arrival at `out` after `delay`
/// simulated seconds. The delay is constant per wire instance, so delivery
/// order is preserved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wire {
    /// Propagation delay in seconds.
    pub delay: f64,
    /// Where the far end of the wire terminates.
    pub out: Endpoint,
}

impl Wire {
    /// Wire spanning `length_km` toward `out`, delayed by the speed of
    /// light.
    pub fn from_length(length_km: f64, out: Endpoint) -> Self {
        Self {
            delay: length_km / LIGHT_SPEED_KM_S,
            out,
        }
    }
}
