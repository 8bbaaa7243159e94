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

//! Bounded output queue of a satellite, served one packet at a time.

use std::collections::VecDeque;

use crate::{packet::Packet, wire::Wire};

/// What happened to a packet handed to [`Port::put`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PortPut {
    /// Enqueued; the port was idle and service must start.
    Wake,
    /// Enqueued behind the packet currently in service.
    Queued,
    /// Rejected: the queue limit would be exceeded.
    Dropped,
}

/// Output port of a satellite: a finite FIFO queue drained at `rate` bits
/// per second into a wire.
///
/// `queued_bytes` covers waiting packets only; the packet currently
/// occupying the transmitter is accounted as in flight. At all times
/// `packets_received = packets_transmitted + packets_dropped +
/// queued_packets (+ 1 while busy)`.
#[derive(Debug, Clone)]
pub struct Port {
    /// Serialization rate in bits per second.
    pub rate: f64,
    /// Queue limit in bytes (or in packets when `limit_bytes` is false).
    pub qlimit: u64,
    /// Interpret `qlimit` in bytes (`true`) or in packets.
    pub limit_bytes: bool,
    /// Bytes currently waiting in the queue.
    pub(crate) queued_bytes: u64,
    pub(crate) queue: VecDeque<Packet>,
    /// Whether a packet currently occupies the transmitter.
    pub(crate) busy: bool,
    /// Packets handed to the port, including dropped ones.
    pub packets_received: u64,
    /// Packets rejected on a full queue.
    pub packets_dropped: u64,
    /// Packets fully serialized onto the wire.
    pub packets_transmitted: u64,
    /// The wire behind the transmitter. Replaced on every snapshot rebuild.
    pub(crate) wire: Wire,
}

impl Port {
    pub(crate) fn new(rate: f64, qlimit: u64, limit_bytes: bool, wire: Wire) -> Self {
        Self {
            rate,
            qlimit,
            limit_bytes,
            queued_bytes: 0,
            queue: VecDeque::new(),
            busy: false,
            packets_received: 0,
            packets_dropped: 0,
            packets_transmitted: 0,
            wire,
        }
    }

    /// Bytes currently waiting in the queue.
    pub fn queued_bytes(&self) -> u64 {
        self.queued_bytes
    }

    /// Packets currently waiting in the queue.
    pub fn queued_packets(&self) -> usize {
        self.queue.len()
    }

    /// Diagnostic only: packets that have left the queue so far, assuming
    /// homogeneous packet sizes of `packet_size` bytes.
    pub fn packets_sent(&self, packet_size: u64) -> u64 {
        self.packets_received
            .saturating_sub(self.packets_dropped)
            .saturating_sub(self.queued_bytes / packet_size.max(1))
    }

    /// Accept or drop `packet`. The drop check runs against the configured
    /// limit regardless of whether the transmitter is idle.
    pub(crate) fn put(&mut self, packet: Packet) -> PortPut {
        self.packets_received += 1;
        let full = if self.limit_bytes {
            self.queued_bytes + packet.size > self.qlimit
        } else {
            self.queue.len() as u64 + 1 > self.qlimit
        };
        if full {
            self.packets_dropped += 1;
            return PortPut::Dropped;
        }
        self.queued_bytes += packet.size;
        self.queue.push_back(packet);
        if self.busy {
            PortPut::Queued
        } else {
            PortPut::Wake
        }
    }

    /// Begin serializing the head packet, returning it together with its
    /// transmission time `8 * size / rate`. `None` when the queue is empty.
    pub(crate) fn begin_transmit(&mut self) -> Option<(Packet, f64)> {
        let packet = self.queue.pop_front()?;
        self.queued_bytes -= packet.size;
        self.busy = true;
        let t_tx = (packet.size * 8) as f64 / self.rate;
        Some((packet, t_tx))
    }

    /// The transmission finished; the packet now belongs to the wire.
    pub(crate) fn finish_transmit(&mut self) {
        self.packets_transmitted += 1;
        self.busy = false;
    }
}
