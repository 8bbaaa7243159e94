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

//! Unbounded FIFO mailbox with a single waiter.

use std::collections::VecDeque;

use crate::packet::Packet;

/// Producer/consumer mailbox feeding a satellite's service loop.
///
/// `put` never blocks. The single consumer parks itself when the mailbox
/// runs empty; the next `put` reports that it must be woken, which the
/// dispatcher turns into a `Process` event at the current instant.
#[derive(Debug, Clone)]
pub struct Store {
    items: VecDeque<Packet>,
    waiting: bool,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// New empty mailbox. The consumer starts parked, so the very first
    /// `put` wakes it.
    pub fn new() -> Self {
        Self {
            items: VecDeque::new(),
            waiting: true,
        }
    }

    /// Append `packet`. Returns `true` iff the parked consumer must be
    /// scheduled (at most one wake-up per park).
    pub(crate) fn put(&mut self, packet: Packet) -> bool {
        self.items.push_back(packet);
        std::mem::take(&mut self.waiting)
    }

    /// Take the head packet, or park the consumer when the mailbox is empty.
    pub(crate) fn get_or_park(&mut self) -> Option<Packet> {
        let head = self.items.pop_front();
        if head.is_none() {
            self.waiting = true;
        }
        head
    }

    /// Park the consumer explicitly. Called by the service loop after the
    /// last item has been taken, so the next `put` wakes it again.
    pub(crate) fn park(&mut self) {
        self.waiting = true;
    }

    /// Number of packets waiting in the mailbox.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Return `true` if no packet is waiting.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
