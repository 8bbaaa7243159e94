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

//! Boundary behavior of the bounded output queue.

use pretty_assertions::assert_eq;

use crate::{
    packet::Packet,
    port::{Port, PortPut},
    types::{Endpoint, FlowId, NodeId},
    wire::Wire,
};

fn packet(size: u64, id: u64) -> Packet {
    Packet {
        emit_time: 0.0,
        size,
        packet_id: id,
        src: NodeId(0),
        dst: NodeId(1),
        flow: FlowId {
            src: NodeId(0),
            dst: NodeId(1),
        },
        header: Vec::new(),
    }
}

fn port(qlimit: u64, limit_bytes: bool) -> Port {
    Port::new(
        8_000_000.0,
        qlimit,
        limit_bytes,
        Wire {
            delay: 0.0,
            out: Endpoint::Station(NodeId(1)),
        },
    )
}

#[test]
fn zero_queue_drops_every_packet() {
    let mut port = port(0, true);
    for i in 0..10 {
        assert_eq!(port.put(packet(1000, i)), PortPut::Dropped);
    }
    assert_eq!(port.packets_received, 10);
    assert_eq!(port.packets_dropped, 10);
    assert_eq!(port.queued_packets(), 0);
}

#[test]
fn byte_limit_bounds_the_queue() {
    let mut port = port(2500, true);

    assert_eq!(port.put(packet(1000, 1)), PortPut::Wake);
    let (head, t_tx) = port.begin_transmit().expect("head packet");
    assert_eq!(head.packet_id, 1);
    assert_eq!(t_tx, 1000.0 * 8.0 / 8_000_000.0);

    // two packets fit behind the one in service, the third does not
    assert_eq!(port.put(packet(1000, 2)), PortPut::Queued);
    assert_eq!(port.put(packet(1000, 3)), PortPut::Queued);
    assert_eq!(port.put(packet(1000, 4)), PortPut::Dropped);

    assert_eq!(port.packets_received, 4);
    assert_eq!(port.packets_dropped, 1);
    assert_eq!(port.queued_packets(), 2);
    assert_eq!(port.queued_bytes(), 2000);
}

#[test]
fn packet_limit_counts_packets() {
    let mut port = port(2, false);
    assert_eq!(port.put(packet(10, 1)), PortPut::Wake);
    assert_eq!(port.put(packet(10, 2)), PortPut::Queued);
    assert_eq!(port.put(packet(10, 3)), PortPut::Dropped);
    assert_eq!(port.queued_packets(), 2);
}

#[test]
fn counters_balance_at_all_times() {
    let mut port = port(2500, true);
    for i in 0..6 {
        port.put(packet(1000, i));
        if i == 0 {
            port.begin_transmit();
        }
    }
    // received = transmitted + dropped + queued + in service
    let in_service = u64::from(port.busy);
    assert_eq!(
        port.packets_received,
        port.packets_transmitted + port.packets_dropped + port.queued_packets() as u64 + in_service
    );

    port.finish_transmit();
    port.begin_transmit();
    let in_service = u64::from(port.busy);
    assert_eq!(
        port.packets_received,
        port.packets_transmitted + port.packets_dropped + port.queued_packets() as u64 + in_service
    );
}

#[test]
fn service_is_fifo() {
    let mut port = port(1_000_000, true);
    for i in 1..=3 {
        port.put(packet(500, i));
    }
    for i in 1..=3 {
        let (head, _) = port.begin_transmit().expect("head packet");
        assert_eq!(head.packet_id, i);
        port.finish_transmit();
    }
    assert!(port.begin_transmit().is_none());
}
