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

//! Building and refreshing networks from topology documents.

use petgraph::visit::IntoEdgeReferences;
use pretty_assertions::assert_eq;

use super::{build_net, doc, line_doc, port_toward, uniform_traffic};
use crate::{
    network::Network,
    params::Parameters,
    routing::BuilderKind,
    satellite::ForwardingStrategy,
    types::{NetworkError, NodeKind},
};

fn params() -> Parameters {
    Parameters::default()
}

fn simple_net() -> Network {
    build_net(
        &line_doc(),
        &uniform_traffic(&["GS_A", "GS_B"], 1_000_000.0),
        None,
        ForwardingStrategy::PortForwarding,
        BuilderKind::Baseline,
        &params(),
    )
}

#[test]
fn build_wires_ports_to_neighbors() {
    let net = simple_net();
    let s1 = net.node_id("S1").unwrap();
    let sat = net.satellite(s1).unwrap();

    // one port per adjacent node, each wired to the matching neighbor
    assert_eq!(sat.out_ports.len(), 2);
    assert_eq!(sat.out_neighbor.len(), 2);
    for (idx, port) in &sat.out_ports {
        assert_eq!(port.wire.out.node(), sat.out_neighbor[idx]);
        assert_eq!(sat.link_switch_delay[idx], 0.0);
    }

    // satellite-origin edges carry a port, station-origin edges do not
    use petgraph::visit::EdgeRef;
    for edge in net.get_topology().edge_references() {
        let src_kind = net.get_topology()[edge.source()].kind;
        let has_port = edge.weight().out_port.is_some();
        assert_eq!(has_port, src_kind == NodeKind::LeoSatellite);
    }
}

#[test]
fn every_station_gets_sink_generators_and_uplink() {
    let net = simple_net();
    let gsa = net.node_id("GS_A").unwrap();
    let gsb = net.node_id("GS_B").unwrap();
    let s1 = net.node_id("S1").unwrap();

    let station = net.station(gsa).unwrap();
    assert_eq!(station.generators.len(), 1);
    let generator = &station.generators[&gsb];
    // inter-arrival is packet size over offered volume
    assert_eq!(generator.interarrival, 1500.0 / 1_000_000.0);
    assert_eq!(station.uplink.unwrap().out.node(), s1);
}

#[test]
fn unchanged_rebuild_clears_every_link_switch_delay() {
    let net = simple_net();
    let rebuilt = build_net(
        &line_doc(),
        &uniform_traffic(&["GS_A", "GS_B"], 1_000_000.0),
        Some(net),
        ForwardingStrategy::PortForwarding,
        BuilderKind::Baseline,
        &params(),
    );
    for (_, sat) in rebuilt.satellites() {
        for delay in sat.link_switch_delay.values() {
            assert_eq!(*delay, 0.0);
        }
    }
}

#[test]
fn rebuild_preserves_entities_and_port_indices() {
    let mut net = simple_net();
    let s1 = net.node_id("S1").unwrap();
    let port = port_toward(&net, "S1", "S2");
    net.sats.get_mut(&s1).unwrap().packets_received = 7;

    let rebuilt = build_net(
        &line_doc(),
        &uniform_traffic(&["GS_A", "GS_B"], 1_000_000.0),
        Some(net),
        ForwardingStrategy::PortForwarding,
        BuilderKind::Baseline,
        &params(),
    );
    assert_eq!(rebuilt.satellite(s1).unwrap().packets_received, 7);
    assert_eq!(port_toward(&rebuilt, "S1", "S2"), port);
}

#[test]
fn rewiring_a_port_arms_the_link_switch_delay() {
    let net = simple_net();
    let port = port_toward(&net, "S1", "S2");
    let port_gs = port_toward(&net, "S1", "GS_A");

    // S2 disappears, S3 takes over the same slot
    let rewired = doc(
        &["GS_A", "GS_B"],
        &["S1", "S3"],
        &[
            ("GS_A", "S1", 1000.0),
            ("S1", "S3", 1000.0),
            ("S3", "GS_B", 1000.0),
        ],
    );
    let rebuilt = build_net(
        &rewired,
        &uniform_traffic(&["GS_A", "GS_B"], 1_000_000.0),
        Some(net),
        ForwardingStrategy::PortForwarding,
        BuilderKind::Baseline,
        &params(),
    );

    let s1 = rebuilt.node_id("S1").unwrap();
    let s3 = rebuilt.node_id("S3").unwrap();
    let sat = rebuilt.satellite(s1).unwrap();
    // the freed slot is reassigned and its one-shot setup is armed
    assert_eq!(port_toward(&rebuilt, "S1", "S3"), port);
    assert_eq!(sat.out_neighbor[&port], s3);
    assert_eq!(
        sat.link_switch_delay[&port],
        rebuilt.params.link_switch_delay
    );
    // the untouched port is not
    assert_eq!(port_toward(&rebuilt, "S1", "GS_A"), port_gs);
    assert_eq!(sat.link_switch_delay[&port_gs], 0.0);
}

#[test]
fn station_without_satellite_is_an_error() {
    let orphan = doc(&["GS_A", "GS_B"], &["S1"], &[("GS_A", "S1", 1000.0)]);
    let result = Network::build(
        &orphan,
        &uniform_traffic(&["GS_A", "GS_B"], 1_000_000.0),
        None,
        ForwardingStrategy::PortForwarding,
        BuilderKind::Baseline,
        &params(),
    );
    assert_eq!(
        result.err(),
        Some(NetworkError::MissingUplink("GS_B".to_string()))
    );
}

#[test]
fn link_to_unknown_node_is_an_error() {
    let broken = doc(&["GS_A"], &["S1"], &[("GS_A", "S9", 1000.0)]);
    let result = Network::build(
        &broken,
        &uniform_traffic(&["GS_A"], 1_000_000.0),
        None,
        ForwardingStrategy::PortForwarding,
        BuilderKind::Baseline,
        &params(),
    );
    assert_eq!(
        result.err(),
        Some(NetworkError::UnknownNode("S9".to_string()))
    );
}

#[test]
fn missing_traffic_entry_is_an_error() {
    let result = Network::build(
        &line_doc(),
        &uniform_traffic(&["GS_A"], 1_000_000.0),
        None,
        ForwardingStrategy::PortForwarding,
        BuilderKind::Baseline,
        &params(),
    );
    assert!(matches!(
        result.err(),
        Some(NetworkError::MissingTrafficEntry { .. })
    ));
}
