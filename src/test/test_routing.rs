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

//! The header-builder pipeline: header shape, congestion weights, EWMA
//! state and node-disjoint path sampling.

use approx::assert_relative_eq;
use pretty_assertions::assert_eq;

use super::{build_net, diamond_doc, doc, line_doc, port_toward, uniform_traffic};
use crate::{
    network::Network,
    packet::Hop,
    params::Parameters,
    routing::{buffer_factor, BuilderKind},
    satellite::ForwardingStrategy,
};

fn params() -> Parameters {
    Parameters::default()
}

fn diamond_net(builder: BuilderKind) -> Network {
    build_net(
        &diamond_doc(),
        &uniform_traffic(&["GS_X", "GS_Y"], 1_000_000.0),
        None,
        ForwardingStrategy::PortForwarding,
        builder,
        &params(),
    )
}

#[test]
fn header_is_reversed_for_lifo_consumption() {
    let mut net = build_net(
        &line_doc(),
        &uniform_traffic(&["GS_A", "GS_B"], 1_000_000.0),
        None,
        ForwardingStrategy::PortForwarding,
        BuilderKind::Baseline,
        &params(),
    );
    let gsa = net.node_id("GS_A").unwrap();
    let gsb = net.node_id("GS_B").unwrap();
    let s2 = net.node_id("S2").unwrap();
    let p_s1_s2 = port_toward(&net, "S1", "S2");
    let p_s2_gsb = port_toward(&net, "S2", "GS_B");

    net.routing.ensure(0.0, &net.graph, &net.sats);
    let header = net.routing.sr_header(gsa, gsb);

    // ingress hop implicit; tail of the list is consumed first
    assert_eq!(
        header,
        vec![
            Hop {
                port: p_s2_gsb,
                next: gsb
            },
            Hop {
                port: p_s1_s2,
                next: s2
            },
        ]
    );
}

#[test]
fn no_route_yields_an_empty_header() {
    // two disconnected islands
    let islands = doc(
        &["GS_A", "GS_B"],
        &["S1", "S2"],
        &[("GS_A", "S1", 1000.0), ("GS_B", "S2", 1000.0)],
    );
    let mut net = build_net(
        &islands,
        &uniform_traffic(&["GS_A", "GS_B"], 1_000_000.0),
        None,
        ForwardingStrategy::PortForwarding,
        BuilderKind::Baseline,
        &params(),
    );
    let gsa = net.node_id("GS_A").unwrap();
    let gsb = net.node_id("GS_B").unwrap();
    net.routing.ensure(0.0, &net.graph, &net.sats);
    assert_eq!(net.routing.sr_header(gsa, gsb), Vec::new());
}

#[test]
fn congestion_factor_saturates_to_infinity() {
    assert_eq!(buffer_factor(0.0, 100), 1.0);
    assert_relative_eq!(buffer_factor(50.0, 100), 2.0);
    assert_eq!(buffer_factor(100.0, 100), f64::INFINITY);
    assert_eq!(buffer_factor(150.0, 100), f64::INFINITY);
    // overflowing the signed-32 range is treated as saturation as well
    let nearly_full = 100.0 * (1.0 - 1.0 / (4.0 * i32::MAX as f64));
    assert_eq!(buffer_factor(nearly_full, 100), f64::INFINITY);
}

#[test]
fn ewma_converges_to_a_constant_occupation() {
    let mut net = build_net(
        &line_doc(),
        &uniform_traffic(&["GS_A", "GS_B"], 1_000_000.0),
        None,
        ForwardingStrategy::PortForwarding,
        BuilderKind::ExponentialSmoothing,
        &params(),
    );
    let s1 = net.node_id("S1").unwrap();
    let port = port_toward(&net, "S1", "S2");
    let occupation = 1_000_000u64;
    net.sats
        .get_mut(&s1)
        .unwrap()
        .out_ports
        .get_mut(&port)
        .unwrap()
        .queued_bytes = occupation;

    // one snapshot per refresh period
    for step in 1..=40 {
        net.routing.refresh(step as f64, &net.graph, &net.sats);
    }
    let ewma = net.routing.ewma_value(s1, port).unwrap();
    assert_relative_eq!(ewma, occupation as f64, max_relative = 0.01);
}

#[test]
fn disjoint_paths_are_found_and_ordered() {
    let mut net = diamond_net(BuilderKind::KShortestNodeDisjoint);
    let gsx = net.node_id("GS_X").unwrap();
    let gsy = net.node_id("GS_Y").unwrap();
    let a = net.node_id("A").unwrap();
    let b = net.node_id("B").unwrap();
    net.routing.ensure(0.0, &net.graph, &net.sats);

    let candidates = net.routing.candidates(gsx, gsy).unwrap();
    assert_eq!(candidates.len(), 2);
    // lightest path first, and the sets are node-disjoint
    assert!(candidates[0].nodes.contains(&a));
    assert!(candidates[1].nodes.contains(&b));
    assert!(candidates[0].weight < candidates[1].weight);
}

#[test]
fn shared_uplink_and_downlink_satellite_short_circuits() {
    let single = doc(
        &["GS_X", "GS_Y"],
        &["SU"],
        &[("GS_X", "SU", 1000.0), ("GS_Y", "SU", 1000.0)],
    );
    let mut net = build_net(
        &single,
        &uniform_traffic(&["GS_X", "GS_Y"], 1_000_000.0),
        None,
        ForwardingStrategy::PortForwarding,
        BuilderKind::KShortestNodeDisjoint,
        &params(),
    );
    let gsx = net.node_id("GS_X").unwrap();
    let gsy = net.node_id("GS_Y").unwrap();
    let su = net.node_id("SU").unwrap();
    net.routing.ensure(0.0, &net.graph, &net.sats);

    let candidates = net.routing.candidates(gsx, gsy).unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].nodes, vec![gsx, su, gsy]);
    // one hop remains after the implicit ingress
    assert_eq!(net.routing.sr_header(gsx, gsy).len(), 1);
}

#[test]
fn sampling_prefers_light_paths() {
    let mut net = diamond_net(BuilderKind::KShortestNodeDisjoint);
    let gsx = net.node_id("GS_X").unwrap();
    let gsy = net.node_id("GS_Y").unwrap();
    let a = net.node_id("A").unwrap();
    net.routing.ensure(0.0, &net.graph, &net.sats);

    let (w1, w2) = {
        let candidates = net.routing.candidates(gsx, gsy).unwrap();
        (candidates[0].weight, candidates[1].weight)
    };
    // with two candidates, the light path is taken with frequency
    // w2 / (w1 + w2)
    let expected = w2 / (w1 + w2);

    let trials = 4000;
    let mut via_a = 0usize;
    for _ in 0..trials {
        let header = net.routing.sr_header(gsx, gsy);
        if header.iter().any(|hop| hop.next == a) {
            via_a += 1;
        }
    }
    let frequency = via_a as f64 / trials as f64;
    assert!(
        (frequency - expected).abs() < 0.05,
        "frequency {frequency} too far from {expected}"
    );
}
