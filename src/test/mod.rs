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

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::{
    network::Network,
    params::Parameters,
    routing::BuilderKind,
    satellite::ForwardingStrategy,
    topology::{SnapshotSource, TopoLink, TopoNode, TopologyDoc, TrafficMatrix},
    types::{FetchError, NodeKind},
};

mod test_network;
mod test_port;
mod test_routing;

/// Build a topology document from plain name lists.
fn doc(stations: &[&str], sats: &[&str], links: &[(&str, &str, f64)]) -> TopologyDoc {
    TopologyDoc {
        nodes: stations
            .iter()
            .map(|n| TopoNode {
                id: n.to_string(),
                kind: NodeKind::GroundStation,
                plane: None,
                position_in_plane: None,
            })
            .chain(sats.iter().map(|n| TopoNode {
                id: n.to_string(),
                kind: NodeKind::LeoSatellite,
                plane: None,
                position_in_plane: None,
            }))
            .collect(),
        links: links
            .iter()
            .map(|(s, t, l)| TopoLink {
                source: s.to_string(),
                target: t.to_string(),
                length_km: *l,
            })
            .collect(),
    }
}

/// # Test network
///
/// ```text
/// GS_A ---- S1 ---- S2 ---- GS_B
/// ```
///
/// All links are 1000 km long.
fn line_doc() -> TopologyDoc {
    doc(
        &["GS_A", "GS_B"],
        &["S1", "S2"],
        &[
            ("GS_A", "S1", 1000.0),
            ("S1", "S2", 1000.0),
            ("S2", "GS_B", 1000.0),
        ],
    )
}

/// # Diamond network
///
/// ```text
///                .-- A --.
/// GS_X ---- SU -+         +- SD ---- GS_Y
///                '-- B --'
/// ```
///
/// The path through `A` is shorter than the path through `B`.
fn diamond_doc() -> TopologyDoc {
    doc(
        &["GS_X", "GS_Y"],
        &["SU", "SD", "A", "B"],
        &[
            ("GS_X", "SU", 1000.0),
            ("SU", "A", 500.0),
            ("A", "SD", 500.0),
            ("SU", "B", 2000.0),
            ("B", "SD", 2000.0),
            ("SD", "GS_Y", 1000.0),
        ],
    )
}

/// The same offered volume (bytes/s) for every ordered station pair.
fn uniform_traffic(stations: &[&str], rate: f64) -> TrafficMatrix {
    let mut matrix = HashMap::new();
    for &src in stations {
        let row: HashMap<String, f64> = stations
            .iter()
            .filter(|&&dst| dst != src)
            .map(|&dst| (dst.to_string(), rate))
            .collect();
        matrix.insert(src.to_string(), row);
    }
    TrafficMatrix(matrix)
}

/// Build a network, panicking on assembly errors.
fn build_net(
    topo: &TopologyDoc,
    traffic: &TrafficMatrix,
    old: Option<Network>,
    strategy: ForwardingStrategy,
    builder: BuilderKind,
    params: &Parameters,
) -> Network {
    Network::build(topo, traffic, old, strategy, builder, params).expect("network builds")
}

/// The output port of satellite `sat` pointing at `neighbor`.
fn port_toward(net: &Network, sat: &str, neighbor: &str) -> usize {
    let sat_id = net.node_id(sat).expect("satellite exists");
    let neighbor_id = net.node_id(neighbor).expect("neighbor exists");
    *net.satellite(sat_id)
        .expect("satellite entity exists")
        .out_neighbor
        .iter()
        .find(|(_, v)| **v == neighbor_id)
        .expect("port exists")
        .0
}

/// A source serving the same documents for every snapshot.
struct StaticSource {
    doc: TopologyDoc,
    traffic: TrafficMatrix,
}

impl SnapshotSource for StaticSource {
    fn traffic_matrix(&mut self, _: f64, _: &[String]) -> Result<TrafficMatrix, FetchError> {
        Ok(self.traffic.clone())
    }

    fn topology_at(&mut self, _: DateTime<Utc>, _: &[String]) -> Result<TopologyDoc, FetchError> {
        Ok(self.doc.clone())
    }
}
