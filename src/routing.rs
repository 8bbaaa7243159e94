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

//! The source-routing header builder pipeline.
//!
//! The pipeline snapshots the topology, attaches the output port and the
//! buffer occupation of the owning satellite to every satellite-origin edge,
//! assigns edge weights, and converts selected paths into reversed
//! `(port, next_hop)` lists ready for LIFO consumption.
//!
//! Four variants refine each other by delegation: [`BuilderKind::Baseline`]
//! weighs edges by length alone; [`BuilderKind::NoSmoothing`] adds a raw
//! congestion factor; [`BuilderKind::ExponentialSmoothing`] substitutes an
//! EWMA of the sampled occupation; [`BuilderKind::KShortestNodeDisjoint`]
//! precomputes node-disjoint paths on the smoothed weights and samples among
//! them, preferring light paths.

use std::collections::{HashMap, VecDeque};

use clap::ValueEnum;
use itertools::Itertools;
use petgraph::{
    algo::astar,
    graph::{DiGraph, NodeIndex},
    visit::{EdgeRef, IntoEdgeReferences},
};
use rand::{distributions::WeightedIndex, prelude::Distribution, rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::{
    network::TopoGraph,
    packet::Hop,
    params::Parameters,
    satellite::LeoSatellite,
    types::{NodeId, NodeKind},
};

/// Which header-builder variant drives path selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
pub enum BuilderKind {
    /// Shortest path over link lengths.
    Baseline,
    /// Link length plus an un-smoothed buffer congestion factor.
    NoSmoothing,
    /// Link length plus an exponentially smoothed congestion factor.
    ExponentialSmoothing,
    /// Weighted-random choice among K node-disjoint paths.
    KShortestNodeDisjoint,
}

/// A node of the routing snapshot.
#[derive(Debug, Clone, Copy)]
struct SnapNode {
    id: NodeId,
    kind: NodeKind,
}

/// An edge of the routing snapshot, with its assigned weight.
#[derive(Debug, Clone, Copy)]
struct SnapEdge {
    weight: f64,
    out_port: Option<usize>,
}

/// Read-only weighted copy of the topology, taken at refresh time.
#[derive(Debug, Clone)]
struct Snapshot {
    graph: DiGraph<SnapNode, SnapEdge>,
    index_of: HashMap<NodeId, NodeIndex>,
}

impl Snapshot {
    /// Weighted shortest path between two nodes, as a node sequence.
    fn shortest_path(&self, src: NodeId, dst: NodeId) -> Option<Vec<NodeId>> {
        let s = *self.index_of.get(&src)?;
        let t = *self.index_of.get(&dst)?;
        let (_, path) = astar(&self.graph, s, |n| n == t, |e| e.weight().weight, |_| 0.0)?;
        Some(path.into_iter().map(|ix| self.graph[ix].id).collect())
    }

    /// Output port of the edge `u -> v`, if `u` is a satellite.
    fn out_port(&self, u: NodeId, v: NodeId) -> Option<usize> {
        let ui = *self.index_of.get(&u)?;
        let vi = *self.index_of.get(&v)?;
        let e = self.graph.find_edge(ui, vi)?;
        self.graph[e].out_port
    }

    /// Weight of the edge `u -> v`.
    fn edge_weight(&self, u: NodeId, v: NodeId) -> Option<f64> {
        let ui = *self.index_of.get(&u)?;
        let vi = *self.index_of.get(&v)?;
        let e = self.graph.find_edge(ui, vi)?;
        Some(self.graph[e].weight)
    }

    /// Sum of edge weights along a node sequence.
    fn path_weight(&self, nodes: &[NodeId]) -> Option<f64> {
        nodes
            .iter()
            .tuple_windows()
            .map(|(u, v)| self.edge_weight(*u, *v))
            .sum()
    }

    /// The satellite serving a ground station.
    fn serving_satellite(&self, gs: NodeId) -> Option<NodeId> {
        let ix = *self.index_of.get(&gs)?;
        self.graph
            .edges(ix)
            .map(|e| self.graph[e.target()])
            .find(|n| n.kind == NodeKind::LeoSatellite)
            .map(|n| n.id)
    }

    /// All ground stations of the snapshot.
    fn stations(&self) -> Vec<NodeId> {
        self.graph
            .node_weights()
            .filter(|n| n.kind == NodeKind::GroundStation)
            .map(|n| n.id)
            .collect()
    }

    /// Convert the path `p_0 = src, p_1, ..., p_k = dst` into the header
    /// `[(port(p_{k-1} -> p_k), p_k), ..., (port(p_1 -> p_2), p_2)]`: the
    /// ingress hop is implicit in the uplink wire, and the hop at the tail
    /// is consumed first. An inconsistent snapshot (a hop without a port)
    /// yields an empty header, which the first satellite counts as a routing
    /// drop.
    fn to_header(&self, nodes: &[NodeId]) -> Vec<Hop> {
        let mut hops = Vec::with_capacity(nodes.len().saturating_sub(2));
        for (u, v) in nodes.iter().skip(1).tuple_windows() {
            match self.out_port(*u, *v) {
                Some(port) => hops.push(Hop { port, next: *v }),
                None => return Vec::new(),
            }
        }
        hops.reverse();
        hops
    }
}

/// A candidate node-disjoint path with its precomputed weight.
#[derive(Debug, Clone)]
pub(crate) struct CandidatePath {
    /// Full node sequence from the source to the destination station.
    pub(crate) nodes: Vec<NodeId>,
    /// Sum of the snapshot edge weights along the path.
    pub(crate) weight: f64,
}

/// Routing state shared by all generators.
///
/// This replaces the class-level singleton builder of the original design
/// with an explicit context owned by the network: the graph snapshot, the
/// EWMA map and the disjoint-path cache all live here and survive snapshot
/// rebuilds. Taking a fresh snapshot is idempotent within the refresh
/// period.
#[derive(Debug)]
pub struct RoutingContext {
    kind: BuilderKind,
    update_freq: f64,
    alpha: f64,
    queue_size: u64,
    k: usize,
    last_refresh: Option<f64>,
    snapshot: Option<Snapshot>,
    /// EWMA of the buffer occupation per (satellite, port).
    ewma: HashMap<(NodeId, usize), f64>,
    /// Node-disjoint candidate paths per (src, dst) station pair.
    disjoint: HashMap<(NodeId, NodeId), Vec<CandidatePath>>,
    rng: StdRng,
}

impl RoutingContext {
    pub(crate) fn new(kind: BuilderKind, params: &Parameters) -> Self {
        Self {
            kind,
            update_freq: params.routing_update_period,
            alpha: params.alpha,
            queue_size: params.satellite_queue_size,
            k: params.k_disjoint_paths,
            last_refresh: None,
            snapshot: None,
            ewma: HashMap::new(),
            disjoint: HashMap::new(),
            rng: StdRng::seed_from_u64(params.rng_seed),
        }
    }

    /// The active builder variant.
    pub fn kind(&self) -> BuilderKind {
        self.kind
    }

    /// Take the very first snapshot if none exists yet.
    pub(crate) fn ensure(
        &mut self,
        now: f64,
        graph: &TopoGraph,
        sats: &HashMap<NodeId, LeoSatellite>,
    ) {
        if self.snapshot.is_none() {
            self.do_refresh(now, graph, sats);
        }
    }

    /// Take a fresh snapshot unless the last one is younger than the
    /// refresh period.
    pub(crate) fn refresh(
        &mut self,
        now: f64,
        graph: &TopoGraph,
        sats: &HashMap<NodeId, LeoSatellite>,
    ) {
        let stale = self
            .last_refresh
            .map_or(true, |t| now - t >= self.update_freq);
        if stale {
            self.do_refresh(now, graph, sats);
        }
    }

    /// Snapshot the topology, update the EWMA state, assign edge weights and
    /// rebuild the disjoint-path cache.
    fn do_refresh(&mut self, now: f64, graph: &TopoGraph, sats: &HashMap<NodeId, LeoSatellite>) {
        let mut snap = DiGraph::new();
        let mut index_of = HashMap::new();
        for node in graph.node_weights() {
            let ix = snap.add_node(SnapNode {
                id: node.id,
                kind: node.kind,
            });
            index_of.insert(node.id, ix);
        }
        for edge in graph.edge_references() {
            let u = &graph[edge.source()];
            let v = &graph[edge.target()];
            let link = edge.weight();
            let weight = match (u.kind, self.kind) {
                (NodeKind::GroundStation, _) | (_, BuilderKind::Baseline) => link.length_km,
                (NodeKind::LeoSatellite, _) => match link.out_port {
                    Some(port) => {
                        let sampled = sats
                            .get(&u.id)
                            .and_then(|s| s.out_ports.get(&port))
                            .map_or(0.0, |p| p.queued_bytes as f64);
                        let occupation = if self.kind == BuilderKind::NoSmoothing {
                            sampled
                        } else {
                            let ewma = self.ewma.entry((u.id, port)).or_insert(0.0);
                            *ewma = self.alpha * sampled + (1.0 - self.alpha) * *ewma;
                            *ewma
                        };
                        link.length_km + buffer_factor(occupation, self.queue_size)
                    }
                    None => link.length_km,
                },
            };
            snap.add_edge(
                index_of[&u.id],
                index_of[&v.id],
                SnapEdge {
                    weight,
                    out_port: link.out_port,
                },
            );
        }
        self.snapshot = Some(Snapshot {
            graph: snap,
            index_of,
        });
        self.last_refresh = Some(now);
        if self.kind == BuilderKind::KShortestNodeDisjoint {
            self.rebuild_disjoint_cache();
        }
    }

    /// Recompute the node-disjoint candidate paths for every station pair.
    fn rebuild_disjoint_cache(&mut self) {
        self.disjoint.clear();
        let Some(snap) = &self.snapshot else { return };
        let stations = snap.stations();
        for &src in &stations {
            for &dst in &stations {
                if src == dst {
                    continue;
                }
                let (Some(up), Some(down)) =
                    (snap.serving_satellite(src), snap.serving_satellite(dst))
                else {
                    continue;
                };
                let mut candidates = Vec::new();
                if up == down {
                    let nodes = vec![src, up, dst];
                    if let Some(weight) = snap.path_weight(&nodes) {
                        candidates.push(CandidatePath { nodes, weight });
                    }
                } else {
                    let (Some(&s), Some(&t)) = (snap.index_of.get(&up), snap.index_of.get(&down))
                    else {
                        continue;
                    };
                    for sat_path in node_disjoint_paths(&snap.graph, s, t, self.k) {
                        let mut nodes = Vec::with_capacity(sat_path.len() + 2);
                        nodes.push(src);
                        nodes.extend(sat_path);
                        nodes.push(dst);
                        if let Some(weight) = snap.path_weight(&nodes) {
                            candidates.push(CandidatePath { nodes, weight });
                        }
                    }
                    candidates.sort_by(|a, b| a.weight.total_cmp(&b.weight));
                }
                if !candidates.is_empty() {
                    self.disjoint.insert((src, dst), candidates);
                }
            }
        }
    }

    /// Compute the source-routing header for the flow `src -> dst`: the
    /// reversed `(port, next_hop)` list, tail consumed first. Empty when no
    /// route exists.
    pub(crate) fn sr_header(&mut self, src: NodeId, dst: NodeId) -> Vec<Hop> {
        let nodes = match self.kind {
            BuilderKind::KShortestNodeDisjoint => self
                .disjoint
                .get(&(src, dst))
                .and_then(|c| sample_path(c, &mut self.rng))
                .map(|c| c.nodes.clone()),
            _ => self
                .snapshot
                .as_ref()
                .and_then(|s| s.shortest_path(src, dst)),
        };
        match (nodes, self.snapshot.as_ref()) {
            (Some(nodes), Some(snap)) => snap.to_header(&nodes),
            _ => Vec::new(),
        }
    }

    /// Candidate paths of a station pair, for inspection.
    pub(crate) fn candidates(&self, src: NodeId, dst: NodeId) -> Option<&[CandidatePath]> {
        self.disjoint.get(&(src, dst)).map(|c| c.as_slice())
    }

    /// Current EWMA of the buffer occupation of (satellite, port).
    #[cfg(test)]
    pub(crate) fn ewma_value(&self, sat: NodeId, port: usize) -> Option<f64> {
        self.ewma.get(&(sat, port)).copied()
    }
}

/// Congestion factor `1 / (1 - occupation / queue_size)`. Saturated or
/// overflowing values become infinite, so shortest-path search naturally
/// routes around saturated links.
pub(crate) fn buffer_factor(occupation: f64, queue_size: u64) -> f64 {
    let denominator = 1.0 - occupation / queue_size as f64;
    if denominator <= 0.0 {
        return f64::INFINITY;
    }
    let factor = 1.0 / denominator;
    if factor > i32::MAX as f64 {
        f64::INFINITY
    } else {
        factor
    }
}

/// Pick a candidate path at random, with probability
/// `(1 - W_i / T) / sum_j (1 - W_j / T)`: heavier paths are sampled less
/// often.
fn sample_path<'a>(candidates: &'a [CandidatePath], rng: &mut StdRng) -> Option<&'a CandidatePath> {
    if candidates.len() <= 1 {
        return candidates.first();
    }
    let total: f64 = candidates.iter().map(|c| c.weight).sum();
    if !total.is_finite() || total <= 0.0 {
        return candidates
            .iter()
            .min_by(|a, b| a.weight.total_cmp(&b.weight));
    }
    let scores = candidates
        .iter()
        .map(|c| 1.0 - c.weight / total)
        .collect_vec();
    match WeightedIndex::new(&scores) {
        Ok(dist) => candidates.get(dist.sample(rng)),
        Err(_) => candidates.first(),
    }
}

/// A residual arc of the auxiliary flow graph.
#[derive(Debug, Clone, Copy)]
struct Arc {
    to: usize,
    cap: u32,
    cost: f64,
    rev: usize,
}

fn add_arc(adj: &mut [Vec<usize>], arcs: &mut Vec<Arc>, from: usize, to: usize, cap: u32, cost: f64) {
    let a = arcs.len();
    arcs.push(Arc {
        to,
        cap,
        cost,
        rev: a + 1,
    });
    arcs.push(Arc {
        to: from,
        cap: 0,
        cost: -cost,
        rev: a,
    });
    adj[from].push(a);
    adj[to].push(a + 1);
}

/// Shortest-path tree over the residual graph (queue-based Bellman-Ford,
/// since residual arcs carry negative costs).
fn residual_shortest_paths(
    adj: &[Vec<usize>],
    arcs: &[Arc],
    source: usize,
) -> (Vec<f64>, Vec<Option<usize>>) {
    let n = adj.len();
    let mut dist = vec![f64::INFINITY; n];
    let mut parent = vec![None; n];
    let mut in_queue = vec![false; n];
    let mut queue = VecDeque::new();
    dist[source] = 0.0;
    queue.push_back(source);
    in_queue[source] = true;
    while let Some(u) = queue.pop_front() {
        in_queue[u] = false;
        for &a in &adj[u] {
            let arc = arcs[a];
            if arc.cap == 0 {
                continue;
            }
            let candidate = dist[u] + arc.cost;
            if candidate < dist[arc.to] - 1e-12 {
                dist[arc.to] = candidate;
                parent[arc.to] = Some(a);
                if !in_queue[arc.to] {
                    queue.push_back(arc.to);
                    in_queue[arc.to] = true;
                }
            }
        }
    }
    (dist, parent)
}

/// Up to `k` node-disjoint satellite paths from `s` to `t`, lightest sets
/// first.
///
/// Standard auxiliary construction: every satellite is split into an
/// in-vertex and an out-vertex joined by a unit-capacity arc, every edge
/// becomes a unit-capacity arc between the matching out- and in-vertices,
/// and each unit of min-cost flow from `s` to `t` is one node-disjoint path.
/// Ground stations and saturated (infinite-weight) edges take no part.
fn node_disjoint_paths(
    graph: &DiGraph<SnapNode, SnapEdge>,
    s: NodeIndex,
    t: NodeIndex,
    k: usize,
) -> Vec<Vec<NodeId>> {
    if k == 0 {
        return Vec::new();
    }
    let n = graph.node_count();
    let vertices = 2 * n;
    let mut adj = vec![Vec::new(); vertices];
    let mut arcs = Vec::new();
    let vertex_in = |x: NodeIndex| 2 * x.index();
    let vertex_out = |x: NodeIndex| 2 * x.index() + 1;

    for ix in graph.node_indices() {
        if graph[ix].kind != NodeKind::LeoSatellite {
            continue;
        }
        let cap = if ix == s || ix == t { k as u32 } else { 1 };
        add_arc(&mut adj, &mut arcs, vertex_in(ix), vertex_out(ix), cap, 0.0);
    }
    for edge in graph.edge_references() {
        let (u, v) = (edge.source(), edge.target());
        if graph[u].kind != NodeKind::LeoSatellite || graph[v].kind != NodeKind::LeoSatellite {
            continue;
        }
        let weight = edge.weight().weight;
        if !weight.is_finite() {
            continue;
        }
        add_arc(&mut adj, &mut arcs, vertex_out(u), vertex_in(v), 1, weight);
    }

    let (source, sink) = (vertex_in(s), vertex_out(t));
    let mut flow = 0;
    for _ in 0..k {
        let (dist, parent) = residual_shortest_paths(&adj, &arcs, source);
        if !dist[sink].is_finite() {
            break;
        }
        let mut v = sink;
        while v != source {
            let Some(a) = parent[v] else { break };
            let r = arcs[a].rev;
            arcs[a].cap -= 1;
            arcs[r].cap += 1;
            v = arcs[r].to;
        }
        flow += 1;
    }

    // decompose the flow into node paths, one per unit
    let mut paths = Vec::with_capacity(flow);
    'units: for _ in 0..flow {
        let mut cur = source;
        let mut nodes = Vec::new();
        while cur != sink {
            let Some(&a) = adj[cur]
                .iter()
                .find(|&&a| a % 2 == 0 && arcs[arcs[a].rev].cap > 0)
            else {
                break 'units;
            };
            let r = arcs[a].rev;
            arcs[r].cap -= 1;
            // crossing the internal arc of a split node records the node
            if cur % 2 == 0 && arcs[a].to == cur + 1 {
                nodes.push(graph[NodeIndex::new(cur / 2)].id);
            }
            cur = arcs[a].to;
        }
        paths.push(nodes);
    }
    paths
}
