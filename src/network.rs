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

//! # Top-level Network module
//!
//! This module owns every simulated entity, assembles and refreshes the
//! topology between snapshots, and dispatches simulation events.
//!
//! Ports, sinks and generators are created once and survive every snapshot;
//! only the wires and the satellite-to-port topology are re-wired on a
//! rebuild. Cross-entity links are plain [`NodeId`]s, so ownership forms a
//! DAG from the generators down to the sinks.

use std::collections::{HashMap, HashSet};

use log::trace;
use petgraph::{
    stable_graph::{EdgeIndex, NodeIndex, StableGraph},
    visit::EdgeRef,
    Directed,
};
use serde::{Deserialize, Serialize};

use crate::{
    event::{Event, EventQueue},
    generator::PacketGenerator,
    packet::Packet,
    params::Parameters,
    port::{Port, PortPut},
    routing::{BuilderKind, RoutingContext},
    satellite::{ForwardingStrategy, LeoSatellite},
    station::GroundStation,
    topology::{TopologyDoc, TrafficMatrix},
    types::{Endpoint, FlowId, NetworkError, NodeId, NodeKind, SimError},
    wire::Wire,
};

pub(crate) type IndexType = u32;
/// Graph index of a node in the current snapshot.
pub type TopoIndex = NodeIndex<IndexType>;
/// The constellation topology of the current snapshot.
pub type TopoGraph = StableGraph<Node, Link, Directed, IndexType>;

/// A node of the current topology snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Stable id interned from the name.
    pub id: NodeId,
    /// Name as reported by the topology service.
    pub name: String,
    /// Station or satellite.
    pub kind: NodeKind,
    /// Orbital plane (satellites only; opaque to the core).
    pub plane: Option<u32>,
    /// Position within the orbital plane (satellites only; opaque to the
    /// core).
    pub position_in_plane: Option<u32>,
}

/// A directed link of the current topology snapshot. Every undirected link
/// of the service document is materialized in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Link {
    /// Length of the link in kilometers.
    pub length_km: f64,
    /// Output port on the origin satellite (`None` on station-origin
    /// edges).
    pub out_port: Option<usize>,
}

/// # Network struct
/// The struct owns the topology graph, all ground stations and satellites,
/// the shared routing context and the event queue, and it simulates the
/// packet flow between them.
///
/// A network is built from a topology document with [`Network::build`].
/// Passing the previous network carries every long-lived entity (sinks,
/// generators, satellites with their port state, the queue, the routing
/// context) forward and re-wires only the link layer: the port index of a
/// kept (satellite, neighbor) pair is preserved, new neighbors take the
/// lowest free slot, and `link_switch_delay` is re-armed only on ports whose
/// downstream neighbor changed.
#[derive(Debug)]
pub struct Network {
    pub(crate) graph: TopoGraph,
    pub(crate) index_of: HashMap<NodeId, TopoIndex>,
    /// Interned node names, indexed by `NodeId`. Survives rebuilds.
    names: Vec<String>,
    by_name: HashMap<String, NodeId>,
    pub(crate) stations: HashMap<NodeId, GroundStation>,
    pub(crate) sats: HashMap<NodeId, LeoSatellite>,
    pub(crate) routing: RoutingContext,
    pub(crate) queue: EventQueue,
    /// Active forwarding strategy.
    pub strategy: ForwardingStrategy,
    /// Tunables of this network.
    pub params: Parameters,
}

impl Network {
    /// Assemble a network from a topology document, carrying all live state
    /// over from `old`.
    pub fn build(
        topo: &TopologyDoc,
        traffic: &TrafficMatrix,
        old: Option<Network>,
        strategy: ForwardingStrategy,
        builder: BuilderKind,
        params: &Parameters,
    ) -> Result<Self, NetworkError> {
        let (names, by_name, stations, sats, routing, queue) = match old {
            Some(net) => (
                net.names,
                net.by_name,
                net.stations,
                net.sats,
                net.routing,
                net.queue,
            ),
            None => (
                Vec::new(),
                HashMap::new(),
                HashMap::new(),
                HashMap::new(),
                RoutingContext::new(builder, params),
                EventQueue::new(),
            ),
        };
        let mut net = Network {
            graph: TopoGraph::default(),
            index_of: HashMap::new(),
            names,
            by_name,
            stations,
            sats,
            routing,
            queue,
            strategy,
            params: params.clone(),
        };
        net.add_nodes(topo);
        net.add_links(topo)?;
        net.setup_stations(traffic)?;
        net.wire_satellites();
        net.wire_uplinks()?;
        Ok(net)
    }

    /// Intern a node name, returning its stable id.
    fn intern(&mut self, name: &str) -> NodeId {
        if let Some(id) = self.by_name.get(name) {
            return *id;
        }
        let id = NodeId(self.names.len() as u32);
        self.names.push(name.to_string());
        self.by_name.insert(name.to_string(), id);
        id
    }

    fn add_nodes(&mut self, topo: &TopologyDoc) {
        for node in &topo.nodes {
            let id = self.intern(&node.id);
            let ix = self.graph.add_node(Node {
                id,
                name: node.id.clone(),
                kind: node.kind,
                plane: node.plane,
                position_in_plane: node.position_in_plane,
            });
            self.index_of.insert(id, ix);
        }
    }

    fn add_links(&mut self, topo: &TopologyDoc) -> Result<(), NetworkError> {
        for link in &topo.links {
            let ui = self
                .node_id(&link.source)
                .and_then(|id| self.index_of.get(&id).copied())
                .ok_or_else(|| NetworkError::UnknownNode(link.source.clone()))?;
            let vi = self
                .node_id(&link.target)
                .and_then(|id| self.index_of.get(&id).copied())
                .ok_or_else(|| NetworkError::UnknownNode(link.target.clone()))?;
            let weight = Link {
                length_km: link.length_km,
                out_port: None,
            };
            self.graph.add_edge(ui, vi, weight);
            self.graph.add_edge(vi, ui, weight);
        }
        Ok(())
    }

    /// Carry forward (or create) the sink and the generators of every
    /// ground station. A new generator schedules the first iteration of its
    /// run loop.
    fn setup_stations(&mut self, traffic: &TrafficMatrix) -> Result<(), NetworkError> {
        let stations: Vec<NodeId> = self
            .graph
            .node_weights()
            .filter(|n| n.kind == NodeKind::GroundStation)
            .map(|n| n.id)
            .collect();
        for &gs in &stations {
            self.stations.entry(gs).or_insert_with(GroundStation::new);
        }
        let now = self.queue.now();
        for &src in &stations {
            for &dst in &stations {
                if src == dst {
                    continue;
                }
                let exists = self
                    .stations
                    .get(&src)
                    .map_or(false, |s| s.generators.contains_key(&dst));
                if exists {
                    continue;
                }
                let rate = traffic
                    .rate(self.name(src), self.name(dst))
                    .ok_or_else(|| NetworkError::MissingTrafficEntry {
                        src: self.name(src).to_string(),
                        dst: self.name(dst).to_string(),
                    })?;
                let interarrival = self.params.packet_size as f64 / rate;
                let generator = PacketGenerator::new(
                    dst,
                    FlowId { src, dst },
                    interarrival,
                    self.params.packet_size,
                    now,
                );
                if interarrival.is_finite() && interarrival > 0.0 {
                    self.queue.schedule_after(
                        generator.initial_delay + generator.interarrival,
                        Event::NextPacket { src, dst },
                    );
                }
                if let Some(station) = self.stations.get_mut(&src) {
                    station.generators.insert(dst, generator);
                }
            }
        }
        Ok(())
    }

    /// Re-wire every satellite against its current adjacency.
    fn wire_satellites(&mut self) {
        let sat_nodes: Vec<(NodeId, TopoIndex)> = self
            .graph
            .node_indices()
            .filter(|ix| self.graph[*ix].kind == NodeKind::LeoSatellite)
            .map(|ix| (self.graph[ix].id, ix))
            .collect();
        for (sat_id, six) in sat_nodes {
            // adjacency in link-insertion order, indexed from 0
            let mut adjacency: Vec<(NodeId, NodeKind, EdgeIndex<IndexType>, f64)> = self
                .graph
                .edges(six)
                .map(|e| {
                    let target = &self.graph[e.target()];
                    (target.id, target.kind, e.id(), e.weight().length_km)
                })
                .collect();
            adjacency.reverse();

            self.sats.entry(sat_id).or_insert_with(LeoSatellite::new);
            let Some(sat) = self.sats.get_mut(&sat_id) else {
                continue;
            };

            let current: HashSet<NodeId> = adjacency.iter().map(|(v, ..)| *v).collect();
            let kept: HashMap<NodeId, usize> = sat
                .out_neighbor
                .iter()
                .filter(|(_, v)| current.contains(v))
                .map(|(p, v)| (*v, *p))
                .collect();
            let occupied: HashSet<usize> = kept.values().copied().collect();
            let mut free = (0..adjacency.len()).filter(|p| !occupied.contains(p));

            let mut edge_ports: Vec<(EdgeIndex<IndexType>, usize)> = Vec::new();
            for (v, vkind, eix, length_km) in adjacency {
                let endpoint = match vkind {
                    NodeKind::LeoSatellite => Endpoint::Satellite(v),
                    NodeKind::GroundStation => Endpoint::Station(v),
                };
                let wire = Wire::from_length(length_km, endpoint);
                let port = match kept.get(&v) {
                    Some(&p) => {
                        // unchanged downstream: no pending setup
                        sat.link_switch_delay.insert(p, 0.0);
                        if let Some(port) = sat.out_ports.get_mut(&p) {
                            port.wire = wire;
                        }
                        p
                    }
                    None => {
                        let Some(p) = free.next() else { continue };
                        match sat.out_ports.get_mut(&p) {
                            Some(port) => {
                                // reassigned slot: the downstream changed
                                port.wire = wire;
                                sat.link_switch_delay
                                    .insert(p, self.params.link_switch_delay);
                            }
                            None => {
                                sat.out_ports.insert(
                                    p,
                                    Port::new(
                                        self.params.satellite_port_rate,
                                        self.params.satellite_queue_size,
                                        self.params.limit_bytes,
                                        wire,
                                    ),
                                );
                                sat.link_switch_delay.insert(p, 0.0);
                            }
                        }
                        p
                    }
                };
                sat.out_neighbor.insert(port, v);
                edge_ports.push((eix, port));
            }
            for (eix, port) in edge_ports {
                if let Some(link) = self.graph.edge_weight_mut(eix) {
                    link.out_port = Some(port);
                }
            }
        }
    }

    /// Point every ground station at its serving satellite through one
    /// shared uplink wire.
    fn wire_uplinks(&mut self) -> Result<(), NetworkError> {
        let gs_nodes: Vec<(NodeId, TopoIndex)> = self
            .graph
            .node_indices()
            .filter(|ix| self.graph[*ix].kind == NodeKind::GroundStation)
            .map(|ix| (self.graph[ix].id, ix))
            .collect();
        for (gs, ix) in gs_nodes {
            let mut adjacency: Vec<(NodeId, NodeKind, f64)> = self
                .graph
                .edges(ix)
                .map(|e| {
                    let target = &self.graph[e.target()];
                    (target.id, target.kind, e.weight().length_km)
                })
                .collect();
            adjacency.reverse();
            let up = adjacency
                .into_iter()
                .find(|(_, kind, _)| *kind == NodeKind::LeoSatellite);
            let Some((sat, _, length_km)) = up else {
                return Err(NetworkError::MissingUplink(self.name(gs).to_string()));
            };
            if let Some(station) = self.stations.get_mut(&gs) {
                station.uplink = Some(Wire::from_length(length_km, Endpoint::Satellite(sat)));
            }
        }
        Ok(())
    }

    // ********************
    // * Simulation       *
    // ********************

    /// Advance the simulation until `horizon` (absolute simulated seconds).
    ///
    /// Pops every event with a fire time up to and including the horizon, in
    /// (time, insertion) order. Events strictly beyond the horizon stay
    /// queued for the next snapshot. Fails with
    /// [`SimError::HorizonExceeded`] iff the horizon lies in the simulated
    /// past.
    pub fn run_until(&mut self, horizon: f64) -> Result<(), SimError> {
        if horizon < self.queue.now() {
            return Err(SimError::HorizonExceeded {
                now: self.queue.now(),
                horizon,
            });
        }
        while let Some(event) = self.queue.pop_until(horizon) {
            self.handle_event(event);
        }
        self.queue.advance_to(horizon);
        Ok(())
    }

    /// Process a single event by dispatching it to the owning entity.
    fn handle_event(&mut self, event: Event) {
        match event {
            Event::NextPacket { src, dst } => self.emit_packet(src, dst),
            Event::RoutingRefresh { .. } => {
                let now = self.queue.now();
                self.routing.refresh(now, &self.graph, &self.sats);
            }
            Event::Arrive { to, packet } => self.deliver(to, packet),
            Event::Dispatch { sat, port, packet } => self.dispatch(sat, port, packet),
            Event::TransmitDone { sat, port, packet } => self.transmit_done(sat, port, packet),
            Event::Process { sat } => self.process(sat),
        }
    }

    /// One iteration of a generator's run loop: build the header, emit the
    /// packet onto the uplink wire, and re-arm the inter-arrival timeout.
    fn emit_packet(&mut self, src: NodeId, dst: NodeId) {
        let now = self.queue.now();
        let Some(generator) = self.stations.get(&src).and_then(|s| s.generators.get(&dst)) else {
            return;
        };
        if now >= generator.finish {
            return;
        }
        let (flow, size, interarrival) = (generator.flow, generator.size, generator.interarrival);
        let uplink = self.stations.get(&src).and_then(|s| s.uplink);

        self.routing.ensure(now, &self.graph, &self.sats);
        let header = self.routing.sr_header(src, dst);
        if header.is_empty() {
            trace!("no route for flow {flow}: emitting with empty header");
        }

        let Some(generator) = self
            .stations
            .get_mut(&src)
            .and_then(|s| s.generators.get_mut(&dst))
        else {
            return;
        };
        generator.packets_sent += 1;
        let packet = Packet {
            emit_time: now,
            size,
            packet_id: generator.packets_sent,
            src,
            dst,
            flow,
            header,
        };
        if now - generator.last_routing_update > self.params.routing_update_period {
            generator.last_routing_update = now;
            self.queue.schedule_after(
                self.params.leo_geo_gs_td,
                Event::RoutingRefresh { src, dst },
            );
        }
        if let Some(wire) = uplink {
            self.queue.schedule_after(
                wire.delay,
                Event::Arrive {
                    to: wire.out,
                    packet,
                },
            );
        }
        if interarrival > 0.0 {
            self.queue
                .schedule_after(interarrival, Event::NextPacket { src, dst });
        }
    }

    /// A wire delivered `packet` to its far end.
    fn deliver(&mut self, to: Endpoint, packet: Packet) {
        match to {
            Endpoint::Satellite(id) => {
                let Some(sat) = self.sats.get_mut(&id) else {
                    return;
                };
                if sat.store.put(packet) {
                    self.queue.schedule_after(0.0, Event::Process { sat: id });
                }
            }
            Endpoint::Station(id) => {
                let now = self.queue.now();
                if let Some(station) = self.stations.get_mut(&id) {
                    station.sink.put(&packet, now);
                }
            }
        }
    }

    /// One iteration of a satellite's service loop: pop the next packet,
    /// consume a header entry, and either dispatch to the requested port
    /// (after any pending one-shot link setup) or count a routing drop.
    fn process(&mut self, sat_id: NodeId) {
        let strategy = self.strategy;
        let Some(sat) = self.sats.get_mut(&sat_id) else {
            return;
        };
        let Some(mut packet) = sat.store.get_or_park() else {
            return;
        };
        sat.packets_received += 1;
        match packet.pop_hop() {
            None => {
                sat.routing_issues_drops += 1;
                trace!(
                    "{sat_id}: header of packet {} (flow {}) exhausted, dropping",
                    packet.packet_id,
                    packet.flow
                );
            }
            Some(hop) => {
                if sat.accepts(strategy, &hop) && sat.out_ports.contains_key(&hop.port) {
                    let setup = sat.take_link_setup(hop.port);
                    self.queue.schedule_after(
                        setup,
                        Event::Dispatch {
                            sat: sat_id,
                            port: hop.port,
                            packet,
                        },
                    );
                } else {
                    sat.routing_issues_drops += 1;
                    trace!(
                        "{sat_id}: cannot honor hop (port {}, next {}), dropping",
                        hop.port,
                        hop.next
                    );
                }
            }
        }
        // the service loop immediately awaits the next packet
        if sat.store.is_empty() {
            sat.store.park();
        } else {
            self.queue
                .schedule_after(0.0, Event::Process { sat: sat_id });
        }
    }

    /// The link setup elapsed: hand `packet` to the output port and start
    /// its transmitter if it was idle.
    fn dispatch(&mut self, sat_id: NodeId, port_idx: usize, packet: Packet) {
        let Some(sat) = self.sats.get_mut(&sat_id) else {
            return;
        };
        let Some(port) = sat.out_ports.get_mut(&port_idx) else {
            // the port vanished while the setup was pending
            sat.routing_issues_drops += 1;
            return;
        };
        match port.put(packet) {
            PortPut::Wake => {
                if let Some((head, t_tx)) = port.begin_transmit() {
                    self.queue.schedule_after(
                        t_tx,
                        Event::TransmitDone {
                            sat: sat_id,
                            port: port_idx,
                            packet: head,
                        },
                    );
                }
            }
            PortPut::Queued => {}
            PortPut::Dropped => {
                trace!("{sat_id}: port {port_idx} full, dropping");
            }
        }
    }

    /// A port finished serializing `packet`: put it on the wire and start
    /// the next transmission.
    fn transmit_done(&mut self, sat_id: NodeId, port_idx: usize, packet: Packet) {
        let Some(sat) = self.sats.get_mut(&sat_id) else {
            return;
        };
        let Some(port) = sat.out_ports.get_mut(&port_idx) else {
            return;
        };
        port.finish_transmit();
        let wire = port.wire;
        self.queue.schedule_after(
            wire.delay,
            Event::Arrive {
                to: wire.out,
                packet,
            },
        );
        if let Some((head, t_tx)) = port.begin_transmit() {
            self.queue.schedule_after(
                t_tx,
                Event::TransmitDone {
                    sat: sat_id,
                    port: port_idx,
                    packet: head,
                },
            );
        }
    }

    // ********************
    // * Helper Functions *
    // ********************

    /// Current simulated time in seconds.
    pub fn now(&self) -> f64 {
        self.queue.now()
    }

    /// Returns a reference to the topology graph (PetGraph struct).
    pub fn get_topology(&self) -> &TopoGraph {
        &self.graph
    }

    /// Name of a node.
    pub fn name(&self, id: NodeId) -> &str {
        self.names
            .get(id.0 as usize)
            .map(|s| s.as_str())
            .unwrap_or("?")
    }

    /// Id of a node name, if the name appeared in any snapshot so far.
    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    /// Ground stations of the current snapshot.
    pub fn stations(&self) -> impl Iterator<Item = (NodeId, &GroundStation)> + '_ {
        self.graph
            .node_weights()
            .filter(|n| n.kind == NodeKind::GroundStation)
            .filter_map(|n| self.stations.get(&n.id).map(|s| (n.id, s)))
    }

    /// Satellites of the current snapshot.
    pub fn satellites(&self) -> impl Iterator<Item = (NodeId, &LeoSatellite)> + '_ {
        self.graph
            .node_weights()
            .filter(|n| n.kind == NodeKind::LeoSatellite)
            .filter_map(|n| self.sats.get(&n.id).map(|s| (n.id, s)))
    }

    /// A ground station by id.
    pub fn station(&self, id: NodeId) -> Option<&GroundStation> {
        self.stations.get(&id)
    }

    /// A satellite by id.
    pub fn satellite(&self, id: NodeId) -> Option<&LeoSatellite> {
        self.sats.get(&id)
    }

    /// The event queue.
    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }

    /// Mutable access to the event queue, e.g. to inject events.
    pub fn queue_mut(&mut self) -> &mut EventQueue {
        &mut self.queue
    }

    /// The shared routing context.
    pub fn routing(&self) -> &RoutingContext {
        &self.routing
    }

    // ********************
    // * Counters         *
    // ********************

    /// Total packets emitted by the generators of the current snapshot.
    pub fn total_packets_sent(&self) -> u64 {
        self.stations().map(|(_, s)| s.total_sent()).sum()
    }

    /// Total packets delivered to the sinks of the current snapshot.
    pub fn total_packets_delivered(&self) -> u64 {
        self.stations().map(|(_, s)| s.sink.total_received()).sum()
    }

    /// Total packets dropped for routing issues.
    pub fn total_routing_drops(&self) -> u64 {
        self.satellites().map(|(_, s)| s.routing_issues_drops).sum()
    }

    /// Total packets dropped on full output queues.
    pub fn total_buffer_drops(&self) -> u64 {
        self.satellites().map(|(_, s)| s.port_drop()).sum()
    }

    /// Average per-port buffer occupation in packets, averaged over the
    /// satellites of the current snapshot.
    pub fn average_buffer_occupation(&self) -> f64 {
        let mut count = 0usize;
        let mut sum = 0.0;
        for (_, sat) in self.satellites() {
            sum += sat.buffer_occupation(self.params.packet_size);
            count += 1;
        }
        if count == 0 {
            0.0
        } else {
            sum / count as f64
        }
    }
}
