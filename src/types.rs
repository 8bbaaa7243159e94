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

//! Module containing all type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable identifier of a node (ground station or LEO satellite).
///
/// Ids are interned from the node name the first time a name appears in a
/// topology document, and remain valid for the entire simulation, across
/// every snapshot rebuild. Events and source-routing headers reference nodes
/// only through their id.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for NodeId {
    fn from(x: u32) -> Self {
        Self(x)
    }
}

impl From<usize> for NodeId {
    fn from(x: usize) -> Self {
        Self(x as u32)
    }
}

/// A traffic flow between two ground stations. Sinks count deliveries per
/// flow.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FlowId {
    /// Emitting ground station.
    pub src: NodeId,
    /// Receiving ground station.
    pub dst: NodeId,
}

impl std::fmt::Display for FlowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}->{}", self.src, self.dst)
    }
}

/// Kind of a node in the constellation topology.
///
/// The serialized names follow the tags emitted by the topology-builder
/// service (including its spelling of `GROUD_STATION`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// A fixed terrestrial endpoint.
    #[serde(rename = "GROUD_STATION")]
    GroundStation,
    /// An orbiting packet switch.
    #[serde(rename = "LEO_SATELLITE")]
    LeoSatellite,
}

/// Where the far end of a wire terminates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Endpoint {
    /// The store of a satellite.
    Satellite(NodeId),
    /// The packet sink of a ground station.
    Station(NodeId),
}

impl Endpoint {
    /// The node behind this endpoint.
    pub fn node(&self) -> NodeId {
        match self {
            Endpoint::Satellite(id) | Endpoint::Station(id) => *id,
        }
    }
}

/// Scheduler errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    /// `run_until` was called with a horizon lying in the simulated past.
    #[error("cannot run until {horizon}: simulated time is already at {now}")]
    HorizonExceeded {
        /// Current simulated time in seconds.
        now: f64,
        /// Requested horizon in seconds.
        horizon: f64,
    },
}

/// Errors while assembling a network from a topology document.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NetworkError {
    /// A link references a node that does not appear in the node list.
    #[error("link references unknown node {0}")]
    UnknownNode(String),
    /// A ground station has no adjacent satellite to uplink through.
    #[error("ground station {0} has no upstream satellite")]
    MissingUplink(String),
    /// The traffic matrix lacks an entry for a pair of ground stations.
    #[error("traffic matrix has no entry for {src} -> {dst}")]
    MissingTrafficEntry {
        /// Emitting ground station name.
        src: String,
        /// Receiving ground station name.
        dst: String,
    },
}

/// Errors while talking to the topology or traffic-matrix services.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The HTTP transaction itself failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The service answered with a document we cannot understand.
    #[error("malformed topology document: {0}")]
    MalformedDocument(#[from] serde_json::Error),
    /// A topology file could not be read from disk.
    #[error("cannot read topology file: {0}")]
    Io(#[from] std::io::Error),
}

/// Invalid run configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The end of the time window lies before its start.
    #[error("invalid time window: end {end} lies before start {start}")]
    InvalidTimeWindow {
        /// Start of the window.
        start: DateTime<Utc>,
        /// End of the window.
        end: DateTime<Utc>,
    },
    /// The snapshot duration must be strictly positive.
    #[error("snapshot duration must be positive, got {0} s")]
    InvalidSnapshotDuration(i64),
    /// At least one city is needed to place ground stations.
    #[error("the cities list must not be empty")]
    EmptyCities,
}

/// Top-level simulator error.
#[derive(Error, Debug)]
pub enum Error {
    /// Scheduler misuse.
    #[error("simulation error: {0}")]
    Sim(#[from] SimError),
    /// Topology or network assembly failed.
    #[error("network error: {0}")]
    Network(#[from] NetworkError),
    /// A service interaction failed.
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),
    /// Invalid run configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
