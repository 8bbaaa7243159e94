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

//! Topology and traffic-matrix documents, and the services providing them.
//!
//! The constellation topology is consumed as node-link JSON (the
//! `networkx_obj` member of the topology-builder response); the traffic
//! matrix is a nested `src -> dst -> bytes/s` mapping. Both are fetched over
//! HTTP through the [`SnapshotSource`] seam, so tests and offline runs can
//! substitute in-memory documents.

use std::{collections::HashMap, path::Path};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{FetchError, NodeKind};

/// Node entry of the node-link document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopoNode {
    /// Node name; the stable key of the node.
    pub id: String,
    /// Node type tag.
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Orbital plane number (satellites only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plane: Option<u32>,
    /// Position within the orbital plane (satellites only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_in_plane: Option<u32>,
}

/// Link entry of the node-link document. Links are undirected; the network
/// builder materializes both directions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopoLink {
    /// Name of one endpoint.
    pub source: String,
    /// Name of the other endpoint.
    pub target: String,
    /// Length of the link in kilometers.
    #[serde(rename = "length")]
    pub length_km: f64,
}

/// The node-link payload found under `networkx_obj`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyDoc {
    /// All nodes of the constellation and the ground segment.
    pub nodes: Vec<TopoNode>,
    /// All undirected links.
    pub links: Vec<TopoLink>,
}

/// Envelope of the topology-builder response.
#[derive(Debug, Deserialize)]
struct TopologyEnvelope {
    networkx_obj: TopologyDoc,
}

impl TopologyDoc {
    /// Parse a full topology-builder response (the envelope carrying
    /// `networkx_obj`).
    pub fn from_response_str(body: &str) -> Result<Self, FetchError> {
        let envelope: TopologyEnvelope = serde_json::from_str(body)?;
        Ok(envelope.networkx_obj)
    }

    /// Read a saved topology-builder response from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FetchError> {
        let body = std::fs::read_to_string(path)?;
        Self::from_response_str(&body)
    }
}

/// Offered traffic per (src, dst) station pair in bytes per second.
///
/// Entries with `src == dst` may be present in the service response; they
/// are never looked up.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrafficMatrix(pub HashMap<String, HashMap<String, f64>>);

impl TrafficMatrix {
    /// Offered volume from `src` to `dst` in bytes per second.
    pub fn rate(&self, src: &str, dst: &str) -> Option<f64> {
        self.0.get(src).and_then(|row| row.get(dst)).copied()
    }
}

/// Provider of the two service documents the snapshot loop consumes.
pub trait SnapshotSource {
    /// Fetch the traffic matrix. Called once at simulation start.
    fn traffic_matrix(
        &mut self,
        total_volume: f64,
        cities: &[String],
    ) -> Result<TrafficMatrix, FetchError>;

    /// Fetch the constellation topology for the wall-clock instant `t`.
    fn topology_at(
        &mut self,
        t: DateTime<Utc>,
        cities: &[String],
    ) -> Result<TopologyDoc, FetchError>;
}

/// HTTP implementation against the topology-builder and traffic-matrix
/// services.
#[derive(Debug)]
pub struct HttpSource {
    client: reqwest::blocking::Client,
    topology_url: String,
    traffic_url: String,
}

impl HttpSource {
    /// New source against the given service endpoints.
    pub fn new(topology_url: impl Into<String>, traffic_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            topology_url: topology_url.into(),
            traffic_url: traffic_url.into(),
        }
    }
}

impl SnapshotSource for HttpSource {
    fn traffic_matrix(
        &mut self,
        total_volume: f64,
        cities: &[String],
    ) -> Result<TrafficMatrix, FetchError> {
        let url = format!(
            "{}?total_volume_of_traffic={}&cities={}",
            self.traffic_url,
            total_volume,
            cities.join(",")
        );
        Ok(self
            .client
            .get(url)
            .send()?
            .error_for_status()?
            .json::<TrafficMatrix>()?)
    }

    fn topology_at(
        &mut self,
        t: DateTime<Utc>,
        cities: &[String],
    ) -> Result<TopologyDoc, FetchError> {
        let stamp = t
            .format("%Y-%m-%d %H:%M:%S %z")
            .to_string()
            .replace('+', "%2B");
        let url = format!(
            "{}?t={}&cities={}",
            self.topology_url,
            stamp,
            cities.join(",")
        );
        let body = self.client.get(url).send()?.error_for_status()?.text()?;
        TopologyDoc::from_response_str(&body)
    }
}
