//! Static network lookup: link coordinates and the travel-time weighted graph.
//!
//! The topology is loaded once. Links are addressed internally by their index
//! in load order; [`LinkId`]s only appear at the message boundary. The only
//! mutation after construction is [`NetworkIndex::set_travel_time`], used by
//! the roaming policy's periodic refresh.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, Result};
use crate::ids::LinkId;

/// Planar coordinate in the network's projected reference system.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn midpoint(self, other: Coord) -> Coord {
        Coord::new(0.5 * (self.x + other.x), 0.5 * (self.y + other.y))
    }

    pub fn distance(self, other: Coord) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Bounding box of all link coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkSpec {
    pub id: LinkId,
    pub from: String,
    pub to: String,
    /// Length in metres.
    pub length: f64,
    /// Free-flow speed in metres per second.
    pub freespeed: f64,
}

/// Static topology description as read from disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Topology {
    pub nodes: Vec<NodeSpec>,
    pub links: Vec<LinkSpec>,
}

impl Topology {
    /// Read a JSON topology document.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[derive(Debug, Clone)]
pub struct Link {
    pub id: LinkId,
    pub from: usize,
    pub to: usize,
    /// Representative location: midpoint of the end nodes.
    pub coord: Coord,
    pub travel_time_secs: f64,
}

impl Link {
    /// Travel time as an integer edge cost for shortest-path search.
    pub fn travel_time_ms(&self) -> u64 {
        (self.travel_time_secs * 1_000.0).round().max(0.0) as u64
    }
}

#[derive(Debug, Clone)]
pub struct NetworkIndex {
    node_ids: Vec<String>,
    nodes: Vec<Coord>,
    links: Vec<Link>,
    link_lookup: HashMap<LinkId, usize>,
    outgoing: Vec<Vec<usize>>,
}

impl NetworkIndex {
    pub fn from_topology(topology: &Topology) -> Result<Self> {
        let mut node_lookup: HashMap<&str, usize> = HashMap::with_capacity(topology.nodes.len());
        let mut node_ids = Vec::with_capacity(topology.nodes.len());
        let mut nodes = Vec::with_capacity(topology.nodes.len());

        for node in &topology.nodes {
            if !node.x.is_finite() || !node.y.is_finite() {
                return Err(DispatchError::InvalidTopology(format!(
                    "node `{}` has a non-finite coordinate",
                    node.id
                )));
            }
            if node_lookup.insert(node.id.as_str(), nodes.len()).is_some() {
                return Err(DispatchError::DuplicateId {
                    kind: "node",
                    id: node.id.clone(),
                });
            }
            node_ids.push(node.id.clone());
            nodes.push(Coord::new(node.x, node.y));
        }

        let mut links = Vec::with_capacity(topology.links.len());
        let mut link_lookup = HashMap::with_capacity(topology.links.len());
        let mut outgoing = vec![Vec::new(); nodes.len()];

        for spec in &topology.links {
            let from = *node_lookup
                .get(spec.from.as_str())
                .ok_or_else(|| DispatchError::UnknownNode(spec.from.clone()))?;
            let to = *node_lookup
                .get(spec.to.as_str())
                .ok_or_else(|| DispatchError::UnknownNode(spec.to.clone()))?;
            if !(spec.freespeed > 0.0) || !(spec.length >= 0.0) {
                return Err(DispatchError::InvalidTopology(format!(
                    "link `{}` needs a positive freespeed and non-negative length",
                    spec.id
                )));
            }
            if link_lookup.insert(spec.id.clone(), links.len()).is_some() {
                return Err(DispatchError::DuplicateId {
                    kind: "link",
                    id: spec.id.to_string(),
                });
            }

            outgoing[from].push(links.len());
            links.push(Link {
                id: spec.id.clone(),
                from,
                to,
                coord: nodes[from].midpoint(nodes[to]),
                travel_time_secs: spec.length / spec.freespeed,
            });
        }

        Ok(Self {
            node_ids,
            nodes,
            links,
            link_lookup,
            outgoing,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_topology(&Topology::load(path)?)
    }

    pub fn link_index(&self, id: &LinkId) -> Result<usize> {
        self.link_lookup
            .get(id)
            .copied()
            .ok_or_else(|| DispatchError::UnknownLink(id.clone()))
    }

    pub fn link(&self, index: usize) -> &Link {
        &self.links[index]
    }

    pub fn link_coord(&self, id: &LinkId) -> Result<Coord> {
        Ok(self.links[self.link_index(id)?].coord)
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_id(&self, node: usize) -> &str {
        &self.node_ids[node]
    }

    /// Links leaving `node`, in load order.
    pub fn outgoing(&self, node: usize) -> &[usize] {
        &self.outgoing[node]
    }

    pub fn extent(&self) -> Option<Extent> {
        let first = self.links.first()?.coord;
        let init = Extent {
            min_x: first.x,
            max_x: first.x,
            min_y: first.y,
            max_y: first.y,
        };
        Some(self.links.iter().fold(init, |acc, link| Extent {
            min_x: acc.min_x.min(link.coord.x),
            max_x: acc.max_x.max(link.coord.x),
            min_y: acc.min_y.min(link.coord.y),
            max_y: acc.max_y.max(link.coord.y),
        }))
    }

    /// Overwrite the travel time of one link with a live measurement.
    /// Index of `id` if `travel_time_secs` could be stored for it.
    pub fn check_travel_time(&self, id: &LinkId, travel_time_secs: f64) -> Result<usize> {
        let index = self.link_index(id)?;
        if !travel_time_secs.is_finite() || travel_time_secs < 0.0 {
            return Err(DispatchError::Protocol(format!(
                "travel time {travel_time_secs} for link `{id}` is not a valid duration"
            )));
        }
        Ok(index)
    }

    pub fn set_travel_time(&mut self, id: &LinkId, travel_time_secs: f64) -> Result<()> {
        let index = self.check_travel_time(id, travel_time_secs)?;
        self.links[index].travel_time_secs = travel_time_secs;
        Ok(())
    }
}
