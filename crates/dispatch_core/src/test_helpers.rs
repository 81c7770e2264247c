//! Test helpers for common test setup and utilities.
//!
//! Fixtures are built on a square grid network: node `"c_r"` sits at
//! `(c * spacing, r * spacing)` and every pair of horizontal or vertical
//! neighbors is joined by two directed links named `"from-to"`.

use crate::fleet::VehicleStatus;
use crate::ids::{LinkId, RequestId, VehicleId};
use crate::network::{LinkSpec, NetworkIndex, NodeSpec, Topology};
use crate::protocol::{RosterVehicle, SubmittedRequest, VehicleSnapshot};

/// Free-flow speed of every grid link, in metres per second.
pub const GRID_FREESPEED: f64 = 10.0;

fn node_name(col: usize, row: usize) -> String {
    format!("{col}_{row}")
}

/// Id of the directed grid link from node `(c1, r1)` to node `(c2, r2)`.
pub fn grid_link(c1: usize, r1: usize, c2: usize, r2: usize) -> LinkId {
    LinkId::new(format!("{}-{}", node_name(c1, r1), node_name(c2, r2)))
}

pub fn grid_topology(cols: usize, rows: usize, spacing: f64) -> Topology {
    let mut topology = Topology::default();
    for row in 0..rows {
        for col in 0..cols {
            topology.nodes.push(NodeSpec {
                id: node_name(col, row),
                x: col as f64 * spacing,
                y: row as f64 * spacing,
            });
        }
    }

    let mut connect = |a: (usize, usize), b: (usize, usize)| {
        for (from, to) in [(a, b), (b, a)] {
            topology.links.push(LinkSpec {
                id: grid_link(from.0, from.1, to.0, to.1),
                from: node_name(from.0, from.1),
                to: node_name(to.0, to.1),
                length: spacing,
                freespeed: GRID_FREESPEED,
            });
        }
    };
    for row in 0..rows {
        for col in 0..cols {
            if col + 1 < cols {
                connect((col, row), (col + 1, row));
            }
            if row + 1 < rows {
                connect((col, row), (col, row + 1));
            }
        }
    }
    topology
}

/// # Panics
///
/// Panics if the generated topology is invalid (never for `cols, rows >= 1`).
pub fn grid_network(cols: usize, rows: usize, spacing: f64) -> NetworkIndex {
    NetworkIndex::from_topology(&grid_topology(cols, rows, spacing))
        .expect("grid topology should always be valid")
}

pub fn roster(vehicles: &[(&str, LinkId)]) -> Vec<RosterVehicle> {
    vehicles
        .iter()
        .map(|(id, link)| RosterVehicle {
            id: VehicleId::from(*id),
            start_link: link.clone(),
            capacity: 4,
        })
        .collect()
}

/// A request submitted at time zero with the given pickup deadline.
pub fn submitted(
    id: &str,
    origin: LinkId,
    destination: LinkId,
    latest_pickup_time: f64,
) -> SubmittedRequest {
    SubmittedRequest {
        id: RequestId::from(id),
        origin_link: origin,
        destination_link: destination,
        earliest_pickup_time: 0.0,
        latest_pickup_time,
        latest_arrival_time: f64::INFINITY,
    }
}

pub fn snapshot(id: &str, link: LinkId, state: VehicleStatus) -> VehicleSnapshot {
    VehicleSnapshot {
        id: VehicleId::from(id),
        current_link: link,
        current_exit_time: f64::NEG_INFINITY,
        diverge_link: None,
        diverge_time: f64::NEG_INFINITY,
        state,
    }
}
