//! Rectangular zoning of the network for the relocation state space.
//!
//! Cells are laid out row-major from the lower-left corner of the link extent
//! and numbered in that order after empty cells are pruned, so zone ids are
//! dense in `0..len()`.

use crate::error::{DispatchError, Result};
use crate::network::NetworkIndex;

/// Largest grid, counted before empty cells are pruned.
pub const MAX_GRID_CELLS: usize = 1 << 20;

#[derive(Debug, Clone)]
pub struct ZonePartition {
    cell_size: f64,
    zones: Vec<Vec<usize>>,
    zone_of_link: Vec<usize>,
}

impl ZonePartition {
    pub fn new(network: &NetworkIndex, cell_size: f64) -> Result<Self> {
        if !(cell_size > 0.0) || !cell_size.is_finite() {
            return Err(DispatchError::InvalidConfig(format!(
                "zone cell size must be positive, got {cell_size}"
            )));
        }
        let extent = network.extent().ok_or_else(|| {
            DispatchError::InvalidTopology("cannot zone a network without links".into())
        })?;

        let width = (((extent.max_x - extent.min_x) / cell_size).ceil() as usize).max(1);
        let height = (((extent.max_y - extent.min_y) / cell_size).ceil() as usize).max(1);
        let cell_count = width
            .checked_mul(height)
            .filter(|&count| count <= MAX_GRID_CELLS)
            .ok_or_else(|| {
                DispatchError::InvalidConfig(format!(
                    "zone size {cell_size} splits the network into more than {MAX_GRID_CELLS} cells"
                ))
            })?;

        let mut cells: Vec<Vec<usize>> = vec![Vec::new(); cell_count];
        for (index, link) in network.links().iter().enumerate() {
            // Links on the max edge land exactly on `width`/`height`; clamp them in.
            let x = (((link.coord.x - extent.min_x) / cell_size).floor() as usize).min(width - 1);
            let y = (((link.coord.y - extent.min_y) / cell_size).floor() as usize).min(height - 1);
            cells[x + width * y].push(index);
        }

        let zones: Vec<Vec<usize>> = cells.into_iter().filter(|links| !links.is_empty()).collect();
        let mut zone_of_link = vec![0; network.link_count()];
        for (zone, links) in zones.iter().enumerate() {
            for &link in links {
                zone_of_link[link] = zone;
            }
        }

        Ok(Self {
            cell_size,
            zones,
            zone_of_link,
        })
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn zone_of(&self, link: usize) -> usize {
        self.zone_of_link[link]
    }

    /// Member link indices of `zone`; never empty.
    pub fn links_in(&self, zone: usize) -> &[usize] {
        &self.zones[zone]
    }
}
