//! Shortest-path routing over the link graph by current travel time.
//!
//! Edge costs are integer milliseconds so that `pathfinding::dijkstra` can run
//! on an `Ord` cost type. Paths are cached per node pair until the next
//! travel-time refresh.

use std::num::NonZeroUsize;

use lru::LruCache;
use pathfinding::prelude::dijkstra;

use crate::ids::LinkId;
use crate::network::NetworkIndex;

/// Default number of node-pair paths kept between refreshes.
pub const DEFAULT_PATH_CACHE_SIZE: usize = 5_000;

#[derive(Debug)]
pub struct Router {
    /// Link indices of the fastest path per (from node, to node).
    cache: LruCache<(usize, usize), Vec<usize>>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(DEFAULT_PATH_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN))
    }
}

impl Router {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            cache: LruCache::new(capacity),
        }
    }

    /// Drop every cached path. Must be called after edge weights change.
    pub fn invalidate(&mut self) {
        self.cache.clear();
    }

    pub fn cached_paths(&self) -> usize {
        self.cache.len()
    }

    /// Fastest sequence of link indices from node `from` to node `to`.
    ///
    /// Returns an empty path when `from == to` and `None` when `to` is
    /// unreachable. Only successful searches are cached.
    pub fn shortest_links(&mut self, network: &NetworkIndex, from: usize, to: usize) -> Option<Vec<usize>> {
        if let Some(path) = self.cache.get(&(from, to)) {
            return Some(path.clone());
        }

        let (nodes, _cost_ms) = dijkstra(
            &from,
            |&node| {
                network
                    .outgoing(node)
                    .iter()
                    .map(|&link| (network.link(link).to, network.link(link).travel_time_ms()))
                    .collect::<Vec<_>>()
            },
            |&node| node == to,
        )?;

        let links: Vec<usize> = nodes
            .windows(2)
            .map(|pair| fastest_link_between(network, pair[0], pair[1]))
            .collect::<Option<_>>()?;
        self.cache.put((from, to), links.clone());
        Some(links)
    }

    /// Explicit route from the diversion link to `target`, both included.
    ///
    /// The path in between starts at the diversion link's end node and stops at
    /// the target's start node. A target equal to the diversion link yields the
    /// single-link route `[target]`.
    pub fn diversion_route(
        &mut self,
        network: &NetworkIndex,
        diversion: usize,
        target: usize,
    ) -> Option<Vec<LinkId>> {
        if diversion == target {
            return Some(vec![network.link(target).id.clone()]);
        }
        let inner = self.shortest_links(network, network.link(diversion).to, network.link(target).from)?;

        let mut route = Vec::with_capacity(inner.len() + 2);
        route.push(network.link(diversion).id.clone());
        route.extend(inner.into_iter().map(|link| network.link(link).id.clone()));
        route.push(network.link(target).id.clone());
        Some(route)
    }
}

/// Cheapest of possibly parallel links from `from` to `to`; first in load order on ties.
fn fastest_link_between(network: &NetworkIndex, from: usize, to: usize) -> Option<usize> {
    network
        .outgoing(from)
        .iter()
        .copied()
        .filter(|&link| network.link(link).to == to)
        .min_by_key(|&link| network.link(link).travel_time_ms())
}
