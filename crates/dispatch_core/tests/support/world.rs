#![allow(dead_code)]

use dispatch_core::test_helpers::grid_network;
use dispatch_core::{Dispatcher, DispatcherConfig, NetworkIndex};

/// Builder for reproducible dispatchers on a square grid network.
#[derive(Clone, Debug)]
pub struct TestDispatcherBuilder {
    pub cols: usize,
    pub rows: usize,
    pub spacing: f64,
    pub config: DispatcherConfig,
}

impl Default for TestDispatcherBuilder {
    fn default() -> Self {
        Self {
            cols: 4,
            rows: 4,
            spacing: 100.0,
            config: DispatcherConfig::default().with_seed(42),
        }
    }
}

impl TestDispatcherBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_grid(mut self, cols: usize, rows: usize, spacing: f64) -> Self {
        self.cols = cols;
        self.rows = rows;
        self.spacing = spacing;
        self
    }

    pub fn with_config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    pub fn network(&self) -> NetworkIndex {
        grid_network(self.cols, self.rows, self.spacing)
    }

    pub fn build(self) -> Dispatcher {
        Dispatcher::new(self.network(), self.config).expect("valid dispatcher")
    }
}
