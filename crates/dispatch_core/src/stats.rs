//! Per-iteration counters reported at every control interval.

use serde::Serialize;

use crate::fleet::FleetState;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatisticsSnapshot {
    pub pending: usize,
    pub onboard: usize,
    pub done: usize,
    pub rejected: usize,
    /// Vehicles without a request.
    pub idle: usize,
    /// Vehicles heading to or carrying a request.
    pub assigned: usize,
}

impl StatisticsSnapshot {
    pub fn capture(fleet: &FleetState) -> Self {
        let counters = fleet.statistics();
        let idle = fleet.idle_vehicles().count();
        Self {
            pending: counters.pending,
            onboard: counters.onboard,
            done: counters.done,
            rejected: counters.rejected,
            idle,
            assigned: fleet.vehicle_count() - idle,
        }
    }

    pub fn log(&self, time: f64) {
        tracing::info!(
            time,
            pending = self.pending,
            onboard = self.onboard,
            done = self.done,
            rejected = self.rejected,
            idle = self.idle,
            assigned = self.assigned,
            "statistics"
        );
    }
}
