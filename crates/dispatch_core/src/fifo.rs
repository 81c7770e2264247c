//! First-come first-served baseline.
//!
//! Requests are served in submission order by vehicles in the order they
//! became free: roster order at the start of an iteration, then dropoff
//! order. No costs are computed and stops carry no route.

use std::collections::VecDeque;

use crate::error::{DispatchError, Result};
use crate::fleet::FleetState;
use crate::ids::{RequestId, VehicleId};
use crate::protocol::{trip_stops, Assignment, RosterVehicle, StateMessage};

#[derive(Debug)]
pub struct FifoPolicy {
    waiting: VecDeque<RequestId>,
    free: VecDeque<VehicleId>,
    stop_duration: f64,
}

impl FifoPolicy {
    pub fn new(stop_duration: f64) -> Self {
        Self {
            waiting: VecDeque::new(),
            free: VecDeque::new(),
            stop_duration,
        }
    }

    pub fn reset(&mut self, roster: &[RosterVehicle]) {
        self.waiting.clear();
        self.free = roster.iter().map(|v| v.id.clone()).collect();
    }

    /// Queue new submissions and vehicles that just dropped off.
    pub fn observe(&mut self, state: &StateMessage) {
        self.waiting
            .extend(state.submitted.iter().map(|request| request.id.clone()));
        for vehicle in state.dropped_off.values() {
            self.release(vehicle.clone());
        }
    }

    /// Put a vehicle back at the end of the free queue.
    pub fn release(&mut self, vehicle: VehicleId) {
        if !self.free.contains(&vehicle) {
            self.free.push_back(vehicle);
        }
    }

    pub fn waiting_len(&self) -> usize {
        self.waiting.len()
    }

    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    /// Pair queue heads until either queue runs dry.
    ///
    /// Requests that were rejected or picked up elsewhere and vehicles that
    /// took work through another path leave their queues first.
    pub fn assign(
        &mut self,
        fleet: &mut FleetState,
        assignment: &mut Assignment,
    ) -> Result<Vec<(RequestId, VehicleId)>> {
        self.waiting.retain(|id| {
            fleet
                .request(id)
                .is_some_and(|r| !r.onboard && r.vehicle().is_none())
        });
        self.free.retain(|id| {
            fleet
                .vehicle(id)
                .is_some_and(|v| v.is_idle() && !v.occupied)
        });

        let mut paired = Vec::new();
        while !self.waiting.is_empty() && !self.free.is_empty() {
            let (Some(request), Some(vehicle)) = (self.waiting.pop_front(), self.free.pop_front())
            else {
                break;
            };
            fleet.link(&request, &vehicle)?;

            let (origin, destination) = fleet
                .request(&request)
                .map(|r| (r.origin_link.clone(), r.destination_link.clone()))
                .ok_or_else(|| DispatchError::UnknownRequest(request.clone()))?;
            assignment.set_stops(
                vehicle.clone(),
                trip_stops(&request, &origin, &destination, self.stop_duration),
            );
            tracing::debug!(%request, %vehicle, "fifo pairing");
            paired.push((request, vehicle));
        }

        tracing::debug!(
            waiting = self.waiting.len(),
            free = self.free.len(),
            paired = paired.len(),
            "fifo round"
        );
        Ok(paired)
    }
}
