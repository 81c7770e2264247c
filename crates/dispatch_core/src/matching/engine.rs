//! Control-interval matching: eligibility, cost matrix, strategy and commit.

use ndarray::Array2;

use crate::error::{DispatchError, Result};
use crate::fleet::FleetState;
use crate::ids::{RequestId, VehicleId};
use crate::network::Coord;
use crate::protocol::{trip_stops, Assignment};

use super::algorithm::MatchingStrategy;
use super::MatchingStrategyKind;

/// Euclidean distance from every vehicle location (columns) to every request
/// origin (rows).
pub fn cost_matrix(origins: &[Coord], locations: &[Coord]) -> Array2<f64> {
    Array2::from_shape_fn((origins.len(), locations.len()), |(r, v)| {
        locations[v].distance(origins[r])
    })
}

#[derive(Debug)]
pub struct MatchingEngine {
    strategy: Box<dyn MatchingStrategy>,
    stop_duration: f64,
}

impl MatchingEngine {
    pub fn new(strategy: Box<dyn MatchingStrategy>, stop_duration: f64) -> Self {
        Self {
            strategy,
            stop_duration,
        }
    }

    pub fn from_kind(kind: MatchingStrategyKind, stop_duration: f64) -> Self {
        Self::new(kind.build(), stop_duration)
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Match assignable requests to assignable vehicles and write their new
    /// schedules into `assignment`.
    ///
    /// Every assignable vehicle gets an explicit schedule: a pickup/dropoff pair
    /// when matched, an empty list otherwise. Nothing happens when either side
    /// is empty. Returns the committed pairs.
    pub fn run(
        &self,
        fleet: &mut FleetState,
        assignment: &mut Assignment,
    ) -> Result<Vec<(RequestId, VehicleId)>> {
        let (request_ids, origins): (Vec<RequestId>, Vec<Coord>) = fleet
            .assignable_requests()
            .into_iter()
            .map(|r| (r.id.clone(), r.origin))
            .unzip();
        let (vehicle_ids, locations): (Vec<VehicleId>, Vec<Coord>) = fleet
            .assignable_vehicles()
            .into_iter()
            .map(|v| (v.id.clone(), v.location))
            .unzip();

        if request_ids.is_empty() || vehicle_ids.is_empty() {
            return Ok(Vec::new());
        }

        let costs = cost_matrix(&origins, &locations);
        let pairs = self.strategy.assign(costs.view());

        for vehicle in &vehicle_ids {
            assignment.clear_schedule(vehicle.clone());
        }

        let mut committed = Vec::with_capacity(pairs.len());
        for pair in pairs {
            let request = &request_ids[pair.row];
            let vehicle = &vehicle_ids[pair.col];
            fleet.link(request, vehicle)?;

            let entry = fleet
                .request(request)
                .ok_or_else(|| DispatchError::UnknownRequest(request.clone()))?;
            assignment.set_stops(
                vehicle.clone(),
                trip_stops(
                    request,
                    &entry.origin_link,
                    &entry.destination_link,
                    self.stop_duration,
                ),
            );
            committed.push((request.clone(), vehicle.clone()));
        }

        tracing::debug!(
            strategy = self.strategy.name(),
            requests = request_ids.len(),
            vehicles = vehicle_ids.len(),
            matched = committed.len(),
            "matching round"
        );
        Ok(committed)
    }
}
