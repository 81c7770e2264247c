//! Random roaming with opportunistic same-link matching.
//!
//! Idle vehicles wander to uniformly random links along explicit fastest
//! routes. A vehicle that happens to stand on a waiting request's origin link
//! takes that request on the spot. Link travel times are periodically replaced
//! with live values from the simulator.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::clock::Period;
use crate::config::RoamingConfig;
use crate::error::{DispatchError, Result};
use crate::fleet::{FleetState, VehicleStatus};
use crate::ids::{LinkId, RequestId, VehicleId};
use crate::network::NetworkIndex;
use crate::protocol::{trip_stops, Assignment, Stop, TravelTimeResponse};
use crate::routing::Router;

#[derive(Debug)]
pub struct RoamingPolicy {
    diversion: Period,
    refresh: Period,
    router: Router,
    stop_duration: f64,
    rng: StdRng,
}

impl RoamingPolicy {
    pub fn new(config: RoamingConfig, stop_duration: f64, seed: u64) -> Self {
        Self {
            diversion: Period::from_secs(config.interval_secs),
            refresh: Period::from_secs(config.travel_time_refresh_secs),
            router: Router::default(),
            stop_duration,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn diversion_due(&self, time: f64) -> bool {
        self.diversion.is_due(time)
    }

    pub fn refresh_due(&self, time: f64) -> bool {
        self.refresh.is_due(time)
    }

    /// Pair each idle, active vehicle with the first unassigned request whose
    /// origin is the vehicle's current link. Runs every tick.
    pub fn match_on_same_link(
        &mut self,
        fleet: &mut FleetState,
        assignment: &mut Assignment,
    ) -> Result<Vec<(RequestId, VehicleId)>> {
        let mut waiting: Vec<(RequestId, LinkId)> = fleet
            .requests()
            .filter(|r| !r.onboard && r.vehicle().is_none())
            .map(|r| (r.id.clone(), r.origin_link.clone()))
            .collect();
        let candidates: Vec<(VehicleId, LinkId)> = fleet
            .idle_vehicles()
            .filter(|v| v.status != VehicleStatus::Inactive)
            .map(|v| (v.id.clone(), v.current_link.clone()))
            .collect();

        let mut matched = Vec::new();
        for (vehicle, link) in candidates {
            let Some(position) = waiting.iter().position(|(_, origin)| *origin == link) else {
                continue;
            };
            let (request, origin) = waiting.remove(position);
            fleet.link(&request, &vehicle)?;

            let destination = fleet
                .request(&request)
                .map(|r| r.destination_link.clone())
                .ok_or_else(|| DispatchError::UnknownRequest(request.clone()))?;
            assignment.set_stops(
                vehicle.clone(),
                trip_stops(&request, &origin, &destination, self.stop_duration),
            );
            tracing::debug!(%request, %vehicle, link = %origin, "same-link match");
            matched.push((request, vehicle));
        }
        Ok(matched)
    }

    /// Send every idle, active vehicle towards a uniformly random link along
    /// the fastest route from its diversion point. Returns the number of
    /// vehicles diverted.
    pub fn divert(
        &mut self,
        fleet: &FleetState,
        network: &NetworkIndex,
        assignment: &mut Assignment,
    ) -> Result<usize> {
        let link_count = network.link_count();
        if link_count == 0 {
            return Ok(0);
        }

        let mut diverted = 0;
        for vehicle in fleet
            .idle_vehicles()
            .filter(|v| v.status != VehicleStatus::Inactive)
        {
            let target = self.rng.gen_range(0..link_count);
            let from = network.link_index(&vehicle.diversion_link)?;
            let Some(route) = self.router.diversion_route(network, from, target) else {
                tracing::warn!(
                    vehicle = %vehicle.id,
                    from = %vehicle.diversion_link,
                    to = %network.link(target).id,
                    "no route to diversion target, vehicle skipped"
                );
                continue;
            };
            assignment.set_stops(
                vehicle.id.clone(),
                vec![Stop::routed(network.link(target).id.clone(), route)],
            );
            diverted += 1;
        }
        Ok(diverted)
    }

    /// Overwrite link travel times with live measurements and drop cached
    /// paths. An unknown link or an invalid duration fails the whole update
    /// before anything changes.
    pub fn apply_travel_times(
        &mut self,
        network: &mut NetworkIndex,
        response: &TravelTimeResponse,
    ) -> Result<usize> {
        for (link, &secs) in &response.travel_times {
            network.check_travel_time(link, secs)?;
        }
        for (link, &secs) in &response.travel_times {
            network.set_travel_time(link, secs)?;
        }
        self.router.invalidate();
        tracing::info!(links = response.travel_times.len(), "travel times refreshed");
        Ok(response.travel_times.len())
    }
}
