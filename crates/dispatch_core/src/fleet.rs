//! Per-iteration fleet and request state.
//!
//! [`FleetState`] is the only owner of vehicles and requests. The link between
//! a vehicle and the request it serves is stored on both sides, and both sides
//! are only ever written together through [`FleetState::link`] and
//! [`FleetState::unlink_request`].

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, Result};
use crate::ids::{LinkId, RequestId, VehicleId};
use crate::network::{Coord, NetworkIndex};
use crate::protocol::{RosterVehicle, StateMessage, SubmittedRequest, VehicleSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleStatus {
    Stay,
    Drive,
    Stop,
    /// Not yet reported by the simulator in this iteration.
    Inactive,
}

#[derive(Debug, Clone)]
pub struct Vehicle {
    pub id: VehicleId,
    pub location: Coord,
    pub current_link: LinkId,
    /// Link from which the currently staged route continues.
    pub diversion_link: LinkId,
    pub occupied: bool,
    pub status: VehicleStatus,
    pub capacity: u32,
    /// Simulation time of the last snapshot applied to this vehicle.
    pub last_update: f64,
    request: Option<RequestId>,
}

impl Vehicle {
    pub fn request(&self) -> Option<&RequestId> {
        self.request.as_ref()
    }

    pub fn is_idle(&self) -> bool {
        self.request.is_none()
    }

    /// Free to take a new assignment this round.
    pub fn is_assignable(&self) -> bool {
        !self.occupied && !(self.status == VehicleStatus::Stop && self.request.is_some())
    }
}

#[derive(Debug, Clone)]
pub struct Request {
    pub id: RequestId,
    pub origin_link: LinkId,
    pub destination_link: LinkId,
    pub origin: Coord,
    pub destination: Coord,
    pub onboard: bool,
    pub earliest_pickup_time: f64,
    pub latest_pickup_time: f64,
    pub latest_arrival_time: f64,
    vehicle: Option<VehicleId>,
}

impl Request {
    pub fn vehicle(&self) -> Option<&VehicleId> {
        self.vehicle.as_ref()
    }
}

/// Request counters for the current iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FleetStatistics {
    pub pending: usize,
    pub onboard: usize,
    pub done: usize,
    pub rejected: usize,
}

/// A request dropped because its pickup deadline passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub request: RequestId,
    /// Vehicle that was heading to the request, now released.
    pub vehicle: Option<VehicleId>,
}

/// A pickup reported by the simulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pickup {
    pub request: RequestId,
    pub vehicle: VehicleId,
}

#[derive(Debug, Clone, Default)]
pub struct FleetState {
    vehicles: BTreeMap<VehicleId, Vehicle>,
    requests: BTreeMap<RequestId, Request>,
    statistics: FleetStatistics,
}

impl FleetState {
    /// Replace all state with a fresh roster. Nothing is changed on error.
    pub fn reset(
        &mut self,
        roster: &[RosterVehicle],
        network: &NetworkIndex,
        initial_status: VehicleStatus,
    ) -> Result<()> {
        let mut vehicles = BTreeMap::new();
        for entry in roster {
            let location = network.link_coord(&entry.start_link)?;
            let vehicle = Vehicle {
                id: entry.id.clone(),
                location,
                current_link: entry.start_link.clone(),
                diversion_link: entry.start_link.clone(),
                occupied: false,
                status: initial_status,
                capacity: entry.capacity,
                last_update: 0.0,
                request: None,
            };
            if vehicles.insert(entry.id.clone(), vehicle).is_some() {
                return Err(DispatchError::DuplicateId {
                    kind: "vehicle",
                    id: entry.id.to_string(),
                });
            }
        }

        self.vehicles = vehicles;
        self.requests.clear();
        self.statistics = FleetStatistics::default();
        Ok(())
    }

    /// Apply one incremental state message: submissions, pickups, dropoffs and
    /// vehicle snapshots, in that order.
    ///
    /// Every id is checked before anything is mutated, so an out-of-sync
    /// message leaves the state untouched.
    pub fn apply_state(&mut self, state: &StateMessage, network: &NetworkIndex) -> Result<Vec<Pickup>> {
        self.validate_state(state, network)?;

        for submitted in &state.submitted {
            self.submit(submitted, network)?;
        }

        let mut pickups = Vec::with_capacity(state.picked_up.len());
        for (request, vehicle) in &state.picked_up {
            self.record_pickup(request, vehicle)?;
            pickups.push(Pickup {
                request: request.clone(),
                vehicle: vehicle.clone(),
            });
        }

        for (request, vehicle) in &state.dropped_off {
            self.record_dropoff(request, vehicle)?;
        }

        for snapshot in &state.vehicles {
            self.update_vehicle(snapshot, network, state.time)?;
        }

        Ok(pickups)
    }

    fn validate_state(&self, state: &StateMessage, network: &NetworkIndex) -> Result<()> {
        let mut submitted = BTreeSet::new();
        for request in &state.submitted {
            network.link_index(&request.origin_link)?;
            network.link_index(&request.destination_link)?;
            if self.requests.contains_key(&request.id) || !submitted.insert(&request.id) {
                return Err(DispatchError::DuplicateId {
                    kind: "request",
                    id: request.id.to_string(),
                });
            }
        }

        for (request, vehicle) in state.picked_up.iter().chain(&state.dropped_off) {
            if !self.requests.contains_key(request) && !submitted.contains(request) {
                return Err(DispatchError::UnknownRequest(request.clone()));
            }
            self.vehicle_or_err(vehicle)?;
        }

        for snapshot in &state.vehicles {
            self.vehicle_or_err(&snapshot.id)?;
            network.link_index(&snapshot.current_link)?;
            if let Some(diverge) = &snapshot.diverge_link {
                network.link_index(diverge)?;
            }
        }
        Ok(())
    }

    pub fn submit(&mut self, submitted: &SubmittedRequest, network: &NetworkIndex) -> Result<()> {
        if self.requests.contains_key(&submitted.id) {
            return Err(DispatchError::DuplicateId {
                kind: "request",
                id: submitted.id.to_string(),
            });
        }
        let request = Request {
            id: submitted.id.clone(),
            origin_link: submitted.origin_link.clone(),
            destination_link: submitted.destination_link.clone(),
            origin: network.link_coord(&submitted.origin_link)?,
            destination: network.link_coord(&submitted.destination_link)?,
            onboard: false,
            earliest_pickup_time: submitted.earliest_pickup_time,
            latest_pickup_time: submitted.latest_pickup_time,
            latest_arrival_time: submitted.latest_arrival_time,
            vehicle: None,
        };
        self.requests.insert(submitted.id.clone(), request);
        self.statistics.pending += 1;
        Ok(())
    }

    pub fn record_pickup(&mut self, request: &RequestId, vehicle: &VehicleId) -> Result<()> {
        self.vehicle_or_err(vehicle)?;
        let linked = self.request_or_err(request)?.vehicle.as_ref() == Some(vehicle);
        if !linked {
            tracing::debug!(%request, %vehicle, "pickup by a vehicle other than the assigned one");
            self.link(request, vehicle)?;
        }

        if let Some(entry) = self.requests.get_mut(request) {
            entry.onboard = true;
        }
        if let Some(entry) = self.vehicles.get_mut(vehicle) {
            entry.occupied = true;
        }
        self.statistics.pending = self.statistics.pending.saturating_sub(1);
        self.statistics.onboard += 1;
        Ok(())
    }

    pub fn record_dropoff(&mut self, request: &RequestId, vehicle: &VehicleId) -> Result<()> {
        self.vehicle_or_err(vehicle)?;
        self.request_or_err(request)?;

        self.unlink_request(request);
        if let Some(entry) = self.vehicles.get_mut(vehicle) {
            entry.occupied = false;
            if entry.request.as_ref() == Some(request) {
                entry.request = None;
            }
        }
        self.requests.remove(request);
        self.statistics.onboard = self.statistics.onboard.saturating_sub(1);
        self.statistics.done += 1;
        Ok(())
    }

    pub fn update_vehicle(
        &mut self,
        snapshot: &VehicleSnapshot,
        network: &NetworkIndex,
        time: f64,
    ) -> Result<()> {
        let location = network.link_coord(&snapshot.current_link)?;
        if let Some(diverge) = &snapshot.diverge_link {
            network.link_index(diverge)?;
        }
        let vehicle = self
            .vehicles
            .get_mut(&snapshot.id)
            .ok_or_else(|| DispatchError::UnknownVehicle(snapshot.id.clone()))?;

        vehicle.location = location;
        vehicle.current_link = snapshot.current_link.clone();
        vehicle.diversion_link = snapshot
            .diverge_link
            .clone()
            .unwrap_or_else(|| snapshot.current_link.clone());
        vehicle.status = snapshot.state;
        vehicle.last_update = time;
        Ok(())
    }

    /// Pair `request` with `vehicle`, first releasing whatever either side was
    /// linked to before.
    pub fn link(&mut self, request: &RequestId, vehicle: &VehicleId) -> Result<()> {
        self.request_or_err(request)?;
        self.vehicle_or_err(vehicle)?;

        self.unlink_request(request);
        let previous = self.vehicles.get(vehicle).and_then(|v| v.request.clone());
        if let Some(previous) = previous {
            self.unlink_request(&previous);
        }

        if let Some(entry) = self.requests.get_mut(request) {
            entry.vehicle = Some(vehicle.clone());
        }
        if let Some(entry) = self.vehicles.get_mut(vehicle) {
            entry.request = Some(request.clone());
        }
        debug_assert!(self.is_consistent());
        Ok(())
    }

    /// Break the link of `request`, returning the vehicle it was paired with.
    pub fn unlink_request(&mut self, request: &RequestId) -> Option<VehicleId> {
        let vehicle = self.requests.get_mut(request)?.vehicle.take()?;
        if let Some(entry) = self.vehicles.get_mut(&vehicle) {
            if entry.request.as_ref() == Some(request) {
                entry.request = None;
            }
        }
        Some(vehicle)
    }

    /// Drop every request whose pickup deadline is strictly before `time` and
    /// that is neither onboard nor about to be picked up.
    pub fn reject_expired(&mut self, time: f64) -> Vec<Rejection> {
        let expired: Vec<RequestId> = self
            .requests
            .values()
            .filter(|request| !request.onboard)
            .filter(|request| !self.is_being_served(request))
            .filter(|request| request.latest_pickup_time < time)
            .map(|request| request.id.clone())
            .collect();

        expired
            .into_iter()
            .map(|request| {
                let vehicle = self.unlink_request(&request);
                self.requests.remove(&request);
                self.statistics.pending = self.statistics.pending.saturating_sub(1);
                self.statistics.rejected += 1;
                Rejection { request, vehicle }
            })
            .collect()
    }

    fn is_being_served(&self, request: &Request) -> bool {
        request
            .vehicle
            .as_ref()
            .and_then(|id| self.vehicles.get(id))
            .is_some_and(|vehicle| vehicle.status == VehicleStatus::Stop)
    }

    /// Vehicles that may receive a new request, in ascending id order.
    pub fn assignable_vehicles(&self) -> Vec<&Vehicle> {
        self.vehicles.values().filter(|v| v.is_assignable()).collect()
    }

    /// Requests that may be (re)assigned, in ascending id order.
    pub fn assignable_requests(&self) -> Vec<&Request> {
        self.requests
            .values()
            .filter(|request| !request.onboard && !self.is_being_served(request))
            .collect()
    }

    /// Vehicles without an assigned request.
    pub fn idle_vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.values().filter(|v| v.is_idle())
    }

    pub fn vehicle(&self, id: &VehicleId) -> Option<&Vehicle> {
        self.vehicles.get(id)
    }

    pub fn request(&self, id: &RequestId) -> Option<&Request> {
        self.requests.get(id)
    }

    pub fn vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.values()
    }

    pub fn requests(&self) -> impl Iterator<Item = &Request> {
        self.requests.values()
    }

    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    pub fn request_count(&self) -> usize {
        self.requests.len()
    }

    pub fn statistics(&self) -> FleetStatistics {
        self.statistics
    }

    /// `request.vehicle = v` exactly when `v.request = request`.
    pub fn is_consistent(&self) -> bool {
        let forward = self.requests.values().all(|request| match &request.vehicle {
            Some(vehicle) => self
                .vehicles
                .get(vehicle)
                .is_some_and(|v| v.request.as_ref() == Some(&request.id)),
            None => true,
        });
        let backward = self.vehicles.values().all(|vehicle| match &vehicle.request {
            Some(request) => self
                .requests
                .get(request)
                .is_some_and(|r| r.vehicle.as_ref() == Some(&vehicle.id)),
            None => true,
        });
        forward && backward
    }

    fn vehicle_or_err(&self, id: &VehicleId) -> Result<&Vehicle> {
        self.vehicles
            .get(id)
            .ok_or_else(|| DispatchError::UnknownVehicle(id.clone()))
    }

    fn request_or_err(&self, id: &RequestId) -> Result<&Request> {
        self.requests
            .get(id)
            .ok_or_else(|| DispatchError::UnknownRequest(id.clone()))
    }
}
