#![allow(dead_code)]

use dispatch_core::fleet::VehicleStatus;
use dispatch_core::protocol::{
    Assignment, InboundMessage, IterationMessage, OutboundMessage, StateMessage, Stop,
    VehicleSnapshot,
};
use dispatch_core::test_helpers::{roster, snapshot, submitted};
use dispatch_core::{LinkId, RequestId, VehicleId};

pub fn iteration(number: u32, vehicles: &[(&str, LinkId)]) -> InboundMessage {
    InboundMessage::Iteration(IterationMessage {
        iteration: number,
        vehicles: roster(vehicles),
    })
}

/// Fluent builder for `state` messages.
#[derive(Debug, Default)]
pub struct StateBuilder {
    state: StateMessage,
}

impl StateBuilder {
    pub fn at(time: f64) -> Self {
        Self {
            state: StateMessage {
                time,
                ..StateMessage::default()
            },
        }
    }

    pub fn submit(mut self, id: &str, origin: LinkId, destination: LinkId, deadline: f64) -> Self {
        self.state
            .submitted
            .push(submitted(id, origin, destination, deadline));
        self
    }

    pub fn pickup(mut self, request: &str, vehicle: &str) -> Self {
        self.state
            .picked_up
            .insert(RequestId::from(request), VehicleId::from(vehicle));
        self
    }

    pub fn dropoff(mut self, request: &str, vehicle: &str) -> Self {
        self.state
            .dropped_off
            .insert(RequestId::from(request), VehicleId::from(vehicle));
        self
    }

    pub fn vehicle(mut self, id: &str, link: LinkId, status: VehicleStatus) -> Self {
        self.state.vehicles.push(snapshot(id, link, status));
        self
    }

    pub fn diverging(mut self, id: &str, link: LinkId, diverge: LinkId) -> Self {
        self.state.vehicles.push(VehicleSnapshot {
            diverge_link: Some(diverge),
            ..snapshot(id, link, VehicleStatus::Drive)
        });
        self
    }

    pub fn build(self) -> InboundMessage {
        InboundMessage::State(self.state)
    }
}

/// Assignments in the order they were sent.
pub fn assignments(sent: &[OutboundMessage]) -> Vec<&Assignment> {
    sent.iter()
        .filter_map(|message| match message {
            OutboundMessage::Assignment(assignment) => Some(assignment),
            _ => None,
        })
        .collect()
}

pub fn stops<'a>(assignment: &'a Assignment, vehicle: &str) -> &'a [Stop] {
    assignment
        .stops_for(&VehicleId::from(vehicle))
        .unwrap_or_else(|| panic!("no stops for vehicle {vehicle}"))
}
