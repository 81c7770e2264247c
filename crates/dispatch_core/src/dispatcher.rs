//! One dispatcher step per inbound message.
//!
//! [`Dispatcher`] owns the network, the fleet state and the selected policy.
//! It never touches the transport directly: live travel times are requested
//! through a [`TravelTimeSource`] supplied by the caller.

use crate::clock::Period;
use crate::config::{DispatcherConfig, PolicyKind};
use crate::error::{DispatchError, Result};
use crate::fifo::FifoPolicy;
use crate::fleet::{FleetState, VehicleStatus};
use crate::matching::MatchingEngine;
use crate::network::NetworkIndex;
use crate::protocol::{
    Assignment, InboundMessage, IterationMessage, StateMessage, TravelTimeQuery,
    TravelTimeResponse,
};
use crate::relocation::RelocationPolicy;
use crate::roaming::RoamingPolicy;
use crate::stats::StatisticsSnapshot;

/// Side channel for live link travel times.
pub trait TravelTimeSource {
    fn query_travel_times(&mut self, query: TravelTimeQuery) -> Result<TravelTimeResponse>;
}

/// For dispatchers that never refresh travel times.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTravelTimes;

impl TravelTimeSource for NoTravelTimes {
    fn query_travel_times(&mut self, _query: TravelTimeQuery) -> Result<TravelTimeResponse> {
        Err(DispatchError::Protocol(
            "no travel-time side channel available".into(),
        ))
    }
}

#[derive(Debug)]
enum Policy {
    Matching(MatchingEngine),
    Relocation {
        engine: MatchingEngine,
        relocation: RelocationPolicy,
    },
    Roaming(RoamingPolicy),
    Fifo(FifoPolicy),
}

#[derive(Debug)]
pub struct Dispatcher {
    config: DispatcherConfig,
    network: NetworkIndex,
    fleet: FleetState,
    control: Period,
    policy: Policy,
    iteration: Option<u32>,
}

impl Dispatcher {
    pub fn new(network: NetworkIndex, config: DispatcherConfig) -> Result<Self> {
        config.validate()?;
        let stop_duration = config.stop_duration_secs;
        let policy = match config.policy {
            PolicyKind::Matching => {
                Policy::Matching(MatchingEngine::from_kind(config.strategy, stop_duration))
            }
            PolicyKind::Relocation => Policy::Relocation {
                engine: MatchingEngine::from_kind(config.strategy, stop_duration),
                relocation: RelocationPolicy::new(
                    &network,
                    config.relocation,
                    stop_duration,
                    config.seed,
                )?,
            },
            PolicyKind::Roaming => {
                Policy::Roaming(RoamingPolicy::new(config.roaming, stop_duration, config.seed))
            }
            PolicyKind::Fifo => Policy::Fifo(FifoPolicy::new(stop_duration)),
        };

        Ok(Self {
            control: Period::from_secs(config.control_interval_secs),
            config,
            network,
            fleet: FleetState::default(),
            policy,
            iteration: None,
        })
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn network(&self) -> &NetworkIndex {
        &self.network
    }

    pub fn fleet(&self) -> &FleetState {
        &self.fleet
    }

    pub fn iteration(&self) -> Option<u32> {
        self.iteration
    }

    pub fn relocation(&self) -> Option<&RelocationPolicy> {
        match &self.policy {
            Policy::Relocation { relocation, .. } => Some(relocation),
            _ => None,
        }
    }

    /// Apply one inbound message and build the reply.
    ///
    /// Returns `None` for `finalization`, after which the session ends.
    pub fn handle(
        &mut self,
        message: &InboundMessage,
        side_channel: &mut dyn TravelTimeSource,
    ) -> Result<Option<Assignment>> {
        match message {
            InboundMessage::Initialization => Ok(Some(Assignment::default())),
            InboundMessage::Iteration(iteration) => {
                self.start_iteration(iteration)?;
                self.control_step(0.0, side_channel).map(Some)
            }
            InboundMessage::State(state) => {
                self.apply_state(state)?;
                self.control_step(state.time, side_channel).map(Some)
            }
            InboundMessage::Finalization => {
                tracing::info!(
                    statistics = ?StatisticsSnapshot::capture(&self.fleet),
                    "finalization received"
                );
                Ok(None)
            }
            InboundMessage::TravelTimeResponse(_) => Err(DispatchError::Protocol(
                "travel_time_response received without a pending query".into(),
            )),
        }
    }

    fn start_iteration(&mut self, message: &IterationMessage) -> Result<()> {
        let initial_status = match self.policy {
            Policy::Roaming(_) => VehicleStatus::Inactive,
            _ => VehicleStatus::Stay,
        };
        self.fleet
            .reset(&message.vehicles, &self.network, initial_status)?;

        match &mut self.policy {
            Policy::Relocation { relocation, .. } => relocation.begin_iteration(message.iteration),
            Policy::Fifo(fifo) => fifo.reset(&message.vehicles),
            _ => {}
        }
        self.iteration = Some(message.iteration);
        tracing::info!(
            iteration = message.iteration,
            vehicles = message.vehicles.len(),
            "iteration started"
        );
        Ok(())
    }

    fn apply_state(&mut self, state: &StateMessage) -> Result<()> {
        if self.iteration.is_none() {
            return Err(DispatchError::Protocol(
                "state received before any iteration".into(),
            ));
        }
        let pickups = self.fleet.apply_state(state, &self.network)?;
        match &mut self.policy {
            Policy::Relocation { relocation, .. } => {
                for pickup in &pickups {
                    relocation.record_pickup(&pickup.vehicle);
                }
            }
            Policy::Fifo(fifo) => fifo.observe(state),
            _ => {}
        }
        Ok(())
    }

    fn control_step(
        &mut self,
        time: f64,
        side_channel: &mut dyn TravelTimeSource,
    ) -> Result<Assignment> {
        let mut assignment = Assignment::default();
        let control_due = self.control.is_due(time);

        if control_due {
            for rejection in self.fleet.reject_expired(time) {
                if let Some(vehicle) = rejection.vehicle {
                    if let Policy::Fifo(fifo) = &mut self.policy {
                        fifo.release(vehicle.clone());
                    }
                    assignment.clear_schedule(vehicle);
                }
                tracing::debug!(request = %rejection.request, time, "request rejected");
                assignment.reject(rejection.request);
            }
        }

        match &mut self.policy {
            Policy::Matching(engine) => {
                if control_due {
                    engine.run(&mut self.fleet, &mut assignment)?;
                }
            }
            Policy::Relocation { engine, relocation } => {
                if control_due {
                    engine.run(&mut self.fleet, &mut assignment)?;
                    if relocation.is_due(time) {
                        relocation.relocate(time, &self.fleet, &self.network, &mut assignment)?;
                    }
                }
            }
            Policy::Roaming(roaming) => {
                roaming.match_on_same_link(&mut self.fleet, &mut assignment)?;
                if roaming.diversion_due(time) {
                    roaming.divert(&self.fleet, &self.network, &mut assignment)?;
                }
                if roaming.refresh_due(time) {
                    let response = side_channel.query_travel_times(TravelTimeQuery::default())?;
                    roaming.apply_travel_times(&mut self.network, &response)?;
                }
            }
            Policy::Fifo(fifo) => {
                fifo.assign(&mut self.fleet, &mut assignment)?;
            }
        }

        debug_assert!(self.fleet.is_consistent());
        if control_due {
            StatisticsSnapshot::capture(&self.fleet).log(time);
        }
        Ok(assignment)
    }
}
