use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::clock::Period;
use crate::config::RelocationConfig;
use crate::error::{DispatchError, Result};
use crate::fleet::FleetState;
use crate::ids::VehicleId;
use crate::network::NetworkIndex;
use crate::protocol::{Assignment, Stop};
use crate::zones::ZonePartition;

use super::qtable::{Action, QTable};

/// Largest Q-table, in `steps × zones × zones` entries.
pub const MAX_Q_ENTRIES: usize = 1 << 25;

/// Q-learning repositioning of idle vehicles across zones.
///
/// The Q-table lives for the whole process. Actions and rewards collected
/// during an iteration are folded into it at the start of the next one.
#[derive(Debug)]
pub struct RelocationPolicy {
    config: RelocationConfig,
    period: Period,
    zones: ZonePartition,
    q: QTable,
    actions: BTreeMap<VehicleId, Action>,
    rewards: BTreeMap<Action, f64>,
    stop_duration: f64,
    rng: StdRng,
}

impl RelocationPolicy {
    pub fn new(
        network: &NetworkIndex,
        config: RelocationConfig,
        stop_duration: f64,
        seed: u64,
    ) -> Result<Self> {
        let zones = ZonePartition::new(network, config.zone_size)?;
        let period = Period::from_secs(config.interval_secs);
        let steps = period.steps_within(config.horizon_secs);
        let entries = zones
            .len()
            .checked_mul(zones.len())
            .and_then(|pairs| pairs.checked_mul(steps))
            .filter(|&entries| entries <= MAX_Q_ENTRIES)
            .ok_or_else(|| {
                DispatchError::InvalidConfig(format!(
                    "{steps} steps over {} zones exceed {MAX_Q_ENTRIES} q-table entries",
                    zones.len()
                ))
            })?;
        let q = QTable::new(steps, zones.len());
        tracing::info!(
            zones = zones.len(),
            steps = q.steps(),
            entries,
            "relocation policy ready"
        );

        Ok(Self {
            config,
            period,
            zones,
            q,
            actions: BTreeMap::new(),
            rewards: BTreeMap::new(),
            stop_duration,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn q_table(&self) -> &QTable {
        &self.q
    }

    pub fn zones(&self) -> &ZonePartition {
        &self.zones
    }

    pub fn action_of(&self, vehicle: &VehicleId) -> Option<Action> {
        self.actions.get(vehicle).copied()
    }

    pub fn rewards(&self) -> &BTreeMap<Action, f64> {
        &self.rewards
    }

    /// Fold last iteration's experience into the Q-table, then forget it.
    pub fn begin_iteration(&mut self, iteration: u32) {
        if iteration > 0 && !self.rewards.is_empty() {
            self.q.batch_update(
                &self.rewards,
                self.config.learning_rate,
                self.config.discount_factor,
            );
            tracing::info!(iteration, actions = self.rewards.len(), "q-table updated");
        }
        self.rewards.clear();
        self.actions.clear();
    }

    /// Credit a pickup to the vehicle's current relocation action.
    pub fn record_pickup(&mut self, vehicle: &VehicleId) {
        if let Some(action) = self.actions.get(vehicle) {
            *self.rewards.entry(*action).or_insert(0.0) += 1.0;
        }
    }

    pub fn is_due(&self, time: f64) -> bool {
        self.period.is_due(time)
    }

    /// Choose a destination zone for every vehicle without a request and write
    /// a single stop for it. Returns the number of vehicles given a decision.
    pub fn relocate(
        &mut self,
        time: f64,
        fleet: &FleetState,
        network: &NetworkIndex,
        assignment: &mut Assignment,
    ) -> Result<usize> {
        self.actions.clear();
        let step = self.period.step(time);
        if step >= self.q.steps() {
            return Ok(0);
        }

        let mut moved = 0;
        for vehicle in fleet.idle_vehicles() {
            let zone = self.zones.zone_of(network.link_index(&vehicle.current_link)?);
            let destination = if self.rng.gen::<f64>() < self.config.exploration_rate {
                self.rng.gen_range(0..self.zones.len())
            } else {
                self.q.best_destination(step, zone)
            };

            let action = Action {
                step,
                zone,
                destination,
            };
            self.actions.insert(vehicle.id.clone(), action);
            self.rewards.entry(action).or_insert(0.0);

            let link = if destination == zone {
                vehicle.current_link.clone()
            } else {
                let candidates = self.zones.links_in(destination);
                let pick = candidates[self.rng.gen_range(0..candidates.len())];
                network.link(pick).id.clone()
            };
            assignment.set_stops(vehicle.id.clone(), vec![Stop::hold(link, self.stop_duration)]);
            if destination != zone {
                moved += 1;
            }
        }

        tracing::debug!(step, idle = self.actions.len(), moved, "relocation round");
        Ok(self.actions.len())
    }
}
