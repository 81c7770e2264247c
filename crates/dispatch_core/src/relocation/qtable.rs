use std::collections::BTreeMap;

use ndarray::{s, Array3};

/// One relocation decision: at `step`, move from `zone` to `destination`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Action {
    pub step: usize,
    pub zone: usize,
    pub destination: usize,
}

/// Action values indexed by `[step, zone, destination]`.
#[derive(Debug, Clone)]
pub struct QTable {
    values: Array3<f64>,
}

impl QTable {
    pub fn new(steps: usize, zones: usize) -> Self {
        Self {
            values: Array3::zeros((steps, zones, zones)),
        }
    }

    pub fn steps(&self) -> usize {
        self.values.dim().0
    }

    pub fn zones(&self) -> usize {
        self.values.dim().1
    }

    pub fn value(&self, action: Action) -> f64 {
        self.values[[action.step, action.zone, action.destination]]
    }

    pub fn set(&mut self, action: Action, value: f64) {
        self.values[[action.step, action.zone, action.destination]] = value;
    }

    /// Destination with the highest value from `zone` at `step`; lowest index on ties.
    pub fn best_destination(&self, step: usize, zone: usize) -> usize {
        let row = self.values.slice(s![step, zone, ..]);
        let mut best = 0;
        for (destination, &value) in row.iter().enumerate() {
            if value > row[best] {
                best = destination;
            }
        }
        best
    }

    fn best_value(values: &Array3<f64>, step: usize, zone: usize) -> f64 {
        values
            .slice(s![step, zone, ..])
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Temporal-difference update of every recorded action, all reading the
    /// values as they were before the batch.
    ///
    /// `Q[a] ← (1-α)·Q[a] + α·(r + γ·max Q[step+1, destination, ·])`, with the
    /// bootstrap term dropped on the last step.
    pub fn batch_update(&mut self, rewards: &BTreeMap<Action, f64>, learning_rate: f64, discount_factor: f64) {
        let snapshot = &self.values;
        let mut updated = snapshot.clone();

        for (&action, &reward) in rewards {
            let index = [action.step, action.zone, action.destination];
            let mut value = (1.0 - learning_rate) * snapshot[index] + learning_rate * reward;
            if action.step + 1 < self.steps() {
                value += learning_rate
                    * discount_factor
                    * Self::best_value(snapshot, action.step + 1, action.destination);
            }
            updated[index] = value;
        }

        self.values = updated;
    }
}
