//! Idle-vehicle relocation driven by tabular Q-learning over (time step, zone).

pub mod policy;
pub mod qtable;

pub use policy::RelocationPolicy;
pub use qtable::{Action, QTable};
