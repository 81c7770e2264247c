//! Dispatcher configuration.
//!
//! Every field has a default, so a configuration file only needs to name what
//! it changes. Values are checked once by [`DispatcherConfig::validate`] before
//! a session starts.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, Result};
use crate::matching::MatchingStrategyKind;

/// Matching tick length in simulated seconds.
pub const DEFAULT_CONTROL_INTERVAL_SECS: f64 = 30.0;

/// Dwell time for pickup, dropoff and hold stops.
pub const DEFAULT_STOP_DURATION_SECS: f64 = 30.0;

/// Which decision layer runs on top of the fleet state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
    /// Matching every control interval, idle vehicles stay put.
    #[default]
    Matching,
    /// Matching plus Q-learning relocation of idle vehicles.
    Relocation,
    /// Same-link opportunistic matching plus random diversions.
    Roaming,
    /// Requests served in arrival order by vehicles in release order.
    Fifo,
}

impl PolicyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Matching => "matching",
            Self::Relocation => "relocation",
            Self::Roaming => "roaming",
            Self::Fifo => "fifo",
        }
    }
}

impl std::str::FromStr for PolicyKind {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "matching" => Ok(Self::Matching),
            "relocation" => Ok(Self::Relocation),
            "roaming" => Ok(Self::Roaming),
            "fifo" => Ok(Self::Fifo),
            other => Err(DispatchError::InvalidConfig(format!("unknown policy `{other}`"))),
        }
    }
}

/// Q-learning relocation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelocationConfig {
    /// Relocation runs only on control ticks, so this must be a whole
    /// multiple of the control interval.
    pub interval_secs: f64,
    /// Step size α of the temporal-difference update.
    pub learning_rate: f64,
    /// Discount γ applied to the next step's best value.
    pub discount_factor: f64,
    /// Probability ε of picking a random destination zone.
    pub exploration_rate: f64,
    /// Edge length of a square zone, in network units.
    pub zone_size: f64,
    /// Length of the learned day; steps beyond it do not relocate.
    pub horizon_secs: f64,
}

impl Default for RelocationConfig {
    fn default() -> Self {
        Self {
            interval_secs: 1_800.0,
            learning_rate: 0.1,
            discount_factor: 0.9,
            exploration_rate: 0.1,
            zone_size: 1_000.0,
            horizon_secs: 24.0 * 3_600.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoamingConfig {
    pub interval_secs: f64,
    /// Period of live travel-time queries; 0 disables them.
    pub travel_time_refresh_secs: f64,
}

impl Default for RoamingConfig {
    fn default() -> Self {
        Self {
            interval_secs: 300.0,
            travel_time_refresh_secs: 600.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    pub policy: PolicyKind,
    pub strategy: MatchingStrategyKind,
    pub control_interval_secs: f64,
    pub stop_duration_secs: f64,
    /// Seed for the policies' RNG (for reproducibility).
    pub seed: u64,
    pub relocation: RelocationConfig,
    pub roaming: RoamingConfig,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            policy: PolicyKind::default(),
            strategy: MatchingStrategyKind::default(),
            control_interval_secs: DEFAULT_CONTROL_INTERVAL_SECS,
            stop_duration_secs: DEFAULT_STOP_DURATION_SECS,
            seed: 0,
            relocation: RelocationConfig::default(),
            roaming: RoamingConfig::default(),
        }
    }
}

impl DispatcherConfig {
    /// Read a JSON configuration file; absent fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn with_policy(mut self, policy: PolicyKind) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_strategy(mut self, strategy: MatchingStrategyKind) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_control_interval_secs(mut self, secs: f64) -> Self {
        self.control_interval_secs = secs;
        self
    }

    pub fn with_stop_duration_secs(mut self, secs: f64) -> Self {
        self.stop_duration_secs = secs;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_relocation(mut self, relocation: RelocationConfig) -> Self {
        self.relocation = relocation;
        self
    }

    pub fn with_roaming(mut self, roaming: RoamingConfig) -> Self {
        self.roaming = roaming;
        self
    }

    pub fn validate(&self) -> Result<()> {
        positive("control_interval_secs", self.control_interval_secs)?;
        non_negative("stop_duration_secs", self.stop_duration_secs)?;

        let relocation = &self.relocation;
        positive("relocation.interval_secs", relocation.interval_secs)?;
        positive("relocation.zone_size", relocation.zone_size)?;
        positive("relocation.horizon_secs", relocation.horizon_secs)?;
        unit_interval("relocation.learning_rate", relocation.learning_rate)?;
        unit_interval("relocation.discount_factor", relocation.discount_factor)?;
        unit_interval("relocation.exploration_rate", relocation.exploration_rate)?;
        if self.policy == PolicyKind::Relocation
            && relocation.interval_secs % self.control_interval_secs != 0.0
        {
            return Err(DispatchError::InvalidConfig(format!(
                "relocation.interval_secs ({}) must be a multiple of control_interval_secs ({})",
                relocation.interval_secs, self.control_interval_secs
            )));
        }

        positive("roaming.interval_secs", self.roaming.interval_secs)?;
        non_negative(
            "roaming.travel_time_refresh_secs",
            self.roaming.travel_time_refresh_secs,
        )?;
        Ok(())
    }
}

fn positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(DispatchError::InvalidConfig(format!("{name} must be positive, got {value}")))
    }
}

fn non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(DispatchError::InvalidConfig(format!("{name} must not be negative, got {value}")))
    }
}

fn unit_interval(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(DispatchError::InvalidConfig(format!("{name} must lie in [0, 1], got {value}")))
    }
}
