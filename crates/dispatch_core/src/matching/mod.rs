pub mod algorithm;
pub mod engine;
pub mod greedy;
pub mod hungarian;
pub mod types;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use algorithm::MatchingStrategy;
pub use engine::{cost_matrix, MatchingEngine};
pub use greedy::BestResponseMatching;
pub use hungarian::BipartiteMatching;
pub use types::{total_cost, MatchPair};

use crate::error::DispatchError;

/// Which matching strategy the engine uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchingStrategyKind {
    /// Greedy nearest pair first.
    #[default]
    BestResponse,
    /// Minimum total distance assignment.
    BipartiteMatching,
}

impl MatchingStrategyKind {
    pub fn build(self) -> Box<dyn MatchingStrategy> {
        match self {
            Self::BestResponse => Box::new(BestResponseMatching),
            Self::BipartiteMatching => Box::new(BipartiteMatching),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::BestResponse => "best-response",
            Self::BipartiteMatching => "bipartite-matching",
        }
    }
}

impl fmt::Display for MatchingStrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchingStrategyKind {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "best-response" => Ok(Self::BestResponse),
            "bipartite-matching" => Ok(Self::BipartiteMatching),
            other => Err(DispatchError::InvalidConfig(format!(
                "unknown matching strategy `{other}`"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_its_name() {
        for kind in [
            MatchingStrategyKind::BestResponse,
            MatchingStrategyKind::BipartiteMatching,
        ] {
            assert_eq!(kind.as_str().parse::<MatchingStrategyKind>().ok(), Some(kind));
            assert_eq!(kind.build().name(), kind.as_str());
        }
        assert!("hungarian".parse::<MatchingStrategyKind>().is_err());
    }
}
