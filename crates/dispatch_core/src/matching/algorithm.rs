use std::fmt;

use ndarray::ArrayView2;

use super::types::MatchPair;

/// Trait for strategies that pair requests (rows) with vehicles (columns)
/// given a cost matrix.
///
/// Implementations never return two pairs sharing a row or a column, and never
/// select an entry whose cost is not finite.
pub trait MatchingStrategy: Send + Sync + fmt::Debug {
    /// Short name used in logs and configuration.
    fn name(&self) -> &'static str;

    fn assign(&self, costs: ArrayView2<'_, f64>) -> Vec<MatchPair>;
}
