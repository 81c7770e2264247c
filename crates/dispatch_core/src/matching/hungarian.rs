//! Hungarian (Kuhn-Munkres) algorithm for minimum-cost bipartite matching.
//!
//! Costs are negated and scaled to fixed-point integers so that pathfinding's
//! maximum-weight assignment minimizes total cost across the whole batch.

use ndarray::ArrayView2;
use pathfinding::kuhn_munkres::{kuhn_munkres, Weights};

use super::algorithm::MatchingStrategy;
use super::types::MatchPair;

/// Scale factor to convert f64 cost to i64 weight (micrometres for metre costs).
const SCALE: f64 = 1_000_000.0;

/// Largest magnitude a feasible weight may take.
const MAX_WEIGHT: i64 = 100_000_000_000_000; // 1e14

/// Weight for non-finite costs (never selected).
/// Must be worse than any feasible weight but not so extreme that negating and
/// summing in pathfinding overflows i64.
const INFEASIBLE: i64 = -1_000_000_000_000_000; // -1e15

/// Simple matrix type implementing pathfinding's Weights for i64.
struct I64Weights(Vec<Vec<i64>>);

impl Weights<i64> for I64Weights {
    fn rows(&self) -> usize {
        self.0.len()
    }

    fn columns(&self) -> usize {
        self.0.first().map_or(0, |r| r.len())
    }

    fn at(&self, row: usize, col: usize) -> i64 {
        self.0[row][col]
    }

    fn neg(&self) -> Self {
        I64Weights(
            self.0
                .iter()
                .map(|r| r.iter().map(|&x| x.saturating_neg()).collect())
                .collect(),
        )
    }
}

/// Optimal "bipartite-matching": minimum total cost over the full rectangular
/// matrix, matching every row or every column, whichever side is smaller.
#[derive(Debug, Default)]
pub struct BipartiteMatching;

impl BipartiteMatching {
    /// Convert a cost to a weight: lower cost means higher weight.
    fn cost_to_weight(cost: f64) -> i64 {
        if !cost.is_finite() {
            return INFEASIBLE;
        }
        let w = -(cost * SCALE).round();
        if w >= MAX_WEIGHT as f64 {
            MAX_WEIGHT
        } else if w <= -MAX_WEIGHT as f64 {
            -MAX_WEIGHT
        } else {
            w as i64
        }
    }
}

impl MatchingStrategy for BipartiteMatching {
    fn name(&self) -> &'static str {
        "bipartite-matching"
    }

    fn assign(&self, costs: ArrayView2<'_, f64>) -> Vec<MatchPair> {
        let (rows, cols) = costs.dim();
        if rows == 0 || cols == 0 {
            return Vec::new();
        }

        // Kuhn-Munkres requires rows <= columns, so the smaller side becomes the rows.
        let transposed = rows > cols;
        let oriented = if transposed { costs.reversed_axes() } else { costs };
        let matrix: Vec<Vec<i64>> = oriented
            .rows()
            .into_iter()
            .map(|row| row.iter().map(|&c| Self::cost_to_weight(c)).collect())
            .collect();
        let weights = I64Weights(matrix);

        let has_feasible = (0..weights.rows())
            .any(|r| (0..weights.columns()).any(|c| weights.at(r, c) > INFEASIBLE));
        if !has_feasible {
            return Vec::new();
        }

        let (_total, assignments) = kuhn_munkres(&weights);

        let mut pairs: Vec<MatchPair> = assignments
            .iter()
            .enumerate()
            .filter(|&(r, &c)| weights.at(r, c) > INFEASIBLE)
            .map(|(r, &c)| {
                if transposed {
                    MatchPair::new(c, r)
                } else {
                    MatchPair::new(r, c)
                }
            })
            .collect();
        pairs.sort();
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::greedy::BestResponseMatching;
    use crate::matching::types::total_cost;
    use ndarray::{array, Array2};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn finds_assignment_greedy_misses() {
        let costs = array![[1.0, 2.0], [2.0, 10.0]];
        let pairs = BipartiteMatching.assign(costs.view());
        assert_eq!(pairs, vec![MatchPair::new(0, 1), MatchPair::new(1, 0)]);
        assert_eq!(total_cost(costs.view(), &pairs), 4.0);
    }

    #[test]
    fn more_requests_than_vehicles_is_transposed() {
        let costs = array![[9.0, 9.0], [1.0, 9.0], [9.0, 2.0]];
        let pairs = BipartiteMatching.assign(costs.view());
        assert_eq!(pairs, vec![MatchPair::new(1, 0), MatchPair::new(2, 1)]);
    }

    #[test]
    fn infeasible_entries_are_not_returned() {
        let costs = array![[f64::INFINITY, 1.0], [f64::INFINITY, 2.0]];
        let pairs = BipartiteMatching.assign(costs.view());
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].col, 1);
    }

    #[test]
    fn empty_matrix_yields_no_pairs() {
        let costs = Array2::<f64>::zeros((0, 3));
        assert!(BipartiteMatching.assign(costs.view()).is_empty());
    }

    #[test]
    fn never_worse_than_greedy_on_random_matrices() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let rows = rng.gen_range(1..8);
            let cols = rng.gen_range(1..8);
            let costs = Array2::from_shape_fn((rows, cols), |_| rng.gen_range(0.0..5_000.0));

            let optimal = BipartiteMatching.assign(costs.view());
            let greedy = BestResponseMatching.assign(costs.view());
            assert_eq!(optimal.len(), rows.min(cols));
            assert!(
                total_cost(costs.view(), &optimal) <= total_cost(costs.view(), &greedy) + 1e-3,
                "optimal should not exceed greedy"
            );
        }
    }
}
