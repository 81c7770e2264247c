use ndarray::ArrayView2;

use super::algorithm::MatchingStrategy;
use super::types::MatchPair;

/// Greedy "best-response" matching.
///
/// Repeatedly commits the globally cheapest available pair, then removes its
/// row and column from consideration. Ties go to the lowest row, then the
/// lowest column. Runs in O(k·n·m) for k committed pairs.
#[derive(Debug, Default)]
pub struct BestResponseMatching;

impl MatchingStrategy for BestResponseMatching {
    fn name(&self) -> &'static str {
        "best-response"
    }

    fn assign(&self, costs: ArrayView2<'_, f64>) -> Vec<MatchPair> {
        let (rows, cols) = costs.dim();
        let mut row_open = vec![true; rows];
        let mut col_open = vec![true; cols];
        let mut pairs = Vec::with_capacity(rows.min(cols));

        loop {
            let mut best: Option<(MatchPair, f64)> = None;
            for row in (0..rows).filter(|&r| row_open[r]) {
                for col in (0..cols).filter(|&c| col_open[c]) {
                    let cost = costs[[row, col]];
                    if !cost.is_finite() {
                        continue;
                    }
                    // Strict comparison keeps the first entry in row-major order.
                    if best.map_or(true, |(_, best_cost)| cost < best_cost) {
                        best = Some((MatchPair::new(row, col), cost));
                    }
                }
            }

            let Some((pair, _)) = best else {
                break;
            };
            row_open[pair.row] = false;
            col_open[pair.col] = false;
            pairs.push(pair);
        }

        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn takes_global_minimum_first() {
        let costs = array![[4.0, 1.0], [2.0, 8.0]];
        let pairs = BestResponseMatching.assign(costs.view());
        assert_eq!(pairs, vec![MatchPair::new(0, 1), MatchPair::new(1, 0)]);
    }

    #[test]
    fn greedy_choice_can_be_suboptimal() {
        // Greedy grabs the 1, leaving the 10: total 11 against an optimum of 4.
        let costs = array![[1.0, 2.0], [2.0, 10.0]];
        let pairs = BestResponseMatching.assign(costs.view());
        assert_eq!(pairs, vec![MatchPair::new(0, 0), MatchPair::new(1, 1)]);
    }

    #[test]
    fn ties_resolve_in_row_major_order() {
        let costs = array![[3.0, 3.0], [3.0, 3.0]];
        let pairs = BestResponseMatching.assign(costs.view());
        assert_eq!(pairs, vec![MatchPair::new(0, 0), MatchPair::new(1, 1)]);
    }

    #[test]
    fn rectangular_matrix_matches_smaller_side() {
        let costs = array![[5.0, 1.0, 3.0]];
        let pairs = BestResponseMatching.assign(costs.view());
        assert_eq!(pairs, vec![MatchPair::new(0, 1)]);
    }

    #[test]
    fn non_finite_entries_are_never_selected() {
        let costs = array![[f64::INFINITY, f64::NAN]];
        assert!(BestResponseMatching.assign(costs.view()).is_empty());
    }
}
