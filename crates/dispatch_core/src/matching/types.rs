use ndarray::ArrayView2;

/// One committed pairing: `row` indexes requests, `col` indexes vehicles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MatchPair {
    pub row: usize,
    pub col: usize,
}

impl MatchPair {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Sum of the costs of `pairs` in `costs`.
pub fn total_cost(costs: ArrayView2<'_, f64>, pairs: &[MatchPair]) -> f64 {
    pairs.iter().map(|pair| costs[[pair.row, pair.col]]).sum()
}
