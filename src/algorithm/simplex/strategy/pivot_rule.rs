//! # Pivot rules
//!
//! Strategies for moving from basis to basis in the primal simplex method.
use crate::algorithm::simplex::tableau::Tableau;

/// Deciding how to pivot.
///
/// During the simplex method, one needs to decide how to move from basic solution to basic
/// solution. The pivot rule describes that behavior.
///
/// Once the column has been selected, the leaving row follows from the ratio test. That decision
/// is made independent of the strategy.
pub(crate) trait PivotRule {
    /// Create a new instance.
    fn new() -> Self;

    /// Column selection rule, the column and the direction in which it should move.
    fn select_primal_pivot_column(&mut self, tableau: &Tableau) -> Option<(usize, i8)>;
}

/// Simply pivot on the first column which can improve the objective.
///
/// Together with the smallest index tie breaking of the ratio test, this is Bland's rule, which
/// can't cycle.
pub(crate) struct FirstProfitable;

impl PivotRule for FirstProfitable {
    fn new() -> Self {
        Self
    }

    fn select_primal_pivot_column(&mut self, tableau: &Tableau) -> Option<(usize, i8)> {
        (0..tableau.nr_columns())
            .filter(|&column| !tableau.is_in_basis(column))
            .find_map(|column| tableau.improving_direction(column).map(|direction| (column, direction)))
    }
}

#[cfg(test)]
mod test {
    use crate::algorithm::simplex::strategy::pivot_rule::{FirstProfitable, PivotRule};
    use crate::algorithm::simplex::tableau::Tableau;

    #[test]
    fn find_profitable_column() {
        // Two columns in a single row x + y >= 1, both at their lower bound zero
        let columns = vec![vec![(0, 1.0)], vec![(0, 1.0)]];
        let mut tableau = Tableau::new(1, &columns, vec![0.0, 0.0, 1.0], vec![1.0, 1.0, f64::INFINITY], 1e-9);
        tableau.set_phase_one_costs();

        let mut rule = <FirstProfitable as PivotRule>::new();
        assert_eq!(rule.select_primal_pivot_column(&tableau), Some((0, 1)));

        // Nothing improves once the costs are zero
        tableau.set_phase_two_costs(&[0.0, 0.0]);
        assert_eq!(rule.select_primal_pivot_column(&tableau), None);

        // Decreasing from the upper bound
        let mut tableau = Tableau::new(1, &columns, vec![f64::NEG_INFINITY, 0.0, 1.0], vec![1.0, 1.0, f64::INFINITY], 1e-9);
        tableau.set_phase_two_costs(&[1.0, 0.0]);
        assert_eq!(rule.select_primal_pivot_column(&tableau), Some((0, -1)));
    }
}
