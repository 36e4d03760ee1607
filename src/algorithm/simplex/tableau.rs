//! # Dense tableau
//!
//! A full tableau `B^-1 M` for the bounded primal simplex method, where `M = [A -I D]` holds the
//! structural columns, one logical column per row (its value is the row activity) and one
//! artificial column per row with `D` a diagonal of signs. Nonbasic variables sit at one of their
//! bounds, or at zero when free.
use log::trace;

use crate::algorithm::simplex::strategy::pivot_rule::PivotRule;

/// Entries smaller than this are not used as pivots.
const PIVOT_TOLERANCE: f64 = 1e-9;

/// Result of running the simplex method on the current phase.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Outcome {
    Optimal,
    /// The variable that can improve without limit and its direction.
    Unbounded { column: usize, direction: i8 },
    IterationLimit,
}

/// A dense tableau with variable values and bounds.
#[derive(Debug)]
pub(crate) struct Tableau {
    nr_structural: usize,
    nr_rows: usize,
    /// `B^-1 M`, one vector per row.
    rows: Vec<Vec<f64>>,
    /// Basic variable per row.
    basis: Vec<usize>,
    is_basic: Vec<bool>,
    values: Vec<f64>,
    lower: Vec<f64>,
    upper: Vec<f64>,
    /// Sign of the artificial column of each row.
    signs: Vec<f64>,
    costs: Vec<f64>,
    relative_costs: Vec<f64>,
    dual_tolerance: f64,
    iterations: usize,
}

impl Tableau {
    /// Set up the tableau with an artificial basis.
    ///
    /// # Arguments
    ///
    /// * `columns`: Sparse structural columns, `(row, value)`.
    /// * `lower`, `upper`: Bounds of the structural variables followed by the row sides.
    pub(crate) fn new(
        nr_rows: usize,
        columns: &[Vec<(usize, f64)>],
        mut lower: Vec<f64>,
        mut upper: Vec<f64>,
        dual_tolerance: f64,
    ) -> Self {
        let nr_structural = columns.len();
        let nr_columns = nr_structural + 2 * nr_rows;
        debug_assert_eq!(lower.len(), nr_structural + nr_rows);

        let mut values = lower.iter().zip(&upper)
            .map(|(&lower, &upper)| {
                if lower.is_finite() {
                    lower
                } else if upper.is_finite() {
                    upper
                } else {
                    0.0
                }
            })
            .collect::<Vec<_>>();

        let mut rows = vec![vec![0.0; nr_columns]; nr_rows];
        for (j, column) in columns.iter().enumerate() {
            for &(i, value) in column {
                rows[i][j] += value;
            }
        }
        let mut signs = Vec::with_capacity(nr_rows);
        for (i, row) in rows.iter_mut().enumerate() {
            row[nr_structural + i] = -1.0;
            let activity = (0..nr_structural + nr_rows).map(|j| row[j] * values[j]).sum::<f64>();
            let sign = if activity <= 0.0 { 1.0 } else { -1.0 };
            row[nr_structural + nr_rows + i] = sign;
            // Multiply with the inverse of the artificial basis
            for value in row.iter_mut() {
                *value *= sign;
            }
            values.push(activity.abs());
            signs.push(sign);
        }
        lower.extend(std::iter::repeat_n(0.0, nr_rows));
        upper.extend(std::iter::repeat_n(f64::INFINITY, nr_rows));

        let basis = (nr_structural + nr_rows..nr_columns).collect::<Vec<_>>();
        let mut is_basic = vec![false; nr_columns];
        for &variable in &basis {
            is_basic[variable] = true;
        }

        Self {
            nr_structural,
            nr_rows,
            rows,
            basis,
            is_basic,
            values,
            lower,
            upper,
            signs,
            costs: vec![0.0; nr_columns],
            relative_costs: vec![0.0; nr_columns],
            dual_tolerance,
            iterations: 0,
        }
    }

    pub(crate) fn nr_columns(&self) -> usize {
        self.values.len()
    }

    pub(crate) fn is_in_basis(&self, column: usize) -> bool {
        self.is_basic[column]
    }

    pub(crate) fn relative_cost(&self, column: usize) -> f64 {
        self.relative_costs[column]
    }

    pub(crate) fn iterations(&self) -> usize {
        self.iterations
    }

    fn artificial(&self, row: usize) -> usize {
        self.nr_structural + self.nr_rows + row
    }

    /// Direction in which a nonbasic variable improves the objective, if any.
    pub(crate) fn improving_direction(&self, column: usize) -> Option<i8> {
        debug_assert!(!self.is_basic[column]);

        let cost = self.relative_costs[column];
        if cost < -self.dual_tolerance && self.values[column] < self.upper[column] {
            Some(1)
        } else if cost > self.dual_tolerance && self.values[column] > self.lower[column] {
            Some(-1)
        } else {
            None
        }
    }

    /// Minimize the sum of the artificial variables.
    pub(crate) fn set_phase_one_costs(&mut self) {
        let nr_columns = self.nr_columns();
        let mut costs = vec![0.0; nr_columns];
        for row in 0..self.nr_rows {
            costs[self.artificial(row)] = 1.0;
        }
        self.set_costs(costs);
    }

    /// Fix the artificial variables at zero and use the given structural costs.
    pub(crate) fn set_phase_two_costs(&mut self, structural: &[f64]) {
        for row in 0..self.nr_rows {
            let artificial = self.artificial(row);
            self.lower[artificial] = 0.0;
            self.upper[artificial] = 0.0;
            if !self.is_basic[artificial] {
                self.values[artificial] = 0.0;
            }
        }

        let mut costs = vec![0.0; self.nr_columns()];
        costs[..self.nr_structural].copy_from_slice(structural);
        self.set_costs(costs);
    }

    fn set_costs(&mut self, costs: Vec<f64>) {
        self.relative_costs = costs.clone();
        for (row, &basic) in self.rows.iter().zip(&self.basis) {
            let cost = costs[basic];
            if cost != 0.0 {
                for (relative, value) in self.relative_costs.iter_mut().zip(row) {
                    *relative -= cost * value;
                }
            }
        }
        self.costs = costs;
    }

    /// Sum of the artificial variables.
    pub(crate) fn infeasibility(&self) -> f64 {
        (0..self.nr_rows).map(|row| self.values[self.artificial(row)]).sum()
    }

    /// Objective value under the current costs.
    pub(crate) fn objective(&self) -> f64 {
        self.costs.iter().zip(&self.values).map(|(cost, value)| cost * value).sum()
    }

    /// Run the primal simplex method until optimality, unboundedness or the iteration limit.
    pub(crate) fn run<PR: PivotRule>(&mut self, rule: &mut PR, iteration_limit: Option<usize>) -> Outcome {
        loop {
            if iteration_limit.is_some_and(|limit| self.iterations >= limit) {
                self.recompute_basic_values();
                return Outcome::IterationLimit;
            }

            let Some((column, direction)) = rule.select_primal_pivot_column(self) else {
                self.recompute_basic_values();
                return Outcome::Optimal;
            };

            match self.ratio_test(column, direction) {
                None => {
                    self.recompute_basic_values();
                    return Outcome::Unbounded { column, direction };
                }
                Some((step, leaving)) => self.step(column, direction, step, leaving),
            }
            self.iterations += 1;
        }
    }

    /// Largest step for the entering column and the row that limits it, `None` for a bound flip.
    fn ratio_test(&self, column: usize, direction: i8) -> Option<(f64, Option<usize>)> {
        let direction = f64::from(direction);

        let mut best: Option<(f64, Option<usize>)> = None;
        let range = self.upper[column] - self.lower[column];
        if range.is_finite() {
            best = Some((range, None));
        }

        for (row, values) in self.rows.iter().enumerate() {
            let alpha = direction * values[column];
            let basic = self.basis[row];
            let limit = if alpha > PIVOT_TOLERANCE && self.lower[basic].is_finite() {
                (self.values[basic] - self.lower[basic]).max(0.0) / alpha
            } else if alpha < -PIVOT_TOLERANCE && self.upper[basic].is_finite() {
                (self.upper[basic] - self.values[basic]).max(0.0) / -alpha
            } else {
                continue;
            };

            let better = match best {
                None => true,
                Some((step, None)) => limit < step,
                // Ties go to the smallest variable index
                Some((step, Some(other))) => limit < step || (limit == step && basic < self.basis[other]),
            };
            if better {
                best = Some((limit, Some(row)));
            }
        }

        best
    }

    fn step(&mut self, column: usize, direction: i8, step: f64, leaving: Option<usize>) {
        let delta = f64::from(direction) * step;
        self.values[column] += delta;
        for (row, values) in self.rows.iter().enumerate() {
            self.values[self.basis[row]] -= delta * values[column];
        }

        match leaving {
            None => {
                self.values[column] = if direction > 0 { self.upper[column] } else { self.lower[column] };
            }
            Some(row) => {
                let basic = self.basis[row];
                let decreasing = f64::from(direction) * self.rows[row][column] > 0.0;
                self.values[basic] = if decreasing { self.lower[basic] } else { self.upper[basic] };
                self.pivot(row, column);
            }
        }
    }

    fn pivot(&mut self, pivot_row: usize, column: usize) {
        trace!("Pivoting on row {pivot_row}, column {column}");

        let pivot = self.rows[pivot_row][column];
        for value in &mut self.rows[pivot_row] {
            *value /= pivot;
        }

        let pivot_values = self.rows[pivot_row].clone();
        for (row, values) in self.rows.iter_mut().enumerate() {
            let factor = values[column];
            if row != pivot_row && factor != 0.0 {
                for (value, pivot_value) in values.iter_mut().zip(&pivot_values) {
                    *value -= factor * pivot_value;
                }
                values[column] = 0.0;
            }
        }
        let factor = self.relative_costs[column];
        for (relative, pivot_value) in self.relative_costs.iter_mut().zip(&pivot_values) {
            *relative -= factor * pivot_value;
        }
        self.relative_costs[column] = 0.0;

        self.is_basic[self.basis[pivot_row]] = false;
        self.is_basic[column] = true;
        self.basis[pivot_row] = column;
    }

    /// Basic values from the nonbasic values, `x_B = -B^-1 N x_N`.
    fn recompute_basic_values(&mut self) {
        for (row, values) in self.rows.iter().enumerate() {
            let value = values.iter().zip(&self.values).zip(&self.is_basic)
                .filter(|&(_, &basic)| !basic)
                .map(|((coefficient, value), _)| coefficient * value)
                .sum::<f64>();
            self.values[self.basis[row]] = -value;
        }
    }

    /// Values of the structural variables.
    pub(crate) fn primal(&self) -> &[f64] {
        &self.values[..self.nr_structural]
    }

    /// Activities, the values of the logical variables.
    pub(crate) fn activities(&self) -> &[f64] {
        &self.values[self.nr_structural..self.nr_structural + self.nr_rows]
    }

    /// Relative costs of the structural variables.
    pub(crate) fn reduced_costs(&self) -> &[f64] {
        &self.relative_costs[..self.nr_structural]
    }

    /// `c_B B^-1`, read from the artificial columns.
    pub(crate) fn duals(&self) -> Vec<f64> {
        (0..self.nr_rows)
            .map(|i| {
                let column = self.artificial(i);
                let sum = self.rows.iter().zip(&self.basis)
                    .map(|(values, &basic)| self.costs[basic] * values[column])
                    .sum::<f64>();
                self.signs[i] * sum
            })
            .collect()
    }

    /// Structural part of the direction of unboundedness.
    pub(crate) fn ray(&self, column: usize, direction: i8) -> Vec<f64> {
        let direction = f64::from(direction);
        let mut ray = vec![0.0; self.nr_structural];
        if column < self.nr_structural {
            ray[column] = direction;
        }
        for (values, &basic) in self.rows.iter().zip(&self.basis) {
            if basic < self.nr_structural {
                ray[basic] = -direction * values[column];
            }
        }
        ray
    }

    /// Position of each structural and logical variable relative to its bounds.
    ///
    /// `0` at the lower bound, `1` basic, `2` at the upper bound and `3` free at zero.
    pub(crate) fn statuses(&self) -> Vec<u8> {
        (0..self.nr_structural + self.nr_rows)
            .map(|j| {
                if self.is_basic[j] {
                    1
                } else if self.lower[j].is_finite() && self.values[j] == self.lower[j] {
                    0
                } else if self.upper[j].is_finite() && self.values[j] == self.upper[j] {
                    2
                } else {
                    3
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use approx::assert_relative_eq;

    use crate::algorithm::simplex::strategy::pivot_rule::FirstProfitable;
    use crate::algorithm::simplex::tableau::{Outcome, Tableau};

    /// min -x - y s.t. x + y <= 4, x - y >= -2, 0 <= x <= 3, y >= 0
    fn tableau() -> Tableau {
        let columns = vec![vec![(0, 1.0), (1, 1.0)], vec![(0, 1.0), (1, -1.0)]];
        let lower = vec![0.0, 0.0, f64::NEG_INFINITY, -2.0];
        let upper = vec![3.0, f64::INFINITY, 4.0, f64::INFINITY];
        Tableau::new(2, &columns, lower, upper, 1e-9)
    }

    #[test]
    fn two_phases() {
        let mut tableau = tableau();
        tableau.set_phase_one_costs();
        assert_eq!(tableau.run(&mut FirstProfitable, None), Outcome::Optimal);
        assert_relative_eq!(tableau.infeasibility(), 0.0);

        tableau.set_phase_two_costs(&[-1.0, -1.0]);
        assert_eq!(tableau.run(&mut FirstProfitable, None), Outcome::Optimal);
        assert_relative_eq!(tableau.objective(), -4.0);
        let activities = tableau.activities();
        assert_relative_eq!(activities[0], 4.0);

        // The first row is tight, its dual is the objective gradient
        let duals = tableau.duals();
        assert_relative_eq!(duals[0], -1.0);
        assert_relative_eq!(duals[1], 0.0);
    }

    #[test]
    fn unbounded() {
        // min -x - y s.t. x - y <= 2, x, y >= 0
        let columns = vec![vec![(0, 1.0)], vec![(0, -1.0)]];
        let lower = vec![0.0, 0.0, f64::NEG_INFINITY];
        let upper = vec![f64::INFINITY, f64::INFINITY, 2.0];
        let mut tableau = Tableau::new(1, &columns, lower, upper, 1e-9);

        tableau.set_phase_one_costs();
        assert_eq!(tableau.run(&mut FirstProfitable, None), Outcome::Optimal);
        tableau.set_phase_two_costs(&[-1.0, -1.0]);
        match tableau.run(&mut FirstProfitable, None) {
            Outcome::Unbounded { column, direction } => {
                let ray = tableau.ray(column, direction);
                // Objective decreases along the ray, which stays within the row
                assert!(-ray[0] - ray[1] < 0.0);
                assert!(ray[0] - ray[1] <= 1e-9);
                assert!(ray[0] >= 0.0 && ray[1] >= 0.0);
            }
            outcome => panic!("{outcome:?}"),
        }
    }

    #[test]
    fn iteration_limit() {
        let mut tableau = tableau();
        tableau.set_phase_one_costs();
        tableau.run(&mut FirstProfitable, None);
        tableau.set_phase_two_costs(&[-1.0, -1.0]);
        assert_eq!(tableau.run(&mut FirstProfitable, Some(tableau.iterations())), Outcome::IterationLimit);
    }
}
