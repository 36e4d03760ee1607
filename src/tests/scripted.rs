//! A solver that wraps `DenseSimplex`, counts modifications and reports instability on request.
use std::path::Path;

use crate::algorithm::simplex::DenseSimplex;
use crate::data::linear_program::elements::Objective;
use crate::error::Result;
use crate::lpi::{
    IntegerParameter, LpiSolution, LpiState, LpSolverInterface, NewColumn, NewRow, RealParameter, SimplexKind,
    SolverStatus,
};

/// Parameters in effect during one solve.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Attempt {
    pub kind: SimplexKind,
    pub fast_mip: bool,
    pub from_scratch: bool,
    pub feasibility_tolerance: f64,
    pub scaling: bool,
}

#[derive(Debug, Default)]
pub struct ScriptedSolver {
    inner: DenseSimplex,
    /// Number of upcoming solves that are reported as unstable.
    pub unstable_solves: usize,
    /// Number of calls that changed the problem or the state.
    pub modifications: usize,
    pub attempts: Vec<Attempt>,
    stable: bool,
}

impl ScriptedSolver {
    pub fn new() -> Self {
        Self { stable: true, ..Self::default() }
    }

    fn record(&mut self, kind: SimplexKind) {
        self.attempts.push(Attempt {
            kind,
            fast_mip: self.inner.integer_parameter(IntegerParameter::FastMip) != 0,
            from_scratch: self.inner.integer_parameter(IntegerParameter::FromScratch) != 0,
            feasibility_tolerance: self.inner.real_parameter(RealParameter::FeasibilityTolerance),
            scaling: self.inner.integer_parameter(IntegerParameter::Scaling) != 0,
        });
        self.stable = self.unstable_solves == 0;
        self.unstable_solves = self.unstable_solves.saturating_sub(1);
    }
}

impl LpSolverInterface for ScriptedSolver {
    fn infinity(&self) -> f64 {
        self.inner.infinity()
    }

    fn set_objective_sense(&mut self, sense: Objective) {
        self.modifications += 1;
        self.inner.set_objective_sense(sense)
    }

    fn nr_columns(&self) -> usize {
        self.inner.nr_columns()
    }

    fn nr_rows(&self) -> usize {
        self.inner.nr_rows()
    }

    fn add_columns(&mut self, columns: &[NewColumn]) -> Result<()> {
        self.modifications += 1;
        self.inner.add_columns(columns)
    }

    fn delete_columns(&mut self, range: std::ops::Range<usize>) -> Result<()> {
        self.modifications += 1;
        self.inner.delete_columns(range)
    }

    fn delete_column_set(&mut self, delete: &[bool]) -> Result<Vec<Option<usize>>> {
        self.modifications += 1;
        self.inner.delete_column_set(delete)
    }

    fn add_rows(&mut self, rows: &[NewRow]) -> Result<()> {
        self.modifications += 1;
        self.inner.add_rows(rows)
    }

    fn delete_rows(&mut self, range: std::ops::Range<usize>) -> Result<()> {
        self.modifications += 1;
        self.inner.delete_rows(range)
    }

    fn delete_row_set(&mut self, delete: &[bool]) -> Result<Vec<Option<usize>>> {
        self.modifications += 1;
        self.inner.delete_row_set(delete)
    }

    fn change_objective(&mut self, changes: &[(usize, f64)]) -> Result<()> {
        self.modifications += 1;
        self.inner.change_objective(changes)
    }

    fn change_bounds(&mut self, changes: &[(usize, f64, f64)]) -> Result<()> {
        self.modifications += 1;
        self.inner.change_bounds(changes)
    }

    fn change_sides(&mut self, changes: &[(usize, f64, f64)]) -> Result<()> {
        self.modifications += 1;
        self.inner.change_sides(changes)
    }

    fn solve_primal(&mut self) -> Result<()> {
        self.record(SimplexKind::Primal);
        self.inner.solve_primal()
    }

    fn solve_dual(&mut self) -> Result<()> {
        self.record(SimplexKind::Dual);
        self.inner.solve_dual()
    }

    fn status(&self) -> SolverStatus {
        self.inner.status()
    }

    fn is_stable(&self) -> bool {
        self.stable
    }

    fn is_primal_feasible(&self) -> bool {
        self.inner.is_primal_feasible()
    }

    fn is_dual_feasible(&self) -> bool {
        self.inner.is_dual_feasible()
    }

    fn objective_value(&self) -> f64 {
        self.inner.objective_value()
    }

    fn solution(&self) -> Result<LpiSolution> {
        self.inner.solution()
    }

    fn primal_ray(&self) -> Result<Vec<f64>> {
        self.inner.primal_ray()
    }

    fn dual_farkas(&self) -> Result<Vec<f64>> {
        self.inner.dual_farkas()
    }

    fn iterations(&self) -> usize {
        self.inner.iterations()
    }

    fn state(&self) -> Result<LpiState> {
        self.inner.state()
    }

    fn set_state(&mut self, state: &LpiState) -> Result<()> {
        self.modifications += 1;
        self.inner.set_state(state)
    }

    fn integer_parameter(&self, parameter: IntegerParameter) -> i64 {
        self.inner.integer_parameter(parameter)
    }

    fn set_integer_parameter(&mut self, parameter: IntegerParameter, value: i64) -> Result<()> {
        self.inner.set_integer_parameter(parameter, value)
    }

    fn real_parameter(&self, parameter: RealParameter) -> f64 {
        self.inner.real_parameter(parameter)
    }

    fn set_real_parameter(&mut self, parameter: RealParameter, value: f64) -> Result<()> {
        self.inner.set_real_parameter(parameter, value)
    }

    fn write_lp(&self, path: &Path) -> Result<()> {
        self.inner.write_lp(path)
    }
}
