//! # LP solver interface
//!
//! The contract between the relaxation manager and an LP solver. The manager keeps its own copy of
//! the problem and pushes changes in batches, so the interface only deals in solver positions:
//! columns and rows are numbered consecutively in the order in which they were added.
//!
//! The solver minimizes `c x` subject to `lhs <= A x <= rhs` and `lb <= x <= ub`.
use std::ops::{Not, Range};
use std::path::Path;

use enum_map::Enum;

use crate::data::linear_program::elements::Objective;
use crate::error::Result;

/// A column to be added to the solver.
#[derive(Clone, Debug, PartialEq)]
pub struct NewColumn {
    #[allow(missing_docs)]
    pub objective: f64,
    #[allow(missing_docs)]
    pub lower: f64,
    #[allow(missing_docs)]
    pub upper: f64,
    /// Solver row position and coefficient, only for rows that are already in the solver.
    pub entries: Vec<(usize, f64)>,
}

/// A row to be added to the solver.
#[derive(Clone, Debug, PartialEq)]
pub struct NewRow {
    #[allow(missing_docs)]
    pub lhs: f64,
    #[allow(missing_docs)]
    pub rhs: f64,
    /// Solver column position and coefficient.
    pub entries: Vec<(usize, f64)>,
}

/// Outcome of the last solve.
#[allow(missing_docs)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum SolverStatus {
    NotSolved,
    Optimal,
    PrimalInfeasible,
    PrimalUnbounded,
    ObjectiveLimit,
    IterationLimit,
    TimeLimit,
    Error,
}

/// The two flavours of the simplex method.
#[allow(missing_docs)]
#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum SimplexKind {
    Primal,
    Dual,
}

impl Not for SimplexKind {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            SimplexKind::Primal => SimplexKind::Dual,
            SimplexKind::Dual => SimplexKind::Primal,
        }
    }
}

/// Parameters with an integer value. Flags are `0` or `1`.
#[allow(missing_docs)]
#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum IntegerParameter {
    /// Ignore any warm start information.
    FromScratch,
    /// Trade accuracy for speed.
    FastMip,
    Scaling,
    /// Maximum number of simplex iterations of a single solve, negative for no limit.
    IterationLimit,
}

#[allow(missing_docs)]
#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum RealParameter {
    FeasibilityTolerance,
    DualFeasibilityTolerance,
    /// The dual simplex may stop once the objective value reaches this value.
    UpperObjectiveLimit,
}

/// Primal and dual values after a solve, indexed by solver position.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LpiSolution {
    #[allow(missing_docs)]
    pub objective: f64,
    /// Value per column.
    pub primal: Vec<f64>,
    /// Dual value per row.
    pub duals: Vec<f64>,
    /// `A x` per row.
    pub activities: Vec<f64>,
    /// Reduced cost per column.
    pub reduced_costs: Vec<f64>,
}

/// Warm start information of a solver, opaque to the caller.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LpiState {
    /// Number of columns when the state was taken.
    pub nr_columns: usize,
    /// Number of rows when the state was taken.
    pub nr_rows: usize,
    /// Solver specific data.
    pub data: Vec<u8>,
}

/// Operations an LP solver offers to the relaxation manager.
///
/// Positions passed in are assumed to be valid; implementations may panic otherwise.
pub trait LpSolverInterface {
    /// The value from which on values are treated as infinite.
    fn infinity(&self) -> f64;
    /// Whether a value is treated as infinite.
    fn is_infinity(&self, value: f64) -> bool {
        value >= self.infinity()
    }

    #[allow(missing_docs)]
    fn set_objective_sense(&mut self, sense: Objective);

    #[allow(missing_docs)]
    fn nr_columns(&self) -> usize;
    #[allow(missing_docs)]
    fn nr_rows(&self) -> usize;

    /// Append columns.
    fn add_columns(&mut self, columns: &[NewColumn]) -> Result<()>;
    /// Delete a range of columns, later columns move forward.
    fn delete_columns(&mut self, range: Range<usize>) -> Result<()>;
    /// Delete the marked columns.
    ///
    /// # Return value
    ///
    /// The new position of each column, `None` if it was deleted.
    fn delete_column_set(&mut self, delete: &[bool]) -> Result<Vec<Option<usize>>>;
    /// Append rows.
    fn add_rows(&mut self, rows: &[NewRow]) -> Result<()>;
    /// Delete a range of rows, later rows move forward.
    fn delete_rows(&mut self, range: Range<usize>) -> Result<()>;
    /// Delete the marked rows, see `delete_column_set`.
    fn delete_row_set(&mut self, delete: &[bool]) -> Result<Vec<Option<usize>>>;

    /// Change objective coefficients, `(position, value)`.
    fn change_objective(&mut self, changes: &[(usize, f64)]) -> Result<()>;
    /// Change column bounds, `(position, lower, upper)`.
    fn change_bounds(&mut self, changes: &[(usize, f64, f64)]) -> Result<()>;
    /// Change row sides, `(position, lhs, rhs)`.
    fn change_sides(&mut self, changes: &[(usize, f64, f64)]) -> Result<()>;

    /// Solve with the primal simplex method.
    fn solve_primal(&mut self) -> Result<()>;
    /// Solve with the dual simplex method.
    fn solve_dual(&mut self) -> Result<()>;

    #[allow(missing_docs)]
    fn status(&self) -> SolverStatus;
    /// Whether the last solve is numerically trustworthy.
    fn is_stable(&self) -> bool;
    /// Whether the final basis is primal feasible.
    fn is_primal_feasible(&self) -> bool;
    /// Whether the final basis is dual feasible.
    fn is_dual_feasible(&self) -> bool;
    #[allow(missing_docs)]
    fn objective_value(&self) -> f64;
    /// Values of the final basis.
    fn solution(&self) -> Result<LpiSolution>;
    /// Direction of unboundedness per column, after a `PrimalUnbounded` status.
    fn primal_ray(&self) -> Result<Vec<f64>>;
    /// Dual multipliers per row proving infeasibility, after a `PrimalInfeasible` status.
    fn dual_farkas(&self) -> Result<Vec<f64>>;
    /// Simplex iterations of the last solve.
    fn iterations(&self) -> usize;

    /// Warm start information.
    fn state(&self) -> Result<LpiState>;
    /// Restore warm start information taken at the current dimensions.
    fn set_state(&mut self, state: &LpiState) -> Result<()>;

    #[allow(missing_docs)]
    fn integer_parameter(&self, parameter: IntegerParameter) -> i64;
    #[allow(missing_docs)]
    fn set_integer_parameter(&mut self, parameter: IntegerParameter, value: i64) -> Result<()>;
    #[allow(missing_docs)]
    fn real_parameter(&self, parameter: RealParameter) -> f64;
    #[allow(missing_docs)]
    fn set_real_parameter(&mut self, parameter: RealParameter, value: f64) -> Result<()>;

    /// Write the problem to a file in LP format.
    fn write_lp(&self, path: &Path) -> Result<()>;
}
