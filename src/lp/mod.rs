//! # LP relaxation
//!
//! The LP relaxation of a mixed integer program changes a little between consecutive solves: a
//! few bounds change, some cuts are added and old ones disappear. This module keeps its own copy
//! of the LP as a matrix that is linked in both directions, columns know their rows and rows know
//! their columns, and synchronizes it with an LP solver only when needed.
//!
//! Three lists describe the state. The logical lists `lp_columns` and `lp_rows` are what the LP
//! should be. The solver lists hold what the solver currently has. Changes accumulate until
//! `flush` sends the difference, after which the two agree.
use enum_map::EnumMap;
use fifo_set::FIFOSet;
use log::debug;

use crate::data::arena::Arena;
use crate::error::{Error, Result};
use crate::lp::column::column_mut;
use crate::lp::dive::Dive;
use crate::lp::objective::ObjectiveSum;
use crate::lp::row::row_mut;
use crate::lpi::{IntegerParameter, LpSolverInterface, RealParameter, SimplexKind};
use crate::settings::Settings;

pub use column::{Column, ColumnData, ColumnHandle};
pub use dive::Checkpoint;
pub use mir::{MirCut, RowSum};
pub use row::{LockedRow, MutableRow, Row, RowData, RowHandle};

pub mod column;
pub mod row;
mod rational;
mod flush;
mod solve;
mod aging;
pub mod dive;
pub mod mir;
mod objective;

/// Outcome of the last LP solve.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum LpStatus {
    /// The LP changed since the last solve.
    NotSolved,
    #[allow(missing_docs)]
    Optimal,
    #[allow(missing_docs)]
    Infeasible,
    #[allow(missing_docs)]
    Unbounded,
    /// The objective value reached the cutoff bound.
    ObjectiveLimit,
    #[allow(missing_docs)]
    IterationLimit,
    #[allow(missing_docs)]
    TimeLimit,
    /// The solver reported something that can't be interpreted.
    Error,
}

/// Counters over the lifetime of an `Lp`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Statistics {
    /// Number of solver calls, also used to tag cached solution values.
    pub lp_count: u64,
    /// Number of solver calls that performed at least one iteration.
    pub nr_lps: u64,
    /// LPs per simplex kind.
    pub lps: EnumMap<SimplexKind, u64>,
    /// Simplex iterations per simplex kind.
    pub iterations: EnumMap<SimplexKind, u64>,
    /// LPs solved while diving.
    pub diving_lps: u64,
    /// Simplex iterations while diving.
    pub diving_iterations: u64,
}

/// The parameter values last set in the solver.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct SolverParameters {
    pub(crate) objective_limit: f64,
    pub(crate) feasibility_tolerance: f64,
    pub(crate) dual_feasibility_tolerance: f64,
    pub(crate) from_scratch: bool,
    pub(crate) fast_mip: bool,
    pub(crate) scaling: bool,
}

/// The LP relaxation, kept in sync with an LP solver.
pub struct Lp<S> {
    pub(crate) settings: Settings,
    pub(crate) solver: S,

    pub(crate) columns: Arena<Column>,
    pub(crate) rows: Arena<Row>,
    pub(crate) nr_created_columns: usize,
    pub(crate) nr_created_rows: usize,

    /// Columns in the LP, in order.
    pub(crate) lp_columns: Vec<ColumnHandle>,
    pub(crate) lp_rows: Vec<RowHandle>,
    /// Columns as the solver has them.
    pub(crate) solver_columns: Vec<ColumnHandle>,
    pub(crate) solver_rows: Vec<RowHandle>,
    /// First solver position that might not match the logical list.
    pub(crate) first_changed_column: usize,
    pub(crate) first_changed_row: usize,
    pub(crate) changed_columns: FIFOSet<ColumnHandle>,
    pub(crate) changed_rows: FIFOSet<RowHandle>,
    /// Columns and rows from this position on were added at the current node.
    pub(crate) first_new_column: usize,
    pub(crate) first_new_row: usize,

    pub(crate) flushed: bool,
    pub(crate) solved: bool,
    pub(crate) primal_feasible: bool,
    pub(crate) dual_feasible: bool,
    pub(crate) flush_added_columns: bool,
    pub(crate) flush_deleted_columns: bool,
    pub(crate) flush_added_rows: bool,
    pub(crate) flush_deleted_rows: bool,

    pub(crate) status: LpStatus,
    pub(crate) lp_objective: f64,
    pub(crate) loose_objective: ObjectiveSum,
    pub(crate) pseudo_objective: ObjectiveSum,
    pub(crate) cutoff_bound: f64,

    pub(crate) parameters: SolverParameters,
    pub(crate) last_simplex: SimplexKind,
    pub(crate) statistics: Statistics,
    /// Solve count at which the stored solution values were taken.
    pub(crate) valid_solution: Option<u64>,
    pub(crate) valid_farkas: Option<u64>,
    pub(crate) solution_feasibility: (bool, bool),
    /// Incremented with every bound or objective change, tags cached activity bounds.
    pub(crate) domain_changes: u64,

    pub(crate) node: u64,
    pub(crate) dive: Option<Dive>,
    pub(crate) nr_dives: u64,
}

impl<S: LpSolverInterface> Lp<S> {
    /// Create an empty LP on top of a solver that holds no columns and rows.
    pub fn new(solver: S, settings: Settings) -> Result<Self> {
        if solver.nr_columns() > 0 || solver.nr_rows() > 0 {
            return Err(Error::InvalidData(format!(
                "the solver already holds {} columns and {} rows", solver.nr_columns(), solver.nr_rows(),
            )));
        }
        let parameters = SolverParameters {
            objective_limit: solver.real_parameter(RealParameter::UpperObjectiveLimit),
            feasibility_tolerance: solver.real_parameter(RealParameter::FeasibilityTolerance),
            dual_feasibility_tolerance: solver.real_parameter(RealParameter::DualFeasibilityTolerance),
            from_scratch: solver.integer_parameter(IntegerParameter::FromScratch) != 0,
            fast_mip: solver.integer_parameter(IntegerParameter::FastMip) != 0,
            scaling: solver.integer_parameter(IntegerParameter::Scaling) != 0,
        };
        let cutoff_bound = settings.infinity;

        Ok(Self {
            settings,
            solver,
            columns: Arena::new(),
            rows: Arena::new(),
            nr_created_columns: 0,
            nr_created_rows: 0,
            lp_columns: Vec::new(),
            lp_rows: Vec::new(),
            solver_columns: Vec::new(),
            solver_rows: Vec::new(),
            first_changed_column: 0,
            first_changed_row: 0,
            changed_columns: std::iter::empty().collect(),
            changed_rows: std::iter::empty().collect(),
            first_new_column: 0,
            first_new_row: 0,
            flushed: true,
            solved: true,
            primal_feasible: true,
            dual_feasible: true,
            flush_added_columns: false,
            flush_deleted_columns: false,
            flush_added_rows: false,
            flush_deleted_rows: false,
            status: LpStatus::Optimal,
            lp_objective: 0.0,
            loose_objective: ObjectiveSum::default(),
            pseudo_objective: ObjectiveSum::default(),
            cutoff_bound,
            parameters,
            last_simplex: SimplexKind::Dual,
            statistics: Statistics::default(),
            valid_solution: None,
            valid_farkas: None,
            solution_feasibility: (true, true),
            domain_changes: 0,
            node: 0,
            dive: None,
            nr_dives: 0,
        })
    }

    #[allow(missing_docs)]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The underlying solver, for inspection.
    pub fn solver(&self) -> &S {
        &self.solver
    }

    #[allow(missing_docs)]
    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    #[allow(missing_docs)]
    pub fn status(&self) -> LpStatus {
        self.status
    }

    /// Whether the solver holds exactly the logical LP.
    pub fn is_flushed(&self) -> bool {
        self.flushed
    }

    /// Whether the last solve is still valid for the current LP.
    pub fn is_solved(&self) -> bool {
        self.solved
    }

    /// Whether the current basis is believed to be primal feasible.
    pub fn is_primal_feasible(&self) -> bool {
        self.primal_feasible
    }

    /// Whether the current basis is believed to be dual feasible.
    pub fn is_dual_feasible(&self) -> bool {
        self.dual_feasible
    }

    /// Objective value reported by the solver for the last solve, without the loose part.
    pub fn lp_objective_value(&self) -> f64 {
        self.lp_objective
    }

    /// Columns in the LP, in order.
    pub fn columns(&self) -> &[ColumnHandle] {
        &self.lp_columns
    }

    /// Rows in the LP, in order.
    pub fn rows(&self) -> &[RowHandle] {
        &self.lp_rows
    }

    #[allow(missing_docs)]
    pub fn nr_columns(&self) -> usize {
        self.lp_columns.len()
    }

    #[allow(missing_docs)]
    pub fn nr_rows(&self) -> usize {
        self.lp_rows.len()
    }

    /// Number of columns that the solver currently holds.
    pub fn nr_solver_columns(&self) -> usize {
        self.solver_columns.len()
    }

    /// Number of rows that the solver currently holds.
    pub fn nr_solver_rows(&self) -> usize {
        self.solver_rows.len()
    }

    /// Position of the first column that was added at the current node.
    pub fn first_new_column(&self) -> usize {
        self.first_new_column
    }

    /// Position of the first row that was added at the current node.
    pub fn first_new_row(&self) -> usize {
        self.first_new_row
    }

    /// Number of the search tree node the LP belongs to.
    pub fn node(&self) -> u64 {
        self.node
    }

    /// Move to another search tree node, which allows obsolete items to be removed again.
    pub fn set_node(&mut self, node: u64) {
        self.node = node;
    }

    #[allow(missing_docs)]
    pub fn is_diving(&self) -> bool {
        self.dive.is_some()
    }

    fn check_not_diving(&self, action: &str) -> Result<()> {
        if self.is_diving() {
            Err(Error::InvalidOperation(format!("can't {action} while diving")))
        } else {
            Ok(())
        }
    }

    /// Invalidate the current solution.
    pub(crate) fn mark_unsolved(&mut self) {
        self.flushed = false;
        self.solved = false;
        self.status = LpStatus::NotSolved;
    }

    /// Append a column to the LP.
    pub fn add_column(&mut self, handle: ColumnHandle) -> Result<()> {
        self.check_not_diving("add columns")?;
        let position = self.lp_columns.len();
        let column = column_mut(&mut self.columns, handle)?;
        if column.position.is_some() {
            return Err(Error::InvalidOperation(format!("column {} is already in the LP", column.data.name)));
        }
        debug!("Adding column {} at position {position}", column.data.name);
        column.position = Some(position);
        column.age = 0;
        self.lp_columns.push(handle);

        self.mark_unsolved();
        self.dual_feasible = false;

        Ok(())
    }

    /// Append a row to the LP, capturing it.
    pub fn add_row(&mut self, handle: RowHandle) -> Result<()> {
        self.check_not_diving("add rows")?;
        let position = self.lp_rows.len();
        let row = row_mut(&mut self.rows, handle)?;
        if row.position.is_some() {
            return Err(Error::InvalidOperation(format!("row {} is already in the LP", row.data.name)));
        }
        debug!("Adding row {} at position {position}", row.data.name);
        row.position = Some(position);
        row.age = 0;
        row.nr_uses += 1;
        self.lp_rows.push(handle);

        self.mark_unsolved();
        self.primal_feasible = false;

        Ok(())
    }

    /// Take a column out of the LP, at any position.
    ///
    /// The solver drops the column and all columns after it at the next flush, after which the
    /// remaining columns are added again.
    pub fn remove_column(&mut self, handle: ColumnHandle) -> Result<()> {
        self.check_not_diving("remove columns")?;
        let column = column_mut(&mut self.columns, handle)?;
        let position = column.position
            .ok_or_else(|| Error::InvalidOperation(format!("column {} is not in the LP", column.data.name)))?;
        column.position = None;
        self.lp_columns.remove(position);
        for (new_position, &moved) in self.lp_columns.iter().enumerate().skip(position) {
            column_mut(&mut self.columns, moved)?.position = Some(new_position);
        }

        self.first_changed_column = self.first_changed_column.min(position);
        self.first_new_column = self.first_new_column.min(self.lp_columns.len());
        self.mark_unsolved();
        self.primal_feasible = false;

        Ok(())
    }

    /// Take a row out of the LP, at any position, releasing it.
    pub fn remove_row(&mut self, handle: RowHandle) -> Result<()> {
        self.check_not_diving("remove rows")?;
        let row = row_mut(&mut self.rows, handle)?;
        let position = row.position
            .ok_or_else(|| Error::InvalidOperation(format!("row {} is not in the LP", row.data.name)))?;
        row.position = None;
        self.lp_rows.remove(position);
        for (new_position, &moved) in self.lp_rows.iter().enumerate().skip(position) {
            row_mut(&mut self.rows, moved)?.position = Some(new_position);
        }

        self.first_changed_row = self.first_changed_row.min(position);
        self.first_new_row = self.first_new_row.min(self.lp_rows.len());
        self.mark_unsolved();
        self.dual_feasible = false;

        self.release_row(handle)
    }

    /// Remove the columns from position `nr_columns` on.
    pub fn shrink_columns(&mut self, nr_columns: usize) -> Result<()> {
        if nr_columns >= self.lp_columns.len() {
            return Ok(());
        }
        self.check_not_diving("shrink the LP")?;
        debug!("Shrinking LP from {} to {nr_columns} columns", self.lp_columns.len());

        for handle in self.lp_columns.drain(nr_columns..) {
            column_mut(&mut self.columns, handle)?.position = None;
        }
        self.first_changed_column = self.first_changed_column.min(nr_columns);
        self.first_new_column = self.first_new_column.min(nr_columns);
        self.mark_unsolved();
        self.primal_feasible = false;

        Ok(())
    }

    /// Remove the rows from position `nr_rows` on, releasing them.
    pub fn shrink_rows(&mut self, nr_rows: usize) -> Result<()> {
        if nr_rows >= self.lp_rows.len() {
            return Ok(());
        }
        self.check_not_diving("shrink the LP")?;
        debug!("Shrinking LP from {} to {nr_rows} rows", self.lp_rows.len());

        let removed = self.lp_rows.drain(nr_rows..).collect::<Vec<_>>();
        for &handle in &removed {
            row_mut(&mut self.rows, handle)?.position = None;
        }
        self.first_changed_row = self.first_changed_row.min(nr_rows);
        self.first_new_row = self.first_new_row.min(nr_rows);
        self.mark_unsolved();
        self.dual_feasible = false;

        for handle in removed {
            self.release_row(handle)?;
        }

        Ok(())
    }

    /// Remove all columns and rows.
    pub fn clear(&mut self) -> Result<()> {
        self.shrink_columns(0)?;
        self.shrink_rows(0)
    }

    /// Mark the current columns and rows as the ones that existed before the current node.
    pub fn mark_size(&mut self) -> Result<()> {
        self.check_not_diving("mark the LP size")?;
        self.first_new_column = self.lp_columns.len();
        self.first_new_row = self.lp_rows.len();

        Ok(())
    }

    /// Verify that the links between columns and rows are mutual.
    #[cfg(test)]
    pub(crate) fn check_links(&self) -> Result<()> {
        for (handle, column) in self.columns.iter() {
            for (position, entry) in column.entries.iter().enumerate() {
                if let Some(link) = entry.link {
                    let twin = row::row_ref(&self.rows, entry.row)?.entries[link];
                    if twin.column != handle || twin.link != Some(position) || twin.value != entry.value {
                        return Err(Error::InvalidData(format!("column {handle:?} entry {position} is badly linked")));
                    }
                }
            }
        }
        for (handle, row) in self.rows.iter() {
            for (position, entry) in row.entries.iter().enumerate() {
                if let Some(link) = entry.link {
                    let twin = column::column_ref(&self.columns, entry.column)?.entries[link];
                    if twin.row != handle || twin.link != Some(position) {
                        return Err(Error::InvalidData(format!("row {handle:?} entry {position} is badly linked")));
                    }
                }
            }
        }

        Ok(())
    }
}
