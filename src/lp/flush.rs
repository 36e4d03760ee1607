//! # Flushing
//!
//! Sends the difference between the logical LP and the solver's copy to the solver. The steps run
//! in a fixed order: deletions first so that the remaining solver positions are valid, then value
//! changes of the surviving columns and rows, then additions. New columns are added before new
//! rows because the rows refer to solver column positions.
use log::debug;

use crate::error::Result;
use crate::lp::Lp;
use crate::lp::column::{column_mut, column_ref};
use crate::lp::row::{row_mut, row_ref};
use crate::lpi::{LpSolverInterface, NewColumn, NewRow};

impl<S: LpSolverInterface> Lp<S> {
    /// Synchronize the solver with the logical LP.
    ///
    /// Does nothing, and doesn't call the solver, when nothing changed since the last flush.
    pub fn flush(&mut self) -> Result<()> {
        if self.flushed {
            return Ok(());
        }
        debug!(
            "Flushing LP: {} of {} columns and {} of {} rows in the solver",
            self.solver_columns.len(), self.lp_columns.len(), self.solver_rows.len(), self.lp_rows.len(),
        );

        self.flush_added_columns = false;
        self.flush_deleted_columns = false;
        self.flush_added_rows = false;
        self.flush_deleted_rows = false;

        self.flush_delete_columns()?;
        self.flush_delete_rows()?;
        self.flush_change_columns()?;
        self.flush_change_rows()?;
        self.flush_add_columns()?;
        self.flush_add_rows()?;

        debug_assert_eq!(self.solver.nr_columns(), self.lp_columns.len());
        debug_assert_eq!(self.solver.nr_rows(), self.lp_rows.len());
        self.flushed = true;

        Ok(())
    }

    /// Value as the solver understands it, its own infinity for infinite values.
    fn to_solver(&self, value: f64) -> f64 {
        if self.settings.is_infinity(value) {
            self.solver.infinity()
        } else if self.settings.is_infinity(-value) {
            -self.solver.infinity()
        } else {
            value
        }
    }

    fn flush_delete_columns(&mut self) -> Result<()> {
        let nr_solver = self.solver_columns.len();
        let mut first = self.first_changed_column;
        while first < nr_solver && first < self.lp_columns.len() {
            let column = column_ref(&self.columns, self.lp_columns[first])?;
            if column.solver_position != Some(first) || column.changes.coefficients {
                break;
            }
            first += 1;
        }

        if first < nr_solver {
            debug!("Flushing column deletions {first}..{nr_solver}");
            debug_assert!(!self.is_diving());
            self.solver.delete_columns(first..nr_solver)?;
            for handle in self.solver_columns.drain(first..) {
                let column = column_mut(&mut self.columns, handle)?;
                column.solver_position = None;
                column.primal = 0.0;
                column.valid_reduced_cost = None;
                column.changes = Default::default();
            }
            self.flush_deleted_columns = true;
        }
        self.first_changed_column = first;

        Ok(())
    }

    fn flush_delete_rows(&mut self) -> Result<()> {
        let nr_solver = self.solver_rows.len();
        let mut first = self.first_changed_row;
        while first < nr_solver && first < self.lp_rows.len() {
            let row = row_ref(&self.rows, self.lp_rows[first])?;
            if row.solver_position != Some(first) || row.changes.coefficients {
                break;
            }
            first += 1;
        }

        if first < nr_solver {
            debug!("Flushing row deletions {first}..{nr_solver}");
            debug_assert!(!self.is_diving());
            self.solver.delete_rows(first..nr_solver)?;
            let deleted = self.solver_rows.drain(first..).collect::<Vec<_>>();
            for &handle in &deleted {
                let row = row_mut(&mut self.rows, handle)?;
                row.solver_position = None;
                row.dual = 0.0;
                row.valid_activity = None;
                row.changes = Default::default();
            }
            for handle in deleted {
                self.free_row_if_unused(handle)?;
            }
            self.flush_deleted_rows = true;
        }
        self.first_changed_row = first;

        Ok(())
    }

    fn flush_change_columns(&mut self) -> Result<()> {
        let mut objective_changes = Vec::new();
        let mut bound_changes = Vec::new();

        while let Some(handle) = self.changed_columns.pop() {
            let Some(column) = self.columns.get(handle) else { continue };
            let changes = column.changes;
            if let Some(position) = column.solver_position {
                if changes.objective {
                    objective_changes.push((position, column.data.objective));
                }
                if changes.lower || changes.upper {
                    bound_changes.push((position, self.to_solver(column.data.lower), self.to_solver(column.data.upper)));
                }
            }
            let column = column_mut(&mut self.columns, handle)?;
            column.changes.objective = false;
            column.changes.lower = false;
            column.changes.upper = false;
        }

        if !objective_changes.is_empty() {
            debug!("Flushing {} objective changes", objective_changes.len());
            self.solver.change_objective(&objective_changes)?;
        }
        if !bound_changes.is_empty() {
            debug!("Flushing {} bound changes", bound_changes.len());
            self.solver.change_bounds(&bound_changes)?;
        }

        Ok(())
    }

    fn flush_change_rows(&mut self) -> Result<()> {
        let mut side_changes = Vec::new();

        while let Some(handle) = self.changed_rows.pop() {
            let Some(row) = self.rows.get(handle) else { continue };
            if let Some(position) = row.solver_position {
                if row.changes.lhs || row.changes.rhs {
                    let constant = row.data.constant;
                    side_changes.push((
                        position,
                        self.to_solver(row.data.lhs - constant),
                        self.to_solver(row.data.rhs - constant),
                    ));
                }
            }
            let row = row_mut(&mut self.rows, handle)?;
            row.changes.lhs = false;
            row.changes.rhs = false;
        }

        if !side_changes.is_empty() {
            debug!("Flushing {} side changes", side_changes.len());
            self.solver.change_sides(&side_changes)?;
        }

        Ok(())
    }

    fn flush_add_columns(&mut self) -> Result<()> {
        let first = self.solver_columns.len();
        if first == self.lp_columns.len() {
            return Ok(());
        }
        debug_assert!(!self.is_diving());

        let mut new_columns = Vec::with_capacity(self.lp_columns.len() - first);
        for position in first..self.lp_columns.len() {
            let handle = self.lp_columns[position];
            self.link_column(handle)?;

            let column = column_mut(&mut self.columns, handle)?;
            column.solver_position = Some(position);
            column.primal = 0.0;
            column.valid_reduced_cost = None;
            column.changes = Default::default();

            let column = column_ref(&self.columns, handle)?;
            let mut entries = Vec::with_capacity(column.entries.len());
            for entry in &column.entries {
                if let Some(row_position) = row_ref(&self.rows, entry.row)?.solver_position {
                    entries.push((row_position, entry.value));
                }
            }
            new_columns.push(NewColumn {
                objective: column.data.objective,
                lower: self.to_solver(column.data.lower),
                upper: self.to_solver(column.data.upper),
                entries,
            });
            self.solver_columns.push(handle);
        }

        debug!("Flushing {} new columns", new_columns.len());
        self.solver.add_columns(&new_columns)?;
        self.first_changed_column = self.solver_columns.len();
        self.flush_added_columns = true;

        Ok(())
    }

    fn flush_add_rows(&mut self) -> Result<()> {
        let first = self.solver_rows.len();
        if first == self.lp_rows.len() {
            return Ok(());
        }
        debug_assert!(!self.is_diving());

        let mut new_rows = Vec::with_capacity(self.lp_rows.len() - first);
        for position in first..self.lp_rows.len() {
            let handle = self.lp_rows[position];
            self.link_row(handle)?;

            let row = row_mut(&mut self.rows, handle)?;
            row.solver_position = Some(position);
            row.dual = 0.0;
            row.valid_activity = None;
            row.changes = Default::default();

            let row = row_ref(&self.rows, handle)?;
            let mut entries = Vec::with_capacity(row.entries.len());
            for entry in &row.entries {
                if let Some(column_position) = column_ref(&self.columns, entry.column)?.solver_position {
                    entries.push((column_position, entry.value));
                }
            }
            let constant = row.data.constant;
            new_rows.push(NewRow {
                lhs: self.to_solver(row.data.lhs - constant),
                rhs: self.to_solver(row.data.rhs - constant),
                entries,
            });
            self.solver_rows.push(handle);
        }

        debug!("Flushing {} new rows", new_rows.len());
        self.solver.add_rows(&new_rows)?;
        self.first_changed_row = self.solver_rows.len();
        self.flush_added_rows = true;

        Ok(())
    }
}
