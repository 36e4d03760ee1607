//! # Aging and cleanup
//!
//! Columns that stay at zero and rows that stay inactive over several solves grow old. Old
//! removable columns and rows are removed from the LP, either as they age out or in an explicit
//! cleanup of all inactive ones.
use log::debug;

use crate::error::{Error, Result};
use crate::lp::column::{column_mut, column_ref};
use crate::lp::row::{row_mut, row_ref};
use crate::lp::{Lp, LpStatus};
use crate::lpi::LpSolverInterface;

impl<S: LpSolverInterface> Lp<S> {
    /// Increment the age of every column at zero and every row strictly between its sides.
    ///
    /// Active columns and rows get age zero. Requires a flushed LP with a stored solution.
    pub fn update_ages(&mut self) -> Result<()> {
        if !self.flushed || self.valid_solution != Some(self.statistics.lp_count) {
            return Err(Error::InvalidOperation("ages are updated from a stored solution of the flushed LP".to_string()));
        }

        for &handle in &self.solver_columns {
            let column = column_mut(&mut self.columns, handle)?;
            if column.primal == 0.0 {
                column.age += 1;
            } else {
                column.age = 0;
            }
        }
        for &handle in &self.solver_rows {
            let row = row_mut(&mut self.rows, handle)?;
            let (activity, lhs, rhs) = (row.activity, row.data.lhs, row.data.rhs);
            if self.settings.is_gt(activity, lhs) && self.settings.is_lt(activity, rhs) {
                row.age += 1;
            } else {
                row.age = 0;
            }
        }

        Ok(())
    }

    /// Remove obsolete columns and rows that were added at the current node.
    pub fn remove_new_obsoletes(&mut self) -> Result<()> {
        self.remove_obsoletes(self.first_new_column, self.first_new_row)
    }

    /// Remove all obsolete columns and rows.
    pub fn remove_all_obsoletes(&mut self) -> Result<()> {
        self.remove_obsoletes(0, 0)
    }

    fn remove_obsoletes(&mut self, first_column: usize, first_row: usize) -> Result<()> {
        self.check_not_diving("remove columns and rows")?;
        let node = self.node;

        let nr_columns = self.lp_columns.len();
        let mut delete_columns = vec![false; nr_columns];
        let mut nr_deleted_columns = 0;
        for position in first_column..nr_columns {
            let handle = self.lp_columns[position];
            let column = column_ref(&self.columns, handle)?;
            if column.data.removable
                && column.obsolete_node != Some(node)
                && column.age > self.settings.column_age_limit
                && self.settings.is_zero(column.best_bound())
            {
                delete_columns[position] = true;
                nr_deleted_columns += 1;
                column_mut(&mut self.columns, handle)?.obsolete_node = Some(node);
            }
        }

        let nr_rows = self.lp_rows.len();
        let mut delete_rows = vec![false; nr_rows];
        let mut nr_deleted_rows = 0;
        for position in first_row..nr_rows {
            let handle = self.lp_rows[position];
            let row = row_ref(&self.rows, handle)?;
            if row.data.removable && row.obsolete_node != Some(node) && row.age > self.settings.row_age_limit {
                delete_rows[position] = true;
                nr_deleted_rows += 1;
                row_mut(&mut self.rows, handle)?.obsolete_node = Some(node);
            }
        }

        if nr_deleted_columns > 0 {
            debug!("Removing {nr_deleted_columns} obsolete columns");
            self.delete_column_set(&delete_columns)?;
        }
        if nr_deleted_rows > 0 {
            debug!("Removing {nr_deleted_rows} obsolete rows");
            self.delete_row_set(&delete_rows)?;
        }

        Ok(())
    }

    /// Remove inactive columns and rows that were added at the current node, as far as the
    /// settings ask for it.
    pub fn cleanup_new(&mut self) -> Result<()> {
        let columns = self.settings.cleanup_columns.then_some(self.first_new_column);
        let rows = self.settings.cleanup_rows.then_some(self.first_new_row);
        self.cleanup(columns, rows)
    }

    /// Remove all inactive removable columns and rows.
    pub fn cleanup_all(&mut self) -> Result<()> {
        self.cleanup(Some(0), Some(0))
    }

    fn cleanup(&mut self, first_column: Option<usize>, first_row: Option<usize>) -> Result<()> {
        self.check_not_diving("remove columns and rows")?;
        if !self.solved || self.valid_solution != Some(self.statistics.lp_count) {
            return Err(Error::InvalidOperation("cleanup needs a stored solution of the current LP".to_string()));
        }

        if let Some(first) = first_column {
            let nr_columns = self.lp_columns.len();
            let mut delete = vec![false; nr_columns];
            let mut nr_deleted = 0;
            for position in first..nr_columns {
                let column = column_ref(&self.columns, self.lp_columns[position])?;
                if column.data.removable && column.primal == 0.0 && self.settings.is_zero(column.best_bound()) {
                    delete[position] = true;
                    nr_deleted += 1;
                }
            }
            if nr_deleted > 0 {
                debug!("Cleaning up {nr_deleted} inactive columns");
                self.delete_column_set(&delete)?;
            }
        }

        if let Some(first) = first_row {
            let nr_rows = self.lp_rows.len();
            let mut delete = vec![false; nr_rows];
            let mut nr_deleted = 0;
            for position in first..nr_rows {
                let row = row_ref(&self.rows, self.lp_rows[position])?;
                let (activity, lhs, rhs) = (row.activity, row.data.lhs, row.data.rhs);
                if row.data.removable && self.settings.is_gt(activity, lhs) && self.settings.is_lt(activity, rhs) {
                    delete[position] = true;
                    nr_deleted += 1;
                }
            }
            if nr_deleted > 0 {
                debug!("Cleaning up {nr_deleted} inactive rows");
                self.delete_row_set(&delete)?;
            }
        }

        Ok(())
    }

    /// Delete the columns marked in `delete`, indexed by LP position.
    ///
    /// The LP is flushed first, such that the solver can delete the same set and the surviving
    /// columns keep their relative order in both.
    pub fn delete_column_set(&mut self, delete: &[bool]) -> Result<()> {
        self.check_not_diving("remove columns and rows")?;
        if delete.len() != self.lp_columns.len() {
            return Err(Error::InvalidData(format!(
                "deletion mask of length {} for {} columns", delete.len(), self.lp_columns.len(),
            )));
        }
        self.flush()?;

        let new_positions = self.solver.delete_column_set(delete)?;
        let mut kept = Vec::with_capacity(self.lp_columns.len());
        for (position, &handle) in self.lp_columns.iter().enumerate() {
            let column = column_mut(&mut self.columns, handle)?;
            match new_positions.get(position).copied().flatten() {
                Some(new_position) => {
                    column.position = Some(new_position);
                    column.solver_position = Some(new_position);
                    kept.push(handle);
                }
                None => {
                    column.position = None;
                    column.solver_position = None;
                    column.primal = 0.0;
                    column.valid_reduced_cost = None;
                }
            }
        }
        self.lp_columns = kept;
        self.solver_columns = self.lp_columns.clone();

        let nr_columns = self.lp_columns.len();
        self.first_changed_column = nr_columns;
        self.first_new_column = self.first_new_column.min(nr_columns);
        self.solved = false;
        self.primal_feasible = false;
        self.status = LpStatus::NotSolved;

        Ok(())
    }

    /// Delete the rows marked in `delete`, indexed by LP position, releasing them.
    pub fn delete_row_set(&mut self, delete: &[bool]) -> Result<()> {
        self.check_not_diving("remove columns and rows")?;
        if delete.len() != self.lp_rows.len() {
            return Err(Error::InvalidData(format!(
                "deletion mask of length {} for {} rows", delete.len(), self.lp_rows.len(),
            )));
        }
        self.flush()?;

        let new_positions = self.solver.delete_row_set(delete)?;
        let mut kept = Vec::with_capacity(self.lp_rows.len());
        let mut deleted = Vec::new();
        for (position, &handle) in self.lp_rows.iter().enumerate() {
            let row = row_mut(&mut self.rows, handle)?;
            match new_positions.get(position).copied().flatten() {
                Some(new_position) => {
                    row.position = Some(new_position);
                    row.solver_position = Some(new_position);
                    kept.push(handle);
                }
                None => {
                    row.position = None;
                    row.solver_position = None;
                    row.dual = 0.0;
                    row.valid_activity = None;
                    deleted.push(handle);
                }
            }
        }
        self.lp_rows = kept;
        self.solver_rows = self.lp_rows.clone();

        let nr_rows = self.lp_rows.len();
        self.first_changed_row = nr_rows;
        self.first_new_row = self.first_new_row.min(nr_rows);
        self.solved = false;
        self.dual_feasible = false;
        self.status = LpStatus::NotSolved;

        for handle in deleted {
            self.release_row(handle)?;
        }

        Ok(())
    }
}
