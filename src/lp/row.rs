//! # Rows
//!
//! Rows are shared: cut pools and search tree nodes capture them, and they are destroyed when the
//! last user releases them. A locked row can only be observed through a `LockedRow` view; all
//! mutation goes through a `MutableRow`, which can't be obtained for locked rows.
use std::cell::Cell;
use std::ops::Deref;

use crate::data::arena::{Arena, Handle};
use crate::data::linear_program::elements::Side;
use crate::error::{Error, Result};
use crate::lp::{Lp, LpStatus};
use crate::lp::column::{ColumnHandle, column_mut, column_ref};
use crate::lpi::LpSolverInterface;
use crate::settings::Settings;

/// Reference to a row owned by an `Lp`.
pub type RowHandle = Handle<Row>;

/// Description of a new row `lhs <= a x + constant <= rhs`.
#[derive(Clone, Debug, PartialEq)]
pub struct RowData {
    #[allow(missing_docs)]
    pub name: String,
    /// Coefficients, duplicates are summed.
    pub entries: Vec<(ColumnHandle, f64)>,
    #[allow(missing_docs)]
    pub lhs: f64,
    #[allow(missing_docs)]
    pub rhs: f64,
    #[allow(missing_docs)]
    pub constant: f64,
    /// Whether the row is only valid in the current subtree.
    pub local: bool,
    /// Whether the row may gain coefficients of columns that are created later.
    pub modifiable: bool,
    /// Whether the row may be removed from the LP when it is obsolete.
    pub removable: bool,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct RowEntry {
    pub(crate) column: ColumnHandle,
    /// Creation index of the column, the sort key.
    pub(crate) column_index: usize,
    pub(crate) problem_index: usize,
    pub(crate) value: f64,
    /// Position of the twin entry in the column, if linked.
    pub(crate) link: Option<usize>,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct RowChanges {
    pub(crate) lhs: bool,
    pub(crate) rhs: bool,
    pub(crate) coefficients: bool,
}

/// Norm statistics, kept up to date with every coefficient change.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) struct RowNorms {
    squared: f64,
    max_value: f64,
    nr_max_value: usize,
    min_value: f64,
    nr_min_value: usize,
    min_index: Option<usize>,
    max_index: Option<usize>,
}

impl RowNorms {
    fn add(&mut self, index: usize, value: f64, epsilon: f64) {
        let absolute = value.abs();
        self.squared += value * value;

        if self.nr_max_value == 0 || absolute - self.max_value > epsilon {
            self.max_value = absolute;
            self.nr_max_value = 1;
        } else if absolute - self.max_value >= -epsilon {
            self.nr_max_value += 1;
        }
        if self.nr_min_value == 0 || absolute - self.min_value < -epsilon {
            self.min_value = absolute;
            self.nr_min_value = 1;
        } else if absolute - self.min_value <= epsilon {
            self.nr_min_value += 1;
        }

        self.min_index = Some(self.min_index.map_or(index, |min| min.min(index)));
        self.max_index = Some(self.max_index.map_or(index, |max| max.max(index)));
    }

    /// Returns whether the statistics must be recomputed from the entries.
    #[must_use]
    fn remove(&mut self, index: usize, value: f64, epsilon: f64) -> bool {
        let absolute = value.abs();
        self.squared = (self.squared - value * value).max(0.0);

        if absolute - self.max_value >= -epsilon {
            self.nr_max_value = self.nr_max_value.saturating_sub(1);
        }
        if absolute - self.min_value <= epsilon {
            self.nr_min_value = self.nr_min_value.saturating_sub(1);
        }

        self.nr_max_value == 0 || self.nr_min_value == 0
            || self.min_index == Some(index) || self.max_index == Some(index)
    }

    fn recompute(entries: &[RowEntry], epsilon: f64) -> Self {
        let mut norms = Self::default();
        for entry in entries {
            norms.add(entry.column_index, entry.value, epsilon);
        }
        norms
    }
}

/// Cached minimal and maximal activity, valid for one state of the column bounds.
#[derive(Copy, Clone, Debug, PartialEq)]
struct ActivityBounds {
    domain_changes: u64,
    min: f64,
    max: f64,
}

/// Row of the LP matrix.
#[derive(Clone, Debug)]
pub struct Row {
    pub(crate) data: RowData,
    pub(crate) index: usize,
    pub(crate) entries: Vec<RowEntry>,
    pub(crate) sorted: bool,
    pub(crate) norms: RowNorms,

    pub(crate) nr_locks: u32,
    pub(crate) nr_uses: u32,

    pub(crate) position: Option<usize>,
    pub(crate) solver_position: Option<usize>,

    pub(crate) dual: f64,
    pub(crate) activity: f64,
    pub(crate) farkas: f64,
    pub(crate) valid_activity: Option<u64>,

    pseudo_activity: Cell<Option<(u64, f64)>>,
    activity_bounds: Cell<Option<ActivityBounds>>,

    pub(crate) age: u32,
    pub(crate) obsolete_node: Option<u64>,
    pub(crate) changes: RowChanges,
}

impl Row {
    fn new(data: RowData, index: usize) -> Self {
        Self {
            data: RowData { entries: Vec::new(), ..data },
            index,
            entries: Vec::new(),
            sorted: true,
            norms: RowNorms::default(),
            nr_locks: 0,
            nr_uses: 0,
            position: None,
            solver_position: None,
            dual: 0.0,
            activity: 0.0,
            farkas: 0.0,
            valid_activity: None,
            pseudo_activity: Cell::new(None),
            activity_bounds: Cell::new(None),
            age: 0,
            obsolete_node: None,
            changes: RowChanges::default(),
        }
    }

    #[allow(missing_docs)]
    pub fn name(&self) -> &str {
        &self.data.name
    }
    #[allow(missing_docs)]
    pub fn lhs(&self) -> f64 {
        self.data.lhs
    }
    #[allow(missing_docs)]
    pub fn rhs(&self) -> f64 {
        self.data.rhs
    }
    #[allow(missing_docs)]
    pub fn constant(&self) -> f64 {
        self.data.constant
    }
    #[allow(missing_docs)]
    pub fn is_local(&self) -> bool {
        self.data.local
    }
    #[allow(missing_docs)]
    pub fn is_modifiable(&self) -> bool {
        self.data.modifiable
    }
    #[allow(missing_docs)]
    pub fn is_removable(&self) -> bool {
        self.data.removable
    }
    #[allow(missing_docs)]
    pub fn is_locked(&self) -> bool {
        self.nr_locks > 0
    }

    /// Number of users that captured the row.
    pub fn nr_uses(&self) -> u32 {
        self.nr_uses
    }

    /// Order in which rows were created, unique over the lifetime of the `Lp`.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of nonzero coefficients.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(missing_docs)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Columns and coefficients, in no particular order.
    pub fn entries(&self) -> impl Iterator<Item = (ColumnHandle, f64)> + '_ {
        self.entries.iter().map(|entry| (entry.column, entry.value))
    }

    /// Coefficient of a column, zero if the column doesn't appear in the row.
    pub fn coefficient(&self, column: ColumnHandle) -> f64 {
        self.entries.iter().find(|entry| entry.column == column).map_or(0.0, |entry| entry.value)
    }

    /// Euclidean norm of the coefficients.
    pub fn norm(&self) -> f64 {
        self.norms.squared.sqrt()
    }

    /// Largest absolute coefficient, zero for an empty row.
    pub fn max_value(&self) -> f64 {
        self.norms.max_value
    }

    /// Smallest absolute coefficient, zero for an empty row.
    pub fn min_value(&self) -> f64 {
        self.norms.min_value
    }

    /// Smallest creation index of the columns in the row.
    pub fn min_index(&self) -> Option<usize> {
        self.norms.min_index
    }

    /// Largest creation index of the columns in the row.
    pub fn max_index(&self) -> Option<usize> {
        self.norms.max_index
    }

    /// Position in the logical LP, if the row is part of it.
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    /// Position in the LP solver, if the row was flushed.
    pub fn solver_position(&self) -> Option<usize> {
        self.solver_position
    }

    #[allow(missing_docs)]
    pub fn is_in_lp(&self) -> bool {
        self.position.is_some()
    }

    /// Dual value in the last LP solution, zero for rows that are not in the LP.
    pub fn dual_value(&self) -> f64 {
        if self.is_in_lp() { self.dual } else { 0.0 }
    }

    /// Multiplier of the row in the Farkas proof of the last infeasible LP.
    pub fn farkas(&self) -> f64 {
        if self.is_in_lp() { self.farkas } else { 0.0 }
    }

    /// Number of consecutive solves in which the row was not tight.
    pub fn age(&self) -> u32 {
        self.age
    }

    fn invalidate_activity_caches(&self) {
        self.pseudo_activity.set(None);
        self.activity_bounds.set(None);
    }

    fn add_norms(&mut self, index: usize, value: f64, epsilon: f64) {
        self.norms.add(index, value, epsilon);
    }

    fn remove_norms(&mut self, index: usize, value: f64, epsilon: f64) {
        if self.norms.remove(index, value, epsilon) {
            self.norms = RowNorms::recompute(&self.entries, epsilon);
        }
    }

    /// Update the statistics after the entry of `index` already changed from `old` to `new`.
    fn change_norms(&mut self, index: usize, old: f64, new: f64, epsilon: f64) {
        if self.norms.remove(index, old, epsilon) {
            // The entries hold the new value already
            self.norms = RowNorms::recompute(&self.entries, epsilon);
        } else {
            self.norms.add(index, new, epsilon);
        }
    }
}

/// Read access to a row that is locked against modification.
#[derive(Copy, Clone, Debug)]
pub struct LockedRow<'a> {
    row: &'a Row,
}

impl Deref for LockedRow<'_> {
    type Target = Row;

    fn deref(&self) -> &Self::Target {
        self.row
    }
}

/// Exclusive write access to an unlocked row.
///
/// Obtained from `Lp::row_mut`, which refuses locked rows and rows while diving.
pub struct MutableRow<'a, S> {
    pub(crate) lp: &'a mut Lp<S>,
    pub(crate) handle: RowHandle,
}

impl<S: LpSolverInterface> MutableRow<'_, S> {
    #[allow(missing_docs)]
    pub fn handle(&self) -> RowHandle {
        self.handle
    }

    /// The current state of the row.
    pub fn row(&self) -> Result<&Row> {
        row_ref(&self.lp.rows, self.handle)
    }

    /// Append a coefficient.
    ///
    /// The column learns about the entry right away when the row is in the LP, otherwise when
    /// the row is flushed to the solver.
    pub fn add_coefficient(&mut self, column: ColumnHandle, value: f64) -> Result<()> {
        column_ref(&self.lp.columns, column)?;
        if !self.lp.settings.is_zero(value) {
            let position = self.lp.row_push_entry(self.handle, column, value, None)?;
            if row_ref(&self.lp.rows, self.handle)?.is_in_lp() {
                self.lp.column_push_entry(column, self.handle, value, Some(position))?;
            }
        }

        Ok(())
    }

    /// Remove the coefficient of a column, also from the column when linked.
    pub fn delete_coefficient(&mut self, column: ColumnHandle) -> Result<()> {
        let position = self.lp.search_row_entry(self.handle, column)?
            .ok_or_else(|| Error::InvalidData(format!("row {:?} has no coefficient for column {column:?}", self.handle)))?;
        if let Some(link) = row_ref(&self.lp.rows, self.handle)?.entries[position].link {
            self.lp.column_delete_entry_at(column, link)?;
        }
        self.lp.row_delete_entry_at(self.handle, position)
    }

    /// Change the coefficient of a column, adding it when it doesn't exist.
    pub fn change_coefficient(&mut self, column: ColumnHandle, value: f64) -> Result<()> {
        match self.lp.search_row_entry(self.handle, column)? {
            None => self.add_coefficient(column, value),
            Some(position) => {
                if let Some(link) = row_ref(&self.lp.rows, self.handle)?.entries[position].link {
                    self.lp.column_change_entry_at(column, link, value)?;
                }
                self.lp.row_change_entry_at(self.handle, position, value)
            }
        }
    }

    /// Add `increment` to the coefficient of a column.
    pub fn increase_coefficient(&mut self, column: ColumnHandle, increment: f64) -> Result<()> {
        if self.lp.settings.is_zero(increment) {
            return Ok(());
        }
        let current = match self.lp.search_row_entry(self.handle, column)? {
            Some(position) => row_ref(&self.lp.rows, self.handle)?.entries[position].value,
            None => 0.0,
        };

        self.change_coefficient(column, current + increment)
    }

    #[allow(missing_docs)]
    pub fn change_lhs(&mut self, value: f64) -> Result<()> {
        self.lp.change_row_side(self.handle, Side::Left, value)
    }

    #[allow(missing_docs)]
    pub fn change_rhs(&mut self, value: f64) -> Result<()> {
        self.lp.change_row_side(self.handle, Side::Right, value)
    }

    /// Change both sides, for moves that pass the current opposite side.
    pub fn change_sides(&mut self, lhs: f64, rhs: f64) -> Result<()> {
        self.lp.change_row_sides(self.handle, lhs, rhs)
    }

    /// Change the constant, which the solver sees as a shift of both sides.
    pub fn change_constant(&mut self, value: f64) -> Result<()> {
        let row = row_ref(&self.lp.rows, self.handle)?;
        if self.lp.settings.is_eq(row.data.constant, value) {
            return Ok(());
        }
        if row.solver_position.is_some() {
            self.lp.side_changed(self.handle, Side::Left)?;
            self.lp.side_changed(self.handle, Side::Right)?;
        }
        let row = row_mut(&mut self.lp.rows, self.handle)?;
        row.data.constant = value;
        row.invalidate_activity_caches();
        row.valid_activity = None;

        Ok(())
    }

    /// Add a value to the constant.
    pub fn add_constant(&mut self, value: f64) -> Result<()> {
        let constant = row_ref(&self.lp.rows, self.handle)?.data.constant;
        self.change_constant(constant + value)
    }
}

pub(crate) fn stale_row(handle: RowHandle) -> Error {
    Error::InvalidData(format!("row {handle:?} doesn't exist"))
}

pub(crate) fn row_mut(rows: &mut Arena<Row>, handle: RowHandle) -> Result<&mut Row> {
    rows.get_mut(handle).ok_or_else(|| stale_row(handle))
}

pub(crate) fn row_ref(rows: &Arena<Row>, handle: RowHandle) -> Result<&Row> {
    rows.get(handle).ok_or_else(|| stale_row(handle))
}

impl<S: LpSolverInterface> Lp<S> {
    /// Create a row, captured once by the caller.
    ///
    /// # Errors
    ///
    /// `InvalidData` when the sides cross or an entry refers to a column that doesn't exist.
    pub fn create_row(&mut self, mut data: RowData) -> Result<RowHandle> {
        if data.lhs > data.rhs {
            return Err(Error::InvalidData(format!("row {} has lhs {} above rhs {}", data.name, data.lhs, data.rhs)));
        }
        let mut entries = Vec::with_capacity(data.entries.len());
        for (column, value) in data.entries.drain(..) {
            entries.push((column_ref(&self.columns, column)?.index, column, value));
        }
        entries.sort_by_key(|&(index, _, _)| index);
        let mut merged = Vec::<(ColumnHandle, f64)>::with_capacity(entries.len());
        for (_, column, value) in entries {
            match merged.last_mut() {
                Some((last, sum)) if *last == column => *sum += value,
                _ => merged.push((column, value)),
            }
        }

        let index = self.nr_created_rows;
        self.nr_created_rows += 1;
        let handle = self.rows.insert(Row::new(data, index));
        for (column, value) in merged {
            if !self.settings.is_zero(value) {
                self.row_push_entry(handle, column, value, None)?;
            }
        }
        row_mut(&mut self.rows, handle)?.nr_uses = 1;

        Ok(handle)
    }

    /// Access a row.
    pub fn row(&self, handle: RowHandle) -> Result<&Row> {
        row_ref(&self.rows, handle)
    }

    /// Write access to an unlocked row.
    ///
    /// # Errors
    ///
    /// `InvalidOperation` when the row is locked or the LP is diving.
    pub fn row_mut(&mut self, handle: RowHandle) -> Result<MutableRow<'_, S>> {
        if self.is_diving() {
            return Err(Error::InvalidOperation("rows can't change while diving".to_string()));
        }
        let row = row_ref(&self.rows, handle)?;
        if row.is_locked() {
            return Err(Error::InvalidOperation(format!("row {} is locked", row.data.name)));
        }

        Ok(MutableRow { lp: self, handle })
    }

    /// Read access to a locked row.
    pub fn locked_row(&self, handle: RowHandle) -> Result<LockedRow<'_>> {
        let row = row_ref(&self.rows, handle)?;
        if !row.is_locked() {
            return Err(Error::InvalidOperation(format!("row {} is not locked", row.data.name)));
        }

        Ok(LockedRow { row })
    }

    /// Forbid modifications of an unmodifiable row.
    pub fn lock_row(&mut self, handle: RowHandle) -> Result<()> {
        let row = row_mut(&mut self.rows, handle)?;
        if row.data.modifiable {
            return Err(Error::InvalidOperation(format!("modifiable row {} can't be locked", row.data.name)));
        }
        row.nr_locks += 1;

        Ok(())
    }

    /// Remove one lock of a row.
    pub fn unlock_row(&mut self, handle: RowHandle) -> Result<()> {
        let row = row_mut(&mut self.rows, handle)?;
        if row.data.modifiable || row.nr_locks == 0 {
            return Err(Error::InvalidOperation(format!("row {} has no lock to remove", row.data.name)));
        }
        row.nr_locks -= 1;

        Ok(())
    }

    /// Register an additional user of a row.
    pub fn capture_row(&mut self, handle: RowHandle) -> Result<()> {
        row_mut(&mut self.rows, handle)?.nr_uses += 1;
        Ok(())
    }

    /// Deregister a user of a row, destroying the row when it was the last one.
    ///
    /// A row that the solver still holds lives on until the flush that deletes it there.
    pub fn release_row(&mut self, handle: RowHandle) -> Result<()> {
        let row = row_mut(&mut self.rows, handle)?;
        debug_assert!(row.nr_uses > 0);
        row.nr_uses = row.nr_uses.saturating_sub(1);

        self.free_row_if_unused(handle)
    }

    pub(crate) fn free_row_if_unused(&mut self, handle: RowHandle) -> Result<()> {
        let row = row_ref(&self.rows, handle)?;
        if row.nr_uses > 0 || row.position.is_some() || row.solver_position.is_some() {
            return Ok(());
        }

        let columns = self.columns.iter().map(|(column, _)| column).collect::<Vec<_>>();
        for column in columns {
            while let Some(position) = self.columns.get(column)
                .and_then(|column| column.entries.iter().position(|entry| entry.row == handle)) {
                self.column_delete_entry_at(column, position)?;
            }
        }
        self.rows.remove(handle);

        Ok(())
    }

    /// Change one side of a row.
    ///
    /// # Errors
    ///
    /// `InvalidData` when the new side crosses the opposite one.
    pub(crate) fn change_row_side(&mut self, handle: RowHandle, side: Side, value: f64) -> Result<()> {
        let row = row_ref(&self.rows, handle)?;
        let (lhs, rhs) = match side {
            Side::Left => (value, row.data.rhs),
            Side::Right => (row.data.lhs, value),
        };

        self.change_row_sides(handle, lhs, rhs)
    }

    /// Change both sides of a row at once.
    ///
    /// # Errors
    ///
    /// `InvalidData` when `lhs` exceeds `rhs` by more than the tolerance.
    pub(crate) fn change_row_sides(&mut self, handle: RowHandle, lhs: f64, rhs: f64) -> Result<()> {
        if lhs - rhs > self.settings.epsilon {
            let name = &row_ref(&self.rows, handle)?.data.name;
            return Err(Error::InvalidData(format!("row {name} would get lhs {lhs} above rhs {rhs}")));
        }
        self.set_row_side(handle, Side::Left, lhs)?;
        self.set_row_side(handle, Side::Right, rhs)
    }

    fn set_row_side(&mut self, handle: RowHandle, side: Side, value: f64) -> Result<()> {
        let row = row_mut(&mut self.rows, handle)?;
        let current = match side {
            Side::Left => &mut row.data.lhs,
            Side::Right => &mut row.data.rhs,
        };
        if !self.settings.is_eq(*current, value) {
            *current = value;
            self.side_changed(handle, side)?;
        }

        Ok(())
    }

    /// Queue a side change for the solver if the row was flushed.
    pub(crate) fn side_changed(&mut self, handle: RowHandle, side: Side) -> Result<()> {
        let row = row_mut(&mut self.rows, handle)?;
        if row.solver_position.is_some() {
            match side {
                Side::Left => row.changes.lhs = true,
                Side::Right => row.changes.rhs = true,
            }
            self.changed_rows.push(handle);
            self.flushed = false;
            self.solved = false;
            self.primal_feasible = false;
            self.status = LpStatus::NotSolved;
        }

        Ok(())
    }

    /// Register a coefficient change of a row and column pair.
    ///
    /// Only relevant to the solver when both are flushed. The cheaper of the two first changed
    /// positions is moved, so that the next flush rebuilds as little as possible.
    pub(crate) fn coefficient_changed(&mut self, row: RowHandle, column: ColumnHandle) -> Result<()> {
        let row_data = row_ref(&self.rows, row)?;
        row_data.invalidate_activity_caches();
        let row_position = row_data.solver_position;
        let column_position = column_ref(&self.columns, column)?.solver_position;

        if let (Some(row_position), Some(column_position)) = (row_position, column_position) {
            if row_position >= self.first_changed_row {
                row_mut(&mut self.rows, row)?.changes.coefficients = true;
            } else if column_position >= self.first_changed_column {
                column_mut(&mut self.columns, column)?.changes.coefficients = true;
            } else if self.first_changed_row - row_position <= self.first_changed_column - column_position {
                row_mut(&mut self.rows, row)?.changes.coefficients = true;
                self.first_changed_row = row_position;
            } else {
                column_mut(&mut self.columns, column)?.changes.coefficients = true;
                self.first_changed_column = column_position;
            }

            self.flushed = false;
            self.solved = false;
            self.primal_feasible = false;
            self.dual_feasible = false;
            self.status = LpStatus::NotSolved;
        }

        Ok(())
    }

    /// Append an entry to a row, see `column_push_entry`.
    pub(crate) fn row_push_entry(
        &mut self,
        handle: RowHandle,
        column: ColumnHandle,
        value: f64,
        link: Option<usize>,
    ) -> Result<usize> {
        let column_data = column_ref(&self.columns, column)?;
        let (column_index, problem_index) = (column_data.index, column_data.data.problem_index);
        let row = row_mut(&mut self.rows, handle)?;
        if let Some(last) = row.entries.last() {
            row.sorted = row.sorted && last.column_index < column_index;
        }
        let position = row.entries.len();
        row.entries.push(RowEntry { column, column_index, problem_index, value, link });
        row.add_norms(column_index, value, self.settings.epsilon);

        if let Some(link) = link {
            column_mut(&mut self.columns, column)?.entries[link].link = Some(position);
        }
        self.coefficient_changed(handle, column)?;

        Ok(position)
    }

    /// Remove the entry at `position`, see `column_delete_entry_at`.
    pub(crate) fn row_delete_entry_at(&mut self, handle: RowHandle, position: usize) -> Result<()> {
        let row = row_mut(&mut self.rows, handle)?;
        let removed = row.entries.swap_remove(position);
        row.remove_norms(removed.column_index, removed.value, self.settings.epsilon);
        if let Some(moved) = row.entries.get(position).copied() {
            row.sorted = false;
            if let Some(link) = moved.link {
                column_mut(&mut self.columns, moved.column)?.entries[link].link = Some(position);
            }
        }

        self.coefficient_changed(handle, removed.column)
    }

    /// Change the value of the entry at `position`, removing it when the new value is zero.
    pub(crate) fn row_change_entry_at(&mut self, handle: RowHandle, position: usize, value: f64) -> Result<()> {
        if self.settings.is_zero(value) {
            return self.row_delete_entry_at(handle, position);
        }
        let epsilon = self.settings.epsilon;
        let row = row_mut(&mut self.rows, handle)?;
        let entry = row.entries[position];
        if !self.settings.is_eq(entry.value, value) {
            row.entries[position].value = value;
            row.change_norms(entry.column_index, entry.value, value, epsilon);
            self.coefficient_changed(handle, entry.column)?;
        }

        Ok(())
    }

    /// Sort the entries by column creation index, repairing the links of the twins.
    pub(crate) fn sort_row_entries(&mut self, handle: RowHandle) -> Result<()> {
        let row = row_mut(&mut self.rows, handle)?;
        if row.sorted {
            return Ok(());
        }
        row.entries.sort_unstable_by_key(|entry| entry.column_index);
        row.sorted = true;

        for (position, entry) in row.entries.iter().enumerate() {
            if let Some(link) = entry.link {
                column_mut(&mut self.columns, entry.column)?.entries[link].link = Some(position);
            }
        }

        Ok(())
    }

    /// Position of the entry of a column in a row.
    pub(crate) fn search_row_entry(&mut self, handle: RowHandle, column: ColumnHandle) -> Result<Option<usize>> {
        self.sort_row_entries(handle)?;
        let column_index = column_ref(&self.columns, column)?.index;
        let row = row_ref(&self.rows, handle)?;

        Ok(row.entries.binary_search_by_key(&column_index, |entry| entry.column_index).ok())
    }

    /// Insert every unlinked entry of the row into its column.
    pub(crate) fn link_row(&mut self, handle: RowHandle) -> Result<()> {
        let unlinked = row_ref(&self.rows, handle)?.entries.iter()
            .enumerate()
            .filter(|(_, entry)| entry.link.is_none())
            .map(|(position, entry)| (position, entry.column, entry.value))
            .collect::<Vec<_>>();
        for (position, column, value) in unlinked {
            self.column_push_entry(column, handle, value, Some(position))?;
        }

        Ok(())
    }

    /// Activity of a row in the last LP solution, including the constant.
    pub fn row_lp_activity(&self, handle: RowHandle) -> Result<f64> {
        let row = row_ref(&self.rows, handle)?;
        if row.valid_activity.is_some() && row.valid_activity == self.valid_solution {
            return Ok(row.activity);
        }

        let mut activity = row.data.constant;
        for entry in &row.entries {
            activity += entry.value * column_ref(&self.columns, entry.column)?.primal_value();
        }

        Ok(clamp_infinite(activity, &self.settings))
    }

    /// Distance of the LP activity to the nearest side, negative when violated.
    pub fn row_lp_feasibility(&self, handle: RowHandle) -> Result<f64> {
        let activity = self.row_lp_activity(handle)?;
        let row = row_ref(&self.rows, handle)?;

        Ok((row.data.rhs - activity).min(activity - row.data.lhs))
    }

    /// Activity of a row when every column is at its best bound.
    pub fn row_pseudo_activity(&self, handle: RowHandle) -> Result<f64> {
        let row = row_ref(&self.rows, handle)?;
        if let Some((domain_changes, activity)) = row.pseudo_activity.get() {
            if domain_changes == self.domain_changes {
                return Ok(activity);
            }
        }

        let mut activity = row.data.constant;
        for entry in &row.entries {
            activity += entry.value * column_ref(&self.columns, entry.column)?.best_bound();
        }
        let activity = clamp_infinite(activity, &self.settings);
        row.pseudo_activity.set(Some((self.domain_changes, activity)));

        Ok(activity)
    }

    /// Distance of the pseudo activity to the nearest side, negative when violated.
    pub fn row_pseudo_feasibility(&self, handle: RowHandle) -> Result<f64> {
        let activity = self.row_pseudo_activity(handle)?;
        let row = row_ref(&self.rows, handle)?;

        Ok((row.data.rhs - activity).min(activity - row.data.lhs))
    }

    /// Activity of a row for values of all problem variables, indexed by problem index.
    pub fn row_solution_activity(&self, handle: RowHandle, values: &[f64]) -> Result<f64> {
        let row = row_ref(&self.rows, handle)?;
        let mut activity = row.data.constant;
        for entry in &row.entries {
            let value = values.get(entry.problem_index).ok_or_else(|| Error::InvalidData(format!(
                "no value for variable {} among {} values", entry.problem_index, values.len(),
            )))?;
            activity += entry.value * value;
        }

        Ok(clamp_infinite(activity, &self.settings))
    }

    /// Distance of the activity for a solution to the nearest side, negative when violated.
    pub fn row_solution_feasibility(&self, handle: RowHandle, values: &[f64]) -> Result<f64> {
        let activity = self.row_solution_activity(handle, values)?;
        let row = row_ref(&self.rows, handle)?;

        Ok((row.data.rhs - activity).min(activity - row.data.lhs))
    }

    /// Smallest activity the row can attain within the column bounds.
    pub fn row_min_activity(&self, handle: RowHandle) -> Result<f64> {
        self.row_activity_bounds(handle).map(|bounds| bounds.min)
    }

    /// Largest activity the row can attain within the column bounds.
    pub fn row_max_activity(&self, handle: RowHandle) -> Result<f64> {
        self.row_activity_bounds(handle).map(|bounds| bounds.max)
    }

    fn row_activity_bounds(&self, handle: RowHandle) -> Result<ActivityBounds> {
        let row = row_ref(&self.rows, handle)?;
        if let Some(bounds) = row.activity_bounds.get() {
            if bounds.domain_changes == self.domain_changes {
                return Ok(bounds);
            }
        }

        let infinity = self.settings.infinity;
        let (mut min, mut max) = (0.0, 0.0);
        let (mut nr_min_infinite, mut nr_max_infinite) = (0, 0);
        for entry in &row.entries {
            let column = column_ref(&self.columns, entry.column)?;
            let (towards_min, towards_max) = if entry.value > 0.0 {
                (column.data.lower, column.data.upper)
            } else {
                (column.data.upper, column.data.lower)
            };
            if self.settings.is_infinity(towards_min.abs()) {
                nr_min_infinite += 1;
            } else {
                min += entry.value * towards_min;
            }
            if self.settings.is_infinity(towards_max.abs()) {
                nr_max_infinite += 1;
            } else {
                max += entry.value * towards_max;
            }
        }

        let bounds = ActivityBounds {
            domain_changes: self.domain_changes,
            min: if nr_min_infinite > 0 { -infinity } else { min + row.data.constant },
            max: if nr_max_infinite > 0 { infinity } else { max + row.data.constant },
        };
        row.activity_bounds.set(Some(bounds));

        Ok(bounds)
    }
}

fn clamp_infinite(value: f64, settings: &Settings) -> f64 {
    value.clamp(-settings.infinity, settings.infinity)
}
