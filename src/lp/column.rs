//! # Columns
//!
//! A column is the LP image of a problem variable. Its entries refer to rows through handles and,
//! once linked, to the position of the twin entry in that row.
use crate::data::arena::{Arena, Handle};
use crate::data::linear_program::elements::VariableType;
use crate::error::{Error, Result};
use crate::lp::{Lp, LpStatus};
use crate::lp::row::{RowHandle, row_mut};
use crate::lpi::LpSolverInterface;
use crate::settings::Settings;

/// Reference to a column owned by an `Lp`.
pub type ColumnHandle = Handle<Column>;

/// Description of the variable a column is created for.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnData {
    #[allow(missing_docs)]
    pub name: String,
    /// Index of the variable in the problem, used for dense vectors over all variables.
    pub problem_index: usize,
    #[allow(missing_docs)]
    pub variable_type: VariableType,
    #[allow(missing_docs)]
    pub objective: f64,
    #[allow(missing_docs)]
    pub lower: f64,
    #[allow(missing_docs)]
    pub upper: f64,
    /// Whether the column may be removed from the LP when it is obsolete.
    pub removable: bool,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct ColumnEntry {
    pub(crate) row: RowHandle,
    /// Creation index of the row, the sort key.
    pub(crate) row_index: usize,
    pub(crate) value: f64,
    /// Position of the twin entry in the row, if linked.
    pub(crate) link: Option<usize>,
}

/// Changes that were not yet communicated to the solver.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct ColumnChanges {
    pub(crate) objective: bool,
    pub(crate) lower: bool,
    pub(crate) upper: bool,
    pub(crate) coefficients: bool,
}

/// Column of the LP matrix.
#[derive(Clone, Debug)]
pub struct Column {
    pub(crate) data: ColumnData,
    pub(crate) index: usize,
    pub(crate) entries: Vec<ColumnEntry>,
    pub(crate) sorted: bool,

    pub(crate) position: Option<usize>,
    pub(crate) solver_position: Option<usize>,

    pub(crate) primal: f64,
    pub(crate) reduced_cost: f64,
    pub(crate) valid_reduced_cost: Option<u64>,

    pub(crate) age: u32,
    pub(crate) obsolete_node: Option<u64>,
    pub(crate) changes: ColumnChanges,
}

impl Column {
    pub(crate) fn new(data: ColumnData, index: usize) -> Self {
        Self {
            data,
            index,
            entries: Vec::new(),
            sorted: true,
            position: None,
            solver_position: None,
            primal: 0.0,
            reduced_cost: 0.0,
            valid_reduced_cost: None,
            age: 0,
            obsolete_node: None,
            changes: ColumnChanges::default(),
        }
    }

    #[allow(missing_docs)]
    pub fn name(&self) -> &str {
        &self.data.name
    }
    #[allow(missing_docs)]
    pub fn problem_index(&self) -> usize {
        self.data.problem_index
    }
    #[allow(missing_docs)]
    pub fn variable_type(&self) -> VariableType {
        self.data.variable_type
    }
    #[allow(missing_docs)]
    pub fn objective(&self) -> f64 {
        self.data.objective
    }
    #[allow(missing_docs)]
    pub fn lower(&self) -> f64 {
        self.data.lower
    }
    #[allow(missing_docs)]
    pub fn upper(&self) -> f64 {
        self.data.upper
    }
    #[allow(missing_docs)]
    pub fn is_removable(&self) -> bool {
        self.data.removable
    }

    /// Order in which columns were created, unique over the lifetime of the `Lp`.
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

    /// Rows and coefficients, in no particular order.
    pub fn entries(&self) -> impl Iterator<Item = (RowHandle, f64)> + '_ {
        self.entries.iter().map(|entry| (entry.row, entry.value))
    }

    /// Position in the logical LP, if the column is part of it.
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    /// Position in the LP solver, if the column was flushed.
    pub fn solver_position(&self) -> Option<usize> {
        self.solver_position
    }

    #[allow(missing_docs)]
    pub fn is_in_lp(&self) -> bool {
        self.position.is_some()
    }

    /// The bound that is best for the objective, lower for a nonnegative objective coefficient.
    pub fn best_bound(&self) -> f64 {
        if self.data.objective >= 0.0 {
            self.data.lower
        } else {
            self.data.upper
        }
    }

    /// Value in the last LP solution, zero for columns that are not in the LP.
    pub fn primal_value(&self) -> f64 {
        if self.is_in_lp() {
            self.primal
        } else {
            0.0
        }
    }

    /// Number of consecutive solves in which the column was zero.
    pub fn age(&self) -> u32 {
        self.age
    }
}

/// Contribution of a column to an objective value, `None` when it is infinite.
pub(crate) fn objective_contribution(objective: f64, lower: f64, upper: f64, settings: &Settings) -> Option<f64> {
    if objective > 0.0 {
        if settings.is_infinity(-lower) { None } else { Some(lower * objective) }
    } else if objective < 0.0 {
        if settings.is_infinity(upper) { None } else { Some(upper * objective) }
    } else {
        Some(0.0)
    }
}

pub(crate) fn stale_column(handle: ColumnHandle) -> Error {
    Error::InvalidData(format!("column {handle:?} doesn't exist"))
}

pub(crate) fn column_mut(columns: &mut Arena<Column>, handle: ColumnHandle) -> Result<&mut Column> {
    columns.get_mut(handle).ok_or_else(|| stale_column(handle))
}

pub(crate) fn column_ref(columns: &Arena<Column>, handle: ColumnHandle) -> Result<&Column> {
    columns.get(handle).ok_or_else(|| stale_column(handle))
}

/// Which bound of a column to change.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum ColumnField {
    Objective,
    Lower,
    Upper,
}

impl<S: LpSolverInterface> Lp<S> {
    /// Create a column for a variable.
    ///
    /// The column is not part of the LP until it is added with `add_column`.
    pub fn create_column(&mut self, data: ColumnData) -> Result<ColumnHandle> {
        if data.lower > data.upper {
            return Err(Error::InvalidData(format!(
                "column {} has lower bound {} above upper bound {}", data.name, data.lower, data.upper,
            )));
        }
        self.pseudo_objective.add(objective_contribution(data.objective, data.lower, data.upper, &self.settings));
        let index = self.nr_created_columns;
        self.nr_created_columns += 1;

        Ok(self.columns.insert(Column::new(data, index)))
    }

    /// Destroy a column that is not part of the LP, removing its coefficients from all rows.
    pub fn free_column(&mut self, handle: ColumnHandle) -> Result<()> {
        let column = column_ref(&self.columns, handle)?;
        if column.is_in_lp() || column.solver_position.is_some() {
            return Err(Error::InvalidOperation(format!("column {} is still part of the LP", column.data.name)));
        }
        let contribution = objective_contribution(column.data.objective, column.data.lower, column.data.upper, &self.settings);

        let rows = self.rows.iter().map(|(row, _)| row).collect::<Vec<_>>();
        for row in rows {
            while let Some(position) = self.rows.get(row)
                .and_then(|row| row.entries.iter().position(|entry| entry.column == handle)) {
                self.row_delete_entry_at(row, position)?;
            }
        }
        self.pseudo_objective.remove(contribution);
        self.columns.remove(handle);

        Ok(())
    }

    /// Access a column.
    pub fn column(&self, handle: ColumnHandle) -> Result<&Column> {
        column_ref(&self.columns, handle)
    }

    /// Add a coefficient to a column.
    ///
    /// The row learns about the entry right away when the column is in the LP, otherwise when the
    /// column is flushed to the solver.
    pub fn add_column_coefficient(&mut self, column: ColumnHandle, row: RowHandle, value: f64) -> Result<()> {
        self.check_column_coefficient_change(row)?;
        column_ref(&self.columns, column)?;
        if !self.settings.is_zero(value) {
            self.column_add_entry(column, row, value)?;
        }

        Ok(())
    }

    /// Remove a coefficient from a column and its linked row.
    pub fn delete_column_coefficient(&mut self, column: ColumnHandle, row: RowHandle) -> Result<()> {
        self.check_column_coefficient_change(row)?;
        let position = self.search_column_entry(column, row)?
            .ok_or_else(|| Error::InvalidData(format!("column {column:?} has no coefficient in row {row:?}")))?;
        if let Some(link) = column_ref(&self.columns, column)?.entries[position].link {
            self.row_delete_entry_at(row, link)?;
        }
        self.column_delete_entry_at(column, position)
    }

    /// Change a coefficient of a column, adding it when it doesn't exist.
    pub fn change_column_coefficient(&mut self, column: ColumnHandle, row: RowHandle, value: f64) -> Result<()> {
        self.check_column_coefficient_change(row)?;
        match self.search_column_entry(column, row)? {
            None => {
                if !self.settings.is_zero(value) {
                    self.column_add_entry(column, row, value)?;
                }
            }
            Some(position) => {
                if let Some(link) = column_ref(&self.columns, column)?.entries[position].link {
                    self.row_change_entry_at(row, link, value)?;
                }
                self.column_change_entry_at(column, position, value)?;
            }
        }

        Ok(())
    }

    /// Add `increment` to a coefficient of a column, which is zero when it doesn't exist.
    pub fn increase_column_coefficient(&mut self, column: ColumnHandle, row: RowHandle, increment: f64) -> Result<()> {
        if self.settings.is_zero(increment) {
            return Ok(());
        }
        self.check_column_coefficient_change(row)?;
        let current = self.search_column_entry(column, row)?
            .map(|position| self.columns.get(column).map_or(0.0, |column| column.entries[position].value))
            .unwrap_or(0.0);

        self.change_column_coefficient(column, row, current + increment)
    }

    fn check_column_coefficient_change(&self, row: RowHandle) -> Result<()> {
        if self.is_diving() {
            return Err(Error::InvalidOperation("coefficients can't change while diving".to_string()));
        }
        let row = self.rows.get(row).ok_or_else(|| Error::InvalidData(format!("row {row:?} doesn't exist")))?;
        if row.is_locked() {
            return Err(Error::InvalidOperation(format!("row {} is locked", row.data.name)));
        }

        Ok(())
    }

    /// Change the objective coefficient of a column.
    pub fn change_column_objective(&mut self, handle: ColumnHandle, value: f64) -> Result<()> {
        self.change_column_field(handle, ColumnField::Objective, value)
    }

    /// Change the lower bound of a column.
    pub fn change_column_lower(&mut self, handle: ColumnHandle, value: f64) -> Result<()> {
        self.change_column_field(handle, ColumnField::Lower, value)
    }

    /// Change the upper bound of a column.
    pub fn change_column_upper(&mut self, handle: ColumnHandle, value: f64) -> Result<()> {
        self.change_column_field(handle, ColumnField::Upper, value)
    }

    fn change_column_field(&mut self, handle: ColumnHandle, field: ColumnField, value: f64) -> Result<()> {
        let column = column_mut(&mut self.columns, handle)?;
        let data = &column.data;
        if let Some(dive) = &mut self.dive {
            dive.touched.entry(handle).or_insert((data.objective, data.lower, data.upper));
        }
        let old = objective_contribution(data.objective, data.lower, data.upper, &self.settings);

        let current = match field {
            ColumnField::Objective => &mut column.data.objective,
            ColumnField::Lower => &mut column.data.lower,
            ColumnField::Upper => &mut column.data.upper,
        };
        let differs = !self.settings.is_eq(*current, value);
        *current = value;

        let data = &column.data;
        let new = objective_contribution(data.objective, data.lower, data.upper, &self.settings);
        self.pseudo_objective.remove(old);
        self.pseudo_objective.add(new);
        self.domain_changes += 1;

        if differs && column.solver_position.is_some() {
            match field {
                ColumnField::Objective => column.changes.objective = true,
                ColumnField::Lower => column.changes.lower = true,
                ColumnField::Upper => column.changes.upper = true,
            }
            self.changed_columns.push(handle);
            self.flushed = false;
            self.solved = false;
            match field {
                ColumnField::Objective => self.dual_feasible = false,
                ColumnField::Lower | ColumnField::Upper => self.primal_feasible = false,
            }
            self.status = LpStatus::NotSolved;
        }

        Ok(())
    }

    /// Reduced cost of a column in the last LP solution.
    ///
    /// Computed from the dual values of the rows when the solver didn't provide it.
    pub fn column_reduced_cost(&self, handle: ColumnHandle) -> Result<f64> {
        let column = column_ref(&self.columns, handle)?;
        if column.valid_reduced_cost.is_some() && column.valid_reduced_cost == self.valid_solution {
            return Ok(column.reduced_cost);
        }

        let mut reduced_cost = column.data.objective;
        for entry in &column.entries {
            let row = self.rows.get(entry.row).ok_or_else(|| Error::InvalidData(format!("row {:?} doesn't exist", entry.row)))?;
            if row.is_in_lp() {
                reduced_cost -= entry.value * row.dual;
            }
        }

        Ok(reduced_cost)
    }

    /// How far the reduced cost of a column is from violating dual feasibility.
    ///
    /// Fixed columns are always dual feasible and have an infinite value.
    pub fn column_feasibility(&self, handle: ColumnHandle) -> Result<f64> {
        let column = column_ref(&self.columns, handle)?;
        let (lower, upper) = (column.data.lower, column.data.upper);
        let reduced_cost = self.column_reduced_cost(handle)?;

        Ok(if lower == upper {
            self.settings.infinity
        } else if lower >= 0.0 {
            reduced_cost
        } else if upper > 0.0 {
            -reduced_cost.abs()
        } else {
            -reduced_cost
        })
    }

    /// Coefficient of a column in the aggregated Farkas row of the last infeasible LP.
    pub fn column_farkas(&self, handle: ColumnHandle) -> Result<f64> {
        let column = column_ref(&self.columns, handle)?;
        if self.valid_farkas.is_none() {
            return Err(Error::InvalidOperation("no Farkas proof available".to_string()));
        }
        let mut farkas = 0.0;
        for entry in &column.entries {
            let row = self.rows.get(entry.row).ok_or_else(|| Error::InvalidData(format!("row {:?} doesn't exist", entry.row)))?;
            if row.is_in_lp() {
                farkas += entry.value * row.farkas;
            }
        }

        Ok(farkas * if farkas > 0.0 { column.data.upper } else { column.data.lower })
    }

    /// Add a new coefficient to a column, also to the row right away when the column is in the LP.
    fn column_add_entry(&mut self, column: ColumnHandle, row: RowHandle, value: f64) -> Result<()> {
        let position = self.column_push_entry(column, row, value, None)?;
        if column_ref(&self.columns, column)?.is_in_lp() {
            self.row_push_entry(row, column, value, Some(position))?;
        }

        Ok(())
    }

    /// Append an entry to a column.
    ///
    /// When the entry is linked, the twin in the row learns its position.
    pub(crate) fn column_push_entry(
        &mut self,
        handle: ColumnHandle,
        row: RowHandle,
        value: f64,
        link: Option<usize>,
    ) -> Result<usize> {
        let row_index = self.rows.get(row).ok_or_else(|| Error::InvalidData(format!("row {row:?} doesn't exist")))?.index;
        let column = column_mut(&mut self.columns, handle)?;
        if let Some(last) = column.entries.last() {
            column.sorted = column.sorted && last.row_index < row_index;
        }
        let position = column.entries.len();
        column.entries.push(ColumnEntry { row, row_index, value, link });

        if let Some(link) = link {
            row_mut(&mut self.rows, row)?.entries[link].link = Some(position);
        }
        self.coefficient_changed(row, handle)?;

        Ok(position)
    }

    /// Remove the entry at `position`, moving the last entry into its place.
    ///
    /// The twin of the removed entry, if any, is the responsibility of the caller.
    pub(crate) fn column_delete_entry_at(&mut self, handle: ColumnHandle, position: usize) -> Result<()> {
        let column = column_mut(&mut self.columns, handle)?;
        let removed = column.entries.swap_remove(position);
        if let Some(moved) = column.entries.get(position).copied() {
            column.sorted = false;
            if let Some(link) = moved.link {
                row_mut(&mut self.rows, moved.row)?.entries[link].link = Some(position);
            }
        }

        self.coefficient_changed(removed.row, handle)
    }

    /// Change the value of the entry at `position`, removing it when the new value is zero.
    pub(crate) fn column_change_entry_at(&mut self, handle: ColumnHandle, position: usize, value: f64) -> Result<()> {
        if self.settings.is_zero(value) {
            return self.column_delete_entry_at(handle, position);
        }
        let column = column_mut(&mut self.columns, handle)?;
        let entry = &mut column.entries[position];
        if !self.settings.is_eq(entry.value, value) {
            entry.value = value;
            let row = entry.row;
            self.coefficient_changed(row, handle)?;
        }

        Ok(())
    }

    /// Sort the entries by row creation index, repairing the links of the twins.
    pub(crate) fn sort_column_entries(&mut self, handle: ColumnHandle) -> Result<()> {
        let column = column_mut(&mut self.columns, handle)?;
        if column.sorted {
            return Ok(());
        }
        column.entries.sort_unstable_by_key(|entry| entry.row_index);
        column.sorted = true;

        for (position, entry) in column.entries.iter().enumerate() {
            if let Some(link) = entry.link {
                row_mut(&mut self.rows, entry.row)?.entries[link].link = Some(position);
            }
        }

        Ok(())
    }

    /// Position of the entry of a row in a column.
    pub(crate) fn search_column_entry(&mut self, handle: ColumnHandle, row: RowHandle) -> Result<Option<usize>> {
        self.sort_column_entries(handle)?;
        let row_index = self.rows.get(row).ok_or_else(|| Error::InvalidData(format!("row {row:?} doesn't exist")))?.index;
        let column = column_ref(&self.columns, handle)?;

        Ok(column.entries.binary_search_by_key(&row_index, |entry| entry.row_index).ok())
    }

    /// Insert every unlinked entry of the column into its row.
    pub(crate) fn link_column(&mut self, handle: ColumnHandle) -> Result<()> {
        let unlinked = column_ref(&self.columns, handle)?.entries.iter()
            .enumerate()
            .filter(|(_, entry)| entry.link.is_none())
            .map(|(position, entry)| (position, entry.row, entry.value))
            .collect::<Vec<_>>();
        for (position, row, value) in unlinked {
            let link = self.row_push_entry(row, handle, value, Some(position))?;
            debug_assert_eq!(self.columns.get(handle).and_then(|column| column.entries[position].link), Some(link));
        }

        Ok(())
    }
}
