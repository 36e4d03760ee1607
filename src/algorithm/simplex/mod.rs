//! # The simplex method
//!
//! A reference implementation of the LP solver interface. Problems are stored sparsely and solved
//! from scratch on a dense tableau with the two phase bounded primal simplex method, regardless
//! of the simplex variant requested. That makes it suitable for small relaxations and tests, not
//! for production sized problems.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::ops::Range;
use std::path::Path;

use enum_map::{EnumMap, enum_map};
use index_utils::remove_indices;
use log::debug;

use crate::algorithm::simplex::strategy::pivot_rule::{FirstProfitable, PivotRule};
use crate::algorithm::simplex::tableau::{Outcome, Tableau};
use crate::data::linear_program::elements::Objective;
use crate::error::{Error, Result};
use crate::lpi::{IntegerParameter, LpiSolution, LpiState, LpSolverInterface, NewColumn, NewRow, RealParameter, SimplexKind, SolverStatus};

pub(crate) mod strategy;
pub(crate) mod tableau;

/// Values at or beyond this magnitude are infinite.
const INFINITY: f64 = 1e20;

#[derive(Clone, Debug, PartialEq)]
struct StoredColumn {
    objective: f64,
    lower: f64,
    upper: f64,
    /// Row position and coefficient.
    entries: Vec<(usize, f64)>,
}

/// Results of the last solve, in terms of the original objective sense.
#[derive(Debug, Default)]
struct Results {
    solution: LpiSolution,
    ray: Option<Vec<f64>>,
    farkas: Option<Vec<f64>>,
    statuses: Vec<u8>,
    primal_feasible: bool,
    dual_feasible: bool,
}

/// Dense two phase simplex solver.
#[derive(Debug)]
pub struct DenseSimplex {
    sense: Objective,
    columns: Vec<StoredColumn>,
    /// `(lhs, rhs)` per row.
    rows: Vec<(f64, f64)>,

    integer_parameters: EnumMap<IntegerParameter, i64>,
    real_parameters: EnumMap<RealParameter, f64>,

    status: SolverStatus,
    iterations: usize,
    results: Results,
    /// Last state set, kept until the dimensions change.
    state: Option<LpiState>,
}

impl Default for DenseSimplex {
    fn default() -> Self {
        Self::new()
    }
}

impl DenseSimplex {
    /// Create an empty minimization problem.
    pub fn new() -> Self {
        Self {
            sense: Objective::Minimize,
            columns: Vec::new(),
            rows: Vec::new(),
            integer_parameters: enum_map!{
                IntegerParameter::FromScratch    => 0,
                IntegerParameter::FastMip        => 0,
                IntegerParameter::Scaling        => 1,
                IntegerParameter::IterationLimit => -1,
            },
            real_parameters: enum_map!{
                RealParameter::FeasibilityTolerance     => 1e-6,
                RealParameter::DualFeasibilityTolerance => 1e-9,
                RealParameter::UpperObjectiveLimit      => f64::INFINITY,
            },
            status: SolverStatus::NotSolved,
            iterations: 0,
            results: Results::default(),
            state: None,
        }
    }

    fn invalidate(&mut self) {
        self.status = SolverStatus::NotSolved;
        self.results = Results::default();
        self.state = None;
    }

    fn to_internal(value: f64) -> f64 {
        if value >= INFINITY {
            f64::INFINITY
        } else if value <= -INFINITY {
            f64::NEG_INFINITY
        } else {
            value
        }
    }

    fn to_external(value: f64) -> f64 {
        value.clamp(-INFINITY, INFINITY)
    }

    fn sense_factor(&self) -> f64 {
        match self.sense {
            Objective::Minimize => 1.0,
            Objective::Maximize => -1.0,
        }
    }

    fn solve(&mut self, kind: SimplexKind) -> Result<()> {
        let nr_rows = self.rows.len();
        debug!("Solving an LP with {} columns and {} rows ({kind:?} requested)", self.columns.len(), nr_rows);

        let columns = self.columns.iter().map(|column| column.entries.clone()).collect::<Vec<_>>();
        let lower = self.columns.iter().map(|column| Self::to_internal(column.lower))
            .chain(self.rows.iter().map(|&(lhs, _)| Self::to_internal(lhs)))
            .collect::<Vec<_>>();
        let upper = self.columns.iter().map(|column| Self::to_internal(column.upper))
            .chain(self.rows.iter().map(|&(_, rhs)| Self::to_internal(rhs)))
            .collect::<Vec<_>>();
        if lower.iter().zip(&upper).any(|(lower, upper)| lower > upper) {
            return Err(Error::Solver("a lower bound exceeds its upper bound".to_string()));
        }

        let limit = self.integer_parameters[IntegerParameter::IterationLimit];
        let limit = usize::try_from(limit).ok();
        let tolerance = self.real_parameters[RealParameter::FeasibilityTolerance];
        let dual_tolerance = self.real_parameters[RealParameter::DualFeasibilityTolerance];
        let factor = self.sense_factor();

        let mut tableau = Tableau::new(nr_rows, &columns, lower, upper, dual_tolerance);
        let mut rule = FirstProfitable::new();
        let mut results = Results::default();

        tableau.set_phase_one_costs();
        let phase_one = tableau.run(&mut rule, limit);
        let status = match phase_one {
            Outcome::IterationLimit => SolverStatus::IterationLimit,
            Outcome::Unbounded { .. } => {
                return Err(Error::Solver("phase one can't be unbounded".to_string()));
            }
            Outcome::Optimal if tableau.infeasibility() > tolerance => {
                results.farkas = Some(tableau.duals());
                results.dual_feasible = true;
                SolverStatus::PrimalInfeasible
            }
            Outcome::Optimal => {
                let costs = self.columns.iter().map(|column| factor * column.objective).collect::<Vec<_>>();
                tableau.set_phase_two_costs(&costs);
                results.primal_feasible = true;

                match tableau.run(&mut rule, limit) {
                    Outcome::Optimal => {
                        results.dual_feasible = true;
                        let objective = factor * tableau.objective();
                        let limit = self.real_parameters[RealParameter::UpperObjectiveLimit];
                        if kind == SimplexKind::Dual && objective > limit {
                            SolverStatus::ObjectiveLimit
                        } else {
                            SolverStatus::Optimal
                        }
                    }
                    Outcome::Unbounded { column, direction } => {
                        results.ray = Some(tableau.ray(column, direction));
                        SolverStatus::PrimalUnbounded
                    }
                    Outcome::IterationLimit => SolverStatus::IterationLimit,
                }
            }
        };

        let primal = tableau.primal().to_vec();
        results.solution = LpiSolution {
            objective: self.columns.iter().zip(&primal).map(|(column, value)| column.objective * value).sum(),
            primal,
            duals: tableau.duals().into_iter().map(|dual| factor * dual).collect(),
            activities: tableau.activities().to_vec(),
            reduced_costs: tableau.reduced_costs().iter().map(|cost| factor * cost).collect(),
        };
        results.statuses = tableau.statuses();

        debug!("Finished with status {status:?} after {} iterations", tableau.iterations());
        self.iterations = tableau.iterations();
        self.status = status;
        self.results = results;

        Ok(())
    }

    fn check_solved(&self) -> Result<()> {
        if self.status == SolverStatus::NotSolved {
            Err(Error::Solver("no solve since the last change".to_string()))
        } else {
            Ok(())
        }
    }

    fn remap_rows(&mut self, new_positions: &[Option<usize>]) {
        for column in &mut self.columns {
            column.entries.retain_mut(|(row, _)| match new_positions[*row] {
                Some(position) => {
                    *row = position;
                    true
                }
                None => false,
            });
        }
    }
}

fn positions_after_delete(delete: &[bool]) -> Vec<Option<usize>> {
    let mut next = 0;
    delete.iter()
        .map(|&deleted| if deleted {
            None
        } else {
            next += 1;
            Some(next - 1)
        })
        .collect()
}

impl LpSolverInterface for DenseSimplex {
    fn infinity(&self) -> f64 {
        INFINITY
    }

    fn set_objective_sense(&mut self, sense: Objective) {
        self.sense = sense;
        self.invalidate();
    }

    fn nr_columns(&self) -> usize {
        self.columns.len()
    }

    fn nr_rows(&self) -> usize {
        self.rows.len()
    }

    fn add_columns(&mut self, columns: &[NewColumn]) -> Result<()> {
        for column in columns {
            if let Some(&(row, _)) = column.entries.iter().find(|&&(row, _)| row >= self.rows.len()) {
                return Err(Error::Solver(format!("row {row} of {} rows", self.rows.len())));
            }
            self.columns.push(StoredColumn {
                objective: column.objective,
                lower: column.lower,
                upper: column.upper,
                entries: column.entries.clone(),
            });
        }
        self.invalidate();

        Ok(())
    }

    fn delete_columns(&mut self, range: Range<usize>) -> Result<()> {
        if range.end > self.columns.len() || range.start > range.end {
            return Err(Error::Solver(format!("column range {range:?} of {} columns", self.columns.len())));
        }
        self.columns.drain(range);
        self.invalidate();

        Ok(())
    }

    fn delete_column_set(&mut self, delete: &[bool]) -> Result<Vec<Option<usize>>> {
        if delete.len() != self.columns.len() {
            return Err(Error::Solver(format!("{} flags for {} columns", delete.len(), self.columns.len())));
        }
        let indices = delete.iter().enumerate().filter(|&(_, &deleted)| deleted).map(|(i, _)| i).collect::<Vec<_>>();
        remove_indices(&mut self.columns, &indices);
        self.invalidate();

        Ok(positions_after_delete(delete))
    }

    fn add_rows(&mut self, rows: &[NewRow]) -> Result<()> {
        for row in rows {
            if let Some(&(column, _)) = row.entries.iter().find(|&&(column, _)| column >= self.columns.len()) {
                return Err(Error::Solver(format!("column {column} of {} columns", self.columns.len())));
            }
            let position = self.rows.len();
            for &(column, value) in &row.entries {
                self.columns[column].entries.push((position, value));
            }
            self.rows.push((row.lhs, row.rhs));
        }
        self.invalidate();

        Ok(())
    }

    fn delete_rows(&mut self, range: Range<usize>) -> Result<()> {
        if range.end > self.rows.len() || range.start > range.end {
            return Err(Error::Solver(format!("row range {range:?} of {} rows", self.rows.len())));
        }
        let delete = (0..self.rows.len()).map(|row| range.contains(&row)).collect::<Vec<_>>();
        self.delete_row_set(&delete).map(|_| ())
    }

    fn delete_row_set(&mut self, delete: &[bool]) -> Result<Vec<Option<usize>>> {
        if delete.len() != self.rows.len() {
            return Err(Error::Solver(format!("{} flags for {} rows", delete.len(), self.rows.len())));
        }
        let indices = delete.iter().enumerate().filter(|&(_, &deleted)| deleted).map(|(i, _)| i).collect::<Vec<_>>();
        remove_indices(&mut self.rows, &indices);
        let positions = positions_after_delete(delete);
        self.remap_rows(&positions);
        self.invalidate();

        Ok(positions)
    }

    fn change_objective(&mut self, changes: &[(usize, f64)]) -> Result<()> {
        for &(column, value) in changes {
            self.columns.get_mut(column)
                .ok_or_else(|| Error::Solver(format!("no column {column}")))?
                .objective = value;
        }
        self.invalidate();

        Ok(())
    }

    fn change_bounds(&mut self, changes: &[(usize, f64, f64)]) -> Result<()> {
        for &(column, lower, upper) in changes {
            let stored = self.columns.get_mut(column).ok_or_else(|| Error::Solver(format!("no column {column}")))?;
            stored.lower = lower;
            stored.upper = upper;
        }
        self.invalidate();

        Ok(())
    }

    fn change_sides(&mut self, changes: &[(usize, f64, f64)]) -> Result<()> {
        for &(row, lhs, rhs) in changes {
            *self.rows.get_mut(row).ok_or_else(|| Error::Solver(format!("no row {row}")))? = (lhs, rhs);
        }
        self.invalidate();

        Ok(())
    }

    fn solve_primal(&mut self) -> Result<()> {
        self.solve(SimplexKind::Primal)
    }

    fn solve_dual(&mut self) -> Result<()> {
        self.solve(SimplexKind::Dual)
    }

    fn status(&self) -> SolverStatus {
        self.status
    }

    fn is_stable(&self) -> bool {
        true
    }

    fn is_primal_feasible(&self) -> bool {
        self.results.primal_feasible
    }

    fn is_dual_feasible(&self) -> bool {
        self.results.dual_feasible
    }

    fn objective_value(&self) -> f64 {
        match self.status {
            SolverStatus::PrimalInfeasible | SolverStatus::ObjectiveLimit => INFINITY,
            SolverStatus::PrimalUnbounded => -INFINITY,
            _ => Self::to_external(self.results.solution.objective),
        }
    }

    fn solution(&self) -> Result<LpiSolution> {
        self.check_solved()?;
        Ok(self.results.solution.clone())
    }

    fn primal_ray(&self) -> Result<Vec<f64>> {
        self.results.ray.clone().ok_or_else(|| Error::Solver("no primal ray available".to_string()))
    }

    fn dual_farkas(&self) -> Result<Vec<f64>> {
        self.results.farkas.clone().ok_or_else(|| Error::Solver("no Farkas proof available".to_string()))
    }

    fn iterations(&self) -> usize {
        self.iterations
    }

    fn state(&self) -> Result<LpiState> {
        let data = if self.status == SolverStatus::NotSolved {
            match &self.state {
                Some(state) => state.data.clone(),
                None => vec![0; self.columns.len() + self.rows.len()],
            }
        } else {
            self.results.statuses.clone()
        };

        Ok(LpiState { nr_columns: self.columns.len(), nr_rows: self.rows.len(), data })
    }

    fn set_state(&mut self, state: &LpiState) -> Result<()> {
        let (nr_columns, nr_rows) = (self.columns.len(), self.rows.len());
        if state.nr_columns != nr_columns || state.nr_rows != nr_rows || state.data.len() != nr_columns + nr_rows {
            return Err(Error::Solver(format!(
                "state for {} columns and {} rows doesn't fit {nr_columns} columns and {nr_rows} rows",
                state.nr_columns, state.nr_rows,
            )));
        }
        self.invalidate();
        self.state = Some(state.clone());

        Ok(())
    }

    fn integer_parameter(&self, parameter: IntegerParameter) -> i64 {
        self.integer_parameters[parameter]
    }

    fn set_integer_parameter(&mut self, parameter: IntegerParameter, value: i64) -> Result<()> {
        self.integer_parameters[parameter] = value;
        Ok(())
    }

    fn real_parameter(&self, parameter: RealParameter) -> f64 {
        self.real_parameters[parameter]
    }

    fn set_real_parameter(&mut self, parameter: RealParameter, value: f64) -> Result<()> {
        if value.is_nan() {
            return Err(Error::Solver(format!("NaN for {parameter:?}")));
        }
        self.real_parameters[parameter] = value;
        Ok(())
    }

    fn write_lp(&self, path: &Path) -> Result<()> {
        let mut file = BufWriter::new(File::create(path)?);

        let term = |coefficient: f64, name: String| {
            if coefficient < 0.0 { format!(" - {} {name}", -coefficient) } else { format!(" + {coefficient} {name}") }
        };

        writeln!(file, "{}", match self.sense {
            Objective::Minimize => "Minimize",
            Objective::Maximize => "Maximize",
        })?;
        write!(file, " obj:")?;
        for (j, column) in self.columns.iter().enumerate() {
            write!(file, "{}", term(column.objective, format!("x{j}")))?;
        }
        writeln!(file)?;

        writeln!(file, "Subject To")?;
        let mut row_entries = vec![Vec::new(); self.rows.len()];
        for (j, column) in self.columns.iter().enumerate() {
            for &(row, value) in &column.entries {
                row_entries[row].push((j, value));
            }
        }
        for (i, (&(lhs, rhs), entries)) in self.rows.iter().zip(&row_entries).enumerate() {
            let expression = entries.iter().map(|&(j, value)| term(value, format!("x{j}"))).collect::<String>();
            let expression = if expression.is_empty() { " 0 x0".to_string() } else { expression };
            match (lhs > -INFINITY, rhs < INFINITY) {
                (true, true) if lhs == rhs => writeln!(file, " r{i}:{expression} = {rhs}")?,
                (true, true) => writeln!(file, " r{i}: {lhs} <={expression} <= {rhs}")?,
                (true, false) => writeln!(file, " r{i}:{expression} >= {lhs}")?,
                (false, true) => writeln!(file, " r{i}:{expression} <= {rhs}")?,
                (false, false) => writeln!(file, " r{i}:{expression} >= -inf")?,
            }
        }

        writeln!(file, "Bounds")?;
        for (j, column) in self.columns.iter().enumerate() {
            match (column.lower > -INFINITY, column.upper < INFINITY) {
                (true, true) => writeln!(file, " {} <= x{j} <= {}", column.lower, column.upper)?,
                (true, false) => writeln!(file, " x{j} >= {}", column.lower)?,
                (false, true) => writeln!(file, " -inf <= x{j} <= {}", column.upper)?,
                (false, false) => writeln!(file, " x{j} free")?,
            }
        }
        writeln!(file, "End")?;
        file.flush()?;

        Ok(())
    }
}

#[cfg(test)]
mod test;
