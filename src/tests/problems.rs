//! Small LP relaxations with known solutions.
use crate::data::linear_program::elements::VariableType;
use crate::lp::{ColumnData, ColumnHandle, Lp, RowData, RowHandle};
use crate::lpi::LpSolverInterface;
use crate::settings::Settings;

pub const INFINITY: f64 = 1e20;

pub fn column_data(name: &str, problem_index: usize, objective: f64, lower: f64, upper: f64) -> ColumnData {
    ColumnData {
        name: name.to_string(),
        problem_index,
        variable_type: VariableType::Continuous,
        objective,
        lower,
        upper,
        removable: false,
    }
}

pub fn integer_column_data(name: &str, problem_index: usize, objective: f64, lower: f64, upper: f64) -> ColumnData {
    ColumnData { variable_type: VariableType::Integer, ..column_data(name, problem_index, objective, lower, upper) }
}

pub fn row_data(name: &str, entries: Vec<(ColumnHandle, f64)>, lhs: f64, rhs: f64) -> RowData {
    RowData {
        name: name.to_string(),
        entries,
        lhs,
        rhs,
        constant: 0.0,
        local: false,
        modifiable: false,
        removable: false,
    }
}

/// Create, add and release a row, such that the LP is its only user.
pub fn add_row<S: LpSolverInterface>(lp: &mut Lp<S>, data: RowData) -> RowHandle {
    let row = lp.create_row(data).unwrap();
    lp.add_row(row).unwrap();
    lp.release_row(row).unwrap();
    row
}

pub struct TwoConstraints<S> {
    pub lp: Lp<S>,
    pub columns: [ColumnHandle; 2],
    pub rows: [RowHandle; 2],
}

/// Minimize `-x0 - x1` subject to `x0 + 2 x1 <= 4`, `3 x0 + x1 <= 6` and `0 <= x <= 10`.
///
/// The optimum is `-2.8` at `(1.6, 1.2)` with duals `(-0.4, -0.2)`.
pub fn two_constraints<S: LpSolverInterface>(solver: S, settings: Settings) -> TwoConstraints<S> {
    let mut lp = Lp::new(solver, settings).unwrap();
    let x0 = lp.create_column(column_data("x0", 0, -1.0, 0.0, 10.0)).unwrap();
    let x1 = lp.create_column(column_data("x1", 1, -1.0, 0.0, 10.0)).unwrap();
    lp.add_column(x0).unwrap();
    lp.add_column(x1).unwrap();

    let r0 = add_row(&mut lp, row_data("r0", vec![(x0, 1.0), (x1, 2.0)], -INFINITY, 4.0));
    let r1 = add_row(&mut lp, row_data("r1", vec![(x0, 3.0), (x1, 1.0)], -INFINITY, 6.0));

    TwoConstraints { lp, columns: [x0, x1], rows: [r0, r1] }
}
