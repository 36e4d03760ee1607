use approx::assert_abs_diff_eq;

use mipcore::algorithm::simplex::DenseSimplex;
use mipcore::data::linear_program::elements::VariableType;
use mipcore::lp::{ColumnData, ColumnHandle, Lp, LpStatus, RowData, RowHandle};
use mipcore::lpi::LpSolverInterface;
use mipcore::settings::Settings;

const INFINITY: f64 = 1e20;

fn column(name: &str, problem_index: usize, objective: f64, upper: f64) -> ColumnData {
    ColumnData {
        name: name.to_string(),
        problem_index,
        variable_type: VariableType::Continuous,
        objective,
        lower: 0.0,
        upper,
        removable: false,
    }
}

fn row(name: &str, entries: Vec<(ColumnHandle, f64)>, lhs: f64, rhs: f64) -> RowData {
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

fn add_row(lp: &mut Lp<DenseSimplex>, data: RowData) -> RowHandle {
    let handle = lp.create_row(data).unwrap();
    lp.add_row(handle).unwrap();
    lp.release_row(handle).unwrap();
    handle
}

#[test]
fn scale_row() {
    let mut lp = Lp::new(DenseSimplex::new(), Settings::default()).unwrap();
    let x1 = lp.create_column(column("x1", 0, 0.0, 10.0)).unwrap();
    let x2 = lp.create_column(column("x2", 1, 0.0, 10.0)).unwrap();
    lp.add_column(x1).unwrap();
    lp.add_column(x2).unwrap();
    let handle = add_row(&mut lp, row("r", vec![(x1, 2.0), (x2, -1.0)], 3.0, 7.0));

    lp.row_mut(handle).unwrap().scale(2.0, 1e-6).unwrap();

    let scaled = lp.row(handle).unwrap();
    assert_eq!(scaled.coefficient(x1), 4.0);
    assert_eq!(scaled.coefficient(x2), -2.0);
    assert_eq!((scaled.lhs(), scaled.rhs()), (6.0, 14.0));
    assert!(!lp.is_flushed());
}

#[test]
fn replace_a_column() {
    let mut lp = Lp::new(DenseSimplex::new(), Settings::default()).unwrap();
    let columns = [-1.0, -2.0, -3.0].into_iter()
        .enumerate()
        .map(|(i, objective)| lp.create_column(column(&format!("x{i}"), i, objective, 1.0)).unwrap())
        .collect::<Vec<_>>();
    for &handle in &columns {
        lp.add_column(handle).unwrap();
    }
    let capacity = add_row(&mut lp, row("capacity", columns.iter().map(|&c| (c, 1.0)).collect(), -INFINITY, 2.0));
    lp.flush().unwrap();
    assert_eq!(lp.solver().nr_columns(), 3);

    lp.remove_column(columns[1]).unwrap();
    let x3 = lp.create_column(column("x3", 3, -4.0, 1.0)).unwrap();
    let x4 = lp.create_column(column("x4", 4, 1.0, 1.0)).unwrap();
    lp.add_column_coefficient(x3, capacity, 1.0).unwrap();
    lp.add_column(x3).unwrap();
    lp.add_column(x4).unwrap();
    lp.flush().unwrap();

    assert_eq!(lp.nr_columns(), 4);
    assert_eq!(lp.solver().nr_columns(), 4);
    assert!(!lp.column(columns[1]).unwrap().is_in_lp());

    // The removed column would improve the objective, but only x2 and x3 take capacity.
    assert_eq!(lp.solve_and_eval(false).unwrap(), LpStatus::Optimal);
    assert_abs_diff_eq!(lp.objective_value(), -7.0, epsilon = 1e-9);
    assert_abs_diff_eq!(lp.column(x4).unwrap().primal_value(), 0.0, epsilon = 1e-9);
}

#[test]
fn dive() {
    let mut lp = Lp::new(DenseSimplex::new(), Settings::default()).unwrap();
    let x0 = lp.create_column(column("x0", 0, -1.0, 10.0)).unwrap();
    let x1 = lp.create_column(column("x1", 1, -1.0, 10.0)).unwrap();
    lp.add_column(x0).unwrap();
    lp.add_column(x1).unwrap();
    add_row(&mut lp, row("r0", vec![(x0, 1.0), (x1, 2.0)], -INFINITY, 4.0));
    add_row(&mut lp, row("r1", vec![(x0, 3.0), (x1, 1.0)], -INFINITY, 6.0));
    assert_eq!(lp.solve_and_eval(false).unwrap(), LpStatus::Optimal);
    assert_abs_diff_eq!(lp.objective_value(), -2.8, epsilon = 1e-9);

    let checkpoint = lp.start_dive().unwrap();
    assert!(lp.is_diving());
    lp.change_column_upper(x0, 1.0).unwrap();
    assert_eq!(lp.solve_and_eval(false).unwrap(), LpStatus::Optimal);
    assert_abs_diff_eq!(lp.objective_value(), -2.5, epsilon = 1e-9);
    assert!(lp.start_dive().is_err());

    assert_eq!(lp.restore(checkpoint).unwrap(), LpStatus::Optimal);
    assert!(!lp.is_diving());
    assert_eq!(lp.column(x0).unwrap().upper(), 10.0);
    assert_abs_diff_eq!(lp.objective_value(), -2.8, epsilon = 1e-9);
}

#[test]
fn released_rows_are_destroyed() {
    let mut lp = Lp::new(DenseSimplex::new(), Settings::default()).unwrap();
    let x = lp.create_column(column("x", 0, 1.0, 1.0)).unwrap();
    let handle = lp.create_row(row("r", vec![(x, 1.0)], 0.0, 1.0)).unwrap();
    assert_eq!(lp.row(handle).unwrap().len(), 1);
    lp.capture_row(handle).unwrap();
    lp.release_row(handle).unwrap();
    assert!(lp.row(handle).is_ok());

    lp.release_row(handle).unwrap();
    assert!(lp.row(handle).is_err());
    assert_eq!(lp.column(x).unwrap().len(), 0);
    assert!(lp.add_row(handle).is_err());
}
