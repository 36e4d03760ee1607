use std::env;

use approx::assert_abs_diff_eq;

use crate::algorithm::simplex::DenseSimplex;
use crate::data::linear_program::elements::Objective;
use crate::lpi::{LpiState, LpSolverInterface, NewColumn, NewRow, RealParameter, SolverStatus};

/// x1 + 2 x2 <= 4, 3 x1 + x2 <= 6 with 0 <= x <= 10 and objective `-x1 - x2`.
fn two_constraints() -> DenseSimplex {
    let mut solver = DenseSimplex::new();
    let column = |objective| NewColumn { objective, lower: 0.0, upper: 10.0, entries: Vec::new() };
    solver.add_columns(&[column(-1.0), column(-1.0)]).unwrap();
    let infinity = solver.infinity();
    solver.add_rows(&[
        NewRow { lhs: -infinity, rhs: 4.0, entries: vec![(0, 1.0), (1, 2.0)] },
        NewRow { lhs: -infinity, rhs: 6.0, entries: vec![(0, 3.0), (1, 1.0)] },
    ]).unwrap();
    solver
}

#[test]
fn optimal() {
    let mut solver = two_constraints();
    solver.solve_primal().unwrap();

    assert_eq!(solver.status(), SolverStatus::Optimal);
    assert!(solver.is_primal_feasible());
    assert!(solver.is_dual_feasible());
    assert_abs_diff_eq!(solver.objective_value(), -2.8, epsilon = 1e-9);

    let solution = solver.solution().unwrap();
    assert_abs_diff_eq!(solution.primal[0], 1.6, epsilon = 1e-9);
    assert_abs_diff_eq!(solution.primal[1], 1.2, epsilon = 1e-9);
    assert_abs_diff_eq!(solution.activities[0], 4.0, epsilon = 1e-9);
    assert_abs_diff_eq!(solution.activities[1], 6.0, epsilon = 1e-9);
    assert_abs_diff_eq!(solution.duals[0], -0.4, epsilon = 1e-9);
    assert_abs_diff_eq!(solution.duals[1], -0.2, epsilon = 1e-9);
    for cost in solution.reduced_costs {
        assert_abs_diff_eq!(cost, 0.0, epsilon = 1e-9);
    }
}

#[test]
fn maximize() {
    let mut solver = two_constraints();
    solver.change_objective(&[(0, 1.0), (1, 1.0)]).unwrap();
    solver.set_objective_sense(Objective::Maximize);
    solver.solve_dual().unwrap();

    assert_eq!(solver.status(), SolverStatus::Optimal);
    assert_abs_diff_eq!(solver.objective_value(), 2.8, epsilon = 1e-9);
    let solution = solver.solution().unwrap();
    assert_abs_diff_eq!(solution.duals[0], 0.4, epsilon = 1e-9);
    assert_abs_diff_eq!(solution.duals[1], 0.2, epsilon = 1e-9);
}

#[test]
fn objective_limit_only_for_dual() {
    let mut solver = two_constraints();
    solver.set_real_parameter(RealParameter::UpperObjectiveLimit, -3.0).unwrap();

    solver.solve_primal().unwrap();
    assert_eq!(solver.status(), SolverStatus::Optimal);

    solver.solve_dual().unwrap();
    assert_eq!(solver.status(), SolverStatus::ObjectiveLimit);
    assert_eq!(solver.objective_value(), solver.infinity());
}

#[test]
fn infeasible() {
    let mut solver = DenseSimplex::new();
    solver.add_columns(&[NewColumn { objective: 1.0, lower: 0.0, upper: 1.0, entries: Vec::new() }]).unwrap();
    let infinity = solver.infinity();
    solver.add_rows(&[NewRow { lhs: 2.0, rhs: infinity, entries: vec![(0, 1.0)] }]).unwrap();
    solver.solve_dual().unwrap();

    assert_eq!(solver.status(), SolverStatus::PrimalInfeasible);
    assert!(!solver.is_primal_feasible());
    assert_eq!(solver.objective_value(), infinity);
    let farkas = solver.dual_farkas().unwrap();
    assert_eq!(farkas.len(), 1);
    assert!(farkas[0].abs() > 1e-9);
    assert!(solver.primal_ray().is_err());
}

#[test]
fn unbounded() {
    let mut solver = DenseSimplex::new();
    let infinity = solver.infinity();
    solver.add_columns(&[
        NewColumn { objective: -1.0, lower: 0.0, upper: infinity, entries: Vec::new() },
        NewColumn { objective: 0.0, lower: 0.0, upper: infinity, entries: Vec::new() },
    ]).unwrap();
    solver.add_rows(&[NewRow { lhs: -infinity, rhs: 1.0, entries: vec![(0, 1.0), (1, -1.0)] }]).unwrap();
    solver.solve_primal().unwrap();

    assert_eq!(solver.status(), SolverStatus::PrimalUnbounded);
    assert_eq!(solver.objective_value(), -infinity);
    let ray = solver.primal_ray().unwrap();
    assert!(ray[0] > 0.0);
    assert!(solver.dual_farkas().is_err());
}

#[test]
fn crossing_bounds() {
    let mut solver = DenseSimplex::new();
    solver.add_columns(&[NewColumn { objective: 1.0, lower: 2.0, upper: 1.0, entries: Vec::new() }]).unwrap();
    assert!(solver.solve_primal().is_err());
}

#[test]
fn delete_rows_and_columns() {
    let mut solver = two_constraints();
    let positions = solver.delete_row_set(&[true, false]).unwrap();
    assert_eq!(positions, vec![None, Some(0)]);
    assert_eq!(solver.nr_rows(), 1);
    assert!(solver.solution().is_err());

    solver.solve_primal().unwrap();
    assert_abs_diff_eq!(solver.objective_value(), -6.0, epsilon = 1e-9);

    solver.delete_columns(0..1).unwrap();
    assert_eq!(solver.nr_columns(), 1);
    solver.solve_primal().unwrap();
    let solution = solver.solution().unwrap();
    assert_abs_diff_eq!(solution.primal[0], 6.0, epsilon = 1e-9);
    assert!(solver.delete_columns(0..2).is_err());
}

#[test]
fn state() {
    let mut solver = two_constraints();
    solver.solve_dual().unwrap();
    let state = solver.state().unwrap();
    assert_eq!(state.nr_columns, 2);
    assert_eq!(state.nr_rows, 2);
    assert_eq!(state.data.len(), 4);
    assert!(solver.set_state(&state).is_ok());

    let wrong = LpiState { nr_columns: 3, ..state };
    assert!(solver.set_state(&wrong).is_err());
}

#[test]
fn write_lp() {
    let solver = two_constraints();
    let path = env::temp_dir().join("mipcore_dense_simplex_write_lp.lp");
    solver.write_lp(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("Minimize"));
    assert!(text.contains("Subject To"));
    assert!(text.contains(" r1: + 3 x0 + 1 x1 <= 6"));
    assert!(text.contains(" 0 <= x1 <= 10"));
    assert!(text.trim_end().ends_with("End"));
    std::fs::remove_file(&path).unwrap();
}
