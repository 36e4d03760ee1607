//! # Solving
//!
//! The solver is asked to solve the flushed LP. When it reports a numerically unstable result, the
//! solve is repeated with increasingly conservative settings. After a trustworthy solve, the
//! solution values are copied into the columns and rows.
use log::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::lp::column::column_mut;
use crate::lp::row::{row_mut, row_ref};
use crate::lp::{Lp, LpStatus};
use crate::lpi::{IntegerParameter, LpSolverInterface, RealParameter, SimplexKind, SolverStatus};

impl<S: LpSolverInterface> Lp<S> {
    /// Flush and solve the LP.
    ///
    /// The dual simplex method is used when the current basis is dual feasible or not primal
    /// feasible, otherwise the primal simplex method.
    ///
    /// # Arguments
    ///
    /// * `fast_mip`: Whether the solver may use its fast mode. Ignored when the flush added or
    /// deleted columns.
    /// * `from_scratch`: Whether warm start information is discarded.
    pub fn solve(&mut self, fast_mip: bool, from_scratch: bool) -> Result<LpStatus> {
        self.flush()?;

        let fast_mip = fast_mip && !self.flush_added_columns && !self.flush_deleted_columns;
        let kind = if self.dual_feasible || !self.primal_feasible {
            SimplexKind::Dual
        } else {
            SimplexKind::Primal
        };
        self.solve_with(kind, fast_mip, from_scratch)?;

        Ok(self.status)
    }

    /// Solve stably and interpret the solver status.
    fn solve_with(&mut self, kind: SimplexKind, fast_mip: bool, from_scratch: bool) -> Result<()> {
        debug_assert!(self.flushed);
        self.solve_stable(kind, fast_mip, from_scratch)?;

        let infinity = self.settings.infinity;
        self.solved = true;
        self.primal_feasible = self.solver.is_primal_feasible();
        self.dual_feasible = self.solver.is_dual_feasible();
        self.valid_solution = None;
        self.valid_farkas = None;

        let (status, objective) = match self.solver.status() {
            SolverStatus::Optimal => {
                let objective = self.solver.objective_value();
                let limit = self.parameters.objective_limit;
                if !self.solver.is_infinity(limit) && self.settings.is_relative_ge(objective, limit) {
                    (LpStatus::ObjectiveLimit, infinity)
                } else {
                    (LpStatus::Optimal, objective)
                }
            }
            SolverStatus::ObjectiveLimit if self.last_simplex == SimplexKind::Primal => {
                self.status = LpStatus::Error;
                return Err(Error::SolverInconsistency(
                    "the primal simplex method stopped at the objective limit".to_string(),
                ));
            }
            SolverStatus::ObjectiveLimit => (LpStatus::ObjectiveLimit, infinity),
            SolverStatus::PrimalInfeasible => (LpStatus::Infeasible, infinity),
            SolverStatus::PrimalUnbounded => (LpStatus::Unbounded, -infinity),
            SolverStatus::IterationLimit => (LpStatus::IterationLimit, -infinity),
            SolverStatus::TimeLimit => (LpStatus::TimeLimit, -infinity),
            status @ (SolverStatus::NotSolved | SolverStatus::Error) => {
                self.status = LpStatus::Error;
                return Err(Error::SolverInconsistency(format!("unexpected solver status {status:?} after a solve")));
            }
        };
        debug!("Solved LP {} with status {status:?} and objective value {objective}", self.statistics.lp_count);
        self.status = status;
        self.lp_objective = objective;

        Ok(())
    }

    /// Solve, falling back to more conservative settings while the result is unstable.
    fn solve_stable(&mut self, kind: SimplexKind, fast_mip: bool, from_scratch: bool) -> Result<()> {
        let limit = if self.settings.is_infinity(self.cutoff_bound) {
            self.solver.infinity()
        } else {
            self.cutoff_bound - self.loose_objective.finite()
        };
        self.set_objective_limit(limit)?;
        self.set_feasibility_tolerance(self.settings.feasibility_tolerance)?;
        self.set_dual_feasibility_tolerance(self.settings.dual_feasibility_tolerance)?;
        self.set_from_scratch(from_scratch)?;
        self.set_fast_mip(fast_mip)?;
        self.set_scaling(self.settings.scaling)?;

        if self.simplex(kind)? {
            return Ok(());
        }

        if fast_mip {
            info!("Solving LP {} again with fast mode disabled", self.statistics.nr_lps);
            self.set_fast_mip(false)?;
            if self.simplex(kind)? {
                return Ok(());
            }
        }

        if !from_scratch {
            info!("Solving LP {} again from scratch", self.statistics.nr_lps);
            self.set_from_scratch(true)?;
            if self.simplex(kind)? {
                return Ok(());
            }
        }

        info!("Solving LP {} again with a tighter feasibility tolerance", self.statistics.nr_lps);
        self.set_feasibility_tolerance(0.001 * self.settings.feasibility_tolerance)?;
        if self.simplex(kind)? {
            return Ok(());
        }

        info!("Solving LP {} again with the {:?} simplex method", self.statistics.nr_lps, !kind);
        if self.simplex(!kind)? {
            return Ok(());
        }

        info!("Solving LP {} again with scaling {}", self.statistics.nr_lps, if self.settings.scaling { "off" } else { "on" });
        self.set_scaling(!self.settings.scaling)?;
        if self.simplex(kind)? {
            return Ok(());
        }

        info!("Solving LP {} again with the {:?} simplex method and toggled scaling", self.statistics.nr_lps, !kind);
        if self.simplex(!kind)? {
            return Ok(());
        }

        let lp = self.statistics.nr_lps;
        if let Some(directory) = &self.settings.unstable_lp_directory {
            let path = directory.join(format!("lp{lp}.lp"));
            error!("Writing unstable LP {lp} to {}", path.display());
            self.solver.write_lp(&path)?;
        }
        error!("LP {lp} could not be solved stably");
        self.status = LpStatus::Error;

        Err(Error::UnresolvedInstability { lp })
    }

    /// Run one simplex solve and count it.
    ///
    /// # Return value
    ///
    /// Whether the result is stable.
    fn simplex(&mut self, kind: SimplexKind) -> Result<bool> {
        debug!("Solving LP with the {kind:?} simplex method");
        self.statistics.lp_count += 1;
        match kind {
            SimplexKind::Primal => self.solver.solve_primal()?,
            SimplexKind::Dual => self.solver.solve_dual()?,
        }
        self.last_simplex = kind;

        let iterations = self.solver.iterations() as u64;
        if iterations > 0 {
            self.statistics.nr_lps += 1;
            self.statistics.lps[kind] += 1;
            self.statistics.iterations[kind] += iterations;
            if self.is_diving() {
                self.statistics.diving_lps += 1;
                self.statistics.diving_iterations += iterations;
            }
        }

        Ok(self.solver.is_stable())
    }

    fn set_objective_limit(&mut self, limit: f64) -> Result<()> {
        if limit != self.parameters.objective_limit {
            self.solver.set_real_parameter(RealParameter::UpperObjectiveLimit, limit)?;
            self.parameters.objective_limit = limit;
            self.solved = false;
        }

        Ok(())
    }

    fn set_feasibility_tolerance(&mut self, tolerance: f64) -> Result<()> {
        let current = self.parameters.feasibility_tolerance;
        if tolerance != current {
            self.solver.set_real_parameter(RealParameter::FeasibilityTolerance, tolerance)?;
            if tolerance < current && !self.lp_columns.is_empty() && !self.lp_rows.is_empty() {
                self.solved = false;
            }
            self.parameters.feasibility_tolerance = tolerance;
        }

        Ok(())
    }

    fn set_dual_feasibility_tolerance(&mut self, tolerance: f64) -> Result<()> {
        let current = self.parameters.dual_feasibility_tolerance;
        if tolerance != current {
            self.solver.set_real_parameter(RealParameter::DualFeasibilityTolerance, tolerance)?;
            if tolerance < current && !self.lp_columns.is_empty() && !self.lp_rows.is_empty() {
                self.solved = false;
            }
            self.parameters.dual_feasibility_tolerance = tolerance;
        }

        Ok(())
    }

    fn set_from_scratch(&mut self, from_scratch: bool) -> Result<()> {
        if from_scratch != self.parameters.from_scratch {
            self.solver.set_integer_parameter(IntegerParameter::FromScratch, from_scratch.into())?;
            self.parameters.from_scratch = from_scratch;
        }

        Ok(())
    }

    fn set_fast_mip(&mut self, fast_mip: bool) -> Result<()> {
        if fast_mip != self.parameters.fast_mip {
            self.solver.set_integer_parameter(IntegerParameter::FastMip, fast_mip.into())?;
            self.parameters.fast_mip = fast_mip;
        }

        Ok(())
    }

    fn set_scaling(&mut self, scaling: bool) -> Result<()> {
        if scaling != self.parameters.scaling {
            self.solver.set_integer_parameter(IntegerParameter::Scaling, scaling.into())?;
            self.parameters.scaling = scaling;
        }

        Ok(())
    }

    /// Solve the LP if needed and store the results in the columns and rows.
    ///
    /// An optimal solution that turns out not to be feasible is solved again, first without the
    /// fast mode and then from scratch. With `aging`, the ages of columns and rows are updated
    /// and obsolete ones are removed after an optimal solve, outside of dives.
    pub fn solve_and_eval(&mut self, aging: bool) -> Result<LpStatus> {
        let mut aging = aging;
        let mut fast_mip = self.settings.fast_mip;
        let mut from_scratch = false;

        loop {
            if !self.solved {
                self.solve(fast_mip, from_scratch)?;
            }

            match self.status {
                LpStatus::Optimal => {
                    let (primal_feasible, dual_feasible) = self.store_solution(self.settings.check_lp_feasibility)?;
                    if primal_feasible && dual_feasible {
                        if aging && !self.is_diving() {
                            self.update_ages()?;
                            self.remove_new_obsoletes()?;
                            if !self.solved {
                                aging = false;
                                continue;
                            }
                        }
                    } else if fast_mip {
                        info!("Solution of LP {} is not feasible, solving again without fast mode", self.statistics.nr_lps);
                        fast_mip = false;
                        self.solved = false;
                        continue;
                    } else if !from_scratch {
                        info!("Solution of LP {} is not feasible, solving again from scratch", self.statistics.nr_lps);
                        from_scratch = true;
                        self.solved = false;
                        continue;
                    } else {
                        warn!(
                            "Solution of LP {} is not feasible (primal: {primal_feasible}, dual: {dual_feasible})",
                            self.statistics.nr_lps,
                        );
                    }
                }
                LpStatus::Infeasible => self.store_farkas()?,
                LpStatus::Unbounded => self.store_unbounded_solution()?,
                LpStatus::ObjectiveLimit => {
                    self.store_solution(false)?;
                }
                LpStatus::IterationLimit | LpStatus::TimeLimit => {
                    info!("LP {} stopped early with status {:?}", self.statistics.nr_lps, self.status);
                }
                LpStatus::Error | LpStatus::NotSolved => {
                    return Err(Error::SolverInconsistency(format!("LP has status {:?} after a solve", self.status)));
                }
            }

            return Ok(self.status);
        }
    }

    /// Copy the solution of the solver into the columns and rows.
    ///
    /// # Arguments
    ///
    /// * `check`: Whether to verify primal and dual feasibility of the solution.
    ///
    /// # Return value
    ///
    /// Whether the solution is primal and dual feasible, always true without `check`.
    pub fn store_solution(&mut self, check: bool) -> Result<(bool, bool)> {
        let lp_count = self.statistics.lp_count;
        if self.valid_solution == Some(lp_count) {
            return Ok(self.solution_feasibility);
        }
        let solution = self.solver.solution()?;
        if solution.primal.len() != self.solver_columns.len() || solution.duals.len() != self.solver_rows.len() {
            return Err(Error::SolverInconsistency(format!(
                "solution of {} columns and {} rows for an LP with {} columns and {} rows",
                solution.primal.len(), solution.duals.len(), self.solver_columns.len(), self.solver_rows.len(),
            )));
        }

        let settings = &self.settings;
        let dual_positive = |value: f64| value > settings.dual_feasibility_tolerance;
        let dual_negative = |value: f64| value < -settings.dual_feasibility_tolerance;
        let (mut primal_feasible, mut dual_feasible) = (true, true);

        for (position, &handle) in self.solver_columns.iter().enumerate() {
            let column = column_mut(&mut self.columns, handle)?;
            let primal = solution.primal[position];
            let reduced_cost = solution.reduced_costs[position];
            column.primal = primal;
            column.reduced_cost = reduced_cost;
            column.valid_reduced_cost = Some(lp_count);

            if check {
                let (lower, upper) = (column.data.lower, column.data.upper);
                primal_feasible &= settings.is_feasible_ge(primal, lower) && settings.is_feasible_le(primal, upper);
                if settings.is_gt(primal, lower) {
                    dual_feasible &= !dual_positive(reduced_cost);
                }
                if settings.is_lt(primal, upper) {
                    dual_feasible &= !dual_negative(reduced_cost);
                }
            }
        }

        for (position, &handle) in self.solver_rows.iter().enumerate() {
            let row = row_mut(&mut self.rows, handle)?;
            let dual = solution.duals[position];
            let activity = solution.activities[position] + row.data.constant;
            row.dual = dual;
            row.activity = activity;
            row.valid_activity = Some(lp_count);

            if check {
                let (lhs, rhs) = (row.data.lhs, row.data.rhs);
                primal_feasible &= settings.is_feasible_ge(activity, lhs) && settings.is_feasible_le(activity, rhs);
                if settings.is_infinity(-lhs) {
                    dual_feasible &= !dual_positive(dual);
                }
                if settings.is_infinity(rhs) {
                    dual_feasible &= !dual_negative(dual);
                }
            }
        }

        self.valid_solution = Some(lp_count);
        self.solution_feasibility = (primal_feasible, dual_feasible);

        Ok(self.solution_feasibility)
    }

    /// Store a point far along the unbounded ray as the primal solution.
    ///
    /// Dual values are meaningless for an unbounded LP and are set to zero.
    pub(crate) fn store_unbounded_solution(&mut self) -> Result<()> {
        let lp_count = self.statistics.lp_count;
        if self.valid_solution == Some(lp_count) {
            return Ok(());
        }
        let solution = self.solver.solution()?;
        let ray = self.solver.primal_ray()?;
        if ray.len() != self.solver_columns.len() || solution.primal.len() != self.solver_columns.len() {
            return Err(Error::SolverInconsistency("primal ray doesn't match the columns".to_string()));
        }

        let mut ray_objective = 0.0;
        for (position, &handle) in self.solver_columns.iter().enumerate() {
            ray_objective += ray[position] * self.columns.get(handle).map_or(0.0, |column| column.data.objective);
        }
        if ray_objective >= 0.0 {
            return Err(Error::SolverInconsistency(format!("primal ray with objective {ray_objective} doesn't improve")));
        }
        let scale = -2.0 * self.settings.infinity / ray_objective;

        for (position, &handle) in self.solver_columns.iter().enumerate() {
            let column = column_mut(&mut self.columns, handle)?;
            column.primal = solution.primal[position] + scale * ray[position];
            column.valid_reduced_cost = None;
        }
        self.valid_solution = Some(lp_count);

        let rows = self.solver_rows.clone();
        for handle in rows {
            let mut activity = row_ref(&self.rows, handle)?.data.constant;
            for entry in &row_ref(&self.rows, handle)?.entries {
                activity += entry.value * self.columns.get(entry.column).map_or(0.0, |column| column.primal_value());
            }
            let row = row_mut(&mut self.rows, handle)?;
            row.activity = activity;
            row.valid_activity = Some(lp_count);
            row.dual = 0.0;
        }
        self.solution_feasibility = (true, false);

        Ok(())
    }

    /// Store the Farkas proof of infeasibility in the rows.
    pub(crate) fn store_farkas(&mut self) -> Result<()> {
        let lp_count = self.statistics.lp_count;
        if self.valid_farkas == Some(lp_count) {
            return Ok(());
        }
        let farkas = self.solver.dual_farkas()?;
        if farkas.len() != self.solver_rows.len() {
            return Err(Error::SolverInconsistency("Farkas proof doesn't match the rows".to_string()));
        }

        for (position, &handle) in self.solver_rows.iter().enumerate() {
            row_mut(&mut self.rows, handle)?.farkas = farkas[position];
        }
        self.valid_farkas = Some(lp_count);

        Ok(())
    }
}
