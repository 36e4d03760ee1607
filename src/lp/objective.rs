//! # Objective bookkeeping
//!
//! Besides the value of the LP itself, the manager tracks the objective contribution of variables
//! that are not columns ("loose" variables, at their best bound) and the pseudo objective value of
//! all columns at their best bounds. Both are sums in which infinite terms are counted separately.
use crate::error::{Error, Result};
use crate::lp::column::{ColumnData, ColumnHandle, objective_contribution};
use crate::lp::{Lp, LpStatus};
use crate::lpi::LpSolverInterface;

/// Sum of objective contributions with separately counted infinite terms.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) struct ObjectiveSum {
    finite: f64,
    nr_infinite: usize,
}

impl ObjectiveSum {
    pub(crate) fn add(&mut self, contribution: Option<f64>) {
        match contribution {
            Some(value) => self.finite += value,
            None => self.nr_infinite += 1,
        }
    }

    pub(crate) fn remove(&mut self, contribution: Option<f64>) {
        match contribution {
            Some(value) => self.finite -= value,
            None => self.nr_infinite = self.nr_infinite.saturating_sub(1),
        }
    }

    /// The sum, minus infinity as soon as one term is infinite.
    pub(crate) fn value(&self, infinity: f64) -> f64 {
        if self.nr_infinite > 0 { -infinity } else { self.finite }
    }

    /// The sum of the finite terms only.
    pub(crate) fn finite(&self) -> f64 {
        self.finite
    }
}

impl<S: LpSolverInterface> Lp<S> {
    /// Register a variable that is not a column.
    pub fn add_loose_variable(&mut self, objective: f64, lower: f64, upper: f64) {
        let contribution = objective_contribution(objective, lower, upper, &self.settings);
        self.loose_objective.add(contribution);
    }

    /// Deregister a variable that is not a column.
    pub fn remove_loose_variable(&mut self, objective: f64, lower: f64, upper: f64) {
        let contribution = objective_contribution(objective, lower, upper, &self.settings);
        self.loose_objective.remove(contribution);
    }

    /// Update the contribution of a variable that is not a column after a change of its data.
    pub fn update_loose_variable(&mut self, old: (f64, f64, f64), new: (f64, f64, f64)) {
        self.remove_loose_variable(old.0, old.1, old.2);
        self.add_loose_variable(new.0, new.1, new.2);
    }

    /// Turn a loose variable into a column, moving its contribution out of the loose value.
    pub fn convert_loose_variable(&mut self, data: ColumnData) -> Result<ColumnHandle> {
        let contribution = objective_contribution(data.objective, data.lower, data.upper, &self.settings);
        let handle = self.create_column(data)?;
        self.loose_objective.remove(contribution);

        Ok(handle)
    }

    /// Objective value of the variables that are not columns, at their best bounds.
    pub fn loose_objective_value(&self) -> f64 {
        self.loose_objective.value(self.settings.infinity)
    }

    /// Objective value when all columns are at their best bounds.
    pub fn pseudo_objective_value(&self) -> f64 {
        self.pseudo_objective.value(self.settings.infinity)
    }

    /// Objective value of the last LP solution plus the loose objective value.
    pub fn objective_value(&self) -> f64 {
        let infinity = self.settings.infinity;
        if self.lp_objective.abs() >= infinity {
            self.lp_objective
        } else if self.loose_objective.nr_infinite > 0 {
            -infinity
        } else {
            self.lp_objective + self.loose_objective.finite
        }
    }

    /// Objective value above which solutions are of no interest.
    pub fn cutoff_bound(&self) -> f64 {
        self.cutoff_bound
    }

    /// Change the cutoff bound.
    ///
    /// Raising it invalidates an LP that was stopped by the objective limit.
    pub fn set_cutoff_bound(&mut self, value: f64) -> Result<()> {
        if value.is_nan() {
            return Err(Error::InvalidData("the cutoff bound can't be NaN".to_string()));
        }
        if value > self.cutoff_bound && self.status == LpStatus::ObjectiveLimit {
            self.solved = false;
            self.status = LpStatus::NotSolved;
        }
        self.cutoff_bound = value;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::lp::objective::ObjectiveSum;

    #[test]
    fn infinite_terms() {
        let mut sum = ObjectiveSum::default();
        sum.add(Some(2.0));
        sum.add(None);
        assert_eq!(sum.value(1e20), -1e20);
        assert_eq!(sum.finite(), 2.0);
        sum.remove(None);
        sum.add(Some(-0.5));
        assert_eq!(sum.value(1e20), 1.5);
    }
}
