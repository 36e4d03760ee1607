//! # Row aggregation and mixed integer rounding
//!
//! Rows of the LP are combined with weights into a single row over the problem variables. From
//! such an aggregation, a mixed integer rounding (MIR) cut is derived by moving every variable to
//! its nearest bound, rounding the coefficients with respect to the fractionality of the right
//! hand side and transforming back.
use log::trace;

use crate::data::linear_program::elements::BoundDirection;
use crate::error::{Error, Result};
use crate::lp::column::{ColumnHandle, column_ref};
use crate::lp::row::row_ref;
use crate::lp::Lp;
use crate::lpi::LpSolverInterface;

/// Weight of the upper bound when choosing the bound closest to the LP value.
const BOUND_SWITCH: f64 = 0.9999;

/// Weighted sum of rows, dense over the problem variables.
#[derive(Clone, Debug, PartialEq)]
pub struct RowSum {
    /// Coefficient per problem index.
    pub coefficients: Vec<f64>,
    #[allow(missing_docs)]
    pub lhs: f64,
    #[allow(missing_docs)]
    pub rhs: f64,
}

/// A cut `coefficients · x <= rhs`, dense over the problem variables.
#[derive(Clone, Debug, PartialEq)]
pub struct MirCut {
    /// Coefficient per problem index.
    pub coefficients: Vec<f64>,
    #[allow(missing_docs)]
    pub rhs: f64,
}

impl<S: LpSolverInterface> Lp<S> {
    /// Sum the rows of the LP, weighted by `weights` indexed by LP position.
    ///
    /// Weights that are zero within the tolerance are set to exactly zero. A negative weight
    /// swaps the sides of its row. A side of the sum is infinite as soon as one infinite side
    /// contributes to it.
    pub fn sum_rows(&self, nr_variables: usize, weights: &mut [f64]) -> Result<RowSum> {
        self.check_weights(weights)?;

        let mut coefficients = vec![0.0; nr_variables];
        let (mut lhs, mut rhs) = (0.0, 0.0);
        let (mut nr_lhs_infinite, mut nr_rhs_infinite) = (0, 0);

        for (position, weight) in weights.iter_mut().enumerate() {
            if self.settings.is_zero(*weight) {
                *weight = 0.0;
                continue;
            }
            let row = row_ref(&self.rows, self.lp_rows[position])?;
            for entry in &row.entries {
                *coefficient_at(&mut coefficients, entry.problem_index)? += *weight * entry.value;
            }

            let constant = row.data.constant;
            let (low_side, high_side) = if *weight > 0.0 {
                (row.data.lhs, row.data.rhs)
            } else {
                (row.data.rhs, row.data.lhs)
            };
            if self.settings.is_infinity(low_side.abs()) {
                nr_lhs_infinite += 1;
            } else {
                lhs += *weight * (low_side - constant);
            }
            if self.settings.is_infinity(high_side.abs()) {
                nr_rhs_infinite += 1;
            } else {
                rhs += *weight * (high_side - constant);
            }
        }

        let infinity = self.settings.infinity;
        Ok(RowSum {
            coefficients,
            lhs: if nr_lhs_infinite > 0 { -infinity } else { lhs },
            rhs: if nr_rhs_infinite > 0 { infinity } else { rhs },
        })
    }

    /// Derive a mixed integer rounding cut from a weighted sum of LP rows.
    ///
    /// Each row contributes with the side that is nearest to its activity in the current LP
    /// solution, such that its slack is small. Modifiable rows, rows whose nearest side is
    /// infinite and rows with a zero weight don't contribute, and their weight is set to zero.
    ///
    /// # Arguments
    ///
    /// * `nr_variables`: Length of the dense coefficient vector, larger than every problem index.
    /// * `min_fraction`: Smallest fractionality of the aggregated right hand side that is worth a
    /// cut.
    /// * `weights`: One weight per LP row.
    ///
    /// # Return value
    ///
    /// The cut, or `None` when no cut could be derived.
    pub fn calculate_mir(
        &self,
        nr_variables: usize,
        min_fraction: f64,
        weights: &mut [f64],
    ) -> Result<Option<MirCut>> {
        self.check_weights(weights)?;
        let settings = &self.settings;

        let mut coefficients = vec![0.0; nr_variables];
        let mut columns: Vec<Option<ColumnHandle>> = vec![None; nr_variables];
        let mut slack_signs = vec![0_i8; weights.len()];
        let mut rhs = 0.0;
        let mut empty = true;

        for (position, weight) in weights.iter_mut().enumerate() {
            let handle = self.lp_rows[position];
            let row = row_ref(&self.rows, handle)?;
            if row.data.modifiable || settings.is_zero(*weight) {
                *weight = 0.0;
                continue;
            }

            let activity = self.row_lp_activity(handle)?;
            let constant = row.data.constant;
            let (slack_sign, side) = if activity < (row.data.lhs + row.data.rhs) / 2.0 {
                (-1, row.data.lhs)
            } else {
                (1, row.data.rhs)
            };
            if settings.is_infinity(side.abs()) {
                *weight = 0.0;
                continue;
            }
            slack_signs[position] = slack_sign;
            rhs += *weight * (side - constant);

            for entry in &row.entries {
                *coefficient_at(&mut coefficients, entry.problem_index)? += *weight * entry.value;
                columns[entry.problem_index] = Some(entry.column);
            }
            empty = false;
        }
        if empty {
            return Ok(None);
        }

        // Substitute every variable by its distance to the bound nearest to its LP value.
        let mut substitutions: Vec<Option<BoundDirection>> = vec![None; nr_variables];
        for index in 0..nr_variables {
            let Some(handle) = columns[index] else { continue };
            if settings.is_zero(coefficients[index]) {
                coefficients[index] = 0.0;
                continue;
            }
            let column = column_ref(&self.columns, handle)?;
            let (lower, upper) = (column.data.lower, column.data.upper);
            let lower_finite = !settings.is_infinity(-lower);
            let upper_finite = !settings.is_infinity(upper);
            let substitution = match (lower_finite, upper_finite) {
                (true, true) => {
                    let primal = column.primal_value();
                    if primal <= (1.0 - BOUND_SWITCH) * lower + BOUND_SWITCH * upper {
                        BoundDirection::Lower
                    } else {
                        BoundDirection::Upper
                    }
                }
                (true, false) => BoundDirection::Lower,
                (false, true) => BoundDirection::Upper,
                (false, false) => {
                    trace!("No MIR cut, column {} is free", column.data.name);
                    return Ok(None);
                }
            };
            rhs -= coefficients[index] * match substitution {
                BoundDirection::Lower => lower,
                BoundDirection::Upper => upper,
            };
            substitutions[index] = Some(substitution);
        }

        let f0 = settings.fraction(rhs);
        if f0 < min_fraction {
            trace!("No MIR cut, right hand side fraction {f0} is too small");
            return Ok(None);
        }
        rhs = settings.floor(rhs);

        for index in 0..nr_variables {
            let Some(direction) = substitutions[index] else { continue };
            let sign = direction.into::<f64>();
            let Some(handle) = columns[index] else { continue };
            let column = column_ref(&self.columns, handle)?;
            let coefficient = sign * coefficients[index];

            let rounded = if column.data.variable_type.is_integer() {
                let down = coefficient.floor();
                let fraction = coefficient - down;
                if settings.is_sum_le(fraction, f0) {
                    down
                } else {
                    down + (fraction - f0) / (1.0 - f0)
                }
            } else if settings.is_sum_ge(coefficient, 0.0) {
                0.0
            } else {
                coefficient / (1.0 - f0)
            };

            let cut_coefficient = sign * rounded;
            if settings.is_zero(cut_coefficient) {
                coefficients[index] = 0.0;
            } else {
                coefficients[index] = cut_coefficient;
                rhs += cut_coefficient * match direction {
                    BoundDirection::Lower => column.data.lower,
                    BoundDirection::Upper => column.data.upper,
                };
            }
        }

        // Slacks with a negative coefficient in the aggregation stay in the cut, in terms of
        // their row.
        for (position, &weight) in weights.iter().enumerate() {
            let slack_sign = slack_signs[position];
            if slack_sign == 0 || !settings.is_negative(f64::from(slack_sign) * weight) {
                continue;
            }
            let row = row_ref(&self.rows, self.lp_rows[position])?;
            let multiplier = weight / (1.0 - f0);
            for entry in &row.entries {
                *coefficient_at(&mut coefficients, entry.problem_index)? -= multiplier * entry.value;
            }
            let side = if slack_sign > 0 { row.data.rhs } else { row.data.lhs };
            rhs -= multiplier * (side - row.data.constant);
        }

        if settings.is_sum_zero(rhs) {
            rhs = 0.0;
        }

        Ok(Some(MirCut { coefficients, rhs }))
    }

    fn check_weights(&self, weights: &[f64]) -> Result<()> {
        if weights.len() == self.lp_rows.len() {
            Ok(())
        } else {
            Err(Error::InvalidData(format!("{} weights for {} rows", weights.len(), self.lp_rows.len())))
        }
    }
}

fn coefficient_at(coefficients: &mut [f64], index: usize) -> Result<&mut f64> {
    let length = coefficients.len();
    coefficients.get_mut(index)
        .ok_or_else(|| Error::InvalidData(format!("problem index {index} out of range for {length} variables")))
}
