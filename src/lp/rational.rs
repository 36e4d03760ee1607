//! # Integral scaling of rows
//!
//! Cutting plane routines prefer rows with integral coefficients. A row is scaled by a positive
//! factor, after which values that are close to an integer are snapped to it.
use log::trace;

use crate::data::number_types::float::numerical_precision::{gcd, lcm, real_to_rational};
use crate::error::{Error, Result};
use crate::lp::column::column_ref;
use crate::lp::row::{MutableRow, row_ref};
use crate::lpi::LpSolverInterface;
use crate::settings::{epsilon_floor, is_epsilon_integral};

impl<S: LpSolverInterface> MutableRow<'_, S> {
    /// Multiply the row by a positive factor.
    ///
    /// Coefficients and sides that end up within `rounding_tolerance` of an integer are rounded to
    /// it. The constant is moved into the sides, so it is zero afterwards.
    pub fn scale(&mut self, factor: f64, rounding_tolerance: f64) -> Result<()> {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(Error::InvalidData(format!("can't scale a row by {factor}")));
        }
        let snap = |value: f64| {
            if is_epsilon_integral(value, rounding_tolerance) {
                epsilon_floor(value, rounding_tolerance)
            } else {
                value
            }
        };

        // Positions move when a coefficient rounds to zero, so go by column.
        let entries = row_ref(&self.lp.rows, self.handle)?.entries.iter()
            .map(|entry| (entry.column, entry.value))
            .collect::<Vec<_>>();
        for (column, value) in entries {
            self.change_coefficient(column, snap(value * factor))?;
        }

        let row = row_ref(&self.lp.rows, self.handle)?;
        let (lhs, rhs, constant) = (row.data.lhs, row.data.rhs, row.data.constant);
        let settings = &self.lp.settings;
        let new_lhs = if settings.is_infinity(-lhs) { lhs } else { snap((lhs - constant) * factor) };
        let new_rhs = if settings.is_infinity(rhs) { rhs } else { snap((rhs - constant) * factor) };
        self.change_sides(new_lhs, new_rhs)?;
        self.change_constant(0.0)?;
        trace!("Scaled row {:?} by {factor}", self.handle);

        Ok(())
    }

    /// Try to scale the row such that all coefficients become integral.
    ///
    /// The factor is found by trying powers of two times the reciprocal of the smallest
    /// coefficient, then plain powers of two, and finally by approximating every coefficient by a
    /// fraction with a denominator of at most `max_denominator`. Factors above `max_scale` are
    /// never used. When all columns of the row are integral, the sides are rounded inwards.
    ///
    /// # Return value
    ///
    /// Whether the row could be made integral. When it couldn't, the row is unchanged.
    pub fn make_rational(&mut self, max_denominator: i64, max_scale: f64) -> Result<bool> {
        let epsilon = self.lp.settings.epsilon;
        let division_tolerance = 1e6 * epsilon;
        let doubling_tolerance = 1e3 * epsilon;
        let rational_tolerance = 1e2 * epsilon;

        let row = row_ref(&self.lp.rows, self.handle)?;
        if row.entries.is_empty() {
            return Ok(true);
        }
        let values = row.entries.iter().map(|entry| entry.value).collect::<Vec<_>>();
        let mut all_integer = true;
        for entry in &row.entries {
            all_integer &= column_ref(&self.lp.columns, entry.column)?.data.variable_type.is_integer();
        }

        let scaled = if values.iter().all(|&value| self.lp.settings.is_integral(value)) {
            self.scale(1.0, epsilon)?;
            true
        } else {
            let min_value = values.iter().map(|value| value.abs()).fold(f64::INFINITY, f64::min);
            let found = doubling_scale(&values, 1.0 / min_value, max_scale, division_tolerance)
                .map(|scale| (scale, division_tolerance))
                .or_else(|| doubling_scale(&values, 1.0, max_scale, doubling_tolerance)
                    .map(|scale| (scale, doubling_tolerance)))
                .or_else(|| rational_scale(&values, max_denominator, max_scale, rational_tolerance)
                    .map(|scale| (scale, rational_tolerance)));

            match found {
                Some((scale, tolerance)) => {
                    trace!("Row {:?} becomes integral with factor {scale}", self.handle);
                    self.scale(scale, tolerance)?;
                    true
                }
                None => false,
            }
        };

        if scaled && all_integer {
            let row = row_ref(&self.lp.rows, self.handle)?;
            let (lhs, rhs) = (row.data.lhs, row.data.rhs);
            let settings = &self.lp.settings;
            let new_lhs = if settings.is_infinity(-lhs) { lhs } else { settings.ceil(lhs) };
            let new_rhs = if settings.is_infinity(rhs) { rhs } else { settings.floor(rhs) };
            // No integral activity fits between the sides, they stay as they are
            if new_lhs <= new_rhs {
                self.change_sides(new_lhs, new_rhs)?;
            }
        }

        Ok(scaled)
    }
}

/// Double `scale` until all values times it are integral, up to `max_scale`.
fn doubling_scale(values: &[f64], mut scale: f64, max_scale: f64, tolerance: f64) -> Option<f64> {
    while scale <= max_scale {
        if values.iter().all(|&value| is_epsilon_integral(value * scale, tolerance)) {
            return Some(scale);
        }
        scale *= 2.0;
    }

    None
}

/// Smallest factor that turns the rational approximations of all values into coprime integers.
fn rational_scale(values: &[f64], max_denominator: i64, max_scale: f64, tolerance: f64) -> Option<f64> {
    let mut numerator_gcd = 0;
    let mut denominator_lcm = 1;
    for &value in values {
        let (numerator, denominator) = real_to_rational(value, tolerance, max_denominator)?;
        numerator_gcd = gcd(numerator_gcd, numerator.abs());
        denominator_lcm = lcm(denominator_lcm, denominator)?;
    }
    if numerator_gcd == 0 {
        return None;
    }

    let scale = denominator_lcm as f64 / numerator_gcd as f64;
    (scale <= max_scale).then_some(scale)
}

#[cfg(test)]
mod test {
    use crate::lp::rational::{doubling_scale, rational_scale};

    #[test]
    fn doubling() {
        assert_eq!(doubling_scale(&[0.5, 0.25], 1.0, 100.0, 1e-6), Some(4.0));
        assert_eq!(doubling_scale(&[1.0 / 3.0], 1.0, 100.0, 1e-6), None);
        assert_eq!(doubling_scale(&[1.0 / 3.0], 3.0, 100.0, 1e-6), Some(3.0));
    }

    #[test]
    fn rational() {
        assert_eq!(rational_scale(&[1.0 / 3.0, 0.5], 10, 100.0, 1e-9), Some(6.0));
        assert_eq!(rational_scale(&[2.0 / 3.0, 4.0 / 3.0], 10, 100.0, 1e-9), Some(1.5));
        assert_eq!(rational_scale(&[1.0 / 3.0, 0.5], 10, 5.0, 1e-9), None);
        assert_eq!(rational_scale(&[std::f64::consts::PI], 10, 100.0, 1e-9), None);
    }
}
