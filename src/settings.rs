//! # Settings
//!
//! Numerical tolerances and the policies of the LP relaxation manager, together with the
//! tolerance based comparisons that all algorithms in this crate share.
use std::path::PathBuf;

/// Tolerances and policies.
///
/// All fields are public and documented; construct with `Settings::default()` and override what
/// differs.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Absolute tolerance for comparing floating point values.
    pub epsilon: f64,
    /// Absolute tolerance for comparing sums, which accumulate more error.
    pub sum_epsilon: f64,
    /// Primal feasibility tolerance of the LP solution.
    pub feasibility_tolerance: f64,
    /// Dual feasibility tolerance of the LP solution.
    pub dual_feasibility_tolerance: f64,
    /// Values at least this large are treated as infinite.
    pub infinity: f64,
    /// Number of consecutive solves a column may be inactive before it is considered obsolete.
    pub column_age_limit: u32,
    /// Number of consecutive solves a row may be inactive before it is considered obsolete.
    pub row_age_limit: u32,
    /// Whether new inactive columns are removed after each solve.
    pub cleanup_columns: bool,
    /// Whether new inactive rows are removed after each solve.
    pub cleanup_rows: bool,
    /// Whether the LP solver may use its fast but less accurate mode.
    pub fast_mip: bool,
    /// Whether the LP solver scales the problem.
    pub scaling: bool,
    /// Whether the LP solution is checked for primal and dual feasibility after each solve.
    pub check_lp_feasibility: bool,
    /// Where LPs that could not be solved stably are written to, if anywhere.
    pub unstable_lp_directory: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            epsilon: 1e-9,
            sum_epsilon: 1e-6,
            feasibility_tolerance: 1e-6,
            dual_feasibility_tolerance: 1e-9,
            infinity: 1e20,
            column_age_limit: 10,
            row_age_limit: 10,
            cleanup_columns: false,
            cleanup_rows: true,
            fast_mip: true,
            scaling: true,
            check_lp_feasibility: true,
            unstable_lp_directory: None,
        }
    }
}

/// Relative difference of two values, scaled by the largest magnitude (at least one).
fn relative_difference(left: f64, right: f64) -> f64 {
    let scale = left.abs().max(right.abs()).max(1.0);
    (left - right) / scale
}

/// Largest integer not exceeding `value`, allowing `value` to be `epsilon` too small.
pub(crate) fn epsilon_floor(value: f64, epsilon: f64) -> f64 {
    (value + epsilon).floor()
}

/// Smallest integer not below `value`, allowing `value` to be `epsilon` too large.
pub(crate) fn epsilon_ceil(value: f64, epsilon: f64) -> f64 {
    (value - epsilon).ceil()
}

/// Whether `value` lies within `epsilon` of an integer.
pub(crate) fn is_epsilon_integral(value: f64, epsilon: f64) -> bool {
    epsilon_ceil(value, epsilon) <= epsilon_floor(value, epsilon)
}

impl Settings {
    #[allow(missing_docs)]
    pub fn is_eq(&self, left: f64, right: f64) -> bool {
        (left - right).abs() <= self.epsilon
    }
    #[allow(missing_docs)]
    pub fn is_lt(&self, left: f64, right: f64) -> bool {
        left - right < -self.epsilon
    }
    #[allow(missing_docs)]
    pub fn is_le(&self, left: f64, right: f64) -> bool {
        left - right <= self.epsilon
    }
    #[allow(missing_docs)]
    pub fn is_gt(&self, left: f64, right: f64) -> bool {
        left - right > self.epsilon
    }
    #[allow(missing_docs)]
    pub fn is_ge(&self, left: f64, right: f64) -> bool {
        left - right >= -self.epsilon
    }
    #[allow(missing_docs)]
    pub fn is_zero(&self, value: f64) -> bool {
        value.abs() <= self.epsilon
    }
    #[allow(missing_docs)]
    pub fn is_positive(&self, value: f64) -> bool {
        value > self.epsilon
    }
    #[allow(missing_docs)]
    pub fn is_negative(&self, value: f64) -> bool {
        value < -self.epsilon
    }

    /// Whether the value is at least the infinity value.
    pub fn is_infinity(&self, value: f64) -> bool {
        value >= self.infinity
    }

    /// Whether `left >= right` holds relative to the magnitude of the values.
    pub fn is_relative_ge(&self, left: f64, right: f64) -> bool {
        relative_difference(left, right) >= -self.epsilon
    }

    #[allow(missing_docs)]
    pub fn is_sum_le(&self, left: f64, right: f64) -> bool {
        left - right <= self.sum_epsilon
    }
    #[allow(missing_docs)]
    pub fn is_sum_ge(&self, left: f64, right: f64) -> bool {
        left - right >= -self.sum_epsilon
    }
    #[allow(missing_docs)]
    pub fn is_sum_zero(&self, value: f64) -> bool {
        value.abs() <= self.sum_epsilon
    }

    /// Relative comparison with the feasibility tolerance.
    pub fn is_feasible_eq(&self, left: f64, right: f64) -> bool {
        relative_difference(left, right).abs() <= self.feasibility_tolerance
    }
    #[allow(missing_docs)]
    pub fn is_feasible_le(&self, left: f64, right: f64) -> bool {
        relative_difference(left, right) <= self.feasibility_tolerance
    }
    #[allow(missing_docs)]
    pub fn is_feasible_ge(&self, left: f64, right: f64) -> bool {
        relative_difference(left, right) >= -self.feasibility_tolerance
    }

    /// Rounds down, treating values within the feasibility tolerance of an integer as integral.
    pub fn floor(&self, value: f64) -> f64 {
        epsilon_floor(value, self.feasibility_tolerance)
    }

    /// Rounds up, treating values within the feasibility tolerance of an integer as integral.
    pub fn ceil(&self, value: f64) -> f64 {
        epsilon_ceil(value, self.feasibility_tolerance)
    }

    /// Fractional part with respect to `floor`.
    pub fn fraction(&self, value: f64) -> f64 {
        value - self.floor(value)
    }

    /// Whether the value is within `epsilon` of an integer.
    pub fn is_integral(&self, value: f64) -> bool {
        is_epsilon_integral(value, self.epsilon)
    }
}

#[cfg(test)]
mod test {
    use crate::settings::{epsilon_ceil, epsilon_floor, is_epsilon_integral, Settings};

    #[test]
    fn comparisons() {
        let settings = Settings::default();
        assert!(settings.is_eq(1.0, 1.0 + 1e-10));
        assert!(!settings.is_lt(1.0, 1.0 + 1e-10));
        assert!(settings.is_lt(1.0, 1.1));
        assert!(settings.is_ge(1.0, 1.0 + 1e-10));
        assert!(settings.is_infinity(1e20));
        assert!(!settings.is_infinity(1e19));
        assert!(settings.is_feasible_eq(1e8, 1e8 + 1.0));
        assert!(settings.is_relative_ge(1e10, 1e10 + 1.0));
    }

    #[test]
    fn rounding() {
        assert_eq!(epsilon_floor(2.9999999, 1e-6), 3.0);
        assert_eq!(epsilon_ceil(3.0000001, 1e-6), 3.0);
        assert!(is_epsilon_integral(-4.0000000001, 1e-9));
        assert!(!is_epsilon_integral(0.5, 1e-9));

        let settings = Settings::default();
        assert_eq!(settings.floor(-0.5), -1.0);
        assert_eq!(settings.fraction(2.25), 0.25);
    }
}
