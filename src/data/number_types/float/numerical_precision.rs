//! Helper methods for the accuracy of floating point calculations.
use num_traits::Float;

/// Find a fraction close to a floating point value.
///
/// Walks the continued fraction expansion of `value` until a convergent lies within `epsilon`.
///
/// # Arguments
///
/// * `value`: Value to approximate.
/// * `epsilon`: Largest accepted absolute deviation, positive.
/// * `max_denominator`: Largest accepted denominator.
///
/// # Return value
///
/// Numerator and positive denominator, or `None` if no convergent within the denominator limit is
/// close enough.
pub fn real_to_rational<F: Float>(value: F, epsilon: F, max_denominator: i64) -> Option<(i64, i64)> {
    debug_assert!(epsilon > F::zero());
    debug_assert!(max_denominator >= 1);

    let magnitude = value.abs();
    let whole = magnitude.floor();
    let (mut numerator, mut denominator) = (whole.to_i64()?, 1_i64);
    let (mut previous_numerator, mut previous_denominator) = (1_i64, 0_i64);
    let mut remainder = magnitude - whole;

    loop {
        let approximation = F::from(numerator)? / F::from(denominator)?;
        if (approximation - magnitude).abs() <= epsilon {
            break;
        }
        if remainder <= F::epsilon() {
            return None;
        }

        let inverse = remainder.recip();
        let term = inverse.floor();
        remainder = inverse - term;
        let term = term.to_i64()?;

        let next_denominator = term.checked_mul(denominator)?.checked_add(previous_denominator)?;
        if next_denominator > max_denominator {
            return None;
        }
        let next_numerator = term.checked_mul(numerator)?.checked_add(previous_numerator)?;

        previous_numerator = numerator;
        previous_denominator = denominator;
        numerator = next_numerator;
        denominator = next_denominator;
    }

    let numerator = if value < F::zero() { -numerator } else { numerator };
    Some((numerator, denominator))
}

/// Greatest common divisor of two nonnegative numbers.
pub fn gcd(mut left: i64, mut right: i64) -> i64 {
    debug_assert!(left >= 0 && right >= 0);

    while right != 0 {
        let remainder = left % right;
        left = right;
        right = remainder;
    }
    left
}

/// Smallest common multiple of two positive numbers, `None` on overflow.
pub fn lcm(left: i64, right: i64) -> Option<i64> {
    debug_assert!(left > 0 && right > 0);

    (left / gcd(left, right)).checked_mul(right)
}

#[cfg(test)]
mod test {
    use crate::data::number_types::float::numerical_precision::{gcd, lcm, real_to_rational};

    #[test]
    fn test_real_to_rational() {
        let epsilon = 1e-7f64;
        assert_eq!(real_to_rational(0.5, epsilon, 10), Some((1, 2)));
        assert_eq!(real_to_rational(-1.0 / 3.0, epsilon, 10), Some((-1, 3)));
        assert_eq!(real_to_rational(4.0, epsilon, 1), Some((4, 1)));
        assert_eq!(real_to_rational(2.0 / 7.0 + 3.0, epsilon, 100), Some((23, 7)));
        assert_eq!(real_to_rational(std::f64::consts::PI, epsilon, 100), None);
        assert_eq!(real_to_rational(1.0 / 101.0, epsilon, 100), None);
    }

    #[test]
    fn test_gcd_lcm() {
        assert_eq!(gcd(12, 18), 6);
        assert_eq!(gcd(7, 0), 7);
        assert_eq!(lcm(4, 6), Some(12));
        assert_eq!(lcm(i64::MAX, 2), None);
    }
}
