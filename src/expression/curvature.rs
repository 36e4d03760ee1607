//! # Curvature
//!
//! A coarse classification of a function over a box: convex, concave, both (linear) or neither
//! (unknown). The classification is a bit set, so that the curvature of a sum is the intersection
//! of the curvatures of the summands.
use std::fmt;
use std::ops::BitAnd;

use crate::data::interval::Interval;
use crate::expression::polynomial::Factor;

/// Tolerance on the sum of exponents when classifying monomials.
const MONOMIAL_EXPONENT_SUM_TOLERANCE: f64 = 1e-9;

/// Convexity classification of a function over a domain.
#[allow(missing_docs)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Curvature {
    Unknown = 0,
    Convex = 1,
    Concave = 2,
    Linear = 3,
}

impl Curvature {
    fn from_bits(bits: u8) -> Self {
        match bits & 3 {
            0 => Curvature::Unknown,
            1 => Curvature::Convex,
            2 => Curvature::Concave,
            _ => Curvature::Linear,
        }
    }

    fn bits(self) -> u8 {
        self as u8
    }

    /// Whether the function is at least convex (convex or linear).
    pub fn is_convex(self) -> bool {
        self.bits() & Curvature::Convex.bits() != 0
    }

    /// Whether the function is at least concave (concave or linear).
    pub fn is_concave(self) -> bool {
        self.bits() & Curvature::Concave.bits() != 0
    }

    /// Curvature of the negated function.
    #[must_use]
    pub fn negate(self) -> Self {
        let convex = if self.is_convex() { Curvature::Concave.bits() } else { 0 };
        let concave = if self.is_concave() { Curvature::Convex.bits() } else { 0 };
        Self::from_bits(convex | concave)
    }

    /// Curvature of the function multiplied by a constant.
    #[must_use]
    pub fn scale(self, factor: f64) -> Self {
        if factor == 0.0 {
            Curvature::Linear
        } else if factor > 0.0 {
            self
        } else {
            self.negate()
        }
    }

    /// Curvature of `base^exponent` for a base function with the given bounds and curvature.
    ///
    /// Follows from the second derivative
    /// `(f^e)'' = e (e - 1) f^(e - 2) (f')^2 + e f^(e - 1) f''`.
    pub fn power(mut bounds: Interval, base: Curvature, exponent: f64) -> Self {
        debug_assert!(bounds.inf <= bounds.sup);

        if exponent == 0.0 {
            return Curvature::Linear;
        }
        if exponent == 1.0 {
            return base;
        }

        let integral = exponent.fract() == 0.0;
        // Only defined for a nonnegative base
        if !integral && bounds.inf < 0.0 {
            bounds.inf = 0.0;
            if bounds.sup < 0.0 {
                return Curvature::Linear;
            }
        }

        if bounds.inf < 0.0 && bounds.sup > 0.0 {
            // Each side may look convex, the pole at zero breaks that
            if exponent < 0.0 {
                return Curvature::Unknown;
            }

            let left = Self::power(Interval::new(bounds.inf, 0.0), base, exponent);
            let right = Self::power(Interval::new(0.0, bounds.sup), base, exponent);
            return left & right;
        }
        debug_assert!(bounds.inf >= 0.0 || bounds.sup <= 0.0);

        let odd = integral && exponent % 2.0 != 0.0;
        match base {
            Curvature::Linear => {
                let mut sign = exponent * (exponent - 1.0);
                // f^(e - 2) is negative for a negative base and odd e
                if bounds.inf < 0.0 && odd {
                    sign = -sign;
                }
                if sign > 0.0 { Curvature::Convex } else { Curvature::Concave }
            }
            Curvature::Convex => {
                if bounds.sup <= 0.0 && exponent < 0.0 && integral {
                    if odd { Curvature::Concave } else { Curvature::Convex }
                } else if bounds.inf >= 0.0 && exponent > 1.0 {
                    Curvature::Convex
                } else {
                    Curvature::Unknown
                }
            }
            Curvature::Concave => {
                if bounds.sup <= 0.0 && exponent > 1.0 && integral {
                    if odd { Curvature::Concave } else { Curvature::Convex }
                } else if bounds.inf >= 0.0 && exponent < 1.0 {
                    if exponent < 0.0 { Curvature::Convex } else { Curvature::Concave }
                } else {
                    Curvature::Unknown
                }
            }
            Curvature::Unknown => Curvature::Unknown,
        }
    }

    /// Curvature of a product of powers, ignoring its coefficient.
    ///
    /// Factors of a single sign are required. A negative factor is mirrored, which flips its
    /// curvature and, for an odd exponent, the sign of the product. For linear factors the
    /// classification is the one by Maranas and Floudas: the product is convex when all exponents
    /// are negative, or all but one are negative and the exponents sum to at least one; it is
    /// concave when all exponents are positive and sum to at most one. Nonlinear factors must
    /// additionally curve in the matching direction.
    ///
    /// # Arguments
    ///
    /// * `factors`: Child index and exponent per factor.
    /// * `curvatures`: Curvature per child.
    /// * `bounds`: Bounds per child.
    pub fn monomial(factors: &[Factor], curvatures: &[Curvature], bounds: &[Interval]) -> Self {
        match factors {
            [] => return Curvature::Linear,
            [factor] => return Self::power(bounds[factor.child], curvatures[factor.child], factor.exponent),
            _ => {}
        }

        let mut sign = 1.0;
        let mut nr_negative = 0;
        let mut nr_positive = 0;
        let mut sum = 0.0;
        let mut all_convex = true;
        let mut all_concave = true;

        for factor in factors {
            let (curvature, bound) = (curvatures[factor.child], bounds[factor.child]);
            if curvature == Curvature::Unknown || (bound.inf < 0.0 && bound.sup > 0.0) {
                return Curvature::Unknown;
            }

            let exponent = factor.exponent;
            if exponent < 0.0 {
                nr_negative += 1;
            } else {
                nr_positive += 1;
            }
            sum += exponent;

            let curvature = if bound.inf < 0.0 {
                debug_assert_eq!(exponent.fract(), 0.0);
                if exponent % 2.0 != 0.0 {
                    sign = -sign;
                }
                curvature.negate()
            } else {
                curvature
            };

            let weighted = curvature.scale(exponent);
            all_convex &= weighted.is_convex();
            all_concave &= weighted.is_concave();
        }

        let curvature = if nr_negative == factors.len() && all_convex {
            Curvature::Convex
        } else if nr_negative + 1 == factors.len() && sum >= 1.0 - MONOMIAL_EXPONENT_SUM_TOLERANCE && all_convex {
            Curvature::Convex
        } else if nr_positive == factors.len() && sum <= 1.0 + MONOMIAL_EXPONENT_SUM_TOLERANCE && all_concave {
            Curvature::Concave
        } else {
            Curvature::Unknown
        };

        curvature.scale(sign)
    }
}

/// The curvature of a sum.
impl BitAnd for Curvature {
    type Output = Self;

    fn bitand(self, other: Self) -> Self::Output {
        Self::from_bits(self.bits() & other.bits())
    }
}

impl fmt::Display for Curvature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Curvature::Unknown => "unknown",
            Curvature::Convex => "convex",
            Curvature::Concave => "concave",
            Curvature::Linear => "linear",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod test {
    use crate::data::interval::Interval;
    use crate::expression::curvature::Curvature;
    use crate::expression::polynomial::Factor;

    use Curvature::{Concave, Convex, Linear, Unknown};

    #[test]
    fn algebra() {
        assert_eq!(Convex & Concave, Unknown);
        assert_eq!(Linear & Convex, Convex);
        assert_eq!(Convex.negate(), Concave);
        assert_eq!(Linear.negate(), Linear);
        assert_eq!(Unknown.negate(), Unknown);
        assert_eq!(Convex.scale(0.0), Linear);
        assert_eq!(Convex.scale(-2.0), Concave);
    }

    #[test]
    fn power_of_linear() {
        let positive = Interval::new(1.0, 2.0);
        let negative = Interval::new(-2.0, -1.0);
        let straddling = Interval::new(-1.0, 1.0);

        assert_eq!(Curvature::power(positive, Linear, 2.0), Convex);
        assert_eq!(Curvature::power(straddling, Linear, 2.0), Convex);
        assert_eq!(Curvature::power(positive, Linear, 0.5), Concave);
        assert_eq!(Curvature::power(positive, Linear, -1.0), Convex);
        assert_eq!(Curvature::power(negative, Linear, -1.0), Concave);
        assert_eq!(Curvature::power(negative, Linear, 3.0), Concave);
        assert_eq!(Curvature::power(straddling, Linear, 3.0), Unknown);
        assert_eq!(Curvature::power(straddling, Linear, -2.0), Unknown);
        assert_eq!(Curvature::power(negative, Linear, 0.5), Linear);
        assert_eq!(Curvature::power(straddling, Linear, 0.0), Linear);
    }

    #[test]
    fn negative_odd_power_of_negative_linear_is_concave() {
        let negative = Interval::new(-2.0, -1.0);
        for exponent in [-1.0, -3.0] {
            assert_eq!(Curvature::power(negative, Linear, exponent), Concave);
            // Second difference of x^e on [-2, -1]
            let f = |x: f64| x.powf(exponent);
            assert!(f(-2.0) + f(-1.0) - 2.0 * f(-1.5) < 0.0);
        }
        assert_eq!(Curvature::power(negative, Linear, -2.0), Convex);
    }

    #[test]
    fn power_of_nonlinear() {
        let positive = Interval::new(1.0, 2.0);
        let negative = Interval::new(-2.0, -1.0);

        assert_eq!(Curvature::power(positive, Convex, 2.0), Convex);
        assert_eq!(Curvature::power(negative, Convex, -2.0), Convex);
        assert_eq!(Curvature::power(negative, Convex, -1.0), Concave);
        assert_eq!(Curvature::power(positive, Convex, 0.5), Unknown);
        assert_eq!(Curvature::power(negative, Concave, 2.0), Convex);
        assert_eq!(Curvature::power(negative, Concave, 3.0), Concave);
        assert_eq!(Curvature::power(positive, Concave, 0.5), Concave);
        assert_eq!(Curvature::power(positive, Concave, -1.0), Convex);
        assert_eq!(Curvature::power(positive, Concave, 2.0), Unknown);
    }

    /// Shrinking the domain never makes a classification less specific.
    #[test]
    fn power_monotone_under_shrinking() {
        let exponents = [-3.0, -2.0, -1.0, -0.5, 0.5, 1.0, 1.5, 2.0, 3.0];
        let nested = [
            (Interval::new(-4.0, 4.0), Interval::new(-1.0, 2.0)),
            (Interval::new(-4.0, 4.0), Interval::new(0.5, 3.0)),
            (Interval::new(0.0, 10.0), Interval::new(1.0, 2.0)),
            (Interval::new(-10.0, -0.5), Interval::new(-3.0, -1.0)),
            (Interval::new(-2.0, 5.0), Interval::new(-2.0, -1.0)),
        ];
        for &exponent in &exponents {
            for &base in &[Linear, Convex, Concave] {
                for &(wide, narrow) in &nested {
                    let outer = Curvature::power(wide, base, exponent);
                    let inner = Curvature::power(narrow, base, exponent);
                    assert_eq!(outer & inner, outer, "{exponent} {base} {wide} {narrow}");
                }
            }
        }
    }

    #[test]
    fn monomials() {
        let factor = |child, exponent| Factor { child, exponent };
        let bounds = [Interval::new(1.0, 2.0), Interval::new(1.0, 3.0)];
        let linear = [Linear, Linear];

        // 1 / (x y)
        assert_eq!(Curvature::monomial(&[factor(0, -1.0), factor(1, -1.0)], &linear, &bounds), Convex);
        // x^2 / y
        assert_eq!(Curvature::monomial(&[factor(0, 2.0), factor(1, -1.0)], &linear, &bounds), Convex);
        // sqrt(x y)
        assert_eq!(Curvature::monomial(&[factor(0, 0.5), factor(1, 0.5)], &linear, &bounds), Concave);
        // x y
        assert_eq!(Curvature::monomial(&[factor(0, 1.0), factor(1, 1.0)], &linear, &bounds), Unknown);
        // x^3 y^-1 with x negative mirrors into -(-x)^3 y^-1
        let mirrored = [Interval::new(-2.0, -1.0), Interval::new(1.0, 3.0)];
        assert_eq!(Curvature::monomial(&[factor(0, 3.0), factor(1, -1.0)], &linear, &mirrored), Concave);
        assert_eq!(Curvature::monomial(&[], &linear, &bounds), Linear);
    }
}
