//! # Interval arithmetic
//!
//! Closed intervals of reals with outward (sound, not necessarily tight) enclosures for the
//! operations that expressions need. Bounds are kept as IEEE infinities internally; the caller
//! translates the solver's notion of infinity at the boundaries, see `Interval::from_bounds` and
//! `Interval::to_finite`.
//!
//! An interval with `inf > sup` is empty.
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

/// Closed interval `[inf, sup]`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Interval {
    /// Lower bound.
    pub inf: f64,
    /// Upper bound.
    pub sup: f64,
}

impl Default for Interval {
    fn default() -> Self {
        Self::point(0.0)
    }
}

/// Product where zero times an infinite value is zero.
fn bound_product(left: f64, right: f64) -> f64 {
    if left == 0.0 || right == 0.0 {
        0.0
    } else {
        left * right
    }
}

impl Interval {
    /// Create an interval from two bounds.
    pub fn new(inf: f64, sup: f64) -> Self {
        Self { inf, sup }
    }

    /// Interval consisting of a single value.
    pub fn point(value: f64) -> Self {
        Self { inf: value, sup: value }
    }

    /// The whole real line.
    pub fn entire() -> Self {
        Self { inf: f64::NEG_INFINITY, sup: f64::INFINITY }
    }

    /// An interval without elements.
    pub fn empty() -> Self {
        Self { inf: f64::INFINITY, sup: f64::NEG_INFINITY }
    }

    /// Interval from bounds in which values beyond `infinity` are infinite.
    pub fn from_bounds(inf: f64, sup: f64, infinity: f64) -> Self {
        Self {
            inf: if inf <= -infinity { f64::NEG_INFINITY } else { inf },
            sup: if sup >= infinity { f64::INFINITY } else { sup },
        }
    }

    /// Clamp infinite bounds to `±infinity`.
    pub fn to_finite(self, infinity: f64) -> Self {
        Self {
            inf: if self.inf <= -infinity { -infinity } else { self.inf },
            sup: if self.sup >= infinity { infinity } else { self.sup },
        }
    }

    #[allow(missing_docs)]
    pub fn is_empty(&self) -> bool {
        self.inf > self.sup
    }

    #[allow(missing_docs)]
    pub fn is_entire(&self) -> bool {
        self.inf == f64::NEG_INFINITY && self.sup == f64::INFINITY
    }

    /// Whether the interval consists of a single value.
    pub fn is_point(&self) -> bool {
        self.inf == self.sup
    }

    #[allow(missing_docs)]
    pub fn contains(&self, value: f64) -> bool {
        self.inf <= value && value <= self.sup
    }

    #[allow(missing_docs)]
    pub fn intersect(self, other: Self) -> Self {
        Self { inf: self.inf.max(other.inf), sup: self.sup.min(other.sup) }
    }

    /// Multiply with a scalar.
    pub fn scale(self, factor: f64) -> Self {
        self * Self::point(factor)
    }

    #[allow(missing_docs)]
    pub fn div(self, other: Self) -> Self {
        if self.is_empty() || other.is_empty() {
            return Self::empty();
        }

        let reciprocal = if other.inf > 0.0 || other.sup < 0.0 {
            Self::new(1.0 / other.sup, 1.0 / other.inf)
        } else if other.inf == 0.0 && other.sup > 0.0 {
            Self::new(1.0 / other.sup, f64::INFINITY)
        } else if other.sup == 0.0 && other.inf < 0.0 {
            Self::new(f64::NEG_INFINITY, 1.0 / other.inf)
        } else {
            return Self::entire();
        };

        self * reciprocal
    }

    #[allow(missing_docs)]
    pub fn square(self) -> Self {
        if self.is_empty() {
            self
        } else if self.inf >= 0.0 {
            Self::new(self.inf * self.inf, self.sup * self.sup)
        } else if self.sup <= 0.0 {
            Self::new(self.sup * self.sup, self.inf * self.inf)
        } else {
            let magnitude = self.sup.max(-self.inf);
            Self::new(0.0, magnitude * magnitude)
        }
    }

    /// Square root of the nonnegative part.
    pub fn sqrt(self) -> Self {
        if self.is_empty() || self.sup < 0.0 {
            Self::empty()
        } else {
            Self::new(self.inf.max(0.0).sqrt(), self.sup.sqrt())
        }
    }

    /// Power with a constant real exponent.
    ///
    /// Non-integral exponents are only defined for nonnegative values, the negative part of the
    /// interval is ignored for them.
    pub fn power(self, exponent: f64) -> Self {
        if self.is_empty() {
            return self;
        }
        if exponent == 0.0 {
            return Self::point(1.0);
        }
        if exponent == 1.0 {
            return self;
        }

        if exponent.fract() != 0.0 {
            if self.sup < 0.0 {
                return Self::empty();
            }
            let inf = self.inf.max(0.0);
            return if exponent > 0.0 {
                Self::new(inf.powf(exponent), self.sup.powf(exponent))
            } else {
                Self::new(self.sup.powf(exponent), inf.powf(exponent))
            };
        }

        let even = exponent % 2.0 == 0.0;
        if exponent > 0.0 {
            if !even || self.inf >= 0.0 {
                Self::new(self.inf.powf(exponent), self.sup.powf(exponent))
            } else if self.sup <= 0.0 {
                Self::new(self.sup.powf(exponent), self.inf.powf(exponent))
            } else {
                Self::new(0.0, self.sup.max(-self.inf).powf(exponent))
            }
        } else if self.inf > 0.0 || self.sup < 0.0 {
            if even {
                let (small, large) = if self.inf > 0.0 {
                    (self.inf, self.sup)
                } else {
                    (-self.sup, -self.inf)
                };
                Self::new(large.powf(exponent), small.powf(exponent))
            } else {
                Self::new(self.sup.powf(exponent), self.inf.powf(exponent))
            }
        } else if even {
            // The pole at zero is included
            Self::new(self.sup.max(-self.inf).powf(exponent), f64::INFINITY)
        } else if self.inf == 0.0 && self.sup > 0.0 {
            Self::new(self.sup.powf(exponent), f64::INFINITY)
        } else if self.sup == 0.0 && self.inf < 0.0 {
            Self::new(f64::NEG_INFINITY, self.inf.powf(exponent))
        } else {
            Self::entire()
        }
    }

    /// `sign(x) * |x|^exponent` for a positive exponent, which is increasing.
    pub fn sign_power(self, exponent: f64) -> Self {
        if self.is_empty() {
            return self;
        }
        let f = |x: f64| x.signum() * x.abs().powf(exponent);
        Self::new(f(self.inf), f(self.sup))
    }

    #[allow(missing_docs)]
    pub fn exp(self) -> Self {
        if self.is_empty() {
            self
        } else {
            Self::new(self.inf.exp(), self.sup.exp())
        }
    }

    /// Natural logarithm of the positive part.
    pub fn ln(self) -> Self {
        if self.is_empty() || self.sup < 0.0 {
            Self::empty()
        } else {
            Self::new(self.inf.max(0.0).ln(), self.sup.ln())
        }
    }

    #[allow(missing_docs)]
    pub fn min(self, other: Self) -> Self {
        Self::new(self.inf.min(other.inf), self.sup.min(other.sup))
    }

    #[allow(missing_docs)]
    pub fn max(self, other: Self) -> Self {
        Self::new(self.inf.max(other.inf), self.sup.max(other.sup))
    }

    #[allow(missing_docs)]
    pub fn abs(self) -> Self {
        if self.is_empty() || self.inf >= 0.0 {
            self
        } else if self.sup <= 0.0 {
            Self::new(-self.sup, -self.inf)
        } else {
            Self::new(0.0, self.sup.max(-self.inf))
        }
    }

    /// Sign with the convention that zero is positive.
    pub fn sign(self) -> Self {
        if self.is_empty() {
            self
        } else if self.inf >= 0.0 {
            Self::point(1.0)
        } else if self.sup < 0.0 {
            Self::point(-1.0)
        } else {
            Self::new(-1.0, 1.0)
        }
    }

    /// Range of `a x^2 + b x` for `x` in `self` and `b` in `linear`.
    ///
    /// For fixed `x` the expression is linear in `b`, so the extremes are attained at the bounds
    /// of `linear` and the range is exact for finite `linear`.
    pub fn quadratic(self, square: f64, linear: Interval) -> Self {
        if self.is_empty() || linear.is_empty() {
            return Self::empty();
        }
        if linear.inf.is_infinite() || linear.sup.is_infinite() {
            return self.square().scale(square) + linear * self;
        }

        let range = |b: f64| {
            let f = |x: f64| {
                if x.is_infinite() {
                    if square != 0.0 {
                        square.signum() * f64::INFINITY
                    } else {
                        bound_product(b, x)
                    }
                } else {
                    square * x * x + b * x
                }
            };
            let mut low = f(self.inf).min(f(self.sup));
            let mut high = f(self.inf).max(f(self.sup));
            if square != 0.0 {
                let vertex = -b / (2.0 * square);
                if self.contains(vertex) {
                    low = low.min(f(vertex));
                    high = high.max(f(vertex));
                }
            }
            Self::new(low, high)
        };

        let at_inf = range(linear.inf);
        let at_sup = range(linear.sup);
        Self::new(at_inf.inf.min(at_sup.inf), at_inf.sup.max(at_sup.sup))
    }
}

impl Add for Interval {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        if self.is_empty() || other.is_empty() {
            return Self::empty();
        }
        Self::new(self.inf + other.inf, self.sup + other.sup)
    }
}

impl Sub for Interval {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        self + (-other)
    }
}

impl Neg for Interval {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::new(-self.sup, -self.inf)
    }
}

impl Mul for Interval {
    type Output = Self;

    fn mul(self, other: Self) -> Self::Output {
        if self.is_empty() || other.is_empty() {
            return Self::empty();
        }
        let products = [
            bound_product(self.inf, other.inf),
            bound_product(self.inf, other.sup),
            bound_product(self.sup, other.inf),
            bound_product(self.sup, other.sup),
        ];
        Self::new(
            products.iter().copied().fold(f64::INFINITY, f64::min),
            products.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        )
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.inf, self.sup)
    }
}

#[cfg(test)]
mod test {
    use approx::assert_relative_eq;

    use crate::data::interval::Interval;

    #[test]
    fn arithmetic() {
        let a = Interval::new(-2.0, 3.0);
        let b = Interval::new(1.0, 2.0);
        assert_eq!(a + b, Interval::new(-1.0, 5.0));
        assert_eq!(a - b, Interval::new(-4.0, 2.0));
        assert_eq!(a * b, Interval::new(-4.0, 6.0));
        assert_eq!(a.div(b), Interval::new(-2.0, 3.0));
        assert!(b.div(a).is_entire());
        assert_eq!(a.square(), Interval::new(0.0, 9.0));
        assert_eq!(Interval::new(0.0, f64::INFINITY) * Interval::point(0.0), Interval::point(0.0));
    }

    #[test]
    fn powers() {
        let a = Interval::new(-2.0, 3.0);
        assert_eq!(a.power(2.0), Interval::new(0.0, 9.0));
        let cube = a.power(3.0);
        assert_relative_eq!(cube.inf, -8.0);
        assert_relative_eq!(cube.sup, 27.0);
        assert!(a.power(-1.0).is_entire());
        let inverse_square = a.power(-2.0);
        assert_relative_eq!(inverse_square.inf, 1.0 / 9.0);
        assert_eq!(inverse_square.sup, f64::INFINITY);
        let root = a.power(0.5);
        assert_eq!(root.inf, 0.0);
        assert_relative_eq!(root.sup, 3f64.sqrt());
        assert_eq!(Interval::new(2.0, 4.0).power(-1.0), Interval::new(0.25, 0.5));
        assert_eq!(Interval::new(-4.0, -2.0).power(-2.0), Interval::new(1.0 / 16.0, 0.25));
        assert_eq!(a.sign_power(2.0), Interval::new(-4.0, 9.0));
        assert!(Interval::new(-2.0, -1.0).sqrt().is_empty());
    }

    #[test]
    fn quadratic() {
        // x^2 - 2x on [0, 3] has its minimum -1 at the vertex
        let range = Interval::new(0.0, 3.0).quadratic(1.0, Interval::point(-2.0));
        assert_relative_eq!(range.inf, -1.0);
        assert_relative_eq!(range.sup, 3.0);

        let range = Interval::new(0.0, 1.0).quadratic(0.0, Interval::new(-1.0, 2.0));
        assert_eq!(range, Interval::new(-1.0, 2.0));
    }

    #[test]
    fn infinity_conversion() {
        let bounds = Interval::from_bounds(-1e20, 5.0, 1e20);
        assert_eq!(bounds.inf, f64::NEG_INFINITY);
        assert_eq!((bounds + Interval::point(1.0)).to_finite(1e20), Interval::new(-1e20, 6.0));
    }
}
