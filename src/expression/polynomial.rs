//! # Polynomials
//!
//! Payload of the polynomial operator: a constant plus a sum of monomials, each a coefficient
//! times a product of powers of children of the node. Exponents are real, so "polynomial" is meant
//! loosely; the degree computation tells whether an expression is a polynomial in the strict
//! sense.
use std::cmp::Ordering;

use crate::data::interval::Interval;
use crate::error::{Error, Result};
use crate::expression::curvature::Curvature;
use crate::settings::is_epsilon_integral;

/// A power of a single child, `x_child^exponent`.
#[allow(missing_docs)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Factor {
    pub child: usize,
    pub exponent: f64,
}

impl Factor {
    #[allow(missing_docs)]
    pub fn new(child: usize, exponent: f64) -> Self {
        Self { child, exponent }
    }
}

/// `coefficient * prod_j x_{c_j}^{e_j}`
#[derive(Clone, Debug, PartialEq)]
pub struct Monomial {
    coefficient: f64,
    factors: Vec<Factor>,
    sorted: bool,
}

impl Monomial {
    /// Create a monomial from its coefficient and factors.
    pub fn new(coefficient: f64, factors: Vec<Factor>) -> Self {
        let sorted = factors.len() <= 1;
        Self { coefficient, factors, sorted }
    }

    /// A monomial without factors.
    pub fn constant(coefficient: f64) -> Self {
        Self::new(coefficient, Vec::new())
    }

    #[allow(missing_docs)]
    pub fn coefficient(&self) -> f64 {
        self.coefficient
    }

    #[allow(missing_docs)]
    pub fn set_coefficient(&mut self, coefficient: f64) {
        self.coefficient = coefficient;
    }

    #[allow(missing_docs)]
    pub fn factors(&self) -> &[Factor] {
        &self.factors
    }

    /// Sum of the exponents.
    pub fn degree(&self) -> f64 {
        self.factors.iter().map(|factor| factor.exponent).sum()
    }

    /// Append factors, possibly for children that already have a factor.
    pub fn add_factors(&mut self, factors: &[Factor]) {
        if factors.is_empty() {
            return;
        }
        self.factors.extend_from_slice(factors);
        self.sorted = self.factors.len() <= 1;
    }

    /// Sort the factors by child index. Idempotent.
    pub fn sort_factors(&mut self) {
        if !self.sorted {
            self.factors.sort_by(|left, right| {
                left.child.cmp(&right.child).then(left.exponent.total_cmp(&right.exponent))
            });
            self.sorted = true;
        }
    }

    /// Position of a factor of the given child.
    ///
    /// If the factors were not merged, this is the position of any factor for that child.
    pub fn find_factor(&mut self, child: usize) -> Option<usize> {
        self.sort_factors();
        self.factors.binary_search_by(|factor| factor.child.cmp(&child)).ok()
    }

    /// Multiply by another monomial.
    ///
    /// # Arguments
    ///
    /// * `other`: Factor to multiply with.
    /// * `child_map`: Maps the children of `other` to children of this monomial, identity if
    ///   `None`.
    pub fn multiply(&mut self, other: &Monomial, child_map: Option<&[usize]>) {
        if other.coefficient == 0.0 {
            self.factors.clear();
            self.coefficient = 0.0;
            self.sorted = true;
            return;
        }

        match child_map {
            Some(map) => {
                let mapped = other.factors.iter()
                    .map(|factor| Factor::new(map[factor.child], factor.exponent))
                    .collect::<Vec<_>>();
                self.add_factors(&mapped);
            }
            None => self.add_factors(&other.factors),
        }
        self.coefficient *= other.coefficient;
    }

    /// Replace the monomial by an integer power of itself.
    pub fn power(&mut self, exponent: i32) {
        match exponent {
            1 => {}
            0 => {
                // 0^0 stays 0
                if self.coefficient != 0.0 {
                    self.coefficient = 1.0;
                }
                self.factors.clear();
                self.sorted = true;
            }
            _ => {
                self.coefficient = self.coefficient.powi(exponent);
                for factor in &mut self.factors {
                    factor.exponent *= f64::from(exponent);
                }
            }
        }
    }

    /// Combine factors of the same child and clean up values close to special ones.
    ///
    /// Exponents of a child are added, exponents within `epsilon` of zero are dropped and those
    /// within `epsilon` of an integer are rounded. A coefficient within `epsilon` of one or minus
    /// one is snapped.
    pub fn merge_factors(&mut self, epsilon: f64) {
        self.sort_factors();

        let mut merged: Vec<Factor> = Vec::with_capacity(self.factors.len());
        for factor in self.factors.drain(..) {
            match merged.last_mut() {
                Some(last) if last.child == factor.child => last.exponent += factor.exponent,
                _ => merged.push(factor),
            }
        }
        merged.retain(|factor| factor.exponent.abs() > epsilon);
        for factor in &mut merged {
            if is_epsilon_integral(factor.exponent, epsilon) {
                factor.exponent = (factor.exponent + 0.5).floor();
            }
        }
        self.factors = merged;

        self.snap_coefficient(epsilon);
    }

    fn snap_coefficient(&mut self, epsilon: f64) {
        if (self.coefficient - 1.0).abs() <= epsilon {
            self.coefficient = 1.0;
        } else if (self.coefficient + 1.0).abs() <= epsilon {
            self.coefficient = -1.0;
        }
    }

    /// Whether two monomials have the same coefficient and factors up to `epsilon`.
    pub fn is_equal(&mut self, other: &mut Monomial, epsilon: f64) -> bool {
        if self.factors.len() != other.factors.len() {
            return false;
        }
        if (self.coefficient - other.coefficient).abs() > epsilon {
            return false;
        }

        self.sort_factors();
        other.sort_factors();
        self.factors.iter().zip(&other.factors).all(|(left, right)| {
            left.child == right.child && (left.exponent - right.exponent).abs() <= epsilon
        })
    }

    /// Value at the given child values.
    ///
    /// # Return value
    ///
    /// `None` when a zero child value is raised to a negative power.
    fn evaluate(&self, arguments: &[f64]) -> Option<f64> {
        let mut value = self.coefficient;

        for factor in &self.factors {
            let base = arguments[factor.child];
            if base == 1.0 {
                continue;
            }

            let exponent = factor.exponent;
            if base == 0.0 {
                if exponent > 0.0 {
                    return Some(0.0);
                } else if exponent < 0.0 {
                    return None;
                }
                continue;
            }

            value *= match exponent {
                0.0 => 1.0,
                1.0 => base,
                2.0 => base * base,
                0.5 => base.sqrt(),
                -1.0 => base.recip(),
                -2.0 => (base * base).recip(),
                _ => base.powf(exponent),
            };
        }

        Some(value)
    }

    fn evaluate_interval(&self, arguments: &[Interval]) -> Interval {
        let mut value = Interval::point(self.coefficient);

        for factor in &self.factors {
            if value.is_entire() {
                break;
            }

            let base = arguments[factor.child];
            value = match factor.exponent {
                0.0 => continue,
                1.0 => value * base,
                2.0 => value * base.square(),
                0.5 => value * base.sqrt(),
                -1.0 => value.div(base),
                -2.0 => value.div(base.square()),
                exponent => value * base.power(exponent),
            };
            if value.is_empty() {
                return value;
            }
        }

        value
    }
}

/// Order of monomials with sorted factors.
///
/// The first differing factor decides, by child index and then by exponent. If one factor list
/// is a prefix of the other, the shorter monomial comes first.
fn compare(left: &Monomial, right: &Monomial) -> Ordering {
    debug_assert!(left.sorted && right.sorted);

    for (l, r) in left.factors.iter().zip(&right.factors) {
        match l.child.cmp(&r.child).then(l.exponent.total_cmp(&r.exponent)) {
            Ordering::Equal => {}
            ordering => return ordering,
        }
    }
    left.factors.len().cmp(&right.factors.len())
}

/// `constant + sum_i monomial_i`
#[derive(Clone, Debug, PartialEq)]
pub struct PolynomialData {
    constant: f64,
    monomials: Vec<Monomial>,
    sorted: bool,
}

impl PolynomialData {
    /// Create polynomial data.
    pub fn new(constant: f64, monomials: Vec<Monomial>) -> Self {
        let sorted = monomials.is_empty();
        Self { constant, monomials, sorted }
    }

    #[allow(missing_docs)]
    pub fn constant(&self) -> f64 {
        self.constant
    }

    #[allow(missing_docs)]
    pub fn set_constant(&mut self, constant: f64) {
        self.constant = constant;
    }

    #[allow(missing_docs)]
    pub fn monomials(&self) -> &[Monomial] {
        &self.monomials
    }

    /// Append monomials.
    pub fn add_monomials(&mut self, monomials: impl IntoIterator<Item = Monomial>) {
        let before = self.monomials.len();
        self.monomials.extend(monomials);
        if self.monomials.len() > before {
            self.sorted = false;
        }
    }

    /// Sort the factors of each monomial and then the monomials. Idempotent.
    pub fn sort_monomials(&mut self) {
        if self.sorted {
            debug_assert!(self.monomials.windows(2).all(|pair| compare(&pair[0], &pair[1]) != Ordering::Greater));
            return;
        }

        for monomial in &mut self.monomials {
            monomial.sort_factors();
        }
        self.monomials.sort_by(compare);
        self.sorted = true;
    }

    /// Combine monomials that only differ in their coefficient.
    ///
    /// Monomials without factors are moved into the constant and monomials with a coefficient
    /// within `epsilon` of zero are dropped, as is a constant within `epsilon` of zero. Applying
    /// this twice has the same effect as applying it once.
    ///
    /// # Arguments
    ///
    /// * `epsilon`: Threshold below which values are treated as zero.
    /// * `merge_factors`: Whether the factors of each monomial are merged first, see
    ///   `Monomial::merge_factors`.
    pub fn merge_monomials(&mut self, epsilon: f64, merge_factors: bool) {
        if merge_factors {
            for monomial in &mut self.monomials {
                monomial.merge_factors(epsilon);
            }
            self.sorted = false;
        }
        self.sort_monomials();

        let mut merged: Vec<Monomial> = Vec::with_capacity(self.monomials.len());
        for monomial in self.monomials.drain(..) {
            match merged.last_mut() {
                Some(last) if compare(last, &monomial) == Ordering::Equal => last.coefficient += monomial.coefficient,
                _ => merged.push(monomial),
            }
        }

        let mut constant = self.constant;
        merged.retain(|monomial| {
            if monomial.factors.is_empty() {
                constant += monomial.coefficient;
                false
            } else {
                monomial.coefficient.abs() > epsilon
            }
        });
        if merge_factors {
            for monomial in &mut merged {
                monomial.snap_coefficient(epsilon);
            }
        }

        self.monomials = merged;
        self.constant = if constant.abs() <= epsilon { 0.0 } else { constant };
    }

    /// Multiply each term by a constant.
    pub fn multiply_by_constant(&mut self, factor: f64) {
        if factor == 1.0 {
            return;
        }

        if factor == 0.0 {
            self.monomials.clear();
            self.sorted = true;
        } else {
            for monomial in &mut self.monomials {
                monomial.coefficient *= factor;
            }
        }
        self.constant *= factor;
    }

    /// Multiply each term by a monomial.
    ///
    /// # Arguments
    ///
    /// * `factor`: Monomial to multiply with.
    /// * `child_map`: Maps the children of `factor` to children of this polynomial, identity if
    ///   `None`.
    pub fn multiply_by_monomial(&mut self, factor: &Monomial, child_map: Option<&[usize]>) {
        if factor.factors.is_empty() {
            self.multiply_by_constant(factor.coefficient);
            return;
        }

        for monomial in &mut self.monomials {
            monomial.multiply(factor, child_map);
        }
        if self.constant != 0.0 {
            let mut monomial = Monomial::constant(self.constant);
            monomial.multiply(factor, child_map);
            self.monomials.push(monomial);
            self.constant = 0.0;
        }
        self.sorted = self.monomials.is_empty();
    }

    /// Distribute a product with another polynomial over all terms.
    ///
    /// # Arguments
    ///
    /// * `factor`: Polynomial to multiply with, a different value than `self`.
    /// * `child_map`: Maps the children of `factor` to children of this polynomial, identity if
    ///   `None`.
    pub fn multiply_by_polynomial(&mut self, factor: &PolynomialData, child_map: Option<&[usize]>) {
        if factor.monomials.is_empty() {
            self.multiply_by_constant(factor.constant);
            return;
        }
        if factor.monomials.len() == 1 && factor.constant == 0.0 {
            self.multiply_by_monomial(&factor.monomials[0], child_map);
            return;
        }

        let mut original = std::mem::take(&mut self.monomials);
        if self.constant != 0.0 {
            original.push(Monomial::constant(self.constant));
            self.constant = 0.0;
        }

        let nr_right = factor.monomials.len() + usize::from(factor.constant != 0.0);
        let mut product = Vec::with_capacity(original.len() * nr_right);
        for right in &factor.monomials {
            product.extend(original.iter().map(|left| {
                let mut monomial = left.clone();
                monomial.multiply(right, child_map);
                monomial
            }));
        }
        if factor.constant != 0.0 {
            product.extend(original.into_iter().map(|mut monomial| {
                monomial.coefficient *= factor.constant;
                monomial
            }));
        }

        self.monomials = product;
        self.sorted = self.monomials.is_empty();
    }

    /// Replace the polynomial by an integer power of itself.
    ///
    /// # Errors
    ///
    /// `InvalidOperation` for a negative exponent, unless the polynomial is a single monomial or
    /// a constant.
    pub fn power(&mut self, exponent: i32) -> Result<()> {
        if exponent == 0 {
            // 0^0 stays 0
            if !(self.monomials.is_empty() && self.constant == 0.0) {
                self.constant = 1.0;
                self.monomials.clear();
                self.sorted = true;
            }
            return Ok(());
        }
        if exponent == 1 {
            return Ok(());
        }
        if self.monomials.len() == 1 && self.constant == 0.0 {
            self.monomials[0].power(exponent);
            return Ok(());
        }
        if self.monomials.is_empty() {
            self.constant = self.constant.powi(exponent);
            return Ok(());
        }
        if exponent < 0 {
            return Err(Error::InvalidOperation(format!(
                "negative power {} of a polynomial with {} terms", exponent, self.monomials.len() + 1,
            )));
        }

        let factor = self.clone();
        for _ in 2..=exponent {
            self.multiply_by_polynomial(&factor, None);
            self.merge_monomials(0.0, true);
        }

        Ok(())
    }

    /// Largest child index referenced.
    pub(crate) fn max_child(&self) -> Option<usize> {
        self.monomials.iter()
            .flat_map(|monomial| monomial.factors.iter().map(|factor| factor.child))
            .max()
    }

    /// Largest degree of a monomial given the degrees of the children.
    ///
    /// A factor with an exponent that is not a natural number makes the degree infinite, unless
    /// its child is constant.
    pub(crate) fn max_degree(&self, child_degrees: &[u32], infinity: u32) -> u32 {
        let mut max_degree = 0;
        for monomial in &self.monomials {
            let mut degree = 0_u32;
            for factor in &monomial.factors {
                let child_degree = child_degrees[factor.child];
                if child_degree == 0 {
                    continue;
                }
                if child_degree >= infinity || factor.exponent < 0.0 || factor.exponent.fract() != 0.0 {
                    return infinity;
                }
                // Exponents are small integers at this point
                degree = degree.saturating_add((factor.exponent as u32).saturating_mul(child_degree));
            }
            max_degree = max_degree.max(degree.min(infinity));
        }
        max_degree
    }

    /// Value at the given child values.
    ///
    /// A zero child value raised to a negative power makes the whole value NaN, without
    /// evaluating the remaining monomials.
    pub(crate) fn evaluate(&self, arguments: &[f64]) -> f64 {
        let mut value = self.constant;
        for monomial in &self.monomials {
            match monomial.evaluate(arguments) {
                Some(monomial_value) => value += monomial_value,
                None => return f64::NAN,
            }
        }
        value
    }

    pub(crate) fn evaluate_interval(&self, arguments: &[Interval]) -> Interval {
        let mut result = Interval::point(self.constant);
        for monomial in &self.monomials {
            let value = monomial.evaluate_interval(arguments);
            if value.is_empty() {
                return value;
            }
            result = result + value;
        }
        result
    }

    pub(crate) fn curvature(&self, bounds: &[Interval], curvatures: &[Curvature]) -> Curvature {
        let mut result = Curvature::Linear;
        for monomial in &self.monomials {
            if result == Curvature::Unknown {
                break;
            }
            let curvature = Curvature::monomial(&monomial.factors, curvatures, bounds);
            result = result & curvature.scale(monomial.coefficient);
        }
        result
    }
}

#[cfg(test)]
mod test {
    use approx::assert_relative_eq;

    use crate::expression::polynomial::{Factor, Monomial, PolynomialData};

    /// `2 x0 x1 + 3 x1 + 1`
    fn polynomial() -> PolynomialData {
        PolynomialData::new(1.0, vec![
            Monomial::new(2.0, vec![Factor::new(1, 1.0), Factor::new(0, 1.0)]),
            Monomial::new(3.0, vec![Factor::new(1, 1.0)]),
        ])
    }

    #[test]
    fn merge_factors() {
        let mut monomial = Monomial::new(1.0 + 1e-12, vec![
            Factor::new(2, 1.5), Factor::new(0, 2.0), Factor::new(2, 0.5 + 1e-12), Factor::new(1, 1e-13),
        ]);
        monomial.merge_factors(1e-9);
        assert_eq!(monomial.factors(), &[Factor::new(0, 2.0), Factor::new(2, 2.0)]);
        assert_eq!(monomial.coefficient(), 1.0);
        assert_eq!(monomial.find_factor(2), Some(1));
        assert_eq!(monomial.find_factor(1), None);
    }

    #[test]
    fn merge_monomials_is_idempotent() {
        let mut data = PolynomialData::new(0.5, vec![
            Monomial::new(2.0, vec![Factor::new(0, 1.0), Factor::new(1, 1.0)]),
            Monomial::new(1e-12, vec![Factor::new(0, 3.0)]),
            Monomial::new(0.5, vec![Factor::new(1, 1.0), Factor::new(0, 0.5), Factor::new(0, 0.5)]),
            Monomial::new(-0.5, vec![Factor::new(1, 2.0), Factor::new(1, -2.0)]),
            Monomial::new(0.5 + 1e-12, vec![Factor::new(1, 1.0)]),
            Monomial::new(0.5, vec![Factor::new(1, 1.0)]),
        ]);
        data.merge_monomials(1e-9, true);

        assert_eq!(data.constant(), 0.0);
        assert_eq!(data.monomials().len(), 2);
        assert_eq!(data.monomials()[0].coefficient(), 2.5);
        assert_eq!(data.monomials()[0].factors(), &[Factor::new(0, 1.0), Factor::new(1, 1.0)]);
        assert_eq!(data.monomials()[1].coefficient(), 1.0);

        let once = data.clone();
        data.merge_monomials(1e-9, true);
        assert_eq!(data, once);
    }

    #[test]
    fn multiply() {
        let mut data = polynomial();
        // (2 x0 x1 + 3 x1 + 1)(x0 - 1)
        let factor = PolynomialData::new(-1.0, vec![Monomial::new(1.0, vec![Factor::new(0, 1.0)])]);
        data.multiply_by_polynomial(&factor, None);
        let arguments = [2.0, 3.0];
        assert_relative_eq!(data.evaluate(&arguments), (12.0 + 9.0 + 1.0) * (2.0 - 1.0));
        assert_eq!(data.monomials().len(), 6);

        data.merge_monomials(0.0, true);
        assert_relative_eq!(data.evaluate(&arguments), 22.0);
        assert_eq!(data.constant(), -1.0);

        let mut data = polynomial();
        data.multiply_by_monomial(&Monomial::new(2.0, vec![Factor::new(0, 1.0)]), Some(&[1, 0]));
        // (2 x0 x1 + 3 x1 + 1) 2 x1
        assert_relative_eq!(data.evaluate(&arguments), 22.0 * 6.0);
        assert_eq!(data.constant(), 0.0);
    }

    #[test]
    fn power() {
        let mut data = polynomial();
        data.power(2).unwrap();
        assert_relative_eq!(data.evaluate(&[2.0, 3.0]), 22.0 * 22.0);
        assert_relative_eq!(data.evaluate(&[-1.0, 0.5]), 1.5 * 1.5);

        let mut data = polynomial();
        assert!(data.power(-1).is_err());

        let mut monomial = PolynomialData::new(0.0, vec![Monomial::new(2.0, vec![Factor::new(0, 1.5)])]);
        monomial.power(-2).unwrap();
        assert_eq!(monomial.monomials()[0], Monomial::new(0.25, vec![Factor::new(0, -3.0)]));

        let mut zero = PolynomialData::new(0.0, vec![]);
        zero.power(0).unwrap();
        assert_eq!(zero.constant(), 0.0);
        let mut data = polynomial();
        data.power(0).unwrap();
        assert_eq!(data, PolynomialData::new(1.0, vec![]));
    }

    #[test]
    fn evaluate_zero_to_negative_power() {
        let data = PolynomialData::new(5.0, vec![
            Monomial::new(1.0, vec![Factor::new(0, 1.0)]),
            Monomial::new(1.0, vec![Factor::new(1, -1.0)]),
            Monomial::new(1.0, vec![Factor::new(0, 2.0)]),
        ]);
        assert!(data.evaluate(&[2.0, 0.0]).is_nan());
        assert_relative_eq!(data.evaluate(&[2.0, 4.0]), 5.0 + 2.0 + 0.25 + 4.0);
        // A zero base with a positive exponent only zeroes its own monomial
        assert_relative_eq!(data.evaluate(&[0.0, 4.0]), 5.25);
    }
}
