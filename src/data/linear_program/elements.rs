//! # Building blocks to describe linear programs.
use std::ops::Neg;

use num_traits::One;

/// Direction of a bound.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum BoundDirection {
    /// `x >= b`
    Lower,
    /// `x <= b`
    Upper,
}

impl BoundDirection {
    /// Sign of the substitution `x = b ± x'` that shifts a variable to this bound.
    ///
    /// Lower bounds are subtracted, `x' = x - lb`, upper bounds are mirrored, `x' = ub - x`.
    #[must_use]
    pub fn into<F: One + Neg<Output = F>>(self) -> F {
        match self {
            BoundDirection::Lower => F::one(),
            BoundDirection::Upper => -F::one(),
        }
    }
}

/// A variable is either continuous or integer.
#[allow(missing_docs)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum VariableType {
    Continuous,
    Integer,
}

impl VariableType {
    #[allow(missing_docs)]
    pub fn is_integer(self) -> bool {
        self == VariableType::Integer
    }
}

/// Direction of optimization.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Objective {
    Maximize,
    #[default]
    Minimize,
}

/// Side of a ranged row `lhs <= a x + c <= rhs`.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

#[cfg(test)]
mod test {
    use crate::data::linear_program::elements::{BoundDirection, VariableType};

    #[test]
    fn directions() {
        assert_eq!(BoundDirection::Lower.into::<f64>(), 1.0);
        assert_eq!(BoundDirection::Upper.into::<f64>(), -1.0);
        assert!(VariableType::Integer.is_integer());
    }
}
