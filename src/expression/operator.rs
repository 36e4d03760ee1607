//! # Operators
//!
//! The closed set of operators an expression node can carry. Each operator knows how to combine
//! the values, ranges and curvatures of its children; the recursion over the tree lives in the
//! parent module.
use std::convert::TryFrom;
use std::fmt;

use log::debug;

use crate::data::interval::Interval;
use crate::error::{Error, Result};
use crate::expression::curvature::Curvature;
use crate::expression::polynomial::PolynomialData;
use crate::expression::quadratic::QuadraticData;

/// Operator tags with their stable numeric codes.
#[allow(missing_docs)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum OperatorKind {
    Variable = 1,
    Constant = 2,
    Parameter = 3,
    Plus = 8,
    Minus = 9,
    Mul = 10,
    Div = 11,
    Square = 12,
    Sqrt = 13,
    RealPower = 14,
    IntPower = 15,
    SignPower = 16,
    Exp = 17,
    Log = 18,
    Sin = 19,
    Cos = 20,
    Tan = 21,
    Min = 24,
    Max = 25,
    Abs = 26,
    Sign = 27,
    Sum = 64,
    Product = 65,
    Linear = 66,
    Quadratic = 67,
    Polynomial = 68,
}

impl OperatorKind {
    /// Number of children, `None` for operators with any number of children.
    pub fn arity(self) -> Option<usize> {
        match self {
            OperatorKind::Variable | OperatorKind::Constant | OperatorKind::Parameter => Some(0),
            OperatorKind::Plus | OperatorKind::Minus | OperatorKind::Mul | OperatorKind::Div
            | OperatorKind::Min | OperatorKind::Max => Some(2),
            OperatorKind::Square | OperatorKind::Sqrt | OperatorKind::RealPower | OperatorKind::IntPower
            | OperatorKind::SignPower | OperatorKind::Exp | OperatorKind::Log | OperatorKind::Sin
            | OperatorKind::Cos | OperatorKind::Tan | OperatorKind::Abs | OperatorKind::Sign => Some(1),
            OperatorKind::Sum | OperatorKind::Product | OperatorKind::Linear | OperatorKind::Quadratic
            | OperatorKind::Polynomial => None,
        }
    }

    #[allow(missing_docs)]
    pub fn name(self) -> &'static str {
        match self {
            OperatorKind::Variable => "var",
            OperatorKind::Constant => "const",
            OperatorKind::Parameter => "param",
            OperatorKind::Plus => "plus",
            OperatorKind::Minus => "minus",
            OperatorKind::Mul => "mul",
            OperatorKind::Div => "div",
            OperatorKind::Square => "sqr",
            OperatorKind::Sqrt => "sqrt",
            OperatorKind::RealPower => "realpower",
            OperatorKind::IntPower => "intpower",
            OperatorKind::SignPower => "signpower",
            OperatorKind::Exp => "exp",
            OperatorKind::Log => "log",
            OperatorKind::Sin => "sin",
            OperatorKind::Cos => "cos",
            OperatorKind::Tan => "tan",
            OperatorKind::Min => "min",
            OperatorKind::Max => "max",
            OperatorKind::Abs => "abs",
            OperatorKind::Sign => "sign",
            OperatorKind::Sum => "sum",
            OperatorKind::Product => "prod",
            OperatorKind::Linear => "linear",
            OperatorKind::Quadratic => "quadratic",
            OperatorKind::Polynomial => "polynomial",
        }
    }
}

impl TryFrom<u8> for OperatorKind {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self> {
        let kind = match code {
            1 => OperatorKind::Variable,
            2 => OperatorKind::Constant,
            3 => OperatorKind::Parameter,
            8 => OperatorKind::Plus,
            9 => OperatorKind::Minus,
            10 => OperatorKind::Mul,
            11 => OperatorKind::Div,
            12 => OperatorKind::Square,
            13 => OperatorKind::Sqrt,
            14 => OperatorKind::RealPower,
            15 => OperatorKind::IntPower,
            16 => OperatorKind::SignPower,
            17 => OperatorKind::Exp,
            18 => OperatorKind::Log,
            19 => OperatorKind::Sin,
            20 => OperatorKind::Cos,
            21 => OperatorKind::Tan,
            24 => OperatorKind::Min,
            25 => OperatorKind::Max,
            26 => OperatorKind::Abs,
            27 => OperatorKind::Sign,
            64 => OperatorKind::Sum,
            65 => OperatorKind::Product,
            66 => OperatorKind::Linear,
            67 => OperatorKind::Quadratic,
            68 => OperatorKind::Polynomial,
            _ => return Err(Error::InvalidOperator(format!("unknown operator code {code}"))),
        };

        Ok(kind)
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Payload of the linear operator, `constant + sum_i coefficients_i x_i`.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearData {
    coefficients: Vec<f64>,
    constant: f64,
}

impl LinearData {
    #[allow(missing_docs)]
    pub fn new(coefficients: Vec<f64>, constant: f64) -> Self {
        Self { coefficients, constant }
    }

    /// One coefficient per child.
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    #[allow(missing_docs)]
    pub fn constant(&self) -> f64 {
        self.constant
    }
}

/// Untyped operator data, used to build an operator from its numeric code.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    None,
    Index(usize),
    Real(f64),
    Integer(i32),
    Linear(LinearData),
    Quadratic(QuadraticData),
    Polynomial(PolynomialData),
}

/// An operator together with its data.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq)]
pub enum Operator {
    /// Index of a variable.
    Variable(usize),
    Constant(f64),
    /// Index of a parameter.
    Parameter(usize),
    Plus,
    Minus,
    Mul,
    Div,
    Square,
    Sqrt,
    /// Exponent.
    RealPower(f64),
    /// Exponent.
    IntPower(i32),
    /// Positive exponent of `sign(x) |x|^e`.
    SignPower(f64),
    Exp,
    Log,
    Sin,
    Cos,
    Tan,
    Min,
    Max,
    Abs,
    Sign,
    Sum,
    Product,
    Linear(LinearData),
    Quadratic(QuadraticData),
    Polynomial(PolynomialData),
}

impl Operator {
    /// Build an operator from its numeric code and data.
    ///
    /// # Errors
    ///
    /// `InvalidOperator` for an unknown code, `InvalidOperand` if the payload does not fit the
    /// operator.
    pub fn from_code(code: u8, payload: Payload) -> Result<Self> {
        let kind = OperatorKind::try_from(code)?;

        let operator = match (kind, payload) {
            (OperatorKind::Variable, Payload::Index(index)) => Operator::Variable(index),
            (OperatorKind::Constant, Payload::Real(value)) => Operator::Constant(value),
            (OperatorKind::Parameter, Payload::Index(index)) => Operator::Parameter(index),
            (OperatorKind::RealPower, Payload::Real(exponent)) => Operator::RealPower(exponent),
            (OperatorKind::IntPower, Payload::Integer(exponent)) => Operator::IntPower(exponent),
            (OperatorKind::SignPower, Payload::Real(exponent)) => Operator::SignPower(exponent),
            (OperatorKind::Linear, Payload::Linear(data)) => Operator::Linear(data),
            (OperatorKind::Quadratic, Payload::Quadratic(data)) => Operator::Quadratic(data),
            (OperatorKind::Polynomial, Payload::Polynomial(data)) => Operator::Polynomial(data),
            (OperatorKind::Plus, Payload::None) => Operator::Plus,
            (OperatorKind::Minus, Payload::None) => Operator::Minus,
            (OperatorKind::Mul, Payload::None) => Operator::Mul,
            (OperatorKind::Div, Payload::None) => Operator::Div,
            (OperatorKind::Square, Payload::None) => Operator::Square,
            (OperatorKind::Sqrt, Payload::None) => Operator::Sqrt,
            (OperatorKind::Exp, Payload::None) => Operator::Exp,
            (OperatorKind::Log, Payload::None) => Operator::Log,
            (OperatorKind::Sin, Payload::None) => Operator::Sin,
            (OperatorKind::Cos, Payload::None) => Operator::Cos,
            (OperatorKind::Tan, Payload::None) => Operator::Tan,
            (OperatorKind::Min, Payload::None) => Operator::Min,
            (OperatorKind::Max, Payload::None) => Operator::Max,
            (OperatorKind::Abs, Payload::None) => Operator::Abs,
            (OperatorKind::Sign, Payload::None) => Operator::Sign,
            (OperatorKind::Sum, Payload::None) => Operator::Sum,
            (OperatorKind::Product, Payload::None) => Operator::Product,
            (kind, payload) => return Err(Error::InvalidOperand(format!(
                "payload {payload:?} does not fit operator {kind}",
            ))),
        };

        Ok(operator)
    }

    #[allow(missing_docs)]
    pub fn kind(&self) -> OperatorKind {
        match self {
            Operator::Variable(_) => OperatorKind::Variable,
            Operator::Constant(_) => OperatorKind::Constant,
            Operator::Parameter(_) => OperatorKind::Parameter,
            Operator::Plus => OperatorKind::Plus,
            Operator::Minus => OperatorKind::Minus,
            Operator::Mul => OperatorKind::Mul,
            Operator::Div => OperatorKind::Div,
            Operator::Square => OperatorKind::Square,
            Operator::Sqrt => OperatorKind::Sqrt,
            Operator::RealPower(_) => OperatorKind::RealPower,
            Operator::IntPower(_) => OperatorKind::IntPower,
            Operator::SignPower(_) => OperatorKind::SignPower,
            Operator::Exp => OperatorKind::Exp,
            Operator::Log => OperatorKind::Log,
            Operator::Sin => OperatorKind::Sin,
            Operator::Cos => OperatorKind::Cos,
            Operator::Tan => OperatorKind::Tan,
            Operator::Min => OperatorKind::Min,
            Operator::Max => OperatorKind::Max,
            Operator::Abs => OperatorKind::Abs,
            Operator::Sign => OperatorKind::Sign,
            Operator::Sum => OperatorKind::Sum,
            Operator::Product => OperatorKind::Product,
            Operator::Linear(_) => OperatorKind::Linear,
            Operator::Quadratic(_) => OperatorKind::Quadratic,
            Operator::Polynomial(_) => OperatorKind::Polynomial,
        }
    }

    /// Check that the operator data is consistent with the number of children.
    pub(crate) fn validate(&self, nr_children: usize) -> Result<()> {
        let kind = self.kind();
        if let Some(arity) = kind.arity() {
            if arity != nr_children {
                return Err(Error::InvalidOperator(format!(
                    "operator {kind} takes {arity} children, got {nr_children}",
                )));
            }
        }

        let consistent = match self {
            Operator::Linear(data) => data.coefficients.len() == nr_children,
            Operator::Quadratic(data) => {
                data.nr_linear_coefficients().is_none_or(|len| len == nr_children)
                    && data.max_child().is_none_or(|child| child < nr_children)
            }
            Operator::Polynomial(data) => data.max_child().is_none_or(|child| child < nr_children),
            Operator::SignPower(exponent) => exponent.is_finite() && *exponent > 0.0,
            _ => true,
        };
        if consistent {
            Ok(())
        } else {
            Err(Error::InvalidOperand(format!("data of operator {kind} does not fit {nr_children} children")))
        }
    }

    /// Value of the operator applied to the values of its children.
    pub(crate) fn evaluate(&self, children: &[f64], variables: &[f64], parameters: &[f64]) -> f64 {
        match self {
            Operator::Variable(index) => variables[*index],
            Operator::Constant(value) => *value,
            Operator::Parameter(index) => parameters[*index],
            Operator::Plus => children[0] + children[1],
            Operator::Minus => children[0] - children[1],
            Operator::Mul => children[0] * children[1],
            Operator::Div => children[0] / children[1],
            Operator::Square => children[0] * children[0],
            Operator::Sqrt => children[0].sqrt(),
            Operator::RealPower(exponent) => children[0].powf(*exponent),
            Operator::IntPower(exponent) => {
                let x = children[0];
                match *exponent {
                    -1 => 1.0 / x,
                    0 => 1.0,
                    1 => x,
                    2 => x * x,
                    exponent => x.powi(exponent),
                }
            }
            Operator::SignPower(exponent) => {
                let x = children[0];
                if x > 0.0 { x.powf(*exponent) } else { -(-x).powf(*exponent) }
            }
            Operator::Exp => children[0].exp(),
            Operator::Log => children[0].ln(),
            Operator::Sin => children[0].sin(),
            Operator::Cos => children[0].cos(),
            Operator::Tan => children[0].tan(),
            Operator::Min => children[0].min(children[1]),
            Operator::Max => children[0].max(children[1]),
            Operator::Abs => children[0].abs(),
            Operator::Sign => if children[0] >= 0.0 { 1.0 } else { -1.0 },
            Operator::Sum => children.iter().sum(),
            Operator::Product => children.iter().product(),
            Operator::Linear(data) => data.constant + data.coefficients.iter()
                .zip(children)
                .map(|(coefficient, value)| coefficient * value)
                .sum::<f64>(),
            Operator::Quadratic(data) => data.evaluate(children),
            Operator::Polynomial(data) => data.evaluate(children),
        }
    }

    /// Range of the operator over the ranges of its children.
    pub(crate) fn evaluate_interval(
        &self,
        children: &[Interval],
        variables: &[Interval],
        parameters: &[f64],
    ) -> Interval {
        match self {
            Operator::Variable(index) => variables[*index],
            Operator::Constant(value) => Interval::point(*value),
            Operator::Parameter(index) => Interval::point(parameters[*index]),
            Operator::Plus => children[0] + children[1],
            Operator::Minus => children[0] - children[1],
            Operator::Mul => children[0] * children[1],
            Operator::Div => children[0].div(children[1]),
            Operator::Square => children[0].square(),
            Operator::Sqrt => children[0].sqrt(),
            Operator::RealPower(exponent) => children[0].power(*exponent),
            Operator::IntPower(exponent) => children[0].power(f64::from(*exponent)),
            Operator::SignPower(exponent) => children[0].sign_power(*exponent),
            Operator::Exp => children[0].exp(),
            Operator::Log => children[0].ln(),
            Operator::Sin | Operator::Cos => {
                debug!("Using the trivial range [-1, 1] for {}", self.kind());
                Interval::new(-1.0, 1.0)
            }
            Operator::Tan => Interval::entire(),
            Operator::Min => children[0].min(children[1]),
            Operator::Max => children[0].max(children[1]),
            Operator::Abs => children[0].abs(),
            Operator::Sign => children[0].sign(),
            Operator::Sum => children.iter().fold(Interval::point(0.0), |total, &child| total + child),
            Operator::Product => children.iter().fold(Interval::point(1.0), |total, &child| total * child),
            Operator::Linear(data) => data.coefficients.iter()
                .zip(children)
                .fold(Interval::point(data.constant), |total, (&coefficient, &child)| {
                    total + child.scale(coefficient)
                }),
            Operator::Quadratic(data) => data.evaluate_interval(children),
            Operator::Polynomial(data) => data.evaluate_interval(children),
        }
    }

    /// Curvature of the operator given the ranges and curvatures of its children.
    pub(crate) fn curvature(&self, bounds: &[Interval], curvatures: &[Curvature]) -> Curvature {
        match self {
            Operator::Variable(_) | Operator::Constant(_) | Operator::Parameter(_) => Curvature::Linear,
            Operator::Plus => curvatures[0] & curvatures[1],
            Operator::Minus => curvatures[0] & curvatures[1].negate(),
            Operator::Mul => {
                if bounds[0].is_point() {
                    curvatures[1].scale(bounds[0].inf)
                } else if bounds[1].is_point() {
                    curvatures[0].scale(bounds[1].inf)
                } else {
                    Curvature::Unknown
                }
            }
            Operator::Div => {
                let (numerator, denominator) = (bounds[0], bounds[1]);
                if denominator.is_point() {
                    curvatures[0].scale(denominator.inf)
                } else if numerator.is_point() {
                    if denominator.inf >= 0.0 && curvatures[1].is_concave() {
                        Curvature::Convex.scale(numerator.inf)
                    } else if denominator.sup <= 0.0 && curvatures[1].is_convex() {
                        Curvature::Concave.scale(numerator.inf)
                    } else {
                        Curvature::Unknown
                    }
                } else {
                    Curvature::Unknown
                }
            }
            Operator::Square => Curvature::power(bounds[0], curvatures[0], 2.0),
            Operator::Sqrt => if curvatures[0].is_concave() { Curvature::Concave } else { Curvature::Unknown },
            Operator::RealPower(exponent) => Curvature::power(bounds[0], curvatures[0], *exponent),
            Operator::IntPower(exponent) => Curvature::power(bounds[0], curvatures[0], f64::from(*exponent)),
            Operator::SignPower(exponent) => {
                let (bound, curvature) = (bounds[0], curvatures[0]);
                let left = if bound.inf < 0.0 {
                    Curvature::power(Interval::new(0.0, -bound.inf), curvature.negate(), *exponent).negate()
                } else {
                    Curvature::Linear
                };
                let right = if bound.sup > 0.0 {
                    Curvature::power(Interval::new(0.0, bound.sup), curvature, *exponent)
                } else {
                    Curvature::Linear
                };
                left & right
            }
            Operator::Exp => if curvatures[0].is_convex() { Curvature::Convex } else { Curvature::Unknown },
            Operator::Log => if curvatures[0].is_concave() { Curvature::Concave } else { Curvature::Unknown },
            Operator::Sin | Operator::Cos | Operator::Tan => Curvature::Unknown,
            Operator::Min => {
                if curvatures[0].is_concave() && curvatures[1].is_concave() {
                    Curvature::Concave
                } else {
                    Curvature::Unknown
                }
            }
            Operator::Max => {
                if curvatures[0].is_convex() && curvatures[1].is_convex() {
                    Curvature::Convex
                } else {
                    Curvature::Unknown
                }
            }
            Operator::Abs => {
                let (bound, curvature) = (bounds[0], curvatures[0]);
                if bound.sup <= 0.0 {
                    curvature.negate()
                } else if bound.inf >= 0.0 {
                    curvature
                } else if curvature == Curvature::Linear {
                    Curvature::Convex
                } else {
                    Curvature::Unknown
                }
            }
            Operator::Sign => {
                if bounds[0].inf >= 0.0 || bounds[0].sup <= 0.0 {
                    Curvature::Linear
                } else {
                    Curvature::Unknown
                }
            }
            Operator::Sum => curvatures.iter().fold(Curvature::Linear, |total, &curvature| total & curvature),
            Operator::Product => {
                let mut factor = 1.0;
                let mut nonconstant = None;
                for (child, bound) in bounds.iter().enumerate() {
                    if bound.is_point() {
                        factor *= bound.inf;
                    } else if nonconstant.is_none() {
                        nonconstant = Some(child);
                    } else {
                        return Curvature::Unknown;
                    }
                }

                match nonconstant {
                    Some(child) => curvatures[child].scale(factor),
                    None => Curvature::Linear,
                }
            }
            Operator::Linear(data) => data.coefficients.iter()
                .zip(curvatures)
                .fold(Curvature::Linear, |total, (&coefficient, curvature)| total & curvature.scale(coefficient)),
            Operator::Quadratic(data) => data.curvature(bounds, curvatures),
            Operator::Polynomial(data) => data.curvature(bounds, curvatures),
        }
    }
}

#[cfg(test)]
mod test {
    use std::convert::TryFrom;

    use approx::assert_relative_eq;

    use crate::data::interval::Interval;
    use crate::expression::curvature::Curvature;
    use crate::expression::operator::{LinearData, Operator, OperatorKind, Payload};

    #[test]
    fn codes() {
        assert_eq!(OperatorKind::try_from(1).unwrap(), OperatorKind::Variable);
        assert_eq!(OperatorKind::try_from(68).unwrap(), OperatorKind::Polynomial);
        assert!(OperatorKind::try_from(22).is_err());
        assert_eq!(OperatorKind::SignPower as u8, 16);
        assert_eq!(OperatorKind::Min.arity(), Some(2));
        assert_eq!(OperatorKind::Sum.arity(), None);

        assert_eq!(Operator::from_code(15, Payload::Integer(3)).unwrap(), Operator::IntPower(3));
        assert!(Operator::from_code(15, Payload::Real(3.0)).is_err());
        assert!(Operator::from_code(8, Payload::Index(0)).is_err());
    }

    #[test]
    fn validate() {
        assert!(Operator::Plus.validate(2).is_ok());
        assert!(Operator::Plus.validate(3).is_err());
        assert!(Operator::Sum.validate(5).is_ok());
        assert!(Operator::Linear(LinearData::new(vec![1.0], 0.0)).validate(2).is_err());
        assert!(Operator::SignPower(-1.0).validate(1).is_err());
    }

    #[test]
    fn evaluate_powers() {
        assert_eq!(Operator::IntPower(-1).evaluate(&[4.0], &[], &[]), 0.25);
        assert_eq!(Operator::IntPower(0).evaluate(&[0.0], &[], &[]), 1.0);
        assert_eq!(Operator::IntPower(3).evaluate(&[-2.0], &[], &[]), -8.0);
        assert_relative_eq!(Operator::SignPower(2.0).evaluate(&[-3.0], &[], &[]), -9.0);
        assert_relative_eq!(Operator::SignPower(0.5).evaluate(&[4.0], &[], &[]), 2.0);
        assert_eq!(Operator::Sign.evaluate(&[0.0], &[], &[]), 1.0);
        assert_eq!(Operator::Sign.evaluate(&[-0.5], &[], &[]), -1.0);
        assert!(Operator::Log.evaluate(&[-1.0], &[], &[]).is_nan());
        assert_eq!(Operator::Div.evaluate(&[1.0, 0.0], &[], &[]), f64::INFINITY);
    }

    #[test]
    fn trigonometric_ranges() {
        let x = [Interval::new(0.0, 0.1)];
        assert_eq!(Operator::Sin.evaluate_interval(&x, &[], &[]), Interval::new(-1.0, 1.0));
        assert_eq!(Operator::Cos.evaluate_interval(&x, &[], &[]), Interval::new(-1.0, 1.0));
        assert!(Operator::Tan.evaluate_interval(&x, &[], &[]).is_entire());
    }

    #[test]
    fn division_curvature() {
        let linear = [Curvature::Linear, Curvature::Linear];
        let positive = Interval::new(1.0, 2.0);
        let negative = Interval::new(-2.0, -1.0);
        let constant = Interval::point(3.0);

        // 3 / x
        assert_eq!(Operator::Div.curvature(&[constant, positive], &linear), Curvature::Convex);
        assert_eq!(Operator::Div.curvature(&[constant, negative], &linear), Curvature::Concave);
        // -3 / x
        let curvature = Operator::Div.curvature(&[Interval::point(-3.0), positive], &linear);
        assert_eq!(curvature, Curvature::Concave);
        // x / -3
        let curvature = Operator::Div.curvature(&[positive, Interval::point(-3.0)], &[Curvature::Convex, Curvature::Linear]);
        assert_eq!(curvature, Curvature::Concave);
        assert_eq!(Operator::Div.curvature(&[positive, positive], &linear), Curvature::Unknown);
    }

    #[test]
    fn unary_curvature() {
        let straddling = [Interval::new(-1.0, 2.0)];
        assert_eq!(Operator::Abs.curvature(&straddling, &[Curvature::Linear]), Curvature::Convex);
        assert_eq!(Operator::Abs.curvature(&straddling, &[Curvature::Convex]), Curvature::Unknown);
        assert_eq!(Operator::Abs.curvature(&[Interval::new(-2.0, -1.0)], &[Curvature::Convex]), Curvature::Concave);
        assert_eq!(Operator::Sign.curvature(&straddling, &[Curvature::Linear]), Curvature::Unknown);
        assert_eq!(Operator::Exp.curvature(&straddling, &[Curvature::Linear]), Curvature::Convex);
        assert_eq!(Operator::Log.curvature(&straddling, &[Curvature::Convex]), Curvature::Unknown);
        assert_eq!(Operator::Sqrt.curvature(&straddling, &[Curvature::Concave]), Curvature::Concave);

        // sign(x) x^2 is convex for positive and concave for negative x
        let power = Operator::SignPower(2.0);
        assert_eq!(power.curvature(&[Interval::new(0.0, 2.0)], &[Curvature::Linear]), Curvature::Convex);
        assert_eq!(power.curvature(&[Interval::new(-2.0, 0.0)], &[Curvature::Linear]), Curvature::Concave);
        assert_eq!(power.curvature(&straddling, &[Curvature::Linear]), Curvature::Unknown);
    }

    #[test]
    fn product_curvature() {
        let bounds = [Interval::point(-2.0), Interval::new(0.0, 1.0), Interval::point(3.0)];
        let curvatures = [Curvature::Linear, Curvature::Convex, Curvature::Linear];
        assert_eq!(Operator::Product.curvature(&bounds, &curvatures), Curvature::Concave);

        let bounds = [Interval::new(0.0, 1.0), Interval::new(0.0, 1.0)];
        assert_eq!(Operator::Product.curvature(&bounds, &curvatures[1..]), Curvature::Unknown);
    }
}
