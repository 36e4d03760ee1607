//! # Expressions
//!
//! Nonlinear functions of variables and parameters as trees of operator nodes. Each node owns its
//! children exclusively, so a deep copy is a `clone` and dropping a node drops its subtree.
//!
//! Expressions can be evaluated at a point and over a box, and their curvature over a box can be
//! inferred bottom up. The `tree` module wraps a root node together with parameter values and a
//! compiled form for repeated evaluation.
use std::fmt;

use itertools::Itertools;

use crate::data::interval::Interval;
use crate::error::Result;
use crate::expression::curvature::Curvature;
use crate::expression::operator::{Operator, OperatorKind};

pub mod curvature;
pub mod operator;
pub mod polynomial;
pub mod quadratic;
pub mod tree;

#[cfg(test)]
mod test;

/// Maximal degree of an expression that is not a polynomial.
pub const DEGREE_INFINITY: u32 = 65535;

/// Children evaluated without an allocation.
const STACK_CHILDREN: usize = 10;

/// A node with its operator and children.
#[derive(Clone, Debug, PartialEq)]
pub struct Expression {
    operator: Operator,
    children: Vec<Expression>,
}

impl Expression {
    /// Create a node.
    ///
    /// # Errors
    ///
    /// `InvalidOperator` if the number of children does not match the arity of the operator,
    /// `InvalidOperand` if the operator data refers to children that don't exist.
    pub fn new(operator: Operator, children: Vec<Expression>) -> Result<Self> {
        operator.validate(children.len())?;

        Ok(Self { operator, children })
    }

    /// Leaf for the variable with the given index.
    pub fn variable(index: usize) -> Self {
        Self { operator: Operator::Variable(index), children: Vec::new() }
    }

    /// Leaf for a constant.
    pub fn constant(value: f64) -> Self {
        Self { operator: Operator::Constant(value), children: Vec::new() }
    }

    /// Leaf for the parameter with the given index.
    pub fn parameter(index: usize) -> Self {
        Self { operator: Operator::Parameter(index), children: Vec::new() }
    }

    #[allow(missing_docs)]
    pub fn operator(&self) -> &Operator {
        &self.operator
    }

    #[allow(missing_docs)]
    pub fn kind(&self) -> OperatorKind {
        self.operator.kind()
    }

    #[allow(missing_docs)]
    pub fn children(&self) -> &[Expression] {
        &self.children
    }

    /// Value at a point.
    ///
    /// # Arguments
    ///
    /// * `variables`: Value per variable.
    /// * `parameters`: Value per parameter.
    ///
    /// # Return value
    ///
    /// Domain errors (such as the logarithm of a negative value) result in NaN or an infinite
    /// value.
    ///
    /// # Panics
    ///
    /// If a variable or parameter index is out of range for the given slices.
    pub fn evaluate(&self, variables: &[f64], parameters: &[f64]) -> f64 {
        let nr_children = self.children.len();
        if nr_children <= STACK_CHILDREN {
            let mut buffer = [0.0; STACK_CHILDREN];
            for (value, child) in buffer.iter_mut().zip(&self.children) {
                *value = child.evaluate(variables, parameters);
            }
            self.operator.evaluate(&buffer[..nr_children], variables, parameters)
        } else {
            let values = self.children.iter()
                .map(|child| child.evaluate(variables, parameters))
                .collect::<Vec<_>>();
            self.operator.evaluate(&values, variables, parameters)
        }
    }

    /// Range over a box.
    ///
    /// # Arguments
    ///
    /// * `infinity`: Values at or beyond this magnitude are treated as infinite, both in the
    ///   variable bounds and in the result.
    /// * `variables`: Bounds per variable.
    /// * `parameters`: Value per parameter.
    pub fn evaluate_interval(&self, infinity: f64, variables: &[Interval], parameters: &[f64]) -> Interval {
        let variables = to_infinite(infinity, variables);
        self.range(&variables, parameters).to_finite(infinity)
    }

    fn range(&self, variables: &[Interval], parameters: &[f64]) -> Interval {
        let children = self.children.iter()
            .map(|child| child.range(variables, parameters))
            .collect::<Vec<_>>();
        self.operator.evaluate_interval(&children, variables, parameters)
    }

    /// Curvature and range over a box.
    ///
    /// See `evaluate_interval` for the arguments.
    pub fn check_curvature(
        &self,
        infinity: f64,
        variables: &[Interval],
        parameters: &[f64],
    ) -> (Curvature, Interval) {
        let variables = to_infinite(infinity, variables);
        let (curvature, bounds) = self.curvature(&variables, parameters);
        (curvature, bounds.to_finite(infinity))
    }

    fn curvature(&self, variables: &[Interval], parameters: &[f64]) -> (Curvature, Interval) {
        let mut curvatures = Vec::with_capacity(self.children.len());
        let mut bounds = Vec::with_capacity(self.children.len());
        for child in &self.children {
            let (curvature, bound) = child.curvature(variables, parameters);
            // A child with a single value is a constant
            curvatures.push(if bound.is_point() { Curvature::Linear } else { curvature });
            bounds.push(bound);
        }

        let bound = self.operator.evaluate_interval(&bounds, variables, parameters);
        let curvature = self.operator.curvature(&bounds, &curvatures);
        (curvature, bound)
    }

    /// Maximal degree of the expression as a polynomial in the variables.
    ///
    /// # Return value
    ///
    /// `DEGREE_INFINITY` if the expression is not a polynomial.
    pub fn max_degree(&self) -> u32 {
        let degrees = self.children.iter().map(Expression::max_degree).collect::<Vec<_>>();
        let nonconstant = |degree: u32| if degree > 0 { DEGREE_INFINITY } else { 0 };

        match &self.operator {
            Operator::Variable(_) => 1,
            Operator::Constant(_) | Operator::Parameter(_) => 0,
            Operator::Plus | Operator::Minus | Operator::Sum | Operator::Linear(_) => {
                degrees.into_iter().max().unwrap_or(0)
            }
            Operator::Mul | Operator::Product => degrees.into_iter().fold(0, add_degrees),
            Operator::Div => if degrees[1] > 0 { DEGREE_INFINITY } else { degrees[0] },
            Operator::Square => add_degrees(degrees[0], degrees[0]),
            Operator::Sqrt | Operator::SignPower(_) | Operator::Exp | Operator::Log | Operator::Sin
            | Operator::Cos | Operator::Tan | Operator::Abs | Operator::Sign => nonconstant(degrees[0]),
            Operator::RealPower(exponent) => power_degree(degrees[0], *exponent),
            Operator::IntPower(exponent) => power_degree(degrees[0], f64::from(*exponent)),
            Operator::Min | Operator::Max => nonconstant(degrees[0].max(degrees[1])),
            Operator::Quadratic(data) => {
                let linear = degrees.iter().copied().max().unwrap_or(0);
                data.elements().iter()
                    .map(|element| add_degrees(degrees[element.idx1], degrees[element.idx2]))
                    .fold(linear, u32::max)
            }
            Operator::Polynomial(data) => data.max_degree(&degrees, DEGREE_INFINITY),
        }
    }

    /// Replace every variable node by a copy of the expression for that variable.
    ///
    /// The node itself is replaced if it is a variable.
    ///
    /// # Panics
    ///
    /// If a variable index is out of range for `substitutions`.
    pub fn substitute_variables(&mut self, substitutions: &[Expression]) {
        if let Operator::Variable(index) = self.operator {
            *self = substitutions[index].clone();
            return;
        }

        for child in &mut self.children {
            child.substitute_variables(substitutions);
        }
    }

    /// Whether any parameter appears in the expression.
    pub fn has_parameter(&self) -> bool {
        matches!(self.operator, Operator::Parameter(_)) || self.children.iter().any(Expression::has_parameter)
    }

    /// Count the occurrences of each variable.
    ///
    /// # Panics
    ///
    /// If a variable index is out of range for `counts`.
    pub fn variable_usage(&self, counts: &mut [usize]) {
        if let Operator::Variable(index) = self.operator {
            counts[index] += 1;
        }
        for child in &self.children {
            child.variable_usage(counts);
        }
    }

    /// Change variable indices, `map[old] = new`.
    pub fn reindex_variables(&mut self, map: &[usize]) {
        if let Operator::Variable(index) = &mut self.operator {
            *index = map[*index];
        }
        for child in &mut self.children {
            child.reindex_variables(map);
        }
    }

    /// Change parameter indices, `map[old] = new`.
    pub fn reindex_parameters(&mut self, map: &[usize]) {
        if let Operator::Parameter(index) = &mut self.operator {
            *index = map[*index];
        }
        for child in &mut self.children {
            child.reindex_parameters(map);
        }
    }

    /// Largest variable index used.
    pub(crate) fn max_variable(&self) -> Option<usize> {
        let own = match self.operator {
            Operator::Variable(index) => Some(index),
            _ => None,
        };
        self.children.iter().filter_map(Expression::max_variable).chain(own).max()
    }

    /// Largest parameter index used.
    pub(crate) fn max_parameter(&self) -> Option<usize> {
        let own = match self.operator {
            Operator::Parameter(index) => Some(index),
            _ => None,
        };
        self.children.iter().filter_map(Expression::max_parameter).chain(own).max()
    }

    /// Append the nodes in postfix order, children before their parent.
    pub(crate) fn postfix<'a>(&'a self, nodes: &mut Vec<&'a Expression>) {
        for child in &self.children {
            child.postfix(nodes);
        }
        nodes.push(self);
    }
}

fn to_infinite(infinity: f64, bounds: &[Interval]) -> Vec<Interval> {
    bounds.iter().map(|bound| Interval::from_bounds(bound.inf, bound.sup, infinity)).collect()
}

fn add_degrees(left: u32, right: u32) -> u32 {
    left.saturating_add(right).min(DEGREE_INFINITY)
}

fn power_degree(degree: u32, exponent: f64) -> u32 {
    if degree == 0 || exponent == 0.0 {
        0
    } else if degree >= DEGREE_INFINITY {
        DEGREE_INFINITY
    } else if exponent > 0.0 && exponent.fract() == 0.0 && exponent < f64::from(DEGREE_INFINITY) {
        // Integral and in range
        (degree.saturating_mul(exponent as u32)).min(DEGREE_INFINITY)
    } else {
        DEGREE_INFINITY
    }
}


impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let children = &self.children;

        match &self.operator {
            Operator::Variable(index) => write!(f, "x{index}"),
            Operator::Constant(value) => write!(f, "{value}"),
            Operator::Parameter(index) => write!(f, "p{index}"),
            Operator::Plus => write!(f, "({} + {})", children[0], children[1]),
            Operator::Minus => write!(f, "({} - {})", children[0], children[1]),
            Operator::Mul => write!(f, "({} * {})", children[0], children[1]),
            Operator::Div => write!(f, "({} / {})", children[0], children[1]),
            Operator::Square => write!(f, "({})^2", children[0]),
            Operator::RealPower(exponent) => write!(f, "({})^{exponent}", children[0]),
            Operator::IntPower(exponent) => write!(f, "({})^{exponent}", children[0]),
            Operator::SignPower(exponent) => write!(f, "signpower({}, {exponent})", children[0]),
            Operator::Sum | Operator::Product if children.is_empty() => {
                f.write_str(if self.operator == Operator::Sum { "0" } else { "1" })
            }
            Operator::Sum => write!(f, "({})", children.iter().format(" + ")),
            Operator::Product => write!(f, "({})", children.iter().format(" * ")),
            Operator::Linear(data) => {
                write!(f, "({}", data.constant())?;
                for (coefficient, child) in data.coefficients().iter().zip(children) {
                    write!(f, " + {coefficient} * {child}")?;
                }
                f.write_str(")")
            }
            Operator::Quadratic(data) => {
                write!(f, "({}", data.constant())?;
                if let Some(coefficients) = data.linear_coefficients() {
                    for (coefficient, child) in coefficients.iter().zip(children) {
                        write!(f, " + {coefficient} * {child}")?;
                    }
                }
                for element in data.elements() {
                    write!(f, " + {} * {} * {}", element.coefficient, children[element.idx1], children[element.idx2])?;
                }
                f.write_str(")")
            }
            Operator::Polynomial(data) => {
                write!(f, "({}", data.constant())?;
                for monomial in data.monomials() {
                    write!(f, " + {}", monomial.coefficient())?;
                    for factor in monomial.factors() {
                        write!(f, " * ({})^{}", children[factor.child], factor.exponent)?;
                    }
                }
                f.write_str(")")
            }
            operator => write!(f, "{}({})", operator.kind(), children.iter().format(", ")),
        }
    }
}
