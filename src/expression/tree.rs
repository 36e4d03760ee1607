//! # Expression trees
//!
//! A root expression together with the number of variables it is defined over and the values of
//! its parameters. Repeated evaluation goes through a compiled postfix program, which is built on
//! first use and dropped whenever the tree structure changes.
use log::trace;

use crate::data::interval::Interval;
use crate::error::{Error, Result};
use crate::expression::{DEGREE_INFINITY, Expression};
use crate::expression::curvature::Curvature;
use crate::expression::operator::Operator;

/// Postfix form of an expression.
///
/// Each instruction applies an operator to the values of the last instructions that produced its
/// children. Parameters are read at evaluation time, so changing their values doesn't invalidate
/// a program.
#[derive(Debug, PartialEq)]
pub struct Program {
    instructions: Vec<(Operator, usize)>,
    max_stack: usize,
}

impl Program {
    fn compile(root: &Expression) -> Self {
        let mut nodes = Vec::new();
        root.postfix(&mut nodes);

        let mut depth = 0_usize;
        let mut max_stack = 0;
        let instructions = nodes.into_iter()
            .map(|node| {
                let nr_children = node.children().len();
                depth = depth + 1 - nr_children;
                max_stack = max_stack.max(depth);
                (node.operator().clone(), nr_children)
            })
            .collect::<Vec<_>>();
        debug_assert_eq!(depth, 1);

        trace!("Compiled an expression into {} instructions", instructions.len());
        Self { instructions, max_stack }
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    #[allow(missing_docs)]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Value at a point, equal to the value of the compiled expression.
    pub fn evaluate(&self, variables: &[f64], parameters: &[f64]) -> f64 {
        let mut stack = Vec::with_capacity(self.max_stack);
        for (operator, nr_children) in &self.instructions {
            let start = stack.len() - nr_children;
            let value = operator.evaluate(&stack[start..], variables, parameters);
            stack.truncate(start);
            stack.push(value);
        }

        debug_assert_eq!(stack.len(), 1);
        stack.pop().unwrap_or(f64::NAN)
    }
}

/// An expression over a fixed number of variables with parameter values.
#[derive(Debug)]
pub struct ExpressionTree {
    root: Option<Expression>,
    nr_variables: usize,
    parameters: Vec<f64>,
    program: Option<Program>,
}

impl ExpressionTree {
    /// Create a tree.
    ///
    /// # Arguments
    ///
    /// * `root`: Expression, if already known.
    /// * `nr_variables`: Number of variables, all variable indices must be below it.
    /// * `nr_parameters`: Number of parameters, all parameter indices must be below it.
    /// * `parameters`: Initial parameter values, zero if `None`.
    ///
    /// # Errors
    ///
    /// `InvalidOperand` if the root refers to variables or parameters that don't exist,
    /// `InvalidData` if the number of parameter values doesn't match.
    pub fn new(
        root: Option<Expression>,
        nr_variables: usize,
        nr_parameters: usize,
        parameters: Option<Vec<f64>>,
    ) -> Result<Self> {
        let parameters = match parameters {
            Some(values) if values.len() != nr_parameters => return Err(Error::InvalidData(format!(
                "{} parameter values for {} parameters", values.len(), nr_parameters,
            ))),
            Some(values) => values,
            None => vec![0.0; nr_parameters],
        };
        if let Some(root) = &root {
            Self::check_indices(root, nr_variables, nr_parameters)?;
        }

        Ok(Self { root, nr_variables, parameters, program: None })
    }

    fn check_indices(expression: &Expression, nr_variables: usize, nr_parameters: usize) -> Result<()> {
        if let Some(index) = expression.max_variable().filter(|&index| index >= nr_variables) {
            return Err(Error::InvalidOperand(format!("variable {index} of {nr_variables} variables")));
        }
        if let Some(index) = expression.max_parameter().filter(|&index| index >= nr_parameters) {
            return Err(Error::InvalidOperand(format!("parameter {index} of {nr_parameters} parameters")));
        }

        Ok(())
    }

    #[allow(missing_docs)]
    pub fn root(&self) -> Option<&Expression> {
        self.root.as_ref()
    }

    /// Replace the root expression.
    ///
    /// # Errors
    ///
    /// `InvalidOperand` if the root refers to variables or parameters that don't exist.
    pub fn set_root(&mut self, root: Expression) -> Result<()> {
        Self::check_indices(&root, self.nr_variables, self.parameters.len())?;
        self.root = Some(root);
        self.program = None;

        Ok(())
    }

    fn expression(&self) -> Result<&Expression> {
        self.root.as_ref().ok_or_else(|| Error::InvalidOperation("expression tree has no root".to_string()))
    }

    #[allow(missing_docs)]
    pub fn nr_variables(&self) -> usize {
        self.nr_variables
    }

    #[allow(missing_docs)]
    pub fn nr_parameters(&self) -> usize {
        self.parameters.len()
    }

    #[allow(missing_docs)]
    pub fn parameters(&self) -> &[f64] {
        &self.parameters
    }

    #[allow(missing_docs)]
    pub fn parameter(&self, index: usize) -> Option<f64> {
        self.parameters.get(index).copied()
    }

    /// Change the value of a parameter.
    ///
    /// # Errors
    ///
    /// `InvalidData` if there is no parameter with this index.
    pub fn set_parameter(&mut self, index: usize, value: f64) -> Result<()> {
        let nr_parameters = self.parameters.len();
        let parameter = self.parameters.get_mut(index)
            .ok_or_else(|| Error::InvalidData(format!("parameter {index} of {nr_parameters} parameters")))?;
        *parameter = value;

        Ok(())
    }

    /// Replace all parameter values.
    ///
    /// # Errors
    ///
    /// `InvalidData` if the number of values doesn't match.
    pub fn set_parameters(&mut self, values: &[f64]) -> Result<()> {
        if values.len() != self.parameters.len() {
            return Err(Error::InvalidData(format!(
                "{} parameter values for {} parameters", values.len(), self.parameters.len(),
            )));
        }
        self.parameters.copy_from_slice(values);

        Ok(())
    }

    fn check_variables(&self, nr_values: usize) -> Result<()> {
        if nr_values < self.nr_variables {
            Err(Error::InvalidData(format!("{nr_values} values for {} variables", self.nr_variables)))
        } else {
            Ok(())
        }
    }

    /// Value at a point.
    ///
    /// # Errors
    ///
    /// `InvalidOperation` without a root, `InvalidData` if fewer values than variables are given.
    pub fn evaluate(&self, variables: &[f64]) -> Result<f64> {
        self.check_variables(variables.len())?;
        Ok(self.expression()?.evaluate(variables, &self.parameters))
    }

    /// Value at a point through the compiled program.
    ///
    /// See `evaluate` for the errors.
    pub fn evaluate_compiled(&mut self, variables: &[f64]) -> Result<f64> {
        self.check_variables(variables.len())?;
        self.compiled()?;
        let program = self.program.as_ref().ok_or_else(|| Error::InvalidOperation("no program".to_string()))?;
        let value = program.evaluate(variables, &self.parameters);

        Ok(value)
    }

    /// Range over a box, see `Expression::evaluate_interval`.
    ///
    /// See `evaluate` for the errors.
    pub fn evaluate_interval(&self, infinity: f64, variables: &[Interval]) -> Result<Interval> {
        self.check_variables(variables.len())?;
        Ok(self.expression()?.evaluate_interval(infinity, variables, &self.parameters))
    }

    /// Curvature and range over a box, see `Expression::check_curvature`.
    ///
    /// See `evaluate` for the errors.
    pub fn check_curvature(&self, infinity: f64, variables: &[Interval]) -> Result<(Curvature, Interval)> {
        self.check_variables(variables.len())?;
        Ok(self.expression()?.check_curvature(infinity, variables, &self.parameters))
    }

    /// Maximal polynomial degree, `DEGREE_INFINITY` if not a polynomial.
    ///
    /// # Errors
    ///
    /// `InvalidOperation` without a root.
    pub fn max_degree(&self) -> Result<u32> {
        let degree = self.expression()?.max_degree();
        debug_assert!(degree <= DEGREE_INFINITY);
        Ok(degree)
    }

    #[allow(missing_docs)]
    pub fn has_parameter(&self) -> bool {
        self.root.as_ref().is_some_and(Expression::has_parameter)
    }

    /// Number of occurrences per variable.
    pub fn variable_usage(&self) -> Vec<usize> {
        let mut counts = vec![0; self.nr_variables];
        if let Some(root) = &self.root {
            root.variable_usage(&mut counts);
        }
        counts
    }

    /// Replace each variable by an expression.
    ///
    /// # Arguments
    ///
    /// * `substitutions`: Expression per current variable, in terms of the new variables.
    /// * `nr_variables`: Number of variables after the substitution.
    ///
    /// # Errors
    ///
    /// `InvalidData` if there are fewer substitutions than variables, `InvalidOperand` if a
    /// substitution refers to variables or parameters that don't exist.
    pub fn substitute_variables(&mut self, substitutions: &[Expression], nr_variables: usize) -> Result<()> {
        if substitutions.len() < self.nr_variables {
            return Err(Error::InvalidData(format!(
                "{} substitutions for {} variables", substitutions.len(), self.nr_variables,
            )));
        }
        for substitution in substitutions {
            Self::check_indices(substitution, nr_variables, self.parameters.len())?;
        }

        if let Some(root) = &mut self.root {
            root.substitute_variables(substitutions);
        }
        self.nr_variables = nr_variables;
        self.program = None;

        Ok(())
    }

    /// Renumber the variables, `map[old] = new`.
    ///
    /// # Errors
    ///
    /// `InvalidData` if the map doesn't cover all variables or maps outside `nr_variables`.
    pub fn reindex_variables(&mut self, map: &[usize], nr_variables: usize) -> Result<()> {
        if map.len() < self.nr_variables || map[..self.nr_variables].iter().any(|&new| new >= nr_variables) {
            return Err(Error::InvalidData(format!("invalid map for {} variables", self.nr_variables)));
        }

        if let Some(root) = &mut self.root {
            root.reindex_variables(map);
        }
        self.nr_variables = nr_variables;
        self.program = None;

        Ok(())
    }

    /// Renumber the parameters, `map[old] = new`, and set the new parameter values.
    ///
    /// # Errors
    ///
    /// `InvalidData` if the map doesn't cover all parameters or maps outside `parameters`.
    pub fn reindex_parameters(&mut self, map: &[usize], parameters: Vec<f64>) -> Result<()> {
        let nr_parameters = self.parameters.len();
        if map.len() < nr_parameters || map[..nr_parameters].iter().any(|&new| new >= parameters.len()) {
            return Err(Error::InvalidData(format!("invalid map for {nr_parameters} parameters")));
        }

        if let Some(root) = &mut self.root {
            root.reindex_parameters(map);
        }
        self.parameters = parameters;
        self.program = None;

        Ok(())
    }

    /// The compiled program, built if not yet available.
    ///
    /// # Errors
    ///
    /// `InvalidOperation` without a root.
    pub fn compiled(&mut self) -> Result<&Program> {
        if self.program.is_none() {
            let program = Program::compile(self.expression()?);
            self.program = Some(program);
        }

        self.program.as_ref().ok_or_else(|| Error::InvalidOperation("no program".to_string()))
    }

    /// Whether a compiled program is cached.
    pub fn has_interpreter_data(&self) -> bool {
        self.program.is_some()
    }

    /// Drop the compiled program.
    pub fn free_interpreter_data(&mut self) {
        self.program = None;
    }
}

/// Deep copy, without the compiled program.
impl Clone for ExpressionTree {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            nr_variables: self.nr_variables,
            parameters: self.parameters.clone(),
            program: None,
        }
    }
}

#[cfg(test)]
mod test {
    use crate::error::Error;
    use crate::expression::Expression;
    use crate::expression::operator::Operator;
    use crate::expression::tree::ExpressionTree;

    /// `p0 * x0 + exp(x1)`
    fn tree() -> ExpressionTree {
        let product = Expression::new(Operator::Mul, vec![Expression::parameter(0), Expression::variable(0)]).unwrap();
        let exponential = Expression::new(Operator::Exp, vec![Expression::variable(1)]).unwrap();
        let root = Expression::new(Operator::Plus, vec![product, exponential]).unwrap();
        ExpressionTree::new(Some(root), 2, 1, Some(vec![2.0])).unwrap()
    }

    #[test]
    fn compiled_matches_recursive() {
        let mut tree = tree();
        let point = [3.0, 0.0];
        let value = tree.evaluate(&point).unwrap();
        assert_eq!(value, 7.0);
        assert!(!tree.has_interpreter_data());
        assert_eq!(tree.evaluate_compiled(&point).unwrap(), value);
        assert_eq!(tree.compiled().unwrap().len(), 6);

        tree.set_parameter(0, -1.0).unwrap();
        assert!(tree.has_interpreter_data());
        assert_eq!(tree.evaluate_compiled(&point).unwrap(), -2.0);

        let copy = tree.clone();
        assert!(!copy.has_interpreter_data());
        assert_eq!(copy.evaluate(&point).unwrap(), -2.0);
    }

    #[test]
    fn invalid_indices() {
        let root = Expression::variable(3);
        assert!(matches!(ExpressionTree::new(Some(root), 2, 0, None), Err(Error::InvalidOperand(_))));
        assert!(matches!(ExpressionTree::new(None, 2, 1, Some(vec![])), Err(Error::InvalidData(_))));

        let tree = ExpressionTree::new(None, 1, 0, None).unwrap();
        assert!(matches!(tree.evaluate(&[0.0]), Err(Error::InvalidOperation(_))));
        assert!(matches!(self::tree().evaluate(&[0.0]), Err(Error::InvalidData(_))));
    }

    #[test]
    fn substitution_clears_program() {
        let mut tree = tree();
        tree.compiled().unwrap();

        // x0 := x0 + x1, x1 := 0
        let sum = Expression::new(Operator::Plus, vec![Expression::variable(0), Expression::variable(1)]).unwrap();
        tree.substitute_variables(&[sum, Expression::constant(0.0)], 2).unwrap();
        assert!(!tree.has_interpreter_data());
        assert_eq!(tree.evaluate(&[1.0, 2.0]).unwrap(), 2.0 * 3.0 + 1.0);
        assert_eq!(tree.evaluate_compiled(&[1.0, 2.0]).unwrap(), 7.0);
        assert_eq!(tree.variable_usage(), vec![1, 1]);
    }

    #[test]
    fn reindex() {
        let mut tree = tree();
        tree.reindex_variables(&[1, 0], 2).unwrap();
        assert_eq!(tree.evaluate(&[0.0, 3.0]).unwrap(), 7.0);
        assert!(tree.reindex_variables(&[2, 0], 2).is_err());

        tree.reindex_parameters(&[1], vec![0.0, 5.0]).unwrap();
        assert_eq!(tree.evaluate(&[0.0, 3.0]).unwrap(), 16.0);
        assert!(tree.has_parameter());
    }
}
