use approx::assert_abs_diff_eq;

use mipcore::data::interval::Interval;
use mipcore::error::Error;
use mipcore::expression::Expression;
use mipcore::expression::operator::{Operator, Payload};
use mipcore::expression::tree::ExpressionTree;

const INFINITY: f64 = 1e20;

/// `x0^2 + 3`, built from operator codes.
fn power_plus_three() -> Expression {
    let power = Operator::from_code(14, Payload::Real(2.0)).unwrap();
    let square = Expression::new(power, vec![Expression::variable(0)]).unwrap();
    Expression::new(Operator::Plus, vec![square, Expression::constant(3.0)]).unwrap()
}

#[test]
fn power_plus_constant() {
    let mut tree = ExpressionTree::new(Some(power_plus_three()), 1, 0, None).unwrap();

    assert_eq!(tree.evaluate(&[4.0]).unwrap(), 19.0);
    assert_eq!(tree.evaluate_compiled(&[4.0]).unwrap(), 19.0);
    assert!(tree.has_interpreter_data());

    let range = tree.evaluate_interval(INFINITY, &[Interval::new(-2.0, 3.0)]).unwrap();
    assert_eq!(range, Interval::new(3.0, 12.0));

    let (curvature, _) = tree.check_curvature(INFINITY, &[Interval::new(-2.0, 3.0)]).unwrap();
    assert!(curvature.is_convex());
    assert_eq!(tree.max_degree().unwrap(), 2);
}

#[test]
fn parameters() {
    let product = Expression::new(
        Operator::Mul,
        vec![Expression::variable(0), Expression::parameter(0)],
    ).unwrap();
    let mut tree = ExpressionTree::new(Some(product), 1, 1, Some(vec![2.0])).unwrap();
    assert!(tree.has_parameter());
    assert_eq!(tree.evaluate(&[3.0]).unwrap(), 6.0);

    tree.set_parameter(0, -1.0).unwrap();
    assert_eq!(tree.evaluate_compiled(&[3.0]).unwrap(), -3.0);
    assert!(tree.set_parameter(1, 0.0).is_err());
}

#[test]
fn substitution_and_copies() {
    let mut tree = ExpressionTree::new(Some(power_plus_three()), 2, 0, None).unwrap();
    let copy = tree.clone();

    // x0 := x0 + x1, x1 stays
    let sum = Expression::new(Operator::Plus, vec![Expression::variable(0), Expression::variable(1)]).unwrap();
    tree.substitute_variables(&[sum, Expression::variable(1)], 2).unwrap();
    assert_abs_diff_eq!(tree.evaluate(&[1.0, 2.0]).unwrap(), 12.0);
    assert_abs_diff_eq!(copy.evaluate(&[1.0, 2.0]).unwrap(), 4.0);
    assert_eq!(tree.variable_usage(), vec![1, 1]);
}

#[test]
fn malformed_expressions_are_rejected() {
    assert!(matches!(Operator::from_code(200, Payload::None), Err(Error::InvalidOperator(_))));
    assert!(matches!(Operator::from_code(14, Payload::None), Err(Error::InvalidOperand(_))));
    assert!(Expression::new(Operator::Plus, vec![Expression::variable(0)]).is_err());
    assert!(ExpressionTree::new(Some(Expression::variable(3)), 2, 0, None).is_err());
}
