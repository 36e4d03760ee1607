use approx::assert_relative_eq;

use crate::data::interval::Interval;
use crate::expression::{DEGREE_INFINITY, Expression};
use crate::expression::curvature::Curvature;
use crate::expression::operator::{LinearData, Operator};
use crate::expression::polynomial::{Factor, Monomial, PolynomialData};
use crate::expression::quadratic::{QuadElement, QuadraticData};
use crate::expression::tree::ExpressionTree;

const INFINITY: f64 = 1e20;

fn unary(operator: Operator, child: Expression) -> Expression {
    Expression::new(operator, vec![child]).unwrap()
}

fn binary(operator: Operator, left: Expression, right: Expression) -> Expression {
    Expression::new(operator, vec![left, right]).unwrap()
}

/// `x^2 + 3`
fn square_plus_three() -> Expression {
    binary(Operator::Plus, unary(Operator::Square, Expression::variable(0)), Expression::constant(3.0))
}

#[test]
fn square_plus_constant() {
    let expression = square_plus_three();
    assert_eq!(expression.evaluate(&[2.0], &[]), 7.0);

    let range = expression.evaluate_interval(INFINITY, &[Interval::new(-1.0, 2.0)], &[]);
    assert_eq!(range, Interval::new(3.0, 7.0));

    let (curvature, range) = expression.check_curvature(INFINITY, &[Interval::new(-1.0, 2.0)], &[]);
    assert_eq!(curvature, Curvature::Convex);
    assert_eq!(range, Interval::new(3.0, 7.0));

    assert_eq!(expression.max_degree(), 2);
    assert_eq!(expression.to_string(), "((x0)^2 + 3)");
}

#[test]
fn infinite_bounds() {
    let expression = square_plus_three();
    let range = expression.evaluate_interval(INFINITY, &[Interval::new(-INFINITY, 0.0)], &[]);
    assert_eq!(range, Interval::new(3.0, INFINITY));

    let exponential = unary(Operator::Exp, Expression::variable(0));
    let range = exponential.evaluate_interval(INFINITY, &[Interval::new(-INFINITY, 1.0)], &[]);
    assert_eq!(range.inf, 0.0);
    assert_relative_eq!(range.sup, std::f64::consts::E);
}

#[test]
fn arity_is_checked() {
    assert!(Expression::new(Operator::Plus, vec![Expression::variable(0)]).is_err());
    assert!(Expression::new(Operator::Exp, vec![]).is_err());
    assert!(Expression::new(Operator::Sum, vec![]).is_ok());

    let polynomial = PolynomialData::new(0.0, vec![Monomial::new(1.0, vec![Factor::new(2, 1.0)])]);
    assert!(Expression::new(Operator::Polynomial(polynomial), vec![Expression::variable(0)]).is_err());
}

/// A composite expression over three variables using most operators.
fn composite() -> Expression {
    let (x, y, z) = (Expression::variable(0), Expression::variable(1), Expression::variable(2));
    let quadratic = QuadraticData::new(
        1.0,
        Some(vec![2.0, -1.0]),
        vec![QuadElement::new(0, 1, 0.5), QuadElement::new(0, 0, 1.0)],
    );
    let polynomial = PolynomialData::new(-1.0, vec![
        Monomial::new(2.0, vec![Factor::new(0, 2.0), Factor::new(1, -1.0)]),
        Monomial::new(1.0, vec![Factor::new(1, 0.5)]),
    ]);

    let terms = vec![
        Expression::new(Operator::Quadratic(quadratic), vec![x.clone(), y.clone()]).unwrap(),
        Expression::new(Operator::Polynomial(polynomial), vec![x.clone(), z.clone()]).unwrap(),
        unary(Operator::Log, binary(Operator::Plus, z.clone(), Expression::parameter(0))),
        binary(Operator::Max, unary(Operator::Abs, y.clone()), unary(Operator::SignPower(1.5), x.clone())),
        unary(Operator::IntPower(-2), z.clone()),
        Expression::new(Operator::Linear(LinearData::new(vec![1.0, -3.0], 0.5)), vec![x, y]).unwrap(),
        Expression::new(Operator::Product, vec![z, Expression::constant(2.0), Expression::parameter(0)]).unwrap(),
    ];
    Expression::new(Operator::Sum, terms).unwrap()
}

#[test]
fn deep_copy_evaluates_equally() {
    let expression = composite();
    let copy = expression.clone();
    assert_eq!(copy, expression);

    for point in [[1.0, 2.0, 3.0], [-0.5, 0.25, 1.5], [2.0, -1.0, 0.5]] {
        let value = expression.evaluate(&point, &[0.5]);
        let copied = copy.evaluate(&point, &[0.5]);
        assert_eq!(value.to_bits(), copied.to_bits());
    }

    let tree = ExpressionTree::new(Some(expression), 3, 1, Some(vec![0.5])).unwrap();
    let mut copy = tree.clone();
    assert_eq!(copy.evaluate(&[1.0, 2.0, 3.0]).unwrap(), tree.evaluate(&[1.0, 2.0, 3.0]).unwrap());
    assert_eq!(copy.evaluate_compiled(&[1.0, 2.0, 3.0]).unwrap(), tree.evaluate(&[1.0, 2.0, 3.0]).unwrap());
}

#[test]
fn ranges_contain_values() {
    let expression = composite();
    let bounds = [Interval::new(0.5, 2.0), Interval::new(0.25, 3.0), Interval::new(1.0, 4.0)];
    let range = expression.evaluate_interval(INFINITY, &bounds, &[0.5]);

    let steps = 6;
    for i in 0..=steps {
        for j in 0..=steps {
            for k in 0..=steps {
                let at = |bound: Interval, step: usize| bound.inf + (bound.sup - bound.inf) * step as f64 / steps as f64;
                let point = [at(bounds[0], i), at(bounds[1], j), at(bounds[2], k)];
                let value = expression.evaluate(&point, &[0.5]);
                assert!(range.inf - 1e-9 <= value && value <= range.sup + 1e-9, "{value} outside {range}");
            }
        }
    }
}

/// Classification on a box remains valid on every box inside it.
#[test]
fn curvature_sound_under_shrinking() {
    let x = || Expression::variable(0);
    let expressions = vec![
        square_plus_three(),
        unary(Operator::Exp, unary(Operator::Square, x())),
        unary(Operator::Log, unary(Operator::Sqrt, x())),
        unary(Operator::RealPower(1.5), x()),
        unary(Operator::IntPower(3), x()),
        unary(Operator::IntPower(-1), x()),
        unary(Operator::SignPower(3.0), x()),
        unary(Operator::Abs, x()),
        binary(Operator::Div, Expression::constant(2.0), unary(Operator::Sqrt, x())),
        binary(Operator::Min, x(), unary(Operator::Log, x())),
        binary(Operator::Max, x(), unary(Operator::Square, x())),
    ];
    let boxes = [
        (Interval::new(-4.0, 4.0), vec![Interval::new(-1.0, 1.0), Interval::new(0.5, 3.0), Interval::new(-3.0, -2.0)]),
        (Interval::new(0.0, 10.0), vec![Interval::new(1.0, 2.0), Interval::new(0.0, 0.5), Interval::new(9.0, 10.0)]),
        (Interval::new(-10.0, -0.5), vec![Interval::new(-3.0, -1.0)]),
    ];

    for expression in &expressions {
        for (outer, inners) in &boxes {
            let (wide, _) = expression.check_curvature(INFINITY, &[*outer], &[]);
            for inner in inners {
                let (narrow, _) = expression.check_curvature(INFINITY, &[*inner], &[]);
                assert_eq!(wide & narrow, wide, "{expression} on {outer} and {inner}");
            }
        }
    }
}

/// Second order finite differences of a monomial agree with its classification.
#[test]
fn monomial_curvature_matches_hessian() {
    let cases = [
        vec![Factor::new(0, -1.0), Factor::new(1, -1.0)],
        vec![Factor::new(0, 2.0), Factor::new(1, -1.0)],
        vec![Factor::new(0, 0.3), Factor::new(1, 0.6)],
        vec![Factor::new(0, 1.5), Factor::new(1, -0.5)],
        vec![Factor::new(0, 3.0), Factor::new(1, -2.0)],
    ];
    let bounds = [Interval::new(0.5, 2.0), Interval::new(1.0, 3.0)];

    for factors in cases {
        for coefficient in [1.0, -2.0] {
            let data = PolynomialData::new(0.0, vec![Monomial::new(coefficient, factors.clone())]);
            let expression = Expression::new(
                Operator::Polynomial(data),
                vec![Expression::variable(0), Expression::variable(1)],
            ).unwrap();
            let (curvature, _) = expression.check_curvature(INFINITY, &bounds, &[]);
            assert_ne!(curvature, Curvature::Unknown);

            let h = 1e-4;
            let f = |x: f64, y: f64| expression.evaluate(&[x, y], &[]);
            for x in [0.6, 1.0, 1.9] {
                for y in [1.1, 2.0, 2.9] {
                    let fxx = (f(x + h, y) - 2.0 * f(x, y) + f(x - h, y)) / (h * h);
                    let fyy = (f(x, y + h) - 2.0 * f(x, y) + f(x, y - h)) / (h * h);
                    let fxy = (f(x + h, y + h) - f(x + h, y - h) - f(x - h, y + h) + f(x - h, y - h)) / (4.0 * h * h);
                    let determinant = fxx * fyy - fxy * fxy;
                    let tolerance = 1e-3 * (1.0 + fxx.abs() + fyy.abs()).powi(2);

                    assert!(determinant >= -tolerance, "{expression} at ({x}, {y})");
                    if curvature.is_convex() {
                        assert!(fxx >= -1e-3 && fyy >= -1e-3, "{expression} at ({x}, {y})");
                    } else {
                        assert!(fxx <= 1e-3 && fyy <= 1e-3, "{expression} at ({x}, {y})");
                    }
                }
            }
        }
    }
}

#[test]
fn fixed_children_are_linear() {
    // x * y is unknown in general, but linear in x once y is fixed
    let product = binary(Operator::Mul, Expression::variable(0), Expression::variable(1));
    let fixed = [Interval::new(0.0, 1.0), Interval::point(-2.0)];
    assert_eq!(product.check_curvature(INFINITY, &fixed, &[]).0, Curvature::Linear);
    let free = [Interval::new(0.0, 1.0), Interval::new(0.0, 1.0)];
    assert_eq!(product.check_curvature(INFINITY, &free, &[]).0, Curvature::Unknown);

    // -2 exp(x) through a fixed factor
    let scaled = binary(Operator::Mul, Expression::variable(1), unary(Operator::Exp, Expression::variable(0)));
    assert_eq!(scaled.check_curvature(INFINITY, &fixed, &[]).0, Curvature::Concave);
}

#[test]
fn degrees() {
    let (x, y) = (Expression::variable(0), Expression::variable(1));

    let cubic = unary(Operator::IntPower(3), binary(Operator::Mul, x.clone(), y.clone()));
    assert_eq!(cubic.max_degree(), 6);
    assert_eq!(unary(Operator::RealPower(2.5), x.clone()).max_degree(), DEGREE_INFINITY);
    assert_eq!(unary(Operator::RealPower(-1.0), x.clone()).max_degree(), DEGREE_INFINITY);
    assert_eq!(unary(Operator::RealPower(2.5), Expression::constant(2.0)).max_degree(), 0);
    assert_eq!(unary(Operator::Exp, Expression::parameter(0)).max_degree(), 0);
    assert_eq!(binary(Operator::Div, x.clone(), y.clone()).max_degree(), DEGREE_INFINITY);
    assert_eq!(binary(Operator::Div, x.clone(), Expression::constant(2.0)).max_degree(), 1);
    assert_eq!(binary(Operator::Min, x.clone(), Expression::constant(2.0)).max_degree(), DEGREE_INFINITY);
    assert_eq!(unary(Operator::Sin, unary(Operator::Exp, x.clone())).max_degree(), DEGREE_INFINITY);

    let quadratic = QuadraticData::new(0.0, None, vec![QuadElement::new(0, 1, 1.0), QuadElement::new(1, 1, 1.0)]);
    let nested = Expression::new(Operator::Quadratic(quadratic), vec![x.clone(), cubic.clone()]).unwrap();
    assert_eq!(nested.max_degree(), 12);

    let polynomial = PolynomialData::new(1.0, vec![
        Monomial::new(1.0, vec![Factor::new(0, 2.0), Factor::new(1, 1.0)]),
        Monomial::new(1.0, vec![Factor::new(2, -0.5)]),
    ]);
    let children = vec![x.clone(), y.clone(), Expression::constant(4.0)];
    let expression = Expression::new(Operator::Polynomial(polynomial.clone()), children).unwrap();
    assert_eq!(expression.max_degree(), 3);
    let children = vec![x, y.clone(), y];
    let expression = Expression::new(Operator::Polynomial(polynomial), children).unwrap();
    assert_eq!(expression.max_degree(), DEGREE_INFINITY);

    let huge = unary(Operator::IntPower(40000), unary(Operator::IntPower(40000), Expression::variable(0)));
    assert_eq!(huge.max_degree(), DEGREE_INFINITY);
}

#[test]
fn substitution() {
    let mut expression = square_plus_three();
    let replacement = binary(Operator::Minus, Expression::variable(0), Expression::constant(1.0));
    expression.substitute_variables(&[replacement.clone()]);
    assert_eq!(expression.evaluate(&[3.0], &[]), 7.0);

    let mut root = Expression::variable(0);
    root.substitute_variables(&[replacement.clone()]);
    assert_eq!(root, replacement);
}
