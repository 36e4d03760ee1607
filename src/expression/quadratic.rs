//! # Quadratic functions
//!
//! Payload of the quadratic operator: `c + sum_i b_i x_i + sum_k a_k x_{i_k} x_{j_k}` over the
//! values `x` of the children of the node.
use crate::data::interval::Interval;
use crate::expression::curvature::Curvature;

/// A single quadratic term `coefficient * x_idx1 * x_idx2` with `idx1 <= idx2`.
#[allow(missing_docs)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct QuadElement {
    pub idx1: usize,
    pub idx2: usize,
    pub coefficient: f64,
}

impl QuadElement {
    /// Create a term, ordering the child indices.
    pub fn new(idx1: usize, idx2: usize, coefficient: f64) -> Self {
        let (idx1, idx2) = if idx1 <= idx2 { (idx1, idx2) } else { (idx2, idx1) };
        Self { idx1, idx2, coefficient }
    }

    fn key(&self) -> (usize, usize) {
        (self.idx1, self.idx2)
    }
}

/// Constant, linear and quadratic coefficients.
#[derive(Clone, Debug, PartialEq)]
pub struct QuadraticData {
    constant: f64,
    /// One coefficient per child, `None` if all are zero.
    linear: Option<Vec<f64>>,
    elements: Vec<QuadElement>,
    sorted: bool,
}

impl QuadraticData {
    /// Create quadratic data, sorting the elements.
    pub fn new(constant: f64, linear: Option<Vec<f64>>, elements: Vec<QuadElement>) -> Self {
        let mut data = Self { constant, linear, elements, sorted: false };
        data.sort_elements();
        data
    }

    #[allow(missing_docs)]
    pub fn constant(&self) -> f64 {
        self.constant
    }

    #[allow(missing_docs)]
    pub fn linear_coefficients(&self) -> Option<&[f64]> {
        self.linear.as_deref()
    }

    #[allow(missing_docs)]
    pub fn elements(&self) -> &[QuadElement] {
        &self.elements
    }

    /// Append quadratic terms, the elements are no longer sorted afterwards.
    pub fn add_elements(&mut self, elements: impl IntoIterator<Item = QuadElement>) {
        let before = self.elements.len();
        self.elements.extend(elements);
        if self.elements.len() > before {
            self.sorted = false;
        }
    }

    /// Sort the elements by their first and then second child index. Idempotent.
    pub fn sort_elements(&mut self) {
        if !self.sorted {
            self.elements.sort_by(|left, right| left.key().cmp(&right.key()));
            self.sorted = true;
        }
    }

    /// Position of the term for a pair of children, if present.
    pub fn find_element(&mut self, idx1: usize, idx2: usize) -> Option<usize> {
        self.sort_elements();
        let key = if idx1 <= idx2 { (idx1, idx2) } else { (idx2, idx1) };
        self.elements.binary_search_by(|element| element.key().cmp(&key)).ok()
    }

    /// Merge terms for the same pair of children and drop terms with a zero coefficient.
    pub fn squeeze_elements(&mut self) {
        self.sort_elements();

        let mut squeezed: Vec<QuadElement> = Vec::with_capacity(self.elements.len());
        for element in self.elements.drain(..) {
            match squeezed.last_mut() {
                Some(last) if last.key() == element.key() => last.coefficient += element.coefficient,
                _ => squeezed.push(element),
            }
        }
        squeezed.retain(|element| element.coefficient != 0.0);
        self.elements = squeezed;
    }

    /// Largest child index referenced.
    pub(crate) fn max_child(&self) -> Option<usize> {
        self.elements.iter().map(|element| element.idx2).max()
    }

    pub(crate) fn nr_linear_coefficients(&self) -> Option<usize> {
        self.linear.as_ref().map(Vec::len)
    }

    pub(crate) fn evaluate(&self, arguments: &[f64]) -> f64 {
        let linear = self.linear.as_ref()
            .map_or(0.0, |coefficients| {
                coefficients.iter().zip(arguments).map(|(coefficient, value)| coefficient * value).sum()
            });
        let quadratic = self.elements.iter()
            .map(|element| element.coefficient * arguments[element.idx1] * arguments[element.idx2])
            .sum::<f64>();

        self.constant + linear + quadratic
    }

    /// Range over the child ranges.
    ///
    /// Terms are grouped per first child, so that each child contributes a univariate quadratic
    /// `a x^2 + b x` with an interval `b` collecting the bilinear terms.
    pub(crate) fn evaluate_interval(&self, arguments: &[Interval]) -> Interval {
        if !self.sorted {
            let mut sorted = self.clone();
            sorted.sort_elements();
            return sorted.evaluate_interval(arguments);
        }

        let mut result = Interval::point(self.constant);
        let mut i = 0;
        for (child, &argument) in arguments.iter().enumerate() {
            let linear = self.linear.as_ref().map_or(0.0, |coefficients| coefficients[child]);

            if i == self.elements.len() || self.elements[i].idx1 > child {
                if linear != 0.0 {
                    result = result + argument.scale(linear);
                }
                continue;
            }

            let mut square = 0.0;
            let mut linear = Interval::point(linear);
            while i < self.elements.len() && self.elements[i].idx1 == child {
                let element = self.elements[i];
                if element.idx2 == child {
                    square += element.coefficient;
                } else {
                    linear = linear + arguments[element.idx2].scale(element.coefficient);
                }
                i += 1;
            }
            result = result + argument.quadratic(square, linear);
        }

        result
    }

    pub(crate) fn curvature(&self, bounds: &[Interval], curvatures: &[Curvature]) -> Curvature {
        let mut result = match &self.linear {
            Some(coefficients) => coefficients.iter().zip(curvatures)
                .fold(Curvature::Linear, |total, (&coefficient, curvature)| total & curvature.scale(coefficient)),
            None => Curvature::Linear,
        };

        for element in &self.elements {
            if result == Curvature::Unknown {
                break;
            }
            if element.coefficient == 0.0 {
                continue;
            }

            let (first, second) = (bounds[element.idx1], bounds[element.idx2]);
            let term = match (first.is_point(), second.is_point()) {
                (true, true) => Curvature::Linear,
                (true, false) => curvatures[element.idx2].scale(element.coefficient * first.inf),
                (false, true) => curvatures[element.idx1].scale(element.coefficient * second.inf),
                (false, false) if element.idx1 == element.idx2 => {
                    Curvature::power(first, curvatures[element.idx1], 2.0).scale(element.coefficient)
                }
                (false, false) => Curvature::Unknown,
            };
            result = result & term;
        }

        result
    }
}

#[cfg(test)]
mod test {
    use approx::assert_relative_eq;

    use crate::data::interval::Interval;
    use crate::expression::curvature::Curvature;
    use crate::expression::quadratic::{QuadElement, QuadraticData};

    fn data() -> QuadraticData {
        // 1 + x0 + x0^2 - 2 x0 x1 + x1^2, given out of order
        QuadraticData::new(
            1.0,
            Some(vec![1.0, 0.0]),
            vec![QuadElement::new(1, 1, 1.0), QuadElement::new(1, 0, -2.0), QuadElement::new(0, 0, 1.0)],
        )
    }

    #[test]
    fn sorted_and_found() {
        let mut data = data();
        assert_eq!(data.elements()[0], QuadElement::new(0, 0, 1.0));
        assert_eq!(data.elements()[1], QuadElement::new(0, 1, -2.0));
        assert_eq!(data.find_element(1, 0), Some(1));
        assert_eq!(data.find_element(2, 2), None);
    }

    #[test]
    fn squeeze() {
        let mut data = data();
        data.add_elements(vec![QuadElement::new(0, 1, 2.0), QuadElement::new(0, 0, 0.5)]);
        data.squeeze_elements();
        assert_eq!(data.elements(), &[QuadElement::new(0, 0, 1.5), QuadElement::new(1, 1, 1.0)]);

        let once = data.clone();
        data.squeeze_elements();
        assert_eq!(data, once);
    }

    #[test]
    fn evaluate() {
        let data = data();
        assert_relative_eq!(data.evaluate(&[2.0, 3.0]), 1.0 + 2.0 + 4.0 - 12.0 + 9.0);

        let range = data.evaluate_interval(&[Interval::new(0.0, 1.0), Interval::point(1.0)]);
        // x0^2 + x0 - 2 x0 + 1 + 1 = x0^2 - x0 + 2 on [0, 1]
        assert_relative_eq!(range.inf, 1.75);
        assert_relative_eq!(range.sup, 2.0);
    }

    #[test]
    fn curvature() {
        let data = data();
        let bounds = [Interval::new(0.0, 1.0), Interval::point(1.0)];
        let curvatures = [Curvature::Linear, Curvature::Linear];
        assert_eq!(data.curvature(&bounds, &curvatures), Curvature::Convex);

        let bounds = [Interval::new(0.0, 1.0), Interval::new(0.0, 1.0)];
        assert_eq!(data.curvature(&bounds, &curvatures), Curvature::Unknown);
    }
}
