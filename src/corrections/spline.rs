use nalgebra::{DMatrix, DVector};

/// Interpolating cubic spline with not-a-knot end conditions: the third
/// derivative is continuous across the second and the penultimate knots.
/// Outside the tabulated range the end pieces are extrapolated.
#[derive(Clone, Debug, PartialEq)]
pub struct CubicSpline {
    xs: Vec<f32>,
    ys: Vec<f32>,
    /// Second derivative at each knot
    curvature: Vec<f32>,
}

impl CubicSpline {

    /// `None` unless there are at least 4 strictly increasing knots
    pub fn not_a_knot(xs: &[f32], ys: &[f32]) -> Option<Self> {
        let n = xs.len();
        if n < 4 || ys.len() != n || xs.windows(2).any(|w| w[1] <= w[0]) { return None }

        let x = |i: usize| xs[i] as f64;
        let y = |i: usize| ys[i] as f64;
        let h = |i: usize| x(i + 1) - x(i);

        let mut a = DMatrix::<f64>::zeros(n, n);
        let mut b = DVector::<f64>::zeros(n);

        // Third derivative continuous at the second and penultimate knots
        a[(0, 0)] =  h(1);
        a[(0, 1)] = -(h(0) + h(1));
        a[(0, 2)] =  h(0);
        a[(n-1, n-3)] =  h(n-2);
        a[(n-1, n-2)] = -(h(n-3) + h(n-2));
        a[(n-1, n-1)] =  h(n-3);

        // Continuity of the first derivative at the interior knots
        for i in 1..n-1 {
            a[(i, i-1)] = h(i-1);
            a[(i, i  )] = 2.0 * (h(i-1) + h(i));
            a[(i, i+1)] = h(i);
            b[i] = 6.0 * ((y(i+1) - y(i)) / h(i) - (y(i) - y(i-1)) / h(i-1));
        }

        let m = a.lu().solve(&b)?;
        Some(Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            curvature: m.iter().map(|&v| v as f32).collect(),
        })
    }

    pub fn at(&self, x: f32) -> f32 {
        let last = self.xs.len() - 2;
        let i = self.xs.partition_point(|&k| k <= x).saturating_sub(1).min(last);
        let (x0, x1) = (self.xs[i], self.xs[i+1]);
        let (y0, y1) = (self.ys[i], self.ys[i+1]);
        let (m0, m1) = (self.curvature[i], self.curvature[i+1]);
        let h = x1 - x0;
        let (a, b) = (x1 - x, x - x0);
        m0 * a.powi(3) / (6.0 * h) +
        m1 * b.powi(3) / (6.0 * h) +
        (y0 / h - m0 * h / 6.0) * a +
        (y1 / h - m1 * h / 6.0) * b
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::assert_float_eq;
    use rstest::rstest;

    #[test]
    fn passes_through_knots() {
        let xs = [5.0, 10.0, 20.0, 25.0, 35.0];
        let ys = [1.3, 1.458, 1.589, 1.617, 1.639];
        let s = CubicSpline::not_a_knot(&xs, &ys).unwrap();
        for (&x, &y) in xs.iter().zip(&ys) {
            assert_float_eq!(s.at(x), y, r2nd <= 1e-6);
        }
    }

    // A cubic is reproduced exactly, inside and outside the knots
    #[rstest(x, case(0.0), case(2.5), case(7.0), case(13.0), case(40.0))]
    fn reproduces_cubics(x: f32) {
        let f = |x: f32| 0.5 * x.powi(3) - 2.0 * x.powi(2) + x - 3.0;
        let xs = [1.0, 2.0, 4.0, 8.0, 11.0];
        let ys = xs.map(f);
        let s = CubicSpline::not_a_knot(&xs, &ys).unwrap();
        assert_float_eq!(s.at(x), f(x), r2nd <= 1e-3);
    }

    #[test]
    fn rejects_unusable_knots() {
        assert!(CubicSpline::not_a_knot(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).is_none());
        assert!(CubicSpline::not_a_knot(&[1.0, 3.0, 2.0, 4.0], &[0.0; 4]).is_none());
        assert!(CubicSpline::not_a_knot(&[1.0, 2.0, 3.0, 4.0], &[0.0; 3]).is_none());
    }
}
