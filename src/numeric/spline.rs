//! Not-a-knot cubic interpolating spline.
//!
//! The spline passes through every sample and has a continuous third
//! derivative at the second and the second-to-last knot. It is stored as the
//! second derivatives `M_i` at each knot; the boundary conditions are folded
//! into the first and last interior rows so the system stays tridiagonal.

use super::FitError;

/// Cubic interpolating spline over strictly increasing abscissae
#[derive(Debug, Clone)]
pub struct CubicSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    second_derivatives: Vec<f64>,
}

impl CubicSpline {
    /// Minimum number of samples for a cubic with not-a-knot ends
    pub const MIN_POINTS: usize = 4;

    /// Fit a spline through `(x, y)`.
    ///
    /// # Errors
    ///
    /// [`FitError::InsufficientPoints`] below four samples,
    /// [`FitError::Degenerate`] when `x` is not strictly increasing or a
    /// value is not finite, [`FitError::Singular`] when the knot system
    /// cannot be solved.
    pub fn not_a_knot(x: &[f64], y: &[f64]) -> Result<Self, FitError> {
        if x.len() != y.len() {
            return Err(FitError::Degenerate(format!(
                "{} abscissae for {} ordinates",
                x.len(),
                y.len()
            )));
        }
        let n = x.len();
        if n < Self::MIN_POINTS {
            return Err(FitError::InsufficientPoints {
                required: Self::MIN_POINTS,
                actual: n,
            });
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(FitError::Degenerate("non-finite sample".to_string()));
        }
        if x.windows(2).any(|w| w[1] <= w[0]) {
            return Err(FitError::Degenerate(
                "abscissae are not strictly increasing".to_string(),
            ));
        }

        let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
        let slope: Vec<f64> = (0..n - 1).map(|i| (y[i + 1] - y[i]) / h[i]).collect();

        // Unknowns are M_1..M_{n-2}; M_0 and M_{n-1} follow from the end conditions.
        let m = n - 2;
        let mut lower = vec![0.0; m];
        let mut diag = vec![0.0; m];
        let mut upper = vec![0.0; m];
        let mut rhs = vec![0.0; m];
        for row in 0..m {
            let i = row + 1;
            lower[row] = h[i - 1];
            diag[row] = 2.0 * (h[i - 1] + h[i]);
            upper[row] = h[i];
            rhs[row] = 6.0 * (slope[i] - slope[i - 1]);
        }

        let (h0, h1) = (h[0], h[1]);
        diag[0] = (h0 + h1) * (h0 + 2.0 * h1) / h1;
        upper[0] = (h1 * h1 - h0 * h0) / h1;

        let (ha, hb) = (h[n - 3], h[n - 2]);
        lower[m - 1] = (ha * ha - hb * hb) / ha;
        diag[m - 1] = (ha + hb) * (2.0 * ha + hb) / ha;

        let interior = solve_tridiagonal(&lower, &diag, &upper, &rhs)?;

        let mut second_derivatives = Vec::with_capacity(n);
        second_derivatives.push(((h0 + h1) * interior[0] - h0 * interior[1]) / h1);
        second_derivatives.extend_from_slice(&interior);
        second_derivatives
            .push(((ha + hb) * interior[m - 1] - hb * interior[m - 2]) / ha);

        Ok(Self {
            x: x.to_vec(),
            y: y.to_vec(),
            second_derivatives,
        })
    }

    /// Evaluate the spline at `t`; outside the knots the end pieces are extrapolated
    pub fn evaluate(&self, t: f64) -> f64 {
        let n = self.x.len();
        let i = self
            .x
            .partition_point(|&xi| xi <= t)
            .saturating_sub(1)
            .min(n - 2);
        let (x0, x1) = (self.x[i], self.x[i + 1]);
        let (m0, m1) = (self.second_derivatives[i], self.second_derivatives[i + 1]);
        let h = x1 - x0;
        let a = x1 - t;
        let b = t - x0;
        m0 * a.powi(3) / (6.0 * h)
            + m1 * b.powi(3) / (6.0 * h)
            + (self.y[i] / h - m0 * h / 6.0) * a
            + (self.y[i + 1] / h - m1 * h / 6.0) * b
    }
}

/// Thomas algorithm; `lower[0]` and `upper[last]` are ignored
fn solve_tridiagonal(
    lower: &[f64],
    diag: &[f64],
    upper: &[f64],
    rhs: &[f64],
) -> Result<Vec<f64>, FitError> {
    let n = diag.len();
    let mut c = vec![0.0; n];
    let mut d = vec![0.0; n];

    let mut denom = diag[0];
    if denom == 0.0 || !denom.is_finite() {
        return Err(FitError::Singular);
    }
    c[0] = upper[0] / denom;
    d[0] = rhs[0] / denom;
    for i in 1..n {
        denom = diag[i] - lower[i] * c[i - 1];
        if denom == 0.0 || !denom.is_finite() {
            return Err(FitError::Singular);
        }
        c[i] = if i + 1 < n { upper[i] / denom } else { 0.0 };
        d[i] = (rhs[i] - lower[i] * d[i - 1]) / denom;
    }

    let mut solution = vec![0.0; n];
    solution[n - 1] = d[n - 1];
    for i in (0..n - 1).rev() {
        solution[i] = d[i] - c[i] * solution[i + 1];
    }
    Ok(solution)
}
