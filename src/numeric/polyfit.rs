use serde::{Deserialize, Serialize};

use super::{linalg, FitError};

/// Polynomial with coefficients stored highest power first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polynomial {
    pub coefficients: Vec<f64>,
}

impl Polynomial {
    pub fn new(coefficients: Vec<f64>) -> Self {
        Self { coefficients }
    }

    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    /// Horner evaluation
    pub fn evaluate(&self, x: f64) -> f64 {
        self.coefficients.iter().fold(0.0, |acc, c| acc * x + c)
    }

    /// Least-squares fit of a polynomial of `degree` through `(x, y)`.
    ///
    /// The abscissae are centred and scaled before the normal equations are
    /// built, then the coefficients are expanded back to powers of `x`.
    pub fn fit(x: &[f64], y: &[f64], degree: usize) -> Result<Self, FitError> {
        if x.len() != y.len() {
            return Err(FitError::Degenerate(format!(
                "{} abscissae for {} ordinates",
                x.len(),
                y.len()
            )));
        }
        if x.len() < degree + 1 {
            return Err(FitError::InsufficientPoints {
                required: degree + 1,
                actual: x.len(),
            });
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(FitError::Degenerate("non-finite sample".to_string()));
        }

        let n = x.len() as f64;
        let centre = x.iter().sum::<f64>() / n;
        let spread = x.iter().map(|v| (v - centre).abs()).fold(0.0, f64::max);
        let scale = if spread > 0.0 { spread } else { 1.0 };

        let terms = degree + 1;
        let mut normal = vec![vec![0.0; terms]; terms];
        let mut rhs = vec![0.0; terms];
        for (&xi, &yi) in x.iter().zip(y.iter()) {
            let u = (xi - centre) / scale;
            let powers: Vec<f64> = (0..terms).map(|k| u.powi(k as i32)).collect();
            for r in 0..terms {
                rhs[r] += powers[r] * yi;
                for c in 0..terms {
                    normal[r][c] += powers[r] * powers[c];
                }
            }
        }

        // Lowest power first in the scaled variable u = (x - centre) / scale
        let scaled = linalg::solve(normal, rhs)?;

        let base = [-centre / scale, 1.0 / scale];
        let mut expanded = vec![0.0; terms];
        let mut power = vec![1.0];
        for coefficient in scaled {
            for (k, p) in power.iter().enumerate() {
                expanded[k] += coefficient * p;
            }
            power = multiply(&power, &base);
        }

        expanded.reverse();
        Ok(Self::new(expanded))
    }
}

/// Product of two polynomials stored lowest power first
fn multiply(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}
