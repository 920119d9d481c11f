//! Levenberg-Marquardt nonlinear least squares.
//!
//! Minimises `Σ (y_i - f(x_i; p))²` with a forward-difference Jacobian and a
//! Marquardt-scaled damping term. Damping shrinks after an accepted step and
//! grows after a rejected one.

use super::{linalg, FitError};

/// Solver settings
#[derive(Debug, Clone)]
pub struct LmOptions {
    pub max_iterations: usize,
    pub initial_damping: f64,
    pub damping_step_up: f64,
    pub damping_step_down: f64,
    /// Relative reduction of the residual sum of squares that counts as converged
    pub cost_tolerance: f64,
    /// Relative parameter change that counts as converged
    pub step_tolerance: f64,
}

impl Default for LmOptions {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            initial_damping: 1e-3,
            damping_step_up: 11.0,
            damping_step_down: 9.0,
            cost_tolerance: 1.49e-8,
            step_tolerance: 1.49e-8,
        }
    }
}

/// Converged parameters and their residual sum of squares
#[derive(Debug, Clone, PartialEq)]
pub struct LmFit {
    pub parameters: Vec<f64>,
    pub cost: f64,
    pub iterations: usize,
}

const MAX_DAMPING: f64 = 1e16;

fn cost<F>(x: &[f64], y: &[f64], params: &[f64], model: &F) -> f64
where
    F: Fn(f64, &[f64]) -> f64,
{
    x.iter()
        .zip(y.iter())
        .map(|(&xi, &yi)| {
            let r = yi - model(xi, params);
            r * r
        })
        .sum()
}

/// Fit `model(x, params)` to `(x, y)` starting from `initial`.
///
/// # Errors
///
/// [`FitError::InsufficientPoints`] with fewer samples than parameters,
/// [`FitError::NotConverged`] when the iteration budget runs out, damping
/// saturates, or the residual is not finite.
pub fn levenberg_marquardt<F>(
    x: &[f64],
    y: &[f64],
    initial: &[f64],
    model: F,
    options: &LmOptions,
) -> Result<LmFit, FitError>
where
    F: Fn(f64, &[f64]) -> f64,
{
    let n_params = initial.len();
    if x.len() != y.len() {
        return Err(FitError::Degenerate(format!(
            "{} abscissae for {} ordinates",
            x.len(),
            y.len()
        )));
    }
    if x.len() < n_params {
        return Err(FitError::InsufficientPoints {
            required: n_params,
            actual: x.len(),
        });
    }

    let mut params = initial.to_vec();
    let mut current = cost(x, y, &params, &model);
    if !current.is_finite() {
        return Err(FitError::NotConverged { iterations: 0 });
    }
    let mut damping = options.initial_damping;

    for iteration in 1..=options.max_iterations {
        let residuals: Vec<f64> = x
            .iter()
            .zip(y.iter())
            .map(|(&xi, &yi)| yi - model(xi, &params))
            .collect();

        let mut jacobian = vec![vec![0.0; n_params]; x.len()];
        for k in 0..n_params {
            let step = f64::EPSILON.sqrt() * params[k].abs().max(1.0);
            let mut shifted = params.clone();
            shifted[k] += step;
            for (row, &xi) in x.iter().enumerate() {
                jacobian[row][k] = (model(xi, &shifted) - model(xi, &params)) / step;
            }
        }

        let mut jtj = vec![vec![0.0; n_params]; n_params];
        let mut jtr = vec![0.0; n_params];
        for (row, r) in jacobian.iter().zip(residuals.iter()) {
            for a in 0..n_params {
                jtr[a] += row[a] * r;
                for b in 0..n_params {
                    jtj[a][b] += row[a] * row[b];
                }
            }
        }

        // Try steps with growing damping until one lowers the cost
        loop {
            let mut system = jtj.clone();
            for (k, row) in system.iter_mut().enumerate() {
                row[k] += damping * jtj[k][k].max(1e-12);
            }

            let delta = match linalg::solve(system, jtr.clone()) {
                Ok(delta) => delta,
                Err(_) => {
                    damping *= options.damping_step_up;
                    if damping > MAX_DAMPING {
                        return Err(FitError::NotConverged { iterations: iteration });
                    }
                    continue;
                }
            };

            let candidate: Vec<f64> = params.iter().zip(delta.iter()).map(|(p, d)| p + d).collect();
            let candidate_cost = cost(x, y, &candidate, &model);

            if candidate_cost.is_finite() && candidate_cost <= current {
                let reduction = current - candidate_cost;
                let step_norm = delta.iter().map(|d| d * d).sum::<f64>().sqrt();
                let param_norm = params.iter().map(|p| p * p).sum::<f64>().sqrt();

                params = candidate;
                let previous = current;
                current = candidate_cost;
                damping = (damping / options.damping_step_down).max(1e-12);

                let cost_converged = reduction <= options.cost_tolerance * previous;
                let step_converged =
                    step_norm <= options.step_tolerance * (param_norm + options.step_tolerance);
                if current == 0.0 || (cost_converged && step_converged) {
                    return Ok(LmFit {
                        parameters: params,
                        cost: current,
                        iterations: iteration,
                    });
                }
                break;
            }

            damping *= options.damping_step_up;
            if damping > MAX_DAMPING {
                // No descent direction left: a local minimum when the gradient vanishes
                let gradient = jtr.iter().map(|g| g * g).sum::<f64>().sqrt();
                if gradient <= 1e-8 * (1.0 + current) {
                    return Ok(LmFit {
                        parameters: params,
                        cost: current,
                        iterations: iteration,
                    });
                }
                return Err(FitError::NotConverged { iterations: iteration });
            }
        }
    }

    Err(FitError::NotConverged {
        iterations: options.max_iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fits_exponential_decay() {
        let x: Vec<f64> = (0..20).map(|i| i as f64 * 0.25).collect();
        let y: Vec<f64> = x.iter().map(|&t| 3.0 * (-0.7 * t).exp() + 0.5).collect();
        let fit = levenberg_marquardt(
            &x,
            &y,
            &[1.0, -0.1, 0.0],
            |t, p| p[0] * (p[1] * t).exp() + p[2],
            &LmOptions::default(),
        )
        .unwrap();
        assert!((fit.parameters[0] - 3.0).abs() < 1e-5);
        assert!((fit.parameters[1] + 0.7).abs() < 1e-5);
        assert!((fit.parameters[2] - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_rejects_underdetermined() {
        let result = levenberg_marquardt(
            &[1.0, 2.0],
            &[1.0, 2.0],
            &[1.0, 1.0, 1.0],
            |t, p| p[0] * t + p[1] + p[2],
            &LmOptions::default(),
        );
        assert!(matches!(result, Err(FitError::InsufficientPoints { .. })));
    }

    #[test]
    fn test_non_finite_start_fails() {
        let result = levenberg_marquardt(
            &[0.0, 1.0, 2.0],
            &[1.0, 2.0, 3.0],
            &[1.0, -1.0],
            |t, p| p[0] * t.powf(p[1]),
            &LmOptions::default(),
        );
        assert!(matches!(result, Err(FitError::NotConverged { .. })));
    }
}
