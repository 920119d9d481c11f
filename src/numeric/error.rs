/// Errors raised by curve fitting and interpolation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FitError {
    /// Not enough samples for the requested model
    #[error("Insufficient points for fit: need {required}, got {actual}")]
    InsufficientPoints { required: usize, actual: usize },

    /// The linear system behind the fit has no unique solution
    #[error("Singular system in fit")]
    Singular,

    /// Iterative solver ran out of iterations or diverged
    #[error("Fit did not converge after {iterations} iterations")]
    NotConverged { iterations: usize },

    /// Input data cannot support the model (unsorted, duplicated or non-finite)
    #[error("Degenerate fit input: {0}")]
    Degenerate(String),
}
