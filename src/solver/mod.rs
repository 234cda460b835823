//! Numerical methods
//!
//! Two solvers cover the needs of the cell model:
//!
//! - [`LeastSquaresSolver`]: damped least-squares (Levenberg–Marquardt) with a
//!   forward-difference Jacobian, used for the steady-state cell populations.
//!   The residual system is rank-deficient by construction (the two volume
//!   fraction equations vanish identically at the pinned active-cell
//!   densities), which is exactly what the damping is for.
//! - [`StiffIntegrator`]: variable-step implicit BDF integration (orders 1–2)
//!   with an inner Newton iteration, used for the transient cell dynamics.
//!   Cell turnover is fast against volume-fraction change, so the system is
//!   integrated with a stiff method and a bounded maximum step.
//!
//! Both report failure through [`SolverError`]; retrying with relaxed
//! settings is the caller's decision, never done here.

mod least_squares;
mod stiff;

pub use least_squares::{LeastSquaresSolution, LeastSquaresSolver};
pub use stiff::{StiffIntegrator, Trajectory};

use thiserror::Error;

/// Failures of the numerical methods.
#[derive(Debug, Error)]
pub enum SolverError {
    /// Iteration budget exhausted above tolerance.
    #[error("no convergence after {iterations} iterations (residual {residual:.3e})")]
    NonConvergence { iterations: usize, residual: f64 },

    /// A linear solve inside the method failed (singular system).
    #[error("linear solve failed")]
    LinearSolveFailed,

    /// Step-size control drove the step below the representable minimum.
    #[error("step size underflow at t = {t:.6} (h = {step:.3e})")]
    StepSizeUnderflow { t: f64, step: f64 },

    /// The solver was configured or called with unusable input.
    #[error("invalid solver input: {0}")]
    InvalidInput(String),
}
