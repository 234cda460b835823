//! Damped least-squares (Levenberg–Marquardt) solver
//!
//! Minimizes `‖r(x)‖` for a square or overdetermined residual function,
//! derivative-free from the caller's perspective: the Jacobian is built by
//! forward differences. The normal equations are damped with a scaled
//! Marquardt term, so rank-deficient residual systems (zero rows/columns)
//! converge on the determined subspace and leave the null directions at the
//! initial guess.

use nalgebra::{DMatrix, DVector};

use crate::solver::SolverError;

/// Floor for the Marquardt damping scale of a degenerate diagonal entry.
const DAMPING_FLOOR: f64 = 1.0e-12;
/// Damping multiplier applied on rejected steps.
const DAMPING_GROWTH: f64 = 10.0;
/// Largest damping before the iteration gives up on the current Jacobian.
const DAMPING_MAX: f64 = 1.0e12;

/// Levenberg–Marquardt least-squares solver.
#[derive(Debug, Clone, Copy)]
pub struct LeastSquaresSolver {
    /// Convergence threshold on the residual infinity norm.
    pub tolerance: f64,
    /// Iteration budget.
    pub max_iterations: usize,
}

impl Default for LeastSquaresSolver {
    fn default() -> Self {
        Self {
            tolerance: 1.0e-12,
            max_iterations: 200,
        }
    }
}

/// Converged least-squares solution.
#[derive(Debug, Clone)]
pub struct LeastSquaresSolution {
    pub solution: DVector<f64>,
    pub iterations: usize,
    pub residual_norm: f64,
}

impl LeastSquaresSolver {
    /// Solve `r(x) ≈ 0` starting from `initial_guess`.
    ///
    /// The residual closure may carry mutable state (the cell model caches
    /// its reference strain energy density on first evaluation).
    pub fn solve<F>(
        &self,
        mut residual: F,
        initial_guess: DVector<f64>,
    ) -> Result<LeastSquaresSolution, SolverError>
    where
        F: FnMut(&DVector<f64>) -> DVector<f64>,
    {
        if self.tolerance <= 0.0 {
            return Err(SolverError::InvalidInput(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if self.max_iterations == 0 {
            return Err(SolverError::InvalidInput(
                "max_iterations must be at least 1".to_string(),
            ));
        }

        let mut x = initial_guess;
        let mut r = residual(&x);
        let mut r_norm = r.amax();
        let mut damping = 1.0e-3;

        for iteration in 0..self.max_iterations {
            if r_norm <= self.tolerance {
                log::debug!(
                    "least-squares converged after {iteration} iterations, residual {r_norm:.3e}"
                );
                return Ok(LeastSquaresSolution {
                    solution: x,
                    iterations: iteration,
                    residual_norm: r_norm,
                });
            }

            let jacobian = forward_difference_jacobian(&mut residual, &x, &r);
            let jtj = jacobian.transpose() * &jacobian;
            let jtr = jacobian.transpose() * &r;

            // Try increasingly damped steps until one reduces the residual.
            let mut accepted = false;
            while damping < DAMPING_MAX {
                let mut system = jtj.clone();
                for i in 0..system.nrows() {
                    let scale = jtj[(i, i)].max(DAMPING_FLOOR);
                    system[(i, i)] += damping * scale;
                }

                let step = match system.lu().solve(&(-&jtr)) {
                    Some(step) => step,
                    None => {
                        damping *= DAMPING_GROWTH;
                        continue;
                    }
                };

                let candidate = &x + &step;
                let r_candidate = residual(&candidate);
                let candidate_norm = r_candidate.amax();

                if candidate_norm.is_finite() && candidate_norm < r_norm {
                    let step_norm = step.amax();
                    x = candidate;
                    r = r_candidate;
                    r_norm = candidate_norm;
                    damping = (damping / DAMPING_GROWTH).max(1.0e-12);
                    accepted = true;

                    log::debug!(
                        "least-squares iteration {iteration}: residual {r_norm:.3e}, step {step_norm:.3e}"
                    );
                    break;
                }
                damping *= DAMPING_GROWTH;
            }

            if !accepted {
                // The Jacobian offers no descent direction any more; report
                // whatever precision was reached.
                if r_norm <= self.tolerance {
                    return Ok(LeastSquaresSolution {
                        solution: x,
                        iterations: iteration,
                        residual_norm: r_norm,
                    });
                }
                return Err(SolverError::NonConvergence {
                    iterations: iteration,
                    residual: r_norm,
                });
            }
        }

        if r_norm <= self.tolerance {
            return Ok(LeastSquaresSolution {
                solution: x,
                iterations: self.max_iterations,
                residual_norm: r_norm,
            });
        }
        Err(SolverError::NonConvergence {
            iterations: self.max_iterations,
            residual: r_norm,
        })
    }
}

/// Forward-difference Jacobian of `residual` at `x` (with `r0 = residual(x)`
/// already evaluated).
fn forward_difference_jacobian<F>(
    residual: &mut F,
    x: &DVector<f64>,
    r0: &DVector<f64>,
) -> DMatrix<f64>
where
    F: FnMut(&DVector<f64>) -> DVector<f64>,
{
    let sqrt_eps = f64::EPSILON.sqrt();
    let mut jacobian = DMatrix::zeros(r0.len(), x.len());

    for col in 0..x.len() {
        let h = sqrt_eps * (x[col].abs() + sqrt_eps);
        let mut x_shift = x.clone();
        x_shift[col] += h;
        let r_shift = residual(&x_shift);
        for row in 0..r0.len() {
            jacobian[(row, col)] = (r_shift[row] - r0[row]) / h;
        }
    }
    jacobian
}

// =================================================================================================
// Tests
// =================================================================================================
