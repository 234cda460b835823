//! Variable-step implicit BDF integrator (orders 1–2)
//!
//! Backward differentiation with an inner Newton iteration, built for small
//! stiff systems with a multi-rate structure: fast constituent dynamics on
//! top of slowly drifting aggregate fractions. The first step runs backward
//! Euler; subsequent steps use the variable-step BDF2 formula with the
//! backward-Euler stage doubling as predictor and error reference.
//!
//! Local error is controlled against `atol + rtol·|x|` weights; the step is
//! capped by `max_step` so the integrator never strides across a load-case
//! boundary in one step.

use nalgebra::{Const, DimMin, SMatrix, SVector};

use crate::solver::SolverError;

/// Newton iterations per implicit stage.
const MAX_NEWTON_ITERATIONS: usize = 8;
/// Newton displacement threshold in error-weight units.
const NEWTON_TOLERANCE: f64 = 1.0e-2;
/// Step growth/shrink safety factor.
const SAFETY: f64 = 0.9;

/// Implicit stiff integrator.
#[derive(Debug, Clone, Copy)]
pub struct StiffIntegrator {
    /// Relative tolerance for the local error control.
    pub rtol: f64,
    /// Absolute tolerance for the local error control.
    pub atol: f64,
    /// Upper bound on the step size.
    pub max_step: f64,
    /// Lower bound on the step size; falling below it is a hard failure.
    pub min_step: f64,
    /// Safety cap on the number of accepted + rejected steps.
    pub max_steps: usize,
}

impl Default for StiffIntegrator {
    fn default() -> Self {
        Self {
            rtol: 1.0e-8,
            atol: 1.0e-10,
            max_step: 1.0,
            min_step: 1.0e-12,
            max_steps: 1_000_000,
        }
    }
}

/// Accepted integration trajectory.
#[derive(Debug, Clone)]
pub struct Trajectory<const N: usize> {
    pub times: Vec<f64>,
    pub states: Vec<SVector<f64, N>>,
}

impl<const N: usize> Trajectory<N> {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// State at the end of the span.
    pub fn final_state(&self) -> &SVector<f64, N> {
        self.states
            .last()
            .expect("trajectory always contains the initial state")
    }
}

impl StiffIntegrator {
    /// Integrate `dx/dt = f(t, x)` over `t_span` from `x0`.
    pub fn integrate<const N: usize, F>(
        &self,
        mut f: F,
        t_span: (f64, f64),
        x0: SVector<f64, N>,
    ) -> Result<Trajectory<N>, SolverError>
    where
        F: FnMut(f64, &SVector<f64, N>) -> SVector<f64, N>,
        Const<N>: DimMin<Const<N>, Output = Const<N>>,
    {
        let (t0, t_end) = t_span;
        if !(t_end > t0) {
            return Err(SolverError::InvalidInput(format!(
                "time span inverted or empty: [{t0}, {t_end}]"
            )));
        }
        if self.rtol <= 0.0 || self.atol <= 0.0 || self.max_step <= 0.0 {
            return Err(SolverError::InvalidInput(
                "tolerances and max_step must be positive".to_string(),
            ));
        }

        let span = t_end - t0;
        let mut t = t0;
        let mut x = x0;
        let mut trajectory = Trajectory {
            times: vec![t0],
            states: vec![x0],
        };

        let mut h = (span * 1.0e-4).max(self.min_step).min(self.max_step).min(span);
        // Previous accepted point, for the two-step formula.
        let mut history: Option<(f64, SVector<f64, N>)> = None;
        let mut steps = 0usize;

        while (t_end - t) > 1.0e-10 * t_end.abs().max(1.0) {
            steps += 1;
            if steps > self.max_steps {
                return Err(SolverError::NonConvergence {
                    iterations: steps,
                    residual: t_end - t,
                });
            }
            h = h.min(t_end - t).min(self.max_step);

            // Backward-Euler stage: solution on the first step, predictor and
            // error reference afterwards.
            let backward_euler = self.newton_stage(&mut f, t + h, h, x, x);
            let x_be = match backward_euler {
                Some(state) => state,
                None => {
                    h *= 0.25;
                    if h < self.min_step {
                        return Err(SolverError::StepSizeUnderflow { t, step: h });
                    }
                    continue;
                }
            };

            let candidate = match history {
                Some((h_prev, x_prev)) => {
                    let rho = h / h_prev;
                    let denom = 1.0 + 2.0 * rho;
                    let c1 = (1.0 + rho) * (1.0 + rho) / denom;
                    let c2 = rho * rho / denom;
                    let beta = (1.0 + rho) / denom;
                    let rhs = x * c1 - x_prev * c2;
                    self.newton_stage(&mut f, t + h, beta * h, rhs, x_be)
                        .map(|x_bdf2| {
                            let error = self.weighted_rms(&(x_bdf2 - x_be), &x_bdf2);
                            (x_bdf2, error, 2u32)
                        })
                }
                None => {
                    let explicit = x + f(t, &x) * h;
                    let error = self.weighted_rms(&(x_be - explicit), &x_be);
                    Some((x_be, error, 1u32))
                }
            };

            let Some((x_new, error, order)) = candidate else {
                h *= 0.25;
                if h < self.min_step {
                    return Err(SolverError::StepSizeUnderflow { t, step: h });
                }
                continue;
            };

            if error <= 1.0 {
                history = Some((h, x));
                t += h;
                x = x_new;
                trajectory.times.push(t);
                trajectory.states.push(x);

                let exponent = -1.0 / (order as f64 + 1.0);
                let growth = (SAFETY * error.max(1.0e-10).powf(exponent)).clamp(0.2, 5.0);
                h = (h * growth).min(self.max_step);
            } else {
                let exponent = -1.0 / (order as f64 + 1.0);
                let shrink = (SAFETY * error.powf(exponent)).clamp(0.1, 0.9);
                h *= shrink;
                if h < self.min_step {
                    return Err(SolverError::StepSizeUnderflow { t, step: h });
                }
            }
        }

        Ok(trajectory)
    }

    /// Solve the implicit stage `x − γ f(t_new, x) − rhs = 0` by Newton
    /// iteration with a frozen finite-difference Jacobian.
    fn newton_stage<const N: usize, F>(
        &self,
        f: &mut F,
        t_new: f64,
        gamma: f64,
        rhs: SVector<f64, N>,
        predictor: SVector<f64, N>,
    ) -> Option<SVector<f64, N>>
    where
        F: FnMut(f64, &SVector<f64, N>) -> SVector<f64, N>,
        Const<N>: DimMin<Const<N>, Output = Const<N>>,
    {
        let jacobian = finite_difference_jacobian(f, t_new, &predictor);
        let iteration_matrix = SMatrix::<f64, N, N>::identity() - jacobian * gamma;
        let lu = iteration_matrix.lu();

        let mut x = predictor;
        for _ in 0..MAX_NEWTON_ITERATIONS {
            let g = x - f(t_new, &x) * gamma - rhs;
            let dx = lu.solve(&(-g))?;
            x += dx;
            if !x.iter().all(|v| v.is_finite()) {
                return None;
            }
            if self.weighted_rms(&dx, &x) < NEWTON_TOLERANCE {
                return Some(x);
            }
        }
        None
    }

    /// RMS norm of `v` in `atol + rtol·|x|` weights.
    fn weighted_rms<const N: usize>(
        &self,
        v: &SVector<f64, N>,
        reference: &SVector<f64, N>,
    ) -> f64 {
        let mut sum = 0.0;
        for i in 0..N {
            let weight = self.atol + self.rtol * reference[i].abs();
            let scaled = v[i] / weight;
            sum += scaled * scaled;
        }
        (sum / N as f64).sqrt()
    }
}

/// Forward-difference Jacobian of `f` at `(t, x)`.
fn finite_difference_jacobian<const N: usize, F>(
    f: &mut F,
    t: f64,
    x: &SVector<f64, N>,
) -> SMatrix<f64, N, N>
where
    F: FnMut(f64, &SVector<f64, N>) -> SVector<f64, N>,
{
    let f0 = f(t, x);
    let sqrt_eps = f64::EPSILON.sqrt();
    let mut jacobian = SMatrix::<f64, N, N>::zeros();

    for col in 0..N {
        let h = sqrt_eps * (x[col].abs() + sqrt_eps);
        let mut shifted = *x;
        shifted[col] += h;
        let f_shift = f(t, &shifted);
        for row in 0..N {
            jacobian[(row, col)] = (f_shift[row] - f0[row]) / h;
        }
    }
    jacobian
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector2;

    #[test]
    fn test_exponential_decay_matches_analytic() {
        // dy/dt = -2y, y(0) = 1 → y(t) = exp(-2t).
        let integrator = StiffIntegrator {
            max_step: 0.5,
            ..StiffIntegrator::default()
        };
        let trajectory = integrator
            .integrate(
                |_t, x: &SVector<f64, 1>| -x * 2.0,
                (0.0, 5.0),
                SVector::<f64, 1>::new(1.0),
            )
            .unwrap();

        let expected = (-2.0_f64 * 5.0).exp();
        let actual = trajectory.final_state()[0];
        assert!(
            (actual - expected).abs() < 1e-6,
            "final {actual} vs analytic {expected}"
        );
        assert!((trajectory.times.last().unwrap() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_stiff_decay_is_stable() {
        // λ = -10⁴: explicit methods would need h < 2e-4; the implicit
        // scheme strides through the transient without blowing up.
        let integrator = StiffIntegrator::default();
        let trajectory = integrator
            .integrate(
                |_t, x: &SVector<f64, 1>| -x * 1.0e4,
                (0.0, 1.0),
                SVector::<f64, 1>::new(1.0),
            )
            .unwrap();

        let actual = trajectory.final_state()[0];
        assert!(actual.is_finite());
        assert!(actual.abs() < 1e-6);
    }

    #[test]
    fn test_two_rate_system() {
        // Fast mode relaxes onto the slow manifold: the multi-rate structure
        // of the cell model in miniature.
        //   dy1/dt = -100 (y1 - y2)
        //   dy2/dt = -0.1 y2
        let integrator = StiffIntegrator::default();
        let trajectory = integrator
            .integrate(
                |_t, x: &Vector2<f64>| {
                    Vector2::new(-100.0 * (x[0] - x[1]), -0.1 * x[1])
                },
                (0.0, 10.0),
                Vector2::new(5.0, 1.0),
            )
            .unwrap();

        let state = trajectory.final_state();
        let slow = (-0.1_f64 * 10.0).exp();
        // Fast component has long since collapsed onto the slow one.
        assert!((state[1] - slow).abs() < 1e-4);
        assert!((state[0] - state[1]).abs() < 1e-3);
    }

    #[test]
    fn test_max_step_is_honored() {
        let integrator = StiffIntegrator {
            max_step: 0.25,
            ..StiffIntegrator::default()
        };
        let trajectory = integrator
            .integrate(
                |_t, x: &SVector<f64, 1>| -x * 0.01,
                (0.0, 10.0),
                SVector::<f64, 1>::new(1.0),
            )
            .unwrap();

        for pair in trajectory.times.windows(2) {
            assert!(pair[1] - pair[0] <= 0.25 + 1e-12);
        }
    }

    #[test]
    fn test_inverted_span_rejected() {
        let integrator = StiffIntegrator::default();
        let result = integrator.integrate(
            |_t, x: &SVector<f64, 1>| *x,
            (5.0, 1.0),
            SVector::<f64, 1>::new(1.0),
        );
        assert!(matches!(result, Err(SolverError::InvalidInput(_))));
    }

    #[test]
    fn test_trajectory_includes_initial_state() {
        let integrator = StiffIntegrator::default();
        let trajectory = integrator
            .integrate(
                |_t, x: &SVector<f64, 1>| -x * 1.0,
                (2.0, 3.0),
                SVector::<f64, 1>::new(0.5),
            )
            .unwrap();
        assert_eq!(trajectory.times[0], 2.0);
        assert_eq!(trajectory.states[0][0], 0.5);
        assert!(trajectory.len() >= 2);
    }
}
