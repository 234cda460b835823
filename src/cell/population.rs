//! Cell population model shell
//!
//! [`CellPopulationModel`] couples six cell/volume state variables through
//! the injected signaling strategy and the micromechanical feedback:
//!
//! - `solve_steady_state`: pins the active densities from the
//!   porosity-derived turnover rate and solves the remaining populations by
//!   damped least squares. The reference strain energy density is captured
//!   lazily on the first residual evaluation and never recomputed.
//! - `steady_state_residual` / `transient_rates`: the two faces of one
//!   constitutive vector field. The residual holds OBa/OCa fixed and treats
//!   {OBu, OBp, OCu, OCp} as unknowns; the transient pins OBu/OCu at their
//!   steady-state values and advances {OBp, OBa, OCp, OCa} plus the two
//!   volume fractions. Which variables are "solved for" is the caller's
//!   choice, made explicit by calling one function or the other.
//! - `integrate_transient`: stiff BDF integration over a mechanics interval.
//!
//! The vascular-pore and bone-volume rates are the same resorption and
//! formation terms with opposite signs, so their sum vanishes for every
//! state, not only at steady state.

use nalgebra::{DVector, Matrix3, SVector};

use crate::cell::parameters::Parameters;
use crate::cell::signaling::{PorosityCoupledSignaling, SignalingContext, SignalingModel};
use crate::cell::state::{CellState, SteadyState};
use crate::error::{Error, Result, SolverStage};
use crate::load::LoadCase;
use crate::mechanics::tensor::stress_tensor;
use crate::mechanics::Homogenizer;
use crate::solver::{LeastSquaresSolver, StiffIntegrator, Trajectory};

/// Habitual axial loading of the reference state \[GPa\] (−30 MPa).
const REFERENCE_AXIAL_STRESS: f64 = -30.0e-3;

/// Mechanical feedback state of one model instance.
#[derive(Debug, Clone)]
pub struct MechanicsState {
    /// Stress tensor of the reference (steady-state) loading \[GPa\].
    pub reference_stress: Matrix3<f64>,
    /// Stress tensor of the currently active loading \[GPa\].
    pub active_stress: Matrix3<f64>,
    /// Reference strain energy density, captured once at steady state \[GPa\].
    pub strain_energy_density_reference: Option<f64>,
    /// Most recently evaluated strain energy density \[GPa\].
    pub strain_energy_density: f64,
    /// Most recent normalized strain deviation.
    pub strain_effect: f64,
    /// Mechanically induced RANKL production \[pM/day\].
    pub rankl_production: f64,
}

impl Default for MechanicsState {
    fn default() -> Self {
        Self {
            reference_stress: stress_tensor(REFERENCE_AXIAL_STRESS, 0.0, 0.0),
            active_stress: Matrix3::zeros(),
            strain_energy_density_reference: None,
            strain_energy_density: 0.0,
            strain_effect: 0.0,
            rankl_production: 0.0,
        }
    }
}

/// Local bone-cell population model of one element.
pub struct CellPopulationModel {
    parameters: Parameters,
    signaling: Box<dyn SignalingModel>,
    load_case: LoadCase,
    homogenizer: Homogenizer,
    specific_surface_multiplier: f64,
    initial_guess: SVector<f64, 6>,
    steady_state: Option<SteadyState>,
    mechanics: MechanicsState,
    steady_solver: LeastSquaresSolver,
    integrator: StiffIntegrator,
}

impl std::fmt::Debug for CellPopulationModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CellPopulationModel")
            .field("steady_state", &self.steady_state)
            .field("mechanics", &self.mechanics)
            .field(
                "specific_surface_multiplier",
                &self.specific_surface_multiplier,
            )
            .finish_non_exhaustive()
    }
}

impl CellPopulationModel {
    /// Create a model for an element at the given initial porosity.
    pub fn new(load_case: LoadCase, porosity: f64) -> Result<Self> {
        load_case.validate()?;
        validate_porosity(porosity)?;
        Ok(Self {
            parameters: Parameters::default(),
            signaling: Box::new(PorosityCoupledSignaling),
            load_case,
            homogenizer: Homogenizer::new(),
            specific_surface_multiplier: 1.0,
            initial_guess: SVector::<f64, 6>::from_column_slice(&[
                1.0e-4,
                1.0e-4,
                1.0e-3,
                1.0e-4,
                porosity,
                1.0 - porosity,
            ]),
            steady_state: None,
            mechanics: MechanicsState::default(),
            steady_solver: LeastSquaresSolver::default(),
            integrator: StiffIntegrator::default(),
        })
    }

    /// Swap in a different constitutive strategy.
    pub fn with_signaling(mut self, signaling: Box<dyn SignalingModel>) -> Self {
        self.signaling = signaling;
        self
    }

    /// Scale the specific-surface correlation (used by variant boundary
    /// studies; the default of 1 leaves the correlation untouched).
    pub fn with_specific_surface_multiplier(mut self, multiplier: f64) -> Self {
        self.specific_surface_multiplier = multiplier;
        self
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn mechanics(&self) -> &MechanicsState {
        &self.mechanics
    }

    pub fn steady_state(&self) -> Option<&SteadyState> {
        self.steady_state.as_ref()
    }

    /// The micromechanical homogenizer of this element.
    pub fn homogenizer(&self) -> &Homogenizer {
        &self.homogenizer
    }

    /// Specific surface of bone as a function of porosity (quintic
    /// correlation in the bone volume fraction).
    pub fn specific_surface(&self, porosity: f64) -> f64 {
        let b = 1.0 - porosity;
        self.specific_surface_multiplier
            * (32.2 * b - 93.9 * b.powi(2) + 134.0 * b.powi(3) - 101.0 * b.powi(4)
                + 28.8 * b.powi(5))
    }

    /// Baseline remodeling turnover rate \[1/day\]. Exactly zero at the
    /// porosity endpoints: no surface, no remodeling.
    pub fn turnover(&self, porosity: f64) -> f64 {
        if porosity == 0.0 || porosity == 1.0 {
            0.0
        } else {
            self.parameters.calibration.turnover * self.specific_surface(porosity)
        }
    }

    /// Write the reference (steady-state) macroscopic stress \[GPa\].
    ///
    /// The axial component maps to the longitudinal zz slot of the tensor.
    pub fn set_reference_stress(&mut self, axial: f64, shear_xy: f64, shear_xz: f64) {
        self.mechanics.reference_stress = stress_tensor(axial, shear_xy, shear_xz);
    }

    /// Write the active macroscopic stress \[GPa\].
    pub fn set_active_stress(&mut self, axial: f64, shear_xy: f64, shear_xz: f64) {
        self.mechanics.active_stress = stress_tensor(axial, shear_xy, shear_xz);
    }

    /// Solve the steady state for the given porosity.
    ///
    /// The active densities come straight from the turnover rate; the
    /// remaining four populations are solved by damped least squares from
    /// the published initial guess. Non-convergence is fatal for this
    /// element/porosity pair — no retry, no relaxed fallback.
    pub fn solve_steady_state(&mut self, porosity: f64) -> Result<&SteadyState> {
        validate_porosity(porosity)?;

        let turnover = self.turnover(porosity);
        let oc_a = turnover / self.parameters.bone_volume.resorption_rate;
        let ob_a = turnover / self.parameters.bone_volume.formation_rate;

        let solver = self.steady_solver;
        let guess = DVector::from_column_slice(self.initial_guess.as_slice());
        let solution = solver
            .solve(
                |x: &DVector<f64>| {
                    let state = SVector::<f64, 6>::from_column_slice(x.as_slice());
                    let rates = self.residual_with_actives(&state, ob_a, oc_a);
                    DVector::from_column_slice(rates.as_slice())
                },
                guess,
            )
            .map_err(|source| {
                Error::non_convergence(SolverStage::SteadyState, None, None, source)
            })?;

        let x = solution.solution;
        let snapshot = SteadyState {
            ob_u: x[0],
            ob_p: x[1],
            ob_a,
            oc_u: x[2],
            oc_p: x[3],
            oc_a,
        };
        log::info!(
            "steady state at porosity {:.3}: OBp {:.4e}, OBa {:.4e}, OCp {:.4e}, OCa {:.4e} ({} iterations, residual {:.2e})",
            porosity,
            snapshot.ob_p,
            snapshot.ob_a,
            snapshot.oc_p,
            snapshot.oc_a,
            solution.iterations,
            solution.residual_norm,
        );
        Ok(self.steady_state.insert(snapshot))
    }

    /// Steady-state residual at `x = [OBu, OBp, OCu, OCp, vpf, bvf]` with
    /// the active densities held at their most recently solved values.
    pub fn steady_state_residual(&mut self, x: &SVector<f64, 6>) -> Result<SVector<f64, 6>> {
        let steady = self.steady_state.ok_or_else(|| {
            Error::InvalidConfiguration(
                "steady-state residual requires a solved steady state".to_string(),
            )
        })?;
        Ok(self.residual_with_actives(x, steady.ob_a, steady.oc_a))
    }

    /// Transient rate vector at `x = [OBp, OBa, OCp, OCa, vpf, bvf]` with
    /// the uncommitted densities pinned at their steady-state values.
    pub fn transient_rates(&mut self, t: f64, x: &SVector<f64, 6>) -> Result<SVector<f64, 6>> {
        let steady = self.steady_state.ok_or_else(|| {
            Error::InvalidConfiguration(
                "transient rates require a solved steady state".to_string(),
            )
        })?;
        Ok(self.rates_with_uncommitted(t, x, steady.ob_u, steady.oc_u))
    }

    /// Integrate the transient system over `t_span`.
    ///
    /// With `initial_state = None` the steady state for `porosity` is solved
    /// first and used as the initial condition.
    pub fn integrate_transient(
        &mut self,
        t_span: (f64, f64),
        porosity: f64,
        initial_state: Option<CellState>,
    ) -> Result<Trajectory<6>> {
        validate_porosity(porosity)?;
        if !(t_span.1 > t_span.0) {
            return Err(Error::InvalidConfiguration(format!(
                "integration span inverted or empty: [{}, {}]",
                t_span.0, t_span.1
            )));
        }

        let initial = match initial_state {
            Some(state) => state,
            None => {
                let steady = *self.solve_steady_state(porosity)?;
                steady.initial_state(porosity)
            }
        };
        let steady = self.steady_state.ok_or_else(|| {
            Error::InvalidConfiguration(
                "transient integration requires a solved steady state".to_string(),
            )
        })?;

        let (ob_u, oc_u) = (steady.ob_u, steady.oc_u);
        let integrator = self.integrator;
        integrator
            .integrate(
                |t, x: &SVector<f64, 6>| self.rates_with_uncommitted(t, x, ob_u, oc_u),
                t_span,
                initial.to_vector(),
            )
            .map_err(|source| Error::non_convergence(SolverStage::Transient, None, None, source))
    }

    /// Mechanically driven contribution to the precursor-osteoblast rate
    /// \[pM/day\]. Also refreshes the feedback diagnostics (strain effect,
    /// current strain energy density, disuse RANKL production) as a side
    /// effect — the orchestrator invokes it once explicitly at each interval
    /// start before handing the model to the integrator.
    pub fn apply_mechanical_effects(&mut self, state: &CellState, t: Option<f64>) -> f64 {
        self.apply_mechanical_effects_inner(
            state.ob_p,
            state.bone_volume_fraction,
            t,
        )
    }

    // ---------------------------------------------------------------------
    // Constitutive core
    // ---------------------------------------------------------------------

    fn residual_with_actives(
        &mut self,
        x: &SVector<f64, 6>,
        ob_a: f64,
        oc_a: f64,
    ) -> SVector<f64, 6> {
        self.derivatives(x[0], x[1], ob_a, x[2], x[3], oc_a, x[4], x[5], None)
    }

    fn rates_with_uncommitted(
        &mut self,
        t: f64,
        x: &SVector<f64, 6>,
        ob_u: f64,
        oc_u: f64,
    ) -> SVector<f64, 6> {
        self.derivatives(ob_u, x[0], x[1], oc_u, x[2], x[3], x[4], x[5], Some(t))
    }

    /// The single constitutive vector field shared by both modes.
    #[allow(clippy::too_many_arguments)]
    fn derivatives(
        &mut self,
        ob_u: f64,
        ob_p: f64,
        ob_a: f64,
        oc_u: f64,
        oc_p: f64,
        oc_a: f64,
        _vascular_pore_fraction: f64,
        bone_volume_fraction: f64,
        t: Option<f64>,
    ) -> SVector<f64, 6> {
        // The mechanical term first: it refreshes the disuse RANKL
        // production consumed by the RANKL concentration below.
        let mechanical_term =
            self.apply_mechanical_effects_inner(ob_p, bone_volume_fraction, t);

        let ctx = SignalingContext {
            parameters: &self.parameters,
            load_case: &self.load_case,
            mechanical_rankl_production: self.mechanics.rankl_production,
        };
        let signaling = self.signaling.as_ref();
        let tgfb_activation_ob_u = signaling.tgfb_activation_ob_u(&ctx, oc_a, t);
        let tgfb_repression_ob_p = signaling.tgfb_repression_ob_p(&ctx, oc_a, t);
        let tgfb_activation_oc_a = signaling.tgfb_activation_oc_a(&ctx, oc_a, t);
        let rankl_activation_oc_u = signaling.rankl_activation_oc_u(&ctx, ob_p, ob_a, t);
        let rankl_activation_oc_p = signaling.rankl_activation_oc_p(&ctx, ob_p, ob_a, t);
        let mcsf_activation = signaling.mcsf_activation_oc_u(&ctx);

        let p = &self.parameters;
        let d_ob_p = p.differentiation.ob_u * tgfb_activation_ob_u * ob_u
            - p.differentiation.ob_p * tgfb_repression_ob_p * ob_p
            + mechanical_term;
        let d_ob_a =
            p.differentiation.ob_p * tgfb_repression_ob_p * ob_p - p.apoptosis.ob_a * ob_a;
        let d_oc_p = p.differentiation.oc_u * rankl_activation_oc_u * mcsf_activation * oc_u
            - p.differentiation.oc_p * rankl_activation_oc_p * oc_p;
        let d_oc_a = p.differentiation.oc_p * rankl_activation_oc_p * oc_p
            - p.apoptosis.oc_a * tgfb_activation_oc_a * oc_a;

        // Same two terms, opposite signs: the fractions are conserved.
        let resorbed = p.bone_volume.resorption_rate * oc_a;
        let formed = p.bone_volume.formation_rate * ob_a;

        SVector::<f64, 6>::from_column_slice(&[
            d_ob_p,
            d_ob_a,
            d_oc_p,
            d_oc_a,
            resorbed - formed,
            formed - resorbed,
        ])
    }

    fn apply_mechanical_effects_inner(
        &mut self,
        ob_p: f64,
        bone_volume_fraction: f64,
        t: Option<f64>,
    ) -> f64 {
        let effect = self.strain_effect(bone_volume_fraction, t);
        self.mechanics.strain_effect = effect;

        let ctx = SignalingContext {
            parameters: &self.parameters,
            load_case: &self.load_case,
            mechanical_rankl_production: self.mechanics.rankl_production,
        };
        let multiplier = self.signaling.proliferation_multiplier(&ctx, effect);
        multiplier * self.parameters.proliferation.ob_p * ob_p
    }

    /// Normalized strain deviation from the reference state.
    ///
    /// `None` and any time at or before the load-case start are the
    /// reference regime: zero effect, with the reference strain energy
    /// density captured lazily on first evaluation.
    fn strain_effect(&mut self, bone_volume_fraction: f64, t: Option<f64>) -> f64 {
        match t {
            None => {
                if self.mechanics.strain_energy_density_reference.is_none() {
                    let psi = self.strain_energy_density_for(None, bone_volume_fraction);
                    self.mechanics.strain_energy_density_reference = Some(psi);
                    self.mechanics.strain_energy_density = psi;
                }
                0.0
            }
            Some(time) if time <= self.load_case.start_time => 0.0,
            Some(time) => {
                let psi = self.strain_energy_density_for(Some(time), bone_volume_fraction);
                self.mechanics.strain_energy_density = psi;

                let reference = match self.mechanics.strain_energy_density_reference {
                    Some(reference) => reference,
                    None => {
                        let psi_reference =
                            self.strain_energy_density_for(None, bone_volume_fraction);
                        self.mechanics.strain_energy_density_reference = Some(psi_reference);
                        psi_reference
                    }
                };

                let effect = (psi - reference)
                    / (reference + self.parameters.mechanics.correction_factor);

                let ctx = SignalingContext {
                    parameters: &self.parameters,
                    load_case: &self.load_case,
                    mechanical_rankl_production: self.mechanics.rankl_production,
                };
                let production = self.signaling.disuse_rankl_production(&ctx, effect);
                self.mechanics.rankl_production = production;
                effect
            }
        }
    }

    /// Strain energy density under the stress regime selected by `t`
    /// (reference loading outside the load-case window, active inside).
    fn strain_energy_density_for(&self, t: Option<f64>, bone_volume_fraction: f64) -> f64 {
        let reference_regime = match t {
            None => true,
            Some(time) => {
                time <= self.load_case.start_time || time >= self.load_case.end_time
            }
        };
        let stress = if reference_regime {
            self.mechanics.reference_stress
        } else {
            self.mechanics.active_stress
        };
        match self
            .homogenizer
            .strain_energy_density(&stress, bone_volume_fraction)
        {
            Ok(psi) => psi,
            Err(error) => {
                log::warn!(
                    "strain energy density evaluation failed at bone volume fraction {bone_volume_fraction}: {error}"
                );
                f64::NAN
            }
        }
    }
}

fn validate_porosity(porosity: f64) -> Result<()> {
    if !porosity.is_finite() || !(0.0..=1.0).contains(&porosity) {
        return Err(Error::InvalidConfiguration(format!(
            "porosity {porosity} outside [0, 1]"
        )));
    }
    Ok(())
}

// =================================================================================================
// Tests
// =================================================================================================
