//! The cross-section orchestrator
//!
//! [`CrossSectionModel`] drives the multiscale loop: it owns the element
//! arena, refreshes effective stiffnesses by homogenization, solves the
//! global beam equilibrium (one axial plus two bending degrees of freedom),
//! distributes axial stress back onto the elements and advances every local
//! cell model across the mechanics interval.
//!
//! Unit contract at this boundary: the homogenizer works in GPa and the
//! element/ledger quantities in Pa (`1e9` up, `1e-9` down); geometry enters
//! in mm and is carried in m (`1e-3`). These fixed factors are
//! correctness-critical and appear only here and in the geometry module.

use crate::cell::{CellPopulationModel, CellState};
use crate::error::{Error, Result};
use crate::load::LoadCase;
use crate::section::element::Element;
use crate::section::geometry::SectionGeometry;
use crate::section::ledger::{ElementRecord, ResultsLedger};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// GPa → Pa.
const GPA_TO_PA: f64 = 1.0e9;
/// Pa → GPa.
const PA_TO_GPA: f64 = 1.0e-9;
const DAYS_PER_YEAR: f64 = 365.0;

/// Global loading and timing of the cross-section simulation.
#[derive(Debug, Clone, Copy)]
pub struct SectionParameters {
    /// Reference axial force \[N\].
    pub axial_force: f64,
    /// Reference bending moment about y \[N·m\].
    pub bending_moment_y: f64,
    /// Reference bending moment about z \[N·m\].
    pub bending_moment_z: f64,
    /// Simulated duration \[years\].
    pub duration_years: f64,
    /// Interval between global mechanics updates \[days\].
    pub mechanics_update_interval: f64,
}

impl Default for SectionParameters {
    fn default() -> Self {
        Self {
            axial_force: -700.0,
            bending_moment_y: 50.0,
            bending_moment_z: 0.0,
            duration_years: 3.0,
            mechanics_update_interval: 365.0,
        }
    }
}

impl SectionParameters {
    pub fn validate(&self) -> Result<()> {
        if !(self.duration_years > 0.0) || !(self.mechanics_update_interval > 0.0) {
            return Err(Error::InvalidConfiguration(format!(
                "duration ({} years) and mechanics update interval ({} days) must be positive",
                self.duration_years, self.mechanics_update_interval
            )));
        }
        for (name, value) in [
            ("axial_force", self.axial_force),
            ("bending_moment_y", self.bending_moment_y),
            ("bending_moment_z", self.bending_moment_z),
        ] {
            if !value.is_finite() {
                return Err(Error::InvalidConfiguration(format!(
                    "{name} must be finite, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Result of one beam equilibrium solve.
#[derive(Debug, Clone, Copy)]
pub struct StrainDecomposition {
    pub axial_strain: f64,
    /// Curvature about the y-axis \[1/m\].
    pub curvature_y: f64,
    /// Curvature about the z-axis \[1/m\].
    pub curvature_z: f64,
    /// Stiffness-weighted centroid (normal force centre) \[m\].
    pub centroid_y: f64,
    pub centroid_z: f64,
}

/// Multiscale cross-section model.
pub struct CrossSectionModel {
    elements: Vec<Element>,
    load_case: LoadCase,
    parameters: SectionParameters,
    delta_y: f64,
    delta_z: f64,
    ledger: ResultsLedger,
    initialized: bool,
}

impl CrossSectionModel {
    /// Build the element arena from a validated geometry. One cell model is
    /// instantiated per site, seeded at that site's porosity.
    pub fn new(
        geometry: SectionGeometry,
        load_case: LoadCase,
        parameters: SectionParameters,
    ) -> Result<Self> {
        load_case.validate()?;
        parameters.validate()?;
        if geometry.is_empty() {
            return Err(Error::InvalidConfiguration(
                "cross-section geometry has no elements".to_string(),
            ));
        }

        let mut elements = Vec::with_capacity(geometry.len());
        for site in geometry.sites() {
            let porosity = 1.0 - site.bone_volume_fraction;
            let model = CellPopulationModel::new(load_case, porosity)?;
            elements.push(Element::new(
                (site.y, site.z),
                site.bone_volume_fraction,
                model,
            ));
        }

        Ok(Self {
            elements,
            load_case,
            parameters,
            delta_y: geometry.delta_y,
            delta_z: geometry.delta_z,
            ledger: ResultsLedger::new(),
            initialized: false,
        })
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn ledger(&self) -> &ResultsLedger {
        &self.ledger
    }

    pub fn parameters(&self) -> &SectionParameters {
        &self.parameters
    }

    /// One equilibrium pass at the reference loading, then the steady state
    /// of every element. Establishes each element's baseline strain energy
    /// density and writes the interval-0 ledger rows.
    ///
    /// A steady-state failure is fatal for the run and attributed to the
    /// failing element.
    pub fn initialize(&mut self) -> Result<()> {
        self.update_stiffness()?;
        let decomposition = self.solve_equilibrium(None)?;
        self.distribute_stress(&decomposition);

        let mut records = Vec::with_capacity(self.elements.len());
        for (index, element) in self.elements.iter_mut().enumerate() {
            let porosity = element.porosity();
            element
                .model
                .set_reference_stress(element.axial_stress * PA_TO_GPA, 0.0, 0.0);
            let steady = *element
                .model
                .solve_steady_state(porosity)
                .map_err(|error| error.with_attribution(index, None))?;
            element.state = steady.initial_state(porosity);
            records.push(record_of(element));
        }
        self.ledger.push_interval(0.0, records);
        self.initialized = true;
        Ok(())
    }

    /// Run the full simulation loop and return the ledger.
    pub fn run(&mut self) -> Result<&ResultsLedger> {
        if !self.initialized {
            self.initialize()?;
        }

        let interval_length = self.parameters.mechanics_update_interval;
        let number_of_intervals =
            (self.parameters.duration_years * DAYS_PER_YEAR / interval_length).floor() as usize;

        let mut t_start = 0.0;
        for interval in 0..number_of_intervals {
            let t_end = t_start + interval_length;
            log::info!(
                "interval {}/{}: {} to {} days",
                interval + 1,
                number_of_intervals,
                t_start,
                t_end
            );

            self.advance_local_models(t_start, t_end, interval);
            self.update_stiffness()?;
            let decomposition = self.solve_equilibrium(Some(t_end))?;
            self.distribute_stress(&decomposition);

            t_start = t_end;
        }
        Ok(&self.ledger)
    }

    /// Refresh every element's effective axial stiffness from its current
    /// bone volume fraction.
    pub fn update_stiffness(&mut self) -> Result<()> {
        let update = |element: &mut Element| -> Result<()> {
            let axial = element
                .model
                .homogenizer()
                .axial_stiffness(element.bone_volume_fraction.clamp(0.0, 1.0))?;
            element.axial_stiffness = axial * GPA_TO_PA;
            Ok(())
        };

        #[cfg(feature = "parallel")]
        {
            self.elements.par_iter_mut().try_for_each(update)
        }
        #[cfg(not(feature = "parallel"))]
        {
            self.elements.iter_mut().try_for_each(update)
        }
    }

    /// Solve the 3×3 beam equilibrium relating {axial force, bending
    /// moments} to {axial strain, curvatures} over the current stiffness
    /// distribution.
    ///
    /// `t = None` is the reference pass (never reduced); inside the
    /// load-case window the force and moments are scaled by the case's
    /// reduction factors.
    pub fn solve_equilibrium(&self, t: Option<f64>) -> Result<StrainDecomposition> {
        let stiffness_sum: f64 = self.elements.iter().map(|e| e.axial_stiffness).sum();
        if !(stiffness_sum.abs() > f64::MIN_POSITIVE) {
            return Err(Error::NumericalDegeneracy(
                "total axial stiffness of the cross-section is zero".to_string(),
            ));
        }

        let centroid_y = self
            .elements
            .iter()
            .map(|e| e.position.0 * e.axial_stiffness)
            .sum::<f64>()
            / stiffness_sum;
        let centroid_z = self
            .elements
            .iter()
            .map(|e| e.position.1 * e.axial_stiffness)
            .sum::<f64>()
            / stiffness_sum;

        let cell_area = self.delta_y * self.delta_z;
        let axial_stiffness = stiffness_sum * cell_area;

        let mut second_moment_y = 0.0;
        let mut second_moment_z = 0.0;
        let mut second_moment_yz = 0.0;
        for element in &self.elements {
            let dy = element.position.0 - centroid_y;
            let dz = element.position.1 - centroid_z;
            second_moment_y += element.axial_stiffness * dz * dz * cell_area;
            second_moment_z += element.axial_stiffness * dy * dy * cell_area;
            second_moment_yz += element.axial_stiffness * dy * dz * cell_area;
        }

        let (axial_force, moment_y, moment_z) = if self.load_case.reductions_active(t) {
            (
                self.load_case.force_reduction * self.parameters.axial_force,
                self.load_case.moment_reduction * self.parameters.bending_moment_y,
                self.load_case.moment_reduction * self.parameters.bending_moment_z,
            )
        } else {
            (
                self.parameters.axial_force,
                self.parameters.bending_moment_y,
                self.parameters.bending_moment_z,
            )
        };

        // Moment-of-area matrix in block form: the axial equation decouples,
        // the bending pair shares the product moment. Closed-form inversion,
        // with singularity detected instead of letting NaNs through.
        let axial_strain = axial_force / axial_stiffness;

        let bending_determinant =
            second_moment_y * second_moment_z - second_moment_yz * second_moment_yz;
        let bending_scale = (second_moment_y * second_moment_z)
            .abs()
            .max(second_moment_yz * second_moment_yz);
        if bending_determinant.abs() <= bending_scale.max(f64::MIN_POSITIVE) * 1.0e-12 {
            return Err(Error::NumericalDegeneracy(format!(
                "moment-of-area matrix is singular (Iyy {second_moment_y:.3e}, Izz {second_moment_z:.3e}, Iyz {second_moment_yz:.3e})"
            )));
        }
        let curvature_z =
            (moment_y * second_moment_z + moment_z * second_moment_yz) / bending_determinant;
        let curvature_y =
            (moment_z * second_moment_y + moment_y * second_moment_yz) / bending_determinant;

        Ok(StrainDecomposition {
            axial_strain,
            curvature_y,
            curvature_z,
            centroid_y,
            centroid_z,
        })
    }

    /// Classical beam superposition about the stiffness-weighted centroid:
    /// `σ = k · (ε − κ_y (y − y_c) + κ_z (z − z_c))`.
    pub fn distribute_stress(&mut self, decomposition: &StrainDecomposition) {
        for element in &mut self.elements {
            let (y, z) = element.position;
            let strain = decomposition.axial_strain
                - decomposition.curvature_y * (y - decomposition.centroid_y)
                + decomposition.curvature_z * (z - decomposition.centroid_z);
            element.axial_stress = element.axial_stiffness * strain;
        }
    }

    /// Advance every element's local model over `[t_start, t_end]` and
    /// record the interval rows.
    ///
    /// A failing element is logged, flagged and frozen at its last good
    /// state; it keeps a finite stiffness contribution, so one bad element
    /// never poisons the next centroid/second-moment reduction.
    fn advance_local_models(&mut self, t_start: f64, t_end: f64, interval: usize) {
        let advance = |(index, element): (usize, &mut Element)| -> ElementRecord {
            if element.failed {
                return record_of(element);
            }

            element
                .model
                .set_active_stress(element.axial_stress * PA_TO_GPA, 0.0, 0.0);
            // One explicit mechanical-effects refresh against the new stress
            // before the integrator takes over.
            element
                .model
                .apply_mechanical_effects(&element.state, Some(t_start));

            let porosity = element.porosity().clamp(0.0, 1.0);
            match element
                .model
                .integrate_transient((t_start, t_end), porosity, Some(element.state))
            {
                Ok(trajectory) => {
                    let state = CellState::from_vector(trajectory.final_state());
                    element.state = state;
                    element.bone_volume_fraction = state.bone_volume_fraction;
                }
                Err(error) => {
                    log::warn!(
                        "element {index} frozen after failed transient in interval {interval}: {error}"
                    );
                    element.failed = true;
                }
            }
            record_of(element)
        };

        #[cfg(feature = "parallel")]
        let records: Vec<ElementRecord> = self
            .elements
            .par_iter_mut()
            .enumerate()
            .map(advance)
            .collect();
        #[cfg(not(feature = "parallel"))]
        let records: Vec<ElementRecord> =
            self.elements.iter_mut().enumerate().map(advance).collect();

        self.ledger.push_interval(t_end, records);
    }
}

/// Ledger row from the element's current state and diagnostics.
fn record_of(element: &Element) -> ElementRecord {
    let mechanics = element.model.mechanics();
    ElementRecord {
        ob_p: element.state.ob_p,
        ob_a: element.state.ob_a,
        oc_p: element.state.oc_p,
        oc_a: element.state.oc_a,
        porosity: element.state.vascular_pore_fraction,
        bone_volume_fraction: element.state.bone_volume_fraction,
        strain_energy_density: mechanics.strain_energy_density,
        mechanotransduction_effect: mechanics.strain_effect,
        axial_stress: element.axial_stress,
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform_section(n: usize, bvf: f64) -> CrossSectionModel {
        let geometry = SectionGeometry::uniform_grid(n, n, 0.8, bvf).unwrap();
        CrossSectionModel::new(geometry, LoadCase::habitual(), SectionParameters::default())
            .unwrap()
    }

    #[test]
    fn test_empty_geometry_rejected() {
        let geometry = SectionGeometry::from_sites_mm(vec![], (0.8, 0.8)).unwrap();
        let result = CrossSectionModel::new(
            geometry,
            LoadCase::habitual(),
            SectionParameters::default(),
        );
        assert!(matches!(result, Err(Error::InvalidConfiguration(_))));
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let geometry = SectionGeometry::uniform_grid(2, 2, 0.8, 0.9).unwrap();
        let parameters = SectionParameters {
            duration_years: 0.0,
            ..SectionParameters::default()
        };
        assert!(CrossSectionModel::new(geometry, LoadCase::habitual(), parameters).is_err());
    }

    #[test]
    fn test_update_stiffness_converts_to_pascal() {
        let mut section = uniform_section(2, 0.95);
        section.update_stiffness().unwrap();
        for element in section.elements() {
            // Dense cortical bone: tens of GPa in Pa units.
            assert!(element.axial_stiffness > 1.0e10);
            assert!(element.axial_stiffness < 1.0e11);
        }
    }

    #[test]
    fn test_equilibrium_without_stiffness_is_degenerate() {
        let section = uniform_section(2, 0.95);
        // update_stiffness has not run: all stiffnesses are zero.
        let result = section.solve_equilibrium(None);
        assert!(matches!(result, Err(Error::NumericalDegeneracy(_))));
    }

    #[test]
    fn test_centroid_of_uniform_grid_is_origin() {
        let mut section = uniform_section(3, 0.95);
        section.update_stiffness().unwrap();
        let decomposition = section.solve_equilibrium(None).unwrap();
        assert!(decomposition.centroid_y.abs() < 1e-12);
        assert!(decomposition.centroid_z.abs() < 1e-12);
    }

    #[test]
    fn test_single_row_section_is_singular_in_bending() {
        // All elements on one line: the product/second moments lose rank.
        let sites = vec![(-0.8, 0.0, 0.9), (0.0, 0.0, 0.9), (0.8, 0.0, 0.9)];
        let geometry = SectionGeometry::from_sites_mm(sites, (0.8, 0.8)).unwrap();
        let mut section = CrossSectionModel::new(
            geometry,
            LoadCase::habitual(),
            SectionParameters::default(),
        )
        .unwrap();
        section.update_stiffness().unwrap();
        let result = section.solve_equilibrium(None);
        assert!(matches!(result, Err(Error::NumericalDegeneracy(_))));
    }
}
