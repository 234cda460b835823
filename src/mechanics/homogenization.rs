//! Two-phase Mori–Tanaka homogenization of the representative volume element
//!
//! The RVE is modeled as cylindrical vascular pores (water) embedded in an
//! anisotropic bone-matrix host. The scheme is:
//!
//! 1. Hill interaction tensor `P` for a cylindrical inclusion aligned with
//!    the bone axis, by fixed-step numerical integration over the in-plane
//!    directions (Laws' formula). `P` depends only on the fixed matrix
//!    stiffness, so it is computed once at construction and cached.
//! 2. Dilute strain concentration of the pore phase,
//!    `A∞_vas = [I + P (c_vas − c_bm)]⁻¹`, then the volume-fraction
//!    normalized pair `(A_bm, A_vas)`.
//! 3. Macroscopic stiffness `C = f_bm c_bm A_bm + f_vas c_vas A_vas`.
//!
//! At 100 % bone volume fraction the scheme collapses exactly to the matrix
//! stiffness, at 0 % to the pore stiffness — both limits are tested.
//!
//! All stiffnesses are in GPa; the strain energy density is GPa-valued
//! (1 GPa ≙ 10⁹ J/m³).

use nalgebra::{Matrix3, Matrix6, Vector6};

use crate::error::{Error, Result};
use crate::mechanics::tensor;

/// Angular step for the Hill-tensor integration.
const HILL_INTEGRATION_STEP: f64 = 2.0 * std::f64::consts::PI / 50.0;

/// Two-phase (bone matrix + vascular pore) micromechanical homogenizer.
#[derive(Debug, Clone)]
pub struct Homogenizer {
    bone_matrix: Matrix6<f64>,
    pore: Matrix6<f64>,
    /// Hill tensor of the cylindrical pore inclusion in the matrix host.
    /// Depends only on the fixed matrix stiffness; cached at construction.
    hill: Matrix6<f64>,
}

impl Default for Homogenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Homogenizer {
    pub fn new() -> Self {
        let bone_matrix = tensor::bone_matrix_stiffness();
        let pore = tensor::pore_stiffness();
        let hill = hill_tensor_cylindrical(&bone_matrix, HILL_INTEGRATION_STEP);
        Self {
            bone_matrix,
            pore,
            hill,
        }
    }

    /// Cached Hill interaction tensor \[GPa⁻¹\].
    pub fn hill_tensor(&self) -> &Matrix6<f64> {
        &self.hill
    }

    /// Strain concentration tensors `(A_bm, A_vas)` for the given bone
    /// volume fraction (fraction of the RVE occupied by matrix, in [0, 1]).
    pub fn strain_concentration_tensors(
        &self,
        bone_volume_fraction: f64,
    ) -> Result<(Matrix6<f64>, Matrix6<f64>)> {
        let f_bm = bone_volume_fraction;
        let f_vas = 1.0 - bone_volume_fraction;

        let delta = self.pore - self.bone_matrix;
        let dilute_vas = (tensor::unit() + self.hill * delta).try_inverse().ok_or_else(|| {
            Error::NumericalDegeneracy(
                "dilute strain concentration tensor is singular".to_string(),
            )
        })?;

        // Volume average over both phases; the matrix phase concentrates
        // dilutely as the identity.
        let average = tensor::unit() * f_bm + dilute_vas * f_vas;
        let average_inv = average.try_inverse().ok_or_else(|| {
            Error::NumericalDegeneracy(format!(
                "phase-average concentration tensor is singular at bone volume fraction {bone_volume_fraction}"
            ))
        })?;

        Ok((average_inv, dilute_vas * average_inv))
    }

    /// Macroscopic stiffness tensor from the concentration tensors and the
    /// phase volume fractions \[GPa\].
    pub fn macroscopic_stiffness_tensor(
        &self,
        a_bm: &Matrix6<f64>,
        a_vas: &Matrix6<f64>,
        pore_fraction: f64,
        matrix_fraction: f64,
    ) -> Matrix6<f64> {
        self.bone_matrix * a_bm * matrix_fraction + self.pore * a_vas * pore_fraction
    }

    /// Homogenized stiffness at the given bone volume fraction \[GPa\].
    pub fn stiffness(&self, bone_volume_fraction: f64) -> Result<Matrix6<f64>> {
        let (a_bm, a_vas) = self.strain_concentration_tensors(bone_volume_fraction)?;
        Ok(self.macroscopic_stiffness_tensor(
            &a_bm,
            &a_vas,
            1.0 - bone_volume_fraction,
            bone_volume_fraction,
        ))
    }

    /// Axial (33) component of the homogenized stiffness \[GPa\].
    pub fn axial_stiffness(&self, bone_volume_fraction: f64) -> Result<f64> {
        Ok(self.stiffness(bone_volume_fraction)?[(2, 2)])
    }

    /// Strain energy density `½ εᵀCε` for the given macroscopic stress
    /// state and bone volume fraction \[GPa\]. Pure function.
    pub fn strain_energy_density(
        &self,
        stress: &Matrix3<f64>,
        bone_volume_fraction: f64,
    ) -> Result<f64> {
        let stiffness = self.stiffness(bone_volume_fraction)?;
        let compliance = stiffness.try_inverse().ok_or_else(|| {
            Error::NumericalDegeneracy(format!(
                "homogenized stiffness is singular at bone volume fraction {bone_volume_fraction}"
            ))
        })?;
        let sigma: Vector6<f64> = tensor::to_voigt(stress);
        let strain = compliance * sigma;
        Ok(0.5 * strain.dot(&(stiffness * strain)))
    }
}

/// Hill interaction tensor for a cylindrical inclusion whose axis is the
/// 3-direction of the host, by fixed-step integration over the in-plane
/// normal directions.
///
/// For each direction `n(φ) = (cos φ, sin φ, 0)` the integrand is the
/// symmetrized dyadic of the inverse acoustic tensor
/// `K_ik(n) = n_j C⁰_ijkl n_l`:
///
/// ```text
/// M_ijkl(n) = ¼ (K⁻¹_ik n_j n_l + K⁻¹_jk n_i n_l + K⁻¹_il n_j n_k + K⁻¹_jl n_i n_k)
/// ```
///
/// and `P = ⟨M⟩_φ`. The result is assembled in engineering Voigt notation
/// (compliance-type shear scaling).
fn hill_tensor_cylindrical(host_stiffness: &Matrix6<f64>, step: f64) -> Matrix6<f64> {
    let steps = (2.0 * std::f64::consts::PI / step).round() as usize;
    let mut p = [[[[0.0_f64; 3]; 3]; 3]; 3];

    for n_step in 0..steps {
        let phi = step * n_step as f64;
        let n = [phi.cos(), phi.sin(), 0.0];

        // Acoustic tensor of the host along n.
        let mut acoustic = Matrix3::zeros();
        for i in 0..3 {
            for k in 0..3 {
                let mut sum = 0.0;
                for j in 0..3 {
                    for l in 0..3 {
                        sum += n[j] * tensor::stiffness_component(host_stiffness, i, j, k, l) * n[l];
                    }
                }
                acoustic[(i, k)] = sum;
            }
        }
        // The bone-matrix acoustic tensor is positive definite for every
        // in-plane direction; the fixed constants guarantee invertibility.
        let acoustic_inv = acoustic
            .try_inverse()
            .expect("acoustic tensor of the bone matrix is positive definite");

        for i in 0..3 {
            for j in 0..3 {
                for k in 0..3 {
                    for l in 0..3 {
                        p[i][j][k][l] += 0.25
                            * (acoustic_inv[(i, k)] * n[j] * n[l]
                                + acoustic_inv[(j, k)] * n[i] * n[l]
                                + acoustic_inv[(i, l)] * n[j] * n[k]
                                + acoustic_inv[(j, l)] * n[i] * n[k])
                            / steps as f64;
                    }
                }
            }
        }
    }

    // Assemble the Voigt matrix. P is compliance-like: shear columns carry
    // the engineering factor 2 so that P·C products compose in Voigt space.
    let mut p_voigt = Matrix6::zeros();
    for (row, &(i, j)) in tensor::VOIGT_PAIRS.iter().enumerate() {
        for (col, &(k, l)) in tensor::VOIGT_PAIRS.iter().enumerate() {
            let shear_factor = if col >= 3 { 2.0 } else { 1.0 };
            p_voigt[(row, col)] = shear_factor * p[i][j][k][l];
        }
    }
    p_voigt
}

// =================================================================================================
// Tests
// =================================================================================================
