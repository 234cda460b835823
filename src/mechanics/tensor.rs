//! Voigt-notation tensor utilities and phase elastic constants
//!
//! Fourth-order elasticity tensors are carried as 6×6 matrices in engineering
//! Voigt notation with the component order
//! `[11, 22, 33, 23, 13, 12]`. Stiffness entries map one-to-one
//! (`C[I][J] = C_ijkl`); compliance-like tensors (the Hill tensor) pick up
//! the usual factor of 2 on shear columns so that matrix products compose
//! correctly with stiffness matrices.

use nalgebra::{Matrix3, Matrix6, Vector6};

/// Voigt index pairs in the order `[11, 22, 33, 23, 13, 12]`.
pub const VOIGT_PAIRS: [(usize, usize); 6] = [(0, 0), (1, 1), (2, 2), (1, 2), (0, 2), (0, 1)];

/// Map a symmetric index pair (i, j) to its Voigt slot.
pub fn voigt_index(i: usize, j: usize) -> usize {
    match (i, j) {
        (0, 0) => 0,
        (1, 1) => 1,
        (2, 2) => 2,
        (1, 2) | (2, 1) => 3,
        (0, 2) | (2, 0) => 4,
        (0, 1) | (1, 0) => 5,
        _ => unreachable!("tensor indices must be < 3"),
    }
}

/// Full-index component of a stiffness matrix in Voigt notation.
#[inline]
pub fn stiffness_component(c: &Matrix6<f64>, i: usize, j: usize, k: usize, l: usize) -> f64 {
    c[(voigt_index(i, j), voigt_index(k, l))]
}

/// 6×6 identity.
pub fn unit() -> Matrix6<f64> {
    Matrix6::identity()
}

/// Volumetric part of the fourth-order unit tensor, `J = (1/3) 1 ⊗ 1`.
pub fn volumetric() -> Matrix6<f64> {
    let mut j = Matrix6::zeros();
    for row in 0..3 {
        for col in 0..3 {
            j[(row, col)] = 1.0 / 3.0;
        }
    }
    j
}

/// Deviatoric part of the fourth-order unit tensor, `K = I − J`.
pub fn deviatoric() -> Matrix6<f64> {
    unit() - volumetric()
}

/// Transversely isotropic bone-matrix stiffness \[GPa\].
///
/// The longitudinal (osteonal) axis is direction 3; the 33-component is the
/// one the beam model reads back after homogenization.
pub fn bone_matrix_stiffness() -> Matrix6<f64> {
    Matrix6::from_row_slice(&[
        18.5, 10.3, 10.4, 0.0, 0.0, 0.0, //
        10.3, 20.8, 11.0, 0.0, 0.0, 0.0, //
        10.4, 11.0, 28.4, 0.0, 0.0, 0.0, //
        0.0, 0.0, 0.0, 12.9, 0.0, 0.0, //
        0.0, 0.0, 0.0, 0.0, 11.5, 0.0, //
        0.0, 0.0, 0.0, 0.0, 0.0, 9.3,
    ])
}

/// Vascular-pore stiffness \[GPa\]: water, `3 k J + 2 g K` with zero shear
/// modulus.
pub fn pore_stiffness() -> Matrix6<f64> {
    const BULK_MODULUS_WATER: f64 = 2.3;
    const SHEAR_MODULUS_WATER: f64 = 0.0;
    volumetric() * (3.0 * BULK_MODULUS_WATER) + deviatoric() * (2.0 * SHEAR_MODULUS_WATER)
}

/// Assemble the macroscopic stress tensor from the beam-theory components.
///
/// The axial (beam-longitudinal) stress occupies the 33 slot; the two shear
/// components fill the symmetric 13/23 pairs. Units are whatever the caller
/// supplies — the cell model passes GPa.
pub fn stress_tensor(axial: f64, shear_xy: f64, shear_xz: f64) -> Matrix3<f64> {
    let mut sigma = Matrix3::zeros();
    sigma[(2, 2)] = axial;
    sigma[(0, 2)] = shear_xz;
    sigma[(2, 0)] = shear_xz;
    sigma[(1, 2)] = shear_xy;
    sigma[(2, 1)] = shear_xy;
    sigma
}

/// Symmetric 3×3 stress tensor to its Voigt vector `[σ11 σ22 σ33 σ23 σ13 σ12]`.
pub fn to_voigt(sigma: &Matrix3<f64>) -> Vector6<f64> {
    Vector6::new(
        sigma[(0, 0)],
        sigma[(1, 1)],
        sigma[(2, 2)],
        sigma[(1, 2)],
        sigma[(0, 2)],
        sigma[(0, 1)],
    )
}

// =================================================================================================
// Tests
// =================================================================================================
