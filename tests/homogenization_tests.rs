//! Self-consistency of the micromechanical homogenization

mod common;

use nalgebra::Matrix6;
use osteo_rs::mechanics::tensor::{bone_matrix_stiffness, pore_stiffness, stress_tensor};
use osteo_rs::mechanics::Homogenizer;

#[test]
fn full_bone_recovers_matrix_stiffness() {
    let homogenizer = Homogenizer::new();
    let (a_bm, a_vas) = homogenizer.strain_concentration_tensors(1.0).unwrap();
    let stiffness = homogenizer.macroscopic_stiffness_tensor(&a_bm, &a_vas, 0.0, 1.0);
    assert!((stiffness - bone_matrix_stiffness()).norm() < 1e-10);
}

#[test]
fn zero_bone_recovers_pore_stiffness() {
    let homogenizer = Homogenizer::new();
    let (a_bm, a_vas) = homogenizer.strain_concentration_tensors(0.0).unwrap();
    let stiffness = homogenizer.macroscopic_stiffness_tensor(&a_bm, &a_vas, 1.0, 0.0);
    assert!((stiffness - pore_stiffness()).norm() < 1e-10);
}

#[test]
fn concentration_tensors_average_to_identity() {
    // Volume-weighted average of the strain concentration tensors is the
    // fourth-order identity — the defining property of the scheme.
    let homogenizer = Homogenizer::new();
    for bvf in [0.05, 0.3, 0.6, 0.95] {
        let (a_bm, a_vas) = homogenizer.strain_concentration_tensors(bvf).unwrap();
        let average = a_bm * bvf + a_vas * (1.0 - bvf);
        assert!(
            (average - Matrix6::identity()).norm() < 1e-10,
            "average concentration off identity at bvf {bvf}"
        );
    }
}

#[test]
fn axial_stiffness_interpolates_between_phases() {
    let homogenizer = Homogenizer::new();
    let pore = pore_stiffness()[(2, 2)];
    let matrix = bone_matrix_stiffness()[(2, 2)];
    for bvf in [0.1, 0.5, 0.9] {
        let axial = homogenizer.axial_stiffness(bvf).unwrap();
        assert!(
            axial > pore && axial < matrix,
            "axial stiffness {axial} outside phase bracket at bvf {bvf}"
        );
    }
}

#[test]
fn hill_tensor_is_shared_across_evaluations() {
    // The Hill tensor depends only on the fixed matrix constants: one
    // instance must hand out the identical cached tensor every time.
    let homogenizer = Homogenizer::new();
    let first = *homogenizer.hill_tensor();
    homogenizer.strain_concentration_tensors(0.3).unwrap();
    homogenizer.strain_concentration_tensors(0.9).unwrap();
    assert_eq!(first, *homogenizer.hill_tensor());

    // And a fresh instance reproduces it exactly (deterministic quadrature).
    let other = Homogenizer::new();
    assert_eq!(first, *other.hill_tensor());
}

#[test]
fn strain_energy_density_matches_manual_contraction() {
    let homogenizer = Homogenizer::new();
    let bvf = 0.8;
    let sigma = stress_tensor(-0.03, 0.0, 0.0);

    let psi = homogenizer.strain_energy_density(&sigma, bvf).unwrap();

    // ½ σᵀ C⁻¹ σ for a purely axial stress collapses to ½ σ₃₃ ε₃₃.
    let stiffness = homogenizer.stiffness(bvf).unwrap();
    let compliance = stiffness.try_inverse().unwrap();
    let expected = 0.5 * (-0.03) * (compliance[(2, 2)] * -0.03);

    assert!(common::relative_error(psi, expected) < 1e-12);
}
