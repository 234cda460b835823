//! Common utilities for integration tests

use osteo_rs::load::LoadCase;
use osteo_rs::section::{CrossSectionModel, SectionGeometry, SectionParameters};

/// Relative error with an absolute floor for near-zero references.
pub fn relative_error(actual: f64, expected: f64) -> f64 {
    (actual - expected).abs() / expected.abs().max(1e-300)
}

pub fn assert_close(actual: f64, expected: f64, tolerance: f64, label: &str) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "{label}: {actual} vs {expected} (tolerance {tolerance})"
    );
}

/// Uniform n×n cross-section with identical elements.
pub fn uniform_section(
    n: usize,
    bone_volume_fraction: f64,
    load_case: LoadCase,
    parameters: SectionParameters,
) -> CrossSectionModel {
    let geometry = SectionGeometry::uniform_grid(n, n, 0.8, bone_volume_fraction)
        .expect("valid uniform grid");
    CrossSectionModel::new(geometry, load_case, parameters).expect("valid cross-section")
}

/// Axial stresses of all elements, in element order.
pub fn element_stresses(section: &CrossSectionModel) -> Vec<f64> {
    section.elements().iter().map(|e| e.axial_stress).collect()
}
