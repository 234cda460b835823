//! Element arena records
//!
//! Each element owns its cell model by value; the arena is a plain indexable
//! vector and the element index is the only cross-reference used anywhere.

use crate::cell::{CellPopulationModel, CellState};

/// One representative volume element of the cross-section.
#[derive(Debug)]
pub struct Element {
    /// Position (y, z) \[m\], fixed at initialization.
    pub position: (f64, f64),
    /// Current bone volume fraction; written back once per interval.
    pub bone_volume_fraction: f64,
    /// Current axial stress \[Pa\].
    pub axial_stress: f64,
    /// Current effective axial stiffness \[Pa\].
    pub axial_stiffness: f64,
    /// Local transient state, the initial condition of the next interval.
    pub state: CellState,
    /// Set when a transient integration failed; the element is frozen from
    /// then on but keeps contributing its last good state to the mechanics.
    pub failed: bool,
    /// The local cell population model.
    pub model: CellPopulationModel,
}

impl Element {
    pub fn new(position: (f64, f64), bone_volume_fraction: f64, model: CellPopulationModel) -> Self {
        let porosity = 1.0 - bone_volume_fraction;
        Self {
            position,
            bone_volume_fraction,
            axial_stress: 0.0,
            axial_stiffness: 0.0,
            state: CellState {
                ob_p: 0.0,
                ob_a: 0.0,
                oc_p: 0.0,
                oc_a: 0.0,
                vascular_pore_fraction: porosity,
                bone_volume_fraction,
            },
            failed: false,
            model,
        }
    }

    /// Current porosity (complement of the bone volume fraction).
    pub fn porosity(&self) -> f64 {
        1.0 - self.bone_volume_fraction
    }
}
