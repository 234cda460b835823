//! Typed state records of the cell population model
//!
//! The transient state vector and the steady-state snapshot are explicit
//! structs; the solver-facing `SVector` layout is confined to the two
//! conversion functions here.

use nalgebra::SVector;

/// Transient state of one element's cell populations and volume fractions.
///
/// Uncommitted densities (OBu, OCu) are not part of the transient state:
/// they stay pinned at their steady-state values for a given porosity
/// regime. That is a modeling decision, not an omission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellState {
    /// Precursor osteoblast density \[pM\].
    pub ob_p: f64,
    /// Active osteoblast density \[pM\].
    pub ob_a: f64,
    /// Precursor osteoclast density \[pM\].
    pub oc_p: f64,
    /// Active osteoclast density \[pM\].
    pub oc_a: f64,
    /// Vascular pore volume fraction, in [0, 1].
    pub vascular_pore_fraction: f64,
    /// Bone volume fraction, in [0, 1].
    pub bone_volume_fraction: f64,
}

impl CellState {
    /// Solver-facing layout `[OBp, OBa, OCp, OCa, vpf, bvf]`.
    pub fn to_vector(self) -> SVector<f64, 6> {
        SVector::<f64, 6>::from_column_slice(&[
            self.ob_p,
            self.ob_a,
            self.oc_p,
            self.oc_a,
            self.vascular_pore_fraction,
            self.bone_volume_fraction,
        ])
    }

    pub fn from_vector(x: &SVector<f64, 6>) -> Self {
        Self {
            ob_p: x[0],
            ob_a: x[1],
            oc_p: x[2],
            oc_a: x[3],
            vascular_pore_fraction: x[4],
            bone_volume_fraction: x[5],
        }
    }
}

/// Steady-state snapshot of all six cell populations at one porosity.
///
/// Computed once per element: the active densities come straight from the
/// turnover rate, the remaining four from the nonlinear solve. Serves both
/// as the transient initial condition and as the baseline for the
/// mechanical feedback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteadyState {
    pub ob_u: f64,
    pub ob_p: f64,
    pub ob_a: f64,
    pub oc_u: f64,
    pub oc_p: f64,
    pub oc_a: f64,
}

impl SteadyState {
    /// Transient initial condition at the given porosity.
    pub fn initial_state(&self, porosity: f64) -> CellState {
        CellState {
            ob_p: self.ob_p,
            ob_a: self.ob_a,
            oc_p: self.oc_p,
            oc_a: self.oc_a,
            vascular_pore_fraction: porosity,
            bone_volume_fraction: 1.0 - porosity,
        }
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_round_trip() {
        let state = CellState {
            ob_p: 1.0e-4,
            ob_a: 2.0e-4,
            oc_p: 3.0e-4,
            oc_a: 4.0e-5,
            vascular_pore_fraction: 0.05,
            bone_volume_fraction: 0.95,
        };
        let round_tripped = CellState::from_vector(&state.to_vector());
        assert_eq!(state, round_tripped);
    }

    #[test]
    fn test_initial_state_from_steady_state() {
        let steady = SteadyState {
            ob_u: 1.0e-3,
            ob_p: 1.0e-4,
            ob_a: 2.0e-4,
            oc_u: 1.0e-3,
            oc_p: 3.0e-4,
            oc_a: 4.0e-5,
        };
        let state = steady.initial_state(0.3);
        assert_eq!(state.vascular_pore_fraction, 0.3);
        assert_eq!(state.bone_volume_fraction, 0.7);
        assert_eq!(state.ob_p, steady.ob_p);
        assert_eq!(state.oc_a, steady.oc_a);
    }
}
