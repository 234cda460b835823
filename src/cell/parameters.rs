//! Model parameters
//!
//! The published constants of the porosity-coupled bone-cell population
//! model, grouped the way they enter the equations. All rates are per day,
//! concentrations in pM, stiffness-related constants in GPa.

/// Differentiation rates of the cell types \[1/day\].
#[derive(Debug, Clone, Copy)]
pub struct DifferentiationRates {
    /// Uncommitted osteoblast progenitors.
    pub ob_u: f64,
    /// Precursor osteoblasts.
    pub ob_p: f64,
    /// Precursor osteoclasts.
    pub oc_p: f64,
    /// Uncommitted osteoclast progenitors.
    pub oc_u: f64,
}

impl Default for DifferentiationRates {
    fn default() -> Self {
        Self {
            ob_u: 0.7,
            ob_p: 0.165696312976030,
            oc_p: 2.1,
            oc_u: 0.42,
        }
    }
}

/// Apoptosis rates of the active cell types \[1/day\].
#[derive(Debug, Clone, Copy)]
pub struct ApoptosisRates {
    pub ob_a: f64,
    pub oc_a: f64,
}

impl Default for ApoptosisRates {
    fn default() -> Self {
        Self {
            ob_a: 0.211072625806496,
            oc_a: 5.64874468409633,
        }
    }
}

/// Proliferation rates \[1/day\]. Only precursor osteoblasts proliferate;
/// the mechanical feedback scales this baseline.
#[derive(Debug, Clone, Copy)]
pub struct ProliferationRates {
    pub ob_p: f64,
}

impl Default for ProliferationRates {
    fn default() -> Self {
        Self { ob_p: 3.5e-3 }
    }
}

/// Activation coefficients of the receptor–ligand bindings \[pM\].
#[derive(Debug, Clone, Copy)]
pub struct ActivationCoefficients {
    /// TGF-β binding on uncommitted osteoblasts.
    pub tgfb_ob_u: f64,
    /// TGF-β binding on active osteoclasts.
    pub tgfb_oc_a: f64,
    /// PTH binding to osteoblasts (activation).
    pub pth_ob: f64,
    /// RANKL binding on RANK.
    pub rankl_rank: f64,
    /// MCSF binding on uncommitted osteoclasts.
    pub mcsf_oc_u: f64,
}

impl Default for ActivationCoefficients {
    fn default() -> Self {
        Self {
            tgfb_ob_u: 0.000563278809675429,
            tgfb_oc_a: 0.000563278809675429,
            pth_ob: 150.0,
            rankl_rank: 16.65,
            mcsf_oc_u: 0.001,
        }
    }
}

/// Repression coefficients of the receptor–ligand bindings \[pM\].
#[derive(Debug, Clone, Copy)]
pub struct RepressionCoefficients {
    /// TGF-β binding on precursor osteoblasts.
    pub tgfb_ob_p: f64,
    /// PTH binding on osteoblasts (repression of OPG production).
    pub pth_ob: f64,
}

impl Default for RepressionCoefficients {
    fn default() -> Self {
        Self {
            tgfb_ob_p: 0.00189,
            pth_ob: 0.222581427709954,
        }
    }
}

/// Degradation rates of the signaling factors \[1/day\].
#[derive(Debug, Clone, Copy)]
pub struct DegradationRates {
    pub pth: f64,
    pub opg: f64,
    pub rankl: f64,
    pub tgfb: f64,
}

impl Default for DegradationRates {
    fn default() -> Self {
        Self {
            pth: 86.0,
            opg: 3.50e-1,
            rankl: 1.0132471014805027e1,
            tgfb: 2.0,
        }
    }
}

/// Fixed concentrations \[pM\].
#[derive(Debug, Clone, Copy)]
pub struct Concentrations {
    /// OPG saturation level.
    pub opg_max: f64,
    pub mcsf: f64,
    pub rank: f64,
}

impl Default for Concentrations {
    fn default() -> Self {
        Self {
            opg_max: 2.00e8,
            mcsf: 0.001,
            rank: 1.00e1,
        }
    }
}

/// Association binding constants \[1/(pM·day)\].
#[derive(Debug, Clone, Copy)]
pub struct BindingConstants {
    pub rankl_opg: f64,
    pub rankl_rank: f64,
}

impl Default for BindingConstants {
    fn default() -> Self {
        Self {
            rankl_opg: 1.00e-3,
            rankl_rank: 3.411764705882353e-2,
        }
    }
}

/// Intrinsic production rates and producer assignments.
#[derive(Debug, Clone, Copy)]
pub struct ProductionRates {
    /// Systemic PTH production \[pM/day\].
    pub intrinsic_pth: f64,
    /// Intrinsic RANKL production \[pM/day\].
    pub intrinsic_rankl: f64,
    /// Minimal OPG production per cell \[pM\].
    pub min_opg_per_cell: f64,
    /// Maximum RANKL carried per cell \[pM/pM\].
    pub max_rankl_per_cell: f64,
    /// Which osteoblast populations express OPG.
    pub ob_p_produces_opg: bool,
    pub ob_a_produces_opg: bool,
    /// Which osteoblast populations express RANKL.
    pub ob_p_produces_rankl: bool,
    pub ob_a_produces_rankl: bool,
}

impl Default for ProductionRates {
    fn default() -> Self {
        Self {
            intrinsic_pth: 2.907,
            intrinsic_rankl: 1.684195714712206e5,
            min_opg_per_cell: 1.624900337835679e8,
            max_rankl_per_cell: 27e5,
            ob_p_produces_opg: false,
            ob_a_produces_opg: true,
            ob_p_produces_rankl: true,
            ob_a_produces_rankl: false,
        }
    }
}

/// Bone volume turnover rates.
#[derive(Debug, Clone, Copy)]
pub struct BoneVolumeRates {
    /// Matrix formation per active osteoblast \[1/day\].
    pub formation_rate: f64,
    /// Matrix resorption per active osteoclast \[1/day\].
    pub resorption_rate: f64,
    /// TGF-β content stored per unit of resorbed bone volume \[pM\].
    pub stored_tgfb_content: f64,
}

impl Default for BoneVolumeRates {
    fn default() -> Self {
        Self {
            formation_rate: 40.0,
            resorption_rate: 200.0,
            stored_tgfb_content: 0.01,
        }
    }
}

/// Mechanotransduction constants.
#[derive(Debug, Clone, Copy)]
pub struct MechanicsParameters {
    /// Strength of the strain effect on osteoblast proliferation; the
    /// piecewise ramp saturates at a deviation of `1 / transduction_strength`.
    pub transduction_strength: f64,
    /// Strength of the disuse effect on RANKL production \[pM/day\].
    pub transduction_strength_rankl: f64,
    /// Regularization added to the reference strain energy density in the
    /// deviation denominator \[GPa\].
    pub correction_factor: f64,
}

impl Default for MechanicsParameters {
    fn default() -> Self {
        Self {
            transduction_strength: 0.5,
            transduction_strength_rankl: 18.0,
            correction_factor: 1.0e-6,
        }
    }
}

/// Calibration constants identified against turnover data.
#[derive(Debug, Clone, Copy)]
pub struct Calibration {
    /// Scale from specific surface to turnover rate.
    pub turnover: f64,
    /// Calibration coefficient for active osteoclast activity.
    pub oc_a: f64,
    /// Calibration coefficient for active osteoblast activity.
    pub ob_a: f64,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            turnover: 5.961e-3,
            oc_a: 0.09,
            ob_a: 1.132,
        }
    }
}

/// Complete parameter set of the cell population model.
#[derive(Debug, Clone, Copy, Default)]
pub struct Parameters {
    pub differentiation: DifferentiationRates,
    pub apoptosis: ApoptosisRates,
    pub proliferation: ProliferationRates,
    pub activation: ActivationCoefficients,
    pub repression: RepressionCoefficients,
    pub degradation: DegradationRates,
    pub concentration: Concentrations,
    pub binding: BindingConstants,
    pub production: ProductionRates,
    pub bone_volume: BoneVolumeRates,
    pub mechanics: MechanicsParameters,
    pub calibration: Calibration,
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_positive() {
        let p = Parameters::default();
        assert!(p.differentiation.ob_u > 0.0);
        assert!(p.apoptosis.oc_a > 0.0);
        assert!(p.bone_volume.resorption_rate > p.bone_volume.formation_rate);
        assert!(p.mechanics.transduction_strength > 0.0);
    }

    #[test]
    fn test_rankl_expressed_on_precursors_only() {
        let p = Parameters::default();
        assert!(p.production.ob_p_produces_rankl);
        assert!(!p.production.ob_a_produces_rankl);
        // OPG mirrors it: active osteoblasts express OPG, precursors do not.
        assert!(p.production.ob_a_produces_opg);
        assert!(!p.production.ob_p_produces_opg);
    }
}
