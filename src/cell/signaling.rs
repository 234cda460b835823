//! Constitutive signaling strategy
//!
//! The model shell (steady-state solve, transient integration, mechanical
//! feedback slot) is fixed; what varies between published model generations
//! is the constitutive sub-formulas: how the TGF-β, RANKL/OPG and PTH
//! concentrations are formed and how the mechanical stimulus modulates
//! proliferation and RANKL production. Those formulas live behind the
//! [`SignalingModel`] trait and are injected into the shell — a new variant
//! is a new strategy struct, not a subclass.
//!
//! [`PorosityCoupledSignaling`] is the variant shipped here: TGF-β released
//! by resorption activity, RANKL expressed on precursor osteoblasts under
//! competitive OPG/RANK binding with PTH-regulated production, and a
//! three-regime piecewise mechanotransduction.

use crate::cell::parameters::Parameters;
use crate::load::LoadCase;

/// Read-only evaluation context handed to the strategy.
pub struct SignalingContext<'a> {
    pub parameters: &'a Parameters,
    pub load_case: &'a LoadCase,
    /// Mechanically induced RANKL production \[pM/day\], updated by the
    /// model shell from the current strain deviation.
    pub mechanical_rankl_production: f64,
}

/// Constitutive sub-formulas of one published model variant.
///
/// `t = None` means steady-state evaluation: injection terms vanish and the
/// mechanical stimulus is at baseline.
pub trait SignalingModel: Send + Sync {
    /// TGF-β concentration from resorption activity \[pM\].
    fn tgfb_concentration(&self, ctx: &SignalingContext<'_>, oc_a: f64, t: Option<f64>) -> f64;

    /// TGF-β activation of uncommitted osteoblast differentiation.
    fn tgfb_activation_ob_u(&self, ctx: &SignalingContext<'_>, oc_a: f64, t: Option<f64>) -> f64 {
        let tgfb = self.tgfb_concentration(ctx, oc_a, t);
        tgfb / (tgfb + ctx.parameters.activation.tgfb_ob_u)
    }

    /// TGF-β repression of the precursor→active osteoblast transition.
    fn tgfb_repression_ob_p(&self, ctx: &SignalingContext<'_>, oc_a: f64, t: Option<f64>) -> f64 {
        let tgfb = self.tgfb_concentration(ctx, oc_a, t);
        ctx.parameters.repression.tgfb_ob_p / (tgfb + ctx.parameters.repression.tgfb_ob_p)
    }

    /// TGF-β activation of active-osteoclast apoptosis.
    fn tgfb_activation_oc_a(&self, ctx: &SignalingContext<'_>, oc_a: f64, t: Option<f64>) -> f64 {
        let tgfb = self.tgfb_concentration(ctx, oc_a, t);
        tgfb / (tgfb + ctx.parameters.activation.tgfb_oc_a)
    }

    /// PTH concentration \[pM\].
    fn pth_concentration(&self, ctx: &SignalingContext<'_>, t: Option<f64>) -> f64;

    /// OPG concentration \[pM\].
    fn opg_concentration(
        &self,
        ctx: &SignalingContext<'_>,
        ob_p: f64,
        ob_a: f64,
        t: Option<f64>,
    ) -> f64;

    /// RANKL concentration \[pM\].
    fn rankl_concentration(
        &self,
        ctx: &SignalingContext<'_>,
        ob_p: f64,
        ob_a: f64,
        t: Option<f64>,
    ) -> f64;

    /// RANKL activation of precursor osteoclast differentiation.
    fn rankl_activation_oc_p(
        &self,
        ctx: &SignalingContext<'_>,
        ob_p: f64,
        ob_a: f64,
        t: Option<f64>,
    ) -> f64 {
        let rankl = self.rankl_concentration(ctx, ob_p, ob_a, t);
        rankl / (rankl + ctx.parameters.activation.rankl_rank)
    }

    /// RANKL activation of uncommitted osteoclast differentiation.
    /// Identical to the precursor activation in this model family.
    fn rankl_activation_oc_u(
        &self,
        ctx: &SignalingContext<'_>,
        ob_p: f64,
        ob_a: f64,
        t: Option<f64>,
    ) -> f64 {
        self.rankl_activation_oc_p(ctx, ob_p, ob_a, t)
    }

    /// MCSF activation of uncommitted osteoclast differentiation.
    fn mcsf_activation_oc_u(&self, ctx: &SignalingContext<'_>) -> f64 {
        let p = ctx.parameters;
        p.concentration.mcsf / (p.concentration.mcsf + p.activation.mcsf_oc_u)
    }

    /// Multiplier on the baseline osteoblast-precursor proliferation for a
    /// given normalized strain deviation.
    fn proliferation_multiplier(&self, ctx: &SignalingContext<'_>, strain_effect: f64) -> f64;

    /// Mechanically induced RANKL production for a given normalized strain
    /// deviation \[pM/day\]. Disuse (negative deviation) favors resorption.
    fn disuse_rankl_production(&self, ctx: &SignalingContext<'_>, strain_effect: f64) -> f64;
}

/// The porosity-coupled constitutive formulation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PorosityCoupledSignaling;

impl PorosityCoupledSignaling {
    /// Effective RANKL carrying capacity of the expressing osteoblast
    /// populations under PTH regulation \[pM\].
    fn effective_rankl_capacity(
        &self,
        ctx: &SignalingContext<'_>,
        ob_p: f64,
        ob_a: f64,
        t: Option<f64>,
    ) -> f64 {
        let p = ctx.parameters;
        let expressing = p.production.max_rankl_per_cell
            * (if p.production.ob_p_produces_rankl { ob_p } else { 0.0 }
                + if p.production.ob_a_produces_rankl { ob_a } else { 0.0 });
        let pth = self.pth_concentration(ctx, t);
        let pth_activation = pth / (pth + p.activation.pth_ob);
        expressing * pth_activation
    }

    fn pth_repression_ob(&self, ctx: &SignalingContext<'_>, t: Option<f64>) -> f64 {
        let pth = self.pth_concentration(ctx, t);
        ctx.parameters.repression.pth_ob / (pth + ctx.parameters.repression.pth_ob)
    }
}

impl SignalingModel for PorosityCoupledSignaling {
    fn tgfb_concentration(&self, ctx: &SignalingContext<'_>, oc_a: f64, _t: Option<f64>) -> f64 {
        let p = ctx.parameters;
        p.bone_volume.stored_tgfb_content * oc_a * p.bone_volume.resorption_rate
            / p.calibration.oc_a
            / p.degradation.tgfb
    }

    fn pth_concentration(&self, ctx: &SignalingContext<'_>, t: Option<f64>) -> f64 {
        ctx.parameters.production.intrinsic_pth + ctx.load_case.pth_injection_at(t)
    }

    fn opg_concentration(
        &self,
        ctx: &SignalingContext<'_>,
        ob_p: f64,
        ob_a: f64,
        t: Option<f64>,
    ) -> f64 {
        let p = ctx.parameters;
        let expressing = p.production.min_opg_per_cell
            * (if p.production.ob_p_produces_opg { ob_p } else { 0.0 }
                + if p.production.ob_a_produces_opg { ob_a } else { 0.0 });
        let regulated = expressing / p.calibration.ob_a * self.pth_repression_ob(ctx, t);
        (regulated + ctx.load_case.opg_injection_at(t)) * p.concentration.opg_max
            / (regulated + p.degradation.opg * p.concentration.opg_max)
    }

    fn rankl_concentration(
        &self,
        ctx: &SignalingContext<'_>,
        ob_p: f64,
        ob_a: f64,
        t: Option<f64>,
    ) -> f64 {
        let p = ctx.parameters;
        let capacity = self.effective_rankl_capacity(ctx, ob_p, ob_a, t);
        let opg = self.opg_concentration(ctx, ob_p, ob_a, t);

        // Saturable competitive binding against OPG and RANK.
        let bound = capacity
            / (1.0
                + p.binding.rankl_opg * opg
                + p.binding.rankl_rank * p.concentration.rank);

        let production = p.production.intrinsic_rankl * ob_p
            + ctx.load_case.rankl_injection_at(t)
            + ctx.mechanical_rankl_production;
        let turnover = p.production.intrinsic_rankl * ob_p + p.degradation.rankl * capacity;
        bound * production / turnover
    }

    fn proliferation_multiplier(&self, ctx: &SignalingContext<'_>, strain_effect: f64) -> f64 {
        let strength = ctx.parameters.mechanics.transduction_strength;
        if strain_effect <= 0.0 {
            1.0
        } else if strain_effect < 1.0 / strength {
            1.0 + strength * strain_effect
        } else {
            2.0
        }
    }

    fn disuse_rankl_production(&self, ctx: &SignalingContext<'_>, strain_effect: f64) -> f64 {
        if strain_effect > 0.0 {
            0.0
        } else {
            -ctx.parameters.mechanics.transduction_strength_rankl * strain_effect
        }
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn context<'a>(parameters: &'a Parameters, load_case: &'a LoadCase) -> SignalingContext<'a> {
        SignalingContext {
            parameters,
            load_case,
            mechanical_rankl_production: 0.0,
        }
    }

    #[test]
    fn test_mcsf_activation_is_half_saturated() {
        let parameters = Parameters::default();
        let load_case = LoadCase::habitual();
        let signaling = PorosityCoupledSignaling;
        let ctx = context(&parameters, &load_case);
        // MCSF concentration equals its activation coefficient.
        assert!((signaling.mcsf_activation_oc_u(&ctx) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_tgfb_hill_terms_are_complementary_in_trend() {
        let parameters = Parameters::default();
        let load_case = LoadCase::habitual();
        let signaling = PorosityCoupledSignaling;
        let ctx = context(&parameters, &load_case);

        // More resorption → more TGF-β → stronger OBu activation, weaker
        // OBp transition (repression factor decreases).
        let act_low = signaling.tgfb_activation_ob_u(&ctx, 1.0e-5, None);
        let act_high = signaling.tgfb_activation_ob_u(&ctx, 1.0e-3, None);
        assert!(act_high > act_low);

        let rep_low = signaling.tgfb_repression_ob_p(&ctx, 1.0e-5, None);
        let rep_high = signaling.tgfb_repression_ob_p(&ctx, 1.0e-3, None);
        assert!(rep_high < rep_low);
    }

    #[test]
    fn test_pth_injection_raises_rankl() {
        // Elevated PTH represses OPG and activates RANKL production, so the
        // osteoporosis scenario must see more RANKL inside its window.
        let parameters = Parameters::default();
        let habitual = LoadCase::habitual();
        let osteoporosis = LoadCase::osteoporosis();
        let signaling = PorosityCoupledSignaling;

        let baseline = {
            let ctx = context(&parameters, &habitual);
            signaling.rankl_concentration(&ctx, 1.0e-4, 2.0e-4, Some(10.0))
        };
        let elevated = {
            let ctx = context(&parameters, &osteoporosis);
            signaling.rankl_concentration(&ctx, 1.0e-4, 2.0e-4, Some(10.0))
        };
        assert!(elevated > baseline);
    }

    #[test]
    fn test_proliferation_multiplier_three_regimes() {
        let parameters = Parameters::default();
        let load_case = LoadCase::habitual();
        let signaling = PorosityCoupledSignaling;
        let ctx = context(&parameters, &load_case);
        let saturation = 1.0 / parameters.mechanics.transduction_strength;

        assert_eq!(signaling.proliferation_multiplier(&ctx, -0.5), 1.0);
        assert_eq!(signaling.proliferation_multiplier(&ctx, 0.0), 1.0);
        let mid = signaling.proliferation_multiplier(&ctx, saturation / 2.0);
        assert!(mid > 1.0 && mid < 2.0);
        assert_eq!(signaling.proliferation_multiplier(&ctx, saturation), 2.0);
        assert_eq!(signaling.proliferation_multiplier(&ctx, 10.0 * saturation), 2.0);
    }

    #[test]
    fn test_proliferation_multiplier_continuous_at_breakpoints() {
        let parameters = Parameters::default();
        let load_case = LoadCase::habitual();
        let signaling = PorosityCoupledSignaling;
        let ctx = context(&parameters, &load_case);
        let saturation = 1.0 / parameters.mechanics.transduction_strength;
        let eps = 1e-9;

        // No jump at deviation = 0.
        let below = signaling.proliferation_multiplier(&ctx, -eps);
        let above = signaling.proliferation_multiplier(&ctx, eps);
        assert!((above - below).abs() < 1e-8);

        // No jump at the saturation breakpoint.
        let below = signaling.proliferation_multiplier(&ctx, saturation - eps);
        let above = signaling.proliferation_multiplier(&ctx, saturation + eps);
        assert!((above - below).abs() < 1e-8);
    }

    #[test]
    fn test_disuse_drives_rankl_production() {
        let parameters = Parameters::default();
        let load_case = LoadCase::habitual();
        let signaling = PorosityCoupledSignaling;
        let ctx = context(&parameters, &load_case);

        // Overload: no extra RANKL.
        assert_eq!(signaling.disuse_rankl_production(&ctx, 0.5), 0.0);
        // Disuse: production proportional to the (negative) deviation.
        let production = signaling.disuse_rankl_production(&ctx, -0.4);
        assert!(
            (production - 0.4 * parameters.mechanics.transduction_strength_rankl).abs() < 1e-12
        );
    }
}
