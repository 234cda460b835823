//! Local bone-cell population model
//!
//! One [`CellPopulationModel`] lives inside every element of the
//! cross-section. It owns the population state machinery:
//!
//! - [`parameters`]: the published rate constants and coefficients.
//! - [`state`]: typed state and steady-state records.
//! - [`signaling`]: the constitutive strategy — TGF-β, RANKL/OPG/PTH and the
//!   mechanotransduction formulas — injected into the model shell so that
//!   published variants become strategies, not subclasses.
//! - [`population`]: the model shell itself — steady-state solving, stiff
//!   transient integration and mechanical feedback.

pub mod parameters;
pub mod population;
pub mod signaling;
pub mod state;

pub use parameters::Parameters;
pub use population::{CellPopulationModel, MechanicsState};
pub use signaling::{PorosityCoupledSignaling, SignalingContext, SignalingModel};
pub use state::{CellState, SteadyState};
