//! Micromechanics
//!
//! This module provides the continuum-mechanics side of the simulation:
//!
//! - [`tensor`]: Voigt-notation utilities and the fixed elastic constants of
//!   the two phases (bone matrix and vascular pore space).
//! - [`homogenization`]: two-phase Mori–Tanaka homogenization of the
//!   representative volume element — strain concentration tensors, the
//!   macroscopic stiffness tensor and the strain energy density that drives
//!   the mechanobiological feedback.
//!
//! All quantities in this module are expressed in GPa; callers that need Pa
//! apply the fixed `1e9` conversion at the module boundary.

pub mod homogenization;
pub mod tensor;

pub use homogenization::Homogenizer;
pub use tensor::{stress_tensor, to_voigt};
