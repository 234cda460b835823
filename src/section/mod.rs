//! Cross-section orchestration
//!
//! A bone midshaft cross-section is a grid of elements (representative
//! volume elements), each carrying its own [`crate::cell::CellPopulationModel`].
//! The orchestrator alternates local ODE integration with global beam-theory
//! equilibrium, one cycle per mechanics-update interval:
//!
//! ```text
//! INIT → {UPDATE_STIFFNESS → SOLVE_EQUILIBRIUM → DISTRIBUTE_STRESS
//!          → ADVANCE_LOCAL_MODELS → RECORD}* → DONE
//! ```
//!
//! For interval *k*, stress distribution happens before local integration,
//! which happens before the stiffness and geometry recomputation driving
//! interval *k + 1* — a strict sequential chain that is never reordered.
//! Within a stage, elements are mutually independent; with the `parallel`
//! feature the element-wise stages fan out across a rayon pool and join
//! before the (sequential) equilibrium solve.

pub mod element;
pub mod geometry;
pub mod ledger;
pub mod orchestrator;

pub use element::Element;
pub use geometry::{SectionGeometry, Site};
pub use ledger::{ElementRecord, IntervalRecord, ResultsLedger};
pub use orchestrator::{CrossSectionModel, SectionParameters, StrainDecomposition};
