//! osteo-rs: Multiscale Bone Remodeling Simulation Framework
//!
//! Batch simulation of bone remodeling across two scales: local bone-cell
//! population dynamics (osteoblast/osteoclast differentiation, proliferation,
//! apoptosis and signaling feedback) coupled to macroscopic mechanical
//! loading over a midshaft cross-section.
//!
//! # Architecture
//!
//! Three layers, leaves first:
//!
//! 1. **Mechanics** ([`mechanics`]) — two-phase Mori–Tanaka homogenization of
//!    each representative volume element: strain concentration tensors, the
//!    macroscopic stiffness tensor and the strain energy density that feeds
//!    the mechanobiological response.
//! 2. **Cell model** ([`cell`]) — one six-state population model per element,
//!    with a steady-state solve (damped least squares), stiff transient
//!    integration (variable-step BDF) and a piecewise mechanotransduction
//!    feedback. The constitutive sub-formulas are an injected strategy, so
//!    published model variants compose instead of subclassing.
//! 3. **Cross-section** ([`section`]) — the orchestrator: a grid of elements
//!    evolving independently between periodic global updates, coupled once
//!    per interval through stiffness homogenization and classical beam
//!    equilibrium (one axial + two bending degrees of freedom).
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use osteo_rs::load::LoadCase;
//! use osteo_rs::section::{CrossSectionModel, SectionGeometry, SectionParameters};
//!
//! fn main() -> osteo_rs::error::Result<()> {
//!     // Geometry comes from an external generator: (y, z, BV/TV) in mm.
//!     let sites = vec![
//!         (-0.8, 0.0, 0.92),
//!         (0.0, 0.0, 0.95),
//!         (0.8, 0.0, 0.90),
//!         (0.0, 0.8, 0.93),
//!         (0.0, -0.8, 0.94),
//!     ];
//!     let geometry = SectionGeometry::from_sites_mm(sites, (0.8, 0.8))?;
//!
//!     let mut section = CrossSectionModel::new(
//!         geometry,
//!         LoadCase::spaceflight(),
//!         SectionParameters::default(),
//!     )?;
//!
//!     let ledger = section.run()?;
//!     for interval in ledger.intervals() {
//!         println!(
//!             "t = {} days: mean BV/TV {:.4}",
//!             interval.time,
//!             interval.elements.iter().map(|e| e.bone_volume_fraction).sum::<f64>()
//!                 / interval.elements.len() as f64,
//!         );
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Logging
//!
//! The crate logs through the [`log`] facade; installing a handler is the
//! binary's concern. Interval progress is `info`, per-element failures are
//! `warn`, solver iterations are `debug`.
//!
//! # Parallelism
//!
//! With the `parallel` feature the element-wise stages (stiffness refresh,
//! local model advance) run on a rayon pool. Elements are mutually
//! independent inside a stage; the equilibrium solve is a sequential barrier
//! between stages.

pub mod cell;
pub mod error;
pub mod load;
pub mod mechanics;
pub mod output;
pub mod section;
pub mod solver;

pub mod prelude {
    //! Convenient imports for common usage
    //!
    //! ```rust
    //! use osteo_rs::prelude::*;
    //! ```
    pub use crate::cell::{CellPopulationModel, CellState, Parameters, SteadyState};
    pub use crate::error::{Error, Result};
    pub use crate::load::LoadCase;
    pub use crate::mechanics::Homogenizer;
    pub use crate::output::export_ledger_csv;
    pub use crate::section::{
        CrossSectionModel, ResultsLedger, SectionGeometry, SectionParameters,
    };
    pub use crate::solver::{LeastSquaresSolver, StiffIntegrator};
}
