//! Crate-level error taxonomy
//!
//! Three failure families cross the public API:
//!
//! - [`Error::NonConvergence`]: a numerical stage (steady-state solve or
//!   stiff transient integration) failed its tolerance. Carries enough
//!   attribution (element, interval, stage) to point at the exact spot in a
//!   batch run.
//! - [`Error::InvalidConfiguration`]: the input is wrong before any numerics
//!   run (porosity outside [0,1], inverted time window, non-positive grid
//!   spacing). Fails fast.
//! - [`Error::NumericalDegeneracy`]: the moment-of-area system is singular
//!   (empty or degenerate cross-section) or a stiffness tensor could not be
//!   inverted. Detected explicitly so NaNs never propagate into the ledger.

use thiserror::Error;

use crate::solver::SolverError;

/// Solver stage that failed, for attribution in batch runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverStage {
    /// Steady-state least-squares solve of the cell populations.
    SteadyState,
    /// Stiff transient integration over a mechanics interval.
    Transient,
}

impl std::fmt::Display for SolverStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolverStage::SteadyState => write!(f, "steady-state solve"),
            SolverStage::Transient => write!(f, "transient integration"),
        }
    }
}

/// Errors produced by the simulation framework.
#[derive(Debug, Error)]
pub enum Error {
    /// A numerical stage failed to reach its tolerance.
    #[error("{stage} did not converge (element {element:?}, interval {interval:?}): {source}")]
    NonConvergence {
        stage: SolverStage,
        /// Element index within the cross-section, when attributable.
        element: Option<usize>,
        /// Mechanics interval index, when attributable.
        interval: Option<usize>,
        #[source]
        source: SolverError,
    },

    /// The configuration is invalid; nothing was computed.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A linear system required by the mechanics is singular.
    #[error("numerical degeneracy: {0}")]
    NumericalDegeneracy(String),
}

impl Error {
    /// Wrap a solver failure with stage and element/interval attribution.
    pub(crate) fn non_convergence(
        stage: SolverStage,
        element: Option<usize>,
        interval: Option<usize>,
        source: SolverError,
    ) -> Self {
        Error::NonConvergence {
            stage,
            element,
            interval,
            source,
        }
    }

    /// Attach element/interval attribution to a non-convergence raised below
    /// the orchestrator; other variants pass through unchanged.
    pub(crate) fn with_attribution(self, element: usize, interval: Option<usize>) -> Self {
        match self {
            Error::NonConvergence { stage, source, .. } => Error::NonConvergence {
                stage,
                element: Some(element),
                interval,
                source,
            },
            other => other,
        }
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

// =================================================================================================
// Tests
// =================================================================================================
