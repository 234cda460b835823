//! Result export
//!
//! CSV export of the results ledger. Plotting and any richer visualization
//! stay outside this crate; the ledger itself is the product of a run.

pub mod export;

pub use export::{export_ledger_csv, CsvConfig, CsvMetadata};
