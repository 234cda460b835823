//! CSV export of the results ledger
//!
//! One row per interval × element, in long format: ready for pandas, Excel
//! or gnuplot without reshaping. An optional metadata header carries the run
//! parameters as `#`-prefixed comments.

use std::error::Error;
use std::fs::File;
use std::io::Write;

use crate::section::ResultsLedger;

/// Configuration for CSV export.
#[derive(Debug, Clone)]
pub struct CsvConfig {
    /// Column delimiter (default: ',').
    pub delimiter: char,
    /// Number of significant digits for floating-point values (default: 9).
    pub precision: usize,
    /// Include metadata header comments (default: false).
    pub include_metadata: bool,
    /// Metadata to include in the header.
    pub metadata: Option<CsvMetadata>,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            precision: 9,
            include_metadata: false,
            metadata: None,
        }
    }
}

impl CsvConfig {
    /// Builder: set the delimiter.
    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Builder: set the precision.
    pub fn precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    /// Builder: enable the metadata header.
    pub fn with_metadata(mut self, metadata: CsvMetadata) -> Self {
        self.include_metadata = true;
        self.metadata = Some(metadata);
        self
    }
}

/// Metadata for the CSV header comments. Only populated fields are written.
#[derive(Debug, Clone, Default)]
pub struct CsvMetadata {
    /// Load-case label (e.g. "spaceflight").
    pub load_case: Option<String>,
    /// Simulated duration \[years\].
    pub duration_years: Option<f64>,
    /// Mechanics update interval \[days\].
    pub mechanics_update_interval: Option<f64>,
    /// Number of elements in the cross-section.
    pub element_count: Option<usize>,
    /// Additional custom parameters.
    pub custom: Vec<(String, String)>,
}

impl CsvMetadata {
    pub fn add_custom(&mut self, key: String, value: String) {
        self.custom.push((key, value));
    }
}

fn write_metadata_header(file: &mut File, metadata: &CsvMetadata) -> Result<(), Box<dyn Error>> {
    writeln!(file, "# Bone Remodeling Simulation Ledger")?;
    writeln!(file, "# Generated: {}", chrono::Utc::now().to_rfc3339())?;
    if let Some(load_case) = &metadata.load_case {
        writeln!(file, "# Load Case: {}", load_case)?;
    }
    if let Some(duration) = metadata.duration_years {
        writeln!(file, "# Duration: {} years", duration)?;
    }
    if let Some(interval) = metadata.mechanics_update_interval {
        writeln!(file, "# Mechanics Update Interval: {} days", interval)?;
    }
    if let Some(count) = metadata.element_count {
        writeln!(file, "# Elements: {}", count)?;
    }
    for (key, value) in &metadata.custom {
        writeln!(file, "# {}: {}", key, value)?;
    }
    writeln!(file, "#")?;
    Ok(())
}

fn format_number(value: f64, config: &CsvConfig) -> String {
    format!("{:.prec$e}", value, prec = config.precision)
}

/// Export the ledger to CSV, one row per interval × element.
///
/// # Errors
///
/// - Empty ledger
/// - Non-finite interval times
/// - File creation or write errors
pub fn export_ledger_csv(
    ledger: &ResultsLedger,
    output_path: &str,
    configuration: Option<&CsvConfig>,
) -> Result<(), Box<dyn Error>> {
    if ledger.is_empty() {
        return Err("Empty ledger: nothing to export".into());
    }
    if ledger.intervals().iter().any(|i| !i.time.is_finite()) {
        return Err("Invalid data: non-finite interval time".into());
    }

    let binding = CsvConfig::default();
    let configuration = configuration.unwrap_or(&binding);

    let mut file = File::create(output_path)?;

    if configuration.include_metadata {
        if let Some(metadata) = &configuration.metadata {
            write_metadata_header(&mut file, metadata)?;
        }
    }

    let d = configuration.delimiter;
    writeln!(
        file,
        "time_days{d}element{d}ob_p{d}ob_a{d}oc_p{d}oc_a{d}porosity{d}bone_volume_fraction{d}strain_energy_density{d}mechanotransduction_effect{d}axial_stress_pa"
    )?;

    for interval in ledger.intervals() {
        for (element_index, record) in interval.elements.iter().enumerate() {
            let fields = [
                record.ob_p,
                record.ob_a,
                record.oc_p,
                record.oc_a,
                record.porosity,
                record.bone_volume_fraction,
                record.strain_energy_density,
                record.mechanotransduction_effect,
                record.axial_stress,
            ];
            write!(file, "{}{d}{}", interval.time, element_index)?;
            for field in fields {
                write!(file, "{d}{}", format_number(field, configuration))?;
            }
            writeln!(file)?;
        }
    }

    Ok(())
}

// =================================================================================================
// Tests
// =================================================================================================
