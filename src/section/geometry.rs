//! Cross-section geometry input
//!
//! The mapping from grid position to initial bone volume fraction is an
//! external collaborator: zonal generators (randomized cortical rings,
//! elliptical midshafts) live outside this crate and hand over a plain site
//! list. This module only validates it and fixes the unit contract —
//! positions enter in millimetres and are stored in metres via the fixed
//! `1e-3` conversion.

use crate::error::{Error, Result};

/// Millimetre → metre conversion applied to all incoming coordinates.
const MM_TO_M: f64 = 1.0e-3;

/// One grid site: position and initial bone volume fraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Site {
    /// y-coordinate \[m\] (mediolateral).
    pub y: f64,
    /// z-coordinate \[m\] (anteroposterior).
    pub z: f64,
    /// Initial bone volume fraction, in [0, 1].
    pub bone_volume_fraction: f64,
}

/// Validated cross-section geometry: sites plus grid spacing.
#[derive(Debug, Clone)]
pub struct SectionGeometry {
    sites: Vec<Site>,
    /// Grid spacing in y \[m\].
    pub delta_y: f64,
    /// Grid spacing in z \[m\].
    pub delta_z: f64,
}

impl SectionGeometry {
    /// Build a geometry from sites given in millimetres.
    ///
    /// `sites_mm` carries (y, z, bone volume fraction) with coordinates in
    /// mm; `grid_spacing_mm` is the (Δy, Δz) cell size in mm.
    pub fn from_sites_mm(
        sites_mm: Vec<(f64, f64, f64)>,
        grid_spacing_mm: (f64, f64),
    ) -> Result<Self> {
        let (delta_y_mm, delta_z_mm) = grid_spacing_mm;
        if !(delta_y_mm > 0.0) || !(delta_z_mm > 0.0) {
            return Err(Error::InvalidConfiguration(format!(
                "grid spacing must be positive, got ({delta_y_mm}, {delta_z_mm}) mm"
            )));
        }

        let mut sites = Vec::with_capacity(sites_mm.len());
        for (index, (y_mm, z_mm, bone_volume_fraction)) in sites_mm.into_iter().enumerate() {
            if !y_mm.is_finite() || !z_mm.is_finite() {
                return Err(Error::InvalidConfiguration(format!(
                    "site {index} has a non-finite position ({y_mm}, {z_mm})"
                )));
            }
            if !bone_volume_fraction.is_finite()
                || !(0.0..=1.0).contains(&bone_volume_fraction)
            {
                return Err(Error::InvalidConfiguration(format!(
                    "site {index} bone volume fraction {bone_volume_fraction} outside [0, 1]"
                )));
            }
            sites.push(Site {
                y: y_mm * MM_TO_M,
                z: z_mm * MM_TO_M,
                bone_volume_fraction,
            });
        }

        Ok(Self {
            sites,
            delta_y: delta_y_mm * MM_TO_M,
            delta_z: delta_z_mm * MM_TO_M,
        })
    }

    /// Regular n×n grid centred at the origin with a uniform bone volume
    /// fraction — the degenerate geometry used by verification scenarios.
    pub fn uniform_grid(
        elements_y: usize,
        elements_z: usize,
        spacing_mm: f64,
        bone_volume_fraction: f64,
    ) -> Result<Self> {
        if elements_y == 0 || elements_z == 0 {
            return Err(Error::InvalidConfiguration(
                "uniform grid needs at least one element per direction".to_string(),
            ));
        }
        let mut sites = Vec::with_capacity(elements_y * elements_z);
        for i in 0..elements_y {
            for j in 0..elements_z {
                let y = (i as f64 - (elements_y as f64 - 1.0) / 2.0) * spacing_mm;
                let z = (j as f64 - (elements_z as f64 - 1.0) / 2.0) * spacing_mm;
                sites.push((y, z, bone_volume_fraction));
            }
        }
        Self::from_sites_mm(sites, (spacing_mm, spacing_mm))
    }

    /// Sites with positions in metres.
    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

// =================================================================================================
// Tests
// =================================================================================================
