mod parser;

pub use parser::{derive_uncertainty, is_measurement_line, parse_slope_report};

use crate::common::constants::{
    RING_COUNT, UNOBSERVED_SLOPE_SENTINEL, UNOBSERVED_UNCERTAINTY_SENTINEL, WEDGE_COUNT,
};
use crate::domain::{GainMatchError, GainMatchResult};
use std::fs;
use std::path::Path;

/// A fitted ring-vs-wedge slope and the uncertainty kept for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlopeMeasurement {
    pub ring: usize,
    pub wedge: usize,
    pub value: f64,
    pub uncertainty: f64,
}

impl SlopeMeasurement {
    pub fn new(ring: usize, wedge: usize, value: f64, uncertainty: f64) -> GainMatchResult<Self> {
        check_pair(ring, wedge)?;
        Ok(Self {
            ring,
            wedge,
            value,
            uncertainty,
        })
    }
}

/// Dense ring × wedge table. Each cell holds at most one measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct SlopeTable {
    cells: [[Option<SlopeMeasurement>; WEDGE_COUNT]; RING_COUNT],
}

impl Default for SlopeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SlopeTable {
    pub fn new() -> Self {
        Self {
            cells: [[None; WEDGE_COUNT]; RING_COUNT],
        }
    }

    /// Stores `measurement`, returning whatever previously occupied its cell.
    pub fn insert(
        &mut self,
        measurement: SlopeMeasurement,
    ) -> GainMatchResult<Option<SlopeMeasurement>> {
        check_pair(measurement.ring, measurement.wedge)?;
        Ok(self.cells[measurement.ring][measurement.wedge].replace(measurement))
    }

    pub fn get(&self, ring: usize, wedge: usize) -> Option<&SlopeMeasurement> {
        self.cells.get(ring)?.get(wedge)?.as_ref()
    }

    pub fn is_observed(&self, ring: usize, wedge: usize) -> bool {
        self.get(ring, wedge).is_some()
    }

    /// Slope for the cell, or the unobserved sentinel.
    pub fn slope(&self, ring: usize, wedge: usize) -> GainMatchResult<f64> {
        check_pair(ring, wedge)?;
        Ok(self
            .get(ring, wedge)
            .map_or(UNOBSERVED_SLOPE_SENTINEL, |measurement| measurement.value))
    }

    /// Uncertainty for the cell, or the unobserved sentinel.
    pub fn uncertainty(&self, ring: usize, wedge: usize) -> GainMatchResult<f64> {
        check_pair(ring, wedge)?;
        Ok(self
            .get(ring, wedge)
            .map_or(UNOBSERVED_UNCERTAINTY_SENTINEL, |measurement| {
                measurement.uncertainty
            }))
    }

    pub fn measurement_count(&self) -> usize {
        self.iter().count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SlopeMeasurement> {
        self.cells.iter().flatten().flatten()
    }

    pub fn unobserved_pairs(&self) -> Vec<(usize, usize)> {
        all_pairs()
            .filter(|&(ring, wedge)| !self.is_observed(ring, wedge))
            .collect()
    }
}

/// Every (ring, wedge) pair in ring-major order.
pub fn all_pairs() -> impl Iterator<Item = (usize, usize)> {
    (0..RING_COUNT).flat_map(|ring| (0..WEDGE_COUNT).map(move |wedge| (ring, wedge)))
}

pub fn load_slope_report(path: &Path) -> GainMatchResult<SlopeTable> {
    let source = fs::read_to_string(path).map_err(|source| {
        GainMatchError::configuration(
            "CONFIG.SLOPE_FILE",
            format!(
                "couldn't read slope report at '{}' ({}); check it exists",
                path.display(),
                source
            ),
        )
    })?;

    let table = parse_slope_report(&source)?;
    tracing::info!(
        path = %path.display(),
        measurements = table.measurement_count(),
        "loaded slope report"
    );
    Ok(table)
}

fn check_pair(ring: usize, wedge: usize) -> GainMatchResult<()> {
    if ring >= RING_COUNT || wedge >= WEDGE_COUNT {
        return Err(GainMatchError::lookup(
            "LOOKUP.SLOPE_CELL",
            format!(
                "(ring {}, wedge {}) is outside the {}x{} slope table",
                ring, wedge, RING_COUNT, WEDGE_COUNT
            ),
        ));
    }
    Ok(())
}
