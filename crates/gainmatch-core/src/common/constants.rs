//! Detector geometry and parsing constants shared by the calibration modules.

/// Rings per SABRE board.
pub const RING_COUNT: usize = 16;
/// Wedges per SABRE board.
pub const WEDGE_COUNT: usize = 8;

/// Ring pinned to unit gain to remove the ratio-model scale degeneracy.
pub const REFERENCE_RING: usize = 0;
pub const REFERENCE_RING_FACTOR: f64 = 1.0;

pub const FREE_RING_COUNT: usize = RING_COUNT - 1;
pub const FREE_PARAMETER_COUNT: usize = FREE_RING_COUNT + WEDGE_COUNT;

/// A fit counts as converged once the estimated distance to the chi2 minimum
/// is at or below this value.
pub const EDM_TOLERANCE: f64 = 2.0e-4;

/// Smallest uncertainty ever stored for a slope measurement.
pub const UNCERTAINTY_FLOOR: f64 = 0.001;

/// Value read back for a (ring, wedge) cell that no measurement line populated.
/// Such cells are reported and left out of the fit.
pub const UNOBSERVED_SLOPE_SENTINEL: f64 = 1.0;
pub const UNOBSERVED_UNCERTAINTY_SENTINEL: f64 = 1.0;

pub const UNCERTAINTY_MARKER: &str = "+/-";
pub const INTERCEPT_MARKER: &str = "p0";

/// Physical channel indices scanned by the reporter.
pub const CHANNEL_SPACE: usize = 128;

/// Boards addressable by the global scale table (ids `0..BOARD_CAPACITY`).
pub const BOARD_CAPACITY: usize = 5;
