use crate::common::constants::{
    FREE_PARAMETER_COUNT, FREE_RING_COUNT, REFERENCE_RING, REFERENCE_RING_FACTOR, RING_COUNT,
    WEDGE_COUNT,
};
use crate::domain::{GainMatchError, GainMatchResult};
use crate::modules::mask::BadChannelMask;
use crate::modules::slopes::{SlopeMeasurement, SlopeTable, all_pairs};
use tiny_solver::factors::na;

/// Per-ring and per-wedge gain factors. Ring 0 is always exactly 1.0.
///
/// The free-parameter layout is `ring1..ring15` followed by `wedge0..wedge7`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainParameters {
    ring_factors: [f64; RING_COUNT],
    wedge_factors: [f64; WEDGE_COUNT],
}

impl Default for GainParameters {
    fn default() -> Self {
        Self::unity()
    }
}

impl GainParameters {
    pub fn unity() -> Self {
        Self {
            ring_factors: [1.0; RING_COUNT],
            wedge_factors: [1.0; WEDGE_COUNT],
        }
    }

    /// Builds factors from explicit ring and wedge arrays. The reference ring
    /// entry is overwritten with its pinned value.
    pub fn new(ring_factors: [f64; RING_COUNT], wedge_factors: [f64; WEDGE_COUNT]) -> Self {
        let mut parameters = Self {
            ring_factors,
            wedge_factors,
        };
        parameters.ring_factors[REFERENCE_RING] = REFERENCE_RING_FACTOR;
        parameters
    }

    pub fn from_free(free: &[f64]) -> GainMatchResult<Self> {
        if free.len() != FREE_PARAMETER_COUNT {
            return Err(GainMatchError::internal(
                "SYS.GAIN_PARAMETER_COUNT",
                format!(
                    "expected {} free gain parameters, got {}",
                    FREE_PARAMETER_COUNT,
                    free.len()
                ),
            ));
        }
        Ok(Self::unpack(free))
    }

    fn unpack(free: &[f64]) -> Self {
        let mut parameters = Self::unity();
        let (rings, wedges) = free.split_at(FREE_RING_COUNT.min(free.len()));
        for (slot, value) in parameters.ring_factors[1..].iter_mut().zip(rings) {
            *slot = *value;
        }
        for (slot, value) in parameters.wedge_factors.iter_mut().zip(wedges) {
            *slot = *value;
        }
        parameters.ring_factors[REFERENCE_RING] = REFERENCE_RING_FACTOR;
        parameters
    }

    pub fn to_free(&self) -> Vec<f64> {
        self.ring_factors[1..]
            .iter()
            .chain(self.wedge_factors.iter())
            .copied()
            .collect()
    }

    pub fn ring_factors(&self) -> &[f64; RING_COUNT] {
        &self.ring_factors
    }

    pub fn wedge_factors(&self) -> &[f64; WEDGE_COUNT] {
        &self.wedge_factors
    }

    pub fn ring_factor(&self, ring: usize) -> GainMatchResult<f64> {
        self.ring_factors.get(ring).copied().ok_or_else(|| {
            GainMatchError::lookup(
                "LOOKUP.RING_FACTOR",
                format!("ring {} is outside 0..{}", ring, RING_COUNT),
            )
        })
    }

    pub fn wedge_factor(&self, wedge: usize) -> GainMatchResult<f64> {
        self.wedge_factors.get(wedge).copied().ok_or_else(|| {
            GainMatchError::lookup(
                "LOOKUP.WEDGE_FACTOR",
                format!("wedge {} is outside 0..{}", wedge, WEDGE_COUNT),
            )
        })
    }

    /// Modelled ring/wedge slope.
    pub fn predicted_slope(&self, ring: usize, wedge: usize) -> GainMatchResult<f64> {
        Ok(self.ring_factor(ring)? / self.wedge_factor(wedge)?)
    }

    /// Unchecked ratio for pairs already known to be in range.
    fn ratio(&self, ring: usize, wedge: usize) -> f64 {
        self.ring_factors[ring] / self.wedge_factors[wedge]
    }

    pub fn is_finite(&self) -> bool {
        self.ring_factors
            .iter()
            .chain(self.wedge_factors.iter())
            .all(|value| value.is_finite())
    }
}

/// Free-layout slot of `ring`; the reference ring has none.
pub fn ring_slot(ring: usize) -> Option<usize> {
    (ring != REFERENCE_RING).then(|| ring - 1)
}

pub fn wedge_slot(wedge: usize) -> usize {
    FREE_RING_COUNT + wedge
}

/// Names of the free parameters in layout order.
pub fn free_parameter_names() -> Vec<String> {
    (1..RING_COUNT)
        .map(|ring| format!("ring{ring}"))
        .chain((0..WEDGE_COUNT).map(|wedge| format!("wedge{wedge}")))
        .collect()
}

/// Slope table plus one board's mask, viewed as a least-squares problem.
///
/// Only pairs that are observed and not masked contribute. The model holds no
/// parameter state; every evaluation takes the parameters explicitly.
#[derive(Debug, Clone)]
pub struct GainModel<'a> {
    table: &'a SlopeTable,
    mask: BadChannelMask,
    active_pairs: Vec<(usize, usize)>,
}

impl<'a> GainModel<'a> {
    pub fn new(table: &'a SlopeTable, board: usize) -> Self {
        let mask = BadChannelMask::for_board(board);
        let active_pairs = all_pairs()
            .filter(|&(ring, wedge)| !mask.excludes(ring, wedge) && table.is_observed(ring, wedge))
            .collect();
        Self {
            table,
            mask,
            active_pairs,
        }
    }

    pub fn board(&self) -> usize {
        self.mask.board()
    }

    pub fn mask(&self) -> &BadChannelMask {
        &self.mask
    }

    pub fn measurement(&self, ring: usize, wedge: usize) -> Option<&SlopeMeasurement> {
        self.table.get(ring, wedge)
    }

    pub fn active_pairs(&self) -> &[(usize, usize)] {
        &self.active_pairs
    }

    /// Unmasked pairs with no measurement; left out of the fit.
    pub fn unobserved_pairs(&self) -> Vec<(usize, usize)> {
        self.table
            .unobserved_pairs()
            .into_iter()
            .filter(|&(ring, wedge)| !self.mask.excludes(ring, wedge))
            .collect()
    }

    pub fn degrees_of_freedom(&self) -> isize {
        self.active_pairs.len() as isize - FREE_PARAMETER_COUNT as isize
    }

    pub fn normalized_residual(&self, parameters: &GainParameters, ring: usize, wedge: usize) -> f64 {
        match self.table.get(ring, wedge) {
            Some(measurement) => {
                (parameters.ratio(ring, wedge) - measurement.value)
                    / measurement.uncertainty
            }
            None => 0.0,
        }
    }

    pub fn chi2(&self, parameters: &GainParameters) -> f64 {
        self.active_pairs
            .iter()
            .map(|&(ring, wedge)| self.normalized_residual(parameters, ring, wedge).powi(2))
            .sum()
    }
}

/// Gauss-Newton view of chi2 around a parameter point, restricted to the free
/// slots that at least one active pair depends on.
#[derive(Debug, Clone, PartialEq)]
pub struct Curvature {
    /// Free-layout slot of each row/column, ascending.
    pub slots: Vec<usize>,
    /// `Jᵀr`
    pub gradient: na::DVector<f64>,
    /// `JᵀJ`
    pub normal: na::DMatrix<f64>,
}

impl Curvature {
    /// `(JᵀJ)⁻¹`, or `None` when the constrained block is singular.
    pub fn covariance(&self) -> Option<na::DMatrix<f64>> {
        if self.slots.is_empty() {
            return None;
        }
        self.normal.clone().cholesky().map(|cholesky| cholesky.inverse())
    }
}

impl GainModel<'_> {
    /// Free slots touched by the active pairs.
    pub fn constrained_slots(&self) -> Vec<usize> {
        let mut touched = [false; FREE_PARAMETER_COUNT];
        for &(ring, wedge) in &self.active_pairs {
            if let Some(slot) = ring_slot(ring) {
                touched[slot] = true;
            }
            touched[wedge_slot(wedge)] = true;
        }
        (0..FREE_PARAMETER_COUNT).filter(|&slot| touched[slot]).collect()
    }

    pub fn curvature(&self, parameters: &GainParameters) -> Curvature {
        let slots = self.constrained_slots();
        let mut compact = [None; FREE_PARAMETER_COUNT];
        for (index, &slot) in slots.iter().enumerate() {
            compact[slot] = Some(index);
        }

        let mut gradient = na::DVector::<f64>::zeros(slots.len());
        let mut normal = na::DMatrix::<f64>::zeros(slots.len(), slots.len());
        for &(ring, wedge) in &self.active_pairs {
            let Some(measurement) = self.table.get(ring, wedge) else {
                continue;
            };
            let sigma = measurement.uncertainty;
            let ring_factor = parameters.ring_factors[ring];
            let wedge_factor = parameters.wedge_factors[wedge];
            let residual = self.normalized_residual(parameters, ring, wedge);

            // d(residual)/d(ring) and d(residual)/d(wedge)
            let terms = [
                ring_slot(ring).map(|slot| (slot, 1.0 / (wedge_factor * sigma))),
                Some((
                    wedge_slot(wedge),
                    -ring_factor / (wedge_factor * wedge_factor * sigma),
                )),
            ];
            let terms: Vec<(usize, f64)> = terms
                .into_iter()
                .flatten()
                .filter_map(|(slot, derivative)| compact[slot].map(|index| (index, derivative)))
                .collect();

            for &(row, row_derivative) in &terms {
                gradient[row] += row_derivative * residual;
                for &(col, col_derivative) in &terms {
                    normal[(row, col)] += row_derivative * col_derivative;
                }
            }
        }

        Curvature {
            slots,
            gradient,
            normal,
        }
    }
}
