mod model;
mod solver;

pub use model::{
    Curvature, GainModel, GainParameters, free_parameter_names, ring_slot, wedge_slot,
};
pub use solver::{
    LeastSquaresSolver, LevenbergMarquardt, SolverOptions, SolverOutcome, SolverStatus,
};

use crate::common::constants::{EDM_TOLERANCE, FREE_PARAMETER_COUNT};
use crate::domain::{GainMatchError, GainMatchResult};
use crate::modules::slopes::SlopeTable;
use serde::Serialize;

/// Why a fit is, or is not, accepted as converged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    Converged,
    EdmAboveTolerance,
    SingularCurvature,
    SolverFailed,
    EmptyProblem,
}

impl Termination {
    pub const fn is_converged(self) -> bool {
        matches!(self, Self::Converged)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Converged => "estimated distance to minimum within tolerance",
            Self::EdmAboveTolerance => "estimated distance to minimum above tolerance",
            Self::SingularCurvature => "curvature matrix is singular",
            Self::SolverFailed => "solver failed",
            Self::EmptyProblem => "no active ring/wedge pairs",
        }
    }
}

/// Result of one joint fit of all free ring and wedge factors.
#[derive(Debug, Clone, PartialEq)]
pub struct GainFit {
    pub board: usize,
    pub parameters: GainParameters,
    /// One entry per free parameter; `None` where no active pair constrains it.
    pub uncertainties: Vec<Option<f64>>,
    pub chi2: f64,
    /// `rᵀJ (JᵀJ)⁻¹ Jᵀr` at the returned parameters.
    pub edm: Option<f64>,
    pub termination: Termination,
    pub active_pairs: usize,
    pub degrees_of_freedom: isize,
    pub unobserved_pairs: Vec<(usize, usize)>,
    pub excluded_pairs: Vec<(usize, usize)>,
}

impl GainFit {
    pub fn converged(&self) -> bool {
        self.termination.is_converged()
    }

    /// The convergence diagnostic for callers that refuse estimates from a
    /// failed fit.
    pub fn require_converged(&self) -> GainMatchResult<()> {
        if self.converged() {
            return Ok(());
        }
        Err(GainMatchError::convergence(
            "FIT.NOT_CONVERGED",
            format!(
                "fit for board {} did not converge: {} (chi2 = {}, edm = {})",
                self.board,
                self.termination.as_str(),
                self.chi2,
                self.edm
                    .map_or_else(|| "n/a".to_string(), |edm| format!("{edm:e}"))
            ),
        ))
    }
}

/// Fits ring and wedge factors for `board` starting from unit gains.
///
/// A non-converged solve still returns the best estimate; it is logged and
/// flagged on the returned [`GainFit`].
pub fn fit_gains(
    table: &SlopeTable,
    board: usize,
    solver: &dyn LeastSquaresSolver,
) -> GainMatchResult<GainFit> {
    let model = GainModel::new(table, board);
    let unobserved_pairs = model.unobserved_pairs();
    if !unobserved_pairs.is_empty() {
        tracing::warn!(
            board,
            count = unobserved_pairs.len(),
            pairs = ?unobserved_pairs,
            "unmasked ring/wedge pairs have no slope measurement and are left out of the fit"
        );
    }

    let outcome = solver.minimize(&model, &GainParameters::unity());
    let parameters = outcome.parameters;
    if !parameters.is_finite() {
        return Err(GainMatchError::internal(
            "SYS.SOLVER_NON_FINITE",
            format!("solver returned non-finite gain factors for board {}", board),
        ));
    }

    let (uncertainties, edm) = assess_minimum(&model, &parameters);
    let termination = match outcome.status {
        SolverStatus::EmptyProblem => Termination::EmptyProblem,
        SolverStatus::Failed => Termination::SolverFailed,
        SolverStatus::Finished => match edm {
            None => Termination::SingularCurvature,
            Some(edm) if edm <= EDM_TOLERANCE => Termination::Converged,
            Some(_) => Termination::EdmAboveTolerance,
        },
    };

    let fit = GainFit {
        board,
        parameters,
        uncertainties,
        chi2: model.chi2(&parameters),
        edm,
        termination,
        active_pairs: model.active_pairs().len(),
        degrees_of_freedom: model.degrees_of_freedom(),
        unobserved_pairs,
        excluded_pairs: model.mask().excluded_pairs(),
    };

    if fit.converged() {
        tracing::info!(
            board,
            chi2 = fit.chi2,
            ndf = fit.degrees_of_freedom,
            edm = ?fit.edm,
            "gain fit converged"
        );
    } else {
        tracing::warn!(
            board,
            chi2 = fit.chi2,
            edm = ?fit.edm,
            termination = fit.termination.as_str(),
            "gain fit did not converge; continuing with the best available estimate"
        );
    }

    Ok(fit)
}

/// Per-slot uncertainties from `(JᵀJ)⁻¹` and the estimated distance to the
/// minimum. Both are unavailable when the constrained block is singular.
fn assess_minimum(
    model: &GainModel<'_>,
    parameters: &GainParameters,
) -> (Vec<Option<f64>>, Option<f64>) {
    let mut uncertainties = vec![None; FREE_PARAMETER_COUNT];
    let curvature = model.curvature(parameters);
    let Some(covariance) = curvature.covariance() else {
        if !curvature.slots.is_empty() {
            tracing::warn!("normal matrix is singular; parameter uncertainties unavailable");
        }
        return (uncertainties, None);
    };

    for (index, &slot) in curvature.slots.iter().enumerate() {
        let variance = covariance[(index, index)];
        if variance.is_finite() && variance >= 0.0 {
            uncertainties[slot] = Some(variance.sqrt());
        }
    }
    let edm = curvature.gradient.dot(&(&covariance * &curvature.gradient));
    (uncertainties, Some(edm))
}
