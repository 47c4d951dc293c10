use super::ChannelMapper;
use super::apply::apply_calibration;
use super::gain::{GainFit, LeastSquaresSolver, fit_gains};
use super::scale::load_scale_table;
use super::slopes::load_slope_report;
use super::summary::FitSummary;
use crate::domain::{CalibrationRequest, ChannelCalibration, GainMatchResult};

#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationOutcome {
    pub fit: GainFit,
    pub summary: FitSummary,
    pub calibrations: Vec<ChannelCalibration>,
}

impl CalibrationOutcome {
    pub fn converged(&self) -> bool {
        self.fit.converged()
    }
}

/// Runs one board end to end: slopes → fit → global scale → per-channel factors.
pub fn run_calibration(
    request: &CalibrationRequest,
    mapper: &dyn ChannelMapper,
    solver: &dyn LeastSquaresSolver,
) -> GainMatchResult<CalibrationOutcome> {
    let span = tracing::info_span!("calibration", run = request.run_id, board = request.board);
    let _guard = span.enter();

    let table = load_slope_report(&request.slope_path)?;
    let fit = fit_gains(&table, request.board, solver)?;
    let scales = load_scale_table(&request.scale_path)?;
    let calibrations = apply_calibration(&fit.parameters, &scales, request.board, mapper)?;

    Ok(CalibrationOutcome {
        summary: FitSummary::from_fit(request.run_id, &fit),
        fit,
        calibrations,
    })
}
