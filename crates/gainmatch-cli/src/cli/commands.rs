use super::CliError;
use anyhow::Context;
use gainmatch_core::domain::CalibrationRequest;
use gainmatch_core::modules::apply::render_calibrations;
use gainmatch_core::modules::channel_map::ChannelMap;
use gainmatch_core::modules::gain::{LevenbergMarquardt, SolverOptions};
use gainmatch_core::modules::pipeline::run_calibration;
use std::io::Write;
use std::path::PathBuf;

#[derive(clap::Args)]
pub(super) struct CalibrateArgs {
    /// Run number; slopes are read from run<RUN>/det<BOARD>/outlist.<BOARD>
    #[arg(value_name = "RUN")]
    run: u32,

    /// Detector board to fit
    #[arg(value_name = "BOARD")]
    board: usize,

    /// Directory the run and etc/ trees are resolved against
    #[arg(long, default_value = ".")]
    data_root: PathBuf,

    /// Channel map file (default: <data-root>/etc/ChannelMap_Feb2021_SABRE.txt)
    #[arg(long)]
    channel_map: Option<PathBuf>,

    /// Global scale factor file (default: <data-root>/etc/global_gain_scalefactors.dat)
    #[arg(long)]
    scale_factors: Option<PathBuf>,

    /// Write a JSON fit summary to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Levenberg-Marquardt iteration limit
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Exit with a fit-convergence error instead of writing factors from an unconverged fit
    #[arg(long)]
    require_convergence: bool,

    /// Raise log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub(super) verbose: u8,
}

impl CalibrateArgs {
    fn request(&self) -> CalibrationRequest {
        let mut request = CalibrationRequest::from_data_root(self.run, self.board, &self.data_root);
        if let Some(path) = &self.channel_map {
            request.channel_map_path = path.clone();
        }
        if let Some(path) = &self.scale_factors {
            request.scale_path = path.clone();
        }
        request
    }

    fn solver_options(&self) -> SolverOptions {
        let mut options = SolverOptions::default();
        if let Some(limit) = self.max_iterations {
            options.max_iterations = limit;
        }
        options
    }
}

pub(super) fn run_calibrate_command(args: CalibrateArgs) -> Result<i32, CliError> {
    let request = args.request();
    let channel_map = ChannelMap::load(&request.channel_map_path)?;
    let solver = LevenbergMarquardt::new(args.solver_options());

    let outcome = run_calibration(&request, &channel_map, &solver)?;

    eprintln!("{}", outcome.summary.render_human());
    if let Some(report_path) = &args.report {
        outcome.summary.write_json(report_path)?;
        tracing::info!(path = %report_path.display(), "wrote fit summary");
    }

    if args.require_convergence {
        outcome.fit.require_converged()?;
    }

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(render_calibrations(&outcome.calibrations).as_bytes())
        .and_then(|()| stdout.flush())
        .context("failed to write calibration factors to stdout")?;

    Ok(0)
}
