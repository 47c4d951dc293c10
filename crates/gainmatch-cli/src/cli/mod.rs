mod commands;
mod logging;

use clap::Parser;
use commands::CalibrateArgs;
use gainmatch_core::domain::GainMatchError;

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match run(args) {
        Ok(code) => code,
        Err(error) => {
            let diagnostic = error.as_gainmatch_error();
            eprintln!("{}", diagnostic.diagnostic_line());
            eprintln!("{}", diagnostic.fatal_exit_line());
            diagnostic.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("gainmatch".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();

    match Cli::try_parse_from(&full_args) {
        Ok(cli) => {
            logging::init(cli.args.verbose);
            commands::run_calibrate_command(cli.args)
        }
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(
    name = "gainmatch",
    version,
    about = "Gain-match SABRE ring and wedge channels for one run and board"
)]
struct Cli {
    #[command(flatten)]
    args: CalibrateArgs,
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Calibration(GainMatchError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<GainMatchError> for CliError {
    fn from(error: GainMatchError) -> Self {
        Self::Calibration(error)
    }
}

impl CliError {
    fn as_gainmatch_error(&self) -> GainMatchError {
        match self {
            Self::Usage(message) => {
                GainMatchError::parse("PARSE.CLI_USAGE", message.trim_end().to_string())
            }
            Self::Calibration(error) => error.clone(),
            Self::Internal(error) => GainMatchError::internal("SYS.CLI", format!("{error:#}")),
        }
    }
}
