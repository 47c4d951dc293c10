pub mod errors;

pub use errors::{ErrorCategory, ExitStatus, GainMatchError, GainMatchResult, ParserResult};

use crate::common::config::{default_channel_map_path, default_scale_factor_path, slope_report_path};
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetectorType {
    Ring,
    Wedge,
    Other,
}

impl DetectorType {
    pub fn from_token(token: &str) -> Self {
        match token {
            "SABRERING" => Self::Ring,
            "SABREWEDGE" => Self::Wedge,
            _ => Self::Other,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ring => "SABRERING",
            Self::Wedge => "SABREWEDGE",
            Self::Other => "OTHER",
        }
    }
}

impl Display for DetectorType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

/// Where a physical channel sits in the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelInfo {
    pub detector_type: DetectorType,
    pub part: usize,
    pub board: usize,
}

impl ChannelInfo {
    pub const fn new(detector_type: DetectorType, part: usize, board: usize) -> Self {
        Self {
            detector_type,
            part,
            board,
        }
    }

    pub fn matches(&self, detector_type: DetectorType, part: usize, board: usize) -> bool {
        self.detector_type == detector_type && self.part == part && self.board == board
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelCalibration {
    pub channel: usize,
    pub factor: f64,
}

impl ChannelCalibration {
    pub fn render_line(&self) -> String {
        format!("{}\t{}", self.channel, self.factor)
    }
}

/// One calibration run: which board to fit and where its inputs live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalibrationRequest {
    pub run_id: u32,
    pub board: usize,
    pub slope_path: PathBuf,
    pub scale_path: PathBuf,
    pub channel_map_path: PathBuf,
}

impl CalibrationRequest {
    pub fn new(
        run_id: u32,
        board: usize,
        slope_path: impl Into<PathBuf>,
        scale_path: impl Into<PathBuf>,
        channel_map_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            run_id,
            board,
            slope_path: slope_path.into(),
            scale_path: scale_path.into(),
            channel_map_path: channel_map_path.into(),
        }
    }

    pub fn from_data_root(run_id: u32, board: usize, data_root: &Path) -> Self {
        Self::new(
            run_id,
            board,
            slope_report_path(data_root, run_id, board),
            default_scale_factor_path(data_root),
            default_channel_map_path(data_root),
        )
    }
}
