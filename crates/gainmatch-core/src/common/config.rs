//! On-disk layout conventions for a calibration run.
//!
//! Everything is resolved relative to a data root, which defaults to the
//! current working directory.

use std::path::{Path, PathBuf};

pub const DEFAULT_CHANNEL_MAP_RELATIVE_PATH: &str = "etc/ChannelMap_Feb2021_SABRE.txt";
pub const DEFAULT_SCALE_FACTOR_RELATIVE_PATH: &str = "etc/global_gain_scalefactors.dat";

/// `run{run}/det{board}/outlist.{board}`
pub fn slope_report_relative_path(run_id: u32, board: usize) -> PathBuf {
    PathBuf::from(format!("run{run_id}"))
        .join(format!("det{board}"))
        .join(format!("outlist.{board}"))
}

pub fn slope_report_path(data_root: &Path, run_id: u32, board: usize) -> PathBuf {
    data_root.join(slope_report_relative_path(run_id, board))
}

pub fn default_channel_map_path(data_root: &Path) -> PathBuf {
    data_root.join(DEFAULT_CHANNEL_MAP_RELATIVE_PATH)
}

pub fn default_scale_factor_path(data_root: &Path) -> PathBuf {
    data_root.join(DEFAULT_SCALE_FACTOR_RELATIVE_PATH)
}

#[cfg(test)]
mod tests {
    use super::{default_channel_map_path, default_scale_factor_path, slope_report_path};
    use std::path::{Path, PathBuf};

    #[test]
    fn slope_report_path_follows_run_and_board_layout() {
        let path = slope_report_path(Path::new("data"), 42, 3);
        assert_eq!(path, PathBuf::from("data/run42/det3/outlist.3"));
    }

    #[test]
    fn etc_tables_resolve_under_data_root() {
        let root = Path::new("/srv/sabre");
        assert_eq!(
            default_channel_map_path(root),
            PathBuf::from("/srv/sabre/etc/ChannelMap_Feb2021_SABRE.txt")
        );
        assert_eq!(
            default_scale_factor_path(root),
            PathBuf::from("/srv/sabre/etc/global_gain_scalefactors.dat")
        );
    }
}
