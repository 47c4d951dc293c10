mod parser;

pub use parser::parse_scale_table;

use crate::common::constants::BOARD_CAPACITY;
use crate::domain::{GainMatchError, GainMatchResult};
use std::fs;
use std::path::Path;

/// Global gain scale per board, indexed by board id `0..BOARD_CAPACITY`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GlobalScaleTable {
    factors: [Option<f64>; BOARD_CAPACITY],
}

impl GlobalScaleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the scale for `board`, returning the value it replaced.
    pub fn insert(&mut self, board: usize, factor: f64) -> GainMatchResult<Option<f64>> {
        let slot = self.factors.get_mut(board).ok_or_else(|| out_of_range(board))?;
        Ok(slot.replace(factor))
    }

    pub fn get(&self, board: usize) -> Option<f64> {
        self.factors.get(board).copied().flatten()
    }

    pub fn scale_for(&self, board: usize) -> GainMatchResult<f64> {
        if board >= BOARD_CAPACITY {
            return Err(out_of_range(board));
        }
        self.get(board).ok_or_else(|| {
            GainMatchError::lookup(
                "LOOKUP.SCALE_BOARD",
                format!("global scale table has no entry for board {}", board),
            )
        })
    }

    pub fn boards(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.factors
            .iter()
            .enumerate()
            .filter_map(|(board, factor)| factor.map(|factor| (board, factor)))
    }

    pub fn len(&self) -> usize {
        self.boards().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn out_of_range(board: usize) -> GainMatchError {
    GainMatchError::lookup(
        "LOOKUP.SCALE_BOARD_RANGE",
        format!(
            "board {} is outside the global scale table range 0..{}",
            board, BOARD_CAPACITY
        ),
    )
}

pub fn load_scale_table(path: &Path) -> GainMatchResult<GlobalScaleTable> {
    let source = fs::read_to_string(path).map_err(|source| {
        GainMatchError::configuration(
            "CONFIG.SCALE_FILE",
            format!(
                "couldn't read global scale factors at '{}' ({}); check it exists",
                path.display(),
                source
            ),
        )
    })?;

    let table = parse_scale_table(&source)?;
    tracing::info!(path = %path.display(), boards = table.len(), "loaded global scale factors");
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::{GlobalScaleTable, load_scale_table};
    use crate::domain::ErrorCategory;
    use tempfile::TempDir;

    #[test]
    fn lookup_distinguishes_missing_and_out_of_range_boards() {
        let mut table = GlobalScaleTable::new();
        assert_eq!(table.insert(2, 1.08).expect("board 2 is in range"), None);
        assert_eq!(table.insert(2, 1.10).expect("board 2 is in range"), Some(1.08));

        assert_eq!(table.scale_for(2).expect("board 2 has an entry"), 1.10);

        let missing = table.scale_for(3).expect_err("board 3 has no entry");
        assert_eq!(missing.category(), ErrorCategory::LookupError);
        assert_eq!(missing.placeholder(), "LOOKUP.SCALE_BOARD");

        let outside = table.scale_for(5).expect_err("board 5 is out of range");
        assert_eq!(outside.placeholder(), "LOOKUP.SCALE_BOARD_RANGE");
        assert!(table.insert(17, 1.0).is_err());
    }

    #[test]
    fn missing_scale_file_is_a_configuration_error() {
        let temp = TempDir::new().expect("tempdir should be created");
        let error = load_scale_table(&temp.path().join("etc/global_gain_scalefactors.dat"))
            .expect_err("missing file should fail");
        assert_eq!(error.category(), ErrorCategory::ConfigurationError);
        assert!(error.message().contains("global_gain_scalefactors.dat"));
    }
}
