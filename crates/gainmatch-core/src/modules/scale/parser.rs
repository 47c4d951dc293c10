use super::GlobalScaleTable;
use crate::common::constants::BOARD_CAPACITY;
use crate::domain::{GainMatchError, ParserResult};

/// Reads whitespace-separated `board scale` pairs until the input runs out.
/// Line breaks carry no meaning.
pub fn parse_scale_table(source: &str) -> ParserResult<GlobalScaleTable> {
    let mut table = GlobalScaleTable::new();
    let mut tokens = source.split_whitespace();

    while let Some(board_token) = tokens.next() {
        let board = board_token.parse::<usize>().map_err(|_| {
            GainMatchError::parse(
                "PARSE.SCALE_BOARD",
                format!("board id '{}' is not a non-negative integer", board_token),
            )
        })?;
        if board >= BOARD_CAPACITY {
            return Err(GainMatchError::parse(
                "PARSE.SCALE_BOARD_RANGE",
                format!(
                    "board id {} is outside the supported range 0..{}",
                    board, BOARD_CAPACITY
                ),
            ));
        }

        let scale_token = tokens.next().ok_or_else(|| {
            GainMatchError::parse(
                "PARSE.SCALE_VALUE",
                format!("board {} has no scale factor", board),
            )
        })?;
        let scale = scale_token
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| {
                GainMatchError::parse(
                    "PARSE.SCALE_VALUE",
                    format!("scale factor '{}' for board {} is not numeric", scale_token, board),
                )
            })?;

        if let Some(previous) = table.insert(board, scale)? {
            tracing::debug!(board, previous, scale, "global scale factor overwritten");
        }
    }

    Ok(table)
}
