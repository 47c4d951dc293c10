//! Turns fitted segment factors into per-channel calibration constants.

use super::ChannelMapper;
use super::gain::GainParameters;
use super::scale::GlobalScaleTable;
use crate::common::constants::{CHANNEL_SPACE, RING_COUNT, WEDGE_COUNT};
use crate::domain::{ChannelCalibration, DetectorType, GainMatchResult};

/// Emits `factor × global scale` for every channel the mapper places on
/// `board`. All wedge parts come first, then all ring parts; within a part,
/// channels are in ascending index order.
pub fn apply_calibration(
    parameters: &GainParameters,
    scales: &GlobalScaleTable,
    board: usize,
    mapper: &dyn ChannelMapper,
) -> GainMatchResult<Vec<ChannelCalibration>> {
    let scale = scales.scale_for(board)?;
    let mut calibrations = Vec::new();

    for (detector_type, factors) in [
        (DetectorType::Wedge, &parameters.wedge_factors()[..]),
        (DetectorType::Ring, &parameters.ring_factors()[..]),
    ] {
        for (part, factor) in factors.iter().enumerate() {
            for channel in 0..CHANNEL_SPACE {
                let Some(info) = mapper.lookup(channel) else {
                    continue;
                };
                if info.matches(detector_type, part, board) {
                    calibrations.push(ChannelCalibration {
                        channel,
                        factor: factor * scale,
                    });
                }
            }
        }
    }

    tracing::debug!(
        board,
        channels = calibrations.len(),
        wedge_parts = WEDGE_COUNT,
        ring_parts = RING_COUNT,
        "applied gain factors"
    );
    Ok(calibrations)
}

pub fn render_calibrations(calibrations: &[ChannelCalibration]) -> String {
    let mut rendered = String::new();
    for calibration in calibrations {
        rendered.push_str(&calibration.render_line());
        rendered.push('\n');
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::{apply_calibration, render_calibrations};
    use crate::common::constants::{RING_COUNT, WEDGE_COUNT};
    use crate::domain::{ChannelInfo, DetectorType, ErrorCategory};
    use crate::modules::channel_map::ChannelMap;
    use crate::modules::gain::GainParameters;
    use crate::modules::scale::GlobalScaleTable;

    /// Board 1 owns channels 0..24 (16 rings then 8 wedges); board 2 owns
    /// 24..48 with the same layout. Channel 200 is outside the scanned space.
    fn two_board_map() -> ChannelMap {
        let mut entries = Vec::new();
        for (board, offset) in [(1_usize, 0_usize), (2, 24)] {
            for ring in 0..RING_COUNT {
                entries.push((offset + ring, ChannelInfo::new(DetectorType::Ring, ring, board)));
            }
            for wedge in 0..WEDGE_COUNT {
                entries.push((
                    offset + RING_COUNT + wedge,
                    ChannelInfo::new(DetectorType::Wedge, wedge, board),
                ));
            }
        }
        entries.push((60, ChannelInfo::new(DetectorType::Other, 0, 1)));
        entries.push((200, ChannelInfo::new(DetectorType::Ring, 3, 1)));
        ChannelMap::from_entries(entries)
    }

    fn scales() -> GlobalScaleTable {
        let mut table = GlobalScaleTable::new();
        table.insert(1, 1.5).expect("board 1 is in range");
        table.insert(2, 0.8).expect("board 2 is in range");
        table
    }

    fn parameters() -> GainParameters {
        let mut rings = [0.0; RING_COUNT];
        for (ring, slot) in rings.iter_mut().enumerate() {
            *slot = 1.0 + 0.01 * ring as f64;
        }
        let mut wedges = [0.0; WEDGE_COUNT];
        for (wedge, slot) in wedges.iter_mut().enumerate() {
            *slot = 0.9 + 0.02 * wedge as f64;
        }
        GainParameters::new(rings, wedges)
    }

    #[test]
    fn emits_every_board_channel_once_wedges_first() {
        let calibrations =
            apply_calibration(&parameters(), &scales(), 1, &two_board_map()).expect("should apply");

        assert_eq!(calibrations.len(), RING_COUNT + WEDGE_COUNT);
        let channels: Vec<usize> = calibrations.iter().map(|c| c.channel).collect();
        let expected: Vec<usize> = (RING_COUNT..RING_COUNT + WEDGE_COUNT)
            .chain(0..RING_COUNT)
            .collect();
        assert_eq!(channels, expected);
    }

    #[test]
    fn wedge_lines_follow_part_order_not_channel_order() {
        // Wedge part 0 is cabled to channel 23 and part 7 to channel 16.
        let mut entries = Vec::new();
        for ring in 0..RING_COUNT {
            entries.push((ring, ChannelInfo::new(DetectorType::Ring, ring, 1)));
        }
        for wedge in 0..WEDGE_COUNT {
            entries.push((
                RING_COUNT + WEDGE_COUNT - 1 - wedge,
                ChannelInfo::new(DetectorType::Wedge, wedge, 1),
            ));
        }
        let map = ChannelMap::from_entries(entries);
        let parameters = parameters();

        let calibrations =
            apply_calibration(&parameters, &scales(), 1, &map).expect("should apply");

        let channels: Vec<usize> = calibrations.iter().map(|c| c.channel).collect();
        let expected: Vec<usize> = (RING_COUNT..RING_COUNT + WEDGE_COUNT)
            .rev()
            .chain(0..RING_COUNT)
            .collect();
        assert_eq!(channels, expected);
        assert_eq!(calibrations[0].factor, parameters.wedge_factors()[0] * 1.5);
        assert_eq!(calibrations[7].factor, parameters.wedge_factors()[7] * 1.5);

        let rendered = render_calibrations(&calibrations);
        let line_23 = rendered.find("23\t").expect("channel 23 should be rendered");
        let line_16 = rendered.find("16\t").expect("channel 16 should be rendered");
        assert!(line_23 < line_16, "rendered:\n{rendered}");
    }

    #[test]
    fn wedge_factor_is_scaled_by_board_scale() {
        let parameters = parameters();
        let calibrations =
            apply_calibration(&parameters, &scales(), 2, &two_board_map()).expect("should apply");

        let wedge_three = calibrations
            .iter()
            .find(|c| c.channel == 24 + RING_COUNT + 3)
            .expect("wedge 3 channel should be emitted");
        let expected = parameters.wedge_factors()[3] * 0.8;
        assert!((wedge_three.factor - expected).abs() < 1.0e-15);

        let ring_zero = calibrations
            .iter()
            .find(|c| c.channel == 24)
            .expect("ring 0 channel should be emitted");
        assert_eq!(ring_zero.factor, 0.8);
    }

    #[test]
    fn missing_board_scale_is_a_lookup_error() {
        let error = apply_calibration(&parameters(), &scales(), 3, &two_board_map())
            .expect_err("board 3 has no scale");
        assert_eq!(error.category(), ErrorCategory::LookupError);
    }

    #[test]
    fn rendered_lines_are_tab_separated() {
        let calibrations =
            apply_calibration(&GainParameters::unity(), &scales(), 1, &two_board_map())
                .expect("should apply");
        let rendered = render_calibrations(&calibrations[..2]);
        assert_eq!(rendered, "16\t1.5\n17\t1.5\n");
    }
}
