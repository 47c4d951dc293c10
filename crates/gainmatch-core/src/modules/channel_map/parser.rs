use crate::domain::{ChannelInfo, DetectorType, GainMatchError, ParserResult};
use std::collections::BTreeMap;

/// Parses `channel board detectorType part` records.
pub(super) fn parse_channel_records(source: &str) -> ParserResult<BTreeMap<usize, ChannelInfo>> {
    let mut entries = BTreeMap::new();

    for (index, raw) in source.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        let line_number = index + 1;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let [channel, board, detector_type, part, ..] = tokens.as_slice() else {
            return Err(malformed(line_number, line, "expected 'channel board type part'"));
        };

        let channel = channel
            .parse::<usize>()
            .map_err(|_| malformed(line_number, line, "channel is not a non-negative integer"))?;
        let board = board
            .parse::<usize>()
            .map_err(|_| malformed(line_number, line, "board is not a non-negative integer"))?;
        let detector_type = DetectorType::from_token(detector_type);
        let part = match (detector_type, part.parse::<usize>()) {
            (_, Ok(part)) => part,
            (DetectorType::Other, Err(_)) => 0,
            (_, Err(_)) => {
                return Err(malformed(
                    line_number,
                    line,
                    "ring and wedge records need a numeric part",
                ));
            }
        };

        entries.insert(channel, ChannelInfo::new(detector_type, part, board));
    }

    Ok(entries)
}

fn malformed(line_number: usize, line: &str, detail: &str) -> GainMatchError {
    GainMatchError::parse(
        "PARSE.CHANNEL_MAP_LINE",
        format!("line {}: {} in '{}'", line_number, detail, line),
    )
}

#[cfg(test)]
mod tests {
    use super::parse_channel_records;
    use crate::domain::{ChannelInfo, DetectorType, ErrorCategory};

    #[test]
    fn records_parse_with_comments_and_foreign_detectors() {
        let source = "# gchan board type part\n\
                      0 1 SABRERING 0\n\
                      16 1 SABREWEDGE 3   # wedge\n\
                      \n\
                      130 0 SCINTLEFT ANODE\n";
        let entries = parse_channel_records(source).expect("map should parse");

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[&0], ChannelInfo::new(DetectorType::Ring, 0, 1));
        assert_eq!(entries[&16], ChannelInfo::new(DetectorType::Wedge, 3, 1));
        assert_eq!(entries[&130], ChannelInfo::new(DetectorType::Other, 0, 0));
    }

    #[test]
    fn malformed_records_report_line_numbers() {
        let error = parse_channel_records("0 1 SABRERING 0\n1 1 SABREWEDGE\n")
            .expect_err("short record should fail");
        assert_eq!(error.category(), ErrorCategory::ParseError);
        assert_eq!(error.placeholder(), "PARSE.CHANNEL_MAP_LINE");
        assert!(error.message().starts_with("line 2:"));

        let error = parse_channel_records("4 1 SABREWEDGE front\n")
            .expect_err("wedge without numeric part should fail");
        assert!(error.message().contains("numeric part"));
    }
}
