use super::{SlopeMeasurement, SlopeTable};
use crate::common::constants::{INTERCEPT_MARKER, UNCERTAINTY_FLOOR, UNCERTAINTY_MARKER};
use crate::domain::{GainMatchError, ParserResult};

/// Parses a slope fit report into a table keyed by (ring, wedge).
///
/// Only lines that carry the uncertainty marker and no intercept marker are
/// read; any such line that fails to parse aborts the whole report.
pub fn parse_slope_report(source: &str) -> ParserResult<SlopeTable> {
    let mut table = SlopeTable::new();

    for (index, line) in source.lines().enumerate() {
        if !is_measurement_line(line) {
            continue;
        }

        let line_number = index + 1;
        let measurement = parse_measurement_line(line_number, line)?;
        if let Some(previous) = table.insert(measurement)? {
            tracing::debug!(
                line = line_number,
                ring = measurement.ring,
                wedge = measurement.wedge,
                previous = previous.value,
                "slope measurement overwritten by later line"
            );
        } else {
            tracing::debug!(
                line = line_number,
                ring = measurement.ring,
                wedge = measurement.wedge,
                slope = measurement.value,
                uncertainty = measurement.uncertainty,
                "slope measurement parsed"
            );
        }
    }

    Ok(table)
}

pub fn is_measurement_line(line: &str) -> bool {
    line.contains(UNCERTAINTY_MARKER) && !line.contains(INTERCEPT_MARKER)
}

/// Uncertainty kept for an asymmetric `(up, down)` error pair. Never zero.
pub fn derive_uncertainty(up: f64, down: f64) -> f64 {
    if up > down && up > 0.0 {
        up
    } else if down > 0.0 {
        down
    } else {
        UNCERTAINTY_FLOOR
    }
}

pub(super) fn parse_measurement_line(
    line_number: usize,
    line: &str,
) -> ParserResult<SlopeMeasurement> {
    let mut tokens = line.split_whitespace();
    let ring = parse_index_token(tokens.next(), "ring", line_number, line)?;
    let wedge = parse_index_token(tokens.next(), "wedge", line_number, line)?;
    let value = tokens
        .next()
        .and_then(parse_f64_token)
        .ok_or_else(|| malformed(line_number, line, "slope value is missing or not numeric"))?;

    let (up, down) = parse_error_pair(line)
        .ok_or_else(|| malformed(line_number, line, "expected an '(up,down)' error pair"))?;

    SlopeMeasurement::new(ring, wedge, value, derive_uncertainty(up, down)).map_err(|error| {
        GainMatchError::parse(
            "PARSE.SLOPE_INDEX",
            format!("line {}: {} in '{}'", line_number, error.message(), line.trim()),
        )
    })
}

fn parse_index_token(
    token: Option<&str>,
    label: &str,
    line_number: usize,
    line: &str,
) -> ParserResult<usize> {
    token
        .and_then(|token| token.parse::<usize>().ok())
        .ok_or_else(|| {
            malformed(
                line_number,
                line,
                &format!("{label} index is missing or not a non-negative integer"),
            )
        })
}

fn parse_error_pair(line: &str) -> Option<(f64, f64)> {
    let open = line.find('(')?;
    let close = open + line[open..].find(')')?;
    let (up, down) = line[open + 1..close].split_once(',')?;
    Some((parse_f64_token(up)?, parse_f64_token(down)?))
}

fn parse_f64_token(token: &str) -> Option<f64> {
    token.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

fn malformed(line_number: usize, line: &str, detail: &str) -> GainMatchError {
    GainMatchError::parse(
        "PARSE.SLOPE_LINE",
        format!("line {}: {} in '{}'", line_number, detail, line.trim()),
    )
}

#[cfg(test)]
mod tests {
    use super::{derive_uncertainty, is_measurement_line, parse_slope_report};
    use crate::common::constants::UNCERTAINTY_FLOOR;
    use crate::domain::ErrorCategory;

    #[test]
    fn report_keeps_measurement_lines_and_skips_intercepts() {
        let source = "1 2 3.0 +/- (0.1,0.05)\n1 2 p0 0.4 +/- (0.2,0.2)\nheader line\n";
        let table = parse_slope_report(source).expect("report should parse");

        assert_eq!(table.measurement_count(), 1);
        let measurement = table.get(1, 2).expect("(1, 2) should be populated");
        assert_eq!(measurement.value, 3.0);
        assert_eq!(measurement.uncertainty, 0.1);
    }

    #[test]
    fn attached_marker_and_spaced_pair_both_parse() {
        let source = "0 0 1.5 +/-(0.02,0.03)\n3 7 0.9 +/- ( 0.04 , 0.01 )\n";
        let table = parse_slope_report(source).expect("report should parse");

        assert_eq!(table.get(0, 0).map(|m| m.uncertainty), Some(0.03));
        assert_eq!(table.get(3, 7).map(|m| m.uncertainty), Some(0.04));
    }

    #[test]
    fn later_duplicates_overwrite_earlier_ones() {
        let source = "4 5 1.1 +/- (0.1,0.1)\n4 5 1.3 +/- (0.2,0.1)\n";
        let table = parse_slope_report(source).expect("report should parse");

        assert_eq!(table.measurement_count(), 1);
        let measurement = table.get(4, 5).expect("(4, 5) should be populated");
        assert_eq!(measurement.value, 1.3);
        assert_eq!(measurement.uncertainty, 0.2);
    }

    #[test]
    fn uncertainty_prefers_larger_positive_side_and_never_reaches_zero() {
        assert_eq!(derive_uncertainty(0.1, 0.05), 0.1);
        assert_eq!(derive_uncertainty(0.05, 0.1), 0.1);
        assert_eq!(derive_uncertainty(-0.2, 0.07), 0.07);
        assert_eq!(derive_uncertainty(0.0, 0.0), UNCERTAINTY_FLOOR);
        assert_eq!(derive_uncertainty(-1.0, -2.0), UNCERTAINTY_FLOOR);
        assert_eq!(derive_uncertainty(0.3, -0.1), 0.3);
    }

    #[test]
    fn malformed_measurement_line_fails_the_report() {
        let source = "1 2 3.0 +/- (0.1,0.05)\n1 x 3.0 +/- (0.1,0.05)\n";
        let error = parse_slope_report(source).expect_err("bad wedge token should fail");

        assert_eq!(error.category(), ErrorCategory::ParseError);
        assert_eq!(error.placeholder(), "PARSE.SLOPE_LINE");
        assert!(error.message().starts_with("line 2:"), "{}", error.message());
    }

    #[test]
    fn missing_error_pair_fails_the_report() {
        let error = parse_slope_report("1 2 3.0 +/- 0.1\n").expect_err("missing pair should fail");
        assert_eq!(error.placeholder(), "PARSE.SLOPE_LINE");

        let error =
            parse_slope_report("1 2 3.0 +/- (0.1 0.05)\n").expect_err("missing comma should fail");
        assert_eq!(error.placeholder(), "PARSE.SLOPE_LINE");

        let error =
            parse_slope_report("1 2 3.0 +/- (abc,0.05)\n").expect_err("bad number should fail");
        assert_eq!(error.placeholder(), "PARSE.SLOPE_LINE");
    }

    #[test]
    fn out_of_range_indices_fail_the_report() {
        let error =
            parse_slope_report("16 0 1.0 +/- (0.1,0.1)\n").expect_err("ring 16 should fail");
        assert_eq!(error.category(), ErrorCategory::ParseError);
        assert_eq!(error.placeholder(), "PARSE.SLOPE_INDEX");

        let error =
            parse_slope_report("0 8 1.0 +/- (0.1,0.1)\n").expect_err("wedge 8 should fail");
        assert_eq!(error.placeholder(), "PARSE.SLOPE_INDEX");
    }

    #[test]
    fn measurement_line_filter_requires_marker_without_intercept() {
        assert!(is_measurement_line("1 2 3.0 +/- (0.1,0.05)"));
        assert!(!is_measurement_line("1 2 3.0 (0.1,0.05)"));
        assert!(!is_measurement_line("p0 = 0.3 +/- (0.1,0.05)"));
    }
}
