/// Score strings may be empty, a plain number, or round-by-round values
/// joined with `+` ("8+31+8"). The effective score is the sum of the
/// segments that parse; zero parseable segments means unknown.
pub fn score_total(raw: &str) -> Option<f64> {
    let mut sum = 0.0;
    let mut parsed = 0usize;
    for segment in raw.split('+') {
        let s = segment.trim();
        if s.is_empty() {
            continue;
        }
        if let Ok(v) = s.parse::<f64>() {
            sum += v;
            parsed += 1;
        }
    }
    if parsed == 0 { None } else { Some(sum) }
}

/// Display form: drop the decimals when the total is integral.
pub fn format_total(total: f64) -> String {
    if total.fract() == 0.0 {
        format!("{total:.0}")
    } else {
        format!("{total}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sums_round_segments() {
        assert_eq!(score_total("14"), Some(14.0));
        assert_eq!(score_total("8+31+8"), Some(47.0));
        assert_eq!(score_total(" 8 + 31 +8 "), Some(47.0));
    }

    #[test]
    fn unparseable_segments_are_dropped() {
        assert_eq!(score_total("x+3"), Some(3.0));
        assert_eq!(score_total("x+y"), None);
    }

    #[test]
    fn empty_is_unknown() {
        assert_eq!(score_total(""), None);
        assert_eq!(score_total("  "), None);
        assert_eq!(score_total("+"), None);
    }

    #[test]
    fn integral_totals_format_without_decimals() {
        assert_eq!(format_total(47.0), "47");
        assert_eq!(format_total(12.5), "12.5");
    }
}
