use tracing::warn;

/// Interpret evaluator output as a score in [0, 1].
///
/// Anything that is not a finite number becomes 0.0, which sends the
/// answer down the refinement path instead of accepting it.
pub fn parse_score(raw: &str) -> f32 {
    match raw.trim().parse::<f32>() {
        Ok(score) if score.is_finite() => score.clamp(0.0, 1.0),
        _ => {
            warn!(raw = %raw.trim(), "Unparseable evaluation score, using 0.0");
            0.0
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_numbers() {
        assert_eq!(parse_score("0.9"), 0.9);
        assert_eq!(parse_score("  0.25\n"), 0.25);
        assert_eq!(parse_score("1"), 1.0);
    }

    #[test]
    fn test_garbage_is_zero() {
        assert_eq!(parse_score("Score: 0.8"), 0.0);
        assert_eq!(parse_score(""), 0.0);
        assert_eq!(parse_score("NaN"), 0.0);
        assert_eq!(parse_score("inf"), 0.0);
    }

    #[test]
    fn test_out_of_range_clamped() {
        assert_eq!(parse_score("7"), 1.0);
        assert_eq!(parse_score("-0.5"), 0.0);
    }
}
