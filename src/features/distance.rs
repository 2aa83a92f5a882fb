//! Distance descriptor parsing
//!
//! Turns event distances such as `"100m"` or `"4x100m"` into meters plus a relay
//! flag. Two policies exist on purpose:
//!
//! - [`parse_distance`] is strict. The training pipeline uses it and drops any
//!   row it rejects.
//! - [`normalize_distance`] never fails. The serving path uses it and falls back
//!   to [`FALLBACK_METERS`], keeping whatever relay flag the input showed.

use thiserror::Error;
use tracing::debug;

/// Meters assumed when a serving-time distance cannot be parsed
pub const FALLBACK_METERS: f64 = 100.0;

const UNIT_SUFFIX: char = 'm';
const RELAY_SEPARATOR: char = 'x';

/// Parsed distance descriptor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedDistance {
    pub meters: f64,
    pub relay: bool,
}

impl ParsedDistance {
    pub fn new(meters: f64, relay: bool) -> Self {
        Self { meters, relay }
    }

    /// Relay flag as a feature value
    pub fn relay_value(&self) -> f64 {
        if self.relay {
            1.0
        } else {
            0.0
        }
    }
}

/// Why a distance descriptor was rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DistanceParseError {
    #[error("relay distance '{0}' must have exactly two parts")]
    RelayShape(String),

    #[error("'{0}' is not a number")]
    NotANumber(String),
}

impl DistanceParseError {
    /// Whether the rejected input was recognised as a relay
    pub fn is_relay(&self) -> bool {
        matches!(self, DistanceParseError::RelayShape(_))
            || matches!(self, DistanceParseError::NotANumber(s) if s.contains(RELAY_SEPARATOR))
    }
}

/// Lower-case and strip every unit suffix character
fn clean(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .filter(|&c| c != UNIT_SUFFIX)
        .collect()
}

fn parse_number(part: &str) -> Option<f64> {
    part.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Strictly parse a distance descriptor
pub fn parse_distance(raw: &str) -> Result<ParsedDistance, DistanceParseError> {
    let cleaned = clean(raw);

    if cleaned.contains(RELAY_SEPARATOR) {
        let parts: Vec<&str> = cleaned.split(RELAY_SEPARATOR).collect();
        if parts.len() != 2 {
            return Err(DistanceParseError::RelayShape(cleaned));
        }
        return match (parse_number(parts[0]), parse_number(parts[1])) {
            (Some(legs), Some(leg_length)) => Ok(ParsedDistance::new(legs * leg_length, true)),
            _ => Err(DistanceParseError::NotANumber(cleaned)),
        };
    }

    parse_number(&cleaned)
        .map(|meters| ParsedDistance::new(meters, false))
        .ok_or(DistanceParseError::NotANumber(cleaned))
}

/// Parse a distance descriptor, substituting the fallback on failure
pub fn normalize_distance(raw: &str) -> ParsedDistance {
    match parse_distance(raw) {
        Ok(parsed) => parsed,
        Err(e) => {
            debug!("Distance '{}' unparsable ({}), using {}m", raw, e, FALLBACK_METERS);
            ParsedDistance::new(FALLBACK_METERS, e.is_relay())
        }
    }
}

/// Like [`normalize_distance`], also reporting whether the fallback was used
pub fn normalize_distance_checked(raw: &str) -> (ParsedDistance, bool) {
    match parse_distance(raw) {
        Ok(parsed) => (parsed, false),
        Err(_) => (normalize_distance(raw), true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_individual_distances() {
        for (raw, meters) in [("100m", 100.0), ("200m", 200.0), ("1500m", 1500.0), ("50M", 50.0)] {
            let parsed = parse_distance(raw).unwrap();
            assert!((parsed.meters - meters).abs() < 1e-9, "{}", raw);
            assert!(!parsed.relay);
        }
    }

    #[test]
    fn test_relay_distances() {
        let parsed = parse_distance("4x100m").unwrap();
        assert!((parsed.meters - 400.0).abs() < 1e-9);
        assert!(parsed.relay);

        let parsed = parse_distance("4X200M").unwrap();
        assert!((parsed.meters - 800.0).abs() < 1e-9);
        assert!(parsed.relay);
    }

    #[test]
    fn test_unit_suffix_stripped_everywhere() {
        let parsed = parse_distance("4mx100m").unwrap();
        assert!((parsed.meters - 400.0).abs() < 1e-9);
    }

    #[test]
    fn test_strict_parse_rejects_malformed() {
        assert!(parse_distance("freestylem").is_err());
        assert!(parse_distance("2xabcm").is_err());
        assert!(parse_distance("4x100x2m").is_err());
        assert!(parse_distance("").is_err());
        assert!(parse_distance("infm").is_err());
    }

    #[test]
    fn test_normalize_falls_back_without_relay() {
        let parsed = normalize_distance("freestylem");
        assert!((parsed.meters - FALLBACK_METERS).abs() < 1e-9);
        assert!(!parsed.relay);
    }

    #[test]
    fn test_normalize_falls_back_keeping_relay() {
        let parsed = normalize_distance("2xabcm");
        assert!((parsed.meters - FALLBACK_METERS).abs() < 1e-9);
        assert!(parsed.relay);

        let parsed = normalize_distance("4x100x2m");
        assert!((parsed.meters - FALLBACK_METERS).abs() < 1e-9);
        assert!(parsed.relay);
    }

    #[test]
    fn test_normalize_passes_valid_input_through() {
        assert_eq!(normalize_distance("4x100m"), ParsedDistance::new(400.0, true));
        assert_eq!(normalize_distance("200m"), ParsedDistance::new(200.0, false));
    }

    #[test]
    fn test_normalize_checked_reports_fallback() {
        assert!(!normalize_distance_checked("100m").1);
        assert!(normalize_distance_checked("abc").1);
    }

    #[test]
    fn test_relay_value() {
        assert_eq!(ParsedDistance::new(400.0, true).relay_value(), 1.0);
        assert_eq!(ParsedDistance::new(100.0, false).relay_value(), 0.0);
    }
}
