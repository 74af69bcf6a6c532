//! Redshift range parsing.
//!
//! Provides a validated `(min, max)` pair parsed from the comma-separated
//! `z_bounds` configuration value.

use crate::error::CatalogueError;
use std::fmt;
use std::str::FromStr;

/// Half-open redshift sampling range `[min, max)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RedshiftBounds {
    min: f64,
    max: f64,
}

impl RedshiftBounds {
    /// Create a range, requiring finite bounds with `min < max`
    pub fn new(min: f64, max: f64) -> Result<Self, CatalogueError> {
        if !min.is_finite() || !max.is_finite() || !(max - min).is_finite() {
            return Err(CatalogueError::config(format!(
                "The z-bounds must be finite numbers, got {min} and {max}"
            )));
        }
        if min >= max {
            return Err(CatalogueError::config(format!(
                "The upper z-bound ({max}) should be greater than the lower bound ({min})"
            )));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Whether `z` lies in `[min, max)`
    pub fn contains(&self, z: f64) -> bool {
        z >= self.min && z < self.max
    }
}

/// Parse a redshift range from a string of the form `"min,max"`.
///
/// Empty tokens are skipped, so `"0.1,,0.2"` is accepted and `"0.1,"` is
/// rejected for having a single value.
///
/// # Errors
/// `ConfigValidation` when there are not exactly two values, when a value is
/// not a number, or when the bounds are not strictly increasing.
pub fn parse_bounds(s: &str) -> Result<RedshiftBounds, CatalogueError> {
    let tokens: Vec<&str> = s
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect();

    if tokens.len() != 2 {
        return Err(CatalogueError::config(format!(
            "The z-bounds should consist of two values, got {} in '{s}'",
            tokens.len()
        )));
    }

    let parse = |token: &str| {
        token
            .parse::<f64>()
            .map_err(|_| CatalogueError::config(format!("Invalid z-bound value '{token}'")))
    };
    RedshiftBounds::new(parse(tokens[0])?, parse(tokens[1])?)
}

impl FromStr for RedshiftBounds {
    type Err = CatalogueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_bounds(s)
    }
}

impl fmt::Display for RedshiftBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_bounds() {
        let bounds = parse_bounds("0.1,0.2").unwrap();
        assert_eq!(bounds.min(), 0.1);
        assert_eq!(bounds.max(), 0.2);

        let bounds = parse_bounds(" 0.5 , 1.5 ").unwrap();
        assert_eq!((bounds.min(), bounds.max()), (0.5, 1.5));
    }

    #[test]
    fn test_equal_bounds_rejected() {
        let err = parse_bounds("0.1,0.1").unwrap_err();
        assert!(matches!(err, CatalogueError::ConfigValidation(_)));
    }

    #[test]
    fn test_decreasing_bounds_rejected() {
        assert!(parse_bounds("0.9,0.1").is_err());
    }

    #[test]
    fn test_wrong_arity_rejected() {
        let err = parse_bounds("0.1,0.2,0.3").unwrap_err();
        assert!(matches!(err, CatalogueError::ConfigValidation(_)));
        assert!(err.to_string().contains("two values"));

        assert!(parse_bounds("0.1").is_err());
        assert!(parse_bounds("").is_err());
        assert!(parse_bounds("0.1,").is_err());
    }

    #[test]
    fn test_empty_tokens_skipped() {
        let bounds = parse_bounds("0.1,,0.2").unwrap();
        assert_eq!((bounds.min(), bounds.max()), (0.1, 0.2));
    }

    #[test]
    fn test_non_numeric_rejected() {
        let err = parse_bounds("low,0.2").unwrap_err();
        assert!(err.to_string().contains("'low'"));
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(parse_bounds("0.1,inf").is_err());
        assert!(parse_bounds("NaN,1.0").is_err());
        assert!(RedshiftBounds::new(-f64::MAX, f64::MAX).is_err());
    }

    #[test]
    fn test_contains_is_half_open() {
        let bounds = RedshiftBounds::new(0.5, 0.6).unwrap();
        assert!(bounds.contains(0.5));
        assert!(bounds.contains(0.599));
        assert!(!bounds.contains(0.6));
        assert!(!bounds.contains(0.4));
    }

    #[test]
    fn test_from_str_and_display() {
        let bounds: RedshiftBounds = "0.25,3".parse().unwrap();
        assert_eq!(bounds.to_string(), "0.25,3");
    }
}
