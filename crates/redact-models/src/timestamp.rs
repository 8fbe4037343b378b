//! Timeline helpers: timestamp parsing and clip bounds.
//!
//! Supports `SS`, `MM:SS` and `HH:MM:SS`, each with optional `.mmm`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Parse a timestamp string to total seconds.
///
/// # Examples
/// ```
/// use redact_models::timestamp::parse_timestamp;
/// assert_eq!(parse_timestamp("01:30:00").unwrap(), 5400.0);
/// assert_eq!(parse_timestamp("05:30").unwrap(), 330.0);
/// assert_eq!(parse_timestamp("12.5").unwrap(), 12.5);
/// ```
pub fn parse_timestamp(ts: &str) -> Result<f64, TimestampError> {
    let ts = ts.trim();
    if ts.is_empty() {
        return Err(TimestampError::Empty);
    }

    let parts: Vec<&str> = ts.split(':').collect();
    if parts.len() > 3 {
        return Err(TimestampError::InvalidFormat(ts.to_string()));
    }

    // Fold right to left: seconds, minutes, hours.
    let mut total = 0.0;
    let mut scale = 1.0;
    for part in parts.iter().rev() {
        let value: f64 = part
            .parse()
            .map_err(|_| TimestampError::InvalidValue(part.to_string()))?;
        if value < 0.0 || !value.is_finite() {
            return Err(TimestampError::Negative);
        }
        total += value * scale;
        scale *= 60.0;
    }
    Ok(total)
}

/// Format seconds into `HH:MM:SS` or `HH:MM:SS.mmm`.
pub fn format_seconds(total_secs: f64) -> String {
    let total_secs = total_secs.max(0.0);
    let hours = (total_secs / 3600.0).floor() as u32;
    let mins = ((total_secs % 3600.0) / 60.0).floor() as u32;
    let secs = total_secs % 60.0;

    if (secs - secs.floor()).abs() > 0.0001 {
        format!("{:02}:{:02}:{:06.3}", hours, mins, secs)
    } else {
        format!("{:02}:{:02}:{:02}", hours, mins, secs.floor() as u32)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimestampError {
    #[error("Timestamp is empty")]
    Empty,

    #[error("Invalid timestamp format: {0}")]
    InvalidFormat(String),

    #[error("Invalid timestamp component: {0}")]
    InvalidValue(String),

    #[error("Timestamp cannot be negative")]
    Negative,

    #[error("Start ({start:.3}s) must be before end ({end:.3}s)")]
    StartNotBeforeEnd { start: f64, end: f64 },
}

/// Sub-interval of the timeline a remote job may restrict processing to.
///
/// Purely an optimization: omitting it processes the whole video.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClipBounds {
    pub start_time: f64,
    pub end_time: f64,
}

impl ClipBounds {
    pub fn new(start_time: f64, end_time: f64) -> Self {
        Self {
            start_time,
            end_time,
        }
    }

    /// Parse a pair of timestamp strings.
    pub fn parse(start: &str, end: &str) -> Result<Self, TimestampError> {
        let bounds = Self::new(parse_timestamp(start)?, parse_timestamp(end)?);
        bounds.validate()?;
        Ok(bounds)
    }

    pub fn validate(&self) -> Result<(), TimestampError> {
        if self.start_time < 0.0 || self.end_time < 0.0 {
            return Err(TimestampError::Negative);
        }
        if self.start_time >= self.end_time {
            return Err(TimestampError::StartNotBeforeEnd {
                start: self.start_time,
                end: self.end_time,
            });
        }
        Ok(())
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_formats() {
        assert_eq!(parse_timestamp("90").unwrap(), 90.0);
        assert_eq!(parse_timestamp("53:53").unwrap(), 3233.0);
        assert_eq!(parse_timestamp("01:30:45").unwrap(), 5445.0);
        assert!((parse_timestamp("00:00:30.500").unwrap() - 30.5).abs() < 0.001);
    }

    #[test]
    fn test_parse_timestamp_errors() {
        assert_eq!(parse_timestamp(" "), Err(TimestampError::Empty));
        assert!(matches!(parse_timestamp("abc"), Err(TimestampError::InvalidValue(_))));
        assert!(matches!(parse_timestamp("1:2:3:4"), Err(TimestampError::InvalidFormat(_))));
        assert_eq!(parse_timestamp("-5"), Err(TimestampError::Negative));
    }

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(0.0), "00:00:00");
        assert_eq!(format_seconds(90.0), "00:01:30");
        assert_eq!(format_seconds(3661.0), "01:01:01");
        assert_eq!(format_seconds(1.25), "00:00:01.250");
    }

    #[test]
    fn test_clip_bounds_validation() {
        assert!(ClipBounds::new(2.0, 8.0).validate().is_ok());
        assert!(matches!(
            ClipBounds::new(8.0, 2.0).validate(),
            Err(TimestampError::StartNotBeforeEnd { .. })
        ));
        assert_eq!(ClipBounds::new(-1.0, 2.0).validate(), Err(TimestampError::Negative));

        let parsed = ClipBounds::parse("00:10", "00:25").unwrap();
        assert_eq!(parsed.duration(), 15.0);
    }
}
