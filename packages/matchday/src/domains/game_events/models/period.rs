use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Default length of one regular period (25 minutes).
pub const DEFAULT_PERIOD_LENGTH_SECONDS: u32 = 1500;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PeriodError {
    #[error("Unknown period label: {0:?}")]
    UnknownLabel(String),

    #[error("Period numbers start at 1")]
    ZeroPeriod,
}

/// A point on the match clock: a period label and the seconds elapsed in it.
///
/// This is also the shape of a reconstruction cursor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameTime {
    pub period: String,
    pub period_second: u32,
}

impl GameTime {
    pub fn new(period: impl Into<String>, period_second: u32) -> Self {
        Self {
            period: period.into(),
            period_second,
        }
    }

    /// Start of the given period.
    pub fn period_start(period: impl Into<String>) -> Self {
        Self::new(period, 0)
    }
}

impl fmt::Display for GameTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:02}:{:02}",
            self.period,
            self.period_second / 60,
            self.period_second % 60
        )
    }
}

/// How period labels map onto one absolute timeline.
///
/// Numeric labels ("1", "2", ...) are their own ordinal. Non-numeric labels
/// are only valid when listed in `overtime_labels`; they are ordered after the
/// regular periods in list order. Labels are never guessed from their text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodScheme {
    pub period_length_seconds: u32,
    pub regular_periods: u32,
    pub overtime_labels: Vec<String>,
}

impl Default for PeriodScheme {
    fn default() -> Self {
        Self {
            period_length_seconds: DEFAULT_PERIOD_LENGTH_SECONDS,
            regular_periods: 2,
            overtime_labels: vec!["OT1".to_string(), "OT2".to_string(), "SO".to_string()],
        }
    }
}

impl PeriodScheme {
    pub fn with_period_length(period_length_seconds: u32) -> Self {
        Self {
            period_length_seconds,
            ..Self::default()
        }
    }

    /// 1-based position of a period label on the match timeline.
    pub fn ordinal(&self, label: &str) -> Result<u32, PeriodError> {
        let label = label.trim();

        if let Ok(number) = label.parse::<u32>() {
            if number == 0 {
                return Err(PeriodError::ZeroPeriod);
            }
            return Ok(number);
        }

        self.overtime_labels
            .iter()
            .position(|candidate| candidate.eq_ignore_ascii_case(label))
            .map(|index| self.regular_periods + index as u32 + 1)
            .ok_or_else(|| PeriodError::UnknownLabel(label.to_string()))
    }

    /// `(ordinal - 1) * period_length + period_second`
    pub fn absolute_seconds(&self, at: &GameTime) -> Result<u64, PeriodError> {
        let ordinal = self.ordinal(&at.period)?;
        Ok(u64::from(ordinal - 1) * u64::from(self.period_length_seconds)
            + u64::from(at.period_second))
    }

    /// Seconds at which the given period starts on the absolute timeline.
    pub fn period_offset(&self, label: &str) -> Result<u64, PeriodError> {
        self.absolute_seconds(&GameTime::period_start(label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_labels_parse_directly() {
        let scheme = PeriodScheme::with_period_length(1500);
        assert_eq!(scheme.absolute_seconds(&GameTime::new("1", 90)).unwrap(), 90);
        assert_eq!(scheme.absolute_seconds(&GameTime::new("2", 0)).unwrap(), 1500);
        assert_eq!(scheme.absolute_seconds(&GameTime::new(" 4 ", 10)).unwrap(), 4510);
    }

    #[test]
    fn test_overtime_labels_follow_lookup_table() {
        let scheme = PeriodScheme::default();
        assert_eq!(scheme.ordinal("OT1").unwrap(), 3);
        assert_eq!(scheme.ordinal("ot2").unwrap(), 4);
        assert_eq!(scheme.ordinal("SO").unwrap(), 5);
        assert_eq!(scheme.period_offset("OT1").unwrap(), 3000);
    }

    #[test]
    fn test_unlisted_labels_are_rejected() {
        let scheme = PeriodScheme::default();
        assert_eq!(
            scheme.ordinal("OT3"),
            Err(PeriodError::UnknownLabel("OT3".to_string()))
        );
        assert_eq!(scheme.ordinal("0"), Err(PeriodError::ZeroPeriod));
    }

    #[test]
    fn test_display() {
        assert_eq!(GameTime::new("2", 305).to_string(), "2 05:05");
    }
}
