use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;

use crate::domains::game_clock::{LiveClock, DEFAULT_JUMP_THRESHOLD_SECONDS};
use crate::domains::game_events::{CategoryTable, PeriodScheme, DEFAULT_PERIOD_LENGTH_SECONDS};

/// Configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub nats_url: Option<String>,
    pub period_length_seconds: u32,
    pub regular_periods: u32,
    pub overtime_labels: Vec<String>,
    pub clock_jump_threshold_seconds: u64,
    pub category_table_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        let periods = PeriodScheme::default();
        Self {
            database_url: None,
            nats_url: None,
            period_length_seconds: periods.period_length_seconds,
            regular_periods: periods.regular_periods,
            overtime_labels: periods.overtime_labels,
            clock_jump_threshold_seconds: DEFAULT_JUMP_THRESHOLD_SECONDS,
            category_table_path: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").ok(),
            nats_url: env::var("NATS_URL").ok(),
            period_length_seconds: env::var("PERIOD_LENGTH_SECONDS")
                .unwrap_or_else(|_| DEFAULT_PERIOD_LENGTH_SECONDS.to_string())
                .parse()
                .context("PERIOD_LENGTH_SECONDS must be a valid number")?,
            regular_periods: env::var("REGULAR_PERIODS")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .context("REGULAR_PERIODS must be a valid number")?,
            overtime_labels: env::var("OVERTIME_LABELS")
                .map(|raw| parse_labels(&raw))
                .unwrap_or_else(|_| PeriodScheme::default().overtime_labels),
            clock_jump_threshold_seconds: env::var("CLOCK_JUMP_THRESHOLD_SECONDS")
                .unwrap_or_else(|_| DEFAULT_JUMP_THRESHOLD_SECONDS.to_string())
                .parse()
                .context("CLOCK_JUMP_THRESHOLD_SECONDS must be a valid number")?,
            category_table_path: env::var("CATEGORY_TABLE_PATH").ok().map(PathBuf::from),
        })
    }

    pub fn require_database_url(&self) -> Result<&str> {
        self.database_url
            .as_deref()
            .context("DATABASE_URL must be set")
    }

    pub fn period_scheme(&self) -> PeriodScheme {
        PeriodScheme {
            period_length_seconds: self.period_length_seconds,
            regular_periods: self.regular_periods,
            overtime_labels: self.overtime_labels.clone(),
        }
    }

    pub fn live_clock(&self) -> LiveClock {
        LiveClock::with_threshold(self.clock_jump_threshold_seconds)
    }

    /// The built-in table unless a replacement mapping is configured
    pub fn category_table(&self) -> Result<CategoryTable> {
        match &self.category_table_path {
            Some(path) => CategoryTable::load(path),
            None => Ok(CategoryTable::current()),
        }
    }
}

fn parse_labels(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(str::to_string)
        .collect()
}
