//! Unified error hierarchy for injury-sim
//!
//! The engine performs no I/O, so every engine error is a precondition
//! violation by the caller. Dataset and configuration errors come from the
//! surrounding file handling.

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

use crate::models::AthleteId;

/// Top-level error type for all injury-sim operations
#[derive(Debug, Error)]
pub enum SimError {
    /// `to` must be strictly after `from`
    #[error("Invalid date range: {to} is not after {from}")]
    InvalidDateRange { from: NaiveDate, to: NaiveDate },

    /// A caller supplied a fatigue score outside 0..=100
    #[error("Fatigue score {score} for {athlete} is outside 0..=100")]
    FatigueOutOfRange { athlete: AthleteId, score: u8 },

    /// Injury profile errors
    #[error("Profile error for {athlete}: {source}")]
    Profile {
        athlete: String,
        #[source]
        source: ProfileError,
    },

    /// Dataset loading errors
    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Date arithmetic left the representable calendar
    #[error("Date overflow: {date} + {days} days")]
    DateOverflow { date: NaiveDate, days: u32 },
}

/// Injury profile validation and sampling errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProfileError {
    /// No injury types to sample from
    #[error("injury type distribution is empty")]
    EmptyTypeWeights,

    /// Type weights must form a probability distribution
    #[error("injury type weights sum to {sum}, expected 1.0")]
    WeightsNotNormalized { sum: f64 },

    /// Individual weight is negative or not finite
    #[error("invalid weight {weight} for injury type {injury_type}")]
    InvalidWeight { injury_type: String, weight: f64 },

    /// Injury frequency is negative or not finite
    #[error("invalid injuries per season: {0}")]
    InvalidRate(f64),

    /// Duration statistics are negative or not finite
    #[error("invalid duration statistics: mean={mean}, std_dev={std_dev}")]
    InvalidDuration { mean: f64, std_dev: f64 },
}

/// Errors reading the prepared team dataset
#[derive(Debug, Error)]
pub enum DatasetError {
    /// File not found at specified path
    #[error("Dataset file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Malformed JSON
    #[error("Failed to parse dataset {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    /// Requested team is not in the dataset
    #[error("Unknown team: {0}")]
    UnknownTeam(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for injury-sim operations
pub type Result<T> = std::result::Result<T, SimError>;

impl SimError {
    pub(crate) fn profile(athlete: impl Into<String>, source: ProfileError) -> Self {
        SimError::Profile {
            athlete: athlete.into(),
            source,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            SimError::Dataset(DatasetError::UnknownTeam(_)) => ErrorSeverity::Warning,
            SimError::Dataset(DatasetError::FileNotFound { .. }) => ErrorSeverity::Warning,
            SimError::Configuration(_) => ErrorSeverity::Warning,
            SimError::Profile { .. } => ErrorSeverity::Critical,
            SimError::FatigueOutOfRange { .. } => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            SimError::InvalidDateRange { from, to } => {
                format!("Target date {} must be after the current date {}.", to, from)
            }
            SimError::Dataset(DatasetError::FileNotFound { path }) => {
                format!(
                    "Could not find team data at {}. Run the data preparation step first.",
                    path.display()
                )
            }
            SimError::Dataset(DatasetError::UnknownTeam(team)) => {
                format!("No team named '{}' in the dataset.", team)
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Corrupted upstream data, the run cannot be trusted
    Critical,
    /// Error that prevents the operation
    Error,
    /// Recoverable by fixing the invocation
    Warning,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical | ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
        }
    }
}
