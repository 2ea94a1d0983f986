// Library interface for injury-sim modules
// The CLI and integration tests drive the engine through these exports

pub mod config;
pub mod dataset;
pub mod error;
pub mod fatigue;
#[cfg(feature = "match-ledger")]
pub mod ledger;
pub mod logging;
pub mod models;
pub mod profile;
pub mod random;
pub mod simulation;

// Re-export commonly used types for convenience
pub use config::{AppConfig, SimulationPolicy};
pub use dataset::Dataset;
pub use error::{Result, SimError};
pub use fatigue::{FatigueBadge, MatchRole};
#[cfg(feature = "match-ledger")]
pub use ledger::{Lineup, MatchEntry, MatchLedger};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use models::*;
pub use profile::InjuryProfile;
pub use random::{RandomSource, RngSource, ScriptedSource};
pub use simulation::{DayOutcome, RangeOutcome, SimulationEngine, SimulationMode};
