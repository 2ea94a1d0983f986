//! Injury profile statistics and the samplers that consume them
//!
//! Profiles are produced upstream by the data preparation job and are
//! read-only here. Each profile summarises an athlete's injury history:
//!
//! - **Frequency**: expected injuries per 365-day season
//! - **Duration**: mean and standard deviation of days missed
//! - **Type mix**: probability mass per injury type label
//!
//! Athletes without individual history use the league-average profile.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::PI;

use crate::error::ProfileError;
use crate::random::RandomSource;

/// Allowed deviation of the type weights from a total of 1.0
pub const WEIGHT_SUM_TOLERANCE: f64 = 0.01;

/// Per-athlete injury statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InjuryProfile {
    /// Expected injuries per 365-day season
    pub injuries_per_season: f64,

    pub avg_days_missed: f64,

    pub std_dev_days_missed: f64,

    /// Probability mass per injury type, walked in key order when sampling
    pub injury_type_weights: BTreeMap<String, f64>,
}

impl InjuryProfile {
    pub fn new(
        injuries_per_season: f64,
        avg_days_missed: f64,
        std_dev_days_missed: f64,
        injury_type_weights: impl IntoIterator<Item = (String, f64)>,
    ) -> Self {
        InjuryProfile {
            injuries_per_season,
            avg_days_missed,
            std_dev_days_missed,
            injury_type_weights: injury_type_weights.into_iter().collect(),
        }
    }

    /// Profile with a single injury type carrying all the mass
    pub fn single_type(
        injuries_per_season: f64,
        avg_days_missed: f64,
        std_dev_days_missed: f64,
        injury_type: impl Into<String>,
    ) -> Self {
        Self::new(
            injuries_per_season,
            avg_days_missed,
            std_dev_days_missed,
            [(injury_type.into(), 1.0)],
        )
    }

    /// Check the statistical invariants of the profile
    pub fn validate(&self) -> Result<(), ProfileError> {
        self.check_statistics()?;

        if self.injury_type_weights.is_empty() {
            return Err(ProfileError::EmptyTypeWeights);
        }

        for (injury_type, &weight) in &self.injury_type_weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ProfileError::InvalidWeight {
                    injury_type: injury_type.clone(),
                    weight,
                });
            }
        }

        let sum: f64 = self.injury_type_weights.values().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ProfileError::WeightsNotNormalized { sum });
        }

        Ok(())
    }

    /// Rate and duration must be finite and non-negative before sampling
    pub fn check_statistics(&self) -> Result<(), ProfileError> {
        if !self.injuries_per_season.is_finite() || self.injuries_per_season < 0.0 {
            return Err(ProfileError::InvalidRate(self.injuries_per_season));
        }

        if !self.avg_days_missed.is_finite()
            || !self.std_dev_days_missed.is_finite()
            || self.avg_days_missed < 0.0
            || self.std_dev_days_missed < 0.0
        {
            return Err(ProfileError::InvalidDuration {
                mean: self.avg_days_missed,
                std_dev: self.std_dev_days_missed,
            });
        }

        Ok(())
    }

    /// Baseline probability of an injury on any single day
    pub fn daily_probability(&self, days_per_season: f64) -> f64 {
        self.injuries_per_season / days_per_season
    }

    /// Sample days missed from N(mean, std_dev), rounded and clamped
    ///
    /// Uses the Box-Muller transform over two uniform draws. The radius is
    /// taken from `ln(1 - u1)` rather than `ln(u1)`: a draw of exactly 0 stays
    /// finite, and a given `u1` maps to the radius of `1 - u1` in the plain
    /// form. The distribution is the same. A zero standard deviation
    /// collapses to the rounded mean.
    ///
    /// Non-finite statistics are rejected instead of producing a duration.
    pub fn sample_duration<R: RandomSource + ?Sized>(
        &self,
        rng: &mut R,
        min_days: u32,
        max_days: u32,
    ) -> Result<u32, ProfileError> {
        let u1 = rng.uniform();
        let u2 = rng.uniform();
        // 1 - u1 lies in (0, 1], keeping ln finite
        let z = (-2.0 * (1.0 - u1).ln()).sqrt() * (2.0 * PI * u2).cos();
        let raw = (self.avg_days_missed + z * self.std_dev_days_missed).round();

        if !raw.is_finite() {
            return Err(ProfileError::InvalidDuration {
                mean: self.avg_days_missed,
                std_dev: self.std_dev_days_missed,
            });
        }

        Ok(raw.clamp(min_days as f64, max_days as f64) as u32)
    }

    /// Sample an injury type by walking the cumulative weight distribution
    pub fn sample_injury_type<R: RandomSource + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<&str, ProfileError> {
        let draw = rng.uniform();
        let mut cumulative = 0.0;
        let mut last = None;

        for (injury_type, weight) in &self.injury_type_weights {
            cumulative += weight;
            if draw < cumulative {
                return Ok(injury_type.as_str());
            }
            last = Some(injury_type.as_str());
        }

        // Rounding can leave a residual above the final cumulative mass
        last.ok_or(ProfileError::EmptyTypeWeights)
    }
}

/// Individual profile with league-average fallback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProfileSource {
    Individual(InjuryProfile),
    LeagueAverage,
}

impl ProfileSource {
    pub fn from_option(profile: Option<InjuryProfile>) -> Self {
        match profile {
            Some(profile) => ProfileSource::Individual(profile),
            None => ProfileSource::LeagueAverage,
        }
    }

    pub fn resolve<'a>(&'a self, league_average: &'a InjuryProfile) -> &'a InjuryProfile {
        match self {
            ProfileSource::Individual(profile) => profile,
            ProfileSource::LeagueAverage => league_average,
        }
    }

    pub fn is_individual(&self) -> bool {
        matches!(self, ProfileSource::Individual(_))
    }
}
