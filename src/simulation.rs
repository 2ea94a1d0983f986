//! Health-state simulation engine
//!
//! [`SimulationEngine::simulate_day`] advances a roster by exactly one
//! calendar day and reports injuries that occur on it.
//! [`SimulationEngine::simulate_range`] composes day steps over
//! `(from, to]` and keeps the per-athlete state consistent from day to day.
//!
//! # Daily order
//!
//! Each simulated day of a range runs these steps in order:
//!
//! 1. fatigue decay (`-3`), plus background load (`+5`) every third day
//! 2. expired recovery windows are dropped
//! 3. injuries with `return_date <= today` end; the athlete gets a return
//!    fatigue score in `40..=50` and a fresh recovery window
//! 4. new injuries are sampled against the reduced active set
//!
//! Step 3 runs before step 4 so a just-returned athlete's fatigue already
//! affects same-day risk.
//!
//! # Randomness
//!
//! Draws are taken per athlete in roster order: the occurrence draw, then
//! (only on occurrence) two duration draws and one type draw. Recovery-time
//! fatigue draws happen before that day's occurrence draws.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, trace};

use crate::config::SimulationPolicy;
use crate::error::{Result, SimError};
use crate::fatigue::{self, MAX_FATIGUE};
use crate::models::{add_days, Athlete, AthleteId, FatigueMap, Injury, RecoveryMap};
use crate::random::RandomSource;

/// Whether fatigue and recovery-window tracking are enabled
///
/// The maps are owned: a range call takes them and hands back the updated
/// versions in its outcome.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SimulationMode {
    /// Injury occurrence from profile frequency alone
    #[default]
    Basic,
    /// Fatigue-scaled risk plus post-injury recovery windows
    WithFatigue {
        fatigue: FatigueMap,
        recovery: RecoveryMap,
    },
}

impl SimulationMode {
    pub fn with_fatigue(fatigue: FatigueMap, recovery: RecoveryMap) -> Self {
        SimulationMode::WithFatigue { fatigue, recovery }
    }

    /// Fatigue tracking with every athlete starting at `score`
    pub fn with_initial_fatigue(roster: &[Athlete], team: &str, score: u8) -> Self {
        let fatigue = roster.iter().map(|a| (a.id(team), score)).collect();
        SimulationMode::with_fatigue(fatigue, RecoveryMap::new())
    }

    pub fn fatigue(&self) -> Option<&FatigueMap> {
        match self {
            SimulationMode::Basic => None,
            SimulationMode::WithFatigue { fatigue, .. } => Some(fatigue),
        }
    }

    pub fn recovery(&self) -> Option<&RecoveryMap> {
        match self {
            SimulationMode::Basic => None,
            SimulationMode::WithFatigue { recovery, .. } => Some(recovery),
        }
    }

    pub fn is_tracking_fatigue(&self) -> bool {
        matches!(self, SimulationMode::WithFatigue { .. })
    }

    /// Reject caller-supplied scores above the 0..=100 scale
    pub fn validate(&self) -> Result<()> {
        if let Some(fatigue) = self.fatigue() {
            if let Some((athlete, &score)) = fatigue.iter().find(|(_, &s)| s > MAX_FATIGUE) {
                return Err(SimError::FatigueOutOfRange {
                    athlete: athlete.clone(),
                    score,
                });
            }
        }
        Ok(())
    }
}

/// Result of a single simulated day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayOutcome {
    /// Injuries starting on this date
    pub new_injuries: Vec<Injury>,

    /// Previous active set plus the new injuries
    pub active_injuries: Vec<Injury>,
}

/// Result of simulating a date range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeOutcome {
    /// Every injury that started inside the range, in date order
    pub new_injuries: Vec<Injury>,

    /// Names of athletes who returned during the range, first return first
    pub recovered: Vec<String>,

    /// Injuries still active on the final day
    pub active_injuries: Vec<Injury>,

    /// Updated tracking state (maps are `None` in basic mode)
    pub mode: SimulationMode,
}

impl RangeOutcome {
    pub fn fatigue(&self) -> Option<&FatigueMap> {
        self.mode.fatigue()
    }

    pub fn recovery(&self) -> Option<&RecoveryMap> {
        self.mode.recovery()
    }
}

/// Core injury simulation engine
#[derive(Debug, Clone, Default)]
pub struct SimulationEngine {
    policy: SimulationPolicy,
}

impl SimulationEngine {
    /// Create engine with the default policy
    pub fn new() -> Self {
        SimulationEngine {
            policy: SimulationPolicy::default(),
        }
    }

    /// Create engine with a custom policy
    pub fn with_policy(policy: SimulationPolicy) -> Result<Self> {
        policy.validate()?;
        Ok(SimulationEngine { policy })
    }

    pub fn policy(&self) -> &SimulationPolicy {
        &self.policy
    }

    /// Simulate one day for every athlete not already injured
    pub fn simulate_day<R: RandomSource + ?Sized>(
        &self,
        roster: &[Athlete],
        active_injuries: &[Injury],
        team: &str,
        date: NaiveDate,
        mode: &SimulationMode,
        rng: &mut R,
    ) -> Result<DayOutcome> {
        mode.validate()?;

        let new_injuries = self.sample_injuries(roster, active_injuries, team, date, mode, rng)?;
        let mut active = active_injuries.to_vec();
        active.extend(new_injuries.iter().cloned());

        Ok(DayOutcome {
            new_injuries,
            active_injuries: active,
        })
    }

    /// Simulate every day in `(from, to]`
    pub fn simulate_range<R: RandomSource + ?Sized>(
        &self,
        roster: &[Athlete],
        active_injuries: &[Injury],
        team: &str,
        from: NaiveDate,
        to: NaiveDate,
        mode: SimulationMode,
        rng: &mut R,
    ) -> Result<RangeOutcome> {
        if to <= from {
            return Err(SimError::InvalidDateRange { from, to });
        }
        mode.validate()?;

        let _span = tracing::info_span!("simulate_range", %team, %from, %to).entered();

        let mut mode = mode;
        let mut active = active_injuries.to_vec();
        let mut all_new = Vec::new();
        let mut recovered: Vec<String> = Vec::new();

        let mut date = from;
        let mut day_count: u32 = 0;
        while date < to {
            date = date
                .succ_opt()
                .ok_or(SimError::DateOverflow { date, days: 1 })?;
            day_count += 1;

            if let SimulationMode::WithFatigue { fatigue: scores, recovery: windows } = &mut mode {
                apply_daily_load(scores, day_count);
                windows.retain(|_, window_end| *window_end > date);
            }

            let (ended, still_active): (Vec<Injury>, Vec<Injury>) =
                active.into_iter().partition(|injury| injury.has_ended_by(date));
            active = still_active;

            for injury in ended {
                debug!(athlete = %injury.athlete, %date, injury_type = %injury.injury_type, "Athlete recovered");
                if !recovered.contains(&injury.athlete.name) {
                    recovered.push(injury.athlete.name.clone());
                }
                if let SimulationMode::WithFatigue { fatigue: scores, recovery: windows } = &mut mode {
                    scores.insert(injury.athlete.clone(), fatigue::return_from_injury_fatigue(rng));
                    let window = self.policy.recovery_window_days(injury.days_missed);
                    windows.insert(injury.athlete.clone(), add_days(date, window)?);
                }
            }

            let new_injuries = self.sample_injuries(roster, &active, team, date, &mode, rng)?;
            trace!(%date, day_count, new = new_injuries.len(), active = active.len(), "Simulated day");

            active.extend(new_injuries.iter().cloned());
            all_new.extend(new_injuries);
        }

        info!(
            days = day_count,
            new_injuries = all_new.len(),
            recovered = recovered.len(),
            still_injured = active.len(),
            "Range simulated"
        );

        Ok(RangeOutcome {
            new_injuries: all_new,
            recovered,
            active_injuries: active,
            mode,
        })
    }

    /// Injury risk for one athlete on `date` under `mode`
    pub fn daily_risk(
        &self,
        athlete: &Athlete,
        id: &AthleteId,
        date: NaiveDate,
        mode: &SimulationMode,
    ) -> f64 {
        let mut probability = athlete.profile.daily_probability(self.policy.days_per_season);

        if let SimulationMode::WithFatigue { fatigue: scores, recovery: windows } = mode {
            if let Some(&score) = scores.get(id) {
                probability *= fatigue::risk_multiplier(score);
            }
            if matches!(windows.get(id), Some(window_end) if *window_end > date) {
                probability *= self.policy.recovery_risk_multiplier;
            }
        }

        probability
    }

    fn sample_injuries<R: RandomSource + ?Sized>(
        &self,
        roster: &[Athlete],
        active_injuries: &[Injury],
        team: &str,
        date: NaiveDate,
        mode: &SimulationMode,
        rng: &mut R,
    ) -> Result<Vec<Injury>> {
        let mut unavailable: HashSet<AthleteId> =
            active_injuries.iter().map(|i| i.athlete.clone()).collect();
        let mut new_injuries = Vec::new();

        for athlete in roster {
            let id = athlete.id(team);
            if unavailable.contains(&id) {
                continue;
            }

            let profile = &athlete.profile;
            // NaN rates would never fail the occurrence comparison
            profile
                .check_statistics()
                .map_err(|e| SimError::profile(id.to_string(), e))?;

            let probability = self.daily_risk(athlete, &id, date, mode);
            if rng.uniform() >= probability {
                continue;
            }

            let days_missed = profile
                .sample_duration(rng, self.policy.min_injury_days, self.policy.max_injury_days)
                .map_err(|e| SimError::profile(id.to_string(), e))?;
            let injury_type = profile
                .sample_injury_type(rng)
                .map_err(|e| SimError::profile(id.to_string(), e))?;

            let injury = Injury::new(id.clone(), injury_type, date, days_missed)?;
            debug!(
                athlete = %injury.athlete,
                %date,
                injury_type = %injury.injury_type,
                days_missed,
                return_date = %injury.return_date,
                "New injury"
            );

            unavailable.insert(id);
            new_injuries.push(injury);
        }

        Ok(new_injuries)
    }
}

/// One day of decay, plus background load on every third simulated day
fn apply_daily_load(scores: &mut FatigueMap, day_count: u32) {
    let background_day = day_count % fatigue::BACKGROUND_LOAD_INTERVAL_DAYS == 0;
    for score in scores.values_mut() {
        *score = fatigue::decay(*score, 1);
        if background_day {
            *score = fatigue::background_load(*score, fatigue::BACKGROUND_LOAD_INTERVAL_DAYS);
        }
    }
}
