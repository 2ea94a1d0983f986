//! Match participation ledger
//!
//! Converts a per-match lineup into fatigue load applied once on the match
//! date, on top of the range driver's own daily decay and background load.
//! The ledger is an append-only log of played matches kept for history.
//!
//! Injured athletes are always forced to [`MatchRole::Rested`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

use crate::error::{Result, SimError};
use crate::fatigue::{self, MatchRole, MAX_FATIGUE};
use crate::models::{Athlete, AthleteId, FatigueMap, Injury};
use crate::random::RandomSource;
use crate::simulation::{RangeOutcome, SimulationEngine, SimulationMode};

/// Players that can start a single match
pub const MAX_STARTERS: usize = 11;

/// Role of every athlete for one match
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lineup {
    roles: BTreeMap<AthleteId, MatchRole>,
}

impl Lineup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starters from `squad`, everyone else rested; injured athletes never start
    pub fn from_squad(
        roster: &[Athlete],
        team: &str,
        squad: &[AthleteId],
        active_injuries: &[Injury],
    ) -> Self {
        let injured = injured_ids(active_injuries);
        let roles = roster
            .iter()
            .map(|athlete| {
                let id = athlete.id(team);
                let role = if !injured.contains(&id) && squad.contains(&id) {
                    MatchRole::Starter
                } else {
                    MatchRole::Rested
                };
                (id, role)
            })
            .collect();
        Lineup { roles }
    }

    pub fn set(&mut self, athlete: AthleteId, role: MatchRole) {
        self.roles.insert(athlete, role);
    }

    /// Role of an athlete, rested when absent from the lineup
    pub fn role(&self, athlete: &AthleteId) -> MatchRole {
        self.roles.get(athlete).copied().unwrap_or(MatchRole::Rested)
    }

    pub fn starter_count(&self) -> usize {
        self.count(MatchRole::Starter)
    }

    pub fn count(&self, role: MatchRole) -> usize {
        self.roles.values().filter(|r| **r == role).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AthleteId, MatchRole)> {
        self.roles.iter().map(|(id, role)| (id, *role))
    }

    /// Rotate rested -> starter (or sub when the XI is full) -> sub -> rested
    ///
    /// Injured athletes keep their current role.
    pub fn cycle_role(&mut self, athlete: &AthleteId, active_injuries: &[Injury]) -> MatchRole {
        let current = self.role(athlete);
        if injured_ids(active_injuries).contains(athlete) {
            return current;
        }

        let next = match current {
            MatchRole::Rested if self.starter_count() < MAX_STARTERS => MatchRole::Starter,
            MatchRole::Rested => MatchRole::Sub,
            MatchRole::Starter => MatchRole::Sub,
            MatchRole::Sub => MatchRole::Rested,
        };
        self.roles.insert(athlete.clone(), next);
        next
    }

    /// Copy of the lineup with every injured athlete rested
    pub fn without_injured(&self, active_injuries: &[Injury]) -> Self {
        let injured = injured_ids(active_injuries);
        let roles = self
            .roles
            .iter()
            .map(|(id, role)| {
                let role = if injured.contains(id) { MatchRole::Rested } else { *role };
                (id.clone(), role)
            })
            .collect();
        Lineup { roles }
    }
}

/// One played match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchEntry {
    pub date: NaiveDate,
    pub lineup: Lineup,
}

impl MatchEntry {
    /// Entry for `lineup` with injured athletes rested
    pub fn new(date: NaiveDate, lineup: &Lineup, active_injuries: &[Injury]) -> Self {
        MatchEntry {
            date,
            lineup: lineup.without_injured(active_injuries),
        }
    }
}

/// Append-only log of played matches
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchLedger {
    entries: Vec<MatchEntry>,
}

impl MatchLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a match, resting anyone in `active_injuries`
    pub fn record_match(
        &mut self,
        date: NaiveDate,
        lineup: &Lineup,
        active_injuries: &[Injury],
    ) -> &MatchEntry {
        self.push(MatchEntry::new(date, lineup, active_injuries))
    }

    fn push(&mut self, entry: MatchEntry) -> &MatchEntry {
        debug!(
            date = %entry.date,
            starters = entry.lineup.starter_count(),
            subs = entry.lineup.count(MatchRole::Sub),
            "Match recorded"
        );
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[MatchEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&MatchEntry> {
        self.entries.last()
    }

    /// Matches played in `from..=to`
    pub fn between(&self, from: NaiveDate, to: NaiveDate) -> impl Iterator<Item = &MatchEntry> {
        self.entries
            .iter()
            .filter(move |e| e.date >= from && e.date <= to)
    }

    /// Appearances of an athlete by role across the whole ledger
    pub fn appearances(&self, athlete: &AthleteId) -> (usize, usize) {
        self.entries.iter().fold((0, 0), |(starts, subs), entry| {
            match entry.lineup.role(athlete) {
                MatchRole::Starter => (starts + 1, subs),
                MatchRole::Sub => (starts, subs + 1),
                MatchRole::Rested => (starts, subs),
            }
        })
    }

    /// Load fatigue for a match on `match_date`, then simulate up to `to`
    ///
    /// The match is recorded only when both steps succeed. In basic mode the
    /// match is still recorded but no load is applied.
    #[allow(clippy::too_many_arguments)]
    pub fn play_and_advance<R: RandomSource + ?Sized>(
        &mut self,
        engine: &SimulationEngine,
        roster: &[Athlete],
        active_injuries: &[Injury],
        team: &str,
        match_date: NaiveDate,
        to: NaiveDate,
        lineup: &Lineup,
        mode: SimulationMode,
        rng: &mut R,
    ) -> Result<RangeOutcome> {
        if to <= match_date {
            return Err(SimError::InvalidDateRange {
                from: match_date,
                to,
            });
        }

        let default_score = engine.policy().initial_fatigue;
        let entry = MatchEntry::new(match_date, lineup, active_injuries);

        let mode = match mode {
            SimulationMode::Basic => SimulationMode::Basic,
            SimulationMode::WithFatigue { fatigue, recovery } => SimulationMode::WithFatigue {
                fatigue: apply_match_day(&fatigue, &entry, default_score)?,
                recovery,
            },
        };

        let outcome =
            engine.simulate_range(roster, active_injuries, team, match_date, to, mode, rng)?;
        // only matches whose load was applied become history
        self.push(entry);
        Ok(outcome)
    }
}

/// Fatigue after one match; untracked athletes start from `default_score`
///
/// Every athlete in the lineup ends up tracked, so an untracked rested
/// athlete is inserted at `default_score` with no load added.
pub fn apply_match_day(
    scores: &FatigueMap,
    entry: &MatchEntry,
    default_score: u8,
) -> Result<FatigueMap> {
    let mut updated = scores.clone();

    for (athlete, role) in entry.lineup.iter() {
        let current = updated.get(athlete).copied().unwrap_or(default_score);
        if current > MAX_FATIGUE {
            return Err(SimError::FatigueOutOfRange {
                athlete: athlete.clone(),
                score: current,
            });
        }
        updated.insert(athlete.clone(), fatigue::match_load(current, role));
    }

    Ok(updated)
}

fn injured_ids(active_injuries: &[Injury]) -> HashSet<&AthleteId> {
    active_injuries.iter().map(|i| &i.athlete).collect()
}
