//! Prepared team dataset
//!
//! The data preparation job writes a `teams.json` holding every team's
//! players and a league-average injury profile. Players the job could not
//! match to an injury history carry no profile and fall back to the league
//! average when a roster is built.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{DatasetError, Result, SimError};
use crate::models::{Athlete, AthleteId};
use crate::profile::{InjuryProfile, ProfileSource};

/// Player record as written by the data preparation job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    pub name: String,

    #[serde(default)]
    pub position: Option<String>,

    #[serde(default)]
    pub age: Option<u8>,

    #[serde(default)]
    pub overall: Option<u8>,

    /// Absent when the player has no injury history of their own
    #[serde(default)]
    pub injury_profile: Option<InjuryProfile>,
}

impl PlayerRecord {
    pub fn profile_source(&self) -> ProfileSource {
        ProfileSource::from_option(self.injury_profile.clone())
    }
}

/// One team and its players
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRecord {
    pub name: String,

    #[serde(default)]
    pub league: String,

    pub players: Vec<PlayerRecord>,
}

/// Contents of `teams.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub league_average: InjuryProfile,

    pub teams: Vec<TeamRecord>,
}

impl Dataset {
    /// Load and validate a dataset file
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DatasetError::FileNotFound {
                path: path.to_path_buf(),
            }
            .into());
        }

        let content = fs::read_to_string(path).map_err(DatasetError::from)?;
        let dataset = Self::from_json(&content).map_err(|e| match e {
            SimError::Dataset(DatasetError::Parse { reason, .. }) => {
                SimError::Dataset(DatasetError::Parse {
                    path: path.to_path_buf(),
                    reason,
                })
            }
            other => other,
        })?;

        debug!(
            path = %path.display(),
            teams = dataset.teams.len(),
            "Dataset loaded"
        );
        Ok(dataset)
    }

    /// Parse and validate dataset JSON
    pub fn from_json(content: &str) -> Result<Self> {
        let dataset: Dataset =
            serde_json::from_str(content).map_err(|e| DatasetError::Parse {
                path: Default::default(),
                reason: e.to_string(),
            })?;
        dataset.validate()?;
        Ok(dataset)
    }

    /// Check the league average and every individual profile
    pub fn validate(&self) -> Result<()> {
        self.league_average
            .validate()
            .map_err(|e| SimError::profile("league average", e))?;

        for team in &self.teams {
            for player in &team.players {
                if let Some(profile) = &player.injury_profile {
                    profile.validate().map_err(|e| {
                        SimError::profile(AthleteId::new(&team.name, &player.name).to_string(), e)
                    })?;
                }
            }
        }

        Ok(())
    }

    pub fn team(&self, name: &str) -> Option<&TeamRecord> {
        self.teams.iter().find(|t| t.name == name)
    }

    pub fn team_names(&self) -> impl Iterator<Item = &str> {
        self.teams.iter().map(|t| t.name.as_str())
    }

    /// Engine roster for a team with league-average fallback applied
    pub fn roster(&self, team: &str) -> Result<Vec<Athlete>> {
        let record = self
            .team(team)
            .ok_or_else(|| DatasetError::UnknownTeam(team.to_string()))?;

        let roster: Vec<Athlete> = record
            .players
            .iter()
            .map(|player| {
                let source = player.profile_source();
                Athlete::new(
                    player.name.clone(),
                    source.resolve(&self.league_average).clone(),
                )
            })
            .collect();

        let fallback = record
            .players
            .iter()
            .filter(|p| !p.profile_source().is_individual())
            .count();
        if fallback == record.players.len() && !record.players.is_empty() {
            warn!(%team, "No player has an individual injury profile");
        }
        debug!(%team, players = roster.len(), fallback, "Roster resolved");

        Ok(roster)
    }
}
