use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SimError};
use crate::profile::InjuryProfile;

/// Separator between team and athlete name in the rendered identity
pub const ID_SEPARATOR: &str = "__";

/// Composite athlete identity (team + name)
///
/// Rendered and serialized as `"<team>__<name>"` so it can key JSON maps.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AthleteId {
    pub team: String,
    pub name: String,
}

impl AthleteId {
    pub fn new(team: impl Into<String>, name: impl Into<String>) -> Self {
        AthleteId {
            team: team.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for AthleteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.team, ID_SEPARATOR, self.name)
    }
}

impl FromStr for AthleteId {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.split_once(ID_SEPARATOR) {
            Some((team, name)) if !team.is_empty() && !name.is_empty() => {
                Ok(AthleteId::new(team, name))
            }
            _ => Err(format!("Invalid athlete id: {}", s)),
        }
    }
}

impl TryFrom<String> for AthleteId {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AthleteId> for String {
    fn from(id: AthleteId) -> Self {
        id.to_string()
    }
}

/// Roster entry consumed by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Athlete {
    /// Display name, unique within a team
    pub name: String,

    /// Resolved injury statistics (individual or league average)
    pub profile: InjuryProfile,
}

impl Athlete {
    pub fn new(name: impl Into<String>, profile: InjuryProfile) -> Self {
        Athlete {
            name: name.into(),
            profile,
        }
    }

    pub fn id(&self, team: &str) -> AthleteId {
        AthleteId::new(team, self.name.clone())
    }
}

/// One injury episode, active or historical
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Injury {
    pub athlete: AthleteId,

    /// Injury type label, e.g. "Hamstring Injury"
    pub injury_type: String,

    pub start_date: NaiveDate,

    /// First day the athlete is available again (exclusive upper bound)
    pub return_date: NaiveDate,

    /// Always >= 1 and equal to `return_date - start_date`
    pub days_missed: u32,
}

impl Injury {
    /// Create an injury starting on `start_date` lasting `days_missed` days
    pub fn new(
        athlete: AthleteId,
        injury_type: impl Into<String>,
        start_date: NaiveDate,
        days_missed: u32,
    ) -> Result<Self> {
        let return_date = add_days(start_date, days_missed)?;
        Ok(Injury {
            athlete,
            injury_type: injury_type.into(),
            start_date,
            return_date,
            days_missed,
        })
    }

    /// Athlete is unavailable on `date`
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date < self.return_date
    }

    /// Whether the athlete is available again on `date`
    pub fn has_ended_by(&self, date: NaiveDate) -> bool {
        self.return_date <= date
    }

    /// Days until return, negative once the return date has passed
    pub fn days_until_return(&self, date: NaiveDate) -> i64 {
        (self.return_date - date).num_days()
    }
}

/// Per-athlete fatigue scores (0 = fresh, 100 = exhausted)
pub type FatigueMap = BTreeMap<AthleteId, u8>;

/// Per-athlete end date of the elevated re-injury risk window
pub type RecoveryMap = BTreeMap<AthleteId, NaiveDate>;

/// Days before return at which an injured athlete counts as returning soon
pub const RETURNING_SOON_DAYS: i64 = 3;

/// Availability of an athlete on a given date
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AvailabilityStatus {
    Injured,
    ReturningSoon,
    Recovering,
    Available,
}

impl AvailabilityStatus {
    /// Classify an athlete from the active injuries and recovery windows
    pub fn for_athlete(
        athlete: &AthleteId,
        date: NaiveDate,
        active_injuries: &[Injury],
        recovery: Option<&RecoveryMap>,
    ) -> Self {
        if let Some(injury) = active_injuries.iter().find(|i| &i.athlete == athlete) {
            if injury.days_until_return(date) <= RETURNING_SOON_DAYS {
                return AvailabilityStatus::ReturningSoon;
            }
            return AvailabilityStatus::Injured;
        }

        match recovery.and_then(|r| r.get(athlete)) {
            Some(window_end) if *window_end > date => AvailabilityStatus::Recovering,
            _ => AvailabilityStatus::Available,
        }
    }
}

impl fmt::Display for AvailabilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AvailabilityStatus::Injured => write!(f, "Injured"),
            AvailabilityStatus::ReturningSoon => write!(f, "Returning soon"),
            AvailabilityStatus::Recovering => write!(f, "Recovering"),
            AvailabilityStatus::Available => write!(f, "Available"),
        }
    }
}

/// Calendar arithmetic that reports overflow instead of panicking
pub(crate) fn add_days(date: NaiveDate, days: u32) -> Result<NaiveDate> {
    date.checked_add_days(Days::new(days as u64))
        .ok_or(SimError::DateOverflow { date, days })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_athlete_id_round_trip() {
        let id = AthleteId::new("Arsenal", "Bukayo Saka");
        assert_eq!(id.to_string(), "Arsenal__Bukayo Saka");
        assert_eq!("Arsenal__Bukayo Saka".parse::<AthleteId>().unwrap(), id);
        assert!("no-separator".parse::<AthleteId>().is_err());
        assert!("__Name".parse::<AthleteId>().is_err());
    }

    #[test]
    fn test_athlete_id_as_json_map_key() {
        let mut fatigue = FatigueMap::new();
        fatigue.insert(AthleteId::new("Team", "P1"), 50);

        let json = serde_json::to_string(&fatigue).unwrap();
        assert_eq!(json, r#"{"Team__P1":50}"#);

        let back: FatigueMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fatigue);
    }

    #[test]
    fn test_injury_dates() {
        let injury = Injury::new(AthleteId::new("Team", "P1"), "Muscle Injury", date(2025, 1, 1), 9)
            .unwrap();
        assert_eq!(injury.return_date, date(2025, 1, 10));
        assert!(injury.is_active_on(date(2025, 1, 9)));
        assert!(!injury.is_active_on(date(2025, 1, 10)));
        assert!(injury.has_ended_by(date(2025, 1, 10)));
        assert_eq!(injury.days_until_return(date(2025, 1, 7)), 3);
    }

    #[test]
    fn test_availability_status() {
        let athlete = AthleteId::new("Team", "P1");
        let today = date(2025, 1, 1);
        let injury = Injury::new(athlete.clone(), "Knock", today, 10).unwrap();

        assert_eq!(
            AvailabilityStatus::for_athlete(&athlete, today, &[injury.clone()], None),
            AvailabilityStatus::Injured
        );
        assert_eq!(
            AvailabilityStatus::for_athlete(&athlete, date(2025, 1, 8), &[injury], None),
            AvailabilityStatus::ReturningSoon
        );

        let mut recovery = RecoveryMap::new();
        recovery.insert(athlete.clone(), date(2025, 1, 5));
        assert_eq!(
            AvailabilityStatus::for_athlete(&athlete, today, &[], Some(&recovery)),
            AvailabilityStatus::Recovering
        );
        assert_eq!(
            AvailabilityStatus::for_athlete(&athlete, date(2025, 1, 5), &[], Some(&recovery)),
            AvailabilityStatus::Available
        );
    }
}
