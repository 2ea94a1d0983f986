//! Fatigue model
//!
//! Fatigue is an integer load score from 0 (fully fresh) to 100 (maximal
//! fatigue). Every transition here is a pure function that clamps its result
//! into that range. The score feeds injury risk through a piecewise
//! multiplier:
//!
//! | Score  | Multiplier |
//! |--------|------------|
//! | 0-25   | 0.85       |
//! | 26-50  | 1.00       |
//! | 51-70  | 1.25       |
//! | 71-85  | 1.50       |
//! | 86-100 | 2.00       |

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::FatigueMap;
use crate::random::RandomSource;

pub const MIN_FATIGUE: u8 = 0;
pub const MAX_FATIGUE: u8 = 100;

/// Score recovered per rest day
pub const DECAY_PER_DAY: u32 = 3;

/// Background competitive load added once per interval
pub const BACKGROUND_LOAD: u32 = 5;
pub const BACKGROUND_LOAD_INTERVAL_DAYS: u32 = 3;

pub const STARTER_LOAD: u8 = 15;
pub const SUB_LOAD: u8 = 8;

/// Bounds of the score assigned to an athlete returning from injury
pub const RETURN_FATIGUE_MIN: u32 = 40;
pub const RETURN_FATIGUE_MAX: u32 = 50;

/// Participation of an athlete in a single match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchRole {
    Starter,
    Sub,
    Rested,
}

impl MatchRole {
    /// Fatigue added by playing in this role
    pub fn load(&self) -> u8 {
        match self {
            MatchRole::Starter => STARTER_LOAD,
            MatchRole::Sub => SUB_LOAD,
            MatchRole::Rested => 0,
        }
    }
}

impl fmt::Display for MatchRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchRole::Starter => write!(f, "starter"),
            MatchRole::Sub => write!(f, "sub"),
            MatchRole::Rested => write!(f, "rested"),
        }
    }
}

impl std::str::FromStr for MatchRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "starter" => Ok(MatchRole::Starter),
            "sub" | "substitute" => Ok(MatchRole::Sub),
            "rested" => Ok(MatchRole::Rested),
            _ => Err(format!("Invalid match role: {}", s)),
        }
    }
}

/// Advisory fatigue classification for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FatigueBadge {
    Fresh,
    /// Normal range, no badge shown
    #[serde(rename = "none")]
    Normal,
    Fatigued,
    HighRisk,
}

impl FatigueBadge {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=25 => FatigueBadge::Fresh,
            26..=50 => FatigueBadge::Normal,
            51..=70 => FatigueBadge::Fatigued,
            _ => FatigueBadge::HighRisk,
        }
    }

    /// Badge label, `None` for the normal range
    pub fn label(&self) -> Option<&'static str> {
        match self {
            FatigueBadge::Fresh => Some("fresh"),
            FatigueBadge::Normal => None,
            FatigueBadge::Fatigued => Some("fatigued"),
            FatigueBadge::HighRisk => Some("high-risk"),
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            FatigueBadge::Fresh => "Fresh and lightly loaded",
            FatigueBadge::Normal => "Normal match load",
            FatigueBadge::Fatigued => "Fatigued (elevated injury risk)",
            FatigueBadge::HighRisk => "High injury risk (rest recommended)",
        }
    }
}

/// Injury risk multiplier for a fatigue score
pub fn risk_multiplier(score: u8) -> f64 {
    match score {
        0..=25 => 0.85,
        26..=50 => 1.0,
        51..=70 => 1.25,
        71..=85 => 1.5,
        _ => 2.0,
    }
}

/// Recovery from `days` of rest, floored at 0
pub fn decay(score: u8, days: u32) -> u8 {
    (score as u32).saturating_sub(days.saturating_mul(DECAY_PER_DAY)) as u8
}

/// Competitive load accumulated outside tracked matches, capped at 100
pub fn background_load(score: u8, days: u32) -> u8 {
    let loads = days / BACKGROUND_LOAD_INTERVAL_DAYS;
    cap((score as u32).saturating_add(loads.saturating_mul(BACKGROUND_LOAD)))
}

/// Apply the load of one match in `role`, capped at 100
pub fn match_load(score: u8, role: MatchRole) -> u8 {
    cap(score as u32 + role.load() as u32)
}

/// Returning athletes are deliberately not fully fresh
pub fn return_from_injury_fatigue<R: RandomSource + ?Sized>(rng: &mut R) -> u8 {
    rng.uniform_int(RETURN_FATIGUE_MIN, RETURN_FATIGUE_MAX) as u8
}

/// Net decay and background load over `days` for every tracked athlete
///
/// Use this or the day-by-day range driver for a given span, never both,
/// or decay is counted twice.
pub fn update_all_for_days(scores: &FatigueMap, days: u32) -> FatigueMap {
    scores
        .iter()
        .map(|(athlete, &score)| (athlete.clone(), background_load(decay(score, days), days)))
        .collect()
}

fn cap(value: u32) -> u8 {
    value.min(MAX_FATIGUE as u32) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AthleteId;
    use crate::random::RngSource;
    use proptest::prelude::*;

    #[test]
    fn test_risk_multiplier_steps() {
        assert_eq!(risk_multiplier(0), 0.85);
        assert_eq!(risk_multiplier(25), 0.85);
        assert_eq!(risk_multiplier(26), 1.0);
        assert_eq!(risk_multiplier(50), 1.0);
        assert_eq!(risk_multiplier(51), 1.25);
        assert_eq!(risk_multiplier(70), 1.25);
        assert_eq!(risk_multiplier(71), 1.5);
        assert_eq!(risk_multiplier(85), 1.5);
        assert_eq!(risk_multiplier(86), 2.0);
        assert_eq!(risk_multiplier(100), 2.0);
    }

    #[test]
    fn test_decay() {
        assert_eq!(decay(50, 1), 47);
        assert_eq!(decay(5, 10), 0);
        assert_eq!(decay(30, 0), 30);
        assert_eq!(decay(100, u32::MAX), 0);
    }

    #[test]
    fn test_background_load() {
        assert_eq!(background_load(30, 2), 30);
        assert_eq!(background_load(30, 3), 35);
        assert_eq!(background_load(98, 6), 100);
        assert_eq!(background_load(0, u32::MAX), 100);
    }

    #[test]
    fn test_match_load() {
        assert_eq!(match_load(20, MatchRole::Starter), 35);
        assert_eq!(match_load(20, MatchRole::Sub), 28);
        assert_eq!(match_load(20, MatchRole::Rested), 20);
        assert_eq!(match_load(95, MatchRole::Starter), 100);
    }

    #[test]
    fn test_return_from_injury_fatigue_range() {
        let mut rng = RngSource::seeded(11);
        let samples: Vec<u8> = (0..500).map(|_| return_from_injury_fatigue(&mut rng)).collect();
        assert!(samples.iter().all(|s| (40..=50).contains(s)));
        assert!(samples.contains(&40));
        assert!(samples.contains(&50));
    }

    #[test]
    fn test_badges() {
        assert_eq!(FatigueBadge::from_score(25), FatigueBadge::Fresh);
        assert_eq!(FatigueBadge::from_score(26), FatigueBadge::Normal);
        assert_eq!(FatigueBadge::from_score(70), FatigueBadge::Fatigued);
        assert_eq!(FatigueBadge::from_score(71), FatigueBadge::HighRisk);
        assert_eq!(FatigueBadge::Normal.label(), None);
        assert_eq!(FatigueBadge::HighRisk.label(), Some("high-risk"));
        assert_eq!(serde_json::to_string(&FatigueBadge::Normal).unwrap(), "\"none\"");
        assert_eq!(
            serde_json::to_string(&FatigueBadge::HighRisk).unwrap(),
            "\"high-risk\""
        );
    }

    #[test]
    fn test_match_role_parsing() {
        assert_eq!("starter".parse::<MatchRole>().unwrap(), MatchRole::Starter);
        assert_eq!("SUB".parse::<MatchRole>().unwrap(), MatchRole::Sub);
        assert!("captain".parse::<MatchRole>().is_err());
    }

    #[test]
    fn test_update_all_for_days() {
        let p1 = AthleteId::new("Team", "p1");
        let p2 = AthleteId::new("Team", "p2");
        let scores: FatigueMap = [(p1.clone(), 50), (p2.clone(), 20)].into_iter().collect();

        let updated = update_all_for_days(&scores, 6);
        assert_eq!(updated[&p1], 42);
        assert_eq!(updated[&p2], 12);
        // input untouched
        assert_eq!(scores[&p1], 50);
    }

    proptest! {
        #[test]
        fn test_risk_multiplier_monotonic(a in 0u8..=100, b in 0u8..=100) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(risk_multiplier(lo) <= risk_multiplier(hi));
            prop_assert!([0.85, 1.0, 1.25, 1.5, 2.0].contains(&risk_multiplier(a)));
        }

        #[test]
        fn test_transitions_stay_in_range(score in 0u8..=100, days in 0u32..1000) {
            prop_assert!(decay(score, days) <= score);
            prop_assert!(background_load(score, days) <= MAX_FATIGUE);
            prop_assert!(background_load(score, days) >= score);
            for role in [MatchRole::Starter, MatchRole::Sub, MatchRole::Rested] {
                prop_assert!(match_load(score, role) <= MAX_FATIGUE);
            }
        }
    }
}
