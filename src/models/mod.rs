use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::UnknownKey;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub code: String, // FIFA three-letter code
    pub group_letter: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Scheduled,
    Live,
    Finished,
    Postponed,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "scheduled",
            MatchStatus::Live => "live",
            MatchStatus::Finished => "finished",
            MatchStatus::Postponed => "postponed",
        }
    }
}

impl FromStr for MatchStatus {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(MatchStatus::Scheduled),
            "live" => Ok(MatchStatus::Live),
            "finished" => Ok(MatchStatus::Finished),
            "postponed" => Ok(MatchStatus::Postponed),
            other => Err(UnknownKey::new("match status", other)),
        }
    }
}

/// A group-stage fixture. Participants stay `None` until the draw assigns them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: String,
    pub group_letter: String,
    pub home_team_id: Option<String>,
    pub away_team_id: Option<String>,
    pub match_date: DateTime<Utc>,
    pub status: MatchStatus,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
}

impl Match {
    /// The recorded result, if the match is finished and both scores are in.
    pub fn final_score(&self) -> Option<ScorePair> {
        match (self.status, self.home_score, self.away_score) {
            (MatchStatus::Finished, Some(home), Some(away)) => Some(ScorePair { home, away }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScorePair {
    pub home: i32,
    pub away: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchPrediction {
    pub id: String,
    pub user_id: String,
    pub match_id: String,
    pub home_score: i32,
    pub away_score: i32,
    pub points_earned: Option<i32>,
    pub updated_at: DateTime<Utc>,
}

impl MatchPrediction {
    pub fn score(&self) -> ScorePair {
        ScorePair {
            home: self.home_score,
            away: self.away_score,
        }
    }
}

/// Knockout stages in bracket order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Round {
    #[serde(rename = "round_32")]
    Round32,
    #[serde(rename = "round_16")]
    Round16,
    Quarter,
    Semi,
    Final,
    ThirdPlace,
    Champion,
}

impl Round {
    pub const ALL: [Round; 7] = [
        Round::Round32,
        Round::Round16,
        Round::Quarter,
        Round::Semi,
        Round::Final,
        Round::ThirdPlace,
        Round::Champion,
    ];

    /// Rounds the user fills in by hand; round_32 comes from the group standings.
    pub const MANUAL: [Round; 6] = [
        Round::Round16,
        Round::Quarter,
        Round::Semi,
        Round::Final,
        Round::ThirdPlace,
        Round::Champion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Round::Round32 => "round_32",
            Round::Round16 => "round_16",
            Round::Quarter => "quarter",
            Round::Semi => "semi",
            Round::Final => "final",
            Round::ThirdPlace => "third_place",
            Round::Champion => "champion",
        }
    }

    /// Number of teams a complete selection for this round holds.
    pub fn capacity(&self) -> usize {
        match self {
            Round::Round32 => 32,
            Round::Round16 => 16,
            Round::Quarter => 8,
            Round::Semi => 4,
            Round::Final => 2,
            Round::ThirdPlace => 1,
            Round::Champion => 1,
        }
    }

    pub fn is_manual(&self) -> bool {
        !matches!(self, Round::Round32)
    }

    /// The round whose selection forms this round's candidate pool.
    /// `None` for round_32, whose pool is the group draw itself.
    pub fn feeder(&self) -> Option<Round> {
        match self {
            Round::Round32 => None,
            Round::Round16 => Some(Round::Round32),
            Round::Quarter => Some(Round::Round16),
            Round::Semi => Some(Round::Quarter),
            Round::Final | Round::ThirdPlace => Some(Round::Semi),
            Round::Champion => Some(Round::Final),
        }
    }

    /// Manual rounds that come after this one in bracket order.
    pub fn later_rounds(&self) -> impl Iterator<Item = Round> + '_ {
        Round::MANUAL.into_iter().filter(move |r| r > self)
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Round {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Round::ALL
            .into_iter()
            .find(|round| round.as_str() == s)
            .ok_or_else(|| UnknownKey::new("round", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AwardType {
    GoldenBall,
    GoldenBoot,
    GoldenGlove,
    BestYoung,
    TotalGoals,
}

impl AwardType {
    pub const ALL: [AwardType; 5] = [
        AwardType::GoldenBall,
        AwardType::GoldenBoot,
        AwardType::GoldenGlove,
        AwardType::BestYoung,
        AwardType::TotalGoals,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AwardType::GoldenBall => "golden_ball",
            AwardType::GoldenBoot => "golden_boot",
            AwardType::GoldenGlove => "golden_glove",
            AwardType::BestYoung => "best_young",
            AwardType::TotalGoals => "total_goals",
        }
    }

    /// Player awards carry a name guess; total_goals carries a number.
    pub fn is_player_award(&self) -> bool {
        !matches!(self, AwardType::TotalGoals)
    }
}

impl fmt::Display for AwardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AwardType {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AwardType::ALL
            .into_iter()
            .find(|award| award.as_str() == s)
            .ok_or_else(|| UnknownKey::new("award type", s))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancingPrediction {
    pub user_id: String,
    pub team_id: String,
    pub round: Round,
    pub points_earned: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwardPrediction {
    pub user_id: String,
    pub award_type: AwardType,
    pub player_name: Option<String>,
    pub total_goals_guess: Option<i32>,
    pub points_earned: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActualAdvancing {
    pub team_id: String,
    pub round: Round,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActualAward {
    pub award_type: AwardType,
    pub player_name: Option<String>,
    pub total_goals: Option<i32>,
}

/// Derived per-group aggregate for one team. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamStanding {
    pub team_id: String,
    pub team_name: String,
    pub group_letter: String,
    pub played: u32,
    pub won: u32,
    pub drawn: u32,
    pub lost: u32,
    pub goals_for: i32,
    pub goals_against: i32,
    pub goal_difference: i32,
    pub points: u32,
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user_id: String,
    pub username: String,
    pub match_points: i64,
    pub advancing_points: i64,
    pub award_points: i64,
    pub total_points: i64,
    pub exact_scores: i64,
}

// API Response types
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_names_round_trip() {
        for round in Round::ALL {
            assert_eq!(round.as_str().parse::<Round>().unwrap(), round);
        }
        assert!("round_64".parse::<Round>().is_err());
    }

    #[test]
    fn round_capacities_halve_through_the_bracket() {
        let caps: Vec<usize> = Round::ALL.iter().map(Round::capacity).collect();
        assert_eq!(caps, vec![32, 16, 8, 4, 2, 1, 1]);
    }

    #[test]
    fn later_rounds_follow_bracket_order() {
        let after_semi: Vec<Round> = Round::Semi.later_rounds().collect();
        assert_eq!(after_semi, vec![Round::Final, Round::ThirdPlace, Round::Champion]);
        assert_eq!(Round::Champion.later_rounds().count(), 0);
    }

    #[test]
    fn round_serializes_with_storage_names() {
        assert_eq!(serde_json::to_string(&Round::Round32).unwrap(), "\"round_32\"");
        assert_eq!(serde_json::to_string(&Round::ThirdPlace).unwrap(), "\"third_place\"");
    }

    #[test]
    fn final_score_requires_finished_status() {
        let mut m = Match {
            id: "m1".to_string(),
            group_letter: "A".to_string(),
            home_team_id: Some("a".to_string()),
            away_team_id: Some("b".to_string()),
            match_date: Utc::now(),
            status: MatchStatus::Live,
            home_score: Some(1),
            away_score: Some(0),
        };
        assert_eq!(m.final_score(), None);
        m.status = MatchStatus::Finished;
        assert_eq!(m.final_score(), Some(ScorePair { home: 1, away: 0 }));
    }
}
