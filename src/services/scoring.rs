use crate::config::ScoringRules;
use crate::models::{AwardType, Round};
use crate::utils::normalize_player_name;

/// Pure point calculators. Every method is total: unknown keys and missing
/// values score zero instead of failing.
#[derive(Debug, Clone)]
pub struct Scorer {
    rules: ScoringRules,
}

impl Default for Scorer {
    fn default() -> Self {
        Self::new(ScoringRules::default())
    }
}

impl Scorer {
    pub fn new(rules: ScoringRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ScoringRules {
        &self.rules
    }

    /// Three-tier match scoring; the first tier that applies wins.
    pub fn match_points(
        &self,
        predicted_home: i32,
        predicted_away: i32,
        actual_home: i32,
        actual_away: i32,
    ) -> i32 {
        if predicted_home == actual_home && predicted_away == actual_away {
            return self.rules.exact_score;
        }

        let predicted_diff = predicted_home - predicted_away;
        let actual_diff = actual_home - actual_away;

        if predicted_diff.signum() != actual_diff.signum() {
            return 0;
        }

        if predicted_diff == actual_diff {
            self.rules.correct_result_and_diff
        } else {
            self.rules.correct_result
        }
    }

    pub fn advancing_points(&self, round: Round) -> i32 {
        self.rules.advancing(round)
    }

    /// Bucketed distance scoring for the tournament goal tally.
    pub fn total_goals_points(&self, predicted: i32, actual: i32) -> i32 {
        let diff = (predicted - actual).abs();
        if diff == 0 {
            self.rules.total_goals_exact
        } else if diff <= 3 {
            self.rules.total_goals_within_3
        } else if diff <= 5 {
            self.rules.total_goals_within_5
        } else {
            0
        }
    }

    /// Player-award scoring: trimmed, case-insensitive exact name match.
    pub fn award_points(
        &self,
        award_type: AwardType,
        predicted_player: Option<&str>,
        actual_player: Option<&str>,
    ) -> i32 {
        let (Some(predicted), Some(actual)) = (
            predicted_player.map(normalize_player_name).filter(|n| !n.is_empty()),
            actual_player.map(normalize_player_name).filter(|n| !n.is_empty()),
        ) else {
            return 0;
        };

        if predicted == actual {
            self.rules.award(award_type)
        } else {
            0
        }
    }
}
