use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::env;

use crate::models::{AwardType, Round};

/// Point values for every scored outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoringRules {
    pub exact_score: i32,
    pub correct_result_and_diff: i32,
    pub correct_result: i32,
    pub total_goals_exact: i32,
    pub total_goals_within_3: i32,
    pub total_goals_within_5: i32,
    pub advancing: BTreeMap<Round, i32>,
    pub awards: BTreeMap<AwardType, i32>,
}

impl Default for ScoringRules {
    fn default() -> Self {
        let advancing = BTreeMap::from([
            (Round::Round32, 1),
            (Round::Round16, 2),
            (Round::Quarter, 4),
            (Round::Semi, 6),
            (Round::Final, 8),
            (Round::ThirdPlace, 4),
            (Round::Champion, 12),
        ]);
        let awards = BTreeMap::from([
            (AwardType::GoldenBall, 10),
            (AwardType::GoldenBoot, 10),
            (AwardType::GoldenGlove, 8),
            (AwardType::BestYoung, 8),
        ]);

        Self {
            exact_score: 5,
            correct_result_and_diff: 3,
            correct_result: 2,
            total_goals_exact: 15,
            total_goals_within_3: 8,
            total_goals_within_5: 4,
            advancing,
            awards,
        }
    }
}

impl ScoringRules {
    /// Defaults, with any `POINTS_*` environment variable taking precedence.
    pub fn from_env() -> Self {
        let mut rules = Self::default();

        override_from_env("POINTS_EXACT_SCORE", &mut rules.exact_score);
        override_from_env("POINTS_CORRECT_RESULT_AND_DIFF", &mut rules.correct_result_and_diff);
        override_from_env("POINTS_CORRECT_RESULT", &mut rules.correct_result);
        override_from_env("POINTS_TOTAL_GOALS_EXACT", &mut rules.total_goals_exact);
        override_from_env("POINTS_TOTAL_GOALS_WITHIN_3", &mut rules.total_goals_within_3);
        override_from_env("POINTS_TOTAL_GOALS_WITHIN_5", &mut rules.total_goals_within_5);

        for round in Round::ALL {
            let key = format!("POINTS_{}", round.as_str().to_uppercase());
            if let Some(value) = read_points(&key) {
                rules.advancing.insert(round, value);
            }
        }
        for award in AwardType::ALL.into_iter().filter(AwardType::is_player_award) {
            let key = format!("POINTS_{}", award.as_str().to_uppercase());
            if let Some(value) = read_points(&key) {
                rules.awards.insert(award, value);
            }
        }

        rules
    }

    /// Points for a correct advancement pick. Unconfigured rounds are worth nothing.
    pub fn advancing(&self, round: Round) -> i32 {
        self.advancing.get(&round).copied().unwrap_or(0)
    }

    /// Points for a correct player-award pick. Unconfigured awards are worth nothing.
    pub fn award(&self, award_type: AwardType) -> i32 {
        self.awards.get(&award_type).copied().unwrap_or(0)
    }
}

fn read_points(key: &str) -> Option<i32> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse::<i32>() {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Ignoring {}={:?}: {}", key, raw, e);
            None
        }
    }
}

fn override_from_env(key: &str, target: &mut i32) {
    if let Some(value) = read_points(key) {
        *target = value;
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    /// User-owned predictions become read-only from this instant on.
    pub prediction_deadline: Option<DateTime<Utc>>,
    pub scoring: ScoringRules,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:../data/wcpredict.db".to_string());

        let prediction_deadline = env::var("PREDICTION_DEADLINE").ok().and_then(|raw| {
            match DateTime::parse_from_rfc3339(raw.trim()) {
                Ok(deadline) => Some(deadline.with_timezone(&Utc)),
                Err(e) => {
                    tracing::warn!("Ignoring PREDICTION_DEADLINE={:?}: {}", raw, e);
                    None
                }
            }
        });

        Self {
            database_url,
            prediction_deadline,
            scoring: ScoringRules::from_env(),
        }
    }

    pub fn predictions_locked(&self, now: DateTime<Utc>) -> bool {
        self.prediction_deadline.is_some_and(|deadline| now >= deadline)
    }
}
