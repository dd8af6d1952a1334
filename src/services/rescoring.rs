use anyhow::Result;
use sqlx::SqlitePool;
use std::collections::{HashMap, HashSet};

use crate::db::{
    aggregate_user_points, get_match_by_id, list_actual_advancing, list_actual_awards,
    list_all_advancing_predictions, list_all_award_predictions, list_group_matches,
    list_predictions_for_match, set_advancing_points, set_award_points, set_match_prediction_points,
    upsert_user_score,
};
use crate::models::{ActualAdvancing, ActualAward, AdvancingPrediction, AwardPrediction, LeaderboardEntry, Round};
use crate::services::leaderboard;
use crate::services::scoring::Scorer;

/// Applies the point calculators to stored predictions whenever ground truth changes.
pub struct Rescorer {
    scorer: Scorer,
}

impl Rescorer {
    pub fn new(scorer: Scorer) -> Self {
        Self { scorer }
    }

    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    /// Score every prediction for one match. Unfinished matches clear the points.
    pub async fn rescore_match(&self, pool: &SqlitePool, match_id: &str) -> Result<usize> {
        let match_data = get_match_by_id(pool, match_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Match {} not found", match_id))?;

        let actual = match_data.final_score();
        let predictions = list_predictions_for_match(pool, match_id).await?;

        for prediction in &predictions {
            let points = actual.map(|a| {
                self.scorer
                    .match_points(prediction.home_score, prediction.away_score, a.home, a.away)
            });
            set_match_prediction_points(pool, &prediction.id, points).await?;
        }

        match actual {
            Some(a) => tracing::info!(
                "Rescored {} predictions for match {} ({}-{})",
                predictions.len(),
                match_id,
                a.home,
                a.away
            ),
            None => tracing::debug!("Match {} has no final result; cleared {} predictions", match_id, predictions.len()),
        }

        Ok(predictions.len())
    }

    pub async fn rescore_all_matches(&self, pool: &SqlitePool) -> Result<usize> {
        let mut total = 0;
        for m in list_group_matches(pool).await? {
            total += self.rescore_match(pool, &m.id).await?;
        }
        Ok(total)
    }

    /// Full pass over every user's advancement picks.
    pub async fn rescore_advancing(&self, pool: &SqlitePool) -> Result<usize> {
        let actual = list_actual_advancing(pool).await?;
        let outcome = AdvancingOutcome::new(&actual);
        let predictions = list_all_advancing_predictions(pool).await?;

        for p in &predictions {
            let points = self.advancing_row_points(p, &outcome);
            set_advancing_points(pool, &p.user_id, &p.team_id, p.round, points).await?;
        }

        tracing::info!(
            "Rescored {} advancing predictions against {} recorded advancers",
            predictions.len(),
            actual.len()
        );
        Ok(predictions.len())
    }

    /// Full pass over every user's award picks.
    pub async fn rescore_awards(&self, pool: &SqlitePool) -> Result<usize> {
        let actual: HashMap<_, ActualAward> = list_actual_awards(pool)
            .await?
            .into_iter()
            .map(|a| (a.award_type, a))
            .collect();
        let predictions = list_all_award_predictions(pool).await?;

        for p in &predictions {
            let points = self.award_row_points(p, actual.get(&p.award_type));
            set_award_points(pool, &p.user_id, p.award_type, points).await?;
        }

        tracing::info!("Rescored {} award predictions", predictions.len());
        Ok(predictions.len())
    }

    /// Rebuild the stored totals and return the ranked board.
    pub async fn recalculate_leaderboard(&self, pool: &SqlitePool) -> Result<Vec<LeaderboardEntry>> {
        let entries = aggregate_user_points(pool).await?;
        for entry in &entries {
            upsert_user_score(pool, entry).await?;
        }
        let ranked = leaderboard::rank(entries);
        tracing::info!("Leaderboard recalculated for {} users", ranked.len());
        Ok(ranked)
    }

    pub async fn rescore_all(&self, pool: &SqlitePool) -> Result<Vec<LeaderboardEntry>> {
        self.rescore_all_matches(pool).await?;
        self.rescore_advancing(pool).await?;
        self.rescore_awards(pool).await?;
        self.recalculate_leaderboard(pool).await
    }

    /// `None` while the round's advancers are still undecided.
    pub fn advancing_row_points(&self, prediction: &AdvancingPrediction, outcome: &AdvancingOutcome) -> Option<i32> {
        if !outcome.decided(prediction.round) {
            return None;
        }
        if outcome.advanced(&prediction.team_id, prediction.round) {
            Some(self.scorer.advancing_points(prediction.round))
        } else {
            Some(0)
        }
    }

    /// `None` while the award has no recorded winner or tally.
    pub fn award_row_points(&self, prediction: &AwardPrediction, actual: Option<&ActualAward>) -> Option<i32> {
        let actual = actual?;
        if prediction.award_type.is_player_award() {
            let winner = actual.player_name.as_deref()?;
            Some(
                self.scorer
                    .award_points(prediction.award_type, prediction.player_name.as_deref(), Some(winner)),
            )
        } else {
            let tally = actual.total_goals?;
            Some(
                prediction
                    .total_goals_guess
                    .map_or(0, |guess| self.scorer.total_goals_points(guess, tally)),
            )
        }
    }
}

/// Recorded advancers, indexed for lookup.
pub struct AdvancingOutcome {
    advanced: HashSet<(String, Round)>,
    decided: HashSet<Round>,
}

impl AdvancingOutcome {
    pub fn new(actual: &[ActualAdvancing]) -> Self {
        Self {
            advanced: actual.iter().map(|a| (a.team_id.clone(), a.round)).collect(),
            decided: actual.iter().map(|a| a.round).collect(),
        }
    }

    pub fn decided(&self, round: Round) -> bool {
        self.decided.contains(&round)
    }

    pub fn advanced(&self, team_id: &str, round: Round) -> bool {
        self.advanced.contains(&(team_id.to_string(), round))
    }
}
