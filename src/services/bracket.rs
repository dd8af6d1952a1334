use anyhow::Result;
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::{BTreeMap, HashSet};

use crate::db::{
    list_group_matches, list_teams, list_user_advancing_predictions, list_user_match_predictions,
    save_round_selections, upsert_match_prediction,
};
use crate::error::SelectionError;
use crate::models::{Match, Round, ScorePair};
use crate::services::cascade::{reconcile_manual_selections, Reconciliation};
use crate::services::rescoring::Rescorer;
use crate::services::selection::{BracketSelections, Toggle};
use crate::services::standings::{compute_standings, prediction_map, StandingsReport};

/// Result of bringing one user's stored bracket in line with their predictions.
#[derive(Debug, Clone, Serialize)]
pub struct BracketSync {
    pub standings: StandingsReport,
    pub reconciliation: Reconciliation,
}

/// What is stored for a user: the last saved round_32 set and the manual picks.
pub struct StoredBracket {
    pub qualified: Vec<String>,
    pub selections: BracketSelections,
}

pub async fn load_bracket(pool: &SqlitePool, user_id: &str) -> Result<StoredBracket> {
    let rows = list_user_advancing_predictions(pool, user_id).await?;
    let qualified = rows
        .iter()
        .filter(|p| p.round == Round::Round32)
        .map(|p| p.team_id.clone())
        .collect();
    Ok(StoredBracket {
        qualified,
        selections: BracketSelections::from_predictions(&rows),
    })
}

/// Standings from the user's predictions, without touching stored picks.
pub async fn user_standings(pool: &SqlitePool, user_id: &str) -> Result<StandingsReport> {
    let teams = list_teams(pool).await?;
    let matches = list_group_matches(pool).await?;
    let predictions = list_user_match_predictions(pool, user_id).await?;
    Ok(compute_standings(&teams, &matches, &prediction_map(&predictions))?)
}

/// Recompute standings, store the new round_32 set and prune picks of teams
/// that no longer qualify. Runs after every match-prediction write.
pub async fn sync_user_bracket(pool: &SqlitePool, user_id: &str) -> Result<BracketSync> {
    let standings = user_standings(pool, user_id).await?;
    let stored = load_bracket(pool, user_id).await?;

    let reconciliation =
        reconcile_manual_selections(&stored.qualified, &standings.all_qualified, &stored.selections);

    let before: HashSet<&String> = stored.qualified.iter().collect();
    let after: HashSet<&String> = standings.all_qualified.iter().collect();
    let mut writes: Vec<(Round, &[String])> = Vec::new();
    if before != after {
        writes.push((Round::Round32, standings.all_qualified.as_slice()));
    }
    for round in &reconciliation.changed_rounds {
        writes.push((*round, reconciliation.selections.selection(*round)));
    }
    // round_32 and its pruned rounds land together or not at all
    save_round_selections(pool, user_id, &writes).await?;

    if !reconciliation.is_noop() {
        tracing::info!(
            "User {} lost {} qualified teams; pruned {:?}",
            user_id,
            reconciliation.dropped.len(),
            reconciliation.changed_rounds
        );
    }

    Ok(BracketSync {
        standings,
        reconciliation,
    })
}

/// Store one score prediction and bring everything derived from it up to date.
/// A prediction on a match that already has a final score is scored on the
/// spot and the stored totals are rebuilt.
pub async fn record_match_prediction(
    pool: &SqlitePool,
    rescorer: &Rescorer,
    user_id: &str,
    match_data: &Match,
    score: ScorePair,
) -> Result<BracketSync> {
    upsert_match_prediction(pool, user_id, &match_data.id, score).await?;

    if match_data.final_score().is_some() {
        rescorer.rescore_match(pool, &match_data.id).await?;
        rescorer.recalculate_leaderboard(pool).await?;
    }

    sync_user_bracket(pool, user_id).await
}

/// Replace one manual round. A refused pick comes back as a `SelectionError`
/// inside the `anyhow::Error` and nothing is written.
pub async fn save_manual_round(
    pool: &SqlitePool,
    user_id: &str,
    round: Round,
    teams: Vec<String>,
) -> Result<BracketSelections> {
    let StoredBracket {
        qualified,
        mut selections,
    } = load_bracket(pool, user_id).await?;

    let changed = selections.replace_round(round, teams, &qualified)?;
    let writes: Vec<(Round, &[String])> = changed.iter().map(|r| (*r, selections.selection(*r))).collect();
    save_round_selections(pool, user_id, &writes).await?;

    tracing::debug!("User {} saved {}; rounds written: {:?}", user_id, round, changed);
    Ok(selections)
}

/// Pick or unpick one team and persist every round the toggle touched.
pub async fn toggle_pick(
    pool: &SqlitePool,
    user_id: &str,
    round: Round,
    team_id: &str,
) -> Result<(Toggle, BracketSelections)> {
    let StoredBracket {
        qualified,
        mut selections,
    } = load_bracket(pool, user_id).await?;

    let before = selections.clone();
    let outcome = selections.toggle(round, team_id, &qualified)?;
    let writes: Vec<(Round, &[String])> = Round::MANUAL
        .into_iter()
        .filter(|r| before.selection(*r) != selections.selection(*r))
        .map(|r| (r, selections.selection(r)))
        .collect();
    save_round_selections(pool, user_id, &writes).await?;

    tracing::debug!("User {} {:?} {} in {}", user_id, outcome, team_id, round);
    Ok((outcome, selections))
}

/// Replace every manual round at once. The whole bracket is checked before
/// anything is written.
pub async fn save_full_bracket(
    pool: &SqlitePool,
    user_id: &str,
    rounds: BTreeMap<Round, Vec<String>>,
) -> Result<BracketSelections> {
    let stored = load_bracket(pool, user_id).await?;

    let mut selections = BracketSelections::new();
    for (round, teams) in rounds {
        if !round.is_manual() {
            return Err(SelectionError::DerivedRound(round).into());
        }
        selections.set_selection(round, teams);
    }
    selections.validate(&stored.qualified)?;

    let writes: Vec<(Round, &[String])> = Round::MANUAL
        .into_iter()
        .map(|r| (r, selections.selection(r)))
        .collect();
    save_round_selections(pool, user_id, &writes).await?;

    tracing::info!(
        "User {} saved a full bracket (complete: {})",
        user_id,
        selections.is_complete()
    );
    Ok(selections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::{add_user, memory_pool};
    use crate::db::{get_match_by_id, list_user_match_predictions, list_user_scores, seed_data, set_match_result};
    use crate::models::MatchStatus;
    use crate::services::scoring::Scorer;

    /// Group A fixtures in seed order: MEX-RSA, KOR-DEN, MEX-KOR, DEN-RSA, DEN-MEX, RSA-KOR.
    async fn predict_group_a(pool: &SqlitePool, user: &str, scores: [(i32, i32); 6]) {
        for (n, (home, away)) in scores.into_iter().enumerate() {
            upsert_match_prediction(pool, user, &format!("A-{}", n + 1), ScorePair { home, away })
                .await
                .unwrap();
        }
    }

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[tokio::test]
    async fn predictions_fill_round_of_32() {
        let pool = memory_pool().await;
        seed_data(&pool).await.unwrap();
        add_user(&pool, "ann").await;

        // MEX 9 pts, KOR 6, DEN 3, RSA 0
        predict_group_a(&pool, "ann", [(2, 0), (1, 0), (1, 0), (1, 0), (0, 1), (0, 1)]).await;
        let sync = sync_user_bracket(&pool, "ann").await.unwrap();

        assert_eq!(sync.standings.qualified_top2, ids(&["mex", "kor"]));
        assert_eq!(sync.standings.qualified_best_third, ids(&["den"]));
        assert!(sync.reconciliation.is_noop());

        let stored = load_bracket(&pool, "ann").await.unwrap();
        let mut qualified = stored.qualified.clone();
        qualified.sort();
        assert_eq!(qualified, ids(&["den", "kor", "mex"]));
    }

    #[tokio::test]
    async fn losing_qualification_prunes_picks() {
        let pool = memory_pool().await;
        seed_data(&pool).await.unwrap();
        add_user(&pool, "ann").await;

        predict_group_a(&pool, "ann", [(2, 0), (1, 0), (1, 0), (1, 0), (0, 1), (0, 1)]).await;
        sync_user_bracket(&pool, "ann").await.unwrap();
        save_manual_round(&pool, "ann", Round::Round16, ids(&["mex", "den"])).await.unwrap();
        save_manual_round(&pool, "ann", Round::Quarter, ids(&["den"])).await.unwrap();

        // DEN now loses to RSA and finishes bottom without a third-place slot
        upsert_match_prediction(&pool, "ann", "A-4", ScorePair { home: 0, away: 3 }).await.unwrap();
        let sync = sync_user_bracket(&pool, "ann").await.unwrap();

        assert!(!sync.standings.all_qualified.contains(&"den".to_string()));
        assert_eq!(sync.reconciliation.dropped, ids(&["den"]));
        assert_eq!(sync.reconciliation.changed_rounds, vec![Round::Round16, Round::Quarter]);

        let stored = load_bracket(&pool, "ann").await.unwrap();
        assert_eq!(stored.selections.selection(Round::Round16), &ids(&["mex"])[..]);
        assert!(stored.selections.selection(Round::Quarter).is_empty());
    }

    #[tokio::test]
    async fn refused_save_writes_nothing() {
        let pool = memory_pool().await;
        seed_data(&pool).await.unwrap();
        add_user(&pool, "ann").await;

        predict_group_a(&pool, "ann", [(2, 0), (1, 0), (1, 0), (1, 0), (0, 1), (0, 1)]).await;
        sync_user_bracket(&pool, "ann").await.unwrap();

        let err = save_manual_round(&pool, "ann", Round::Round16, ids(&["mex", "bra"]))
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<SelectionError>(),
            Some(&SelectionError::NotEligible {
                round: Round::Round16,
                team_id: "bra".to_string(),
            })
        );
        let stored = load_bracket(&pool, "ann").await.unwrap();
        assert!(stored.selections.selection(Round::Round16).is_empty());
    }

    #[tokio::test]
    async fn full_bracket_is_validated_before_saving() {
        let pool = memory_pool().await;
        seed_data(&pool).await.unwrap();
        add_user(&pool, "ann").await;

        predict_group_a(&pool, "ann", [(2, 0), (1, 0), (1, 0), (1, 0), (0, 1), (0, 1)]).await;
        sync_user_bracket(&pool, "ann").await.unwrap();

        let mut rounds = BTreeMap::new();
        rounds.insert(Round::Round16, ids(&["mex", "kor", "den"]));
        rounds.insert(Round::Quarter, ids(&["mex", "kor"]));
        rounds.insert(Round::Semi, ids(&["mex", "kor"]));
        rounds.insert(Round::Final, ids(&["mex"]));
        rounds.insert(Round::ThirdPlace, ids(&["mex"]));

        let err = save_full_bracket(&pool, "ann", rounds.clone()).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<SelectionError>(),
            Some(&SelectionError::FinalistInThirdPlace {
                team_id: "mex".to_string()
            })
        );
        assert!(load_bracket(&pool, "ann").await.unwrap().selections.selection(Round::Round16).is_empty());

        rounds.insert(Round::ThirdPlace, ids(&["kor"]));
        let saved = save_full_bracket(&pool, "ann", rounds).await.unwrap();
        let stored = load_bracket(&pool, "ann").await.unwrap();
        assert_eq!(stored.selections.selection(Round::Final), saved.selection(Round::Final));
        assert_eq!(stored.selections.selection(Round::ThirdPlace), &ids(&["kor"])[..]);
    }

    #[tokio::test]
    async fn toggling_a_pick_retracts_it_downstream() {
        let pool = memory_pool().await;
        seed_data(&pool).await.unwrap();
        add_user(&pool, "ann").await;

        predict_group_a(&pool, "ann", [(2, 0), (1, 0), (1, 0), (1, 0), (0, 1), (0, 1)]).await;
        sync_user_bracket(&pool, "ann").await.unwrap();

        let (first, _) = toggle_pick(&pool, "ann", Round::Round16, "kor").await.unwrap();
        assert_eq!(first, Toggle::Selected);
        toggle_pick(&pool, "ann", Round::Quarter, "kor").await.unwrap();

        let (second, selections) = toggle_pick(&pool, "ann", Round::Round16, "kor").await.unwrap();
        assert_eq!(second, Toggle::Deselected);
        assert!(selections.selection(Round::Quarter).is_empty());

        let stored = load_bracket(&pool, "ann").await.unwrap();
        assert_eq!(stored.selections, selections);
    }

    #[tokio::test]
    async fn prediction_on_a_finished_match_is_scored_immediately() {
        let pool = memory_pool().await;
        seed_data(&pool).await.unwrap();
        add_user(&pool, "ann").await;
        let rescorer = Rescorer::new(Scorer::default());

        set_match_result(&pool, "A-1", MatchStatus::Finished, Some(2), Some(0)).await.unwrap();
        let finished = get_match_by_id(&pool, "A-1").await.unwrap().unwrap();
        record_match_prediction(&pool, &rescorer, "ann", &finished, ScorePair { home: 2, away: 0 })
            .await
            .unwrap();

        let preds = list_user_match_predictions(&pool, "ann").await.unwrap();
        assert_eq!(preds[0].points_earned, Some(5));
        let board = list_user_scores(&pool).await.unwrap();
        let ann = board.iter().find(|e| e.username == "ann").unwrap();
        assert_eq!((ann.match_points, ann.exact_scores), (5, 1));

        // changing the pick rescores it rather than leaving it blank
        record_match_prediction(&pool, &rescorer, "ann", &finished, ScorePair { home: 1, away: 0 })
            .await
            .unwrap();
        let preds = list_user_match_predictions(&pool, "ann").await.unwrap();
        assert_eq!(preds[0].points_earned, Some(2));
        let board = list_user_scores(&pool).await.unwrap();
        assert_eq!(board.iter().find(|e| e.username == "ann").unwrap().match_points, 2);

        let open = get_match_by_id(&pool, "A-2").await.unwrap().unwrap();
        record_match_prediction(&pool, &rescorer, "ann", &open, ScorePair { home: 1, away: 1 })
            .await
            .unwrap();
        let preds = list_user_match_predictions(&pool, "ann").await.unwrap();
        assert_eq!(preds.iter().find(|p| p.match_id == "A-2").unwrap().points_earned, None);
    }
}
