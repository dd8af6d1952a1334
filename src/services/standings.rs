use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use crate::error::StandingsError;
use crate::models::{Match, MatchPrediction, ScorePair, Team, TeamStanding};
use crate::services::qualification::{derive_qualification, Qualification};

/// Full output of one standings pass over a user's predictions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StandingsReport {
    pub standings_by_group: BTreeMap<String, Vec<TeamStanding>>,
    pub qualified_top2: Vec<String>,
    pub qualified_best_third: Vec<String>,
    pub all_qualified: Vec<String>,
}

/// Index a user's stored predictions by match id.
pub fn prediction_map(predictions: &[MatchPrediction]) -> HashMap<String, ScorePair> {
    predictions
        .iter()
        .map(|p| (p.match_id.clone(), p.score()))
        .collect()
}

/// Group ordering: points, goal difference, goals scored (all descending), then name.
pub fn compare_standings(a: &TeamStanding, b: &TeamStanding) -> Ordering {
    b.points
        .cmp(&a.points)
        .then_with(|| b.goal_difference.cmp(&a.goal_difference))
        .then_with(|| b.goals_for.cmp(&a.goals_for))
        .then_with(|| a.team_name.cmp(&b.team_name))
        .then_with(|| a.team_id.cmp(&b.team_id))
}

/// Simulate every group from the predicted scores and derive the qualified set.
///
/// Matches without a prediction (or without both participants) are skipped, so
/// a partially filled group simply shows fewer games played. Recomputed in full
/// on every call; nothing is carried between calls.
pub fn compute_standings(
    teams: &[Team],
    matches: &[Match],
    predictions: &HashMap<String, ScorePair>,
) -> Result<StandingsReport, StandingsError> {
    let roster: HashMap<&str, &Team> = teams.iter().map(|t| (t.id.as_str(), t)).collect();
    validate_fixtures(&roster, matches)?;

    let mut groups: BTreeMap<&str, Vec<&Team>> = BTreeMap::new();
    for team in teams {
        groups.entry(team.group_letter.as_str()).or_default().push(team);
    }

    let standings_by_group: BTreeMap<String, Vec<TeamStanding>> = groups
        .into_iter()
        .map(|(letter, members)| {
            let table = group_table(letter, &members, matches, predictions);
            (letter.to_string(), table)
        })
        .collect();

    let Qualification {
        top2,
        best_third,
        all,
    } = derive_qualification(&standings_by_group);

    Ok(StandingsReport {
        standings_by_group,
        qualified_top2: top2,
        qualified_best_third: best_third,
        all_qualified: all,
    })
}

fn validate_fixtures(roster: &HashMap<&str, &Team>, matches: &[Match]) -> Result<(), StandingsError> {
    for m in matches {
        for team_id in [&m.home_team_id, &m.away_team_id].into_iter().flatten() {
            let team = roster.get(team_id.as_str()).ok_or_else(|| StandingsError::UnknownTeam {
                match_id: m.id.clone(),
                team_id: team_id.clone(),
            })?;
            if team.group_letter != m.group_letter {
                return Err(StandingsError::TeamOutsideGroup {
                    match_id: m.id.clone(),
                    match_group: m.group_letter.clone(),
                    team_id: team_id.clone(),
                    team_group: team.group_letter.clone(),
                });
            }
        }
    }
    Ok(())
}

fn group_table(
    letter: &str,
    members: &[&Team],
    matches: &[Match],
    predictions: &HashMap<String, ScorePair>,
) -> Vec<TeamStanding> {
    let seed: BTreeMap<String, TeamStanding> = members
        .iter()
        .map(|team| (team.id.clone(), empty_standing(team)))
        .collect();

    let simulated = matches
        .iter()
        .filter(|m| m.group_letter == letter)
        .filter_map(|m| {
            let home = m.home_team_id.as_deref()?;
            let away = m.away_team_id.as_deref()?;
            let score = predictions.get(&m.id)?;
            Some((home, away, *score))
        })
        .fold(seed, |table, (home, away, score)| {
            let table = apply_result(table, home, score.home, score.away);
            apply_result(table, away, score.away, score.home)
        });

    let mut table: Vec<TeamStanding> = simulated
        .into_values()
        .map(|s| TeamStanding {
            goal_difference: s.goals_for - s.goals_against,
            ..s
        })
        .collect();

    table.sort_by(compare_standings);
    table
        .into_iter()
        .enumerate()
        .map(|(i, s)| TeamStanding { position: i + 1, ..s })
        .collect()
}

fn empty_standing(team: &Team) -> TeamStanding {
    TeamStanding {
        team_id: team.id.clone(),
        team_name: team.name.clone(),
        group_letter: team.group_letter.clone(),
        played: 0,
        won: 0,
        drawn: 0,
        lost: 0,
        goals_for: 0,
        goals_against: 0,
        goal_difference: 0,
        points: 0,
        position: 0,
    }
}

/// Returns the table with one team's side of a single result folded in.
fn apply_result(
    mut table: BTreeMap<String, TeamStanding>,
    team_id: &str,
    scored: i32,
    conceded: i32,
) -> BTreeMap<String, TeamStanding> {
    if let Some(current) = table.remove(team_id) {
        let (won, drawn, lost, points) = match scored.cmp(&conceded) {
            Ordering::Greater => (1, 0, 0, 3),
            Ordering::Equal => (0, 1, 0, 1),
            Ordering::Less => (0, 0, 1, 0),
        };
        let next = TeamStanding {
            played: current.played + 1,
            won: current.won + won,
            drawn: current.drawn + drawn,
            lost: current.lost + lost,
            goals_for: current.goals_for + scored,
            goals_against: current.goals_against + conceded,
            points: current.points + points,
            ..current
        };
        table.insert(team_id.to_string(), next);
    }
    table
}
