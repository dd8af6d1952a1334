use std::collections::BTreeMap;

use crate::models::TeamStanding;
use crate::services::standings::compare_standings;

/// Third-placed teams that go through to the round of 32.
pub const BEST_THIRD_SLOTS: usize = 8;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Qualification {
    pub top2: Vec<String>,
    pub best_third: Vec<String>,
    pub all: Vec<String>,
}

/// Top two of every group, then the best third-placed teams across all groups.
///
/// A team that has not played a simulated match never qualifies, whatever its
/// nominal position.
pub fn derive_qualification(standings_by_group: &BTreeMap<String, Vec<TeamStanding>>) -> Qualification {
    let top2: Vec<String> = standings_by_group
        .values()
        .flat_map(|table| table.iter().take(2))
        .filter(|s| s.played > 0)
        .map(|s| s.team_id.clone())
        .collect();

    let mut thirds: Vec<&TeamStanding> = standings_by_group
        .values()
        .filter_map(|table| table.get(2))
        .filter(|s| s.played > 0)
        .collect();
    thirds.sort_by(|a, b| compare_standings(a, b));

    let best_third: Vec<String> = thirds
        .into_iter()
        .take(BEST_THIRD_SLOTS)
        .map(|s| s.team_id.clone())
        .collect();

    let all = top2.iter().chain(best_third.iter()).cloned().collect();

    Qualification {
        top2,
        best_third,
        all,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::standings::compute_standings;
    use crate::services::standings::tests::{fixture, score, team};
    use crate::models::{Match, ScorePair, Team};
    use std::collections::HashMap;

    const LETTERS: [&str; 12] = ["A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L"];

    /// Twelve four-team groups with the standard six-fixture round robin.
    fn tournament() -> (Vec<Team>, Vec<Match>) {
        let mut teams = Vec::new();
        let mut matches = Vec::new();
        for letter in LETTERS {
            let ids: Vec<String> = (1..=4).map(|n| format!("{}{}", letter.to_lowercase(), n)).collect();
            for id in &ids {
                teams.push(team(id, &format!("Team {}", id.to_uppercase()), letter));
            }
            let pairs = [(0, 1), (2, 3), (0, 2), (3, 1), (3, 0), (1, 2)];
            for (n, (h, a)) in pairs.iter().enumerate() {
                matches.push(fixture(&format!("{}-{}", letter, n + 1), letter, &ids[*h], &ids[*a]));
            }
        }
        (teams, matches)
    }

    /// Team 1 wins everything, team 2 beats 3 and 4, team 3 beats 4 by `third_margin`.
    fn chalk_group(letter: &str, third_margin: i32, predictions: &mut HashMap<String, ScorePair>) {
        predictions.insert(format!("{}-1", letter), score(1, 0)); // 1 v 2
        predictions.insert(format!("{}-2", letter), score(third_margin, 0)); // 3 v 4
        predictions.insert(format!("{}-3", letter), score(2, 0)); // 1 v 3
        predictions.insert(format!("{}-4", letter), score(0, 1)); // 4 v 2
        predictions.insert(format!("{}-5", letter), score(0, 3)); // 4 v 1
        predictions.insert(format!("{}-6", letter), score(1, 0)); // 2 v 3
    }

    #[test]
    fn top_two_of_every_group_in_group_order() {
        let (teams, matches) = tournament();
        let mut predictions = HashMap::new();
        for letter in LETTERS {
            chalk_group(letter, 1, &mut predictions);
        }
        let report = compute_standings(&teams, &matches, &predictions).unwrap();

        assert_eq!(report.qualified_top2.len(), 24);
        assert_eq!(&report.qualified_top2[..4], &["a1", "a2", "b1", "b2"]);
        assert_eq!(report.all_qualified.len(), 32);
        assert_eq!(&report.all_qualified[..24], &report.qualified_top2[..]);
        assert_eq!(&report.all_qualified[24..], &report.qualified_best_third[..]);
    }

    #[test]
    fn best_eight_thirds_beat_every_excluded_third() {
        let (teams, matches) = tournament();
        let mut predictions = HashMap::new();
        for (i, letter) in LETTERS.iter().enumerate() {
            // Thirds separate on goal difference: group L's third is strongest.
            chalk_group(letter, 1 + i as i32, &mut predictions);
        }
        let report = compute_standings(&teams, &matches, &predictions).unwrap();

        assert_eq!(report.qualified_best_third.len(), BEST_THIRD_SLOTS);
        assert_eq!(report.qualified_best_third[0], "l3");

        let thirds: Vec<&TeamStanding> = report
            .standings_by_group
            .values()
            .map(|table| &table[2])
            .collect();
        let (kept, dropped): (Vec<_>, Vec<_>) = thirds
            .into_iter()
            .partition(|s| report.qualified_best_third.contains(&s.team_id));
        assert_eq!(dropped.len(), 4);
        for k in &kept {
            for d in &dropped {
                assert_eq!(compare_standings(k, d), std::cmp::Ordering::Less);
            }
        }
    }

    #[test]
    fn unplayed_teams_never_qualify() {
        let (teams, matches) = tournament();
        let mut predictions = HashMap::new();
        chalk_group("A", 1, &mut predictions);
        // Group B: only team 1 v team 2 predicted. The unplayed b3 sits second
        // on goal difference and b4 third, yet neither may qualify; the beaten
        // b2 drops to fourth.
        predictions.insert("B-1".to_string(), score(2, 1));

        let report = compute_standings(&teams, &matches, &predictions).unwrap();
        let b: Vec<&str> = report.standings_by_group["B"].iter().map(|s| s.team_id.as_str()).collect();
        assert_eq!(b, vec!["b1", "b3", "b4", "b2"]);
        assert_eq!(report.qualified_top2, vec!["a1", "a2", "b1"]);
        assert_eq!(report.qualified_best_third, vec!["a3"]);

        let c = &report.standings_by_group["C"];
        assert_eq!(c[0].position, 1);
        assert!(!report.all_qualified.contains(&c[0].team_id));
    }

    fn standing(id: &str, group: &str, won: u32, lost: u32, goals_for: i32, goals_against: i32) -> TeamStanding {
        TeamStanding {
            team_id: id.to_string(),
            team_name: format!("Team {}", id.to_uppercase()),
            group_letter: group.to_string(),
            played: won + lost,
            won,
            drawn: 0,
            lost,
            goals_for,
            goals_against,
            goal_difference: goals_for - goals_against,
            points: 3 * won,
            position: 0,
        }
    }

    #[test]
    fn goals_scored_rank_thirds_level_on_goal_difference() {
        // Every third has 3 points and a goal difference of 0. Group A's
        // scored least and group L's most; the rest are level.
        let mut standings = BTreeMap::new();
        for (i, letter) in LETTERS.iter().enumerate() {
            let l = letter.to_lowercase();
            let third_goals = match i {
                0 => 1,
                11 => 3,
                _ => 2,
            };
            standings.insert(
                letter.to_string(),
                vec![
                    standing(&format!("{}1", l), letter, 2, 0, 4, 0),
                    standing(&format!("{}2", l), letter, 1, 1, 2, 2),
                    standing(&format!("{}3", l), letter, 1, 1, third_goals, third_goals),
                    standing(&format!("{}4", l), letter, 0, 2, 0, 4),
                ],
            );
        }

        let q = derive_qualification(&standings);
        assert_eq!(q.best_third, vec!["l3", "b3", "c3", "d3", "e3", "f3", "g3", "h3"]);
        assert!(!q.best_third.contains(&"a3".to_string()));
    }

    #[test]
    fn group_without_a_third_contributes_no_third() {
        let mut standings = BTreeMap::new();
        let lone = TeamStanding {
            team_id: "solo".to_string(),
            team_name: "Solo".to_string(),
            group_letter: "Z".to_string(),
            played: 1,
            won: 1,
            drawn: 0,
            lost: 0,
            goals_for: 1,
            goals_against: 0,
            goal_difference: 1,
            points: 3,
            position: 1,
        };
        standings.insert("Z".to_string(), vec![lone]);
        let q = derive_qualification(&standings);
        assert_eq!(q.top2, vec!["solo"]);
        assert!(q.best_third.is_empty());
    }
}
