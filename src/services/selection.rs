use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use crate::error::SelectionError;
use crate::models::{AdvancingPrediction, Round};

/// What a successful toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Toggle {
    Selected,
    Deselected,
}

/// A user's hand-picked knockout bracket, round_16 through champion.
///
/// round_32 is not stored here: it is always the qualified set coming out of
/// the standings engine and is passed in wherever a candidate pool needs it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BracketSelections {
    rounds: BTreeMap<Round, Vec<String>>,
}

impl BracketSelections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from stored rows, ignoring the derived round_32 entries.
    pub fn from_predictions(predictions: &[AdvancingPrediction]) -> Self {
        let mut selections = Self::new();
        for p in predictions.iter().filter(|p| p.round.is_manual()) {
            let teams = selections.rounds.entry(p.round).or_default();
            if !teams.contains(&p.team_id) {
                teams.push(p.team_id.clone());
            }
        }
        selections
    }

    pub fn selection(&self, round: Round) -> &[String] {
        self.rounds.get(&round).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn set_selection(&mut self, round: Round, teams: Vec<String>) {
        if teams.is_empty() {
            self.rounds.remove(&round);
        } else {
            self.rounds.insert(round, teams);
        }
    }

    /// Teams that may be picked for `round` given the current bracket.
    pub fn candidates(&self, round: Round, qualified: &[String]) -> Vec<String> {
        match round {
            Round::Round32 | Round::Round16 => qualified.to_vec(),
            Round::ThirdPlace => {
                let finalists = self.selection(Round::Final);
                self.selection(Round::Semi)
                    .iter()
                    .filter(|t| !finalists.contains(t))
                    .cloned()
                    .collect()
            }
            other => match other.feeder() {
                Some(feeder) => self.selection(feeder).to_vec(),
                None => Vec::new(),
            },
        }
    }

    /// Add or remove one team. Refused mutations leave the bracket unchanged.
    ///
    /// Removing a team also retracts it from every later round. Picking a team
    /// for the final takes it out of the third-place match.
    pub fn toggle(&mut self, round: Round, team_id: &str, qualified: &[String]) -> Result<Toggle, SelectionError> {
        if !round.is_manual() {
            return Err(SelectionError::DerivedRound(round));
        }

        if self.selection(round).iter().any(|t| t == team_id) {
            self.remove_from(round, team_id);
            self.retract_from_later(round, team_id);
            return Ok(Toggle::Deselected);
        }

        if !self.candidates(round, qualified).iter().any(|t| t == team_id) {
            return Err(SelectionError::NotEligible {
                round,
                team_id: team_id.to_string(),
            });
        }
        if self.selection(round).len() >= round.capacity() {
            return Err(SelectionError::RoundFull {
                round,
                capacity: round.capacity(),
            });
        }

        self.rounds.entry(round).or_default().push(team_id.to_string());
        if round == Round::Final {
            self.remove_from(Round::ThirdPlace, team_id);
        }
        Ok(Toggle::Selected)
    }

    /// Replace a whole round at once, as a save does. Returns every round whose
    /// selection changed, including knock-on retractions.
    pub fn replace_round(
        &mut self,
        round: Round,
        teams: Vec<String>,
        qualified: &[String],
    ) -> Result<Vec<Round>, SelectionError> {
        if !round.is_manual() {
            return Err(SelectionError::DerivedRound(round));
        }
        check_unique(round, &teams)?;
        if teams.len() > round.capacity() {
            return Err(SelectionError::RoundFull {
                round,
                capacity: round.capacity(),
            });
        }

        let pool = match round {
            // The new finals pick decides exclusivity below, not the old one.
            Round::Final => self.selection(Round::Semi).to_vec(),
            _ => self.candidates(round, qualified),
        };
        if let Some(outsider) = teams.iter().find(|t| !pool.contains(t)) {
            return Err(SelectionError::NotEligible {
                round,
                team_id: outsider.clone(),
            });
        }

        let before = self.clone();
        let removed: Vec<String> = before
            .selection(round)
            .iter()
            .filter(|t| !teams.contains(t))
            .cloned()
            .collect();

        if round == Round::Final {
            for team in &teams {
                self.remove_from(Round::ThirdPlace, team);
            }
        }
        self.set_selection(round, teams);
        for team in &removed {
            self.retract_from_later(round, team);
        }

        Ok(Round::MANUAL
            .into_iter()
            .filter(|r| before.selection(*r) != self.selection(*r))
            .collect())
    }

    /// Check a whole bracket against the pick rules.
    pub fn validate(&self, qualified: &[String]) -> Result<(), SelectionError> {
        for round in Round::MANUAL {
            let teams = self.selection(round);
            check_unique(round, teams)?;
            if teams.len() > round.capacity() {
                return Err(SelectionError::RoundFull {
                    round,
                    capacity: round.capacity(),
                });
            }

            let finalists = self.selection(Round::Final);
            let pool = self.candidates(round, qualified);
            for team in teams {
                if round == Round::ThirdPlace && finalists.contains(team) {
                    return Err(SelectionError::FinalistInThirdPlace { team_id: team.clone() });
                }
                if !pool.contains(team) {
                    return Err(SelectionError::NotEligible {
                        round,
                        team_id: team.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// True when every manual round holds exactly its capacity.
    pub fn is_complete(&self) -> bool {
        Round::MANUAL
            .into_iter()
            .all(|round| self.selection(round).len() == round.capacity())
    }

    fn remove_from(&mut self, round: Round, team_id: &str) {
        if let Some(teams) = self.rounds.get_mut(&round) {
            teams.retain(|t| t != team_id);
            if teams.is_empty() {
                self.rounds.remove(&round);
            }
        }
    }

    fn retract_from_later(&mut self, round: Round, team_id: &str) {
        for later in round.later_rounds() {
            self.remove_from(later, team_id);
        }
    }
}

fn check_unique(round: Round, teams: &[String]) -> Result<(), SelectionError> {
    let mut seen = HashSet::new();
    for team in teams {
        if !seen.insert(team.as_str()) {
            return Err(SelectionError::Duplicate {
                round,
                team_id: team.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn qualified() -> Vec<String> {
        (1..=32).map(|n| format!("t{}", n)).collect()
    }

    /// A bracket picked down to the last four: t1..t4 in the semis.
    fn to_semis() -> BracketSelections {
        let q = qualified();
        let mut b = BracketSelections::new();
        for n in 1..=16 {
            b.toggle(Round::Round16, &format!("t{}", n), &q).unwrap();
        }
        for n in 1..=8 {
            b.toggle(Round::Quarter, &format!("t{}", n), &q).unwrap();
        }
        for n in 1..=4 {
            b.toggle(Round::Semi, &format!("t{}", n), &q).unwrap();
        }
        b
    }

    #[test]
    fn toggle_adds_then_removes() {
        let q = qualified();
        let mut b = BracketSelections::new();
        assert_eq!(b.toggle(Round::Round16, "t5", &q), Ok(Toggle::Selected));
        assert_eq!(b.selection(Round::Round16), &ids(&["t5"])[..]);
        assert_eq!(b.toggle(Round::Round16, "t5", &q), Ok(Toggle::Deselected));
        assert!(b.selection(Round::Round16).is_empty());
    }

    #[test]
    fn round_32_is_not_pickable() {
        let q = qualified();
        let mut b = BracketSelections::new();
        assert_eq!(
            b.toggle(Round::Round32, "t1", &q),
            Err(SelectionError::DerivedRound(Round::Round32))
        );
    }

    #[test]
    fn picks_come_from_the_previous_round() {
        let q = qualified();
        let mut b = BracketSelections::new();
        b.toggle(Round::Round16, "t1", &q).unwrap();
        assert!(matches!(
            b.toggle(Round::Quarter, "t2", &q),
            Err(SelectionError::NotEligible { round: Round::Quarter, .. })
        ));
        assert!(matches!(
            b.toggle(Round::Round16, "nobody", &q),
            Err(SelectionError::NotEligible { .. })
        ));
        assert_eq!(b.toggle(Round::Quarter, "t1", &q), Ok(Toggle::Selected));
    }

    #[test]
    fn overflow_is_refused_without_truncation() {
        let q = qualified();
        let mut b = to_semis();
        b.toggle(Round::Final, "t1", &q).unwrap();
        b.toggle(Round::Final, "t2", &q).unwrap();
        let before = b.clone();
        assert_eq!(
            b.toggle(Round::Final, "t3", &q),
            Err(SelectionError::RoundFull {
                round: Round::Final,
                capacity: 2
            })
        );
        assert_eq!(b, before);
    }

    #[test]
    fn deselecting_retracts_from_later_rounds() {
        let q = ids(&["A", "B"]);
        let mut b = BracketSelections::new();
        b.toggle(Round::Round16, "A", &q).unwrap();
        b.toggle(Round::Round16, "B", &q).unwrap();
        b.toggle(Round::Quarter, "A", &q).unwrap();

        b.toggle(Round::Round16, "A", &q).unwrap();
        assert_eq!(b.selection(Round::Round16), &ids(&["B"])[..]);
        assert!(b.selection(Round::Quarter).is_empty());
    }

    #[test]
    fn deep_retraction_clears_the_whole_path() {
        let q = qualified();
        let mut b = to_semis();
        b.toggle(Round::Final, "t1", &q).unwrap();
        b.toggle(Round::Champion, "t1", &q).unwrap();

        b.toggle(Round::Quarter, "t1", &q).unwrap();
        assert!(!b.selection(Round::Semi).contains(&"t1".to_string()));
        assert!(b.selection(Round::Final).is_empty());
        assert!(b.selection(Round::Champion).is_empty());
        assert_eq!(b.selection(Round::Round16).len(), 16);
    }

    #[test]
    fn finalist_leaves_third_place() {
        let q = qualified();
        let mut b = to_semis();
        b.toggle(Round::ThirdPlace, "t3", &q).unwrap();
        assert_eq!(b.selection(Round::ThirdPlace), &ids(&["t3"])[..]);

        b.toggle(Round::Final, "t3", &q).unwrap();
        assert!(b.selection(Round::ThirdPlace).is_empty());
        assert_eq!(b.selection(Round::Final), &ids(&["t3"])[..]);
    }

    #[test]
    fn finalist_is_not_a_third_place_candidate() {
        let q = qualified();
        let mut b = to_semis();
        b.toggle(Round::Final, "t1", &q).unwrap();
        assert_eq!(b.candidates(Round::ThirdPlace, &q), ids(&["t2", "t3", "t4"]));
        assert!(matches!(
            b.toggle(Round::ThirdPlace, "t1", &q),
            Err(SelectionError::NotEligible { .. })
        ));
    }

    #[test]
    fn reselection_is_not_restored_downstream() {
        let q = ids(&["A", "B"]);
        let mut b = BracketSelections::new();
        b.toggle(Round::Round16, "A", &q).unwrap();
        b.toggle(Round::Quarter, "A", &q).unwrap();
        b.toggle(Round::Round16, "A", &q).unwrap();
        b.toggle(Round::Round16, "A", &q).unwrap();
        assert_eq!(b.selection(Round::Round16), &ids(&["A"])[..]);
        assert!(b.selection(Round::Quarter).is_empty());
    }

    #[test]
    fn replace_round_reports_knock_on_changes() {
        let q = qualified();
        let mut b = to_semis();
        b.toggle(Round::Final, "t1", &q).unwrap();
        b.toggle(Round::Final, "t2", &q).unwrap();
        b.toggle(Round::Champion, "t2", &q).unwrap();
        b.toggle(Round::ThirdPlace, "t3", &q).unwrap();

        let changed = b.replace_round(Round::Semi, ids(&["t1", "t3", "t4", "t5"]), &q).unwrap();
        assert_eq!(changed, vec![Round::Semi, Round::Final, Round::Champion]);
        assert_eq!(b.selection(Round::Final), &ids(&["t1"])[..]);
        assert_eq!(b.selection(Round::ThirdPlace), &ids(&["t3"])[..]);
    }

    #[test]
    fn replace_final_moves_pick_out_of_third_place() {
        let q = qualified();
        let mut b = to_semis();
        b.toggle(Round::ThirdPlace, "t3", &q).unwrap();
        let changed = b.replace_round(Round::Final, ids(&["t3", "t4"]), &q).unwrap();
        assert_eq!(changed, vec![Round::Final, Round::ThirdPlace]);
        assert!(b.selection(Round::ThirdPlace).is_empty());
    }

    #[test]
    fn replace_round_refuses_bad_input_untouched() {
        let q = qualified();
        let mut b = to_semis();
        let before = b.clone();
        assert!(matches!(
            b.replace_round(Round::Semi, ids(&["t1", "t1"]), &q),
            Err(SelectionError::Duplicate { .. })
        ));
        assert!(matches!(
            b.replace_round(Round::Semi, ids(&["t1", "t2", "t3", "t4", "t5"]), &q),
            Err(SelectionError::RoundFull { .. })
        ));
        assert!(matches!(
            b.replace_round(Round::Semi, ids(&["t1", "t20"]), &q),
            Err(SelectionError::NotEligible { .. })
        ));
        assert_eq!(b, before);
    }

    #[test]
    fn validate_and_completeness() {
        let q = qualified();
        let mut b = to_semis();
        assert_eq!(b.validate(&q), Ok(()));
        assert!(!b.is_complete());

        b.toggle(Round::Final, "t1", &q).unwrap();
        b.toggle(Round::Final, "t2", &q).unwrap();
        b.toggle(Round::ThirdPlace, "t3", &q).unwrap();
        b.toggle(Round::Champion, "t2", &q).unwrap();
        assert_eq!(b.validate(&q), Ok(()));
        assert!(b.is_complete());

        b.set_selection(Round::ThirdPlace, ids(&["t1"]));
        assert_eq!(
            b.validate(&q),
            Err(SelectionError::FinalistInThirdPlace { team_id: "t1".to_string() })
        );
    }

    #[test]
    fn validate_catches_orphaned_picks() {
        let q = qualified();
        let mut b = to_semis();
        let shrunk: Vec<String> = q.iter().filter(|t| *t != "t4").cloned().collect();
        assert!(matches!(
            b.validate(&shrunk),
            Err(SelectionError::NotEligible { round: Round::Round16, .. })
        ));
        b.set_selection(Round::Quarter, ids(&["t1", "t30"]));
        assert!(matches!(b.validate(&q), Err(SelectionError::NotEligible { round: Round::Quarter, .. })));
    }

    #[test]
    fn loads_manual_rows_only() {
        let preds = vec![
            AdvancingPrediction {
                user_id: "u".to_string(),
                team_id: "t1".to_string(),
                round: Round::Round32,
                points_earned: None,
            },
            AdvancingPrediction {
                user_id: "u".to_string(),
                team_id: "t1".to_string(),
                round: Round::Round16,
                points_earned: None,
            },
        ];
        let b = BracketSelections::from_predictions(&preds);
        assert!(b.selection(Round::Round32).is_empty());
        assert_eq!(b.selection(Round::Round16), &ids(&["t1"])[..]);
    }
}
