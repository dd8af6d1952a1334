use serde::Serialize;
use std::collections::HashSet;

use crate::models::Round;
use crate::services::selection::BracketSelections;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub selections: BracketSelections,
    /// Teams that were qualified before and are not any more.
    pub dropped: Vec<String>,
    /// Manual rounds whose selection shrank and therefore needs saving.
    pub changed_rounds: Vec<Round>,
}

impl Reconciliation {
    pub fn is_noop(&self) -> bool {
        self.changed_rounds.is_empty()
    }
}

/// Prune manual picks of teams that fell out of the qualified set.
///
/// Fires only when `previous` was non-empty and lost at least one team; the
/// first population of an empty set never touches existing picks. The caller
/// owns `previous` and passes it in on every recomputation.
pub fn reconcile_manual_selections(
    previous: &[String],
    current: &[String],
    selections: &BracketSelections,
) -> Reconciliation {
    let current: HashSet<&str> = current.iter().map(String::as_str).collect();
    let dropped: Vec<String> = previous
        .iter()
        .filter(|team| !current.contains(team.as_str()))
        .cloned()
        .collect();

    let mut next = selections.clone();
    let mut changed_rounds = Vec::new();

    if !dropped.is_empty() {
        for round in Round::MANUAL {
            let before = selections.selection(round);
            let kept: Vec<String> = before
                .iter()
                .filter(|team| !dropped.contains(team))
                .cloned()
                .collect();
            if kept.len() < before.len() {
                next.set_selection(round, kept);
                changed_rounds.push(round);
            }
        }
    }

    if !changed_rounds.is_empty() {
        tracing::debug!(
            "Qualification change dropped {:?}; pruned rounds {:?}",
            dropped,
            changed_rounds
        );
    }

    Reconciliation {
        selections: next,
        dropped,
        changed_rounds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn bracket(qualified: &[String]) -> BracketSelections {
        let mut b = BracketSelections::new();
        for team in ["A", "B", "C"] {
            b.toggle(Round::Round16, team, qualified).unwrap();
        }
        b.toggle(Round::Quarter, "A", qualified).unwrap();
        b.toggle(Round::Quarter, "C", qualified).unwrap();
        b
    }

    #[test]
    fn dropped_team_is_pruned_everywhere() {
        let previous = ids(&["A", "B", "C", "D"]);
        let current = ids(&["B", "C", "D", "E"]);
        let selections = bracket(&previous);

        let r = reconcile_manual_selections(&previous, &current, &selections);
        assert_eq!(r.dropped, ids(&["A"]));
        assert_eq!(r.changed_rounds, vec![Round::Round16, Round::Quarter]);
        assert_eq!(r.selections.selection(Round::Round16), &ids(&["B", "C"])[..]);
        assert_eq!(r.selections.selection(Round::Quarter), &ids(&["C"])[..]);
    }

    #[test]
    fn untouched_rounds_are_not_reported() {
        let previous = ids(&["A", "B", "C", "D"]);
        let current = ids(&["A", "C", "D"]);
        let selections = bracket(&previous);

        let r = reconcile_manual_selections(&previous, &current, &selections);
        assert_eq!(r.changed_rounds, vec![Round::Round16]);
        assert_eq!(r.selections.selection(Round::Quarter), selections.selection(Round::Quarter));
    }

    #[test]
    fn first_population_is_a_noop() {
        let qualified = ids(&["A", "B", "C"]);
        let selections = bracket(&qualified);
        let r = reconcile_manual_selections(&[], &ids(&["X"]), &selections);
        assert!(r.is_noop());
        assert!(r.dropped.is_empty());
        assert_eq!(r.selections, selections);
    }

    #[test]
    fn unchanged_or_growing_set_is_a_noop() {
        let previous = ids(&["A", "B", "C"]);
        let selections = bracket(&previous);
        assert!(reconcile_manual_selections(&previous, &previous, &selections).is_noop());
        let grown = ids(&["A", "B", "C", "D"]);
        assert!(reconcile_manual_selections(&previous, &grown, &selections).is_noop());
    }

    #[test]
    fn dropped_team_without_picks_changes_nothing() {
        let previous = ids(&["A", "B", "C", "Z"]);
        let current = ids(&["A", "B", "C"]);
        let selections = bracket(&previous);
        let r = reconcile_manual_selections(&previous, &current, &selections);
        assert_eq!(r.dropped, ids(&["Z"]));
        assert!(r.is_noop());
        assert_eq!(r.selections, selections);
    }

    #[test]
    fn reconcile_is_idempotent() {
        let previous = ids(&["A", "B", "C"]);
        let current = ids(&["B", "C"]);
        let selections = bracket(&previous);
        let once = reconcile_manual_selections(&previous, &current, &selections);
        let twice = reconcile_manual_selections(&previous, &current, &selections);
        assert_eq!(once, twice);
    }
}
