use thiserror::Error;

use crate::models::Round;

/// Malformed input to the standings engine. Partial predictions are never an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StandingsError {
    #[error("match {match_id} references unknown team {team_id}")]
    UnknownTeam { match_id: String, team_id: String },

    #[error("match {match_id} belongs to group {match_group} but team {team_id} was drawn into group {team_group}")]
    TeamOutsideGroup {
        match_id: String,
        match_group: String,
        team_id: String,
        team_group: String,
    },
}

/// A refused bracket mutation. The selection is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("{0} is derived from the group standings and cannot be picked by hand")]
    DerivedRound(Round),

    #[error("{round} already holds {capacity} teams")]
    RoundFull { round: Round, capacity: usize },

    #[error("team {team_id} is not in the candidate pool for {round}")]
    NotEligible { round: Round, team_id: String },

    #[error("team {team_id} is listed more than once in {round}")]
    Duplicate { round: Round, team_id: String },

    #[error("team {team_id} cannot be both a finalist and a third-place contender")]
    FinalistInThirdPlace { team_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownKey {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownKey {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
