use crate::models::LeaderboardEntry;

/// Order by total, then exact scores, then username, and assign competition
/// ranks: entries level on total and exact scores share a rank, and the next
/// rank skips accordingly (1, 1, 3).
pub fn rank(mut entries: Vec<LeaderboardEntry>) -> Vec<LeaderboardEntry> {
    entries.sort_by(|a, b| {
        b.total_points
            .cmp(&a.total_points)
            .then_with(|| b.exact_scores.cmp(&a.exact_scores))
            .then_with(|| a.username.cmp(&b.username))
    });

    let mut ranked: Vec<LeaderboardEntry> = Vec::with_capacity(entries.len());
    for (i, entry) in entries.into_iter().enumerate() {
        let rank = match ranked.last() {
            Some(prev)
                if prev.total_points == entry.total_points && prev.exact_scores == entry.exact_scores =>
            {
                prev.rank
            }
            _ => i + 1,
        };
        ranked.push(LeaderboardEntry { rank, ..entry });
    }
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(username: &str, total: i64, exact: i64) -> LeaderboardEntry {
        LeaderboardEntry {
            rank: 0,
            user_id: format!("id-{}", username),
            username: username.to_string(),
            match_points: total,
            advancing_points: 0,
            award_points: 0,
            total_points: total,
            exact_scores: exact,
        }
    }

    #[test]
    fn orders_and_shares_ranks() {
        let ranked = rank(vec![
            entry("carol", 40, 2),
            entry("alice", 55, 3),
            entry("bob", 40, 2),
            entry("dave", 40, 5),
            entry("erin", 10, 0),
        ]);
        let view: Vec<(usize, &str)> = ranked.iter().map(|e| (e.rank, e.username.as_str())).collect();
        assert_eq!(
            view,
            vec![(1, "alice"), (2, "dave"), (3, "bob"), (3, "carol"), (5, "erin")]
        );
    }

    #[test]
    fn empty_board() {
        assert!(rank(Vec::new()).is_empty());
    }
}
