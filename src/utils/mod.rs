use chrono::{DateTime, Utc};

/// Canonical form used when comparing player names.
pub fn normalize_player_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Parse an RFC 3339 timestamp as stored in the database.
pub fn parse_timestamp(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}

/// Names closest to `query`, best first, keeping those above `threshold`.
pub fn closest_names<'a>(query: &str, names: &[&'a str], threshold: f64, limit: usize) -> Vec<&'a str> {
    let query = query.trim().to_lowercase();
    let mut scored: Vec<(f64, &str)> = names
        .iter()
        .map(|name| (strsim::jaro_winkler(&query, &name.to_lowercase()), *name))
        .filter(|(score, _)| *score >= threshold)
        .collect();

    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored.into_iter().take(limit).map(|(_, name)| name).collect()
}

/// Validate a username for the pool (no auth, just hygiene).
pub fn validate_username(name: &str) -> bool {
    let trimmed = name.trim();
    !trimmed.is_empty()
        && trimmed.len() <= 32
        && trimmed.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
