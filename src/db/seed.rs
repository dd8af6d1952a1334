use anyhow::Result;
use chrono::{DateTime, Duration, TimeZone, Utc};
use sqlx::SqlitePool;

use crate::db::{insert_match, insert_team, insert_user};
use crate::models::{Match, MatchStatus, Team, User};

// (group, [(code, name); 4])
const DRAW: [(&str, [(&str, &str); 4]); 12] = [
    ("A", [("MEX", "Mexico"), ("RSA", "South Africa"), ("KOR", "Korea Republic"), ("DEN", "Denmark")]),
    ("B", [("CAN", "Canada"), ("SUI", "Switzerland"), ("QAT", "Qatar"), ("ITA", "Italy")]),
    ("C", [("BRA", "Brazil"), ("MAR", "Morocco"), ("HAI", "Haiti"), ("SCO", "Scotland")]),
    ("D", [("USA", "United States"), ("PAR", "Paraguay"), ("AUS", "Australia"), ("TUR", "Turkey")]),
    ("E", [("GER", "Germany"), ("CUW", "Curacao"), ("CIV", "Ivory Coast"), ("ECU", "Ecuador")]),
    ("F", [("NED", "Netherlands"), ("JPN", "Japan"), ("SWE", "Sweden"), ("TUN", "Tunisia")]),
    ("G", [("BEL", "Belgium"), ("EGY", "Egypt"), ("IRN", "Iran"), ("NZL", "New Zealand")]),
    ("H", [("ESP", "Spain"), ("CPV", "Cape Verde"), ("KSA", "Saudi Arabia"), ("URU", "Uruguay")]),
    ("I", [("FRA", "France"), ("SEN", "Senegal"), ("NOR", "Norway"), ("IRQ", "Iraq")]),
    ("J", [("ARG", "Argentina"), ("ALG", "Algeria"), ("AUT", "Austria"), ("JOR", "Jordan")]),
    ("K", [("POR", "Portugal"), ("COL", "Colombia"), ("UZB", "Uzbekistan"), ("COD", "DR Congo")]),
    ("L", [("ENG", "England"), ("CRO", "Croatia"), ("GHA", "Ghana"), ("PAN", "Panama")]),
];

/// Round-robin pairings by draw position: three matchdays of two games.
const PAIRINGS: [(usize, usize); 6] = [(0, 1), (2, 3), (0, 2), (3, 1), (3, 0), (1, 2)];

pub async fn seed_data(pool: &SqlitePool) -> Result<()> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM teams")
        .fetch_one(pool)
        .await?;

    if count > 0 {
        tracing::info!("Database already seeded ({} teams found), skipping.", count);
        return Ok(());
    }

    tracing::info!("Seeding database with the group-stage draw...");

    let opening_day = Utc.with_ymd_and_hms(2026, 6, 11, 19, 0, 0).single()
        .ok_or_else(|| anyhow::anyhow!("invalid opening date"))?;

    for (group_index, (letter, members)) in DRAW.iter().enumerate() {
        for (code, name) in members {
            insert_team(pool, &team(letter, code, name)).await?;
        }

        for (n, (home, away)) in PAIRINGS.iter().enumerate() {
            let m = Match {
                id: format!("{}-{}", letter, n + 1),
                group_letter: letter.to_string(),
                home_team_id: Some(members[*home].0.to_lowercase()),
                away_team_id: Some(members[*away].0.to_lowercase()),
                match_date: kickoff(opening_day, group_index, n),
                status: MatchStatus::Scheduled,
                home_score: None,
                away_score: None,
            };
            insert_match(pool, &m).await?;
        }
    }

    insert_user(
        pool,
        &User {
            id: "user_demo".to_string(),
            username: "demo".to_string(),
            display_name: "Demo Player".to_string(),
            created_at: Utc::now(),
        },
    )
    .await?;

    tracing::info!("Database seeded: {} teams, {} matches, 1 user", DRAW.len() * 4, DRAW.len() * PAIRINGS.len());
    Ok(())
}

fn team(letter: &str, code: &str, name: &str) -> Team {
    Team {
        id: code.to_lowercase(),
        name: name.to_string(),
        code: code.to_string(),
        group_letter: letter.to_string(),
    }
}

/// Matchday `n / 2` of a group; groups rotate through four daily slots.
fn kickoff(opening_day: DateTime<Utc>, group_index: usize, n: usize) -> DateTime<Utc> {
    let matchday = (n / 2) as i64;
    let day = matchday * 6 + (group_index / 2) as i64;
    let slot = ((group_index % 2) * 2 + n % 2) as i64;
    opening_day + Duration::days(day) + Duration::hours(slot * 3)
}
