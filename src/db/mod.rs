pub mod seed;
pub use seed::seed_data;

use anyhow::Result;
use chrono::Utc;
use sqlx::{sqlite::SqliteConnectOptions, sqlite::SqliteRow, Row, SqliteConnection, SqlitePool};
use std::collections::HashSet;
use std::str::FromStr;

use crate::models::*;
use crate::utils::parse_timestamp;

pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    // Strip the "sqlite:" prefix to get the file path, create parent dir if needed
    let file_path = database_url
        .strip_prefix("sqlite:///")
        .or_else(|| database_url.strip_prefix("sqlite://"))
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url);

    if !file_path.starts_with(":memory:") {
        if let Some(parent) = std::path::Path::new(file_path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
        }
    }

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePool::connect_with(options).await?;
    Ok(pool)
}

pub async fn clear_all_data(pool: &SqlitePool) -> Result<()> {
    for table in [
        "user_scores",
        "actual_awards",
        "actual_advancing",
        "award_predictions",
        "advancing_predictions",
        "match_predictions",
        "matches",
        "teams",
        "users",
    ] {
        sqlx::query(&format!("DELETE FROM {}", table)).execute(pool).await?;
    }
    tracing::info!("All data cleared");
    Ok(())
}

pub async fn init_database_with_pool(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            display_name TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS teams (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            code TEXT NOT NULL,
            group_letter TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS matches (
            id TEXT PRIMARY KEY,
            group_letter TEXT NOT NULL,
            home_team_id TEXT,
            away_team_id TEXT,
            match_date TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'scheduled',
            home_score INTEGER,
            away_score INTEGER,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (home_team_id) REFERENCES teams (id),
            FOREIGN KEY (away_team_id) REFERENCES teams (id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS match_predictions (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            match_id TEXT NOT NULL,
            home_score INTEGER NOT NULL CHECK (home_score >= 0),
            away_score INTEGER NOT NULL CHECK (away_score >= 0),
            points_earned INTEGER,
            updated_at TEXT NOT NULL,
            UNIQUE (user_id, match_id),
            FOREIGN KEY (user_id) REFERENCES users (id),
            FOREIGN KEY (match_id) REFERENCES matches (id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS advancing_predictions (
            user_id TEXT NOT NULL,
            team_id TEXT NOT NULL,
            round TEXT NOT NULL,
            points_earned INTEGER,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (user_id, team_id, round),
            FOREIGN KEY (user_id) REFERENCES users (id),
            FOREIGN KEY (team_id) REFERENCES teams (id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS award_predictions (
            user_id TEXT NOT NULL,
            award_type TEXT NOT NULL,
            player_name TEXT,
            total_goals_guess INTEGER,
            points_earned INTEGER,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (user_id, award_type),
            FOREIGN KEY (user_id) REFERENCES users (id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS actual_advancing (
            team_id TEXT NOT NULL,
            round TEXT NOT NULL,
            recorded_at TEXT NOT NULL,
            PRIMARY KEY (team_id, round),
            FOREIGN KEY (team_id) REFERENCES teams (id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS actual_awards (
            award_type TEXT PRIMARY KEY,
            player_name TEXT,
            total_goals INTEGER,
            recorded_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // user_scores: leaderboard totals, rewritten after every rescoring pass
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_scores (
            user_id TEXT PRIMARY KEY,
            match_points INTEGER NOT NULL DEFAULT 0,
            advancing_points INTEGER NOT NULL DEFAULT 0,
            award_points INTEGER NOT NULL DEFAULT 0,
            total_points INTEGER NOT NULL DEFAULT 0,
            exact_scores INTEGER NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (user_id) REFERENCES users (id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_matches_group ON matches(group_letter)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_match_predictions_match ON match_predictions(match_id)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_teams_group ON teams(group_letter)")
        .execute(pool)
        .await?;

    tracing::info!("Database initialized successfully");
    Ok(())
}

/// Called from the CLI where no pool exists yet.
pub async fn init_database(database_url: &str) -> Result<()> {
    let pool = create_pool(database_url).await?;
    init_database_with_pool(&pool).await
}

// Row mappers

fn team_from_row(row: &SqliteRow) -> Team {
    Team {
        id: row.get("id"),
        name: row.get("name"),
        code: row.get("code"),
        group_letter: row.get("group_letter"),
    }
}

fn match_from_row(row: &SqliteRow) -> Result<Match> {
    Ok(Match {
        id: row.get("id"),
        group_letter: row.get("group_letter"),
        home_team_id: row.get("home_team_id"),
        away_team_id: row.get("away_team_id"),
        match_date: parse_timestamp(&row.get::<String, _>("match_date"))?,
        status: row.get::<String, _>("status").parse()?,
        home_score: row.get("home_score"),
        away_score: row.get("away_score"),
    })
}

fn match_prediction_from_row(row: &SqliteRow) -> Result<MatchPrediction> {
    Ok(MatchPrediction {
        id: row.get("id"),
        user_id: row.get("user_id"),
        match_id: row.get("match_id"),
        home_score: row.get("home_score"),
        away_score: row.get("away_score"),
        points_earned: row.get("points_earned"),
        updated_at: parse_timestamp(&row.get::<String, _>("updated_at"))?,
    })
}

fn advancing_from_row(row: &SqliteRow) -> Result<AdvancingPrediction> {
    Ok(AdvancingPrediction {
        user_id: row.get("user_id"),
        team_id: row.get("team_id"),
        round: row.get::<String, _>("round").parse()?,
        points_earned: row.get("points_earned"),
    })
}

fn award_from_row(row: &SqliteRow) -> Result<AwardPrediction> {
    Ok(AwardPrediction {
        user_id: row.get("user_id"),
        award_type: row.get::<String, _>("award_type").parse()?,
        player_name: row.get("player_name"),
        total_goals_guess: row.get("total_goals_guess"),
        points_earned: row.get("points_earned"),
    })
}

// User operations
pub async fn insert_user(pool: &SqlitePool, user: &User) -> Result<()> {
    sqlx::query(
        r#"
        INSERT OR REPLACE INTO users (id, username, display_name, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&user.id)
    .bind(&user.username)
    .bind(&user.display_name)
    .bind(user.created_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_user_by_id(pool: &SqlitePool, user_id: &str) -> Result<Option<User>> {
    let row = sqlx::query("SELECT * FROM users WHERE id = ? OR username = ?")
        .bind(user_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => Ok(Some(User {
            id: row.get("id"),
            username: row.get("username"),
            display_name: row.get("display_name"),
            created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
        })),
        None => Ok(None),
    }
}

// Team operations
pub async fn insert_team(pool: &SqlitePool, team: &Team) -> Result<()> {
    sqlx::query(
        r#"
        INSERT OR REPLACE INTO teams (id, name, code, group_letter)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&team.id)
    .bind(&team.name)
    .bind(&team.code)
    .bind(&team.group_letter)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn list_teams(pool: &SqlitePool) -> Result<Vec<Team>> {
    let rows = sqlx::query("SELECT * FROM teams ORDER BY group_letter, name")
        .fetch_all(pool)
        .await?;

    Ok(rows.iter().map(team_from_row).collect())
}

// Match operations
pub async fn insert_match(pool: &SqlitePool, match_data: &Match) -> Result<()> {
    sqlx::query(
        r#"
        INSERT OR REPLACE INTO matches
        (id, group_letter, home_team_id, away_team_id, match_date, status, home_score, away_score, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&match_data.id)
    .bind(&match_data.group_letter)
    .bind(&match_data.home_team_id)
    .bind(&match_data.away_team_id)
    .bind(match_data.match_date.to_rfc3339())
    .bind(match_data.status.as_str())
    .bind(match_data.home_score)
    .bind(match_data.away_score)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn list_group_matches(pool: &SqlitePool) -> Result<Vec<Match>> {
    let rows = sqlx::query("SELECT * FROM matches ORDER BY match_date, id")
        .fetch_all(pool)
        .await?;

    rows.iter().map(match_from_row).collect()
}

pub async fn get_match_by_id(pool: &SqlitePool, match_id: &str) -> Result<Option<Match>> {
    let row = sqlx::query("SELECT * FROM matches WHERE id = ?")
        .bind(match_id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(match_from_row).transpose()
}

/// Record a real result. Returns false when the match does not exist.
pub async fn set_match_result(
    pool: &SqlitePool,
    match_id: &str,
    status: MatchStatus,
    home_score: Option<i32>,
    away_score: Option<i32>,
) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE matches SET status = ?, home_score = ?, away_score = ?, updated_at = ? WHERE id = ?",
    )
    .bind(status.as_str())
    .bind(home_score)
    .bind(away_score)
    .bind(Utc::now().to_rfc3339())
    .bind(match_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

// Match prediction operations
pub async fn upsert_match_prediction(
    pool: &SqlitePool,
    user_id: &str,
    match_id: &str,
    score: ScorePair,
) -> Result<()> {
    sqlx::query(
        r#"INSERT INTO match_predictions (id, user_id, match_id, home_score, away_score, points_earned, updated_at)
           VALUES (?, ?, ?, ?, ?, NULL, ?)
           ON CONFLICT(user_id, match_id) DO UPDATE SET
               home_score    = excluded.home_score,
               away_score    = excluded.away_score,
               points_earned = NULL,
               updated_at    = excluded.updated_at"#,
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(user_id)
    .bind(match_id)
    .bind(score.home)
    .bind(score.away)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn list_user_match_predictions(pool: &SqlitePool, user_id: &str) -> Result<Vec<MatchPrediction>> {
    let rows = sqlx::query("SELECT * FROM match_predictions WHERE user_id = ? ORDER BY match_id")
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    rows.iter().map(match_prediction_from_row).collect()
}

pub async fn list_predictions_for_match(pool: &SqlitePool, match_id: &str) -> Result<Vec<MatchPrediction>> {
    let rows = sqlx::query("SELECT * FROM match_predictions WHERE match_id = ?")
        .bind(match_id)
        .fetch_all(pool)
        .await?;

    rows.iter().map(match_prediction_from_row).collect()
}

pub async fn set_match_prediction_points(pool: &SqlitePool, prediction_id: &str, points: Option<i32>) -> Result<()> {
    sqlx::query("UPDATE match_predictions SET points_earned = ? WHERE id = ?")
        .bind(points)
        .bind(prediction_id)
        .execute(pool)
        .await?;
    Ok(())
}

// Advancing prediction operations
pub async fn list_user_advancing_predictions(pool: &SqlitePool, user_id: &str) -> Result<Vec<AdvancingPrediction>> {
    let rows = sqlx::query("SELECT * FROM advancing_predictions WHERE user_id = ? ORDER BY round, team_id")
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    rows.iter().map(advancing_from_row).collect()
}

pub async fn list_all_advancing_predictions(pool: &SqlitePool) -> Result<Vec<AdvancingPrediction>> {
    let rows = sqlx::query("SELECT * FROM advancing_predictions")
        .fetch_all(pool)
        .await?;

    rows.iter().map(advancing_from_row).collect()
}

/// Replace a user's selection for each given round: upsert the new set, then
/// delete any stale row. Either every round is written or none is.
pub async fn save_round_selections(pool: &SqlitePool, user_id: &str, rounds: &[(Round, &[String])]) -> Result<()> {
    if rounds.is_empty() {
        return Ok(());
    }

    let now = Utc::now().to_rfc3339();
    let mut tx = pool.begin().await?;
    for (round, team_ids) in rounds {
        replace_round_rows(&mut *tx, user_id, *round, team_ids, &now).await?;
    }
    tx.commit().await?;
    Ok(())
}

async fn replace_round_rows(
    conn: &mut SqliteConnection,
    user_id: &str,
    round: Round,
    team_ids: &[String],
    now: &str,
) -> Result<()> {
    for team_id in team_ids {
        sqlx::query(
            r#"INSERT INTO advancing_predictions (user_id, team_id, round, points_earned, updated_at)
               VALUES (?, ?, ?, NULL, ?)
               ON CONFLICT(user_id, team_id, round) DO UPDATE SET updated_at = excluded.updated_at"#,
        )
        .bind(user_id)
        .bind(team_id)
        .bind(round.as_str())
        .bind(now)
        .execute(&mut *conn)
        .await?;
    }

    let keep: HashSet<&str> = team_ids.iter().map(String::as_str).collect();
    let existing: Vec<String> =
        sqlx::query_scalar("SELECT team_id FROM advancing_predictions WHERE user_id = ? AND round = ?")
            .bind(user_id)
            .bind(round.as_str())
            .fetch_all(&mut *conn)
            .await?;

    for stale in existing.iter().filter(|t| !keep.contains(t.as_str())) {
        sqlx::query("DELETE FROM advancing_predictions WHERE user_id = ? AND team_id = ? AND round = ?")
            .bind(user_id)
            .bind(stale)
            .bind(round.as_str())
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

pub async fn set_advancing_points(
    pool: &SqlitePool,
    user_id: &str,
    team_id: &str,
    round: Round,
    points: Option<i32>,
) -> Result<()> {
    sqlx::query("UPDATE advancing_predictions SET points_earned = ? WHERE user_id = ? AND team_id = ? AND round = ?")
        .bind(points)
        .bind(user_id)
        .bind(team_id)
        .bind(round.as_str())
        .execute(pool)
        .await?;
    Ok(())
}

// Award prediction operations
pub async fn upsert_award_prediction(
    pool: &SqlitePool,
    user_id: &str,
    award_type: AwardType,
    player_name: Option<&str>,
    total_goals_guess: Option<i32>,
) -> Result<()> {
    sqlx::query(
        r#"INSERT INTO award_predictions (user_id, award_type, player_name, total_goals_guess, points_earned, updated_at)
           VALUES (?, ?, ?, ?, NULL, ?)
           ON CONFLICT(user_id, award_type) DO UPDATE SET
               player_name       = excluded.player_name,
               total_goals_guess = excluded.total_goals_guess,
               points_earned     = NULL,
               updated_at        = excluded.updated_at"#,
    )
    .bind(user_id)
    .bind(award_type.as_str())
    .bind(player_name)
    .bind(total_goals_guess)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn list_user_award_predictions(pool: &SqlitePool, user_id: &str) -> Result<Vec<AwardPrediction>> {
    let rows = sqlx::query("SELECT * FROM award_predictions WHERE user_id = ? ORDER BY award_type")
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    rows.iter().map(award_from_row).collect()
}

pub async fn list_all_award_predictions(pool: &SqlitePool) -> Result<Vec<AwardPrediction>> {
    let rows = sqlx::query("SELECT * FROM award_predictions")
        .fetch_all(pool)
        .await?;

    rows.iter().map(award_from_row).collect()
}

pub async fn set_award_points(pool: &SqlitePool, user_id: &str, award_type: AwardType, points: Option<i32>) -> Result<()> {
    sqlx::query("UPDATE award_predictions SET points_earned = ? WHERE user_id = ? AND award_type = ?")
        .bind(points)
        .bind(user_id)
        .bind(award_type.as_str())
        .execute(pool)
        .await?;
    Ok(())
}

// Actual outcome operations (admin-authored)
pub async fn save_actual_round(pool: &SqlitePool, round: Round, team_ids: &[String]) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    let mut tx = pool.begin().await?;

    for team_id in team_ids {
        sqlx::query(
            r#"INSERT INTO actual_advancing (team_id, round, recorded_at) VALUES (?, ?, ?)
               ON CONFLICT(team_id, round) DO UPDATE SET recorded_at = excluded.recorded_at"#,
        )
        .bind(team_id)
        .bind(round.as_str())
        .bind(&now)
        .execute(&mut *tx)
        .await?;
    }

    let keep: HashSet<&str> = team_ids.iter().map(String::as_str).collect();
    let existing: Vec<String> = sqlx::query_scalar("SELECT team_id FROM actual_advancing WHERE round = ?")
        .bind(round.as_str())
        .fetch_all(&mut *tx)
        .await?;

    for stale in existing.iter().filter(|t| !keep.contains(t.as_str())) {
        sqlx::query("DELETE FROM actual_advancing WHERE team_id = ? AND round = ?")
            .bind(stale)
            .bind(round.as_str())
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(())
}

pub async fn list_actual_advancing(pool: &SqlitePool) -> Result<Vec<ActualAdvancing>> {
    let rows = sqlx::query("SELECT team_id, round FROM actual_advancing ORDER BY round, team_id")
        .fetch_all(pool)
        .await?;

    let mut actual = Vec::new();
    for row in rows {
        actual.push(ActualAdvancing {
            team_id: row.get("team_id"),
            round: row.get::<String, _>("round").parse()?,
        });
    }
    Ok(actual)
}

pub async fn upsert_actual_award(
    pool: &SqlitePool,
    award_type: AwardType,
    player_name: Option<&str>,
    total_goals: Option<i32>,
) -> Result<()> {
    sqlx::query(
        r#"INSERT INTO actual_awards (award_type, player_name, total_goals, recorded_at)
           VALUES (?, ?, ?, ?)
           ON CONFLICT(award_type) DO UPDATE SET
               player_name = excluded.player_name,
               total_goals = excluded.total_goals,
               recorded_at = excluded.recorded_at"#,
    )
    .bind(award_type.as_str())
    .bind(player_name)
    .bind(total_goals)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn list_actual_awards(pool: &SqlitePool) -> Result<Vec<ActualAward>> {
    let rows = sqlx::query("SELECT award_type, player_name, total_goals FROM actual_awards")
        .fetch_all(pool)
        .await?;

    let mut actual = Vec::new();
    for row in rows {
        actual.push(ActualAward {
            award_type: row.get::<String, _>("award_type").parse()?,
            player_name: row.get("player_name"),
            total_goals: row.get("total_goals"),
        });
    }
    Ok(actual)
}

// Leaderboard operations

/// Sum every user's earned points straight from the prediction tables.
pub async fn aggregate_user_points(pool: &SqlitePool) -> Result<Vec<LeaderboardEntry>> {
    let rows = sqlx::query(
        r#"
        SELECT u.id, u.username,
            COALESCE((SELECT SUM(points_earned) FROM match_predictions WHERE user_id = u.id), 0) AS match_points,
            COALESCE((SELECT SUM(points_earned) FROM advancing_predictions WHERE user_id = u.id), 0) AS advancing_points,
            COALESCE((SELECT SUM(points_earned) FROM award_predictions WHERE user_id = u.id), 0) AS award_points,
            (SELECT COUNT(*) FROM match_predictions mp JOIN matches m ON m.id = mp.match_id
                WHERE mp.user_id = u.id
                  AND m.status = 'finished'
                  AND m.home_score = mp.home_score
                  AND m.away_score = mp.away_score) AS exact_scores
        FROM users u
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| {
            let match_points: i64 = row.get("match_points");
            let advancing_points: i64 = row.get("advancing_points");
            let award_points: i64 = row.get("award_points");
            LeaderboardEntry {
                rank: 0,
                user_id: row.get("id"),
                username: row.get("username"),
                match_points,
                advancing_points,
                award_points,
                total_points: match_points + advancing_points + award_points,
                exact_scores: row.get("exact_scores"),
            }
        })
        .collect())
}

pub async fn upsert_user_score(pool: &SqlitePool, entry: &LeaderboardEntry) -> Result<()> {
    sqlx::query(
        r#"INSERT INTO user_scores (user_id, match_points, advancing_points, award_points, total_points, exact_scores, updated_at)
           VALUES (?, ?, ?, ?, ?, ?, ?)
           ON CONFLICT(user_id) DO UPDATE SET
               match_points     = excluded.match_points,
               advancing_points = excluded.advancing_points,
               award_points     = excluded.award_points,
               total_points     = excluded.total_points,
               exact_scores     = excluded.exact_scores,
               updated_at       = excluded.updated_at"#,
    )
    .bind(&entry.user_id)
    .bind(entry.match_points)
    .bind(entry.advancing_points)
    .bind(entry.award_points)
    .bind(entry.total_points)
    .bind(entry.exact_scores)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;
    Ok(())
}

/// Stored leaderboard totals, unranked.
pub async fn list_user_scores(pool: &SqlitePool) -> Result<Vec<LeaderboardEntry>> {
    let rows = sqlx::query(
        r#"SELECT s.*, u.username FROM user_scores s JOIN users u ON u.id = s.user_id"#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| LeaderboardEntry {
            rank: 0,
            user_id: row.get("user_id"),
            username: row.get("username"),
            match_points: row.get("match_points"),
            advancing_points: row.get("advancing_points"),
            award_points: row.get("award_points"),
            total_points: row.get("total_points"),
            exact_scores: row.get("exact_scores"),
        })
        .collect())
}
