use anyhow::Result;
use std::path::Path;

use crate::config::AppConfig;
use crate::db::{clear_all_data, create_pool, get_user_by_id, init_database_with_pool, list_group_matches, list_teams, seed_data};
use crate::models::LeaderboardEntry;
use crate::services::{load_bracket, user_standings, Rescorer, Scorer};
use crate::utils::closest_names;

pub async fn seed(config: &AppConfig, reset: bool) -> Result<()> {
    let pool = create_pool(&config.database_url).await?;
    init_database_with_pool(&pool).await?;

    if reset {
        println!("🧹 Clearing existing data...");
        clear_all_data(&pool).await?;
    }

    println!("🌱 Seeding the group-stage draw...");
    seed_data(&pool).await?;

    let teams = list_teams(&pool).await?;
    let matches = list_group_matches(&pool).await?;
    println!("✅ {} teams and {} group matches ready", teams.len(), matches.len());
    Ok(())
}

pub async fn show_standings(config: &AppConfig, user: &str) -> Result<()> {
    let pool = create_pool(&config.database_url).await?;

    let user = match get_user_by_id(&pool, user).await? {
        Some(u) => u,
        None => {
            println!("❌ No user with id or username '{}'", user);
            return Ok(());
        }
    };

    println!("📊 Predicted group tables for {} ({})\n", user.display_name, user.username);

    let report = user_standings(&pool, &user.id).await?;
    for (letter, table) in &report.standings_by_group {
        println!("Group {}", letter);
        println!("   {:<3} {:<18} {:>2} {:>2} {:>2} {:>2} {:>3} {:>3} {:>4} {:>3}",
            "#", "Team", "P", "W", "D", "L", "GF", "GA", "GD", "Pts");
        for s in table {
            let mark = if report.all_qualified.contains(&s.team_id) { "*" } else { " " };
            println!("  {}{:<3} {:<18} {:>2} {:>2} {:>2} {:>2} {:>3} {:>3} {:>+4} {:>3}",
                mark,
                s.position,
                s.team_name,
                s.played,
                s.won,
                s.drawn,
                s.lost,
                s.goals_for,
                s.goals_against,
                s.goal_difference,
                s.points
            );
        }
        println!();
    }

    println!("🎟️  Qualified: {} ({} group winners/runners-up, {} best thirds)",
        report.all_qualified.len(),
        report.qualified_top2.len(),
        report.qualified_best_third.len()
    );

    let bracket = load_bracket(&pool, &user.id).await?;
    if bracket.selections.is_complete() {
        println!("🏆 Knockout bracket complete");
    } else {
        println!("📝 Knockout bracket still open");
    }

    Ok(())
}

pub async fn rescore(config: &AppConfig) -> Result<()> {
    let pool = create_pool(&config.database_url).await?;
    let rescorer = Rescorer::new(Scorer::new(config.scoring.clone()));

    println!("🔄 Rescoring every prediction...");

    let matches = rescorer.rescore_all_matches(&pool).await?;
    println!("   • {} match predictions", matches);
    let advancing = rescorer.rescore_advancing(&pool).await?;
    println!("   • {} advancing picks", advancing);
    let awards = rescorer.rescore_awards(&pool).await?;
    println!("   • {} award picks", awards);

    let board = rescorer.recalculate_leaderboard(&pool).await?;
    println!("✅ Leaderboard rebuilt for {} players", board.len());
    Ok(())
}

pub async fn leaderboard(config: &AppConfig, export: Option<&Path>) -> Result<()> {
    let pool = create_pool(&config.database_url).await?;
    let rescorer = Rescorer::new(Scorer::new(config.scoring.clone()));
    let board = rescorer.recalculate_leaderboard(&pool).await?;

    if board.is_empty() {
        println!("📭 No players yet.");
        return Ok(());
    }

    println!("🏆 Leaderboard\n");
    for entry in &board {
        println!("{:>3}. {:<20} {:>4} pts  (matches {}, advancing {}, awards {}, exact {})",
            entry.rank,
            entry.username,
            entry.total_points,
            entry.match_points,
            entry.advancing_points,
            entry.award_points,
            entry.exact_scores
        );
    }

    if let Some(path) = export {
        export_csv(&board, path)?;
        println!("\n💾 Exported {} rows to {}", board.len(), path.display());
    }

    Ok(())
}

fn export_csv(board: &[LeaderboardEntry], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    for entry in board {
        writer.serialize(entry)?;
    }
    writer.flush()?;
    Ok(())
}

pub async fn query_team(config: &AppConfig, team_name: &str) -> Result<()> {
    let pool = create_pool(&config.database_url).await?;

    println!("🔍 Searching for team: {}", team_name);

    let teams = list_teams(&pool).await?;
    let needle = team_name.trim().to_lowercase();
    let found = teams.iter().find(|t| {
        t.name.to_lowercase() == needle || t.code.to_lowercase() == needle || t.id == needle
    });

    let team = match found {
        Some(team) => team,
        None => {
            println!("❌ No team found matching '{}'", team_name);

            let names: Vec<&str> = teams.iter().map(|t| t.name.as_str()).collect();
            let suggestions = closest_names(team_name, &names, 0.75, 5);
            if !suggestions.is_empty() {
                println!("\n💡 Did you mean:");
                for name in suggestions {
                    println!("   • {}", name);
                }
            }
            return Ok(());
        }
    };

    println!("📊 Team Details:");
    println!("   Name: {} ({})", team.name, team.code);
    println!("   Group: {}", team.group_letter);

    let name_of = |id: &Option<String>| {
        id.as_ref()
            .and_then(|id| teams.iter().find(|t| &t.id == id))
            .map_or("TBD".to_string(), |t| t.name.clone())
    };

    println!("\n📅 Group Matches:");
    let matches = list_group_matches(&pool).await?;
    for m in matches.iter().filter(|m| {
        m.home_team_id.as_deref() == Some(team.id.as_str()) || m.away_team_id.as_deref() == Some(team.id.as_str())
    }) {
        let score = match m.final_score() {
            Some(s) => format!("{}-{}", s.home, s.away),
            None => m.status.as_str().to_string(),
        };
        println!("   {} {} vs {} ({})",
            m.match_date.format("%m/%d %H:%M"),
            name_of(&m.home_team_id),
            name_of(&m.away_team_id),
            score
        );
    }

    Ok(())
}
