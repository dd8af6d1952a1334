use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::{AppConfig, ScoringRules};
use crate::db::{
    create_pool, get_match_by_id, get_user_by_id, init_database_with_pool, insert_user, list_group_matches,
    list_teams, list_user_award_predictions, list_user_match_predictions, list_user_scores, save_actual_round,
    set_match_result, upsert_actual_award, upsert_award_prediction,
};
use crate::error::{SelectionError, StandingsError};
use crate::models::{
    ApiResponse, AwardPrediction, AwardType, LeaderboardEntry, Match, MatchPrediction, MatchStatus, Round,
    ScorePair, Team, User,
};
use crate::services::leaderboard;
use crate::services::standings::StandingsReport;
use crate::services::{
    load_bracket, record_match_prediction, save_full_bracket, save_manual_round, toggle_pick, user_standings,
    BracketSelections, BracketSync, Rescorer, Scorer, Toggle,
};
use crate::utils::validate_username;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<AppConfig>,
    pub rescorer: Arc<Rescorer>,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: AppConfig) -> Self {
        let rescorer = Rescorer::new(Scorer::new(config.scoring.clone()));
        Self {
            pool,
            config: Arc::new(config),
            rescorer: Arc::new(rescorer),
        }
    }
}

pub async fn serve(config: AppConfig, port: u16) -> anyhow::Result<()> {
    let pool = create_pool(&config.database_url).await?;
    init_database_with_pool(&pool).await?;

    if let Some(deadline) = config.prediction_deadline {
        tracing::info!("Predictions lock at {}", deadline.to_rfc3339());
    }

    let app = create_router().with_state(AppState::new(pool, config));

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    tracing::info!("World Cup predictor API listening on port {}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/rules", get(get_rules_handler))
        .route("/teams", get(list_teams_handler))
        .route("/matches", get(list_matches_handler))
        .route("/users", post(create_user_handler))
        .route("/users/{user_id}/predictions", get(get_user_predictions_handler))
        .route("/users/{user_id}/standings", get(get_standings_handler))
        .route("/users/{user_id}/bracket", get(get_bracket_handler).put(put_bracket_handler))
        .route(
            "/users/{user_id}/predictions/matches/{match_id}",
            put(put_match_prediction_handler),
        )
        .route("/users/{user_id}/advancing/{round}", put(put_advancing_handler))
        .route("/users/{user_id}/advancing/{round}/{team_id}", post(toggle_pick_handler))
        .route("/users/{user_id}/awards/{award_type}", put(put_award_handler))
        .route("/admin/matches/{match_id}/result", post(post_match_result_handler))
        .route("/admin/advancing/{round}", put(put_actual_advancing_handler))
        .route("/admin/awards/{award_type}", put(put_actual_award_handler))
        .route("/admin/rescore", post(rescore_all_handler))
        .route("/leaderboard", get(get_leaderboard_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

/// Map a service failure onto a status code, logging the cause.
fn service_error(context: &str, e: anyhow::Error) -> StatusCode {
    if let Some(selection) = e.downcast_ref::<SelectionError>() {
        tracing::warn!("{}: refused: {}", context, selection);
        return StatusCode::CONFLICT;
    }
    if let Some(standings) = e.downcast_ref::<StandingsError>() {
        tracing::error!("{}: fixture data is inconsistent: {}", context, standings);
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    tracing::error!("{}: {}", context, e);
    StatusCode::INTERNAL_SERVER_ERROR
}

fn ensure_unlocked(state: &AppState, user_id: &str) -> Result<(), StatusCode> {
    if state.config.predictions_locked(Utc::now()) {
        tracing::warn!("Refused write for user {}: predictions are locked", user_id);
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(())
}

async fn require_user(pool: &SqlitePool, user_id: &str) -> Result<User, StatusCode> {
    match get_user_by_id(pool, user_id).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => Err(service_error("Failed to load user", e)),
    }
}

fn parse_key<T: std::str::FromStr>(raw: &str) -> Result<T, StatusCode>
where
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| {
        tracing::warn!("Rejected path segment: {}", e);
        StatusCode::BAD_REQUEST
    })
}

/// Rebuild stored totals after an admin write.
async fn refresh_leaderboard(state: &AppState) -> Result<Vec<LeaderboardEntry>, StatusCode> {
    state
        .rescorer
        .recalculate_leaderboard(&state.pool)
        .await
        .map_err(|e| service_error("Failed to recalculate leaderboard", e))
}

// Health check endpoint
async fn health_check() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::success("World Cup predictor API is running"))
}

// GET /rules - Point values in effect
async fn get_rules_handler(State(state): State<AppState>) -> Json<ApiResponse<ScoringRules>> {
    Json(ApiResponse::success(state.rescorer.scorer().rules().clone()))
}

// GET /teams
async fn list_teams_handler(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<Team>>>, StatusCode> {
    match list_teams(&state.pool).await {
        Ok(teams) => Ok(Json(ApiResponse::success(teams))),
        Err(e) => Err(service_error("Failed to fetch teams", e)),
    }
}

// GET /matches
async fn list_matches_handler(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<Match>>>, StatusCode> {
    match list_group_matches(&state.pool).await {
        Ok(matches) => Ok(Json(ApiResponse::success(matches))),
        Err(e) => Err(service_error("Failed to fetch matches", e)),
    }
}

// POST /users - Register a player
#[derive(Deserialize)]
struct CreateUserRequest {
    username: String,
    display_name: Option<String>,
}

async fn create_user_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<Json<ApiResponse<User>>, StatusCode> {
    let username = request.username.trim().to_string();
    if !validate_username(&username) {
        return Err(StatusCode::BAD_REQUEST);
    }

    match get_user_by_id(&state.pool, &username).await {
        Ok(Some(_)) => return Err(StatusCode::CONFLICT),
        Ok(None) => {}
        Err(e) => return Err(service_error("Failed to check username", e)),
    }

    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        display_name: request.display_name.unwrap_or_else(|| username.clone()),
        username,
        created_at: Utc::now(),
    };

    match insert_user(&state.pool, &user).await {
        Ok(()) => {
            tracing::info!("Registered user {} ({})", user.username, user.id);
            Ok(Json(ApiResponse::success(user)))
        }
        Err(e) => Err(service_error("Failed to create user", e)),
    }
}

// GET /users/{user_id}/predictions - Everything a user has entered
#[derive(Serialize)]
struct UserPredictions {
    user: User,
    matches: Vec<MatchPrediction>,
    bracket: BracketSelections,
    awards: Vec<AwardPrediction>,
}

async fn get_user_predictions_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<UserPredictions>>, StatusCode> {
    let user = require_user(&state.pool, &user_id).await?;

    let matches = list_user_match_predictions(&state.pool, &user.id)
        .await
        .map_err(|e| service_error("Failed to fetch match predictions", e))?;
    let bracket = load_bracket(&state.pool, &user.id)
        .await
        .map_err(|e| service_error("Failed to fetch bracket", e))?;
    let awards = list_user_award_predictions(&state.pool, &user.id)
        .await
        .map_err(|e| service_error("Failed to fetch award predictions", e))?;

    Ok(Json(ApiResponse::success(UserPredictions {
        user,
        matches,
        bracket: bracket.selections,
        awards,
    })))
}

// GET /users/{user_id}/standings - Group tables from the user's predicted scores
async fn get_standings_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<StandingsReport>>, StatusCode> {
    let user = require_user(&state.pool, &user_id).await?;

    match user_standings(&state.pool, &user.id).await {
        Ok(report) => Ok(Json(ApiResponse::success(report))),
        Err(e) => Err(service_error("Failed to compute standings", e)),
    }
}

// GET /users/{user_id}/bracket - Current picks plus who can still be picked
#[derive(Serialize)]
struct BracketView {
    qualified: Vec<String>,
    selections: BracketSelections,
    candidates: BTreeMap<Round, Vec<String>>,
    complete: bool,
}

async fn get_bracket_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<BracketView>>, StatusCode> {
    let user = require_user(&state.pool, &user_id).await?;
    let stored = load_bracket(&state.pool, &user.id)
        .await
        .map_err(|e| service_error("Failed to fetch bracket", e))?;

    let candidates = Round::MANUAL
        .into_iter()
        .map(|round| (round, stored.selections.candidates(round, &stored.qualified)))
        .collect();

    Ok(Json(ApiResponse::success(BracketView {
        complete: stored.selections.is_complete(),
        qualified: stored.qualified,
        selections: stored.selections,
        candidates,
    })))
}

// PUT /users/{user_id}/bracket - Save every manual round in one go
async fn put_bracket_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<BTreeMap<String, Vec<String>>>,
) -> Result<Json<ApiResponse<BracketSelections>>, StatusCode> {
    ensure_unlocked(&state, &user_id)?;
    let user = require_user(&state.pool, &user_id).await?;

    let mut rounds = BTreeMap::new();
    for (round, teams) in request {
        rounds.insert(parse_key::<Round>(&round)?, teams);
    }

    match save_full_bracket(&state.pool, &user.id, rounds).await {
        Ok(selections) => Ok(Json(ApiResponse::success(selections))),
        Err(e) => Err(service_error("Failed to save bracket", e)),
    }
}

// PUT /users/{user_id}/predictions/matches/{match_id}
#[derive(Deserialize)]
struct ScoreRequest {
    home_score: i32,
    away_score: i32,
}

impl ScoreRequest {
    fn score(&self) -> Result<ScorePair, StatusCode> {
        if self.home_score < 0 || self.away_score < 0 {
            return Err(StatusCode::BAD_REQUEST);
        }
        Ok(ScorePair {
            home: self.home_score,
            away: self.away_score,
        })
    }
}

async fn put_match_prediction_handler(
    State(state): State<AppState>,
    Path((user_id, match_id)): Path<(String, String)>,
    Json(request): Json<ScoreRequest>,
) -> Result<Json<ApiResponse<BracketSync>>, StatusCode> {
    ensure_unlocked(&state, &user_id)?;
    let score = request.score()?;
    let user = require_user(&state.pool, &user_id).await?;

    let match_data = match get_match_by_id(&state.pool, &match_id).await {
        Ok(Some(m)) => m,
        Ok(None) => return Err(StatusCode::NOT_FOUND),
        Err(e) => return Err(service_error("Failed to fetch match", e)),
    };

    match record_match_prediction(&state.pool, &state.rescorer, &user.id, &match_data, score).await {
        Ok(sync) => Ok(Json(ApiResponse::success(sync))),
        Err(e) => Err(service_error("Failed to save prediction", e)),
    }
}

// PUT /users/{user_id}/advancing/{round}
#[derive(Deserialize)]
struct TeamsRequest {
    team_ids: Vec<String>,
}

async fn put_advancing_handler(
    State(state): State<AppState>,
    Path((user_id, round)): Path<(String, String)>,
    Json(request): Json<TeamsRequest>,
) -> Result<Json<ApiResponse<BracketSelections>>, StatusCode> {
    ensure_unlocked(&state, &user_id)?;
    let round = parse_key::<Round>(&round)?;
    let user = require_user(&state.pool, &user_id).await?;

    match save_manual_round(&state.pool, &user.id, round, request.team_ids).await {
        Ok(selections) => Ok(Json(ApiResponse::success(selections))),
        Err(e) => Err(service_error("Failed to save round selection", e)),
    }
}

// POST /users/{user_id}/advancing/{round}/{team_id} - Pick or unpick one team
#[derive(Serialize)]
struct ToggleResponse {
    outcome: Toggle,
    selections: BracketSelections,
}

async fn toggle_pick_handler(
    State(state): State<AppState>,
    Path((user_id, round, team_id)): Path<(String, String, String)>,
) -> Result<Json<ApiResponse<ToggleResponse>>, StatusCode> {
    ensure_unlocked(&state, &user_id)?;
    let round = parse_key::<Round>(&round)?;
    let user = require_user(&state.pool, &user_id).await?;

    match toggle_pick(&state.pool, &user.id, round, &team_id).await {
        Ok((outcome, selections)) => Ok(Json(ApiResponse::success(ToggleResponse { outcome, selections }))),
        Err(e) => Err(service_error("Failed to toggle pick", e)),
    }
}

// PUT /users/{user_id}/awards/{award_type}
#[derive(Deserialize)]
struct AwardRequest {
    player_name: Option<String>,
    total_goals: Option<i32>,
}

impl AwardRequest {
    /// Player awards carry a name, the goal tally carries a number.
    fn values(&self, award_type: AwardType) -> Result<(Option<&str>, Option<i32>), StatusCode> {
        let name = self
            .player_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());
        if award_type.is_player_award() {
            Ok((name, None))
        } else {
            match self.total_goals {
                Some(goals) if goals < 0 => Err(StatusCode::BAD_REQUEST),
                goals => Ok((None, goals)),
            }
        }
    }
}

async fn put_award_handler(
    State(state): State<AppState>,
    Path((user_id, award_type)): Path<(String, String)>,
    Json(request): Json<AwardRequest>,
) -> Result<Json<ApiResponse<String>>, StatusCode> {
    ensure_unlocked(&state, &user_id)?;
    let award_type = parse_key::<AwardType>(&award_type)?;
    let (name, goals) = request.values(award_type)?;
    let user = require_user(&state.pool, &user_id).await?;

    match upsert_award_prediction(&state.pool, &user.id, award_type, name, goals).await {
        Ok(()) => Ok(Json(ApiResponse::success(format!("Saved {} prediction", award_type)))),
        Err(e) => Err(service_error("Failed to save award prediction", e)),
    }
}

// POST /admin/matches/{match_id}/result
#[derive(Deserialize)]
struct ResultRequest {
    home_score: Option<i32>,
    away_score: Option<i32>,
    status: Option<String>,
}

async fn post_match_result_handler(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
    Json(request): Json<ResultRequest>,
) -> Result<Json<ApiResponse<Vec<LeaderboardEntry>>>, StatusCode> {
    let status = match request.status.as_deref() {
        Some(raw) => parse_key::<MatchStatus>(raw)?,
        None => MatchStatus::Finished,
    };
    if request.home_score.is_some_and(|s| s < 0) || request.away_score.is_some_and(|s| s < 0) {
        return Err(StatusCode::BAD_REQUEST);
    }

    match set_match_result(&state.pool, &match_id, status, request.home_score, request.away_score).await {
        Ok(true) => {}
        Ok(false) => return Err(StatusCode::NOT_FOUND),
        Err(e) => return Err(service_error("Failed to record result", e)),
    }

    state
        .rescorer
        .rescore_match(&state.pool, &match_id)
        .await
        .map_err(|e| service_error("Failed to rescore match", e))?;

    Ok(Json(ApiResponse::success(refresh_leaderboard(&state).await?)))
}

// PUT /admin/advancing/{round}
async fn put_actual_advancing_handler(
    State(state): State<AppState>,
    Path(round): Path<String>,
    Json(request): Json<TeamsRequest>,
) -> Result<Json<ApiResponse<Vec<LeaderboardEntry>>>, StatusCode> {
    let round = parse_key::<Round>(&round)?;
    if request.team_ids.len() > round.capacity() {
        tracing::warn!("Refused {} actual advancers for {}", request.team_ids.len(), round);
        return Err(StatusCode::BAD_REQUEST);
    }

    save_actual_round(&state.pool, round, &request.team_ids)
        .await
        .map_err(|e| service_error("Failed to record advancers", e))?;

    state
        .rescorer
        .rescore_advancing(&state.pool)
        .await
        .map_err(|e| service_error("Failed to rescore advancing picks", e))?;

    Ok(Json(ApiResponse::success(refresh_leaderboard(&state).await?)))
}

// PUT /admin/awards/{award_type}
async fn put_actual_award_handler(
    State(state): State<AppState>,
    Path(award_type): Path<String>,
    Json(request): Json<AwardRequest>,
) -> Result<Json<ApiResponse<Vec<LeaderboardEntry>>>, StatusCode> {
    let award_type = parse_key::<AwardType>(&award_type)?;
    let (name, goals) = request.values(award_type)?;

    upsert_actual_award(&state.pool, award_type, name, goals)
        .await
        .map_err(|e| service_error("Failed to record award", e))?;

    state
        .rescorer
        .rescore_awards(&state.pool)
        .await
        .map_err(|e| service_error("Failed to rescore awards", e))?;

    Ok(Json(ApiResponse::success(refresh_leaderboard(&state).await?)))
}

// POST /admin/rescore - Full recomputation, e.g. after changing POINTS_* values
async fn rescore_all_handler(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<LeaderboardEntry>>>, StatusCode> {
    match state.rescorer.rescore_all(&state.pool).await {
        Ok(board) => Ok(Json(ApiResponse::success(board))),
        Err(e) => Err(service_error("Failed to rescore", e)),
    }
}

// GET /leaderboard
async fn get_leaderboard_handler(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<LeaderboardEntry>>>, StatusCode> {
    match list_user_scores(&state.pool).await {
        Ok(entries) => Ok(Json(ApiResponse::success(leaderboard::rank(entries)))),
        Err(e) => Err(service_error("Failed to fetch leaderboard", e)),
    }
}
