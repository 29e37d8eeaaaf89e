use super::{ApiError, AppState};
use crate::leaderboard::{LeaderboardStats, ScoreRecord, ScoreSubmission};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, Uri};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// `?count=` / `?limit=` are parsed leniently: anything that is not a positive
/// integer falls back to the default.
fn parse_positive(raw: Option<&str>, default: usize) -> usize {
    raw.and_then(|s| s.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(default)
}

#[derive(Debug, Deserialize)]
pub struct WordsQuery {
    pub count: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub language: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub language: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WordsResponse {
    pub words: Vec<String>,
    pub language: String,
    pub count: usize,
    pub total: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LanguageSummary {
    pub id: String,
    pub total: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub score: ScoreRecord,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LanguageLeaderboard {
    pub scores: Vec<ScoreRecord>,
    pub language: String,
    pub total: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LeaderboardOverview {
    pub language: String,
    pub total: usize,
    pub leaderboard: Vec<ScoreRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
    pub deleted: ScoreRecord,
}

pub async fn api_info(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "name": "Typemeteor API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "GET /api/languages": "List available word pools",
            "GET /api/words/:language": "Get words for a language",
            "POST /api/leaderboard": "Save a typing test score",
            "GET /api/leaderboard/:language": "Get leaderboard for a language",
            "GET /api/leaderboard": "Get leaderboard across languages",
            "GET /api/stats": "Aggregate score statistics",
            "DELETE /api/scores/:id": "Delete a score",
        },
        "database": state.store.backend().to_string(),
    }))
}

pub async fn list_languages(State(state): State<AppState>) -> Json<Value> {
    let languages: Vec<LanguageSummary> = state
        .catalog
        .iter()
        .map(|lang| LanguageSummary {
            id: lang.name.clone(),
            total: lang.words.len(),
        })
        .collect();
    Json(json!({ "languages": languages }))
}

pub async fn words(
    State(state): State<AppState>,
    Path(language): Path<String>,
    Query(query): Query<WordsQuery>,
) -> Result<Json<WordsResponse>, ApiError> {
    let pool = state
        .catalog
        .get(&language)
        .map_err(|_| ApiError::LanguageNotFound(language.clone()))?;
    let count = parse_positive(query.count.as_deref(), state.config.default_word_count);

    let words = pool.shuffled(&mut rand::thread_rng(), count);
    Ok(Json(WordsResponse {
        count: words.len(),
        total: pool.words.len(),
        words,
        language,
    }))
}

pub async fn submit_score(
    State(state): State<AppState>,
    payload: Result<Json<ScoreSubmission>, JsonRejection>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let Json(submission) = payload.map_err(|e| ApiError::MalformedBody(e.body_text()))?;

    let score = state
        .with_store(move |store| store.append(submission))
        .await?
        .map_err(|e| ApiError::from_store("Failed to save score", e, None))?;

    tracing::info!(
        name = %score.name,
        wpm = score.wpm,
        accuracy = score.accuracy,
        language = %score.language,
        "score saved"
    );
    Ok(Json(SubmitResponse {
        success: true,
        score,
        message: "Score saved successfully".to_string(),
    }))
}

pub async fn leaderboard_for_language(
    State(state): State<AppState>,
    Path(language): Path<String>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<LanguageLeaderboard>, ApiError> {
    let limit = parse_positive(query.limit.as_deref(), state.config.default_limit)
        .min(state.config.max_limit);

    let lookup = language.clone();
    let scores = state
        .with_store(move |store| store.top_n(&lookup, limit))
        .await?
        .map_err(|e| ApiError::from_store("Failed to fetch leaderboard", e, Some(language.clone())))?;

    Ok(Json(LanguageLeaderboard {
        total: scores.len(),
        scores,
        language,
    }))
}

pub async fn leaderboard_overview(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<LeaderboardOverview>, ApiError> {
    let limit = parse_positive(query.limit.as_deref(), state.config.default_limit)
        .min(state.config.max_limit);
    let language = query
        .language
        .filter(|l| !l.is_empty() && l != "all");

    let filter = language.clone();
    let (leaderboard, stats) = state
        .with_store(move |store| {
            let scores = match filter.as_deref() {
                Some(l) => store.top_n(l, limit)?,
                None => store.top_n_all(limit)?,
            };
            Ok((scores, store.stats(filter.as_deref())?))
        })
        .await?
        .map_err(|e| ApiError::from_store("Failed to get leaderboard", e, None))?;

    Ok(Json(LeaderboardOverview {
        language: language.unwrap_or_else(|| "all".to_string()),
        total: stats.total_scores,
        leaderboard,
    }))
}

pub async fn stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<LeaderboardStats>, ApiError> {
    let language = query.language.filter(|l| !l.is_empty() && l != "all");
    let stats = state
        .with_store(move |store| store.stats(language.as_deref()))
        .await?
        .map_err(|e| ApiError::from_store("Failed to get stats", e, None))?;
    Ok(Json(stats))
}

pub async fn delete_score(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
    uri: Uri,
) -> Result<Json<DeleteResponse>, ApiError> {
    let Path(id) = id.map_err(|_| {
        let segment = uri.path().rsplit('/').next().unwrap_or_default();
        ApiError::InvalidScoreId(segment.to_string())
    })?;
    let deleted = state
        .with_store(move |store| store.remove(id))
        .await?
        .map_err(|e| ApiError::from_store("Failed to delete score", e, None))?;

    tracing::info!(id, name = %deleted.name, wpm = deleted.wpm, "score deleted");
    Ok(Json(DeleteResponse {
        message: "Score deleted successfully".to_string(),
        deleted,
    }))
}

pub async fn not_found(uri: Uri) -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Endpoint not found", "path": uri.path() })),
    )
}
