use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use typemeteor::config::ServerConfig;
use typemeteor::language::{Language, WordCatalog};
use typemeteor::leaderboard::{
    BackendKind, LeaderboardStats, LeaderboardStore, MemoryStore, ScoreRecord, ScoreSubmission,
    StoreError,
};
use typemeteor::server::{build_router, AppState};

fn app() -> Router {
    let english: Vec<String> = (0..10).map(|i| format!("word{i}")).collect();
    let catalog = WordCatalog::from_languages([
        Language::from_words("english", english),
        Language::from_words("indonesian", vec!["dan".into(), "yang".into()]),
    ]);
    let store = Arc::new(MemoryStore::new(Some(1000)));
    build_router(AppState::new(store, catalog, ServerConfig::default()))
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn submit(app: &Router, name: &str, wpm: u32, accuracy: u32, language: &str) -> Value {
    let (status, body) = send(
        app,
        post_json(
            "/api/leaderboard",
            json!({ "name": name, "wpm": wpm, "accuracy": accuracy, "language": language }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body
}

#[tokio::test]
async fn api_info_at_root_and_api() {
    let app = app();
    for uri in ["/", "/api"] {
        let (status, body) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Typemeteor API");
        assert_eq!(body["database"], "memory");
    }
}

#[tokio::test]
async fn lists_languages_with_pool_sizes() {
    let (status, body) = send(&app(), get("/api/languages")).await;
    assert_eq!(status, StatusCode::OK);
    let languages = body["languages"].as_array().unwrap();
    assert_eq!(languages.len(), 2);
    assert!(languages.contains(&json!({ "id": "english", "total": 10 })));
}

#[tokio::test]
async fn words_are_capped_at_pool_size() {
    let app = app();

    let (status, body) = send(&app, get("/api/words/english?count=4")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["words"].as_array().unwrap().len(), 4);
    assert_eq!(body["count"], 4);
    assert_eq!(body["total"], 10);
    assert_eq!(body["language"], "english");

    let (_, body) = send(&app, get("/api/words/english")).await;
    assert_eq!(body["words"].as_array().unwrap().len(), 10);

    let (_, body) = send(&app, get("/api/words/english?count=nope")).await;
    assert_eq!(body["words"].as_array().unwrap().len(), 10);
}

#[tokio::test]
async fn unknown_language_is_404() {
    let (status, body) = send(&app(), get("/api/words/klingon")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Language not found");
    assert_eq!(body["requested"], "klingon");
}

#[tokio::test]
async fn submit_and_rank_scores() {
    let app = app();
    let first = submit(&app, "  Alice  ", 50, 90, "english").await;
    assert_eq!(first["success"], true);
    assert_eq!(first["message"], "Score saved successfully");
    assert_eq!(first["score"]["id"], 1);
    assert_eq!(first["score"]["name"], "Alice");

    submit(&app, "Bob", 70, 80, "english").await;
    submit(&app, "Cy", 70, 95, "english").await;
    submit(&app, "Dewi", 99, 99, "indonesian").await;

    let (status, body) = send(&app, get("/api/leaderboard/english")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["language"], "english");
    assert_eq!(body["total"], 3);
    let names: Vec<&str> = body["scores"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Cy", "Bob", "Alice"]);

    let (_, body) = send(&app, get("/api/leaderboard/english?limit=1")).await;
    assert_eq!(body["scores"].as_array().unwrap().len(), 1);

    let (_, body) = send(&app, get("/api/leaderboard/german")).await;
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn scores_alias_accepts_submissions() {
    let app = app();
    let (status, body) = send(
        &app,
        post_json(
            "/api/scores",
            json!({ "name": "Eve", "wpm": 40.4, "accuracy": 88.6, "language": "english",
                    "correctWords": 40, "incorrectWords": 5 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["score"]["wpm"], 40);
    assert_eq!(body["score"]["accuracy"], 89);
    assert_eq!(body["score"]["correctWords"], 40);
}

#[tokio::test]
async fn validation_errors_name_the_field() {
    let app = app();
    let cases = [
        (json!({ "wpm": 1, "accuracy": 1, "language": "english" }), "name", "Name is required"),
        (json!({ "name": "x", "accuracy": 1, "language": "english" }), "wpm", "Valid WPM is required"),
        (
            json!({ "name": "x", "wpm": 1, "accuracy": 101, "language": "english" }),
            "accuracy",
            "Valid accuracy (0-100) is required",
        ),
        (json!({ "name": "x", "wpm": 1, "accuracy": 1 }), "language", "Language is required"),
    ];
    for (payload, field, message) in cases {
        let (status, body) = send(&app, post_json("/api/leaderboard", payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], field);
        assert_eq!(body["error"], message);
    }

    let (_, body) = send(&app, get("/api/stats")).await;
    assert_eq!(body["totalScores"], 0);
}

#[tokio::test]
async fn malformed_body_is_400() {
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/leaderboard")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request body");
}

#[tokio::test]
async fn overview_and_stats() {
    let app = app();
    submit(&app, "Alice", 50, 90, "english").await;
    submit(&app, "Alice", 70, 86, "indonesian").await;
    submit(&app, "Bob", 60, 88, "english").await;

    let (status, body) = send(&app, get("/api/leaderboard")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["language"], "all");
    assert_eq!(body["total"], 3);
    assert_eq!(body["leaderboard"][0]["wpm"], 70);

    let (_, body) = send(&app, get("/api/leaderboard?language=english&limit=1")).await;
    assert_eq!(body["language"], "english");
    assert_eq!(body["total"], 2);
    assert_eq!(body["leaderboard"].as_array().unwrap().len(), 1);

    let (status, body) = send(&app, get("/api/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalScores"], 3);
    assert_eq!(body["totalPlayers"], 2);
    assert_eq!(body["topWPM"], 70);
    assert_eq!(body["averageWPM"], 60);
    assert_eq!(body["averageAccuracy"], 88);

    let (_, body) = send(&app, get("/api/stats?language=indonesian")).await;
    assert_eq!(body["totalScores"], 1);
}

#[tokio::test]
async fn delete_score_then_404() {
    let app = app();
    submit(&app, "Alice", 50, 90, "english").await;

    let (status, body) = send(&app, delete("/api/scores/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Score deleted successfully");
    assert_eq!(body["deleted"]["name"], "Alice");

    let (status, body) = send(&app, delete("/api/scores/1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Score not found");
}

#[tokio::test]
async fn unmatched_route_is_404() {
    let (status, body) = send(&app(), get("/api/nothing/here")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Endpoint not found");
    assert_eq!(body["path"], "/api/nothing/here");
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let req = Request::builder()
        .uri("/api/languages")
        .header(header::ORIGIN, "http://example.com")
        .body(Body::empty())
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();
    assert_eq!(
        resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );

    let preflight = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/leaderboard")
        .header(header::ORIGIN, "http://example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let resp = app().oneshot(preflight).await.unwrap();
    assert!(resp.status().is_success());
    let methods = resp
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_METHODS)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(methods.contains("DELETE"));
}

#[derive(Debug)]
struct BrokenStore;

impl LeaderboardStore for BrokenStore {
    fn append(&self, _: ScoreSubmission) -> Result<ScoreRecord, StoreError> {
        Err(StoreError::Corrupt("disk on fire".into()))
    }
    fn top_n(&self, _: &str, _: usize) -> Result<Vec<ScoreRecord>, StoreError> {
        Err(StoreError::Corrupt("disk on fire".into()))
    }
    fn top_n_all(&self, _: usize) -> Result<Vec<ScoreRecord>, StoreError> {
        Err(StoreError::Corrupt("disk on fire".into()))
    }
    fn stats(&self, _: Option<&str>) -> Result<LeaderboardStats, StoreError> {
        Err(StoreError::Corrupt("disk on fire".into()))
    }
    fn remove(&self, _: u64) -> Result<ScoreRecord, StoreError> {
        Err(StoreError::Corrupt("disk on fire".into()))
    }
    fn backend(&self) -> BackendKind {
        BackendKind::File
    }
}

#[tokio::test]
async fn store_faults_are_500_with_empty_listing() {
    let app = build_router(AppState::new(
        Arc::new(BrokenStore),
        WordCatalog::default(),
        ServerConfig::default(),
    ));

    let (status, body) = send(&app, get("/api/leaderboard/english")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to fetch leaderboard");
    assert_eq!(body["scores"], json!([]));
    assert_eq!(body["language"], "english");
    assert_eq!(body["total"], 0);

    let (status, body) = send(
        &app,
        post_json(
            "/api/leaderboard",
            json!({ "name": "x", "wpm": 1, "accuracy": 1, "language": "english" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to save score");
}

#[tokio::test]
async fn wrong_field_types_name_the_field() {
    let app = app();
    let cases = [
        (
            json!({ "name": "x", "wpm": "fast", "accuracy": 90, "language": "english" }),
            "wpm",
            "Valid WPM is required",
        ),
        (
            json!({ "name": 42, "wpm": 50, "accuracy": 90, "language": "english" }),
            "name",
            "Name is required",
        ),
        (
            json!({ "name": "x", "wpm": 50, "accuracy": "90", "language": "english" }),
            "accuracy",
            "Valid accuracy (0-100) is required",
        ),
        (
            json!({ "name": "x", "wpm": 1e12, "accuracy": 90, "language": "english" }),
            "wpm",
            "Valid WPM is required",
        ),
    ];
    for (payload, field, message) in cases {
        let (status, body) = send(&app, post_json("/api/leaderboard", payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(body["field"], field);
        assert_eq!(body["error"], message);
    }

    let (_, body) = send(&app, get("/api/stats")).await;
    assert_eq!(body["totalScores"], 0);
}

#[tokio::test]
async fn non_numeric_score_id_is_json_404() {
    let resp = app().oneshot(delete("/api/scores/abc")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "Score not found");
    assert_eq!(body["requested"], "abc");
}
