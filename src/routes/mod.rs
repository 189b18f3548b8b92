// 路由模块
// HTTP 接口层：解析请求 DTO，调用服务，映射错误为响应

pub mod answers;
pub mod auth;
pub mod challenge;
pub mod execution;
pub mod problems;
pub mod progress;
pub mod stats;

use axum::{
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::state::AppState;

pub use auth::CurrentUser;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/problems", get(problems::list_problems))
        .route("/api/problems/:id", get(problems::get_problem))
        .route("/api/validate-answer", post(answers::validate_answer))
        .route("/api/run-octave", post(execution::run_octave))
        .route("/api/submissions", post(execution::submit_solution))
        .route("/api/progress/update", post(progress::update_progress))
        .route("/api/progress/all", get(progress::get_all_progress))
        .route("/api/progress/:problem_id", get(progress::get_progress))
        .route("/api/user/stats", get(stats::get_stats))
        .route("/api/challenge/solve", post(challenge::solve_challenge))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "msg": "BananaPrep backend is online" }))
}
