// 数值挑战路由
// 转发到远程 MATLAB Engine API，未配置引擎时返回 503

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;

use crate::error::AppError;
use crate::routes::auth::CurrentUser;
use crate::services::{ChallengeOutcome, NumericValue};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveChallengeRequest {
    pub problem_key: String,
    pub inputs: Vec<f64>,
    pub expected_output: NumericValue,
}

pub async fn solve_challenge(
    State(state): State<Arc<AppState>>,
    _user: Option<CurrentUser>,
    Json(request): Json<SolveChallengeRequest>,
) -> Result<Json<ChallengeOutcome>, AppError> {
    let engine = state.matlab.as_ref().ok_or(AppError::EngineUnavailable)?;

    let outcome = engine
        .solve_challenge(&request.problem_key, &request.inputs, &request.expected_output)
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    Ok(Json(outcome))
}
