// 统计路由

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use crate::error::AppError;
use crate::routes::auth::CurrentUser;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatsDto {
    pub easy_solved: i64,
    pub medium_solved: i64,
    pub hard_solved: i64,
    pub last_updated: String,
}

/// 用户各难度的首次解出计数，未答题时为全零
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<UserStatsDto>, AppError> {
    let stats = state
        .db
        .get_stats(user_id)
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(UserStatsDto {
        easy_solved: stats.easy_solved,
        medium_solved: stats.medium_solved,
        hard_solved: stats.hard_solved,
        last_updated: stats.last_updated.to_rfc3339(),
    }))
}
