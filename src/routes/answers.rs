// 答案校验路由
// 校验始终执行；登录时才落进度与统计，保存失败不掩盖校验结果

use axum::extract::State;
use axum::Json;
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::AppError;
use crate::routes::auth::CurrentUser;
use crate::services::check_answer;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateAnswerRequest {
    pub problem_id: usize,
    pub user_answer: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateAnswerResponse {
    pub is_correct: bool,
    pub message: String,
    /// 本次校验是否成功写入了进度
    pub progress_saved: bool,
}

pub async fn validate_answer(
    State(state): State<Arc<AppState>>,
    user: Option<CurrentUser>,
    Json(request): Json<ValidateAnswerRequest>,
) -> Result<Json<ValidateAnswerResponse>, AppError> {
    if request.user_answer.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Problem ID and user answer are required".to_string(),
        ));
    }

    let problem = state
        .catalog
        .get(request.problem_id)
        .ok_or(AppError::ProblemNotFound)?;

    let canonical = problem.answer.as_deref().ok_or_else(|| {
        AppError::BadRequest("This problem does not have a defined answer".to_string())
    })?;

    let verdict = check_answer(canonical, &request.user_answer);

    let progress_saved = match user {
        Some(CurrentUser(user_id)) => {
            let problem_id = request.problem_id as i64;
            let saved = if verdict.is_correct {
                state
                    .db
                    .mark_solved(user_id, problem_id, None, problem.difficulty)
                    .map(|_| ())
            } else {
                state.db.record_attempt(user_id, problem_id, None).map(|_| ())
            };

            match saved {
                Ok(()) => true,
                Err(e) => {
                    error!(
                        "Failed to save answer progress for user {} problem {}: {}",
                        user_id, problem_id, e
                    );
                    false
                }
            }
        }
        None => {
            info!("Practice mode: answer validated without persistence");
            false
        }
    };

    Ok(Json(ValidateAnswerResponse {
        is_correct: verdict.is_correct,
        message: verdict.message,
        progress_saved,
    }))
}
