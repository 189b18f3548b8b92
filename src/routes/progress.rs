// 进度路由
// 读接口要求登录；写接口在练习模式下模拟成功但不落库

use axum::extract::{Path, State};
use axum::Json;
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::AppError;
use crate::models::{ProgressRecord, ProgressStatus};
use crate::routes::auth::CurrentUser;
use crate::routes::problems::ProblemSummaryDto;
use crate::state::AppState;

/// 进度传输对象
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecordDto {
    pub problem_id: i64,
    pub status: ProgressStatus,
    pub attempts: i64,
    pub last_attempt_date: String,
    pub solution_code: Option<String>,
}

impl ProgressRecordDto {
    pub fn from_record(record: ProgressRecord) -> Self {
        Self {
            problem_id: record.problem_id,
            status: record.status,
            attempts: record.attempts,
            last_attempt_date: record.last_attempt_date.to_rfc3339(),
            solution_code: record.solution_code,
        }
    }
}

/// 单题进度详情，附带不含答案的题目信息
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressDetailDto {
    #[serde(flatten)]
    pub record: ProgressRecordDto,
    pub problem_data: Option<ProblemSummaryDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProgressRequest {
    pub problem_id: usize,
    pub status: ProgressStatus,
    pub solution_code: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProgressResponse {
    pub message: String,
    pub status: ProgressStatus,
    pub attempts: i64,
}

/// 进度写入：attempted 记一次尝试，solved 为确认完成
///
/// solved 是终态，已解出的记录不会被改回 attempted。
pub async fn update_progress(
    State(state): State<Arc<AppState>>,
    user: Option<CurrentUser>,
    Json(request): Json<UpdateProgressRequest>,
) -> Result<Json<UpdateProgressResponse>, AppError> {
    let problem = state
        .catalog
        .get(request.problem_id)
        .ok_or(AppError::ProblemNotFound)?;
    let problem_id = request.problem_id as i64;

    let Some(CurrentUser(user_id)) = user else {
        // 练习模式：前端照常更新界面，后端不持久化
        info!("Practice mode: progress update skipped");
        return Ok(Json(UpdateProgressResponse {
            message: "Practice mode: progress not persisted".to_string(),
            status: request.status,
            attempts: 0,
        }));
    };

    let record = match request.status {
        ProgressStatus::Attempted => state
            .db
            .record_attempt(user_id, problem_id, request.solution_code.as_deref())
            .map_err(|e| AppError::Database(e.to_string()))?,
        ProgressStatus::Solved => {
            state
                .db
                .mark_solved(
                    user_id,
                    problem_id,
                    request.solution_code.as_deref(),
                    problem.difficulty,
                )
                .map_err(|e| AppError::Database(e.to_string()))?;

            state
                .db
                .get_progress(user_id, problem_id)
                .map_err(|e| AppError::Database(e.to_string()))?
                .ok_or_else(|| AppError::Database("progress row missing".to_string()))?
        }
        ProgressStatus::NotDone => {
            return Err(AppError::BadRequest(
                "Cannot reset progress to not-done".to_string(),
            ));
        }
    };

    Ok(Json(UpdateProgressResponse {
        message: "Progress updated successfully".to_string(),
        status: record.status,
        attempts: record.attempts,
    }))
}

pub async fn get_all_progress(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<Vec<ProgressRecordDto>>, AppError> {
    let records = state
        .db
        .get_all_progress(user_id)
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(
        records.into_iter().map(ProgressRecordDto::from_record).collect(),
    ))
}

pub async fn get_progress(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Path(problem_id): Path<usize>,
) -> Result<Json<ProgressDetailDto>, AppError> {
    let record = state
        .db
        .get_progress(user_id, problem_id as i64)
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or(AppError::ProgressNotFound)?;

    let problem_data = state
        .catalog
        .get(problem_id)
        .map(ProblemSummaryDto::from_problem);

    Ok(Json(ProgressDetailDto {
        record: ProgressRecordDto::from_record(record),
        problem_data,
    }))
}
