// 代码执行与提交路由
// 提交流程先落一次 attempted 再进入验证（至少一次落库），
// 全部通过后由独立的进度确认接口提交 solved

use axum::extract::State;
use axum::Json;
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::AppError;
use crate::models::ProgressStatus;
use crate::routes::auth::CurrentUser;
use crate::services::{ExecutionOutcome, ExecutionRequest, TestResult, Verdict};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RunOctaveRequest {
    pub code: String,
    pub input: Option<String>,
}

/// 编辑器里的 Run 按钮：直接执行代码，不做判定，不落进度
pub async fn run_octave(
    State(state): State<Arc<AppState>>,
    user: Option<CurrentUser>,
    Json(request): Json<RunOctaveRequest>,
) -> Result<Json<ExecutionOutcome>, AppError> {
    if request.code.trim().is_empty() {
        return Err(AppError::BadRequest("Code is required".to_string()));
    }

    let outcome = state
        .octave
        .execute(
            &CurrentUser::tag(&user),
            &ExecutionRequest {
                code: request.code,
                input: request.input,
            },
        )
        .await
        .map_err(|e| AppError::Execution(e.to_string()))?;

    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitSolutionRequest {
    pub problem_id: usize,
    pub solution_code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitSolutionResponse {
    pub results: Vec<TestResult>,
    pub verdict: Verdict,
    /// 落库后的进度状态，练习模式下为 null
    pub status: Option<ProgressStatus>,
    pub progress_saved: bool,
}

pub async fn submit_solution(
    State(state): State<Arc<AppState>>,
    user: Option<CurrentUser>,
    Json(request): Json<SubmitSolutionRequest>,
) -> Result<Json<SubmitSolutionResponse>, AppError> {
    if request.solution_code.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Please provide a solution before submitting".to_string(),
        ));
    }

    let problem = state
        .catalog
        .get(request.problem_id)
        .ok_or(AppError::ProblemNotFound)?;
    let problem_id = request.problem_id as i64;

    // 验证可能既慢又失败，先把这次尝试落成 attempted
    let mut progress_saved = false;
    let mut status = None;
    if let Some(CurrentUser(user_id)) = user {
        match state
            .db
            .record_attempt(user_id, problem_id, Some(&request.solution_code))
        {
            Ok(record) => {
                progress_saved = true;
                status = Some(record.status);
            }
            Err(e) => {
                error!(
                    "Failed to record attempt for user {} problem {}: {}",
                    user_id, problem_id, e
                );
            }
        }
    } else {
        info!("Practice mode: submission verified without persistence");
    }

    let tests = problem.test_cases.clone().unwrap_or_default();

    if tests.is_empty() {
        // 没有测试用例的题目，提交即视为完成
        if let Some(CurrentUser(user_id)) = user {
            match state.db.mark_solved(
                user_id,
                problem_id,
                Some(&request.solution_code),
                problem.difficulty,
            ) {
                Ok(_) => {
                    progress_saved = true;
                    status = Some(ProgressStatus::Solved);
                }
                Err(e) => {
                    error!(
                        "Failed to mark solved for user {} problem {}: {}",
                        user_id, problem_id, e
                    );
                    progress_saved = false;
                }
            }
        }

        return Ok(Json(SubmitSolutionResponse {
            results: Vec::new(),
            verdict: Verdict::from_counts(0, 0),
            status,
            progress_saved,
        }));
    }

    let (results, verdict) = state
        .verifier
        .run_test_cases(
            &CurrentUser::tag(&user),
            &request.solution_code,
            &tests,
        )
        .await;

    Ok(Json(SubmitSolutionResponse {
        results,
        verdict,
        status,
        progress_saved,
    }))
}
