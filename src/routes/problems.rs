// 题目目录路由
// 列表与详情都不下发标准答案与期望输出

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use crate::error::AppError;
use crate::models::{Difficulty, Example, Problem};
use crate::services::render_description;
use crate::state::AppState;

/// 列表项传输对象
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemSummaryDto {
    pub id: usize,
    pub title: String,
    pub difficulty: Difficulty,
    pub has_answer: bool,
    pub has_test_cases: bool,
}

impl ProblemSummaryDto {
    pub fn from_problem(problem: &Problem) -> Self {
        Self {
            id: problem.id,
            title: problem.title.clone(),
            difficulty: problem.difficulty,
            has_answer: problem.answer.is_some(),
            has_test_cases: problem
                .test_cases
                .as_ref()
                .map(|t| !t.is_empty())
                .unwrap_or(false),
        }
    }
}

/// 详情传输对象
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDetailDto {
    pub id: usize,
    pub title: String,
    pub difficulty: Difficulty,
    pub description: String,
    pub description_html: String,
    pub examples: Vec<Example>,
    pub constraints: Vec<String>,
    pub starter_code: Option<String>,
    /// 展示给前端的测试调用语句，不含期望输出
    pub test_calls: Vec<String>,
    pub has_answer: bool,
}

pub async fn list_problems(
    State(state): State<Arc<AppState>>,
) -> Json<Vec<ProblemSummaryDto>> {
    let dtos = state
        .catalog
        .all()
        .iter()
        .map(ProblemSummaryDto::from_problem)
        .collect();

    Json(dtos)
}

pub async fn get_problem(
    State(state): State<Arc<AppState>>,
    Path(id): Path<usize>,
) -> Result<Json<ProblemDetailDto>, AppError> {
    let problem = state.catalog.get(id).ok_or(AppError::ProblemNotFound)?;

    let test_calls = problem
        .test_cases
        .as_ref()
        .map(|tests| tests.iter().map(|t| t.call.clone()).collect())
        .unwrap_or_default();

    Ok(Json(ProblemDetailDto {
        id: problem.id,
        title: problem.title.clone(),
        difficulty: problem.difficulty,
        description: problem.description.clone(),
        description_html: render_description(&problem.description),
        examples: problem.examples.clone(),
        constraints: problem.constraints.clone(),
        starter_code: problem.starter_code.clone(),
        test_calls,
        has_answer: problem.answer.is_some(),
    }))
}
