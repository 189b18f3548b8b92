// HTTP 边界错误类型
// 服务层错误在此折算为状态码与 {"error": ...} 响应体

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Problem not found")]
    ProblemNotFound,

    #[error("No progress found for this problem")]
    ProgressNotFound,

    #[error("Authentication token is required")]
    Unauthenticated,

    #[error("{0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Execution failed: {0}")]
    Execution(String),

    #[error("MATLAB engine is not configured")]
    EngineUnavailable,

    #[error("MATLAB engine error: {0}")]
    Upstream(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::ProblemNotFound | AppError::ProgressNotFound => StatusCode::NOT_FOUND,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::Execution(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::EngineUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
