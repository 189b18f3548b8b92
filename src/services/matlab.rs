//! 远程 MATLAB 引擎客户端
//! 数值型挑战题交由独立部署的 MATLAB Engine API 求解，
//! 本模块只负责请求编排与失败传递

use anyhow::{bail, Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

/// 标量或向量形式的数值结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum NumericValue {
    Scalar(f64),
    Vector(Vec<f64>),
}

/// 挑战求解请求
#[derive(Debug, Serialize)]
struct ChallengeRequest<'a> {
    problem_id: &'a str,
    inputs: &'a [f64],
    expected_output: &'a NumericValue,
}

/// 挑战求解结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeOutcome {
    pub result: NumericValue,
    pub passed: bool,
}

/// MATLAB Engine API 客户端
#[derive(Clone)]
pub struct MatlabApiClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl MatlabApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 健康检查
    pub async fn is_healthy(&self) -> bool {
        match self.http_client.get(&self.base_url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    /// 求解数值挑战题
    ///
    /// problem_key 必须是合法标识符，远端以 solve_<key> 解析 MATLAB 函数。
    pub async fn solve_challenge(
        &self,
        problem_key: &str,
        inputs: &[f64],
        expected: &NumericValue,
    ) -> Result<ChallengeOutcome> {
        if !is_identifier(problem_key) {
            bail!("Invalid problem key: {}", problem_key);
        }

        let url = format!("{}/challenge/solve", self.base_url);
        debug!("Dispatching challenge {} to {}", problem_key, url);

        let response = self
            .http_client
            .post(&url)
            .json(&ChallengeRequest {
                problem_id: problem_key,
                inputs,
                expected_output: expected,
            })
            .send()
            .await
            .context("MATLAB engine request failed")?;

        if !response.status().is_success() {
            bail!("MATLAB engine returned status {}", response.status());
        }

        response
            .json::<ChallengeOutcome>()
            .await
            .context("Malformed MATLAB engine response")
    }
}

/// 是否为合法的 MATLAB 标识符
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
