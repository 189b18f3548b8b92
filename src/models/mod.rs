use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[serde(alias = "Easy")]
    Easy,
    #[serde(alias = "Medium")]
    Medium,
    #[serde(alias = "Hard")]
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    /// 目录中的位置索引，加载时写入
    #[serde(default)]
    pub id: usize,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub examples: Vec<Example>,
    #[serde(default)]
    pub constraints: Vec<String>,
    pub starter_code: Option<String>,
    pub answer: Option<String>,
    pub test_cases: Option<Vec<TestCase>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Example {
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub output: String,
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    /// 提交代码之后附加的调用语句
    pub call: String,
    /// 与执行输出比对的期望结果
    pub expected_output: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProgressStatus {
    #[serde(rename = "not-done")]
    NotDone,
    #[serde(rename = "attempted")]
    Attempted,
    #[serde(rename = "solved")]
    Solved,
}

impl ProgressStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStatus::NotDone => "not-done",
            ProgressStatus::Attempted => "attempted",
            ProgressStatus::Solved => "solved",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "not-done" => Some(ProgressStatus::NotDone),
            "attempted" => Some(ProgressStatus::Attempted),
            "solved" => Some(ProgressStatus::Solved),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgressRecord {
    pub user_id: i64,
    pub problem_id: i64,
    pub status: ProgressStatus,
    pub attempts: i64,
    pub last_attempt_date: chrono::DateTime<chrono::Utc>,
    pub solution_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserStats {
    pub user_id: i64,
    pub easy_solved: i64,
    pub medium_solved: i64,
    pub hard_solved: i64,
    pub last_updated: chrono::DateTime<chrono::Utc>,
}

impl UserStats {
    pub fn empty(user_id: i64) -> Self {
        Self {
            user_id,
            easy_solved: 0,
            medium_solved: 0,
            hard_solved: 0,
            last_updated: chrono::Utc::now(),
        }
    }
}
