// 题目目录服务
// 启动时从 JSON 文件整体加载题目列表，按位置索引访问，运行期只读

use anyhow::{Context, Result};
use log::info;
use pulldown_cmark::{html, Options, Parser};
use std::fs;
use std::path::Path;

use crate::models::Problem;

/// 题目目录，进程内唯一，启动后不再变更
pub struct ProblemCatalog {
    problems: Vec<Problem>,
}

impl ProblemCatalog {
    /// 从 JSON 文件加载题目目录
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read problems file: {}", path.display()))?;

        let problems: Vec<Problem> = serde_json::from_str(&raw)
            .with_context(|| format!("Malformed problems file: {}", path.display()))?;

        let catalog = Self::from_problems(problems);
        info!(
            "Loaded {} problems from {}",
            catalog.len(),
            path.display()
        );

        Ok(catalog)
    }

    /// 由内存中的题目列表构建目录，id 按位置重新编号
    pub fn from_problems(mut problems: Vec<Problem>) -> Self {
        for (index, problem) in problems.iter_mut().enumerate() {
            problem.id = index;
        }
        Self { problems }
    }

    pub fn get(&self, id: usize) -> Option<&Problem> {
        self.problems.get(id)
    }

    pub fn all(&self) -> &[Problem] {
        &self.problems
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }
}

/// 渲染题目描述 Markdown 为 HTML
pub fn render_description(content: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(content, options);
    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);

    html_output
}
