//! Octave 代码执行服务
//! 每次调用在独立的临时工作目录中落盘脚本，以超时约束运行外部解释器，
//! 捕获 stdout/stderr 并回收绘图产物

use anyhow::{Context, Result};
use base64::{engine::general_purpose, Engine as _};
use log::{debug, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use uuid::Uuid;

/// Octave 执行配置
#[derive(Debug, Clone)]
pub struct OctaveConfig {
    /// 解释器可执行文件
    pub binary: PathBuf,
    /// 单次执行的墙钟超时
    pub timeout: Duration,
    /// 临时工作目录的父目录，None 时使用系统临时目录
    pub scratch_root: Option<PathBuf>,
}

impl Default for OctaveConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("octave"),
            timeout: Duration::from_secs(10),
            scratch_root: None,
        }
    }
}

/// 执行请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub code: String,
    pub input: Option<String>,
}

/// 执行结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionOutcome {
    pub success: bool,
    pub output: String,
    pub has_image: bool,
    pub image_data: Option<String>,
}

impl ExecutionOutcome {
    fn failure(output: String) -> Self {
        Self {
            success: false,
            output,
            has_image: false,
            image_data: None,
        }
    }
}

/// Octave 解释器运行器
pub struct OctaveRunner {
    config: OctaveConfig,
    plot_target: Regex,
}

impl OctaveRunner {
    pub fn new(config: OctaveConfig) -> Self {
        // 原始脚本里写死的绘图输出路径，执行前改写到本次调用的工作目录
        let plot_target = Regex::new(r#"print\(['"]/tmp/plot\.png['"]"#)
            .expect("plot target pattern is valid");
        Self {
            config,
            plot_target,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    /// 执行一段代码，返回捕获的输出与可选的绘图产物
    ///
    /// user_tag 参与临时目录命名，避免并发提交互相干扰。
    pub async fn execute(
        &self,
        user_tag: &str,
        request: &ExecutionRequest,
    ) -> Result<ExecutionOutcome> {
        let mut builder = tempfile::Builder::new();
        let prefix = format!("octave_{}_", user_tag);
        builder.prefix(&prefix);

        let scratch = match &self.config.scratch_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .context("Failed to create scratch directory")?;

        let plot_path = scratch.path().join("plot.png");
        let script_path = scratch
            .path()
            .join(format!("octave_{}_{}.m", user_tag, Uuid::new_v4()));

        let full_code = self.prepare_script(&request.code, request.input.as_deref(), &plot_path);
        tokio::fs::write(&script_path, &full_code)
            .await
            .context("Failed to write script file")?;

        debug!(
            "Running {} on {}",
            self.config.binary.display(),
            script_path.display()
        );

        let child = Command::new(&self.config.binary)
            .arg("--no-gui")
            .arg("--quiet")
            .arg(&script_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| {
                format!("Failed to spawn interpreter: {}", self.config.binary.display())
            })?;

        let output = match timeout(self.config.timeout, child.wait_with_output()).await {
            Ok(result) => result.context("Failed to collect interpreter output")?,
            Err(_) => {
                warn!(
                    "Execution for {} timed out after {:?}",
                    user_tag, self.config.timeout
                );
                return Ok(ExecutionOutcome::failure(format!(
                    "Execution timed out after {} seconds",
                    self.config.timeout.as_secs()
                )));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            let message = if stderr.trim().is_empty() { stdout } else { stderr };
            return Ok(ExecutionOutcome::failure(message));
        }

        let image_data = self.collect_plot(&plot_path).await;

        Ok(ExecutionOutcome {
            success: true,
            output: stdout,
            has_image: image_data.is_some(),
            image_data,
        })
    }

    /// 执行一条测试用例：由执行服务拼装提交代码与调用语句
    pub async fn run_test(
        &self,
        user_tag: &str,
        solution: &str,
        call: &str,
        index: usize,
    ) -> Result<ExecutionOutcome> {
        let code = assemble_test_script(solution, call, index);
        self.execute(
            user_tag,
            &ExecutionRequest {
                code,
                input: None,
            },
        )
        .await
    }

    fn prepare_script(&self, code: &str, input: Option<&str>, plot_path: &Path) -> String {
        let replacement = format!("print('{}'", plot_path.display());
        let rewritten = self
            .plot_target
            .replace_all(code, regex::NoExpand(&replacement));

        match input {
            Some(input) if !input.trim().is_empty() => {
                format!("input_value = {};\n{}", input, rewritten)
            }
            _ => rewritten.into_owned(),
        }
    }

    async fn collect_plot(&self, plot_path: &Path) -> Option<String> {
        match tokio::fs::read(plot_path).await {
            Ok(bytes) => Some(format!(
                "data:image/png;base64,{}",
                general_purpose::STANDARD.encode(bytes)
            )),
            Err(_) => None,
        }
    }
}

/// 拼装测试脚本：提交的函数定义在前，测试调用在后
pub fn assemble_test_script(solution: &str, call: &str, index: usize) -> String {
    format!("{}\n\n% Test case {}\n{}\n", solution, call_number(index), call)
}

fn call_number(index: usize) -> usize {
    index + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_test_script() {
        let script = assemble_test_script("function y = f(x)\ny = x;\nend", "disp(f(2))", 0);

        assert!(script.starts_with("function y = f(x)"));
        assert!(script.contains("% Test case 1"));
        assert!(script.ends_with("disp(f(2))\n"));
    }

    #[test]
    fn test_prepare_script_rewrites_plot_target() {
        let runner = OctaveRunner::new(OctaveConfig::default());
        let plot = Path::new("/scratch/plot.png");

        let out = runner.prepare_script("plot(x, y);\nprint('/tmp/plot.png', '-dpng');", None, plot);

        assert!(out.contains("print('/scratch/plot.png', '-dpng');"));
        assert!(!out.contains("/tmp/plot.png"));
    }

    #[test]
    fn test_prepare_script_prepends_input() {
        let runner = OctaveRunner::new(OctaveConfig::default());

        let out = runner.prepare_script("disp(input_value)", Some("42"), Path::new("p.png"));

        assert_eq!(out, "input_value = 42;\ndisp(input_value)");
    }

    #[cfg(unix)]
    mod unix {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        /// 写一个顶替 octave 的脚本，接收 --no-gui --quiet <file> 参数
        fn fake_interpreter(dir: &Path, body: &str) -> PathBuf {
            let path = dir.join("fake-octave");
            std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        fn runner_with(binary: PathBuf, timeout: Duration) -> OctaveRunner {
            OctaveRunner::new(OctaveConfig {
                binary,
                timeout,
                scratch_root: None,
            })
        }

        #[tokio::test]
        async fn test_execute_captures_stdout() {
            let dir = tempfile::tempdir().unwrap();
            let bin = fake_interpreter(dir.path(), "echo banana");
            let runner = runner_with(bin, Duration::from_secs(5));

            let outcome = runner
                .execute(
                    "7",
                    &ExecutionRequest {
                        code: "disp('x')".into(),
                        input: None,
                    },
                )
                .await
                .unwrap();

            assert!(outcome.success);
            assert_eq!(outcome.output.trim(), "banana");
            assert!(!outcome.has_image);
        }

        #[tokio::test]
        async fn test_execute_surfaces_stderr_on_failure() {
            let dir = tempfile::tempdir().unwrap();
            let bin = fake_interpreter(dir.path(), "echo 'parse error' >&2\nexit 1");
            let runner = runner_with(bin, Duration::from_secs(5));

            let outcome = runner
                .execute(
                    "7",
                    &ExecutionRequest {
                        code: "oops(".into(),
                        input: None,
                    },
                )
                .await
                .unwrap();

            assert!(!outcome.success);
            assert!(outcome.output.contains("parse error"));
        }

        #[tokio::test]
        async fn test_execute_times_out() {
            let dir = tempfile::tempdir().unwrap();
            let bin = fake_interpreter(dir.path(), "sleep 5");
            let runner = runner_with(bin, Duration::from_millis(200));

            let outcome = runner
                .execute(
                    "7",
                    &ExecutionRequest {
                        code: "while true; end".into(),
                        input: None,
                    },
                )
                .await
                .unwrap();

            assert!(!outcome.success);
            assert!(outcome.output.contains("timed out"));
        }

        #[tokio::test]
        async fn test_execute_writes_input_binding() {
            let dir = tempfile::tempdir().unwrap();
            // 回显脚本文件内容，检验 input 前置与拼装
            let bin = fake_interpreter(dir.path(), "cat \"$3\"");
            let runner = runner_with(bin, Duration::from_secs(5));

            let outcome = runner
                .execute(
                    "7",
                    &ExecutionRequest {
                        code: "disp(input_value)".into(),
                        input: Some("42".into()),
                    },
                )
                .await
                .unwrap();

            assert!(outcome.success);
            assert!(outcome.output.starts_with("input_value = 42;"));
        }

        #[tokio::test]
        async fn test_spawn_failure_is_an_error() {
            let runner = runner_with(PathBuf::from("/nonexistent/fake-octave"), Duration::from_secs(1));

            let result = runner
                .execute(
                    "7",
                    &ExecutionRequest {
                        code: "disp(1)".into(),
                        input: None,
                    },
                )
                .await;

            assert!(result.is_err());
        }
    }
}
