//! 验证引擎
//! 答案模式：两侧归一化后全等比较；测试用例模式：按声明顺序逐条执行，
//! 输出折叠空白后按包含关系判定，单条执行失败不会中断后续用例

use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::models::TestCase;
use crate::services::executor::OctaveRunner;

/// 单条测试用例的判定结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    /// 用例序号，从 1 开始，与声明顺序一致
    pub id: usize,
    pub call: String,
    pub expected: String,
    pub actual: Option<String>,
    pub passed: bool,
    pub error: Option<String>,
}

/// 提交的聚合判定
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub all_passed: bool,
    pub passed_count: usize,
    pub total_count: usize,
}

impl Verdict {
    pub fn from_counts(passed_count: usize, total_count: usize) -> Self {
        Self {
            all_passed: passed_count == total_count,
            passed_count,
            total_count,
        }
    }
}

/// 答案模式判定
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerVerdict {
    pub is_correct: bool,
    pub message: String,
}

/// 答案归一化：去首尾空白并统一小写
///
/// 只做字符串层面的归一化，"2.0" 与 "2" 不视为相同。
pub fn normalize_answer(answer: &str) -> String {
    answer.trim().to_lowercase()
}

/// 答案模式比较
pub fn check_answer(canonical: &str, user_answer: &str) -> AnswerVerdict {
    let is_correct = normalize_answer(canonical) == normalize_answer(user_answer);

    AnswerVerdict {
        is_correct,
        message: if is_correct {
            "Correct answer!".to_string()
        } else {
            "Incorrect answer. Try again.".to_string()
        },
    }
}

/// 验证引擎，持有执行服务
pub struct Verifier {
    executor: Arc<OctaveRunner>,
    whitespace: Regex,
}

impl Verifier {
    pub fn new(executor: Arc<OctaveRunner>) -> Self {
        let whitespace = Regex::new(r"\s+").expect("whitespace pattern is valid");
        Self {
            executor,
            whitespace,
        }
    }

    /// 折叠空白段为单个空格并去掉首尾空白
    pub fn normalize_output(&self, output: &str) -> String {
        self.whitespace.replace_all(output.trim(), " ").into_owned()
    }

    /// 归一化后的实际输出是否包含期望输出
    pub fn output_matches(&self, actual: &str, expected: &str) -> bool {
        self.normalize_output(actual)
            .contains(&self.normalize_output(expected))
    }

    /// 按声明顺序逐条运行测试用例并聚合判定
    ///
    /// 执行层错误（进程失败、超时）记为该条失败并继续后续用例，
    /// 已得到的结果不受影响。
    pub async fn run_test_cases(
        &self,
        user_tag: &str,
        solution: &str,
        tests: &[TestCase],
    ) -> (Vec<TestResult>, Verdict) {
        let mut results = Vec::with_capacity(tests.len());
        let mut passed_count = 0;

        for (index, case) in tests.iter().enumerate() {
            let outcome = self
                .executor
                .run_test(user_tag, solution, &case.call, index)
                .await;

            let result = match outcome {
                Ok(outcome) if outcome.success => {
                    let actual = outcome.output.trim().to_string();
                    let passed = self.output_matches(&actual, &case.expected_output);
                    if passed {
                        passed_count += 1;
                    }

                    TestResult {
                        id: index + 1,
                        call: case.call.clone(),
                        expected: case.expected_output.clone(),
                        actual: Some(actual),
                        passed,
                        error: None,
                    }
                }
                Ok(outcome) => TestResult {
                    id: index + 1,
                    call: case.call.clone(),
                    expected: case.expected_output.clone(),
                    actual: None,
                    passed: false,
                    error: Some(if outcome.output.trim().is_empty() {
                        "Test execution failed".to_string()
                    } else {
                        outcome.output
                    }),
                },
                Err(e) => TestResult {
                    id: index + 1,
                    call: case.call.clone(),
                    expected: case.expected_output.clone(),
                    actual: None,
                    passed: false,
                    error: Some(e.to_string()),
                },
            };

            debug!(
                "Test case {} for {}: passed={} error={}",
                result.id,
                user_tag,
                result.passed,
                result.error.is_some()
            );
            results.push(result);
        }

        (results, Verdict::from_counts(passed_count, tests.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::executor::OctaveConfig;

    fn verifier() -> Verifier {
        Verifier::new(Arc::new(OctaveRunner::new(OctaveConfig::default())))
    }

    #[test]
    fn test_answer_ignores_whitespace_and_case() {
        assert!(check_answer("2", "  2 ").is_correct);
        assert!(check_answer("Ohm", "ohm").is_correct);
        assert!(check_answer("4.7e-2", " 4.7E-2").is_correct);
    }

    #[test]
    fn test_answer_is_not_numeric_tolerant() {
        // 字符串比较的已知局限："2.0" 与 "2" 不相等
        let verdict = check_answer("2", "2.0");

        assert!(!verdict.is_correct);
        assert_eq!(verdict.message, "Incorrect answer. Try again.");
    }

    #[test]
    fn test_answer_messages() {
        assert_eq!(check_answer("x", "x").message, "Correct answer!");
    }

    #[test]
    fn test_output_containment_allows_surrounding_noise() {
        let v = verifier();

        assert!(v.output_matches("ans = 5", "5"));
        assert!(v.output_matches("warning: shadowed\nans =\n\n   5\n", "ans = 5"));
        assert!(!v.output_matches("ans = 50", "ans = 5 1"));
    }

    #[test]
    fn test_output_collapses_whitespace_runs() {
        let v = verifier();

        assert!(v.output_matches("1\n2\n\t3", "1 2 3"));
        assert_eq!(v.normalize_output("  a \n b\t\tc "), "a b c");
    }

    #[test]
    fn test_verdict_counts() {
        assert!(Verdict::from_counts(3, 3).all_passed);
        assert!(!Verdict::from_counts(2, 3).all_passed);
        assert_eq!(Verdict::from_counts(2, 3).passed_count, 2);
    }

    #[cfg(unix)]
    mod unix {
        use super::*;
        use crate::services::executor::OctaveConfig;
        use std::os::unix::fs::PermissionsExt;
        use std::path::PathBuf;
        use std::time::Duration;

        /// 脚本包含 boom 时模拟解释器崩溃，否则输出 42
        fn flaky_interpreter(dir: &std::path::Path) -> PathBuf {
            let path = dir.join("fake-octave");
            let body = "#!/bin/sh\nif grep -q boom \"$3\"; then\n  echo 'process exploded' >&2\n  exit 1\nfi\necho 42\n";
            std::fs::write(&path, body).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        #[tokio::test]
        async fn test_error_does_not_abort_remaining_tests() {
            let dir = tempfile::tempdir().unwrap();
            let runner = OctaveRunner::new(OctaveConfig {
                binary: flaky_interpreter(dir.path()),
                timeout: Duration::from_secs(5),
                scratch_root: None,
            });
            let verifier = Verifier::new(Arc::new(runner));

            let tests = vec![
                TestCase {
                    call: "boom()".to_string(),
                    expected_output: "42".to_string(),
                },
                TestCase {
                    call: "disp(answer())".to_string(),
                    expected_output: "42".to_string(),
                },
            ];

            let (results, verdict) = verifier
                .run_test_cases("7", "function y = answer()\ny = 42;\nend", &tests)
                .await;

            assert_eq!(results.len(), 2);
            assert!(results[0].error.is_some());
            assert!(!results[0].passed);
            assert!(results[1].passed);
            assert!(results[1].error.is_none());

            assert_eq!(verdict.passed_count, 1);
            assert_eq!(verdict.total_count, 2);
            assert!(!verdict.all_passed);
        }

        #[tokio::test]
        async fn test_results_follow_declaration_order() {
            let dir = tempfile::tempdir().unwrap();
            let runner = OctaveRunner::new(OctaveConfig {
                binary: flaky_interpreter(dir.path()),
                timeout: Duration::from_secs(5),
                scratch_root: None,
            });
            let verifier = Verifier::new(Arc::new(runner));

            let tests: Vec<TestCase> = (0..3)
                .map(|i| TestCase {
                    call: format!("disp(f({}))", i),
                    expected_output: "42".to_string(),
                })
                .collect();

            let (results, verdict) = verifier.run_test_cases("7", "function f()\nend", &tests).await;

            assert_eq!(
                results.iter().map(|r| r.id).collect::<Vec<_>>(),
                vec![1, 2, 3]
            );
            assert!(verdict.all_passed);
        }
    }
}
