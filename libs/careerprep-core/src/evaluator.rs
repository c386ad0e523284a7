/// Test Evaluator - Comparison and Hint Derivation
///
/// **Core Responsibility:**
/// Turn raw execution outputs into `TestResult`s: decide pass/fail and attach
/// a remediation hint.
///
/// **Critical Properties:**
/// - Knows nothing about processes or temp files
/// - Pure function: (execution output, test case) → result
///
/// **Normalization Rules:**
/// - Trim trailing whitespace: YES (both actual and expected)
/// - Trim leading whitespace: NO
/// - Case sensitivity: YES (exact match required)
/// - Internal whitespace: preserved
///
/// **Pass Rule:**
/// Passed only when an expected value exists and the normalized outputs are
/// equal. A test without an expected value is informational and never passes.
///
/// **Hint Order:**
/// 1. Timed out: the timeout hint
/// 2. Expected value present and mismatched: structural diff hint (stderr ignored)
/// 3. No expected value, non-zero exit, stderr non-empty: first matching
///    signature hint, else generic
/// 4. Otherwise: no hint

use crate::hints::{self, FailureKind, GENERIC_HINT};
use careerprep_common::types::{TestCase, TestResult};

/// Raw execution output for a single test case
/// Produced by the engine, consumed by the evaluator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestExecutionOutput {
    pub test_id: String,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub execution_time_ms: u64,
    pub timed_out: bool,
}

fn normalize_output(output: &str) -> &str {
    output.trim_end()
}

/// Evaluate a single execution output against its test case
pub fn evaluate_test(output: &TestExecutionOutput, test_case: &TestCase) -> TestResult {
    let (passed, hint) = if output.timed_out {
        (false, Some(FailureKind::Timeout.hint().to_string()))
    } else {
        match &test_case.expected {
            Some(expected) => {
                let actual = normalize_output(&output.stdout);
                let expected = normalize_output(expected);
                if actual == expected {
                    (true, None)
                } else {
                    (false, Some(hints::diff_hint(actual, expected)))
                }
            }
            None if output.exit_code != 0 => (false, stderr_hint(&output.stderr)),
            // informational run that completed normally
            None => (false, None),
        }
    };

    TestResult {
        test_id: test_case.id.clone(),
        passed,
        stdout: output.stdout.clone(),
        stderr: output.stderr.clone(),
        exit_code: output.exit_code,
        hint,
    }
}

fn stderr_hint(stderr: &str) -> Option<String> {
    if stderr.trim().is_empty() {
        return None;
    }
    Some(
        hints::hint_for_error(stderr)
            .unwrap_or(GENERIC_HINT)
            .to_string(),
    )
}

/// Evaluate all outputs, keeping the order of `tests`
///
/// Outputs are matched to tests by position; the engine produces exactly one
/// output per test in input order.
pub fn evaluate(tests: &[TestCase], outputs: &[TestExecutionOutput]) -> Vec<TestResult> {
    tests
        .iter()
        .zip(outputs)
        .map(|(test_case, output)| {
            let result = evaluate_test(output, test_case);
            tracing::debug!(
                test_id = %result.test_id,
                passed = result.passed,
                exit_code = result.exit_code,
                execution_ms = output.execution_time_ms,
                "Test evaluated"
            );
            result
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use careerprep_common::types::{TIMEOUT_EXIT_CODE, TIMEOUT_MARKER};

    fn make_output(test_id: &str, stdout: &str, stderr: &str, exit_code: i32) -> TestExecutionOutput {
        TestExecutionOutput {
            test_id: test_id.to_string(),
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            exit_code,
            execution_time_ms: 5,
            timed_out: false,
        }
    }

    fn timeout_output(test_id: &str) -> TestExecutionOutput {
        TestExecutionOutput {
            test_id: test_id.to_string(),
            stdout: String::new(),
            stderr: TIMEOUT_MARKER.to_string(),
            exit_code: TIMEOUT_EXIT_CODE,
            execution_time_ms: 2001,
            timed_out: true,
        }
    }

    #[test]
    fn test_normalize_output() {
        assert_eq!(normalize_output("hello"), "hello");
        assert_eq!(normalize_output("hello\n"), "hello");
        assert_eq!(normalize_output("hello  \r\n"), "hello");
        assert_eq!(normalize_output("  hello"), "  hello");
        assert_eq!(normalize_output("   "), "");
    }

    #[test]
    fn test_exact_match_passes() {
        let tc = TestCase::new("t1", "3 4", Some("7"));
        let result = evaluate_test(&make_output("t1", "7\n", "", 0), &tc);

        assert!(result.passed);
        assert_eq!(result.hint, None);
        assert_eq!(result.stdout, "7\n");
    }

    #[test]
    fn test_trailing_whitespace_on_expected_ignored() {
        let tc = TestCase::new("t1", "", Some("a\nb\n\n"));
        let result = evaluate_test(&make_output("t1", "a\nb", "", 0), &tc);
        assert!(result.passed);
    }

    #[test]
    fn test_case_sensitivity() {
        let tc = TestCase::new("t1", "", Some("Hello"));
        let result = evaluate_test(&make_output("t1", "hello", "", 0), &tc);
        assert!(!result.passed);
    }

    #[test]
    fn test_internal_whitespace_matters() {
        let tc = TestCase::new("t1", "", Some("1 2"));
        let result = evaluate_test(&make_output("t1", "1  2", "", 0), &tc);
        assert!(!result.passed);
    }

    #[test]
    fn test_leading_whitespace_matters() {
        let tc = TestCase::new("t1", "", Some("7"));
        let result = evaluate_test(&make_output("t1", " 7", "", 0), &tc);
        assert!(!result.passed);
    }

    #[test]
    fn test_mismatch_uses_diff_hint_not_stderr() {
        let tc = TestCase::new("t1", "", Some("7"));
        let output = make_output("t1", "", "IndexError: list index out of range", 1);
        let result = evaluate_test(&output, &tc);

        assert!(!result.passed);
        let hint = result.hint.unwrap();
        assert!(hint.starts_with("Output differs"));
        assert!(!hint.contains("index ranges"));
        assert_eq!(result.stderr, "IndexError: list index out of range");
        assert_eq!(result.exit_code, 1);
    }

    #[test]
    fn test_informational_run_never_passes() {
        let tc = TestCase::new("t1", "", None);
        let result = evaluate_test(&make_output("t1", "anything", "", 0), &tc);

        assert!(!result.passed);
        assert_eq!(result.hint, None);
    }

    #[test]
    fn test_informational_run_with_crash_gets_signature_hint() {
        let tc = TestCase::new("t1", "", None);
        let output = make_output("t1", "", "Traceback...\nIndexError: list index out of range\n", 1);
        let result = evaluate_test(&output, &tc);

        assert_eq!(result.hint.as_deref(), Some(FailureKind::IndexOutOfRange.hint()));
    }

    #[test]
    fn test_informational_run_unknown_crash_gets_generic_hint() {
        let tc = TestCase::new("t1", "", None);
        let output = make_output("t1", "", "ZeroDivisionError: division by zero", 1);
        let result = evaluate_test(&output, &tc);

        assert_eq!(result.hint.as_deref(), Some(GENERIC_HINT));
    }

    #[test]
    fn test_informational_run_crash_without_stderr_has_no_hint() {
        let tc = TestCase::new("t1", "", None);
        let result = evaluate_test(&make_output("t1", "", "", 3), &tc);
        assert_eq!(result.hint, None);
    }

    #[test]
    fn test_timeout_gets_timeout_hint() {
        let tc = TestCase::new("t1", "", Some("7"));
        let result = evaluate_test(&timeout_output("t1"), &tc);

        assert!(!result.passed);
        assert_eq!(result.exit_code, TIMEOUT_EXIT_CODE);
        assert_eq!(result.stderr, TIMEOUT_MARKER);
        assert_eq!(result.hint.as_deref(), Some(FailureKind::Timeout.hint()));
    }

    #[test]
    fn test_evaluate_preserves_order() {
        let tests = vec![
            TestCase::new("first", "", Some("1")),
            TestCase::new("second", "", Some("2")),
            TestCase::new("third", "", None),
        ];
        let outputs = vec![
            make_output("first", "1", "", 0),
            make_output("second", "3", "", 0),
            make_output("third", "x", "", 0),
        ];

        let results = evaluate(&tests, &outputs);

        let ids: Vec<&str> = results.iter().map(|r| r.test_id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
        assert!(results[0].passed);
        assert!(!results[1].passed);
        assert!(!results[2].passed);
    }
}
