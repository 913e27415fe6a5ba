//! Mapping of the judge's run and submit responses onto one result record.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::envelope::{ResourceKind, adapt};
use crate::lenient;

pub const ACCEPTED: &str = "ACCEPTED";
pub const UNKNOWN: &str = "UNKNOWN";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionKind {
    Run,
    Submit,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub test_case_index: usize, // zero-based
    pub passed: bool,
    pub status: String,
    pub execution_time: Option<f64>, // in milliseconds
    pub memory_used: Option<f64>,    // in kilobytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compile_output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_output: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub kind: ExecutionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_id: Option<String>,
    pub status: String,
    pub passed_count: u32,
    pub total_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<f64>,
    pub test_results: Vec<TestResult>,
}

impl ExecutionResult {
    pub fn is_accepted(&self) -> bool {
        self.status == ACCEPTED
    }
}

/// Judge status as a bare label or as `{id, description}`.
fn status_label(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Object(fields) => fields.get("description").and_then(lenient::text),
        other => lenient::text(other),
    }
}

/// First of the alias fields that is present and readable.
fn first<T>(entry: &Value, names: &[&str], read: impl Fn(&Value) -> Option<T>) -> Option<T> {
    names.iter().find_map(|name| entry.get(*name).and_then(&read))
}

fn count_u32(value: &Value) -> Option<u32> {
    lenient::count(value).and_then(|n| u32::try_from(n).ok())
}

fn count_usize(value: &Value) -> Option<usize> {
    lenient::count(value).and_then(|n| usize::try_from(n).ok())
}

/// Normalises a run or submit response. The payload may still be wrapped
/// in an envelope. Every field is read on its own, so a missing or
/// mistyped field falls back to its empty default without affecting the
/// others.
pub fn normalize_execution(kind: ExecutionKind, payload: &Value) -> ExecutionResult {
    let raw = adapt(ResourceKind::Execution, payload);

    let test_results: Vec<TestResult> = raw
        .get("testResults")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .enumerate()
                .map(|(position, entry)| normalize_test_result(position, entry))
                .collect()
        })
        .unwrap_or_default();

    let passed_count = first(&raw, &["passedCount", "passedTestCases"], count_u32).unwrap_or(0);
    let total_count = first(&raw, &["totalCount", "totalTestCases"], count_u32).unwrap_or(0);
    let judge_status = status_label(raw.get("status"));

    ExecutionResult {
        kind,
        submission_id: first(&raw, &["submissionId"], lenient::text),
        status: overall_status(passed_count, total_count, judge_status),
        passed_count,
        total_count,
        runtime: first(&raw, &["runtime"], lenient::number),
        memory: first(&raw, &["memory"], lenient::number),
        test_results,
    }
}

pub fn overall_status(passed: u32, total: u32, judge_status: Option<String>) -> String {
    if total > 0 && passed == total {
        return ACCEPTED.to_string();
    }
    judge_status
        .filter(|status| !status.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

pub fn normalize_test_result(position: usize, entry: &Value) -> TestResult {
    if !entry.is_object() {
        tracing::warn!(position, "test result is not an object");
    }

    let test_case_index = match (
        first(entry, &["testCase"], count_usize),
        first(entry, &["testCaseIndex"], count_usize),
    ) {
        (Some(one_based), _) => one_based.saturating_sub(1),
        (None, Some(index)) => index,
        (None, None) => position,
    };
    let passed = first(entry, &["passed"], lenient::flag).unwrap_or(false);
    let status = status_label(entry.get("status")).unwrap_or_default();
    let stderr = non_empty(first(entry, &["stderr"], lenient::text));
    let compile_output = non_empty(first(entry, &["compileOutput"], lenient::text));

    let error = stderr
        .clone()
        .or_else(|| compile_output.clone())
        .or_else(|| (!passed && !status.is_empty()).then(|| status.clone()));

    TestResult {
        test_case_index,
        passed,
        status,
        execution_time: first(entry, &["time", "executionTime"], lenient::number),
        memory_used: first(entry, &["memory", "memoryUsed"], lenient::number),
        error,
        stdout: first(entry, &["stdout"], lenient::text),
        stderr,
        compile_output,
        input: first(entry, &["input"], lenient::text),
        expected_output: first(entry, &["expectedOutput"], lenient::text),
        actual_output: first(entry, &["actualOutput"], lenient::text),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn submit_response_is_normalised() {
        let raw = json!({
            "status": "ACCEPTED",
            "passedTestCases": 5,
            "totalTestCases": 5,
            "testResults": [{"testCase": 1, "passed": true, "time": 12, "memory": 256}]
        });

        let result = normalize_execution(ExecutionKind::Submit, &raw);
        let case = &result.test_results[0];
        assert_eq!(case.test_case_index, 0);
        assert!(case.passed);
        assert_eq!(case.execution_time, Some(12.0));
        assert_eq!(case.memory_used, Some(256.0));
        assert_eq!(case.error, None);
        assert_eq!(result.status, "ACCEPTED");
        assert_eq!((result.passed_count, result.total_count), (5, 5));
    }

    #[test]
    fn partial_run_keeps_judge_status() {
        let raw = json!({
            "passedCount": 2,
            "totalCount": 5,
            "status": "WRONG_ANSWER",
            "testResults": []
        });

        let result = normalize_execution(ExecutionKind::Run, &raw);
        assert_eq!(result.status, "WRONG_ANSWER");
        assert!(!result.is_accepted());
    }

    #[test]
    fn all_passed_is_accepted_whatever_the_judge_says() {
        let raw = json!({"passedCount": 3, "totalCount": 3, "status": "PARTIAL"});
        assert_eq!(normalize_execution(ExecutionKind::Run, &raw).status, ACCEPTED);
    }

    #[test]
    fn error_priority_is_stderr_then_compiler_then_status() {
        let stderr = normalize_test_result(
            0,
            &json!({"passed": false, "status": "Runtime Error", "stderr": "panic", "compileOutput": "warn"}),
        );
        assert_eq!(stderr.error.as_deref(), Some("panic"));

        let compiler = normalize_test_result(
            0,
            &json!({"passed": false, "status": "Compilation Error", "stderr": "", "compileOutput": "syntax error"}),
        );
        assert_eq!(compiler.error.as_deref(), Some("syntax error"));

        let status = normalize_test_result(0, &json!({"passed": false, "status": "Wrong Answer"}));
        assert_eq!(status.error.as_deref(), Some("Wrong Answer"));

        let passed = normalize_test_result(0, &json!({"passed": true, "status": "Accepted"}));
        assert_eq!(passed.error, None);
    }

    #[test]
    fn run_index_is_zero_based_and_falls_back_to_position() {
        let raw = json!({"testResults": [
            {"testCaseIndex": 4, "passed": true},
            {"passed": true}
        ]});
        let result = normalize_execution(ExecutionKind::Run, &raw);
        assert_eq!(result.test_results[0].test_case_index, 4);
        assert_eq!(result.test_results[1].test_case_index, 1);
    }

    #[test]
    fn detailed_status_object_is_accepted() {
        let case = normalize_test_result(
            0,
            &json!({"passed": false, "status": {"id": 5, "description": "Time Limit Exceeded"}}),
        );
        assert_eq!(case.status, "Time Limit Exceeded");
    }

    #[test]
    fn missing_fields_give_well_formed_empty_aggregate() {
        let result = normalize_execution(ExecutionKind::Run, &json!({"success": true}));
        assert_eq!(result.passed_count, 0);
        assert_eq!(result.total_count, 0);
        assert!(result.test_results.is_empty());
        assert_eq!(result.status, UNKNOWN);

        let wrapped = normalize_execution(ExecutionKind::Submit, &Value::Null);
        assert_eq!(wrapped.status, UNKNOWN);
    }

    #[test]
    fn enveloped_response_is_unwrapped() {
        let raw = json!({
            "success": true,
            "message": "Code executed",
            "data": {"passedCount": 1, "totalCount": 2, "status": "WRONG_ANSWER", "testResults": []}
        });
        let result = normalize_execution(ExecutionKind::Run, &raw);
        assert_eq!((result.passed_count, result.total_count), (1, 2));
    }

    #[test]
    fn normalising_twice_is_identity() {
        let raw = json!({
            "submissionId": "s-9",
            "status": "RUNTIME_ERROR",
            "passedTestCases": 1,
            "totalTestCases": 3,
            "testResults": [
                {"testCase": 1, "passed": true, "status": "Accepted", "time": 12, "memory": 256},
                {"testCase": 2, "passed": false, "status": "Runtime Error", "stderr": "boom", "time": 3, "memory": 100},
                {"testCase": 3, "passed": false, "status": "Wrong Answer", "executionTime": 7, "memoryUsed": 9}
            ]
        });

        let once = normalize_execution(ExecutionKind::Submit, &raw);
        let again = normalize_execution(ExecutionKind::Submit, &serde_json::to_value(&once).unwrap());
        assert_eq!(once, again);
        assert_eq!(again.test_results[1].test_case_index, 1);
        assert_eq!(again.test_results[1].error.as_deref(), Some("boom"));
        assert_eq!(again.test_results[2].execution_time, Some(7.0));
    }

    #[test]
    fn numeric_submission_id_keeps_the_verdict() {
        let raw = json!({
            "submissionId": 17,
            "status": "ACCEPTED",
            "passedTestCases": 5,
            "totalTestCases": 5,
            "testResults": [
                {"testCase": 1, "passed": true, "time": 12, "memory": 256},
                {"testCase": 2, "passed": true, "time": 10, "memory": 250}
            ]
        });

        let result = normalize_execution(ExecutionKind::Submit, &raw);
        assert_eq!(result.submission_id.as_deref(), Some("17"));
        assert_eq!(result.status, ACCEPTED);
        assert_eq!((result.passed_count, result.total_count), (5, 5));
        assert_eq!(result.test_results.len(), 2);
    }

    #[test]
    fn string_time_keeps_the_test_case() {
        let case = normalize_test_result(
            0,
            &json!({"testCase": 3, "passed": true, "status": "Accepted", "time": "0.012", "memory": "abc"}),
        );
        assert_eq!(case.test_case_index, 2);
        assert!(case.passed);
        assert_eq!(case.status, "Accepted");
        assert_eq!(case.execution_time, Some(0.012));
        assert_eq!(case.memory_used, None);
        assert_eq!(case.error, None);
    }

    #[test]
    fn mistyped_counts_and_flags_degrade_one_field_at_a_time() {
        let raw = json!({
            "status": {"id": 4, "description": "Wrong Answer"},
            "passedCount": "1",
            "totalCount": [3],
            "runtime": "15",
            "testResults": [
                {"testCaseIndex": "0", "passed": "false", "status": "Wrong Answer", "stdout": 41},
                {"passed": null, "stderr": {"trace": "x"}, "status": 5}
            ]
        });

        let result = normalize_execution(ExecutionKind::Run, &raw);
        assert_eq!((result.passed_count, result.total_count), (1, 0));
        assert_eq!(result.status, "Wrong Answer");
        assert_eq!(result.runtime, Some(15.0));

        let first = &result.test_results[0];
        assert_eq!(first.test_case_index, 0);
        assert!(!first.passed);
        assert_eq!(first.stdout.as_deref(), Some("41"));
        assert_eq!(first.error.as_deref(), Some("Wrong Answer"));

        let second = &result.test_results[1];
        assert_eq!(second.test_case_index, 1);
        assert_eq!(second.stderr, None);
        assert_eq!(second.status, "5");
        assert_eq!(second.error.as_deref(), Some("5"));
    }
}
