/// Tutor Orchestrator - Submission Pipeline
///
/// **Responsibility:**
/// Sequence analyzer, engine and evaluator for one submission, then
/// optionally annotate the response with a language-model hint.
///
/// **Flow:**
/// 1. Static analysis, once
/// 2. Unparseable source: return at once, no runs and no model call
/// 3. Run every test case in input order, one at a time
/// 4. Evaluate outputs into results
/// 5. Model hint, if requested and the model is available
///
/// This module is the glue layer - it knows nothing about:
/// - How code executes (engine's job)
/// - How outputs are judged (evaluator's job)

use crate::analyzer;
use crate::engine::{execute_tests, ProcessEngine};
use crate::evaluator::{self, TestExecutionOutput};
use crate::llm::{complete_optional, LanguageModel, CODING_TUTOR};
use careerprep_common::config::RunnerConfig;
use careerprep_common::types::{
    TestCase, TestResult, TutorRequest, TutorResponse, SPAWN_FAILURE_EXIT_CODE,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Run a full tutoring pass over one submission
#[instrument(
    skip_all,
    fields(
        submission_id = %Uuid::new_v4(),
        test_count = request.tests.len(),
        model_hint = request.request_model_hint
    )
)]
pub async fn tutor<M: LanguageModel>(
    request: &TutorRequest,
    engine: &ProcessEngine,
    model: &M,
) -> TutorResponse {
    let analysis = analyzer::analyze(&request.source);

    if !analysis.parse_ok {
        info!("Submission does not parse; skipping execution and model hint");
        return TutorResponse {
            analysis,
            results: Vec::new(),
            model_hint: None,
        };
    }

    info!(
        complexity = %analysis.complexity,
        patterns = analysis.patterns.len(),
        warnings = analysis.warnings.len(),
        "Static analysis passed"
    );

    let outputs = execute_tests(engine, &request.source, &request.tests).await;
    log_failed_outputs(&outputs);
    let results = evaluator::evaluate(&request.tests, &outputs);

    let model_hint = if request.request_model_hint {
        let prompt = coding_hint_prompt(
            &request.problem,
            &request.source,
            request.include_reference_solution,
        );
        complete_optional(model, &CODING_TUTOR, &prompt).await
    } else {
        None
    };

    let response = TutorResponse {
        analysis,
        results,
        model_hint,
    };

    info!(
        passed = response.passed_count(),
        total = response.results.len(),
        timed_out = response.results.iter().filter(|r| r.timed_out()).count(),
        has_model_hint = response.model_hint.is_some(),
        "Submission tutored"
    );

    response
}

/// Run one test case and judge it
pub async fn run_test(engine: &ProcessEngine, source: &str, test: &TestCase) -> TestResult {
    let outputs = execute_tests(engine, source, std::slice::from_ref(test)).await;
    evaluator::evaluate(std::slice::from_ref(test), &outputs)
        .into_iter()
        .next()
        .unwrap_or_else(|| TestResult {
            test_id: test.id.clone(),
            passed: false,
            stdout: String::new(),
            stderr: "Execution produced no output".to_string(),
            exit_code: SPAWN_FAILURE_EXIT_CODE,
            hint: None,
        })
}

/// Run one test case with the default runner and the given budget
pub async fn run(source: &str, test: &TestCase, timeout_seconds: u64) -> TestResult {
    let engine = ProcessEngine::new(RunnerConfig::default()).with_timeout(timeout_seconds);
    run_test(&engine, source, test).await
}

fn log_failed_outputs(outputs: &[TestExecutionOutput]) {
    for output in outputs {
        if output.timed_out {
            warn!(
                test_id = %output.test_id,
                execution_ms = output.execution_time_ms,
                "Execution timed out; test cannot pass"
            );
        } else if output.exit_code != 0 {
            warn!(
                test_id = %output.test_id,
                exit_code = output.exit_code,
                execution_ms = output.execution_time_ms,
                "Execution failed with runtime error"
            );
        }
    }
}

/// Single prompt carrying the problem and the submitted source
pub fn coding_hint_prompt(problem: &str, source: &str, include_reference_solution: bool) -> String {
    let mut prompt = String::from(
        "Below is a coding-test problem and the Python code a candidate submitted. \
         1) Point out the parts most likely to fail, 2) suggest how to design tests for it, \
         3) if needed, give ideas for improving the time complexity. Keep it concise.",
    );
    if include_reference_solution {
        prompt.push_str(
            "\n4) If possible, finish with one Python reference solution in a single code block.",
        );
    }
    prompt.push_str("\n\n[Problem]\n");
    prompt.push_str(problem);
    prompt.push_str("\n\n[Code]\n");
    prompt.push_str(source);
    prompt
}
