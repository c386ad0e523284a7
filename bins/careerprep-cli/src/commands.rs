// CLI commands: each reads its inputs, runs the core pipeline and prints JSON on stdout
use anyhow::{bail, Context, Result};
use careerprep_common::config::TutorConfig;
use careerprep_common::types::{TestCase, TutorRequest};
use careerprep_core::cover_letter::analyze_cover_letter;
use careerprep_core::interview::{analyze_interview, InterviewOptions};
use careerprep_core::llm::{LanguageModel, OpenAiChatModel, Transcriber};
use careerprep_core::{analyze, tutor, ProcessEngine};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Explicit path must exist; otherwise fall back to config/careerprep.json or defaults
pub fn load_config(path: Option<&Path>) -> Result<TutorConfig> {
    match path {
        Some(path) => TutorConfig::load(path),
        None => TutorConfig::load_default(),
    }
}

fn read_text(path: &Path, what: &str) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {} {}", what, path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize result")?;
    println!("{}", json);
    Ok(())
}

/// Parse a full submission document
pub fn load_request(path: &Path) -> Result<TutorRequest> {
    let content = read_text(path, "request")?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse request {}", path.display()))
}

/// Assemble a submission from a source file and an optional test-case file
pub fn build_request(
    source: Option<&Path>,
    tests: Option<&Path>,
    problem: String,
    request_model_hint: bool,
    include_reference_solution: bool,
) -> Result<TutorRequest> {
    let Some(source) = source else {
        bail!("Either --request or --source is required");
    };

    let tests: Vec<TestCase> = match tests {
        Some(path) => {
            let content = read_text(path, "test cases")?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse test cases {}", path.display()))?
        }
        None => Vec::new(),
    };

    Ok(TutorRequest {
        source: read_text(source, "source")?,
        problem,
        tests,
        request_model_hint,
        include_reference_solution,
    })
}

pub fn analyze_file(source: &Path) -> Result<()> {
    let source = read_text(source, "source")?;
    let analysis = analyze(&source);
    info!(
        parse_ok = analysis.parse_ok,
        complexity = %analysis.complexity,
        "Analysis complete"
    );
    print_json(&analysis)
}

pub async fn tutor_submission(
    config: &TutorConfig,
    request: TutorRequest,
    timeout: Option<u64>,
) -> Result<()> {
    let mut engine = ProcessEngine::new(config.runner.clone());
    if let Some(seconds) = timeout {
        if seconds == 0 {
            bail!("--timeout must be at least 1 second");
        }
        engine = engine.with_timeout(seconds);
    }
    let model = OpenAiChatModel::from_config(&config.model)?;

    if request.request_model_hint && !model.is_available() {
        warn!(
            api_key_env = %config.model.api_key_env,
            "Model hint requested but no API key is set; continuing without it"
        );
    }

    info!(
        interpreter = engine.interpreter(),
        timeout_secs = engine.timeout().as_secs(),
        tests = request.tests.len(),
        "Tutoring submission"
    );

    let response = tutor(&request, &engine, &model).await;
    print_json(&response)
}

pub async fn cover_letter(
    config: &TutorConfig,
    file: &Path,
    job_title: Option<&str>,
    enable_model: bool,
) -> Result<()> {
    let text = read_text(file, "cover letter")?;
    let model = OpenAiChatModel::from_config(&config.model)?;
    let feedback = analyze_cover_letter(&text, job_title, enable_model, &model).await;
    print_json(&feedback)
}

pub async fn interview(
    config: &TutorConfig,
    file: Option<&Path>,
    audio: Option<&Path>,
    options: InterviewOptions,
) -> Result<()> {
    if file.is_none() && audio.is_none() {
        bail!("Either --file or --audio is required");
    }
    let script = file.map(|path| read_text(path, "interview script")).transpose()?;
    let model = OpenAiChatModel::from_config(&config.model)?;

    if options.transcribe && !model.can_transcribe() {
        warn!(
            api_key_env = %config.model.api_key_env,
            "Transcription requested but no API key is set; continuing without it"
        );
    }

    let report = analyze_interview(script.as_deref(), audio, options, &model).await;
    print_json(&report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn file_with(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_request_with_defaults() {
        let file = file_with(r#"{"source": "print(1)"}"#);
        let request = load_request(file.path()).unwrap();

        assert_eq!(request.source, "print(1)");
        assert!(request.tests.is_empty());
        assert!(!request.request_model_hint);
        assert!(!request.include_reference_solution);
    }

    #[test]
    fn test_load_request_rejects_bad_json() {
        let file = file_with("{not json");
        let err = load_request(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse request"));
    }

    #[test]
    fn test_build_request_from_files() {
        let source = file_with("print(sum(map(int, input().split())))");
        let tests = file_with(r#"[{"id": "t1", "stdin": "3 4", "expected": "7"}, {"id": "t2"}]"#);

        let request = build_request(
            Some(source.path()),
            Some(tests.path()),
            "Add".to_string(),
            true,
            false,
        )
        .unwrap();

        assert_eq!(request.tests.len(), 2);
        assert_eq!(request.tests[0].expected.as_deref(), Some("7"));
        assert_eq!(request.tests[1].stdin, "");
        assert_eq!(request.tests[1].expected, None);
        assert_eq!(request.problem, "Add");
        assert!(request.request_model_hint);
    }

    #[test]
    fn test_build_request_without_tests() {
        let source = file_with("x = 1");
        let request = build_request(Some(source.path()), None, String::new(), false, false).unwrap();
        assert!(request.tests.is_empty());
    }

    #[test]
    fn test_build_request_requires_source() {
        assert!(build_request(None, None, String::new(), false, false).is_err());
    }

    #[test]
    fn test_missing_source_file_reports_path() {
        let err = build_request(
            Some(Path::new("/definitely/not/here.py")),
            None,
            String::new(),
            false,
            false,
        )
        .unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.py"));
    }

    #[tokio::test]
    async fn test_interview_requires_an_input() {
        let err = interview(&TutorConfig::default(), None, None, InterviewOptions::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("--file or --audio"));
    }

    #[tokio::test]
    async fn test_interview_missing_script_reports_path() {
        let err = interview(
            &TutorConfig::default(),
            Some(Path::new("/definitely/not/here.txt")),
            None,
            InterviewOptions::default(),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.txt"));
    }

    #[test]
    fn test_explicit_config_must_exist() {
        assert!(load_config(Some(Path::new("/definitely/not/here.json"))).is_err());
    }
}
