/// Execution Engine - Local Subprocess Runner
///
/// **Core Responsibility:**
/// Run submitted source with one test's stdin and capture raw outputs.
///
/// **Critical Architectural Boundary:**
/// - Engine knows HOW to execute (temp file, interpreter flags, timeout)
/// - Engine does NOT compare outputs or derive hints
/// - Engine returns raw outputs for the Evaluator to judge
///
/// **Isolation Limits:**
/// The child runs with the interpreter's isolated flags (`-I -S -B`), a cleared
/// environment (only `PATH` survives) and a wall-clock timeout. This keeps runs
/// reproducible and bounds runaway programs. It is NOT a security boundary:
/// there is no seccomp, namespace, cgroup or filesystem confinement, and
/// malicious code can still reach anything the host user can.

use crate::evaluator::TestExecutionOutput;
use careerprep_common::config::RunnerConfig;
use careerprep_common::types::{
    TestCase, SPAWN_FAILURE_EXIT_CODE, TIMEOUT_EXIT_CODE, TIMEOUT_MARKER,
};
use anyhow::{bail, Context, Result};
use std::io::Write;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

pub const SCRIPT_PREFIX: &str = "careerprep-";

/// Execute every test case against `source`, strictly one after another
///
/// Engine faults (oversized input, spawn failure) do not abort the batch;
/// they become a failed output for that test so the caller always receives
/// one output per test case, in input order.
pub async fn execute_tests(
    engine: &ProcessEngine,
    source: &str,
    tests: &[TestCase],
) -> Vec<TestExecutionOutput> {
    let mut outputs = Vec::with_capacity(tests.len());

    for (idx, test_case) in tests.iter().enumerate() {
        debug!(test_num = idx + 1, test_id = %test_case.id, "Executing test");

        let output = match engine.execute(source, &test_case.stdin).await {
            Ok(mut output) => {
                output.test_id = test_case.id.clone();
                output
            }
            Err(e) => {
                warn!(test_id = %test_case.id, error = %e, "Execution engine error");
                TestExecutionOutput {
                    test_id: test_case.id.clone(),
                    stdout: String::new(),
                    stderr: format!("Execution error: {:#}", e),
                    exit_code: SPAWN_FAILURE_EXIT_CODE,
                    execution_time_ms: 0,
                    timed_out: false,
                }
            }
        };

        outputs.push(output);
    }

    outputs
}

/// Subprocess engine driven by the runner section of the configuration
#[derive(Debug, Clone)]
pub struct ProcessEngine {
    runner: RunnerConfig,
}

impl ProcessEngine {
    pub fn new(runner: RunnerConfig) -> Self {
        Self { runner }
    }

    /// Same engine with a different per-test budget
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.runner.timeout_seconds = timeout_seconds;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.runner.timeout_seconds)
    }

    pub fn interpreter(&self) -> &str {
        &self.runner.command
    }

    /// Run `source` once with `input` on stdin
    ///
    /// **Guarantees:**
    /// - A fresh temporary script per call, removed on every exit path
    /// - Child killed (not abandoned) when the timeout fires
    /// - On timeout partial stdout is discarded; exit code is 124, stderr "Timeout"
    /// - Output decoded as UTF-8 with replacement characters
    pub async fn execute(&self, source: &str, input: &str) -> Result<TestExecutionOutput> {
        if source.len() > self.runner.max_source_bytes {
            bail!(
                "Source code exceeds maximum size of {} bytes",
                self.runner.max_source_bytes
            );
        }
        if input.len() > self.runner.max_input_bytes {
            bail!(
                "Test input exceeds maximum size of {} bytes",
                self.runner.max_input_bytes
            );
        }

        // Dropping `script` deletes the file, so it must outlive the child
        let script = write_script(
            source,
            &self.runner.file_extension,
            self.runner.scratch_dir.as_deref(),
        )?;

        let path_env = std::env::var("PATH")
            .unwrap_or_else(|_| "/usr/local/bin:/usr/bin:/bin".to_string());

        let start_time = Instant::now();
        let mut child = Command::new(&self.runner.command)
            .args(&self.runner.args)
            .arg(&*script)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .env_clear()
            .env("PATH", &path_env)
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to spawn interpreter '{}'", self.runner.command))?;

        let stdin = child.stdin.take();
        let payload = input.as_bytes().to_vec();
        let feed_stdin = async move {
            if let Some(mut pipe) = stdin {
                // The child may exit without reading; a broken pipe is not a fault
                if let Err(e) = pipe.write_all(&payload).await {
                    debug!(error = %e, "Child closed stdin early");
                }
                // `pipe` drops here, closing the child's stdin
            }
        };

        // On timeout the wait future, and the child inside it, is dropped;
        // kill_on_drop sends SIGKILL
        let run = async {
            let (_, output) = tokio::join!(feed_stdin, child.wait_with_output());
            output
        };
        let timeout = self.timeout();
        let timeout_result = tokio::time::timeout(timeout, run).await;
        let execution_time_ms = start_time.elapsed().as_millis() as u64;

        match timeout_result {
            Ok(Ok(output)) => {
                let exit_code = exit_code_of(output.status);
                debug!(exit_code, execution_time_ms, "Child exited");
                Ok(TestExecutionOutput {
                    test_id: String::new(), // set by caller
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                    exit_code,
                    execution_time_ms,
                    timed_out: false,
                })
            }
            Ok(Err(e)) => Err(e).context("Failed to collect child output"),
            Err(_) => {
                warn!(
                    timeout_ms = timeout.as_millis() as u64,
                    execution_time_ms,
                    "Execution timed out - child killed"
                );
                Ok(TestExecutionOutput {
                    test_id: String::new(),
                    stdout: String::new(),
                    stderr: TIMEOUT_MARKER.to_string(),
                    exit_code: TIMEOUT_EXIT_CODE,
                    execution_time_ms,
                    timed_out: true,
                })
            }
        }
    }
}

fn write_script(
    source: &str,
    extension: &str,
    scratch_dir: Option<&Path>,
) -> Result<tempfile::TempPath> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(SCRIPT_PREFIX).suffix(extension);
    let mut file = match scratch_dir {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    }
    .context("Failed to create temporary script file")?;
    file.write_all(source.as_bytes())
        .context("Failed to write submission to temporary file")?;
    file.flush().context("Failed to flush temporary script")?;
    Ok(file.into_temp_path())
}

/// Signal deaths map to the shell convention 128 + signal
fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    SPAWN_FAILURE_EXIT_CODE
}
