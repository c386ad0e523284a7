use serde::{Deserialize, Serialize};
use std::fmt;

/// Exit code reported for a run that exceeded its wall-clock budget
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// Exit code reported when the child could not be started at all
pub const SPAWN_FAILURE_EXIT_CODE: i32 = -1;

/// Fixed stderr text reported for a timed-out run
pub const TIMEOUT_MARKER: &str = "Timeout";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub id: String,
    #[serde(default)]
    pub stdin: String,
    /// Absent means an informational run with no correctness check
    #[serde(default)]
    pub expected: Option<String>,
}

impl TestCase {
    pub fn new(id: impl Into<String>, stdin: impl Into<String>, expected: Option<&str>) -> Self {
        Self {
            id: id.into(),
            stdin: stdin.into(),
            expected: expected.map(str::to_string),
        }
    }
}

/// Coarse, advisory complexity label derived from loop counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComplexityEstimate {
    LinearOrBetter,
    LinearithmicIsh,
    QuadraticOrWorse,
    /// Source did not parse
    NotApplicable,
}

impl ComplexityEstimate {
    pub fn from_loop_count(total_loops: usize) -> Self {
        match total_loops {
            0 => ComplexityEstimate::LinearOrBetter,
            1 => ComplexityEstimate::LinearithmicIsh,
            _ => ComplexityEstimate::QuadraticOrWorse,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComplexityEstimate::LinearOrBetter => "linear-or-better",
            ComplexityEstimate::LinearithmicIsh => "linearithmic-ish",
            ComplexityEstimate::QuadraticOrWorse => "quadratic-or-worse",
            ComplexityEstimate::NotApplicable => "not-applicable",
        }
    }
}

impl fmt::Display for ComplexityEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum DetectedPattern {
    NestedLoop,
    Recursion,
    /// Call to a function named `bfs` or `dfs` (any case), name as written
    NamedSearchCall { name: String },
}

impl fmt::Display for DetectedPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectedPattern::NestedLoop => f.write_str("nested-loop"),
            DetectedPattern::Recursion => f.write_str("recursion"),
            DetectedPattern::NamedSearchCall { name } => write!(f, "named-search-call({})", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxFailure {
    pub message: String,
    /// 1-based
    pub line: usize,
    /// 1-based
    pub column: usize,
}

impl fmt::Display for SyntaxFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SyntaxError: {} (line {}, col {})", self.message, self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticAnalysisResult {
    pub parse_ok: bool,
    pub syntax_error: Option<SyntaxFailure>,
    pub complexity: ComplexityEstimate,
    /// Insertion ordered, no duplicates
    pub patterns: Vec<DetectedPattern>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    pub test_id: String,
    pub passed: bool,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub hint: Option<String>,
}

impl TestResult {
    pub fn timed_out(&self) -> bool {
        self.exit_code == TIMEOUT_EXIT_CODE && self.stderr == TIMEOUT_MARKER
    }
}

/// Arguments of one tutoring submission, loadable from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TutorRequest {
    pub source: String,
    #[serde(default)]
    pub problem: String,
    #[serde(default)]
    pub tests: Vec<TestCase>,
    #[serde(default)]
    pub request_model_hint: bool,
    #[serde(default)]
    pub include_reference_solution: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TutorResponse {
    pub analysis: StaticAnalysisResult,
    /// Same order as the submitted test cases
    pub results: Vec<TestResult>,
    pub model_hint: Option<String>,
}

impl TutorResponse {
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }
}

/// Which parts of the Situation / Task / Action / Result structure appear
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarCoverage {
    pub situation: bool,
    pub task: bool,
    pub action: bool,
    pub result: bool,
}

impl StarCoverage {
    pub fn is_complete(&self) -> bool {
        self.situation && self.task && self.action && self.result
    }

    /// Letters of the missing elements, in S, T, A, R order
    pub fn missing(&self) -> Vec<&'static str> {
        [
            (self.situation, "S"),
            (self.task, "T"),
            (self.action, "A"),
            (self.result, "R"),
        ]
        .into_iter()
        .filter(|(covered, _)| !covered)
        .map(|(_, letter)| letter)
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverLetterMetrics {
    pub num_chars: usize,
    pub num_words: usize,
    pub num_sentences: usize,
    pub avg_sentence_len: f64,
    pub long_sentence_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverLetterFeedback {
    pub metrics: CoverLetterMetrics,
    pub issues: Vec<String>,
    pub suggestions: Vec<String>,
    pub star_coverage: StarCoverage,
    pub model_feedback: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewFeedback {
    pub star_coverage: StarCoverage,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub follow_ups: Vec<String>,
    pub model_feedback: Option<String>,
}

/// Basic statistics of a recorded answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioAnalysis {
    /// Rounded to two decimals
    pub duration_sec: f64,
    pub sample_rate: u32,
    pub channels: u16,
    /// Script characters per minute of audio, one decimal
    pub approx_chars_per_min: Option<f64>,
    /// Why the statistics are empty, when they are
    pub note: Option<String>,
}

impl AudioAnalysis {
    /// Zeroed statistics carrying only an explanation
    pub fn unreadable(note: impl Into<String>) -> Self {
        Self {
            duration_sec: 0.0,
            sample_rate: 0,
            channels: 0,
            approx_chars_per_min: None,
            note: Some(note.into()),
        }
    }
}

/// Everything the interview command reports; absent parts were not requested
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterviewReport {
    pub script: Option<InterviewFeedback>,
    pub audio: Option<AudioAnalysis>,
    pub transcript: Option<String>,
}
