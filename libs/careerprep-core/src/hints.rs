//! Remediation hints for failed runs.
//!
//! Stderr is matched against an ordered table of failure signatures. The table
//! order is the tie-break: the first signature found in stderr wins, even when
//! a later one is more specific.

/// Fallback text when stderr matched nothing in the table
pub const GENERIC_HINT: &str =
    "Inspect the output log; check input parsing, data structures, and complexity first.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    IndexOutOfRange,
    MissingKey,
    ValueConversion,
    RecursionDepth,
    Timeout,
}

impl FailureKind {
    /// Substring looked for (case-insensitively) in stderr
    pub fn signature(&self) -> &'static str {
        match self {
            FailureKind::IndexOutOfRange => "IndexError",
            FailureKind::MissingKey => "KeyError",
            FailureKind::ValueConversion => "ValueError",
            FailureKind::RecursionDepth => "RecursionError",
            FailureKind::Timeout => "Timeout",
        }
    }

    pub fn hint(&self) -> &'static str {
        match self {
            FailureKind::IndexOutOfRange => {
                "Check your index ranges; look for off-by-one mistakes (<= vs <)."
            }
            FailureKind::MissingKey => {
                "Check that the key exists before lookup, or use dict.get with a default."
            }
            FailureKind::ValueConversion => {
                "Check input parsing: whitespace, newlines, and int/float conversions."
            }
            FailureKind::RecursionDepth => {
                "Reduce the recursion depth or rewrite the recursion as an explicit loop."
            }
            FailureKind::Timeout => {
                "Time limit exceeded. Lower the algorithm's complexity or speed up I/O."
            }
        }
    }
}

/// Evaluation order of the signature table
pub const HINT_TABLE: [FailureKind; 5] = [
    FailureKind::IndexOutOfRange,
    FailureKind::MissingKey,
    FailureKind::ValueConversion,
    FailureKind::RecursionDepth,
    FailureKind::Timeout,
];

/// First failure kind whose signature appears in `stderr`
pub fn classify(stderr: &str) -> Option<FailureKind> {
    if stderr.is_empty() {
        return None;
    }
    let lowered = stderr.to_lowercase();
    HINT_TABLE
        .iter()
        .copied()
        .find(|kind| lowered.contains(&kind.signature().to_lowercase()))
}

/// Canned hint for a known failure signature. Callers supply [`GENERIC_HINT`]
/// when this returns `None` for a non-empty stderr.
pub fn hint_for_error(stderr: &str) -> Option<&'static str> {
    classify(stderr).map(|kind| kind.hint())
}

/// Structural hint for an output mismatch. Never looks at stderr.
pub fn diff_hint(actual: &str, expected: &str) -> String {
    let lines = |s: &str| s.lines().count();

    format!(
        "Output differs from the expected value.\n\
         - Expected line count: {}, actual: {}\n\
         - Check whitespace, newlines, letter case, and number-vs-string formatting.",
        lines(expected),
        lines(actual)
    )
}
