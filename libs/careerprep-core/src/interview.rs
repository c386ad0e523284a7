//! Interview-answer analysis: STAR clues, quick strengths and follow-up questions
//! for a script, plus statistics and an optional transcript for a recording.

use crate::audio::analyze_wav;
use crate::llm::{
    complete_optional, transcribe_optional, LanguageModel, Transcriber, INTERVIEWER,
};
use careerprep_common::types::{InterviewFeedback, InterviewReport, StarCoverage};
use rand::seq::SliceRandom;
use rand::Rng;
use std::path::Path;
use tracing::info;

pub const FOLLOW_UP_COUNT: usize = 3;
const MIN_SCRIPT_CHARS: usize = 300;

pub const FOLLOW_UPS: &[&str] = &[
    "What was the most concrete action you personally took in that experience?",
    "How would you express the outcome in numbers? Explain it against a baseline.",
    "How did you resolve conflicts with teammates or stakeholders?",
    "If the same situation came up again, what would you do differently?",
    "Which competency for this role does that experience demonstrate?",
];

const SITUATION_CLUES: &[&str] = &["상황", "배경", "문제", "situation", "background", "problem"];
const TASK_CLUES: &[&str] = &["목표", "과제", "역할", "goal", "task", "role"];
const ACTION_CLUES: &[&str] = &["행동", "시도", "실행", "action", "tried", "built"];
const RESULT_CLUES: &[&str] = &["결과", "성과", "학습", "result", "outcome", "learned"];

fn covers(text: &str, clues: &[&str]) -> bool {
    let lowered = text.to_lowercase();
    clues.iter().any(|clue| lowered.contains(clue))
}

pub fn star_coverage(text: &str) -> StarCoverage {
    StarCoverage {
        situation: covers(text, SITUATION_CLUES),
        task: covers(text, TASK_CLUES),
        action: covers(text, ACTION_CLUES),
        result: covers(text, RESULT_CLUES),
    }
}

/// Heuristic feedback; follow-ups are drawn from `rng`
pub fn review_script<R: Rng + ?Sized>(text: &str, rng: &mut R) -> InterviewFeedback {
    let text = text.trim();
    let coverage = star_coverage(text);
    let mut strengths = Vec::new();
    let mut improvements = Vec::new();

    if text.chars().count() >= MIN_SCRIPT_CHARS {
        strengths.push("Long enough to explain the situation fully.".to_string());
    } else {
        improvements.push(
            "A little short. Strengthen the flow from background to action to result.".to_string(),
        );
    }

    if text.chars().any(|ch| ch.is_ascii_digit()) {
        strengths.push("Includes numbers or metrics. Keep that specificity.".to_string());
    } else {
        improvements.push("Stating results in numbers makes the answer more convincing.".to_string());
    }

    for letter in coverage.missing() {
        improvements.push(format!("The STAR element '{}' is weak.", letter));
    }

    let follow_ups = FOLLOW_UPS
        .choose_multiple(rng, FOLLOW_UP_COUNT.min(FOLLOW_UPS.len()))
        .map(|q| q.to_string())
        .collect();

    InterviewFeedback {
        star_coverage: coverage,
        strengths,
        improvements,
        follow_ups,
        model_feedback: None,
    }
}

pub fn interview_prompt(text: &str) -> String {
    format!(
        "Read the following script as an interviewer and give concisely: 1) three sharp \
         follow-up questions, 2) two strengths, 3) three improvements.\n\n{}",
        text.trim()
    )
}

/// Heuristic review plus optional model feedback
pub async fn analyze_script<M: LanguageModel>(
    text: &str,
    enable_model: bool,
    model: &M,
) -> InterviewFeedback {
    let mut feedback = review_script(text, &mut rand::thread_rng());

    if enable_model {
        feedback.model_feedback =
            complete_optional(model, &INTERVIEWER, &interview_prompt(text)).await;
    }
    feedback
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InterviewOptions {
    /// Model feedback on the script
    pub enable_model: bool,
    /// Send the recording for transcription
    pub transcribe: bool,
}

/// Review a script, a WAV recording, or both
///
/// The script length drives the speaking-pace estimate for the recording.
pub async fn analyze_interview<M: LanguageModel + Transcriber>(
    script: Option<&str>,
    audio: Option<&Path>,
    options: InterviewOptions,
    model: &M,
) -> InterviewReport {
    let mut report = InterviewReport::default();

    if let Some(text) = script {
        report.script = Some(analyze_script(text, options.enable_model, model).await);
    }

    if let Some(path) = audio {
        let script_chars = script.map(|text| text.chars().count());
        let analysis = analyze_wav(path, script_chars);
        let readable = analysis.note.is_none();
        report.audio = Some(analysis);

        if options.transcribe && readable {
            report.transcript = transcribe_optional(model, path).await;
        }
    }

    info!(
        has_script = report.script.is_some(),
        has_audio = report.audio.is_some(),
        has_transcript = report.transcript.is_some(),
        "Interview analyzed"
    );
    report
}
