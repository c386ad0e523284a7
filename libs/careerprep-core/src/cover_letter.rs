//! Cover-letter critique: surface metrics, wording heuristics and STAR coverage.

use crate::llm::{complete_optional, LanguageModel, CAREER_COACH};
use careerprep_common::types::{CoverLetterFeedback, CoverLetterMetrics, StarCoverage};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Letters below this count read as underdeveloped
pub const MIN_CHARS: usize = 300;
/// Sentences at or above this many characters count as long
pub const LONG_SENTENCE_CHARS: usize = 40;
/// Distinct filler words needed before flagging
const FILLER_THRESHOLD: usize = 3;

const SITUATION_KEYWORDS: &[&str] = &["상황", "배경", "문제 상황", "계기", "situation", "background"];
const TASK_KEYWORDS: &[&str] = &["과제", "문제", "목표", "도전", "task", "goal", "challenge"];
const ACTION_KEYWORDS: &[&str] = &["행동", "실행", "역할", "조치", "action", "implemented", "led"];
const RESULT_KEYWORDS: &[&str] = &["결과", "성과", "지표", "배운 점", "회고", "result", "outcome", "learned"];

const FILLER_WORDS: &[&str] = &[
    "열심히", "성실", "책임감", "꼼꼼", "노력", "최선을", "소통", "협업", "정직", "도전",
    "hardworking", "passionate", "diligent", "team player", "motivated",
];

static PASSIVE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"되었[다습]\b",
        r"하게 되었습니다",
        r"되어\b",
        r"되었습니다",
        r"되기도",
        r"(?i)\b(?:was|were|been)\s+\w+ed\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("passive pattern is valid"))
    .collect()
});

static NUMBER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:[.,]\d+)?").expect("number pattern is valid"));

static WORD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+").expect("word pattern is valid"));

/// Split after `.`, `!` or `?` when followed by whitespace
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.trim().chars().peekable();

    while let Some(ch) = chars.next() {
        current.push(ch);
        let at_boundary = matches!(ch, '.' | '!' | '?')
            && chars.peek().map(|next| next.is_whitespace()).unwrap_or(false);
        if at_boundary {
            let sentence = current.trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            current.clear();
        }
    }

    let tail = current.trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }
    sentences
}

pub fn count_words(text: &str) -> usize {
    WORD_PATTERN.find_iter(text).count()
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    let lowered = text.to_lowercase();
    keywords.iter().any(|kw| lowered.contains(kw))
}

pub fn detect_star(text: &str) -> StarCoverage {
    StarCoverage {
        situation: contains_any(text, SITUATION_KEYWORDS),
        task: contains_any(text, TASK_KEYWORDS),
        action: contains_any(text, ACTION_KEYWORDS),
        result: contains_any(text, RESULT_KEYWORDS),
    }
}

fn has_passive_voice(text: &str) -> bool {
    PASSIVE_PATTERNS.iter().any(|p| p.is_match(text))
}

pub fn metrics(text: &str) -> CoverLetterMetrics {
    let sentences = split_sentences(text);
    let lengths: Vec<usize> = sentences.iter().map(|s| s.chars().count()).collect();
    let avg = if lengths.is_empty() {
        0.0
    } else {
        lengths.iter().sum::<usize>() as f64 / lengths.len() as f64
    };

    CoverLetterMetrics {
        num_chars: text.chars().count(),
        num_words: count_words(text),
        num_sentences: sentences.len(),
        avg_sentence_len: (avg * 100.0).round() / 100.0,
        long_sentence_count: lengths.iter().filter(|&&len| len >= LONG_SENTENCE_CHARS).count(),
    }
}

/// Heuristic critique without any model call
pub fn critique(text: &str) -> CoverLetterFeedback {
    let text = text.trim();
    let metrics = metrics(text);
    let mut issues = Vec::new();
    let mut suggestions = Vec::new();

    if metrics.num_chars < MIN_CHARS {
        issues.push(format!(
            "The answer is short and may not be persuasive (under {} characters).",
            MIN_CHARS
        ));
        suggestions.push(
            "Add the background, the concrete actions you took, and quantified results.".to_string(),
        );
    }
    if metrics.long_sentence_count > 0 {
        issues.push(format!(
            "{} long sentence(s) ({}+ characters). Split them for readability.",
            metrics.long_sentence_count, LONG_SENTENCE_CHARS
        ));
        suggestions.push(
            "Keep one message per sentence and drop unnecessary modifiers.".to_string(),
        );
    }

    let lowered = text.to_lowercase();
    let fillers: BTreeSet<&str> = FILLER_WORDS
        .iter()
        .copied()
        .filter(|w| lowered.contains(w))
        .collect();
    if fillers.len() >= FILLER_THRESHOLD {
        issues.push(format!(
            "Many generic buzzwords: {}",
            fillers.into_iter().collect::<Vec<_>>().join(", ")
        ));
        suggestions.push(
            "Replace qualitative claims with numbers and metrics that show the outcome.".to_string(),
        );
    }

    if has_passive_voice(text) {
        issues.push("Passive phrasing detected. Prefer the active voice.".to_string());
        suggestions.push(
            "Example: 'I came to learn' becomes 'I learned and applied'.".to_string(),
        );
    }

    if !NUMBER_PATTERN.is_match(text) {
        suggestions.push(
            "Quantify results with numbers or percentages (e.g. conversion up 18%p, 120 leads)."
                .to_string(),
        );
    }

    let star_coverage = detect_star(text);
    if !star_coverage.is_complete() {
        issues.push(format!(
            "Parts of the STAR structure are weak: {}",
            star_coverage.missing().join(", ")
        ));
        suggestions.push(
            "Shape paragraphs so Situation, Task, Action and Result read as one cycle.".to_string(),
        );
    }

    CoverLetterFeedback {
        metrics,
        issues,
        suggestions,
        star_coverage,
        model_feedback: None,
    }
}

pub fn cover_letter_prompt(text: &str, job_title: Option<&str>) -> String {
    let mut parts = vec![
        "For the following cover-letter question and answer, give concisely: 1) a one-sentence \
         summary, 2) strengths, 3) three improvements, 4) a sample rewrite of one paragraph \
         (about 200 characters)."
            .to_string(),
    ];
    if let Some(title) = job_title.filter(|t| !t.trim().is_empty()) {
        parts.push(format!("Role: {}", title.trim()));
    }
    parts.push(format!("Answer:\n{}", text.trim()));
    parts.join("\n\n")
}

/// Heuristic critique plus optional model feedback
pub async fn analyze_cover_letter<M: LanguageModel>(
    text: &str,
    job_title: Option<&str>,
    enable_model: bool,
    model: &M,
) -> CoverLetterFeedback {
    let mut feedback = critique(text);
    tracing::debug!(
        chars = feedback.metrics.num_chars,
        sentences = feedback.metrics.num_sentences,
        issues = feedback.issues.len(),
        "Cover letter critiqued"
    );

    if enable_model {
        let prompt = cover_letter_prompt(text, job_title);
        feedback.model_feedback =
            complete_optional(model, &CAREER_COACH, &prompt).await;
    }
    feedback
}
