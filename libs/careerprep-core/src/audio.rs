//! Recorded-answer statistics read from a WAV header.

use careerprep_common::types::AudioAnalysis;
use std::path::Path;
use tracing::{debug, warn};

pub const MISSING_FILE_NOTE: &str = "file not found";
pub const NOT_WAV_NOTE: &str = "not a WAV file; upload a .wav recording";

/// Duration, rate and channels of a WAV file; speaking pace when the script length is known
///
/// Never fails: an absent or unreadable file yields zeroed statistics with a note.
pub fn analyze_wav(path: &Path, approx_text_chars: Option<usize>) -> AudioAnalysis {
    if !path.exists() {
        warn!(path = %path.display(), "Audio file not found");
        return AudioAnalysis::unreadable(MISSING_FILE_NOTE);
    }

    let reader = match hound::WavReader::open(path) {
        Ok(reader) => reader,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Audio file is not a readable WAV");
            return AudioAnalysis::unreadable(NOT_WAV_NOTE);
        }
    };

    let spec = reader.spec();
    // `duration` counts frames, i.e. samples per channel
    let duration = if spec.sample_rate > 0 {
        f64::from(reader.duration()) / f64::from(spec.sample_rate)
    } else {
        0.0
    };

    let approx_chars_per_min = approx_text_chars
        .filter(|chars| *chars > 0 && duration > 0.0)
        .map(|chars| round_to(chars as f64 / duration * 60.0, 1));

    debug!(
        duration_sec = duration,
        sample_rate = spec.sample_rate,
        channels = spec.channels,
        "Audio analyzed"
    );

    AudioAnalysis {
        duration_sec: round_to(duration, 2),
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        approx_chars_per_min,
        note: None,
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}
