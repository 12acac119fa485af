// crates/render/src/progress.rs
//! Extraction of structured progress observations from the renderer's
//! unstructured stdout stream.
//!
//! The stream arrives in arbitrary chunks, so a marker like
//! `Rendering: 42%` can be split across two reads. [`ProgressExtractor`]
//! buffers incomplete lines and only matches against complete ones; the
//! unterminated trailing partial line is carried into the next chunk.

use animatic_types::RenderStage;
use regex_lite::Regex;

/// One stage/percent observation pulled out of the output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressObservation {
    pub stage: RenderStage,
    /// Clamped into [0, 100].
    pub percent: u8,
}

/// Line-buffering progress parser for one job's stdout.
pub struct ProgressExtractor {
    buf: String,
    bundling: Regex,
    rendering: Regex,
}

impl ProgressExtractor {
    pub fn new() -> Self {
        Self {
            buf: String::new(),
            // The sign is captured so "-5%" clamps to 0 instead of
            // matching as "5%".
            bundling: Regex::new(r"Bundling:\s*(-?\d+)%").expect("valid bundling pattern"),
            rendering: Regex::new(r"Rendering:\s*(-?\d+)%").expect("valid rendering pattern"),
        }
    }

    /// Feed one raw chunk of stdout; returns an observation for every
    /// complete line in the buffer that carries a stage marker.
    pub fn push(&mut self, chunk: &str) -> Vec<ProgressObservation> {
        self.buf.push_str(chunk);

        let mut observations = Vec::new();
        while let Some(pos) = self.buf.find('\n') {
            let line: String = self.buf.drain(..=pos).collect();
            if let Some(obs) = self.parse_line(line.trim_end()) {
                observations.push(obs);
            }
        }
        observations
    }

    /// Match a single complete line. Bundling has priority when a line
    /// somehow carries both markers, mirroring the renderer's output
    /// order. Unmatched lines are silently ignored.
    pub fn parse_line(&self, line: &str) -> Option<ProgressObservation> {
        if let Some(caps) = self.bundling.captures(line) {
            return Some(ProgressObservation {
                stage: RenderStage::Bundling,
                percent: clamp_percent(&caps[1]),
            });
        }
        if let Some(caps) = self.rendering.captures(line) {
            return Some(ProgressObservation {
                stage: RenderStage::Rendering,
                percent: clamp_percent(&caps[1]),
            });
        }
        None
    }
}

impl Default for ProgressExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Clamp a captured percent string into [0, 100].
///
/// The capture is always an optional sign plus digits; a value too large
/// for i64 saturates toward the side its sign indicates.
fn clamp_percent(raw: &str) -> u8 {
    match raw.parse::<i64>() {
        Ok(v) => v.clamp(0, 100) as u8,
        Err(_) if raw.starts_with('-') => 0,
        Err(_) => 100,
    }
}
