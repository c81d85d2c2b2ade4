//! Headless sessions driven by a recorded recognizer transcript.
//!
//! A transcript is JSON lines, one entry per recognizer callback:
//!
//! ```text
//! {"at_ms": 4200, "label": "Victory", "confidence": 0.83}
//! {"at_ms": 9000, "camera": false}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use serde::Deserialize;
use std::io::BufRead;
use tracing::debug;

use crate::error::ReplayError;
use crate::game::GameDriver;
use crate::recorder::SessionRecord;

pub const DEFAULT_STEP_MS: u64 = 100;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ReplayLine {
    Observation {
        at_ms: u64,
        label: String,
        confidence: f32,
    },
    Camera {
        at_ms: u64,
        camera: bool,
    },
}

impl ReplayLine {
    pub fn at_ms(&self) -> u64 {
        match self {
            ReplayLine::Observation { at_ms, .. } | ReplayLine::Camera { at_ms, .. } => *at_ms,
        }
    }
}

pub fn parse_transcript<R: BufRead>(reader: R) -> Result<Vec<ReplayLine>, ReplayError> {
    let mut lines = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let parsed = serde_json::from_str(trimmed).map_err(|e| ReplayError::Parse {
            line_num: idx + 1,
            detail: e.to_string(),
        })?;
        lines.push(parsed);
    }
    Ok(lines)
}

/// Play a whole session against `transcript` in simulated time, starting
/// the clock at zero and stepping `step_ms` at a time.
pub fn run(
    driver: &mut GameDriver,
    mut transcript: Vec<ReplayLine>,
    step_ms: u64,
) -> Result<SessionRecord, ReplayError> {
    let step_ms = step_ms.max(1);
    transcript.sort_by_key(ReplayLine::at_ms);

    let mut now = 0;
    driver.start(now)?;

    for line in transcript {
        while now < line.at_ms() && !driver.is_finished() {
            now = now.saturating_add(step_ms).min(line.at_ms());
            driver.advance(now);
        }
        if driver.is_finished() {
            debug!(at_ms = line.at_ms(), "session over; ignoring the rest of the transcript");
            break;
        }
        match line {
            ReplayLine::Observation {
                label, confidence, ..
            } => driver.observe(&label, confidence, now),
            ReplayLine::Camera { camera, .. } => driver.set_camera_active(camera),
        }
        driver.advance(now);
    }

    let config = driver.session().config();
    let round_ms = (u64::from(config.round_duration_secs) * 1_000).saturating_add(config.settle_millis);
    let budget = (u64::from(config.countdown_secs) * 1_000)
        .saturating_add((config.total_rounds as u64).saturating_mul(round_ms))
        .saturating_add(1_000);
    let deadline = now.saturating_add(budget);

    while !driver.is_finished() && now < deadline {
        now = now.saturating_add(step_ms);
        driver.advance(now);
    }

    debug!(now, finished = driver.is_finished(), "replay drained");
    driver
        .finished_record()
        .cloned()
        .ok_or(ReplayError::Unfinished(now))
}
