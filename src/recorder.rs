use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::config::GameKind;
use crate::session::RoundOutcome;
use crate::stimulus::StimulusPool;
use crate::util::{mean, std_dev};

/// Completion time reported for rounds that ran out of time.
pub const INCOMPLETE_COMPLETION_TIME: u32 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub total_score: usize,
    pub round_count: usize,
    pub rounds: Vec<RoundOutcome>,
    /// Percentage of rounds matched before time ran out, rounded.
    pub completion_rate: f64,
    /// Over completed rounds only; `None` when nothing was completed.
    pub mean_time_taken_secs: Option<f64>,
    pub time_taken_std_dev: Option<f64>,
}

/// Fold a session's outcomes into its end-of-session report.
pub fn summarize(outcomes: &[RoundOutcome]) -> SessionSummary {
    let total_score = outcomes.iter().filter(|o| o.completed).count();
    let round_count = outcomes.len();

    let completion_rate = if round_count == 0 {
        0.0
    } else {
        ((total_score as f64 / round_count as f64) * 100.0).round()
    };

    let completed_times: Vec<f64> = outcomes
        .iter()
        .filter(|o| o.completed)
        .map(|o| o.time_taken_secs as f64)
        .collect();

    SessionSummary {
        total_score,
        round_count,
        rounds: outcomes.to_vec(),
        completion_rate,
        mean_time_taken_secs: mean(&completed_times),
        time_taken_std_dev: std_dev(&completed_times),
    }
}

/// A finished session, identified and timestamped for export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub child_id: String,
    pub game: GameKind,
    pub started_at: DateTime<Local>,
    pub ended_at: DateTime<Local>,
    pub summary: SessionSummary,
}

impl SessionRecord {
    /// Wall-clock length of the session in whole seconds.
    pub fn duration_secs(&self) -> i64 {
        (self.ended_at - self.started_at).num_seconds().max(0)
    }

    /// Backend-facing shape: one entry per round, display names instead of ids.
    pub fn export_payload(&self, pool: &StimulusPool) -> ExportPayload {
        let stimuli = self
            .summary
            .rounds
            .iter()
            .map(|round| StimulusResult {
                name: pool
                    .get(&round.stimulus_id)
                    .map(|s| s.display_name.clone())
                    .unwrap_or_else(|| round.stimulus_id.clone()),
                completion_time: if round.completed {
                    round.time_taken_secs
                } else {
                    INCOMPLETE_COMPLETION_TIME
                },
                status: if round.completed {
                    RoundStatus::Completed
                } else {
                    RoundStatus::Incomplete
                },
            })
            .collect();

        ExportPayload {
            session_id: self.session_id.clone(),
            child_id: self.child_id.clone(),
            game: self.game,
            stimuli,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundStatus {
    Completed,
    Incomplete,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StimulusResult {
    pub name: String,
    pub completion_time: u32,
    pub status: RoundStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPayload {
    pub session_id: String,
    pub child_id: String,
    pub game: GameKind,
    pub stimuli: Vec<StimulusResult>,
}

/// Tracks wall-clock bounds of the session in progress.
#[derive(Debug, Clone)]
pub struct SessionRecorder {
    child_id: String,
    game: GameKind,
    started_at: Option<DateTime<Local>>,
}

impl SessionRecorder {
    pub fn new(child_id: impl Into<String>, game: GameKind) -> Self {
        Self {
            child_id: child_id.into(),
            game,
            started_at: None,
        }
    }

    pub fn begin(&mut self, at: DateTime<Local>) {
        self.started_at = Some(at);
    }

    pub fn clear(&mut self) {
        self.started_at = None;
    }

    pub fn finish(&self, outcomes: &[RoundOutcome], at: DateTime<Local>) -> SessionRecord {
        let started_at = self.started_at.unwrap_or(at);
        SessionRecord {
            session_id: session_id(&self.child_id, started_at),
            child_id: self.child_id.clone(),
            game: self.game,
            started_at,
            ended_at: at,
            summary: summarize(outcomes),
        }
    }
}

/// `<child>_<start time>` with the time in a filesystem-safe form.
pub fn session_id(child_id: &str, started_at: DateTime<Local>) -> String {
    format!("{}_{}", child_id, started_at.format("%Y-%m-%dT%H-%M-%S-%3f"))
}
