use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::path::Path;

use crate::error::ExportError;
use crate::recorder::{ExportPayload, SessionRecord};

#[derive(Serialize)]
struct LogRow<'a> {
    date: String,
    session_id: &'a str,
    child_id: &'a str,
    game: String,
    rounds: usize,
    score: usize,
    completion_rate: f64,
    mean_time_secs: String,
}

/// Append one line per session to a CSV log, writing the header on first use.
pub fn append_session_log<P: AsRef<Path>>(path: P, record: &SessionRecord) -> Result<(), ExportError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let needs_header = !path.exists();
    let file = OpenOptions::new().append(true).create(true).open(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_header)
        .from_writer(file);

    writer.serialize(LogRow {
        date: record.ended_at.format("%c").to_string(),
        session_id: &record.session_id,
        child_id: &record.child_id,
        game: record.game.to_string(),
        rounds: record.summary.round_count,
        score: record.summary.total_score,
        completion_rate: record.summary.completion_rate,
        mean_time_secs: record
            .summary
            .mean_time_taken_secs
            .map_or(String::new(), |t| format!("{t:.2}")),
    })?;
    writer.flush()?;
    Ok(())
}

/// Write the backend-facing payload as pretty JSON.
pub fn write_payload_json<P: AsRef<Path>>(path: P, payload: &ExportPayload) -> Result<(), ExportError> {
    let data = serde_json::to_vec_pretty(payload)?;
    fs::write(path, data)?;
    Ok(())
}
