//! Error types shared across the engine.

use thiserror::Error;

use crate::session::SessionStatus;

#[derive(Debug, Error, PartialEq)]
pub enum PoolError {
    #[error("stimulus pool '{0}' is empty")]
    Empty(String),

    #[error("stimulus pool '{pool}' defines id '{id}' more than once")]
    DuplicateId { pool: String, id: String },

    #[error("every stimulus in pool '{0}' has already been presented")]
    Exhausted(String),

    #[error("unknown built-in stimulus pool '{0}'")]
    UnknownPool(String),

    #[error("invalid stimulus pool file: {0}")]
    Invalid(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimerError {
    #[error("timer is already running with {remaining}s left")]
    AlreadyRunning { remaining: u32 },

    #[error("timer duration must be at least one second")]
    ZeroDuration,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("total_rounds must be at least 1")]
    NoRounds,

    #[error("round_duration_secs must be at least 1")]
    ZeroRoundDuration,

    #[error("match_threshold must lie in [0, 1), got {0}")]
    ThresholdOutOfRange(f32),
}

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("{requested} rounds requested but pool '{pool}' only holds {available} distinct stimuli")]
    PoolExhausted {
        pool: String,
        requested: usize,
        available: usize,
    },

    #[error("cannot {action} while session is {status}")]
    InvalidTransition {
        action: &'static str,
        status: SessionStatus,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("history io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt timestamp '{0}' in history")]
    Timestamp(String),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("export io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("replay io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line_num}: {detail}")]
    Parse { line_num: usize, detail: String },

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("session did not finish within {0} ms of simulated time")]
    Unfinished(u64),
}
