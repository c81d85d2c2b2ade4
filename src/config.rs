use clap::ValueEnum;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Which mini-game a session plays.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GameKind {
    Gesture,
    Expression,
}

impl GameKind {
    /// Name of the built-in stimulus pool for this game.
    pub fn pool_name(&self) -> &'static str {
        match self {
            GameKind::Gesture => "gestures",
            GameKind::Expression => "expressions",
        }
    }
}

/// Tunables of one session. Both games share the engine and differ only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub total_rounds: usize,
    pub round_duration_secs: u32,
    pub match_threshold: f32,
    pub dwell_millis: u64,
    pub settle_millis: u64,
    /// Zero skips the pre-game countdown.
    pub countdown_secs: u32,
}

impl GameConfig {
    pub fn gesture() -> Self {
        Self {
            total_rounds: 5,
            round_duration_secs: 10,
            match_threshold: 0.7,
            dwell_millis: 200,
            settle_millis: 2_000,
            countdown_secs: 3,
        }
    }

    pub fn expression() -> Self {
        Self {
            round_duration_secs: 15,
            ..Self::gesture()
        }
    }

    pub fn for_game(kind: GameKind) -> Self {
        match kind {
            GameKind::Gesture => Self::gesture(),
            GameKind::Expression => Self::expression(),
        }
    }

    pub fn builder(kind: GameKind) -> GameConfigBuilder {
        GameConfigBuilder {
            config: Self::for_game(kind),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total_rounds == 0 {
            return Err(ConfigError::NoRounds);
        }
        if self.round_duration_secs == 0 {
            return Err(ConfigError::ZeroRoundDuration);
        }
        if !(0.0..1.0).contains(&self.match_threshold) {
            return Err(ConfigError::ThresholdOutOfRange(self.match_threshold));
        }
        Ok(())
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::gesture()
    }
}

#[derive(Debug, Clone)]
pub struct GameConfigBuilder {
    config: GameConfig,
}

impl GameConfigBuilder {
    pub fn total_rounds(mut self, rounds: usize) -> Self {
        self.config.total_rounds = rounds;
        self
    }

    pub fn round_duration_secs(mut self, secs: u32) -> Self {
        self.config.round_duration_secs = secs;
        self
    }

    pub fn match_threshold(mut self, threshold: f32) -> Self {
        self.config.match_threshold = threshold;
        self
    }

    pub fn dwell_millis(mut self, ms: u64) -> Self {
        self.config.dwell_millis = ms;
        self
    }

    pub fn settle_millis(mut self, ms: u64) -> Self {
        self.config.settle_millis = ms;
        self
    }

    pub fn countdown_secs(mut self, secs: u32) -> Self {
        self.config.countdown_secs = secs;
        self
    }

    pub fn build(self) -> Result<GameConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Persisted user preferences. CLI flags override these.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub game: GameKind,
    pub child_id: String,
    pub total_rounds: Option<usize>,
    pub round_duration_secs: Option<u32>,
    pub match_threshold: Option<f32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            game: GameKind::Gesture,
            child_id: "unknown".to_string(),
            total_rounds: None,
            round_duration_secs: None,
            match_threshold: None,
        }
    }
}

impl Config {
    pub fn game_config(&self) -> Result<GameConfig, ConfigError> {
        let mut builder = GameConfig::builder(self.game);
        if let Some(rounds) = self.total_rounds {
            builder = builder.total_rounds(rounds);
        }
        if let Some(secs) = self.round_duration_secs {
            builder = builder.round_duration_secs(secs);
        }
        if let Some(threshold) = self.match_threshold {
            builder = builder.match_threshold(threshold);
        }
        builder.build()
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "mimic") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("mimic_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), error = %e, "ignoring unreadable config")
                }
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
