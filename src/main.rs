mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use mimic::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore, GameConfig, GameKind},
    error::SessionError,
    export,
    game::GameDriver,
    history::{HistoryDb, SessionRow, StimulusStats},
    logging, replay,
    runtime::{CrosstermEventSource, FixedTicker, GameEvent, Runner},
    session::{Session, SessionStatus},
    stimulus::StimulusPool,
    util::elapsed_ms,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::File,
    io::{self, stdin, BufReader},
    path::PathBuf,
    time::{Duration, Instant},
};
use tracing::{info, warn};

const TICK_RATE_MS: u64 = 100;

/// Confidence reported for a key press standing in for the recognizer.
const KEY_CONFIDENCE: f32 = 0.95;

const RECENT_SESSIONS: usize = 10;

/// copy the gesture or expression before the timer runs out
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A round-based mimic game: each round shows a hand gesture or facial expression to copy before the round timer expires. In the terminal, number keys stand in for the recognizer; --replay drives a session from a recorded recognizer transcript."
)]
pub struct Cli {
    /// which mini-game to play
    #[clap(short = 'g', long, value_enum)]
    game: Option<GameKind>,

    /// number of rounds per session
    #[clap(short = 'r', long)]
    rounds: Option<usize>,

    /// number of seconds per round
    #[clap(short = 's', long = "round-secs")]
    round_secs: Option<u32>,

    /// confidence a detection must exceed to count as a match
    #[clap(short = 't', long)]
    threshold: Option<f32>,

    /// seconds of countdown before the first round (0 to skip)
    #[clap(long)]
    countdown: Option<u32>,

    /// child profile the session is recorded under
    #[clap(short = 'c', long)]
    child: Option<String>,

    /// custom stimulus pool (JSON file) instead of the built-in one
    #[clap(long)]
    pool: Option<PathBuf>,

    /// play a recognizer transcript (JSON lines) headlessly and print the session record
    #[clap(long)]
    replay: Option<PathBuf>,

    /// seed for the stimulus order
    #[clap(long)]
    seed: Option<u64>,

    /// with --replay, print the backend export payload instead of the full record
    #[clap(long)]
    payload: bool,

    /// with --replay, also write the backend export payload to this file
    #[clap(long)]
    export: Option<PathBuf>,

    /// delete all recorded session history and exit
    #[clap(long)]
    clear_history: bool,

    /// do not write session history or the session log
    #[clap(long)]
    no_save: bool,

    /// remember --game, --child, --rounds, --round-secs and --threshold as defaults
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Stored preferences with this invocation's flags layered on top.
    fn merge_into(&self, mut cfg: Config) -> Config {
        if let Some(game) = self.game {
            cfg.game = game;
        }
        if let Some(child) = &self.child {
            cfg.child_id = child.clone();
        }
        if self.rounds.is_some() {
            cfg.total_rounds = self.rounds;
        }
        if self.round_secs.is_some() {
            cfg.round_duration_secs = self.round_secs;
        }
        if self.threshold.is_some() {
            cfg.match_threshold = self.threshold;
        }
        cfg
    }

    fn game_config(&self, cfg: &Config) -> Result<GameConfig, Box<dyn Error>> {
        let mut game = cfg.game_config()?;
        if let Some(secs) = self.countdown {
            game.countdown_secs = secs;
        }
        Ok(game)
    }

    fn load_pool(&self, kind: GameKind) -> Result<StimulusPool, Box<dyn Error>> {
        let pool = match &self.pool {
            Some(path) => StimulusPool::from_json_file(path)?,
            None => StimulusPool::builtin(kind.pool_name())?,
        };
        Ok(pool)
    }

    fn session(&self, game: GameConfig, pool: StimulusPool) -> Result<Session, SessionError> {
        match self.seed {
            Some(seed) => Session::with_seed(game, pool, seed),
            None => Session::new(game, pool),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppScreen {
    Instructions,
    Playing,
    Results,
    History,
}

#[derive(Debug, Default)]
pub struct HistoryView {
    pub stats: Vec<StimulusStats>,
    pub recent: Vec<SessionRow>,
    pub scroll_offset: usize,
}

pub struct App {
    pub kind: GameKind,
    pub driver: GameDriver,
    pub screen: AppScreen,
    pub history: Option<HistoryDb>,
    pub history_view: HistoryView,
    pub session_log: Option<PathBuf>,
    /// Message shown on the instructions screen, e.g. why a start was refused.
    pub notice: Option<String>,
    persisted: bool,
    clock: Instant,
}

impl App {
    pub fn new(kind: GameKind, driver: GameDriver) -> Self {
        Self {
            kind,
            driver,
            screen: AppScreen::Instructions,
            history: None,
            history_view: HistoryView::default(),
            session_log: None,
            notice: None,
            persisted: false,
            clock: Instant::now(),
        }
    }

    pub fn with_persistence(mut self, history: Option<HistoryDb>, session_log: Option<PathBuf>) -> Self {
        self.history = history;
        self.session_log = session_log;
        self
    }

    fn now_ms(&self) -> u64 {
        elapsed_ms(self.clock)
    }

    pub fn start_session(&mut self) {
        let now = self.now_ms();
        match self.driver.start(now) {
            Ok(_) => {
                self.notice = None;
                self.persisted = false;
                self.screen = AppScreen::Playing;
            }
            Err(e) => {
                warn!(error = %e, "session refused to start");
                self.notice = Some(e.to_string());
                self.screen = AppScreen::Instructions;
            }
        }
    }

    pub fn restart(&mut self) {
        self.driver.reset();
        self.start_session();
    }

    pub fn back_to_instructions(&mut self) {
        self.driver.reset();
        self.screen = AppScreen::Instructions;
    }

    pub fn on_tick(&mut self) {
        let now = self.now_ms();
        self.driver.advance(now);
        self.after_advance();
    }

    pub fn observe(&mut self, label: &str, confidence: f32) {
        let now = self.now_ms();
        self.driver.observe(label, confidence, now);
        self.driver.advance(now);
        self.after_advance();
    }

    /// Number keys 1..=9 stand in for the recognizer reporting that stimulus.
    pub fn press_stimulus(&mut self, idx: usize) {
        let label = match self.driver.pool().stimuli().get(idx) {
            Some(s) => s.id.clone(),
            None => return,
        };
        self.observe(&label, KEY_CONFIDENCE);
    }

    pub fn toggle_camera(&mut self) {
        let active = !self.driver.camera_active();
        self.driver.set_camera_active(active);
    }

    pub fn show_history(&mut self) {
        if let Some(db) = &self.history {
            match (db.stimulus_summary(self.kind), db.recent_sessions(RECENT_SESSIONS)) {
                (Ok(stats), Ok(recent)) => {
                    self.history_view = HistoryView {
                        stats,
                        recent,
                        scroll_offset: 0,
                    }
                }
                (Err(e), _) | (_, Err(e)) => warn!(error = %e, "could not load history"),
            }
        }
        self.screen = AppScreen::History;
    }

    pub fn leave_history(&mut self) {
        self.screen = if self.driver.is_finished() {
            AppScreen::Results
        } else {
            AppScreen::Instructions
        };
    }

    fn after_advance(&mut self) {
        if self.screen == AppScreen::Playing && self.driver.is_finished() {
            self.persist();
            self.screen = AppScreen::Results;
        }
    }

    fn persist(&mut self) {
        if self.persisted {
            return;
        }
        let record = match self.driver.finished_record() {
            Some(r) => r.clone(),
            None => return,
        };

        if let Some(db) = self.history.as_mut() {
            if let Err(e) = db.record_session(&record) {
                warn!(error = %e, "failed to store session history");
            }
        }
        if let Some(path) = &self.session_log {
            if let Err(e) = export::append_session_log(path, &record) {
                warn!(error = %e, path = %path.display(), "failed to append session log");
            }
        }
        self.persisted = true;
    }
}

/// Returns true when the app should quit.
pub fn handle_key(app: &mut App, key: KeyEvent) -> bool {
    if key.code == KeyCode::Esc
        || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
    {
        return true;
    }

    match app.screen {
        AppScreen::Instructions => match key.code {
            KeyCode::Enter | KeyCode::Char(' ') => app.start_session(),
            KeyCode::Char('h') => app.show_history(),
            _ => {}
        },
        AppScreen::Playing => match key.code {
            KeyCode::Char(c @ '1'..='9') => {
                let idx = c as usize - '1' as usize;
                app.press_stimulus(idx);
            }
            KeyCode::Char('c') => app.toggle_camera(),
            KeyCode::Char('x') => app.back_to_instructions(),
            _ => {}
        },
        AppScreen::Results => match key.code {
            KeyCode::Char('r') => app.restart(),
            KeyCode::Char('n') => app.back_to_instructions(),
            KeyCode::Char('h') => app.show_history(),
            _ => {}
        },
        AppScreen::History => match key.code {
            KeyCode::Char('b') | KeyCode::Backspace => app.leave_history(),
            KeyCode::Up => {
                app.history_view.scroll_offset = app.history_view.scroll_offset.saturating_sub(1)
            }
            KeyCode::Down => app.history_view.scroll_offset += 1,
            KeyCode::Home => app.history_view.scroll_offset = 0,
            _ => {}
        },
    }
    false
}

fn run_replay(cli: &Cli, kind: GameKind, cfg: &Config, path: &PathBuf) -> Result<(), Box<dyn Error>> {
    logging::init_stderr();

    let pool = cli.load_pool(kind)?;
    let session = cli.session(cli.game_config(cfg)?, pool)?;
    let mut driver = GameDriver::from_session(kind, session, cfg.child_id.clone());

    let transcript = replay::parse_transcript(BufReader::new(File::open(path)?))?;
    let record = replay::run(&mut driver, transcript, replay::DEFAULT_STEP_MS)?;

    let payload = record.export_payload(driver.pool());
    if let Some(path) = &cli.export {
        export::write_payload_json(path, &payload)?;
    }

    let out = if cli.payload {
        serde_json::to_string_pretty(&payload)?
    } else {
        serde_json::to_string_pretty(&record)?
    };
    println!("{out}");
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let store = FileConfigStore::new();
    let cfg = cli.merge_into(store.load());
    if cli.save_config {
        store.save(&cfg)?;
    }
    let kind = cfg.game;

    if cli.clear_history {
        logging::init_stderr();
        HistoryDb::new()?.clear_all()?;
        println!("session history cleared");
        return Ok(());
    }

    if let Some(path) = &cli.replay {
        return run_replay(&cli, kind, &cfg, path);
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Some(path) = AppDirs::trace_log_path() {
        logging::init_file(path)?;
    }

    let pool = cli.load_pool(kind)?;
    let session = cli.session(cli.game_config(&cfg)?, pool)?;
    let driver = GameDriver::from_session(kind, session, cfg.child_id.clone());

    let mut app = App::new(kind, driver);
    if !cli.no_save {
        let history = match HistoryDb::new() {
            Ok(db) => Some(db),
            Err(e) => {
                warn!(error = %e, "history disabled");
                None
            }
        };
        app = app.with_persistence(history, AppDirs::session_log_path());
    }
    info!(game = %kind, child = %cfg.child_id, "mimic starting");

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    loop {
        terminal.draw(|f| ui::draw(app, f))?;

        match runner.step() {
            GameEvent::Key(key) => {
                if handle_key(app, key) {
                    break;
                }
            }
            GameEvent::Observation(o) => app.observe(&o.label, o.confidence),
            GameEvent::Camera(active) => app.driver.set_camera_active(active),
            GameEvent::Resize | GameEvent::Tick => {}
        }
        // events can starve the ticker; time still has to move
        if app.driver.state().status != SessionStatus::NotStarted {
            app.on_tick();
        }
    }

    Ok(())
}
