use chrono::Local;
use tracing::{debug, info};

use crate::config::{GameConfig, GameKind};
use crate::debounce::Debouncer;
use crate::error::SessionError;
use crate::recorder::{SessionRecord, SessionRecorder};
use crate::scheduler::Scheduler;
use crate::session::{Session, SessionInput, SessionState, SessionStatus, Transition};
use crate::stimulus::StimulusPool;

/// Wires the session to its inputs: recognizer observations go through the
/// debouncer, timer sources come from the scheduler, and both are applied in
/// one ordered batch per [`GameDriver::advance`].
pub struct GameDriver {
    session: Session,
    debouncer: Debouncer,
    scheduler: Scheduler,
    recorder: SessionRecorder,
    pending: Vec<SessionInput>,
    camera_active: bool,
    finished: Option<SessionRecord>,
}

impl GameDriver {
    pub fn new(
        kind: GameKind,
        config: GameConfig,
        pool: StimulusPool,
        child_id: impl Into<String>,
    ) -> Result<Self, SessionError> {
        let session = Session::new(config, pool)?;
        Ok(Self::from_session(kind, session, child_id))
    }

    pub fn from_session(kind: GameKind, session: Session, child_id: impl Into<String>) -> Self {
        let config = session.config().clone();
        Self {
            debouncer: Debouncer::new(config.match_threshold, config.dwell_millis),
            scheduler: Scheduler::new(config.settle_millis),
            recorder: SessionRecorder::new(child_id, kind),
            pending: Vec::new(),
            camera_active: true,
            finished: None,
            session,
        }
    }

    pub fn state(&self) -> &SessionState {
        self.session.state()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn pool(&self) -> &StimulusPool {
        self.session.pool()
    }

    pub fn camera_active(&self) -> bool {
        self.camera_active
    }

    pub fn start(&mut self, now_ms: u64) -> Result<Vec<Transition>, SessionError> {
        let transitions = self.session.start()?;
        self.recorder.begin(Local::now());
        self.scheduler.sync(now_ms, self.session.state());
        Ok(transitions)
    }

    /// Feed one raw recognizer result. Nothing is applied until `advance`.
    pub fn observe(&mut self, label: &str, confidence: f32, now_ms: u64) {
        if !self.camera_active {
            return;
        }
        self.session.note_observation(label, confidence);

        if let Some(event) = self.debouncer.observe(label, confidence, now_ms) {
            let epoch = self.session.epoch();
            debug!(?epoch, label = %event.label, "queued detection");
            self.pending.push(SessionInput::Detection { epoch, event });
        }
    }

    pub fn set_camera_active(&mut self, active: bool) {
        if self.camera_active == active {
            return;
        }
        info!(active, "camera state changed");
        self.camera_active = active;
        if !active {
            self.debouncer.clear();
            self.pending.clear();
        }
    }

    /// Apply everything due at `now_ms`, then re-arm timers for the new state.
    pub fn advance(&mut self, now_ms: u64) -> Vec<Transition> {
        let mut due = self.scheduler.poll(now_ms);
        due.append(&mut self.pending);

        let transitions = self.session.dispatch(due);
        self.scheduler.sync(now_ms, self.session.state());

        if self.session.status() == SessionStatus::Finished && self.finished.is_none() {
            let record = self
                .recorder
                .finish(&self.session.state().outcomes, Local::now());
            info!(
                session_id = %record.session_id,
                score = record.summary.total_score,
                rounds = record.summary.round_count,
                "session recorded"
            );
            self.finished = Some(record);
        }

        transitions
    }

    /// Cancel timers, drop in-flight detections and return to `NotStarted`.
    pub fn reset(&mut self) {
        self.scheduler.cancel();
        self.debouncer.clear();
        self.pending.clear();
        self.recorder.clear();
        self.finished = None;
        self.session.reset();
    }

    /// Present once the session reached `Finished`.
    pub fn finished_record(&self) -> Option<&SessionRecord> {
        self.finished.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.session.status() == SessionStatus::Finished
    }
}
