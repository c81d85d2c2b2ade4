//! Round-based mimic session.
//!
//! `Session` is the single owner of [`SessionState`]. Everything that can
//! arrive asynchronously (recognizer detections, timer ticks, settle
//! deadlines) comes in as a [`SessionInput`] stamped with the [`Epoch`] it was
//! produced under, and is dropped if that epoch or the current status no
//! longer matches.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, error, info, warn};

use crate::config::GameConfig;
use crate::debounce::DetectionEvent;
use crate::error::SessionError;
use crate::stimulus::{Stimulus, StimulusPool};
use crate::timer::{RoundTimer, TimerSignal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
pub enum SessionStatus {
    NotStarted,
    CountingDown,
    RoundActive,
    RoundSettling,
    Finished,
}

/// Session generation plus round index. Bumped generation invalidates
/// everything produced before a reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Epoch {
    pub generation: u64,
    pub round: usize,
}

/// Result banner shown while a round settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundResult {
    Correct,
    TimesUp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundOutcome {
    /// 1-based.
    pub round_number: usize,
    pub stimulus_id: String,
    pub time_taken_secs: u32,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub status: SessionStatus,
    pub round_index: usize,
    pub total_rounds: usize,
    pub score: usize,
    pub current_stimulus: Option<Stimulus>,
    pub used_stimulus_ids: BTreeSet<String>,
    pub time_remaining: u32,
    pub countdown_remaining: u32,
    pub last_detection: Option<DetectionEvent>,
    pub last_result: Option<RoundResult>,
    pub outcomes: Vec<RoundOutcome>,
    pub generation: u64,
}

impl SessionState {
    fn fresh(config: &GameConfig, generation: u64) -> Self {
        Self {
            status: SessionStatus::NotStarted,
            round_index: 0,
            total_rounds: config.total_rounds,
            score: 0,
            current_stimulus: None,
            used_stimulus_ids: BTreeSet::new(),
            time_remaining: config.round_duration_secs,
            countdown_remaining: config.countdown_secs,
            last_detection: None,
            last_result: None,
            outcomes: Vec::new(),
            generation,
        }
    }

    pub fn epoch(&self) -> Epoch {
        Epoch {
            generation: self.generation,
            round: self.round_index,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionInput {
    Detection { epoch: Epoch, event: DetectionEvent },
    /// One second elapsed on whichever countdown is live.
    TimerTick { epoch: Epoch },
    SettleElapsed { epoch: Epoch },
}

impl SessionInput {
    pub fn epoch(&self) -> Epoch {
        match self {
            SessionInput::Detection { epoch, .. }
            | SessionInput::TimerTick { epoch }
            | SessionInput::SettleElapsed { epoch } => *epoch,
        }
    }

    /// Processing order inside one scheduling tick: a last-instant match
    /// beats the expiry that would otherwise end the round.
    fn priority(&self) -> u8 {
        match self {
            SessionInput::Detection { .. } => 0,
            SessionInput::TimerTick { .. } => 1,
            SessionInput::SettleElapsed { .. } => 2,
        }
    }
}

/// Observable state changes, for the front-end and for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    CountdownTick { remaining: u32 },
    RoundStarted { round: usize, stimulus_id: String },
    TimerTick { remaining: u32 },
    RoundWon { round: usize },
    RoundTimedOut { round: usize },
    Finished { score: usize },
}

#[derive(Debug)]
pub struct Session {
    config: GameConfig,
    pool: StimulusPool,
    state: SessionState,
    round_timer: RoundTimer,
    countdown: RoundTimer,
    rng: StdRng,
}

impl Session {
    pub fn new(config: GameConfig, pool: StimulusPool) -> Result<Self, SessionError> {
        Self::with_rng(config, pool, StdRng::from_entropy())
    }

    /// Deterministic stimulus order, for replays and tests.
    pub fn with_seed(config: GameConfig, pool: StimulusPool, seed: u64) -> Result<Self, SessionError> {
        Self::with_rng(config, pool, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: GameConfig, pool: StimulusPool, rng: StdRng) -> Result<Self, SessionError> {
        config.validate()?;
        Ok(Self {
            state: SessionState::fresh(&config, 0),
            config,
            pool,
            round_timer: RoundTimer::new(),
            countdown: RoundTimer::new(),
            rng,
        })
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn status(&self) -> SessionStatus {
        self.state.status
    }

    pub fn epoch(&self) -> Epoch {
        self.state.epoch()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn pool(&self) -> &StimulusPool {
        &self.pool
    }

    /// `NotStarted` -> `CountingDown` (or straight into round 1 without a countdown).
    pub fn start(&mut self) -> Result<Vec<Transition>, SessionError> {
        if self.state.status != SessionStatus::NotStarted {
            return Err(SessionError::InvalidTransition {
                action: "start",
                status: self.state.status,
            });
        }
        if self.pool.len() < self.config.total_rounds {
            return Err(SessionError::PoolExhausted {
                pool: self.pool.name().to_string(),
                requested: self.config.total_rounds,
                available: self.pool.len(),
            });
        }

        info!(
            pool = self.pool.name(),
            rounds = self.config.total_rounds,
            generation = self.state.generation,
            "session starting"
        );

        let mut transitions = Vec::new();
        if self.config.countdown_secs == 0 {
            self.begin_round(&mut transitions);
        } else {
            self.countdown.stop();
            if let Err(e) = self.countdown.start(self.config.countdown_secs) {
                error!(error = %e, "countdown refused to start");
            }
            self.state.countdown_remaining = self.config.countdown_secs;
            self.state.status = SessionStatus::CountingDown;
        }
        self.check_invariants();
        Ok(transitions)
    }

    /// Back to `NotStarted` with everything cleared. Anything stamped with
    /// the previous generation is stale from here on.
    pub fn reset(&mut self) {
        self.round_timer.stop();
        self.countdown.stop();
        let generation = self.state.generation + 1;
        info!(generation, "session reset");
        self.state = SessionState::fresh(&self.config, generation);
    }

    /// Raw recognizer output, kept for display only.
    pub fn note_observation(&mut self, label: &str, confidence: f32) {
        if matches!(
            self.state.status,
            SessionStatus::NotStarted | SessionStatus::Finished
        ) {
            return;
        }
        self.state.last_detection = Some(DetectionEvent {
            label: label.to_string(),
            confidence,
        });
    }

    /// Process everything that became due in one scheduling tick.
    pub fn dispatch<I>(&mut self, inputs: I) -> Vec<Transition>
    where
        I: IntoIterator<Item = SessionInput>,
    {
        let mut inputs: Vec<SessionInput> = inputs.into_iter().collect();
        inputs.sort_by_key(SessionInput::priority);

        let mut transitions = Vec::new();
        for input in inputs {
            self.handle(input, &mut transitions);
        }
        transitions
    }

    pub fn handle(&mut self, input: SessionInput, transitions: &mut Vec<Transition>) {
        let epoch = input.epoch();
        if epoch.generation != self.state.generation || epoch.round != self.state.round_index {
            debug!(
                ?epoch,
                current = ?self.epoch(),
                ?input,
                "discarding stale callback"
            );
            return;
        }

        match (input, self.state.status) {
            (SessionInput::Detection { event, .. }, SessionStatus::RoundActive) => {
                self.on_detection(event, transitions)
            }
            (SessionInput::TimerTick { .. }, SessionStatus::CountingDown) => {
                self.on_countdown_tick(transitions)
            }
            (SessionInput::TimerTick { .. }, SessionStatus::RoundActive) => {
                self.on_round_tick(transitions)
            }
            (SessionInput::SettleElapsed { .. }, SessionStatus::RoundSettling) => {
                self.on_settled(transitions)
            }
            (input, status) => {
                debug!(?input, %status, "input does not apply in current status");
            }
        }
        self.check_invariants();
    }

    fn on_detection(&mut self, event: DetectionEvent, transitions: &mut Vec<Transition>) {
        let is_match = self
            .state
            .current_stimulus
            .as_ref()
            .is_some_and(|s| s.id == event.label);
        if !is_match {
            debug!(label = %event.label, "detection does not match target");
            return;
        }

        self.round_timer.stop();
        let round = self.state.round_index;
        self.state.score += 1;
        self.close_round(
            true,
            self.config
                .round_duration_secs
                .saturating_sub(self.state.time_remaining),
        );
        self.state.last_result = Some(RoundResult::Correct);
        info!(round, confidence = event.confidence, "round won");
        transitions.push(Transition::RoundWon { round });
    }

    fn on_countdown_tick(&mut self, transitions: &mut Vec<Transition>) {
        match self.countdown.tick() {
            Some(TimerSignal::Remaining(remaining)) => {
                self.state.countdown_remaining = remaining;
                transitions.push(Transition::CountdownTick { remaining });
            }
            Some(TimerSignal::Expired) => {
                self.state.countdown_remaining = 0;
                transitions.push(Transition::CountdownTick { remaining: 0 });
                self.begin_round(transitions);
            }
            None => debug!("countdown tick with no live countdown"),
        }
    }

    fn on_round_tick(&mut self, transitions: &mut Vec<Transition>) {
        match self.round_timer.tick() {
            Some(TimerSignal::Remaining(remaining)) => {
                self.state.time_remaining = remaining;
                transitions.push(Transition::TimerTick { remaining });
            }
            Some(TimerSignal::Expired) => {
                self.state.time_remaining = 0;
                let round = self.state.round_index;
                self.close_round(false, self.config.round_duration_secs);
                self.state.last_result = Some(RoundResult::TimesUp);
                info!(round, "round timed out");
                transitions.push(Transition::RoundTimedOut { round });
            }
            None => debug!("round tick with no live timer"),
        }
    }

    fn on_settled(&mut self, transitions: &mut Vec<Transition>) {
        self.state.last_result = None;
        if self.state.round_index >= self.config.total_rounds {
            self.finish(transitions);
        } else {
            self.begin_round(transitions);
        }
    }

    fn close_round(&mut self, completed: bool, time_taken_secs: u32) {
        let stimulus_id = self
            .state
            .current_stimulus
            .take()
            .map(|s| s.id)
            .unwrap_or_default();
        self.state.outcomes.push(RoundOutcome {
            round_number: self.state.round_index,
            stimulus_id,
            time_taken_secs,
            completed,
        });
        self.state.status = SessionStatus::RoundSettling;
    }

    fn begin_round(&mut self, transitions: &mut Vec<Transition>) {
        let stimulus = match self.pool.draw(&self.state.used_stimulus_ids, &mut self.rng) {
            Ok(s) => s.clone(),
            Err(e) => {
                // start() validates pool size, so this only fires on a logic error
                error!(error = %e, round = self.state.round_index, "no stimulus left; ending session");
                self.finish(transitions);
                return;
            }
        };

        self.state.round_index += 1;
        self.state.used_stimulus_ids.insert(stimulus.id.clone());
        self.state.time_remaining = self.config.round_duration_secs;
        self.round_timer.stop();
        if let Err(e) = self.round_timer.start(self.config.round_duration_secs) {
            error!(error = %e, "round timer refused to start");
        }
        self.state.status = SessionStatus::RoundActive;

        info!(round = self.state.round_index, stimulus = %stimulus.id, "round started");
        transitions.push(Transition::RoundStarted {
            round: self.state.round_index,
            stimulus_id: stimulus.id.clone(),
        });
        self.state.current_stimulus = Some(stimulus);
    }

    fn finish(&mut self, transitions: &mut Vec<Transition>) {
        self.round_timer.stop();
        self.countdown.stop();
        self.state.current_stimulus = None;
        self.state.status = SessionStatus::Finished;
        info!(
            score = self.state.score,
            rounds = self.state.outcomes.len(),
            "session finished"
        );
        transitions.push(Transition::Finished {
            score: self.state.score,
        });
    }

    /// Programming errors: loud in debug builds, clamped in release builds.
    fn check_invariants(&mut self) {
        let s = &mut self.state;
        let total = self.config.total_rounds;
        let duration = self.config.round_duration_secs;

        debug_assert!(s.round_index <= total, "round_index {} > {}", s.round_index, total);
        debug_assert!(s.score <= s.round_index, "score {} > round_index {}", s.score, s.round_index);
        debug_assert!(s.time_remaining <= duration, "time_remaining {} > {}", s.time_remaining, duration);
        debug_assert!(
            s.current_stimulus.is_some() == (s.status == SessionStatus::RoundActive),
            "current_stimulus present outside RoundActive"
        );

        if s.round_index > total {
            warn!(round_index = s.round_index, total, "clamping round index");
            s.round_index = total;
        }
        if s.score > s.round_index {
            warn!(score = s.score, round_index = s.round_index, "clamping score");
            s.score = s.round_index;
        }
        if s.time_remaining > duration {
            warn!(time_remaining = s.time_remaining, duration, "clamping time remaining");
            s.time_remaining = duration;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GameConfig, GameKind};
    use assert_matches::assert_matches;

    fn pool() -> StimulusPool {
        StimulusPool::builtin("gestures").unwrap()
    }

    fn config(rounds: usize) -> GameConfig {
        GameConfig::builder(GameKind::Gesture)
            .total_rounds(rounds)
            .build()
            .unwrap()
    }

    fn tick(session: &mut Session) -> Vec<Transition> {
        let epoch = session.epoch();
        session.dispatch([SessionInput::TimerTick { epoch }])
    }

    fn settle(session: &mut Session) -> Vec<Transition> {
        let epoch = session.epoch();
        session.dispatch([SessionInput::SettleElapsed { epoch }])
    }

    fn detect(session: &mut Session, label: &str) -> Vec<Transition> {
        let epoch = session.epoch();
        session.dispatch([SessionInput::Detection {
            epoch,
            event: DetectionEvent {
                label: label.to_string(),
                confidence: 0.9,
            },
        }])
    }

    fn target(session: &Session) -> String {
        session.state().current_stimulus.as_ref().unwrap().id.clone()
    }

    /// Start and run through the countdown into round 1.
    fn started(rounds: usize) -> Session {
        let mut s = Session::with_seed(config(rounds), pool(), 3).unwrap();
        s.start().unwrap();
        assert_eq!(s.status(), SessionStatus::CountingDown);
        for _ in 0..3 {
            tick(&mut s);
        }
        assert_eq!(s.status(), SessionStatus::RoundActive);
        s
    }

    #[test]
    fn countdown_leads_into_first_round() {
        let mut s = Session::with_seed(config(5), pool(), 1).unwrap();
        s.start().unwrap();
        assert_eq!(tick(&mut s), vec![Transition::CountdownTick { remaining: 2 }]);
        assert_eq!(s.state().countdown_remaining, 2);
        tick(&mut s);
        let t = tick(&mut s);
        assert_matches!(t.as_slice(), [Transition::CountdownTick { remaining: 0 }, Transition::RoundStarted { round: 1, .. }]);
        assert_eq!(s.state().round_index, 1);
        assert_eq!(s.state().time_remaining, 10);
        assert!(s.state().current_stimulus.is_some());
    }

    #[test]
    fn zero_countdown_starts_round_immediately() {
        let cfg = GameConfig::builder(GameKind::Gesture)
            .countdown_secs(0)
            .build()
            .unwrap();
        let mut s = Session::with_seed(cfg, pool(), 1).unwrap();
        let t = s.start().unwrap();
        assert_matches!(t.as_slice(), [Transition::RoundStarted { round: 1, .. }]);
        assert_eq!(s.status(), SessionStatus::RoundActive);
    }

    #[test]
    fn matching_detection_wins_round() {
        let mut s = started(5);
        tick(&mut s);
        tick(&mut s);
        let label = target(&s);

        assert_eq!(detect(&mut s, &label), vec![Transition::RoundWon { round: 1 }]);
        assert_eq!(s.status(), SessionStatus::RoundSettling);
        assert_eq!(s.state().score, 1);
        assert_eq!(s.state().last_result, Some(RoundResult::Correct));
        assert!(s.state().current_stimulus.is_none());
        assert_eq!(
            s.state().outcomes,
            vec![RoundOutcome {
                round_number: 1,
                stimulus_id: label,
                time_taken_secs: 2,
                completed: true,
            }]
        );
    }

    #[test]
    fn non_matching_detection_is_ignored() {
        let mut s = started(5);
        let wrong = pool()
            .stimuli()
            .iter()
            .find(|st| st.id != target(&s))
            .unwrap()
            .id
            .clone();
        assert!(detect(&mut s, &wrong).is_empty());
        assert_eq!(s.status(), SessionStatus::RoundActive);
        assert_eq!(s.state().score, 0);
    }

    #[test]
    fn round_three_match_scenario() {
        let mut s = started(5);
        // round 1 won, round 2 won
        for _ in 0..2 {
            let label = target(&s);
            detect(&mut s, &label);
            settle(&mut s);
        }
        assert_eq!(s.state().round_index, 3);
        assert_eq!(s.state().score, 2);

        let label = target(&s);
        detect(&mut s, &label);
        assert_eq!(s.state().score, 3);
        assert_eq!(s.status(), SessionStatus::RoundSettling);
        let last = s.state().outcomes.last().unwrap();
        assert_eq!(last.round_number, 3);
        assert!(last.completed);
        // the timer is stopped: further ticks in this epoch change nothing
        assert!(tick(&mut s).is_empty());
        assert_eq!(s.state().outcomes.len(), 3);
    }

    #[test]
    fn timeout_records_incomplete_round() {
        let mut s = started(5);
        let label = target(&s);
        detect(&mut s, &label);
        settle(&mut s);
        assert_eq!(s.state().round_index, 2);

        let mut last = Vec::new();
        for _ in 0..10 {
            last = tick(&mut s);
        }
        assert_eq!(last, vec![Transition::RoundTimedOut { round: 2 }]);
        assert_eq!(s.status(), SessionStatus::RoundSettling);
        assert_eq!(s.state().score, 1);
        assert_eq!(s.state().last_result, Some(RoundResult::TimesUp));
        let outcome = s.state().outcomes.last().unwrap();
        assert_eq!(outcome.round_number, 2);
        assert!(!outcome.completed);
        assert_eq!(outcome.time_taken_secs, 10);
    }

    #[test]
    fn detection_beats_expiry_in_same_tick() {
        let mut s = started(2);
        for _ in 0..9 {
            tick(&mut s);
        }
        assert_eq!(s.state().time_remaining, 1);

        let epoch = s.epoch();
        let label = target(&s);
        // expiry queued first, detection second: detection must still win
        let t = s.dispatch([
            SessionInput::TimerTick { epoch },
            SessionInput::Detection {
                epoch,
                event: DetectionEvent {
                    label,
                    confidence: 0.95,
                },
            },
        ]);
        assert_eq!(t, vec![Transition::RoundWon { round: 1 }]);
        assert_eq!(s.state().score, 1);
        assert_eq!(s.state().outcomes.len(), 1);
        assert!(s.state().outcomes[0].completed);
        assert_eq!(s.state().outcomes[0].time_taken_secs, 9);
    }

    #[test]
    fn late_expiry_after_win_changes_nothing() {
        let mut s = started(5);
        let epoch = s.epoch();
        let label = target(&s);
        detect(&mut s, &label);

        let t = s.dispatch([SessionInput::TimerTick { epoch }]);
        assert!(t.is_empty());
        assert_eq!(s.state().score, 1);
        assert_eq!(s.state().outcomes.len(), 1);
    }

    #[test]
    fn repeated_match_scores_once() {
        let mut s = started(5);
        let label = target(&s);
        detect(&mut s, &label);
        detect(&mut s, &label);
        detect(&mut s, &label);
        assert_eq!(s.state().score, 1);
        assert_eq!(s.state().outcomes.len(), 1);
    }

    #[test]
    fn stale_round_detection_is_discarded() {
        let mut s = started(5);
        let old_epoch = s.epoch();
        let old_label = target(&s);
        detect(&mut s, &old_label);
        settle(&mut s);
        assert_eq!(s.state().round_index, 2);

        let t = s.dispatch([SessionInput::Detection {
            epoch: old_epoch,
            event: DetectionEvent {
                label: target(&s),
                confidence: 0.99,
            },
        }]);
        assert!(t.is_empty());
        assert_eq!(s.state().score, 1);
    }

    #[test]
    fn detections_outside_round_active_are_ignored() {
        let mut s = Session::with_seed(config(5), pool(), 9).unwrap();
        s.start().unwrap();
        let t = detect(&mut s, "Open_Palm");
        assert!(t.is_empty());
        assert_eq!(s.status(), SessionStatus::CountingDown);
        assert_eq!(s.state().score, 0);
    }

    #[test]
    fn settle_advances_exactly_one_round_then_finishes() {
        let mut s = started(2);
        let label = target(&s);
        detect(&mut s, &label);
        let t = settle(&mut s);
        assert_matches!(t.as_slice(), [Transition::RoundStarted { round: 2, .. }]);
        assert_eq!(s.state().last_result, None);

        for _ in 0..10 {
            tick(&mut s);
        }
        let t = settle(&mut s);
        assert_eq!(t, vec![Transition::Finished { score: 1 }]);
        assert_eq!(s.status(), SessionStatus::Finished);
        assert_eq!(s.state().outcomes.len(), 2);
    }

    #[test]
    fn finished_session_accepts_nothing_until_reset() {
        let mut s = started(1);
        let label = target(&s);
        detect(&mut s, &label);
        settle(&mut s);
        assert_eq!(s.status(), SessionStatus::Finished);

        assert!(tick(&mut s).is_empty());
        assert!(detect(&mut s, &label).is_empty());
        assert!(settle(&mut s).is_empty());
        assert_matches!(
            s.start(),
            Err(SessionError::InvalidTransition {
                action: "start",
                status: SessionStatus::Finished
            })
        );

        s.reset();
        assert_eq!(s.status(), SessionStatus::NotStarted);
        assert_eq!(s.state().round_index, 0);
        assert_eq!(s.state().score, 0);
        assert!(s.state().outcomes.is_empty());
        assert!(s.state().used_stimulus_ids.is_empty());
        assert!(s.start().is_ok());
    }

    #[test]
    fn reset_mid_round_invalidates_pending_inputs() {
        let mut s = started(5);
        let label = target(&s);
        detect(&mut s, &label);
        settle(&mut s);
        let label = target(&s);
        detect(&mut s, &label);
        settle(&mut s);
        assert_eq!(s.state().round_index, 3);
        let old = s.epoch();
        let label = target(&s);

        s.reset();
        assert_eq!(s.status(), SessionStatus::NotStarted);
        assert_eq!(s.state().round_index, 0);
        assert_eq!(s.state().score, 0);
        assert!(s.state().outcomes.is_empty());

        let t = s.dispatch([
            SessionInput::Detection {
                epoch: old,
                event: DetectionEvent {
                    label,
                    confidence: 1.0,
                },
            },
            SessionInput::TimerTick { epoch: old },
            SessionInput::SettleElapsed { epoch: old },
        ]);
        assert!(t.is_empty());
        assert_eq!(s.status(), SessionStatus::NotStarted);
        assert_eq!(s.state().generation, old.generation + 1);
    }

    #[test]
    fn start_rejects_more_rounds_than_stimuli() {
        let mut s = Session::new(config(8), pool()).unwrap();
        assert_eq!(
            s.start(),
            Err(SessionError::PoolExhausted {
                pool: "gestures".into(),
                requested: 8,
                available: 7,
            })
        );
        assert_eq!(s.status(), SessionStatus::NotStarted);
    }

    #[test]
    fn full_pool_session_never_repeats() {
        let mut s = started(7);
        loop {
            match s.status() {
                SessionStatus::RoundActive => {
                    let label = target(&s);
                    detect(&mut s, &label);
                }
                SessionStatus::RoundSettling => {
                    settle(&mut s);
                }
                SessionStatus::Finished => break,
                other => panic!("unexpected status {other}"),
            }
        }
        let ids: BTreeSet<_> = s.state().outcomes.iter().map(|o| o.stimulus_id.clone()).collect();
        assert_eq!(ids.len(), 7);
        assert_eq!(s.state().score, 7);
    }

    #[test]
    fn observation_is_kept_for_display_only() {
        let mut s = started(5);
        s.note_observation("Victory", 0.42);
        assert_eq!(
            s.state().last_detection,
            Some(DetectionEvent {
                label: "Victory".into(),
                confidence: 0.42
            })
        );
        assert_eq!(s.state().score, 0);
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let cfg = GameConfig {
            total_rounds: 0,
            ..GameConfig::gesture()
        };
        assert_matches!(Session::new(cfg, pool()), Err(SessionError::Config(_)));
    }
}
