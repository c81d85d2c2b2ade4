use tracing::trace;

use crate::session::{Epoch, SessionInput, SessionState, SessionStatus};

pub const SECOND_MS: u64 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ArmedTicks {
    epoch: Epoch,
    status: SessionStatus,
    next_at: u64,
    /// Ticks the live countdown can still consume.
    budget: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ArmedSettle {
    epoch: Epoch,
    due_at: u64,
}

/// Timer sources for one session: a once-a-second tick while a countdown is
/// live and a one-shot deadline while a round settles.
///
/// Arming follows the session state. Every input carries the epoch it was
/// armed under, so anything that fires after the session moved on is
/// rejected by the session itself.
#[derive(Debug, Clone)]
pub struct Scheduler {
    settle_ms: u64,
    ticks: Option<ArmedTicks>,
    settle: Option<ArmedSettle>,
}

impl Scheduler {
    pub fn new(settle_ms: u64) -> Self {
        Self {
            settle_ms,
            ticks: None,
            settle: None,
        }
    }

    /// Re-arm or disarm to match `state`. Call after every dispatch.
    pub fn sync(&mut self, now_ms: u64, state: &SessionState) {
        let epoch = state.epoch();

        match state.status {
            SessionStatus::CountingDown | SessionStatus::RoundActive => {
                let current = self.ticks.map(|t| (t.epoch, t.status));
                if current != Some((epoch, state.status)) {
                    trace!(?epoch, status = %state.status, "arming second ticks");
                    let budget = if state.status == SessionStatus::CountingDown {
                        state.countdown_remaining
                    } else {
                        state.time_remaining
                    };
                    self.ticks = Some(ArmedTicks {
                        epoch,
                        status: state.status,
                        next_at: now_ms.saturating_add(SECOND_MS),
                        budget,
                    });
                }
            }
            _ => self.ticks = None,
        }

        match state.status {
            SessionStatus::RoundSettling => {
                if self.settle.map(|s| s.epoch) != Some(epoch) {
                    trace!(?epoch, "arming settle deadline");
                    self.settle = Some(ArmedSettle {
                        epoch,
                        due_at: now_ms.saturating_add(self.settle_ms),
                    });
                }
            }
            _ => self.settle = None,
        }
    }

    /// Everything due at `now_ms`, oldest first. After a gap, seconds the
    /// countdown can no longer use are skipped rather than queued.
    pub fn poll(&mut self, now_ms: u64) -> Vec<SessionInput> {
        let mut due = Vec::new();

        if let Some(ticks) = self.ticks.as_mut() {
            if ticks.next_at <= now_ms {
                let missed = (now_ms - ticks.next_at) / SECOND_MS + 1;
                let emit = missed.min(u64::from(ticks.budget)) as u32;
                if u64::from(emit) < missed {
                    trace!(missed, emit, "dropping surplus ticks after a gap");
                }
                due.extend((0..emit).map(|_| SessionInput::TimerTick { epoch: ticks.epoch }));
                ticks.budget -= emit;
                ticks.next_at = ticks
                    .next_at
                    .saturating_add(missed.saturating_mul(SECOND_MS));
            }
        }

        if let Some(settle) = self.settle {
            if settle.due_at <= now_ms {
                due.push(SessionInput::SettleElapsed {
                    epoch: settle.epoch,
                });
                self.settle = None;
            }
        }

        due
    }

    pub fn cancel(&mut self) {
        self.ticks = None;
        self.settle = None;
    }

    pub fn is_idle(&self) -> bool {
        self.ticks.is_none() && self.settle.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::session::Session;
    use crate::stimulus::StimulusPool;

    fn session() -> Session {
        Session::with_seed(
            GameConfig::gesture(),
            StimulusPool::builtin("gestures").unwrap(),
            5,
        )
        .unwrap()
    }

    #[test]
    fn idle_before_start() {
        let s = session();
        let mut sched = Scheduler::new(2_000);
        sched.sync(0, s.state());
        assert!(sched.is_idle());
        assert!(sched.poll(10_000).is_empty());
    }

    #[test]
    fn ticks_once_per_second_while_counting_down() {
        let mut s = session();
        let mut sched = Scheduler::new(2_000);
        s.start().unwrap();
        sched.sync(0, s.state());

        assert!(sched.poll(999).is_empty());
        let due = sched.poll(1_000);
        assert_eq!(due, vec![SessionInput::TimerTick { epoch: s.epoch() }]);
        assert_eq!(sched.poll(3_500).len(), 2);
    }

    #[test]
    fn resync_in_same_epoch_keeps_cadence() {
        let mut s = session();
        let mut sched = Scheduler::new(2_000);
        s.start().unwrap();
        sched.sync(0, s.state());
        sched.sync(700, s.state());
        assert_eq!(sched.poll(1_000).len(), 1);
    }

    #[test]
    fn settle_fires_once_after_dwell() {
        let mut s = session();
        let mut sched = Scheduler::new(2_000);
        s.start().unwrap();
        let mut now = 0;
        sched.sync(now, s.state());

        while s.status() != crate::session::SessionStatus::RoundSettling {
            now += 1_000;
            let due = sched.poll(now);
            s.dispatch(due);
            sched.sync(now, s.state());
        }
        let settled_at = now;
        assert!(sched.poll(settled_at + 1_999).is_empty());
        let due = sched.poll(settled_at + 2_000);
        assert_eq!(due, vec![SessionInput::SettleElapsed { epoch: s.epoch() }]);
        assert!(sched.poll(settled_at + 10_000).is_empty());
    }

    #[test]
    fn long_gap_yields_only_usable_ticks() {
        let mut s = session();
        let mut sched = Scheduler::new(2_000);
        s.start().unwrap();
        sched.sync(0, s.state());

        // a day asleep: only the 3 countdown seconds are worth delivering
        let due = sched.poll(86_400_000);
        assert_eq!(due.len(), 3);
        s.dispatch(due);
        assert_eq!(s.status(), crate::session::SessionStatus::RoundActive);

        sched.sync(86_400_000, s.state());
        let due = sched.poll(2 * 86_400_000);
        assert_eq!(due.len(), 10);
        assert!(sched.poll(2 * 86_400_000 + 5_000).is_empty());
    }

    #[test]
    fn clock_near_max_does_not_overflow() {
        let mut s = session();
        let mut sched = Scheduler::new(2_000);
        s.start().unwrap();
        sched.sync(u64::MAX - 500, s.state());

        assert!(sched.poll(u64::MAX - 1).is_empty());
        let due = sched.poll(u64::MAX);
        assert_eq!(due.len(), 1);
        assert!(due.len() + sched.poll(u64::MAX).len() <= 3);
    }

    #[test]
    fn cancel_drops_everything() {
        let mut s = session();
        let mut sched = Scheduler::new(2_000);
        s.start().unwrap();
        sched.sync(0, s.state());
        sched.cancel();
        assert!(sched.is_idle());
        assert!(sched.poll(60_000).is_empty());
    }
}
