use crate::error::TimerError;

/// What a single one-second tick produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerSignal {
    Remaining(u32),
    Expired,
}

/// Whole-second countdown for one round (or for the pre-game countdown).
///
/// Ticks are fed from outside; the timer never schedules anything itself.
/// Once stopped or expired it stays silent until started again.
#[derive(Debug, Clone, Default)]
pub struct RoundTimer {
    remaining: u32,
    running: bool,
}

impl RoundTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, duration_secs: u32) -> Result<(), TimerError> {
        if self.running {
            return Err(TimerError::AlreadyRunning {
                remaining: self.remaining,
            });
        }
        if duration_secs == 0 {
            return Err(TimerError::ZeroDuration);
        }
        self.remaining = duration_secs;
        self.running = true;
        Ok(())
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn tick(&mut self) -> Option<TimerSignal> {
        if !self.running {
            return None;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.running = false;
            Some(TimerSignal::Expired)
        } else {
            Some(TimerSignal::Remaining(self.remaining))
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}
