use serde::{Deserialize, Serialize};
use tracing::trace;

/// A recognizer observation that survived debouncing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionEvent {
    pub label: String,
    pub confidence: f32,
}

/// Turns the recognizer's per-frame output into discrete detection events.
///
/// An observation passes when its confidence is strictly above the threshold
/// and it either names a different label than the last emission or arrives
/// at least `dwell_ms` after it. Suppressed observations do not move the
/// window.
#[derive(Debug, Clone)]
pub struct Debouncer {
    threshold: f32,
    dwell_ms: u64,
    last_emitted: Option<(String, u64)>,
}

impl Debouncer {
    pub fn new(threshold: f32, dwell_ms: u64) -> Self {
        Self {
            threshold,
            dwell_ms,
            last_emitted: None,
        }
    }

    pub fn observe(&mut self, label: &str, confidence: f32, now_ms: u64) -> Option<DetectionEvent> {
        if confidence.is_nan() || confidence <= self.threshold {
            return None;
        }

        if let Some((last_label, at)) = &self.last_emitted {
            let within_dwell = now_ms.saturating_sub(*at) < self.dwell_ms;
            if last_label == label && within_dwell {
                trace!(label, confidence, "suppressed repeated detection");
                return None;
            }
        }

        self.last_emitted = Some((label.to_string(), now_ms));
        Some(DetectionEvent {
            label: label.to_string(),
            confidence,
        })
    }

    /// Forget the dwell window, e.g. after a reset or when the camera goes away.
    pub fn clear(&mut self) {
        self.last_emitted = None;
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_label_inside_dwell_is_dropped() {
        let mut d = Debouncer::new(0.7, 200);
        assert!(d.observe("Victory", 0.8, 1_000).is_some());
        assert!(d.observe("Victory", 0.8, 1_100).is_none());
    }

    #[test]
    fn below_threshold_is_dropped() {
        let mut d = Debouncer::new(0.6, 200);
        assert!(d.observe("Victory", 0.4, 0).is_none());
    }

    #[test]
    fn threshold_is_strict() {
        let mut d = Debouncer::new(0.7, 200);
        assert!(d.observe("Victory", 0.7, 0).is_none());
        assert!(d.observe("Victory", 0.71, 0).is_some());
    }

    #[test]
    fn nan_confidence_never_passes() {
        let mut d = Debouncer::new(0.6, 200);
        assert!(d.observe("Victory", f32::NAN, 0).is_none());
    }

    #[test]
    fn different_label_passes_immediately() {
        let mut d = Debouncer::new(0.6, 200);
        assert!(d.observe("Victory", 0.9, 0).is_some());
        let ev = d.observe("Open_Palm", 0.9, 10).unwrap();
        assert_eq!(ev.label, "Open_Palm");
    }

    #[test]
    fn same_label_passes_after_dwell() {
        let mut d = Debouncer::new(0.6, 200);
        assert!(d.observe("Victory", 0.9, 0).is_some());
        assert!(d.observe("Victory", 0.9, 199).is_none());
        assert!(d.observe("Victory", 0.9, 200).is_some());
    }

    #[test]
    fn suppressed_observation_does_not_extend_window() {
        let mut d = Debouncer::new(0.6, 200);
        assert!(d.observe("Victory", 0.9, 0).is_some());
        assert!(d.observe("Victory", 0.9, 150).is_none());
        assert!(d.observe("Victory", 0.9, 210).is_some());
    }

    #[test]
    fn clear_forgets_last_emission() {
        let mut d = Debouncer::new(0.6, 200);
        assert!(d.observe("Victory", 0.9, 0).is_some());
        d.clear();
        assert!(d.observe("Victory", 0.9, 50).is_some());
    }
}
