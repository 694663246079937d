//! Best-so-far checkpoint decisions.

/// Decides whether an epoch's test score earns a checkpoint write.
///
/// One instance per branch run; branches never share policy state. Ties
/// save: an epoch matching the best score overwrites the checkpoint, so the
/// newest weights win on equal test accuracy.
#[derive(Debug, Clone)]
pub struct CheckpointPolicy {
    best: f64,
}

impl CheckpointPolicy {
    /// Starts at 0.0, a sentinel below any achievable accuracy in [0, 1],
    /// so the first completed epoch always saves.
    pub fn new() -> Self {
        Self { best: 0.0 }
    }

    /// True iff `score` is at least the best seen so far. Pure; the caller
    /// persists first and then calls [`record_save`](Self::record_save).
    pub fn should_save(&self, score: f64) -> bool {
        score >= self.best
    }

    /// Record `score` after a successful checkpoint write.
    pub fn record_save(&mut self, score: f64) {
        self.best = score;
    }

    pub fn best(&self) -> f64 {
        self.best
    }
}

impl Default for CheckpointPolicy {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_save() {
        let mut policy = CheckpointPolicy::new();
        policy.record_save(0.7);
        assert!(policy.should_save(0.7));
        assert!(policy.should_save(0.8));
        assert!(!policy.should_save(0.69999));
    }

    #[test]
    fn lower_scores_never_save() {
        let mut policy = CheckpointPolicy::new();
        policy.record_save(0.5);
        for score in [0.0, 0.1, 0.49999] {
            assert!(!policy.should_save(score));
        }
        assert_eq!(policy.best(), 0.5);
    }

    #[test]
    fn first_epoch_always_saves() {
        let policy = CheckpointPolicy::new();
        assert!(policy.should_save(0.0));
        assert!(policy.should_save(0.01));
    }

    #[test]
    fn save_decisions_over_a_run() {
        // Test accuracies 0.7, 0.65, 0.8: saved, skipped, saved.
        let mut policy = CheckpointPolicy::new();
        let mut decisions = Vec::new();
        for score in [0.7, 0.65, 0.8] {
            let save = policy.should_save(score);
            if save {
                policy.record_save(score);
            }
            decisions.push(save);
        }
        assert_eq!(decisions, vec![true, false, true]);
        assert_eq!(policy.best(), 0.8);
    }

    #[test]
    fn instances_are_independent() {
        let mut g1 = CheckpointPolicy::new();
        g1.record_save(0.99);

        let g2 = CheckpointPolicy::new();
        assert!(g2.should_save(0.1));
        assert_eq!(g2.best(), 0.0);
    }
}
