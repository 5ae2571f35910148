use frontier_primitives::BufferState;
use frontier_time::Duration;

/// Pure, side-effect-free decision function consulted by the buffered
/// scheduler's workers.
///
/// Kept deliberately minimal: implementations must not perform I/O or
/// heavy computation, since the scheduler calls `prefetch`/`flush` on
/// every refill iteration of its hot path. Implementations must be
/// stateless or internally synchronized — the scheduler may call them
/// concurrently from its prefetch and flush workers.
pub trait BufferPolicy: Send + Sync {
    /// How many items to pull from the backend queue into the prefetch
    /// buffer right now. `0` declines.
    fn prefetch(&self, state: BufferState) -> usize;

    /// How many items to drain from the flush buffer to the backend queue
    /// right now, and an optional maximum time to wait accumulating more
    /// before committing (`Duration::ZERO` means flush immediately).
    fn flush(&self, state: BufferState) -> (usize, Duration);
}

/// Threshold-based policy: prefetch when usage falls to or below
/// `min_prefetch_thresh`; flush when usage rises to or above
/// `max_flush_thresh`. Both thresholds are fractions of capacity in
/// `[0, 1]`.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdPolicy {
    pub min_prefetch_thresh: f64,
    pub max_flush_thresh: f64,
}

impl ThresholdPolicy {
    pub fn new(min_prefetch_thresh: f64, max_flush_thresh: f64) -> Self {
        Self { min_prefetch_thresh, max_flush_thresh }
    }
}

impl BufferPolicy for ThresholdPolicy {
    fn prefetch(&self, state: BufferState) -> usize {
        if state.usage() <= self.min_prefetch_thresh {
            state.buf_cap.saturating_sub(state.buf_len)
        } else {
            0
        }
    }

    fn flush(&self, state: BufferState) -> (usize, Duration) {
        if state.usage() >= self.max_flush_thresh {
            (state.buf_len, Duration::ZERO)
        } else {
            (0, Duration::ZERO)
        }
    }
}

/// The frontier's default policy: prefetch only when the prefetch buffer
/// is completely empty, flush only when the flush buffer is completely
/// full. Equivalent to `ThresholdPolicy::new(0.0, 1.0)`, named so callers
/// don't need to spell out the threshold literals to get the default
/// behavior.
#[derive(Debug, Clone, Copy)]
pub struct DefaultPolicy(ThresholdPolicy);

impl DefaultPolicy {
    pub fn new() -> Self {
        Self(ThresholdPolicy::new(0.0, 1.0))
    }
}

impl Default for DefaultPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferPolicy for DefaultPolicy {
    fn prefetch(&self, state: BufferState) -> usize {
        self.0.prefetch(state)
    }

    fn flush(&self, state: BufferState) -> (usize, Duration) {
        self.0.flush(state)
    }
}

impl From<ThresholdPolicy> for DefaultPolicy {
    fn from(p: ThresholdPolicy) -> Self {
        Self(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_prefetch_declines_above_threshold() {
        let p = ThresholdPolicy::new(0.25, 0.75);
        assert_eq!(p.prefetch(BufferState::new(1, 8)), 7); // usage 0.125 <= 0.25
        assert_eq!(p.prefetch(BufferState::new(4, 8)), 0); // usage 0.5 > 0.25
    }

    #[test]
    fn threshold_flush_triggers_at_or_above_threshold() {
        let p = ThresholdPolicy::new(0.5, 0.75);
        assert_eq!(p.flush(BufferState::new(5, 8)), (0, Duration::ZERO)); // 0.625 < 0.75
        assert_eq!(p.flush(BufferState::new(6, 8)), (6, Duration::ZERO)); // 0.75 >= 0.75
    }

    #[test]
    fn default_policy_prefetches_only_when_empty_flushes_only_when_full() {
        let p = DefaultPolicy::new();
        assert_eq!(p.prefetch(BufferState::new(0, 4)), 4);
        assert_eq!(p.prefetch(BufferState::new(1, 4)), 0);
        assert_eq!(p.flush(BufferState::new(3, 4)), (0, Duration::ZERO));
        assert_eq!(p.flush(BufferState::new(4, 4)), (4, Duration::ZERO));
    }
}
