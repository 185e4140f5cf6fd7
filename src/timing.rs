//! # Frame Scheduling and Fetch Throttling
//!
//! Two small timing concerns with one shared rule: time flows in from the
//! caller as `now_ms`, never read from a clock inside the library. That keeps
//! every function here a pure input/output mapping that tests can drive with
//! plain integers.
//!
//! [`frame_at`] replaces a mutable per-call frame counter with a function of
//! absolute time, so two callers asking at the same instant see the same
//! frame and an observer joining mid-sequence is already in sync.
//!
//! [`FetchCooldown`] enforces a minimum interval between network attempts.
//! Attempts are recorded whether or not they succeed — an unreachable
//! provider is probed at most once per interval instead of in a tight loop.

/// Default minimum interval between telemetry fetches (5 minutes).
pub const DEFAULT_COOLDOWN_MS: u64 = 300_000;

/// Currently-visible frame index for an animation running since time zero.
///
/// Computed as `(now_ms / frame_delay_ms) % frame_count`. Pure: identical
/// arguments always yield the identical index. Zero frame count or zero
/// delay degrade to frame 0 (a static display) rather than dividing by zero.
pub fn frame_at(now_ms: u64, frame_delay_ms: u32, frame_count: usize) -> usize {
    if frame_count == 0 || frame_delay_ms == 0 {
        return 0;
    }
    ((now_ms / frame_delay_ms as u64) % frame_count as u64) as usize
}

/// Throttle for telemetry/asset fetch attempts.
#[derive(Clone, Debug)]
pub struct FetchCooldown {
    last_attempt_ms: Option<u64>,
    interval_ms: u64,
}

impl FetchCooldown {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            last_attempt_ms: None,
            interval_ms,
        }
    }

    /// True when a fetch may be attempted: either no attempt has been made
    /// yet, or the full interval has elapsed since the last one.
    pub fn due(&self, now_ms: u64) -> bool {
        match self.last_attempt_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.interval_ms,
        }
    }

    /// Record an attempt. Called for every fetch cycle regardless of
    /// outcome, so failures still consume the interval.
    pub fn record_attempt(&mut self, now_ms: u64) {
        self.last_attempt_ms = Some(now_ms);
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }
}

impl Default for FetchCooldown {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_index_is_pure_function_of_time() {
        // Same arguments, same answer - no hidden counter
        assert_eq!(frame_at(1000, 200, 3), frame_at(1000, 200, 3));

        // Walks the sequence as time advances
        assert_eq!(frame_at(0, 200, 3), 0);
        assert_eq!(frame_at(199, 200, 3), 0);
        assert_eq!(frame_at(200, 200, 3), 1);
        assert_eq!(frame_at(400, 200, 3), 2);
        assert_eq!(frame_at(600, 200, 3), 0, "wraps after a full cycle");
    }

    #[test]
    fn frame_index_guards_degenerate_inputs() {
        assert_eq!(frame_at(12345, 0, 3), 0, "zero delay means static frame");
        assert_eq!(frame_at(12345, 100, 0), 0, "zero frames must not divide");
    }

    #[test]
    fn first_fetch_is_due_immediately() {
        let cooldown = FetchCooldown::new(300_000);
        assert!(cooldown.due(0), "no prior attempt means due");
    }

    #[test]
    fn cooldown_blocks_until_interval_elapses() {
        let mut cooldown = FetchCooldown::new(1000);
        cooldown.record_attempt(500);
        assert!(!cooldown.due(1000));
        assert!(!cooldown.due(1499));
        assert!(cooldown.due(1500), "due exactly at the interval boundary");
    }

    #[test]
    fn failed_attempts_still_consume_the_interval() {
        // The caller records the attempt whether or not the fetch worked;
        // a dead provider is probed once per interval, not per tick.
        let mut cooldown = FetchCooldown::new(1000);
        cooldown.record_attempt(100);
        cooldown.record_attempt(200);
        assert!(!cooldown.due(1100), "interval restarts from the newest attempt");
        assert!(cooldown.due(1200));
    }

    #[test]
    fn clock_regression_does_not_panic() {
        let mut cooldown = FetchCooldown::new(1000);
        cooldown.record_attempt(5000);
        // now earlier than last attempt: treated as not due, no underflow
        assert!(!cooldown.due(4000));
    }
}
