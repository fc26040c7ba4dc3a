use std::thread;
use std::time::Duration;

/// Fixed-interval polling with an optional attempt budget.
///
/// `max_attempts: None` is the unbounded wait used for job completion: the
/// runtime of a workload is not known ahead of time, so that stage polls until
/// the cluster reports a terminal state or the process is killed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: Option<u32>,
}

impl PollPolicy {
    pub fn bounded(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts: Some(max_attempts),
        }
    }

    pub fn unbounded(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
        }
    }

    /// Calls `check` until it yields a value, sleeping `interval` after each miss.
    ///
    /// The check receives the zero-based attempt number. Returns `None` once the
    /// attempt budget is spent; an unbounded policy only returns `Some`.
    pub fn poll_until<T, F>(&self, mut check: F) -> Option<T>
    where
        F: FnMut(u32) -> Option<T>,
    {
        let mut attempt: u32 = 0;
        loop {
            if let Some(max) = self.max_attempts {
                if attempt >= max {
                    return None;
                }
            }
            if let Some(value) = check(attempt) {
                return Some(value);
            }
            thread::sleep(self.interval);
            attempt = attempt.saturating_add(1);
        }
    }

    /// `poll_until` for yes/no checks.
    pub fn poll_until_true<F>(&self, mut check: F) -> bool
    where
        F: FnMut(u32) -> bool,
    {
        self.poll_until(|attempt| check(attempt).then_some(())).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn bounded_policy_stops_after_max_attempts() {
        let policy = PollPolicy::bounded(Duration::ZERO, 60);
        let mut calls = 0;
        let result: Option<()> = policy.poll_until(|_| {
            calls += 1;
            None
        });
        assert!(result.is_none());
        assert_eq!(calls, 60);
    }

    #[test]
    fn bounded_policy_returns_first_hit() {
        let policy = PollPolicy::bounded(Duration::ZERO, 10);
        let mut seen = Vec::new();
        let result = policy.poll_until(|attempt| {
            seen.push(attempt);
            (attempt == 3).then_some("job-1")
        });
        assert_eq!(result, Some("job-1"));
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }

    #[test]
    fn zero_budget_never_checks() {
        let policy = PollPolicy::bounded(Duration::ZERO, 0);
        assert!(!policy.poll_until_true(|_| panic!("check must not run")));
    }

    #[test]
    fn unbounded_policy_keeps_polling_past_bounded_budgets() {
        let policy = PollPolicy::unbounded(Duration::ZERO);
        let mut calls = 0;
        assert!(policy.poll_until_true(|_| {
            calls += 1;
            calls == 500
        }));
        assert_eq!(calls, 500);
    }

    #[test]
    fn exhausted_budget_sleeps_after_every_miss() {
        let policy = PollPolicy::bounded(Duration::from_millis(20), 3);
        let started = Instant::now();
        assert!(!policy.poll_until_true(|_| false));
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(60), "returned after {:?}", elapsed);
    }
}
