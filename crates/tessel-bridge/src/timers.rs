//! Timers
//!
//! Timeouts and intervals against a clock the host advances explicitly.
//! Firing only reports tokens; nothing here touches the document or arena.

use std::collections::HashMap;
use std::time::Duration;

/// Cancellation token for a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerToken(pub u32);

#[derive(Debug, Clone)]
struct Timer {
    deadline: Duration,
    /// Period for intervals
    repeat: Option<Duration>,
}

/// Pending timers
#[derive(Debug, Default)]
pub struct TimerQueue {
    timers: HashMap<TimerToken, Timer>,
    next_token: u32,
    now: Duration,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn schedule(&mut self, delay: Duration, repeat: Option<Duration>) -> TimerToken {
        self.next_token = self.next_token.wrapping_add(1);
        let token = TimerToken(self.next_token);
        // Delays past the end of the clock saturate
        let deadline = self.now.saturating_add(delay);
        self.timers.insert(token, Timer { deadline, repeat });
        token
    }

    /// Fire once after `delay`
    pub fn set_timeout(&mut self, delay: Duration) -> TimerToken {
        self.schedule(delay, None)
    }

    /// Fire every `period` (at least 1ms)
    pub fn set_interval(&mut self, period: Duration) -> TimerToken {
        let period = period.max(Duration::from_millis(1));
        self.schedule(period, Some(period))
    }

    /// Cancel a timer; returns whether it was pending
    pub fn clear(&mut self, token: TimerToken) -> bool {
        self.timers.remove(&token).is_some()
    }

    pub fn has_pending(&self) -> bool {
        !self.timers.is_empty()
    }

    /// Current clock reading
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Time until the earliest deadline
    pub fn time_until_next(&self) -> Option<Duration> {
        self.timers.values()
            .map(|t| t.deadline.saturating_sub(self.now))
            .min()
    }

    /// Move the clock to `now` and collect due timers.
    ///
    /// Tokens come back in deadline order, ties broken by token. Timeouts are
    /// removed; intervals are rescheduled and fire at most once per call.
    pub fn advance(&mut self, now: Duration) -> Vec<TimerToken> {
        self.now = self.now.max(now);
        let mut due: Vec<(Duration, TimerToken)> = self.timers.iter()
            .filter(|(_, t)| t.deadline <= self.now)
            .map(|(&token, t)| (t.deadline, token))
            .collect();
        due.sort_unstable();

        for &(_, token) in &due {
            let Some(timer) = self.timers.get_mut(&token) else { continue };
            match timer.repeat {
                Some(period) => {
                    let mut next = timer.deadline.saturating_add(period);
                    if next <= self.now {
                        next = self.now.saturating_add(period);
                    }
                    timer.deadline = next;
                }
                None => {
                    self.timers.remove(&token);
                }
            }
        }
        due.into_iter().map(|(_, token)| token).collect()
    }
}
