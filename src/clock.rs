use chrono::{Duration, Utc};

use crate::models::{truncate_to_millis, TaskId, Timestamp};

pub trait Clock {
    fn now(&self) -> Timestamp;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        truncate_to_millis(Utc::now())
    }
}

const OVERFLOW_PREFIX: &str = "overflow-";

/// Returns `now`, or one millisecond past `previous` when the clock has not moved beyond it.
pub fn stamp_after(now: Timestamp, previous: Timestamp) -> Timestamp {
    if now > previous {
        return now;
    }
    previous
        .checked_add_signed(Duration::milliseconds(1))
        .unwrap_or(now)
}

/// Hands out numeric ids derived from the creation time.
///
/// Ids stay strictly increasing even when several tasks are created within the
/// same millisecond or the wall clock steps backwards. Once the numeric range is
/// used up, ids fall back to text of the form `overflow-<n>`.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    last: i64,
    overflowed: u64,
}

impl IdGenerator {
    /// Starts above every id already in use, numeric or `overflow-<n>`.
    pub fn seeded<'a>(existing: impl IntoIterator<Item = &'a TaskId>) -> Self {
        let mut ids = Self::default();
        for id in existing {
            match id {
                TaskId::Number(n) => ids.last = ids.last.max(*n),
                TaskId::Text(text) => {
                    if let Some(n) = text
                        .strip_prefix(OVERFLOW_PREFIX)
                        .and_then(|rest| rest.parse::<u64>().ok())
                    {
                        ids.overflowed = ids.overflowed.max(n);
                    }
                }
            }
        }
        ids
    }

    pub fn next_id(&mut self, now: Timestamp) -> TaskId {
        let candidate = now.timestamp_millis();
        if candidate > self.last {
            self.last = candidate;
            return TaskId::Number(candidate);
        }
        match self.last.checked_add(1) {
            Some(next) => {
                self.last = next;
                TaskId::Number(next)
            }
            None => {
                self.overflowed = self.overflowed.saturating_add(1);
                log::warn!("ids: numeric range exhausted, issuing text id");
                TaskId::Text(format!("{OVERFLOW_PREFIX}{}", self.overflowed))
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::cell::Cell;

    use chrono::{DateTime, Duration};

    use super::Clock;
    use crate::models::Timestamp;

    /// Advances by a fixed step on every reading.
    pub struct StepClock {
        next: Cell<Timestamp>,
        step: Duration,
    }

    impl StepClock {
        pub fn starting_at(millis: i64) -> Self {
            Self::with_step(millis, Duration::seconds(1))
        }

        pub fn with_step(millis: i64, step: Duration) -> Self {
            Self {
                next: Cell::new(DateTime::from_timestamp_millis(millis).unwrap()),
                step,
            }
        }
    }

    impl Clock for StepClock {
        fn now(&self) -> Timestamp {
            let current = self.next.get();
            self.next.set(current + self.step);
            current
        }
    }
}
