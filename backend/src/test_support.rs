//! Test doubles shared by unit tests (in `src/`) and integration tests (in
//! `tests/`). Compiled for `cfg(test)` and the `test-support` feature only.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;

use crate::domain::{BackoffJitter, RoomCode, RoomCodeGenerator, Sleeper};

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Clock whose current time only moves when a test says so.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    /// Start the clock at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    /// Move the clock forward.
    ///
    /// # Panics
    ///
    /// Panics when `delta` does not fit a [`TimeDelta`].
    pub fn advance(&self, delta: Duration) {
        let delta = match TimeDelta::from_std(delta) {
            Ok(delta) => delta,
            Err(error) => panic!("duration out of range for TimeDelta: {error}; delta={delta:?}"),
        };
        *lock(&self.0) += delta;
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *lock(&self.0)
    }
}

/// Sleeper that returns at once.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateSleeper;

#[async_trait]
impl Sleeper for ImmediateSleeper {
    async fn sleep(&self, _duration: Duration) {}
}

/// Sleeper that records requested delays and returns at once.
#[derive(Debug, Default)]
pub struct RecordingSleeper(Mutex<Vec<Duration>>);

impl RecordingSleeper {
    /// Delays requested so far, in order.
    pub fn delays(&self) -> Vec<Duration> {
        lock(&self.0).clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        lock(&self.0).push(duration);
    }
}

/// Jitter that returns the base delay unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl BackoffJitter for NoJitter {
    fn jittered_delay(&self, base: Duration, _attempt: u32, _now: DateTime<Utc>) -> Duration {
        base
    }
}

/// Room code generator that hands out a scripted sequence of codes.
///
/// Once the script runs out it repeats the last code.
#[derive(Debug)]
pub struct ScriptedRoomCodes {
    queue: Mutex<VecDeque<RoomCode>>,
    last: Mutex<RoomCode>,
}

impl ScriptedRoomCodes {
    /// Script the given codes.
    ///
    /// # Panics
    ///
    /// Panics when `codes` is empty or any code is malformed.
    pub fn new<'a>(codes: impl IntoIterator<Item = &'a str>) -> Self {
        let queue: VecDeque<RoomCode> = codes
            .into_iter()
            .map(|raw| match RoomCode::parse(raw) {
                Ok(code) => code,
                Err(err) => panic!("scripted room code {raw:?} is invalid: {err}"),
            })
            .collect();
        let Some(first) = queue.front().cloned() else {
            panic!("scripted room codes must not be empty");
        };
        Self {
            queue: Mutex::new(queue),
            last: Mutex::new(first),
        }
    }
}

impl RoomCodeGenerator for ScriptedRoomCodes {
    fn next_code(&self) -> RoomCode {
        let mut last = lock(&self.last);
        if let Some(code) = lock(&self.queue).pop_front() {
            *last = code;
        }
        last.clone()
    }
}
