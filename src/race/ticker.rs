//! Cancellable periodic timers for the countdown and polling phases.
//!
//! A [`Timers`] registry hands out [`Ticker`]s and refuses to start a second
//! one while another is live, so the countdown and poll timers can never
//! overlap. A ticker is released by [`Ticker::stop`] (idempotent), by being
//! dropped, or by the registry's cancel token.

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use log::debug;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::RaceError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerKind {
    Countdown,
    Poll,
}

impl fmt::Display for TimerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerKind::Countdown => f.write_str("countdown"),
            TimerKind::Poll => f.write_str("poll"),
        }
    }
}

type ActiveSlot = Arc<Mutex<Option<TimerKind>>>;

fn lock(slot: &ActiveSlot) -> MutexGuard<'_, Option<TimerKind>> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Clone, Debug, Default)]
pub struct Timers {
    active: ActiveSlot,
    cancel: CancellationToken,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a ticker whose first tick fires one `period` from now.
    pub fn start(&self, kind: TimerKind, period: Duration) -> Result<Ticker, RaceError> {
        let mut active = lock(&self.active);
        if let Some(active_kind) = *active {
            return Err(RaceError::OverlappingTimers {
                active: active_kind,
                requested: kind,
            });
        }
        *active = Some(kind);
        debug!("Started {kind} timer, period {period:?}");

        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Ok(Ticker {
            kind,
            interval,
            token: self.cancel.child_token(),
            active: self.active.clone(),
            stopped: false,
        })
    }

    /// The kind of the ticker that is currently live, if any.
    pub fn active(&self) -> Option<TimerKind> {
        *lock(&self.active)
    }

    /// Token that stops the live ticker, and every later one, when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

#[derive(Debug)]
pub struct Ticker {
    kind: TimerKind,
    interval: Interval,
    token: CancellationToken,
    active: ActiveSlot,
    stopped: bool,
}

impl Ticker {
    pub fn kind(&self) -> TimerKind {
        self.kind
    }

    /// Waits for the next tick. Returns `false` once the ticker is stopped or
    /// cancelled; a stopped ticker never ticks again.
    pub async fn tick(&mut self) -> bool {
        if self.stopped {
            return false;
        }
        let cancelled = tokio::select! {
            biased;
            _ = self.token.cancelled() => true,
            _ = self.interval.tick() => false,
        };
        if cancelled {
            debug!("{} timer cancelled", self.kind);
            self.stop();
            return false;
        }
        true
    }

    /// Stops the ticker and releases its slot in the registry. Returns
    /// whether this call did the stopping.
    pub fn stop(&mut self) -> bool {
        if self.stopped {
            return false;
        }
        self.stopped = true;
        self.token.cancel();
        let mut active = lock(&self.active);
        if *active == Some(self.kind) {
            *active = None;
        }
        debug!("Stopped {} timer", self.kind);
        true
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}
