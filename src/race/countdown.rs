use std::time::Duration;

use log::debug;

use crate::RaceError;
use crate::render::{Mount, Renderer, View};

use super::ticker::{TimerKind, Timers};

/// Counts down from `start`, one step per `tick`, rendering the remaining
/// count after every step. Purely local: no calls to the race service.
pub(crate) async fn run_countdown<R: Renderer + ?Sized>(
    timers: &Timers,
    renderer: &R,
    start: u32,
    tick: Duration,
) -> Result<(), RaceError> {
    let mut ticker = timers.start(TimerKind::Countdown, tick)?;
    let mut remaining = start;

    while remaining > 0 {
        if !ticker.tick().await {
            return Err(RaceError::Cancelled);
        }
        remaining -= 1;
        debug!("Countdown {remaining}");
        renderer.render_at(Mount::BigNumbers, &View::Countdown(remaining));
    }

    ticker.stop();
    Ok(())
}
