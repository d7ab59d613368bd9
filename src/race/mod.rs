pub mod controller;
pub(crate) mod countdown;
pub(crate) mod poll;
pub mod ticker;

#[cfg(test)]
pub(crate) mod test_support;

use std::fmt;

use tokio::sync::mpsc::UnboundedSender;

pub use controller::RaceSessionController;

/// Where a race session is in its lifecycle. `Finished` and `Failed` are
/// terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RacePhase {
    Idle,
    Created,
    CountingDown,
    Started,
    Polling,
    Finished,
    Failed,
}

impl RacePhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RacePhase::Finished | RacePhase::Failed)
    }
}

impl fmt::Display for RacePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RacePhase::Idle => "idle",
            RacePhase::Created => "created",
            RacePhase::CountingDown => "counting down",
            RacePhase::Started => "started",
            RacePhase::Polling => "polling",
            RacePhase::Finished => "finished",
            RacePhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerInput {
    Accelerate,
}

/// Delivers player input to a running session. Only presses that arrive
/// while the race is being polled reach the race service.
#[derive(Clone, Debug)]
pub struct InputSender {
    tx: UnboundedSender<PlayerInput>,
}

impl InputSender {
    /// Returns `false` once the session is gone.
    pub fn accelerate(&self) -> bool {
        self.tx.send(PlayerInput::Accelerate).is_ok()
    }
}
