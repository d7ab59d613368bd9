// Error types for podrace

use snafu::Snafu;
use std::io;

use crate::race::ticker::TimerKind;

#[derive(Debug, Snafu)]
pub enum RaceError {
    // Session state errors
    #[snafu(display("Precondition violated: {what}"))]
    PreconditionViolated { what: String },
    #[snafu(display("Invalid {kind} selection: {id}"))]
    InvalidSelection { kind: String, id: u32 },
    #[snafu(display("Race id already recorded for this session: {existing}"))]
    DuplicateRaceId { existing: String },

    // Errors talking to the race service
    #[snafu(display("Race service call {operation} failed: {reason}"))]
    ApiCallFailed { operation: String, reason: String },
    #[snafu(display("Transient failure while polling race status: {reason}"))]
    TransientPollFailure { reason: String },
    #[snafu(display("Gave up polling race status after {failures} consecutive failures"))]
    PollFailureLimitExceeded { failures: u32 },
    #[snafu(display("Could not build HTTP client"))]
    HttpClientError { source: reqwest::Error },

    // Timer errors
    #[snafu(display("Cannot start {requested} timer while {active} timer is still running"))]
    OverlappingTimers {
        active: TimerKind,
        requested: TimerKind,
    },
    #[snafu(display("Race session cancelled"))]
    Cancelled,

    // Config management errors
    #[snafu(display("Could not find application data directory to save config file"))]
    NoConfigDir,
    #[snafu(display("Error reading or writing config file"))]
    ConfigIOError { source: io::Error },
    #[snafu(display("Error serializing config file"))]
    ConfigSerializeError { source: serde_json::Error },
}

impl RaceError {
    pub(crate) fn precondition(what: impl Into<String>) -> Self {
        RaceError::PreconditionViolated { what: what.into() }
    }

    pub(crate) fn api(operation: &str, reason: impl ToString) -> Self {
        RaceError::ApiCallFailed {
            operation: operation.to_string(),
            reason: reason.to_string(),
        }
    }
}
