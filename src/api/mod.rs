pub mod http;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::RaceError;

pub use http::HttpRaceApi;

pub type TrackId = u32;
pub type RacerId = u32;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Track {
    pub id: TrackId,
    pub name: String,
    /// Segment layout as reported by the race service
    #[serde(default)]
    pub segments: Vec<u32>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Racer {
    pub id: RacerId,
    pub driver_name: String,
    #[serde(default)]
    pub top_speed: u32,
    #[serde(default)]
    pub acceleration: u32,
    #[serde(default)]
    pub handling: u32,
}

/// Identifier of a created race.
///
/// The race service decides what an id looks like; it is kept exactly as
/// received and handed back unchanged on every follow-up call.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum RaceId {
    Number(u64),
    Text(String),
}

impl fmt::Display for RaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RaceId::Number(n) => write!(f, "{n}"),
            RaceId::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for RaceId {
    fn from(value: u64) -> Self {
        RaceId::Number(value)
    }
}

/// Response of the race creation call.
///
/// The service has used both `ID` and `id` for the identifier field. When a
/// body carries both, `ID` wins; a body with neither is rejected.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "CreatedRaceBody")]
pub struct CreatedRace {
    pub id: RaceId,
}

#[derive(Deserialize)]
struct CreatedRaceBody {
    #[serde(rename = "ID")]
    upper: Option<RaceId>,
    id: Option<RaceId>,
}

impl TryFrom<CreatedRaceBody> for CreatedRace {
    type Error = String;

    fn try_from(body: CreatedRaceBody) -> Result<Self, Self::Error> {
        body.upper
            .or(body.id)
            .map(|id| CreatedRace { id })
            .ok_or_else(|| "created race has no `ID` or `id` field".to_string())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RaceStatus {
    #[serde(alias = "unstarted")]
    Pending,
    InProgress,
    Finished,
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub id: RacerId,
    pub driver_name: String,
    /// Track segment the racer has reached
    #[serde(default)]
    pub segment: u32,
    /// Rank once the race is finished, 1 is the winner
    #[serde(default)]
    pub final_position: Option<u32>,
    #[serde(default)]
    pub speed: Option<f32>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RaceSnapshot {
    pub status: RaceStatus,
    #[serde(default)]
    pub positions: Vec<Position>,
}

/// The calls the controller makes against the race service.
///
/// Every call either resolves with a parsed response or fails with
/// [`RaceError::ApiCallFailed`]; implementations do not retry.
#[async_trait]
pub trait RaceApi: Send + Sync {
    async fn list_tracks(&self) -> Result<Vec<Track>, RaceError>;

    async fn list_racers(&self) -> Result<Vec<Racer>, RaceError>;

    async fn create_race(
        &self,
        racer_id: RacerId,
        track_id: TrackId,
    ) -> Result<CreatedRace, RaceError>;

    async fn start_race(&self, race_id: &RaceId) -> Result<(), RaceError>;

    async fn race_status(&self, race_id: &RaceId) -> Result<RaceSnapshot, RaceError>;

    /// Fire-and-forget input event; the response body is ignored.
    async fn accelerate(&self, race_id: &RaceId) -> Result<(), RaceError>;
}
