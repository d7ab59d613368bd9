// Scripted race service and recording renderer for unit tests

use std::{collections::VecDeque, sync::Mutex, time::Duration};

use async_trait::async_trait;

use crate::RaceError;
use crate::api::{
    CreatedRace, Position, RaceApi, RaceId, RaceSnapshot, RaceStatus, Racer, RacerId, Track,
    TrackId,
};
use crate::render::{Mount, Renderer, View};

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Call {
    ListTracks,
    ListRacers,
    CreateRace { racer_id: RacerId, track_id: TrackId },
    StartRace(RaceId),
    RaceStatus(RaceId),
    Accelerate(RaceId),
}

pub(crate) fn position(id: RacerId, segment: u32, final_position: Option<u32>) -> Position {
    Position {
        id,
        driver_name: format!("Racer {id}"),
        segment,
        final_position,
        speed: None,
    }
}

pub(crate) fn snapshot(status: RaceStatus, positions: Vec<Position>) -> RaceSnapshot {
    RaceSnapshot { status, positions }
}

/// Answers every call from a script. Status responses are consumed in order;
/// once the script runs out every status call fails.
pub(crate) struct ScriptedApi {
    pub tracks: Vec<Track>,
    pub racers: Vec<Racer>,
    created: Result<RaceId, String>,
    start_error: Option<String>,
    accelerate_fails: bool,
    accelerate_delay: Option<Duration>,
    statuses: Mutex<VecDeque<Result<RaceSnapshot, String>>>,
    calls: Mutex<Vec<Call>>,
}

impl Default for ScriptedApi {
    fn default() -> Self {
        Self {
            tracks: Vec::new(),
            racers: Vec::new(),
            created: Ok(RaceId::Number(1)),
            start_error: None,
            accelerate_fails: false,
            accelerate_delay: None,
            statuses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedApi {
    pub fn with_created(mut self, created: Result<RaceId, String>) -> Self {
        self.created = created;
        self
    }

    pub fn failing_start(mut self, reason: &str) -> Self {
        self.start_error = Some(reason.to_string());
        self
    }

    pub fn failing_accelerate(mut self) -> Self {
        self.accelerate_fails = true;
        self
    }

    pub fn slow_accelerate(mut self, delay: Duration) -> Self {
        self.accelerate_delay = Some(delay);
        self
    }

    pub fn with_status(self, status: Result<RaceSnapshot, String>) -> Self {
        self.statuses.lock().unwrap().push_back(status);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn status_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::RaceStatus(_)))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl RaceApi for ScriptedApi {
    async fn list_tracks(&self) -> Result<Vec<Track>, RaceError> {
        self.record(Call::ListTracks);
        Ok(self.tracks.clone())
    }

    async fn list_racers(&self) -> Result<Vec<Racer>, RaceError> {
        self.record(Call::ListRacers);
        Ok(self.racers.clone())
    }

    async fn create_race(
        &self,
        racer_id: RacerId,
        track_id: TrackId,
    ) -> Result<CreatedRace, RaceError> {
        self.record(Call::CreateRace { racer_id, track_id });
        match &self.created {
            Ok(id) => Ok(CreatedRace { id: id.clone() }),
            Err(reason) => Err(RaceError::api("create_race", reason)),
        }
    }

    async fn start_race(&self, race_id: &RaceId) -> Result<(), RaceError> {
        self.record(Call::StartRace(race_id.clone()));
        match &self.start_error {
            Some(reason) => Err(RaceError::api("start_race", reason)),
            None => Ok(()),
        }
    }

    async fn race_status(&self, race_id: &RaceId) -> Result<RaceSnapshot, RaceError> {
        self.record(Call::RaceStatus(race_id.clone()));
        match self.statuses.lock().unwrap().pop_front() {
            Some(Ok(snapshot)) => Ok(snapshot),
            Some(Err(reason)) => Err(RaceError::api("race_status", reason)),
            None => Err(RaceError::api("race_status", "script exhausted")),
        }
    }

    async fn accelerate(&self, race_id: &RaceId) -> Result<(), RaceError> {
        self.record(Call::Accelerate(race_id.clone()));
        if let Some(delay) = self.accelerate_delay {
            tokio::time::sleep(delay).await;
        }
        if self.accelerate_fails {
            Err(RaceError::api("accelerate", "rejected"))
        } else {
            Ok(())
        }
    }
}

#[derive(Default)]
pub(crate) struct RecordingRenderer {
    renders: Mutex<Vec<(Mount, View)>>,
}

impl RecordingRenderer {
    pub fn renders(&self) -> Vec<(Mount, View)> {
        self.renders.lock().unwrap().clone()
    }

    pub fn views_at(&self, mount: Mount) -> Vec<View> {
        self.renders()
            .into_iter()
            .filter(|(m, _)| *m == mount)
            .map(|(_, v)| v)
            .collect()
    }
}

impl Renderer for RecordingRenderer {
    fn render_at(&self, mount: Mount, view: &View) {
        self.renders.lock().unwrap().push((mount, view.clone()));
    }
}
