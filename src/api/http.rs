use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Response};
use serde::{Serialize, de::DeserializeOwned};

use crate::RaceError;

use super::{CreatedRace, RaceApi, RaceId, RaceSnapshot, Racer, RacerId, Track, TrackId};

#[derive(Serialize)]
struct CreateRaceBody {
    player_id: RacerId,
    track_id: TrackId,
}

/// [`RaceApi`] over the race service's JSON HTTP endpoints.
pub struct HttpRaceApi {
    client: Client,
    server_url: String,
}

impl HttpRaceApi {
    pub fn new(server_url: &str) -> Result<Self, RaceError> {
        let client = Client::builder()
            .build()
            .map_err(|e| RaceError::HttpClientError { source: e })?;
        Ok(Self {
            client,
            server_url: server_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.server_url, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
    ) -> Result<T, RaceError> {
        let url = self.url(path);
        debug!("GET {url}");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RaceError::api(operation, e))?;
        decode(operation, response).await
    }

    async fn post(&self, operation: &str, path: &str) -> Result<Response, RaceError> {
        let url = self.url(path);
        debug!("POST {url}");
        let response = self
            .client
            .post(&url)
            .send()
            .await
            .map_err(|e| RaceError::api(operation, e))?;
        check_status(operation, response)
    }
}

fn check_status(operation: &str, response: Response) -> Result<Response, RaceError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(RaceError::api(operation, format!("HTTP {status}")))
    }
}

async fn decode<T: DeserializeOwned>(operation: &str, response: Response) -> Result<T, RaceError> {
    check_status(operation, response)?
        .json::<T>()
        .await
        .map_err(|e| RaceError::api(operation, e))
}

#[async_trait]
impl RaceApi for HttpRaceApi {
    async fn list_tracks(&self) -> Result<Vec<Track>, RaceError> {
        self.get_json("list_tracks", "tracks").await
    }

    async fn list_racers(&self) -> Result<Vec<Racer>, RaceError> {
        self.get_json("list_racers", "cars").await
    }

    async fn create_race(
        &self,
        racer_id: RacerId,
        track_id: TrackId,
    ) -> Result<CreatedRace, RaceError> {
        let url = self.url("races");
        debug!("POST {url} player_id={racer_id} track_id={track_id}");
        let response = self
            .client
            .post(&url)
            .json(&CreateRaceBody {
                player_id: racer_id,
                track_id,
            })
            .send()
            .await
            .map_err(|e| RaceError::api("create_race", e))?;
        decode("create_race", response).await
    }

    async fn start_race(&self, race_id: &RaceId) -> Result<(), RaceError> {
        self.post("start_race", &format!("races/{race_id}/start"))
            .await
            .map(|_| ())
    }

    async fn race_status(&self, race_id: &RaceId) -> Result<RaceSnapshot, RaceError> {
        self.get_json("race_status", &format!("races/{race_id}"))
            .await
    }

    async fn accelerate(&self, race_id: &RaceId) -> Result<(), RaceError> {
        self.post("accelerate", &format!("races/{race_id}/accelerate"))
            .await
            .map(|_| ())
    }
}
