use std::sync::Arc;

use log::{debug, error, info};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

use crate::RaceError;
use crate::api::{RaceApi, RaceSnapshot, RacerId, TrackId};
use crate::config::AppConfig;
use crate::render::{Mount, Renderer, View};
use crate::session::{SelectionChange, SelectionCoordinator, SessionStore};

use super::countdown::run_countdown;
use super::poll::{PollSettings, poll_until_finished};
use super::ticker::Timers;
use super::{InputSender, PlayerInput, RacePhase};

/// Drives one race session: create → countdown → start → poll → finished.
///
/// The controller owns the session's [`SessionStore`] and the timers of the
/// countdown and poll phases. A session runs at most once; once it reaches a
/// terminal phase no further calls are made for it.
pub struct RaceSessionController<A: RaceApi + ?Sized + 'static, R: Renderer> {
    api: Arc<A>,
    renderer: R,
    config: AppConfig,
    store: SessionStore,
    phase: RacePhase,
    timers: Timers,
    input_tx: UnboundedSender<PlayerInput>,
    input_rx: UnboundedReceiver<PlayerInput>,
}

impl<A: RaceApi + ?Sized + 'static, R: Renderer> RaceSessionController<A, R> {
    pub fn new(api: Arc<A>, renderer: R, config: AppConfig, store: SessionStore) -> Self {
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        Self {
            api,
            renderer,
            config,
            store,
            phase: RacePhase::Idle,
            timers: Timers::new(),
            input_tx,
            input_rx,
        }
    }

    /// Fetches the tracks and racers for a fresh session and shows them.
    pub async fn load(api: Arc<A>, renderer: R, config: AppConfig) -> Result<Self, RaceError> {
        let tracks = api.list_tracks().await?;
        renderer.render_at(
            Mount::Tracks,
            &View::TrackCards {
                tracks: tracks.clone(),
                selected: None,
            },
        );

        let racers = api.list_racers().await?;
        renderer.render_at(
            Mount::Racers,
            &View::RacerCards {
                racers: racers.clone(),
                selected: None,
            },
        );

        info!("Loaded {} tracks and {} racers", tracks.len(), racers.len());
        Ok(Self::new(
            api,
            renderer,
            config,
            SessionStore::new(tracks, racers),
        ))
    }

    pub fn phase(&self) -> RacePhase {
        self.phase
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn has_live_timer(&self) -> bool {
        self.timers.active().is_some()
    }

    pub fn input_sender(&self) -> InputSender {
        InputSender {
            tx: self.input_tx.clone(),
        }
    }

    /// Cancelling this token stops the running countdown or poll timer and
    /// fails the session.
    pub fn cancel_token(&self) -> CancellationToken {
        self.timers.cancel_token()
    }

    pub fn select_track(&mut self, id: TrackId) -> Result<SelectionChange, RaceError> {
        SelectionCoordinator::new(&self.renderer).select_track(&mut self.store, id)
    }

    pub fn select_racer(&mut self, id: RacerId) -> Result<SelectionChange, RaceError> {
        SelectionCoordinator::new(&self.renderer).select_racer(&mut self.store, id)
    }

    /// Sends one accelerate press for this session's race.
    pub async fn accelerate(&self) -> Result<(), RaceError> {
        let race_id = self.store.race_id()?;
        self.api.accelerate(race_id).await
    }

    /// Runs the whole session and returns the final race snapshot.
    ///
    /// Requires both a track and a racer to be selected. Creation and start
    /// are tried once; only polling tolerates a bounded number of consecutive
    /// failures. Any failure leaves the session in [`RacePhase::Failed`].
    pub async fn create_and_run_race(&mut self) -> Result<RaceSnapshot, RaceError> {
        if self.phase != RacePhase::Idle {
            return Err(RaceError::precondition(format!(
                "race session already {}",
                self.phase
            )));
        }
        let track = self.store.selected_track()?.clone();
        let racer_id = self.store.selected_racer()?.id;

        self.renderer.render_at(
            Mount::Race,
            &View::RaceStart {
                track_name: track.name.clone(),
                countdown: self.config.countdown_start,
            },
        );

        let created = self.api.create_race(racer_id, track.id).await;
        let created = self.check(created)?;
        let recorded = self.store.record_race_id(created.id);
        self.check(recorded)?;
        let race_id = self.store.race_id()?.clone();
        self.transition(RacePhase::Created);
        info!("Created race {race_id} on {} for racer {racer_id}", track.name);

        self.transition(RacePhase::CountingDown);
        let countdown = run_countdown(
            &self.timers,
            &self.renderer,
            self.config.countdown_start,
            self.config.countdown_tick(),
        )
        .await;
        self.check(countdown)?;

        self.transition(RacePhase::Started);
        let started = self.api.start_race(&race_id).await;
        self.check(started)?;

        self.transition(RacePhase::Polling);
        self.discard_early_inputs();
        let settings = PollSettings {
            interval: self.config.poll_interval(),
            max_consecutive_failures: self.config.max_consecutive_poll_failures,
        };
        let finished = poll_until_finished(
            &self.api,
            &self.renderer,
            &self.timers,
            &race_id,
            racer_id,
            &settings,
            &mut self.input_rx,
        )
        .await;
        let finished = self.check(finished)?;

        self.transition(RacePhase::Finished);
        info!("Race {race_id} finished");
        Ok(finished)
    }

    fn transition(&mut self, next: RacePhase) {
        debug!("Race session {} -> {}", self.phase, next);
        self.phase = next;
    }

    /// Passes `Ok` through; on error moves the session to `Failed` and shows
    /// the failure.
    fn check<T>(&mut self, result: Result<T, RaceError>) -> Result<T, RaceError> {
        result.map_err(|e| self.fail(e))
    }

    fn fail(&mut self, e: RaceError) -> RaceError {
        if let Some(kind) = self.timers.active() {
            error!("{kind} timer still live while failing race session");
        }
        error!("Race session failed while {}: {e}", self.phase);
        self.transition(RacePhase::Failed);
        self.renderer.render_at(
            Mount::Race,
            &View::Failure {
                reason: e.to_string(),
            },
        );
        e
    }

    fn discard_early_inputs(&mut self) {
        let mut discarded = 0;
        while self.input_rx.try_recv().is_ok() {
            discarded += 1;
        }
        if discarded > 0 {
            debug!("Discarded {discarded} inputs received before the race started");
        }
    }
}
