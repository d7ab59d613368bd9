use std::{sync::Arc, time::Duration};

use log::{error, warn};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinSet;

use crate::RaceError;
use crate::api::{RaceApi, RaceId, RaceSnapshot, RaceStatus, RacerId};
use crate::render::{Mount, Renderer, View, standings};

use super::PlayerInput;
use super::ticker::{TimerKind, Timers};

pub(crate) struct PollSettings {
    pub interval: Duration,
    pub max_consecutive_failures: u32,
}

enum Wake {
    Tick,
    Input(PlayerInput),
    PressSettled,
    Cancelled,
}

/// Polls the race status every `settings.interval` until the race is
/// finished, rendering the leaderboard along the way.
///
/// Any status other than `in-progress` or `finished`, and any failed call,
/// counts as a transient failure; reaching `max_consecutive_failures` in a
/// row stops the timer and gives up.
///
/// Accelerate presses arriving on `inputs` run as their own tasks so a slow
/// press never holds up a poll. Presses still in flight when polling ends are
/// aborted.
pub(crate) async fn poll_until_finished<A, R>(
    api: &Arc<A>,
    renderer: &R,
    timers: &Timers,
    race_id: &RaceId,
    local_racer: RacerId,
    settings: &PollSettings,
    inputs: &mut UnboundedReceiver<PlayerInput>,
) -> Result<RaceSnapshot, RaceError>
where
    A: RaceApi + ?Sized + 'static,
    R: Renderer + ?Sized,
{
    let max_failures = settings.max_consecutive_failures.max(1);
    let mut ticker = timers.start(TimerKind::Poll, settings.interval)?;
    let mut presses = JoinSet::new();
    let mut failures = 0u32;

    loop {
        let wake = tokio::select! {
            biased;
            fired = ticker.tick() => if fired { Wake::Tick } else { Wake::Cancelled },
            Some(input) = inputs.recv() => Wake::Input(input),
            Some(_) = presses.join_next() => Wake::PressSettled,
        };

        let failure = match wake {
            Wake::Cancelled => return Err(RaceError::Cancelled),
            Wake::PressSettled => continue,
            Wake::Input(PlayerInput::Accelerate) => {
                let api = Arc::clone(api);
                let race_id = race_id.clone();
                presses.spawn(async move {
                    if let Err(e) = api.accelerate(&race_id).await {
                        warn!("Accelerate for race {race_id} failed: {e}");
                    }
                });
                continue;
            }
            Wake::Tick => match api.race_status(race_id).await {
                Ok(snapshot) => match snapshot.status {
                    RaceStatus::Finished => {
                        ticker.stop();
                        let results = standings::results(&snapshot.positions, Some(local_racer));
                        renderer.render_at(Mount::Race, &View::Results(results));
                        return Ok(snapshot);
                    }
                    RaceStatus::InProgress => {
                        failures = 0;
                        let board = standings::leaderboard(&snapshot.positions, Some(local_racer));
                        renderer.render_at(Mount::LeaderBoard, &View::Leaderboard(board));
                        continue;
                    }
                    RaceStatus::Pending => RaceError::TransientPollFailure {
                        reason: "race not under way yet".to_string(),
                    },
                    RaceStatus::Unknown => RaceError::TransientPollFailure {
                        reason: "unrecognized race status".to_string(),
                    },
                },
                Err(e) => RaceError::TransientPollFailure {
                    reason: e.to_string(),
                },
            },
        };

        failures += 1;
        warn!("{failure} ({failures}/{max_failures})");
        if failures >= max_failures {
            ticker.stop();
            error!("Race {race_id}: giving up after {failures} consecutive poll failures");
            return Err(RaceError::PollFailureLimitExceeded { failures });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::race::test_support::{Call, RecordingRenderer, ScriptedApi, position, snapshot};
    use tokio::sync::mpsc;
    use tokio::time::{self, Instant};

    fn settings() -> PollSettings {
        PollSettings {
            interval: Duration::from_millis(500),
            max_consecutive_failures: 5,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_polling_once_finished() {
        let api = ScriptedApi::default()
            .with_status(Ok(snapshot(
                RaceStatus::InProgress,
                vec![position(7, 3, None)],
            )))
            .with_status(Ok(snapshot(
                RaceStatus::Finished,
                vec![position(7, 9, Some(1))],
            )))
            .with_status(Ok(snapshot(RaceStatus::Finished, vec![])));
        let api = Arc::new(api);
        let renderer = RecordingRenderer::default();
        let timers = Timers::new();
        let (_tx, mut rx) = mpsc::unbounded_channel();
        let race_id = RaceId::Number(42);

        let finished = poll_until_finished(
            &api,
            &renderer,
            &timers,
            &race_id,
            7,
            &settings(),
            &mut rx,
        )
        .await
        .unwrap();
        assert_eq!(finished.status, RaceStatus::Finished);
        assert_eq!(timers.active(), None);
        assert_eq!(api.status_calls(), 2);

        time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(api.status_calls(), 2);
        assert!(matches!(
            renderer.renders().last(),
            Some((Mount::Race, View::Results(_)))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_leaderboard_rendered_while_in_progress() {
        let api = ScriptedApi::default()
            .with_status(Ok(snapshot(
                RaceStatus::InProgress,
                vec![position(1, 5, None), position(2, 9, None)],
            )))
            .with_status(Ok(snapshot(
                RaceStatus::Finished,
                vec![position(1, 5, Some(2)), position(2, 9, Some(1))],
            )));
        let api = Arc::new(api);
        let renderer = RecordingRenderer::default();
        let timers = Timers::new();
        let (_tx, mut rx) = mpsc::unbounded_channel();

        poll_until_finished(
            &api,
            &renderer,
            &timers,
            &RaceId::Number(1),
            1,
            &settings(),
            &mut rx,
        )
        .await
        .unwrap();

        let boards = renderer.views_at(Mount::LeaderBoard);
        assert_eq!(boards.len(), 1);
        match &boards[0] {
            View::Leaderboard(board) => {
                let ids: Vec<_> = board.iter().map(|s| s.racer_id).collect();
                assert_eq!(ids, vec![2, 1]);
                assert!(board[1].is_local);
            }
            other => panic!("Expected leaderboard, got {other:?}"),
        }
        match renderer.views_at(Mount::Race).last() {
            Some(View::Results(results)) => {
                let ids: Vec<_> = results.iter().map(|s| s.racer_id).collect();
                assert_eq!(ids, vec![2, 1]);
            }
            other => panic!("Expected results, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_consecutive_failures() {
        let mut api = ScriptedApi::default();
        for _ in 0..5 {
            api = api.with_status(Err("connection refused".to_string()));
        }
        let api = Arc::new(api);
        let renderer = RecordingRenderer::default();
        let timers = Timers::new();
        let (_tx, mut rx) = mpsc::unbounded_channel();
        let started = Instant::now();

        let err = poll_until_finished(
            &api,
            &renderer,
            &timers,
            &RaceId::Number(1),
            1,
            &settings(),
            &mut rx,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RaceError::PollFailureLimitExceeded { failures: 5 }));
        assert_eq!(api.status_calls(), 5);
        assert_eq!(started.elapsed(), Duration::from_millis(2500));
        assert_eq!(timers.active(), None);

        time::sleep(Duration::from_secs(2)).await;
        assert_eq!(api.status_calls(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_resets_failure_count() {
        let api = ScriptedApi::default()
            .with_status(Err("timeout".to_string()))
            .with_status(Err("timeout".to_string()))
            .with_status(Ok(snapshot(RaceStatus::InProgress, vec![])))
            .with_status(Ok(snapshot(RaceStatus::Pending, vec![])))
            .with_status(Ok(snapshot(RaceStatus::Unknown, vec![])))
            .with_status(Ok(snapshot(RaceStatus::InProgress, vec![])))
            .with_status(Err("timeout".to_string()))
            .with_status(Err("timeout".to_string()))
            .with_status(Ok(snapshot(RaceStatus::Finished, vec![])));
        let api = Arc::new(api);
        let renderer = RecordingRenderer::default();
        let timers = Timers::new();
        let (_tx, mut rx) = mpsc::unbounded_channel();
        let limited = PollSettings {
            max_consecutive_failures: 3,
            ..settings()
        };

        let finished = poll_until_finished(
            &api,
            &renderer,
            &timers,
            &RaceId::Number(1),
            1,
            &limited,
            &mut rx,
        )
        .await
        .unwrap();
        assert_eq!(finished.status, RaceStatus::Finished);
        assert_eq!(api.status_calls(), 9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_accelerate_targets_current_race() {
        let api = ScriptedApi::default()
            .with_status(Ok(snapshot(RaceStatus::InProgress, vec![])))
            .with_status(Ok(snapshot(RaceStatus::Finished, vec![])));
        let api = Arc::new(api);
        let renderer = RecordingRenderer::default();
        let timers = Timers::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(PlayerInput::Accelerate).unwrap();
        tx.send(PlayerInput::Accelerate).unwrap();
        let race_id = RaceId::Text("race-9".to_string());

        poll_until_finished(
            &api,
            &renderer,
            &timers,
            &race_id,
            1,
            &settings(),
            &mut rx,
        )
        .await
        .unwrap();

        let accelerations: Vec<_> = api
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Accelerate(_)))
            .collect();
        assert_eq!(
            accelerations,
            vec![Call::Accelerate(race_id.clone()), Call::Accelerate(race_id)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_accelerate_is_not_a_poll_failure() {
        let api = ScriptedApi::default()
            .failing_accelerate()
            .with_status(Ok(snapshot(RaceStatus::Finished, vec![])));
        let api = Arc::new(api);
        let renderer = RecordingRenderer::default();
        let timers = Timers::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        for _ in 0..10 {
            tx.send(PlayerInput::Accelerate).unwrap();
        }
        let limited = PollSettings {
            max_consecutive_failures: 1,
            ..settings()
        };

        let finished = poll_until_finished(
            &api,
            &renderer,
            &timers,
            &RaceId::Number(3),
            1,
            &limited,
            &mut rx,
        )
        .await
        .unwrap();
        assert_eq!(finished.status, RaceStatus::Finished);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_counts_toward_failure_bound() {
        let mut api = ScriptedApi::default();
        for _ in 0..20 {
            api = api.with_status(Ok(snapshot(RaceStatus::Pending, vec![])));
        }
        let api = Arc::new(api);
        let renderer = RecordingRenderer::default();
        let timers = Timers::new();
        let (_tx, mut rx) = mpsc::unbounded_channel();

        let err = poll_until_finished(
            &api,
            &renderer,
            &timers,
            &RaceId::Number(1),
            1,
            &settings(),
            &mut rx,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RaceError::PollFailureLimitExceeded { failures: 5 }));
        assert_eq!(api.status_calls(), 5);
        assert_eq!(timers.active(), None);
        assert!(renderer.renders().is_empty());

        time::sleep(Duration::from_secs(2)).await;
        assert_eq!(api.status_calls(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_accelerate_does_not_delay_polling() {
        let api = Arc::new(
            ScriptedApi::default()
                .slow_accelerate(Duration::from_secs(30))
                .with_status(Ok(snapshot(RaceStatus::InProgress, vec![])))
                .with_status(Ok(snapshot(RaceStatus::InProgress, vec![])))
                .with_status(Ok(snapshot(RaceStatus::InProgress, vec![])))
                .with_status(Ok(snapshot(RaceStatus::Finished, vec![]))),
        );
        let renderer = RecordingRenderer::default();
        let timers = Timers::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(PlayerInput::Accelerate).unwrap();
        let started = Instant::now();

        let finished = poll_until_finished(
            &api,
            &renderer,
            &timers,
            &RaceId::Number(5),
            1,
            &settings(),
            &mut rx,
        )
        .await
        .unwrap();
        assert_eq!(finished.status, RaceStatus::Finished);
        assert_eq!(api.status_calls(), 4);
        assert_eq!(started.elapsed(), Duration::from_millis(2000));
        assert!(api.calls().contains(&Call::Accelerate(RaceId::Number(5))));
    }
}
