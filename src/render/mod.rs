pub mod standings;
pub mod terminal;

use std::{fmt, sync::Arc};

use crate::api::{Racer, RacerId, Track, TrackId};

pub use standings::Standing;
pub use terminal::TerminalRenderer;

/// Named areas of the display a view can be rendered into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mount {
    Tracks,
    Racers,
    Race,
    LeaderBoard,
    BigNumbers,
}

impl fmt::Display for Mount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mount::Tracks => "tracks",
            Mount::Racers => "racers",
            Mount::Race => "race",
            Mount::LeaderBoard => "leaderboard",
            Mount::BigNumbers => "big-numbers",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum View {
    TrackCards {
        tracks: Vec<Track>,
        selected: Option<TrackId>,
    },
    RacerCards {
        racers: Vec<Racer>,
        selected: Option<RacerId>,
    },
    RaceStart {
        track_name: String,
        countdown: u32,
    },
    Countdown(u32),
    Leaderboard(Vec<Standing>),
    Results(Vec<Standing>),
    Failure {
        reason: String,
    },
}

/// Sink for view snapshots. Rendering replaces whatever was shown at `mount`
/// and never fails from the caller's point of view.
pub trait Renderer {
    fn render_at(&self, mount: Mount, view: &View);
}

impl<R: Renderer + ?Sized> Renderer for Arc<R> {
    fn render_at(&self, mount: Mount, view: &View) {
        (**self).render_at(mount, view)
    }
}

impl<R: Renderer + ?Sized> Renderer for &R {
    fn render_at(&self, mount: Mount, view: &View) {
        (**self).render_at(mount, view)
    }
}
