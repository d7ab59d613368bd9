use log::{debug, info};

use crate::RaceError;
use crate::api::{RacerId, TrackId};
use crate::render::{Mount, Renderer, View};

use super::{SelectionKind, SessionStore};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectionChange {
    pub kind: SelectionKind,
    pub previous: Option<u32>,
    pub current: u32,
}

impl SelectionChange {
    /// The same id was picked again; the store did not change.
    pub fn is_reselect(&self) -> bool {
        self.previous == Some(self.current)
    }
}

/// Applies track and racer picks to a [`SessionStore`] and refreshes the
/// matching card list so exactly one card per category shows as selected.
pub struct SelectionCoordinator<'a, R: Renderer + ?Sized> {
    renderer: &'a R,
}

impl<'a, R: Renderer + ?Sized> SelectionCoordinator<'a, R> {
    pub fn new(renderer: &'a R) -> Self {
        Self { renderer }
    }

    pub fn select_track(
        &self,
        store: &mut SessionStore,
        id: TrackId,
    ) -> Result<SelectionChange, RaceError> {
        self.select(store, SelectionKind::Track, id)
    }

    pub fn select_racer(
        &self,
        store: &mut SessionStore,
        id: RacerId,
    ) -> Result<SelectionChange, RaceError> {
        self.select(store, SelectionKind::Racer, id)
    }

    fn select(
        &self,
        store: &mut SessionStore,
        kind: SelectionKind,
        id: u32,
    ) -> Result<SelectionChange, RaceError> {
        let previous = store.selection(kind);
        if previous != Some(id) {
            store.select(kind, id)?;
            info!("Selected {kind} {id}");
        } else {
            debug!("{kind} {id} already selected");
        }

        self.refresh(store, kind);
        Ok(SelectionChange {
            kind,
            previous,
            current: id,
        })
    }

    fn refresh(&self, store: &SessionStore, kind: SelectionKind) {
        match kind {
            SelectionKind::Track => self.renderer.render_at(
                Mount::Tracks,
                &View::TrackCards {
                    tracks: store.tracks().to_vec(),
                    selected: store.selection(kind),
                },
            ),
            SelectionKind::Racer => self.renderer.render_at(
                Mount::Racers,
                &View::RacerCards {
                    racers: store.racers().to_vec(),
                    selected: store.selection(kind),
                },
            ),
        }
    }
}
