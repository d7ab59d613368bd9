pub mod selection;

use std::fmt;

use crate::RaceError;
use crate::api::{RaceId, Racer, RacerId, Track, TrackId};

pub use selection::{SelectionChange, SelectionCoordinator};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SelectionKind {
    Track,
    Racer,
}

impl fmt::Display for SelectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionKind::Track => f.write_str("track"),
            SelectionKind::Racer => f.write_str("racer"),
        }
    }
}

/// Identifiers and reference data for one race session.
///
/// Track and racer lists are fixed at construction. Selections must name an
/// entry of those lists and the race id can be written once; a new session
/// needs a new store.
#[derive(Debug, Default)]
pub struct SessionStore {
    tracks: Vec<Track>,
    racers: Vec<Racer>,
    selected_track: Option<TrackId>,
    selected_racer: Option<RacerId>,
    race_id: Option<RaceId>,
}

impl SessionStore {
    pub fn new(tracks: Vec<Track>, racers: Vec<Racer>) -> Self {
        Self {
            tracks,
            racers,
            ..Default::default()
        }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn racers(&self) -> &[Racer] {
        &self.racers
    }

    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn racer(&self, id: RacerId) -> Option<&Racer> {
        self.racers.iter().find(|r| r.id == id)
    }

    /// Replaces the current selection of `kind`, returning the previous one.
    /// Unknown ids are rejected and leave the store untouched.
    pub fn select(&mut self, kind: SelectionKind, id: u32) -> Result<Option<u32>, RaceError> {
        let (known, slot) = match kind {
            SelectionKind::Track => (self.track(id).is_some(), &mut self.selected_track),
            SelectionKind::Racer => (self.racer(id).is_some(), &mut self.selected_racer),
        };
        if !known {
            return Err(RaceError::InvalidSelection {
                kind: kind.to_string(),
                id,
            });
        }
        Ok(slot.replace(id))
    }

    pub fn selection(&self, kind: SelectionKind) -> Option<u32> {
        match kind {
            SelectionKind::Track => self.selected_track,
            SelectionKind::Racer => self.selected_racer,
        }
    }

    pub fn selected_track(&self) -> Result<&Track, RaceError> {
        self.selected_track
            .and_then(|id| self.track(id))
            .ok_or_else(|| RaceError::precondition("no track selected"))
    }

    pub fn selected_racer(&self) -> Result<&Racer, RaceError> {
        self.selected_racer
            .and_then(|id| self.racer(id))
            .ok_or_else(|| RaceError::precondition("no racer selected"))
    }

    pub fn record_race_id(&mut self, id: RaceId) -> Result<(), RaceError> {
        if let Some(existing) = &self.race_id {
            return Err(RaceError::DuplicateRaceId {
                existing: existing.to_string(),
            });
        }
        self.race_id = Some(id);
        Ok(())
    }

    pub fn race_id(&self) -> Result<&RaceId, RaceError> {
        self.race_id
            .as_ref()
            .ok_or_else(|| RaceError::precondition("no race created in this session"))
    }
}
