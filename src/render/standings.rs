// Leaderboard and results ordering

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::api::{Position, RacerId};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Standing {
    /// 1-based place in the rendered list
    pub place: usize,
    pub racer_id: RacerId,
    pub driver_name: String,
    pub segment: u32,
    pub final_position: Option<u32>,
    /// Whether this is the racer picked for the session
    pub is_local: bool,
}

impl Standing {
    pub fn display_name(&self) -> String {
        if self.is_local {
            format!("{} (you)", self.driver_name)
        } else {
            self.driver_name.clone()
        }
    }
}

/// Orders a race in progress: furthest segment first. Racers on the same
/// segment keep the order the service reported them in.
pub fn leaderboard(positions: &[Position], local: Option<RacerId>) -> Vec<Standing> {
    let ordered = positions
        .iter()
        .sorted_by(|a, b| b.segment.cmp(&a.segment))
        .collect_vec();
    to_standings(ordered, local)
}

/// Orders a finished race by final rank, winner first. Entries without a
/// rank go last.
pub fn results(positions: &[Position], local: Option<RacerId>) -> Vec<Standing> {
    let ordered = positions
        .iter()
        .sorted_by_key(|p| (p.final_position.is_none(), p.final_position))
        .collect_vec();
    to_standings(ordered, local)
}

fn to_standings(ordered: Vec<&Position>, local: Option<RacerId>) -> Vec<Standing> {
    ordered
        .into_iter()
        .enumerate()
        .map(|(i, p)| Standing {
            place: i + 1,
            racer_id: p.id,
            driver_name: p.driver_name.clone(),
            segment: p.segment,
            final_position: p.final_position,
            is_local: Some(p.id) == local,
        })
        .collect()
}
