use std::{
    io::{self, Write},
    sync::Mutex,
};

use log::error;

use super::{Mount, Renderer, Standing, View};

/// Renders views as plain text lines on a writer, stdout by default.
pub struct TerminalRenderer<W: Write> {
    out: Mutex<W>,
}

impl TerminalRenderer<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn render_at(&self, mount: Mount, view: &View) {
        let text = format_view(view);
        let mut out = match self.out.lock() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = out.write_all(text.as_bytes()).and_then(|_| out.flush()) {
            error!("Could not render {mount}: {e}");
        }
    }
}

fn standing_lines(standings: &[Standing]) -> impl Iterator<Item = String> + '_ {
    standings.iter().map(|standing| match standing.final_position {
        Some(_) => format!("  {} - {}", standing.place, standing.display_name()),
        None => format!(
            "  {} - {}  [segment {}]",
            standing.place,
            standing.display_name(),
            standing.segment
        ),
    })
}

pub fn format_view(view: &View) -> String {
    let lines: Vec<String> = match view {
        View::TrackCards { tracks, .. } if tracks.is_empty() => {
            vec!["Loading Tracks...".to_string()]
        }
        View::TrackCards { tracks, selected } => std::iter::once("Tracks:".to_string())
            .chain(tracks.iter().map(|track| {
                let mark = if Some(track.id) == *selected { '*' } else { ' ' };
                format!(" {mark} {:>3}  {}", track.id, track.name)
            }))
            .collect(),
        View::RacerCards { racers, .. } if racers.is_empty() => {
            vec!["Loading Racers...".to_string()]
        }
        View::RacerCards { racers, selected } => std::iter::once("Racers:".to_string())
            .chain(racers.iter().map(|racer| {
                let mark = if Some(racer.id) == *selected { '*' } else { ' ' };
                format!(
                    " {mark} {:>3}  {}  top speed {}  acceleration {}  handling {}",
                    racer.id,
                    racer.driver_name,
                    racer.top_speed,
                    racer.acceleration,
                    racer.handling
                )
            }))
            .collect(),
        View::RaceStart {
            track_name,
            countdown,
        } => vec![
            format!("Race: {track_name}"),
            format!("Race starts in... {countdown}"),
            "Press Enter as fast as you can to make your racer go faster!".to_string(),
        ],
        View::Countdown(count) => vec![format!("  {count}")],
        View::Leaderboard(standings) => std::iter::once("Leaderboard".to_string())
            .chain(standing_lines(standings))
            .collect(),
        View::Results(standings) => std::iter::once("Race Results".to_string())
            .chain(standing_lines(standings))
            .chain(std::iter::once(
                "Run `podrace race` again to start a new race.".to_string(),
            ))
            .collect(),
        View::Failure { reason } => vec![format!("Race failed: {reason}")],
    };

    let mut text = lines.join("\n");
    text.push('\n');
    text
}
