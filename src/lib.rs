// Library interface for podrace
// This allows integration tests to access internal modules

pub mod api;
pub mod config;
pub mod errors;
pub mod race;
pub mod render;
pub mod session;

// Re-export commonly used types
pub use api::{HttpRaceApi, RaceApi, RaceId, RaceSnapshot, RaceStatus};
pub use config::AppConfig;
pub use errors::RaceError;
pub use race::{InputSender, RacePhase, RaceSessionController};
pub use render::{Mount, Renderer, TerminalRenderer, View};
pub use session::{SelectionKind, SessionStore};
