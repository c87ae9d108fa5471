pub mod player;
pub mod scheduler;

pub use player::{LogSurface, PlaybackSurface, Player};
pub use scheduler::{PlaybackState, Scheduler, TickOutcome};
