//! Tilt Ball - session core of a tilt-the-floor ball game
//!
//! Core modules:
//! - `progress`: Session state machine (economy, level chain, results)
//! - `replay`: Deterministic replay recording and playback
//! - `highscores`: Three-tier rank tables
//! - `level`: Level and level set metadata
//! - `persistence`: Score ledger files
//! - `sim`: Lockstep clock and the simulation command stream
//! - `settings`: Player preferences

pub mod binary;
pub mod highscores;
pub mod level;
pub mod persistence;
pub mod progress;
pub mod replay;
pub mod settings;
pub mod sim;

pub use highscores::{RankTable, RankTier};
pub use level::{Level, LevelId, LevelSet};
pub use progress::{Mode, ProgressState, SimFrame, Status};
pub use replay::{ReplayError, ReplayHeader, ReplayPlayer, ReplayRecorder, ReplaySpeed};
pub use settings::{ReplayGeneration, Settings};
pub use sim::{Command, CommandSink, LockstepClock};

/// Game configuration constants
pub mod consts {
    /// Simulation updates per second
    pub const UPS: u32 = 90;
    /// Fixed simulation timestep
    pub const DT: f32 = 1.0 / UPS as f32;
    /// Maximum steps per lockstep run, excess time carries over
    pub const MAX_STEPS_PER_RUN: u32 = 4096;

    /// String buffer size in replay files, terminator included
    pub const MAX_STRING: usize = 256;
}
