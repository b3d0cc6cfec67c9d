//! Deterministic replay recording and playback
//!
//! A replay is a fixed header followed by the raw simulation command stream.
//! Two generations exist on disk, told apart by extension:
//! - `.nbr`: version 9 only
//! - `.nbrx`: versions 9 and 10, version 10 adds `speed_percent`

pub mod error;
pub mod header;
pub mod naming;
pub mod player;
pub mod recorder;
pub mod speed;

pub use error::ReplayError;
pub use header::{Generation, PatchRegion, ReplayHeader, CAMPAIGN_SHOT, MAGIC, MIN_VERSION};
pub use naming::format_replay_name;
pub use player::ReplayPlayer;
pub use recorder::ReplayRecorder;
pub use speed::{ReplaySpeed, SpeedControl};
