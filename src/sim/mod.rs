//! Deterministic simulation plumbing
//!
//! The physics itself lives outside this crate. What lives here is what the
//! session core needs to drive it deterministically:
//! - Fixed timestep lockstep clock
//! - The serialized command stream it produces

pub mod command;
pub mod lockstep;

pub use command::{Command, CommandSink, TAG_END_OF_UPDATE, TAG_UPDATES_PER_SECOND};
pub use lockstep::{LockstepClock, TickControl};
