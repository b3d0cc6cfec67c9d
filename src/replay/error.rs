use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("replay i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("replay version {version} is older than the oldest supported version {min}")]
    VersionTooOld { version: i32, min: i32 },
    #[error("replay version {version} needs a newer build (this one reads up to {current})")]
    VersionTooNew { version: i32, current: i32 },
    #[error("malformed replay header: {0}")]
    MalformedHeader(String),
    #[error("{0:?} does not have a replay file extension")]
    UnknownGeneration(PathBuf),
    #[error("replay holds no playable commands")]
    EmptyStream,
}

impl ReplayError {
    /// The file can never be played by any build
    pub fn is_invalid(&self) -> bool {
        matches!(
            self,
            ReplayError::VersionTooOld { .. }
                | ReplayError::MalformedHeader(_)
                | ReplayError::UnknownGeneration(_)
                | ReplayError::EmptyStream
        )
    }

    /// The file is from a newer build
    pub fn requires_update(&self) -> bool {
        matches!(self, ReplayError::VersionTooNew { .. })
    }

    pub fn is_too_old(&self) -> bool {
        matches!(self, ReplayError::VersionTooOld { .. })
    }
}
