//! Replay playback
//!
//! The stream is consumed one simulation update at a time: each lockstep
//! tick reads commands up to and including the next end-of-update marker.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use super::error::ReplayError;
use super::header::{Generation, ReplayHeader};
use super::speed::{ReplaySpeed, SpeedControl};
use crate::sim::{Command, CommandSink, LockstepClock, TickControl};

/// How one batch read ended
enum Batch {
    /// Update complete, optionally with a new step length
    Tick(Option<f32>),
    /// Stream exhausted
    End,
}

#[derive(Debug)]
pub struct ReplayPlayer {
    path: PathBuf,
    header: ReplayHeader,
    input: BufReader<File>,
    clock: LockstepClock,
    speed: SpeedControl,
    exhausted: bool,
}

impl ReplayPlayer {
    /// Open and validate a replay, then feed the first update to `sink` so
    /// the consumer starts in sync with the recording.
    pub fn open<S: CommandSink>(path: &Path, sink: &mut S) -> Result<Self, ReplayError> {
        let generation = Generation::from_path(path)
            .ok_or_else(|| ReplayError::UnknownGeneration(path.to_path_buf()))?;

        let mut input = BufReader::new(File::open(path)?);
        let header = ReplayHeader::read_from(&mut input, generation)?;

        let mut clock = LockstepClock::default();
        match read_batch(&mut input, sink)? {
            Batch::Tick(dt) => {
                if let Some(dt) = dt {
                    clock.set_fixed_dt(dt);
                }
            }
            Batch::End => return Err(ReplayError::EmptyStream),
        }
        if input.fill_buf()?.is_empty() {
            return Err(ReplayError::EmptyStream);
        }

        log::info!(
            "Replaying {} ({} on {})",
            path.display(),
            header.player,
            header.file
        );
        Ok(Self {
            path: path.to_path_buf(),
            header,
            input,
            clock,
            speed: SpeedControl::default(),
            exhausted: false,
        })
    }

    pub fn header(&self) -> &ReplayHeader {
        &self.header
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Advance playback by `dt` seconds of wall time. Returns `false` once
    /// the stream is exhausted.
    pub fn step<S: CommandSink>(&mut self, dt: f32, sink: &mut S) -> bool {
        if self.exhausted {
            return false;
        }

        let Self {
            input,
            clock,
            exhausted,
            path,
            ..
        } = self;

        clock.run(dt, |_| match read_batch(input, sink) {
            Ok(Batch::Tick(Some(dt))) => TickControl::Retime(dt),
            Ok(Batch::Tick(None)) => TickControl::Continue,
            Ok(Batch::End) => {
                *exhausted = true;
                TickControl::Halt
            }
            Err(err) => {
                log::error!("Replay read failed in {}: {}", path.display(), err);
                *exhausted = true;
                TickControl::Halt
            }
        });

        !self.exhausted
    }

    pub fn blend(&self) -> f32 {
        self.clock.blend()
    }

    pub fn set_speed(&mut self, speed: ReplaySpeed) {
        self.speed = SpeedControl::Ladder(speed);
        self.clock.scl(speed.factor());
    }

    /// Hand the speed to continuous user control
    pub fn manual_speed(&mut self, factor: f32) {
        self.speed = SpeedControl::Manual(factor);
        self.clock.scl(factor);
    }

    pub fn speed(&self) -> SpeedControl {
        self.speed
    }

    /// Close the file, deleting the replay when `delete` is set
    pub fn close(self, delete: bool) -> Result<(), ReplayError> {
        let Self { path, input, .. } = self;
        drop(input);
        if delete {
            fs::remove_file(&path)?;
            log::info!("Deleted replay {}", path.display());
        }
        Ok(())
    }
}

/// Read commands through the next end-of-update marker
fn read_batch<S: CommandSink>(input: &mut BufReader<File>, sink: &mut S) -> io::Result<Batch> {
    let mut retime = None;
    loop {
        match Command::read_from(input)? {
            None => return Ok(Batch::End),
            Some(Command::EndOfUpdate) => {
                sink.end_of_update();
                return Ok(Batch::Tick(retime));
            }
            Some(Command::UpdatesPerSecond(0)) => {
                log::warn!("Ignoring zero update rate in replay stream");
            }
            Some(Command::UpdatesPerSecond(n)) => retime = Some(1.0 / n as f32),
            Some(cmd) => sink.apply(&cmd),
        }
    }
}
