//! Live replay recording

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::error::ReplayError;
use super::header::{Generation, PatchRegion, ReplayHeader};
use crate::progress::Status;
use crate::sim::Command;

/// Open replay file: header already written, commands appended as they come
#[derive(Debug)]
pub struct ReplayRecorder {
    path: PathBuf,
    out: BufWriter<File>,
}

impl ReplayRecorder {
    /// Create the file and write `header` with the version its extension
    /// calls for
    pub fn start(path: &Path, header: &ReplayHeader) -> Result<Self, ReplayError> {
        let generation = Generation::from_path(path)
            .ok_or_else(|| ReplayError::UnknownGeneration(path.to_path_buf()))?;

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let mut header = header.clone();
        header.version = generation.current_version();

        let mut out = BufWriter::new(File::create(path)?);
        header.write_to(&mut out)?;

        log::debug!("Recording replay to {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            out,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrite the header's result fields in place
    pub fn record_status(&mut self, status: Status, coins: i32, timer: i32) -> Result<(), ReplayError> {
        PatchRegion {
            timer,
            coins,
            status,
        }
        .patch(&mut self.out)?;
        self.out.flush()?;
        Ok(())
    }

    pub fn append(&mut self, cmd: &Command) -> Result<(), ReplayError> {
        cmd.write_to(&mut self.out)?;
        Ok(())
    }

    /// Close the file, deleting it when `discard` is set
    pub fn stop(self, discard: bool) -> Result<(), ReplayError> {
        let Self { path, mut out } = self;
        out.flush()?;
        drop(out);

        if discard {
            fs::remove_file(&path)?;
            log::debug!("Discarded replay {}", path.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::Mode;
    use std::io::{Cursor, Read};

    fn header() -> ReplayHeader {
        ReplayHeader {
            mode: Mode::Normal,
            player: "Ann".to_string(),
            file: "map-easy/01.sol".to_string(),
            speed_percent: 12.0,
            ..ReplayHeader::default()
        }
    }

    #[test]
    fn test_status_patch_keeps_append_position() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Last.nbrx");

        let mut rec = ReplayRecorder::start(&path, &header()).unwrap();
        rec.append(&Command::EndOfUpdate).unwrap();
        rec.record_status(Status::Goal, 11, 2500).unwrap();
        rec.append(&Command::UpdatesPerSecond(60)).unwrap();
        rec.stop(false).unwrap();

        let read = ReplayHeader::load(&path).unwrap();
        assert_eq!(read.version, 10);
        assert_eq!(read.status, Status::Goal);
        assert_eq!((read.coins, read.timer), (11, 2500));
        assert_eq!(read.speed_percent, 12.0);
        assert!(read.is_finished());

        let mut file = File::open(&path).unwrap();
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).unwrap();
        let mut cursor = Cursor::new(bytes);
        ReplayHeader::read_from(&mut cursor, Generation::Extended).unwrap();
        assert_eq!(Command::read_from(&mut cursor).unwrap(), Some(Command::EndOfUpdate));
        assert_eq!(
            Command::read_from(&mut cursor).unwrap(),
            Some(Command::UpdatesPerSecond(60))
        );
        assert_eq!(Command::read_from(&mut cursor).unwrap(), None);
    }

    #[test]
    fn test_legacy_extension_writes_version_9() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Replays").join("Last.nbr");

        ReplayRecorder::start(&path, &header())
            .unwrap()
            .stop(false)
            .unwrap();

        let read = ReplayHeader::load(&path).unwrap();
        assert_eq!(read.version, 9);
        assert_eq!(read.speed_percent, 0.0);
        assert!(!read.is_finished());
    }

    #[test]
    fn test_discard_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Last.nbrx");

        let rec = ReplayRecorder::start(&path, &header()).unwrap();
        rec.stop(true).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = ReplayRecorder::start(&dir.path().join("Last.txt"), &header()).unwrap_err();
        assert!(matches!(err, ReplayError::UnknownGeneration(_)));
    }
}
