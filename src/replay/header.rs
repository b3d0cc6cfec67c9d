//! Replay file header
//!
//! ```text
//! magic:i32  version:i32
//! timer:i32  coins:i32  status:i32      <- patch region, offset 8
//! mode:i32   player:cstr  date:cstr  shot:cstr  file:cstr
//! time:i32   goal:i32  reserved:i32  score:i32  balls:i32  times:i32
//! speed_percent:f32                     <- version 10 and up
//! ```
//!
//! New fields are only ever appended so the patch region never moves.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};

use super::error::ReplayError;
use crate::binary::{get_float, get_index, get_string, put_float, put_index, put_string};
use crate::progress::{Mode, Status};

pub const MAGIC: i32 =
    0xAF | (b'N' as i32) << 8 | (b'B' as i32) << 16 | (b'R' as i32) << 24;

/// Oldest readable version (1.6 release)
pub const MIN_VERSION: i32 = 9;
/// First version carrying `speed_percent`
pub const EXTENDED_VERSION: i32 = 10;

pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Screenshot written for every campaign replay
pub const CAMPAIGN_SHOT: &str = "gui/levels/campaign_replay.jpg";

/// On-disk generation, told apart by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Generation {
    /// `.nbr`
    Legacy,
    /// `.nbrx`
    Extended,
}

impl Generation {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "nbr" => Some(Generation::Legacy),
            "nbrx" => Some(Generation::Extended),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Generation::Legacy => "nbr",
            Generation::Extended => "nbrx",
        }
    }

    /// Version written by this build, also the newest it reads
    pub fn current_version(self) -> i32 {
        match self {
            Generation::Legacy => MIN_VERSION,
            Generation::Extended => EXTENDED_VERSION,
        }
    }

    pub fn check_version(self, version: i32) -> Result<(), ReplayError> {
        let current = self.current_version();
        if version < MIN_VERSION {
            Err(ReplayError::VersionTooOld {
                version,
                min: MIN_VERSION,
            })
        } else if version > current {
            Err(ReplayError::VersionTooNew { version, current })
        } else {
            Ok(())
        }
    }
}

impl From<crate::settings::ReplayGeneration> for Generation {
    fn from(generation: crate::settings::ReplayGeneration) -> Self {
        match generation {
            crate::settings::ReplayGeneration::Legacy => Generation::Legacy,
            crate::settings::ReplayGeneration::Extended => Generation::Extended,
        }
    }
}

/// The three header fields rewritten while recording
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchRegion {
    pub timer: i32,
    pub coins: i32,
    pub status: Status,
}

impl PatchRegion {
    /// Byte offset of the region, right after magic and version
    pub const OFFSET: u64 = 8;
    pub const LEN: usize = 12;

    pub fn encode(&self) -> [u8; Self::LEN] {
        let mut buf = [0u8; Self::LEN];
        buf[0..4].copy_from_slice(&self.timer.to_le_bytes());
        buf[4..8].copy_from_slice(&self.coins.to_le_bytes());
        buf[8..12].copy_from_slice(&self.status.code().to_le_bytes());
        buf
    }

    /// Overwrite the region in place and return to the current position
    pub fn patch<W: Write + Seek>(&self, w: &mut W) -> io::Result<()> {
        let pos = w.stream_position()?;
        w.seek(SeekFrom::Start(Self::OFFSET))?;
        w.write_all(&self.encode())?;
        w.seek(SeekFrom::Start(pos))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReplayHeader {
    pub version: i32,

    pub timer: i32,
    pub coins: i32,
    pub status: Status,

    pub mode: Mode,
    pub player: String,
    pub date: Option<DateTime<Utc>>,
    /// Screenshot path shown in replay listings
    pub shot: String,
    /// Level file the run was played on
    pub file: String,

    /// Level time limit in centiseconds
    pub time_limit: i32,
    pub goal: i32,
    pub score: i32,
    pub balls: i32,
    pub times: i32,

    pub speed_percent: f32,
}

impl ReplayHeader {
    pub fn patch_region(&self) -> PatchRegion {
        PatchRegion {
            timer: self.timer,
            coins: self.coins,
            status: self.status,
        }
    }

    /// A result was patched in, so the run ended rather than being cut short
    pub fn is_finished(&self) -> bool {
        self.status != Status::None
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let date = self
            .date
            .map(|d| d.format(DATE_FORMAT).to_string())
            .unwrap_or_default();

        put_index(w, MAGIC)?;
        put_index(w, self.version)?;
        w.write_all(&self.patch_region().encode())?;
        put_index(w, self.mode.code())?;

        put_string(w, &self.player)?;
        put_string(w, &date)?;
        put_string(w, &self.shot)?;
        put_string(w, &self.file)?;

        put_index(w, self.time_limit)?;
        put_index(w, self.goal)?;
        put_index(w, 0)?;
        put_index(w, self.score)?;
        put_index(w, self.balls)?;
        put_index(w, self.times)?;

        if self.version >= EXTENDED_VERSION {
            put_float(w, self.speed_percent)?;
        }
        Ok(())
    }

    /// Read and validate a header against `generation`'s version range
    pub fn read_from<R: Read>(r: &mut R, generation: Generation) -> Result<Self, ReplayError> {
        let magic = get_index(r).map_err(truncated)?;
        if magic != MAGIC {
            return Err(ReplayError::MalformedHeader(format!(
                "bad magic {magic:#010x}"
            )));
        }

        let version = get_index(r).map_err(truncated)?;
        generation.check_version(version)?;

        Self::read_body(r, version).map_err(truncated)
    }

    fn read_body<R: Read>(r: &mut R, version: i32) -> io::Result<Self> {
        let timer = get_index(r)?;
        let coins = get_index(r)?;
        let status_code = get_index(r)?;
        let mode_code = get_index(r)?;

        let status = Status::from_code(status_code).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unknown status {status_code}"),
            )
        })?;
        let mode = Mode::from_code(mode_code).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidData, format!("unknown mode {mode_code}"))
        })?;

        let player = get_string(r)?;
        let date = parse_date(&get_string(r)?);
        let shot = get_string(r)?;
        let file = get_string(r)?;

        let time_limit = get_index(r)?;
        let goal = get_index(r)?;
        let _reserved = get_index(r)?;
        let score = get_index(r)?;
        let balls = get_index(r)?;
        let times = get_index(r)?;

        let speed_percent = if version >= EXTENDED_VERSION {
            get_float(r)?
        } else {
            0.0
        };

        Ok(Self {
            version,
            timer,
            coins,
            status,
            mode,
            player,
            date,
            shot,
            file,
            time_limit,
            goal,
            score,
            balls,
            times,
            speed_percent,
        })
    }

    /// Read just the header of a replay file (replay listings)
    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        let generation = Generation::from_path(path)
            .ok_or_else(|| ReplayError::UnknownGeneration(path.to_path_buf()))?;
        let mut reader = BufReader::new(File::open(path)?);
        Self::read_from(&mut reader, generation)
    }
}

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    match NaiveDateTime::parse_from_str(s, DATE_FORMAT) {
        Ok(naive) => Some(naive.and_utc()),
        Err(_) => {
            if !s.is_empty() {
                log::debug!("Ignoring unparsable replay date {:?}", s);
            }
            None
        }
    }
}

fn truncated(err: io::Error) -> ReplayError {
    match err.kind() {
        io::ErrorKind::UnexpectedEof => ReplayError::MalformedHeader("truncated header".into()),
        io::ErrorKind::InvalidData => ReplayError::MalformedHeader(err.to_string()),
        _ => ReplayError::Io(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use std::io::Cursor;

    fn sample(version: i32) -> ReplayHeader {
        ReplayHeader {
            version,
            timer: 4321,
            coins: 17,
            status: Status::Goal,
            mode: Mode::Challenge,
            player: "Ann".to_string(),
            date: Utc.with_ymd_and_hms(2024, 3, 9, 18, 4, 55).single(),
            shot: "shot-easy/01.jpg".to_string(),
            file: "map-easy/01.sol".to_string(),
            time_limit: 6000,
            goal: 10,
            score: 120,
            balls: 3,
            times: 9000,
            speed_percent: if version >= EXTENDED_VERSION { 42.5 } else { 0.0 },
        }
    }

    fn encode(header: &ReplayHeader) -> Vec<u8> {
        let mut buf = Vec::new();
        header.write_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_magic_bytes() {
        assert_eq!(&encode(&sample(9))[..4], &[0xAF, b'N', b'B', b'R']);
    }

    #[test]
    fn test_patch_region_offset() {
        let header = sample(10);
        let buf = encode(&header);
        let start = PatchRegion::OFFSET as usize;
        assert_eq!(
            &buf[start..start + PatchRegion::LEN],
            &header.patch_region().encode()
        );
    }

    #[test]
    fn test_extended_header_appends_speed() {
        let legacy = encode(&sample(9));
        let extended = encode(&sample(10));
        assert_eq!(extended.len(), legacy.len() + 4);

        let read = ReplayHeader::read_from(&mut Cursor::new(extended), Generation::Extended).unwrap();
        assert_eq!(read.speed_percent, 42.5);
    }

    #[test]
    fn test_version_gating() {
        let old = encode(&sample(8));
        let err = ReplayHeader::read_from(&mut Cursor::new(old), Generation::Extended).unwrap_err();
        assert!(err.is_invalid() && err.is_too_old());

        let newer = encode(&sample(10));
        let err = ReplayHeader::read_from(&mut Cursor::new(newer), Generation::Legacy).unwrap_err();
        assert!(err.requires_update());
        assert!(!err.is_invalid());

        let future = encode(&sample(11));
        let err = ReplayHeader::read_from(&mut Cursor::new(future), Generation::Extended).unwrap_err();
        assert!(err.requires_update());

        let legacy = encode(&sample(9));
        assert!(ReplayHeader::read_from(&mut Cursor::new(legacy), Generation::Extended).is_ok());
    }

    #[test]
    fn test_bad_magic_and_truncation() {
        let mut buf = encode(&sample(9));
        buf[0] = 0;
        let err = ReplayHeader::read_from(&mut Cursor::new(buf), Generation::Legacy).unwrap_err();
        assert!(matches!(err, ReplayError::MalformedHeader(_)));

        let mut buf = encode(&sample(9));
        buf.truncate(30);
        let err = ReplayHeader::read_from(&mut Cursor::new(buf), Generation::Legacy).unwrap_err();
        assert!(matches!(err, ReplayError::MalformedHeader(_)));
    }

    #[test]
    fn test_longest_multibyte_strings_survive() {
        let mut header = sample(10);
        header.player = "語".repeat(85);
        header.file = "é".repeat(127);
        let read =
            ReplayHeader::read_from(&mut Cursor::new(encode(&header)), Generation::Extended).unwrap();
        assert_eq!(read, header);
    }

    #[test]
    fn test_unparsable_date_tolerated() {
        let mut header = sample(9);
        header.date = None;
        let read =
            ReplayHeader::read_from(&mut Cursor::new(encode(&header)), Generation::Legacy).unwrap();
        assert_eq!(read.date, None);
        assert_eq!(read.player, "Ann");
    }

    #[test]
    fn test_generation_from_extension() {
        assert_eq!(Generation::from_path(Path::new("Replays/Last.nbr")), Some(Generation::Legacy));
        assert_eq!(Generation::from_path(Path::new("a.nbrx")), Some(Generation::Extended));
        assert_eq!(Generation::from_path(Path::new("a.txt")), None);
    }

    proptest! {
        #[test]
        fn prop_header_round_trip(
            player in "\\PC{0,60}",
            file in "[a-z/_.0-9]{1,60}",
            timer in any::<i32>(),
            coins in any::<i32>(),
            score in any::<i32>(),
            secs in 0i64..4_000_000_000,
            extended in any::<bool>(),
            speed in 0.0f32..100.0,
        ) {
            let version = if extended { EXTENDED_VERSION } else { MIN_VERSION };
            let header = ReplayHeader {
                version,
                timer,
                coins,
                status: Status::Fall,
                mode: Mode::Zen,
                player,
                date: DateTime::from_timestamp(secs, 0),
                shot: String::new(),
                file,
                time_limit: 0,
                goal: 0,
                score,
                balls: -1,
                times: 0,
                speed_percent: if extended { speed } else { 0.0 },
            };

            let read = ReplayHeader::read_from(
                &mut Cursor::new(encode(&header)),
                Generation::Extended,
            ).unwrap();
            prop_assert_eq!(read, header);
        }
    }
}
