//! Simulation command stream
//!
//! The physics layer emits one command per simulation event. This core only
//! interprets tick boundaries and update-rate changes; every other command is
//! carried as raw bytes for the client that renders it.

use std::io::{self, Read, Write};

use crate::binary::{get_index, get_short, put_index, put_short};

/// Wire tag of [`Command::EndOfUpdate`]
pub const TAG_END_OF_UPDATE: u8 = 1;
/// Wire tag of [`Command::UpdatesPerSecond`]
pub const TAG_UPDATES_PER_SECOND: u8 = 18;

/// One simulation event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Marks the end of one simulation tick
    EndOfUpdate,
    /// The simulation changed its update rate
    UpdatesPerSecond(u32),
    /// Any other command, forwarded untouched
    Opaque { tag: u8, payload: Vec<u8> },
}

impl Command {
    pub fn tag(&self) -> u8 {
        match self {
            Command::EndOfUpdate => TAG_END_OF_UPDATE,
            Command::UpdatesPerSecond(_) => TAG_UPDATES_PER_SECOND,
            Command::Opaque { tag, .. } => *tag,
        }
    }

    /// Frame layout: `tag:u8, size:u16, payload[size]`
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&[self.tag()])?;
        match self {
            Command::EndOfUpdate => put_short(w, 0),
            Command::UpdatesPerSecond(n) => {
                put_short(w, 4)?;
                put_index(w, i32::try_from(*n).unwrap_or(i32::MAX))
            }
            Command::Opaque { payload, .. } => {
                let size = u16::try_from(payload.len()).map_err(|_| {
                    io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("command payload too large ({} bytes)", payload.len()),
                    )
                })?;
                put_short(w, size)?;
                w.write_all(payload)
            }
        }
    }

    /// Read the next command. `Ok(None)` on a clean end of stream or a
    /// truncated trailing frame.
    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Option<Self>> {
        let mut tag = [0u8; 1];
        match r.read(&mut tag) {
            Ok(0) => return Ok(None),
            Ok(_) => {}
            Err(err) if err.kind() == io::ErrorKind::Interrupted => return Self::read_from(r),
            Err(err) => return Err(err),
        }

        let frame = (|| -> io::Result<Self> {
            let size = get_short(r)? as usize;
            let mut payload = vec![0u8; size];
            r.read_exact(&mut payload)?;

            Ok(match tag[0] {
                TAG_END_OF_UPDATE => Command::EndOfUpdate,
                TAG_UPDATES_PER_SECOND if size >= 4 => {
                    let n = get_index(&mut &payload[..4])?;
                    Command::UpdatesPerSecond(n.max(0) as u32)
                }
                tag => Command::Opaque { tag, payload },
            })
        })();

        match frame {
            Ok(cmd) => Ok(Some(cmd)),
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => {
                log::warn!("Truncated command frame (tag {}) at end of stream", tag[0]);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

/// Consumer of replayed commands (the game client)
pub trait CommandSink {
    /// Apply one opaque simulation command
    fn apply(&mut self, cmd: &Command);

    /// Called at every tick boundary, after that tick's commands
    fn end_of_update(&mut self) {}
}

impl CommandSink for Vec<Command> {
    fn apply(&mut self, cmd: &Command) {
        self.push(cmd.clone());
    }
}
