//! Command decoding with per-byte timeouts.

use crate::error::{ProtocolError, Stage};
use petflap_core::{
    TagId, TagRecord,
    constants::{SERIAL_BYTE_TIMEOUT_MS, TAG_ID_LEN},
};
use petflap_hardware::{Clock, SerialLink};
use std::fmt;
use tracing::{debug, trace};

/// Command selected by a leading byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Status,
    Config,
    Mode,
    List,
    Add,
    Delete,
    Read,
}

impl CommandKind {
    pub const ALL: [CommandKind; 7] = [
        CommandKind::Status,
        CommandKind::Config,
        CommandKind::Mode,
        CommandKind::List,
        CommandKind::Add,
        CommandKind::Delete,
        CommandKind::Read,
    ];

    #[must_use]
    pub fn from_byte(byte: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.byte() == byte)
    }

    /// # Errors
    /// Returns `ProtocolError::UnknownCommand` for any other byte.
    pub fn parse(byte: u8) -> Result<Self, ProtocolError> {
        Self::from_byte(byte).ok_or(ProtocolError::UnknownCommand(byte))
    }

    #[must_use]
    pub fn byte(self) -> u8 {
        match self {
            CommandKind::Status => b'S',
            CommandKind::Config => b'C',
            CommandKind::Mode => b'M',
            CommandKind::List => b'L',
            CommandKind::Add => b'A',
            CommandKind::Delete => b'D',
            CommandKind::Read => b'R',
        }
    }

    #[must_use]
    pub fn describe(self) -> &'static str {
        match self {
            CommandKind::Status => "Status request",
            CommandKind::Config => "Configuration",
            CommandKind::Mode => "Mode change",
            CommandKind::List => "List cats",
            CommandKind::Add => "Add cat",
            CommandKind::Delete => "Delete cat",
            CommandKind::Read => "Read cat",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// A complete command with its parameters.
///
/// Values are passed on as received; range checks (mode byte, slot number)
/// belong to whoever executes the command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Status,
    ConfigRead { index: u8 },
    ConfigWrite { index: u8, value: u16 },
    SetMode(u8),
    List,
    /// Tag to enroll; the key is guaranteed non-zero.
    Add(TagRecord),
    /// 1-based slot.
    Delete(u8),
    /// 1-based slot.
    Read(u8),
}

impl Command {
    #[must_use]
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Status => CommandKind::Status,
            Command::ConfigRead { .. } | Command::ConfigWrite { .. } => CommandKind::Config,
            Command::SetMode(_) => CommandKind::Mode,
            Command::List => CommandKind::List,
            Command::Add(_) => CommandKind::Add,
            Command::Delete(_) => CommandKind::Delete,
            Command::Read(_) => CommandKind::Read,
        }
    }
}

/// Reads command parameters from a [`SerialLink`].
///
/// Each parameter read waits at most `byte_timeout_ms` for its data. A
/// 16-bit parameter shares a single window for both of its bytes.
#[derive(Debug, Clone, Copy)]
pub struct CommandReader {
    byte_timeout_ms: u32,
}

impl Default for CommandReader {
    fn default() -> Self {
        Self::new(SERIAL_BYTE_TIMEOUT_MS)
    }
}

impl CommandReader {
    #[must_use]
    pub fn new(byte_timeout_ms: u32) -> Self {
        Self { byte_timeout_ms }
    }

    #[must_use]
    pub fn byte_timeout_ms(&self) -> u32 {
        self.byte_timeout_ms
    }

    /// Take a leading byte if one is waiting. Never blocks.
    pub fn poll_leading<L: SerialLink>(&self, link: &mut L) -> Option<u8> {
        if !link.byte_available() {
            return None;
        }
        link.read_byte()
    }

    fn wait_byte<L: SerialLink, C: Clock>(&self, link: &mut L, clock: &C, start: u32) -> Option<u8> {
        loop {
            if let Some(byte) = link.read_byte() {
                trace!(byte, "Parameter byte received");
                return Some(byte);
            }
            if clock.elapsed_since(start) > self.byte_timeout_ms {
                return None;
            }
        }
    }

    fn read_u8<L: SerialLink, C: Clock>(
        &self,
        link: &mut L,
        clock: &C,
        stage: Stage,
    ) -> Result<u8, ProtocolError> {
        let start = clock.now_ms();
        self.wait_byte(link, clock, start)
            .ok_or(ProtocolError::timeout(stage))
    }

    fn read_u16<L: SerialLink, C: Clock>(
        &self,
        link: &mut L,
        clock: &C,
        stage: Stage,
    ) -> Result<u16, ProtocolError> {
        let start = clock.now_ms();
        let lo = self.wait_byte(link, clock, start);
        let hi = lo.and_then(|_| self.wait_byte(link, clock, start));
        match (lo, hi) {
            (Some(lo), Some(hi)) => Ok(u16::from_le_bytes([lo, hi])),
            _ => Err(ProtocolError::timeout(stage)),
        }
    }

    /// Read the parameters that follow the leading byte of `kind`.
    ///
    /// # Errors
    /// `ProtocolError::Timeout` names the parameter that did not arrive in
    /// time; `ProtocolError::ZeroKey` rejects an add command whose key is 0.
    pub fn read_parameters<L: SerialLink, C: Clock>(
        &self,
        kind: CommandKind,
        link: &mut L,
        clock: &C,
    ) -> Result<Command, ProtocolError> {
        let command = match kind {
            CommandKind::Status => Command::Status,
            CommandKind::List => Command::List,
            CommandKind::Config => {
                let action = self.read_u8(link, clock, Stage::ConfigAction)?;
                let index = self.read_u8(link, clock, Stage::ConfigIndex)?;
                if action == b'S' {
                    let value = self.read_u16(link, clock, Stage::ConfigValue)?;
                    Command::ConfigWrite { index, value }
                } else {
                    Command::ConfigRead { index }
                }
            }
            CommandKind::Mode => Command::SetMode(self.read_u8(link, clock, Stage::ModeValue)?),
            CommandKind::Add => {
                let mut id = [0u8; TAG_ID_LEN];
                for (i, byte) in id.iter_mut().enumerate() {
                    *byte = self.read_u8(link, clock, Stage::IdByte(i as u8))?;
                }
                let key = self.read_u16(link, clock, Stage::Crc)?;
                let record =
                    TagRecord::enrollable(key, TagId::new(id)).map_err(|_| ProtocolError::ZeroKey)?;
                Command::Add(record)
            }
            CommandKind::Delete => Command::Delete(self.read_u8(link, clock, Stage::SlotNumber)?),
            CommandKind::Read => Command::Read(self.read_u8(link, clock, Stage::SlotNumber)?),
        };
        debug!(?command, "Serial command decoded");
        Ok(command)
    }
}
