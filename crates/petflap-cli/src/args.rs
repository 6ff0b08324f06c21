//! Command line arguments.

use anyhow::{Context, Result, anyhow, bail};
use petflap_core::constants::DATA_BYTES;
use std::path::PathBuf;

pub const USAGE: &str = "usage: petflap [--config <file.json>] [--eeprom <image>] \
[--port <device> [--baud <rate>]] [--present-tag <16 hex digits>]";

pub const DEFAULT_EEPROM: &str = "petflap.eeprom";
pub const DEFAULT_BAUD: u32 = 9_600;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    /// JSON controller configuration.
    pub config: Option<PathBuf>,
    /// EEPROM image file, created on first flush.
    pub eeprom: PathBuf,
    /// Serial device for the diagnostic link; stdin/stdout when absent.
    pub port: Option<String>,
    pub baud: u32,
    /// Tag data block presented to the reader during the first pass.
    pub present_tag: Option<[u8; DATA_BYTES]>,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            config: None,
            eeprom: PathBuf::from(DEFAULT_EEPROM),
            port: None,
            baud: DEFAULT_BAUD,
            present_tag: None,
        }
    }
}

impl Args {
    /// Parse arguments (program name excluded). `Ok(None)` asks for help.
    pub fn parse<I>(args: I) -> Result<Option<Self>>
    where
        I: IntoIterator<Item = String>,
    {
        let mut parsed = Args::default();
        let mut args = args.into_iter();
        while let Some(flag) = args.next() {
            let mut value = || {
                args.next()
                    .ok_or_else(|| anyhow!("{flag} needs a value\n{USAGE}"))
            };
            match flag.as_str() {
                "-h" | "--help" => return Ok(None),
                "--config" => parsed.config = Some(PathBuf::from(value()?)),
                "--eeprom" => parsed.eeprom = PathBuf::from(value()?),
                "--port" => parsed.port = Some(value()?),
                "--baud" => {
                    let raw = value()?;
                    parsed.baud = raw
                        .parse()
                        .with_context(|| format!("invalid baud rate '{raw}'"))?;
                }
                "--present-tag" => parsed.present_tag = Some(parse_tag(&value()?)?),
                other => bail!("unknown argument '{other}'\n{USAGE}"),
            }
        }
        Ok(Some(parsed))
    }
}

/// Parse the 8-byte tag data block from 16 hex digits.
pub fn parse_tag(hex: &str) -> Result<[u8; DATA_BYTES]> {
    if hex.len() != DATA_BYTES * 2 || !hex.is_ascii() {
        bail!("tag data must be {} hex digits, got '{hex}'", DATA_BYTES * 2);
    }
    let mut data = [0u8; DATA_BYTES];
    for (i, byte) in data.iter_mut().enumerate() {
        let digits = &hex[i * 2..i * 2 + 2];
        *byte = u8::from_str_radix(digits, 16)
            .with_context(|| format!("invalid hex '{digits}' in tag data"))?;
    }
    Ok(data)
}
