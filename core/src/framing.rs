use crate::error::{ByteToneError, Result};
use crate::params::ModemParams;
use crate::{CHUNK_SIZE, EXTENSION_SEPARATOR};
use std::io::{ErrorKind, Read};
use std::path::Path;

/// Magic bytes opening a parameter header
pub const HEADER_MAGIC: [u8; 4] = *b"BTN1";

/// magic (4) + duration ms (2) + base Hz (2) + step Hz (2) + sample rate (4) + CRC-8 (1)
pub const HEADER_SIZE: usize = 15;

/// Whether a waveform starts with an in-band parameter header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Framing {
    /// Parameter header (bootstrap ladder) followed by the frame
    #[default]
    Headed,
    /// Frame only; the decoder has to be told the parameters
    Bare,
}

/// CRC-8 using polynomial 0xD5
fn crc8(data: &[u8]) -> u8 {
    const POLYNOMIAL: u8 = 0xD5;
    let mut crc = 0u8;

    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            if (crc & 0x80) != 0 {
                crc = (crc << 1) ^ POLYNOMIAL;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

pub struct HeaderEncoder;
pub struct HeaderDecoder;

impl HeaderEncoder {
    /// Serialize the parameters a decoder needs (amplitude is not carried)
    pub fn encode(params: &ModemParams) -> Result<[u8; HEADER_SIZE]> {
        let duration = narrow(params.symbol_duration_ms, "symbol duration")?;
        let base = narrow(params.base_frequency, "base frequency")?;
        let step = narrow(params.frequency_step, "frequency step")?;

        let mut header = [0u8; HEADER_SIZE];
        header[0..4].copy_from_slice(&HEADER_MAGIC);
        header[4..6].copy_from_slice(&duration.to_be_bytes());
        header[6..8].copy_from_slice(&base.to_be_bytes());
        header[8..10].copy_from_slice(&step.to_be_bytes());
        header[10..14].copy_from_slice(&params.sample_rate.to_be_bytes());
        header[14] = crc8(&header[..14]);

        Ok(header)
    }
}

impl HeaderDecoder {
    /// Parse a header, returning None unless magic and CRC both check out
    pub fn decode(data: &[u8]) -> Option<ModemParams> {
        if data.len() < HEADER_SIZE || data[0..4] != HEADER_MAGIC {
            return None;
        }
        if crc8(&data[..14]) != data[14] {
            return None;
        }

        let read_u16 = |at: usize| u16::from_be_bytes([data[at], data[at + 1]]) as u32;
        Some(ModemParams {
            symbol_duration_ms: read_u16(4),
            base_frequency: read_u16(6),
            frequency_step: read_u16(8),
            sample_rate: u32::from_be_bytes([data[10], data[11], data[12], data[13]]),
            ..ModemParams::default()
        })
    }
}

fn narrow(value: u32, what: &str) -> Result<u16> {
    u16::try_from(value).map_err(|_| {
        ByteToneError::InvalidParams(format!("{} {} does not fit in the header", what, value))
    })
}

/// Extension bytes for a path, separator included: `photo.png` gives `.png`.
/// A path without an extension gives a bare separator.
pub fn extension_bytes(path: &Path) -> Vec<u8> {
    let mut bytes = vec![EXTENSION_SEPARATOR];
    if let Some(ext) = path.extension() {
        bytes.extend_from_slice(ext.as_encoded_bytes());
    }
    bytes
}

/// Enumerates the frame `payload || extension` in chunks without buffering the payload
pub struct FrameBuilder<R: Read> {
    payload: R,
    extension: Vec<u8>,
    payload_done: bool,
    extension_done: bool,
}

impl<R: Read> FrameBuilder<R> {
    pub fn new(payload: R, extension: Vec<u8>) -> Self {
        Self {
            payload,
            extension,
            payload_done: false,
            extension_done: false,
        }
    }

    /// Next run of symbols: payload chunks of up to CHUNK_SIZE bytes, then the extension once
    pub fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        if !self.payload_done {
            let mut chunk = vec![0u8; CHUNK_SIZE];
            let mut filled = 0;
            while filled < CHUNK_SIZE {
                match self.payload.read(&mut chunk[filled..]) {
                    Ok(0) => break,
                    Ok(n) => filled += n,
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e.into()),
                }
            }
            if filled > 0 {
                chunk.truncate(filled);
                return Ok(Some(chunk));
            }
            self.payload_done = true;
        }

        if !self.extension_done {
            self.extension_done = true;
            if !self.extension.is_empty() {
                return Ok(Some(std::mem::take(&mut self.extension)));
            }
        }

        Ok(None)
    }
}
