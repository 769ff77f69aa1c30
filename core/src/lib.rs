//! Byte-per-tone audio modem for small files
//!
//! Every byte of a file (followed by its extension) becomes one fixed-length sine tone on a
//! 256-step frequency ladder. Decoding slices the waveform back into windows, picks the
//! dominant FFT bin of each one and maps it back onto the ladder.

pub mod assembler;
pub mod cancel;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod extension;
pub mod framing;
pub mod fsk;
pub mod params;
pub mod spectrum;
pub mod transcode;
pub mod wav;

pub use assembler::FileAssembler;
pub use cancel::CancelFlag;
pub use decoder::{DecodeReport, Decoder};
pub use encoder::{EncodeReport, Encoder};
pub use error::{ByteToneError, Result};
pub use framing::Framing;
pub use params::ModemParams;
pub use transcode::Transcoder;

// Default modem configuration
pub const DEFAULT_SAMPLE_RATE: u32 = 7500;
pub const DEFAULT_SYMBOL_DURATION_MS: u32 = 100;
pub const BASE_FREQUENCY: u32 = 100; // Hz
pub const FREQUENCY_STEP: u32 = 10; // Hz per symbol value
pub const DEFAULT_AMPLITUDE: f64 = 0.5;

/// Number of distinct symbols (one per byte value)
pub const NUM_SYMBOLS: usize = 256;

/// Full-scale value used when quantizing to 16-bit PCM
pub const MAX_INT16: f64 = 32767.0;

/// Longest segment accepted, in samples; a segment is held in memory whole
pub const MAX_SEGMENT_SAMPLES: usize = 1 << 24;

/// Input is read and modulated this many bytes at a time
pub const CHUNK_SIZE: usize = 1024;

/// Windows analyzed per parallel batch while decoding
pub const DECODE_BATCH_WINDOWS: usize = 256;

// Trailing extension framing
pub const EXTENSION_SEPARATOR: u8 = b'.';
pub const MAX_EXTENSION_LEN: usize = 64;
pub const MAX_COLLISION_ATTEMPTS: usize = 1000;
