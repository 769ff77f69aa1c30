use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ByteToneError {
    #[error("Input file does not exist: {0}")]
    InputNotFound(PathBuf),

    #[error("Transcoder exited with {status}: {stderr}")]
    Transcode { status: String, stderr: String },

    #[error("Transcoder `{program}` could not be started: {source}")]
    TranscoderUnavailable {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unreadable waveform: {0}")]
    Format(#[from] hound::Error),

    #[error("Unsupported waveform layout: {0}")]
    UnsupportedLayout(String),

    #[error("Waveform is silent (peak amplitude is zero)")]
    SilentWaveform,

    #[error("No extension separator in the last {scanned} decoded bytes")]
    ExtensionNotFound { scanned: usize },

    #[error("Gave up after {attempts} numbered output names were taken")]
    CollisionsExhausted { attempts: usize },

    #[error("Invalid modem parameters: {0}")]
    InvalidParams(String),

    #[error("Parameter mismatch: waveform is {found} Hz but decoder expects {expected} Hz")]
    ParamsMismatch { expected: u32, found: u32 },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ByteToneError>;
