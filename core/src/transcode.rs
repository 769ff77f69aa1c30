//! Conversion of arbitrary audio containers to the PCM layout the decoder reads,
//! delegated to an external `ffmpeg`.

use crate::error::{ByteToneError, Result};
use crate::wav::WaveformReader;
use log::{debug, info};
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;
use tempfile::{Builder, TempPath};

pub const DEFAULT_TRANSCODER: &str = "ffmpeg";

/// Decide whether `path` can be decoded directly.
///
/// Any mono 16-bit PCM WAV is read as is; its own sample rate is what the analyzer
/// uses. A WAV in another layout or encoding (stereo, float, µ-law, ADPCM, ...) is
/// converted. A `.wav` whose container is malformed surfaces its error instead.
pub fn needs_transcode(path: &Path) -> Result<bool> {
    let has_wav_suffix = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("wav") || ext.eq_ignore_ascii_case("wave"))
        .unwrap_or(false);

    match WaveformReader::open(path) {
        Ok(_) => Ok(false),
        Err(ByteToneError::UnsupportedLayout(layout)) => {
            debug!("{} needs conversion: {}", path.display(), layout);
            Ok(true)
        }
        Err(ByteToneError::Format(hound::Error::Unsupported)) => {
            debug!("{} uses a WAV encoding hound cannot read", path.display());
            Ok(true)
        }
        Err(e) if has_wav_suffix => Err(e),
        Err(_) => Ok(true),
    }
}

/// Runs an ffmpeg-compatible program producing bit-exact mono s16le PCM
#[derive(Debug, Clone)]
pub struct Transcoder {
    program: String,
}

impl Default for Transcoder {
    fn default() -> Self {
        Self::new(DEFAULT_TRANSCODER)
    }
}

impl Transcoder {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Arguments for converting `input` to `output` at `sample_rate`.
    /// Paths are passed through unchanged, whatever their encoding.
    pub fn args(input: &Path, output: &Path, sample_rate: u32) -> Vec<OsString> {
        vec![
            "-y".into(),
            "-loglevel".into(),
            "error".into(),
            "-i".into(),
            input.as_os_str().to_os_string(),
            "-bitexact".into(),
            "-acodec".into(),
            "pcm_s16le".into(),
            "-ac".into(),
            "1".into(),
            "-ar".into(),
            sample_rate.to_string().into(),
            output.as_os_str().to_os_string(),
        ]
    }

    /// Convert `input` into `output`. The input is left untouched either way.
    pub fn transcode(&self, input: &Path, output: &Path, sample_rate: u32) -> Result<()> {
        info!(
            "Converting {} to {} Hz mono PCM with {}",
            input.display(),
            sample_rate,
            self.program
        );

        let result = Command::new(&self.program)
            .args(Self::args(input, output, sample_rate))
            .output()
            .map_err(|source| ByteToneError::TranscoderUnavailable {
                program: self.program.clone(),
                source,
            })?;

        if !result.status.success() {
            return Err(ByteToneError::Transcode {
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    /// Convert into a temporary WAV that is deleted when the returned path is dropped
    pub fn transcode_to_temp(&self, input: &Path, sample_rate: u32) -> Result<TempPath> {
        let temp = Builder::new()
            .prefix("bytetone-")
            .suffix(".wav")
            .tempfile()?
            .into_temp_path();
        self.transcode(input, &temp, sample_rate)?;
        Ok(temp)
    }
}
