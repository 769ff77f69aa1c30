use crate::cancel::CancelFlag;
use crate::error::{ByteToneError, Result};
use crate::framing::{extension_bytes, FrameBuilder, Framing, HeaderEncoder};
use crate::fsk::FskModulator;
use crate::params::ModemParams;
use crate::wav::WaveformWriter;
use log::{debug, info};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug, Clone, PartialEq)]
pub struct EncodeReport {
    /// Frame symbols written (payload + extension)
    pub symbols: u64,
    /// Header symbols written before the frame
    pub header_symbols: u64,
    /// Total PCM samples in the waveform
    pub samples: u64,
    pub output: Option<PathBuf>,
}

/// Encoder: file bytes + extension -> one tone per byte -> 16-bit PCM
///
/// Segments are generated and written one at a time, so memory stays at one segment
/// regardless of input size.
pub struct Encoder {
    params: ModemParams,
    framing: Framing,
    cancel: CancelFlag,
}

impl Encoder {
    pub fn new(params: ModemParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            framing: Framing::default(),
            cancel: CancelFlag::new(),
        })
    }

    pub fn with_framing(mut self, framing: Framing) -> Self {
        self.framing = framing;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn params(&self) -> &ModemParams {
        &self.params
    }

    /// Encode `payload` followed by `extension` into a waveform written to `output`
    pub fn encode<R: Read, W: Write + Seek>(
        &self,
        payload: R,
        extension: &[u8],
        output: W,
    ) -> Result<EncodeReport> {
        let mut writer = WaveformWriter::new(output, self.params.sample_rate)?;

        let header_symbols = match self.framing {
            Framing::Headed => self.write_header(&mut writer)?,
            Framing::Bare => 0,
        };

        let modulator = FskModulator::new(self.params);
        let mut frame = FrameBuilder::new(payload, extension.to_vec());
        let mut symbols = 0u64;
        while let Some(chunk) = frame.next_chunk()? {
            for &symbol in &chunk {
                self.cancel.check()?;
                writer.write_segment(&modulator.modulate_symbol(symbol))?;
            }
            symbols += chunk.len() as u64;
        }

        let samples = writer.finalize()?;
        debug!(
            "Wrote {} header + {} frame symbols, {} samples",
            header_symbols, symbols, samples
        );

        Ok(EncodeReport {
            symbols,
            header_symbols,
            samples,
            output: None,
        })
    }

    /// Header segments use the bootstrap ladder at the waveform's sample rate
    fn write_header<W: Write + Seek>(&self, writer: &mut WaveformWriter<W>) -> Result<u64> {
        let bootstrap = ModemParams {
            amplitude: self.params.amplitude,
            ..ModemParams::bootstrap(self.params.sample_rate)
        };
        bootstrap.validate().map_err(|e| {
            ByteToneError::InvalidParams(format!(
                "sample rate {} Hz cannot carry the parameter header ({})",
                self.params.sample_rate, e
            ))
        })?;

        let header = HeaderEncoder::encode(&self.params)?;
        let modulator = FskModulator::new(bootstrap);
        for &byte in &header {
            self.cancel.check()?;
            writer.write_segment(&modulator.modulate_symbol(byte))?;
        }
        Ok(header.len() as u64)
    }

    /// Encode a file into a WAV at `output`.
    ///
    /// The waveform is written to a temporary file beside `output` and moved into place
    /// only once complete.
    pub fn encode_file(&self, input: &Path, output: &Path) -> Result<EncodeReport> {
        if !input.is_file() {
            return Err(ByteToneError::InputNotFound(input.to_path_buf()));
        }

        let extension = extension_bytes(input);
        info!(
            "Reading bytes from {} (extension {:?})",
            input.display(),
            String::from_utf8_lossy(&extension)
        );
        let payload = BufReader::new(File::open(input)?);

        let dir = match output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp = NamedTempFile::new_in(dir)?;

        let mut report = {
            let mut sink = BufWriter::new(temp.as_file_mut());
            let report = self.encode(payload, &extension, &mut sink)?;
            sink.flush()?;
            report
        };

        temp.persist(output).map_err(|e| ByteToneError::Io(e.error))?;
        info!("Sound wave written to {}", output.display());

        report.output = Some(output.to_path_buf());
        Ok(report)
    }
}
