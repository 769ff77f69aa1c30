use crate::assembler::FileAssembler;
use crate::cancel::CancelFlag;
use crate::error::{ByteToneError, Result};
use crate::extension::extract_extension;
use crate::framing::{HeaderDecoder, HEADER_SIZE};
use crate::params::ModemParams;
use crate::spectrum::SpectralAnalyzer;
use crate::transcode::{needs_transcode, Transcoder};
use crate::wav::{SegmentSlicer, WaveformReader};
use crate::DECODE_BATCH_WINDOWS;
use log::{debug, info, warn};
use std::io::{BufWriter, Cursor, Read, Seek, Write};
use std::path::{Path, PathBuf};

/// Outcome of demodulating a waveform into a byte stream
#[derive(Debug, Clone, PartialEq)]
pub struct Demodulated {
    /// Parameters the windows were analyzed with
    pub params: ModemParams,
    /// Whether they came from an in-band header
    pub from_header: bool,
    /// Bytes recovered (one per window, header excluded)
    pub symbols: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodeReport {
    pub demodulated: Demodulated,
    /// Recovered extension, separator included
    pub extension: Vec<u8>,
    pub payload_len: u64,
    pub output: PathBuf,
}

/// Decoder: waveform -> windows -> dominant tone per window -> bytes -> file
pub struct Decoder {
    params: ModemParams,
    cancel: CancelFlag,
    transcoder: Transcoder,
}

impl Decoder {
    /// `params` are used for waveforms without a header, and their sample rate is the
    /// transcoding target for inputs that are not PCM WAV already.
    pub fn new(params: ModemParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            cancel: CancelFlag::new(),
            transcoder: Transcoder::default(),
        })
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_transcoder(mut self, transcoder: Transcoder) -> Self {
        self.transcoder = transcoder;
        self
    }

    /// Demodulate every window of `reader` into `sink`, in window order
    pub fn demodulate<R: Read + Seek, W: Write>(
        &self,
        reader: &mut WaveformReader<R>,
        sink: &mut W,
    ) -> Result<Demodulated> {
        let container_rate = reader.sample_rate();
        if reader.is_empty() {
            debug!("Waveform holds no samples");
            return Err(ByteToneError::SilentWaveform);
        }
        let scale = reader.normalization()?;

        let (params, from_header) = match self.probe_header(reader, scale)? {
            Some(header) => {
                debug!("Found parameter header: {:?}", header);
                if header.sample_rate != container_rate {
                    return Err(ByteToneError::ParamsMismatch {
                        expected: header.sample_rate,
                        found: container_rate,
                    });
                }
                header.validate()?;
                (header, true)
            }
            None => {
                if self.params.sample_rate != container_rate {
                    return Err(ByteToneError::ParamsMismatch {
                        expected: self.params.sample_rate,
                        found: container_rate,
                    });
                }
                (self.params, false)
            }
        };

        let analyzer = SpectralAnalyzer::new(params);
        let mut slicer = SegmentSlicer::new(reader, analyzer.window_len(), scale);
        let mut symbols = 0u64;
        loop {
            self.cancel.check()?;
            let batch = slicer.next_batch(DECODE_BATCH_WINDOWS)?;
            if batch.is_empty() {
                break;
            }
            let bytes = analyzer.analyze_batch(&batch);
            sink.write_all(&bytes)?;
            symbols += bytes.len() as u64;
        }

        debug!("Recovered {} bytes from {} Hz waveform", symbols, container_rate);
        Ok(Demodulated {
            params,
            from_header,
            symbols,
        })
    }

    /// Read the leading bootstrap windows and parse them as a header.
    /// The reader stays past the header when one is found and is rewound otherwise.
    fn probe_header<R: Read + Seek>(
        &self,
        reader: &mut WaveformReader<R>,
        scale: f64,
    ) -> Result<Option<ModemParams>> {
        let bootstrap = ModemParams::bootstrap(reader.sample_rate());
        if bootstrap.validate().is_err() {
            debug!(
                "{} Hz cannot carry a parameter header, skipping probe",
                reader.sample_rate()
            );
            return Ok(None);
        }

        let analyzer = SpectralAnalyzer::new(bootstrap);
        let windows = SegmentSlicer::new(reader, analyzer.window_len(), scale)
            .next_batch(HEADER_SIZE)?;

        let header = if windows.len() == HEADER_SIZE
            && windows.iter().all(|w| w.len() == analyzer.window_len())
        {
            HeaderDecoder::decode(&analyzer.analyze_batch(&windows))
        } else {
            None
        };

        if header.is_none() {
            reader.rewind()?;
        }
        Ok(header)
    }

    /// Decode an in-memory waveform into `(payload, extension)`
    pub fn decode_bytes<R: Read + Seek>(&self, waveform: R) -> Result<(Vec<u8>, Vec<u8>)> {
        let mut reader = WaveformReader::new(waveform)?;
        let mut stream = Cursor::new(Vec::new());
        self.demodulate(&mut reader, &mut stream)?;
        let extension = extract_extension(&mut stream)?;
        Ok((stream.into_inner(), extension))
    }

    /// Decode an audio file into `<output_base><n><ext>`.
    ///
    /// Inputs that are not mono 16-bit PCM WAV are converted first; the input itself is
    /// never modified or removed.
    pub fn decode_file(&self, input: &Path, output_base: &Path) -> Result<DecodeReport> {
        if !input.is_file() {
            return Err(ByteToneError::InputNotFound(input.to_path_buf()));
        }

        let converted = if needs_transcode(input)? {
            Some(self.transcoder.transcode_to_temp(input, self.params.sample_rate)?)
        } else {
            None
        };
        let source = converted.as_deref().unwrap_or(input);

        info!("Opening {} and analyzing frequencies", source.display());
        let mut reader = WaveformReader::open(source)?;
        let mut assembler = FileAssembler::create(output_base)?;

        let demodulated = {
            let mut sink = BufWriter::new(assembler.file_mut());
            let demodulated = self.demodulate(&mut reader, &mut sink)?;
            sink.flush()?;
            demodulated
        };
        let overridden = ModemParams {
            amplitude: self.params.amplitude,
            ..demodulated.params
        } != self.params;
        if demodulated.from_header && overridden {
            warn!(
                "Waveform header overrides command-line parameters: {:?}",
                demodulated.params
            );
        }

        self.cancel.check()?;
        let extension = assembler.take_extension()?;
        let payload_len = assembler.file_mut().metadata()?.len();
        let output = assembler.finish(&extension)?;

        info!("Decoded {} bytes into {}", payload_len, output.display());
        Ok(DecodeReport {
            demodulated,
            extension,
            payload_len,
            output,
        })
    }
}
