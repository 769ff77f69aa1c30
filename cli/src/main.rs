use bytetone_core::{
    CancelFlag, Decoder, Encoder, Framing, ModemParams, Transcoder, BASE_FREQUENCY,
    DEFAULT_AMPLITUDE, DEFAULT_SAMPLE_RATE, DEFAULT_SYMBOL_DURATION_MS, FREQUENCY_STEP,
};
use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "bytetone")]
#[command(about = "Turn files into tones and tones back into files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a file into a WAV waveform, one tone per byte
    Encode {
        /// File to encode
        #[arg(value_name = "INPUT", value_parser = existing_file)]
        input: PathBuf,

        /// Output WAV file (default: input name with .wav)
        #[arg(short, long, value_name = "OUTPUT.WAV")]
        output: Option<PathBuf>,

        /// Tone amplitude as a fraction of full scale
        #[arg(long, default_value_t = DEFAULT_AMPLITUDE)]
        amplitude: f64,

        /// Omit the in-band parameter header (decoder must be given matching flags)
        #[arg(long)]
        no_header: bool,

        #[command(flatten)]
        modem: ModemArgs,
    },

    /// Decode a waveform back into the original file
    Decode {
        /// Audio file to decode (non-WAV input is converted with ffmpeg)
        #[arg(value_name = "INPUT", value_parser = existing_file)]
        input: PathBuf,

        /// Output base name; the result is <BASE><n><ext> (default: input name without suffix)
        #[arg(short, long, value_name = "BASE")]
        output: Option<PathBuf>,

        /// Transcoder program used for non-WAV input
        #[arg(long, default_value = bytetone_core::transcode::DEFAULT_TRANSCODER)]
        ffmpeg: String,

        #[command(flatten)]
        modem: ModemArgs,
    },
}

/// Parameters encoder and decoder must agree on
#[derive(Args)]
struct ModemArgs {
    /// Sample rate in Hz (also the ffmpeg target rate when decoding)
    #[arg(long, default_value_t = DEFAULT_SAMPLE_RATE)]
    sample_rate: u32,

    /// Tone duration per byte in milliseconds
    #[arg(long, default_value_t = DEFAULT_SYMBOL_DURATION_MS)]
    duration_ms: u32,

    /// Frequency of byte value 0 in Hz
    #[arg(long, default_value_t = BASE_FREQUENCY)]
    base_frequency: u32,

    /// Frequency increase per byte value in Hz
    #[arg(long, default_value_t = FREQUENCY_STEP)]
    frequency_step: u32,
}

impl ModemArgs {
    fn params(&self, amplitude: f64) -> ModemParams {
        ModemParams {
            sample_rate: self.sample_rate,
            symbol_duration_ms: self.duration_ms,
            base_frequency: self.base_frequency,
            frequency_step: self.frequency_step,
            amplitude,
        }
    }
}

fn existing_file(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if path.is_file() {
        Ok(path)
    } else {
        Err(format!("{} does not exist", value))
    }
}

/// `photo.png` -> `photo.wav`, without ever pointing back at the input itself
fn default_wav_path(input: &Path) -> PathBuf {
    let path = input.with_extension("wav");
    if path == input {
        input.with_extension("tones.wav")
    } else {
        path
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || {
            warn!("Interrupted, stopping");
            cancel.cancel();
        })?;
    }

    match cli.command {
        Commands::Encode {
            input,
            output,
            amplitude,
            no_header,
            modem,
        } => {
            let output = output.unwrap_or_else(|| default_wav_path(&input));
            let framing = if no_header {
                Framing::Bare
            } else {
                Framing::Headed
            };
            encode_command(&input, &output, modem.params(amplitude), framing, cancel)?
        }
        Commands::Decode {
            input,
            output,
            ffmpeg,
            modem,
        } => {
            let output = output.unwrap_or_else(|| input.with_extension(""));
            let transcoder = Transcoder::new(ffmpeg);
            decode_command(&input, &output, modem.params(DEFAULT_AMPLITUDE), transcoder, cancel)?
        }
    }

    Ok(())
}

fn encode_command(
    input: &Path,
    output: &Path,
    params: ModemParams,
    framing: Framing,
    cancel: CancelFlag,
) -> Result<(), Box<dyn std::error::Error>> {
    let encoder = Encoder::new(params)?
        .with_framing(framing)
        .with_cancel(cancel);
    let report = encoder.encode_file(input, output)?;

    let seconds = report.samples as f64 / encoder.params().sample_rate as f64;
    info!(
        "Encoded {} bytes (+{} header symbols) into {:.1} s of audio at {}",
        report.symbols,
        report.header_symbols,
        seconds,
        output.display()
    );
    Ok(())
}

fn decode_command(
    input: &Path,
    output_base: &Path,
    params: ModemParams,
    transcoder: Transcoder,
    cancel: CancelFlag,
) -> Result<(), Box<dyn std::error::Error>> {
    let decoder = Decoder::new(params)?
        .with_transcoder(transcoder)
        .with_cancel(cancel);
    let report = decoder.decode_file(input, output_base)?;

    info!(
        "Decoding completed: {} bytes, extension {:?}, written to {}",
        report.payload_len,
        String::from_utf8_lossy(&report.extension),
        report.output.display()
    );
    Ok(())
}
