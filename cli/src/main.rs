use clap::{Args, Parser, Subcommand};
use hound::{SampleFormat, WavSpec};
use std::error::Error;
use std::fs::File;
use std::path::PathBuf;
use tonelink_core::fsk::{normalize, FskDemodulator};
use tonelink_core::{
    DecodeOptions, DecodeResult, Decoder, Encoder, ExpectedMode, ModemError, SAMPLE_RATE,
};

#[derive(Parser)]
#[command(name = "tonelink")]
#[command(about = "Near-ultrasonic BFSK acoustic link: send and receive short packets as WAV audio")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a packet and write it as a WAV file
    Send(SendArgs),
    /// Decode a packet from a WAV file
    Recv(RecvArgs),
}

#[derive(Args)]
struct SendArgs {
    /// Short text payload to transmit (max 255 bytes of UTF-8)
    #[arg(long, value_name = "TEXT")]
    data: Option<String>,

    /// Secret passphrase for the 32-bit auth token
    #[arg(long, value_name = "STR")]
    secret: Option<String>,

    /// Build an AUTH packet from --secret instead of a DATA packet
    #[arg(long)]
    auth_mode: bool,

    /// Encrypt the payload with AES-256-GCM under --key
    #[arg(long)]
    encrypt: bool,

    /// Password for --encrypt
    #[arg(long, value_name = "STR")]
    key: Option<String>,

    /// Unit ID carried in the packet header (0-15)
    #[arg(long, default_value = "1")]
    unit_id: u8,

    /// Repeat each bit N times for noise resistance
    #[arg(long, default_value = "1")]
    repeat: usize,

    /// Output WAV file
    #[arg(long, default_value = "packet.wav")]
    output: PathBuf,
}

#[derive(Args)]
struct RecvArgs {
    /// Input WAV file
    #[arg(long, value_name = "PATH")]
    input: PathBuf,

    /// Parse the shared start flag as an AUTH packet
    #[arg(long)]
    auth_mode: bool,

    /// Expected secret for auth verification
    #[arg(long, value_name = "STR")]
    secret: Option<String>,

    /// Password for decrypting ENCRYPTED packets
    #[arg(long, value_name = "STR")]
    key: Option<String>,

    /// Bit repetition factor used by the sender
    #[arg(long, default_value = "1")]
    repeat: usize,

    /// Print the demodulated bit stream
    #[arg(long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    match Cli::parse().command {
        Commands::Send(args) => send(args),
        Commands::Recv(args) => recv(args),
    }
}

fn send(args: SendArgs) -> Result<(), Box<dyn Error>> {
    if args.unit_id > 15 {
        return Err("unit id must be 0-15".into());
    }

    let encoder = Encoder::with_repeat(args.repeat);
    let samples = if args.auth_mode {
        let secret = args.secret.ok_or("--secret is required in auth mode")?;
        println!("[AUTH MODE] Unit ID: {}", args.unit_id);
        println!("[AUTH MODE] Token derived from secret");
        encoder.build_auth(&secret, args.unit_id)?
    } else {
        let data = args
            .data
            .ok_or("--data is required (or use --auth-mode with --secret)")?;
        if args.encrypt {
            let key = args.key.ok_or("--key is required with --encrypt")?;
            println!("[ENCRYPT MODE] Unit ID: {}", args.unit_id);
            encoder.build_encrypted(data.as_bytes(), &key, args.unit_id)?
        } else {
            println!("[DATA MODE] Unit ID: {}", args.unit_id);
            println!("[DATA MODE] Payload: {}", data);
            encoder.build_data(data.as_bytes(), args.unit_id)?
        }
    };

    if args.repeat > 1 {
        println!("[INFO] Bit repetition: {}x", args.repeat);
    }
    println!(
        "[INFO] Total TX time: {:.2} seconds",
        samples.len() as f64 / SAMPLE_RATE as f64
    );

    let spec = WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE as u32,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let file = File::create(&args.output)?;
    let mut writer = hound::WavWriter::new(file, spec)?;
    for sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    println!("[SUCCESS] Wrote {}", args.output.display());
    Ok(())
}

fn recv(args: RecvArgs) -> Result<(), Box<dyn Error>> {
    println!("[INFO] Loading {}", args.input.display());
    let samples = read_wav(&args.input)?;
    println!(
        "[INFO] Signal length: {} samples ({:.2} seconds)",
        samples.len(),
        samples.len() as f64 / SAMPLE_RATE as f64
    );

    if args.verbose {
        let demodulator = FskDemodulator::new();
        let bits = demodulator.demodulate(&normalize(&samples))?;
        let stream: String = bits.iter().map(|&b| if b { '1' } else { '0' }).collect();
        println!("[DEBUG] Bitstream ({} bits): {}", bits.len(), stream);
    }

    let opts = DecodeOptions {
        expected_mode: if args.auth_mode {
            ExpectedMode::Auth
        } else {
            ExpectedMode::Data
        },
        password: args.key,
        expected_secret: args.secret,
    };
    let decoder = Decoder::with_repeat(args.repeat);
    let result = decoder.decode(&samples, &opts)?;

    println!("{}", "=".repeat(50));
    println!("DECODED PACKET");
    println!("{}", "=".repeat(50));
    match result {
        DecodeResult::DataOk { unit_id, payload } => {
            println!("Mode: DATA");
            println!("Unit ID: {}", unit_id);
            println!("Payload: {}", display_payload(&payload));
            println!("PACKET VALID");
            Ok(())
        }
        DecodeResult::AuthOk { unit_id, granted } => {
            println!("Mode: AUTH");
            println!("Unit ID: {}", unit_id);
            if granted {
                println!("ACCESS GRANTED");
                Ok(())
            } else {
                println!("ACCESS DENIED (token mismatch)");
                Err(ModemError::AccessDenied.into())
            }
        }
        DecodeResult::EncryptedOk { unit_id, payload } => {
            println!("Mode: ENCRYPTED");
            println!("Unit ID: {}", unit_id);
            println!("Payload: {}", display_payload(&payload));
            println!("PACKET VALID");
            Ok(())
        }
        DecodeResult::EncryptedLocked { unit_id } => {
            println!("Mode: ENCRYPTED");
            println!("Unit ID: {}", unit_id);
            Err("packet is encrypted; supply --key to decrypt".into())
        }
        DecodeResult::EncryptedFailed { unit_id } => {
            println!("Mode: ENCRYPTED");
            println!("Unit ID: {}", unit_id);
            Err(ModemError::AuthFailure.into())
        }
        DecodeResult::Invalid => Err("no valid packet found in signal".into()),
    }
}

/// Show the payload as text when it is valid UTF-8, hex otherwise.
fn display_payload(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => payload.iter().map(|b| format!("{:02x}", b)).collect(),
    }
}

/// Read a WAV file into mono 16-bit PCM.
///
/// Stereo input is averaged down to mono; 32-bit float input is rescaled.
/// A differing sample rate only warns, matching the reference receiver.
fn read_wav(path: &PathBuf) -> Result<Vec<i16>, Box<dyn Error>> {
    let file = File::open(path)?;
    let mut reader = hound::WavReader::new(file)?;
    let spec = reader.spec();
    println!(
        "[INFO] WAV: {} Hz, {} channels, {} bits",
        spec.sample_rate, spec.channels, spec.bits_per_sample
    );

    if spec.sample_rate != SAMPLE_RATE as u32 {
        eprintln!(
            "[WARNING] WAV sample rate ({}) differs from expected ({})",
            spec.sample_rate, SAMPLE_RATE
        );
    }

    let mut samples: Vec<i16> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Int, 16) => reader.samples::<i16>().collect::<Result<Vec<_>, _>>()?,
        (SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|s| (s.clamp(-1.0, 1.0) * 32767.0) as i16)
            .collect(),
        _ => {
            return Err(format!(
                "unsupported WAV format: {} bits {:?}",
                spec.bits_per_sample, spec.sample_format
            )
            .into())
        }
    };

    if spec.channels == 2 {
        println!("[INFO] Converting stereo to mono");
        samples = samples
            .chunks_exact(2)
            .map(|pair| ((pair[0] as i32 + pair[1] as i32) / 2) as i16)
            .collect();
    } else if spec.channels != 1 {
        return Err(format!("unsupported channel count: {}", spec.channels).into());
    }

    Ok(samples)
}
