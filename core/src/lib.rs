//! Acoustic link layer for short byte payloads over a speaker/microphone pair
//!
//! Modulates bits onto two near-ultrasonic tones (17 kHz / 18.5 kHz) using
//! continuous-phase BFSK, framed as packets with a checksum and an optional
//! authenticated-encryption layer (PBKDF2 + AES-256-GCM).

pub mod bits;
pub mod crypto;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod framing;
pub mod fsk;

pub use decoder::{DecodeOptions, DecodeResult, Decoder};
pub use encoder::Encoder;
pub use error::{ModemError, Result};
pub use framing::ExpectedMode;

// Modem configuration constants
//
// These are fixed parameters of the wire format; sender and receiver must
// agree on every one of them.
pub const SAMPLE_RATE: usize = 44100;
pub const FREQ_ZERO: f64 = 17000.0; // Hz, tone for bit 0
pub const FREQ_ONE: f64 = 18500.0; // Hz, tone for bit 1
pub const BIT_DURATION_MS: usize = 80;
pub const SAMPLES_PER_BIT: usize = (SAMPLE_RATE * BIT_DURATION_MS) / 1000; // 3528
pub const AMPLITUDE: f64 = 0.5; // fraction of full scale

// Silence guards transmitted around each packet to aid receiver framing
pub const GUARD_DURATION_MS: usize = 50;
pub const GUARD_SAMPLES: usize = (SAMPLE_RATE * GUARD_DURATION_MS) / 1000; // 2205

// Frame configuration
pub const PREAMBLE_LEN: usize = 32; // alternating 1010... bits
pub const START_FLAG_DATA: u8 = 0b1100_1100; // shared by DATA and AUTH frames
pub const START_FLAG_ENCRYPTED: u8 = 0b1111_0000;
pub const END_FLAG: u8 = 0b1111_1111;
pub const UNIT_ID_BITS: usize = 4;
pub const MAX_PAYLOAD_SIZE: usize = 255;

/// Largest plaintext that still fits an ENCRYPTED frame once the cipher-blob
/// overhead (salt + nonce + tag) is added.
pub const MAX_PLAINTEXT_SIZE: usize = MAX_PAYLOAD_SIZE - crypto::BLOB_OVERHEAD; // 211
